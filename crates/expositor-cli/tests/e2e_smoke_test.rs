use std::{fs, path::PathBuf};

use clap::Parser;
use tempfile::tempdir;

use expositor_cli::{Args, Error, run};

/// Collects all class notation fixtures from a directory
fn collect_notation_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("txt")
            })
            .collect()
    } else {
        Vec::new()
    };

    files.sort();
    files
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("fixtures")
}

fn render_args(output_dir: &std::path::Path, file: &std::path::Path) -> Args {
    Args::try_parse_from([
        "expositor".to_string(),
        "--log-level".to_string(),
        "off".to_string(),
        "--output-dir".to_string(),
        output_dir.to_string_lossy().to_string(),
        "render".to_string(),
        file.to_string_lossy().to_string(),
    ])
    .unwrap()
}

#[test]
fn e2e_smoke_test_fixtures() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let fixtures = collect_notation_files(fixtures_dir());
    assert!(!fixtures.is_empty(), "No fixtures found in fixtures/");

    let mut failed = Vec::new();

    for fixture in &fixtures {
        let args = render_args(temp_dir.path(), fixture);
        if let Err(e) = run(&args) {
            failed.push((fixture.clone(), e));
        }
    }

    if !failed.is_empty() {
        eprintln!("\nFixtures that failed:");
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} fixture(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_notation_without_classes_fails() {
    let temp_dir = tempdir().unwrap();
    let input = temp_dir.path().join("prose.txt");
    fs::write(&input, "The code defines a few helper functions.\n").unwrap();

    let args = render_args(&temp_dir.path().join("out"), &input);

    assert!(matches!(run(&args), Err(Error::Expositor(_))));
}

#[test]
fn e2e_missing_input_file() {
    let temp_dir = tempdir().unwrap();

    let args = render_args(temp_dir.path(), &temp_dir.path().join("missing.txt"));

    assert!(matches!(run(&args), Err(Error::Io { .. })));
}

#[test]
fn e2e_list_renderers() {
    let temp_dir = tempdir().unwrap();
    let args = Args::try_parse_from([
        "expositor".to_string(),
        "--output-dir".to_string(),
        temp_dir.path().to_string_lossy().to_string(),
        "list".to_string(),
    ])
    .unwrap();

    run(&args).unwrap();
}

#[test]
fn e2e_output_base_outside_output_dir_is_refused() {
    let temp_dir = tempdir().unwrap();
    let input = fixtures_dir().join("single_class.txt");
    let args = Args::try_parse_from([
        "expositor".to_string(),
        "--log-level".to_string(),
        "off".to_string(),
        "--output-dir".to_string(),
        temp_dir.path().join("out").to_string_lossy().to_string(),
        "render".to_string(),
        input.to_string_lossy().to_string(),
        "--output-base".to_string(),
        "../evil".to_string(),
    ])
    .unwrap();

    assert!(matches!(run(&args), Err(Error::Expositor(_))));
    assert!(!temp_dir.path().join("evil.png").exists());
}
