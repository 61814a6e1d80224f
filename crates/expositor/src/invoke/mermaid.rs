//! Subprocess driver for the diagram CLI.
//!
//! The source is written to a temporary `.mmd` file that is removed when this
//! function returns, whatever the outcome. Output pipes are drained on
//! background threads so a chatty process cannot block on a full pipe while
//! we poll it for the timeout.

use std::{
    io::{self, Write},
    path::Path,
    process::{Command, Stdio},
    time::Duration,
};

use log::debug;

use super::{
    FailureReason,
    process::{collect, drain, wait_with_deadline},
};

pub(super) fn render(
    source: &str,
    output: &Path,
    program: &str,
    background: &str,
    timeout: Option<Duration>,
) -> Result<(), FailureReason> {
    let mut input = tempfile::Builder::new()
        .prefix("expositor-")
        .suffix(".mmd")
        .tempfile()?;
    input.write_all(source.as_bytes())?;
    input.flush()?;

    let mut child = Command::new(program)
        .arg("-i")
        .arg(input.path())
        .arg("-o")
        .arg(output)
        .arg("-b")
        .arg(background)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => FailureReason::EngineMissing {
                program: program.to_string(),
            },
            _ => FailureReason::Io(err),
        })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = wait_with_deadline(&mut child, timeout)?;
    let Some(status) = status else {
        return Err(FailureReason::TimedOut(timeout.unwrap_or_default()));
    };
    let stdout = collect(stdout);
    let stderr = collect(stderr);

    debug!(status = status.to_string(); "Diagram CLI finished");

    if status.success() {
        Ok(())
    } else {
        Err(FailureReason::NonZeroExit {
            code: status.code(),
            stdout,
            stderr,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::{os::unix::fs::PermissionsExt, time::Instant};

    use super::*;

    fn script(dir: &Path, body: &str) -> String {
        let path = dir.join("fake-mmdc");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_success_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        // Copies the input file to the output path: `-i IN -o OUT -b BG`.
        let program = script(dir.path(), r#"cp "$2" "$4""#);
        let output = dir.path().join("out.png");

        render("graph TD\n  A --> B", &output, &program, "white", None).unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "graph TD\n  A --> B");
    }

    #[test]
    fn test_non_zero_exit_captures_streams() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(dir.path(), "echo progress; echo 'Parse error' >&2; exit 3");

        let err = render("graph TD", &dir.path().join("out.png"), &program, "white", None)
            .unwrap_err();

        match err {
            FailureReason::NonZeroExit {
                code,
                stdout,
                stderr,
            } => {
                assert_eq!(code, Some(3));
                assert_eq!(stdout, "progress");
                assert_eq!(stderr, "Parse error");
            }
            other => panic!("unexpected failure: {other}"),
        }
    }

    #[test]
    fn test_background_argument_is_passed() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(dir.path(), r#"echo "$6" > "$4""#);
        let output = dir.path().join("out.svg");

        render("graph LR", &output, &program, "transparent", None).unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap().trim(), "transparent");
    }

    #[test]
    fn test_timeout_kills_process() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(dir.path(), "exec sleep 5");
        let started = Instant::now();

        let err = render(
            "graph TD",
            &dir.path().join("out.png"),
            &program,
            "white",
            Some(Duration::from_millis(200)),
        )
        .unwrap_err();

        assert!(matches!(err, FailureReason::TimedOut(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_input_file_removed() {
        let dir = tempfile::tempdir().unwrap();
        let record = dir.path().join("input-path");
        let program = script(
            dir.path(),
            &format!(r#"echo "$2" > "{}"; exit 1"#, record.display()),
        );

        let _ = render("graph TD", &dir.path().join("out.png"), &program, "white", None);

        let input = std::fs::read_to_string(&record).unwrap();
        assert!(!Path::new(input.trim()).exists());
    }
}
