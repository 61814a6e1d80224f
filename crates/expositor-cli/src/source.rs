//! Reading the source code to explain.
//!
//! A single file is read as is. A directory is walked recursively in sorted
//! order; every supported file is appended after a separator line naming its
//! path relative to the directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use thiserror::Error;

/// File extensions (and bare file names) read as source.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    ".py", ".java", ".js", ".ts", ".go", ".rb", ".php", ".cpp", ".c", ".h", ".hpp", ".cs",
    ".rs", ".swift", ".kt", ".scala", ".pl", ".pm", ".sh", ".bash", ".html", ".htm", ".css",
    ".scss", ".less", ".sql", ".md", ".txt", ".json", ".yaml", ".yml", ".xml", ".ini", ".toml",
    ".dockerfile", "dockerfile", ".tf",
];

/// Directories never descended into, besides hidden ones.
const SKIPPED_DIRS: &[&str] = &["__pycache__", "node_modules", "target", "build", "dist"];

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("`{}` does not have a supported extension", .0.display())]
    Unsupported(PathBuf),

    #[error("no source code could be read from {}", .0.display())]
    Empty(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The concatenated source and the files it came from.
#[derive(Debug, Clone)]
pub struct SourceTree {
    pub content: String,
    pub files: Vec<PathBuf>,
}

pub fn is_supported(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|ext| lower == *ext || lower.ends_with(ext))
}

/// Read the file or directory at `path`.
pub fn read_source(path: &Path) -> Result<SourceTree, SourceError> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }

    let mut tree = SourceTree {
        content: String::new(),
        files: Vec::new(),
    };

    if path.is_file() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !is_supported(&name) {
            return Err(SourceError::Unsupported(path.to_path_buf()));
        }
        tree.content = read_lossy(path)?;
        tree.files.push(path.to_path_buf());
    } else {
        walk(path, path, &mut tree)?;
    }

    if tree.content.trim().is_empty() {
        return Err(SourceError::Empty(path.to_path_buf()));
    }
    debug!(files = tree.files.len(), bytes = tree.content.len(); "Source read");
    Ok(tree)
}

fn walk(root: &Path, dir: &Path, tree: &mut SourceTree) -> Result<(), SourceError> {
    let io_err = |source| SourceError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .collect();
    entries.sort();

    let (dirs, files): (Vec<PathBuf>, Vec<PathBuf>) = entries.into_iter().partition(|p| p.is_dir());

    for file in files {
        let name = file_name(&file);
        if name.starts_with('.') || !is_supported(&name) {
            continue;
        }
        let content = match read_lossy(&file) {
            Ok(content) => content,
            Err(err) => {
                warn!(path = file.display().to_string(), err = err.to_string(); "Skipping unreadable file");
                continue;
            }
        };
        let relative = file.strip_prefix(root).unwrap_or(&file);
        tree.content.push_str(&format!(
            "\n\n{bar} Content from: {} {bar}\n\n",
            relative.display(),
            bar = "=".repeat(20)
        ));
        tree.content.push_str(&content);
        tree.files.push(file);
    }

    for sub in dirs {
        let name = file_name(&sub);
        if name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_str()) {
            continue;
        }
        walk(root, &sub, tree)?;
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn read_lossy(path: &Path) -> Result<String, SourceError> {
    let bytes = fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read an optional text document such as a requirements file.
pub fn read_document(path: &Path) -> Result<String, SourceError> {
    if !path.is_file() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }
    read_lossy(path)
}
