//! Path cleanup for arguments that arrive from the language model.

use std::io;
use std::path::Path;

/// Trim whitespace and strip newlines and backticks from a path argument.
///
/// Models routinely wrap paths in markdown code spans or append a newline.
pub fn sanitize_path(raw: &str) -> String {
    raw.trim()
        .replace(['\n', '\r'], "")
        .replace('`', "")
        .trim()
        .to_string()
}

/// Create the directory that will contain `file_path`, if any.
pub fn ensure_parent_dir(file_path: &Path) -> io::Result<()> {
    match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
