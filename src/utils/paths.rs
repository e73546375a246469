// Path Conversion Utilities
//
// Component records store paths relative to the repository root with `/` separators, so
// ids and titles are identical on every platform.

use anyhow::{Context, Result};
use std::path::{Path, MAIN_SEPARATOR};

/// Convert a path under `repo_root` to a relative Unix-style path (with `/` separators)
///
/// # Examples
/// ```text
/// to_relative_unix_style("/home/ana/project/pkg/core.py", "/home/ana/project")
/// // => "pkg/core.py"
/// ```
pub fn to_relative_unix_style(absolute: &Path, repo_root: &Path) -> Result<String> {
    let relative = absolute.strip_prefix(repo_root).with_context(|| {
        format!(
            "File path '{}' is not within repository root '{}'",
            absolute.display(),
            repo_root.display()
        )
    })?;

    let path_str = relative.to_str().context("Path contains invalid UTF-8")?;

    // On Unix, MAIN_SEPARATOR is already '/', so this is a no-op
    let unix_style = if MAIN_SEPARATOR == '\\' {
        path_str.replace('\\', "/")
    } else {
        path_str.to_string()
    };

    Ok(unix_style)
}

/// Dotted display path of a module file: separators become `.`, the `.py` suffix goes
///
/// `pkg/sub/core.py` => `pkg.sub.core`
pub fn dotted_module_path(file_path: &str) -> String {
    let dotted = file_path.replace(['/', '\\'], ".");
    match dotted.strip_suffix(".py") {
        Some(stripped) => stripped.to_string(),
        None => dotted,
    }
}
