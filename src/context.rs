//! Simple implementation of a `Context` struct designed to track parsing/execution location.

use std::path::PathBuf;

/// Represents parsing/execution context, specifically, which file and where in the file something
/// is happening.
#[derive(Clone, Debug, Default)]
pub struct Context {
    pub path: Option<PathBuf>,

    // Line number is determined when iterating the input, so we use `usize` here to match the
    // return type of `enumerate()`. It is `0`-indexed internally and displayed `1`-indexed to
    // match the convention other make implementations use.
    pub line_index: Option<usize>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render as `path` or `path:line` for diagnostic prefixes.
    pub fn label(&self) -> Option<String> {
        let path_display = self.path.as_ref()?.display();

        Some(match self.line_index {
            Some(line) => format!("{}:{}", path_display, line + 1),
            None => path_display.to_string(),
        })
    }
}

impl From<PathBuf> for Context {
    fn from(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            line_index: None,
        }
    }
}
