//! The document source consumed by the buffer-scope producers.

use std::path::{Path, PathBuf};

/// An open editor buffer: a path plus mutable in-memory text.
pub trait Document {
    fn path(&self) -> &Path;
    fn text(&self) -> &str;
    fn set_text(&mut self, text: String);
}

/// Plain owned document, used by the CLI host and in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDocument {
    path: PathBuf,
    text: String,
}

impl BufferDocument {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

impl Document for BufferDocument {
    fn path(&self) -> &Path {
        &self.path
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
    }
}
