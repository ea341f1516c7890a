//! Errors for reading and writing plist documents.

use std::io;

/// Error type for plist tree I/O.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("XML syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("Unexpected element <{name}> at byte {offset}")]
    UnexpectedElement { name: String, offset: usize },

    #[error("Document has no <plist> root element")]
    MissingRoot,

    #[error("Invalid plist: {0}")]
    InvalidPlist(String),

    #[error("Character U+{code:04X} cannot be written to an XML plist (in {text:?})")]
    UnencodableCharacter { code: u32, text: String },
}

impl TreeError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        TreeError::Syntax {
            offset,
            message: message.into(),
        }
    }
}
