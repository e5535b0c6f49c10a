//! Typed errors for the font service.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported through deferred results and worker status.
///
/// Per-request resolution problems (unknown family, missing glyph, bad pixel
/// size) are not errors: those requests resolve with empty values. Only
/// failures that leave the whole service unable to answer appear here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FontError {
    /// The font library could not be set up, or the font directory could not
    /// be listed.
    #[error("Cannot initialize font library: {0}")]
    Initialization(String),

    /// The font directory contained no usable font faces.
    #[error("Cannot find any fonts in '{}'", directory.display())]
    NoFonts {
        /// Directory that was scanned.
        directory: PathBuf,
    },

    /// The background worker thread could not be started.
    #[error("Cannot start font worker thread: {0}")]
    WorkerSpawn(String),

    /// The font system was shut down before the request was handled.
    #[error("Font system is shut down")]
    ShutDown,

    /// The worker dropped the request without resolving it.
    #[error("Font worker stopped before resolving the request")]
    WorkerGone,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_fonts_message_names_directory() {
        let err = FontError::NoFonts {
            directory: PathBuf::from("/opt/fonts"),
        };
        assert_eq!(err.to_string(), "Cannot find any fonts in '/opt/fonts'");
    }
}
