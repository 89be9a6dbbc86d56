// SPDX-License-Identifier: MIT
//
// Terminal errors.
//
// Only contract violations between the program and its terminal surface
// here. A garbled cursor-position reply is not an error: the status bar
// rolls those bytes back into the key queue and keeps scanning.

use std::io;

use thiserror::Error;

/// Failures that end the editing session.
#[derive(Debug, Error)]
pub enum TermError {
    /// The controlling terminal could not be opened.
    #[error("failed to open terminal device {path}: {source}")]
    Open {
        path: &'static str,
        #[source]
        source: io::Error,
    },

    /// Reading from or writing to the terminal failed.
    #[error("terminal i/o: {0}")]
    Io(#[from] io::Error),

    /// An escape sequence arrived that the key decoder does not recognize.
    ///
    /// `bytes` holds everything consumed for the sequence, starting with ESC.
    #[error("unrecognized escape sequence {bytes:?}")]
    UnexpectedEscape { bytes: Vec<u8> },
}

/// Result alias used across the terminal layer.
pub type Result<T> = std::result::Result<T, TermError>;
