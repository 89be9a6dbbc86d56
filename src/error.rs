// SPDX-License-Identifier: MIT

use std::io;

use rowed_term::TermError;
use thiserror::Error;

/// Anything that ends a session with a non-zero exit.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Term(#[from] TermError),

    #[error("i/o: {0}")]
    Io(#[from] io::Error),
}
