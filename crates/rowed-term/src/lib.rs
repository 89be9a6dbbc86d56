// SPDX-License-Identifier: MIT
//
// rowed-term — Terminal layer for rowed.
//
// Everything that touches the terminal device lives here: raw mode and
// its guaranteed restore, window geometry, the handful of ANSI sequences
// an inline editor needs, the key decoder with its pending-byte queue,
// and the cursor-position round trip that paints the status line.
//
// The editor draws in place below the shell prompt rather than on the
// alternate screen, so every cursor move is relative to where the
// document started. Nothing here knows about documents; the editor crate
// drives these pieces.

pub mod ansi;
pub mod error;
pub mod input;
pub mod status;
pub mod terminal;

pub use error::{Result, TermError};
