//! # rowed-syntax — display-only token coloring
//!
//! A [`Colorer`] turns one line of raw bytes into the same bytes with SGR
//! color escapes wrapped around recognized tokens. It never changes the
//! printable content, so every cursor and column computation in the editor
//! uses the unstyled line and only the final write goes through here.
//!
//! - **[`Colorer`]** — the closed set of colorers and the cycle between them
//! - **[`cpp`]** — a longest-match tokenizer for C and C++ source lines

pub mod cpp;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The available colorers.
///
/// Small and fixed, so it's an enum rather than a trait object. The editor
/// cycles through them with [`next`](Self::next).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Colorer {
    /// Lines are written as-is.
    None,
    /// C/C++ token coloring.
    #[default]
    Cpp,
}

impl Colorer {
    /// Every colorer, in cycle order.
    pub const ALL: [Self; 2] = [Self::None, Self::Cpp];

    /// The colorer after this one, wrapping around.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::None => Self::Cpp,
            Self::Cpp => Self::None,
        }
    }

    /// Short name, as accepted by [`FromStr`] and shown in the status bar.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Cpp => "cpp",
        }
    }

    /// Return `line` with color escapes embedded.
    #[must_use]
    pub fn render_colors(self, line: &[u8]) -> Vec<u8> {
        match self {
            Self::None => line.to_vec(),
            Self::Cpp => cpp::render_colors(line),
        }
    }
}

impl fmt::Display for Colorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when parsing a colorer name that doesn't exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown syntax `{0}` (expected one of: none, cpp)")]
pub struct UnknownColorer(pub String);

impl FromStr for Colorer {
    type Err = UnknownColorer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownColorer(s.to_owned()))
    }
}
