//! # rowed-editor — Editor core for rowed
//!
//! - **[`document`]** — `Document`: the line buffer, the cursor, every edit
//!   the editor supports, and the incremental rendering that keeps the
//!   terminal in step with it
//!
//! Rendering goes through `rowed-term`'s escape writers and `rowed-syntax`'s
//! colorers; this crate never reads input.

pub mod document;

pub use document::{Document, Line, RenderMode};
