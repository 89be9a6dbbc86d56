// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit; the document renderer and the status bar
// decide that. This module only knows the byte-level encoding.
//
// The editor draws inline, so most motion is relative (CUU/CUD/CUF/CUB).
// Absolute positioning is only used by the status bar, which learns the
// real cursor position from a cursor-position report first.
//
// Absolute coordinates are 0-indexed in our API and converted to 1-indexed
// for the terminal (ANSI standard uses 1-based coordinates).

use std::io::{self, Write};

/// Escape byte that starts every sequence.
pub const ESC: u8 = 0x1b;

// ─── Relative Cursor Motion ──────────────────────────────────────────────────

// A count of zero is treated as one by terminals, so zero-length moves are
// skipped entirely instead of emitted.

/// Move the cursor up `n` rows (CUU). Stops at the top margin.
#[inline]
pub fn cursor_up(w: &mut impl Write, n: usize) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    write!(w, "\x1b[{n}A")
}

/// Move the cursor down `n` rows (CUD). Stops at the bottom margin.
#[inline]
pub fn cursor_down(w: &mut impl Write, n: usize) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    write!(w, "\x1b[{n}B")
}

/// Move the cursor right `n` columns (CUF).
#[inline]
pub fn cursor_forward(w: &mut impl Write, n: usize) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    write!(w, "\x1b[{n}C")
}

/// Move the cursor left `n` columns (CUB).
#[inline]
pub fn cursor_back(w: &mut impl Write, n: usize) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    write!(w, "\x1b[{n}D")
}

/// Move to column `col` of the current row: carriage return, then CUF.
#[inline]
pub fn cursor_to_column(w: &mut impl Write, col: usize) -> io::Result<()> {
    w.write_all(b"\r")?;
    cursor_forward(w, col)
}

/// Start the next row at column 0, scrolling if the cursor is on the last row.
#[inline]
pub fn newline(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\r\n")
}

// ─── Absolute Cursor Position ────────────────────────────────────────────────

/// Move the cursor to `(x, y)` using the CUP (Cursor Position) sequence.
///
/// Our coordinates are 0-indexed; ANSI CUP is 1-indexed.
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1)
}

/// Ask the terminal where the cursor is (DSR 6).
///
/// The terminal answers on the input stream with `ESC [ row ; col R`.
#[inline]
pub fn request_cursor_position(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[6n")
}

// ─── Erase ───────────────────────────────────────────────────────────────────

/// Erase from the cursor to the end of the line (EL 0).
#[inline]
pub fn clear_line_right(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0K")
}

/// Erase from the cursor to the end of the screen (ED 0).
#[inline]
pub fn clear_below(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[J")
}

// ─── Attributes ──────────────────────────────────────────────────────────────

/// Swap foreground and background (SGR 7).
#[inline]
pub fn reverse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[7m")
}

/// Reset all SGR attributes (bare `CSI m`).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[m")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
