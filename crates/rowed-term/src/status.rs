// SPDX-License-Identifier: MIT
//
// Status bar — painted on the terminal's last row without moving the
// editing cursor.
//
// The editor draws inline, so it never knows which screen row the cursor
// is on. To paint the status bar and come back, it asks the terminal
// (`CSI 6n`) and parses the reply (`ESC [ row ; col R`) from the input
// stream. The reply shares that stream with the keyboard, so keystrokes
// typed in the meantime can arrive first, or even split a user's own
// escape sequence across the request.
//
// # Rollback
//
// The parser is a single forward pass over device bytes. Every byte read
// in the current attempt is kept. When a byte doesn't fit the reply
// grammar, the whole attempt (mismatching byte included) goes back into
// the decoder's pending queue, in arrival order, and the scan restarts.
// The one exception is a mismatching ESC: it may be the start of the
// reply, so only the bytes before it are requeued and it opens the next
// attempt. A lone Escape keypress right before the reply therefore can't
// swallow the reply.
// Nothing the user typed is dropped or reordered; it is just decoded a
// little later by `read_key`.
//
// Only one request may be outstanding at a time. Two pipelined requests
// would let the second reply be requeued as keystrokes.

use std::fmt;
use std::io::Write;

use tracing::{debug, trace};

use crate::ansi::{self, ESC};
use crate::error::Result;
use crate::input::{ByteSource, KeyDecoder};
use crate::terminal::Geometry;

// ─── Types ──────────────────────────────────────────────────────────────────

/// A cursor position as reported by the terminal (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorReport {
    pub row: u16,
    pub col: u16,
}

/// Contents of the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLine<'a> {
    /// Cursor line in the document (0-based).
    pub line: usize,
    /// Cursor column in the document (0-based).
    pub column: usize,
    /// Overwrite mode instead of insert.
    pub overwrite: bool,
    /// Name of the active colorer.
    pub syntax: &'a str,
}

impl fmt::Display for StatusLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.overwrite { "OVR" } else { "INS" };
        write!(
            f,
            " {}:{} {mode} {} ",
            self.line + 1,
            self.column + 1,
            self.syntax
        )
    }
}

// ─── Reply Parser ───────────────────────────────────────────────────────────

/// Where the parser is inside `ESC [ row ; col R`.
#[derive(Debug, Clone, Copy)]
enum Stage {
    Esc,
    Bracket,
    Row { value: u16, digits: u8 },
    Col { row: u16, value: u16, digits: u8 },
}

/// Append a decimal digit, refusing values that overflow `u16`.
fn push_digit(value: u16, byte: u8) -> Option<u16> {
    value.checked_mul(10)?.checked_add(u16::from(byte - b'0'))
}

/// Advance the parser by one byte.
///
/// `Ok(next)` continues, `Err(Some(report))` is a complete reply,
/// `Err(None)` is a mismatch.
fn step(stage: Stage, byte: u8) -> std::result::Result<Stage, Option<CursorReport>> {
    match (stage, byte) {
        (Stage::Esc, ESC) => Ok(Stage::Bracket),
        (Stage::Bracket, b'[') => Ok(Stage::Row {
            value: 0,
            digits: 0,
        }),
        (Stage::Row { value, digits }, b'0'..=b'9') => push_digit(value, byte)
            .map(|value| Stage::Row {
                value,
                digits: digits.saturating_add(1),
            })
            .ok_or(None),
        (Stage::Row { value, digits }, b';') if digits > 0 => Ok(Stage::Col {
            row: value,
            value: 0,
            digits: 0,
        }),
        (Stage::Col { row, value, digits }, b'0'..=b'9') => push_digit(value, byte)
            .map(|value| Stage::Col {
                row,
                value,
                digits: digits.saturating_add(1),
            })
            .ok_or(None),
        (Stage::Col { row, value, digits }, b'R') if digits > 0 => {
            Err(Some(CursorReport { row, col: value }))
        }
        _ => Err(None),
    }
}

/// Scan device bytes for a cursor-position reply.
///
/// Reads always bypass the pending queue: the reply is on the device,
/// behind anything already queued. Bytes that turn out not to belong to
/// the reply are appended to the queue in the order they were read.
///
/// # Errors
///
/// Propagates device errors. A malformed reply is never an error.
pub fn parse_cursor_report<S: ByteSource>(decoder: &mut KeyDecoder<S>) -> Result<CursorReport> {
    let mut attempt: Vec<u8> = Vec::with_capacity(16);
    let mut stage = Stage::Esc;

    loop {
        let byte = decoder.read_byte(true)?;
        attempt.push(byte);

        match step(stage, byte) {
            Ok(next) => stage = next,
            Err(Some(report)) => {
                trace!(row = report.row, col = report.col, "cursor report");
                return Ok(report);
            }
            // An ESC that breaks an attempt may open the real reply, so it
            // starts the next attempt instead of going back to the queue.
            Err(None) if byte == ESC => {
                attempt.pop();
                debug!(bytes = ?attempt, "cursor report mismatch, requeueing");
                decoder.requeue(&attempt);
                attempt.clear();
                attempt.push(ESC);
                stage = Stage::Bracket;
            }
            Err(None) => {
                debug!(bytes = ?attempt, "cursor report mismatch, requeueing");
                decoder.requeue(&attempt);
                attempt.clear();
                stage = Stage::Esc;
            }
        }
    }
}

// ─── Refresh ────────────────────────────────────────────────────────────────

/// Repaint the status bar and put the cursor back where it was.
///
/// Sends `CSI 6n`, waits for the reply (requeueing keystrokes that arrive
/// first), polls the window size, draws `status` in reverse video on the
/// last row, then moves the cursor to the reported position.
///
/// # Errors
///
/// Propagates device errors.
pub fn refresh<T>(decoder: &mut KeyDecoder<T>, status: &StatusLine<'_>) -> Result<CursorReport>
where
    T: ByteSource + Write + Geometry,
{
    let out = decoder.get_mut();
    ansi::request_cursor_position(out)?;
    out.flush()?;

    let report = parse_cursor_report(decoder)?;
    let size = decoder.get_ref().window_size();

    let mut text = status.to_string();
    text.truncate(usize::from(size.cols));

    let out = decoder.get_mut();
    ansi::cursor_to(out, 0, size.rows.saturating_sub(1))?;
    ansi::clear_line_right(out)?;
    ansi::reverse(out)?;
    out.write_all(text.as_bytes())?;
    ansi::reset(out)?;
    ansi::cursor_to(out, report.col.saturating_sub(1), report.row.saturating_sub(1))?;

    Ok(report)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
