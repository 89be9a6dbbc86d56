//! The document — lines, cursor, edits, and inline rendering.
//!
//! A `Document` is drawn in place starting at the terminal row where the
//! editor was launched. Row `n` of the document is `n` rows below that
//! origin, and the terminal's cursor is always kept on the row and column
//! of the logical cursor. Every operation that moves the cursor or changes
//! text writes the escape sequences that keep it that way, to whatever
//! `impl Write` it is given.
//!
//! # Repaint granularity
//!
//! - Typing and single-byte deletes redraw only the current row
//!   ([`render_line`](Document::render_line)).
//! - Splitting a line redraws from the split row down.
//! - Joining two lines redraws everything ([`render`](Document::render)).
//!
//! # Dead lines
//!
//! Joining removes a row from the middle of the document. Instead of
//! shrinking the buffer, a blank line is pushed onto the end and counted
//! in `dead_lines`. Dead lines are never drawn and never reachable by the
//! cursor; the next split consumes one instead of growing the buffer, and
//! pressing Enter at the end of the last visible line revives one.
//!
//! # Columns
//!
//! Columns are byte offsets and display cells are assumed to be one byte
//! wide. Lines at least as long as the terminal is wide are cut to
//! `columns - 1` bytes on screen so the terminal never autowraps, which
//! would put the physical cursor one row off from the logical one. Colors
//! are applied after cutting, and no position is ever computed from the
//! styled bytes.

use std::io::{self, Write};

use rowed_syntax::Colorer;
use rowed_term::ansi;
use tracing::trace;

// ─── Line ────────────────────────────────────────────────────────────────────

/// One logical row of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    bytes: Vec<u8>,
    /// Whether the row ends in a real line break. Always `true`; soft
    /// wrapping is not implemented.
    hard_break: bool,
}

impl Line {
    /// An empty line.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: Vec::new(),
            hard_break: true,
        }
    }

    /// The line's bytes, without any styling.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    #[must_use]
    pub const fn hard_break(&self) -> bool {
        self.hard_break
    }
}

impl Default for Line {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<u8>> for Line {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            hard_break: true,
        }
    }
}

impl From<&[u8]> for Line {
    fn from(bytes: &[u8]) -> Self {
        Self::from(bytes.to_vec())
    }
}

// ─── Render Mode ─────────────────────────────────────────────────────────────

/// Where a full render goes.
pub enum RenderMode<'a> {
    /// Only the terminal.
    TerminalOnly,
    /// The terminal, plus the visible lines as plain text (one per `\n`,
    /// no styling, no truncation) to a second writer. Meant for a
    /// redirected stdout, so the caller checks it isn't a terminal.
    Mirror(&'a mut dyn Write),
}

// ─── Document ────────────────────────────────────────────────────────────────

/// The buffer being edited, with its cursor.
///
/// Invariants:
///
/// - `contents` is never empty
/// - `line < visible_lines()` and `column <= contents[line].len()`
/// - `dead_lines <= contents.len() - 1`, and every dead line is blank
#[derive(Debug, Clone)]
pub struct Document {
    contents: Vec<Line>,
    line: usize,
    column: usize,
    overwrite: bool,
    dead_lines: usize,
    colorer: Colorer,
    /// Terminal width, read once at startup.
    columns: usize,
}

impl Document {
    /// One empty line, cursor at the origin, insert mode.
    #[must_use]
    pub fn new(columns: u16, colorer: Colorer) -> Self {
        Self {
            contents: vec![Line::new()],
            line: 0,
            column: 0,
            overwrite: false,
            dead_lines: 0,
            colorer,
            columns: usize::from(columns),
        }
    }

    // -- Queries ------------------------------------------------------------

    /// Cursor position as `(line, column)`, both 0-based.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    #[inline]
    #[must_use]
    pub const fn overwrite(&self) -> bool {
        self.overwrite
    }

    #[inline]
    #[must_use]
    pub const fn colorer(&self) -> Colorer {
        self.colorer
    }

    /// Number of blank placeholder lines kept past the end of the content.
    #[inline]
    #[must_use]
    pub const fn dead_lines(&self) -> usize {
        self.dead_lines
    }

    /// Number of lines that are drawn (all lines minus dead ones).
    #[inline]
    #[must_use]
    pub fn visible_lines(&self) -> usize {
        self.contents.len() - self.dead_lines
    }

    /// The visible lines.
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.contents[..self.visible_lines()].iter()
    }

    /// The visible lines joined with `\n`.
    #[must_use]
    pub fn text(&self) -> Vec<u8> {
        let mut text = Vec::new();
        for (i, line) in self.lines().enumerate() {
            if i > 0 {
                text.push(b'\n');
            }
            text.extend_from_slice(line.as_bytes());
        }
        text
    }

    fn current_len(&self) -> usize {
        self.contents[self.line].len()
    }

    // -- Modes --------------------------------------------------------------

    pub const fn toggle_overwrite(&mut self) {
        self.overwrite = !self.overwrite;
    }

    /// Switch colorer and redraw everything in the new colors.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn set_colorer(&mut self, out: &mut impl Write, colorer: Colorer) -> io::Result<()> {
        self.colorer = colorer;
        self.render(out, RenderMode::TerminalOnly)
    }

    /// Advance to the next colorer and redraw.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn cycle_colorer(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.set_colorer(out, self.colorer.next())
    }

    // -- Cursor motion ------------------------------------------------------

    /// Move up one line, if there is one, then clamp the column.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn cursor_up(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.line == 0 {
            return Ok(());
        }
        ansi::cursor_up(out, 1)?;
        self.line -= 1;
        self.clamp_column(out)
    }

    /// Move down one visible line, if there is one, then clamp the column.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn cursor_down(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.line + 1 >= self.visible_lines() {
            return Ok(());
        }
        ansi::cursor_down(out, 1)?;
        self.line += 1;
        self.clamp_column(out)
    }

    /// Move right one byte, or to the start of the next line at end of line.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn cursor_right(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.column < self.current_len() {
            ansi::cursor_forward(out, 1)?;
            self.column += 1;
        } else if self.line + 1 < self.visible_lines() {
            ansi::cursor_down(out, 1)?;
            ansi::cursor_to_column(out, 0)?;
            self.line += 1;
            self.column = 0;
        }
        Ok(())
    }

    /// Move left one byte, or to the end of the previous line at column 0.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn cursor_left(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.column > 0 {
            ansi::cursor_back(out, 1)?;
            self.column -= 1;
        } else if self.line > 0 {
            self.line -= 1;
            self.column = self.current_len();
            ansi::cursor_up(out, 1)?;
            ansi::cursor_to_column(out, self.column)?;
        }
        Ok(())
    }

    /// Jump to column 0.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn cursor_home(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.column = 0;
        ansi::cursor_to_column(out, 0)
    }

    /// Jump past the last byte of the line.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn cursor_end(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.column = self.current_len();
        ansi::cursor_to_column(out, self.column)
    }

    fn clamp_column(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.column > self.current_len() {
            self.cursor_end(out)?;
        }
        Ok(())
    }

    // -- Editing ------------------------------------------------------------

    /// Type one byte at the cursor.
    ///
    /// Appends at end of line; otherwise replaces (overwrite mode) or
    /// inserts before the byte under the cursor. The cursor always moves
    /// one column right.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn insert_key(&mut self, out: &mut impl Write, byte: u8) -> io::Result<()> {
        let column = self.column;
        let bytes = &mut self.contents[self.line].bytes;
        if column == bytes.len() {
            bytes.push(byte);
        } else if self.overwrite {
            bytes[column] = byte;
        } else {
            bytes.insert(column, byte);
        }
        self.column += 1;
        self.render_line(out, self.line)
    }

    /// Handle Enter.
    ///
    /// Before end of line, the line splits at the cursor and everything
    /// from the split row down is redrawn. At end of line, the cursor just
    /// moves to the start of the next row, which is created (or revived
    /// from a dead line) only if no visible line is below.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn insert_newline(&mut self, out: &mut impl Write) -> io::Result<()> {
        let row = self.line;

        if self.column < self.current_len() {
            let tail = self.contents[row].bytes.split_off(self.column);
            if self.dead_lines > 0 {
                self.contents.pop();
                self.dead_lines -= 1;
            }
            self.contents.insert(row + 1, Line::from(tail));
            self.line += 1;
            self.column = 0;
            trace!(row, dead_lines = self.dead_lines, "split line");
            return self.repaint_from(out, row, row);
        }

        if row + 1 >= self.visible_lines() {
            if row + 1 < self.contents.len() {
                self.dead_lines -= 1;
            } else {
                self.contents.push(Line::new());
            }
        }
        self.line += 1;
        self.column = 0;
        ansi::newline(out)
    }

    /// Handle Backspace.
    ///
    /// Deletes the byte before the cursor, or at column 0 joins the line
    /// onto the previous one and redraws everything.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn insert_backspace(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.column > 0 {
            self.contents[self.line].bytes.remove(self.column - 1);
            self.column -= 1;
            return self.render_line(out, self.line);
        }
        if self.line == 0 {
            return Ok(());
        }

        let row = self.line;
        let removed = self.contents.remove(row);
        let prev = &mut self.contents[row - 1];
        self.column = prev.len();
        prev.bytes.extend_from_slice(&removed.bytes);
        self.retire_line();
        self.line = row - 1;
        trace!(row, dead_lines = self.dead_lines, "joined line backward");
        self.repaint_from(out, 0, row)
    }

    /// Handle Delete.
    ///
    /// Deletes the byte under the cursor, or at end of line joins the next
    /// visible line onto this one and redraws everything.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn insert_delete(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.column < self.current_len() {
            self.contents[self.line].bytes.remove(self.column);
            return self.render_line(out, self.line);
        }
        if self.line + 1 >= self.visible_lines() {
            return Ok(());
        }

        let next = self.contents.remove(self.line + 1);
        self.contents[self.line]
            .bytes
            .extend_from_slice(&next.bytes);
        self.retire_line();
        trace!(row = self.line, dead_lines = self.dead_lines, "joined line forward");
        self.repaint_from(out, 0, self.line)
    }

    /// Account for a line removed by a join: keep the row count stable by
    /// parking a blank dead line at the end.
    fn retire_line(&mut self) {
        self.contents.push(Line::new());
        self.dead_lines += 1;
    }

    // -- Rendering ----------------------------------------------------------

    /// Redraw every visible line, then put the cursor back.
    ///
    /// Moves from the cursor's row to the document's first row, erases to
    /// the end of the screen, and draws each visible line. With
    /// [`RenderMode::Mirror`] the plain text also goes to the mirror.
    ///
    /// # Errors
    ///
    /// Propagates write errors from either writer.
    pub fn render(&self, out: &mut impl Write, mode: RenderMode<'_>) -> io::Result<()> {
        self.repaint_from(out, 0, self.line)?;

        if let RenderMode::Mirror(mirror) = mode {
            for line in self.lines() {
                mirror.write_all(line.as_bytes())?;
                mirror.write_all(b"\n")?;
            }
            mirror.flush()?;
        }
        Ok(())
    }

    /// Clear and redraw line `n` in place, then put the cursor back.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn render_line(&self, out: &mut impl Write, n: usize) -> io::Result<()> {
        move_rows(out, self.line, n)?;
        out.write_all(b"\r")?;
        ansi::clear_line_right(out)?;
        self.write_styled(out, n)?;
        move_rows(out, n, self.line)?;
        ansi::cursor_to_column(out, self.column)
    }

    /// Move the cursor onto a fresh row below the last visible line.
    ///
    /// Used once at exit so whatever runs next doesn't draw over the
    /// document. The logical cursor is left where it was.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn park_below(&self, out: &mut impl Write) -> io::Result<()> {
        move_rows(out, self.line, self.visible_lines() - 1)?;
        ansi::newline(out)?;
        out.flush()
    }

    /// Redraw rows `first..visible_lines()` with the terminal cursor
    /// currently on row `physical_row`, then return it to the logical cursor.
    fn repaint_from(&self, out: &mut impl Write, first: usize, physical_row: usize) -> io::Result<()> {
        move_rows(out, physical_row, first)?;
        out.write_all(b"\r")?;
        ansi::clear_below(out)?;

        let visible = self.visible_lines();
        for n in first..visible {
            if n > first {
                ansi::newline(out)?;
            }
            self.write_styled(out, n)?;
        }

        move_rows(out, visible - 1, self.line)?;
        ansi::cursor_to_column(out, self.column)
    }

    /// Write line `n` as displayed: cut to the screen width, then colored.
    fn write_styled(&self, out: &mut impl Write, n: usize) -> io::Result<()> {
        out.write_all(&self.colorer.render_colors(self.display_bytes(n)))
    }

    /// The part of line `n` that fits on screen without autowrapping.
    fn display_bytes(&self, n: usize) -> &[u8] {
        let bytes = self.contents[n].as_bytes();
        if bytes.len() >= self.columns {
            &bytes[..self.columns.saturating_sub(1)]
        } else {
            bytes
        }
    }
}

/// Move the terminal cursor vertically from row `from` to row `to`.
fn move_rows(out: &mut impl Write, from: usize, to: usize) -> io::Result<()> {
    if to < from {
        ansi::cursor_up(out, from - to)
    } else {
        ansi::cursor_down(out, to - from)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
