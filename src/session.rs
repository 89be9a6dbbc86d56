// SPDX-License-Identifier: MIT
//
// The editing session: one object owning the terminal channel (inside the
// key decoder, with its pending-byte queue) and the document.
//
// Each turn of the loop:
//
//   status refresh → read_key → dispatch → document edit + escape output
//
// The status refresh comes first so the bar always shows the cursor the
// user is looking at when the next key arrives.

use std::io::Write;

use rowed_editor::{Document, RenderMode};
use rowed_syntax::Colorer;
use rowed_term::ansi;
use rowed_term::input::{ByteSource, Key, KeyDecoder};
use rowed_term::status::{self, CursorReport, StatusLine};
use rowed_term::terminal::Geometry;
use rowed_term::Result;
use tracing::{debug, info};

// ─── Control bytes ──────────────────────────────────────────────────────────

const CTRL_A: u8 = 0x01;
const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;
const CTRL_E: u8 = 0x05;
const CTRL_T: u8 = 0x14;

/// Whether the loop keeps going after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Exiting,
}

// ─── Session ────────────────────────────────────────────────────────────────

/// One editing session: the key decoder over the terminal, and the document.
pub struct Session<T> {
    decoder: KeyDecoder<T>,
    document: Document,
}

impl<T> Session<T>
where
    T: ByteSource + Write + Geometry,
{
    /// Start a session on `channel`. The document width is taken from the
    /// channel's window size once, here.
    pub fn new(channel: T, colorer: Colorer) -> Self {
        let size = channel.window_size();
        info!(cols = size.cols, rows = size.rows, %colorer, "session start");
        Self {
            decoder: KeyDecoder::new(channel),
            document: Document::new(size.cols, colorer),
        }
    }

    /// The document being edited.
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// The terminal under the decoder, e.g. to restore it before the final render.
    pub const fn channel_mut(&mut self) -> &mut T {
        self.decoder.get_mut()
    }

    /// Reserve a row below the document's first row (scrolling if the
    /// cursor starts on the last row) so the status bar doesn't land on it.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn start(&mut self) -> Result<()> {
        let out = self.decoder.get_mut();
        ansi::newline(out)?;
        ansi::cursor_up(out, 1)?;
        Ok(())
    }

    /// Run until an exit key.
    ///
    /// # Errors
    ///
    /// Device errors and unrecognized escape sequences end the loop.
    pub fn run(&mut self) -> Result<()> {
        while self.step()? == LoopState::Running {}
        Ok(())
    }

    /// One turn: refresh the status bar, read a key, dispatch it.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub fn step(&mut self) -> Result<LoopState> {
        self.refresh_status()?;
        let key = self.decoder.read_key()?;
        self.dispatch(key)
    }

    fn refresh_status(&mut self) -> Result<CursorReport> {
        let (line, column) = self.document.cursor();
        let bar = StatusLine {
            line,
            column,
            overwrite: self.document.overwrite(),
            syntax: self.document.colorer().name(),
        };
        status::refresh(&mut self.decoder, &bar)
    }

    /// Apply one key to the document.
    ///
    /// # Errors
    ///
    /// Propagates write errors.
    pub fn dispatch(&mut self, key: Key) -> Result<LoopState> {
        let out = self.decoder.get_mut();
        let doc = &mut self.document;

        match key {
            Key::Byte(CTRL_C | CTRL_D) => {
                debug!(?key, "exit key");
                return Ok(LoopState::Exiting);
            }
            Key::Insert => doc.toggle_overwrite(),
            Key::ArrowUp => doc.cursor_up(out)?,
            Key::ArrowDown => doc.cursor_down(out)?,
            Key::ArrowLeft => doc.cursor_left(out)?,
            Key::ArrowRight => doc.cursor_right(out)?,
            Key::Home | Key::Byte(CTRL_A) => doc.cursor_home(out)?,
            Key::End | Key::Byte(CTRL_E) => doc.cursor_end(out)?,
            Key::Backspace => doc.insert_backspace(out)?,
            Key::Delete => doc.insert_delete(out)?,
            Key::Byte(b'\r' | b'\n') => doc.insert_newline(out)?,
            Key::Byte(CTRL_T) => {
                doc.cycle_colorer(out)?;
                debug!(colorer = %doc.colorer(), "colorer changed");
            }
            Key::Byte(b) if !b.is_ascii_control() => doc.insert_key(out, b)?,
            Key::Byte(b) => debug!(byte = b, "ignored control byte"),
        }

        Ok(LoopState::Running)
    }

    /// Draw the final document and leave the cursor below it.
    ///
    /// Call after the terminal is back in its original mode. The plain
    /// text also goes to `mirror` when given.
    ///
    /// # Errors
    ///
    /// Propagates write errors from either writer.
    pub fn finish(&mut self, mirror: Option<&mut dyn Write>) -> Result<()> {
        let out = self.decoder.get_mut();
        let mode = mirror.map_or(RenderMode::TerminalOnly, RenderMode::Mirror);
        self.document.render(out, mode)?;
        self.document.park_below(out)?;
        let (line, column) = self.document.cursor();
        info!(lines = self.document.visible_lines(), line, column, "session end");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;

    use super::*;
    use pretty_assertions::assert_eq;
    use rowed_term::terminal::Size;
    use rowed_term::TermError;

    /// In-memory terminal: scripted input, captured output, fixed size.
    struct Channel {
        input: VecDeque<u8>,
        output: Vec<u8>,
        size: Size,
    }

    impl ByteSource for Channel {
        fn read_byte(&mut self) -> io::Result<u8> {
            self.input.read_byte()
        }
    }

    impl Write for Channel {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Geometry for Channel {
        fn window_size(&self) -> Size {
            self.size
        }
    }

    fn session(input: &[u8]) -> Session<Channel> {
        Session::new(
            Channel {
                input: input.iter().copied().collect(),
                output: Vec::new(),
                size: Size { cols: 80, rows: 24 },
            },
            Colorer::None,
        )
    }

    fn feed(s: &mut Session<Channel>, keys: &[Key]) {
        for &key in keys {
            assert_eq!(s.dispatch(key).unwrap(), LoopState::Running);
        }
    }

    fn bytes(text: &str) -> Vec<Key> {
        text.bytes().map(Key::Byte).collect()
    }

    fn text(s: &Session<Channel>) -> String {
        String::from_utf8(s.document().text()).unwrap()
    }

    // ── Dispatch ────────────────────────────────────────────────────────

    #[test]
    fn type_enter_type() {
        let mut s = session(b"");
        feed(&mut s, &bytes("ab\rc"));
        assert_eq!(text(&s), "ab\nc");
        assert_eq!(s.document().cursor(), (1, 1));
    }

    #[test]
    fn line_feed_is_newline_too() {
        let mut s = session(b"");
        feed(&mut s, &bytes("a\nb"));
        assert_eq!(text(&s), "a\nb");
    }

    #[test]
    fn backspace_twice() {
        let mut s = session(b"");
        feed(&mut s, &bytes("ab"));
        feed(&mut s, &[Key::Backspace, Key::Backspace]);
        assert_eq!(text(&s), "");
        assert_eq!(s.document().cursor(), (0, 0));
    }

    #[test]
    fn exit_keys() {
        let mut s = session(b"");
        assert_eq!(s.dispatch(Key::Byte(CTRL_D)).unwrap(), LoopState::Exiting);
        assert_eq!(s.dispatch(Key::Byte(CTRL_C)).unwrap(), LoopState::Exiting);
    }

    #[test]
    fn insert_toggles_overwrite() {
        let mut s = session(b"");
        feed(&mut s, &bytes("abc"));
        feed(&mut s, &[Key::Home, Key::Insert]);
        assert!(s.document().overwrite());
        feed(&mut s, &bytes("X"));
        assert_eq!(text(&s), "Xbc");
        feed(&mut s, &[Key::Insert]);
        assert!(!s.document().overwrite());
    }

    #[test]
    fn ctrl_a_and_ctrl_e() {
        let mut s = session(b"");
        feed(&mut s, &bytes("abc"));
        feed(&mut s, &[Key::Byte(CTRL_A)]);
        assert_eq!(s.document().cursor(), (0, 0));
        feed(&mut s, &[Key::Byte(CTRL_E)]);
        assert_eq!(s.document().cursor(), (0, 3));
    }

    #[test]
    fn arrows_move_cursor() {
        let mut s = session(b"");
        feed(&mut s, &bytes("ab\rcd"));
        feed(&mut s, &[Key::ArrowUp, Key::ArrowLeft]);
        assert_eq!(s.document().cursor(), (0, 1));
        feed(&mut s, &[Key::ArrowDown, Key::ArrowRight]);
        assert_eq!(s.document().cursor(), (1, 2));
    }

    #[test]
    fn delete_joins_lines() {
        let mut s = session(b"");
        feed(&mut s, &bytes("ab\rcd"));
        feed(&mut s, &[Key::ArrowUp, Key::End, Key::Delete]);
        assert_eq!(text(&s), "abcd");
        assert_eq!(s.document().dead_lines(), 1);
    }

    #[test]
    fn other_control_bytes_are_ignored() {
        let mut s = session(b"");
        feed(&mut s, &[Key::Byte(0x07), Key::Byte(b'\t'), Key::Byte(0x1a)]);
        assert_eq!(text(&s), "");
        assert!(s.channel_mut().output.is_empty());
    }

    #[test]
    fn ctrl_t_cycles_colorer() {
        let mut s = session(b"");
        feed(&mut s, &[Key::Byte(CTRL_T)]);
        assert_eq!(s.document().colorer(), Colorer::Cpp);
        feed(&mut s, &[Key::Byte(CTRL_T)]);
        assert_eq!(s.document().colorer(), Colorer::None);
    }

    // ── Loop ────────────────────────────────────────────────────────────

    #[test]
    fn step_refreshes_status_then_dispatches() {
        let mut s = session(b"\x1b[3;1Ra");
        assert_eq!(s.step().unwrap(), LoopState::Running);
        assert_eq!(text(&s), "a");
        let out = String::from_utf8(s.channel_mut().output.clone()).unwrap();
        assert!(out.starts_with("\x1b[6n\x1b[24;1H\x1b[0K\x1b[7m 1:1 INS none \x1b[m\x1b[3;1H"));
    }

    #[test]
    fn run_until_exit() {
        let mut s = session(b"\x1b[1;1Rh\x1b[1;2Ri\x1b[1;3R\x04");
        s.run().unwrap();
        assert_eq!(text(&s), "hi");
    }

    #[test]
    fn keystroke_before_report_is_not_lost() {
        let mut s = session(b"x\x1b[5;1R\x1b[5;2R\x03");
        s.run().unwrap();
        assert_eq!(text(&s), "x");
    }

    #[test]
    fn arrow_split_around_report_survives() {
        let mut s = session(b"\x1b[1;1Rab\x1b[1;2R\x1b[D\x1b[1;3R\x1b[1;2RX\x1b[1;3R\x04");
        s.run().unwrap();
        assert_eq!(text(&s), "aXb");
    }

    #[test]
    fn bad_escape_ends_run() {
        let mut s = session(b"\x1b[1;1R\x1b[Z");
        assert!(matches!(s.run(), Err(TermError::UnexpectedEscape { .. })));
    }

    #[test]
    fn lone_escape_before_report_is_fatal_not_stuck() {
        let mut s = session(b"\x1b\x1b[1;1R\x04");
        match s.run() {
            Err(TermError::UnexpectedEscape { bytes }) => {
                assert_eq!(bytes, b"\x1b\x04".to_vec());
            }
            other => panic!("expected a bad escape, got {other:?}"),
        }
    }

    #[test]
    fn input_ending_is_an_error() {
        let mut s = session(b"\x1b[1;1Ra");
        assert!(matches!(s.run(), Err(TermError::Io(_))));
    }

    // ── Start / finish ──────────────────────────────────────────────────

    #[test]
    fn start_reserves_a_row() {
        let mut s = session(b"");
        s.start().unwrap();
        assert_eq!(s.channel_mut().output, b"\r\n\x1b[1A".to_vec());
    }

    #[test]
    fn finish_mirrors_plain_text() {
        let mut s = session(b"");
        feed(&mut s, &bytes("ab\rcd"));
        let mut mirror = Vec::new();
        let sink: &mut dyn Write = &mut mirror;
        s.finish(Some(sink)).unwrap();
        assert_eq!(mirror, b"ab\ncd\n".to_vec());
        let out = String::from_utf8(s.channel_mut().output.clone()).unwrap();
        assert!(out.ends_with("\r\n"));
    }

    #[test]
    fn finish_without_mirror() {
        let mut s = session(b"");
        feed(&mut s, &bytes("ab"));
        s.finish(None).unwrap();
    }
}
