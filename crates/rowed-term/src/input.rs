// SPDX-License-Identifier: MIT
//
// Key decoding.
//
// Turns the raw byte stream from the terminal into logical keys. The
// grammar is deliberately small: plain bytes, plus the handful of CSI
// sequences an inline editor reacts to.
//
//   ESC [ A / B / C / D   arrows (up, down, right, left)
//   ESC [ H / F           home, end
//   ESC [ 2 ~ / 3 ~       insert, delete
//
// Anything else after ESC is a broken contract with the terminal and ends
// the session. There is no lone-Escape timeout: the editor has no use for
// the Escape key, so an ESC byte always starts a sequence.
//
// # Pending bytes
//
// The status bar asks the terminal for the cursor position and reads the
// reply from this same stream. Keystrokes typed before the reply arrives
// are read first, so the status bar hands them back through
// [`KeyDecoder::requeue`]. They wait in a FIFO and are delivered ahead of
// any new device bytes, in the order they originally arrived.

use std::collections::VecDeque;
use std::io;

use crate::ansi::ESC;
use crate::error::{Result, TermError};

// ─── Byte Source ────────────────────────────────────────────────────────────

/// A blocking, byte-at-a-time input device.
pub trait ByteSource {
    /// Block until one byte is available and return it.
    ///
    /// # Errors
    ///
    /// Device errors, or `UnexpectedEof` when the stream has ended.
    fn read_byte(&mut self) -> io::Result<u8>;
}

/// A scripted source: pops bytes from the front, then reports EOF.
impl ByteSource for VecDeque<u8> {
    fn read_byte(&mut self) -> io::Result<u8> {
        self.pop_front()
            .ok_or_else(|| io::ErrorKind::UnexpectedEof.into())
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self) -> io::Result<u8> {
        (**self).read_byte()
    }
}

// ─── Key ────────────────────────────────────────────────────────────────────

/// A decoded input event. Produced once per [`KeyDecoder::read_key`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Any byte that isn't part of an escape sequence, control bytes included.
    Byte(u8),
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    Insert,
    Delete,
    /// DEL (0x7F), which is what terminals send for the backspace key.
    Backspace,
}

/// Byte terminals send for the backspace key.
const DEL: u8 = 0x7f;

// ─── Decoder ────────────────────────────────────────────────────────────────

/// Key decoder over a byte source, with a pending-byte queue in front of it.
#[derive(Debug)]
pub struct KeyDecoder<S> {
    source: S,
    pending: VecDeque<u8>,
}

impl<S: ByteSource> KeyDecoder<S> {
    /// Wrap a byte source. The pending queue starts empty.
    #[must_use]
    pub const fn new(source: S) -> Self {
        Self {
            source,
            pending: VecDeque::new(),
        }
    }

    /// Read one raw byte.
    ///
    /// Queued bytes are returned first unless `bypass_pending` is set, in
    /// which case the device is read even when the queue is non-empty. The
    /// status bar bypasses because the terminal's reply can only be on the
    /// device, behind whatever was already queued.
    ///
    /// # Errors
    ///
    /// Propagates device errors.
    pub fn read_byte(&mut self, bypass_pending: bool) -> Result<u8> {
        if !bypass_pending {
            if let Some(byte) = self.pending.pop_front() {
                return Ok(byte);
            }
        }
        Ok(self.source.read_byte()?)
    }

    /// Read and decode the next key.
    ///
    /// # Errors
    ///
    /// [`TermError::UnexpectedEscape`] for an escape sequence outside the
    /// grammar; device errors otherwise.
    pub fn read_key(&mut self) -> Result<Key> {
        let byte = self.read_byte(false)?;
        match byte {
            ESC => self.read_escape(),
            DEL => Ok(Key::Backspace),
            b => Ok(Key::Byte(b)),
        }
    }

    /// Decode the rest of a sequence whose ESC was just read.
    fn read_escape(&mut self) -> Result<Key> {
        let mut seen = vec![ESC];

        let intro = self.read_byte(false)?;
        seen.push(intro);
        if intro != b'[' {
            return Err(TermError::UnexpectedEscape { bytes: seen });
        }

        let final_byte = self.read_byte(false)?;
        seen.push(final_byte);
        match final_byte {
            b'A' => Ok(Key::ArrowUp),
            b'B' => Ok(Key::ArrowDown),
            b'C' => Ok(Key::ArrowRight),
            b'D' => Ok(Key::ArrowLeft),
            b'F' => Ok(Key::End),
            b'H' => Ok(Key::Home),
            b'2' | b'3' => {
                let tilde = self.read_byte(false)?;
                seen.push(tilde);
                match (final_byte, tilde) {
                    (b'2', b'~') => Ok(Key::Insert),
                    (b'3', b'~') => Ok(Key::Delete),
                    _ => Err(TermError::UnexpectedEscape { bytes: seen }),
                }
            }
            _ => Err(TermError::UnexpectedEscape { bytes: seen }),
        }
    }

    /// Append bytes to the back of the pending queue, preserving their order.
    pub fn requeue(&mut self, bytes: &[u8]) {
        self.pending.extend(bytes);
    }

    /// Number of bytes waiting in the pending queue.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Shared access to the underlying source.
    pub const fn get_ref(&self) -> &S {
        &self.source
    }

    /// Mutable access to the underlying source (for writing to the same
    /// terminal the keys come from).
    pub const fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
