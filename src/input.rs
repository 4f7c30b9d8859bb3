// SPDX-License-Identifier: MIT
//
// Input decoder — raw terminal bytes to typed keys.
//
// Turns the byte stream from a [`ByteSource`] into [`Key`] values:
//
// - Control range (0x01-0x1a) with the two special cases: ctrl-L
//   schedules a full repaint (and still yields its key), ctrl-Z
//   requests process suspension and yields `Invalid`.
// - ESC disambiguation with a zero-timeout peek: a lone ESC is the
//   Escape key, ESC followed by more bytes is an alt- chord or the
//   start of a CSI/SS3 sequence.
// - Legacy CSI sequences (arrows, editing keys, back-tab, F5-F12)
// - SS3 sequences (F1-F4 and application-mode arrows)
// - SGR mouse protocol (press / release / move / wheel)
// - Focus reporting (`CSI I` / `CSI O`)
// - UTF-8 multi-byte characters, assembled byte by byte
//
// # Design
//
// The decoder pulls single bytes instead of buffering chunks, because
// the ESC ambiguity is resolved by *availability*: bytes belonging to
// an escape sequence arrive in the same burst as the ESC, so a
// zero-timeout peek distinguishes a lone Escape keypress from a
// sequence without any wall-clock timeout. Malformed sequences decode
// to [`Key::Invalid`] rather than an error — the caller ignores it.
//
// Wheel events are recognized by configurable button numbers because
// terminals disagree about them: historically wheel-down arrived as a
// middle-button press (button 2) while wheel-up was button 4, and the
// decoder keeps those as its defaults.

use std::collections::VecDeque;
use std::io;

use crate::source::{ByteSource, SourceRead};
use crate::surface::Coord;

// ─── Key ────────────────────────────────────────────────────────────────────

/// A decoded input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable Unicode codepoint.
    Char(char),
    /// Control chord (`Ctrl('a')` ..= `Ctrl('z')`).
    Ctrl(char),
    /// Alt chord over any codepoint.
    Alt(char),
    /// Control and alt together.
    CtrlAlt(char),
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    BackTab,
    /// F1 through F12.
    F(u8),
    Escape,
    /// Synthetic key injected after a terminal resize.
    Resize,
    FocusIn,
    FocusOut,
    Mouse(MouseEvent),
    /// Anything the decoder could not make sense of.
    Invalid,
}

/// A mouse event: what happened, which button, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseKind,
    /// Button number in the historical curses convention
    /// (1 = left, 2 = middle, 3 = right, 4 = wheel up).
    pub button: u16,
    /// Cell position, 0-indexed, already adjusted for a top status line.
    pub coord: Coord,
}

/// Mouse event classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseKind {
    Press,
    Release,
    WheelUp,
    WheelDown,
    Move,
}

// ─── Decoder ────────────────────────────────────────────────────────────────

/// Wheel-down arrives as a middle-button press on most terminals.
const DEFAULT_WHEEL_DOWN_BUTTON: u16 = 2;
/// Wheel-up is button 4 everywhere.
const DEFAULT_WHEEL_UP_BUTTON: u16 = 4;

/// Pull-based key decoder.
///
/// Feed it a [`ByteSource`] via [`next_key`](Self::next_key). Synthetic
/// keys (resize) can be queued with [`push_pending`](Self::push_pending)
/// and are delivered before any new bytes are read.
///
/// Two decoded bytes have side effects beyond their key: ctrl-L sets a
/// repaint request and ctrl-Z a suspend request. The owner collects
/// them with the `take_*` methods after each decode.
#[derive(Debug)]
pub struct KeyDecoder {
    /// Keys queued ahead of the byte stream (synthetic resize).
    pending: VecDeque<Key>,
    wheel_down_button: u16,
    wheel_up_button: u16,
    /// Subtract one row from mouse positions when the status line is
    /// rendered on top.
    status_on_top: bool,
    repaint_requested: bool,
    suspend_requested: bool,
}

impl Default for KeyDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            wheel_down_button: DEFAULT_WHEEL_DOWN_BUTTON,
            wheel_up_button: DEFAULT_WHEEL_UP_BUTTON,
            status_on_top: false,
            repaint_requested: false,
            suspend_requested: false,
        }
    }

    /// Configure which button number counts as wheel-down.
    pub fn set_wheel_down_button(&mut self, button: u16) {
        self.wheel_down_button = button;
    }

    /// Configure which button number counts as wheel-up.
    pub fn set_wheel_up_button(&mut self, button: u16) {
        self.wheel_up_button = button;
    }

    /// Tell the decoder whether the status line is rendered on top, so
    /// mouse rows can be adjusted to content coordinates.
    pub fn set_status_on_top(&mut self, on_top: bool) {
        self.status_on_top = on_top;
    }

    /// Queue a key ahead of the byte stream.
    pub fn push_pending(&mut self, key: Key) {
        self.pending.push_back(key);
    }

    /// Whether a queued key is ready without touching the source.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Whether a decoded ctrl-L asked for a full repaint since the
    /// last call. Consuming read.
    pub fn take_repaint_request(&mut self) -> bool {
        std::mem::take(&mut self.repaint_requested)
    }

    /// Whether a decoded ctrl-Z asked for process suspension since the
    /// last call. Consuming read.
    pub fn take_suspend_request(&mut self) -> bool {
        std::mem::take(&mut self.suspend_requested)
    }

    /// Decode the next key from `src`.
    ///
    /// Blocks until a key is available. Returns `None` when the wait
    /// was interrupted without data (resize wake) so the caller can
    /// re-run its resize path. EOF decodes to [`Key::Invalid`].
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source fails.
    pub fn next_key(&mut self, src: &mut dyn ByteSource) -> io::Result<Option<Key>> {
        if let Some(key) = self.pending.pop_front() {
            return Ok(Some(key));
        }

        match src.next_byte()? {
            SourceRead::Byte(c) => Ok(Some(self.decode(c, src)?)),
            SourceRead::Interrupted => Ok(None),
            SourceRead::Eof => Ok(Some(Key::Invalid)),
        }
    }

    /// Decode one key starting from lead byte `c`.
    fn decode(&mut self, c: u8, src: &mut dyn ByteSource) -> io::Result<Key> {
        // Control range. 0x0c is ctrl-L, 0x1a is ctrl-Z.
        if (1..=26).contains(&c) {
            if c == ctrl_byte(b'l') {
                self.repaint_requested = true;
            }
            if c == ctrl_byte(b'z') {
                self.suspend_requested = true;
                return Ok(Key::Invalid);
            }
            return Ok(Key::Ctrl((c - 1 + b'a') as char));
        }

        if c == 0x1b {
            return self.decode_escape(src);
        }

        if c == 127 {
            return Ok(Key::Backspace);
        }

        Ok(read_codepoint(c, src)?.map_or(Key::Invalid, Key::Char))
    }

    /// Decode what follows an ESC byte. A zero-timeout peek decides
    /// between a lone Escape and a sequence.
    fn decode_escape(&mut self, src: &mut dyn ByteSource) -> io::Result<Key> {
        let Some(next) = src.poll_byte()? else {
            return Ok(Key::Escape);
        };

        match next {
            b'[' => self.decode_csi(src),
            b'O' => Ok(decode_ss3(src)?),
            1..=26 => Ok(Key::CtrlAlt((next - 1 + b'a') as char)),
            _ => Ok(read_codepoint_polled(next, src)?.map_or(Key::Invalid, Key::Alt)),
        }
    }

    /// Decode a CSI sequence (the `ESC [` prefix is already consumed).
    fn decode_csi(&mut self, src: &mut dyn ByteSource) -> io::Result<Key> {
        let Some(first) = src.poll_byte()? else {
            // ESC [ with nothing behind it: alt-[.
            return Ok(Key::Alt('['));
        };

        match first {
            b'I' => return Ok(Key::FocusIn),
            b'O' => return Ok(Key::FocusOut),
            b'<' => return self.decode_sgr_mouse(src),
            _ => {}
        }

        // Accumulate parameter bytes up to the final byte (0x40-0x7e).
        let mut params: Vec<u16> = Vec::with_capacity(2);
        let mut current: u16 = 0;
        let mut byte = first;
        loop {
            match byte {
                b'0'..=b'9' => {
                    current = current
                        .saturating_mul(10)
                        .saturating_add(u16::from(byte - b'0'));
                }
                b';' => {
                    params.push(current);
                    current = 0;
                }
                0x40..=0x7e => break,
                _ => return Ok(Key::Invalid),
            }
            match src.poll_byte()? {
                Some(b) => byte = b,
                None => return Ok(Key::Invalid),
            }
        }
        params.push(current);

        Ok(match byte {
            b'A' => Key::Up,
            b'B' => Key::Down,
            b'C' => Key::Right,
            b'D' => Key::Left,
            b'H' => Key::Home,
            b'F' => Key::End,
            b'Z' => Key::BackTab,
            b'~' => tilde_key(params.first().copied().unwrap_or(0)),
            _ => Key::Invalid,
        })
    }

    /// Decode an SGR mouse report: `Pb ; Px ; Py` terminated by `M`
    /// (press/motion) or `m` (release). `ESC [ <` is already consumed.
    fn decode_sgr_mouse(&mut self, src: &mut dyn ByteSource) -> io::Result<Key> {
        let mut params = [0u16; 3];
        let mut idx = 0;
        let terminator;
        loop {
            match src.poll_byte()? {
                Some(b @ b'0'..=b'9') => {
                    params[idx] = params[idx]
                        .saturating_mul(10)
                        .saturating_add(u16::from(b - b'0'));
                }
                Some(b';') => {
                    if idx == 2 {
                        return Ok(Key::Invalid);
                    }
                    idx += 1;
                }
                Some(t @ (b'M' | b'm')) => {
                    terminator = t;
                    break;
                }
                _ => return Ok(Key::Invalid),
            }
        }

        let [cb, px, py] = params;
        let mut line = i32::from(py.saturating_sub(1));
        let col = i32::from(px.saturating_sub(1));
        if self.status_on_top {
            line -= 1;
        }
        let coord = Coord { line, col };

        let is_release = terminator == b'm';
        let is_motion = cb & 32 != 0;
        let button = sgr_button_number(cb);

        let kind = if is_motion {
            MouseKind::Move
        } else if is_release {
            if button == 1 {
                MouseKind::Release
            } else {
                MouseKind::Move
            }
        } else if button == self.wheel_down_button {
            MouseKind::WheelDown
        } else if button == self.wheel_up_button {
            MouseKind::WheelUp
        } else if button == 1 {
            MouseKind::Press
        } else {
            MouseKind::Move
        };

        Ok(Key::Mouse(MouseEvent { kind, button, coord }))
    }
}

/// The control byte for a lowercase letter (`ctrl_byte(b'a') == 1`).
const fn ctrl_byte(letter: u8) -> u8 {
    letter - b'a' + 1
}

/// Map an SGR button code to the historical curses button number.
///
/// The low two bits select buttons 1-3; bit 6 marks wheel events,
/// where wheel-up becomes button 4 and wheel-down the middle-button
/// number 2 (matching the terminals the defaults were chosen for).
fn sgr_button_number(cb: u16) -> u16 {
    if cb & 64 != 0 {
        if cb & 3 == 0 { 4 } else { 2 }
    } else {
        (cb & 3) + 1
    }
}

/// Keys reported as `CSI <code> ~`.
fn tilde_key(code: u16) -> Key {
    match code {
        1 | 7 => Key::Home,
        3 => Key::Delete,
        4 | 8 => Key::End,
        5 => Key::PageUp,
        6 => Key::PageDown,
        11..=15 => Key::F(u8::try_from(code - 10).unwrap_or(0)),
        17..=21 => Key::F(u8::try_from(code - 11).unwrap_or(0)),
        23 | 24 => Key::F(u8::try_from(code - 12).unwrap_or(0)),
        _ => Key::Invalid,
    }
}

/// Decode an SS3 sequence (the `ESC O` prefix is already consumed).
fn decode_ss3(src: &mut dyn ByteSource) -> io::Result<Key> {
    let Some(b) = src.poll_byte()? else {
        // ESC O with nothing behind it: alt-O.
        return Ok(Key::Alt('O'));
    };
    Ok(match b {
        b'A' => Key::Up,
        b'B' => Key::Down,
        b'C' => Key::Right,
        b'D' => Key::Left,
        b'H' => Key::Home,
        b'F' => Key::End,
        b'P' => Key::F(1),
        b'Q' => Key::F(2),
        b'R' => Key::F(3),
        b'S' => Key::F(4),
        _ => Key::Invalid,
    })
}

// ─── UTF-8 assembly ─────────────────────────────────────────────────────────

/// How many bytes a UTF-8 sequence occupies, from its lead byte.
/// `None` for continuation bytes and invalid leads.
const fn utf8_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7f => Some(1),
        0xc2..=0xdf => Some(2),
        0xe0..=0xef => Some(3),
        0xf0..=0xf4 => Some(4),
        _ => None,
    }
}

/// Assemble a codepoint whose lead byte was read with a blocking read.
/// Continuation bytes are pulled with blocking reads as well: they
/// belong to the same keypress and are already in flight.
fn read_codepoint(lead: u8, src: &mut dyn ByteSource) -> io::Result<Option<char>> {
    assemble(lead, src, |s| match s.next_byte()? {
        SourceRead::Byte(b) => Ok(Some(b)),
        SourceRead::Interrupted | SourceRead::Eof => Ok(None),
    })
}

/// Assemble a codepoint whose lead byte came from a zero-timeout peek
/// (the alt- path): continuation bytes are peeked the same way.
fn read_codepoint_polled(lead: u8, src: &mut dyn ByteSource) -> io::Result<Option<char>> {
    assemble(lead, src, |s| s.poll_byte())
}

fn assemble(
    lead: u8,
    src: &mut dyn ByteSource,
    mut pull: impl FnMut(&mut dyn ByteSource) -> io::Result<Option<u8>>,
) -> io::Result<Option<char>> {
    let Some(len) = utf8_len(lead) else {
        return Ok(None);
    };

    let mut buf = [lead, 0, 0, 0];
    for slot in buf.iter_mut().take(len).skip(1) {
        match pull(src)? {
            Some(b) if b & 0xc0 == 0x80 => *slot = b,
            Some(b) => {
                // Not a continuation byte: hand it back, the sequence
                // is malformed but the byte may start a valid one.
                src.push_back(b);
                return Ok(None);
            }
            None => return Ok(None),
        }
    }

    Ok(std::str::from_utf8(&buf[..len])
        .ok()
        .and_then(|s| s.chars().next()))
}

// ─── Tests ──────────────────────────────────────────────────────────────────
