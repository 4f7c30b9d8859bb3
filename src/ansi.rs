// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No
// state, no decisions about when to emit — the compositor decides that.
// This module only knows the byte-level encoding of every terminal
// command the UI needs.
//
// Cursor positions are 0-indexed in our API and converted to 1-indexed
// for the terminal (ANSI uses 1-based coordinates).
//
// All functions return `io::Result` propagated from the underlying
// writer. In practice they never fail when writing to the in-memory
// frame buffer.

use std::io::{self, Write};

use crate::color::Attr;
use crate::palette::{NativeColor, NO_COLOR};

// ─── Cursor ─────────────────────────────────────────────────────────────────

/// Move the cursor to `(line, col)` using CUP.
#[inline]
pub fn cursor_to(w: &mut impl Write, line: u16, col: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", line + 1, col + 1)
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ─────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Reset all SGR attributes (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

/// Enter the alternate screen buffer.
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

/// Leave the alternate screen buffer.
#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

/// Set the scrolling region to rows `0..rows` (DECSTBM, 1-based).
#[inline]
pub fn set_scroll_region(w: &mut impl Write, rows: u16) -> io::Result<()> {
    write!(w, "\x1b[1;{rows}r")
}

/// Reset the scrolling region to the full screen.
#[inline]
pub fn reset_scroll_region(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[r")
}

// ─── Input protocols ────────────────────────────────────────────────────────

/// Enable SGR mouse reporting with button-event (drag) tracking.
#[inline]
pub fn enable_mouse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1002h\x1b[?1006h")
}

/// Disable mouse reporting.
#[inline]
pub fn disable_mouse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1006l\x1b[?1002l")
}

/// Enable focus in/out reporting (`CSI I` / `CSI O`).
#[inline]
pub fn enable_focus_reporting(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1004h")
}

/// Disable focus reporting.
#[inline]
pub fn disable_focus_reporting(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1004l")
}

// ─── Styling ────────────────────────────────────────────────────────────────

/// Emit one SGR sequence setting the full face state.
///
/// Starts from SGR 0 so stale attributes never leak, then applies the
/// attribute set and both colors. Native indices: `-1` maps to the
/// default color (39/49), 0–7 to the compact codes, everything else to
/// the 256-color form.
pub fn set_face(
    w: &mut impl Write,
    fg: NativeColor,
    bg: NativeColor,
    attrs: Attr,
) -> io::Result<()> {
    w.write_all(b"\x1b[0")?;
    for (flag, code) in [
        (Attr::BOLD, 1),
        (Attr::DIM, 2),
        (Attr::ITALIC, 3),
        (Attr::UNDERLINE, 4),
        (Attr::BLINK, 5),
        (Attr::REVERSE, 7),
    ] {
        if attrs.contains(flag) {
            write!(w, ";{code}")?;
        }
    }
    match fg {
        NO_COLOR => w.write_all(b";39")?,
        0..=7 => write!(w, ";{}", 30 + fg)?,
        _ => write!(w, ";38;5;{fg}")?,
    }
    match bg {
        NO_COLOR => w.write_all(b";49")?,
        0..=7 => write!(w, ";{}", 40 + bg)?,
        _ => write!(w, ";48;5;{bg}")?,
    }
    w.write_all(b"m")
}

// ─── Palette and title ──────────────────────────────────────────────────────

/// Program a palette slot via OSC 4.
///
/// Components arrive in the 0..=1000 range (the capability seam's
/// native scale) and are re-scaled to the 16-bit `rgb:` form.
pub fn set_palette_color(
    w: &mut impl Write,
    slot: u16,
    r: u16,
    g: u16,
    b: u16,
) -> io::Result<()> {
    let up = |c: u16| u32::from(c.min(1000)) * 0xffff / 1000;
    write!(
        w,
        "\x1b]4;{};rgb:{:04x}/{:04x}/{:04x}\x1b\\",
        slot,
        up(r),
        up(g),
        up(b)
    )
}

/// Set the window title via OSC 2.
#[inline]
pub fn set_title(w: &mut impl Write, title: &str) -> io::Result<()> {
    write!(w, "\x1b]2;{title}\x07")
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn cursor_to_is_one_indexed() {
        assert_eq!(capture(|w| cursor_to(w, 0, 0)), "\x1b[1;1H");
        assert_eq!(capture(|w| cursor_to(w, 5, 10)), "\x1b[6;11H");
    }

    #[test]
    fn scroll_region_spans_rows() {
        assert_eq!(capture(|w| set_scroll_region(w, 24)), "\x1b[1;24r");
    }

    #[test]
    fn face_default_colors() {
        assert_eq!(
            capture(|w| set_face(w, NO_COLOR, NO_COLOR, Attr::empty())),
            "\x1b[0;39;49m"
        );
    }

    #[test]
    fn face_named_colors_use_compact_codes() {
        assert_eq!(
            capture(|w| set_face(w, 1, 4, Attr::empty())),
            "\x1b[0;31;44m"
        );
    }

    #[test]
    fn face_palette_colors_use_256_form() {
        assert_eq!(
            capture(|w| set_face(w, 196, 16, Attr::empty())),
            "\x1b[0;38;5;196;48;5;16m"
        );
    }

    #[test]
    fn face_attributes_come_before_colors() {
        assert_eq!(
            capture(|w| set_face(w, NO_COLOR, NO_COLOR, Attr::BOLD | Attr::UNDERLINE)),
            "\x1b[0;1;4;39;49m"
        );
    }

    #[test]
    fn palette_color_scales_to_16_bit() {
        let s = capture(|w| set_palette_color(w, 16, 1000, 0, 500));
        assert_eq!(s, "\x1b]4;16;rgb:ffff/0000/7fff\x1b\\");
    }

    #[test]
    fn title_is_osc_2() {
        assert_eq!(capture(|w| set_title(w, "hi")), "\x1b]2;hi\x07");
    }

    #[test]
    fn mouse_sequences_pair_up() {
        let on = capture(|w| enable_mouse(w));
        let off = capture(|w| disable_mouse(w));
        assert!(on.contains("1002h") && on.contains("1006h"));
        assert!(off.contains("1002l") && off.contains("1006l"));
    }
}
