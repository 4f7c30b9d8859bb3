// SPDX-License-Identifier: MIT
//
// Surface — an owned rectangular terminal region.
//
// A surface is a flat row-major grid of cells plus an absolute screen
// position. The main view, the menu overlay, and the info overlay are
// each a surface; the compositor blits them to the terminal in order,
// so later surfaces overdraw earlier ones.
//
// Surfaces are created and destroyed explicitly (overlays come and go
// with their state) and never copied. A destroyed surface is an empty
// shell: painting into it is a no-op and destroying it again is fine.
//
// Cells store a resolved pair id instead of a `Face` — pair resolution
// happens once at paint time, and frame emission only needs the id.
//
// Wide characters (CJK, some emoji) occupy two columns: the first cell
// holds the codepoint, the second is a continuation cell the renderer
// skips while still honoring its colors.

use std::ops::{Add, Sub};

use unicode_width::UnicodeWidthChar;

use crate::color::Attr;
use crate::palette::PairId;

// ─── Coord ──────────────────────────────────────────────────────────────────

/// A screen coordinate or extent, `(line, col)`.
///
/// Signed: overlay placement math runs above the top edge and left of
/// the left edge before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coord {
    pub line: i32,
    pub col: i32,
}

impl Coord {
    #[inline]
    #[must_use]
    pub const fn new(line: i32, col: i32) -> Self {
        Self { line, col }
    }
}

impl Add for Coord {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.line + rhs.line, self.col + rhs.col)
    }
}

impl Sub for Coord {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.line - rhs.line, self.col - rhs.col)
    }
}

// ─── Cell ───────────────────────────────────────────────────────────────────

/// One character position: codepoint, pair id, attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub pair: PairId,
    pub attrs: Attr,
}

impl Cell {
    /// A space in the default pair.
    pub const EMPTY: Self = Self {
        ch: ' ',
        pair: 0,
        attrs: Attr::empty(),
    };

    /// A blank cell in a given pair (used for background fill).
    #[inline]
    #[must_use]
    pub const fn blank(pair: PairId) -> Self {
        Self {
            ch: ' ',
            pair,
            attrs: Attr::empty(),
        }
    }

    /// Whether this is the trailing half of a wide character.
    #[inline]
    #[must_use]
    pub const fn is_continuation(&self) -> bool {
        self.ch == '\0'
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

// ─── Surface ────────────────────────────────────────────────────────────────

/// An owned cell grid at an absolute screen position.
pub struct Surface {
    pos: Coord,
    size: Coord,
    cells: Vec<Cell>,
    cursor: Coord,
    face: (PairId, Attr),
    background: PairId,
}

impl Surface {
    /// An empty, not-yet-created surface.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pos: Coord::new(0, 0),
            size: Coord::new(0, 0),
            cells: Vec::new(),
            cursor: Coord::new(0, 0),
            face: (0, Attr::empty()),
            background: 0,
        }
    }

    /// Allocate the backing grid at `pos` with extent `size`.
    ///
    /// Replaces any previous backing. # Panics if `size` is smaller
    /// than one cell in either dimension — a zero-sized surface is a
    /// caller bug, not a runtime condition.
    pub fn create(&mut self, pos: Coord, size: Coord) {
        assert!(
            size.line >= 1 && size.col >= 1,
            "surface size must be at least 1x1, got {size:?}"
        );
        self.pos = pos;
        self.size = size;
        #[allow(clippy::cast_sign_loss)]
        let area = (size.line as usize) * (size.col as usize);
        self.cells.clear();
        self.cells.resize(area, Cell::EMPTY);
        self.cursor = Coord::new(0, 0);
        self.face = (0, Attr::empty());
        self.background = 0;
    }

    /// Release the backing grid. Idempotent.
    pub fn destroy(&mut self) {
        self.cells = Vec::new();
        self.pos = Coord::new(0, 0);
        self.size = Coord::new(0, 0);
        self.cursor = Coord::new(0, 0);
    }

    /// Whether the surface currently has a backing grid.
    #[inline]
    #[must_use]
    pub const fn is_created(&self) -> bool {
        !self.cells.is_empty()
    }

    /// Absolute screen position of the top-left cell.
    #[inline]
    #[must_use]
    pub const fn pos(&self) -> Coord {
        self.pos
    }

    /// Extent in (lines, cols).
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Coord {
        self.size
    }

    // ── Painting ────────────────────────────────────────────────

    /// Set the face applied to subsequent writes.
    pub const fn set_face(&mut self, pair: PairId, attrs: Attr) {
        self.face = (pair, attrs);
    }

    /// Set the pair used by clear operations.
    pub const fn set_background(&mut self, pair: PairId) {
        self.background = pair;
    }

    /// Move the paint cursor. Out-of-range positions simply make
    /// subsequent writes no-ops (curses-style tolerance).
    pub const fn move_to(&mut self, line: i32, col: i32) {
        self.cursor = Coord::new(line, col);
    }

    /// Paint a string at the cursor in the current face.
    ///
    /// Advances by display width; wide characters leave a continuation
    /// cell. Content is clipped at the right edge — a wide character
    /// that would straddle it is dropped entirely.
    pub fn put_str(&mut self, s: &str) {
        for ch in s.chars() {
            self.put_char(ch);
        }
    }

    /// Paint a single character at the cursor in the current face.
    pub fn put_char(&mut self, ch: char) {
        let width = UnicodeWidthChar::width(ch).unwrap_or(0).max(1) as i32;
        let line = self.cursor.line;
        let col = self.cursor.col;
        if line < 0 || line >= self.size.line || col < 0 || col + width > self.size.col {
            return;
        }
        let (pair, attrs) = self.face;
        let idx = self.index(line, col);
        self.cells[idx] = Cell { ch, pair, attrs };
        if width == 2 {
            self.cells[idx + 1] = Cell {
                ch: '\0',
                pair,
                attrs,
            };
        }
        self.cursor.col += width;
    }

    /// Fill from the cursor to the end of the line with blanks in the
    /// background pair.
    pub fn clear_to_eol(&mut self) {
        let line = self.cursor.line;
        if line < 0 || line >= self.size.line || !self.is_created() {
            return;
        }
        let start = self.cursor.col.clamp(0, self.size.col);
        let blank = Cell::blank(self.background);
        for col in start..self.size.col {
            let idx = self.index(line, col);
            self.cells[idx] = blank;
        }
    }

    /// Fill the whole grid with blanks in the background pair.
    pub fn clear(&mut self) {
        let blank = Cell::blank(self.background);
        self.cells.fill(blank);
    }

    // ── Reading back ────────────────────────────────────────────

    /// The cell at `(line, col)`, if in range.
    #[must_use]
    pub fn cell(&self, line: i32, col: i32) -> Option<&Cell> {
        if line < 0 || line >= self.size.line || col < 0 || col >= self.size.col {
            return None;
        }
        Some(&self.cells[self.index(line, col)])
    }

    /// One row of cells, if in range.
    #[must_use]
    pub fn row(&self, line: i32) -> Option<&[Cell]> {
        if line < 0 || line >= self.size.line || !self.is_created() {
            return None;
        }
        let idx = self.index(line, 0);
        #[allow(clippy::cast_sign_loss)]
        let cols = self.size.col as usize;
        Some(&self.cells[idx..idx + cols])
    }

    /// Characters of one row as a `String`, continuation cells
    /// skipped. Handy in tests.
    #[must_use]
    pub fn row_text(&self, line: i32) -> String {
        self.row(line)
            .map(|cells| {
                cells
                    .iter()
                    .filter(|c| !c.is_continuation())
                    .map(|c| c.ch)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[allow(clippy::cast_sign_loss)]
    fn index(&self, line: i32, col: i32) -> usize {
        (line as usize) * (self.size.col as usize) + col as usize
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn created(lines: i32, cols: i32) -> Surface {
        let mut s = Surface::new();
        s.create(Coord::new(0, 0), Coord::new(lines, cols));
        s
    }

    // ── Coord ─────────────────────────────────────────────────────

    #[test]
    fn coord_add_sub() {
        let a = Coord::new(3, 4);
        let b = Coord::new(1, 2);
        assert_eq!(a + b, Coord::new(4, 6));
        assert_eq!(a - b, Coord::new(2, 2));
    }

    // ── Lifecycle ─────────────────────────────────────────────────

    #[test]
    fn new_surface_is_not_created() {
        assert!(!Surface::new().is_created());
    }

    #[test]
    fn create_allocates_backing() {
        let s = created(5, 10);
        assert!(s.is_created());
        assert_eq!(s.size(), Coord::new(5, 10));
        assert_eq!(s.cell(4, 9), Some(&Cell::EMPTY));
    }

    #[test]
    #[should_panic(expected = "at least 1x1")]
    fn create_rejects_zero_size() {
        let mut s = Surface::new();
        s.create(Coord::new(0, 0), Coord::new(0, 10));
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut s = created(2, 2);
        s.destroy();
        assert!(!s.is_created());
        s.destroy();
        assert!(!s.is_created());
        assert_eq!(s.size(), Coord::new(0, 0));
    }

    #[test]
    fn recreate_replaces_backing() {
        let mut s = created(2, 2);
        s.move_to(0, 0);
        s.put_str("ab");
        s.create(Coord::new(1, 1), Coord::new(3, 3));
        assert_eq!(s.cell(0, 0), Some(&Cell::EMPTY));
        assert_eq!(s.pos(), Coord::new(1, 1));
    }

    // ── Painting ──────────────────────────────────────────────────

    #[test]
    fn put_str_writes_cells() {
        let mut s = created(1, 5);
        s.move_to(0, 1);
        s.put_str("hi");
        assert_eq!(s.row_text(0), " hi  ");
    }

    #[test]
    fn put_str_clips_at_right_edge() {
        let mut s = created(1, 3);
        s.move_to(0, 0);
        s.put_str("hello");
        assert_eq!(s.row_text(0), "hel");
    }

    #[test]
    fn put_str_applies_current_face() {
        let mut s = created(1, 4);
        s.set_face(7, Attr::BOLD);
        s.move_to(0, 0);
        s.put_str("x");
        let cell = s.cell(0, 0).unwrap();
        assert_eq!(cell.pair, 7);
        assert_eq!(cell.attrs, Attr::BOLD);
    }

    #[test]
    fn wide_char_leaves_continuation() {
        let mut s = created(1, 4);
        s.move_to(0, 0);
        s.put_str("界x");
        assert!(s.cell(0, 1).unwrap().is_continuation());
        assert_eq!(s.cell(0, 2).unwrap().ch, 'x');
    }

    #[test]
    fn wide_char_straddling_edge_is_dropped() {
        let mut s = created(1, 3);
        s.move_to(0, 2);
        s.put_str("界");
        assert_eq!(s.row_text(0), "   ");
    }

    #[test]
    fn out_of_range_writes_are_noops() {
        let mut s = created(2, 2);
        s.move_to(5, 0);
        s.put_str("x");
        s.move_to(-1, 0);
        s.put_str("y");
        assert_eq!(s.row_text(0), "  ");
        assert_eq!(s.row_text(1), "  ");
    }

    // ── Clearing ──────────────────────────────────────────────────

    #[test]
    fn clear_to_eol_uses_background_pair() {
        let mut s = created(1, 4);
        s.move_to(0, 0);
        s.put_str("abcd");
        s.set_background(3);
        s.move_to(0, 2);
        s.clear_to_eol();
        assert_eq!(s.row_text(0), "ab  ");
        assert_eq!(s.cell(0, 2).unwrap().pair, 3);
        assert_eq!(s.cell(0, 0).unwrap().pair, 0);
    }

    #[test]
    fn clear_fills_everything() {
        let mut s = created(2, 2);
        s.move_to(0, 0);
        s.put_str("ab");
        s.set_background(9);
        s.clear();
        assert_eq!(s.cell(1, 1).unwrap().pair, 9);
        assert_eq!(s.row_text(0), "  ");
    }

    // ── Reading back ──────────────────────────────────────────────

    #[test]
    fn row_out_of_range_is_none() {
        let s = created(2, 2);
        assert!(s.row(2).is_none());
        assert!(s.row(-1).is_none());
        assert!(Surface::new().row(0).is_none());
    }
}
