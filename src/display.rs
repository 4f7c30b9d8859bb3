// SPDX-License-Identifier: MIT
//
// Display model — the editor core's already-laid-out frame content.
//
// The UI layer never computes *what* to show; it receives an ordered
// sequence of styled text runs per line and paints them. An atom whose
// text ends in '\n' marks a soft line end: when it fits, the newline is
// rendered as a single trailing space so the terminal never wraps.

use crate::color::Face;

/// One styled run of text within a display line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayAtom {
    pub face: Face,
    pub text: String,
}

impl DisplayAtom {
    #[must_use]
    pub fn new(face: Face, text: impl Into<String>) -> Self {
        Self {
            face,
            text: text.into(),
        }
    }

    /// Length in codepoints.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// One line of the display model: ordered atoms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayLine {
    pub atoms: Vec<DisplayAtom>,
}

impl DisplayLine {
    #[must_use]
    pub const fn new(atoms: Vec<DisplayAtom>) -> Self {
        Self { atoms }
    }

    /// A single-atom line in one face.
    #[must_use]
    pub fn plain(face: Face, text: impl Into<String>) -> Self {
        Self {
            atoms: vec![DisplayAtom::new(face, text)],
        }
    }

    /// Total length in codepoints across all atoms.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.atoms.iter().map(DisplayAtom::char_len).sum()
    }

    /// Concatenated text of all atoms (used for window titles).
    #[must_use]
    pub fn text(&self) -> String {
        self.atoms.iter().map(|a| a.text.as_str()).collect()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Color, Face};

    #[test]
    fn char_len_counts_codepoints() {
        let atom = DisplayAtom::new(Face::default(), "héllo");
        assert_eq!(atom.char_len(), 5);
    }

    #[test]
    fn line_len_sums_atoms() {
        let face = Face::new(Color::Red, Color::Default);
        let line = DisplayLine::new(vec![
            DisplayAtom::new(face, "ab"),
            DisplayAtom::new(Face::default(), "cde"),
        ]);
        assert_eq!(line.char_len(), 5);
        assert_eq!(line.text(), "abcde");
    }

    #[test]
    fn plain_builds_single_atom() {
        let line = DisplayLine::plain(Face::default(), "x");
        assert_eq!(line.atoms.len(), 1);
    }
}
