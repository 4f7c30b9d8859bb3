// SPDX-License-Identifier: MIT
//
// Colors, attributes, and faces — the style vocabulary of the UI.
//
// A `Color` is either the terminal's default, one of the eight named
// ANSI colors, or a 24-bit RGB value. Colors are cheap `Copy` values
// with total ordering and hashing because the palette resolver uses
// them as cache keys.
//
// A `Face` pairs a foreground and background color with a set of text
// attributes. Faces arrive from the editor core with `Default`
// components meaning "inherit"; `resolved_against` substitutes the
// session's default face before the palette resolver ever sees them.

use bitflags::bitflags;

// ─── Color ──────────────────────────────────────────────────────────────────

/// An abstract terminal color.
///
/// The derived ordering places `Rgb` after all named colors and orders
/// RGB values lexicographically by `(r, g, b)` — exactly what the
/// palette caches need from their keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Color {
    /// The terminal's own default foreground or background.
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    /// A 24-bit color, resolved to a palette slot or quantized.
    Rgb(u8, u8, u8),
}

impl Color {
    /// Whether this is an RGB color (as opposed to default/named).
    #[inline]
    #[must_use]
    pub const fn is_rgb(self) -> bool {
        matches!(self, Self::Rgb(..))
    }
}

// ─── Attributes ─────────────────────────────────────────────────────────────

bitflags! {
    /// Text attributes carried alongside a color pair.
    ///
    /// These map one-to-one onto SGR parameters. Combine with bitwise
    /// OR:
    ///
    /// ```
    /// use sel_term::color::Attr;
    ///
    /// let style = Attr::BOLD | Attr::UNDERLINE;
    /// assert!(style.contains(Attr::BOLD));
    /// assert!(!style.contains(Attr::REVERSE));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u8 {
        /// SGR 4 — underlined text.
        const UNDERLINE = 1 << 0;
        /// SGR 7 — swap foreground and background.
        const REVERSE   = 1 << 1;
        /// SGR 5 — blinking text.
        const BLINK     = 1 << 2;
        /// SGR 1 — increased intensity.
        const BOLD      = 1 << 3;
        /// SGR 2 — decreased intensity.
        const DIM       = 1 << 4;
        /// SGR 3 — italic (not universally supported; omitted
        /// gracefully by terminals that lack it).
        const ITALIC    = 1 << 5;
    }
}

// ─── Face ───────────────────────────────────────────────────────────────────

/// A style descriptor: foreground, background, and attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Face {
    pub fg: Color,
    pub bg: Color,
    pub attrs: Attr,
}

impl Face {
    /// A face with explicit colors and no attributes.
    #[inline]
    #[must_use]
    pub const fn new(fg: Color, bg: Color) -> Self {
        Self {
            fg,
            bg,
            attrs: Attr::empty(),
        }
    }

    /// Attach attributes to this face.
    #[inline]
    #[must_use]
    pub const fn with_attrs(mut self, attrs: Attr) -> Self {
        self.attrs = attrs;
        self
    }

    /// Substitute `Default` components from `default`.
    ///
    /// Attributes are kept as-is: inheritance applies to colors only.
    #[must_use]
    pub fn resolved_against(mut self, default: Self) -> Self {
        if self.fg == Color::Default {
            self.fg = default.fg;
        }
        if self.bg == Color::Default {
            self.bg = default.bg;
        }
        self
    }
}

impl Default for Face {
    fn default() -> Self {
        Self::new(Color::Default, Color::Default)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Color ordering ────────────────────────────────────────────

    #[test]
    fn named_colors_order_before_rgb() {
        assert!(Color::White < Color::Rgb(0, 0, 0));
        assert!(Color::Default < Color::Black);
    }

    #[test]
    fn rgb_orders_lexicographically() {
        assert!(Color::Rgb(1, 0, 0) < Color::Rgb(2, 0, 0));
        assert!(Color::Rgb(1, 5, 0) < Color::Rgb(1, 6, 0));
        assert!(Color::Rgb(1, 5, 3) < Color::Rgb(1, 5, 4));
        assert!(Color::Rgb(0, 255, 255) < Color::Rgb(1, 0, 0));
    }

    #[test]
    fn color_is_rgb() {
        assert!(Color::Rgb(1, 2, 3).is_rgb());
        assert!(!Color::Red.is_rgb());
        assert!(!Color::Default.is_rgb());
    }

    // ── Attr ──────────────────────────────────────────────────────

    #[test]
    fn attr_combination() {
        let a = Attr::BOLD | Attr::DIM;
        assert!(a.contains(Attr::BOLD));
        assert!(a.contains(Attr::DIM));
        assert!(!a.contains(Attr::ITALIC));
    }

    #[test]
    fn attr_default_is_empty() {
        assert_eq!(Attr::default(), Attr::empty());
    }

    // ── Face resolution ───────────────────────────────────────────

    #[test]
    fn resolve_substitutes_default_fg() {
        let default = Face::new(Color::White, Color::Black);
        let face = Face::new(Color::Default, Color::Blue);
        let resolved = face.resolved_against(default);
        assert_eq!(resolved.fg, Color::White);
        assert_eq!(resolved.bg, Color::Blue);
    }

    #[test]
    fn resolve_substitutes_default_bg() {
        let default = Face::new(Color::White, Color::Black);
        let face = Face::new(Color::Red, Color::Default);
        let resolved = face.resolved_against(default);
        assert_eq!(resolved.fg, Color::Red);
        assert_eq!(resolved.bg, Color::Black);
    }

    #[test]
    fn resolve_keeps_explicit_components() {
        let default = Face::new(Color::White, Color::Black);
        let face = Face::new(Color::Rgb(1, 2, 3), Color::Cyan);
        assert_eq!(face.resolved_against(default), face);
    }

    #[test]
    fn resolve_keeps_attributes() {
        let default = Face::new(Color::White, Color::Black);
        let face = Face::new(Color::Default, Color::Default).with_attrs(Attr::REVERSE);
        assert_eq!(face.resolved_against(default).attrs, Attr::REVERSE);
    }

    #[test]
    fn default_face_is_default_colors() {
        let face = Face::default();
        assert_eq!(face.fg, Color::Default);
        assert_eq!(face.bg, Color::Default);
        assert!(face.attrs.is_empty());
    }
}
