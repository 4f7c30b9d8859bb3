// SPDX-License-Identifier: MIT
//
// Palette resolver — abstract colors to terminal-native slots and pairs.
//
// Terminals disagree wildly about color. Some expose 256 redefinable
// palette slots, some a fixed 256-color table, some only the 8 ANSI
// colors. This module hides that behind two operations:
//
//   resolve_color — `Color` to a native palette index. Named colors map
//   to the fixed ANSI slots, `Default` to -1 ("no color"). RGB colors
//   get a dynamic slot from a ring allocator starting at 16 when the
//   terminal can redefine colors, or the nearest entry of the standard
//   xterm palette when it cannot.
//
//   resolve_pair — `(fg, bg)` to a small stable pair id. Pairs are
//   cached and never reclaimed; an id issued once stays valid for the
//   whole session, so surfaces can store ids instead of faces.
//
// The resolver owns all of its caches. The original design kept these
// in process-wide statics; holding them in a value means two UI
// instances (say, under test) cannot poison each other.
//
// The ring allocator is deliberately simple: when slots run out it
// wraps back to 16 and overwrites the oldest allocation. Entries cached
// for an overwritten slot keep pointing at it and will show the new
// color; sessions that burn through 240 distinct RGB values per frame
// have bigger problems.

use std::collections::BTreeMap;

use crate::color::{Color, Face};

// ─── Native index and pair id ───────────────────────────────────────────────

/// A terminal-native color index. `-1` means "terminal default".
pub type NativeColor = i16;

/// A cached (foreground, background) combination. Id `0` is the
/// implicit default pair; allocated pairs start at 1 and grow
/// monotonically.
pub type PairId = u16;

/// The native index meaning "no color" (terminal default).
pub const NO_COLOR: NativeColor = -1;

/// First palette slot available to dynamic RGB allocation. Slots 0–15
/// belong to the ANSI colors and their bright variants.
const FIRST_DYNAMIC_SLOT: usize = 16;

// ─── Reference palette ──────────────────────────────────────────────────────

/// The standard xterm 256-color reference palette.
///
/// 16 ANSI entries, the 6×6×6 color cube (channel levels 0x00, 0x5f,
/// 0x87, 0xaf, 0xd7, 0xff), and the 24-step gray ramp. Quantization
/// targets this table, and `restore` reprograms redefined slots back
/// to it on shutdown.
pub static REFERENCE_PALETTE: [(u8, u8, u8); 256] = reference_palette();

/// ANSI colors 0–15 as most terminals ship them.
const ANSI_16: [(u8, u8, u8); 16] = [
    (0x00, 0x00, 0x00),
    (0x80, 0x00, 0x00),
    (0x00, 0x80, 0x00),
    (0x80, 0x80, 0x00),
    (0x00, 0x00, 0x80),
    (0x80, 0x00, 0x80),
    (0x00, 0x80, 0x80),
    (0xc0, 0xc0, 0xc0),
    (0x80, 0x80, 0x80),
    (0xff, 0x00, 0x00),
    (0x00, 0xff, 0x00),
    (0xff, 0xff, 0x00),
    (0x00, 0x00, 0xff),
    (0xff, 0x00, 0xff),
    (0x00, 0xff, 0xff),
    (0xff, 0xff, 0xff),
];

/// Channel levels of the 6×6×6 cube.
const CUBE_LEVELS: [u8; 6] = [0x00, 0x5f, 0x87, 0xaf, 0xd7, 0xff];

const fn reference_palette() -> [(u8, u8, u8); 256] {
    let mut table = [(0u8, 0u8, 0u8); 256];

    let mut i = 0;
    while i < 16 {
        table[i] = ANSI_16[i];
        i += 1;
    }

    // Cube: index = 16 + 36r + 6g + b.
    let mut r = 0;
    while r < 6 {
        let mut g = 0;
        while g < 6 {
            let mut b = 0;
            while b < 6 {
                table[16 + 36 * r + 6 * g + b] =
                    (CUBE_LEVELS[r], CUBE_LEVELS[g], CUBE_LEVELS[b]);
                b += 1;
            }
            g += 1;
        }
        r += 1;
    }

    // Gray ramp: 8, 18, 28, … 238.
    let mut s = 0;
    while s < 24 {
        let v = 8 + 10 * s as u8;
        table[232 + s] = (v, v, v);
        s += 1;
    }

    table
}

// ─── Backend capability seam ────────────────────────────────────────────────

/// The slice of terminal capability the palette resolver needs.
///
/// Implemented by the real terminal (`Term`) and by test doubles.
/// Color components handed to [`redefine_color`](Backend::redefine_color)
/// are pre-scaled to the curses-native 0..=1000 range.
pub trait Backend {
    /// Whether palette slots can be reprogrammed at runtime.
    fn can_redefine_colors(&self) -> bool;

    /// Number of palette slots the terminal exposes.
    fn palette_slots(&self) -> usize;

    /// Program a palette slot. Components are in 0..=1000.
    fn redefine_color(&mut self, slot: u16, r: u16, g: u16, b: u16);
}

/// Scale an 8-bit component to the 0..=1000 backend range, rounded.
/// Widened to `u32` for the intermediate product: `255 * 1000`
/// exceeds `u16`.
#[inline]
#[must_use]
pub const fn scale_component(c: u8) -> u16 {
    ((c as u32 * 1000 + 127) / 255) as u16
}

// ─── Palette ────────────────────────────────────────────────────────────────

/// Owned palette and pair state for one UI session.
///
/// Caches only grow. A `PairId` issued for a `(fg, bg)` combination is
/// stable until the session ends; a new distinct combination always
/// receives a strictly larger id.
pub struct Palette {
    /// RGB color → allocated dynamic slot.
    slot_cache: BTreeMap<Color, NativeColor>,
    /// Next slot the ring allocator will hand out.
    next_slot: usize,
    /// Whether any slot was actually reprogrammed (gates restore).
    redefined: bool,
    /// Resolved (fg, bg) → pair id.
    pair_cache: BTreeMap<(Color, Color), PairId>,
    /// Pair id − 1 → native (fg, bg), read back by the renderer.
    pairs: Vec<(NativeColor, NativeColor)>,
}

impl Palette {
    /// An empty palette: no slots allocated, no pairs issued.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot_cache: BTreeMap::new(),
            next_slot: FIRST_DYNAMIC_SLOT,
            redefined: false,
            pair_cache: BTreeMap::new(),
            pairs: Vec::new(),
        }
    }

    /// Resolve an abstract color to a native palette index.
    ///
    /// Named colors use the fixed ANSI slots; `Default` is [`NO_COLOR`].
    /// RGB colors allocate (and program) a dynamic slot when the
    /// backend supports redefinition and has more than 16 slots, and
    /// quantize to the nearest reference entry otherwise.
    pub fn resolve_color(&mut self, backend: &mut impl Backend, color: Color) -> NativeColor {
        match color {
            Color::Default => NO_COLOR,
            Color::Black => 0,
            Color::Red => 1,
            Color::Green => 2,
            Color::Yellow => 3,
            Color::Blue => 4,
            Color::Magenta => 5,
            Color::Cyan => 6,
            Color::White => 7,
            Color::Rgb(r, g, b) => {
                if let Some(&slot) = self.slot_cache.get(&color) {
                    return slot;
                }
                let slots = backend.palette_slots();
                if backend.can_redefine_colors() && slots > FIRST_DYNAMIC_SLOT {
                    self.allocate_slot(backend, color, r, g, b)
                } else {
                    nearest_reference(r, g, b, slots)
                }
            }
        }
    }

    /// Take the next slot from the ring, program it, and cache it.
    fn allocate_slot(
        &mut self,
        backend: &mut impl Backend,
        color: Color,
        r: u8,
        g: u8,
        b: u8,
    ) -> NativeColor {
        if self.next_slot >= backend.palette_slots() {
            self.next_slot = FIRST_DYNAMIC_SLOT;
        }
        // Ring slots stay within 16..=palette_slots() <= usize of a
        // terminal palette; the casts cannot truncate in practice.
        #[allow(clippy::cast_possible_truncation)]
        let slot = self.next_slot as u16;
        backend.redefine_color(
            slot,
            scale_component(r),
            scale_component(g),
            scale_component(b),
        );
        self.redefined = true;
        #[allow(clippy::cast_possible_wrap)]
        let native = slot as NativeColor;
        self.slot_cache.insert(color, native);
        self.next_slot += 1;
        native
    }

    /// Resolve a face (already default-substituted) to a pair id.
    ///
    /// A face whose colors are both still `Default` maps to pair 0,
    /// the terminal's implicit default pair.
    pub fn resolve_pair(&mut self, backend: &mut impl Backend, face: Face) -> PairId {
        if face.fg == Color::Default && face.bg == Color::Default {
            return 0;
        }
        let key = (face.fg, face.bg);
        if let Some(&id) = self.pair_cache.get(&key) {
            return id;
        }
        let fg = self.resolve_color(backend, face.fg);
        let bg = self.resolve_color(backend, face.bg);
        self.pairs.push((fg, bg));
        // Pair ids count real terminal color pairs; they stay tiny.
        #[allow(clippy::cast_possible_truncation)]
        let id = self.pairs.len() as PairId;
        self.pair_cache.insert(key, id);
        id
    }

    /// Native colors of an issued pair. Pair 0 is (default, default);
    /// unknown ids degrade to the same.
    #[must_use]
    pub fn pair(&self, id: PairId) -> (NativeColor, NativeColor) {
        if id == 0 {
            return (NO_COLOR, NO_COLOR);
        }
        self.pairs
            .get(usize::from(id) - 1)
            .copied()
            .unwrap_or((NO_COLOR, NO_COLOR))
    }

    /// Number of pairs issued so far.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Reprogram slots 16.. back to the reference palette.
    ///
    /// No-op unless a slot was actually redefined this session (or the
    /// backend cannot redefine at all).
    pub fn restore(&mut self, backend: &mut impl Backend) {
        if !self.redefined || !backend.can_redefine_colors() {
            return;
        }
        let limit = backend.palette_slots().min(REFERENCE_PALETTE.len());
        for slot in FIRST_DYNAMIC_SLOT..limit {
            let (r, g, b) = REFERENCE_PALETTE[slot];
            // Bounded by the 256-entry reference table.
            #[allow(clippy::cast_possible_truncation)]
            backend.redefine_color(
                slot as u16,
                scale_component(r),
                scale_component(g),
                scale_component(b),
            );
        }
        self.redefined = false;
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

/// Index of the reference entry nearest to `(r, g, b)` by squared
/// Euclidean distance, scanning at most `limit` entries in ascending
/// order. Ties keep the first (lowest) index — a property of the scan
/// order, not a guarantee that survives reordering the palette.
fn nearest_reference(r: u8, g: u8, b: u8, limit: usize) -> NativeColor {
    let limit = limit.min(REFERENCE_PALETTE.len()).max(1);
    let mut best = 0usize;
    let mut best_dist = u32::MAX;
    for (i, &(pr, pg, pb)) in REFERENCE_PALETTE[..limit].iter().enumerate() {
        let dist = sq_diff(r, pr) + sq_diff(g, pg) + sq_diff(b, pb);
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    // limit <= 256, so the index fits.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    {
        best as NativeColor
    }
}

#[inline]
fn sq_diff(a: u8, b: u8) -> u32 {
    let d = i32::from(a) - i32::from(b);
    #[allow(clippy::cast_sign_loss)]
    {
        (d * d) as u32
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
