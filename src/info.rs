// SPDX-License-Identifier: MIT
//
// Info box — word wrapping, box drawing, and placement.
//
// Info boxes carry hover documentation, prompt help, and automatic
// hints. The `Prompt` style draws a speech bubble with a rounded
// border and an optional "assistant" figure to its left; the inline
// styles render bare wrapped text next to an anchor.
//
// Placement prefers the row below the anchor, flips above when the
// box would cross the bottom edge, clamps horizontally, and dodges a
// caller-supplied rectangle (an open menu) so documentation never
// covers the completions it documents. A box that would cover the
// status line is suppressed outright.

use unicode_segmentation::UnicodeSegmentation;

use crate::palette::PairId;
use crate::surface::{Coord, Surface};
use crate::term::Size;

// ─── Assistants ─────────────────────────────────────────────────────────────

/// The figure drawn beside `Prompt` style boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assistant {
    #[default]
    Clippy,
    Cat,
    None,
}

impl Assistant {
    /// The figure's rows. Every row is the same display width; the
    /// last row is the blank padding repeated below the figure.
    #[must_use]
    pub const fn art(self) -> &'static [&'static str] {
        match self {
            Self::Clippy => ASSISTANT_CLIPPY,
            Self::Cat => ASSISTANT_CAT,
            Self::None => &[],
        }
    }
}

const ASSISTANT_CLIPPY: &[&str] = &[
    " ╭──╮   ",
    " │  │   ",
    " @  @  ╭",
    " ││ ││ │",
    " ││ ││ ╯",
    " │╰─╯│  ",
    " ╰───╯  ",
    "        ",
];

const ASSISTANT_CAT: &[&str] = &[
    r"  ___            ",
    r" (__ \           ",
    r"   / /          ╭",
    r"  .' '·.        │",
    r" '      ”       │",
    r" ╰       /\_/|  │",
    r"  | .         \ │",
    r"  ╰_J`    | | | ╯",
    r"      ' \__- _/  ",
    r"      \_\   \_\  ",
    r"                 ",
];

// ─── Layout helpers ─────────────────────────────────────────────────────────

/// Greedy word wrap to `max_width` codepoints.
///
/// Words are appended while the line fits; a single word wider than
/// the width is hard-broken; embedded newlines always break. A run of
/// whitespace at a break point is consumed by the break.
#[must_use]
pub fn wrap_lines(text: &str, max_width: usize) -> Vec<String> {
    debug_assert!(max_width > 0);
    let mut lines = Vec::new();

    for raw in text.split('\n') {
        let mut line = String::new();
        let mut len = 0usize;

        for word in raw.split_word_bounds() {
            let wlen = word.chars().count();
            if len + wlen > max_width {
                if word.trim().is_empty() {
                    // Break at the whitespace run and swallow it.
                    lines.push(std::mem::take(&mut line));
                    len = 0;
                    continue;
                }
                if !line.is_empty() {
                    let flushed = std::mem::take(&mut line);
                    lines.push(flushed.trim_end().to_string());
                    len = 0;
                }
                if wlen > max_width {
                    for ch in word.chars() {
                        if len == max_width {
                            lines.push(std::mem::take(&mut line));
                            len = 0;
                        }
                        line.push(ch);
                        len += 1;
                    }
                    continue;
                }
            }
            line.push_str(word);
            len += wlen;
        }
        lines.push(line);
    }

    // A trailing newline does not warrant an empty last line.
    if text.ends_with('\n') && lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}

/// Extent of a block of text: line count by longest line, in
/// codepoints. A trailing newline is not an extra line.
#[must_use]
pub fn compute_needed_size(text: &str) -> Coord {
    let mut lines = 1;
    let mut cols = 0;
    let mut line_len = 0;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\n' {
            if chars.peek().is_none() {
                break;
            }
            cols = cols.max(line_len);
            line_len = 0;
            lines += 1;
        } else {
            line_len += 1;
            cols = cols.max(line_len);
        }
    }
    Coord::new(lines, cols.max(line_len))
}

/// Place a box of `size` near `anchor` within `scrsize`.
///
/// Below the anchor by default, above when below does not fit (or
/// when `prefer_above` and there is room). The column is clamped to
/// the screen. When the result intersects the avoid rectangle, the
/// box is pushed above it, or below it if above runs off-screen.
#[must_use]
pub fn compute_pos(
    anchor: Coord,
    size: Coord,
    scrsize: Coord,
    avoid_pos: Coord,
    avoid_size: Coord,
    prefer_above: bool,
) -> Coord {
    let mut pos;
    let mut above = prefer_above;
    if above {
        pos = Coord::new(anchor.line - size.line, anchor.col);
        if pos.line < 0 {
            above = false;
        }
    } else {
        pos = anchor;
    }
    if !above {
        pos = Coord::new(anchor.line + 1, anchor.col);
        if pos.line + size.line >= scrsize.line {
            pos.line = (anchor.line - size.line).max(0);
        }
    }
    if pos.col + size.col >= scrsize.col {
        pos.col = (scrsize.col - size.col).max(0);
    }

    if avoid_size != Coord::new(0, 0) {
        let rect_beg = avoid_pos;
        let rect_end = avoid_pos + avoid_size;
        let end = pos + size;

        let intersects = !(end.line < rect_beg.line
            || end.col < rect_beg.col
            || pos.line > rect_end.line
            || pos.col > rect_end.col);
        if intersects {
            pos.line = rect_beg.line.min(anchor.line) - size.line;
            if pos.line < 0 {
                pos.line = rect_end.line.max(anchor.line);
            }
        }
    }

    pos
}

/// Render `message` as a speech bubble, with `assistant` rows on the
/// left. Returns the box as newline-separated rows, or an empty
/// string when `max_width` leaves no room for a bubble.
#[must_use]
pub fn make_info_box(
    title: &str,
    message: &str,
    max_width: usize,
    assistant: &[&str],
) -> String {
    let assistant_rows = assistant.len();
    let assistant_cols = assistant.first().map_or(0, |row| row.chars().count());

    let Some(max_bubble_width) = max_width
        .checked_sub(assistant_cols + 6)
        .filter(|&w| w >= 4)
    else {
        return String::new();
    };

    let lines = wrap_lines(message, max_bubble_width);

    let title_len = title.chars().count();
    let mut bubble_width = title_len + 2;
    for line in &lines {
        bubble_width = bubble_width.max(line.chars().count());
    }

    let line_count = (assistant_rows.saturating_sub(1)).max(lines.len() + 2);
    let mut result = String::new();
    for i in 0..line_count {
        if assistant_rows > 0 {
            result.push_str(assistant[i.min(assistant_rows - 1)]);
        }
        if i == 0 {
            if title.is_empty() {
                result.push_str("╭─");
                result.extend(std::iter::repeat_n('─', bubble_width));
                result.push_str("─╮");
            } else {
                let dash_count = bubble_width - title_len - 2;
                result.push_str("╭─");
                result.extend(std::iter::repeat_n('─', dash_count / 2));
                result.push('┤');
                result.push_str(title);
                result.push('├');
                result.extend(std::iter::repeat_n('─', dash_count - dash_count / 2));
                result.push_str("─╮");
            }
        } else if i < lines.len() + 1 {
            let line = &lines[i - 1];
            let padding = bubble_width - line.chars().count();
            result.push_str("│ ");
            result.push_str(line);
            result.extend(std::iter::repeat_n(' ', padding));
            result.push_str(" │");
        } else if i == lines.len() + 1 {
            result.push_str("╰─");
            result.extend(std::iter::repeat_n('─', bubble_width));
            result.push_str("─╯");
        }
        result.push('\n');
    }
    result
}

// ─── Info ───────────────────────────────────────────────────────────────────

/// How an info box relates to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoStyle {
    /// Speech bubble with assistant, docked near the status line.
    Prompt,
    /// Documentation for the selected menu item, beside the menu.
    MenuDoc,
    /// Bare wrapped text above the anchor.
    InlineAbove,
    /// Bare wrapped text below the anchor.
    InlineBelow,
}

/// Info overlay state plus its backing surface.
pub struct Info {
    surface: Surface,
}

impl Info {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            surface: Surface::new(),
        }
    }

    /// Whether the info box currently owns a surface.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.surface.is_created()
    }

    /// The info box's surface, for compositing.
    #[must_use]
    pub const fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Lay out and display the info box.
    ///
    /// `dimensions` is the main drawing area (terminal minus the
    /// status row); `menu` the open menu's position and size, used
    /// both to dock `MenuDoc` boxes and as the rectangle other styles
    /// must avoid. Suppressed when the available width is under 4
    /// cells or the box would cover the status line.
    #[allow(clippy::too_many_arguments)]
    pub fn show(
        &mut self,
        title: &str,
        content: &str,
        anchor: Coord,
        pair: PairId,
        style: InfoStyle,
        dimensions: Size,
        status_on_top: bool,
        assistant: Assistant,
        menu: Option<(Coord, Coord)>,
    ) {
        self.hide();

        let dims = Coord::new(i32::from(dimensions.rows), i32::from(dimensions.cols));
        let mut anchor = anchor;

        let info_box;
        if style == InfoStyle::Prompt {
            #[allow(clippy::cast_sign_loss)]
            let max_width = dims.col as usize;
            info_box = make_info_box(title, content, max_width, assistant.art());
            anchor = Coord::new(if status_on_top { 0 } else { dims.line }, dims.col - 1);
        } else {
            if status_on_top {
                anchor.line += 1;
            }
            let mut col = anchor.col;
            if style == InfoStyle::MenuDoc {
                if let Some((menu_pos, menu_size)) = menu {
                    col = menu_pos.col + menu_size.col;
                }
            }

            let max_width = dims.col - col;
            if max_width < 4 {
                return;
            }
            #[allow(clippy::cast_sign_loss)]
            let max_width = max_width as usize;

            let mut wrapped = String::new();
            for line in wrap_lines(content, max_width) {
                wrapped.push_str(&line);
                wrapped.push('\n');
            }
            info_box = wrapped;
        }
        if info_box.is_empty() {
            return;
        }

        let size = compute_needed_size(&info_box);
        // Blank content wraps to zero-width lines; there is no box to draw.
        if size.line < 1 || size.col < 1 {
            return;
        }
        let (menu_pos, menu_size) = menu.unwrap_or((Coord::new(0, 0), Coord::new(0, 0)));
        let pos = if style == InfoStyle::MenuDoc && menu.is_some() {
            menu_pos + Coord::new(0, menu_size.col)
        } else {
            compute_pos(
                anchor,
                size,
                dims,
                menu_pos,
                menu_size,
                style == InfoStyle::InlineAbove,
            )
        };

        // The box must not hide the status line.
        if pos.line + size.line > dims.line {
            return;
        }

        self.surface.create(pos, size);
        self.surface.set_background(pair);
        self.surface.clear();
        self.surface.set_face(pair, crate::color::Attr::empty());
        for (i, line) in info_box.split('\n').enumerate() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            self.surface.move_to(i as i32, 0);
            self.surface.put_str(line);
        }
    }

    /// Destroy the surface. Idempotent.
    pub fn hide(&mut self) {
        self.surface.destroy();
    }
}

impl Default for Info {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DIMS: Size = Size { cols: 80, rows: 23 };

    fn show_inline(info: &mut Info, content: &str, anchor: Coord, style: InfoStyle) {
        info.show(
            "",
            content,
            anchor,
            1,
            style,
            DIMS,
            false,
            Assistant::None,
            None,
        );
    }

    // ── wrap_lines ──────────────────────────────────────────────────

    #[test]
    fn short_text_wraps_to_itself() {
        assert_eq!(wrap_lines("hello world", 20), vec!["hello world"]);
    }

    #[test]
    fn wrap_breaks_at_word_boundaries() {
        assert_eq!(
            wrap_lines("alpha beta gamma", 11),
            vec!["alpha beta", "gamma"]
        );
    }

    #[test]
    fn oversized_word_is_hard_broken() {
        assert_eq!(
            wrap_lines("abcdefghij", 4),
            vec!["abcd", "efgh", "ij"]
        );
    }

    #[test]
    fn embedded_newlines_force_breaks() {
        assert_eq!(wrap_lines("a\nb", 10), vec!["a", "b"]);
    }

    #[test]
    fn trailing_newline_adds_no_empty_line() {
        assert_eq!(wrap_lines("abc\n", 10), vec!["abc"]);
    }

    // ── compute_needed_size ─────────────────────────────────────────

    #[test]
    fn needed_size_of_single_line() {
        assert_eq!(compute_needed_size("hello"), Coord::new(1, 5));
    }

    #[test]
    fn needed_size_of_multiple_lines() {
        assert_eq!(compute_needed_size("ab\nabcd\nx"), Coord::new(3, 4));
    }

    #[test]
    fn needed_size_ignores_final_newline() {
        assert_eq!(compute_needed_size("ab\ncd\n"), Coord::new(2, 2));
    }

    // ── compute_pos ─────────────────────────────────────────────────

    const SCREEN: Coord = Coord { line: 24, col: 80 };
    const NO_RECT: Coord = Coord { line: 0, col: 0 };

    #[test]
    fn pos_prefers_below_the_anchor() {
        let pos = compute_pos(
            Coord::new(5, 10),
            Coord::new(3, 20),
            SCREEN,
            NO_RECT,
            NO_RECT,
            false,
        );
        assert_eq!(pos, Coord::new(6, 10));
    }

    #[test]
    fn pos_flips_above_when_below_overflows() {
        let pos = compute_pos(
            Coord::new(22, 10),
            Coord::new(3, 20),
            SCREEN,
            NO_RECT,
            NO_RECT,
            false,
        );
        assert_eq!(pos, Coord::new(19, 10));
    }

    #[test]
    fn pos_clamps_to_the_right_edge() {
        let pos = compute_pos(
            Coord::new(5, 70),
            Coord::new(2, 20),
            SCREEN,
            NO_RECT,
            NO_RECT,
            false,
        );
        assert_eq!(pos.col, 60);
    }

    #[test]
    fn pos_honors_prefer_above() {
        let pos = compute_pos(
            Coord::new(10, 0),
            Coord::new(3, 10),
            SCREEN,
            NO_RECT,
            NO_RECT,
            true,
        );
        assert_eq!(pos, Coord::new(7, 0));
    }

    #[test]
    fn pos_falls_back_below_when_above_is_off_screen() {
        let pos = compute_pos(
            Coord::new(1, 0),
            Coord::new(3, 10),
            SCREEN,
            NO_RECT,
            NO_RECT,
            true,
        );
        assert_eq!(pos, Coord::new(2, 0));
    }

    #[test]
    fn pos_dodges_the_avoid_rectangle() {
        // A box landing inside the menu rectangle moves above it.
        let pos = compute_pos(
            Coord::new(9, 0),
            Coord::new(2, 10),
            SCREEN,
            Coord::new(10, 0),
            Coord::new(5, 30),
            false,
        );
        assert_eq!(pos.line, 7);
    }

    #[test]
    fn pos_goes_below_the_rectangle_when_above_is_off_screen() {
        let pos = compute_pos(
            Coord::new(1, 0),
            Coord::new(5, 10),
            SCREEN,
            Coord::new(0, 0),
            Coord::new(4, 30),
            false,
        );
        assert_eq!(pos.line, 4);
    }

    // ── make_info_box ───────────────────────────────────────────────

    #[test]
    fn box_has_rounded_corners() {
        let boxed = make_info_box("", "hi", 40, &[]);
        let lines: Vec<&str> = boxed.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('╭') && lines[0].ends_with('╮'));
        assert_eq!(lines[1], "│ hi │");
        assert!(lines[2].starts_with('╰') && lines[2].ends_with('╯'));
    }

    #[test]
    fn box_title_is_centered_between_dashes() {
        // Bubble width 6 around a 1-char title: 3 dashes split 1 / 2.
        let boxed = make_info_box("T", "abcdef", 40, &[]);
        let top: Vec<&str> = boxed.lines().collect();
        assert_eq!(top[0], "╭──┤T├───╮");
    }

    #[test]
    fn untitled_box_is_all_dashes_on_top() {
        let boxed = make_info_box("", "abc", 40, &[]);
        let top = boxed.lines().next().unwrap();
        assert_eq!(top.chars().count(), 3 + 2 + 2);
        assert!(top.chars().skip(1).take(5).all(|c| c == '─' || c == '╭'));
    }

    #[test]
    fn box_with_assistant_prefixes_every_row() {
        let art = Assistant::Clippy.art();
        let boxed = make_info_box("", "hi", 40, art);
        for (i, line) in boxed.lines().enumerate() {
            let prefix: String = line.chars().take(8).collect();
            assert_eq!(prefix, art[i.min(art.len() - 1)]);
        }
        // Height covers the figure: clippy has 8 rows, minus one.
        assert_eq!(boxed.lines().count(), 7);
    }

    #[test]
    fn too_narrow_for_a_bubble_yields_nothing() {
        assert_eq!(make_info_box("", "hi", 9, &[]), "");
    }

    // ── Info ────────────────────────────────────────────────────────

    #[test]
    fn inline_box_sits_below_its_anchor() {
        let mut info = Info::new();
        show_inline(&mut info, "some hint", Coord::new(4, 2), InfoStyle::InlineBelow);
        assert!(info.is_visible());
        assert_eq!(info.surface().pos(), Coord::new(5, 2));
        assert_eq!(info.surface().row_text(0), "some hint");
    }

    #[test]
    fn inline_above_prefers_the_row_above() {
        let mut info = Info::new();
        show_inline(&mut info, "hint", Coord::new(4, 2), InfoStyle::InlineAbove);
        assert_eq!(info.surface().pos(), Coord::new(3, 2));
    }

    #[test]
    fn prompt_box_docks_at_the_bottom_right() {
        let mut info = Info::new();
        info.show(
            "",
            "hello",
            Coord::new(0, 0),
            1,
            InfoStyle::Prompt,
            DIMS,
            false,
            Assistant::Clippy,
            None,
        );
        assert!(info.is_visible());
        // Docked against the right edge, above the status anchor.
        let pos = info.surface().pos();
        let size = info.surface().size();
        assert_eq!(pos.col + size.col, 80);
        assert!(pos.line + size.line <= 23);
        // First row carries the assistant and the top border.
        assert!(info.surface().row_text(0).contains('╭'));
    }

    #[test]
    fn menu_doc_docks_beside_the_menu() {
        let mut info = Info::new();
        info.show(
            "",
            "doc",
            Coord::new(0, 0),
            1,
            InfoStyle::MenuDoc,
            DIMS,
            false,
            Assistant::None,
            Some((Coord::new(5, 10), Coord::new(4, 20))),
        );
        assert_eq!(info.surface().pos(), Coord::new(5, 30));
    }

    #[test]
    fn empty_content_inline_is_suppressed() {
        let mut info = Info::new();
        show_inline(&mut info, "", Coord::new(4, 2), InfoStyle::InlineBelow);
        assert!(!info.is_visible());
    }

    #[test]
    fn empty_content_menu_doc_is_suppressed() {
        let mut info = Info::new();
        info.show(
            "",
            "",
            Coord::new(0, 0),
            1,
            InfoStyle::MenuDoc,
            DIMS,
            false,
            Assistant::None,
            Some((Coord::new(5, 10), Coord::new(4, 20))),
        );
        assert!(!info.is_visible());
    }

    #[test]
    fn too_narrow_inline_is_suppressed() {
        let mut info = Info::new();
        show_inline(&mut info, "hint", Coord::new(4, 78), InfoStyle::InlineBelow);
        assert!(!info.is_visible());
    }

    #[test]
    fn box_covering_the_status_line_is_suppressed() {
        let mut info = Info::new();
        let tall = "line\n".repeat(30);
        show_inline(&mut info, &tall, Coord::new(0, 0), InfoStyle::InlineBelow);
        assert!(!info.is_visible());
    }

    #[test]
    fn hide_is_idempotent() {
        let mut info = Info::new();
        show_inline(&mut info, "x", Coord::new(2, 2), InfoStyle::InlineBelow);
        info.hide();
        assert!(!info.is_visible());
        info.hide();
        assert!(!info.is_visible());
    }
}
