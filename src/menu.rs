// SPDX-License-Identifier: MIT
//
// Completion menu — layout, pagination, and rendering.
//
// The menu is an overlay surface anchored to a screen coordinate. Two
// styles exist: `Prompt` menus span the full width just above (or
// below) the status line and lay items out in columns; `Context`
// menus pop up at the anchor in a single column sized to the longest
// item. Items are paginated: at most ten rows are visible, and a
// one-column indicator on the right edge shows where the visible
// window sits within the full item list.
//
// All layout happens in `show` and `select`; rendering writes cells
// into the menu's own surface, which the compositor stacks over the
// main surface. Geometry that cannot fit (available width ≤ 2) makes
// `show` a no-op, so callers never have to pre-validate.

use crate::color::Attr;
use crate::palette::PairId;
use crate::surface::{Coord, Surface};
use crate::term::Size;

/// Longest item ever kept, in codepoints. Anything longer is cut.
const MAX_ITEM_LEN: usize = 200;

/// Most rows a menu will occupy.
const MAX_VISIBLE_ROWS: usize = 10;

/// Scroll indicator cells: filled marks the visible window.
const MARK_ON: char = '█';
const MARK_OFF: char = '░';

/// How menu items are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuStyle {
    /// Full-width, multi-column, docked against the status line.
    Prompt,
    /// Single column at the anchor position.
    Context,
}

/// Ceiling division, with zero items still occupying one row: an empty
/// menu shows as a single blank row rather than not at all.
const fn div_round_up(a: usize, b: usize) -> usize {
    if a == 0 { 1 } else { (a - 1) / b + 1 }
}

/// Menu overlay state plus its backing surface.
pub struct Menu {
    surface: Surface,
    items: Vec<String>,
    columns: usize,
    top_line: usize,
    selected: Option<usize>,
    fg: PairId,
    bg: PairId,
}

impl Menu {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            surface: Surface::new(),
            items: Vec::new(),
            columns: 1,
            top_line: 0,
            selected: None,
            fg: 0,
            bg: 0,
        }
    }

    /// Whether the menu currently owns a surface.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.surface.is_created()
    }

    /// The menu's surface, for compositing.
    #[must_use]
    pub const fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Number of layout columns. Meaningful only while visible.
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Topmost visible item row.
    #[must_use]
    pub const fn top_line(&self) -> usize {
        self.top_line
    }

    /// Currently selected item index, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Visible height in rows. Zero while hidden.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn height(&self) -> usize {
        self.surface.size().line as usize
    }

    #[allow(clippy::cast_sign_loss)]
    const fn width(&self) -> usize {
        self.surface.size().col as usize
    }

    /// Lay out and display the menu.
    ///
    /// `dimensions` is the main drawing area (terminal minus the
    /// status row). Hides any menu already showing. A no-op when the
    /// available width right of the anchor is 2 cells or less.
    #[allow(clippy::too_many_arguments)]
    pub fn show(
        &mut self,
        items: &[String],
        anchor: Coord,
        fg: PairId,
        bg: PairId,
        style: MenuStyle,
        dimensions: Size,
        status_on_top: bool,
    ) {
        self.hide();

        self.fg = fg;
        self.bg = bg;

        let mut anchor = anchor;
        match style {
            MenuStyle::Prompt => {
                anchor = Coord::new(
                    if status_on_top {
                        0
                    } else {
                        i32::from(dimensions.rows)
                    },
                    0,
                );
            }
            MenuStyle::Context => {
                if status_on_top {
                    anchor.line += 1;
                }
            }
        }

        let avail_cols = i32::from(dimensions.cols) - anchor.col;
        if avail_cols <= 2 {
            return;
        }
        #[allow(clippy::cast_sign_loss)]
        let avail = avail_cols as usize;

        let max_len = MAX_ITEM_LEN.min(avail - 2);
        self.items = items
            .iter()
            .map(|item| item.chars().take(max_len).collect())
            .collect();

        let longest = self
            .items
            .iter()
            .map(|item| item.chars().count())
            .max()
            .unwrap_or(0)
            + 1;

        let is_prompt = style == MenuStyle::Prompt;
        let columns = if is_prompt {
            ((avail - 1) / longest).max(1)
        } else {
            1
        };

        let height = MAX_VISIBLE_ROWS.min(div_round_up(self.items.len(), columns));

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let height_i = height as i32;
        let mut line = anchor.line + 1;
        if line + height_i >= i32::from(dimensions.rows) {
            line = anchor.line - height_i;
        }

        self.columns = columns;
        self.top_line = 0;
        self.selected = None;

        let width = if is_prompt { avail } else { longest };

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        self.surface
            .create(Coord::new(line, anchor.col), Coord::new(height_i, width as i32));
        self.render();
    }

    /// Move the selection, scrolling the visible window to keep it on
    /// screen. Any out-of-range index clears the selection and resets
    /// the scroll to the top.
    pub fn select(&mut self, selected: i32) {
        if !self.is_visible() {
            return;
        }

        let item_count = self.items.len();
        let total_rows = div_round_up(item_count, self.columns);

        #[allow(clippy::cast_sign_loss)]
        if selected < 0 || selected as usize >= item_count {
            self.selected = None;
            self.top_line = 0;
        } else {
            let selected = selected as usize;
            self.selected = Some(selected);
            let selected_row = selected / self.columns;
            let height = self.height();
            if selected_row < self.top_line {
                self.top_line = selected_row;
            }
            if selected_row >= self.top_line + height {
                self.top_line = selected_row.min(total_rows - height);
            }
        }
        self.render();
    }

    /// Drop the items and destroy the surface. Idempotent.
    pub fn hide(&mut self) {
        self.items.clear();
        self.columns = 1;
        self.top_line = 0;
        self.selected = None;
        self.surface.destroy();
    }

    /// Redraw every visible cell into the surface.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn render(&mut self) {
        if !self.is_visible() {
            return;
        }

        let height = self.height();
        let width = self.width();
        let item_count = self.items.len();
        let total_rows = div_round_up(item_count, self.columns);
        let column_width = (width - 1) / self.columns;

        let mark_height = div_round_up(height * height, total_rows).min(height);
        let mark_line = (height - mark_height) * self.top_line / (total_rows - height).max(1);

        self.surface.set_background(self.bg);
        for line in 0..height {
            self.surface.move_to(line as i32, 0);
            for col in 0..self.columns {
                let item_idx = (self.top_line + line) * self.columns + col;
                if item_idx >= item_count {
                    break;
                }
                let pair = if Some(item_idx) == self.selected {
                    self.fg
                } else {
                    self.bg
                };
                self.surface.set_face(pair, Attr::empty());

                let item: String = self.items[item_idx].chars().take(column_width).collect();
                let pad = column_width - item.chars().count();
                self.surface.put_str(&item);
                for _ in 0..pad {
                    self.surface.put_char(' ');
                }
            }
            self.surface.set_face(self.bg, Attr::empty());
            self.surface.clear_to_eol();

            let is_mark = line >= mark_line && line < mark_line + mark_height;
            self.surface.move_to(line as i32, (width - 1) as i32);
            self.surface
                .put_char(if is_mark { MARK_ON } else { MARK_OFF });
        }
    }
}

impl Default for Menu {
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

    fn items(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("item{i}")).collect()
    }

    fn long_items(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("a-very-long-item-{i:040}")).collect()
    }

    fn show_prompt(menu: &mut Menu, items: &[String]) {
        menu.show(
            items,
            Coord::new(0, 0),
            1,
            2,
            MenuStyle::Prompt,
            DIMS,
            false,
        );
    }

    #[test]
    fn div_round_up_rounds_up() {
        assert_eq!(div_round_up(25, 5), 5);
        assert_eq!(div_round_up(26, 5), 6);
        assert_eq!(div_round_up(1, 5), 1);
        assert_eq!(div_round_up(0, 5), 1);
    }

    #[test]
    fn empty_item_list_shows_a_single_blank_row() {
        let mut menu = Menu::new();
        show_prompt(&mut menu, &[]);
        assert!(menu.is_visible());
        assert_eq!(menu.height(), 1);
        // One blank row with only the scroll mark on the right edge.
        assert_eq!(menu.surface().row_text(0).trim_end(), MARK_ON.to_string());
        menu.select(0);
        assert_eq!(menu.selected(), None);
    }

    #[test]
    fn prompt_menu_spans_full_width() {
        let mut menu = Menu::new();
        show_prompt(&mut menu, &items(5));
        assert!(menu.is_visible());
        assert_eq!(menu.surface().size().col, 80);
    }

    #[test]
    fn prompt_menu_computes_columns_from_longest_item() {
        let mut menu = Menu::new();
        show_prompt(&mut menu, &items(25));
        // Longest item "item24" is 6 chars, +1 → 7; (80-1)/7 = 11.
        assert_eq!(menu.columns(), 11);
    }

    #[test]
    fn context_menu_is_single_column() {
        let mut menu = Menu::new();
        menu.show(
            &items(5),
            Coord::new(3, 10),
            1,
            2,
            MenuStyle::Context,
            DIMS,
            false,
        );
        assert_eq!(menu.columns(), 1);
        // Width is longest item + 1.
        assert_eq!(menu.surface().size().col, 6);
    }

    #[test]
    fn twenty_five_items_in_five_columns_take_five_rows() {
        // Items wide enough that exactly 5 columns fit in 80 cells:
        // each is 14 chars, +1 → 15; (80-1)/15 = 5.
        let wide: Vec<String> = (0..25).map(|i| format!("entry-{i:08}")).collect();
        let mut menu = Menu::new();
        show_prompt(&mut menu, &wide);
        assert_eq!(menu.columns(), 5);
        assert_eq!(menu.height(), 5);
    }

    #[test]
    fn visible_height_caps_at_ten_rows() {
        let mut menu = Menu::new();
        show_prompt(&mut menu, &long_items(50));
        assert_eq!(menu.columns(), 1);
        assert_eq!(menu.height(), 10);
    }

    #[test]
    fn prompt_menu_sits_above_the_status_line() {
        let mut menu = Menu::new();
        show_prompt(&mut menu, &items(5));
        // Anchor is the status row (23); one row tall, placed above.
        assert_eq!(menu.surface().pos(), Coord::new(22, 0));
    }

    #[test]
    fn context_menu_prefers_below_the_anchor() {
        let mut menu = Menu::new();
        menu.show(
            &items(3),
            Coord::new(5, 4),
            1,
            2,
            MenuStyle::Context,
            DIMS,
            false,
        );
        assert_eq!(menu.surface().pos(), Coord::new(6, 4));
    }

    #[test]
    fn context_menu_flips_above_when_it_does_not_fit() {
        let mut menu = Menu::new();
        menu.show(
            &items(3),
            Coord::new(21, 4),
            1,
            2,
            MenuStyle::Context,
            DIMS,
            false,
        );
        // 22 + 3 >= 23, so the menu goes above: 21 − 3 = 18.
        assert_eq!(menu.surface().pos(), Coord::new(18, 4));
    }

    #[test]
    fn show_starts_with_no_selection() {
        let mut menu = Menu::new();
        show_prompt(&mut menu, &items(5));
        assert_eq!(menu.selected(), None);
        assert_eq!(menu.top_line(), 0);
    }

    #[test]
    fn select_valid_index() {
        let mut menu = Menu::new();
        show_prompt(&mut menu, &items(5));
        menu.select(2);
        assert_eq!(menu.selected(), Some(2));
    }

    #[test]
    fn select_out_of_range_clears_selection() {
        let mut menu = Menu::new();
        show_prompt(&mut menu, &items(5));
        menu.select(2);
        menu.select(-1);
        assert_eq!(menu.selected(), None);
        assert_eq!(menu.top_line(), 0);
        menu.select(99);
        assert_eq!(menu.selected(), None);
    }

    #[test]
    fn selection_scrolls_the_window_down() {
        let mut menu = Menu::new();
        show_prompt(&mut menu, &long_items(50));
        // Row 25 is beyond top+height (0+10): the window moves, with
        // top clamped to total_rows − height = 40.
        menu.select(25);
        assert_eq!(menu.top_line(), 25);
        menu.select(49);
        assert_eq!(menu.top_line(), 40);
    }

    #[test]
    fn selection_scrolls_the_window_back_up() {
        let mut menu = Menu::new();
        show_prompt(&mut menu, &long_items(50));
        menu.select(49);
        menu.select(3);
        assert_eq!(menu.top_line(), 3);
    }

    #[test]
    fn items_are_truncated_to_available_width() {
        let huge = vec!["x".repeat(500)];
        let mut menu = Menu::new();
        show_prompt(&mut menu, &huge);
        // min(200, 80−2) = 78 codepoints kept.
        assert_eq!(menu.surface().size().col, 80);
        let row = menu.surface().row_text(0);
        assert!(row.starts_with(&"x".repeat(78)));
    }

    #[test]
    fn no_op_when_too_narrow() {
        let mut menu = Menu::new();
        menu.show(
            &items(3),
            Coord::new(0, 78),
            1,
            2,
            MenuStyle::Context,
            DIMS,
            false,
        );
        assert!(!menu.is_visible());
    }

    #[test]
    fn hide_is_idempotent() {
        let mut menu = Menu::new();
        show_prompt(&mut menu, &items(3));
        menu.hide();
        assert!(!menu.is_visible());
        menu.hide();
        assert!(!menu.is_visible());
    }

    #[test]
    fn scroll_indicator_marks_visible_window() {
        let mut menu = Menu::new();
        show_prompt(&mut menu, &long_items(50));
        let height = menu.height();
        let last = menu.surface().size().col - 1;
        // mark_height = min(ceil(100/50), 10) = 2, at the top initially.
        let marks: Vec<char> = (0..height)
            .map(|line| {
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                menu.surface().cell(line as i32, last).unwrap().ch
            })
            .collect();
        assert_eq!(marks.iter().filter(|&&c| c == MARK_ON).count(), 2);
        assert_eq!(marks[0], MARK_ON);
        assert_eq!(marks[1], MARK_ON);
        assert_eq!(marks[2], MARK_OFF);
    }

    #[test]
    fn scroll_indicator_follows_the_window() {
        let mut menu = Menu::new();
        show_prompt(&mut menu, &long_items(50));
        menu.select(49);
        let last = menu.surface().size().col - 1;
        // Window at the bottom: the mark sits on the last rows.
        assert_eq!(menu.surface().cell(0, last).unwrap().ch, MARK_OFF);
        assert_eq!(menu.surface().cell(9, last).unwrap().ch, MARK_ON);
    }

    #[test]
    fn selected_item_uses_the_highlight_pair() {
        let mut menu = Menu::new();
        show_prompt(&mut menu, &items(5));
        menu.select(0);
        assert_eq!(menu.surface().cell(0, 0).unwrap().pair, 1);
        // Unselected cells keep the background pair.
        let col = menu.columns();
        assert!(col > 1);
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let column_width = ((menu.surface().size().col as usize - 1) / col) as i32;
        assert_eq!(menu.surface().cell(0, column_width).unwrap().pair, 2);
    }
}
