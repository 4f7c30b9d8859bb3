// SPDX-License-Identifier: MIT
//
// UI facade — compositing, status line, overlays, and the event loop
// surface the editor core talks to.
//
// `Ui` owns the terminal, the palette, the three surfaces (main,
// status, menu/info overlays), the byte source, and the key decoder.
// The editor core hands it display lines and overlay requests, and
// pulls typed `Key` values back; everything terminal-shaped stays in
// here.
//
// Rendering is frame-batched: draw calls paint cells into surfaces and
// set a dirty flag; `refresh` emits the whole stack (main, status,
// menu, info — later surfaces overdraw earlier ones) into the
// terminal's frame buffer and pushes it in one write. There is no cell
// diffing; a full-frame emit is simple, correct by construction, and
// cheap enough at terminal sizes.
//
// The resize path runs at the top of every input read: a pending
// notification destroys the overlays, rebuilds the main and status
// surfaces from fresh geometry, resets the scroll region, and injects
// a synthetic `Resize` key so the editor core re-laysout its content.

use std::io;

use crate::ansi;
use crate::color::{Attr, Color, Face};
use crate::display::{DisplayAtom, DisplayLine};
use crate::info::{Assistant, Info, InfoStyle};
use crate::input::{Key, KeyDecoder};
use crate::menu::{Menu, MenuStyle};
use crate::palette::Palette;
use crate::resize;
use crate::source::ByteSource;
#[cfg(unix)]
use crate::source::TtySource;
use crate::surface::{Coord, Surface};
use crate::term::{Size, Term};

// ─── Options ────────────────────────────────────────────────────────────────

/// Runtime-tunable UI options, set through `set_ui_options`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiOptions {
    /// Figure drawn beside prompt info boxes.
    pub assistant: Assistant,
    /// Render the status line on the first row instead of the last.
    pub status_on_top: bool,
    /// Emit a window title derived from the mode line.
    pub set_title: bool,
    /// Button number treated as wheel-down.
    pub wheel_down_button: u16,
    /// Button number treated as wheel-up.
    pub wheel_up_button: u16,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            assistant: Assistant::Clippy,
            status_on_top: false,
            set_title: true,
            wheel_down_button: 2,
            wheel_up_button: 4,
        }
    }
}

impl UiOptions {
    /// Parse options from string key/value pairs, as delivered by the
    /// editor core's option system. Unknown keys are ignored; missing
    /// or malformed values fall back to the defaults.
    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut options = Self::default();
        for (key, value) in pairs {
            match key {
                "assistant" => {
                    options.assistant = match value {
                        "cat" => Assistant::Cat,
                        "none" | "off" => Assistant::None,
                        _ => Assistant::Clippy,
                    };
                }
                "status_on_top" => {
                    options.status_on_top = value == "yes" || value == "true";
                }
                "set_title" => {
                    options.set_title = value == "yes" || value == "true";
                }
                "wheel_down_button" => {
                    options.wheel_down_button =
                        value.parse().unwrap_or(Self::default().wheel_down_button);
                }
                "wheel_up_button" => {
                    options.wheel_up_button =
                        value.parse().unwrap_or(Self::default().wheel_up_button);
                }
                _ => {}
            }
        }
        options
    }
}

// ─── Ui ─────────────────────────────────────────────────────────────────────

/// The terminal UI: rendering, overlays, input.
pub struct Ui {
    term: Term,
    palette: Palette,
    main: Surface,
    status: Surface,
    menu: Menu,
    info: Info,
    source: Box<dyn ByteSource>,
    decoder: KeyDecoder,
    options: UiOptions,
    /// Content area: terminal size minus the status row.
    dimensions: Size,
    dirty: bool,
    full_redraw: bool,
}

impl Ui {
    /// Start a UI session on the controlling terminal.
    ///
    /// Enters TUI mode, installs the resize handler, enables mouse
    /// reporting, and performs the initial geometry setup. The first
    /// key delivered is the synthetic [`Key::Resize`] from that setup.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be initialized.
    #[cfg(unix)]
    pub fn new() -> io::Result<Self> {
        let mut term = Term::new()?;
        term.enter()?;
        resize::install()?;
        term.set_mouse_enabled(true)?;
        let source = Box::new(TtySource::stdin());
        Self::with_source(term, source)
    }

    /// Build a UI over an explicit terminal and byte source.
    ///
    /// Used by tests with a scripted source; does not touch terminal
    /// modes or signal handlers.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial frame cannot be written.
    pub fn with_source(term: Term, source: Box<dyn ByteSource>) -> io::Result<Self> {
        let mut ui = Self {
            term,
            palette: Palette::new(),
            main: Surface::new(),
            status: Surface::new(),
            menu: Menu::new(),
            info: Info::new(),
            source,
            decoder: KeyDecoder::new(),
            options: UiOptions::default(),
            dimensions: Size { cols: 0, rows: 0 },
            dirty: false,
            full_redraw: false,
        };
        ui.check_resize(true)?;
        ui.refresh()?;
        Ok(ui)
    }

    /// Content area (terminal minus the status row).
    #[must_use]
    pub const fn dimensions(&self) -> Size {
        self.dimensions
    }

    /// Apply new options, reflowing the layout when the status line
    /// moved.
    ///
    /// # Errors
    ///
    /// Returns an error if the relayout fails.
    pub fn set_ui_options(&mut self, options: UiOptions) -> io::Result<()> {
        let relayout = options.status_on_top != self.options.status_on_top;
        self.options = options;
        self.decoder.set_status_on_top(options.status_on_top);
        self.decoder.set_wheel_down_button(options.wheel_down_button);
        self.decoder.set_wheel_up_button(options.wheel_up_button);
        if relayout {
            self.check_resize(true)?;
        }
        Ok(())
    }

    // ── Resize ──────────────────────────────────────────────────────

    /// React to a pending (or forced) resize notification.
    ///
    /// Re-queries geometry, rebuilds the main and status surfaces,
    /// drops the overlays, resets the scroll region, and queues a
    /// synthetic [`Key::Resize`]. A no-op when nothing is pending and
    /// `force` is false.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal output fails.
    pub fn check_resize(&mut self, force: bool) -> io::Result<()> {
        let pending = resize::take_pending();
        if !force && !pending {
            return Ok(());
        }

        let size = self.term.refresh_size()?;
        let rows = size.rows.max(2);
        let cols = size.cols.max(1);

        self.menu.hide();
        self.info.hide();

        self.dimensions = Size {
            cols,
            rows: rows - 1,
        };
        let main_line = i32::from(self.options.status_on_top);
        let status_line = if self.options.status_on_top {
            0
        } else {
            i32::from(rows) - 1
        };
        self.main.create(
            Coord::new(main_line, 0),
            Coord::new(i32::from(rows) - 1, i32::from(cols)),
        );
        self.status
            .create(Coord::new(status_line, 0), Coord::new(1, i32::from(cols)));

        ansi::set_scroll_region(self.term.frame(), rows)?;

        self.decoder.push_pending(Key::Resize);
        self.full_redraw = true;
        self.dirty = true;
        Ok(())
    }

    // ── Drawing ─────────────────────────────────────────────────────

    /// Paint one frame of display content into the main surface.
    ///
    /// Lines beyond the content are filled with a `~` marker in blue,
    /// the classic empty-line indicator.
    ///
    /// # Errors
    ///
    /// Returns an error if a pending resize cannot be handled.
    pub fn draw(&mut self, lines: &[DisplayLine], default_face: Face) -> io::Result<()> {
        self.check_resize(false)?;

        let default_pair = self.palette.resolve_pair(&mut self.term, default_face);
        self.main.set_background(default_pair);

        let total_rows = i32::from(self.dimensions.rows);
        let total_cols = i32::from(self.dimensions.cols);
        let mut line_index = 0;
        for line in lines {
            if line_index >= total_rows {
                break;
            }
            self.main.move_to(line_index, 0);
            self.main.set_face(default_pair, Attr::empty());
            self.main.clear_to_eol();
            draw_line_into(
                &mut self.main,
                &mut self.palette,
                &mut self.term,
                line,
                0,
                default_face,
                total_cols,
            );
            line_index += 1;
        }

        let fill_face = Face::new(Color::Blue, Color::Default).resolved_against(default_face);
        let fill_pair = self.palette.resolve_pair(&mut self.term, fill_face);
        while line_index < total_rows {
            self.main.move_to(line_index, 0);
            self.main.set_face(default_pair, Attr::empty());
            self.main.clear_to_eol();
            self.main.set_face(fill_pair, Attr::empty());
            self.main.put_char('~');
            line_index += 1;
        }

        self.dirty = true;
        Ok(())
    }

    /// Paint the status row: status line left-aligned, mode line
    /// right-aligned. A mode line that does not fit is right-anchored
    /// behind a leading ellipsis. Optionally emits a window title
    /// built from the mode line.
    ///
    /// # Errors
    ///
    /// Returns an error if the title sequence cannot be written.
    pub fn draw_status(
        &mut self,
        status_line: &DisplayLine,
        mode_line: &DisplayLine,
        default_face: Face,
    ) -> io::Result<()> {
        let default_pair = self.palette.resolve_pair(&mut self.term, default_face);
        self.status.set_background(default_pair);
        self.status.move_to(0, 0);
        self.status.set_face(default_pair, Attr::empty());
        self.status.clear_to_eol();

        let total_cols = i32::from(self.dimensions.cols);
        draw_line_into(
            &mut self.status,
            &mut self.palette,
            &mut self.term,
            status_line,
            0,
            default_face,
            total_cols,
        );

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let mode_len = mode_line.char_len() as i32;
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let remaining = total_cols - status_line.char_len() as i32;
        if mode_len < remaining {
            let col = total_cols - mode_len;
            self.status.move_to(0, col);
            draw_line_into(
                &mut self.status,
                &mut self.palette,
                &mut self.term,
                mode_line,
                col,
                default_face,
                total_cols,
            );
        } else if remaining > 2 {
            // Keep the tail of the mode line behind an ellipsis so the
            // most specific part (the cursor position) stays visible.
            #[allow(clippy::cast_sign_loss)]
            let mut trimmed = trim_to_tail(mode_line, remaining as usize - 2);
            trimmed
                .atoms
                .insert(0, DisplayAtom::new(Face::default(), "…"));
            let col = total_cols - remaining + 1;
            self.status.move_to(0, col);
            draw_line_into(
                &mut self.status,
                &mut self.palette,
                &mut self.term,
                &trimmed,
                col,
                default_face,
                total_cols,
            );
        }

        if self.options.set_title {
            let title = format!("{} - sel", mode_line.text());
            ansi::set_title(self.term.frame(), &title)?;
        }

        self.dirty = true;
        Ok(())
    }

    /// Push the composed frame to the terminal if anything changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be written.
    pub fn refresh(&mut self) -> io::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.redraw()?;
        self.dirty = false;
        Ok(())
    }

    /// Emit every surface into the frame buffer and flush.
    fn redraw(&mut self) -> io::Result<()> {
        let Self {
            term,
            palette,
            main,
            status,
            menu,
            info,
            full_redraw,
            ..
        } = self;

        let term_size = term.size();
        let out = term.frame();
        if *full_redraw {
            ansi::clear_screen(out)?;
            *full_redraw = false;
        }
        emit_surface(out, palette, main, term_size)?;
        emit_surface(out, palette, status, term_size)?;
        emit_surface(out, palette, menu.surface(), term_size)?;
        emit_surface(out, palette, info.surface(), term_size)?;
        term.flush()
    }

    // ── Overlays ────────────────────────────────────────────────────

    /// Display the completion menu. See [`Menu::show`].
    pub fn menu_show(
        &mut self,
        items: &[String],
        anchor: Coord,
        fg: Face,
        bg: Face,
        style: MenuStyle,
    ) {
        let fg = self.palette.resolve_pair(&mut self.term, fg);
        let bg = self.palette.resolve_pair(&mut self.term, bg);
        self.menu.show(
            items,
            anchor,
            fg,
            bg,
            style,
            self.dimensions,
            self.options.status_on_top,
        );
        self.dirty = true;
    }

    /// Move the menu selection. See [`Menu::select`].
    pub fn menu_select(&mut self, selected: i32) {
        self.menu.select(selected);
        self.dirty = true;
    }

    /// Hide the completion menu.
    pub fn menu_hide(&mut self) {
        self.menu.hide();
        self.dirty = true;
    }

    /// Display an info box. See [`Info::show`].
    pub fn info_show(
        &mut self,
        title: &str,
        content: &str,
        anchor: Coord,
        face: Face,
        style: InfoStyle,
    ) {
        let pair = self.palette.resolve_pair(&mut self.term, face);
        let menu_rect = if self.menu.is_visible() {
            Some((self.menu.surface().pos(), self.menu.surface().size()))
        } else {
            None
        };
        self.info.show(
            title,
            content,
            anchor,
            pair,
            style,
            self.dimensions,
            self.options.status_on_top,
            self.options.assistant,
            menu_rect,
        );
        self.dirty = true;
    }

    /// Hide the info box.
    pub fn info_hide(&mut self) {
        self.info.hide();
        self.dirty = true;
    }

    // ── Input ───────────────────────────────────────────────────────

    /// Block until the next key.
    ///
    /// Runs the resize path before (and after every interrupted wait),
    /// honors ctrl-L repaint and ctrl-Z suspend side effects, and
    /// decodes anything unrecognizable to [`Key::Invalid`].
    ///
    /// # Errors
    ///
    /// Returns an error if the byte source fails.
    pub fn get_key(&mut self) -> io::Result<Key> {
        loop {
            self.check_resize(false)?;
            match self.decoder.next_key(self.source.as_mut())? {
                Some(key) => {
                    if self.decoder.take_repaint_request() {
                        self.full_redraw = true;
                        self.dirty = true;
                        self.refresh()?;
                    }
                    if self.decoder.take_suspend_request() {
                        suspend();
                    }
                    return Ok(key);
                }
                // Interrupted: loop back so check_resize runs.
                None => {}
            }
        }
    }

    /// Whether [`get_key`](Self::get_key) would return without
    /// blocking. The probe is non-consuming.
    ///
    /// # Errors
    ///
    /// Returns an error if the byte source fails.
    pub fn is_key_available(&mut self) -> io::Result<bool> {
        self.check_resize(false)?;
        if self.decoder.has_pending() {
            return Ok(true);
        }
        match self.source.poll_byte()? {
            Some(byte) => {
                self.source.push_back(byte);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Drop for Ui {
    fn drop(&mut self) {
        self.palette.restore(&mut self.term);
        let _ = self.term.flush();
        let _ = self.term.leave();
        resize::uninstall();
    }
}

/// Ask the OS to suspend the process (ctrl-Z path).
fn suspend() {
    #[cfg(unix)]
    unsafe {
        libc::raise(libc::SIGTSTP);
    }
}

// ─── Frame emission ─────────────────────────────────────────────────────────

/// Write one surface's cells into the frame buffer, clipped to the
/// terminal, switching SGR state only when a cell's face differs from
/// its predecessor.
fn emit_surface(
    out: &mut Vec<u8>,
    palette: &Palette,
    surface: &Surface,
    term_size: Size,
) -> io::Result<()> {
    if !surface.is_created() {
        return Ok(());
    }

    let pos = surface.pos();
    let size = surface.size();
    let term_rows = i32::from(term_size.rows);
    let term_cols = i32::from(term_size.cols);

    for line in 0..size.line {
        let abs_line = pos.line + line;
        if abs_line < 0 || abs_line >= term_rows {
            continue;
        }
        let Some(row) = surface.row(line) else {
            continue;
        };

        #[allow(clippy::cast_sign_loss)]
        let skip = (-pos.col).max(0) as usize;
        if skip >= row.len() {
            continue;
        }

        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        ansi::cursor_to(out, abs_line as u16, (pos.col.max(0)) as u16)?;

        let mut current = None;
        for (i, cell) in row.iter().enumerate().skip(skip) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let abs_col = pos.col + i as i32;
            if abs_col >= term_cols {
                break;
            }
            if cell.is_continuation() {
                continue;
            }
            if current != Some((cell.pair, cell.attrs)) {
                let (fg, bg) = palette.pair(cell.pair);
                ansi::set_face(out, fg, bg, cell.attrs)?;
                current = Some((cell.pair, cell.attrs));
            }
            let mut buf = [0u8; 4];
            out.extend_from_slice(cell.ch.encode_utf8(&mut buf).as_bytes());
        }
    }
    Ok(())
}

/// Paint one display line into a surface from `col_index`, resolving
/// faces against the default and respecting the column budget. An atom
/// ending in a soft newline that fits is rendered with a trailing
/// space instead of the newline, so the terminal never wraps.
fn draw_line_into(
    surface: &mut Surface,
    palette: &mut Palette,
    term: &mut Term,
    line: &DisplayLine,
    mut col_index: i32,
    default_face: Face,
    total_cols: i32,
) {
    for atom in &line.atoms {
        let resolved = atom.face.resolved_against(default_face);
        let pair = palette.resolve_pair(term, resolved);
        surface.set_face(pair, resolved.attrs);

        if atom.text.is_empty() {
            continue;
        }
        let remaining = total_cols - col_index;
        if remaining <= 0 {
            break;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let len = atom.char_len() as i32;
        if atom.text.ends_with('\n') && len - 1 < remaining {
            let body = &atom.text[..atom.text.len() - 1];
            surface.put_str(body);
            surface.put_char(' ');
            col_index += len;
        } else {
            #[allow(clippy::cast_sign_loss)]
            let content: String = atom.text.chars().take(remaining as usize).collect();
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let content_len = content.chars().count() as i32;
            surface.put_str(&content);
            col_index += content_len;
        }
    }
}

/// The last `keep` codepoints of a display line, atom faces preserved.
fn trim_to_tail(line: &DisplayLine, keep: usize) -> DisplayLine {
    let mut skip = line.char_len().saturating_sub(keep);
    let mut atoms = Vec::new();
    for atom in &line.atoms {
        let len = atom.char_len();
        if skip >= len {
            skip -= len;
            continue;
        }
        if skip > 0 {
            let text: String = atom.text.chars().skip(skip).collect();
            atoms.push(DisplayAtom::new(atom.face, text));
            skip = 0;
        } else {
            atoms.push(atom.clone());
        }
    }
    DisplayLine::new(atoms)
}

// ─── Tests ──────────────────────────────────────────────────────────────────
