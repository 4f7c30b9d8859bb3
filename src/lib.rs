// SPDX-License-Identifier: MIT
//
// sel-term — Terminal UI layer for the sel editor.
//
// Everything terminal-shaped the editor core needs: raw-mode and
// alternate-screen management, a cell-grid surface model composited
// into batched ANSI frames, a color palette with dynamic slot
// allocation, completion-menu and info-box overlays, and a byte-level
// input decoder that turns escape sequences into typed keys.
//
// This crate intentionally avoids external TUI frameworks (ratatui,
// crossterm) in favor of direct terminal control via ANSI escape
// sequences and raw termios. The editor core stays in charge of what
// to show; this layer decides only how it lands on the screen.

pub mod ansi;
pub mod color;
pub mod display;
pub mod info;
pub mod input;
pub mod menu;
pub mod palette;
pub mod resize;
pub mod source;
pub mod surface;
pub mod term;
pub mod ui;
