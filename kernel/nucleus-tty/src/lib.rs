//! Scrollback-capable virtual terminal.
//!
//! [`VirtualTerminal`] owns a cell grid taller than its visible viewport and
//! mirrors writes to whatever [`Console`] it is currently attached to, much
//! like a framebuffer console owns a cell grid over its surface — except a
//! virtual terminal is not tied to any one console implementation.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use nucleus_core::sync::SpinLock;
use nucleus_driver_api::{Color, Console, DimensionUnit, DriverError, ScrollDirection, Tty, TtyState};

#[derive(Debug, Clone, Copy)]
struct Cell {
    byte: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    const fn blank(fg: Color, bg: Color) -> Self {
        Self { byte: b' ', fg, bg }
    }
}

struct State {
    tab_width: u8,
    scrollback: u32,
    console: Option<Arc<dyn Console>>,
    tty_state: TtyState,
    viewport_width: u32,
    viewport_height: u32,
    total_height: u32,
    viewport_y: u32,
    cursor_x: u32,
    cursor_y: u32,
    default_fg: Color,
    default_bg: Color,
    cells: Vec<Cell>,
}

impl State {
    fn cell_index(&self, row: u32, col: u32) -> usize {
        (row * self.viewport_width + col) as usize
    }

    /// Writes `byte` into the cell at the current cursor position and, if
    /// active, mirrors it to the console at the matching viewport-relative
    /// coordinates.
    fn put_cell(&mut self, byte: u8) {
        let row = self.viewport_y + (self.cursor_y - 1);
        let col = self.cursor_x - 1;
        let idx = self.cell_index(row, col);
        self.cells[idx] = Cell {
            byte,
            fg: self.default_fg,
            bg: self.default_bg,
        };
        if self.tty_state == TtyState::Active {
            if let Some(console) = &self.console {
                console.write(byte, self.default_fg, self.default_bg, col, self.cursor_y - 1);
            }
        }
    }

    /// Writes `byte` at the cursor, advances it, and line-feeds on overflow.
    fn write_advance(&mut self, byte: u8) {
        self.put_cell(byte);
        self.cursor_x += 1;
        if self.cursor_x > self.viewport_width {
            self.line_feed();
        }
    }

    /// Full line-feed: carriage return plus the vertical line-feed
    /// algorithm.
    fn line_feed(&mut self) {
        self.cursor_x = 1;
        self.vertical_feed();
    }

    /// The vertical half of the line-feed algorithm.
    fn vertical_feed(&mut self) {
        if self.cursor_y < self.viewport_height {
            self.cursor_y += 1;
        } else if self.viewport_y + self.viewport_height < self.total_height {
            self.viewport_y += 1;
        } else {
            self.shift_rows_up();
            if self.tty_state == TtyState::Active {
                if let Some(console) = &self.console {
                    console.scroll(ScrollDirection::Up, 1);
                    console.fill(
                        0,
                        self.viewport_height - 1,
                        self.viewport_width,
                        1,
                        self.default_fg,
                        self.default_bg,
                    );
                }
            }
        }
    }

    /// Shifts the visible rows up by one within the buffer (row 1 of the
    /// viewport discarded, last row cleared), without moving `viewport_y`.
    fn shift_rows_up(&mut self) {
        let width = self.viewport_width as usize;
        let height = self.viewport_height as usize;
        if height == 0 {
            return;
        }
        let start = (self.viewport_y as usize) * width;
        self.cells.copy_within(start + width.., start);
        let last_row = start + width * (height - 1);
        let blank = Cell::blank(self.default_fg, self.default_bg);
        for cell in &mut self.cells[last_row..last_row + width] {
            *cell = blank;
        }
    }

    fn put_byte(&mut self, byte: u8) -> Result<(), DriverError> {
        if self.console.is_none() {
            return Err(DriverError::WriteToUnattachedTty);
        }
        match byte {
            0x0D => self.cursor_x = 1,
            0x0A => self.line_feed(),
            0x08 => {
                if self.cursor_x > 1 {
                    self.cursor_x -= 1;
                    self.put_cell(b' ');
                }
            }
            0x09 => {
                for _ in 0..self.tab_width {
                    self.write_advance(b' ');
                }
            }
            other => self.write_advance(other),
        }
        Ok(())
    }
}

/// A scrollback-capable text terminal, independent of any one [`Console`]
/// implementation.
///
/// Interior state is guarded by a [`SpinLock`] so the terminal can implement
/// the `&self`-based [`Tty`] trait and be shared behind an `Arc` the same
/// way a [`Console`] is.
pub struct VirtualTerminal {
    state: SpinLock<State>,
}

impl VirtualTerminal {
    /// Creates a new unattached terminal with the cursor at (1, 1).
    #[must_use]
    pub fn new(tab_width: u8, scrollback: u32) -> Self {
        Self {
            state: SpinLock::new(State {
                tab_width,
                scrollback,
                console: None,
                tty_state: TtyState::Inactive,
                viewport_width: 0,
                viewport_height: 0,
                total_height: 0,
                viewport_y: 0,
                cursor_x: 1,
                cursor_y: 1,
                default_fg: Color::Default,
                default_bg: Color::Default,
                cells: Vec::new(),
            }),
        }
    }

    /// Writes each byte of `bytes` in turn, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::WriteToUnattachedTty`] if the terminal has no
    /// attached console.
    pub fn write_bytes(&self, bytes: &[u8]) -> Result<(), DriverError> {
        for &byte in bytes {
            Tty::write(self, byte)?;
        }
        Ok(())
    }
}

impl Tty for VirtualTerminal {
    fn write(&self, byte: u8) -> Result<(), DriverError> {
        self.state.lock().put_byte(byte)
    }

    fn attach_to(&self, console: Option<Arc<dyn Console>>) {
        let mut state = self.state.lock();
        let Some(console) = console else {
            state.console = None;
            return;
        };

        let (width, height) = console.dimensions(DimensionUnit::Characters);
        let (fg, bg) = console.default_colors();
        let total_height = height + state.scrollback;

        state.viewport_width = width;
        state.viewport_height = height;
        state.total_height = total_height;
        state.viewport_y = 0;
        state.default_fg = fg;
        state.default_bg = bg;
        state.cells = vec![Cell::blank(fg, bg); (width * total_height) as usize];
        state.cursor_x = 1;
        state.cursor_y = 1;
        state.console = Some(console);
    }

    fn state(&self) -> TtyState {
        self.state.lock().tty_state
    }

    fn set_state(&self, new: TtyState) {
        let mut state = self.state.lock();
        if state.tty_state == new {
            return;
        }
        state.tty_state = new;
        if new != TtyState::Active {
            return;
        }
        let Some(console) = state.console.clone() else {
            return;
        };
        for screen_y in 0..state.viewport_height {
            let row = state.viewport_y + screen_y;
            for screen_x in 0..state.viewport_width {
                let cell = state.cells[state.cell_index(row, screen_x)];
                console.write(cell.byte, cell.fg, cell.bg, screen_x, screen_y);
            }
        }
    }

    fn cursor_position(&self) -> (u32, u32) {
        let state = self.state.lock();
        (state.cursor_x, state.cursor_y)
    }

    fn set_cursor_position(&self, x: u32, y: u32) {
        let mut state = self.state.lock();
        if state.console.is_none() {
            return;
        }
        state.cursor_x = x.clamp(1, state.viewport_width.max(1));
        state.cursor_y = y.clamp(1, state.viewport_height.max(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct MockConsole {
        width: u32,
        height: u32,
        cells: Mutex<Vec<(u8, Color, Color)>>,
        scroll_calls: AtomicU32,
        fill_calls: AtomicU32,
    }

    impl MockConsole {
        fn new(width: u32, height: u32) -> Arc<Self> {
            Arc::new(Self {
                width,
                height,
                cells: Mutex::new(vec![
                    (b' ', Color::Default, Color::Default);
                    (width * height) as usize
                ]),
                scroll_calls: AtomicU32::new(0),
                fill_calls: AtomicU32::new(0),
            })
        }

        fn cell(&self, x: u32, y: u32) -> (u8, Color, Color) {
            self.cells.lock().unwrap()[(y * self.width + x) as usize]
        }
    }

    impl Console for MockConsole {
        fn dimensions(&self, _unit: DimensionUnit) -> (u32, u32) {
            (self.width, self.height)
        }

        fn default_colors(&self) -> (Color, Color) {
            (Color::Default, Color::Default)
        }

        fn write(&self, byte: u8, fg: Color, bg: Color, x: u32, y: u32) {
            self.cells.lock().unwrap()[(y * self.width + x) as usize] = (byte, fg, bg);
        }

        fn fill(&self, x: u32, y: u32, width: u32, height: u32, fg: Color, bg: Color) {
            self.fill_calls.fetch_add(1, Ordering::SeqCst);
            let mut cells = self.cells.lock().unwrap();
            for row in y..y + height {
                for col in x..x + width {
                    cells[(row * self.width + col) as usize] = (b' ', fg, bg);
                }
            }
        }

        fn scroll(&self, _direction: ScrollDirection, _lines: u32) {
            self.scroll_calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn write_before_attach_is_an_error() {
        let tty = VirtualTerminal::new(4, 0);
        assert_eq!(tty.write(b'x'), Err(DriverError::WriteToUnattachedTty));
    }

    #[test]
    fn attach_resets_cursor_and_dimensions() {
        let tty = VirtualTerminal::new(4, 0);
        let console = MockConsole::new(80, 25);
        tty.attach_to(Some(console));
        assert_eq!(tty.cursor_position(), (1, 1));
    }

    #[test]
    fn set_cursor_position_clamps_to_viewport() {
        let tty = VirtualTerminal::new(4, 0);
        let console = MockConsole::new(80, 25);
        tty.attach_to(Some(console));
        tty.set_cursor_position(500, 0);
        assert_eq!(tty.cursor_position(), (80, 1));
        tty.set_cursor_position(0, 500);
        assert_eq!(tty.cursor_position(), (1, 25));
    }

    #[test]
    fn backspace_tab_and_newline_sequence_matches_expected_layout() {
        let tty = VirtualTerminal::new(4, 0);
        let console = MockConsole::new(80, 25);
        tty.attach_to(Some(console.clone()));
        tty.set_state(TtyState::Active);

        tty.write_bytes(b"\x08123\x084\t5\n67\r68").unwrap();

        assert_eq!(console.cell(0, 0).0, b'1');
        assert_eq!(console.cell(1, 0).0, b'2');
        assert_eq!(console.cell(2, 0).0, b'4');
        assert_eq!(console.cell(7, 0).0, b'5');
        assert_eq!(console.cell(0, 1).0, b'6');
        assert_eq!(console.cell(1, 1).0, b'8');
    }

    #[test]
    fn zero_scrollback_line_feed_past_bottom_shifts_and_scrolls_once() {
        let tty = VirtualTerminal::new(4, 0);
        let console = MockConsole::new(4, 2);
        tty.attach_to(Some(console.clone()));
        tty.set_state(TtyState::Active);

        // From row 1, `viewport_height` line feeds: the first carries the
        // cursor onto the last row, the second is the one that finds no
        // more room and shifts the buffer up.
        tty.write(b'\n').unwrap();
        assert_eq!(console.scroll_calls.load(Ordering::SeqCst), 0);
        tty.write(b'\n').unwrap();
        assert_eq!(console.scroll_calls.load(Ordering::SeqCst), 1);
        assert_eq!(console.fill_calls.load(Ordering::SeqCst), 1);
        assert_eq!(tty.cursor_position(), (1, 2));
    }

    #[test]
    fn positive_scrollback_advances_viewport_without_mirroring() {
        let tty = VirtualTerminal::new(4, 2);
        let console = MockConsole::new(4, 2);
        tty.attach_to(Some(console.clone()));
        tty.set_state(TtyState::Active);

        // Same two line feeds, but with scrollback room: the second one
        // advances `viewport_y` instead of shifting and never touches the
        // console.
        tty.write(b'\n').unwrap();
        tty.write(b'\n').unwrap();
        assert_eq!(console.scroll_calls.load(Ordering::SeqCst), 0);
        assert_eq!(console.fill_calls.load(Ordering::SeqCst), 0);
        assert_eq!(tty.cursor_position(), (1, 2));
    }

    #[test]
    fn activating_replays_back_buffer_to_console() {
        let tty = VirtualTerminal::new(4, 0);
        let console = MockConsole::new(4, 1);
        tty.attach_to(Some(console.clone()));
        // Write while inactive: back buffer only, console untouched.
        tty.write_bytes(b"ab").unwrap();
        assert_eq!(console.cell(0, 0).0, b' ');

        tty.set_state(TtyState::Active);
        assert_eq!(console.cell(0, 0).0, b'a');
        assert_eq!(console.cell(1, 0).0, b'b');
    }

    #[test]
    fn detach_then_write_errors_again() {
        let tty = VirtualTerminal::new(4, 0);
        let console = MockConsole::new(4, 1);
        tty.attach_to(Some(console));
        tty.attach_to(None);
        assert_eq!(tty.write(b'x'), Err(DriverError::WriteToUnattachedTty));
    }
}
