//! Terminal capability abstraction and the crossterm implementation.
//!
//! The renderer only talks to the `Terminal` trait, so any terminal-UI
//! backend can drive the dashboard and tests can script an in-memory one.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEventKind},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

/// Display styles the renderer can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Plain,
    Bold,
    Green,
    Yellow,
    Red,
    Cyan,
}

/// Minimal terminal capability surface used by the renderer.
pub trait Terminal {
    fn clear(&mut self) -> io::Result<()>;
    fn write_at(&mut self, row: u16, col: u16, text: &str, style: TextStyle) -> io::Result<()>;
    /// Current (columns, rows).
    fn dimensions(&self) -> io::Result<(u16, u16)>;
    /// Non-blocking poll for a single pressed key.
    fn poll_key(&mut self) -> io::Result<Option<char>>;
    fn flush(&mut self) -> io::Result<()>;
}

/// Crossterm-backed terminal running in raw mode on the alternate screen.
pub struct CrosstermTerminal {
    out: Stdout,
}

impl CrosstermTerminal {
    pub fn new() -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(out, EnterAlternateScreen, Hide)?;
        Ok(Self { out })
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        // Restore the terminal even when the render loop unwinds.
        let _ = execute!(self.out, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

impl Terminal for CrosstermTerminal {
    fn clear(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All))
    }

    fn write_at(&mut self, row: u16, col: u16, text: &str, style: TextStyle) -> io::Result<()> {
        queue!(self.out, MoveTo(col, row))?;
        match style {
            TextStyle::Plain => {}
            TextStyle::Bold => queue!(self.out, SetAttribute(Attribute::Bold))?,
            TextStyle::Green => queue!(self.out, SetForegroundColor(Color::Green))?,
            TextStyle::Yellow => queue!(self.out, SetForegroundColor(Color::Yellow))?,
            TextStyle::Red => queue!(self.out, SetForegroundColor(Color::Red))?,
            TextStyle::Cyan => queue!(self.out, SetForegroundColor(Color::Cyan))?,
        }
        queue!(
            self.out,
            Print(text),
            ResetColor,
            SetAttribute(Attribute::Reset)
        )
    }

    fn dimensions(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    fn poll_key(&mut self) -> io::Result<Option<char>> {
        if event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let KeyCode::Char(c) = key.code {
                        return Ok(Some(c));
                    }
                }
            }
        }
        Ok(None)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scriptable in-memory terminal for renderer tests.

    use super::{Terminal, TextStyle};
    use std::collections::VecDeque;
    use std::io;

    pub struct ScriptedTerminal {
        pub width: u16,
        pub height: u16,
        pub writes: Vec<(u16, u16, String, TextStyle)>,
        pub keys: VecDeque<char>,
        pub cleared: usize,
    }

    impl ScriptedTerminal {
        pub fn new(width: u16, height: u16) -> Self {
            Self {
                width,
                height,
                writes: Vec::new(),
                keys: VecDeque::new(),
                cleared: 0,
            }
        }

        pub fn with_keys(width: u16, height: u16, keys: &[char]) -> Self {
            let mut term = Self::new(width, height);
            term.keys = keys.iter().copied().collect();
            term
        }

        pub fn text_at(&self, row: u16) -> String {
            let mut parts: Vec<&(u16, u16, String, TextStyle)> =
                self.writes.iter().filter(|w| w.0 == row).collect();
            parts.sort_by_key(|w| w.1);
            parts
                .iter()
                .map(|w| w.2.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        }
    }

    impl Terminal for ScriptedTerminal {
        fn clear(&mut self) -> io::Result<()> {
            self.cleared += 1;
            Ok(())
        }

        fn write_at(
            &mut self,
            row: u16,
            col: u16,
            text: &str,
            style: TextStyle,
        ) -> io::Result<()> {
            self.writes.push((row, col, text.to_string(), style));
            Ok(())
        }

        fn dimensions(&self) -> io::Result<(u16, u16)> {
            Ok((self.width, self.height))
        }

        fn poll_key(&mut self) -> io::Result<Option<char>> {
            Ok(self.keys.pop_front())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
