//! Terminal handling for the demo host: raw-mode lifecycle and rendering.

use std::io::{self, Stdout, Write};

use crossterm::{
    cursor, execute, queue,
    style::{Attribute, SetAttribute},
    terminal::{self, ClearType},
};
use ropey::Rope;

use crate::engine::Mode;
use crate::host::{CursorStyle, Position, Span};

/// Terminal guard responsible for raw mode and rendering. Restores the
/// terminal on drop.
pub struct Terminal {
    stdout: Stdout,
}

impl Terminal {
    pub fn new() -> anyhow::Result<Self> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, terminal::EnterAlternateScreen)?;
        Ok(Self { stdout })
    }

    /// Draw the buffer, the selection highlight, and a status line, then
    /// park the visual cursor at the primary active position.
    pub fn draw(
        &mut self,
        rope: &Rope,
        selections: &[Span],
        mode: Mode,
        status: &str,
        cursor_style: CursorStyle,
    ) -> anyhow::Result<()> {
        let (width, height) = terminal::size()?;
        let text_rows = height.saturating_sub(1) as usize;

        queue!(
            self.stdout,
            cursor::Hide,
            terminal::Clear(ClearType::All)
        )?;

        for (row, line) in rope.lines().take(text_rows).enumerate() {
            queue!(self.stdout, cursor::MoveTo(0, row as u16))?;
            let mut selected = false;
            for (col, ch) in line.chars().take(width as usize).enumerate() {
                if ch == '\n' || ch == '\r' {
                    break;
                }
                let here = is_selected(selections, Position::new(row, col));
                if here != selected {
                    let attr = if here { Attribute::Reverse } else { Attribute::Reset };
                    queue!(self.stdout, SetAttribute(attr))?;
                    selected = here;
                }
                write!(self.stdout, "{ch}")?;
            }
            if selected {
                queue!(self.stdout, SetAttribute(Attribute::Reset))?;
            }
        }

        // Status line: mode on the left, last message after it.
        queue!(
            self.stdout,
            cursor::MoveTo(0, height.saturating_sub(1)),
            SetAttribute(Attribute::Reverse)
        )?;
        let status_line = format!(" {} {}", mode.as_str(), status);
        let mut shown: String = status_line.chars().take(width as usize).collect();
        let pad = (width as usize).saturating_sub(shown.chars().count());
        shown.extend(std::iter::repeat(' ').take(pad));
        write!(self.stdout, "{shown}")?;
        queue!(self.stdout, SetAttribute(Attribute::Reset))?;

        if let Some(primary) = selections.last() {
            queue!(
                self.stdout,
                set_cursor_style(cursor_style),
                cursor::MoveTo(primary.active.col as u16, primary.active.line as u16),
                cursor::Show
            )?;
        }
        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = execute!(
            self.stdout,
            cursor::SetCursorStyle::DefaultUserShape,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

fn set_cursor_style(style: CursorStyle) -> cursor::SetCursorStyle {
    match style {
        CursorStyle::Block => cursor::SetCursorStyle::SteadyBlock,
        CursorStyle::Line => cursor::SetCursorStyle::SteadyBar,
        CursorStyle::Underline => cursor::SetCursorStyle::SteadyUnderScore,
    }
}

fn is_selected(selections: &[Span], pos: Position) -> bool {
    selections.iter().any(|span| {
        if span.is_empty() {
            return false;
        }
        let (start, end) = span.ordered();
        start <= pos && pos < end
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_containment_respects_direction() {
        let spans = [Span {
            anchor: Position::new(1, 4),
            active: Position::new(0, 2),
        }];
        assert!(is_selected(&spans, Position::new(0, 2)));
        assert!(is_selected(&spans, Position::new(0, 9)));
        assert!(is_selected(&spans, Position::new(1, 3)));
        assert!(!is_selected(&spans, Position::new(1, 4)));
        assert!(!is_selected(&spans, Position::new(0, 1)));
    }

    #[test]
    fn caret_is_never_highlighted() {
        let spans = [Span::caret(Position::new(0, 0))];
        assert!(!is_selected(&spans, Position::new(0, 0)));
    }
}
