//! Demo host: a minimal terminal editor driven entirely by the dispatch
//! engine. It implements the `Host` trait over a rope buffer and a small set
//! of named cursor/clipboard operations, and routes raw keystrokes to the
//! engine while it holds the capture.

use std::collections::HashMap;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ropey::Rope;
use unicode_segmentation::UnicodeSegmentation;

use keymode::terminal::Terminal;
use keymode::{load_config, CursorStyle, Engine, Host, Position, Span, NORMAL_CONTEXT_FLAG};

fn main() -> Result<()> {
    let settings = load_config();
    let path = env::args().nth(1).map(PathBuf::from);
    let rope = match &path {
        Some(p) if p.exists() => Rope::from_reader(BufReader::new(File::open(p)?))?,
        _ => Rope::new(),
    };

    let mut host = DemoHost::new(rope);
    let mut engine = Engine::new(settings);
    let mut terminal = Terminal::new()?;
    engine.activate(&mut host);

    loop {
        terminal.draw(
            &host.rope,
            &host.selections,
            engine.mode(),
            &host.status,
            host.cursor_style,
        )?;
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Release {
                continue;
            }
            if !handle_key(&mut engine, &mut host, key)? {
                break;
            }
        }
    }
    Ok(())
}

/// Returns `false` when the demo should exit.
fn handle_key(engine: &mut Engine, host: &mut DemoHost, key: KeyEvent) -> Result<bool> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::CONTROL) => return Ok(false),
        (KeyCode::Esc, _) => {
            // Stands in for a host keybinding gated on the published mode
            // flag: Escape leaves insert mode, and cancels the selection
            // once already in normal mode.
            if host.context_flags.get(NORMAL_CONTEXT_FLAG) == Some(&true) {
                engine.cancel_selection(host);
            } else {
                engine.enter_normal(host);
            }
        }
        _ if host.capture => {
            if let Some(text) = key_text(&key) {
                host.status.clear();
                if let Err(err) = engine.on_key(host, &text) {
                    host.status = format!("{:#}", anyhow::Error::from(err));
                }
            }
        }
        _ => match key.code {
            KeyCode::Char(c) => host.insert_text(&c.to_string()),
            KeyCode::Enter => host.insert_text("\n"),
            KeyCode::Tab => host.insert_text("\t"),
            KeyCode::Backspace => host.delete_left(),
            _ => {}
        },
    }
    Ok(true)
}

/// The keystroke text the engine dispatches on: printable characters only,
/// with or without shift.
fn key_text(key: &KeyEvent) -> Option<String> {
    match key.code {
        KeyCode::Char(c)
            if key.modifiers == KeyModifiers::NONE || key.modifiers == KeyModifiers::SHIFT =>
        {
            Some(c.to_string())
        }
        _ => None,
    }
}

/// In-process host implementation over a rope buffer.
struct DemoHost {
    rope: Rope,
    selections: Vec<Span>,
    capture: bool,
    cursor_style: CursorStyle,
    context_flags: HashMap<String, bool>,
    clipboard: Option<arboard::Clipboard>,
    fallback_clip: String,
    status: String,
}

impl DemoHost {
    fn new(rope: Rope) -> Self {
        Self {
            rope,
            selections: vec![Span::caret(Position::default())],
            capture: false,
            cursor_style: CursorStyle::default(),
            context_flags: HashMap::new(),
            clipboard: arboard::Clipboard::new().ok(),
            fallback_clip: String::new(),
            status: String::new(),
        }
    }

    fn primary(&self) -> Span {
        self.selections
            .first()
            .copied()
            .unwrap_or_else(|| Span::caret(Position::default()))
    }

    fn set_primary(&mut self, span: Span) {
        self.selections = vec![span];
    }

    fn char_index(&self, pos: Position) -> usize {
        self.rope.line_to_char(pos.line) + pos.col
    }

    fn position_at(&self, idx: usize) -> Position {
        let line = self.rope.char_to_line(idx);
        Position::new(line, idx - self.rope.line_to_char(line))
    }

    fn clamp(&self, pos: Position) -> Position {
        let line = pos.line.min(self.rope.len_lines().saturating_sub(1));
        Position::new(line, pos.col.min(line_len(&self.rope, line)))
    }

    fn move_cursor(&mut self, select: bool, motion: fn(&Rope, Position) -> Position) {
        self.selections = self
            .selections
            .iter()
            .map(|span| {
                let active = motion(&self.rope, span.active);
                Span {
                    anchor: if select { span.anchor } else { active },
                    active,
                }
            })
            .collect();
    }

    fn delete_range(&mut self, start: Position, end: Position) -> Position {
        let (s, e) = (self.char_index(start), self.char_index(end));
        if s < e {
            self.rope.remove(s..e);
        }
        start
    }

    fn delete_left(&mut self) {
        let span = self.primary();
        let caret = if !span.is_empty() {
            let (start, end) = span.ordered();
            self.delete_range(start, end)
        } else {
            let from = move_left(&self.rope, span.active);
            self.delete_range(from, span.active)
        };
        self.set_primary(Span::caret(caret));
    }

    fn delete_word_left(&mut self) {
        let span = self.primary();
        let caret = if !span.is_empty() {
            let (start, end) = span.ordered();
            self.delete_range(start, end)
        } else {
            let from = word_start_left(&self.rope, span.active);
            self.delete_range(from, span.active)
        };
        self.set_primary(Span::caret(caret));
    }

    fn insert_text(&mut self, text: &str) {
        let span = self.primary();
        let start = if !span.is_empty() {
            let (s, e) = span.ordered();
            self.delete_range(s, e)
        } else {
            span.active
        };
        let idx = self.char_index(start);
        self.rope.insert(idx, text);
        let caret = self.position_at(idx + text.chars().count());
        self.set_primary(Span::caret(caret));
    }

    fn selected_text(&self) -> String {
        let span = self.primary();
        if span.is_empty() {
            return String::new();
        }
        let (s, e) = span.ordered();
        self.rope
            .slice(self.char_index(s)..self.char_index(e))
            .to_string()
    }

    fn clipboard_set(&mut self, text: String) {
        if let Some(clipboard) = self.clipboard.as_mut() {
            let _ = clipboard.set_text(text.clone());
        }
        self.fallback_clip = text;
    }

    fn clipboard_get(&mut self) -> String {
        if let Some(clipboard) = self.clipboard.as_mut() {
            if let Ok(text) = clipboard.get_text() {
                return text;
            }
        }
        self.fallback_clip.clone()
    }

    fn copy(&mut self) {
        let text = self.selected_text();
        if !text.is_empty() {
            self.clipboard_set(text);
        }
    }

    fn cut(&mut self) {
        let text = self.selected_text();
        if text.is_empty() {
            return;
        }
        self.clipboard_set(text);
        let (s, e) = self.primary().ordered();
        let caret = self.delete_range(s, e);
        self.set_primary(Span::caret(caret));
    }

    fn paste(&mut self) {
        let text = self.clipboard_get();
        if !text.is_empty() {
            self.insert_text(&text);
        }
    }

    /// Extend an empty primary selection to the word under the cursor.
    fn select_word_under_cursor(&mut self) {
        let span = self.primary();
        if !span.is_empty() {
            return;
        }
        let line_str = self.rope.line(span.active.line).to_string();
        for (start, end) in word_cols(&line_str) {
            if start <= span.active.col && span.active.col < end {
                self.set_primary(Span {
                    anchor: Position::new(span.active.line, start),
                    active: Position::new(span.active.line, end),
                });
                return;
            }
        }
    }
}

impl Host for DemoHost {
    fn execute_command(&mut self, name: &str, _args: Option<&toml::Table>) -> Result<()> {
        match name {
            "cursorLeft" => self.move_cursor(false, move_left),
            "cursorLeftSelect" => self.move_cursor(true, move_left),
            "cursorRight" => self.move_cursor(false, move_right),
            "cursorRightSelect" => self.move_cursor(true, move_right),
            "cursorUp" => self.move_cursor(false, move_up),
            "cursorUpSelect" => self.move_cursor(true, move_up),
            "cursorDown" => self.move_cursor(false, move_down),
            "cursorDownSelect" => self.move_cursor(true, move_down),
            "cursorWordStartLeft" => self.move_cursor(false, word_start_left),
            "cursorWordStartLeftSelect" => self.move_cursor(true, word_start_left),
            "cursorWordEndRight" => self.move_cursor(false, word_end_right),
            "cursorWordEndRightSelect" => self.move_cursor(true, word_end_right),
            "cursorLineStart" => self.move_cursor(false, line_start),
            "cursorLineStartSelect" => self.move_cursor(true, line_start),
            "cursorLineEnd" => self.move_cursor(false, line_end),
            "cursorLineEndSelect" => self.move_cursor(true, line_end),
            "cursorTop" => self.move_cursor(false, doc_start),
            "cursorTopSelect" => self.move_cursor(true, doc_start),
            "cursorBottom" => self.move_cursor(false, doc_end),
            "cursorBottomSelect" => self.move_cursor(true, doc_end),
            "deleteLeft" => self.delete_left(),
            "deleteWordLeft" => self.delete_word_left(),
            "clipboardCopyAction" => self.copy(),
            "clipboardCutAction" => self.cut(),
            "clipboardPasteAction" => self.paste(),
            "addSelectionToNextFindMatch" => self.select_word_under_cursor(),
            _ => anyhow::bail!("unknown command `{name}`"),
        }
        Ok(())
    }

    fn set_keystroke_capture(&mut self, enabled: bool) {
        self.capture = enabled;
    }

    fn has_active_editor(&self) -> bool {
        true
    }

    fn selections(&self) -> Vec<Span> {
        self.selections.clone()
    }

    fn set_selections(&mut self, spans: Vec<Span>) {
        if spans.is_empty() {
            self.set_primary(Span::caret(Position::default()));
            return;
        }
        self.selections = spans
            .into_iter()
            .map(|span| Span {
                anchor: self.clamp(span.anchor),
                active: self.clamp(span.active),
            })
            .collect();
    }

    fn set_context_flag(&mut self, name: &str, value: bool) {
        self.context_flags.insert(name.to_string(), value);
    }

    fn set_cursor_style(&mut self, style: CursorStyle) {
        self.cursor_style = style;
    }
}

/// Length of a line in chars, excluding its trailing line break.
fn line_len(rope: &Rope, line: usize) -> usize {
    if line >= rope.len_lines() {
        return 0;
    }
    let slice = rope.line(line);
    let mut len = slice.len_chars();
    if len > 0 && slice.char(len - 1) == '\n' {
        len -= 1;
    }
    if len > 0 && slice.char(len - 1) == '\r' {
        len -= 1;
    }
    len
}

fn move_left(rope: &Rope, pos: Position) -> Position {
    if pos.col > 0 {
        Position::new(pos.line, pos.col - 1)
    } else if pos.line > 0 {
        Position::new(pos.line - 1, line_len(rope, pos.line - 1))
    } else {
        pos
    }
}

fn move_right(rope: &Rope, pos: Position) -> Position {
    if pos.col < line_len(rope, pos.line) {
        Position::new(pos.line, pos.col + 1)
    } else if pos.line + 1 < rope.len_lines() {
        Position::new(pos.line + 1, 0)
    } else {
        pos
    }
}

fn move_up(rope: &Rope, pos: Position) -> Position {
    if pos.line > 0 {
        let line = pos.line - 1;
        Position::new(line, pos.col.min(line_len(rope, line)))
    } else {
        pos
    }
}

fn move_down(rope: &Rope, pos: Position) -> Position {
    if pos.line + 1 < rope.len_lines() {
        let line = pos.line + 1;
        Position::new(line, pos.col.min(line_len(rope, line)))
    } else {
        pos
    }
}

fn line_start(_rope: &Rope, pos: Position) -> Position {
    Position::new(pos.line, 0)
}

fn line_end(rope: &Rope, pos: Position) -> Position {
    Position::new(pos.line, line_len(rope, pos.line))
}

fn doc_start(_rope: &Rope, _pos: Position) -> Position {
    Position::default()
}

fn doc_end(rope: &Rope, _pos: Position) -> Position {
    let line = rope.len_lines().saturating_sub(1);
    Position::new(line, line_len(rope, line))
}

fn word_start_left(rope: &Rope, pos: Position) -> Position {
    let line_str = rope.line(pos.line).to_string();
    if let Some(col) = word_cols(&line_str)
        .into_iter()
        .map(|(start, _)| start)
        .filter(|&start| start < pos.col)
        .max()
    {
        return Position::new(pos.line, col);
    }
    if pos.line > 0 {
        Position::new(pos.line - 1, line_len(rope, pos.line - 1))
    } else {
        Position::new(pos.line, 0)
    }
}

fn word_end_right(rope: &Rope, pos: Position) -> Position {
    let line_str = rope.line(pos.line).to_string();
    if let Some(col) = word_cols(&line_str)
        .into_iter()
        .map(|(_, end)| end)
        .filter(|&end| end > pos.col)
        .min()
    {
        return Position::new(pos.line, col.min(line_len(rope, pos.line)));
    }
    if pos.line + 1 < rope.len_lines() {
        Position::new(pos.line + 1, 0)
    } else {
        line_end(rope, pos)
    }
}

/// (start, end) char columns of each word on a line.
fn word_cols(line: &str) -> Vec<(usize, usize)> {
    let mut cols = Vec::new();
    let mut col = 0;
    for segment in line.split_word_bounds() {
        let len = segment.chars().count();
        if segment.chars().any(char::is_alphanumeric) {
            cols.push((col, col + len));
        }
        col += len;
    }
    cols
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_with(text: &str) -> DemoHost {
        let mut host = DemoHost::new(Rope::from_str(text));
        host.clipboard = None;
        host
    }

    #[test]
    fn motions_clamp_at_document_edges() {
        let rope = Rope::from_str("ab\ncd\n");
        assert_eq!(move_left(&rope, Position::new(0, 0)), Position::new(0, 0));
        assert_eq!(move_left(&rope, Position::new(1, 0)), Position::new(0, 2));
        assert_eq!(move_right(&rope, Position::new(0, 2)), Position::new(1, 0));
        assert_eq!(move_up(&rope, Position::new(1, 1)), Position::new(0, 1));
        assert_eq!(doc_end(&rope, Position::default()), Position::new(2, 0));
    }

    #[test]
    fn word_motion_walks_line_words() {
        let rope = Rope::from_str("one two three\n");
        assert_eq!(
            word_end_right(&rope, Position::new(0, 0)),
            Position::new(0, 3)
        );
        assert_eq!(
            word_start_left(&rope, Position::new(0, 6)),
            Position::new(0, 4)
        );
        // Past the last word end, the motion crosses to the next line.
        assert_eq!(
            word_end_right(&rope, Position::new(0, 13)),
            Position::new(1, 0)
        );
    }

    #[test]
    fn selection_aware_editing() {
        let mut host = host_with("hello world\n");
        host.set_selections(vec![Span {
            anchor: Position::new(0, 0),
            active: Position::new(0, 6),
        }]);
        host.execute_command("deleteLeft", None).unwrap();
        assert_eq!(host.rope.to_string(), "world\n");
        assert!(host.primary().is_empty());
    }

    #[test]
    fn cut_and_paste_round_trip() {
        let mut host = host_with("keep cut\n");
        host.set_selections(vec![Span {
            anchor: Position::new(0, 5),
            active: Position::new(0, 8),
        }]);
        host.execute_command("clipboardCutAction", None).unwrap();
        assert_eq!(host.rope.to_string(), "keep \n");

        host.execute_command("clipboardPasteAction", None).unwrap();
        assert_eq!(host.rope.to_string(), "keep cut\n");
    }

    #[test]
    fn word_under_cursor_selection() {
        let mut host = host_with("alpha beta\n");
        host.set_selections(vec![Span::caret(Position::new(0, 7))]);
        host.execute_command("addSelectionToNextFindMatch", None)
            .unwrap();
        assert_eq!(host.selected_text(), "beta");
    }

    #[test]
    fn unknown_command_is_reported() {
        let mut host = host_with("x\n");
        assert!(host.execute_command("frobnicate", None).is_err());
    }
}
