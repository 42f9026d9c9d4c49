use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use tui_textarea::{CursorMove, Input, Key, TextArea};

use crate::config::Theme;

/// Event emitted by TextInput widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputEvent {
    None,
    Submit, // Enter pressed
    Cancel, // Esc pressed
}

/// Single-line text input wrapping tui-textarea.
/// Used for cell values, new-row year labels and export paths.
pub struct TextInput {
    textarea: TextArea<'static>,
    value: String,
    text_color: Option<Color>,
    cursor_color: Option<Color>,
    focused: bool,
}

impl TextInput {
    pub fn new() -> Self {
        let mut widget = Self {
            textarea: TextArea::default(),
            value: String::new(),
            text_color: None,
            cursor_color: None,
            focused: false,
        };
        widget.apply_style();
        widget
    }

    /// Start with `value` and the cursor at its end
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.set_value(value.into());
        self
    }

    /// Text color from `text_primary`, cursor color from `cell_editing`
    pub fn with_theme(mut self, theme: &Theme) -> Self {
        self.text_color = Some(theme.get("text_primary"));
        self.cursor_color = Some(theme.get("cell_editing"));
        self.apply_style();
        self
    }

    fn apply_style(&mut self) {
        let mut style = Style::default();
        if let Some(color) = self.text_color {
            style = style.fg(color);
        }
        self.textarea.set_style(style);
        // No underline on the cursor line
        self.textarea.set_cursor_line_style(Style::default());
        self.apply_cursor_style();
    }

    fn apply_cursor_style(&mut self) {
        let cursor_style = match (self.focused, self.cursor_color) {
            (false, _) => self.textarea.style(),
            (true, None) | (true, Some(Color::Reset)) => {
                Style::default().add_modifier(Modifier::REVERSED)
            }
            (true, Some(color)) => Style::default().bg(color).fg(Color::Black),
        };
        self.textarea.set_cursor_style(cursor_style);
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.apply_cursor_style();
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the text; newlines become spaces and the cursor moves to the end.
    pub fn set_value(&mut self, value: String) {
        self.value = value.replace(['\n', '\r'], " ");
        self.textarea = TextArea::new(vec![self.value.clone()]);
        self.apply_style();
        self.textarea.move_cursor(CursorMove::End);
    }

    pub fn clear(&mut self) {
        self.set_value(String::new());
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Cursor column (characters from the start)
    pub fn cursor(&self) -> usize {
        self.textarea.cursor().1
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> TextInputEvent {
        match event.code {
            KeyCode::Enter => TextInputEvent::Submit,
            KeyCode::Esc => TextInputEvent::Cancel,
            KeyCode::Up | KeyCode::Down | KeyCode::Tab | KeyCode::BackTab => TextInputEvent::None,
            _ => {
                self.textarea.input(key_event_to_input(event));
                self.value = self.textarea.lines().first().cloned().unwrap_or_default();
                TextInputEvent::None
            }
        }
    }
}

/// Convert crossterm KeyEvent to tui_textarea::Input
fn key_event_to_input(event: &KeyEvent) -> Input {
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Delete => Key::Delete,
        _ => Key::Null,
    };

    Input {
        key,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        alt: event.modifiers.contains(KeyModifiers::ALT),
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
    }
}

impl Default for TextInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for &TextInput {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        self.textarea.render(area, buf);

        // tui-textarea underlines the cursor line; strip it
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let cell = &mut buf[(x, y)];
                let style = cell.style().remove_modifier(Modifier::UNDERLINED);
                cell.set_style(style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_text_input_new() {
        let input = TextInput::new();
        assert_eq!(input.value(), "");
        assert_eq!(input.cursor(), 0);
        assert!(!input.is_focused());
    }

    #[test]
    fn test_with_value_puts_cursor_at_end() {
        let input = TextInput::new().with_value("2000");
        assert_eq!(input.value(), "2000");
        assert_eq!(input.cursor(), 4);
    }

    #[test]
    fn test_typing_and_backspace() {
        let mut input = TextInput::new().with_value("8");
        assert_eq!(input.handle_key(&key(KeyCode::Backspace)), TextInputEvent::None);
        input.handle_key(&key(KeyCode::Char('2')));
        input.handle_key(&key(KeyCode::Char('0')));
        assert_eq!(input.value(), "20");
        assert_eq!(input.handle_key(&key(KeyCode::Enter)), TextInputEvent::Submit);
        assert_eq!(input.handle_key(&key(KeyCode::Esc)), TextInputEvent::Cancel);
    }

    #[test]
    fn test_newlines_flattened() {
        let mut input = TextInput::new();
        input.set_value("a\nb".to_string());
        assert_eq!(input.value(), "a b");
        input.clear();
        assert!(input.is_empty());
    }
}
