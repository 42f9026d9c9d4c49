use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Paragraph, Widget},
};

/// Key hints for the focused pane
pub type KeyHints = &'static [(&'static str, &'static str)];

pub const GENRE_HINTS: KeyHints = &[
    ("↑↓", "Move"),
    ("Space", "Toggle"),
    ("Tab", "Next"),
    ("e", "Export"),
    ("?", "About"),
    ("q", "Quit"),
];

pub const YEAR_HINTS: KeyHints = &[
    ("←→", "Move"),
    ("↑↓", "Handle"),
    ("Tab", "Next"),
    ("e", "Export"),
    ("?", "About"),
    ("q", "Quit"),
];

pub const GRID_HINTS: KeyHints = &[
    ("Enter", "Edit"),
    ("a", "Add row"),
    ("d", "Delete row"),
    ("Tab", "Next"),
    ("e", "Export"),
    ("q", "Quit"),
];

pub const EDIT_HINTS: KeyHints = &[("Enter", "Apply"), ("Esc", "Cancel")];

pub const CHART_HINTS: KeyHints = &[
    ("l", "Legend"),
    ("Tab", "Next"),
    ("e", "Export"),
    ("?", "About"),
    ("q", "Quit"),
];

/// Bottom bar: key hints on the left, a status summary on the right
pub struct Controls {
    hints: KeyHints,
    status: Option<String>,
    key_color: Color,
    bg_color: Color,
}

impl Controls {
    pub fn new(hints: KeyHints) -> Self {
        Self {
            hints,
            status: None,
            key_color: Color::Reset,
            bg_color: Color::DarkGray,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_colors(mut self, key_color: Color, bg_color: Color) -> Self {
        self.key_color = key_color;
        self.bg_color = bg_color;
        self
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut constraints = self.hints.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });
        constraints.push(Constraint::Fill(1));

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);
        let bar_style = Style::default().bg(self.bg_color);

        for (i, (key, action)) in self.hints.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(Style::default().fg(self.key_color).bold())
                .centered()
                .render(layout[j], buf);
            Paragraph::new(*action)
                .style(bar_style)
                .render(layout[j + 1], buf);
        }

        let fill = layout[self.hints.len() * 2];
        Paragraph::new(self.status.clone().unwrap_or_default())
            .style(bar_style)
            .right_aligned()
            .render(fill, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn renders_hints_and_status() {
        let area = Rect::new(0, 0, 80, 1);
        let mut buf = Buffer::empty(area);
        Controls::new(GRID_HINTS)
            .with_status("3 rows")
            .render(area, &mut buf);
        let text = row_text(&buf, 0);
        assert!(text.contains("Enter"), "got: {}", text);
        assert!(text.contains("Add row"), "got: {}", text);
        assert!(text.trim_end().ends_with("3 rows"), "got: {}", text);
    }
}
