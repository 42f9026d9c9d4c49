//! Sidebar controls: genre multiselect and a two-handle year slider.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};

use crate::config::Theme;
use crate::selection::{Selection, SelectionOptions, YearRange};

/// Which slider handle the arrow keys move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeHandle {
    #[default]
    Start,
    End,
}

impl RangeHandle {
    pub fn other(self) -> Self {
        match self {
            RangeHandle::Start => RangeHandle::End,
            RangeHandle::End => RangeHandle::Start,
        }
    }
}

pub struct SelectionPanelState {
    options: SelectionOptions,
    selection: Selection,
    genre_list: ListState,
    handle: RangeHandle,
}

impl SelectionPanelState {
    pub fn new(options: SelectionOptions, selection: Selection) -> Self {
        let mut genre_list = ListState::default();
        if !options.genres.is_empty() {
            genre_list.select(Some(0));
        }
        Self {
            options,
            selection,
            genre_list,
            handle: RangeHandle::Start,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn options(&self) -> &SelectionOptions {
        &self.options
    }

    pub fn handle(&self) -> RangeHandle {
        self.handle
    }

    pub fn genre_cursor(&self) -> Option<usize> {
        self.genre_list.selected()
    }

    /// Genre under the cursor
    pub fn current_genre(&self) -> Option<&str> {
        self.genre_cursor()
            .and_then(|i| self.options.genres.get(i))
            .map(|g| g.as_str())
    }

    /// Replace the available options after a reload, keeping the selection.
    pub fn set_options(&mut self, options: SelectionOptions) {
        let cursor = self
            .genre_cursor()
            .map(|i| i.min(options.genres.len().saturating_sub(1)));
        self.genre_list
            .select(if options.genres.is_empty() { None } else { cursor });
        self.options = options;
    }

    pub fn move_genre_cursor(&mut self, delta: isize) {
        let len = self.options.genres.len();
        if len == 0 {
            return;
        }
        let current = self.genre_cursor().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(len - 1);
        self.genre_list.select(Some(next));
    }

    /// Toggle the genre under the cursor. Returns true when the selection changed.
    pub fn toggle_current(&mut self) -> bool {
        let Some(genre) = self.current_genre().map(str::to_string) else {
            return false;
        };
        self.selection.toggle_genre(&genre);
        true
    }

    pub fn switch_handle(&mut self) {
        self.handle = self.handle.other();
    }

    /// Index into the distinct years of the nearest year at or inside `year`
    fn year_index(&self, year: i64, handle: RangeHandle) -> Option<usize> {
        let years = &self.options.years;
        match handle {
            RangeHandle::Start => years.iter().position(|&y| y >= year),
            RangeHandle::End => years.iter().rposition(|&y| y <= year),
        }
    }

    /// Step the active handle through the distinct years. The handles never cross.
    /// Returns true when the range changed.
    pub fn move_handle(&mut self, delta: isize) -> bool {
        let years = &self.options.years;
        if years.is_empty() {
            return false;
        }
        let last = years.len() - 1;
        let range = self.selection.year_range;
        let start = self.year_index(range.start, RangeHandle::Start).unwrap_or(last);
        let end = self.year_index(range.end, RangeHandle::End).unwrap_or(0);

        let new_range = match self.handle {
            RangeHandle::Start => {
                let i = start.saturating_add_signed(delta).min(end.max(start));
                YearRange::new(years[i], range.end)
            }
            RangeHandle::End => {
                let i = end.saturating_add_signed(delta).min(last).max(start.min(end));
                YearRange::new(range.start, years[i])
            }
        };
        if new_range == range || new_range.is_empty() {
            return false;
        }
        self.selection.year_range = new_range;
        true
    }
}

pub struct SelectionPanel {
    border_color: Color,
    active_color: Color,
    text_color: Color,
    dimmed_color: Color,
    handle_color: Color,
    focus: Option<PanelFocus>,
}

/// Part of the panel holding keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    Genres,
    Years,
}

impl Default for SelectionPanel {
    fn default() -> Self {
        Self {
            border_color: Color::Cyan,
            active_color: Color::Yellow,
            text_color: Color::Reset,
            dimmed_color: Color::DarkGray,
            handle_color: Color::Yellow,
            focus: None,
        }
    }
}

impl SelectionPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_theme(mut self, theme: &Theme) -> Self {
        self.border_color = theme.get("modal_border");
        self.active_color = theme.get("modal_border_active");
        self.text_color = theme.get("text_primary");
        self.dimmed_color = theme.get("dimmed");
        self.handle_color = theme.get("secondary");
        self
    }

    pub fn focus(mut self, focus: Option<PanelFocus>) -> Self {
        self.focus = focus;
        self
    }

    fn border_for(&self, part: PanelFocus) -> Style {
        if self.focus == Some(part) {
            Style::default().fg(self.active_color)
        } else {
            Style::default().fg(self.border_color)
        }
    }

    fn render_genres(&self, area: Rect, buf: &mut Buffer, state: &mut SelectionPanelState) {
        let selected = state.selection.genres.len();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Genres ({}/{}) ", selected, state.options.genres.len()))
            .border_style(self.border_for(PanelFocus::Genres));

        if state.options.genres.is_empty() {
            Paragraph::new("No genres")
                .style(Style::default().fg(self.dimmed_color))
                .block(block)
                .render(area, buf);
            return;
        }

        let items: Vec<ListItem> = state
            .options
            .genres
            .iter()
            .map(|genre| {
                let checked = state.selection.contains_genre(genre);
                let mark = if checked { "[x] " } else { "[ ] " };
                let style = if checked {
                    Style::default().fg(self.text_color)
                } else {
                    Style::default().fg(self.dimmed_color)
                };
                ListItem::new(Line::from(vec![Span::raw(mark), Span::raw(genre.as_str())]))
                    .style(style)
            })
            .collect();

        let highlight = if self.focus == Some(PanelFocus::Genres) {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        StatefulWidget::render(
            List::new(items).block(block).highlight_style(highlight),
            area,
            buf,
            &mut state.genre_list,
        );
    }

    fn render_years(&self, area: Rect, buf: &mut Buffer, state: &SelectionPanelState) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Years ")
            .border_style(self.border_for(PanelFocus::Years));
        let inner = block.inner(area);
        block.render(area, buf);

        let Some((lo, hi)) = state.options.bounds() else {
            Paragraph::new("No years")
                .style(Style::default().fg(self.dimmed_color))
                .render(inner, buf);
            return;
        };
        let range = state.selection.year_range;

        let lines = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
            .split(inner);

        let handle_style = |h: RangeHandle| {
            let style = Style::default().fg(self.handle_color);
            if self.focus == Some(PanelFocus::Years) && state.handle == h {
                style.add_modifier(Modifier::REVERSED | Modifier::BOLD)
            } else {
                style
            }
        };
        Paragraph::new(Line::from(vec![
            Span::styled(range.start.to_string(), handle_style(RangeHandle::Start)),
            Span::raw(" .. "),
            Span::styled(range.end.to_string(), handle_style(RangeHandle::End)),
        ]))
        .centered()
        .render(lines[0], buf);

        Paragraph::new(slider_track(lo, hi, range, lines[1].width))
            .style(Style::default().fg(self.handle_color))
            .render(lines[1], buf);

        Paragraph::new(Line::from(vec![
            Span::raw(lo.to_string()),
            Span::raw(" ".repeat(
                (lines[2].width as usize).saturating_sub(lo.to_string().len() + hi.to_string().len()),
            )),
            Span::raw(hi.to_string()),
        ]))
        .style(Style::default().fg(self.dimmed_color))
        .render(lines[2], buf);
    }
}

/// Track of `width` cells with `[` and `]` at the handle positions
pub fn slider_track(lo: i64, hi: i64, range: YearRange, width: u16) -> String {
    let width = width as usize;
    if width < 2 {
        return String::new();
    }
    let span = (hi - lo).max(1) as f64;
    let position = |year: i64| {
        let t = (year.clamp(lo, hi) - lo) as f64 / span;
        (t * (width - 1) as f64).round() as usize
    };
    let start = position(range.start);
    let end = position(range.end).max(start);
    (0..width)
        .map(|i| {
            if i == start {
                '['
            } else if i == end {
                ']'
            } else if i > start && i < end {
                '='
            } else {
                '-'
            }
        })
        .collect()
}

impl StatefulWidget for SelectionPanel {
    type State = SelectionPanelState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Fill(1), Constraint::Length(5)])
            .split(area);
        self.render_genres(chunks[0], buf, state);
        self.render_years(chunks[1], buf, state);
    }
}
