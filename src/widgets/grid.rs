//! Editable grid over the wide table: cell edits, added rows, deleted rows.

use crossterm::event::KeyEvent;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Paragraph, Row, StatefulWidget, Table, TableState, Widget},
};
use thiserror::Error;

use crate::config::Theme;
use crate::pivot::{WideRow, WideTable};
use crate::widgets::text_input::{TextInput, TextInputEvent};

pub const YEAR_HEADER: &str = "year";

/// Edits rejected at the grid boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("year label cannot be empty")]
    EmptyYear,
    #[error("row {0} does not exist")]
    NoSuchRow(usize),
    #[error("column {0} does not exist")]
    NoSuchColumn(usize),
}

/// Edit in progress. `col` 0 is the year label, `col` n > 0 the n-th genre.
pub enum GridEdit {
    Cell {
        row: usize,
        col: usize,
        input: TextInput,
    },
    NewRow {
        input: TextInput,
    },
}

impl GridEdit {
    pub fn input(&self) -> &TextInput {
        match self {
            GridEdit::Cell { input, .. } | GridEdit::NewRow { input } => input,
        }
    }

    fn input_mut(&mut self) -> &mut TextInput {
        match self {
            GridEdit::Cell { input, .. } | GridEdit::NewRow { input } => input,
        }
    }
}

/// Parse a cell entry. Non-finite values count as non-numeric.
pub fn parse_cell_value(text: &str) -> Result<f64, GridError> {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(GridError::NotANumber(text.trim().to_string())),
    }
}

pub fn format_cell_value(value: f64) -> String {
    value.to_string()
}

pub struct GridState {
    table: WideTable,
    cursor_row: usize,
    cursor_col: usize,
    col_offset: usize,
    edited: bool,
    edit: Option<GridEdit>,
    error: Option<GridError>,
    table_state: TableState,
}

impl GridState {
    pub fn new(table: WideTable) -> Self {
        let mut state = Self {
            table: WideTable::default(),
            cursor_row: 0,
            cursor_col: 0,
            col_offset: 0,
            edited: false,
            edit: None,
            error: None,
            table_state: TableState::default(),
        };
        state.reset(table);
        state
    }

    /// Replace the table, dropping all edits
    pub fn reset(&mut self, table: WideTable) {
        self.table = table;
        self.cursor_row = 0;
        self.cursor_col = 0;
        self.col_offset = 0;
        self.edited = false;
        self.edit = None;
        self.error = None;
        self.sync_selection();
    }

    pub fn table(&self) -> &WideTable {
        &self.table
    }

    pub fn is_edited(&self) -> bool {
        self.edited
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    pub fn edit(&self) -> Option<&GridEdit> {
        self.edit.as_ref()
    }

    pub fn error(&self) -> Option<&GridError> {
        self.error.as_ref()
    }

    /// (row, column); column 0 is the year label
    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_col)
    }

    fn sync_selection(&mut self) {
        self.table_state.select(if self.table.rows.is_empty() {
            None
        } else {
            Some(self.cursor_row)
        });
    }

    pub fn move_cursor(&mut self, d_row: isize, d_col: isize) {
        if self.table.rows.is_empty() {
            return;
        }
        let max_row = self.table.rows.len() - 1;
        let max_col = self.table.genres.len();
        self.cursor_row = self.cursor_row.saturating_add_signed(d_row).min(max_row);
        self.cursor_col = self.cursor_col.saturating_add_signed(d_col).min(max_col);
        self.sync_selection();
    }

    /// Open the editor on the cursor cell, pre-filled with its current text
    pub fn begin_edit(&mut self, theme: &Theme) {
        let Some(row) = self.table.rows.get(self.cursor_row) else {
            return;
        };
        let text = match self.cursor_col {
            0 => row.year.clone(),
            col => row
                .values
                .get(col - 1)
                .copied()
                .map(format_cell_value)
                .unwrap_or_default(),
        };
        let mut input = TextInput::new().with_theme(theme).with_value(text);
        input.set_focused(true);
        self.error = None;
        self.edit = Some(GridEdit::Cell {
            row: self.cursor_row,
            col: self.cursor_col,
            input,
        });
    }

    /// Open the editor for the year label of a new row
    pub fn begin_new_row(&mut self, theme: &Theme) {
        let mut input = TextInput::new().with_theme(theme);
        input.set_focused(true);
        self.error = None;
        self.edit = Some(GridEdit::NewRow { input });
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
        self.error = None;
    }

    /// Apply the open edit. On error the editor stays open and the error is kept for display.
    pub fn commit_edit(&mut self) -> Result<(), GridError> {
        let Some(edit) = self.edit.take() else {
            return Ok(());
        };
        let result = match &edit {
            GridEdit::Cell { row, col: 0, input } => self.set_year(*row, input.value()),
            GridEdit::Cell { row, col, input } => parse_cell_value(input.value())
                .and_then(|value| self.set_cell(*row, col - 1, value)),
            GridEdit::NewRow { input } => self.add_row(input.value()),
        };
        match result {
            Ok(()) => {
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.clone());
                self.edit = Some(edit);
                Err(e)
            }
        }
    }

    /// Feed a key to the open editor. Returns true when the table changed.
    pub fn handle_edit_key(&mut self, key: &KeyEvent) -> bool {
        let Some(edit) = self.edit.as_mut() else {
            return false;
        };
        match edit.input_mut().handle_key(key) {
            TextInputEvent::Submit => self.commit_edit().is_ok(),
            TextInputEvent::Cancel => {
                self.cancel_edit();
                false
            }
            TextInputEvent::None => false,
        }
    }

    /// Append a row with every genre at 0 and move the cursor to it
    pub fn add_row(&mut self, year: &str) -> Result<(), GridError> {
        let year = year.trim();
        if year.is_empty() {
            return Err(GridError::EmptyYear);
        }
        self.table.rows.push(WideRow {
            year: year.to_string(),
            values: vec![0.0; self.table.genres.len()],
        });
        self.cursor_row = self.table.rows.len() - 1;
        self.cursor_col = 0;
        self.edited = true;
        self.sync_selection();
        tracing::debug!(year, "grid row added");
        Ok(())
    }

    pub fn delete_row(&mut self, index: usize) -> Result<WideRow, GridError> {
        if index >= self.table.rows.len() {
            return Err(GridError::NoSuchRow(index));
        }
        let removed = self.table.rows.remove(index);
        self.cursor_row = self
            .cursor_row
            .min(self.table.rows.len().saturating_sub(1));
        self.edited = true;
        self.sync_selection();
        tracing::debug!(year = %removed.year, "grid row deleted");
        Ok(removed)
    }

    /// Set the value of genre column `col` in `row`
    pub fn set_cell(&mut self, row: usize, col: usize, value: f64) -> Result<(), GridError> {
        let cell = self
            .table
            .rows
            .get_mut(row)
            .ok_or(GridError::NoSuchRow(row))?
            .values
            .get_mut(col)
            .ok_or(GridError::NoSuchColumn(col))?;
        *cell = value;
        self.edited = true;
        Ok(())
    }

    pub fn set_year(&mut self, row: usize, label: &str) -> Result<(), GridError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(GridError::EmptyYear);
        }
        let target = self
            .table
            .rows
            .get_mut(row)
            .ok_or(GridError::NoSuchRow(row))?;
        target.year = label.to_string();
        self.edited = true;
        Ok(())
    }

    /// Keep the cursor column on screen given the available widths
    fn scroll_columns_into_view(&mut self, widths: &[u16], year_width: u16, area_width: u16) {
        if self.cursor_col == 0 {
            return;
        }
        let target = self.cursor_col - 1;
        if target < self.col_offset {
            self.col_offset = target;
            return;
        }
        loop {
            let used: u16 = year_width
                + widths[self.col_offset..=target]
                    .iter()
                    .map(|w| w + 1)
                    .sum::<u16>();
            if used <= area_width || self.col_offset >= target {
                break;
            }
            self.col_offset += 1;
        }
    }
}

/// Renders a [`GridState`]: header of genre names, year labels down the left,
/// the cursor cell highlighted, and the editor line when an edit is open.
pub struct Grid {
    header_bg: Color,
    header_fg: Color,
    border_color: Color,
    active_color: Color,
    editing_color: Color,
    error_color: Color,
    focused: bool,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            header_bg: Color::Indexed(236),
            header_fg: Color::White,
            border_color: Color::Cyan,
            active_color: Color::Yellow,
            editing_color: Color::Yellow,
            error_color: Color::Red,
            focused: false,
        }
    }
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_theme(mut self, theme: &Theme) -> Self {
        self.header_bg = theme.get("table_header_bg");
        self.header_fg = theme.get("table_header");
        self.border_color = theme.get("modal_border");
        self.active_color = theme.get("modal_border_active");
        self.editing_color = theme.get("cell_editing");
        self.error_color = theme.get("error");
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn render_editor(&self, area: Rect, buf: &mut Buffer, state: &GridState) {
        let Some(edit) = state.edit() else {
            return;
        };
        let title = match edit {
            GridEdit::NewRow { .. } => " New row year ".to_string(),
            GridEdit::Cell { row, col: 0, .. } => {
                let year = state.table.rows.get(*row).map(|r| r.year.as_str());
                format!(" Year label (was {}) ", year.unwrap_or("?"))
            }
            GridEdit::Cell { row, col, .. } => {
                let year = state.table.rows.get(*row).map(|r| r.year.as_str());
                let genre = state.table.genres.get(col - 1).map(|g| g.as_str());
                format!(" {} @ {} ", genre.unwrap_or("?"), year.unwrap_or("?"))
            }
        };
        let border = if state.error.is_some() {
            self.error_color
        } else {
            self.editing_color
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(border));
        let inner = block.inner(area);
        block.render(area, buf);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Fill(1)])
            .split(inner);
        edit.input().render(rows[0], buf);
        if let Some(error) = &state.error {
            Paragraph::new(error.to_string())
                .style(Style::default().fg(self.error_color))
                .render(rows[1], buf);
        }
    }
}

impl StatefulWidget for Grid {
    type State = GridState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let title = if state.edited {
            " Table (edited) "
        } else {
            " Table "
        };
        let border = if self.focused {
            self.active_color
        } else {
            self.border_color
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(border));
        let inner = block.inner(area);
        block.render(area, buf);

        let (table_area, editor_area) = if state.is_editing() {
            let height = if state.error.is_some() { 4 } else { 3 };
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Fill(1), Constraint::Length(height)])
                .split(inner);
            (chunks[0], Some(chunks[1]))
        } else {
            (inner, None)
        };

        if state.table.rows.is_empty() || state.table.genres.is_empty() {
            Paragraph::new("No data for this selection")
                .style(Style::default().fg(Color::DarkGray))
                .centered()
                .render(table_area, buf);
        } else {
            let year_width = state
                .table
                .rows
                .iter()
                .map(|r| r.year.chars().count() as u16)
                .chain(std::iter::once(YEAR_HEADER.len() as u16))
                .max()
                .unwrap_or(4);
            let widths: Vec<u16> = state
                .table
                .genres
                .iter()
                .enumerate()
                .map(|(i, genre)| {
                    state
                        .table
                        .rows
                        .iter()
                        .filter_map(|r| r.values.get(i))
                        .map(|v| format_cell_value(*v).chars().count() as u16)
                        .chain(std::iter::once(genre.chars().count() as u16))
                        .max()
                        .unwrap_or(1)
                })
                .collect();

            state.scroll_columns_into_view(&widths, year_width + 1, table_area.width);
            let offset = state.col_offset;

            let cursor_style = if self.focused {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default().add_modifier(Modifier::UNDERLINED)
            };
            let (cursor_row, cursor_col) = state.cursor();

            let header_style = if self.header_bg == Color::Reset {
                Style::default().fg(self.header_fg)
            } else {
                Style::default().bg(self.header_bg).fg(self.header_fg)
            };
            let header = Row::new(
                std::iter::once(Cell::from(YEAR_HEADER))
                    .chain(state.table.genres[offset..].iter().map(|g| Cell::from(g.as_str()))),
            )
            .style(header_style);

            let rows: Vec<Row> = state
                .table
                .rows
                .iter()
                .enumerate()
                .map(|(r, row)| {
                    let style_for = |c: usize| {
                        if r == cursor_row && c == cursor_col {
                            cursor_style
                        } else {
                            Style::default()
                        }
                    };
                    let year = Cell::from(Line::from(row.year.as_str())).style(style_for(0));
                    let values = row.values[offset..].iter().enumerate().map(|(i, v)| {
                        Cell::from(Line::from(format_cell_value(*v)).right_aligned())
                            .style(style_for(offset + i + 1))
                    });
                    Row::new(std::iter::once(year).chain(values))
                })
                .collect();

            let constraints: Vec<Constraint> = std::iter::once(year_width)
                .chain(widths[offset..].iter().copied())
                .map(Constraint::Length)
                .collect();

            StatefulWidget::render(
                Table::new(rows, constraints)
                    .column_spacing(1)
                    .header(header)
                    .row_highlight_style(Style::default().add_modifier(Modifier::BOLD)),
                table_area,
                buf,
                &mut state.table_state,
            );
        }

        if let Some(editor_area) = editor_area {
            self.render_editor(editor_area, buf, state);
        }
    }
}
