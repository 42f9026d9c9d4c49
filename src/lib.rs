use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, StatefulWidget, Wrap};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

pub mod cache;
pub mod chart_data;
pub mod chart_export;
pub mod config;
pub mod dataset;
pub mod error_display;
pub mod logging;
pub mod pipeline;
pub mod pivot;
pub mod reshape;
pub mod selection;
pub mod widgets;

pub use cache::CacheManager;
pub use config::{AppConfig, ColorParser, ConfigManager, Theme};
pub use dataset::{Dataset, GenreRecord, LoadError, LoadOptions};
pub use genre_trends_cli::Args;
pub use pipeline::{PipelineContext, PipelineError, ReloadPolicy};
pub use pivot::{filter_pivot, WideRow, WideTable};
pub use reshape::{melt, LongRow, LongTable};
pub use selection::{Selection, SelectionOptions, YearRange};

use chart_data::{prepare_chart_data, ChartData};
use chart_export::{
    default_export_path, resolve_export_target, write_chart, ChartExportFormat,
};
use error_display::{user_message_from_pipeline, user_message_from_report};
use widgets::chart::GenreChart;
use widgets::controls::{
    Controls, KeyHints, CHART_HINTS, EDIT_HINTS, GENRE_HINTS, GRID_HINTS, YEAR_HINTS,
};
use widgets::grid::{Grid, GridState};
use widgets::selection_panel::{PanelFocus, SelectionPanel, SelectionPanelState};
use widgets::text_input::{TextInput, TextInputEvent};

pub const APP_NAME: &str = "genre-trends";

/// CSV reading options: CLI flags win over `[data]` config values.
pub fn load_options(args: &Args, config: &AppConfig) -> LoadOptions {
    let mut options = LoadOptions::new();
    if let Some(delimiter) = args.delimiter.or(config.data.delimiter) {
        options = options.with_delimiter(delimiter);
    }
    let has_header = !args.no_header && config.data.has_header.unwrap_or(true);
    options.with_has_header(has_header)
}

pub fn reload_policy(args: &Args, config: &AppConfig) -> ReloadPolicy {
    if args.snapshot {
        ReloadPolicy::Snapshot
    } else {
        config.data.reload
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16), // resized (width, height)
    /// Genre set or year window changed: reload (per policy) and filter-pivot again
    SelectionChanged,
    /// Grid table changed: melt and chart again
    GridEdited,
    ExportChart(PathBuf),
    Exit,
    Crash(String),
}

/// Pane receiving keys, in Tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Genres,
    Years,
    Grid,
    Chart,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Genres => Focus::Years,
            Focus::Years => Focus::Grid,
            Focus::Grid => Focus::Chart,
            Focus::Chart => Focus::Genres,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Genres => Focus::Chart,
            Focus::Years => Focus::Genres,
            Focus::Grid => Focus::Years,
            Focus::Chart => Focus::Grid,
        }
    }

    fn hints(self) -> KeyHints {
        match self {
            Focus::Genres => GENRE_HINTS,
            Focus::Years => YEAR_HINTS,
            Focus::Grid => GRID_HINTS,
            Focus::Chart => CHART_HINTS,
        }
    }
}

#[derive(Default)]
pub struct ErrorModal {
    pub active: bool,
    pub message: String,
}

impl ErrorModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: String) {
        self.active = true;
        self.message = message;
    }

    pub fn hide(&mut self) {
        self.active = false;
        self.message.clear();
    }
}

pub struct App {
    theme: Theme,
    config: AppConfig,
    pipeline: PipelineContext,
    panel: SelectionPanelState,
    grid: GridState,
    long: LongTable,
    chart_data: ChartData,
    focus: Focus,
    show_legend: bool,
    show_about: bool,
    export_prompt: Option<TextInput>,
    error_modal: ErrorModal,
    status: Option<String>,
}

impl App {
    /// Build the first view: default selection over the pipeline's dataset.
    pub fn new_with_config(
        theme: Theme,
        config: AppConfig,
        mut pipeline: PipelineContext,
    ) -> Result<Self, PipelineError> {
        let dataset = match pipeline.last_dataset() {
            Some(dataset) => Arc::clone(dataset),
            None => pipeline.dataset()?,
        };
        let options = SelectionOptions::from_dataset(&dataset);
        let selection = Selection::default_for(&options, &config.selection_defaults());
        let table = filter_pivot(&dataset, &selection)?;
        tracing::info!(
            genres = selection.genres.len(),
            start = selection.year_range.start,
            end = selection.year_range.end,
            rows = table.num_rows(),
            columns = table.num_columns(),
            "initial view"
        );

        let long = melt(&table);
        let chart_data = prepare_chart_data(&long);
        let show_legend = config.chart.show_legend;
        Ok(Self {
            theme,
            config,
            pipeline,
            panel: SelectionPanelState::new(options, selection),
            grid: GridState::new(table),
            long,
            chart_data,
            focus: Focus::default(),
            show_legend,
            show_about: false,
            export_prompt: None,
            error_modal: ErrorModal::new(),
            status: None,
        })
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn selection(&self) -> &Selection {
        self.panel.selection()
    }

    pub fn panel(&self) -> &SelectionPanelState {
        &self.panel
    }

    pub fn grid(&self) -> &GridState {
        &self.grid
    }

    pub fn long_table(&self) -> &LongTable {
        &self.long
    }

    pub fn chart_data(&self) -> &ChartData {
        &self.chart_data
    }

    pub fn pipeline(&self) -> &PipelineContext {
        &self.pipeline
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_modal
            .active
            .then_some(self.error_modal.message.as_str())
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn show_legend(&self) -> bool {
        self.show_legend
    }

    pub fn is_about_visible(&self) -> bool {
        self.show_about
    }

    pub fn export_prompt(&self) -> Option<&TextInput> {
        self.export_prompt.as_ref()
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::SelectionChanged => {
                self.recompute();
                None
            }
            AppEvent::GridEdited => {
                self.refresh_chart();
                None
            }
            AppEvent::ExportChart(path) => {
                self.export_chart(path);
                None
            }
            AppEvent::Resize(_, _) | AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    /// Re-run load and filter-pivot for the current selection. Grid edits are discarded.
    /// On failure the previous view stays and the error modal explains why.
    fn recompute(&mut self) {
        let selection = self.panel.selection().clone();
        match self.pipeline.run(&selection) {
            Ok(run) => {
                let options = SelectionOptions::from_dataset(&run.dataset);
                if &options != self.panel.options() {
                    self.panel.set_options(options);
                }
                if self.grid.is_edited() {
                    tracing::debug!("selection changed, discarding grid edits");
                }
                self.grid.reset(run.table);
                self.refresh_chart();
                self.status = None;
            }
            Err(e) => {
                tracing::error!(error = %e, "pipeline run failed");
                self.error_modal.show(user_message_from_pipeline(&e));
            }
        }
    }

    fn refresh_chart(&mut self) {
        self.long = melt(self.grid.table());
        self.chart_data = prepare_chart_data(&self.long);
    }

    /// Configured export format, falling back to PNG
    fn export_format(&self) -> ChartExportFormat {
        self.config
            .chart
            .export_format()
            .unwrap_or(ChartExportFormat::Png)
    }

    fn export_chart(&mut self, path: &Path) {
        let (path, format) = match resolve_export_target(path, self.export_format()) {
            Ok(target) => target,
            Err(e) => {
                self.error_modal.show(e.to_string());
                return;
            }
        };

        match write_chart(
            &path,
            format,
            &self.chart_data,
            self.config.chart.export_size(),
        ) {
            Ok(()) => self.status = Some(format!("Chart saved to {}", path.display())),
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "chart export failed");
                self.error_modal
                    .show(user_message_from_report(&e, Some(path.as_path())));
            }
        }
    }

    fn open_export_prompt(&mut self) {
        let suggested = default_export_path(&self.config.chart.export_dir(), self.export_format());
        let mut input = TextInput::new()
            .with_theme(&self.theme)
            .with_value(suggested.display().to_string());
        input.set_focused(true);
        self.export_prompt = Some(input);
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        if event.kind != KeyEventKind::Press {
            return None;
        }

        // Error modal has highest priority
        if self.error_modal.active {
            if matches!(event.code, KeyCode::Esc | KeyCode::Enter) {
                self.error_modal.hide();
            }
            return None;
        }

        if self.show_about {
            if matches!(
                event.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_about = false;
            }
            return None;
        }

        if let Some(input) = self.export_prompt.as_mut() {
            return match input.handle_key(event) {
                TextInputEvent::Submit => {
                    let value = input.value().trim().to_string();
                    self.export_prompt = None;
                    let path = if value.is_empty() {
                        default_export_path(&self.config.chart.export_dir(), self.export_format())
                    } else {
                        PathBuf::from(value)
                    };
                    Some(AppEvent::ExportChart(path))
                }
                TextInputEvent::Cancel => {
                    self.export_prompt = None;
                    None
                }
                TextInputEvent::None => None,
            };
        }

        if self.grid.is_editing() {
            return self.grid.handle_edit_key(event).then_some(AppEvent::GridEdited);
        }

        match event.code {
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                return Some(AppEvent::Exit)
            }
            KeyCode::Char('q') => return Some(AppEvent::Exit),
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return None;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                return None;
            }
            KeyCode::Char('?') => {
                self.show_about = true;
                return None;
            }
            KeyCode::Char('e') => {
                self.open_export_prompt();
                return None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Genres => self.genres_key(event),
            Focus::Years => self.years_key(event),
            Focus::Grid => self.grid_key(event),
            Focus::Chart => {
                if event.code == KeyCode::Char('l') {
                    self.show_legend = !self.show_legend;
                }
                None
            }
        }
    }

    fn genres_key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        match event.code {
            KeyCode::Up | KeyCode::Char('k') => self.panel.move_genre_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.panel.move_genre_cursor(1),
            KeyCode::Home => self.panel.move_genre_cursor(isize::MIN),
            KeyCode::End => self.panel.move_genre_cursor(isize::MAX),
            KeyCode::Char(' ') | KeyCode::Enter => {
                return self
                    .panel
                    .toggle_current()
                    .then_some(AppEvent::SelectionChanged)
            }
            _ => {}
        }
        None
    }

    fn years_key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        let delta = match event.code {
            KeyCode::Left | KeyCode::Char('h') => -1,
            KeyCode::Right | KeyCode::Char('l') => 1,
            KeyCode::Up | KeyCode::Down | KeyCode::Char('k') | KeyCode::Char('j') => {
                self.panel.switch_handle();
                return None;
            }
            _ => return None,
        };
        self.panel
            .move_handle(delta)
            .then_some(AppEvent::SelectionChanged)
    }

    fn grid_key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        match event.code {
            KeyCode::Up | KeyCode::Char('k') => self.grid.move_cursor(-1, 0),
            KeyCode::Down | KeyCode::Char('j') => self.grid.move_cursor(1, 0),
            KeyCode::Left | KeyCode::Char('h') => self.grid.move_cursor(0, -1),
            KeyCode::Right | KeyCode::Char('l') => self.grid.move_cursor(0, 1),
            KeyCode::Enter => self.grid.begin_edit(&self.theme),
            KeyCode::Char('a') => self.grid.begin_new_row(&self.theme),
            KeyCode::Char('d') | KeyCode::Delete => {
                let (row, _) = self.grid.cursor();
                return self.grid.delete_row(row).is_ok().then_some(AppEvent::GridEdited);
            }
            _ => {}
        }
        None
    }

    fn color(&self, name: &str) -> Color {
        self.theme.get(name)
    }

    fn status_line(&self) -> String {
        if let Some(status) = &self.status {
            return status.clone();
        }
        let table = self.grid.table();
        let range = self.panel.selection().year_range;
        format!(
            "{} years x {} genres | {}-{} | {} points",
            table.num_rows(),
            table.num_columns(),
            range.start,
            range.end,
            self.long.len()
        )
    }

    fn render_title(&self, area: Rect, buf: &mut Buffer) {
        let source = self
            .pipeline
            .last_dataset()
            .map(|d| format!("{} ({} rows)", d.path().display(), d.len()))
            .unwrap_or_else(|| self.pipeline.path().display().to_string());
        let policy = match self.pipeline.policy() {
            ReloadPolicy::EveryRun => "live",
            ReloadPolicy::Snapshot => "snapshot",
        };
        Paragraph::new(Line::from(vec![
            Span::styled(
                APP_NAME,
                Style::default()
                    .fg(self.color("primary"))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(source, Style::default().fg(self.color("text_primary"))),
            Span::raw("  "),
            Span::styled(
                format!("[{}]", policy),
                Style::default().fg(self.color("text_secondary")),
            ),
        ]))
        .render(area, buf);
    }

    fn render_error_modal(&self, area: Rect, buf: &mut Buffer) {
        let popup_area = centered_rect(area, 70, 40);
        Clear.render(popup_area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Error")
            .border_style(Style::default().fg(self.color("modal_border_error")));
        let inner_area = block.inner(popup_area);
        block.render(popup_area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(inner_area);

        Paragraph::new(self.error_modal.message.as_str())
            .style(Style::default().fg(self.color("error")))
            .wrap(Wrap { trim: true })
            .render(chunks[0], buf);

        Paragraph::new("[ OK ]")
            .centered()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.color("modal_border_active"))),
            )
            .render(chunks[1], buf);
    }

    fn render_about(&self, area: Rect, buf: &mut Buffer) {
        let popup_area = centered_rect(area, 60, 60);
        Clear.render(popup_area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" About ")
            .border_style(Style::default().fg(self.color("modal_border_active")));
        let text = "\
Popularity of music genres over time.

Pick genres and a year window in the sidebar. The table sums popularity per
year and genre; edit it to try out values, the chart follows the table.
Changing the selection rebuilds the table from the file and drops edits.

Tab / Shift-Tab   switch pane
Space             toggle genre
Left / Right      move year handle (Up / Down picks the handle)
Enter             edit cell, confirm
a / d             add row / delete row
l                 toggle chart legend
e                 export chart (.png or .svg)
q                 quit";
        Paragraph::new(text)
            .style(Style::default().fg(self.color("text_primary")))
            .wrap(Wrap { trim: false })
            .block(block)
            .render(popup_area, buf);
    }

    fn render_export_prompt(&self, input: &TextInput, area: Rect, buf: &mut Buffer) {
        let popup_area = centered_rect(area, 60, 20);
        Clear.render(popup_area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Export chart (.png or .svg) ")
            .border_style(Style::default().fg(self.color("modal_border_active")));
        let inner = block.inner(popup_area);
        block.render(popup_area, buf);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Fill(1)])
            .split(inner);
        input.render(rows[0], buf);
        Paragraph::new("Enter to save, Esc to cancel")
            .style(Style::default().fg(self.color("text_secondary")))
            .render(rows[2], buf);
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let background = self.color("background");
        if background != Color::Reset {
            Block::default()
                .style(Style::default().bg(background))
                .render(area, buf);
        }

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Fill(1),
                Constraint::Length(1),
            ])
            .split(area);
        self.render_title(layout[0], buf);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(28), Constraint::Fill(1)])
            .split(layout[1]);
        let main = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(45), Constraint::Fill(1)])
            .split(body[1]);

        let panel_focus = match self.focus {
            Focus::Genres => Some(PanelFocus::Genres),
            Focus::Years => Some(PanelFocus::Years),
            _ => None,
        };
        SelectionPanel::new()
            .with_theme(&self.theme)
            .focus(panel_focus)
            .render(body[0], buf, &mut self.panel);

        Grid::new()
            .with_theme(&self.theme)
            .focused(self.focus == Focus::Grid)
            .render(main[0], buf, &mut self.grid);

        GenreChart::new(&self.chart_data, &self.theme)
            .show_legend(self.show_legend)
            .focused(self.focus == Focus::Chart)
            .render(main[1], buf);

        let hints = if self.grid.is_editing() {
            EDIT_HINTS
        } else {
            self.focus.hints()
        };
        Controls::new(hints)
            .with_status(self.status_line())
            .with_colors(self.color("keybind_hints"), self.color("controls_bg"))
            .render(layout[2], buf);

        if let Some(input) = &self.export_prompt {
            self.render_export_prompt(input, area, buf);
        }
        if self.show_about {
            self.render_about(area, buf);
        }
        // Error modal shows on top of everything
        if self.error_modal.active {
            self.render_error_modal(area, buf);
        }
    }
}

fn centered_rect(r: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_focus_cycles() {
        let mut focus = Focus::Genres;
        for _ in 0..4 {
            focus = focus.next();
        }
        assert_eq!(focus, Focus::Genres);
        assert_eq!(Focus::Genres.prev(), Focus::Chart);
        assert_eq!(Focus::Grid.prev().next(), Focus::Grid);
    }

    #[test]
    fn test_load_options_cli_overrides_config() {
        let mut config = AppConfig::default();
        config.data.delimiter = Some(b';');
        config.data.has_header = Some(true);

        let args = Args::parse_from(["genre-trends"]);
        let options = load_options(&args, &config);
        assert_eq!(options.delimiter, Some(b';'));
        assert!(options.has_header);

        let args = Args::parse_from(["genre-trends", "--delimiter", "9", "--no-header"]);
        let options = load_options(&args, &config);
        assert_eq!(options.delimiter, Some(b'\t'));
        assert!(!options.has_header);
    }

    #[test]
    fn test_snapshot_flag_overrides_config() {
        let config = AppConfig::default();
        assert_eq!(
            reload_policy(&Args::parse_from(["genre-trends"]), &config),
            ReloadPolicy::EveryRun
        );
        assert_eq!(
            reload_policy(&Args::parse_from(["genre-trends", "--snapshot"]), &config),
            ReloadPolicy::Snapshot
        );
    }

    #[test]
    fn test_error_modal_show_hide() {
        let mut modal = ErrorModal::new();
        modal.show("boom".to_string());
        assert!(modal.active);
        modal.hide();
        assert!(!modal.active);
        assert!(modal.message.is_empty());
    }

    #[test]
    fn test_centered_rect_inside() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(area, 60, 40);
        assert!(popup.x >= 20 && popup.right() <= 80);
        assert!(popup.y >= 15 && popup.bottom() <= 35);
    }
}
