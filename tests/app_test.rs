mod common;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use genre_trends::{
    App, AppConfig, AppEvent, Dataset, Focus, LoadOptions, PipelineContext, ReloadPolicy, Theme,
    YearRange,
};
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::path::PathBuf;
use tempfile::TempDir;

fn setup(policy: ReloadPolicy) -> (TempDir, PathBuf, App) {
    let dir = TempDir::new().unwrap();
    let path = common::write_csv(&dir, "music_genres_summary.csv", &common::sample_csv());
    let options = LoadOptions::default();
    let dataset = Dataset::load(&path, &options).unwrap();
    let pipeline = PipelineContext::new(&path, options, policy).with_snapshot(dataset);
    let app = App::new_with_config(Theme::default(), AppConfig::default(), pipeline).unwrap();
    (dir, path, app)
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

/// Feed a key and drain follow-up events the way the main loop does.
/// Returns the last event `App::event` produced that the loop would act on itself.
fn press(app: &mut App, code: KeyCode) -> Option<AppEvent> {
    let mut next = app.event(&AppEvent::Key(key(code)));
    while let Some(event) = next {
        if matches!(event, AppEvent::Exit | AppEvent::Crash(_)) {
            return Some(event);
        }
        next = app.event(&event);
    }
    None
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        press(app, KeyCode::Char(c));
    }
}

fn focus_grid(app: &mut App) {
    press(app, KeyCode::Tab);
    press(app, KeyCode::Tab);
    assert_eq!(app.focus(), Focus::Grid);
}

#[test]
fn test_initial_view_uses_default_selection() {
    let (_dir, _path, app) = setup(ReloadPolicy::EveryRun);
    let selection = app.selection();
    assert_eq!(selection.year_range, YearRange::new(2000, 2020));
    let genres: Vec<&str> = selection.genres.iter().map(|g| g.as_str()).collect();
    assert_eq!(genres, vec!["Classical", "Hip-Hop", "Jazz", "Pop", "Rock"]);

    let table = app.grid().table();
    assert_eq!(table.num_rows(), 21);
    assert_eq!(table.num_columns(), 5);
    assert_eq!(app.long_table().len(), 105);
    assert_eq!(app.chart_data().series.len(), 5);
    assert_eq!(app.chart_data().categories.first().map(|s| s.as_str()), Some("2000"));
}

#[test]
fn test_toggle_genre_recomputes() {
    let (_dir, _path, mut app) = setup(ReloadPolicy::EveryRun);
    assert_eq!(app.panel().current_genre(), Some("Pop"));
    press(&mut app, KeyCode::Char(' '));

    assert!(!app.selection().contains_genre("Pop"));
    assert_eq!(app.grid().table().num_columns(), 4);
    assert!(app.grid().table().genre_index("Pop").is_none());
    assert_eq!(app.long_table().len(), 84);
}

#[test]
fn test_year_handle_moves_through_data_years() {
    let (_dir, _path, mut app) = setup(ReloadPolicy::Snapshot);
    press(&mut app, KeyCode::Tab);
    assert_eq!(app.focus(), Focus::Years);

    press(&mut app, KeyCode::Right);
    assert_eq!(app.selection().year_range, YearRange::new(2001, 2020));
    assert_eq!(app.grid().table().num_rows(), 20);

    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Left);
    assert_eq!(app.selection().year_range, YearRange::new(2001, 2019));
    assert_eq!(app.grid().table().rows[0].year, "2019");
}

#[test]
fn test_edit_cell_updates_long_table_and_chart() {
    let (_dir, _path, mut app) = setup(ReloadPolicy::EveryRun);
    focus_grid(&mut app);
    for _ in 0..4 {
        press(&mut app, KeyCode::Right);
    }
    assert_eq!(app.grid().cursor(), (0, 4));

    press(&mut app, KeyCode::Enter);
    assert!(app.grid().is_editing());
    for _ in 0..8 {
        press(&mut app, KeyCode::Backspace);
    }
    type_text(&mut app, "99");
    press(&mut app, KeyCode::Enter);

    assert!(!app.grid().is_editing());
    assert!(app.grid().is_edited());
    assert_eq!(app.grid().table().get("2020", "Pop"), Some(99.0));
    assert!(app
        .long_table()
        .rows
        .iter()
        .any(|r| r.year == "2020" && r.genre == "Pop" && r.popularity == 99.0));

    let pop = app
        .chart_data()
        .series
        .iter()
        .find(|s| s.genre == "Pop")
        .unwrap();
    assert_eq!(pop.points.last(), Some(&(20.0, 99.0)));
}

#[test]
fn test_selection_change_discards_edits() {
    let (_dir, _path, mut app) = setup(ReloadPolicy::EveryRun);
    focus_grid(&mut app);
    press(&mut app, KeyCode::Char('d'));
    assert!(app.grid().is_edited());
    assert_eq!(app.grid().table().num_rows(), 20);

    press(&mut app, KeyCode::BackTab);
    press(&mut app, KeyCode::BackTab);
    assert_eq!(app.focus(), Focus::Genres);
    press(&mut app, KeyCode::Char(' '));
    press(&mut app, KeyCode::Char(' '));

    assert!(!app.grid().is_edited());
    assert_eq!(app.grid().table().num_rows(), 21);
}

#[test]
fn test_non_numeric_edit_is_rejected() {
    let (_dir, _path, mut app) = setup(ReloadPolicy::EveryRun);
    focus_grid(&mut app);
    press(&mut app, KeyCode::Right);
    let before = app.grid().table().clone();

    press(&mut app, KeyCode::Enter);
    type_text(&mut app, "abc");
    press(&mut app, KeyCode::Enter);
    assert!(app.grid().is_editing());
    assert!(app.grid().error().is_some());

    press(&mut app, KeyCode::Esc);
    assert!(!app.grid().is_editing());
    assert_eq!(app.grid().table(), &before);
}

#[test]
fn test_add_row_with_typed_year() {
    let (_dir, _path, mut app) = setup(ReloadPolicy::EveryRun);
    focus_grid(&mut app);
    press(&mut app, KeyCode::Char('a'));
    type_text(&mut app, "2030");
    press(&mut app, KeyCode::Enter);

    let table = app.grid().table();
    assert_eq!(table.num_rows(), 22);
    assert_eq!(table.get("2030", "Jazz"), Some(0.0));
    assert_eq!(app.long_table().len(), 110);
    assert_eq!(
        app.chart_data().categories.last().map(|s| s.as_str()),
        Some("2030")
    );
}

#[test]
fn test_quit_keys() {
    let (_dir, _path, mut app) = setup(ReloadPolicy::EveryRun);
    assert_eq!(press(&mut app, KeyCode::Char('q')), Some(AppEvent::Exit));
    let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    assert_eq!(app.event(&AppEvent::Key(ctrl_c)), Some(AppEvent::Exit));
}

#[test]
fn test_reload_failure_keeps_previous_view() {
    let (_dir, path, mut app) = setup(ReloadPolicy::EveryRun);
    let before = app.grid().table().clone();
    std::fs::remove_file(&path).unwrap();

    press(&mut app, KeyCode::Char(' '));
    let message = app.error_message().unwrap();
    assert!(message.contains("not found"), "got: {}", message);
    assert_eq!(app.grid().table(), &before);

    // Keys are swallowed until the modal is dismissed
    assert_eq!(press(&mut app, KeyCode::Char('q')), None);
    press(&mut app, KeyCode::Esc);
    assert!(app.error_message().is_none());
}

#[test]
fn test_export_rejects_unknown_extension() {
    let (dir, _path, mut app) = setup(ReloadPolicy::EveryRun);
    let target = dir.path().join("chart.gif");
    app.event(&AppEvent::ExportChart(target.clone()));
    assert!(app.error_message().unwrap().contains(".png or .svg"));
    assert!(!target.exists());
}

#[test]
fn test_export_prompt_opens_and_cancels() {
    let (_dir, _path, mut app) = setup(ReloadPolicy::EveryRun);
    press(&mut app, KeyCode::Char('e'));
    let value = app.export_prompt().unwrap().value().to_string();
    assert!(value.ends_with(".png"), "got: {}", value);

    // Typing goes to the prompt, not to the panes
    assert_eq!(press(&mut app, KeyCode::Char('q')), None);
    press(&mut app, KeyCode::Esc);
    assert!(app.export_prompt().is_none());
}

#[test]
fn test_about_and_legend_toggles() {
    let (_dir, _path, mut app) = setup(ReloadPolicy::EveryRun);
    press(&mut app, KeyCode::Char('?'));
    assert!(app.is_about_visible());
    press(&mut app, KeyCode::Esc);
    assert!(!app.is_about_visible());

    press(&mut app, KeyCode::BackTab);
    assert_eq!(app.focus(), Focus::Chart);
    assert!(app.show_legend());
    press(&mut app, KeyCode::Char('l'));
    assert!(!app.show_legend());
}

#[test]
fn test_render_whole_screen() {
    let (_dir, _path, mut app) = setup(ReloadPolicy::EveryRun);
    let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
    terminal
        .draw(|frame| frame.render_widget(&mut app, frame.area()))
        .unwrap();

    let buffer = terminal.backend().buffer();
    let text: String = (0..buffer.area.height)
        .map(|y| {
            (0..buffer.area.width)
                .map(|x| buffer[(x, y)].symbol().to_string())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n");
    assert!(text.contains("genre-trends"), "{}", text);
    assert!(text.contains("[x] Pop"), "{}", text);
    assert!(text.contains("[ ] Metal"), "{}", text);
    assert!(text.contains("Classical"), "{}", text);
    assert!(text.contains("Popularity by year"), "{}", text);
}
