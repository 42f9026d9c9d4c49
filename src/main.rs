use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use genre_trends::chart_data::prepare_chart_data;
use genre_trends::chart_export::{resolve_export_target, write_chart};
use genre_trends::error_display::{user_message_from_load, user_message_from_pipeline};
use genre_trends::{
    filter_pivot, load_options, logging, melt, reload_policy, App, AppConfig, AppEvent, Args,
    CacheManager, ConfigManager, Dataset, PipelineContext, Selection, SelectionOptions, Theme,
    APP_NAME,
};
use ratatui::DefaultTerminal;
use std::path::Path;
use std::sync::mpsc::channel;
use std::time::Duration;

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, mut app: App, poll_interval: Duration) -> Result<()> {
    let (tx, rx) = channel::<AppEvent>();
    render(&mut terminal, &mut app)?;

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let manager = ConfigManager::new(APP_NAME)?;
        match manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Configuration written to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    if args.clear_cache {
        match CacheManager::new(APP_NAME) {
            Ok(cache) => {
                match cache.clear_all() {
                    Ok(0) => println!("No cache to clear"),
                    Ok(_) => println!("Cache cleared successfully"),
                    Err(e) => {
                        eprintln!("Error clearing cache: {}", e);
                        std::process::exit(1);
                    }
                }
                return Ok(Some(()));
            }
            Err(_e) => {
                println!("No cache to clear");
                return Ok(Some(()));
            }
        }
    }

    Ok(None)
}

/// Chart the default selection to `path` without starting the terminal UI
fn export_headless(dataset: &Dataset, config: &AppConfig, path: &Path) -> Result<()> {
    let (path, format) = resolve_export_target(path, config.chart.export_format()?)?;
    let options = SelectionOptions::from_dataset(dataset);
    let selection = Selection::default_for(&options, &config.selection_defaults());
    let table = filter_pivot(dataset, &selection)?;
    let chart = prepare_chart_data(&melt(&table));
    write_chart(&path, format, &chart, config.chart.export_size())?;
    println!("Chart written to {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    let config = AppConfig::load(APP_NAME)?;

    // Keep the guard alive until exit so buffered log lines are flushed
    let _log_guard = CacheManager::new(APP_NAME)
        .ok()
        .and_then(|cache| logging::init(&cache, &config.logging.level, args.debug));

    let theme = Theme::from_config(&config.theme)?;
    let path = args.resolve_path(config.data.path.as_ref());
    let options = load_options(&args, &config);
    let policy = reload_policy(&args, &config);

    // Fail before the terminal is taken over
    let dataset = match Dataset::load(&path, &options) {
        Ok(dataset) => dataset,
        Err(e) => {
            tracing::error!(error = %e, "failed to load dataset");
            eprintln!("Error: {}", user_message_from_load(&e));
            std::process::exit(1);
        }
    };

    if let Some(export_path) = &args.export {
        if let Err(e) = export_headless(&dataset, &config, export_path) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    let poll_interval = Duration::from_millis(config.performance.event_poll_interval_ms);
    let pipeline = PipelineContext::new(&path, options, policy).with_snapshot(dataset);
    let app = match App::new_with_config(theme, config, pipeline) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {}", user_message_from_pipeline(&e));
            std::process::exit(1);
        }
    };

    let terminal = ratatui::init();
    let result = run(terminal, app, poll_interval);
    ratatui::restore();
    if let Err(e) = result {
        tracing::error!(error = %e, "application error");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
