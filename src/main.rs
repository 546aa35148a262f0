// Binary includes library modules - some public API items are only for library consumers
#![allow(unused)]

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod data;
mod error;
mod events;
mod session;
mod sink;
mod source;
mod ui;

use app::App;
use config::Settings;
use data::duration::parse_duration;
use session::Session;
use sink::WatchSink;
use source::Fetcher;

const DEFAULT_LOG_FILTER: &str = "pulseboard=info";

/// How long the UI waits for a key before redrawing.
const TICK: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "pulseboard")]
#[command(about = "Live telemetry dashboard for the terminal")]
struct Args {
    /// Backend base URL (http:// or https://)
    #[arg(short, long)]
    server: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Channel to plot; repeat for several (default: Genetic, Biochemical, Physical)
    #[arg(long = "channel", value_name = "NAME")]
    channels: Vec<String>,

    /// Samples kept per channel
    #[arg(short, long)]
    window: Option<usize>,

    /// Alerts kept in the feed
    #[arg(short, long)]
    alerts: Option<usize>,

    /// Delay before reconnecting the push channel (e.g., "3s", "500ms")
    #[arg(long)]
    retry_delay: Option<String>,

    /// Interval between metrics pulls (e.g., "2s")
    #[arg(long)]
    poll_interval: Option<String>,

    /// Write logs to this file (the dashboard owns the terminal)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Fetch the aggregate metrics once, print them as JSON and exit
    #[arg(long)]
    once: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.log_file.as_deref(), args.once)?;

    let settings = build_settings(&args)?;

    if args.once {
        return fetch_once(&settings);
    }

    run_dashboard(settings)
}

fn init_logging(log_file: Option<&Path>, once: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    match log_file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            subscriber.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        // Nothing else is on the terminal in one-shot mode
        None if once => subscriber.with_writer(io::stderr).init(),
        None => subscriber.with_writer(io::sink).init(),
    }
    Ok(())
}

/// Config file and environment first, then command-line overrides.
fn build_settings(args: &Args) -> Result<Settings> {
    let mut settings = Settings::load(args.config.as_deref())?;

    if let Some(ref server) = args.server {
        settings.server = server.clone();
    }
    if !args.channels.is_empty() {
        settings.channels = args.channels.clone();
    }
    if let Some(window) = args.window {
        settings.window_capacity = window;
    }
    if let Some(alerts) = args.alerts {
        settings.alert_capacity = alerts;
    }
    if let Some(ref delay) = args.retry_delay {
        settings.retry_delay = parse_duration(delay).context("Invalid --retry-delay")?;
    }
    if let Some(ref interval) = args.poll_interval {
        settings.poll_interval = parse_duration(interval).context("Invalid --poll-interval")?;
    }

    settings.validate()?;
    Ok(settings)
}

/// Pull the metrics endpoint once and print the snapshot as JSON.
fn fetch_once(settings: &Settings) -> Result<()> {
    let endpoints = settings.endpoints()?;
    let fetcher = source::HttpFetcher::builder(endpoints.metrics)
        .timeout(settings.request_timeout)
        .build()?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let snapshot = rt.block_on(fetcher.fetch())?;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Start the client core and run the TUI until the user quits.
fn run_dashboard(settings: Settings) -> Result<()> {
    let retry_delay = settings.retry_delay;
    let session = Session::new(settings)?;
    let endpoint = session.endpoints().push.to_string();

    let (sink, mut feed) = WatchSink::create();
    let handle = session.spawn(Arc::new(sink)).context("Failed to start client core")?;
    feed.attach_connection(handle.connection());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let mut app = App::new(feed, endpoint, retry_delay);
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Closes the push connection and stops the poller
    handle.shutdown();
    info!("dashboard closed");

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        app.refresh();
        terminal.draw(|frame| ui::render(frame, app))?;

        if let Some(Event::Key(key)) = events::poll_event(TICK)? {
            events::handle_key_event(app, key);
        }
    }

    Ok(())
}
