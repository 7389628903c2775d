use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Terminal,
};
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ecowatch::app::{App, DashboardState};
use ecowatch::data::{default_charts, trailing_window, ChartId};
use ecowatch::events;
use ecowatch::export::Snapshot;
use ecowatch::refresh::{ChartSeries, RefreshOrchestrator, RenderTarget, ValueTarget};
use ecowatch::settings::DashboardSettings;
use ecowatch::source::{HistoryFetcher, ProxyClient, TelemetryClient};
use ecowatch::ui;

#[derive(Parser, Debug)]
#[command(name = "ecowatch")]
#[command(about = "Terminal dashboard for energy and CO2 telemetry")]
struct Args {
    /// Optional TOML settings file (ECOWATCH_* env vars override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the ecowatch proxy
    #[arg(short, long, env = "ECOWATCH_PROXY_URL")]
    proxy_url: Option<String>,

    /// Refresh interval in seconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Log refreshes instead of drawing the dashboard
    #[arg(long, conflicts_with = "export")]
    headless: bool,

    /// Refresh once, export the dashboard to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Log file used while the dashboard is drawn
    #[arg(long, default_value = "ecowatch.log")]
    log_file: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = DashboardSettings::load(args.config.as_deref())?;
    if let Some(url) = args.proxy_url {
        settings.proxy_url = url;
    }
    if let Some(secs) = args.interval {
        settings.poll_interval_secs = secs;
    }

    let interactive = !args.headless && args.export.is_none();
    init_tracing(interactive.then_some(args.log_file.as_path()))?;

    // One worker: the terminal loop owns the main thread.
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;

    let client = Arc::new(ProxyClient::with_timeout(&settings.proxy_url, settings.timeout())?);
    info!("Reading from {}", client.description());

    if let Some(export_path) = args.export {
        return export_to_file(&rt, client, &settings, &export_path);
    }

    if args.headless {
        return run_headless(&rt, client, &settings);
    }

    run_with_tui(&rt, client, &settings)
}

/// Log to stderr, or to `log_file` while the terminal is in use.
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

fn orchestrator(
    client: Arc<ProxyClient>,
    settings: &DashboardSettings,
    charts: Arc<dyn RenderTarget>,
    values: Arc<dyn ValueTarget>,
) -> RefreshOrchestrator {
    let mut builder = RefreshOrchestrator::builder(HistoryFetcher::new(client))
        .locale(settings.locale)
        .values(settings.display_rules(), values);
    for spec in default_charts() {
        builder = builder.chart(spec, charts.clone());
    }
    builder.build()
}

/// Refresh once and write the result as JSON.
fn export_to_file(
    rt: &Runtime,
    client: Arc<ProxyClient>,
    settings: &DashboardSettings,
    export_path: &Path,
) -> Result<()> {
    let state = Arc::new(DashboardState::new());
    let orchestrator = orchestrator(client, settings, state.clone(), state.clone());

    rt.block_on(async {
        let (charts, values) =
            tokio::join!(orchestrator.refresh_charts(), orchestrator.refresh_values());
        if let Err(e) = charts {
            warn!("Exporting without charts: {}", e);
        }
        if let Err(e) = values {
            warn!("Exporting without current values: {}", e);
        }
    });

    let window = trailing_window(&Local::now(), 12);
    Snapshot::capture(&state, window).write(export_path)?;

    println!("Exported dashboard to: {}", export_path.display());
    Ok(())
}

/// Writes every refresh to the log.
struct LogTarget;

impl RenderTarget for LogTarget {
    fn replace_series(&self, chart: ChartId, series: ChartSeries) {
        for (dataset, months) in series {
            let cells: Vec<String> = months.iter().map(|(m, v)| format!("{m}={v:.2}")).collect();
            info!(
                "{:?} {} ({}): {}",
                chart,
                dataset.label,
                dataset.unit,
                cells.join(" ")
            );
        }
    }
}

impl ValueTarget for LogTarget {
    fn replace_values(&self, values: BTreeMap<String, String>) {
        for (key, value) in values {
            info!("{} = {}", key, value);
        }
    }
}

/// Run refresh cycles without a terminal until Ctrl-C.
fn run_headless(rt: &Runtime, client: Arc<ProxyClient>, settings: &DashboardSettings) -> Result<()> {
    let target = Arc::new(LogTarget);
    let orchestrator = Arc::new(orchestrator(client, settings, target.clone(), target));

    rt.block_on(async {
        let handle = orchestrator.start(settings.poll_interval());
        tokio::signal::ctrl_c().await?;
        info!("Shutting down");
        handle.stop();
        Ok(())
    })
}

/// Run the dashboard on the main thread while refreshes run on the runtime.
fn run_with_tui(rt: &Runtime, client: Arc<ProxyClient>, settings: &DashboardSettings) -> Result<()> {
    let source = client.description().to_string();
    let state = Arc::new(DashboardState::new());
    let orchestrator = Arc::new(orchestrator(client, settings, state.clone(), state.clone()));

    let handle = {
        let _guard = rt.enter();
        orchestrator.start(settings.poll_interval())
    };

    let app = App::new(state, settings.display_rules(), &source).with_refresh_handle(handle);
    run_tui(app)
}

fn run_tui(mut app: App) -> Result<()> {
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

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    app.quit();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 16;

    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = Paragraph::new(msg)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::Yellow));
                let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5)
                    .intersection(area);
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Min(12),   // Dashboard
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::dashboard::render(frame, app, chunks[1]);
            ui::common::render_status_bar(frame, app, chunks[2]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Refreshes land in shared state; redraw picks them up.
        if let Some(Event::Key(key)) = events::poll_event(Duration::from_millis(250))? {
            events::handle_key_event(app, key);
        }
    }

    Ok(())
}
