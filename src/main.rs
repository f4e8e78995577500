mod app;
mod browse;
mod cli;
mod config;
mod dispatch;
mod exec;
mod input;
mod k8s;
mod model;
mod overlay;
mod panel;
mod refresh;
mod resolver;
mod ui;

use anyhow::{Context, Result};
use app::{App, AppCommand};
use clap::Parser;
use cli::CliArgs;
use config::{DashboardConfig, LoadedConfig};
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use dispatch::{TOAST_DURATION, UiEvent, spawn_diagnostic, spawn_toast_timer};
use futures::StreamExt;
use k8s::KubeGateway;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use refresh::{RefreshHandle, spawn_refresh_ticker, spawn_refresh_worker};
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

struct Workers {
    gateway: Arc<KubeGateway>,
    refresh: RefreshHandle,
    scope_tx: watch::Sender<model::NamespaceScope>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let LoadedConfig { source, config } = config::load()?;
    init_tracing(&config)?;
    match &source {
        Some(path) => info!("loaded config from {}", path.display()),
        None => debug!("no config file found, using defaults"),
    }

    let gateway = Arc::new(KubeGateway::new(&config).await?);
    let scope = args.namespace_scope();
    let mut app = App::new(scope.clone());

    let (ui_tx, ui_rx) = mpsc::unbounded_channel();
    let (scope_tx, scope_rx) = watch::channel(scope);
    let (refresh, worker) = spawn_refresh_worker(gateway.clone(), scope_rx, ui_tx.clone());
    let ticker = spawn_refresh_ticker(refresh.clone(), config.refresh_interval());
    let workers = Workers {
        gateway,
        refresh,
        scope_tx,
        ui_tx,
    };

    let result = run(&mut app, &workers, ui_rx).await;
    ticker.abort();
    worker.abort();
    result
}

fn init_tracing(config: &DashboardConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .compact();

    // The terminal belongs to the dashboard, so logs go to a file or nowhere.
    let _ = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(io::sink).try_init(),
    };

    Ok(())
}

async fn run(
    app: &mut App,
    workers: &Workers,
    ui_rx: mpsc::UnboundedReceiver<UiEvent>,
) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, workers, ui_rx).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    app: &mut App,
    workers: &Workers,
    mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
) -> Result<()> {
    let mut reader = EventStream::new();

    loop {
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.mode(), key) {
                            debug!("action={action:?}");
                            let command = app.apply_action(action);
                            execute_app_command(workers, command);
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => warn!("terminal event error: {error}"),
                    None => {
                        warn!("terminal event stream closed");
                        break;
                    }
                }
            }
            Some(event) = ui_rx.recv() => handle_ui_event(app, event),
        }
    }

    Ok(())
}

fn handle_ui_event(app: &mut App, event: UiEvent) {
    match event {
        UiEvent::RefreshReady { snapshot, ack } => {
            app.commit_refresh(snapshot);
            let _ = ack.send(());
        }
        UiEvent::OverlayBody { overlay_id, body } => {
            if !app.apply_overlay_body(overlay_id, body) {
                debug!("overlay {overlay_id} closed before its body arrived");
            }
        }
        UiEvent::ToastExpired(toast_id) => app.dismiss_toast(toast_id),
    }
}

fn execute_app_command(workers: &Workers, command: AppCommand) {
    match command {
        AppCommand::None => {}
        AppCommand::Refresh => workers.refresh.request(),
        AppCommand::SwitchNamespace { scope, toast_id } => {
            info!("switching namespace to {scope}");
            workers.scope_tx.send_replace(scope);
            workers.refresh.request();
            spawn_toast_timer(toast_id, TOAST_DURATION, workers.ui_tx.clone());
        }
        AppCommand::FetchDiagnostic {
            overlay_id,
            request,
        } => {
            spawn_diagnostic(
                workers.gateway.clone(),
                overlay_id,
                request,
                workers.ui_tx.clone(),
            );
        }
    }
}
