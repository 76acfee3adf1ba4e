//! ledstrip-panel - LED strip controller panel
//!
//! Mirrors the configuration of an addressable-LED strip controller over its
//! HTTP API, keeps it fresh by polling, and mediates every write.

mod cli;
mod client;
mod config;
mod emulator;
mod error;
mod models;
mod notify;
mod sync;
mod view;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Args, CliCommand, PanelCommand, PANEL_HELP};
use crate::client::{DeviceApi, HttpDeviceClient};
use crate::config::Settings;
use crate::emulator::EmulatorState;
use crate::sync::{DeviceSynchronizer, SyncHandle};
use crate::view::{PanelView, StripDrafts};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledstrip_panel=info,tower_http=debug".into()),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(device) = args.device {
        settings.device.base_url = device;
    }
    tracing::info!("Configuration loaded");

    match args.command.unwrap_or(CliCommand::Panel) {
        CliCommand::Panel => run_panel(settings).await,
        CliCommand::Status => print_status(settings).await,
        CliCommand::Emulate { port } => {
            if let Some(port) = port {
                settings.emulator.port = port;
            }
            run_emulator(settings).await
        }
    }
}

/// Interactive panel: synchronizer + renderer + stdin commands
async fn run_panel(settings: Settings) -> anyhow::Result<()> {
    let client = HttpDeviceClient::new(&settings.device)?;
    tracing::info!("Connecting to {}", client.base_url());

    let api: Arc<dyn DeviceApi> = Arc::new(client);
    let (handle, mut notifications, sync_task) = DeviceSynchronizer::spawn(api, settings.sync);

    // Toasts
    tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            println!("{}", view::render_notification(&notification));
        }
    });

    // Re-render on every state change
    let drafts = Arc::new(tokio::sync::Mutex::new(StripDrafts::default()));
    let mut state_rx = handle.subscribe();
    let render_drafts = drafts.clone();
    let modes = settings.panel.modes.clone();
    tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let state = state_rx.borrow_and_update().clone();
            let mut drafts = render_drafts.lock().await;
            drafts.sync(&state);
            println!("{}", PanelView::build(&state, &drafts, &modes).render());
        }
    });

    println!("{}", PANEL_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match PanelCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{} (type 'help')", e);
                continue;
            }
        };

        if command == PanelCommand::Quit {
            break;
        }
        if command == PanelCommand::Help {
            println!("{}", PANEL_HELP);
            continue;
        }

        let mut guard = drafts.lock().await;
        if command == PanelCommand::Show {
            guard.sync(&handle.state());
            println!(
                "{}",
                PanelView::build(&handle.state(), &guard, &settings.panel.modes).render()
            );
            continue;
        }
        execute(&handle, &mut guard, command).await?;
    }

    drop(handle);
    sync_task.await?;
    Ok(())
}

async fn execute(
    handle: &SyncHandle,
    drafts: &mut StripDrafts,
    command: PanelCommand,
) -> anyhow::Result<()> {
    match command {
        PanelCommand::Mode(mode) => handle.set_mode(mode).await?,
        PanelCommand::Brightness(value) => handle.set_brightness(value).await?,
        PanelCommand::Color(color) => handle.set_color(color).await?,
        PanelCommand::Led { strip, led, color } => {
            handle.set_single_led(strip, led, color).await?
        }
        PanelCommand::Enable { index, enabled } => {
            if !drafts.toggle(index, enabled) {
                println!("no strip {}", index);
            }
        }
        PanelCommand::Count { index, count } => {
            if drafts.set_count(index, count) {
                handle.update_strip_count(index, count).await?;
            } else {
                println!("no strip {}", index);
            }
        }
        PanelCommand::Save => handle.save_config(drafts.edits()).await?,
        PanelCommand::Reload => handle.reload().await?,
        PanelCommand::Show | PanelCommand::Help | PanelCommand::Quit => {}
    }
    Ok(())
}

/// One-shot read of config and status
async fn print_status(settings: Settings) -> anyhow::Result<()> {
    let client = HttpDeviceClient::new(&settings.device)?;

    let config = client.fetch_config().await?;
    let status = client.fetch_status().await?;

    let state = sync::PanelState {
        brightness_preview: config.brightness,
        config,
        connection: sync::Connection::Connected,
        free_heap: Some(status.free_heap),
        config_revision: 1,
    };
    let mut drafts = StripDrafts::default();
    drafts.sync(&state);

    println!("{}", PanelView::build(&state, &drafts, &settings.panel.modes).render());
    Ok(())
}

/// Serve an emulated device
async fn run_emulator(settings: Settings) -> anyhow::Result<()> {
    let state = EmulatorState::new(&settings.emulator);

    let app = emulator::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("{}:{}", settings.emulator.host, settings.emulator.port).parse()?;
    tracing::info!(
        "Emulating {} strips on {}",
        settings.emulator.pins.len(),
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
