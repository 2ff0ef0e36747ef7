mod action;
mod app;
mod config;
mod controller;
mod debounce;
mod error;
mod event;
mod favorites;
mod fetcher;
mod filter;
mod trigger;
mod tui;
mod types;
mod ui;

use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::{App, AppOptions};
use crate::config::Config;
use crate::event::Event;
use crate::favorites::{FavoritesStore, FileStore, KeyValueStore, MemoryStore};
use crate::fetcher::CatalogClient;
use crate::filter::{FilterState, CATEGORY_KEY};
use crate::tui::EventHandler;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Catalog base URL (overrides the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Path to a config file instead of ~/.config/shelf/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial filters as a URL query, e.g. "cats=3&sort=cashback&search=shoes"
    #[arg(long, default_value = "")]
    query: String,

    /// Start scoped to this category id
    #[arg(long)]
    category: Option<String>,

    /// Write logs here instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_file = match &cli.log_file {
        Some(path) => Some(std::fs::File::create(path)?),
        None => None,
    };
    let file_layer = log_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });
    let stderr_layer = cli
        .log_file
        .is_none()
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(file_layer)
        .with(stderr_layer)
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    if let Some(base_url) = &cli.base_url {
        config.catalog.base_url = base_url.clone();
    }

    let mut initial_filter = FilterState::from_query(&cli.query);
    if let Some(category) = &cli.category {
        initial_filter.set(CATEGORY_KEY, category);
    }

    let backend: Box<dyn KeyValueStore> = match FileStore::default_location() {
        Some(store) => Box::new(store),
        None => {
            tracing::warn!("no data directory; favorites will not be saved");
            Box::new(MemoryStore::new())
        }
    };
    let favorites = FavoritesStore::load(backend, config.favorites.key.clone());

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let options = AppOptions {
        initial_filter,
        page_size: config.catalog.page_size,
        search_delay: config.ui.search_debounce(),
        prefetch_distance: config.ui.prefetch_distance,
    };
    let catalog = CatalogClient::new(config.catalog);

    // Run the application
    let result = run(catalog, favorites, options).await;

    // Restore terminal
    tui::restore()?;

    result
}

async fn run(
    catalog: CatalogClient,
    favorites: FavoritesStore,
    options: AppOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize terminal
    let mut terminal = tui::init()?;

    // Create action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    // Create app state
    let mut app = App::new(catalog, favorites, options, action_tx.clone());
    action_tx.send(Action::Load)?;

    // Create event handler
    let tick_rate = Duration::from_millis(250);
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(tick_rate, render_rate);

    // Main loop
    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        let size = terminal.size()?;
                        app.on_frame(ui::list_rows(size.height));
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
