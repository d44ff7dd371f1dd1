mod api;
mod models;
mod typechart;
mod ui;
mod utils;

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::event::{self, Event as CEvent, KeyCode};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};

use crate::api::Client;
use crate::ui::{draw_ui, App, EventQueue, FetchEvent, SpriteThumb};

#[derive(Debug, Parser)]
#[command(name = "pokedex-tui", about = "Browse the Pokédex from your terminal")]
struct Cli {
    /// Number of Pokémon to request from the listing endpoint.
    #[arg(long, env = "POKEDEX_LIMIT", default_value_t = 151)]
    limit: u32,

    /// Offset into the listing (skip the first N entries).
    #[arg(long, default_value_t = 0)]
    offset: u32,

    /// Base URL of a PokéAPI-compatible server.
    #[arg(long, default_value = api::DEFAULT_API_BASE)]
    api_base: String,

    /// Write logs to this file (honors RUST_LOG). Without it logging is off,
    /// since log lines would corrupt the alternate screen.
    #[arg(long)]
    log_file: Option<std::path::PathBuf>,
}

fn init_tracing(path: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn push_event(queue: &EventQueue, event: FetchEvent) {
    if let Ok(mut q) = queue.lock() {
        q.push(event);
    }
}

fn spawn_list_fetch(client: Arc<Client>, queue: EventQueue, limit: u32, offset: u32) {
    tokio::spawn(async move {
        match client.fetch_page(limit, offset).await {
            Ok(list) => {
                info!(count = list.len(), "listing loaded");
                push_event(&queue, FetchEvent::ListLoaded(list));
            }
            Err(err) => {
                warn!(%err, "listing fetch failed");
                push_event(&queue, FetchEvent::ListFailed);
            }
        }
    });
}

fn spawn_detail_fetch(client: Arc<Client>, queue: EventQueue, index: usize, url: String) {
    tokio::spawn(async move {
        match client.fetch_basic_info(&url).await {
            Ok(info) => push_event(&queue, FetchEvent::DetailLoaded { index, info }),
            Err(err) => {
                warn!(%err, %url, "detail fetch failed");
                push_event(&queue, FetchEvent::DetailFailed { index });
            }
        }
    });
}

fn spawn_flavor_fetch(client: Arc<Client>, queue: EventQueue, index: usize, url: String) {
    tokio::spawn(async move {
        match client.fetch_flavor_text(&url).await {
            Ok(text) => push_event(&queue, FetchEvent::FlavorLoaded { index, text }),
            Err(err) => {
                warn!(%err, %url, "species fetch failed");
                push_event(&queue, FetchEvent::FlavorFailed { index });
            }
        }
    });
}

fn spawn_sprite_fetch(client: Arc<Client>, queue: EventQueue, index: usize, url: String) {
    tokio::spawn(async move {
        let decoded = match client.fetch_bytes(&url).await {
            Ok(bytes) => SpriteThumb::from_image_bytes(&bytes).map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };
        match decoded {
            Ok(thumb) => push_event(&queue, FetchEvent::SpriteLoaded { index, thumb }),
            Err(err) => {
                warn!(%err, %url, "sprite fetch failed");
                push_event(&queue, FetchEvent::SpriteFailed { index });
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    let client = Arc::new(Client::new(cli.api_base.clone()));
    let queue: EventQueue = Arc::new(Mutex::new(Vec::new()));

    let mut app = App::new();
    app.list_loading = true;
    spawn_list_fetch(client.clone(), queue.clone(), cli.limit, cli.offset);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        draw_ui(&mut terminal, &mut app)?;

        // Apply whatever the background fetches finished since last tick.
        let finished: Vec<FetchEvent> = match queue.lock() {
            Ok(mut q) => q.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for event in finished {
            app.apply_fetch_event(event);
        }

        // Issue the fetches the current viewport and overlay state call for.
        for (index, url) in app.begin_detail_fetches() {
            spawn_detail_fetch(client.clone(), queue.clone(), index, url);
        }
        if let Some((index, url)) = app.begin_flavor_fetch() {
            spawn_flavor_fetch(client.clone(), queue.clone(), index, url);
        }
        for (index, url) in app.begin_sprite_fetches() {
            spawn_sprite_fetch(client.clone(), queue.clone(), index, url);
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            if let CEvent::Key(key) = event::read()? {
                if app.search_mode {
                    match key.code {
                        KeyCode::Enter | KeyCode::Esc => {
                            app.search_mode = false;
                        }
                        KeyCode::Backspace => {
                            app.search_query.pop();
                            app.apply_filter();
                        }
                        KeyCode::Char(c) => {
                            app.search_query.push(c);
                            app.apply_filter();
                        }
                        _ => {}
                    }
                } else if app.modal.is_some() || app.pending_modal.is_some() {
                    match key.code {
                        KeyCode::Esc | KeyCode::Char('q') => app.close_detail(),
                        _ => {}
                    }
                } else {
                    match key.code {
                        KeyCode::Char('q') => break,
                        KeyCode::F(1) | KeyCode::Char('h') => {
                            app.show_help = !app.show_help;
                        }
                        KeyCode::Char('/') => {
                            app.search_mode = true;
                            app.search_query.clear();
                            app.apply_filter();
                        }
                        KeyCode::Down => app.next(),
                        KeyCode::Up => app.previous(),
                        KeyCode::Enter => {
                            if let Some(index) = app.selected_index() {
                                app.open_detail(index);
                            }
                        }
                        KeyCode::Char('r') => {
                            if !app.list_loading {
                                app.list_loading = true;
                                spawn_list_fetch(
                                    client.clone(),
                                    queue.clone(),
                                    cli.limit,
                                    cli.offset,
                                );
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }

    disable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(LeaveAlternateScreen)?;
    Ok(())
}
