//! Application state and rendering: the filtered list, the info pane, the
//! detail overlay and the help overlay. Background fetch completions arrive
//! as [`FetchEvent`]s pushed onto a shared queue and are applied once per
//! tick by the main loop.

use std::collections::{HashMap, HashSet};
use std::io;
use std::io::Stdout;
use std::sync::{Arc, Mutex};

use image::imageops::FilterType;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Terminal;

use crate::models::{BasicInfo, Pokemon, PokemonStore};
use crate::typechart::{effective_weaknesses, PokemonType};
use crate::utils::{format_name, text_to_lines};

/// Compact RGB thumbnail decoded from a sprite response, kept in memory for
/// the session.
pub struct SpriteThumb {
    pub w: u32,
    pub h: u32,
    /// RGB pixels in row-major order (len = w*h*3)
    pub pixels: Vec<u8>,
}

const THUMB_W: u32 = 48;
const THUMB_H: u32 = 48;

impl SpriteThumb {
    /// Decode sprite bytes and downscale to the canonical thumbnail size.
    pub fn from_image_bytes(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let small = image::imageops::resize(&img, THUMB_W, THUMB_H, FilterType::Lanczos3);
        let mut pixels = Vec::with_capacity((THUMB_W * THUMB_H * 3) as usize);
        for y in 0..small.height() {
            for x in 0..small.width() {
                let p = small.get_pixel(x, y);
                pixels.push(p[0]);
                pixels.push(p[1]);
                pixels.push(p[2]);
            }
        }
        Ok(SpriteThumb {
            w: THUMB_W,
            h: THUMB_H,
            pixels,
        })
    }

    fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let idx = ((y * self.w + x) * 3) as usize;
        (self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2])
    }

    /// Nearest-neighbor sample of the thumbnail at `w` x `h` cells.
    pub fn sample(&self, w: u32, h: u32) -> Vec<Vec<(u8, u8, u8)>> {
        let w = w.max(1);
        let h = h.max(1);
        let mut rows = Vec::with_capacity(h as usize);
        for y in 0..h {
            let src_y = (y * self.h / h).min(self.h - 1);
            let mut row = Vec::with_capacity(w as usize);
            for x in 0..w {
                let src_x = (x * self.w / w).min(self.w - 1);
                row.push(self.pixel(src_x, src_y));
            }
            rows.push(row);
        }
        rows
    }
}

/// Completion of a background fetch, applied to the app on the next tick.
pub enum FetchEvent {
    ListLoaded(Vec<Pokemon>),
    ListFailed,
    DetailLoaded { index: usize, info: BasicInfo },
    DetailFailed { index: usize },
    FlavorLoaded { index: usize, text: String },
    FlavorFailed { index: usize },
    SpriteLoaded { index: usize, thumb: SpriteThumb },
    SpriteFailed { index: usize },
}

/// Shared queue background tasks push completions onto.
pub type EventQueue = Arc<Mutex<Vec<FetchEvent>>>;

pub struct App {
    pub store: PokemonStore,
    /// Indices into the store that pass the current search filter.
    pub visible: Vec<usize>,
    pub selected_visible: usize,
    pub search_mode: bool,
    pub search_query: String,
    pub list_loading: bool,
    pub show_help: bool,
    /// Store index whose detail overlay is open.
    pub modal: Option<usize>,
    /// Store index waiting on its flavor fetch before the overlay opens.
    pub pending_modal: Option<usize>,
    detail_in_flight: HashSet<usize>,
    flavor_in_flight: HashSet<usize>,
    sprite_in_flight: HashSet<usize>,
    pub sprite_cache: HashMap<usize, SpriteThumb>,
    /// Inner height of the list widget as of the last draw.
    pub list_rows: usize,
}

impl App {
    pub fn new() -> Self {
        App {
            store: PokemonStore::new(),
            visible: Vec::new(),
            selected_visible: 0,
            search_mode: false,
            search_query: String::new(),
            list_loading: false,
            show_help: false,
            modal: None,
            pending_modal: None,
            detail_in_flight: HashSet::new(),
            flavor_in_flight: HashSet::new(),
            sprite_in_flight: HashSet::new(),
            sprite_cache: HashMap::new(),
            list_rows: 0,
        }
    }

    pub fn next(&mut self) {
        if !self.visible.is_empty() {
            self.selected_visible = (self.selected_visible + 1) % self.visible.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.visible.is_empty() {
            if self.selected_visible == 0 {
                self.selected_visible = self.visible.len() - 1;
            } else {
                self.selected_visible -= 1;
            }
        }
    }

    /// Store index of the currently selected entry, if any.
    pub fn selected_index(&self) -> Option<usize> {
        self.visible.get(self.selected_visible).copied()
    }

    /// Recompute the visible set from the search query. An entry stays
    /// visible if its name or one of its type names contains the query,
    /// case-insensitively.
    pub fn apply_filter(&mut self) {
        let q = self.search_query.to_lowercase();
        if q.is_empty() {
            self.visible = (0..self.store.len()).collect();
        } else {
            self.visible = self
                .store
                .iter()
                .enumerate()
                .filter_map(|(i, p)| {
                    let name_hit = p.name.to_lowercase().contains(&q);
                    let type_hit = p.types.iter().any(|t| t.name().contains(&q));
                    (name_hit || type_hit).then_some(i)
                })
                .collect();
        }

        if self.visible.is_empty() {
            self.selected_visible = 0;
        } else if self.selected_visible >= self.visible.len() {
            self.selected_visible = self.visible.len() - 1;
        }
    }

    /// Open the detail overlay for a store index. Ignored while an overlay
    /// is already open or pending. If the record's flavor text is missing
    /// the overlay stays pending until the fetch resolves.
    pub fn open_detail(&mut self, index: usize) {
        if self.modal.is_some() || self.pending_modal.is_some() {
            return;
        }
        let Some(pokemon) = self.store.get(index) else {
            return;
        };
        if pokemon.flavor_text.is_some() {
            self.modal = Some(index);
        } else {
            self.pending_modal = Some(index);
        }
    }

    pub fn close_detail(&mut self) {
        self.modal = None;
        self.pending_modal = None;
    }

    pub fn apply_fetch_event(&mut self, event: FetchEvent) {
        match event {
            FetchEvent::ListLoaded(list) => {
                for pokemon in list {
                    self.store.add(pokemon);
                }
                self.list_loading = false;
                self.apply_filter();
            }
            FetchEvent::ListFailed => {
                self.list_loading = false;
            }
            FetchEvent::DetailLoaded { index, info } => {
                self.detail_in_flight.remove(&index);
                if let Some(pokemon) = self.store.get_mut(index) {
                    pokemon.apply_basic_info(info);
                }
            }
            FetchEvent::DetailFailed { index } => {
                self.detail_in_flight.remove(&index);
            }
            FetchEvent::FlavorLoaded { index, text } => {
                self.flavor_in_flight.remove(&index);
                if let Some(pokemon) = self.store.get_mut(index) {
                    pokemon.apply_flavor_text(text);
                }
                if self.pending_modal == Some(index) {
                    self.pending_modal = None;
                    self.modal = Some(index);
                }
            }
            FetchEvent::FlavorFailed { index } => {
                self.flavor_in_flight.remove(&index);
                if self.pending_modal == Some(index) {
                    self.pending_modal = None;
                }
            }
            FetchEvent::SpriteLoaded { index, thumb } => {
                self.sprite_in_flight.remove(&index);
                self.sprite_cache.insert(index, thumb);
            }
            FetchEvent::SpriteFailed { index } => {
                self.sprite_in_flight.remove(&index);
            }
        }
    }

    /// Store indices currently in (or near) the rendered list viewport.
    fn viewport_indices(&self) -> Vec<usize> {
        if self.visible.is_empty() {
            return Vec::new();
        }
        let rows = self.list_rows.max(1);
        let start = self.selected_visible.saturating_sub(rows.saturating_sub(1));
        let end = (self.selected_visible + rows).min(self.visible.len());
        self.visible[start..end].to_vec()
    }

    /// Detail fetches to issue this tick: records in the viewport (plus a
    /// pending overlay target) that are not detailed and not in flight.
    /// Marks them in flight.
    pub fn begin_detail_fetches(&mut self) -> Vec<(usize, String)> {
        let mut targets = self.viewport_indices();
        if let Some(pending) = self.pending_modal {
            if !targets.contains(&pending) {
                targets.push(pending);
            }
        }

        let mut fetches = Vec::new();
        for index in targets {
            let Some(pokemon) = self.store.get(index) else {
                continue;
            };
            if pokemon.is_detailed() || self.detail_in_flight.contains(&index) {
                continue;
            }
            self.detail_in_flight.insert(index);
            fetches.push((index, pokemon.detail_url.clone()));
        }
        fetches
    }

    /// Flavor fetch to issue for a pending overlay, once the record's
    /// species URL is known. Marks it in flight.
    pub fn begin_flavor_fetch(&mut self) -> Option<(usize, String)> {
        let index = self.pending_modal?;
        if self.flavor_in_flight.contains(&index) {
            return None;
        }
        let pokemon = self.store.get(index)?;
        if pokemon.flavor_text.is_some() {
            return None;
        }
        let species_url = pokemon.species_url.clone()?;
        self.flavor_in_flight.insert(index);
        Some((index, species_url))
    }

    /// Sprite fetches for detailed viewport records without a cached
    /// thumbnail. Marks them in flight.
    pub fn begin_sprite_fetches(&mut self) -> Vec<(usize, String)> {
        let mut fetches = Vec::new();
        for index in self.viewport_indices() {
            if self.sprite_cache.contains_key(&index) || self.sprite_in_flight.contains(&index) {
                continue;
            }
            let Some(pokemon) = self.store.get(index) else {
                continue;
            };
            let Some(url) = pokemon.sprite_url.clone() else {
                continue;
            };
            self.sprite_in_flight.insert(index);
            fetches.push((index, url));
        }
        fetches
    }
}

impl Default for App {
    fn default() -> Self {
        App::new()
    }
}

fn type_color(t: PokemonType) -> (u8, u8, u8) {
    match t {
        PokemonType::Normal => (168, 168, 120),
        PokemonType::Fire => (240, 128, 48),
        PokemonType::Water => (104, 144, 240),
        PokemonType::Grass => (120, 200, 80),
        PokemonType::Electric => (248, 208, 48),
        PokemonType::Ice => (152, 216, 216),
        PokemonType::Fighting => (192, 48, 40),
        PokemonType::Poison => (160, 64, 160),
        PokemonType::Ground => (224, 192, 104),
        PokemonType::Flying => (168, 144, 240),
        PokemonType::Psychic => (248, 88, 136),
        PokemonType::Bug => (168, 184, 32),
        PokemonType::Rock => (184, 160, 56),
        PokemonType::Ghost => (112, 88, 152),
        PokemonType::Dark => (112, 88, 72),
        PokemonType::Dragon => (112, 56, 248),
        PokemonType::Steel => (184, 184, 208),
        PokemonType::Fairy => (238, 153, 172),
    }
}

/// Small padded badge with a contrasting foreground.
fn type_badge(t: PokemonType) -> Span<'static> {
    let (r, g, b) = type_color(t);
    let lum = 0.2126 * (r as f32) + 0.7152 * (g as f32) + 0.0722 * (b as f32);
    let fg = if lum > 160.0 { Color::Black } else { Color::White };
    Span::styled(
        format!(" {} ", format_name(t.name())),
        Style::default().fg(fg).bg(Color::Rgb(r, g, b)),
    )
}

fn badge_row<'a>(label: &'a str, types: &[PokemonType]) -> Spans<'a> {
    let mut spans: Vec<Span> = vec![Span::raw(label)];
    if types.is_empty() {
        spans.push(Span::raw("(none)"));
    }
    for (i, t) in types.iter().enumerate() {
        spans.push(type_badge(*t));
        if i < types.len() - 1 {
            spans.push(Span::raw(" "));
        }
    }
    Spans::from(spans)
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_w = r.width.saturating_mul(percent_x) / 100;
    let popup_h = r.height.saturating_mul(percent_y) / 100;
    let popup_x = r.x + (r.width.saturating_sub(popup_w) / 2);
    let popup_y = r.y + (r.height.saturating_sub(popup_h) / 2);
    Rect::new(popup_x, popup_y, popup_w, popup_h)
}

pub fn draw_ui(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> io::Result<()> {
    terminal
        .draw(|f| {
            let size = f.size();
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
                .split(size);

            let left_chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(3)])
                .split(chunks[0]);

            app.list_rows = left_chunks[0].height.saturating_sub(2) as usize;

            let items: Vec<ListItem> = app
                .visible
                .iter()
                .filter_map(|&i| app.store.get(i))
                .map(|p| {
                    let display_name = format_name(&p.name);
                    let line = match p.id {
                        Some(id) => Spans::from(Span::raw(format!("#{:<4} {}", id, display_name))),
                        None => Spans::from(Span::styled(
                            format!("      {} …", display_name),
                            Style::default().fg(Color::DarkGray),
                        )),
                    };
                    ListItem::new(vec![line])
                })
                .collect();

            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title("Pokémon"))
                .highlight_style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                );

            f.render_stateful_widget(list, left_chunks[0], &mut {
                let mut state = ratatui::widgets::ListState::default();
                if !app.visible.is_empty() {
                    state.select(Some(app.selected_visible));
                }
                state
            });

            let status_line = if app.list_loading {
                "Loading Pokémon list…".to_string()
            } else if app.pending_modal.is_some() {
                "Loading details…".to_string()
            } else if app.search_mode {
                format!("/{}", app.search_query)
            } else if !app.search_query.is_empty() {
                format!("Filter: {}  ('/' to edit)", app.search_query)
            } else {
                "Press '/' to search, Enter for details, h for help.".to_string()
            };
            let status_title = if app.search_mode { "Search" } else { "Status" };
            let status = Paragraph::new(vec![Spans::from(Span::raw(status_line))])
                .block(Block::default().borders(Borders::ALL).title(status_title));
            f.render_widget(status, left_chunks[1]);

            draw_info_pane(f, app, chunks[1]);

            if let Some(index) = app.modal {
                draw_detail_overlay(f, app, index);
            }

            if app.show_help {
                draw_help_overlay(f);
            }
        })
        .map(|_| ())
}

fn draw_info_pane(f: &mut ratatui::Frame<CrosstermBackend<Stdout>>, app: &App, area: Rect) {
    let Some(index) = app.selected_index() else {
        let empty = if app.list_loading {
            "Waiting for the list…"
        } else {
            "No Pokémon match the filter"
        };
        let para =
            Paragraph::new(empty).block(Block::default().borders(Borders::ALL).title("Info"));
        f.render_widget(para, area);
        return;
    };
    let Some(pokemon) = app.store.get(index) else {
        return;
    };

    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(26), Constraint::Min(10)])
        .split(area);

    let sprite_rect = top_chunks[0];
    let sprite_para = match app.sprite_cache.get(&index) {
        Some(thumb) => {
            let avail_w = sprite_rect.width.saturating_sub(2).max(1) as u32;
            let avail_h = sprite_rect.height.saturating_sub(2).max(1) as u32;
            let rows = thumb.sample(avail_w.min(48), avail_h.min(48));
            let mut stext: Vec<Spans> = Vec::new();
            for row in rows.iter() {
                let mut spans = Vec::new();
                for &(r, g, b) in row.iter() {
                    spans.push(Span::styled(" ", Style::default().bg(Color::Rgb(r, g, b))));
                }
                stext.push(Spans::from(spans));
            }
            Paragraph::new(stext).block(Block::default().borders(Borders::ALL).title("Sprite"))
        }
        None => Paragraph::new("(no sprite yet)")
            .block(Block::default().borders(Borders::ALL).title("Sprite")),
    };
    f.render_widget(sprite_para, sprite_rect);

    let mut info_lines: Vec<Spans> = Vec::new();
    let heading = match pokemon.id {
        Some(id) => format!("{} (#{})", format_name(&pokemon.name), id),
        None => format_name(&pokemon.name),
    };
    info_lines.push(Spans::from(Span::styled(
        heading,
        Style::default().add_modifier(Modifier::BOLD),
    )));

    if pokemon.is_detailed() {
        info_lines.push(badge_row("Types: ", &pokemon.types));
        if let (Some(height), Some(weight)) = (pokemon.height, pokemon.weight) {
            info_lines.push(Spans::from(Span::raw(format!(
                "Height: {}cm  Weight: {:.1}kg",
                height * 10,
                weight as f32 / 10.0
            ))));
        }
        info_lines.push(Spans::from(Span::raw("")));
        info_lines.push(Spans::from(Span::raw("Press Enter for the full entry.")));
    } else {
        info_lines.push(Spans::from(Span::styled(
            "Fetching details…",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let info_para = Paragraph::new(info_lines)
        .block(Block::default().borders(Borders::ALL).title("Info"))
        .wrap(Wrap { trim: true });
    f.render_widget(info_para, top_chunks[1]);
}

fn draw_detail_overlay(f: &mut ratatui::Frame<CrosstermBackend<Stdout>>, app: &App, index: usize) {
    let Some(pokemon) = app.store.get(index) else {
        return;
    };
    let area = f.size();
    let popup = centered_rect(70, 70, area);
    f.render_widget(Clear, popup);

    let mut lines: Vec<Spans> = Vec::new();
    let heading = match pokemon.id {
        Some(id) => format!("#{} {}", id, format_name(&pokemon.name)),
        None => format_name(&pokemon.name),
    };
    lines.push(Spans::from(Span::styled(
        heading,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Spans::from(Span::raw("")));
    lines.push(badge_row("Types: ", &pokemon.types));
    if let (Some(height), Some(weight)) = (pokemon.height, pokemon.weight) {
        lines.push(Spans::from(Span::raw(format!(
            "Height: {}cm  Weight: {:.1}kg",
            height * 10,
            weight as f32 / 10.0
        ))));
    }
    lines.push(Spans::from(Span::raw("")));

    if let Some(flavor) = &pokemon.flavor_text {
        let wrap_width = popup.width.saturating_sub(4).max(10) as usize;
        for line in text_to_lines(flavor, wrap_width) {
            lines.push(Spans::from(Span::raw(line)));
        }
        lines.push(Spans::from(Span::raw("")));
    }

    let weaknesses = effective_weaknesses(&pokemon.types);
    lines.push(badge_row("Weak against: ", &weaknesses));
    lines.push(Spans::from(Span::raw("")));
    lines.push(Spans::from(Span::styled(
        "Esc to close",
        Style::default().fg(Color::DarkGray),
    )));

    let para = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format_name(&pokemon.name)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(para, popup);
}

fn draw_help_overlay(f: &mut ratatui::Frame<CrosstermBackend<Stdout>>) {
    let area = f.size();
    let popup = centered_rect(60, 50, area);
    f.render_widget(Clear, popup);

    let mut help_lines: Vec<Spans> = Vec::new();
    help_lines.push(Spans::from(Span::styled(
        "Keybindings",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    help_lines.push(Spans::from(Span::raw("")));
    help_lines.push(Spans::from(Span::raw("q          Quit")));
    help_lines.push(Spans::from(Span::raw("/          Enter search mode")));
    help_lines.push(Spans::from(Span::raw(
        "Enter/Esc  Finish or cancel search mode",
    )));
    help_lines.push(Spans::from(Span::raw("Up/Down    Navigate list")));
    help_lines.push(Spans::from(Span::raw("Enter      Open the detail view")));
    help_lines.push(Spans::from(Span::raw("Esc        Close the detail view")));
    help_lines.push(Spans::from(Span::raw("r          Reload the list")));
    help_lines.push(Spans::from(Span::raw("h/F1       Toggle this help")));

    let help_para = Paragraph::new(help_lines)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_para, popup);
}
