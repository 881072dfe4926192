use crate::animation::{
    Animate, FrameLoop, Galaxy, GalaxyKey, Particle, ParticleField, Typewriter, Viewport,
    GALAXY_CAPACITY,
};
use crate::app::{Action, AppState, Focus, ViewMode};
use crate::composer::{Draft, Edit, Field};
use crate::dream_entry::DreamEntry;
use crate::theme::Theme;
use color_eyre::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures::StreamExt;
use rand::rngs::StdRng;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Points},
        Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap,
    },
    Frame, Terminal,
};
use std::{
    io::{stdout, Stdout},
    time::{Duration, Instant},
};
use tokio::time::MissedTickBehavior;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const CARD_HEIGHT: u16 = 8;
const LARGE_PARTICLE: f64 = 2.5;
const STAR: &str = "★";
const LUCID_BADGE: &str = "✦ Lucid";

/// Animated parts of the screen and the randomness that seeds them.
pub struct Scene {
    background: FrameLoop<ParticleField>,
    galaxy: FrameLoop<Galaxy>,
    typewriter: Typewriter,
    rng: StdRng,
    particle_count: usize,
    clock: f64,
    grid_columns: usize,
}

impl Scene {
    pub fn new(particle_count: usize, rng: StdRng) -> Self {
        Scene {
            background: FrameLoop::default(),
            galaxy: FrameLoop::default(),
            typewriter: Typewriter::default(),
            rng,
            particle_count,
            clock: 0.0,
            grid_columns: 1,
        }
    }

    pub fn tick(&mut self, clock: f64) {
        self.clock = clock;
        self.background.tick(clock);
        self.galaxy.tick(clock);
        self.typewriter.advance(clock);
    }

    pub fn grid_columns(&self) -> usize {
        self.grid_columns
    }

    pub fn teardown(&mut self) {
        tracing::debug!(
            background_frames = self.background.frames(),
            galaxy_frames = self.galaxy.frames(),
            "tearing down animations"
        );
        self.background.unmount();
        self.galaxy.unmount();
    }

    fn sync_background(&mut self, area: Rect, theme: Theme) {
        let viewport = Viewport::from_area(area);
        let stale = self
            .background
            .scene()
            .map_or(true, |field| field.theme() != theme);
        if stale {
            tracing::debug!(?theme, particles = self.particle_count, "background laid out");
            let field = ParticleField::new(self.particle_count, viewport, theme, &mut self.rng);
            self.background.mount(field);
        } else {
            self.background.resize(viewport);
        }
    }

    fn sync_galaxy(&mut self, area: Rect, entries: &[&DreamEntry], theme: Theme) {
        let viewport = Viewport::from_area(area);
        let key = GalaxyKey::new(entries, theme);
        let stale = self.galaxy.scene().map_or(true, |galaxy| *galaxy.key() != key);
        if stale {
            tracing::debug!(bubbles = entries.len().min(GALAXY_CAPACITY), "galaxy laid out");
            let mut galaxy = Galaxy::new(entries, theme, viewport, &mut self.rng);
            galaxy.advance(self.clock);
            self.galaxy.mount(galaxy);
        } else {
            self.galaxy.resize(viewport);
        }
    }

    fn cursor_visible(&self) -> bool {
        (self.clock * 2.0) as u64 % 2 == 0
    }
}

pub struct UI {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    scene: Scene,
}

impl UI {
    pub fn new(scene: Scene) -> Result<Self> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(UI { terminal, scene })
    }

    /// Runs until the user quits. Frames are driven by a fixed-rate ticker and
    /// redrawn after every handled key.
    pub async fn run(&mut self, app: &mut AppState, frame_interval: Duration) -> Result<()> {
        let mut events = EventStream::new();
        let mut ticker = tokio::time::interval(frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let started = Instant::now();

        while app.is_running() {
            tokio::select! {
                _ = ticker.tick() => {
                    self.scene.tick(started.elapsed().as_secs_f64());
                    self.display(app)?;
                }
                event = events.next() => match event {
                    Some(Ok(Event::Key(key))) => {
                        if let Some(action) = self.handle_input(app, key) {
                            app.update(action);
                            self.display(app)?;
                        }
                    }
                    Some(Ok(Event::Resize(width, height))) => {
                        tracing::debug!(width, height, "terminal resized");
                        self.display(app)?;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }
        }

        Ok(())
    }

    pub fn display(&mut self, app: &AppState) -> Result<()> {
        self.terminal.draw(|f| render(f, app, &mut self.scene))?;
        Ok(())
    }

    pub fn handle_input(&self, app: &AppState, key: KeyEvent) -> Option<Action> {
        action_for_key(app, key, self.scene.grid_columns())
    }
}

impl Drop for UI {
    fn drop(&mut self) {
        self.scene.teardown();
        if let Err(e) = disable_raw_mode() {
            tracing::warn!(error = %e, "failed to disable raw mode");
        }
        if let Err(e) = stdout().execute(LeaveAlternateScreen) {
            tracing::warn!(error = %e, "failed to leave alternate screen");
        }
    }
}

pub fn action_for_key(app: &AppState, key: KeyEvent, grid_columns: usize) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    match app.focus {
        Focus::Composer => match key.code {
            KeyCode::Esc => Some(Action::CloseComposer),
            KeyCode::Char('s') if ctrl => Some(Action::Submit),
            KeyCode::Tab | KeyCode::Down => Some(Action::Compose(Edit::FocusNext)),
            KeyCode::BackTab | KeyCode::Up => Some(Action::Compose(Edit::FocusPrevious)),
            KeyCode::Enter => Some(Action::Compose(Edit::Newline)),
            KeyCode::Backspace => Some(Action::Compose(Edit::Backspace)),
            KeyCode::Left => Some(Action::Compose(Edit::Decrease)),
            KeyCode::Right => Some(Action::Compose(Edit::Increase)),
            KeyCode::Char(c) if !ctrl => Some(Action::Compose(Edit::Insert(c))),
            _ => None,
        },
        Focus::Search => match key.code {
            KeyCode::Esc => Some(Action::ClearSearch),
            KeyCode::Enter | KeyCode::Down | KeyCode::Tab => Some(Action::LeaveSearch),
            KeyCode::Backspace => Some(Action::SearchBackspace),
            KeyCode::Char(c) if !ctrl => Some(Action::SearchInput(c)),
            _ => None,
        },
        Focus::Browse => match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('/') => Some(Action::FocusSearch),
            KeyCode::Char('n') => Some(Action::OpenComposer),
            KeyCode::Char('t') => Some(Action::ToggleTheme),
            KeyCode::Char('1') => Some(Action::SetView(ViewMode::List)),
            KeyCode::Char('2') => Some(Action::SetView(ViewMode::Grid)),
            KeyCode::Char('3') => Some(Action::SetView(ViewMode::Galaxy)),
            KeyCode::Tab => Some(Action::CycleView),
            KeyCode::Enter => Some(Action::SelectAtCursor),
            KeyCode::Esc if app.active_id().is_some() => Some(Action::CloseDetail),
            KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => {
                cursor_step(app, key.code, grid_columns).map(Action::MoveCursor)
            }
            _ => None,
        },
    }
}

fn cursor_step(app: &AppState, code: KeyCode, grid_columns: usize) -> Option<isize> {
    let columns = grid_columns.max(1) as isize;
    let step = match (app.view, code) {
        (ViewMode::List, KeyCode::Up) => -1,
        (ViewMode::List, KeyCode::Down) => 1,
        (ViewMode::Grid, KeyCode::Up) => -columns,
        (ViewMode::Grid, KeyCode::Down) => columns,
        (_, KeyCode::Left) | (ViewMode::Galaxy, KeyCode::Up) => -1,
        (_, KeyCode::Right) | (ViewMode::Galaxy, KeyCode::Down) => 1,
        _ => return None,
    };
    if app.view == ViewMode::Galaxy && step > 0 && app.cursor + 1 >= GALAXY_CAPACITY {
        return None;
    }
    Some(step)
}

pub fn render(f: &mut Frame, app: &AppState, scene: &mut Scene) {
    let theme = app.theme;
    let area = f.area();
    scene.sync_background(area, theme);
    render_background(f, area, theme, scene);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    render_header(f, chunks[0], theme);
    render_search(f, chunks[1], app);
    render_tabs(f, chunks[2], app);

    let entries = app.visible_entries();
    let (view_area, detail_area) = match app.active_entry() {
        Some(_) => {
            let halves = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)].as_ref())
                .split(chunks[3]);
            (halves[0], Some(halves[1]))
        }
        None => (chunks[3], None),
    };

    if app.view == ViewMode::Galaxy {
        scene.sync_galaxy(galaxy_block(theme).inner(view_area), &entries, theme);
    } else {
        scene.galaxy.unmount();
    }

    if entries.is_empty() && detail_area.is_none() {
        render_empty_state(f, chunks[3], app);
    } else {
        match app.view {
            ViewMode::List => render_list(f, view_area, app, &entries),
            ViewMode::Grid => scene.grid_columns = render_grid(f, view_area, app, &entries),
            ViewMode::Galaxy => render_galaxy(f, view_area, app, scene),
        }
    }

    if let (Some(area), Some(entry)) = (detail_area, app.active_entry()) {
        render_detail(f, area, entry, theme);
    }

    render_footer(f, chunks[4], app);

    if app.composer_open() {
        scene.typewriter.set_text(&app.draft.content, scene.clock);
        render_composer(f, area, &app.draft, theme, scene);
    }
}

fn render_background(f: &mut Frame, area: Rect, theme: Theme, scene: &Scene) {
    let Some(field) = scene.background.scene() else {
        return;
    };
    let viewport = Viewport::from_area(area);
    let (large, small): (Vec<_>, Vec<_>) = field
        .particles()
        .iter()
        .partition(|p| p.radius >= LARGE_PARTICLE);
    let flip = |p: &&Particle| (p.x, viewport.height - p.y);
    let small: Vec<(f64, f64)> = small.iter().map(flip).collect();
    let large: Vec<(f64, f64)> = large.iter().map(flip).collect();
    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .background_color(theme.background())
        .x_bounds([0.0, viewport.width])
        .y_bounds([0.0, viewport.height])
        .paint(|ctx| {
            ctx.draw(&Points {
                coords: &small,
                color: theme.particle(),
            });
            ctx.draw(&Points {
                coords: &large,
                color: theme.muted(),
            });
        });
    f.render_widget(canvas, area);
}

fn render_header(f: &mut Frame, area: Rect, theme: Theme) {
    let mode = match theme {
        Theme::Dark => "☀ light",
        Theme::Light => "☾ dark",
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "Dream Tracker",
            Style::default()
                .fg(theme.accent())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("   t {mode}   n + New Dream"),
            Style::default().fg(theme.muted()),
        ),
    ]))
    .block(Block::default().borders(Borders::BOTTOM).border_style(Style::default().fg(theme.muted())))
    .alignment(Alignment::Center);
    f.render_widget(header, area);
}

fn render_search(f: &mut Frame, area: Rect, app: &AppState) {
    let theme = app.theme;
    let focused = app.focus == Focus::Search;
    let text = if app.search.is_empty() && !focused {
        Span::styled(
            "Search dreams by title, content or tags...",
            Style::default().fg(theme.muted()).add_modifier(Modifier::ITALIC),
        )
    } else if focused {
        Span::styled(format!("{}|", app.search), Style::default().fg(theme.foreground()))
    } else {
        Span::styled(app.search.clone(), Style::default().fg(theme.foreground()))
    };
    let border = if focused { theme.accent() } else { theme.muted() };
    let search = Paragraph::new(Line::from(text)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title("Search"),
    );
    f.render_widget(search, area);
}

fn render_tabs(f: &mut Frame, area: Rect, app: &AppState) {
    let theme = app.theme;
    let selected = ViewMode::ALL.iter().position(|v| *v == app.view).unwrap_or(0);
    let tabs = Tabs::new(
        ViewMode::ALL
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{} {}", i + 1, v.label())),
    )
    .select(selected)
    .style(Style::default().fg(theme.muted()))
    .highlight_style(
        Style::default()
            .fg(Color::White)
            .bg(theme.accent())
            .add_modifier(Modifier::BOLD),
    )
    .divider("|");
    let centered = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(30), Constraint::Min(0)].as_ref())
        .split(area);
    f.render_widget(tabs, centered[1]);
}

fn render_footer(f: &mut Frame, area: Rect, app: &AppState) {
    let hints = match app.focus {
        Focus::Browse if app.active_id().is_some() => {
            "↑↓←→ move  Enter open  Esc close  / search  n new  t theme  Tab view  q quit"
        }
        Focus::Browse => "↑↓←→ move  Enter open  / search  n new  t theme  Tab view  q quit",
        Focus::Search => "type to search  Enter done  Esc clear",
        Focus::Composer => "Tab next field  ←→ adjust  Ctrl-S save  Esc close",
    };
    let footer = Paragraph::new(hints)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn stars_spans(entry: &DreamEntry, theme: Theme) -> Vec<Span<'static>> {
    (0..5)
        .map(|i| Span::styled(STAR, Style::default().fg(theme.star(i < entry.stars()))))
        .collect()
}

fn tag_spans(tags: &[String], theme: Theme) -> Vec<Span<'static>> {
    tags.iter()
        .map(|t| Span::styled(format!("#{t} "), Style::default().fg(theme.tag())))
        .collect()
}

fn title_line(entry: &DreamEntry, theme: Theme) -> Line<'static> {
    let mut spans = vec![Span::styled(
        entry.title.clone(),
        Style::default()
            .fg(theme.accent())
            .add_modifier(Modifier::BOLD),
    )];
    if entry.is_lucid {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(LUCID_BADGE, Style::default().fg(theme.lucid())));
    }
    Line::from(spans)
}

fn render_list(f: &mut Frame, area: Rect, app: &AppState, entries: &[&DreamEntry]) {
    let theme = app.theme;
    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = entries
        .iter()
        .map(|entry| {
            let mut title = title_line(entry, theme);
            title.spans.push(Span::styled(
                format!("  {}", entry.date.format("%Y-%m-%d")),
                Style::default().fg(theme.muted()),
            ));
            let mut lines = vec![title];
            lines.extend(
                excerpt(&entry.content, width, 2)
                    .into_iter()
                    .map(|l| Line::from(Span::styled(l, Style::default().fg(theme.muted())))),
            );
            let mut meta = tag_spans(&entry.tags, theme);
            meta.push(Span::raw(" "));
            meta.extend(stars_spans(entry, theme));
            lines.push(Line::from(meta));

            let item = ListItem::new(lines);
            if app.active_id() == Some(entry.id.as_str()) {
                item.style(Style::default().bg(theme.mood(entry.mood).bg))
            } else {
                item
            }
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.muted()))
                .title(format!("Dreams ({})", entries.len())),
        )
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    f.render_stateful_widget(
        list,
        area,
        &mut ListState::default().with_selected(Some(app.cursor)),
    );
}

/// Number of card columns for a grid of the given width.
pub fn grid_columns_for(width: u16) -> usize {
    match width {
        w if w >= 90 => 3,
        w if w >= 60 => 2,
        _ => 1,
    }
}

fn render_grid(f: &mut Frame, area: Rect, app: &AppState, entries: &[&DreamEntry]) -> usize {
    let theme = app.theme;
    let columns = grid_columns_for(area.width);
    let visible_rows = (area.height / CARD_HEIGHT).max(1) as usize;
    let cursor_row = app.cursor / columns;
    let first_row = cursor_row.saturating_sub(visible_rows - 1);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); visible_rows])
        .split(area);

    for (row_index, row_area) in rows.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, columns as u32); columns])
            .split(*row_area);
        for (column, cell) in cells.iter().enumerate() {
            let index = (first_row + row_index) * columns + column;
            let Some(entry) = entries.get(index) else {
                return columns;
            };
            render_card(f, *cell, entry, app, index == app.cursor);
        }
    }
    columns
}

fn render_card(f: &mut Frame, area: Rect, entry: &DreamEntry, app: &AppState, under_cursor: bool) {
    let theme = app.theme;
    let active = app.active_id() == Some(entry.id.as_str());
    let border = if under_cursor { theme.accent() } else { theme.muted() };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    if active {
        block = block.style(Style::default().bg(theme.mood(entry.mood).bg));
    }

    let width = area.width.saturating_sub(2) as usize;
    let mut lines = vec![title_line(entry, theme)];
    lines.extend(
        excerpt(&entry.content, width, 3)
            .into_iter()
            .map(|l| Line::from(Span::styled(l, Style::default().fg(theme.muted())))),
    );
    lines.push(Line::from(tag_spans(&entry.tags, theme)));
    let mut footer = vec![Span::styled(
        format!("{}  ", entry.date.format("%Y-%m-%d")),
        Style::default().fg(theme.muted()),
    )];
    footer.extend(stars_spans(entry, theme));
    lines.push(Line::from(footer));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn galaxy_block(theme: Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.muted()))
        .title("Galaxy")
}

fn render_galaxy(f: &mut Frame, area: Rect, app: &AppState, scene: &Scene) {
    let Some(galaxy) = scene.galaxy.scene() else {
        return;
    };
    let theme = app.theme;
    let block = galaxy_block(theme);
    let viewport = Viewport::from_area(block.inner(area));
    let label_style = Style::default().fg(theme.label());
    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, viewport.width])
        .y_bounds([0.0, viewport.height])
        .paint(|ctx| {
            for (index, bubble) in galaxy.bubbles().iter().enumerate() {
                let frame = bubble.frame(galaxy.clock());
                let y = viewport.height - frame.y;
                for ring in [1.0, 0.66, 0.33] {
                    ctx.draw(&Circle {
                        x: frame.x,
                        y,
                        radius: frame.radius * ring,
                        color: bubble.color,
                    });
                }
                if app.active_id() == Some(bubble.entry_id.as_str()) {
                    ctx.draw(&Circle {
                        x: frame.x,
                        y,
                        radius: frame.radius + 4.0,
                        color: theme.accent(),
                    });
                }
                let style = if index == app.cursor {
                    label_style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                } else {
                    label_style
                };
                ctx.print(
                    frame.x + frame.radius + 5.0,
                    y,
                    Span::styled(bubble.label.clone(), style),
                );
            }
        });
    f.render_widget(canvas, area);
}

fn render_detail(f: &mut Frame, area: Rect, entry: &DreamEntry, theme: Theme) {
    let palette = theme.mood(entry.mood);
    let mut heading = vec![Span::styled(
        entry.date.format("%Y-%m-%d").to_string(),
        Style::default().fg(theme.muted()),
    )];
    if entry.is_lucid {
        heading.push(Span::raw("  "));
        heading.push(Span::styled("✦ Lucid Dream", Style::default().fg(theme.lucid())));
    }
    heading.push(Span::raw("  "));
    heading.extend(stars_spans(entry, theme));

    let lines = vec![
        Line::from(Span::styled(
            entry.title.clone(),
            Style::default()
                .fg(theme.accent())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(heading),
        Line::from(""),
        Line::from(tag_spans(&entry.tags, theme)),
        Line::from(""),
        Line::from(Span::styled(entry.content.clone(), Style::default().fg(theme.foreground()))),
        Line::from(""),
        Line::from(vec![
            Span::styled("Mood ", Style::default().fg(theme.muted())),
            Span::styled(
                format!(" {} ", entry.mood),
                Style::default()
                    .fg(palette.text)
                    .bg(palette.bg)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(
            std::iter::once(Span::styled("Intensity ", Style::default().fg(theme.muted())))
                .chain(stars_spans(entry, theme))
                .collect::<Vec<_>>(),
        ),
    ];

    let detail = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent))
                .title("Dream"),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(detail, area);
}

fn render_empty_state(f: &mut Frame, area: Rect, app: &AppState) {
    let theme = app.theme;
    let message = if app.search.is_empty() {
        "Your dream journal is empty. Add a dream to start."
    } else {
        "No dreams match your search."
    };
    let lines = vec![
        Line::from(Span::styled("☾", Style::default().fg(theme.accent()))),
        Line::from(""),
        Line::from(Span::styled(
            "No dreams found",
            Style::default()
                .fg(theme.accent())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(message, Style::default().fg(theme.muted()))),
        Line::from(""),
        Line::from(Span::styled(
            "Press n to record a new dream",
            Style::default().fg(Color::Yellow),
        )),
    ];
    let inner = centered_rect(area, 60, 8);
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(theme.muted()))),
        inner,
    );
}

fn field_block(field: Field, draft: &Draft, theme: Theme) -> Block<'static> {
    let color = if draft.focus == field { theme.accent() } else { theme.muted() };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(field.label())
}

fn with_cursor(text: &str, field: Field, draft: &Draft, scene: &Scene) -> String {
    if draft.focus == field && field.takes_text() && scene.cursor_visible() {
        format!("{text}|")
    } else {
        text.to_owned()
    }
}

fn render_composer(f: &mut Frame, area: Rect, draft: &Draft, theme: Theme, scene: &Scene) {
    let modal = centered_rect(area, 80, 34);
    f.render_widget(Clear, modal);
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent()))
        .title("Record New Dream")
        .style(Style::default().bg(theme.background()).fg(theme.foreground()));
    let inner = outer.inner(modal);
    f.render_widget(outer, modal);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(4),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(4),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(inner);

    let title = if draft.title.is_empty() && draft.focus != Field::Title {
        Span::styled("Give your dream a title...", Style::default().fg(theme.muted()))
    } else {
        Span::raw(with_cursor(&draft.title, Field::Title, draft, scene))
    };
    f.render_widget(
        Paragraph::new(Line::from(title)).block(field_block(Field::Title, draft, theme)),
        chunks[0],
    );

    let content = if draft.content.is_empty() && draft.focus != Field::Content {
        Paragraph::new(Span::styled(
            "Describe your dream in detail...",
            Style::default().fg(theme.muted()),
        ))
    } else {
        Paragraph::new(with_cursor(&draft.content, Field::Content, draft, scene))
    };
    f.render_widget(
        content
            .wrap(Wrap { trim: false })
            .block(field_block(Field::Content, draft, theme)),
        chunks[1],
    );

    if !draft.content.is_empty() {
        let preview = Paragraph::new(Span::styled(
            scene.typewriter.visible().replace('\n', " "),
            Style::default().fg(theme.muted()).add_modifier(Modifier::ITALIC),
        ))
        .block(Block::default().borders(Borders::ALL).title("Preview"));
        f.render_widget(preview, chunks[2]);
    }

    let row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(chunks[3]);
    f.render_widget(
        Paragraph::new(format!("◂ {} ▸", draft.date.format("%Y-%m-%d")))
            .block(field_block(Field::Date, draft, theme)),
        row[0],
    );
    let palette = theme.mood(draft.mood);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw("◂ "),
            Span::styled(draft.mood.label(), Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)),
            Span::raw(" ▸"),
        ]))
        .block(field_block(Field::Mood, draft, theme)),
        row[1],
    );

    let filled = usize::from(draft.intensity);
    let bar = format!(
        "{}{} {}",
        "━".repeat(filled * 3),
        "─".repeat((10 - filled) * 3),
        draft.intensity
    );
    f.render_widget(
        Paragraph::new(Span::styled(bar, Style::default().fg(theme.accent())))
            .block(field_block(Field::Intensity, draft, theme)),
        chunks[4],
    );

    let pending = if draft.pending_tag.is_empty() && draft.focus != Field::Tags {
        Span::styled("Add tags (e.g. flying, water, city)", Style::default().fg(theme.muted()))
    } else {
        Span::raw(with_cursor(&draft.pending_tag, Field::Tags, draft, scene))
    };
    f.render_widget(
        Paragraph::new(vec![Line::from(pending), Line::from(tag_spans(&draft.tags, theme))])
            .block(field_block(Field::Tags, draft, theme)),
        chunks[5],
    );

    let check = if draft.is_lucid { "[x]" } else { "[ ]" };
    let save_style = if draft.can_submit() {
        Style::default().fg(Color::White).bg(theme.accent()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.muted())
    };
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                format!("{check} Lucid Dream"),
                Style::default().fg(if draft.is_lucid { theme.accent() } else { theme.foreground() }),
            ),
            Span::raw("      "),
            Span::styled(" Esc Cancel ", Style::default().fg(theme.muted())),
            Span::raw("  "),
            Span::styled(" Ctrl-S Save Dream ", save_style),
        ]))
        .block(field_block(Field::Lucid, draft, theme)),
        chunks[6],
    );
}

fn centered_rect(area: Rect, width_percent: u16, height: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(width_percent) / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Splits `text` into at most `lines` rows of `width` columns, ending with an
/// ellipsis when something was cut.
pub fn excerpt(text: &str, width: usize, lines: usize) -> Vec<String> {
    if width == 0 || lines == 0 {
        return Vec::new();
    }
    let mut rows = vec![String::new()];
    let mut row_width = 0;
    let mut truncated = false;
    for c in text.chars().map(|c| if c == '\n' { ' ' } else { c }) {
        let w = c.width().unwrap_or(0);
        if row_width + w > width {
            if rows.len() == lines {
                truncated = true;
                break;
            }
            rows.push(String::new());
            row_width = 0;
        }
        if let Some(row) = rows.last_mut() {
            row.push(c);
        }
        row_width += w;
    }
    if truncated {
        if let Some(last) = rows.last_mut() {
            while last.width() + 1 > width {
                last.pop();
            }
            last.push('…');
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dream_state::DreamState;
    use rand::SeedableRng;
    use ratatui::backend::TestBackend;

    fn app() -> AppState {
        AppState::new(DreamState::seeded(), Theme::Dark)
    }

    fn scene() -> Scene {
        Scene::new(20, StdRng::seed_from_u64(3))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn draw(app: &AppState, scene: &mut Scene) -> String {
        draw_sized(app, scene, 120, 44)
    }

    fn draw_sized(app: &AppState, scene: &mut Scene, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, app, scene)).unwrap();
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn list_view_shows_every_seed() {
        let app = app();
        let screen = draw(&app, &mut scene());
        assert!(screen.contains("Dream Tracker"));
        assert!(screen.contains("Neon Cityscape Flight"));
        assert!(screen.contains("Infinite Library"));
        assert!(screen.contains("Celestial Jellyfish Ocean"));
        assert!(screen.contains("#flying"));
        assert!(screen.contains("2023-05-10"));
    }

    #[test]
    fn grid_view_uses_three_columns_when_wide() {
        let mut app = app();
        app.update(Action::SetView(ViewMode::Grid));
        let mut scene = scene();
        let screen = draw(&app, &mut scene);
        assert_eq!(scene.grid_columns(), 3);
        assert!(screen.contains("Infinite Library"));
        assert!(screen.contains("#mystery"));
    }

    #[test]
    fn galaxy_mounts_and_unmounts_with_the_view() {
        let mut app = app();
        let mut scene = scene();
        app.update(Action::SetView(ViewMode::Galaxy));
        scene.tick(0.5);
        let screen = draw(&app, &mut scene);
        assert!(scene.galaxy.is_mounted());
        assert_eq!(scene.galaxy.scene().map(|g| g.bubbles().len()), Some(3));
        assert!(screen.contains("Infinite Librar"));
        assert!(!screen.contains("Infinite Library"));

        app.update(Action::SetView(ViewMode::List));
        draw(&app, &mut scene);
        assert!(!scene.galaxy.is_mounted());
        let frames = scene.galaxy.frames();
        scene.tick(1.0);
        assert_eq!(scene.galaxy.frames(), frames);
    }

    #[test]
    fn galaxy_layout_rebuilds_only_on_entry_or_theme_change() {
        let mut app = app();
        let mut scene = scene();
        app.update(Action::SetView(ViewMode::Galaxy));
        draw(&app, &mut scene);
        let offsets = |s: &Scene| -> Vec<f64> {
            s.galaxy.scene().unwrap().bubbles().iter().map(|b| b.offset).collect()
        };
        let first = offsets(&scene);

        scene.tick(2.0);
        draw(&app, &mut scene);
        assert_eq!(offsets(&scene), first);

        app.update(Action::ToggleTheme);
        draw(&app, &mut scene);
        assert_ne!(offsets(&scene), first);

        app.update(Action::SearchInput('o'));
        app.update(Action::SearchInput('c'));
        draw(&app, &mut scene);
        assert_eq!(scene.galaxy.scene().unwrap().bubbles().len(), 1);
    }

    #[test]
    fn background_restarts_on_theme_change() {
        let mut app = app();
        let mut scene = scene();
        draw(&app, &mut scene);
        assert_eq!(scene.background.scene().map(|f| f.theme()), Some(Theme::Dark));
        app.update(Action::ToggleTheme);
        draw(&app, &mut scene);
        assert_eq!(scene.background.scene().map(|f| f.theme()), Some(Theme::Light));
        scene.teardown();
        assert!(!scene.background.tick(9.0));
    }

    #[test]
    fn teardown_can_run_more_than_once() {
        let app = app();
        let mut scene = scene();
        draw(&app, &mut scene);
        scene.teardown();
        scene.teardown();
        assert!(!scene.background.is_mounted());
        assert!(!scene.galaxy.is_mounted());
    }

    #[test]
    fn galaxy_is_laid_out_inside_its_border() {
        let mut app = app();
        let mut scene = scene();
        app.update(Action::SetView(ViewMode::Galaxy));
        draw(&app, &mut scene);
        // 120x44 minus the outer margin, header, search, tabs and footer leaves
        // a 118x34 body; the border takes one cell on each side.
        let viewport = scene.galaxy.scene().map(|g| g.viewport());
        assert_eq!(viewport, Some(Viewport::new(232.0, 128.0)));
    }

    #[test]
    fn very_wide_terminals_render_modals() {
        let mut app = app();
        for c in "submarine".chars() {
            app.update(Action::SearchInput(c));
        }
        let screen = draw_sized(&app, &mut scene(), 1200, 50);
        assert!(screen.contains("No dreams match your search."));

        app.update(Action::OpenComposer);
        let screen = draw_sized(&app, &mut scene(), 900, 50);
        assert!(screen.contains("Record New Dream"));
    }

    #[test]
    fn detail_panel_shows_active_entry() {
        let mut app = app();
        app.update(Action::MoveCursor(2));
        app.update(Action::SelectAtCursor);
        let screen = draw(&app, &mut scene());
        assert!(screen.contains("Dream"));
        assert!(screen.contains("Lucid Dream"));
        assert!(screen.contains("Calm"));
    }

    #[test]
    fn empty_search_shows_empty_state() {
        let mut app = app();
        for c in "submarine".chars() {
            app.update(Action::SearchInput(c));
        }
        let screen = draw(&app, &mut scene());
        assert!(screen.contains("No dreams found"));
        assert!(screen.contains("No dreams match your search."));
    }

    #[test]
    fn empty_journal_invites_a_first_dream() {
        let app = AppState::new(DreamState::new(), Theme::Light);
        let screen = draw(&app, &mut scene());
        assert!(screen.contains("Your dream journal is empty."));
    }

    #[test]
    fn composer_renders_draft_and_preview() {
        let mut app = app();
        app.update(Action::OpenComposer);
        for c in "Moon".chars() {
            app.update(Action::Compose(Edit::Insert(c)));
        }
        app.draft.focus = Field::Content;
        for c in "Tides".chars() {
            app.update(Action::Compose(Edit::Insert(c)));
        }
        let mut scene = scene();
        draw(&app, &mut scene);
        scene.tick(10.0);
        let screen = draw(&app, &mut scene);
        assert!(screen.contains("Record New Dream"));
        assert!(screen.contains("Moon"));
        assert!(screen.contains("Preview"));
        assert!(screen.contains("Save Dream"));
        assert_eq!(scene.typewriter.visible(), "Tides");
    }

    #[test]
    fn browse_keys_map_to_actions() {
        let app = app();
        assert!(matches!(action_for_key(&app, key(KeyCode::Char('q')), 1), Some(Action::Quit)));
        assert!(matches!(action_for_key(&app, key(KeyCode::Char('/')), 1), Some(Action::FocusSearch)));
        assert!(matches!(
            action_for_key(&app, key(KeyCode::Char('3')), 1),
            Some(Action::SetView(ViewMode::Galaxy))
        ));
        assert!(matches!(action_for_key(&app, key(KeyCode::Down), 1), Some(Action::MoveCursor(1))));
        assert!(action_for_key(&app, key(KeyCode::Esc), 1).is_none());
    }

    #[test]
    fn grid_rows_move_by_column_count() {
        let mut app = app();
        app.update(Action::SetView(ViewMode::Grid));
        assert!(matches!(action_for_key(&app, key(KeyCode::Down), 3), Some(Action::MoveCursor(3))));
        assert!(matches!(action_for_key(&app, key(KeyCode::Left), 3), Some(Action::MoveCursor(-1))));
    }

    #[test]
    fn composer_keys_edit_the_draft() {
        let mut app = app();
        app.update(Action::OpenComposer);
        assert!(matches!(
            action_for_key(&app, key(KeyCode::Char('q')), 1),
            Some(Action::Compose(Edit::Insert('q')))
        ));
        let save = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert!(matches!(action_for_key(&app, save, 1), Some(Action::Submit)));
        assert!(matches!(action_for_key(&app, key(KeyCode::Esc), 1), Some(Action::CloseComposer)));
    }

    #[test]
    fn search_keys_edit_the_query() {
        let mut app = app();
        app.update(Action::FocusSearch);
        assert!(matches!(
            action_for_key(&app, key(KeyCode::Char('n')), 1),
            Some(Action::SearchInput('n'))
        ));
        assert!(matches!(action_for_key(&app, key(KeyCode::Esc), 1), Some(Action::ClearSearch)));
    }

    #[test]
    fn excerpt_wraps_and_truncates() {
        assert_eq!(excerpt("abcdef", 3, 2), vec!["abc", "def"]);
        assert_eq!(excerpt("abcdefgh", 3, 2), vec!["abc", "de…"]);
        assert_eq!(excerpt("a\nb", 10, 1), vec!["a b"]);
        assert!(excerpt("abc", 0, 2).is_empty());
    }

    #[test]
    fn grid_columns_follow_width() {
        assert_eq!(grid_columns_for(40), 1);
        assert_eq!(grid_columns_for(70), 2);
        assert_eq!(grid_columns_for(120), 3);
    }
}
