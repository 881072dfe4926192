//! Frame-driven decorations: the drifting particle background, the galaxy of
//! dream bubbles and the typewriter preview in the composer.
//!
//! Every scene lives inside a [`FrameLoop`]. A loop is mounted when its view
//! appears and unmounted when the view goes away; ticking an unmounted loop
//! does nothing.

use crate::dream_entry::DreamEntry;
use crate::theme::Theme;
use rand::Rng;
use ratatui::{layout::Rect, style::Color};
use std::f64::consts::TAU;

pub const PARTICLE_COUNT: usize = 100;
pub const GALAXY_CAPACITY: usize = 10;
pub const BUBBLE_SIZE: f64 = 12.0;
pub const BUBBLE_BOB: f64 = 15.0;
pub const BUBBLE_PULSE: f64 = 3.0;
pub const BUBBLE_LABEL_CHARS: usize = 15;
pub const TYPEWRITER_STEP_SECS: f64 = 0.05;

/// Canvas size in braille dots. One terminal cell is 2 dots wide and 4 tall.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Viewport { width, height }
    }

    pub fn from_area(area: Rect) -> Self {
        Viewport::new(f64::from(area.width) * 2.0, f64::from(area.height) * 4.0)
    }
}

pub trait Animate {
    /// Advances the scene to `clock`, in seconds since startup.
    fn advance(&mut self, clock: f64);

    fn resize(&mut self, viewport: Viewport);

    fn viewport(&self) -> Viewport;
}

/// Mount/unmount lifecycle around a scene.
#[derive(Debug)]
pub struct FrameLoop<A> {
    scene: Option<A>,
    frames: u64,
}

impl<A> Default for FrameLoop<A> {
    fn default() -> Self {
        FrameLoop {
            scene: None,
            frames: 0,
        }
    }
}

impl<A: Animate> FrameLoop<A> {
    pub fn mount(&mut self, scene: A) {
        self.scene = Some(scene);
    }

    pub fn unmount(&mut self) {
        if self.scene.take().is_some() {
            tracing::debug!(frames = self.frames, "frame loop unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.scene.is_some()
    }

    /// Produces one frame. Returns `false` once the loop has been unmounted.
    pub fn tick(&mut self, clock: f64) -> bool {
        match self.scene.as_mut() {
            Some(scene) => {
                scene.advance(clock);
                self.frames += 1;
                true
            }
            None => false,
        }
    }

    /// Follows the canvas size. Layout is kept, only dimensions change.
    pub fn resize(&mut self, viewport: Viewport) {
        if let Some(scene) = self.scene.as_mut() {
            if scene.viewport() != viewport {
                scene.resize(viewport);
            }
        }
    }

    pub fn scene(&self) -> Option<&A> {
        self.scene.as_ref()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub vx: f64,
    pub vy: f64,
}

impl Particle {
    fn random<R: Rng>(viewport: Viewport, rng: &mut R) -> Self {
        Particle {
            x: rng.gen::<f64>() * viewport.width,
            y: rng.gen::<f64>() * viewport.height,
            radius: rng.gen::<f64>() * 2.0 + 1.0,
            vx: (rng.gen::<f64>() - 0.5) * 0.2,
            vy: (rng.gen::<f64>() - 0.5) * 0.2,
        }
    }

    fn step(&mut self, viewport: Viewport) {
        self.x += self.vx;
        self.y += self.vy;
        if (self.x < 0.0 && self.vx < 0.0) || (self.x > viewport.width && self.vx > 0.0) {
            self.vx = -self.vx;
        }
        if (self.y < 0.0 && self.vy < 0.0) || (self.y > viewport.height && self.vy > 0.0) {
            self.vy = -self.vy;
        }
    }
}

/// Background of slowly drifting dots. One step per frame.
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    viewport: Viewport,
    theme: Theme,
}

impl ParticleField {
    pub fn new<R: Rng>(count: usize, viewport: Viewport, theme: Theme, rng: &mut R) -> Self {
        let particles = (0..count).map(|_| Particle::random(viewport, rng)).collect();
        ParticleField {
            particles,
            viewport,
            theme,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }
}

impl Animate for ParticleField {
    fn advance(&mut self, _clock: f64) {
        let viewport = self.viewport;
        for particle in &mut self.particles {
            particle.step(viewport);
        }
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub entry_id: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub color: Color,
    pub offset: f64,
}

/// Where a bubble is drawn at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BubbleFrame {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Bubble {
    pub fn frame(&self, clock: f64) -> BubbleFrame {
        let wave = (clock + self.offset).sin();
        BubbleFrame {
            x: self.x,
            y: self.y + wave * BUBBLE_BOB,
            radius: BUBBLE_SIZE + wave * BUBBLE_PULSE,
        }
    }
}

/// What the galaxy layout was built from. A change means a fresh layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalaxyKey {
    ids: Vec<String>,
    theme: Theme,
}

impl GalaxyKey {
    pub fn new(entries: &[&DreamEntry], theme: Theme) -> Self {
        GalaxyKey {
            ids: entries
                .iter()
                .take(GALAXY_CAPACITY)
                .map(|e| e.id.clone())
                .collect(),
            theme,
        }
    }
}

/// Up to ten dream bubbles on a ring, bobbing and pulsing over time.
#[derive(Debug, Clone)]
pub struct Galaxy {
    bubbles: Vec<Bubble>,
    viewport: Viewport,
    key: GalaxyKey,
    clock: f64,
}

impl Galaxy {
    pub fn new<R: Rng>(entries: &[&DreamEntry], theme: Theme, viewport: Viewport, rng: &mut R) -> Self {
        let bubbles = entries
            .iter()
            .take(GALAXY_CAPACITY)
            .map(|entry| Bubble {
                entry_id: entry.id.clone(),
                label: entry.title.chars().take(BUBBLE_LABEL_CHARS).collect(),
                x: 0.0,
                y: 0.0,
                color: theme.mood(entry.mood).accent,
                offset: rng.gen::<f64>() * 100.0,
            })
            .collect();
        let mut galaxy = Galaxy {
            bubbles,
            viewport,
            key: GalaxyKey::new(entries, theme),
            clock: 0.0,
        };
        galaxy.place();
        galaxy
    }

    fn place(&mut self) {
        let count = self.bubbles.len() as f64;
        let ring = self.viewport.width.min(self.viewport.height) * 0.3;
        let (cx, cy) = (self.viewport.width / 2.0, self.viewport.height / 2.0);
        for (i, bubble) in self.bubbles.iter_mut().enumerate() {
            let angle = i as f64 / count * TAU;
            bubble.x = cx + angle.cos() * ring;
            bubble.y = cy + angle.sin() * ring;
        }
    }

    pub fn key(&self) -> &GalaxyKey {
        &self.key
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    /// Seconds since startup at the last advance.
    pub fn clock(&self) -> f64 {
        self.clock
    }
}

impl Animate for Galaxy {
    fn advance(&mut self, clock: f64) {
        self.clock = clock;
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.place();
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}

/// Reveals text one character every 50 ms, restarting whenever the text changes.
#[derive(Debug, Clone, Default)]
pub struct Typewriter {
    text: String,
    started: f64,
    shown: usize,
}

impl Typewriter {
    pub fn set_text(&mut self, text: &str, clock: f64) {
        if self.text != text {
            self.text = text.to_owned();
            self.started = clock;
            self.shown = 0;
        }
    }

    pub fn advance(&mut self, clock: f64) {
        let steps = ((clock - self.started) / TYPEWRITER_STEP_SECS).floor().max(0.0) as usize;
        self.shown = steps.min(self.text.chars().count());
    }

    pub fn visible(&self) -> &str {
        match self.text.char_indices().nth(self.shown) {
            Some((end, _)) => &self.text[..end],
            None => &self.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dream_state::DreamState;
    use chrono::NaiveDate;
    use rand::{rngs::StdRng, SeedableRng};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn particles_start_inside_with_small_velocity() {
        let viewport = Viewport::new(200.0, 100.0);
        let field = ParticleField::new(PARTICLE_COUNT, viewport, Theme::Dark, &mut rng());
        assert_eq!(field.particles().len(), PARTICLE_COUNT);
        for p in field.particles() {
            assert!((0.0..200.0).contains(&p.x));
            assert!((0.0..100.0).contains(&p.y));
            assert!((1.0..3.0).contains(&p.radius));
            assert!(p.vx.abs() <= 0.1 && p.vy.abs() <= 0.1);
        }
    }

    #[test]
    fn particle_reflects_off_edges() {
        let viewport = Viewport::new(10.0, 10.0);
        let mut p = Particle {
            x: 9.95,
            y: 0.05,
            radius: 1.0,
            vx: 0.1,
            vy: -0.1,
        };
        p.step(viewport);
        assert!(p.vx < 0.0 && p.vy > 0.0);
        p.step(viewport);
        assert!(p.x < 10.0 && p.y > 0.0);
    }

    #[test]
    fn particles_stay_near_canvas_over_many_frames() {
        let viewport = Viewport::new(40.0, 20.0);
        let mut field = ParticleField::new(50, viewport, Theme::Light, &mut rng());
        for frame in 0..5_000 {
            field.advance(frame as f64);
        }
        for p in field.particles() {
            assert!(p.x > -0.2 && p.x < 40.2, "x = {}", p.x);
            assert!(p.y > -0.2 && p.y < 20.2, "y = {}", p.y);
        }
    }

    #[test]
    fn unmounted_loop_produces_no_frames() {
        let mut frames = FrameLoop::default();
        assert!(!frames.tick(0.0));
        frames.mount(ParticleField::new(3, Viewport::new(10.0, 10.0), Theme::Dark, &mut rng()));
        assert!(frames.tick(0.1));
        assert!(frames.tick(0.2));
        frames.unmount();
        assert!(!frames.is_mounted());
        for i in 0..10 {
            assert!(!frames.tick(1.0 + i as f64));
        }
        assert_eq!(frames.frames(), 2);
    }

    #[test]
    fn galaxy_is_capped_and_placed_on_a_ring() {
        let mut state = DreamState::seeded();
        for i in 0..12 {
            let entry = DreamEntry::new(
                format!("A rather long dream title {i}"),
                "content",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                crate::dream_entry::Mood::Calm,
                5,
            );
            state.add_entry(entry);
        }
        let entries = state.filter_entries("");
        let viewport = Viewport::new(200.0, 100.0);
        let galaxy = Galaxy::new(&entries, Theme::Dark, viewport, &mut rng());

        assert_eq!(galaxy.bubbles().len(), GALAXY_CAPACITY);
        for bubble in galaxy.bubbles() {
            let distance = ((bubble.x - 100.0).powi(2) + (bubble.y - 50.0).powi(2)).sqrt();
            assert!((distance - 30.0).abs() < 1e-9);
            assert!(bubble.label.chars().count() <= BUBBLE_LABEL_CHARS);
            assert!((0.0..100.0).contains(&bubble.offset));
        }
        assert_eq!(galaxy.bubbles()[0].x, 130.0);
    }

    #[test]
    fn bubble_bobs_and_pulses() {
        let bubble = Bubble {
            entry_id: "1".into(),
            label: "x".into(),
            x: 10.0,
            y: 20.0,
            color: Color::Reset,
            offset: 0.0,
        };
        let rest = bubble.frame(0.0);
        assert_eq!(rest, BubbleFrame { x: 10.0, y: 20.0, radius: 12.0 });
        let peak = bubble.frame(std::f64::consts::FRAC_PI_2);
        assert!((peak.y - 35.0).abs() < 1e-9);
        assert!((peak.radius - 15.0).abs() < 1e-9);
    }

    #[test]
    fn galaxy_key_tracks_entries_and_theme() {
        let state = DreamState::seeded();
        let all = state.filter_entries("");
        let ocean = state.filter_entries("ocean");
        assert_eq!(GalaxyKey::new(&all, Theme::Dark), GalaxyKey::new(&all, Theme::Dark));
        assert_ne!(GalaxyKey::new(&all, Theme::Dark), GalaxyKey::new(&all, Theme::Light));
        assert_ne!(GalaxyKey::new(&all, Theme::Dark), GalaxyKey::new(&ocean, Theme::Dark));
    }

    #[test]
    fn galaxy_resize_recenters_ring() {
        let state = DreamState::seeded();
        let entries = state.filter_entries("");
        let mut frames = FrameLoop::default();
        frames.mount(Galaxy::new(&entries, Theme::Dark, Viewport::new(100.0, 100.0), &mut rng()));
        frames.resize(Viewport::new(400.0, 200.0));
        let galaxy = frames.scene().unwrap();
        assert_eq!(galaxy.viewport(), Viewport::new(400.0, 200.0));
        assert_eq!(galaxy.bubbles()[0].x, 260.0);
        assert_eq!(galaxy.bubbles()[0].y, 100.0);
    }

    #[test]
    fn typewriter_reveals_and_restarts() {
        let mut tw = Typewriter::default();
        tw.set_text("dream", 1.0);
        tw.advance(1.0);
        assert_eq!(tw.visible(), "");
        tw.advance(1.12);
        assert_eq!(tw.visible(), "dr");
        tw.advance(5.0);
        assert_eq!(tw.visible(), "dream");

        tw.set_text("dreams", 5.0);
        tw.advance(5.06);
        assert_eq!(tw.visible(), "d");

        tw.set_text("dreams", 6.0);
        tw.advance(6.0);
        assert_eq!(tw.visible(), "dreams");
    }
}
