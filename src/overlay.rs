//! The overlay context: everything one running cursor overlay owns.
//!
//! Pointer moves and option changes land here; the [`crate::driver`] reads it
//! once per tick to draw a frame.

use rand::rngs::StdRng;

use crate::color::Color;
use crate::config::{Config, ConfigBridge, OptionKey, OptionValue, TrailStyle};
use crate::error::Error;
use crate::history::TrailHistory;
use crate::loader::{ImageLoader, ImageTarget};
use crate::particles::{ColorPolicy, ParticleSystem};
use crate::types::{Bitmap, Point};

/// Hue advance per tick, in degrees.
pub const HUE_STEP: f32 = 2.0;

/// What the overlay asks of whoever shows it on screen.
pub trait Host {
    /// Hide (or show again) the native mouse pointer.
    fn set_system_cursor_hidden(&mut self, hidden: bool);
    /// Show or hide the overlay surface itself.
    fn set_overlay_visible(&mut self, visible: bool);
}

/// A configured image source plus whatever has been loaded for it.
#[derive(Debug, Default)]
pub struct ImageSlot {
    source: String,
    bitmap: Option<Bitmap>,
    failed: bool, // last load of `source` failed; retried on the next change
}

impl ImageSlot {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn bitmap(&self) -> Option<&Bitmap> {
        self.bitmap.as_ref()
    }
}

pub struct Overlay {
    config: ConfigBridge,
    pub(crate) pointer: Point,
    pub(crate) hue: f32,
    pub(crate) history: TrailHistory,
    pub(crate) particles: ParticleSystem,
    cursor_image: ImageSlot,
    trail_image: ImageSlot,
    loader: Box<dyn ImageLoader>,
}

impl Overlay {
    /// Build the context for `config` and kick off its image loads.
    pub fn new(config: Config, rng: StdRng, loader: Box<dyn ImageLoader>) -> Self {
        let mut overlay = Self {
            history: TrailHistory::new(config.trail_length),
            config: ConfigBridge::new(config),
            pointer: Point::OFFSCREEN,
            hue: 0.0,
            particles: ParticleSystem::new(rng),
            cursor_image: ImageSlot::default(),
            trail_image: ImageSlot::default(),
            loader,
        };
        overlay.refresh_images();
        overlay
    }

    pub fn config(&self) -> &Config {
        self.config.snapshot()
    }

    pub fn pointer(&self) -> Point {
        self.pointer
    }

    pub fn hue(&self) -> f32 {
        self.hue
    }

    pub fn history(&self) -> &TrailHistory {
        &self.history
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn cursor_image(&self) -> &ImageSlot {
        &self.cursor_image
    }

    pub fn trail_image(&self) -> &ImageSlot {
        &self.trail_image
    }

    /// Push the visibility state implied by the current snapshot to `host`.
    pub fn sync_host(&self, host: &mut dyn Host) {
        let cfg = self.config();
        host.set_system_cursor_hidden(cfg.hides_system_cursor());
        host.set_overlay_visible(cfg.enable);
    }

    /// Record the new pointer position. With the particle trail active,
    /// every move leaves a burst of particles behind.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.pointer = Point::new(x, y);

        let cfg = self.config.snapshot();
        if cfg.enable && cfg.trail_style == TrailStyle::Particles {
            let policy = ColorPolicy {
                trail_color: cfg.trail_color().and_then(Color::parse),
                base_color: cfg.base_color_value(),
                rainbow: cfg.rainbow_mode,
            };
            self.particles.spawn(x, y, cfg.particle_preset, &policy);
        }
    }

    /// Apply one option change and its side effects: history capacity,
    /// host visibility and both image loads. A rejected value leaves
    /// everything as it was.
    pub fn apply_change(&mut self, key: &str, value: OptionValue, host: &mut dyn Host) -> Result<OptionKey, Error> {
        let key = self.config.apply_change(key, value)?;

        let capacity = self.config().trail_length;
        self.history.set_capacity(capacity);
        self.sync_host(host);
        self.refresh_images();
        Ok(key)
    }

    /// Request loads for image sources that changed, and retry sources whose
    /// last load failed. An empty source drops the bitmap at once; a new one
    /// keeps the old bitmap until it resolves.
    fn refresh_images(&mut self) {
        let cfg = self.config.snapshot();
        let wanted = [
            (ImageTarget::Cursor, cfg.cursor_image.clone()),
            (ImageTarget::Trail, cfg.trail_image.clone()),
        ];

        for (target, source) in wanted {
            let slot = match target {
                ImageTarget::Cursor => &mut self.cursor_image,
                ImageTarget::Trail => &mut self.trail_image,
            };
            if slot.source == source && !slot.failed {
                continue;
            }
            slot.source = source;
            slot.failed = false;
            if slot.source.is_empty() {
                slot.bitmap = None;
            } else {
                self.loader.request(target, &slot.source);
            }
        }
    }

    /// Apply finished loads. A result whose source no longer matches the
    /// slot is stale and dropped.
    pub fn poll_loads(&mut self) {
        for done in self.loader.completed() {
            let slot = match done.target {
                ImageTarget::Cursor => &mut self.cursor_image,
                ImageTarget::Trail => &mut self.trail_image,
            };
            if slot.source != done.source {
                tracing::debug!(target_slot = ?done.target, source = %done.source, "Discarding stale image load");
                continue;
            }
            match done.outcome {
                Ok(bitmap) => {
                    tracing::debug!(target_slot = ?done.target, source = %done.source, "Image loaded");
                    slot.bitmap = Some(bitmap);
                    slot.failed = false;
                }
                Err(e) => {
                    tracing::warn!(target_slot = ?done.target, "Failed to load image: {e}");
                    slot.bitmap = None;
                    slot.failed = true;
                }
            }
        }
    }

    /// One tick of color cycling.
    pub(crate) fn advance_hue(&mut self) {
        self.hue = (self.hue + HUE_STEP) % 360.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LoadResult;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tiny_skia::Pixmap;

    #[derive(Default)]
    struct Queue {
        requests: Vec<(ImageTarget, String)>,
        ready: Vec<LoadResult>,
    }

    struct SharedLoader(Rc<RefCell<Queue>>);

    impl ImageLoader for SharedLoader {
        fn request(&mut self, target: ImageTarget, source: &str) {
            self.0.borrow_mut().requests.push((target, source.to_string()));
        }

        fn completed(&mut self) -> Vec<LoadResult> {
            std::mem::take(&mut self.0.borrow_mut().ready)
        }
    }

    #[derive(Default)]
    struct NullHost {
        hidden: Vec<bool>,
        visible: Vec<bool>,
    }

    impl Host for NullHost {
        fn set_system_cursor_hidden(&mut self, hidden: bool) {
            self.hidden.push(hidden);
        }
        fn set_overlay_visible(&mut self, visible: bool) {
            self.visible.push(visible);
        }
    }

    fn overlay(config: Config) -> (Overlay, Rc<RefCell<Queue>>) {
        let queue = Rc::new(RefCell::new(Queue::default()));
        let o = Overlay::new(config, StdRng::seed_from_u64(3), Box::new(SharedLoader(queue.clone())));
        (o, queue)
    }

    fn bitmap() -> Bitmap {
        Bitmap::new(Pixmap::new(4, 4).unwrap())
    }

    #[test]
    fn starts_offscreen_with_zero_hue() {
        let (o, queue) = overlay(Config::default());
        assert_eq!(o.pointer(), Point::OFFSCREEN);
        assert_eq!(o.hue(), 0.0);
        assert!(queue.borrow().requests.is_empty());
    }

    #[test]
    fn pointer_move_spawns_only_for_particle_style() {
        let (mut o, _) = overlay(Config::default());
        o.on_pointer_move(10.0, 20.0);
        assert_eq!(o.pointer(), Point::new(10.0, 20.0));
        assert!(o.particles().is_empty());

        let cfg = Config { trail_style: TrailStyle::Particles, ..Config::default() };
        let (mut o, _) = overlay(cfg.clone());
        o.on_pointer_move(10.0, 20.0);
        assert_eq!(o.particles().len(), 3);

        let (mut o, _) = overlay(Config { enable: false, ..cfg });
        o.on_pointer_move(10.0, 20.0);
        assert!(o.particles().is_empty());
    }

    #[test]
    fn hue_wraps_below_360() {
        let (mut o, _) = overlay(Config::default());
        for _ in 0..180 {
            o.advance_hue();
        }
        assert_eq!(o.hue(), 0.0);
        o.advance_hue();
        assert_eq!(o.hue(), 2.0);
    }

    #[test]
    fn change_updates_capacity_and_host() {
        let (mut o, _) = overlay(Config::default());
        let mut host = NullHost::default();

        o.apply_change("hideSystemCursor", true.into(), &mut host).unwrap();
        assert_eq!(host.hidden.last(), Some(&true));

        o.apply_change("enable", false.into(), &mut host).unwrap();
        assert_eq!(host.hidden.last(), Some(&false));
        assert_eq!(host.visible.last(), Some(&false));

        o.apply_change("trailLength", 5i64.into(), &mut host).unwrap();
        assert_eq!(o.history().capacity(), 5);
    }

    #[test]
    fn rejected_change_has_no_side_effects() {
        let (mut o, _) = overlay(Config::default());
        let mut host = NullHost::default();
        assert!(o.apply_change("cursorShape", "hexagon".into(), &mut host).is_err());
        assert!(o.apply_change("nope", true.into(), &mut host).is_err());
        assert!(host.hidden.is_empty() && host.visible.is_empty());
        assert_eq!(o.config(), &Config::default());
    }

    #[test]
    fn loaded_sources_are_not_requested_again() {
        let (mut o, queue) = overlay(Config { cursor_image: "a.png".into(), ..Config::default() });
        let mut host = NullHost::default();
        assert_eq!(queue.borrow().requests, vec![(ImageTarget::Cursor, "a.png".to_string())]);
        // still in flight: not asked for twice
        o.apply_change("cursorSize", 10i64.into(), &mut host).unwrap();
        assert_eq!(queue.borrow().requests.len(), 1);
        queue.borrow_mut().ready.push(LoadResult {
            target: ImageTarget::Cursor,
            source: "a.png".into(),
            outcome: Ok(bitmap()),
        });
        o.poll_loads();

        o.apply_change("cursorSize", 12i64.into(), &mut host).unwrap();
        assert_eq!(queue.borrow().requests.len(), 1);

        o.apply_change("trailImage", "t.png".into(), &mut host).unwrap();
        assert_eq!(queue.borrow().requests.last(), Some(&(ImageTarget::Trail, "t.png".to_string())));
    }

    #[test]
    fn failed_source_is_retried_on_any_change() {
        let (mut o, queue) = overlay(Config { cursor_image: "x.png".into(), ..Config::default() });
        let mut host = NullHost::default();
        queue.borrow_mut().ready.push(LoadResult {
            target: ImageTarget::Cursor,
            source: "x.png".into(),
            outcome: Err(Error::ImageFetch { source_ref: "x.png".into(), reason: "timeout".into() }),
        });
        o.poll_loads();
        assert!(o.cursor_image().bitmap().is_none());

        o.apply_change("cursorSize", 12i64.into(), &mut host).unwrap();
        let cursor_requests = queue.borrow().requests.iter().filter(|(t, _)| *t == ImageTarget::Cursor).count();
        assert_eq!(cursor_requests, 2);
        assert_eq!(o.cursor_image().source(), "x.png");
        // nothing configured for the trail, nothing asked for
        assert!(queue.borrow().requests.iter().all(|(t, _)| *t == ImageTarget::Cursor));
    }

    #[test]
    fn stale_completion_is_discarded() {
        let (mut o, queue) = overlay(Config { cursor_image: "a.png".into(), ..Config::default() });
        let mut host = NullHost::default();
        o.apply_change("cursorImage", "b.png".into(), &mut host).unwrap();

        queue.borrow_mut().ready.push(LoadResult {
            target: ImageTarget::Cursor,
            source: "a.png".into(),
            outcome: Ok(bitmap()),
        });
        o.poll_loads();
        assert!(o.cursor_image().bitmap().is_none());

        queue.borrow_mut().ready.push(LoadResult {
            target: ImageTarget::Cursor,
            source: "b.png".into(),
            outcome: Ok(bitmap()),
        });
        o.poll_loads();
        assert!(o.cursor_image().bitmap().is_some());
    }

    #[test]
    fn failure_and_clearing_drop_the_bitmap() {
        let (mut o, queue) = overlay(Config { trail_image: "t.png".into(), ..Config::default() });
        let mut host = NullHost::default();
        queue.borrow_mut().ready.push(LoadResult {
            target: ImageTarget::Trail,
            source: "t.png".into(),
            outcome: Ok(bitmap()),
        });
        o.poll_loads();
        assert!(o.trail_image().bitmap().is_some());

        o.apply_change("trailImage", "".into(), &mut host).unwrap();
        assert!(o.trail_image().bitmap().is_none());

        o.apply_change("trailImage", "broken.png".into(), &mut host).unwrap();
        queue.borrow_mut().ready.push(LoadResult {
            target: ImageTarget::Trail,
            source: "broken.png".into(),
            outcome: Err(Error::ImageDecode { source_ref: "broken.png".into(), reason: "bad".into() }),
        });
        o.poll_loads();
        assert!(o.trail_image().bitmap().is_none());
    }
}
