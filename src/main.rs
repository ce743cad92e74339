// What you SEE:
// • A transparent, always-on-top overlay with a glowing cursor glyph.
// • Behind it a fading line, a trail of stamped images, or particles.
// • Edit the settings file while it runs and the look changes live.
// • ESC quits.

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::time::Instant;

use cursor_trail::config::{Config, OptionValue};
use cursor_trail::driver::AnimationDriver;
use cursor_trail::error::Error;
use cursor_trail::loader::ThreadedLoader;
use cursor_trail::logging;
use cursor_trail::overlay::Overlay;
use cursor_trail::raster::PixmapSurface;
use cursor_trail::settings::{Settings, SettingsWatcher};
use cursor_trail::surface::DrawingSurface;
use cursor_trail::types::FrameBuffer;
use cursor_trail::window::Drawer;

#[derive(Parser)]
#[command(name = "cursor-trail")]
#[command(version)]
#[command(about = "Animated cursor with line, image and particle trails on a transparent overlay", long_about = None)]
struct Cli {
    /// Settings file (default: <config dir>/cursor-trail/config.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override an option, e.g. `--set trailStyle=particles` (repeatable)
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Overlay width in pixels
    #[arg(long, default_value = "1280")]
    width: usize,

    /// Overlay height in pixels
    #[arg(long, default_value = "720")]
    height: usize,

    /// Frames per second (default: from the settings file, else 60)
    #[arg(long)]
    fps: Option<usize>,

    /// Seed for particle randomness
    #[arg(long)]
    seed: Option<u64>,

    /// Verbose logging (honours RUST_LOG)
    #[arg(short, long)]
    debug: bool,
}

fn parse_override(raw: &str) -> Result<(String, OptionValue), Error> {
    let (key, value) = raw.split_once('=').ok_or_else(|| Error::InvalidOption {
        key: raw.to_string(),
        reason: "expected KEY=VALUE".to_string(),
    })?;
    Ok((key.trim().to_string(), OptionValue::infer(value)))
}

fn main() -> Result<(), Error> {
    let cli = Cli::parse();

    /* --- Settings + logging --- */
    let path = cli.config.clone().unwrap_or_else(Settings::config_path);
    let settings = Settings::load(&path)?;
    logging::init(cli.debug || settings.app.debug);
    tracing::info!(settings = %path.display(), "Starting cursor overlay");

    let overrides = cli.set.iter().map(|s| parse_override(s)).collect::<Result<Vec<_>, _>>()?;
    let fps = cli.fps.unwrap_or(settings.app.target_fps).max(1);
    let rng = match cli.seed.or(settings.app.seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    /* --- Overlay + window ---
       Visual: a transparent window opens; nothing drawn until the pointer enters. */
    let loader = ThreadedLoader::new(settings.app.asset_root.clone());
    let mut overlay = Overlay::new(Config::default(), rng, Box::new(loader));
    let mut drawer = Drawer::new("cursor-trail", cli.width, cli.height, fps)?;

    for (key, value) in settings.cursor_options() {
        if let Err(e) = overlay.apply_change(&key, value, &mut drawer) {
            tracing::warn!("Settings file: {e}");
        }
    }
    for (key, value) in overrides {
        overlay.apply_change(&key, value, &mut drawer)?;
    }
    overlay.sync_host(&mut drawer);

    let mut watcher = SettingsWatcher::new(path, settings.cursor);

    /* --- Drawing surface + frame buffer (reused every frame) --- */
    let (w, h) = drawer.size();
    let mut surface = PixmapSurface::new(w as u32, h as u32)?;
    let mut screen = FrameBuffer::new(w, h);

    let mut driver = AnimationDriver::new();
    let handle = driver.setup();
    let mut last_pointer: Option<(f32, f32)> = None;

    /* ------------------------------ Main loop ------------------------------ */
    while handle.is_running() {
        if !drawer.is_open() || drawer.esc_pressed() {
            handle.stop();
            break;
        }

        // 1) Follow window resizes (a minimized window reports 0x0: keep the surface)
        let (w, h) = drawer.size();
        if w > 0 && h > 0 && (w as u32, h as u32) != surface.size() {
            surface.resize(w as u32, h as u32);
        }

        // 2) Pointer moves (only real moves count, like a mousemove event)
        let pointer = drawer.mouse_pos();
        if let Some((x, y)) = pointer {
            if pointer != last_pointer {
                overlay.on_pointer_move(x, y);
            }
        }
        last_pointer = pointer;

        // 3) Live settings edits
        for (key, value) in watcher.poll(Instant::now()) {
            if let Err(e) = overlay.apply_change(&key, value, &mut drawer) {
                tracing::warn!("Settings file: {e}");
            }
        }

        // 4) Draw and present
        driver.tick(&mut overlay, Some(&mut surface));
        surface.write_to(&mut screen);
        drawer.present(&screen)?;
    }

    tracing::info!(frames = driver.ticks(), "Overlay closed");
    Ok(())
}
