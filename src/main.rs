/// Entry point and frame loop.

mod config;
mod domain;
mod error;
mod logging;
mod net;
mod sim;
mod ui;

use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::{error, info, warn};

use config::AppConfig;
use domain::level::{Direction, LevelCatalog};
use error::AppError;
use net::LoopbackNetwork;
use sim::progress::{save_dir, ProgressFile};
use sim::world::{AppState, Phase, SelectKind};
use ui::input::InputState;
use ui::renderer::Renderer;

const MESSAGE_TIME: Duration = Duration::from_secs(3);

fn main() {
    let config = AppConfig::load();

    let _log_guard = match logging::init(&save_dir(), &config.general.log_level) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: {e}");
            None
        }
    };
    info!(version = env!("CARGO_PKG_VERSION"), "starting");

    if let Err(e) = run(&config) {
        error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(config: &AppConfig) -> Result<(), AppError> {
    let catalog = Rc::new(load_catalog(config)?);
    info!(levels = catalog.len(), "catalog ready");

    let mut progress = ProgressFile::open_default();
    let mut network = LoopbackNetwork::new();
    let mut app = AppState::new(catalog, config, &progress);

    let mut renderer = Renderer::new();
    renderer.init()?;

    let result = game_loop(&mut app, &mut renderer, &mut progress, &mut network, config);

    if let Err(e) = renderer.cleanup() {
        warn!("terminal cleanup failed: {e}");
    }
    result
}

fn load_catalog(config: &AppConfig) -> Result<LevelCatalog, AppError> {
    let Some(path) = &config.general.catalog else {
        return Ok(LevelCatalog::builtin());
    };
    let text = std::fs::read_to_string(path).map_err(|source| AppError::CatalogRead {
        path: path.clone(),
        source,
    })?;
    LevelCatalog::from_toml(&text).map_err(|source| AppError::Catalog {
        path: path.clone(),
        source,
    })
}

fn game_loop(
    app: &mut AppState,
    renderer: &mut Renderer,
    progress: &mut ProgressFile,
    network: &mut LoopbackNetwork,
    config: &AppConfig,
) -> Result<(), AppError> {
    let mut kb = InputState::new();
    let mut last_frame = Instant::now();
    let mut events = Vec::new();

    loop {
        // Input first, then the frame tick.
        kb.drain_events()?;
        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_input(app, &kb, progress, network, &mut events) {
            break;
        }
        app.apply(&mut events);

        let now = Instant::now();
        let delta = now.duration_since(last_frame);
        last_frame = now;

        if app.selecter().is_visible() {
            app.selecter_mut().tick(delta, network, &mut events);
            app.apply(&mut events);
        }
        if let Some(map) = app.tick_screens(delta, config.general.cutscene) {
            app.phase = Phase::Loading { map };
        }
        network.expire(now);

        renderer.render(app, network)?;
        std::thread::sleep(config.general.frame);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

/// Returns true when the player asked to quit.
fn handle_input(
    app: &mut AppState,
    kb: &InputState,
    progress: &mut ProgressFile,
    network: &mut LoopbackNetwork,
    events: &mut Vec<sim::event::ViewEvent>,
) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM);
    let esc = kb.was_pressed(KeyCode::Esc);

    match &app.phase {
        // ── Title Screen ──
        Phase::Title => {
            if kb.was_pressed(KeyCode::Char('1')) {
                progress.reload();
                app.open_select(SelectKind::Single, &*progress);
            } else if kb.was_pressed(KeyCode::Char('2')) {
                progress.reload();
                app.open_select(SelectKind::Multi, &*progress);
            } else if kb.any_pressed(KEYS_QUIT) || esc {
                return true;
            }
        }

        // ── Level Select ──
        Phase::LevelSelect => {
            // Rejected moves leave the screen as it is.
            if kb.any_pressed(KEYS_LEFT) {
                let _ = app.selecter_mut().navigate(Direction::Previous, &*progress, events);
            } else if kb.any_pressed(KEYS_RIGHT) {
                let _ = app.selecter_mut().navigate(Direction::Next, &*progress, events);
            } else if confirm {
                app.selecter_mut().start(network, events);
                if app.selecter().is_multiplayer() {
                    app.set_message("Registration sent", MESSAGE_TIME);
                }
            } else if esc {
                app.selecter_mut().back(network, events);
            }
        }

        // ── Cutscene ──
        Phase::Cutscene { map, .. } => {
            if confirm || esc {
                app.phase = Phase::Loading { map: map.clone() };
            }
        }

        // ── Loading / playing stand-in ──
        Phase::Loading { map } => {
            let map = map.clone();
            if confirm {
                let cleared = app.selecter().catalog().by_map_reference(&map).map(|l| l.ordinal);
                match cleared {
                    Some(ordinal) => clear_level(app, progress, ordinal),
                    None => warn!(%map, "finished map has no catalog entry"),
                }
                app.phase = Phase::Title;
            } else if esc {
                app.phase = Phase::Title;
            }
        }
    }

    false
}

/// Unlock the level after `ordinal` once it has been beaten.
fn clear_level(app: &mut AppState, progress: &mut ProgressFile, ordinal: usize) {
    let next = ordinal + 1;
    if next >= app.selecter().catalog().len() {
        app.set_message("All levels cleared!", MESSAGE_TIME);
        return;
    }
    match progress.unlock(next) {
        Ok(()) => {
            info!(unlocked = next, "progress saved");
            app.set_message("Next level unlocked", MESSAGE_TIME);
        }
        Err(e) => {
            error!("{e}");
            app.set_message("Saving progress failed!", MESSAGE_TIME);
        }
    }
}
