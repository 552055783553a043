//! Nova Waves entry point
//!
//! Runs one headless level: `nova-waves <content-dir> [save-dir]`.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::sync::Arc;

    use glam::Vec2;
    use nova_waves::content::DefinitionStore;
    use nova_waves::error::Result;
    use nova_waves::persistence::{self, LoadOutcome};
    use nova_waves::platform::{DirStorage, LogAlerts, ResourceCache, TouchKind};
    use nova_waves::settings::Settings;
    use nova_waves::sim::states::{PAUSE_MENU_SCENE, card_name};
    use nova_waves::sim::{
        CombatWorld, FrameOutcome, GameContext, LevelGenerator, LevelUpdater, StateName, level_path,
        write_level,
    };

    /// Frames simulated before giving up (10 minutes at 60 fps)
    const FRAME_CAP: u32 = 36_000;
    const FRAME_DT: f32 = 1.0 / 60.0;

    pub fn run(content_dir: &str, save_dir: &str) -> Result<FrameOutcome> {
        let content = DirStorage::new(content_dir);
        let saves = DirStorage::new(save_dir);
        let settings = Settings::load(&saves);

        let mut store =
            DefinitionStore::load_all(&content, &settings.player_type, &[PAUSE_MENU_SCENE])?;
        if !store.warnings().is_empty() {
            log::warn!("Content loaded with {} warning(s)", store.warnings().len());
        }

        let mut game = GameContext::new(0);
        let outcome =
            persistence::load_from_save(&mut game, &saves, &store, &settings, &mut LogAlerts)?;
        if outcome != LoadOutcome::Loaded {
            log::info!("Run {:?} with seed {}", outcome, game.seed);
        }

        let coord = game.map_coord;
        let level = LevelGenerator::new(store.wave_blocks(), &settings).generate(
            coord,
            game.node_type,
            game.map_level,
            &mut game.level_rng(coord),
        );
        write_level(&saves, coord, &level)?;
        let level = store.load_level(&saves, &level_path(coord))?;
        game.start_level(level);

        let world = CombatWorld::new(
            Arc::new(store),
            game,
            Box::new(ResourceCache::new()),
            Arc::new(settings),
        );
        let mut updater = LevelUpdater::new(world)?;
        updater.start()?;

        let mut result = FrameOutcome::Running;
        for frame in 0..FRAME_CAP {
            if updater.states().top() == Some(StateName::UpgradeSelection) {
                // No player at the keyboard: always take the first card
                let card = updater.world.scene.get(&card_name(0)).map(|c| c.position);
                if let Some(p) = card {
                    updater.world.input.push(TouchKind::Down, Vec2::new(p.x, p.y));
                }
            }
            result = updater.update(FRAME_DT)?;
            if result != FrameOutcome::Running {
                log::info!("Level ended after {} frames", frame + 1);
                break;
            }
        }

        let world = &updater.world;
        match result {
            FrameOutcome::Running => {
                log::warn!("Frame cap reached on wave {}", world.game.current_wave + 1)
            }
            FrameOutcome::LevelCleared => log::info!(
                "Level {} cleared with {:.1}/{:.1} health",
                world.game.map_coord.id(),
                world.game.player.current_health,
                world.game.player.max_health
            ),
            FrameOutcome::PlayerDefeated => log::info!("Player defeated"),
        }
        persistence::build_save(&world.game, &saves, &world.settings)?;
        Ok(result)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let Some(content_dir) = args.get(1) else {
        eprintln!("usage: nova-waves <content-dir> [save-dir]");
        return std::process::ExitCode::from(2);
    };
    let save_dir = args.get(2).unwrap_or(content_dir);
    log::info!("Nova Waves (headless) starting...");

    match headless::run(content_dir, save_dir) {
        Ok(outcome) => {
            log::info!("Outcome: {:?}", outcome);
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Fatal: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The host embeds the library directly on the web
}
