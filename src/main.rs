use std::time::Duration;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use tank_duel::config::GameConfig;
use tank_duel::game::constants::sim;
use tank_duel::game::game_loop::{GameLoop, GameLoopEvent, LoopMode};
use tank_duel::game::input::HeldControls;
use tank_duel::game::match_result::determine_result;
use tank_duel::game::systems::projectile::HitEvent;
use tank_duel::game::systems::round::RoundEvent;
use tank_duel::net::{resolve_host, NetSync};

/// Ticks between periodic stats lines
const STATS_INTERVAL_TICKS: u64 = sim::secs_to_ticks(30) as u64;

/// Headless runs restart a finished match after this long
const MATCH_RESTART_DELAY_TICKS: u64 = sim::secs_to_ticks(3) as u64;

#[derive(Debug, Parser)]
#[command(name = "tank-duel", version, about = "Two-tank arena duel (headless driver)")]
struct Cli {
    /// Host a networked match
    #[arg(long, conflicts_with = "join")]
    host: bool,

    /// Join a host at ADDR (ip, ip:port or hostname)
    #[arg(long, value_name = "ADDR")]
    join: Option<String>,

    /// Port to host on, or the host's port when joining
    #[arg(long)]
    port: Option<u16>,

    /// Disable networking entirely
    #[arg(long, conflicts_with_all = ["host", "join"])]
    safe: bool,

    /// Fixed RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many ticks (0 runs until Ctrl-C)
    #[arg(long, default_value_t = 0)]
    ticks: u64,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .init();

    info!("Tank Duel v{}", env!("CARGO_PKG_VERSION"));

    let mut config = GameConfig::load_or_default();
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config.validate().map_err(anyhow::Error::msg)?;

    let mut game = build_game(&cli, &config);
    info!("Running in {:?} mode at {} Hz", game.mode(), sim::TICK_RATE);

    run(&mut game, cli.ticks).await;

    let [one, two] = game.state().scores();
    info!("Stopped after {} ticks, score {}-{}", game.state().tick, one, two);
    Ok(())
}

/// Pick the loop mode; any network setup failure degrades to local play
fn build_game(cli: &Cli, config: &GameConfig) -> GameLoop {
    let loop_config = config.loop_config();
    if cli.safe {
        return GameLoop::new(loop_config);
    }

    let net = if cli.host {
        NetSync::host(config.bind_addr())
    } else if let Some(addr) = cli.join.as_deref() {
        resolve_host(addr, config.port).and_then(NetSync::client)
    } else {
        return GameLoop::new(loop_config);
    };

    match net {
        Ok(net) => GameLoop::with_network(loop_config, net),
        Err(e) => {
            warn!("Network setup failed ({}); playing locally", e);
            GameLoop::new(loop_config)
        }
    }
}

async fn run(game: &mut GameLoop, max_ticks: u64) {
    let tick_duration = Duration::from_nanos(1_000_000_000 / sim::TICK_RATE as u64);
    let mut ticker = tokio::time::interval(tick_duration);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    // No input devices attached: both controllers stay idle
    let idle = HeldControls::default();
    let mut ticks: u64 = 0;
    let mut restart_at: Option<u64> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Shutdown signal received");
                break;
            }
        }

        let events = game.tick(&idle, &idle);
        for event in &events {
            log_event(game, event);
            if let GameLoopEvent::Round(RoundEvent::MatchOver { .. }) = event {
                restart_at = Some(ticks + MATCH_RESTART_DELAY_TICKS);
            }
        }

        ticks += 1;
        if restart_at.is_some_and(|at| ticks >= at) && game.mode() != LoopMode::Client {
            restart_at = None;
            for event in game.restart_match() {
                log_event(game, &event);
            }
        }
        if ticks % STATS_INTERVAL_TICKS == 0 {
            log_stats(game);
        }
        if max_ticks > 0 && ticks >= max_ticks {
            break;
        }
    }
}

fn log_event(game: &GameLoop, event: &GameLoopEvent) {
    match event {
        GameLoopEvent::Round(RoundEvent::Started) => info!("Round started"),
        GameLoopEvent::Round(RoundEvent::Ended { destroyed }) => {
            let [one, two] = game.state().scores();
            info!("Side {} destroyed, score {}-{}", destroyed.tag(), one, two);
        }
        GameLoopEvent::Round(RoundEvent::MatchOver { winner }) => {
            if let Some(result) = determine_result(game.state()) {
                info!(
                    "Side {} wins the match by {}",
                    winner.tag(),
                    result.margin()
                );
            }
        }
        GameLoopEvent::Round(RoundEvent::ArenaReset) => debug!("Arena regenerated"),
        GameLoopEvent::Round(RoundEvent::MatchRestarted) => info!("New match"),
        GameLoopEvent::Hit(HitEvent::Shielded { target, .. }) => {
            debug!("Shield on side {} absorbed a hit", target.tag())
        }
        GameLoopEvent::Hit(HitEvent::Destroyed { .. }) => {}
        GameLoopEvent::PowerUpSpawned { kind } => debug!("Power-up spawned: {:?}", kind),
        GameLoopEvent::PowerUpCollected(pickup) => {
            debug!("Side {} picked up {:?}", pickup.side.tag(), pickup.kind)
        }
        GameLoopEvent::NetworkLost => warn!("Continuing without network"),
        GameLoopEvent::Fired { .. } | GameLoopEvent::WallDestroyed | GameLoopEvent::SnapshotApplied => {}
    }
}

fn log_stats(game: &GameLoop) {
    let view = game.view();
    info!(
        "Tick {}: phase={:?} score={}-{} walls={} bullets={} powerups={}",
        game.state().tick,
        view.phase,
        view.scores[0],
        view.scores[1],
        view.walls.len(),
        view.bullets.len(),
        view.powerups.len()
    );
    if let Some(metrics) = game.net_metrics() {
        let snap = metrics.snapshot();
        info!(
            "Net: sent={} ({} B) recv={} ({} B) decode_failures={} ignored={} overwritten={}",
            snap.datagrams_sent,
            snap.bytes_sent,
            snap.datagrams_received,
            snap.bytes_received,
            snap.decode_failures,
            snap.ignored,
            snap.overwritten
        );
    }
}
