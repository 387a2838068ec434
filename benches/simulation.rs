//! Tick throughput benchmarks
//!
//! Run with: cargo bench --bench simulation

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tank_duel::game::game_loop::{GameLoop, GameLoopConfig};
use tank_duel::game::input::HeldControls;
use tank_duel::game::state::{GameState, RoundPhase};
use tank_duel::game::systems::arena;
use tank_duel::net::protocol::{decode, encode, NetMessage, StateMessage};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn active_loop(seed: u64) -> GameLoop {
    let mut game = GameLoop::new(GameLoopConfig {
        seed: Some(seed),
        ..Default::default()
    });
    game.state_mut().round.phase = RoundPhase::Active;
    game
}

fn bench_tick(c: &mut Criterion) {
    // Both players circle and fire on alternating ticks
    let patterns = [
        HeldControls { up: true, right: true, fire: true, ..Default::default() },
        HeldControls { down: true, left: true, ..Default::default() },
    ];

    c.bench_function("tick_active", |b| {
        let mut game = active_loop(1);
        let mut i = 0usize;
        b.iter(|| {
            let controls = &patterns[i % 2];
            i += 1;
            black_box(game.tick(controls, controls));
            if game.state().round.phase != RoundPhase::Active {
                game.state_mut().round.phase = RoundPhase::Active;
                for v in game.state_mut().vehicles.iter_mut() {
                    v.alive = true;
                }
            }
        })
    });
}

fn bench_wall_generation(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    c.bench_function("generate_walls", |b| {
        b.iter(|| black_box(arena::generate_walls(&mut rng)))
    });
}

fn bench_snapshot_codec(c: &mut Criterion) {
    let mut state = GameState::with_seed(3);
    arena::reset_round(&mut state);
    let message = NetMessage::State(StateMessage::from_game_state(&state));

    c.bench_function("snapshot_encode", |b| {
        b.iter(|| black_box(encode(black_box(&message))))
    });

    let bytes = encode(&message).unwrap_or_default();
    c.bench_function("snapshot_decode", |b| {
        b.iter(|| black_box(decode(black_box(&bytes))))
    });
}

criterion_group!(benches, bench_tick, bench_wall_generation, bench_snapshot_codec);
criterion_main!(benches);
