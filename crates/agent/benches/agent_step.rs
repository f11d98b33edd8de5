//! Benchmarks for the learning loop
//!
//! Run with: cargo bench --package agent

use agent::{Agent, AgentConfig};
use catalog::{Movie, MovieCatalog};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use environment::{Action, EnvironmentConfig, EpisodeController};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

const GENRES: [&str; 5] = ["Action", "Comedy", "Drama", "Horror", "Romance"];

fn synthetic_catalog(size: u32) -> MovieCatalog {
    MovieCatalog::from_movies((1..=size).map(|id| {
        let first = GENRES[id as usize % GENRES.len()];
        let second = GENRES[(id as usize / 7) % GENRES.len()];
        Movie::new(id, 100_000 + id, format!("Movie {}", id), [first, second])
            .with_ratings(3.5 * (id % 40) as f64, id % 40)
    }))
}

fn create_agent(size: u32) -> Agent {
    let controller = EpisodeController::new(
        Arc::new(synthetic_catalog(size)),
        EnvironmentConfig::default(),
    )
    .unwrap();
    let config = AgentConfig {
        learning_rate: 0.1,
        epsilon: 1.0,
        epsilon_decay: 1e-4,
        epsilon_floor: 0.1,
        discount: 0.95,
        likeness: GENRES.iter().map(|g| (g.to_string(), 0.2)).collect(),
    };
    Agent::with_rng(&config, controller, StdRng::seed_from_u64(42)).unwrap()
}

fn bench_training_episode(c: &mut Criterion) {
    let mut agent = create_agent(10_000);

    c.bench_function("run_autonomous_1_episode", |b| {
        b.iter(|| {
            let summary = agent.run_autonomous(black_box(1)).unwrap();
            black_box(summary)
        })
    });
}

fn bench_interactive_step(c: &mut Criterion) {
    let mut agent = create_agent(10_000);
    agent.run_interactive(Action::Upvote).unwrap();

    c.bench_function("run_interactive_step", |b| {
        b.iter(|| {
            let observation = agent.run_interactive(black_box(Action::Upvote)).unwrap();
            black_box(observation)
        })
    });
}

criterion_group!(benches, bench_training_episode, bench_interactive_step);
criterion_main!(benches);
