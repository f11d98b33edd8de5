//! Example: Walk one episode through the MovieLens catalog
//!
//! Run with: cargo run --package environment --example play_episode
//!
//! This example shows how to:
//! 1. Load the MovieLens dataset
//! 2. Start an episode from a random movie
//! 3. Step with a fixed like/dislike pattern until the episode terminates

use catalog::MovieCatalog;
use environment::{Action, EnvironmentConfig, EpisodeController};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info,environment=debug")
        .init();

    println!("=== reel-rl Episode Example ===\n");

    println!("Loading MovieLens dataset...");
    let start = Instant::now();
    let catalog = MovieCatalog::load_from_dir(Path::new("data/ml-latest-small"))?;
    println!("Loaded dataset in {:?}\n", start.elapsed());

    let config = EnvironmentConfig {
        max_episodes: 8,
        batch_size: 4,
        ..EnvironmentConfig::default()
    };
    print!("{}", config);
    let mut controller = EpisodeController::new(Arc::new(catalog), config)?;

    let first = controller.reset()?;
    println!("\nStart: {} [{}]", first.title, first.genres.join(", "));

    let mut total_reward = 0.0;
    for turn in 1.. {
        // Like two in a row, then dislike one
        let action = if turn % 3 == 0 { Action::Downvote } else { Action::Upvote };
        let step = controller.step(action)?;
        total_reward += step.reward;
        println!(
            "  {:>2}. {:?} -> {} [{}] (reward {})",
            turn,
            action,
            step.observation.title,
            step.observation.genres.join(", "),
            step.reward
        );
        if step.terminated {
            break;
        }
    }

    println!("\n=== Summary ===");
    println!("Total reward: {}", total_reward);
    println!("Controller idle again: {}", controller.is_idle());
    Ok(())
}
