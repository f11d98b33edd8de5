use agent::{Agent, ValueTable};
use anyhow::{anyhow, bail, Context, Result};
use catalog::{Catalog, MovieCatalog, Observation};
use clap::{Parser, Subcommand};
use colored::Colorize;
use environment::EpisodeController;
use server::{decode_observation, Config, SessionServer, DEFAULT_CONFIG_PATH};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{error, info};

/// reel-rl - Movie recommender that learns from likes and dislikes
#[derive(Parser)]
#[command(name = "reel-rl")]
#[command(about = "Reinforcement-learning movie recommender", long_about = None)]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the MovieLens dataset directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the listener host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Override the listener port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Override the value table path
    #[arg(long, global = true)]
    value_table: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve interactive sessions until SIGINT/SIGTERM
    Serve,

    /// Train offline against the simulated user
    Train {
        /// Number of episodes (defaults to model.training_episodes)
        #[arg(long)]
        episodes: Option<usize>,
    },

    /// Send one action to a running server and print the next movie
    Ask {
        /// Action label, e.g. "like"
        #[arg(long, default_value = "like")]
        action: String,
    },

    /// Show the highest-valued rows of a saved value table
    Inspect {
        /// Number of rows to show
        #[arg(long, default_value = "10")]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(data_dir) = cli.data_dir {
        config.paths.data_dir = data_dir;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(value_table) = cli.value_table {
        config.paths.value_table = Some(value_table);
    }
    config.validate()?;

    match cli.command {
        Commands::Serve => handle_serve(config).await?,
        Commands::Train { episodes } => handle_train(config, episodes).await?,
        Commands::Ask { action } => handle_ask(config, action).await?,
        Commands::Inspect { top } => handle_inspect(config, top)?,
    }

    Ok(())
}

/// Load the catalog (this may take a moment)
fn load_catalog(config: &Config) -> Result<Arc<dyn Catalog>> {
    println!("Loading MovieLens dataset from {}...", config.paths.data_dir.display());
    let start = Instant::now();
    let catalog = MovieCatalog::load_from_dir(&config.paths.data_dir)
        .context("Failed to load MovieLens dataset")?;
    let (movies, genres) = catalog.counts();
    println!(
        "{} Loaded {} movies in {} genres in {:?}",
        "✓".green(),
        movies,
        genres,
        start.elapsed()
    );
    Ok(Arc::new(catalog))
}

/// Build the agent, resuming from the saved value table when one is configured
fn build_agent(config: &Config, catalog: Arc<dyn Catalog>) -> Result<Agent> {
    let controller = EpisodeController::new(catalog, config.env.clone())
        .context("Failed to set up the episode controller")?;
    let mut agent = Agent::new(&config.model.agent, controller).context("Failed to set up the agent")?;

    if let Some(path) = &config.paths.value_table {
        let values = ValueTable::load_or_default(path)
            .with_context(|| format!("Failed to load value table {}", path.display()))?;
        agent = agent.with_value_table(values);
    }
    Ok(agent)
}

fn save_agent(config: &Config, agent: &Agent) -> Result<()> {
    match &config.paths.value_table {
        Some(path) => {
            agent
                .value_table()
                .save(path)
                .with_context(|| format!("Failed to save value table {}", path.display()))?;
            println!(
                "{} Saved {} rows to {}",
                "✓".green(),
                agent.value_table().len(),
                path.display()
            );
        }
        None => println!("{}", "No value table path configured, nothing saved".yellow()),
    }
    Ok(())
}

/// Handle the 'serve' command
async fn handle_serve(config: Config) -> Result<()> {
    print!("{}", config.env);
    let catalog = load_catalog(&config)?;
    let agent = build_agent(&config, catalog)?;

    let server = SessionServer::bind(&config.server, agent)
        .await
        .with_context(|| format!("Failed to listen on {}", config.server.addr()))?;
    println!(
        "{} Serving sessions on {}",
        "✓".green(),
        server.local_addr()?.to_string().bold()
    );

    let shared = server.run_until(shutdown_signal()).await?;

    let agent = shared.lock().map_err(|_| anyhow!("Agent lock poisoned, value table not saved"))?;
    info!("Served {} updates", agent.training_error().len());
    save_agent(&config, &agent)
}

/// Handle the 'train' command
async fn handle_train(config: Config, episodes: Option<usize>) -> Result<()> {
    print!("{}", config.env);
    let episodes = episodes.unwrap_or(config.model.training_episodes);
    let catalog = load_catalog(&config)?;
    let mut agent = build_agent(&config, catalog)?;

    println!("Training for {} episodes...", episodes);
    let start = Instant::now();
    let (agent, summary) = tokio::task::spawn_blocking(move || {
        let summary = agent.run_autonomous(episodes);
        (agent, summary)
    })
    .await?;
    let summary = summary.context("Training failed")?;

    println!("{}", "Training results:".bold().blue());
    println!("{}Completed episodes: {}", "• ".green(), summary.episodes_completed);
    println!("{}Aborted episodes: {}", "• ".green(), summary.episodes_aborted);
    println!("{}Steps: {}", "• ".cyan(), summary.steps);
    println!("{}Final epsilon: {:.4}", "• ".cyan(), summary.final_epsilon);
    println!("{}Mean TD error: {:.4}", "• ".cyan(), summary.mean_td_error);
    println!("{}Value table rows: {}", "• ".cyan(), agent.value_table().len());
    println!("Elapsed: {:?}", start.elapsed());

    save_agent(&config, &agent)
}

/// Handle the 'ask' command
async fn handle_ask(config: Config, action: String) -> Result<()> {
    let addr = config.server.addr();
    let mut stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("Failed to connect to {}", addr))?;

    let request = serde_json::json!({ "action": action }).to_string();
    stream.write_all(request.as_bytes()).await?;
    stream.shutdown().await?;

    let mut response = String::new();
    stream.read_to_string(&mut response).await?;
    if response.is_empty() {
        bail!("Server returned an empty response (request rejected or agent error)");
    }

    let observation = decode_observation(&response).context("Server response is not an observation")?;
    print_observation(&observation);
    Ok(())
}

/// Handle the 'inspect' command
fn handle_inspect(config: Config, top: usize) -> Result<()> {
    let path = config
        .paths
        .value_table
        .ok_or_else(|| anyhow!("No value table path given (use --value-table)"))?;
    let table = ValueTable::load(&path)?;

    println!(
        "{}",
        format!("Value table {} ({} rows):", path.display(), table.len()).bold().blue()
    );
    for (rank, (observation, values)) in table.top(top).iter().enumerate() {
        println!(
            "{}. {} [{}] up {:.4} / down {:.4}",
            (rank + 1).to_string().green(),
            observation.title,
            observation.genres.join(", "),
            values[0],
            values[1]
        );
    }
    Ok(())
}

/// Helper function to print one recommended movie
fn print_observation(observation: &Observation) {
    let average = if observation.rating_count > 0 {
        observation.rating_sum / observation.rating_count as f64
    } else {
        0.0
    };
    println!("{}", observation.title.bold().blue());
    println!("{}Movie ID: {}", "• ".green(), observation.id);
    println!("{}IMDb: tt{:07}", "• ".green(), observation.external_id);
    println!("{}Genres: {}", "• ".cyan(), observation.genres.join(", "));
    println!(
        "{}Rating: {:.2} ({} ratings)",
        "• ".cyan(),
        average,
        observation.rating_count
    );
}

/// Wait for shutdown signal (SIGINT, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT (Ctrl+C)"),
        () = terminate => info!("Received SIGTERM"),
    }
}
