//! Session Server - one request per connection against a shared agent
//!
//! Every accepted connection gets its own task. The task reads until the
//! client half-closes, decodes the request, and only then takes the agent
//! lock for a single `run_interactive` call on the blocking pool. A request
//! that fails anywhere gets an empty response; the accept loop keeps going.

use crate::config::ServerConfig;
use crate::error::{Result, SessionError};
use crate::protocol::{decode_request, encode_observation};
use agent::Agent;
use catalog::Observation;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, instrument, warn};

/// The process-wide agent; every interaction holds the lock for its duration
pub type SharedAgent = Arc<Mutex<Agent>>;

/// How long shutdown waits for in-flight sessions before dropping them
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SessionServer {
    listener: TcpListener,
    agent: SharedAgent,
    labels: Arc<[String; 2]>,
}

impl SessionServer {
    /// Bind the listener. Action labels come from the agent's environment.
    pub async fn bind(config: &ServerConfig, agent: Agent) -> Result<Self> {
        let listener = TcpListener::bind(config.addr()).await?;
        let labels = Arc::new(agent.controller().config().actions.clone());
        info!("Session server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            agent: Arc::new(Mutex::new(agent)),
            labels,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn agent(&self) -> SharedAgent {
        self.agent.clone()
    }

    /// Serve until `shutdown` resolves, then wait briefly for in-flight
    /// sessions and hand the agent back to the caller.
    pub async fn run_until<F>(self, shutdown: F) -> Result<SharedAgent>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut sessions = JoinSet::new();

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutdown requested, {} sessions in flight", sessions.len());
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let agent = self.agent.clone();
                        let labels = self.labels.clone();
                        sessions.spawn(async move {
                            if let Err(e) = handle_connection(stream, peer, agent, &labels).await {
                                warn!("Session with {} failed: {}", peer, e);
                            }
                        });
                    }
                    Err(e) => warn!("Failed to accept connection: {}", e),
                },
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    session_finished(joined);
                }
            }
        }

        let drain = async {
            while let Some(joined) = sessions.join_next().await {
                session_finished(joined);
            }
        };
        if tokio::time::timeout(DRAIN_TIMEOUT, drain).await.is_err() {
            warn!("Dropping {} sessions still open after {:?}", sessions.len(), DRAIN_TIMEOUT);
            sessions.abort_all();
        }

        info!("Session server stopped");
        Ok(self.agent)
    }
}

/// Report how a session task ended; false when it panicked or was cancelled
fn session_finished(joined: std::result::Result<(), JoinError>) -> bool {
    match joined {
        Ok(()) => true,
        Err(e) => {
            warn!("Session task ended abnormally: {}", e);
            false
        }
    }
}

#[instrument(skip(stream, agent, labels))]
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    agent: SharedAgent,
    labels: &[String; 2],
) -> Result<()> {
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await?;
    debug!("Read {} bytes", raw.len());

    let response = match serve_request(&raw, agent, labels).await {
        Ok(observation) => encode_observation(&observation),
        Err(e) => {
            warn!("Replying with an empty response: {}", e);
            String::new()
        }
    };

    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Decode first, so a bad request never touches the agent
async fn serve_request(raw: &[u8], agent: SharedAgent, labels: &[String; 2]) -> Result<Observation> {
    let action = decode_request(raw, labels)?;

    let observation = tokio::task::spawn_blocking(move || {
        let mut agent = agent.lock().map_err(|_| SessionError::AgentPoisoned)?;
        agent.run_interactive(action).map_err(SessionError::from)
    })
    .await??;
    Ok(observation)
}
