mod connection;
mod tokens;

pub use connection::Connection;
pub use tokens::Token;

use crate::error::Error;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::warn;

/// Binds a TCP listener, retrying a bind failure a handful of times with a
/// randomized backoff before giving up — mirrors the original
/// implementation's retry-on-bind loop (`master.c`), but bounded rather
/// than infinite. The accept backlog itself is `Config::backlog`, which
/// callers apply at the OS level via the platform default; this function
/// only governs retry of the bind step.
pub async fn listen<A: ToSocketAddrs + std::fmt::Debug + Clone>(
    addr: A,
    retries: usize,
) -> Result<TcpListener, Error> {
    let mut attempt = 0;
    loop {
        match TcpListener::bind(addr.clone()).await {
            Ok(listener) => return Ok(listener),
            Err(e) if attempt < retries => {
                attempt += 1;
                warn!(?addr, attempt, error = %e, "bind failed, retrying");
                let backoff = rand::random::<u64>() % 5;
                tokio::time::sleep(tokio::time::Duration::from_secs(backoff)).await;
            }
            Err(e) => return Err(Error::Transport(e)),
        }
    }
}

/// Connects to `addr`, retrying transport errors a bounded number of times.
/// Used by the Worker's one-shot registration and utilization pushes, and
/// by the Master's Dispatcher (which re-reads the optimal Worker on every
/// retry rather than hammering the same address).
pub async fn connect<A: ToSocketAddrs + std::fmt::Debug + Clone>(
    addr: A,
    retries: usize,
) -> Result<TcpStream, Error> {
    let mut attempt = 0;
    loop {
        match TcpStream::connect(addr.clone()).await {
            Ok(stream) => return Ok(stream),
            Err(e) if attempt < retries => {
                attempt += 1;
                warn!(?addr, attempt, error = %e, "connect failed, retrying");
            }
            Err(e) => return Err(Error::Transport(e)),
        }
    }
}
