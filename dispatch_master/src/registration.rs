use dispatch_core::wire::Connection;
use dispatch_core::{Registry, Shutdown, Token};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Accepts REG connections one at a time, assigns dense Worker ids, and
/// replies with `{SUCCESSFULLY_ADDED_SLAVE}`/`{FAILED_TO_ADD_SLAVE}`.
///
/// Each registration is a complete, stateless transaction handled serially
/// within this loop (spec §4.2/§5) — no per-connection task is spawned,
/// unlike the Submission listener.
pub async fn run(
    listener: TcpListener,
    registry: Arc<Registry>,
    mut shutdown: Shutdown,
) {
    info!(addr = ?listener.local_addr().ok(), "registration listener started");
    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            _ = shutdown.cancelled() => {
                info!("registration listener shutting down");
                return;
            }
        };

        let (stream, peer) = match accepted {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "registration accept failed");
                continue;
            }
        };

        if let Err(e) = handle(stream, &registry).await {
            warn!(%peer, error = %e, "registration transaction failed");
        }
    }
}

async fn handle(
    stream: tokio::net::TcpStream,
    registry: &Registry,
) -> Result<(), dispatch_core::Error> {
    let mut connection = Connection::new(stream)?;
    let address = connection.recv_frame().await?;

    let reply = match registry.register(address.clone()) {
        Ok(id) => {
            info!(worker_id = id, %address, "worker registered");
            Token::SuccessfullyAddedSlave(id)
        }
        Err(e) => {
            warn!(%address, error = %e, "worker registration refused");
            Token::FailedToAddSlave(registry.len() as u32)
        }
    };

    connection.send_token(&reply).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpStream;

    async fn register_once(addr: std::net::SocketAddr, text: &str) -> Token {
        let stream = TcpStream::connect(addr).await.unwrap();
        let mut connection = Connection::new(stream).unwrap();
        connection.send_frame(text).await.unwrap();
        connection.recv_token().await.unwrap()
    }

    #[tokio::test]
    async fn assigns_dense_ids_and_rejects_past_capacity() {
        let registry = Registry::new(1);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let registry_for_server = registry.clone();
        let server = tokio::spawn(async move {
            for _ in 0..2 {
                let (stream, _) = listener.accept().await.unwrap();
                handle(stream, &registry_for_server).await.unwrap();
            }
        });

        assert_eq!(
            register_once(addr, "10.0.0.1").await,
            Token::SuccessfullyAddedSlave(0)
        );
        assert!(matches!(
            register_once(addr, "10.0.0.2").await,
            Token::FailedToAddSlave(_)
        ));
        assert_eq!(registry.len(), 1);
        server.await.unwrap();
    }
}
