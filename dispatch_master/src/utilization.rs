use dispatch_core::metadata::UtilMeta;
use dispatch_core::wire::Connection;
use dispatch_core::{Registry, Shutdown, Token};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Accepts UTIL connections one at a time, applies the reported
/// utilization to the Registry, and replies with
/// `{SUCCESSFULLY_UPDATED_CPU_UTILIZATION}`/`{FAILED_TO_UPDATE_CPU_UTILIZATION}`.
///
/// Each update is a single-round-trip transaction handled serially within
/// this loop, concurrently with Registration and every ClientHandler
/// (spec §4.3/§5).
pub async fn run(
    listener: TcpListener,
    registry: Arc<Registry>,
    mut shutdown: Shutdown,
) {
    info!(addr = ?listener.local_addr().ok(), "utilization listener started");
    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            _ = shutdown.cancelled() => {
                info!("utilization listener shutting down");
                return;
            }
        };

        let (stream, peer) = match accepted {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "utilization accept failed");
                continue;
            }
        };

        if let Err(e) = handle(stream, &registry).await {
            warn!(%peer, error = %e, "utilization transaction failed");
        }
    }
}

async fn handle(
    stream: tokio::net::TcpStream,
    registry: &Registry,
) -> Result<(), dispatch_core::Error> {
    let mut connection = Connection::new(stream)?;
    let line = connection.recv_frame().await?;

    let reply = match UtilMeta::parse(&line).and_then(|meta| {
        registry.update(meta.worker_id, meta.value)?;
        Ok(meta)
    }) {
        Ok(meta) => {
            debug!(worker_id = meta.worker_id, value = meta.value, "utilization updated");
            Token::SuccessfullyUpdatedCpuUtilization
        }
        Err(e) => {
            warn!(%line, error = %e, "utilization update rejected");
            Token::FailedToUpdateCpuUtilization
        }
    };

    connection.send_token(&reply).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_core::Config;
    use tokio::net::TcpStream;

    // spec §8 scenario 5: an out-of-range worker id is rejected and the
    // Registry is left unchanged.
    #[tokio::test]
    async fn rejects_util_update_for_out_of_range_worker_id() {
        let registry = Registry::new(Config::default().registry_capacity);
        registry.register("10.0.0.1".into()).unwrap();
        registry.register("10.0.0.2".into()).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let registry_for_server = registry.clone();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            handle(stream, &registry_for_server).await.unwrap();
        });

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut connection = Connection::new(stream).unwrap();
        connection.send_frame("99 0.5").await.unwrap();
        let reply = connection.recv_token().await.unwrap();

        assert_eq!(reply, Token::FailedToUpdateCpuUtilization);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.optimal().unwrap().utilization, 1.0);
        server.await.unwrap();
    }
}
