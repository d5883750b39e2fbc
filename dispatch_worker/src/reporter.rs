use crate::cpu;
use dispatch_core::metadata::UtilMeta;
use dispatch_core::wire::{connect, Connection};
use dispatch_core::{Error, Shutdown, Token};
use rand::Rng;
use tracing::{debug, warn};

/// Pushes this Worker's CPU utilization to the Master's UTIL listener on a
/// loop, sleeping a random interval in `[0, MAX_SLEEP_SECS)` between pushes
/// (mirrors `slave.c`'s `send_cpu_utilization` thread). A single failed push
/// is logged and retried on the next tick rather than ending the loop, so a
/// transient Master hiccup never takes the reporter down permanently.
pub async fn run(master_host: String, util_port: u16, worker_id: u32, mut shutdown: Shutdown) {
    loop {
        if let Err(e) = push_once(&master_host, util_port, worker_id).await {
            warn!(worker_id, error = %e, "utilization push failed");
        }

        let sleep_secs = rand::thread_rng().gen_range(0, dispatch_core::config::MAX_SLEEP_SECS);
        tokio::select! {
            _ = tokio::time::sleep(tokio::time::Duration::from_secs(sleep_secs)) => {}
            _ = shutdown.cancelled() => {
                debug!(worker_id, "utilization reporter shutting down");
                return;
            }
        }
    }
}

async fn push_once(master_host: &str, util_port: u16, worker_id: u32) -> Result<(), Error> {
    let utilization = cpu::read_utilization().await?;
    let stream = connect((master_host, util_port), 0).await?;
    let mut connection = Connection::new(stream)?;

    let meta = UtilMeta {
        worker_id,
        value: utilization,
    };
    connection.send_frame(&meta.render()).await?;

    match connection.recv_token().await? {
        Token::SuccessfullyUpdatedCpuUtilization => {
            debug!(worker_id, utilization, "utilization pushed");
            Ok(())
        }
        Token::FailedToUpdateCpuUtilization => Err(Error::Protocol(
            "master rejected utilization update".into(),
        )),
        other => Err(Error::Protocol(format!(
            "unexpected token during utilization push: {:?}",
            other
        ))),
    }
}
