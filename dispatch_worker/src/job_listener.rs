use dispatch_core::metadata::{DispatchMeta, OutputMeta};
use dispatch_core::wire::Connection;
use dispatch_core::{job, Error, Shutdown, Token};
use std::os::unix::fs::PermissionsExt;
use tokio::net::TcpListener;
use tokio::process::Command;
use tracing::{info, warn};

/// Accepts EXEC connections from the Master one at a time, runs each job to
/// completion, and only then accepts the next (mirrors `slave.c`'s
/// single-backlog `listen_for_job_request` loop — there is never more than
/// one job in flight on a Worker at once, so there is nothing to spawn).
pub async fn run(listener: TcpListener, mut shutdown: Shutdown) {
    info!(addr = ?listener.local_addr().ok(), "job listener started");
    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            _ = shutdown.cancelled() => {
                info!("job listener shutting down");
                return;
            }
        };

        let (stream, peer) = match accepted {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "job listener accept failed");
                continue;
            }
        };

        if let Err(e) = handle(stream).await {
            warn!(%peer, error = %e, "job execution failed");
        }
    }
}

async fn handle(stream: tokio::net::TcpStream) -> Result<(), Error> {
    let mut connection = Connection::new(stream)?;

    let meta = match DispatchMeta::parse(&connection.recv_frame().await?) {
        Ok(meta) => {
            connection
                .send_token(&Token::SuccessfullyReceivedJobRequest)
                .await?;
            meta
        }
        Err(e) => {
            connection
                .send_token(&Token::FailedToReceiveJobRequest)
                .await?;
            return Err(e);
        }
    };

    let exe_data = connection.recv_payload(meta.exe_size).await?;
    connection
        .send_token(&Token::SuccessfullyReceivedBuffer)
        .await?;

    let in_data = connection.recv_payload(meta.in_size).await?;
    connection
        .send_token(&Token::SuccessfullyReceivedBuffer)
        .await?;

    let result = run_job(&meta, exe_data, in_data).await;

    let _ = tokio::fs::remove_file(&meta.exe_name).await;
    let _ = tokio::fs::remove_file(&meta.in_name).await;

    let output = result?;
    let out_name = job::output_file_name(&meta.exe_name);

    let out_meta = OutputMeta {
        name: out_name.clone(),
        size: output.len(),
    };
    connection.send_frame(&out_meta.render()).await?;

    let ack = connection.recv_token().await?;
    if ack != Token::SuccessfullyReceivedJobOutput {
        let _ = tokio::fs::remove_file(&out_name).await;
        return Err(Error::Protocol(format!(
            "expected {{SUCCESSFULLY_RECEIVED_JOB_OUTPUT}}, got {:?}",
            ack
        )));
    }
    connection.send_payload(&output).await?;

    let ack = connection.recv_token().await?;
    let _ = tokio::fs::remove_file(&out_name).await;
    if ack != Token::SuccessfullyReceivedBuffer {
        return Err(Error::Protocol(format!(
            "expected {{SUCCESSFULLY_RECEIVED_BUFFER}}, got {:?}",
            ack
        )));
    }

    info!(command = %meta.command, "job completed");
    Ok(())
}

async fn run_job(
    meta: &DispatchMeta,
    exe_data: Vec<u8>,
    in_data: Vec<u8>,
) -> Result<Vec<u8>, Error> {
    tokio::fs::write(&meta.exe_name, &exe_data).await?;
    let mut perms = tokio::fs::metadata(&meta.exe_name).await?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    tokio::fs::set_permissions(&meta.exe_name, perms).await?;

    tokio::fs::write(&meta.in_name, &in_data).await?;

    let status = Command::new("sh")
        .arg("-c")
        .arg(&meta.command)
        .status()
        .await
        .map_err(|e| Error::Subprocess(e.to_string()))?;
    if !status.success() {
        return Err(Error::Subprocess(format!(
            "command {:?} exited with {}",
            meta.command, status
        )));
    }

    let out_name = job::output_file_name(&meta.exe_name);
    let data = tokio::fs::read(&out_name)
        .await
        .map_err(|e| Error::Subprocess(format!("reading {}: {}", out_name, e)))?;
    Ok(data)
}
