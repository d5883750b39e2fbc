use crate::dispatcher;
use dispatch_core::metadata::{OutputMeta, SubmitMeta};
use dispatch_core::wire::Connection;
use dispatch_core::{Buffer, Config, Error, Job, Registry, Shutdown, Token};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Accepts SUB connections and spawns an independent ClientHandler per
/// connection; handlers run concurrently with each other and with the
/// Registration and Utilization listeners (spec §4.4/§5).
pub async fn run(
    listener: TcpListener,
    registry: Arc<Registry>,
    config: Arc<Config>,
    mut shutdown: Shutdown,
) {
    info!(addr = ?listener.local_addr().ok(), "submission listener started");
    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            _ = shutdown.cancelled() => {
                info!("submission listener shutting down");
                return;
            }
        };

        let (stream, peer) = match accepted {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "submission accept failed");
                continue;
            }
        };

        let registry = registry.clone();
        let config = config.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, registry, config).await {
                warn!(%peer, error = %e, "client session ended with an error");
            }
        });
    }
}

/// Runs one Client session to completion: `AWAIT_REQ -> RECV_EXE -> RECV_IN
/// -> AWAIT_OUT_REQ -> DISPATCH -> SEND_OUT -> AWAIT_OUT_ACK -> DONE` (spec
/// §4.4). Any deviation replies with the matching `{FAILED_*}` token and
/// ends the session; the handler never returns a partial output.
async fn handle_client(
    stream: tokio::net::TcpStream,
    registry: Arc<Registry>,
    config: Arc<Config>,
) -> Result<(), Error> {
    let mut connection = Connection::new(stream)?;

    // AWAIT_REQ
    let meta = match SubmitMeta::parse(&connection.recv_frame().await?) {
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

    // RECV_EXE
    let exe_data = connection.recv_payload(meta.exe_size).await?;
    connection
        .send_token(&Token::SuccessfullyReceivedBuffer)
        .await?;

    // RECV_IN
    let in_data = connection.recv_payload(meta.in_size).await?;
    connection
        .send_token(&Token::SuccessfullyReceivedBuffer)
        .await?;

    // AWAIT_OUT_REQ
    let token = connection.recv_token().await?;
    if token != Token::RequestJobOutput {
        connection
            .send_token(&Token::FailedToReceiveJobOutput)
            .await?;
        return Err(Error::Protocol(format!(
            "expected {{REQUEST_JOB_OUTPUT}}, got {:?}",
            token
        )));
    }

    // DISPATCH
    let job = Job::new(
        Buffer::new(meta.exe_name, exe_data),
        Buffer::new(meta.in_name, in_data),
    );
    let output = dispatcher::dispatch(&job, &registry, &config).await?;

    // SEND_OUT
    let out_meta = OutputMeta {
        name: output.name.clone(),
        size: output.size(),
    };
    connection.send_frame(&out_meta.render()).await?;
    let ack = connection.recv_token().await?;
    if ack != Token::SuccessfullyReceivedJobOutput {
        return Err(Error::Protocol(format!(
            "expected {{SUCCESSFULLY_RECEIVED_JOB_OUTPUT}}, got {:?}",
            ack
        )));
    }
    connection.send_payload(&output.data).await?;

    // AWAIT_OUT_ACK
    let ack = connection.recv_token().await?;
    if ack != Token::SuccessfullyReceivedBuffer {
        return Err(Error::Protocol(format!(
            "expected {{SUCCESSFULLY_RECEIVED_BUFFER}}, got {:?}",
            ack
        )));
    }

    info!("client session completed");
    Ok(())
}
