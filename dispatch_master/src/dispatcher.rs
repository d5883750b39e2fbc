use dispatch_core::metadata::{DispatchMeta, OutputMeta};
use dispatch_core::wire::{connect, Connection};
use dispatch_core::{Buffer, Config, Error, Job, Registry, Token};
use std::sync::Arc;
use tracing::{info, warn};

/// Runs one Job to completion against the optimal Worker, retrying on
/// transport failures with a freshly re-selected Worker each time (spec
/// §4.5). Bounded by `Config::dispatch_max_attempts` when set; unbounded
/// when `None`, matching the base design.
pub async fn dispatch(
    job: &Job,
    registry: &Arc<Registry>,
    config: &Config,
) -> Result<Buffer, Error> {
    let mut attempt = 0usize;
    loop {
        let worker = registry.wait_for_optimal().await;
        attempt += 1;
        info!(worker_id = worker.id, %worker.address, attempt, "dispatching job");

        match try_dispatch(job, &worker.address, config.exec_port).await {
            Ok(output) => return Ok(output),
            Err(e) => {
                warn!(worker_id = worker.id, error = %e, attempt, "dispatch attempt failed, retrying");
                if let Some(max) = config.dispatch_max_attempts {
                    if attempt >= max {
                        return Err(e);
                    }
                }
            }
        }
    }
}

async fn try_dispatch(
    job: &Job,
    worker_address: &str,
    exec_port: u16,
) -> Result<Buffer, Error> {
    let stream = connect((worker_address, exec_port), 0).await?;
    let mut connection = Connection::new(stream)?;

    let meta = DispatchMeta {
        exe_name: job.executable.name.clone(),
        exe_size: job.executable.size(),
        in_name: job.input.name.clone(),
        in_size: job.input.size(),
        command: job.command.clone(),
    };
    connection.send_frame(&meta.render()).await?;
    expect_token(
        &mut connection,
        Token::SuccessfullyReceivedJobRequest,
        "job request",
    )
    .await?;

    connection.send_payload(&job.executable.data).await?;
    expect_token(
        &mut connection,
        Token::SuccessfullyReceivedBuffer,
        "executable buffer",
    )
    .await?;

    connection.send_payload(&job.input.data).await?;
    expect_token(
        &mut connection,
        Token::SuccessfullyReceivedBuffer,
        "input buffer",
    )
    .await?;

    let out_meta = OutputMeta::parse(&connection.recv_frame().await?)?;
    connection
        .send_token(&Token::SuccessfullyReceivedJobOutput)
        .await?;

    let data = connection.recv_payload(out_meta.size).await?;
    connection
        .send_token(&Token::SuccessfullyReceivedBuffer)
        .await?;

    Ok(Buffer::new(out_meta.name, data))
}

async fn expect_token(
    connection: &mut Connection,
    expected: Token,
    what: &str,
) -> Result<(), Error> {
    let token = connection.recv_token().await?;
    if token != expected {
        return Err(Error::Protocol(format!(
            "expected {:?} after {}, got {:?}",
            expected, what, token
        )));
    }
    Ok(())
}
