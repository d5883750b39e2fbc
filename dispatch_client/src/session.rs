use dispatch_core::job::basename;
use dispatch_core::metadata::{OutputMeta, SubmitMeta};
use dispatch_core::wire::{connect, Connection};
use dispatch_core::{Buffer, Error, Token};
use tracing::info;

/// A single Client submission: upload an executable and an input file to
/// the Master's SUB listener, then wait for the output buffer (the Client
/// side of `client.c`'s `send_job_to_master`).
pub async fn submit(
    master_host: &str,
    sub_port: u16,
    executable: Buffer,
    input: Buffer,
) -> Result<Buffer, Error> {
    let stream = connect((master_host, sub_port), 5).await?;
    let mut connection = Connection::new(stream)?;

    let meta = SubmitMeta {
        exe_name: basename(&executable.name).to_string(),
        exe_size: executable.size(),
        in_name: basename(&input.name).to_string(),
        in_size: input.size(),
    };
    connection.send_frame(&meta.render()).await?;
    info!(request = %meta.render(), "submitted job request");
    expect_token(
        &mut connection,
        Token::SuccessfullyReceivedJobRequest,
        "job request",
    )
    .await?;

    connection.send_payload(&executable.data).await?;
    expect_token(
        &mut connection,
        Token::SuccessfullyReceivedBuffer,
        "executable upload",
    )
    .await?;

    connection.send_payload(&input.data).await?;
    expect_token(
        &mut connection,
        Token::SuccessfullyReceivedBuffer,
        "input upload",
    )
    .await?;

    connection.send_token(&Token::RequestJobOutput).await?;
    let out_meta = OutputMeta::parse(&connection.recv_frame().await?)?;

    connection
        .send_token(&Token::SuccessfullyReceivedJobOutput)
        .await?;
    let data = connection.recv_payload(out_meta.size).await?;

    connection
        .send_token(&Token::SuccessfullyReceivedBuffer)
        .await?;

    info!(out_name = %out_meta.name, bytes = data.len(), "received job output");
    Ok(Buffer::new(out_meta.name, data))
}

async fn expect_token(connection: &mut Connection, expected: Token, what: &str) -> Result<(), Error> {
    let token = connection.recv_token().await?;
    if token != expected {
        return Err(Error::Protocol(format!(
            "expected {:?} after {}, got {:?}",
            expected, what, token
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    // Drives `submit` against an in-process fake Master that mimics the
    // SUB listener's wire contract exactly, without a real Registry or
    // Dispatcher.
    #[tokio::test]
    async fn submit_round_trips_a_job_against_a_fake_master() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let fake_master = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut connection = Connection::new(stream).unwrap();

            let meta = SubmitMeta::parse(&connection.recv_frame().await.unwrap()).unwrap();
            connection
                .send_token(&Token::SuccessfullyReceivedJobRequest)
                .await
                .unwrap();

            let _exe = connection.recv_payload(meta.exe_size).await.unwrap();
            connection
                .send_token(&Token::SuccessfullyReceivedBuffer)
                .await
                .unwrap();

            let _input = connection.recv_payload(meta.in_size).await.unwrap();
            connection
                .send_token(&Token::SuccessfullyReceivedBuffer)
                .await
                .unwrap();

            let token = connection.recv_token().await.unwrap();
            assert_eq!(token, Token::RequestJobOutput);

            let out_meta = OutputMeta {
                name: "countwords_output.txt".into(),
                size: 2,
            };
            connection.send_frame(&out_meta.render()).await.unwrap();
            let ack = connection.recv_token().await.unwrap();
            assert_eq!(ack, Token::SuccessfullyReceivedJobOutput);
            connection.send_payload(b"42").await.unwrap();
            let ack = connection.recv_token().await.unwrap();
            assert_eq!(ack, Token::SuccessfullyReceivedBuffer);
        });

        let output = tokio::time::timeout(
            Duration::from_secs(1),
            submit(
                &addr.ip().to_string(),
                addr.port(),
                Buffer::new("countwords", vec![1, 2, 3]),
                Buffer::new("input.txt", vec![4, 5]),
            ),
        )
        .await
        .expect("should not time out")
        .unwrap();

        assert_eq!(output.name, "countwords_output.txt");
        assert_eq!(output.data, b"42");
        fake_master.await.unwrap();
    }
}
