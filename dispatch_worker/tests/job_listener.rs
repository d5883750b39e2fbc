use dispatch_core::metadata::{DispatchMeta, OutputMeta};
use dispatch_core::wire::Connection;
use dispatch_core::{Shutdown, Token};
use dispatch_worker::job_listener;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

// Drives the JobListener's full EXEC wire contract against a real `sh -c`
// invocation (no fabricated job binary: the dispatched command just copies
// the input file to the conventional output name).
#[tokio::test]
async fn runs_a_dispatched_job_and_returns_its_output() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let worker_shutdown = shutdown.clone();
    let server = tokio::spawn(job_listener::run(listener, worker_shutdown));

    let stream = TcpStream::connect(addr).await.unwrap();
    let mut connection = Connection::new(stream).unwrap();

    let meta = DispatchMeta {
        exe_name: "echoer".into(),
        exe_size: 4,
        in_name: "input.txt".into(),
        in_size: 11,
        command: "cat input.txt > echoer_output.txt".into(),
    };
    connection.send_frame(&meta.render()).await.unwrap();
    assert_eq!(
        connection.recv_token().await.unwrap(),
        Token::SuccessfullyReceivedJobRequest
    );

    connection.send_payload(b"stub").await.unwrap();
    assert_eq!(
        connection.recv_token().await.unwrap(),
        Token::SuccessfullyReceivedBuffer
    );

    connection.send_payload(b"hello world").await.unwrap();
    assert_eq!(
        connection.recv_token().await.unwrap(),
        Token::SuccessfullyReceivedBuffer
    );

    let out_meta = OutputMeta::parse(&connection.recv_frame().await.unwrap()).unwrap();
    assert_eq!(out_meta.name, "echoer_output.txt");
    connection
        .send_token(&Token::SuccessfullyReceivedJobOutput)
        .await
        .unwrap();
    let data = connection.recv_payload(out_meta.size).await.unwrap();
    connection
        .send_token(&Token::SuccessfullyReceivedBuffer)
        .await
        .unwrap();

    assert_eq!(data, b"hello world");
    assert!(!dir.path().join("echoer").exists());
    assert!(!dir.path().join("input.txt").exists());
    assert!(!dir.path().join("echoer_output.txt").exists());

    shutdown.signal();
    tokio::time::timeout(Duration::from_secs(1), server)
        .await
        .expect("listener should shut down")
        .unwrap();
}
