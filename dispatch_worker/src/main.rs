use clap::{App, Arg};
use color_eyre::eyre::Result;
use dispatch_core::{wire, Config, Shutdown};
use dispatch_worker::{address, job_listener, registrar, reporter};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::init();

    let matches = App::new("dispatch_worker")
        .version("0.1.0")
        .about("Registers with a Master, reports utilization, and executes dispatched jobs")
        .arg(
            Arg::with_name("MASTER_ADDRESS")
                .help("IPv4 address or hostname of the Master node")
                .required(true)
                .index(1),
        )
        .get_matches();

    let master_host = matches.value_of("MASTER_ADDRESS").unwrap().to_string();
    let config = Config::default();

    let own_address = address::local_address(&master_host, config.reg_port)?;
    let worker_id = registrar::register(&master_host, config.reg_port, &own_address).await?;

    let exec_listener = wire::listen(("0.0.0.0", config.exec_port), 5).await?;
    let shutdown = Shutdown::new();

    let reporter_handle = tokio::spawn(reporter::run(
        master_host.clone(),
        config.util_port,
        worker_id,
        shutdown.clone(),
    ));
    let listener_handle = tokio::spawn(job_listener::run(exec_listener, shutdown.clone()));

    info!(worker_id, %own_address, "worker ready");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    shutdown.signal();

    let _ = tokio::join!(reporter_handle, listener_handle);
    info!("worker shut down cleanly");
    Ok(())
}
