use clap::App;
use color_eyre::eyre::Result;
use dispatch_core::Config;
use dispatch_master::Supervisor;
use futures::future::join_all;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::init();

    // The Master takes no positional arguments; `App` is still built so
    // `--help`/`-V` behave like every other binary in this workspace.
    App::new("dispatch_master")
        .version("0.1.0")
        .about("Coordinates Worker registration, load balancing and Client job dispatch")
        .get_matches();

    let supervisor = Supervisor::new(Config::default());
    let handles = supervisor.start().await?;

    info!("master started, waiting for ctrl-c to shut down");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    supervisor.shutdown();

    join_all(handles).await;
    info!("master shut down cleanly");
    Ok(())
}
