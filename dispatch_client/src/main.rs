use clap::{App, Arg};
use color_eyre::eyre::{eyre, Result};
use dispatch_client::session;
use dispatch_core::job::basename;
use dispatch_core::{Buffer, Config};
use std::io::Write;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::init();

    let matches = App::new("dispatch_client")
        .version("0.1.0")
        .about("Submits a job (executable + input file) to a Master node")
        .arg(
            Arg::with_name("MASTER_ADDRESS")
                .help("IPv4 address or hostname of the Master node")
                .required(true)
                .index(1),
        )
        .get_matches();

    let master_host = matches.value_of("MASTER_ADDRESS").unwrap().to_string();
    let config = Config::default();

    print!("[?] Enter a job (executable input_file) > ");
    std::io::stdout().flush().ok();
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let mut fields = line.split_whitespace();
    let exe_path = fields
        .next()
        .ok_or_else(|| eyre!("expected an executable path"))?
        .to_string();
    let input_path = fields
        .next()
        .ok_or_else(|| eyre!("expected an input file path"))?
        .to_string();

    let exe_data = tokio::fs::read(&exe_path).await?;
    let input_data = tokio::fs::read(&input_path).await?;
    let executable = Buffer::new(basename(&exe_path), exe_data);
    let input = Buffer::new(basename(&input_path), input_data);

    info!(%exe_path, %input_path, "submitting job");
    let output = session::submit(&master_host, config.sub_port, executable, input).await?;

    tokio::fs::write(&output.name, &output.data).await?;
    info!(out_name = %output.name, bytes = output.data.len(), "wrote job output");
    println!("[+] Job output written to {}", output.name);

    Ok(())
}
