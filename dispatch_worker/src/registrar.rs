use dispatch_core::wire::{connect, Connection};
use dispatch_core::{Error, Token};
use tracing::info;

/// Performs the one-shot REG handshake: connect, send this Worker's
/// address, and read back the assigned dense id (mirrors `slave.c`'s
/// `connect_to_master`). The connection is closed once the id arrives.
pub async fn register(master_host: &str, reg_port: u16, own_address: &str) -> Result<u32, Error> {
    let stream = connect((master_host, reg_port), 5).await?;
    let mut connection = Connection::new(stream)?;

    connection.send_frame(own_address).await?;
    info!(%own_address, "sent registration request to master");

    match connection.recv_token().await? {
        Token::SuccessfullyAddedSlave(id) => {
            info!(worker_id = id, "registered with master");
            Ok(id)
        }
        Token::FailedToAddSlave(_) => Err(Error::Capacity),
        other => Err(Error::Protocol(format!(
            "unexpected token during registration: {:?}",
            other
        ))),
    }
}
