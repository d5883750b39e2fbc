use dispatch_core::Error;
use std::net::UdpSocket;

/// Determines the IPv4 address this host would use to reach `master_host`,
/// without sending any data. Replaces the original's `hostname -I | awk
/// '{print $1}'` shell-out with the standard connected-UDP-socket trick, so
/// the Worker never spawns a subprocess just to learn its own address.
pub fn local_address(master_host: &str, master_port: u16) -> Result<String, Error> {
    let socket = UdpSocket::bind("0.0.0.0:0").map_err(Error::Transport)?;
    socket
        .connect((master_host, master_port))
        .map_err(Error::Transport)?;
    let addr = socket.local_addr().map_err(Error::Transport)?;
    Ok(addr.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_a_local_address_for_loopback() {
        let addr = local_address("127.0.0.1", 8081).unwrap();
        assert_eq!(addr, "127.0.0.1");
    }
}
