use crate::config::{B, MSG};
use crate::error::Error;
use crate::wire::tokens::Token;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::trace;

/// A TCP connection speaking the fixed-frame dispatch wire protocol.
///
/// Control messages (tokens, metadata lines) are exchanged as exactly `MSG`
/// bytes: the text is written followed by zero padding, and the first NUL
/// byte on receive marks the end of the meaningful content (spec §6).
/// Bulk payloads (executable, input, output) are exchanged as consecutive
/// `B`-byte chunks, with a final short chunk when `size % B != 0`.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    peer: std::net::SocketAddr,
}

impl Connection {
    pub fn new(stream: TcpStream) -> std::io::Result<Self> {
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        Ok(Connection { stream, peer })
    }

    pub fn peer_addr(&self) -> std::net::SocketAddr {
        self.peer
    }

    /// Sends a control message as a zero-padded `MSG`-byte frame.
    pub async fn send_frame(&mut self, text: &str) -> Result<(), Error> {
        let bytes = text.as_bytes();
        if bytes.len() >= MSG {
            return Err(Error::Protocol(format!(
                "frame {:?} exceeds MSG={} bytes",
                text, MSG
            )));
        }
        let mut frame = vec![0u8; MSG];
        frame[..bytes.len()].copy_from_slice(bytes);
        self.stream.write_all(&frame).await?;
        trace!(peer = %self.peer, frame = %text, "sent frame");
        Ok(())
    }

    /// Receives a fixed `MSG`-byte frame and returns the text preceding the
    /// first NUL byte, trimmed of surrounding whitespace.
    pub async fn recv_frame(&mut self) -> Result<String, Error> {
        let mut frame = [0u8; MSG];
        self.stream.read_exact(&mut frame).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::Protocol("connection closed before a full frame arrived".into())
            } else {
                Error::Transport(e)
            }
        })?;
        let end = frame.iter().position(|&b| b == 0).unwrap_or(MSG);
        let text = String::from_utf8_lossy(&frame[..end]).trim().to_string();
        trace!(peer = %self.peer, frame = %text, "received frame");
        Ok(text)
    }

    pub async fn send_token(&mut self, token: &Token) -> Result<(), Error> {
        self.send_frame(&token.to_wire()).await
    }

    pub async fn recv_token(&mut self) -> Result<Token, Error> {
        let text = self.recv_frame().await?;
        Token::parse(&text)
    }

    /// Sends `data` in consecutive `B`-byte chunks (a short final chunk when
    /// `data.len() % B != 0`).
    pub async fn send_payload(&mut self, data: &[u8]) -> Result<(), Error> {
        for chunk in data.chunks(B) {
            self.stream.write_all(chunk).await?;
        }
        trace!(peer = %self.peer, bytes = data.len(), "sent payload");
        Ok(())
    }

    /// Receives exactly `size` bytes in consecutive `B`-byte chunks.
    pub async fn recv_payload(&mut self, size: usize) -> Result<Vec<u8>, Error> {
        let mut data = vec![0u8; size];
        let mut offset = 0;
        while offset < size {
            let end = std::cmp::min(offset + B, size);
            self.stream
                .read_exact(&mut data[offset..end])
                .await
                .map_err(|e| {
                    if e.kind() == std::io::ErrorKind::UnexpectedEof {
                        Error::Protocol(
                            "connection closed before the full payload arrived"
                                .into(),
                        )
                    } else {
                        Error::Transport(e)
                    }
                })?;
            offset = end;
        }
        trace!(peer = %self.peer, bytes = size, "received payload");
        Ok(data)
    }
}
