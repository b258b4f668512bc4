//! Connection Handler
//!
//! One task per accepted connection, running a decode/dispatch/reply loop
//! until the client goes away or a fatal protocol error occurs.
//!
//! A recoverable decode error (malformed array header) produces an error
//! reply and the loop continues with the next frame. A fatal decode error
//! or I/O failure terminates this connection's task alone, with no reply
//! for the broken frame; other connections and the store are unaffected.

use crate::commands::CommandHandler;
use crate::protocol::{DecodeError, FrameDecoder, Reply};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Counters shared across all connection tasks.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands processed
    pub commands_processed: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Decode(#[from] DecodeError),
}

/// Drives one client connection: decoder + dispatcher bound to the shared
/// store, plus the write half for replies.
pub struct ConnectionHandler {
    decoder: FrameDecoder<BufReader<OwnedReadHalf>>,
    writer: BufWriter<OwnedWriteHalf>,
    addr: SocketAddr,
    commands: CommandHandler,
    stats: Arc<ConnectionStats>,
}

impl ConnectionHandler {
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        commands: CommandHandler,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();
        let (read_half, write_half) = stream.into_split();
        Self {
            decoder: FrameDecoder::new(BufReader::new(read_half)),
            writer: BufWriter::new(write_half),
            addr,
            commands,
            stats,
        }
    }

    /// Runs the connection to completion.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "client connected");

        let result = self.serve().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "client disconnected"),
            Err(e) => debug!(client = %self.addr, error = %e, "connection terminated"),
        }

        self.stats.connection_closed();
        result
    }

    /// The decode/dispatch/reply loop.
    async fn serve(&mut self) -> Result<(), ConnectionError> {
        loop {
            match self.decoder.read_frame().await {
                Ok(Some(args)) => {
                    let reply = self.commands.execute(args);
                    self.stats.command_processed();
                    self.send(&reply).await?;
                }
                // Clean end of stream at a frame boundary.
                Ok(None) => return Ok(()),
                Err(e) if e.is_recoverable() => {
                    warn!(client = %self.addr, error = %e, "malformed frame header");
                    let reply = e.to_reply();
                    self.send(&reply).await?;
                }
                // Fatal framing error: close with no reply for this frame.
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn send(&mut self, reply: &Reply) -> Result<(), std::io::Error> {
        self.writer.write_all(&reply.encode()).await?;
        self.writer.flush().await
    }
}

/// Creates a [`ConnectionHandler`] and runs it to completion, swallowing
/// the error after logging. This is what the accept loop spawns.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    commands: CommandHandler,
    stats: Arc<ConnectionStats>,
) {
    let handler = ConnectionHandler::new(stream, addr, commands, stats);
    if let Err(e) = handler.run().await {
        debug!(client = %addr, error = %e, "connection ended with error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn create_test_server() -> (SocketAddr, Arc<Store>, Arc<ConnectionStats>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let store = Arc::new(Store::new());
        let stats = Arc::new(ConnectionStats::new());

        let store_clone = Arc::clone(&store);
        let stats_clone = Arc::clone(&stats);

        tokio::spawn(async move {
            while let Ok((stream, client_addr)) = listener.accept().await {
                let commands = CommandHandler::new(Arc::clone(&store_clone));
                let stats = Arc::clone(&stats_clone);
                tokio::spawn(handle_connection(stream, client_addr, commands, stats));
            }
        });

        (addr, store, stats)
    }

    #[tokio::test]
    async fn ping_pong() {
        let (addr, _, _) = create_test_server().await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"*1\r\n$4\r\nPING\r\n").await.unwrap();

        let mut buf = [0u8; 64];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"+PONG\r\n");
    }

    #[tokio::test]
    async fn recoverable_header_error_keeps_connection_open() {
        let (addr, _, _) = create_test_server().await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"*abc\r\n").await.unwrap();

        let mut buf = [0u8; 64];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"-ERR invalid argument count\r\n");

        // Same connection still serves the next frame.
        client.write_all(b"*1\r\n$4\r\nPING\r\n").await.unwrap();
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"+PONG\r\n");
    }

    #[tokio::test]
    async fn fatal_framing_error_closes_without_reply() {
        let (addr, _, _) = create_test_server().await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"*2\r\n$abc\r\n").await.unwrap();

        // The server closes the connection with no reply for the frame.
        let mut buf = [0u8; 64];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn stats_track_connections_and_commands() {
        let (addr, _, stats) = create_test_server().await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"*1\r\n$4\r\nPING\r\n").await.unwrap();
        let mut buf = [0u8; 64];
        let _ = client.read(&mut buf).await.unwrap();

        assert_eq!(stats.connections_accepted.load(Ordering::Relaxed), 1);
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 1);
        assert_eq!(stats.commands_processed.load(Ordering::Relaxed), 1);

        drop(client);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
    }
}
