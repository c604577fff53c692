//! Socket tuning for proxied connections

use socket2::{SockRef, TcpKeepalive};
use std::io;
use tokio::net::TcpStream;
use tracing::debug;

use crate::constants::socket::{KEEPALIVE_IDLE, KEEPALIVE_INTERVAL};

/// Disable Nagle and enable keepalive on one leg of a session
///
/// SQL traffic is request/response, so small writes must not wait for
/// coalescing. Keepalive lets a silently vanished peer end its session.
pub fn tune_stream(stream: &TcpStream) -> io::Result<()> {
    stream.set_nodelay(true)?;

    let keepalive = TcpKeepalive::new()
        .with_time(KEEPALIVE_IDLE)
        .with_interval(KEEPALIVE_INTERVAL);
    SockRef::from(stream).set_tcp_keepalive(&keepalive)?;

    Ok(())
}

/// [`tune_stream`], logging instead of failing
///
/// A socket that cannot be tuned still forwards bytes correctly.
pub fn try_tune_stream(stream: &TcpStream, role: &str) {
    if let Err(e) = tune_stream(stream) {
        debug!("Failed to tune {} socket: {}", role, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tune_stream_sets_options() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (client, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
        let client = client.unwrap();
        let (server, _) = accepted.unwrap();

        tune_stream(&client).unwrap();
        tune_stream(&server).unwrap();

        assert!(client.nodelay().unwrap());
        assert!(SockRef::from(&server).keepalive().unwrap());
    }
}
