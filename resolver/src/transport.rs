use crate::{ResolverConfig, Result};
use async_trait::async_trait;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// One query/response exchange with a nameserver.
#[async_trait]
pub trait Transport: Send {
    /// Sends `query` to `server` and returns the bytes of its reply.
    async fn exchange(&mut self, server: Ipv4Addr, query: &[u8]) -> Result<Vec<u8>>;
}

/// Sends each query as a single datagram from a fresh socket and waits for a
/// single reply. There is no timeout: a server that never answers blocks the
/// exchange forever.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    port: u16,
    recv_buffer_size: usize,
}

impl UdpTransport {
    pub fn new(port: u16, recv_buffer_size: usize) -> Self {
        Self {
            port,
            recv_buffer_size,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.port, config.recv_buffer_size)
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn exchange(&mut self, server: Ipv4Addr, query: &[u8]) -> Result<Vec<u8>> {
        // New socket to talk to the nameserver.
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;

        let remote_addr = SocketAddr::from((server, self.port));
        socket.connect(remote_addr).await?;

        debug!("Sending {} bytes to {}", query.len(), remote_addr);
        socket.send(query).await?;

        let mut buf = vec![0u8; self.recv_buffer_size];
        let len = socket.recv(&mut buf).await?;
        if len == buf.len() {
            warn!(
                "Reply from {} filled the {} byte buffer and may be truncated",
                remote_addr, len
            );
        }
        buf.truncate(len);

        debug!("Got {} bytes back from {}", len, remote_addr);
        Ok(buf)
    }
}
