use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::link::RFM95_MAX_MESSAGE_LEN;

/// Async UDP datagram link for tokio-based base-station services.
///
/// Mirrors [`crate::UdpLink`]: one datagram per frame, oversize frames are
/// rejected before sending.
#[derive(Debug)]
pub struct AsyncUdpLink {
    socket: UdpSocket,
    max_frame_size: usize,
}

impl AsyncUdpLink {
    /// Bind a receiving link on `addr`.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;

        info!(addr = %socket.local_addr()?, "async udp link bound");
        Ok(Self {
            socket,
            max_frame_size: RFM95_MAX_MESSAGE_LEN,
        })
    }

    /// Create a transmitting link that sends every frame to `remote`.
    pub async fn connect(remote: SocketAddr) -> Result<Self> {
        let local: SocketAddr = if remote.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let link = Self::bind(local).await?;
        link.socket
            .connect(remote)
            .await
            .map_err(|source| TransportError::Connect {
                addr: remote,
                source,
            })?;
        debug!(%remote, "async udp link connected");
        Ok(link)
    }

    /// Override the maximum frame size (defaults to the RFM95 limit).
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Send exactly `frame` as one datagram.
    pub async fn send(&self, frame: &[u8]) -> Result<()> {
        if frame.len() > self.max_frame_size {
            return Err(TransportError::FrameTooLarge {
                size: frame.len(),
                max: self.max_frame_size,
            });
        }
        self.socket.send(frame).await?;
        Ok(())
    }

    /// Wait for one datagram and copy it into `buf`.
    pub async fn receive(&self, buf: &mut [u8]) -> Result<usize> {
        let (len, from) = self.socket.recv_from(buf).await?;
        debug!(len, %from, "async udp frame received");
        Ok(len)
    }

    /// Largest frame this link carries.
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Local address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(Into::into)
    }

    /// Consume the link and hand back the socket, e.g. for `UdpFramed`.
    pub fn into_socket(self) -> UdpSocket {
        self.socket
    }
}
