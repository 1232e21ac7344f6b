use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::link::{Link, RFM95_MAX_MESSAGE_LEN};

/// UDP datagram link.
///
/// One UDP datagram carries one telemetry frame, so the framing seen by the
/// codec is identical to the radio's. Receivers bind; transmitters bind an
/// ephemeral local port and connect to the receiver.
#[derive(Debug)]
pub struct UdpLink {
    socket: UdpSocket,
    max_frame_size: usize,
}

impl UdpLink {
    /// Poll interval used by [`UdpLink::receive`] when nothing is pending.
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

    /// Bind a receiving link on `addr`.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr).map_err(|source| TransportError::Bind { addr, source })?;
        socket.set_read_timeout(Some(Self::DEFAULT_READ_TIMEOUT))?;

        info!(addr = %socket.local_addr()?, "udp link bound");
        Ok(Self {
            socket,
            max_frame_size: RFM95_MAX_MESSAGE_LEN,
        })
    }

    /// Create a transmitting link that sends every frame to `remote`.
    pub fn connect(remote: SocketAddr) -> Result<Self> {
        let local: SocketAddr = if remote.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let link = Self::bind(local)?;
        link.socket
            .connect(remote)
            .map_err(|source| TransportError::Connect {
                addr: remote,
                source,
            })?;

        debug!(%remote, "udp link connected");
        Ok(link)
    }

    /// Override the maximum frame size (defaults to the RFM95 limit).
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Set how long [`Link::receive`] blocks before reporting nothing available.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.socket.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Local address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(Into::into)
    }
}

impl Link for UdpLink {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        if frame.len() > self.max_frame_size {
            return Err(TransportError::FrameTooLarge {
                size: frame.len(),
                max: self.max_frame_size,
            });
        }

        loop {
            match self.socket.send(frame) {
                Ok(_) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        match self.socket.recv_from(buf) {
            Ok((len, from)) => {
                debug!(len, %from, "udp frame received");
                Ok(Some(len))
            }
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}
