//! Socket abstraction the state machine and dispatcher send/receive
//! through, so tests can substitute an in-memory pair for a real UDP
//! socket (spec §9, "replacement of duck-typed socket").

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// The capability set a NOTIFY round needs from a socket: send, receive,
/// and a way to wait for readability without consuming the wait.
#[async_trait]
pub trait NotifySocket: Send + Sync {
    async fn send(&self, buf: &[u8]) -> io::Result<usize>;
    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;
    async fn readable(&self) -> io::Result<()>;
}

/// Production socket: a UDP socket connected to exactly one target, bound
/// to an OS-assigned ephemeral port matching the target's address family.
pub struct UdpNotifySocket {
    inner: UdpSocket,
}

impl UdpNotifySocket {
    pub async fn connect(target: SocketAddr) -> io::Result<Self> {
        let bind_addr: SocketAddr = if target.is_ipv4() {
            (std::net::Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(target).await?;
        Ok(Self { inner: socket })
    }
}

#[async_trait]
impl NotifySocket for UdpNotifySocket {
    async fn send(&self, buf: &[u8]) -> io::Result<usize> {
        self.inner.send(buf).await
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.recv(buf).await
    }

    async fn readable(&self) -> io::Result<()> {
        self.inner.readable().await
    }
}
