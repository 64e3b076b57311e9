//! Capture stage: pull datagrams off the socket as fast as possible.
//!
//! The kernel socket buffer is finite, and a slow consumer causes silent
//! datagram loss. This stage therefore does nothing but read, timestamp, and
//! append to the handoff queue; decoding and storage run elsewhere on the
//! record stage's schedule. Hand-off is a single append under a short-held
//! lock, so the capture loop never waits on storage I/O.

use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::CaptureConfig;
use crate::error::{PaddockError, Result};
use crate::queue::HandoffQueue;
use crate::types::{TimestampedDatagram, posix_now};

/// Upper bound on a telemetry datagram. Every 2019 packet fits with room to
/// spare.
pub const MAX_DATAGRAM_SIZE: usize = 2048;

/// Owns the telemetry socket and feeds the handoff queue.
pub struct CaptureStage {
    socket: UdpSocket,
    local_addr: SocketAddr,
    queue: Arc<HandoffQueue>,
    cancel: CancellationToken,
}

impl CaptureStage {
    /// Bind the telemetry socket. A bind or option failure is fatal: the
    /// flow cannot proceed without its socket.
    pub fn bind(
        config: &CaptureConfig,
        queue: Arc<HandoffQueue>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let socket = bind_shared_udp(config.port)?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| PaddockError::socket_error("query local address", e))?;
        Ok(Self { socket, local_addr, queue, cancel })
    }

    /// The address actually bound (resolves the port when configured as 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Receive loop: one bounded read per socket wakeup, stamped with the
    /// current time and handed off. Exits on cancellation with the same
    /// latency as a real datagram.
    pub async fn run(self) {
        info!(
            "Capture stage started, reading UDP datagrams from port {}",
            self.local_addr.port()
        );
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                received = self.socket.recv_from(&mut buf) => {
                    let timestamp = posix_now();
                    match received {
                        Ok((len, _source)) => {
                            self.queue.push(TimestampedDatagram {
                                timestamp,
                                bytes: buf[..len].to_vec(),
                            });
                        }
                        Err(e) => warn!("UDP receive error: {e}"),
                    }
                }
            }
        }
        info!("Capture stage stopped");
    }
}

/// Build a UDP socket that allows multiple local listeners on the same port:
/// address reuse always, port reuse where the platform distinguishes the two.
fn bind_shared_udp(port: u16) -> Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| PaddockError::socket_error("create UDP socket", e))?;

    socket
        .set_nonblocking(true)
        .map_err(|e| PaddockError::socket_error("set non-blocking", e))?;
    socket
        .set_reuse_address(true)
        .map_err(|e| PaddockError::socket_error("set reuse address", e))?;
    #[cfg(unix)]
    socket
        .set_reuse_port(true)
        .map_err(|e| PaddockError::socket_error("set reuse port", e))?;

    // Accept datagrams from any host.
    let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
    socket
        .bind(&bind_addr.into())
        .map_err(|e| PaddockError::socket_error(format!("bind UDP port {port}"), e))?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
        .map_err(|e| PaddockError::socket_error("register socket with the runtime", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn captures_datagrams_and_stops_on_cancellation() {
        let queue = Arc::new(HandoffQueue::new());
        let cancel = CancellationToken::new();
        let stage = CaptureStage::bind(
            &CaptureConfig { port: 0 },
            Arc::clone(&queue),
            cancel.clone(),
        )
        .expect("bind ephemeral port");
        let port = stage.local_addr().port();
        let task = tokio::spawn(stage.run());

        let client = UdpSocket::bind("127.0.0.1:0").await.expect("client socket");
        client.send_to(b"first", ("127.0.0.1", port)).await.expect("send");
        client.send_to(b"second", ("127.0.0.1", port)).await.expect("send");

        let mut batch = Vec::new();
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            batch.extend(queue.swap());
            if batch.len() >= 2 {
                break;
            }
        }

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].bytes, b"first");
        assert_eq!(batch[1].bytes, b"second");
        assert!(batch[0].timestamp > 0.0);
        assert!(batch[0].timestamp <= batch[1].timestamp);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("capture task should stop promptly")
            .expect("capture task should not panic");
    }

    #[tokio::test]
    async fn two_listeners_can_share_a_port() {
        let queue_a = Arc::new(HandoffQueue::new());
        let queue_b = Arc::new(HandoffQueue::new());
        let cancel = CancellationToken::new();

        let first = CaptureStage::bind(
            &CaptureConfig { port: 0 },
            Arc::clone(&queue_a),
            cancel.clone(),
        )
        .expect("first bind");
        let port = first.local_addr().port();

        // A second listener on the same port must not fail to bind.
        let second =
            CaptureStage::bind(&CaptureConfig { port }, Arc::clone(&queue_b), cancel.clone());
        assert!(second.is_ok(), "port sharing should be enabled");
    }
}
