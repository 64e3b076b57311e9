//! Playback engine: re-emit a recorded session over UDP with original pacing.
//!
//! Records are read back in storage order (equal to capture order) and sent
//! bit-for-bit: the engine never re-encodes. Pacing is reconstructed from the
//! recorded capture timestamps against a fixed playback origin, so scheduling
//! jitter on one packet never shifts the packets after it.

use rusqlite::{Connection, OpenFlags};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace};

use crate::config::{PlaybackConfig, ReplayDestination};
use crate::error::{PaddockError, Result};

const SELECT_PACKETS: &str = "SELECT timestamp, packet FROM packets ORDER BY pkt_id";

/// Replays one session store over UDP.
#[derive(Debug)]
pub struct Player {
    conn: Connection,
    path: PathBuf,
    config: PlaybackConfig,
}

/// What a finished (or cancelled) replay did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSummary {
    pub packets_sent: u64,
    pub elapsed: Duration,
    pub cancelled: bool,
}

impl Player {
    /// Open a session store for replay.
    ///
    /// The store is opened read-only and its `packets` table is checked up
    /// front, so a wrong file fails here rather than mid-replay.
    pub fn open<P: AsRef<Path>>(path: P, config: PlaybackConfig) -> Result<Self> {
        if !(config.realtime_factor > 0.0 && config.realtime_factor.is_finite()) {
            return Err(PaddockError::config_error(format!(
                "realtime factor must be positive and finite, got {}",
                config.realtime_factor
            )));
        }

        let path = path.as_ref().to_path_buf();
        let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| PaddockError::store_error(&path, e))?;

        let table_exists: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'packets'",
                [],
                |row| row.get(0),
            )
            .map_err(|e| PaddockError::store_error(&path, e))?;
        if table_exists == 0 {
            return Err(PaddockError::store_schema_error(&path, "no packets table"));
        }

        Ok(Self { conn, path, config })
    }

    /// Number of recorded packets in the store.
    pub fn packet_count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM packets", [], |row| row.get::<_, i64>(0))
            .map(|n| n as u64)
            .map_err(|e| PaddockError::store_error(&self.path, e))
    }

    /// Replay the store to the configured destination.
    ///
    /// For the first record, a playback origin `T0 = now` is established;
    /// record `i` with capture time `t_i` targets
    /// `T0 + (t_i - t_0) / realtime_factor`. A late wake sends immediately
    /// rather than skipping: completeness wins over strict timing, and
    /// because every target derives from the original timestamps, lateness
    /// never compounds.
    pub async fn play(&mut self, cancel: CancellationToken) -> Result<PlaybackSummary> {
        let socket = open_egress(&self.config).await?;
        info!(
            "Replaying {} at {}x to {}",
            self.path.display(),
            self.config.realtime_factor,
            describe_destination(&self.config),
        );

        let realtime_factor = self.config.realtime_factor;
        let mut stmt = self
            .conn
            .prepare(SELECT_PACKETS)
            .map_err(|e| PaddockError::store_error(&self.path, e))?;
        let mut rows = stmt.query([]).map_err(|e| PaddockError::store_error(&self.path, e))?;

        let playback_origin = Instant::now();
        let mut origin_timestamp: Option<f64> = None;
        let mut packets_sent = 0u64;
        let mut was_cancelled = false;

        loop {
            let row = match rows.next().map_err(|e| PaddockError::store_error(&self.path, e))? {
                Some(row) => row,
                None => break,
            };
            let timestamp: f64 =
                row.get(0).map_err(|e| PaddockError::store_error(&self.path, e))?;
            let bytes: Vec<u8> =
                row.get(1).map_err(|e| PaddockError::store_error(&self.path, e))?;

            let t0 = *origin_timestamp.get_or_insert(timestamp);
            let offset = ((timestamp - t0) / realtime_factor).max(0.0);
            let target = playback_origin + Duration::from_secs_f64(offset);

            tokio::select! {
                _ = cancel.cancelled() => {
                    was_cancelled = true;
                    break;
                }
                _ = tokio::time::sleep_until(target) => {}
            }

            socket
                .send(&bytes)
                .await
                .map_err(|e| PaddockError::socket_error("send replayed datagram", e))?;
            packets_sent += 1;
            trace!("Sent packet {packets_sent} captured at {timestamp:.6}");
        }

        let summary = PlaybackSummary {
            packets_sent,
            elapsed: playback_origin.elapsed(),
            cancelled: was_cancelled,
        };
        if was_cancelled {
            info!("Playback cancelled after {} packets", summary.packets_sent);
        } else {
            info!(
                "Replayed {} packets in {:.3} s",
                summary.packets_sent,
                summary.elapsed.as_secs_f64()
            );
        }
        Ok(summary)
    }
}

fn describe_destination(config: &PlaybackConfig) -> String {
    match config.destination {
        ReplayDestination::Broadcast => format!("<broadcast>:{}", config.port),
        ReplayDestination::Unicast(addr) => format!("{}:{}", addr, config.port),
    }
}

/// UDP socket connected to the replay destination.
async fn open_egress(config: &PlaybackConfig) -> Result<UdpSocket> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .await
        .map_err(|e| PaddockError::socket_error("bind replay socket", e))?;

    match config.destination {
        ReplayDestination::Broadcast => {
            socket
                .set_broadcast(true)
                .map_err(|e| PaddockError::socket_error("enable broadcast", e))?;
            socket
                .connect((Ipv4Addr::BROADCAST, config.port))
                .await
                .map_err(|e| PaddockError::socket_error("connect broadcast destination", e))?;
        }
        ReplayDestination::Unicast(addr) => {
            socket
                .connect((addr, config.port))
                .await
                .map_err(|e| PaddockError::socket_error("connect unicast destination", e))?;
        }
    }
    Ok(socket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PacketHeader;
    use crate::record::SessionStoreManager;
    use crate::types::SessionRecord;
    use std::net::IpAddr;
    use tempfile::TempDir;

    fn seeded_store(dir: &TempDir, timestamps: &[f64]) -> PathBuf {
        let mut manager = SessionStoreManager::new(dir.path());
        let records: Vec<SessionRecord> = timestamps
            .iter()
            .enumerate()
            .map(|(i, &timestamp)| {
                let header = PacketHeader {
                    packet_format: 2019,
                    packet_version: 1,
                    packet_id: 3,
                    session_uid: 0x51,
                    frame_identifier: i as u32,
                    ..Default::default()
                };
                SessionRecord::new(timestamp, &header, vec![i as u8; 8 + i])
            })
            .collect();
        manager.write_batch(&records).expect("seed store");
        manager.close();
        SessionStoreManager::store_path(dir.path(), "0000000000000051")
    }

    fn unicast_config(port: u16, realtime_factor: f64) -> PlaybackConfig {
        PlaybackConfig {
            destination: ReplayDestination::Unicast(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            port,
            realtime_factor,
        }
    }

    #[test]
    fn rejects_nonpositive_realtime_factors() {
        let dir = TempDir::new().expect("tempdir");
        let path = seeded_store(&dir, &[0.0]);

        for factor in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = Player::open(&path, unicast_config(9, factor)).unwrap_err();
            assert!(matches!(err, PaddockError::Config { .. }), "factor {factor}");
        }
    }

    #[test]
    fn rejects_files_without_a_packets_table() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("not_a_store.sqlite3");
        let conn = Connection::open(&path).expect("create db");
        conn.execute("CREATE TABLE other (x INTEGER)", []).expect("create");
        drop(conn);

        let err = Player::open(&path, unicast_config(9, 1.0)).unwrap_err();
        assert!(matches!(err, PaddockError::StoreSchema { .. }));
    }

    #[test]
    fn rejects_missing_files() {
        let dir = TempDir::new().expect("tempdir");
        let err = Player::open(dir.path().join("absent.sqlite3"), unicast_config(9, 1.0))
            .unwrap_err();
        assert!(matches!(err, PaddockError::Store { .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn replays_bit_identical_bytes_with_original_pacing() {
        let dir = TempDir::new().expect("tempdir");
        let path = seeded_store(&dir, &[10.0, 10.2, 10.5]);

        let listener = UdpSocket::bind("127.0.0.1:0").await.expect("listener");
        let port = listener.local_addr().expect("addr").port();

        let mut player = Player::open(&path, unicast_config(port, 1.0)).expect("open");
        assert_eq!(player.packet_count().expect("count"), 3);

        let start = Instant::now();
        let play = tokio::spawn(async move { player.play(CancellationToken::new()).await });

        let mut received = Vec::new();
        let mut buf = [0u8; 2048];
        for _ in 0..3 {
            let len = tokio::time::timeout(Duration::from_secs(5), listener.recv(&mut buf))
                .await
                .expect("datagram within deadline")
                .expect("recv");
            received.push((start.elapsed().as_secs_f64(), buf[..len].to_vec()));
        }

        let summary = play.await.expect("join").expect("play");
        assert_eq!(summary.packets_sent, 3);
        assert!(!summary.cancelled);

        // Round trip is bit-identical.
        assert_eq!(received[0].1, vec![0u8; 8]);
        assert_eq!(received[1].1, vec![1u8; 9]);
        assert_eq!(received[2].1, vec![2u8; 10]);

        // Offsets approximate the original inter-arrival gaps.
        let tolerance = 0.15;
        assert!(received[0].0 < tolerance, "first offset {}", received[0].0);
        assert!((received[1].0 - 0.2).abs() < tolerance, "second offset {}", received[1].0);
        assert!((received[2].0 - 0.5).abs() < tolerance, "third offset {}", received[2].0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn realtime_factor_compresses_the_schedule() {
        let dir = TempDir::new().expect("tempdir");
        let path = seeded_store(&dir, &[0.0, 0.4]);

        let listener = UdpSocket::bind("127.0.0.1:0").await.expect("listener");
        let port = listener.local_addr().expect("addr").port();

        let mut player = Player::open(&path, unicast_config(port, 2.0)).expect("open");

        let start = Instant::now();
        let play = tokio::spawn(async move { player.play(CancellationToken::new()).await });

        let mut buf = [0u8; 2048];
        let mut offsets = Vec::new();
        for _ in 0..2 {
            tokio::time::timeout(Duration::from_secs(5), listener.recv(&mut buf))
                .await
                .expect("datagram within deadline")
                .expect("recv");
            offsets.push(start.elapsed().as_secs_f64());
        }
        play.await.expect("join").expect("play");

        // 0.4 s of recorded gap at 2x lands around 0.2 s.
        assert!((offsets[1] - 0.2).abs() < 0.15, "second offset {}", offsets[1]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancellation_stops_the_replay_early() {
        let dir = TempDir::new().expect("tempdir");
        let path = seeded_store(&dir, &[0.0, 60.0]);

        let listener = UdpSocket::bind("127.0.0.1:0").await.expect("listener");
        let port = listener.local_addr().expect("addr").port();

        let mut player = Player::open(&path, unicast_config(port, 1.0)).expect("open");
        let cancel = CancellationToken::new();
        let cancel_handle = cancel.clone();
        let play = tokio::spawn(async move { player.play(cancel).await });

        // First packet arrives immediately; the second is a minute out.
        let mut buf = [0u8; 2048];
        tokio::time::timeout(Duration::from_secs(5), listener.recv(&mut buf))
            .await
            .expect("first datagram")
            .expect("recv");

        cancel_handle.cancel();
        let summary = tokio::time::timeout(Duration::from_secs(2), play)
            .await
            .expect("cancellation should end playback promptly")
            .expect("join")
            .expect("play");
        assert!(summary.cancelled);
        assert_eq!(summary.packets_sent, 1);
    }
}
