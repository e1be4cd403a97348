//! The request/reply daemon the monitor polls.

use std::io;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use hashfleet_core::wire;

use crate::collector::HostCollector;

/// Requests are the literal strings "summary" or "threads"; anything longer
/// is already unrecognized.
const MAX_REQUEST_BYTES: usize = 64;

/// Listening half of the collector daemon.
pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// Bind the fixed listening port. Failure here is fatal at startup;
    /// the caller reports it once and exits non-zero.
    pub async fn bind(port: u16) -> io::Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop: one task per connection, one request per connection.
    pub async fn run(self, collector: HostCollector, mut shutdown: watch::Receiver<bool>) {
        if let Ok(addr) = self.local_addr() {
            info!(%addr, "collector listening");
        }
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(err) => {
                            warn!(error = %err, "accept failed");
                            continue;
                        }
                    };
                    let collector = collector.clone();
                    tokio::spawn(async move {
                        if let Err(err) = answer(stream, collector).await {
                            debug!(peer = %peer, error = %err, "request failed");
                        }
                    });
                }
            }
        }
        info!("collector stopped");
    }
}

async fn answer(mut stream: TcpStream, collector: HostCollector) -> io::Result<()> {
    let mut buf = [0u8; MAX_REQUEST_BYTES];
    let n = stream.read(&mut buf).await?;
    let request = String::from_utf8_lossy(&buf[..n]);

    let reply = match request.trim() {
        "summary" => wire::encode_summary(&collector.summary().await.as_reading()),
        "threads" => wire::encode_threads(&collector.threads().await),
        other => {
            // Unrecognized requests are ignored: close with no reply.
            debug!(request = %other, "unrecognized request");
            return Ok(());
        }
    };

    stream.write_all(reply.as_bytes()).await?;
    stream.shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashfleet_core::RawReading;
    use std::time::Duration;

    async fn fake_miner(reply: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 64];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(reply.as_bytes()).await;
            }
        });
        addr
    }

    async fn ask(addr: &std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
        let mut reply = String::new();
        stream.read_to_string(&mut reply).await.unwrap();
        reply
    }

    #[tokio::test]
    async fn answers_summary_requests_end_to_end() {
        let mut reading = RawReading::default();
        reading.name = "cpuminer".into();
        reading.cpu_count = 4;
        reading.hash_rate_khps = 2.5;
        let miner = fake_miner(wire::encode_summary(&reading)).await;

        let collector = HostCollector::with_endpoints(vec![miner], Duration::from_secs(1));
        let server = Server::bind(0).await.unwrap();
        let addr = server.local_addr().unwrap();
        let (_tx, rx) = watch::channel(false);
        tokio::spawn(server.run(collector, rx));

        let reply = ask(&addr, "summary").await;
        let decoded = wire::decode_summary(&reply).unwrap();
        assert_eq!(decoded.cpu_count, 4);
        assert!((decoded.hash_rate_khps - 2.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unrecognized_requests_get_no_reply() {
        let collector = HostCollector::with_endpoints(vec![], Duration::from_millis(100));
        let server = Server::bind(0).await.unwrap();
        let addr = server.local_addr().unwrap();
        let (_tx, rx) = watch::channel(false);
        tokio::spawn(server.run(collector, rx));

        let reply = ask(&addr, "reboot").await;
        assert!(reply.is_empty());
    }

    #[tokio::test]
    async fn summary_with_no_miners_is_zeroed_not_an_error() {
        let collector = HostCollector::with_endpoints(vec![], Duration::from_millis(100));
        let server = Server::bind(0).await.unwrap();
        let addr = server.local_addr().unwrap();
        let (_tx, rx) = watch::channel(false);
        tokio::spawn(server.run(collector, rx));

        let decoded = wire::decode_summary(&ask(&addr, "summary").await).unwrap();
        assert_eq!(decoded.cpu_count, 0);
        assert_eq!(decoded.hash_rate_khps, 0.0);
    }
}
