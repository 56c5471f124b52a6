// src/core/scanner/port_scanner.rs

use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Attempts a TCP connection to every port in `ports` and returns the open
/// ones in ascending order.
///
/// At most `concurrency` connection attempts are in flight at once and each
/// one carries its own deadline. Refused, unreachable, timed-out and
/// cancelled attempts all count as closed; nothing here aborts the scan.
pub async fn scan_ports(
    ip: Ipv4Addr,
    ports: &[u16],
    connect_timeout: Duration,
    concurrency: usize,
    cancel: &CancellationToken,
) -> Vec<u16> {
    let unique: BTreeSet<u16> = ports.iter().copied().collect();
    info!(%ip, ports = unique.len(), concurrency, "Starting port scan.");

    let mut open: Vec<u16> = stream::iter(unique)
        .map(|port| {
            let cancel = cancel.clone();
            async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!(port, "Port probe cancelled.");
                        None
                    }
                    is_open = check_port(ip, port, connect_timeout) => is_open.then_some(port),
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .filter_map(|port| async move { port })
        .collect()
        .await;

    open.sort_unstable();
    info!(%ip, open = open.len(), "Port scan finished.");
    open
}

async fn check_port(ip: Ipv4Addr, port: u16, connect_timeout: Duration) -> bool {
    let addr = SocketAddr::from((ip, port));
    match timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => {
            debug!(%addr, "Port open.");
            true
        }
        Ok(Err(e)) => {
            debug!(%addr, error = %e, "Port closed.");
            false
        }
        Err(_) => {
            debug!(%addr, "Connect timed out.");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn free_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn reports_exactly_the_listening_ports() {
        let web = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let tls = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let web_port = web.local_addr().unwrap().port();
        let tls_port = tls.local_addr().unwrap().port();
        let closed = free_port().await;

        let open = scan_ports(
            Ipv4Addr::LOCALHOST,
            &[closed, tls_port, web_port, web_port],
            Duration::from_millis(500),
            16,
            &CancellationToken::new(),
        )
        .await;

        let mut expected = vec![web_port, tls_port];
        expected.sort_unstable();
        assert_eq!(open, expected);
    }

    #[tokio::test]
    async fn cancelled_scan_reports_nothing_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let open = scan_ports(
            Ipv4Addr::LOCALHOST,
            &[port],
            Duration::from_millis(500),
            4,
            &cancel,
        )
        .await;
        assert!(open.is_empty());
    }
}
