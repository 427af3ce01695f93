//! Loopback TCP port probing with timeouts and bounded concurrency.
//!
//! A port carries two independent signals: whether a connect to it on the
//! loopback interface succeeds (`Open`/`Closed`) and whether the host
//! socket table shows a listener on it. The two are probed separately and
//! never collapsed into one check; a port can be connect-able without a
//! LISTEN entry.

use std::collections::HashSet;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use hostguard_core::{PortState, ProbeError};
use netstat2::{get_sockets_info, AddressFamilyFlags, ProtocolFlags, ProtocolSocketInfo, TcpState};
use rand::{thread_rng, Rng};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, warn};

/// One probed port: connect verdict plus socket-table listening flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortObservation {
    pub port: u16,
    pub state: PortState,
    pub is_listening: bool,
}

/// Tuning for a sweep over a set of ports.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Per-port connect timeout.
    pub timeout: Duration,
    /// Max in-flight connect attempts.
    pub concurrency: usize,
    /// Probe launches per second; `None` disables pacing.
    pub qps: Option<u32>,
    /// Retries per port on probe failure (not on a `Closed` verdict).
    pub retries: u32,
    /// Base delay between retries, grown exponentially with jitter.
    pub retry_delay: Duration,
}

impl Default for SweepOptions {
    fn default() -> Self {
        SweepOptions {
            timeout: Duration::from_secs(1),
            concurrency: 256,
            qps: None,
            retries: 0,
            retry_delay: Duration::from_millis(50),
        }
    }
}

/// Attempt a TCP connect to 127.0.0.1:port with a bounded timeout.
/// A successful connect (stream dropped immediately) means `Open`; timeout
/// and connection-refused mean `Closed`. Anything else is a probe error
/// for the caller to log and skip.
pub async fn connect_probe(port: u16, per_port: Duration) -> Result<PortState, ProbeError> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    match timeout(per_port, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => Ok(PortState::Open),
        Err(_elapsed) => Ok(PortState::Closed),
        Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => Ok(PortState::Closed),
        Ok(Err(e)) => Err(ProbeError::Connect { port, source: e }),
    }
}

/// Local ports with a LISTEN entry in the host's TCP socket table
/// (IPv4 and IPv6). Purely observational.
pub fn listening_ports() -> Result<HashSet<u16>, ProbeError> {
    let af = AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6;
    let sockets = get_sockets_info(af, ProtocolFlags::TCP)
        .map_err(|e| ProbeError::SocketTable(e.to_string()))?;
    let mut listening = HashSet::new();
    for si in sockets {
        if let ProtocolSocketInfo::Tcp(tcp) = si.protocol_socket_info {
            if tcp.state == TcpState::Listen {
                listening.insert(tcp.local_port);
            }
        }
    }
    Ok(listening)
}

/// Probe every given port concurrently, bounded by a semaphore, with
/// optional QPS pacing and per-port retries. The socket table is
/// snapshotted once per sweep; each observation's listening flag is
/// membership in that snapshot. Per-port failures are logged and the port
/// omitted; the sweep runs to completion over the rest. Only a
/// socket-table enumeration failure aborts the sweep. Results come back
/// sorted by port number.
pub async fn sweep(ports: &[u16], opts: &SweepOptions) -> Result<Vec<PortObservation>, ProbeError> {
    let listen_set = Arc::new(listening_ports()?);
    let sem = Arc::new(Semaphore::new(opts.concurrency.max(1)));
    let (tx, mut rx) = mpsc::channel::<PortObservation>(ports.len().max(1));
    let mut ticker = opts.qps.map(|q| {
        let mut it = interval(Duration::from_millis((1000u32 / q.max(1)) as u64));
        it.set_missed_tick_behavior(MissedTickBehavior::Delay);
        it
    });

    for &port in ports {
        if let Some(t) = ticker.as_mut() {
            t.tick().await;
        }
        let tx = tx.clone();
        let sem = sem.clone();
        let listen = listen_set.clone();
        let per_port = opts.timeout;
        let retries = opts.retries;
        let retry_delay = opts.retry_delay;
        tokio::spawn(async move {
            let _permit = sem.acquire_owned().await.unwrap();
            let mut attempts = 0u32;
            loop {
                match connect_probe(port, per_port).await {
                    Ok(state) => {
                        let ob = PortObservation {
                            port,
                            state,
                            is_listening: listen.contains(&port),
                        };
                        let _ = tx.send(ob).await;
                        break;
                    }
                    Err(e) if attempts < retries => {
                        attempts += 1;
                        let base = retry_delay.as_millis() as u64;
                        let exp = base.saturating_mul(1u64 << attempts.min(6));
                        let jitter = thread_rng().gen_range(0..(exp / 4 + 1));
                        debug!(port, error = %e, attempt = attempts, "probe retry");
                        tokio::time::sleep(Duration::from_millis(exp + jitter)).await;
                    }
                    Err(e) => {
                        warn!(port, error = %e, "port probe failed, skipping");
                        break;
                    }
                }
            }
        });
    }
    drop(tx);

    let mut observations = Vec::with_capacity(ports.len());
    while let Some(ob) = rx.recv().await {
        observations.push(ob);
    }
    observations.sort_unstable_by_key(|o| o.port);
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserve_closed_port() -> u16 {
        // Bind then drop: the port is free again immediately after.
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn connect_probe_sees_a_listener() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let state = connect_probe(port, Duration::from_secs(1)).await.unwrap();
        assert_eq!(state, PortState::Open);
    }

    #[tokio::test]
    async fn connect_probe_reports_closed_port() {
        let port = reserve_closed_port();
        let state = connect_probe(port, Duration::from_secs(1)).await.unwrap();
        assert_eq!(state, PortState::Closed);
    }

    #[test]
    fn socket_table_includes_bound_listener() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let set = listening_ports().unwrap();
        assert!(set.contains(&port));
    }

    #[tokio::test]
    async fn sweep_observes_both_signals() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let open_port = listener.local_addr().unwrap().port();
        let closed_port = reserve_closed_port();

        let opts = SweepOptions::default();
        let mut ports = vec![open_port, closed_port];
        ports.sort_unstable();
        let obs = sweep(&ports, &opts).await.unwrap();

        assert_eq!(obs.len(), 2);
        // Sorted by port number.
        assert!(obs[0].port < obs[1].port);
        let open_ob = obs.iter().find(|o| o.port == open_port).unwrap();
        assert_eq!(open_ob.state, PortState::Open);
        assert!(open_ob.is_listening);
        let closed_ob = obs.iter().find(|o| o.port == closed_port).unwrap();
        assert_eq!(closed_ob.state, PortState::Closed);
        assert!(!closed_ob.is_listening);
    }
}
