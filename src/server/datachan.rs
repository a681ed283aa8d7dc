//! The FTP *data* channel: active and passive transfers.
//!
//! A session owns at most one [`DataTransfer`] at a time. Replacing it
//! closes the previous one; for passive transfers that also stops the
//! background accept task and returns the port lease.

use super::controlchan::BoxedIo;
use super::passive_ports::{PortError, PortLease, PortPool};

use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_rustls::TlsAcceptor;

const BIND_RETRIES: u8 = 5;
const KEEPALIVE_PERIOD: Duration = Duration::from_secs(3 * 60);
const BACKOFF_START: Duration = Duration::from_millis(5);
const BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Why a passive transfer could not be set up.
#[derive(Debug, Error)]
pub(crate) enum PassiveError {
    #[error("passive mode is disabled")]
    Disabled,
    #[error("no free passive port")]
    Exhausted,
    #[error("could not open data listener: {0}")]
    Io(#[from] io::Error),
}

impl From<PortError> for PassiveError {
    fn from(err: PortError) -> PassiveError {
        match err {
            PortError::Disabled => PassiveError::Disabled,
            PortError::Exhausted => PassiveError::Exhausted,
        }
    }
}

/// The session's current data transfer.
pub(crate) enum DataTransfer {
    /// No transfer; obtaining a connection fails as "already closed".
    None,
    /// An outbound connection the server dialed (PORT/EPRT).
    Active(ActiveTransfer),
    /// A bound listener waiting for the client to dial in (PASV/EPSV).
    Passive(PassiveTransfer),
}

impl DataTransfer {
    /// Hands out the data connection, waiting for the client in passive
    /// mode. The connection can be obtained once per transfer.
    pub async fn take_conn(&mut self) -> io::Result<BoxedIo> {
        match self {
            DataTransfer::None => Err(already_closed()),
            DataTransfer::Active(t) => t.take_conn().await,
            DataTransfer::Passive(t) => t.take_conn().await,
        }
    }

    /// Closes the transfer and resets the slot to `None`. Sockets close and
    /// passive listeners release their port lease when dropped.
    pub fn close(&mut self) {
        *self = DataTransfer::None;
    }
}

fn already_closed() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "data transfer already closed")
}

/// An active-mode transfer: the server dialed the client's endpoint.
pub(crate) struct ActiveTransfer {
    conn: Option<TcpStream>,
    tls: Option<TlsAcceptor>,
}

impl ActiveTransfer {
    /// Dials the client-announced endpoint. Address and port validation
    /// happen in the PORT/EPRT handlers, which know the right reply codes.
    pub async fn dial(addr: std::net::SocketAddr, tls: Option<TlsAcceptor>) -> io::Result<ActiveTransfer> {
        let conn = TcpStream::connect(addr).await?;
        Ok(ActiveTransfer { conn: Some(conn), tls })
    }

    async fn take_conn(&mut self) -> io::Result<BoxedIo> {
        let conn = self.conn.take().ok_or_else(already_closed)?;
        // The TLS handshake is deferred until the transfer actually starts;
        // clients only speak after reading the preliminary reply.
        match self.tls.take() {
            Some(acceptor) => Ok(Box::new(acceptor.accept(conn).await?)),
            None => Ok(Box::new(conn)),
        }
    }
}

/// A passive-mode transfer: a bound listener plus a rendezvous channel
/// delivering at most one accepted connection.
pub(crate) struct PassiveTransfer {
    port: u16,
    conn_rx: Option<oneshot::Receiver<io::Result<TcpStream>>>,
    // Dropped with the transfer, which unblocks the accept task.
    _close_tx: oneshot::Sender<()>,
    // Dropped with the transfer, which returns the port to the pool.
    _lease: PortLease,
    tls: Option<TlsAcceptor>,
}

impl PassiveTransfer {
    /// Leases a port and starts listening for the client. `peer_ip` is the
    /// control connection's remote address; with `address_check` enabled
    /// only that host may use the data port.
    pub async fn listen(
        pool: &Arc<PortPool>,
        peer_ip: IpAddr,
        address_check: bool,
        tls: Option<TlsAcceptor>,
        logger: slog::Logger,
    ) -> Result<PassiveTransfer, PassiveError> {
        let (lease, listener) = {
            let mut attempts = 0u8;
            loop {
                let lease = pool.choose()?;
                match TcpListener::bind(("0.0.0.0", lease.port())).await {
                    Ok(listener) => break (lease, listener),
                    Err(err) => {
                        // The lease is dropped here, returning the port
                        // before the next attempt picks a fresh one.
                        attempts += 1;
                        if attempts > BIND_RETRIES {
                            return Err(err.into());
                        }
                    }
                }
            }
        };
        let port = listener.local_addr()?.port();

        let (conn_tx, conn_rx) = oneshot::channel();
        let (close_tx, close_rx) = oneshot::channel();
        tokio::spawn(accept_one(listener, peer_ip, address_check, conn_tx, close_rx, logger));

        Ok(PassiveTransfer {
            port,
            conn_rx: Some(conn_rx),
            _close_tx: close_tx,
            _lease: lease,
            tls,
        })
    }

    /// The port the client must dial; advertised in 227/229 replies.
    pub fn port(&self) -> u16 {
        self.port
    }

    async fn take_conn(&mut self) -> io::Result<BoxedIo> {
        let rx = self.conn_rx.take().ok_or_else(already_closed)?;
        let conn = rx
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "data listener closed"))??;
        match self.tls.take() {
            Some(acceptor) => Ok(Box::new(acceptor.accept(conn).await?)),
            None => Ok(Box::new(conn)),
        }
    }
}

// Accepts exactly one valid connection and delivers it over the rendezvous
// channel. Transient accept failures back off; a connection from the wrong
// host is dropped silently and listening continues.
async fn accept_one(
    listener: TcpListener,
    peer_ip: IpAddr,
    address_check: bool,
    conn_tx: oneshot::Sender<io::Result<TcpStream>>,
    mut close_rx: oneshot::Receiver<()>,
    logger: slog::Logger,
) {
    let mut delay = Duration::from_millis(0);
    loop {
        tokio::select! {
            _ = &mut close_rx => return,
            accepted = listener.accept() => match accepted {
                Ok((conn, addr)) => {
                    if address_check && canonical_ip(addr.ip()) != canonical_ip(peer_ip) {
                        slog::warn!(logger, "dropping data connection from unexpected peer"; "peer" => %addr);
                        continue;
                    }
                    if let Err(err) = set_keepalive(&conn) {
                        slog::debug!(logger, "could not arm keep-alive on data connection: {}", err);
                    }
                    let _ = conn_tx.send(Ok(conn));
                    return;
                }
                Err(err) if is_transient(&err) => {
                    delay = if delay.is_zero() { BACKOFF_START } else { BACKOFF_MAX.min(delay * 2) };
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    let _ = conn_tx.send(Err(err));
                    return;
                }
            }
        }
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted | io::ErrorKind::ConnectionReset | io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}

// IPv4-mapped IPv6 addresses compare equal to their IPv4 form, so a client
// on a dual-stack socket is not mistaken for a different host.
pub(crate) fn canonical_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => match v6.octets() {
            [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, a, b, c, d] => IpAddr::V4(Ipv4Addr::new(a, b, c, d)),
            _ => IpAddr::V6(v6),
        },
        v4 => v4,
    }
}

// Dead TCP connections (a laptop closed mid-download) eventually go away.
pub(crate) fn set_keepalive(conn: &TcpStream) -> io::Result<()> {
    let sock = socket2::SockRef::from(conn);
    sock.set_tcp_keepalive(&socket2::TcpKeepalive::new().with_time(KEEPALIVE_PERIOD))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn test_logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    #[tokio::test]
    async fn passive_rendezvous() {
        let pool = Arc::new(PortPool::new(0, 0));
        let mut transfer = PassiveTransfer::listen(&pool, IpAddr::V4(Ipv4Addr::LOCALHOST), true, None, test_logger())
            .await
            .unwrap();
        let port = transfer.port();
        assert_ne!(port, 0);

        let mut client = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let mut conn = transfer.take_conn().await.unwrap();

        client.write_all(b"ping").await.unwrap();
        client.shutdown().await.unwrap();
        let mut got = Vec::new();
        conn.read_to_end(&mut got).await.unwrap();
        assert_eq!(got, b"ping");
    }

    #[tokio::test]
    async fn replacing_a_transfer_releases_its_port() {
        let pool = Arc::new(PortPool::new(0, 0));
        let transfer = PassiveTransfer::listen(&pool, IpAddr::V4(Ipv4Addr::LOCALHOST), true, None, test_logger())
            .await
            .unwrap();
        let port = transfer.port();

        let mut dt = DataTransfer::Passive(transfer);
        dt.close();

        // Once the accept task has wound down the port is free again.
        for _ in 0..50 {
            if TcpListener::bind(("0.0.0.0", port)).await.is_ok() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("port {} still bound after close", port);
    }

    #[tokio::test]
    async fn none_transfer_refuses_connections() {
        let mut dt = DataTransfer::None;
        let err = dt.take_conn().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn mapped_ipv4_compares_equal() {
        let mapped: IpAddr = "::ffff:192.0.2.1".parse().unwrap();
        let plain: IpAddr = "192.0.2.1".parse().unwrap();
        assert_eq!(canonical_ip(mapped), canonical_ip(plain));

        let v6: IpAddr = "2001:db8::1".parse().unwrap();
        assert_eq!(canonical_ip(v6), v6);
    }
}
