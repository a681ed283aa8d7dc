//! Contains the [`Server`] that accepts control connections and runs a
//! session for each.

pub mod error;

pub use error::ServerError;

use crate::auth::{Anonymous, Authorizer};
use crate::server::controlchan::control_loop;
use crate::server::datachan::set_keepalive;
use crate::server::passive_ports::PortPool;
use crate::server::shutdown;
use crate::server::tls;
use crate::vfs::{Null, Vfs};

use std::net::IpAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const DEFAULT_GREETING: &str = "Service ready";
const ACCEPT_BACKOFF_START: Duration = Duration::from_millis(5);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

// Everything a session needs from the server, shared by reference.
pub(crate) struct ServerState {
    pub greeting: String,
    pub authorizer: Arc<dyn Authorizer>,
    pub vfs: Arc<dyn Vfs>,
    pub port_pool: Arc<PortPool>,
    pub tls_config: Option<Arc<rustls::ServerConfig>>,
    pub public_ips: Vec<IpAddr>,
    pub enable_active_mode: bool,
    pub enable_address_check: bool,
    pub logger: slog::Logger,
}

impl ServerState {
    #[cfg(test)]
    pub(crate) fn for_tests() -> ServerState {
        ServerState {
            greeting: DEFAULT_GREETING.to_string(),
            authorizer: Arc::new(Anonymous),
            vfs: Arc::new(Null),
            port_pool: Arc::new(PortPool::new(0, 0)),
            tls_config: None,
            public_ips: Vec::new(),
            enable_active_mode: false,
            enable_address_check: true,
            logger: slog::Logger::root(slog::Discard, slog::o!()),
        }
    }
}

/// An FTP(S) server that exposes a [`Vfs`] to clients.
///
/// Configured in a builder style and then started with [`listen`] or
/// [`serve`]:
///
/// ```no_run
/// use s3ftpgateway::Server;
/// use s3ftpgateway::vfs::Memory;
/// use std::sync::Arc;
///
/// # async fn run() {
/// let server = Server::new().vfs(Arc::new(Memory::new()));
/// server.listen("0.0.0.0:2121").await.unwrap();
/// # }
/// ```
///
/// [`listen`]: Server::listen
/// [`serve`]: Server::serve
pub struct Server {
    greeting: String,
    authorizer: Arc<dyn Authorizer>,
    vfs: Arc<dyn Vfs>,
    port_pool: Arc<PortPool>,
    tls_config: Option<Arc<rustls::ServerConfig>>,
    public_ips: Vec<IpAddr>,
    enable_active_mode: bool,
    enable_address_check: bool,
    logger: slog::Logger,
    shutdown_topic: Arc<shutdown::Notifier>,
    shutting_down: AtomicBool,
}

impl Default for Server {
    fn default() -> Server {
        Server::new()
    }
}

impl Server {
    /// Creates a server with the defaults: anonymous read-only access to a
    /// [`Null`] file system, passive ports picked by the operating system,
    /// active mode off and address checking on.
    pub fn new() -> Server {
        Server {
            greeting: DEFAULT_GREETING.to_string(),
            authorizer: Arc::new(Anonymous),
            vfs: Arc::new(Null),
            port_pool: Arc::new(PortPool::new(0, 0)),
            tls_config: None,
            public_ips: Vec::new(),
            enable_active_mode: false,
            enable_address_check: true,
            logger: slog::Logger::root(slog::Discard, slog::o!()),
            shutdown_topic: Arc::new(shutdown::Notifier::new()),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Sets the greeting sent with the `220` welcome reply.
    pub fn greeting<T: Into<String>>(mut self, greeting: T) -> Server {
        self.greeting = greeting.into();
        self
    }

    /// Sets the [`Authorizer`] deciding who may log in.
    pub fn authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Server {
        self.authorizer = authorizer;
        self
    }

    /// Sets the virtual file system served to clients.
    pub fn vfs(mut self, vfs: Arc<dyn Vfs>) -> Server {
        self.vfs = vfs;
        self
    }

    /// Sets the inclusive passive-mode port range. A range with
    /// `min > max` disables passive mode; `max == 0` lets the operating
    /// system choose.
    pub fn passive_ports(mut self, min: i32, max: i32) -> Server {
        self.port_pool = Arc::new(PortPool::new(min, max));
        self
    }

    /// Sets the public addresses advertised in `PASV` replies; the first
    /// IPv4 entry wins.
    pub fn public_ips(mut self, ips: Vec<IpAddr>) -> Server {
        self.public_ips = ips;
        self
    }

    /// Enables the `PORT`/`EPRT` commands, which are off by default
    /// because of their bounce-attack potential.
    pub fn enable_active_mode(mut self, enabled: bool) -> Server {
        self.enable_active_mode = enabled;
        self
    }

    /// Toggles the requirement that data-connection peers match the
    /// control peer. On by default.
    pub fn enable_address_check(mut self, enabled: bool) -> Server {
        self.enable_address_check = enabled;
        self
    }

    /// Loads a PEM certificate chain and private key, enabling `AUTH TLS`
    /// on plain listeners and [`serve_tls`](Server::serve_tls) for
    /// implicit TLS.
    pub fn ftps<P: AsRef<Path>>(mut self, certs_file: P, key_file: P) -> std::io::Result<Server> {
        self.tls_config = Some(tls::new_config(certs_file, key_file)?);
        Ok(self)
    }

    /// Sets the root logger; sessions derive their own child loggers.
    pub fn logger(mut self, logger: slog::Logger) -> Server {
        self.logger = logger;
        self
    }

    fn state(&self) -> Arc<ServerState> {
        Arc::new(ServerState {
            greeting: self.greeting.clone(),
            authorizer: Arc::clone(&self.authorizer),
            vfs: Arc::clone(&self.vfs),
            port_pool: Arc::clone(&self.port_pool),
            tls_config: self.tls_config.clone(),
            public_ips: self.public_ips.clone(),
            enable_active_mode: self.enable_active_mode,
            enable_address_check: self.enable_address_check,
            logger: self.logger.clone(),
        })
    }

    /// Binds `addr` and serves plain FTP (with `AUTH TLS` available when a
    /// certificate is configured).
    pub async fn listen(&self, addr: &str) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serves plain FTP on an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        self.serve_inner(listener, false).await
    }

    /// Serves implicit-TLS FTP: every accepted connection handshakes
    /// before the greeting. Requires [`ftps`](Server::ftps).
    pub async fn serve_tls(&self, listener: TcpListener) -> Result<(), ServerError> {
        if self.tls_config.is_none() {
            return Err(ServerError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "serve_tls requires a TLS configuration",
            )));
        }
        self.serve_inner(listener, true).await
    }

    async fn serve_inner(&self, listener: TcpListener, implicit_tls: bool) -> Result<(), ServerError> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(ServerError::Closed);
        }
        let state = self.state();
        let mut shutdown_rx = self.shutdown_topic.subscribe().await;
        let mut delay = Duration::from_millis(0);

        loop {
            let accepted = tokio::select! {
                _ = shutdown_rx.listen() => return Err(ServerError::Closed),
                accepted = listener.accept() => accepted,
            };
            match accepted {
                Ok((stream, peer)) => {
                    delay = Duration::from_millis(0);
                    slog::info!(state.logger, "incoming control connection"; "peer" => %peer);
                    if let Err(err) = set_keepalive(&stream) {
                        slog::debug!(state.logger, "could not arm keep-alive on control connection: {}", err);
                    }
                    let session_shutdown = self.shutdown_topic.subscribe().await;
                    control_loop::spawn_loop(Arc::clone(&state), stream, implicit_tls, session_shutdown).await;
                }
                Err(err) if is_transient(&err) => {
                    delay = if delay.is_zero() {
                        ACCEPT_BACKOFF_START
                    } else {
                        ACCEPT_BACKOFF_MAX.min(delay * 2)
                    };
                    slog::warn!(state.logger, "transient accept error, backing off: {}", err);
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    slog::error!(state.logger, "accept failed: {}", err);
                    return Err(err.into());
                }
            }
        }
    }

    /// Signals shutdown and returns immediately. Accept loops unblock with
    /// [`ServerError::Closed`]; sessions observe the signal between
    /// commands and terminate.
    pub async fn close(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.shutdown_topic.notify().await;
    }

    /// Gracefully shuts down: stops accepting, then waits up to `grace`
    /// for running sessions to finish.
    pub async fn shutdown(&self, grace: Duration) -> Result<(), ServerError> {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.shutdown_topic.notify().await;
        tokio::time::timeout(grace, self.shutdown_topic.linger())
            .await
            .map_err(|_| ServerError::ShutdownTimeout)
    }
}

fn is_transient(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::Interrupted
            | std::io::ErrorKind::WouldBlock
    )
}
