//! Per-connection session state.

use super::datachan::DataTransfer;
use super::ftpserver::ServerState;
use crate::auth::Authorization;
use crate::vfs::{clean, FileReader, Vfs};

use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;

// The RFC 2228 data-channel protection levels, as set by PROT. Safe and
// Confidential are refused by the PROT handler but remain part of the
// protocol surface.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(dead_code)]
pub(crate) enum ProtectionLevel {
    Clear,
    Safe,
    Confidential,
    Private,
}

// The source half of a rename, stashed by RNFR until RNTO arrives. The
// reader is opened eagerly so the content survives the removal of the old
// path.
pub(crate) struct RenameSource {
    pub path: String,
    pub reader: FileReader,
}

// All state belonging to one control connection. The session is owned and
// mutated exclusively by its control-loop task.
pub(crate) struct Session {
    // Correlates all log lines of this connection.
    pub id: String,
    pub server: Arc<ServerState>,
    pub peer_addr: SocketAddr,
    pub local_addr: SocketAddr,
    // Set by USER, consumed by PASS.
    pub username: Option<String>,
    // Present once PASS succeeded; replaced wholesale by a later PASS.
    pub auth: Option<Authorization>,
    // Always an absolute, cleaned path.
    pub cwd: String,
    // True while the control channel itself is encrypted.
    pub cmd_tls: bool,
    pub prot: ProtectionLevel,
    pub rename_from: Option<RenameSource>,
    pub dt: DataTransfer,
    // Once EPSV ALL was issued, PASV/PORT/EPRT are refused.
    pub epsv_all: bool,
    pub auth_failures: u32,
    // A handler set this to end the session after its reply is written.
    pub closing: bool,
    // The AUTH handler requests the TLS upgrade; the control loop performs
    // it after the 234 reply went out in plaintext.
    pub upgrade_tls: bool,
    pub logger: slog::Logger,
}

impl Session {
    pub fn new(server: Arc<ServerState>, peer_addr: SocketAddr, local_addr: SocketAddr, cmd_tls: bool, logger: slog::Logger) -> Session {
        let id = Session::new_id();
        let logger = logger.new(slog::o!("session-id" => id.clone(), "peer" => peer_addr.to_string()));
        Session {
            id,
            server,
            peer_addr,
            local_addr,
            username: None,
            auth: None,
            cwd: "/".to_string(),
            cmd_tls,
            prot: ProtectionLevel::Clear,
            rename_from: None,
            dt: DataTransfer::None,
            epsv_all: false,
            auth_failures: 0,
            closing: false,
            upgrade_tls: false,
            logger,
        }
    }

    // An 8-hex-character id, enough to tell sessions apart in logs.
    fn new_id() -> String {
        let mut buf = [0u8; 4];
        if OsRng.try_fill_bytes(&mut buf).is_err() {
            return "????????".to_string();
        }
        let mut id = String::with_capacity(8);
        for b in &buf {
            let _ = write!(id, "{:02x}", b);
        }
        id
    }

    /// The file system view of the logged-in user.
    pub fn fs(&self) -> Option<Arc<dyn Vfs>> {
        self.auth.as_ref().map(|auth| Arc::clone(&auth.fs))
    }

    /// Resolves a client-supplied path against the working directory and
    /// cleans it. Arguments starting with `/` are taken as rooted.
    pub fn resolve(&self, arg: &str) -> String {
        if arg.starts_with('/') {
            clean(arg)
        } else {
            clean(&format!("{}/{}", self.cwd, arg))
        }
    }

    // The acceptor for protecting data connections, when the control
    // channel is TLS and the client asked for PROT P.
    pub fn data_tls(&self) -> Option<TlsAcceptor> {
        if !self.cmd_tls || self.prot != ProtectionLevel::Private {
            return None;
        }
        self.server.tls_config.as_ref().map(|cfg| TlsAcceptor::from(Arc::clone(cfg)))
    }

    /// Installs a new data transfer, closing any previous one. The swap is
    /// the only place a passive transfer's port lease is given back.
    pub fn set_data_transfer(&mut self, dt: DataTransfer) {
        self.dt.close();
        self.dt = dt;
    }
}
