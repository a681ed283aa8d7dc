#![deny(missing_docs)]
//! An FTP/FTPS gateway that exposes an object store as a file hierarchy.
//!
//! The crate implements the FTP protocol of RFC 959 together with the
//! extensions of RFC 2228 (FTPS), 2389 (FEAT/OPTS), 2428 (EPRT/EPSV),
//! 2640 (LANG) and 3659 (MDTM/SIZE/MLSx). Storage is abstracted behind the
//! [`vfs::Vfs`] trait and login behind [`auth::Authorizer`], so any object
//! store can sit behind it; the shipped [`vfs::Memory`] implementation
//! backs the test suite and small deployments.
//!
//! # Quick Start
//!
//! ```no_run
//! use s3ftpgateway::Server;
//! use s3ftpgateway::vfs::Memory;
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let fs = Arc::new(Memory::new());
//! let server = Server::new().vfs(fs).passive_ports(50000, 50100);
//! server.listen("0.0.0.0:2121").await.unwrap();
//! # }
//! ```

pub mod auth;
pub mod config;
pub(crate) mod server;
pub mod vfs;

pub use crate::server::ftpserver::{Server, ServerError};
