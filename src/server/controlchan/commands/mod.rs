//! One module per supported FTP verb.

mod abor;
mod acct;
mod allo;
mod appe;
mod auth;
mod cdup;
mod cwd;
mod dele;
mod eprt;
mod epsv;
mod feat;
mod help;
mod lang;
mod list;
mod mdtm;
mod mkd;
mod mlsd;
mod mlst;
mod mode;
mod nlst;
mod noop;
mod opts;
mod pass;
mod pasv;
mod pbsz;
mod port;
mod prot;
mod pwd;
mod quit;
mod retr;
mod rmd;
mod rnfr;
mod rnto;
mod size;
mod stat;
mod stor;
mod stou;
mod stru;
mod syst;
mod type_;
mod user;

pub(super) use abor::Abor;
pub(super) use acct::Acct;
pub(super) use allo::Allo;
pub(super) use appe::Appe;
pub(super) use auth::Auth;
pub(super) use cdup::Cdup;
pub(super) use cwd::Cwd;
pub(super) use dele::Dele;
pub(super) use eprt::Eprt;
pub(super) use epsv::Epsv;
pub(super) use feat::Feat;
pub(super) use help::Help;
pub(super) use lang::Lang;
pub(super) use list::List;
pub(super) use mdtm::Mdtm;
pub(super) use mkd::Mkd;
pub(super) use mlsd::Mlsd;
pub(super) use mlst::Mlst;
pub(super) use mode::Mode;
pub(super) use nlst::Nlst;
pub(super) use noop::Noop;
pub(super) use opts::Opts;
pub(super) use pass::Pass;
pub(super) use pasv::Pasv;
pub(super) use pbsz::Pbsz;
pub(super) use port::Port;
pub(super) use prot::Prot;
pub(super) use pwd::Pwd;
pub(super) use quit::Quit;
pub(super) use retr::Retr;
pub(super) use rmd::Rmd;
pub(super) use rnfr::Rnfr;
pub(super) use rnto::Rnto;
pub(super) use size::Size;
pub(super) use stat::Stat;
pub(super) use stor::Stor;
pub(super) use stou::Stou;
pub(super) use stru::Stru;
pub(super) use syst::Syst;
pub(super) use type_::Type;
pub(super) use user::User;

use super::{ControlChanError, ControlStream, Reply, ReplyCode};
use crate::server::session::Session;
use crate::vfs::{FileInfo, VfsError};

use futures_util::SinkExt;
use tokio::io::AsyncWriteExt;

// The reply a verb sends when the virtual file system refuses it.
pub(crate) fn vfs_error_reply(err: &VfsError) -> Reply {
    match err {
        VfsError::NotFound => Reply::new(ReplyCode::FileError, "File not found"),
        VfsError::PermissionDenied => Reply::new(ReplyCode::FileError, "Permission denied"),
        VfsError::AlreadyExists => Reply::new(ReplyCode::DirectoryExists, "Already exists"),
        VfsError::NotEmpty => Reply::new(ReplyCode::FileError, "Directory not empty"),
        VfsError::Io(_) => Reply::new(ReplyCode::LocalError, "Requested action aborted, local error in processing"),
    }
}

pub(crate) fn cant_open_data_connection() -> Reply {
    Reply::new(ReplyCode::CantOpenDataConnection, "Can't open data connection")
}

// RFC 3659 fact line; facts are emitted in the order Type, Modify, Size,
// Perm.
pub(crate) fn format_facts(fi: &FileInfo, name: &str) -> String {
    let kind = if fi.is_dir { "dir" } else { "file" };
    let writable = fi.mode & 0o200 != 0;
    let perm = match (fi.is_dir, writable) {
        (true, true) => "cdelmp",
        (true, false) => "el",
        (false, true) => "adfrw",
        (false, false) => "r",
    };
    format!(
        "Type={};Modify={};Size={};Perm={}; {}",
        kind,
        fi.modified.format("%Y%m%d%H%M%S%.3f"),
        fi.size,
        perm,
        name
    )
}

// Shared tail of the listing verbs: announce the transfer, push the
// rendered payload over the data connection and report completion.
pub(crate) async fn send_listing(session: &mut Session, control: &mut ControlStream, payload: Vec<u8>) -> Result<Reply, ControlChanError> {
    control.send(Reply::new(ReplyCode::FileStatusOkay, "Data transfer starting")).await?;

    let mut conn = match session.dt.take_conn().await {
        Ok(conn) => conn,
        Err(err) => {
            slog::warn!(session.logger, "could not open data connection: {}", err);
            session.dt.close();
            return Ok(cant_open_data_connection());
        }
    };

    let sent = async {
        conn.write_all(&payload).await?;
        conn.shutdown().await
    }
    .await;
    session.dt.close();

    match sent {
        Ok(()) => Ok(Reply::new(ReplyCode::ClosingDataConnection, "Closing data connection.")),
        Err(err) => {
            slog::warn!(session.logger, "data transfer failed: {}", err);
            Ok(Reply::new(ReplyCode::ConnectionClosed, "Data transfer aborted"))
        }
    }
}
