//! Everything pertaining to the FTP *control* channel.

pub mod command;

pub(crate) mod codecs;
pub(super) mod commands;
pub(crate) mod control_loop;
mod error;
pub(crate) mod handler;
pub(crate) mod line_parser;
pub(crate) mod reply;
pub(crate) mod telnet;

pub(crate) use error::ControlChanError;
pub(crate) use reply::{Reply, ReplyCode};

use codecs::FtpCodec;
use telnet::TelnetStream;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

// The streams a control or data channel can run over: plain TCP or TLS.
pub(crate) trait AsyncReadWrite: AsyncRead + AsyncWrite + Send + Unpin + std::fmt::Debug {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin + std::fmt::Debug> AsyncReadWrite for T {}

pub(crate) type BoxedIo = Box<dyn AsyncReadWrite>;

// The framed control channel: Telnet stripping underneath, command/reply
// codec on top.
pub(crate) type ControlStream = Framed<TelnetStream<BoxedIo>, FtpCodec>;

// Stacks the codec and the Telnet stripper on a control socket.
pub(crate) fn telnet_framed(io: BoxedIo) -> ControlStream {
    use tokio_util::codec::Decoder;
    FtpCodec::new().framed(TelnetStream::new(io))
}
