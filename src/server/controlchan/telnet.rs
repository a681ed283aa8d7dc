//! A dumb Telnet filter for the control channel.
//!
//! FTP control connections are Telnet streams (RFC 854), and while most
//! clients never send Telnet commands, a server has to cope with the ones
//! that do. This adapter strips every IAC sequence from the inbound byte
//! stream, queues a reject (`WON'T`/`DON'T`) for each option the peer tries
//! to negotiate, and escapes stray `0xFF` bytes on the way out. It never
//! interprets FTP syntax.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

const CMD_SE: u8 = 240;
const CMD_SB: u8 = 250;
const CMD_WILL: u8 = 251;
const CMD_WONT: u8 = 252;
const CMD_DO: u8 = 253;
const CMD_DONT: u8 = 254;
const CMD_IAC: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq)]
enum ReadState {
    // Plain data bytes.
    Data,
    // Just saw an IAC.
    Iac,
    // Saw IAC WILL or IAC DO; the next byte is the option to reject.
    Negotiate { reject: u8 },
    // Saw IAC WONT or IAC DONT; the next byte is discarded.
    NegotiateIgnore,
    // Inside IAC SB, before the option byte.
    SubOption,
    // Inside a subnegotiation, scanning for IAC SE.
    Sub,
    // Inside a subnegotiation, just saw an IAC.
    SubIac,
}

/// Wraps the control socket and strips/escapes Telnet in both directions.
#[derive(Debug)]
pub struct TelnetStream<T> {
    inner: T,
    state: ReadState,
    // Reject responses queued during reads, sent before the next write.
    reject: Vec<u8>,
    // Escaped output being flushed to the inner stream.
    staged: Vec<u8>,
    staged_pos: usize,
    staged_credit: usize,
}

impl<T> TelnetStream<T> {
    pub fn new(inner: T) -> TelnetStream<T> {
        TelnetStream {
            inner,
            state: ReadState::Data,
            reject: Vec::new(),
            staged: Vec::new(),
            staged_pos: 0,
            staged_credit: 0,
        }
    }

    /// Returns the underlying stream, e.g. to wrap it in TLS.
    pub fn into_inner(self) -> T {
        self.inner
    }

    // Feeds one inbound byte through the state machine. Returns the byte to
    // deliver to the caller, if any.
    fn step(&mut self, b: u8) -> Option<u8> {
        match self.state {
            ReadState::Data => {
                if b == CMD_IAC {
                    self.state = ReadState::Iac;
                    None
                } else {
                    Some(b)
                }
            }
            ReadState::Iac => match b {
                CMD_IAC => {
                    // IAC IAC is an escaped 0xFF data byte.
                    self.state = ReadState::Data;
                    Some(CMD_IAC)
                }
                CMD_SB => {
                    self.state = ReadState::SubOption;
                    None
                }
                CMD_WILL => {
                    self.state = ReadState::Negotiate { reject: CMD_WONT };
                    None
                }
                CMD_DO => {
                    self.state = ReadState::Negotiate { reject: CMD_DONT };
                    None
                }
                CMD_WONT | CMD_DONT => {
                    self.state = ReadState::NegotiateIgnore;
                    None
                }
                _ => {
                    // Any other single-byte command is ignored.
                    self.state = ReadState::Data;
                    None
                }
            },
            ReadState::Negotiate { reject } => {
                self.reject.extend_from_slice(&[CMD_IAC, reject, b]);
                self.state = ReadState::Data;
                None
            }
            ReadState::NegotiateIgnore => {
                self.state = ReadState::Data;
                None
            }
            ReadState::SubOption => {
                self.state = ReadState::Sub;
                None
            }
            ReadState::Sub => {
                if b == CMD_IAC {
                    self.state = ReadState::SubIac;
                }
                None
            }
            ReadState::SubIac => {
                self.state = if b == CMD_SE { ReadState::Data } else { ReadState::Sub };
                None
            }
        }
    }
}

impl<T: AsyncRead + Unpin> AsyncRead for TelnetStream<T> {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let me = self.get_mut();
        loop {
            // Stripping only removes bytes, so reading at most the caller's
            // capacity from the inner stream can never overflow `buf`.
            let mut tmp = [0u8; 4096];
            let want = tmp.len().min(buf.remaining());
            let mut inner_buf = ReadBuf::new(&mut tmp[..want]);
            match Pin::new(&mut me.inner).poll_read(cx, &mut inner_buf) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Err(err)) => return Poll::Ready(Err(err)),
                Poll::Ready(Ok(())) => {
                    let chunk = inner_buf.filled();
                    if chunk.is_empty() {
                        // EOF on the inner stream.
                        return Poll::Ready(Ok(()));
                    }
                    let mut produced = false;
                    for i in 0..chunk.len() {
                        if let Some(out) = me.step(chunk[i]) {
                            buf.put_slice(&[out]);
                            produced = true;
                        }
                    }
                    if produced {
                        return Poll::Ready(Ok(()));
                    }
                    // The whole chunk was Telnet chatter; read more.
                }
            }
        }
    }
}

impl<T: AsyncWrite + Unpin> TelnetStream<T> {
    // Moves queued reject responses and an escaped copy of `src` into the
    // staging buffer. Only called when the previous staged write finished.
    fn stage(&mut self, src: &[u8]) {
        self.staged.append(&mut self.reject);
        for &b in src {
            self.staged.push(b);
            if b == CMD_IAC {
                self.staged.push(CMD_IAC);
            }
        }
        self.staged_pos = 0;
        self.staged_credit = src.len();
    }

    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while self.staged_pos < self.staged.len() {
            match Pin::new(&mut self.inner).poll_write(cx, &self.staged[self.staged_pos..]) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Ok(0)) => {
                    return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
                }
                Poll::Ready(Ok(n)) => self.staged_pos += n,
                Poll::Ready(Err(err)) => return Poll::Ready(Err(err)),
            }
        }
        self.staged.clear();
        self.staged_pos = 0;
        Poll::Ready(Ok(()))
    }
}

impl<T: AsyncWrite + Unpin> AsyncWrite for TelnetStream<T> {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, src: &[u8]) -> Poll<io::Result<usize>> {
        let me = self.get_mut();
        if me.staged.is_empty() {
            me.stage(src);
        }
        match me.poll_drain(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(err)) => Poll::Ready(Err(err)),
            Poll::Ready(Ok(())) => Poll::Ready(Ok(me.staged_credit)),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let me = self.get_mut();
        if me.staged.is_empty() && !me.reject.is_empty() {
            // Flush pending rejects even when there is no payload.
            me.staged.append(&mut me.reject);
            me.staged_pos = 0;
            me.staged_credit = 0;
        }
        match me.poll_drain(cx) {
            Poll::Ready(Ok(())) => Pin::new(&mut me.inner).poll_flush(cx),
            other => other,
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let me = self.get_mut();
        match me.poll_drain(cx) {
            Poll::Ready(Ok(())) => Pin::new(&mut me.inner).poll_shutdown(cx),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    struct Case {
        rin: &'static [u8],
        rout: &'static [u8],
        win: &'static [u8],
        wout: &'static [u8],
    }

    #[tokio::test]
    async fn strips_and_escapes() {
        let cases = [
            Case {
                rin: &[0x00, 0x7F],
                rout: &[0x00, 0x7F],
                win: &[0x00, 0x7F],
                wout: &[0x00, 0x7F],
            },
            // Escaped IAC
            Case {
                rin: &[0xFF, 0xFF],
                rout: &[0xFF],
                win: &[0xFF],
                wout: &[0xFF, 0xFF],
            },
            // Single-byte Telnet commands are dropped
            Case {
                rin: &[
                    0x00, 0xFF, 0xF1, 0xFF, 0xF2, 0xFF, 0xF3, 0xFF, 0xF4, 0xFF, 0xF5, 0xFF, 0xF6, 0xFF, 0xF7, 0xFF,
                    0xF8, 0xFF, 0xF9, 0x7F,
                ],
                rout: &[0x00, 0x7F],
                win: &[0x00],
                wout: &[0x00],
            },
            // Option negotiation is rejected on the next write
            Case {
                rin: &[
                    0x00, //
                    0xFF, 0xFD, 0x18, // IAC DO TERMINAL-TYPE
                    0xFF, 0xFB, 0x18, // IAC WILL TERMINAL-TYPE
                    0xFF, 0xFA, 0x18, 0x01, 0xFF, 0xF0, // IAC SB TERMINAL-TYPE SEND IAC SE
                    0x7F,
                ],
                rout: &[0x00, 0x7F],
                win: &[0x00],
                wout: &[
                    0xFF, 0xFE, 0x18, // IAC DONT TERMINAL-TYPE
                    0xFF, 0xFC, 0x18, // IAC WONT TERMINAL-TYPE
                    0x00,
                ],
            },
        ];

        for (i, case) in cases.iter().enumerate() {
            let (mut client, server) = tokio::io::duplex(1024);
            let mut telnet = TelnetStream::new(server);

            client.write_all(case.rin).await.unwrap();
            client.shutdown().await.unwrap();

            let mut rout = Vec::new();
            telnet.read_to_end(&mut rout).await.unwrap();
            assert_eq!(rout, case.rout, "case {} read", i);

            telnet.write_all(case.win).await.unwrap();
            telnet.flush().await.unwrap();
            drop(telnet);

            let mut wout = Vec::new();
            client.read_to_end(&mut wout).await.unwrap();
            assert_eq!(wout, case.wout, "case {} write", i);
        }
    }

    #[tokio::test]
    async fn round_trip_is_exact() {
        // Writing through one stripper and reading through another yields
        // the original bytes, whatever they are.
        let payload: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).collect();

        let (a, b) = tokio::io::duplex(4096);
        let mut tx = TelnetStream::new(a);
        let mut rx = TelnetStream::new(b);

        tx.write_all(&payload).await.unwrap();
        tx.flush().await.unwrap();
        drop(tx);

        let mut got = Vec::new();
        rx.read_to_end(&mut got).await.unwrap();
        assert_eq!(got, payload);
    }

    #[tokio::test]
    async fn sequences_split_across_reads() {
        let (mut client, server) = tokio::io::duplex(16);
        let mut telnet = TelnetStream::new(server);

        // IAC arrives in one chunk, the rest of the negotiation later.
        client.write_all(&[b'a', 0xFF]).await.unwrap();
        client.flush().await.unwrap();
        let mut buf = [0u8; 8];
        let n = telnet.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"a");

        client.write_all(&[0xFB, 0x18, b'b']).await.unwrap();
        client.shutdown().await.unwrap();
        let mut rest = Vec::new();
        telnet.read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest, b"b");
    }
}
