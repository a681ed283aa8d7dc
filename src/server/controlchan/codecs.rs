//! The codec translating between raw control-channel bytes and
//! commands/replies.

use super::command::Command;
use super::error::ControlChanError;
use super::line_parser::{self, ParseError};
use super::reply::Reply;

use bytes::BytesMut;
use std::io::Write;
use tokio_util::codec::{Decoder, Encoder};

// FtpCodec implements tokio's `Decoder` and `Encoder` traits for the
// control channel: inbound lines become `Command`s, outbound `Reply`s become
// RFC 959 reply lines.
pub struct FtpCodec {
    // Index of the next byte to examine for a '\n', so a long line is not
    // rescanned from the start on every poll.
    next_index: usize,
}

impl FtpCodec {
    pub fn new() -> Self {
        FtpCodec { next_index: 0 }
    }
}

impl Decoder for FtpCodec {
    // A line that fails to parse is a value, not a decoder error: `Framed`
    // ends the stream for good after a single `Err`, which would make one
    // bad command line kill the whole control connection.
    type Item = Result<Command, ParseError>;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(newline_offset) = buf[self.next_index..].iter().position(|b| *b == b'\n') {
            let newline_index = newline_offset + self.next_index;
            let line = buf.split_to(newline_index + 1);
            self.next_index = 0;
            Ok(Some(line_parser::parse(&line[..])))
        } else {
            self.next_index = buf.len();
            Ok(None)
        }
    }
}

impl Encoder<Reply> for FtpCodec {
    type Error = ControlChanError;

    // Encodes a reply per RFC 959 §4.2: every line of a multiline reply
    // carries the code, dash-separated except for the last.
    fn encode(&mut self, reply: Reply, buf: &mut BytesMut) -> Result<(), Self::Error> {
        let mut buffer = vec![];
        match reply {
            Reply::None => {
                return Ok(());
            }
            Reply::CodeAndMsg { code, msg } => {
                if msg.is_empty() {
                    write!(buffer, "{:03} \r\n", code as u32)?;
                } else {
                    write!(buffer, "{:03} {}\r\n", code as u32, msg)?;
                }
            }
            Reply::MultiLine { code, lines } => match lines.split_last() {
                None => {
                    write!(buffer, "{:03} \r\n", code as u32)?;
                }
                Some((last, head)) => {
                    for line in head {
                        write!(buffer, "{:03}-{}\r\n", code as u32, line)?;
                    }
                    write!(buffer, "{:03} {}\r\n", code as u32, last)?;
                }
            },
        }
        buf.extend(&buffer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::controlchan::reply::ReplyCode;
    use pretty_assertions::assert_eq;

    fn encode(reply: Reply) -> String {
        let mut codec = FtpCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(reply, &mut buf).unwrap();
        String::from_utf8(buf.to_vec()).unwrap()
    }

    // A little parser for the encoded form, used to check the round trip.
    fn parse_reply(text: &str) -> (u32, Vec<String>) {
        let mut code = 0;
        let mut lines = Vec::new();
        for line in text.split("\r\n").filter(|l| !l.is_empty()) {
            code = line[..3].parse().unwrap();
            let rest = &line[4..];
            if !rest.is_empty() || line.as_bytes()[3] == b'-' {
                lines.push(rest.to_string());
            }
        }
        (code, lines)
    }

    #[test]
    fn single_line() {
        assert_eq!(encode(Reply::new(ReplyCode::ServiceReady, "Service ready")), "220 Service ready\r\n");
    }

    #[test]
    fn empty_message() {
        assert_eq!(
            encode(Reply::new_with_string(ReplyCode::CommandOkay, String::new())),
            "200 \r\n"
        );
    }

    #[test]
    fn multi_line() {
        let encoded = encode(Reply::new_multiline(
            ReplyCode::SystemStatus,
            vec!["Extensions supported:", " SIZE", "END"],
        ));
        assert_eq!(encoded, "211-Extensions supported:\r\n211- SIZE\r\n211 END\r\n");
    }

    #[test]
    fn round_trip() {
        for (reply, want_code, want_lines) in [
            (
                Reply::new(ReplyCode::CommandOkay, "Okay."),
                200,
                vec!["Okay.".to_string()],
            ),
            (
                Reply::new_multiline(ReplyCode::FileStatus, vec!["a", "b", "c"]),
                213,
                vec!["a".to_string(), "b".to_string(), "c".to_string()],
            ),
        ] {
            let (code, lines) = parse_reply(&encode(reply));
            assert_eq!(code, want_code);
            assert_eq!(lines, want_lines);
        }
    }

    #[test]
    fn decode_one_line_at_a_time() {
        let mut codec = FtpCodec::new();
        let mut buf = BytesMut::from(&b"NOOP\r\nQUIT\r\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Ok(Command::Noop)));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Ok(Command::Quit)));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn decode_waits_for_newline() {
        let mut codec = FtpCodec::new();
        let mut buf = BytesMut::from(&b"NO"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"OP\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Ok(Command::Noop)));
    }
}
