use async_trait::async_trait;
use s3ftpgateway::auth::{Authorization, AuthorizeError, Authorizer};
use s3ftpgateway::vfs::{Memory, Vfs};
use s3ftpgateway::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

// Accepts "test"/"secret" with full access and rejects everyone else,
// including anonymous users.
#[derive(Debug)]
pub struct TestAuthorizer;

#[async_trait]
impl Authorizer for TestAuthorizer {
    async fn authorize(&self, fs: &Arc<dyn Vfs>, user: &str, password: &str) -> Result<Authorization, AuthorizeError> {
        if user == "test" && password == "secret" {
            return Ok(Authorization {
                user: user.to_string(),
                fs: Arc::clone(fs),
            });
        }
        Err(AuthorizeError::InvalidCredentials)
    }
}

// Starts a server on an ephemeral loopback port and returns its address.
pub async fn start_server(server: Server) -> (SocketAddr, Arc<Server>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Arc::new(server);
    let serving = Arc::clone(&server);
    tokio::spawn(async move {
        let _ = serving.serve(listener).await;
    });
    (addr, server)
}

pub fn sample_fs() -> Arc<Memory> {
    Arc::new(Memory::with_files(vec![("testfile", "Hello ftp!")]))
}

// A scripted FTP control-channel client.
pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    pub async fn connect(addr: SocketAddr) -> Client {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, write_half) = stream.into_split();
        Client {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }

    pub async fn send(&mut self, line: &str) {
        self.writer.write_all(format!("{}\r\n", line).as_bytes()).await.unwrap();
    }

    // Reads one full reply (multiline included) and asserts its code.
    // Returns the text of the final reply line.
    pub async fn expect(&mut self, code: u32) -> String {
        let terminator = format!("{:03} ", code);
        loop {
            let mut line = String::new();
            let n = self.reader.read_line(&mut line).await.unwrap();
            assert!(n > 0, "connection closed while waiting for {}", code);
            let line = line.trim_end().to_string();
            if let Some(rest) = line.strip_prefix(&terminator) {
                return rest.to_string();
            }
            let continued = line.len() >= 4 && line[..3].chars().all(|c| c.is_ascii_digit()) && line.as_bytes()[3] == b'-';
            assert!(
                continued,
                "expected reply {} but got {:?}",
                code, line
            );
        }
    }

    pub async fn login(&mut self, user: &str, password: &str) {
        self.send(&format!("USER {}", user)).await;
        self.expect(331).await;
        self.send(&format!("PASS {}", password)).await;
        self.expect(230).await;
    }

    // Issues EPSV and returns the advertised data port.
    pub async fn epsv(&mut self) -> u16 {
        self.send("EPSV").await;
        let text = self.expect(229).await;
        parse_epsv_port(&text)
    }
}

pub fn parse_epsv_port(text: &str) -> u16 {
    // Entering extended passive mode (|||<port>|)
    let start = text.find("(|||").expect("no EPSV port group") + 4;
    let end = text[start..].find('|').expect("unterminated EPSV port group") + start;
    text[start..end].parse().expect("EPSV port is not a number")
}

pub async fn read_all(mut stream: TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    buf
}
