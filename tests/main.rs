mod common;

use common::{parse_epsv_port, read_all, sample_fs, start_server, Client, TestAuthorizer};
use pretty_assertions::assert_eq;
use s3ftpgateway::vfs::Vfs;
use s3ftpgateway::Server;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

#[tokio::test]
async fn greeting_and_noop() {
    let (addr, _server) = start_server(Server::new().vfs(sample_fs())).await;
    let mut client = Client::connect(addr).await;
    assert_eq!(client.expect(220).await, "Service ready");

    client.send("NOOP").await;
    assert_eq!(client.expect(200).await, "Okay.");

    client.send("SYST").await;
    assert_eq!(client.expect(215).await, "UNIX Type: L8");

    client.send("QUIT").await;
    assert_eq!(client.expect(221).await, "Good bye.");
}

#[tokio::test]
async fn commands_require_login() {
    let (addr, _server) = start_server(Server::new().vfs(sample_fs())).await;
    let mut client = Client::connect(addr).await;
    client.expect(220).await;

    client.send("PWD").await;
    assert_eq!(client.expect(530).await, "Not logged in");

    client.send("BOGUS").await;
    assert_eq!(client.expect(500).await, "Command not found");

    client.send("RETR").await;
    assert_eq!(client.expect(501).await, "Action aborted, required param missing");
}

#[tokio::test]
async fn anonymous_epsv_retr() {
    let (addr, _server) = start_server(Server::new().vfs(sample_fs())).await;
    let mut client = Client::connect(addr).await;
    client.expect(220).await;
    client.login("anonymous", "x").await;

    let port = client.epsv().await;
    let data = TcpStream::connect(("127.0.0.1", port)).await.unwrap();

    client.send("RETR testfile").await;
    client.expect(150).await;
    assert_eq!(read_all(data).await, b"Hello ftp!");
    assert_eq!(client.expect(226).await, "Data transfer starting 10 bytes");
}

#[tokio::test]
async fn pasv_stor_then_retr_round_trips() {
    let fs = sample_fs();
    let server = Server::new().vfs(fs).authorizer(Arc::new(TestAuthorizer));
    let (addr, _server) = start_server(server).await;

    let mut client = Client::connect(addr).await;
    client.expect(220).await;
    client.login("test", "secret").await;

    client.send("PASV").await;
    let text = client.expect(227).await;
    // Entering Passive Mode (h1,h2,h3,h4,p1,p2)
    let inner = text
        .rfind('(')
        .map(|start| text[start + 1..].trim_end_matches(')'))
        .expect("no host-port group");
    let parts: Vec<u16> = inner.split(',').map(|p| p.parse().unwrap()).collect();
    assert_eq!(parts.len(), 6);
    assert_eq!(&parts[..4], &[127, 0, 0, 1]);
    let port = parts[4] << 8 | parts[5];

    let mut data = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    client.send("STOR newfile").await;
    client.expect(150).await;
    data.write_all(b"hello").await.unwrap();
    data.shutdown().await.unwrap();
    drop(data);
    assert_eq!(client.expect(226).await, "OK, received 5 bytes.");

    let port = client.epsv().await;
    let data = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    client.send("RETR newfile").await;
    client.expect(150).await;
    assert_eq!(read_all(data).await, b"hello");
    client.expect(226).await;
}

#[tokio::test]
async fn mkd_reports_created_directory() {
    let server = Server::new().vfs(sample_fs()).authorizer(Arc::new(TestAuthorizer));
    let (addr, _server) = start_server(server).await;

    let mut client = Client::connect(addr).await;
    client.expect(220).await;
    client.login("test", "secret").await;

    client.send("MKD foo").await;
    assert_eq!(client.expect(257).await, "\"/foo\" directory created.");

    client.send("MKD foo").await;
    client.expect(521).await;
}

#[tokio::test]
async fn cwd_into_missing_directory_keeps_cwd() {
    let server = Server::new().vfs(sample_fs()).authorizer(Arc::new(TestAuthorizer));
    let (addr, _server) = start_server(server).await;

    let mut client = Client::connect(addr).await;
    client.expect(220).await;
    client.login("test", "secret").await;

    client.send("CWD foo/bar").await;
    client.expect(431).await;
    client.send("PWD").await;
    assert_eq!(client.expect(257).await, "\"/\"");

    client.send("MKD foo").await;
    client.expect(257).await;
    client.send("MKD foo/bar").await;
    client.expect(257).await;
    client.send("CWD foo/bar").await;
    client.expect(250).await;
    client.send("PWD").await;
    assert_eq!(client.expect(257).await, "\"/foo/bar\"");

    client.send("CDUP").await;
    client.expect(250).await;
    client.send("PWD").await;
    assert_eq!(client.expect(257).await, "\"/foo\"");
}

#[tokio::test]
async fn epsv_all_locks_out_other_modes() {
    let (addr, _server) = start_server(Server::new().vfs(sample_fs())).await;
    let mut client = Client::connect(addr).await;
    client.expect(220).await;
    client.login("anonymous", "x").await;

    client.send("EPSV ALL").await;
    client.expect(200).await;

    client.send("PASV").await;
    client.expect(501).await;
    client.send("PORT 127,0,0,1,200,10").await;
    client.expect(501).await;
    client.send("EPRT |1|127.0.0.1|51210|").await;
    client.expect(501).await;

    // EPSV itself still works.
    client.send("EPSV").await;
    let text = client.expect(229).await;
    assert!(parse_epsv_port(&text) > 0);
}

#[tokio::test]
async fn inverted_passive_range_disables_passive_mode() {
    let server = Server::new().vfs(sample_fs()).passive_ports(10, 5);
    let (addr, _server) = start_server(server).await;

    let mut client = Client::connect(addr).await;
    client.expect(220).await;
    client.login("anonymous", "x").await;

    client.send("EPSV").await;
    assert_eq!(client.expect(502).await, "Passive mode is disabled");
    client.send("PASV").await;
    client.expect(502).await;
}

#[tokio::test]
async fn port_is_rejected_by_default_and_for_privileged_ports() {
    let server = Server::new().vfs(sample_fs()).enable_active_mode(true);
    let (addr, _server) = start_server(server).await;

    let mut client = Client::connect(addr).await;
    client.expect(220).await;
    client.login("anonymous", "x").await;

    // Bounce-attack defence: privileged ports are refused.
    client.send("PORT 127,0,0,1,0,80").await;
    client.expect(504).await;
    // And so are other hosts.
    client.send("PORT 192,0,2,44,200,10").await;
    client.expect(501).await;

    let (addr, _server) = start_server(Server::new().vfs(sample_fs())).await;
    let mut client = Client::connect(addr).await;
    client.expect(220).await;
    client.login("anonymous", "x").await;
    client.send("PORT 127,0,0,1,200,10").await;
    assert_eq!(client.expect(502).await, "Active mode is disabled");
}

#[tokio::test]
async fn anonymous_users_cannot_write() {
    let (addr, _server) = start_server(Server::new().vfs(sample_fs())).await;
    let mut client = Client::connect(addr).await;
    client.expect(220).await;
    client.login("anonymous", "x").await;

    client.send("MKD foo").await;
    assert_eq!(client.expect(550).await, "Permission denied");
    client.send("DELE testfile").await;
    client.expect(550).await;
}

#[tokio::test]
async fn failed_logins_are_slowed_down() {
    let server = Server::new().vfs(sample_fs()).authorizer(Arc::new(TestAuthorizer));
    let (addr, _server) = start_server(server).await;

    let mut client = Client::connect(addr).await;
    client.expect(220).await;

    // A failed attempt for a non-anonymous user is delayed.
    client.send("USER attacker").await;
    client.expect(331).await;
    let started = Instant::now();
    client.send("PASS wrong").await;
    client.expect(530).await;
    assert!(started.elapsed() >= Duration::from_secs(5), "penalty sleep was skipped");

    // A valid login on the same session completes promptly.
    let started = Instant::now();
    client.login("test", "secret").await;
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn list_emits_unix_style_lines() {
    let (addr, _server) = start_server(Server::new().vfs(sample_fs())).await;
    let mut client = Client::connect(addr).await;
    client.expect(220).await;
    client.login("anonymous", "x").await;

    let port = client.epsv().await;
    let data = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    client.send("LIST").await;
    client.expect(150).await;
    let listing = String::from_utf8(read_all(data).await).unwrap();
    client.expect(226).await;

    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("testfile"), "unexpected line {:?}", lines[0]);
    // The read-only view masks the write bits.
    assert!(lines[0].starts_with("-r--r--r--"), "unexpected line {:?}", lines[0]);
}

#[tokio::test]
async fn mlsd_and_mlst_emit_facts() {
    let (addr, _server) = start_server(Server::new().vfs(sample_fs())).await;
    let mut client = Client::connect(addr).await;
    client.expect(220).await;
    client.login("anonymous", "x").await;

    let port = client.epsv().await;
    let data = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    client.send("MLSD").await;
    client.expect(150).await;
    let listing = String::from_utf8(read_all(data).await).unwrap();
    client.expect(226).await;
    assert!(listing.starts_with("Type=file;Modify="), "unexpected listing {:?}", listing);
    assert!(listing.contains(";Size=10;Perm=r; testfile"), "unexpected listing {:?}", listing);

    client.send("MLST testfile").await;
    client.expect(250).await;

    client.send("SIZE testfile").await;
    assert_eq!(client.expect(213).await, "10");
}

#[tokio::test]
async fn stou_picks_a_fresh_name() {
    let fs = sample_fs();
    let server = Server::new().vfs(Arc::clone(&fs) as Arc<dyn Vfs>).authorizer(Arc::new(TestAuthorizer));
    let (addr, _server) = start_server(server).await;

    let mut client = Client::connect(addr).await;
    client.expect(220).await;
    client.login("test", "secret").await;

    let port = client.epsv().await;
    let mut data = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    client.send("STOU").await;
    let text = client.expect(150).await;
    let name = text.strip_prefix("FILE: ").expect("STOU reply carries no name").to_string();
    assert_eq!(name.len(), 32);
    data.write_all(b"unique").await.unwrap();
    data.shutdown().await.unwrap();
    drop(data);
    client.expect(226).await;

    let mut reader = fs.open(&format!("/{}", name)).await.unwrap();
    let mut content = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut reader, &mut content).await.unwrap();
    assert_eq!(content, b"unique");
}

#[tokio::test]
async fn rename_moves_content() {
    let server = Server::new().vfs(sample_fs()).authorizer(Arc::new(TestAuthorizer));
    let (addr, _server) = start_server(server).await;

    let mut client = Client::connect(addr).await;
    client.expect(220).await;
    client.login("test", "secret").await;

    client.send("RNTO nowhere").await;
    client.expect(503).await;

    client.send("RNFR testfile").await;
    client.expect(350).await;
    client.send("RNFR testfile").await;
    client.expect(503).await;

    client.send("RNTO renamed").await;
    client.expect(250).await;

    let port = client.epsv().await;
    let data = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    client.send("RETR renamed").await;
    client.expect(150).await;
    assert_eq!(read_all(data).await, b"Hello ftp!");
    client.expect(226).await;

    client.send("RETR testfile").await;
    client.expect(550).await;
}

#[tokio::test]
async fn feat_lists_extensions() {
    let (addr, _server) = start_server(Server::new().vfs(sample_fs())).await;
    let mut client = Client::connect(addr).await;
    client.expect(220).await;

    client.send("FEAT").await;
    assert_eq!(client.expect(211).await, "END");
}

#[tokio::test]
async fn graceful_shutdown_notifies_idle_sessions() {
    let (addr, server) = start_server(Server::new().vfs(sample_fs())).await;
    let mut client = Client::connect(addr).await;
    client.expect(220).await;

    let shutdown = tokio::spawn(async move { server.shutdown(Duration::from_secs(5)).await });
    assert_eq!(
        client.expect(421).await,
        "Service not available, closing control connection"
    );
    shutdown.await.unwrap().unwrap();
}
