//! The gateway binary: loads the configuration, builds the server and runs
//! it until a termination signal arrives.

use s3ftpgateway::auth::{Anonymous, Authorizer, UserList};
use s3ftpgateway::config::Config;
use s3ftpgateway::vfs::{Memory, Vfs};
use s3ftpgateway::{Server, ServerError};

use anyhow::{bail, Context, Result};
use clap::Parser;
use slog::Drain;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// An FTP/FTPS gateway in front of an object store.
#[derive(Parser, Debug)]
#[command(name = "s3ftpgateway", version, disable_version_flag = true)]
struct Cli {
    /// Path to the configuration file
    #[arg(long)]
    config: Option<String>,

    /// Print the version and exit
    #[arg(long)]
    version: bool,
}

fn main() {
    let cli = Cli::parse();
    if cli.version {
        println!("s3ftpgateway {}", env!("CARGO_PKG_VERSION"));
        return;
    }
    let config_path = match cli.config {
        Some(path) => path,
        None => {
            eprintln!("--config is missing");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(&config_path) {
        eprintln!("s3ftpgateway: {:#}", err);
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run(config_path: &str) -> Result<()> {
    let config = Config::load(config_path).context("failed to load config")?;
    let logger = new_logger(&config.log.format)?;

    let fs: Arc<dyn Vfs> = Arc::new(Memory::new());
    if !config.bucket.is_empty() {
        // The object-store backend plugs in through the Vfs trait and is
        // linked by the deployment build.
        slog::warn!(logger, "no object-store backend is linked into this build; serving the in-memory file system";
            "bucket" => &config.bucket, "prefix" => &config.prefix);
    }

    let authorizer: Arc<dyn Authorizer> = match config.authorizer.method.as_str() {
        "userlist" => {
            let userlist = config.userlist()?;
            Arc::new(UserList::new(userlist.users.into_iter().map(|u| (u.name, u.password))))
        }
        "" | "anonymous" => Arc::new(Anonymous),
        other => bail!("unknown authorizer method {:?}", other),
    };

    let mut public_ips: Vec<IpAddr> = Vec::with_capacity(config.public_ips.len());
    for ip in &config.public_ips {
        public_ips.push(ip.parse().with_context(|| format!("invalid public ip {:?}", ip))?);
    }
    if config.guess_public_ip {
        slog::warn!(logger, "guess_public_ip is set but no prober is linked into this build; configure public_ips instead");
    }

    let mut server = Server::new()
        .logger(logger.clone())
        .vfs(fs)
        .authorizer(authorizer)
        .passive_ports(config.min_passive_port, config.max_passive_port)
        .public_ips(public_ips)
        .enable_active_mode(config.enable_active_mode)
        .enable_address_check(config.enable_address_check);
    if !config.certificate.is_empty() || !config.certificate_key.is_empty() {
        server = server
            .ftps(&config.certificate, &config.certificate_key)
            .context("failed to load TLS certificate")?;
    }
    let server = Arc::new(server);

    // Bind all listeners before serving so a bad address fails startup.
    let mut listeners = Vec::new();
    if config.listeners.is_empty() {
        listeners.push((bind(":21").await?, false));
    } else {
        for listener in &config.listeners {
            listeners.push((bind(&listener.address).await?, listener.tls));
        }
    }

    let mut serve_tasks = Vec::new();
    for (listener, tls) in listeners {
        let server = Arc::clone(&server);
        serve_tasks.push(tokio::spawn(async move {
            let result = if tls { server.serve_tls(listener).await } else { server.serve(listener).await };
            match result {
                Ok(()) | Err(ServerError::Closed) => Ok(()),
                Err(err) => Err(err),
            }
        }));
    }

    wait_for_shutdown(&logger, &server).await?;

    for task in serve_tasks {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => bail!("listener failed: {}", err),
            Err(err) => bail!("listener task panicked: {}", err),
        }
    }
    Ok(())
}

// The first signal starts a graceful shutdown; a second one closes hard.
async fn wait_for_shutdown(logger: &slog::Logger, server: &Arc<Server>) -> Result<()> {
    let mut hangup = signal(SignalKind::hangup()).context("signal handler")?;
    let mut interrupt = signal(SignalKind::interrupt()).context("signal handler")?;
    let mut terminate = signal(SignalKind::terminate()).context("signal handler")?;
    let mut quit = signal(SignalKind::quit()).context("signal handler")?;

    tokio::select! {
        _ = hangup.recv() => {}
        _ = interrupt.recv() => {}
        _ = terminate.recv() => {}
        _ = quit.recv() => {}
    }
    slog::info!(logger, "shutting down");

    let graceful = server.shutdown(SHUTDOWN_GRACE);
    tokio::pin!(graceful);
    tokio::select! {
        result = &mut graceful => {
            if let Err(err) = result {
                slog::warn!(logger, "graceful shutdown incomplete: {}", err);
            }
        }
        _ = async {
            tokio::select! {
                _ = hangup.recv() => {}
                _ = interrupt.recv() => {}
                _ = terminate.recv() => {}
                _ = quit.recv() => {}
            }
        } => {
            slog::warn!(logger, "second signal received, closing immediately");
            server.close().await;
        }
    }
    Ok(())
}

async fn bind(addr: &str) -> Result<TcpListener> {
    // Addresses in ":port" form listen on all interfaces.
    let addr = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };
    TcpListener::bind(&addr).await.with_context(|| format!("could not listen on {}", addr))
}

fn new_logger(format: &str) -> Result<slog::Logger> {
    match format {
        "json" => {
            let drain = slog_json::Json::default(std::io::stdout()).fuse();
            let drain = slog_async::Async::new(drain).build().fuse();
            Ok(slog::Logger::root(drain, slog::o!()))
        }
        "" | "text" => {
            let decorator = slog_term::TermDecorator::new().build();
            let drain = slog_term::FullFormat::new(decorator).build().fuse();
            let drain = slog_async::Async::new(drain).build().fuse();
            Ok(slog::Logger::root(drain, slog::o!()))
        }
        other => bail!("unknown log format {:?}", other),
    }
}
