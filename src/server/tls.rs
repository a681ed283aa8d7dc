//! TLS configuration shared by the control and data channels.

use rustls::internal::pemfile;
use rustls::{Certificate, NoClientAuth, PrivateKey, ServerConfig};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

// Builds the rustls server configuration from a PEM-encoded certificate
// chain and private key. The same Arc is shared by AUTH TLS upgrades,
// implicit-TLS listeners and protected data channels.
pub fn new_config<P: AsRef<Path>>(certs_file: P, key_file: P) -> std::io::Result<Arc<ServerConfig>> {
    let certs: Vec<Certificate> = load_certs(certs_file)?;
    let privkey: PrivateKey = load_private_key(key_file)?;

    let mut config = ServerConfig::new(NoClientAuth::new());
    config
        .set_single_cert(certs, privkey)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    Ok(Arc::new(config))
}

fn load_certs<P: AsRef<Path>>(filename: P) -> std::io::Result<Vec<Certificate>> {
    let certfile = File::open(filename)?;
    let mut reader = BufReader::new(certfile);
    let certs = pemfile::certs(&mut reader).map_err(|_| invalid_pem("certificate"))?;
    if certs.is_empty() {
        return Err(invalid_pem("certificate"));
    }
    Ok(certs)
}

fn load_private_key<P: AsRef<Path>>(filename: P) -> std::io::Result<PrivateKey> {
    let pkcs8_keys = {
        let keyfile = File::open(&filename)?;
        let mut reader = BufReader::new(keyfile);
        pemfile::pkcs8_private_keys(&mut reader).map_err(|_| invalid_pem("private key"))?
    };
    if let Some(key) = pkcs8_keys.first() {
        return Ok(key.clone());
    }

    let rsa_keys = {
        let keyfile = File::open(&filename)?;
        let mut reader = BufReader::new(keyfile);
        pemfile::rsa_private_keys(&mut reader).map_err(|_| invalid_pem("private key"))?
    };
    match rsa_keys.first() {
        Some(key) => Ok(key.clone()),
        None => Err(invalid_pem("private key")),
    }
}

fn invalid_pem(what: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("no PEM-encoded {} found", what))
}
