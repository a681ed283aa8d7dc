//! The parsed representation of one FTP command line.

/// A single command received on the control channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    User { username: String },
    Pass { password: String },
    Quit,
    Noop,
    Type { param: String },
    Stru { param: String },
    Mode { param: String },
    Syst,
    Pwd,
    Cwd { path: String },
    Cdup,
    Mkd { path: String },
    Rmd { path: String },
    Dele { path: String },
    List { path: Option<String> },
    Nlst { path: Option<String> },
    Mlsd { path: Option<String> },
    Mlst { path: Option<String> },
    Mdtm { path: String },
    Size { path: String },
    Stat { path: Option<String> },
    Retr { path: String },
    Stor { path: String },
    Stou,
    Appe { path: String },
    Rnfr { path: String },
    Rnto { path: String },
    Pasv,
    Port { addr: String },
    Epsv { param: Option<String> },
    Eprt { addr: String },
    Auth { protocol: String },
    Pbsz { size: String },
    Prot { param: String },
    Feat,
    Opts { option: String },
    Lang { lang: Option<String> },
    Help { topic: Option<String> },
    Abor,
    Acct,
    Allo,
}

impl Command {
    /// The verb of the command, for logs.
    pub fn verb(&self) -> &'static str {
        match self {
            Command::User { .. } => "USER",
            Command::Pass { .. } => "PASS",
            Command::Quit => "QUIT",
            Command::Noop => "NOOP",
            Command::Type { .. } => "TYPE",
            Command::Stru { .. } => "STRU",
            Command::Mode { .. } => "MODE",
            Command::Syst => "SYST",
            Command::Pwd => "PWD",
            Command::Cwd { .. } => "CWD",
            Command::Cdup => "CDUP",
            Command::Mkd { .. } => "MKD",
            Command::Rmd { .. } => "RMD",
            Command::Dele { .. } => "DELE",
            Command::List { .. } => "LIST",
            Command::Nlst { .. } => "NLST",
            Command::Mlsd { .. } => "MLSD",
            Command::Mlst { .. } => "MLST",
            Command::Mdtm { .. } => "MDTM",
            Command::Size { .. } => "SIZE",
            Command::Stat { .. } => "STAT",
            Command::Retr { .. } => "RETR",
            Command::Stor { .. } => "STOR",
            Command::Stou => "STOU",
            Command::Appe { .. } => "APPE",
            Command::Rnfr { .. } => "RNFR",
            Command::Rnto { .. } => "RNTO",
            Command::Pasv => "PASV",
            Command::Port { .. } => "PORT",
            Command::Epsv { .. } => "EPSV",
            Command::Eprt { .. } => "EPRT",
            Command::Auth { .. } => "AUTH",
            Command::Pbsz { .. } => "PBSZ",
            Command::Prot { .. } => "PROT",
            Command::Feat => "FEAT",
            Command::Opts { .. } => "OPTS",
            Command::Lang { .. } => "LANG",
            Command::Help { .. } => "HELP",
            Command::Abor => "ABOR",
            Command::Acct => "ACCT",
            Command::Allo => "ALLO",
        }
    }

    /// Tells whether the command may be issued before logging in.
    pub fn is_exempt_from_auth(&self) -> bool {
        matches!(
            self,
            Command::User { .. }
                | Command::Pass { .. }
                | Command::Quit
                | Command::Noop
                | Command::Syst
                | Command::Type { .. }
                | Command::Stru { .. }
                | Command::Mode { .. }
                | Command::Auth { .. }
                | Command::Pbsz { .. }
                | Command::Prot { .. }
                | Command::Feat
                | Command::Opts { .. }
                | Command::Lang { .. }
                | Command::Help { .. }
                | Command::Acct
        )
    }
}
