//! apcaccess command construction
//!
//! Builds the argument vector for a status query from the configured base
//! command and an optional NIS target.

use std::fmt;

use tracing::debug;

use crate::config::ConfigError;

/// Default apcupsd NIS port used when a host is given without a port
pub const DEFAULT_NIS_PORT: &str = "3551";

/// Default status executable
pub const DEFAULT_COMMAND: &str = "apcaccess";

const STATUS_ARG: &str = "status";
const HOST_FLAG: &str = "-h";

/// Base invocation of the status executable
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    /// Parse a command line such as `apcaccess` or `sudo -n /sbin/apcaccess`.
    ///
    /// Tokens are split on whitespace. Single or double quotes group words
    /// and are stripped from the result.
    pub fn parse(line: &str) -> Result<Self, ConfigError> {
        let mut tokens = tokenize(line).into_iter();
        let program = tokens
            .next()
            .filter(|p| !p.is_empty())
            .ok_or(ConfigError::EmptyCommand)?;

        Ok(Self {
            program,
            args: tokens.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Default for CommandSpec {
    fn default() -> Self {
        Self {
            program: DEFAULT_COMMAND.to_string(),
            args: Vec::new(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    tokens
}

/// Remote NIS address passed to apcaccess with `-h`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusTarget {
    pub host: String,
    pub port: String,
}

impl fmt::Display for StatusTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A single status query, either against the local daemon or a remote one
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusQuery {
    target: Option<StatusTarget>,
}

impl StatusQuery {
    /// Query the local daemon through apcaccess' default socket
    pub fn local() -> Self {
        Self { target: None }
    }

    /// Query a remote daemon at `host:port`
    pub fn remote(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            target: Some(StatusTarget {
                host: host.into(),
                port: port.into(),
            }),
        }
    }

    /// Build a query from the `host` and `port` request parameters.
    ///
    /// Blank values count as absent. A `port` without a `host` is ignored.
    pub fn from_params(host: Option<&str>, port: Option<&str>) -> Self {
        let host = host.filter(|h| !h.trim().is_empty());
        let port = port.filter(|p| !p.trim().is_empty());

        match host {
            Some(host) => Self::remote(host, port.unwrap_or(DEFAULT_NIS_PORT)),
            None => {
                if let Some(port) = port {
                    debug!("Ignoring port {} without host", port);
                }
                Self::local()
            }
        }
    }

    pub fn target(&self) -> Option<&StatusTarget> {
        self.target.as_ref()
    }

    /// Full argument vector, program first
    pub fn argv(&self, command: &CommandSpec) -> Vec<String> {
        let mut argv = Vec::with_capacity(command.args().len() + 4);
        argv.push(command.program().to_string());
        argv.extend(command.args().iter().cloned());

        if let Some(target) = &self.target {
            argv.push(HOST_FLAG.to_string());
            argv.push(target.to_string());
        }

        argv.push(STATUS_ARG.to_string());
        argv
    }
}
