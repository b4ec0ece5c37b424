//! Proxy endpoint descriptor.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors from parsing a proxy line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProxyParseError {
    #[error("empty proxy entry")]
    Empty,
    #[error("proxy '{0}' is missing a port")]
    MissingPort(String),
    #[error("proxy '{0}' has an invalid port")]
    InvalidPort(String),
    #[error("proxy '{0}' has malformed credentials")]
    InvalidCredentials(String),
}

/// An HTTP proxy: `host:port` with optional basic-auth credentials.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Proxy {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
}

impl Proxy {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((user.into(), password.into()));
        self
    }

    /// Proxy URL without credentials; those travel as basic auth.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(user, password)| (user.as_str(), password.as_str()))
    }
}

impl FromStr for Proxy {
    type Err = ProxyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        if line.is_empty() {
            return Err(ProxyParseError::Empty);
        }
        let body = line
            .strip_prefix("http://")
            .or_else(|| line.strip_prefix("https://"))
            .unwrap_or(line)
            .trim_end_matches('/');

        let (credentials, endpoint) = match body.rsplit_once('@') {
            Some((auth, endpoint)) => {
                let credentials = auth
                    .split_once(':')
                    .filter(|(user, _)| !user.is_empty())
                    .ok_or_else(|| ProxyParseError::InvalidCredentials(line.to_string()))?;
                (Some(credentials), endpoint)
            }
            None => (None, body),
        };

        let (host, port) = endpoint
            .rsplit_once(':')
            .filter(|(host, _)| !host.is_empty())
            .ok_or_else(|| ProxyParseError::MissingPort(line.to_string()))?;
        let port: u16 = port
            .parse()
            .map_err(|_| ProxyParseError::InvalidPort(line.to_string()))?;

        let proxy = Self::new(host, port);
        Ok(match credentials {
            Some((user, password)) => proxy.with_credentials(user, password),
            None => proxy,
        })
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.credentials.is_some() {
            write!(f, "***@{}:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Proxy({})", self)
    }
}

/// Parse proxy lines, skipping invalid entries with a warning.
pub fn parse_proxies<I, S>(lines: I) -> Vec<Proxy>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| match line.as_ref().parse::<Proxy>() {
            Ok(proxy) => Some(proxy),
            Err(ProxyParseError::Empty) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring invalid proxy entry");
                None
            }
        })
        .collect()
}
