//! Shared value types for the mcpdesk domain.
//!
//! [`ServerDescriptor`] is the unit persisted by the registry: one element of
//! the JSON array `[{id, name, host, port, protocol?}, ...]`. The remaining
//! types carry the invariants the descriptor relies on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ServerId;

// ---------------------------------------------------------------------------
// Transport selection
// ---------------------------------------------------------------------------

/// Which transport an endpoint speaks.
///
/// Persisted as `"tcp"` / `"http"`. Reading is lenient: anything other than
/// `"http"`, including a missing or `null` field, is a socket endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum TransportKind {
    /// Persistent TCP stream, newline-framed requests.
    #[default]
    #[serde(rename = "tcp")]
    Socket,
    /// Stateless HTTP `POST` with JSON bodies.
    #[serde(rename = "http")]
    Http,
}

impl TransportKind {
    /// Returns the persisted name of this transport.
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Socket => "tcp",
            TransportKind::Http => "http",
        }
    }
}

impl<'de> Deserialize<'de> for TransportKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = Option::<String>::deserialize(deserializer)?;
        Ok(match name.as_deref() {
            Some("http") => TransportKind::Http,
            _ => TransportKind::Socket,
        })
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" | "socket" => Ok(TransportKind::Socket),
            "http" => Ok(TransportKind::Http),
            other => Err(format!("unknown protocol '{other}' (expected 'tcp' or 'http')")),
        }
    }
}

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// Returned when a port number is outside `1..=65535`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("port must be in 1..=65535, got {0}")]
pub struct InvalidPort(pub u16);

/// A TCP port in the range `1..=65535`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Creates a [`Port`], returning `None` for port 0.
    #[must_use]
    pub fn new(value: u16) -> Option<Self> {
        if value == 0 {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Returns the port number.
    pub fn as_u16(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for Port {
    type Error = InvalidPort;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidPort(value))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

impl std::fmt::Display for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Endpoint descriptor
// ---------------------------------------------------------------------------

/// A registered remote endpoint.
///
/// `protocol` is defaulted once, at deserialisation or construction time;
/// read sites never need to handle an absent transport kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    /// Unique registry key.
    pub id: ServerId,
    /// Display name shown in the UI.
    pub name: String,
    /// Host name or IP address.
    pub host: String,
    /// Port the endpoint listens on.
    pub port: Port,
    /// Transport the endpoint speaks.
    #[serde(default)]
    pub protocol: TransportKind,
}

impl ServerDescriptor {
    /// Creates a descriptor for a socket endpoint.
    pub fn new(id: ServerId, name: impl Into<String>, host: impl Into<String>, port: Port) -> Self {
        Self {
            id,
            name: name.into(),
            host: host.into(),
            port,
            protocol: TransportKind::default(),
        }
    }

    /// Returns a copy of this descriptor using `protocol`.
    #[must_use]
    pub fn with_protocol(mut self, protocol: TransportKind) -> Self {
        self.protocol = protocol;
        self
    }

    /// Returns `host:port`, bracketing IPv6 literals (`[::1]:9000`).
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// A reply received from the connected endpoint, stamped on capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Reply text. Not parsed.
    pub content: String,
    /// When the send that produced this reply completed.
    pub timestamp: Timestamp,
}

impl Reply {
    /// Creates a reply stamped with the current time.
    pub fn now(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            timestamp: Timestamp::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> ServerDescriptor {
        ServerDescriptor::new(
            ServerId::new("s1").unwrap(),
            "Local",
            "127.0.0.1",
            Port::new(9000).unwrap(),
        )
    }

    #[test]
    fn missing_protocol_defaults_to_socket() {
        let json = r#"{"id":"s1","name":"Local","host":"127.0.0.1","port":9000}"#;
        let d: ServerDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.protocol, TransportKind::Socket);
        assert_eq!(d, local());
    }

    #[test]
    fn protocol_uses_persisted_names() {
        let d = local().with_protocol(TransportKind::Http);
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["protocol"], "http");
        assert_eq!(v["port"], 9000);

        let v = serde_json::to_value(local()).unwrap();
        assert_eq!(v["protocol"], "tcp");
    }

    #[test]
    fn unknown_protocol_reads_as_socket() {
        for raw in [r#""https""#, r#""TCP""#, "null"] {
            let json = format!(r#"{{"id":"s1","name":"Local","host":"127.0.0.1","port":9000,"protocol":{raw}}}"#);
            let d: ServerDescriptor = serde_json::from_str(&json).unwrap();
            assert_eq!(d.protocol, TransportKind::Socket, "protocol {raw}");
        }
    }

    #[test]
    fn port_zero_is_rejected() {
        assert!(Port::new(0).is_none());
        let json = r#"{"id":"s1","name":"x","host":"h","port":0}"#;
        assert!(serde_json::from_str::<ServerDescriptor>(json).is_err());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let json = r#"{"id":"s1","name":"x","port":9000}"#;
        assert!(serde_json::from_str::<ServerDescriptor>(json).is_err());
    }

    #[test]
    fn transport_kind_parses_cli_names() {
        assert_eq!("tcp".parse::<TransportKind>(), Ok(TransportKind::Socket));
        assert_eq!("http".parse::<TransportKind>(), Ok(TransportKind::Http));
        assert!("udp".parse::<TransportKind>().is_err());
    }

    #[test]
    fn address_joins_host_and_port() {
        assert_eq!(local().address(), "127.0.0.1:9000");

        let mut v6 = local();
        v6.host = "::1".into();
        assert_eq!(v6.address(), "[::1]:9000");
        v6.host = "[::1]".into();
        assert_eq!(v6.address(), "[::1]:9000");
    }
}
