//! Endpoint - Cheap-to-clone producer address
//!
//! Uses Arc<str> internally for O(1) clone operations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

use crate::ContractError;

/// Address (`host:port`) of one frame producer.
///
/// Immutable once constructed; equality and ordering are by value, so a
/// sorted `Vec<Endpoint>` gives the deterministic secondary indexing the relay
/// exposes to consumers. Cloning only increments a reference count.
///
/// # Examples
/// ```
/// use contracts::Endpoint;
///
/// let ep = Endpoint::parse("10.0.0.7:8080").unwrap();
/// assert_eq!(ep.host(), "10.0.0.7");
/// assert_eq!(ep.port(), 8080);
/// assert!(Endpoint::parse("no-port").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Endpoint(Arc<str>);

impl Endpoint {
    /// Parse and validate a `host:port` address.
    pub fn parse(s: &str) -> Result<Self, ContractError> {
        let s = s.trim();
        let invalid = |message: &str| ContractError::InvalidEndpoint {
            value: s.to_string(),
            message: message.to_string(),
        };

        let (host, port) = s.rsplit_once(':').ok_or_else(|| invalid("missing ':port'"))?;
        if host.is_empty() {
            return Err(invalid("empty host"));
        }
        if host.chars().any(char::is_whitespace) {
            return Err(invalid("host contains whitespace"));
        }
        match port.parse::<u16>() {
            Ok(0) => Err(invalid("port must be non-zero")),
            Ok(_) => Ok(Self(Arc::from(s))),
            Err(_) => Err(invalid("port is not a number in 1..=65535")),
        }
    }

    /// Build from separate host and port parts.
    pub fn from_parts(host: &str, port: u16) -> Result<Self, ContractError> {
        Self::parse(&format!("{host}:{port}"))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host part (everything before the last ':').
    pub fn host(&self) -> &str {
        self.0.rsplit_once(':').map(|(h, _)| h).unwrap_or(&self.0)
    }

    /// Port part. Always valid after `parse`.
    pub fn port(&self) -> u16 {
        self.0
            .rsplit_once(':')
            .and_then(|(_, p)| p.parse().ok())
            .unwrap_or_default()
    }
}

impl Deref for Endpoint {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Endpoint {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Endpoint {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for Endpoint {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Endpoint {
    type Error = ContractError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Endpoint({:?})", self.0)
    }
}

impl PartialEq<str> for Endpoint {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for Endpoint {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl Serialize for Endpoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
