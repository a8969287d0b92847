//! Values of CQL columns and bound markers.

use std::net::IpAddr;

use uuid::Uuid;

/// A CQL value, as read from a result row or bound to a statement.
///
/// Only the types used by the driver core itself (system tables, keys of
/// simple statements) are represented.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CqlValue {
    Ascii(String),
    Boolean(bool),
    Blob(Vec<u8>),
    Int(i32),
    BigInt(i64),
    Text(String),
    Inet(IpAddr),
    Uuid(Uuid),
    List(Vec<CqlValue>),
    Set(Vec<CqlValue>),
}

impl CqlValue {
    pub fn as_text(&self) -> Option<&String> {
        match self {
            Self::Ascii(s) | Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_inet(&self) -> Option<IpAddr> {
        match self {
            Self::Inet(addr) => Some(*addr),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&Vec<CqlValue>> {
        match self {
            Self::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<CqlValue>> {
        match self {
            Self::List(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for CqlValue {
    fn from(s: &str) -> Self {
        CqlValue::Text(s.to_owned())
    }
}

impl From<String> for CqlValue {
    fn from(s: String) -> Self {
        CqlValue::Text(s)
    }
}

impl From<IpAddr> for CqlValue {
    fn from(addr: IpAddr) -> Self {
        CqlValue::Inet(addr)
    }
}

impl From<i32> for CqlValue {
    fn from(v: i32) -> Self {
        CqlValue::Int(v)
    }
}

impl From<i64> for CqlValue {
    fn from(v: i64) -> Self {
        CqlValue::BigInt(v)
    }
}
