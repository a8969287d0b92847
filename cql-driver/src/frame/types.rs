//! Protocol-level enumerations shared by requests and responses.

use std::fmt;

use thiserror::Error;

/// Consistency level of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u16)]
pub enum Consistency {
    Any = 0x0000,
    One = 0x0001,
    Two = 0x0002,
    Three = 0x0003,
    Quorum = 0x0004,
    All = 0x0005,
    #[default]
    LocalQuorum = 0x0006,
    EachQuorum = 0x0007,
    LocalOne = 0x000A,

    // Apparently, Consistency can be set to Serial or LocalSerial in SELECT statements
    // to make them use Paxos.
    Serial = 0x0008,
    LocalSerial = 0x0009,
}

impl Consistency {
    /// Checks if the consistency is a serial consistency.
    pub fn is_serial(&self) -> bool {
        matches!(self, Consistency::Serial | Consistency::LocalSerial)
    }
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Consistency::Any => "ANY",
            Consistency::One => "ONE",
            Consistency::Two => "TWO",
            Consistency::Three => "THREE",
            Consistency::Quorum => "QUORUM",
            Consistency::All => "ALL",
            Consistency::LocalQuorum => "LOCAL_QUORUM",
            Consistency::EachQuorum => "EACH_QUORUM",
            Consistency::LocalOne => "LOCAL_ONE",
            Consistency::Serial => "SERIAL",
            Consistency::LocalSerial => "LOCAL_SERIAL",
        };
        f.write_str(name)
    }
}

/// Size of a single page of results, or no paging at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSize(i32);

/// Returned when trying to create a [`PageSize`] from a non-positive number.
#[derive(Debug, Clone, Error)]
#[error("Invalid page size: {0}. Page size must be positive")]
pub struct InvalidPageSize(i32);

impl PageSize {
    /// Fetch everything in one response. System table queries rely on this,
    /// assuming topology tables are small enough to never need paging.
    pub const UNPAGED: PageSize = PageSize(-1);

    /// Creates a new positive page size.
    pub fn new(size: i32) -> Result<Self, InvalidPageSize> {
        if size > 0 {
            Ok(PageSize(size))
        } else {
            Err(InvalidPageSize(size))
        }
    }

    pub fn is_unpaged(&self) -> bool {
        self.0 < 0
    }

    /// Value as sent on the wire, `-1` meaning "no paging".
    pub fn inner(&self) -> i32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize(5000)
    }
}
