//! Defines the [`PreparedStatement`] type, which represents a statement
//! that has been prepared in advance on the server.

use bytes::Bytes;

use super::{PageSize, StatementConfig};

/// Represents a statement prepared on the server.
///
/// If a node does not know the statement's id (e.g. it restarted since), the
/// statement is transparently prepared again on that node before it is executed.
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    pub(crate) config: StatementConfig,

    id: Bytes,
    statement: String,
    page_size: PageSize,
}

impl PreparedStatement {
    pub(crate) fn new(id: Bytes, statement: String, config: StatementConfig) -> Self {
        Self {
            config,
            id,
            statement,
            page_size: PageSize::default(),
        }
    }

    pub fn get_id(&self) -> &Bytes {
        &self.id
    }

    /// The text the statement was prepared from.
    pub fn get_statement(&self) -> &str {
        &self.statement
    }
}

impl_statement_config_accessors!(PreparedStatement);
