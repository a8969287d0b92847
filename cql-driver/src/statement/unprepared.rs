use super::{PageSize, StatementConfig};

/// A CQL statement sent as text, parsed by the server on every execution.
#[derive(Debug, Clone)]
pub struct Statement {
    pub(crate) config: StatementConfig,

    pub contents: String,
    page_size: PageSize,
}

impl Statement {
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            config: StatementConfig::default(),
            contents: contents.into(),
            page_size: PageSize::default(),
        }
    }

    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }
}

impl_statement_config_accessors!(Statement);

impl From<String> for Statement {
    fn from(contents: String) -> Statement {
        Statement::new(contents)
    }
}

impl From<&str> for Statement {
    fn from(contents: &str) -> Statement {
        Statement::new(contents)
    }
}
