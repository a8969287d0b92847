//! RESULT response bodies.

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;

use bytes::Bytes;

use crate::frame::value::CqlValue;

/// A single row of a result set.
///
/// Columns are looked up by name; a column that the row's table does not have
/// reads the same as a `null` one. This is what lets `system.local` and
/// `system.peers` rows, which have different column sets, share one code path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    column_names: Arc<[String]>,
    columns: Vec<Option<CqlValue>>,
}

impl Row {
    pub fn new(column_names: Arc<[String]>, columns: Vec<Option<CqlValue>>) -> Self {
        Self {
            column_names,
            columns,
        }
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn columns(&self) -> &[Option<CqlValue>] {
        &self.columns
    }

    /// Value of the named column, `None` if the column is absent or null.
    pub fn get(&self, column: &str) -> Option<&CqlValue> {
        let idx = self.column_names.iter().position(|name| name == column)?;
        self.columns.get(idx)?.as_ref()
    }

    pub fn get_inet(&self, column: &str) -> Option<IpAddr> {
        self.get(column)?.as_inet()
    }

    pub fn get_text(&self, column: &str) -> Option<&str> {
        self.get(column)?.as_text().map(String::as_str)
    }

    /// Reads a `set<text>` column. Non-text elements are skipped.
    pub fn get_text_set(&self, column: &str) -> Option<BTreeSet<String>> {
        let elements = self.get(column)?.as_set()?;
        Some(
            elements
                .iter()
                .filter_map(|element| element.as_text().cloned())
                .collect(),
        )
    }
}

/// Rows of a RESULT:Rows response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rows {
    pub column_names: Arc<[String]>,
    pub rows: Vec<Row>,
    /// Set when there are more pages to fetch.
    pub paging_state: Option<Bytes>,
}

impl Rows {
    /// Builds rows sharing one set of column names.
    pub fn new<S: Into<String>>(
        column_names: impl IntoIterator<Item = S>,
        rows: impl IntoIterator<Item = Vec<Option<CqlValue>>>,
    ) -> Self {
        let column_names: Arc<[String]> = column_names.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .map(|columns| Row::new(Arc::clone(&column_names), columns))
            .collect();
        Self {
            column_names,
            rows,
            paging_state: None,
        }
    }

    pub fn with_paging_state(mut self, paging_state: Bytes) -> Self {
        self.paging_state = Some(paging_state);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetKeyspace {
    pub keyspace_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    pub id: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Result {
    Void,
    Rows(Rows),
    SetKeyspace(SetKeyspace),
    Prepared(Prepared),
}
