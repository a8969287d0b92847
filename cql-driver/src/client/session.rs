//! The [`Session`] executes statements against the cluster. It owns the list
//! of known nodes and the keyspace the connections use.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::{ArcSwap, ArcSwapOption};
use bytes::Bytes;
use tracing::debug;

use crate::client::execution_profile::{ExecutionProfile, ExecutionProfileHandle};
use crate::cluster::{ClusterState, ControlConnection, Node, TopologyMonitor};
use crate::errors::{BadKeyspaceName, ExecutionError, MetadataError, UseKeyspaceError};
use crate::execution::attempt::RequestKind;
use crate::execution::request_handler::run_request;
use crate::frame::request::BoundValues;
use crate::frame::response::{result, CqlResponseKind};
use crate::frame::types::PageSize;
use crate::frame::value::CqlValue;
use crate::network::ConnectionPool;
use crate::policies::address_translator::AddressTranslator;
use crate::response::QueryResult;
use crate::statement::prepared::PreparedStatement;
use crate::statement::unprepared::Statement;
use crate::statement::StatementConfig;

pub(crate) const DEFAULT_CONTROL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration options for [`Session`].
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct SessionConfig {
    /// Execution profile used by statements that have no profile handle of their own.
    pub default_execution_profile_handle: ExecutionProfileHandle,

    /// Keyspace the session starts with, set on all pools before the first request.
    pub used_keyspace: Option<String>,

    /// Timeout of each system table query sent over the control connection.
    pub control_connection_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_execution_profile_handle: ExecutionProfile::default().into_handle(),
            used_keyspace: None,
            control_connection_timeout: DEFAULT_CONTROL_CONNECTION_TIMEOUT,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_keyspace(mut self, keyspace_name: impl Into<String>) -> Self {
        self.used_keyspace = Some(keyspace_name.into());
        self
    }

    pub fn with_default_execution_profile_handle(mut self, handle: ExecutionProfileHandle) -> Self {
        self.default_execution_profile_handle = handle;
        self
    }

    pub fn with_control_connection_timeout(mut self, timeout: Duration) -> Self {
        self.control_connection_timeout = timeout;
        self
    }
}

/// Entry point for executing statements.
pub struct Session {
    cluster: ArcSwap<ClusterState>,
    default_execution_profile_handle: ExecutionProfileHandle,
    keyspace_name: ArcSwapOption<String>,
    control_connection_timeout: Duration,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("cluster", &self.cluster.load())
            .field(
                "default_execution_profile_handle",
                &self.default_execution_profile_handle,
            )
            .field("keyspace_name", &self.keyspace_name.load())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a session over the given nodes.
    ///
    /// If the config names a keyspace, every node's pool is told to use it.
    pub fn new(config: SessionConfig, known_nodes: Vec<Arc<Node>>) -> Self {
        let session = Self {
            cluster: ArcSwap::from_pointee(ClusterState::new(known_nodes)),
            default_execution_profile_handle: config.default_execution_profile_handle,
            keyspace_name: ArcSwapOption::empty(),
            control_connection_timeout: config.control_connection_timeout,
        };
        if let Some(keyspace_name) = config.used_keyspace {
            session.set_keyspace(&keyspace_name);
        }
        session
    }

    /// Fetches one page of `statement`'s rows, sized by the statement's page size.
    /// Pass the paging state of the previous page to fetch the next one.
    pub async fn query_single_page(
        &self,
        statement: impl Into<Statement>,
        values: &[CqlValue],
        paging_state: Option<Bytes>,
    ) -> Result<QueryResult, ExecutionError> {
        let statement = statement.into();
        self.do_query(
            &statement,
            values,
            statement.get_page_size(),
            paging_state.as_ref(),
        )
        .await
    }

    /// Runs `statement` and returns every row in a single response.
    ///
    /// A `USE <keyspace>` statement switches the session's keyspace once it succeeds.
    pub async fn query_unpaged(
        &self,
        statement: impl Into<Statement>,
        values: &[CqlValue],
    ) -> Result<QueryResult, ExecutionError> {
        self.do_query(&statement.into(), values, PageSize::UNPAGED, None)
            .await
    }

    async fn do_query(
        &self,
        statement: &Statement,
        values: &[CqlValue],
        page_size: PageSize,
        paging_state: Option<&Bytes>,
    ) -> Result<QueryResult, ExecutionError> {
        let kind = RequestKind::Query {
            contents: &statement.contents,
            values: BoundValues::Positional(values),
            page_size,
            paging_state,
        };
        let (response, execution_info) = run_request(self, kind, &statement.config).await?;
        Ok(QueryResult::new(response, execution_info))
    }

    /// The prepared counterpart of [`query_single_page`](Self::query_single_page).
    pub async fn execute_single_page(
        &self,
        prepared: &PreparedStatement,
        values: &[CqlValue],
        paging_state: Option<Bytes>,
    ) -> Result<QueryResult, ExecutionError> {
        self.do_execute(
            prepared,
            values,
            prepared.get_page_size(),
            paging_state.as_ref(),
        )
        .await
    }

    /// The prepared counterpart of [`query_unpaged`](Self::query_unpaged).
    ///
    /// A node that answers `Unprepared` gets the statement prepared again over
    /// the same connection, and the execution is sent once more.
    pub async fn execute_unpaged(
        &self,
        prepared: &PreparedStatement,
        values: &[CqlValue],
    ) -> Result<QueryResult, ExecutionError> {
        self.do_execute(prepared, values, PageSize::UNPAGED, None)
            .await
    }

    async fn do_execute(
        &self,
        prepared: &PreparedStatement,
        values: &[CqlValue],
        page_size: PageSize,
        paging_state: Option<&Bytes>,
    ) -> Result<QueryResult, ExecutionError> {
        let kind = RequestKind::Execute {
            id: prepared.get_id(),
            statement: prepared.get_statement(),
            values: BoundValues::Positional(values),
            page_size,
            paging_state,
        };
        let (response, execution_info) = run_request(self, kind, &prepared.config).await?;
        Ok(QueryResult::new(response, execution_info))
    }

    /// Prepares `statement` on the first node of the plan that answers;
    /// other nodes prepare it on the fly when they first see it.
    /// The prepared statement inherits the configuration of the given statement.
    pub async fn prepare(
        &self,
        statement: impl Into<Statement>,
    ) -> Result<PreparedStatement, ExecutionError> {
        let statement = statement.into();

        // Preparing has no side effects, so it can always be retried on another node.
        let mut config = statement.config.clone();
        config.is_idempotent = true;

        let kind = RequestKind::Prepare {
            statement: &statement.contents,
        };
        let (response, _) = run_request(self, kind, &config).await?;
        match response.result {
            result::Result::Prepared(prepared) => {
                let page_size = statement.get_page_size();
                let mut prepared_statement =
                    PreparedStatement::new(prepared.id, statement.contents, statement.config);
                prepared_statement.set_page_size(page_size);
                Ok(prepared_statement)
            }
            _ => Err(ExecutionError::UnexpectedResponse(CqlResponseKind::Result)),
        }
    }

    /// Makes `keyspace_name` the keyspace of every connection, so that tables
    /// can be named without it.
    ///
    /// The name is checked before anything is sent: at most 48 characters,
    /// ASCII letters, digits and underscores only. With `case_sensitive` the
    /// name is quoted in the `USE` statement.
    ///
    /// Concurrent calls with different names may leave the pools disagreeing
    /// on the keyspace.
    pub async fn use_keyspace(
        &self,
        keyspace_name: impl Into<String>,
        case_sensitive: bool,
    ) -> Result<(), UseKeyspaceError> {
        let keyspace_name = keyspace_name.into();

        // USE takes no bind markers; the name goes into the text.
        verify_keyspace_name_is_valid(&keyspace_name)?;
        let query = if case_sensitive {
            format!("USE \"{keyspace_name}\"")
        } else {
            format!("USE {keyspace_name}")
        };

        let kind = RequestKind::Query {
            contents: &query,
            values: BoundValues::EMPTY,
            page_size: PageSize::UNPAGED,
            paging_state: None,
        };
        // The request handler switches the keyspace on a SetKeyspace result.
        let (response, _) = run_request(self, kind, &StatementConfig::default()).await?;
        match response.as_set_keyspace() {
            Some(_) => Ok(()),
            None => Err(UseKeyspaceError::KeyspaceNotSet),
        }
    }

    /// The keyspace set by the last successful `USE`, or by the session config.
    pub fn get_keyspace(&self) -> Option<Arc<String>> {
        self.keyspace_name.load_full()
    }

    /// Switches the keyspace after a successful `USE` and tells every pool about it.
    pub(crate) fn set_keyspace(&self, keyspace_name: &str) {
        self.keyspace_name
            .store(Some(Arc::new(keyspace_name.to_owned())));
        for node in self.cluster.load().get_nodes_info() {
            node.use_keyspace(keyspace_name);
        }
    }

    /// A snapshot of the nodes currently known.
    pub fn get_cluster_state(&self) -> Arc<ClusterState> {
        self.cluster.load_full()
    }

    /// Profile of statements that carry no handle of their own.
    pub fn get_default_execution_profile_handle(&self) -> &ExecutionProfileHandle {
        &self.default_execution_profile_handle
    }

    /// Creates a topology monitor querying through the given control connection,
    /// with this session's control connection timeout.
    pub fn topology_monitor(
        &self,
        control_connection: Arc<dyn ControlConnection>,
        address_translator: Arc<dyn AddressTranslator>,
    ) -> TopologyMonitor {
        TopologyMonitor::new(control_connection, address_translator)
            .with_request_timeout(self.control_connection_timeout)
    }

    /// Reads the node list through the monitor and replaces the session's cluster state with it.
    ///
    /// Nodes that are already known keep their connection pools; `new_pool` is called
    /// for the others. Nodes without an rpc address are left out.
    pub async fn refresh_cluster_state(
        &self,
        monitor: &TopologyMonitor,
        new_pool: impl Fn(SocketAddr) -> Arc<dyn ConnectionPool>,
    ) -> Result<(), MetadataError> {
        let node_infos = monitor.refresh_node_list().await?;
        let old_state = self.cluster.load_full();
        let keyspace_name = self.get_keyspace();

        let nodes: Vec<Arc<Node>> = node_infos
            .iter()
            .filter_map(|info| {
                let connect_address = info.connect_address?;
                let pool = match old_state
                    .get_nodes_info()
                    .iter()
                    .find(|node| node.connect_address == connect_address)
                {
                    Some(known) => Arc::clone(known.pool()),
                    None => {
                        let pool = new_pool(connect_address);
                        if let Some(keyspace_name) = &keyspace_name {
                            pool.use_keyspace(keyspace_name);
                        }
                        pool
                    }
                };
                Node::from_node_info(info, pool).map(Arc::new)
            })
            .collect();

        debug!("Cluster state refreshed, {} nodes known", nodes.len());
        self.cluster.store(Arc::new(ClusterState::new(nodes)));
        Ok(())
    }
}

const MAX_KEYSPACE_NAME_LEN: usize = 48;

// Leading underscores are accepted, as the server accepts them.
fn verify_keyspace_name_is_valid(keyspace_name: &str) -> Result<(), BadKeyspaceName> {
    if keyspace_name.is_empty() {
        return Err(BadKeyspaceName::Empty);
    }
    if let Some(illegal) = keyspace_name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(BadKeyspaceName::IllegalCharacter(
            keyspace_name.to_owned(),
            illegal,
        ));
    }
    // All ASCII by now, so bytes are characters.
    if keyspace_name.len() > MAX_KEYSPACE_NAME_LEN {
        return Err(BadKeyspaceName::TooLong(
            keyspace_name.to_owned(),
            keyspace_name.len(),
        ));
    }
    Ok(())
}
