use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use cql_driver::errors::{DbError, ExecutionError, RequestAttemptError};
use cql_driver::frame::types::Consistency;
use cql_driver::frame::value::CqlValue;
use cql_driver::network::{Connection, ConnectionPool};
use cql_driver::policies::address_translator::IdentityTranslator;
use cql_driver::policies::retry::FallthroughRetryPolicy;
use cql_driver::{ExecutionProfile, Node, Session, SessionConfig, Statement};

use crate::utils::{
    db_error, rows, set_keyspace, setup_tracing, void, FixedControlConnection, ScriptedConnection,
    SingleConnectionPool,
};

fn addr(s: &str) -> SocketAddr {
    s.parse().unwrap()
}

fn inet(s: &str) -> Option<CqlValue> {
    Some(s.parse::<IpAddr>().unwrap().into())
}

fn node(connection: &Arc<ScriptedConnection>) -> (Arc<Node>, Arc<SingleConnectionPool>) {
    let pool = SingleConnectionPool::new(connection.clone());
    let node = Arc::new(Node::new(connection.connect_address(), pool.clone()));
    (node, pool)
}

#[tokio::test]
async fn overloaded_node_is_skipped_for_idempotent_statements() {
    setup_tracing();
    let overloaded = ScriptedConnection::new(addr("127.0.0.1:9042"), |_| {
        Some(db_error(DbError::Overloaded))
    });
    let healthy = ScriptedConnection::new(addr("127.0.0.2:9042"), |_| {
        Some(rows(&["v"], vec![vec![Some(CqlValue::Int(3))]]))
    });
    let (node1, _) = node(&overloaded);
    let (node2, _) = node(&healthy);
    let session = Session::new(SessionConfig::new(), vec![node1, node2]);

    let mut statement = Statement::new("SELECT v FROM ks.t");
    statement.set_is_idempotent(true);
    let result = session.query_unpaged(statement, &[]).await.unwrap();

    let rows = result.into_rows().unwrap();
    assert_eq!(rows[0].get("v"), Some(&CqlValue::Int(3)));
    assert_eq!(overloaded.requests().len(), 1);
    assert_eq!(healthy.requests().len(), 1);
}

#[tokio::test]
async fn overloaded_node_fails_non_idempotent_writes() {
    setup_tracing();
    let overloaded = ScriptedConnection::new(addr("127.0.0.1:9042"), |_| {
        Some(db_error(DbError::Overloaded))
    });
    let healthy = ScriptedConnection::new(addr("127.0.0.2:9042"), |_| Some(void()));
    let (node1, _) = node(&overloaded);
    let (node2, _) = node(&healthy);
    let session = Session::new(SessionConfig::new(), vec![node1, node2]);

    let error = session
        .query_unpaged("UPDATE ks.t SET v = v + 1 WHERE k = 0", &[])
        .await
        .unwrap_err();

    assert_matches!(
        error,
        ExecutionError::LastAttemptError {
            error: RequestAttemptError::DbError(DbError::Overloaded, _),
            ..
        }
    );
    assert!(healthy.requests().is_empty());
}

#[tokio::test]
async fn remapped_profile_is_used_by_the_next_request() {
    setup_tracing();
    let attempts = Arc::new(AtomicUsize::new(0));
    let bootstrapping = |address: &str| {
        let attempts = attempts.clone();
        ScriptedConnection::new(addr(address), move |_| {
            attempts.fetch_add(1, Ordering::Relaxed);
            Some(db_error(DbError::IsBootstrapping))
        })
    };
    let (node1, _) = node(&bootstrapping("127.0.0.1:9042"));
    let (node2, _) = node(&bootstrapping("127.0.0.2:9042"));

    let handle = ExecutionProfile::builder()
        .consistency(Consistency::Quorum)
        .build()
        .into_handle();
    let session = Session::new(
        SessionConfig::new().with_default_execution_profile_handle(handle.clone()),
        vec![node1, node2],
    );

    // The default policy tries the next node after IsBootstrapping.
    assert_matches!(
        session.query_unpaged("SELECT v FROM ks.t", &[]).await,
        Err(ExecutionError::AllNodesFailed { .. })
    );
    assert_eq!(attempts.load(Ordering::Relaxed), 2);

    let mut handle = handle;
    handle.map_to_another_profile(
        ExecutionProfile::builder()
            .retry_policy(Arc::new(FallthroughRetryPolicy::new()))
            .build(),
    );
    assert_matches!(
        session.query_unpaged("SELECT v FROM ks.t", &[]).await,
        Err(ExecutionError::LastAttemptError { .. })
    );
    assert_eq!(attempts.load(Ordering::Relaxed), 3);
}

#[tokio::test(start_paused = true)]
async fn statement_timeout_overrides_the_profile() {
    setup_tracing();
    let silent = ScriptedConnection::new(addr("127.0.0.1:9042"), |_| None);
    let (node1, _) = node(&silent);
    let session = Session::new(SessionConfig::new(), vec![node1]);

    let mut statement = Statement::new("SELECT v FROM ks.t");
    statement.set_request_timeout(Some(Duration::from_millis(250)));
    let error = session.query_unpaged(statement, &[]).await.unwrap_err();

    assert_matches!(
        error,
        ExecutionError::RequestTimeout { timeout, .. } if timeout == Duration::from_millis(250)
    );
}

#[tokio::test]
async fn keyspace_follows_new_nodes_after_refresh() {
    setup_tracing();
    let control = ScriptedConnection::new(addr("127.0.0.1:9042"), |request| {
        let response = match request.text.as_str() {
            "SELECT * FROM system.local" => rows(
                &["rpc_address", "broadcast_address", "data_center"],
                vec![vec![
                    inet("127.0.0.1"),
                    inet("127.0.0.1"),
                    Some("dc1".into()),
                ]],
            ),
            "SELECT * FROM system.peers" => rows(
                &["rpc_address", "peer", "data_center"],
                vec![vec![
                    inet("127.0.0.2"),
                    inet("127.0.0.2"),
                    Some("dc1".into()),
                ]],
            ),
            "USE ks" => set_keyspace("ks"),
            _ => void(),
        };
        Some(response)
    });
    let (contact_point, contact_pool) = node(&control);
    let session = Session::new(SessionConfig::new(), vec![contact_point]);
    session.use_keyspace("ks", false).await.unwrap();
    assert_eq!(*contact_pool.keyspaces.lock().unwrap(), vec!["ks".to_owned()]);

    let new_pools: Arc<std::sync::Mutex<Vec<Arc<SingleConnectionPool>>>> = Default::default();
    let monitor = session.topology_monitor(
        FixedControlConnection::new(control.clone()),
        Arc::new(IdentityTranslator),
    );
    session
        .refresh_cluster_state(&monitor, |address| {
            let connection = ScriptedConnection::new(address, |_| Some(void()));
            let pool = SingleConnectionPool::new(connection);
            new_pools.lock().unwrap().push(pool.clone());
            pool as Arc<dyn ConnectionPool>
        })
        .await
        .unwrap();

    let state = session.get_cluster_state();
    let addresses: Vec<_> = state
        .get_nodes_info()
        .iter()
        .map(|node| node.connect_address)
        .collect();
    assert_eq!(addresses, vec![addr("127.0.0.1:9042"), addr("127.0.0.2:9042")]);
    assert_eq!(
        state.get_nodes_info()[0].datacenter.as_deref(),
        Some("dc1")
    );

    // Only the peer needed a new pool, and it was switched to the session's keyspace.
    let new_pools = new_pools.lock().unwrap();
    assert_eq!(new_pools.len(), 1);
    assert_eq!(*new_pools[0].keyspaces.lock().unwrap(), vec!["ks".to_owned()]);
    assert_eq!(*contact_pool.keyspaces.lock().unwrap(), vec!["ks".to_owned()]);
}
