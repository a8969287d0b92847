use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use cql_driver::errors::{MetadataError, RequestAttemptError};
use cql_driver::frame::value::CqlValue;
use cql_driver::network::ConnectionPool;
use cql_driver::policies::address_translator::{AddressTranslator, IdentityTranslator};
use cql_driver::{Node, TopologyMonitor};

use crate::utils::{
    rows, setup_tracing, void, FixedControlConnection, QueryResponse, RecordedRequest,
    ScriptedConnection, SingleConnectionPool,
};

const LOCAL_COLUMNS: &[&str] = &[
    "rpc_address",
    "broadcast_address",
    "listen_address",
    "data_center",
    "rack",
    "release_version",
    "tokens",
];
const PEER_COLUMNS: &[&str] = &[
    "rpc_address",
    "peer",
    "data_center",
    "rack",
    "release_version",
    "tokens",
];

fn inet(s: &str) -> Option<CqlValue> {
    Some(s.parse::<IpAddr>().unwrap().into())
}

fn peer_row(rpc: &str, peer: &str, rack: &str) -> Vec<Option<CqlValue>> {
    vec![
        inet(rpc),
        inet(peer),
        Some("dc1".into()),
        Some(rack.into()),
        Some("5.0.0".into()),
        Some(CqlValue::Set(vec!["100".into()])),
    ]
}

/// A three node cluster answering system table queries; the control node is 10.0.0.1.
fn cluster_responder(request: &RecordedRequest) -> Option<QueryResponse> {
    let response = match request.text.as_str() {
        "SELECT * FROM system.local" => rows(
            LOCAL_COLUMNS,
            vec![vec![
                inet("10.0.0.1"),
                inet("192.168.0.1"),
                inet("172.16.0.1"),
                Some("dc1".into()),
                Some("r1".into()),
                Some("5.0.0".into()),
                Some(CqlValue::Set(vec!["-100".into(), "0".into()])),
            ]],
        ),
        "SELECT * FROM system.peers" => rows(
            PEER_COLUMNS,
            vec![
                peer_row("10.0.0.2", "192.168.0.2", "r2"),
                peer_row("10.0.0.3", "192.168.0.3", "r3"),
            ],
        ),
        "SELECT * FROM system.peers WHERE peer = :address" => {
            let wanted = request
                .named_values
                .iter()
                .find(|(name, _)| name == "address")
                .and_then(|(_, value)| value.as_inet());
            let matching = [
                peer_row("10.0.0.2", "192.168.0.2", "r2"),
                peer_row("10.0.0.3", "192.168.0.3", "r3"),
            ]
            .into_iter()
            .filter(|row| row[1].as_ref().and_then(CqlValue::as_inet) == wanted)
            .collect();
            rows(PEER_COLUMNS, matching)
        }
        _ => void(),
    };
    Some(response)
}

fn monitor_over(
    control: &Arc<ScriptedConnection>,
    translator: Arc<dyn AddressTranslator>,
) -> (TopologyMonitor, Arc<FixedControlConnection>) {
    let control_connection = FixedControlConnection::new(control.clone());
    let monitor = TopologyMonitor::new(control_connection.clone(), translator);
    (monitor, control_connection)
}

fn node_at(address: SocketAddr) -> Node {
    let pool: Arc<dyn ConnectionPool> =
        SingleConnectionPool::new(ScriptedConnection::new(address, |_| Some(void())));
    Node::new(address, pool)
}

#[tokio::test]
async fn node_list_is_read_over_the_control_connection() {
    setup_tracing();
    let control = ScriptedConnection::new("10.0.0.1:9042".parse().unwrap(), cluster_responder);
    let (monitor, control_connection) = monitor_over(&control, Arc::new(IdentityTranslator));

    monitor.init().await.unwrap();
    assert_eq!(control_connection.init_calls.load(Ordering::Relaxed), 1);

    let nodes = monitor.refresh_node_list().await.unwrap();

    let addresses: Vec<_> = nodes.iter().map(|info| info.connect_address).collect();
    assert_eq!(
        addresses,
        vec![
            Some("10.0.0.1:9042".parse().unwrap()),
            Some("10.0.0.2:9042".parse().unwrap()),
            Some("10.0.0.3:9042".parse().unwrap()),
        ]
    );
    assert_eq!(nodes[0].broadcast_address, "192.168.0.1".parse().ok());
    assert_eq!(nodes[0].listen_address, "172.16.0.1".parse().ok());
    assert_eq!(nodes[0].tokens.len(), 2);
    assert_eq!(nodes[2].rack.as_deref(), Some("r3"));
    assert_eq!(monitor.cached_port(), Some(9042));
}

#[tokio::test]
async fn addresses_are_translated() {
    setup_tracing();
    let control = ScriptedConnection::new("10.0.0.1:9042".parse().unwrap(), cluster_responder);
    let translator: HashMap<SocketAddr, SocketAddr> = HashMap::from([(
        "10.0.0.3:9042".parse().unwrap(),
        "203.0.113.3:19042".parse().unwrap(),
    )]);
    let (monitor, _) = monitor_over(&control, Arc::new(translator));

    let nodes = monitor.refresh_node_list().await.unwrap();
    assert_eq!(nodes[2].connect_address, "203.0.113.3:19042".parse().ok());

    // New nodes are looked up by their translated address.
    let info = monitor
        .get_new_node_info("203.0.113.3:19042".parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(info.broadcast_address, "192.168.0.3".parse().ok());
}

#[tokio::test]
async fn known_node_is_refreshed_by_broadcast_address() {
    setup_tracing();
    let control = ScriptedConnection::new("10.0.0.1:9042".parse().unwrap(), cluster_responder);
    let (monitor, _) = monitor_over(&control, Arc::new(IdentityTranslator));
    let node = node_at("10.0.0.2:9042".parse().unwrap())
        .with_broadcast_address("192.168.0.2".parse().unwrap());

    let info = monitor.refresh_node(&node).await.unwrap().unwrap();

    assert_eq!(info.rack.as_deref(), Some("r2"));
    let requests = control.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].named_values,
        vec![("address".to_owned(), inet("192.168.0.2").unwrap())]
    );
}

#[tokio::test]
async fn control_node_is_not_refreshed_separately() {
    let control = ScriptedConnection::new("10.0.0.1:9042".parse().unwrap(), cluster_responder);
    let (monitor, _) = monitor_over(&control, Arc::new(IdentityTranslator));

    let refreshed = monitor
        .refresh_node(&node_at("10.0.0.1:9042".parse().unwrap()))
        .await
        .unwrap();

    assert!(refreshed.is_none());
    assert!(control.requests().is_empty());
    assert_eq!(monitor.cached_port(), Some(9042));
}

#[tokio::test]
async fn removed_node_refreshes_to_none() {
    let control = ScriptedConnection::new("10.0.0.1:9042".parse().unwrap(), cluster_responder);
    let (monitor, _) = monitor_over(&control, Arc::new(IdentityTranslator));

    let refreshed = monitor
        .refresh_node(&node_at("10.0.0.9:9042".parse().unwrap()))
        .await
        .unwrap();

    assert!(refreshed.is_none());
}

#[tokio::test(start_paused = true)]
async fn unanswered_system_query_times_out() {
    setup_tracing();
    let control = ScriptedConnection::new("10.0.0.1:9042".parse().unwrap(), |request| {
        match request.text.as_str() {
            "SELECT * FROM system.peers" => None,
            _ => cluster_responder(request),
        }
    });
    let (monitor, _) = monitor_over(&control, Arc::new(IdentityTranslator));
    let monitor = monitor.with_request_timeout(Duration::from_secs(2));

    assert_matches!(
        monitor.refresh_node_list().await,
        Err(MetadataError::Query {
            table: "system.peers",
            error: RequestAttemptError::AttemptTimeout(_),
        })
    );
}
