use crate::net::{query_route, Topology};
use crate::proto::run_reactive_discovery;
use crate::viz::Snapshot;

#[test]
fn snapshot_captures_route_links_and_tables() {
    // A - B - C, discover A -> C
    let mut topo = Topology::new(20.0);
    let a = topo.add_node("A", 10.0, 50.0);
    let b = topo.add_node("B", 20.0, 50.0);
    let c = topo.add_node("C", 30.0, 50.0);
    topo.link(a, b);
    topo.link(b, c);

    let (engine, _) = run_reactive_discovery(topo, a, c).expect("discover");
    let route = query_route(&engine, engine.topology(), a, c).expect("query");

    let snap = Snapshot::capture(engine.topology(), &route, &engine);
    assert_eq!(snap.nodes.len(), 3);
    assert_eq!(snap.links.len(), 2);
    assert!(snap.links.iter().all(|l| l.on_route));
    assert_eq!(snap.route, vec!["A", "B", "C"]);
    assert_eq!(snap.tables.len(), 3);

    // survives a serde round trip
    let json = serde_json::to_string(&snap).expect("serialize");
    let back: Snapshot = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.nodes.len(), 3);
    assert_eq!(back.route, snap.route);
}

#[test]
fn reactive_entries_serialize_without_distance_fields() {
    let mut topo = Topology::new(20.0);
    let a = topo.add_node("A", 10.0, 50.0);
    let b = topo.add_node("B", 20.0, 50.0);
    topo.link(a, b);

    let (engine, _) = run_reactive_discovery(topo, a, b).expect("discover");
    let route = query_route(&engine, engine.topology(), a, b).expect("query");
    let snap = Snapshot::capture(engine.topology(), &route, &engine);

    let json: serde_json::Value = serde_json::to_value(&snap).expect("to value");
    let entries = json["tables"][0]["entries"]
        .as_array()
        .expect("entries array");
    assert!(!entries.is_empty());
    for e in entries {
        assert!(e.get("distance").is_none());
        assert!(e.get("seq").is_none());
    }
}
