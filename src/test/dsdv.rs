use crate::net::{query_route, NodeId, RouteTable, SimError, Topology};
use crate::proto::dsdv::{ChurnEvent, Dsdv, DsdvConfig, DsdvEntry, DsdvUpdate, INFINITY};
use crate::sim::Scheduler;

/// Config with the churn window closed from round zero, so runs converge
/// and exit as soon as the tables settle.
fn quiet_cfg(rounds: u64) -> DsdvConfig {
    DsdvConfig {
        rounds,
        churn_margin: rounds,
        removal_permille: 0,
        ..DsdvConfig::default()
    }
}

fn clique3() -> Topology {
    let mut topo = Topology::new(20.0);
    let a = topo.add_node("A", 50.0, 50.0);
    let b = topo.add_node("B", 55.0, 50.0);
    let c = topo.add_node("C", 50.0, 55.0);
    topo.link(a, b);
    topo.link(b, c);
    topo.link(a, c);
    topo
}

/// hub A with leaves B, C, D
fn star4() -> Topology {
    let mut topo = Topology::new(20.0);
    let a = topo.add_node("A", 50.0, 50.0);
    let b = topo.add_node("B", 60.0, 50.0);
    let c = topo.add_node("C", 50.0, 60.0);
    let d = topo.add_node("D", 40.0, 50.0);
    topo.link(a, b);
    topo.link(a, c);
    topo.link(a, d);
    topo
}

#[test]
fn clique_converges_to_direct_routes() {
    let mut engine = Dsdv::new(clique3(), quiet_cfg(100), 1);
    let mut sched = Scheduler::default();
    sched.run_rounds(&mut engine, 100).expect("run");

    for i in 0..3 {
        let node = NodeId(i);
        let dump = engine.dump_table(node).expect("dump");
        assert_eq!(dump.entries.len(), 2, "node {} table", dump.node);
        for j in 0..3 {
            if i == j {
                continue;
            }
            let e = engine.entry(node, NodeId(j)).expect("entry");
            assert_eq!(e.distance, 1);
            assert_eq!(e.next_hop, NodeId(j), "next hop is the destination itself");
        }
    }
}

#[test]
fn line_learns_multi_hop_distances() {
    // A - B - C
    let mut topo = Topology::new(20.0);
    let a = topo.add_node("A", 10.0, 50.0);
    let b = topo.add_node("B", 20.0, 50.0);
    let c = topo.add_node("C", 30.0, 50.0);
    topo.link(a, b);
    topo.link(b, c);

    let mut engine = Dsdv::new(topo, quiet_cfg(100), 2);
    let mut sched = Scheduler::default();
    sched.run_rounds(&mut engine, 100).expect("run");

    let e = engine.entry(a, c).expect("A knows C");
    assert_eq!(e.distance, 2);
    assert_eq!(e.next_hop, b);

    let path = query_route(&engine, engine.topology(), a, c).expect("query");
    assert_eq!(path, vec![a, b, c]);
}

#[test]
fn distances_stay_sane_after_convergence() {
    let mut engine = Dsdv::new(star4(), quiet_cfg(100), 3);
    let mut sched = Scheduler::default();
    sched.run_rounds(&mut engine, 100).expect("run");

    // INFINITY is a reserved sentinel, never a real hop count
    for i in 0..4 {
        for j in 0..4 {
            if let Some(e) = engine.entry(NodeId(i), NodeId(j)) {
                assert!(e.distance == INFINITY || e.distance <= 3, "entry {e:?}");
            }
        }
    }
}

#[test]
fn poisoned_entry_ignores_stale_sequence_numbers() {
    // A - B - C, then C disappears
    let mut topo = Topology::new(20.0);
    let a = topo.add_node("A", 10.0, 50.0);
    let b = topo.add_node("B", 20.0, 50.0);
    let c = topo.add_node("C", 30.0, 50.0);
    topo.link(a, b);
    topo.link(b, c);

    let mut engine = Dsdv::new(topo, quiet_cfg(200), 4);
    let mut sched = Scheduler::default();
    sched.run_rounds(&mut engine, 100).expect("converge");

    engine.remove_node(c, sched.round());
    let poisoned = engine.entry(b, c).expect("B still remembers C");
    assert_eq!(poisoned.distance, INFINITY);
    let seq = poisoned.seq;

    // a stale advertisement cannot resurrect the route
    let stale = DsdvUpdate {
        from: a,
        seq: 1,
        entries: vec![DsdvEntry {
            dest: c,
            next_hop: b,
            distance: 1,
            seq: 1,
        }],
    };
    engine.receive(b, &stale);
    assert_eq!(engine.entry(b, c).expect("entry").distance, INFINITY);

    // only a strictly newer sequence number supersedes the poison
    let fresh = DsdvUpdate {
        from: a,
        seq: seq + 10,
        entries: vec![DsdvEntry {
            dest: c,
            next_hop: b,
            distance: 1,
            seq: seq + 10,
        }],
    };
    engine.receive(b, &fresh);
    let e = engine.entry(b, c).expect("entry");
    assert_eq!(e.distance, 2);
    assert_eq!(e.next_hop, a);
    assert_eq!(e.seq, seq + 10);
}

#[test]
fn removed_leaf_is_poisoned_everywhere_then_rejoins() {
    let mut engine = Dsdv::new(star4(), quiet_cfg(400), 9);
    let mut sched = Scheduler::default();
    sched.run_rounds(&mut engine, 60).expect("converge");

    let (a, b) = (NodeId(0), NodeId(1));
    assert_eq!(engine.entry(NodeId(2), b).expect("C knows B").distance, 2);

    engine.remove_node(b, sched.round());
    assert_eq!(engine.entry(a, b).expect("hub entry").distance, INFINITY);
    assert!(matches!(
        engine.topology().node(b),
        Err(SimError::NodeNotFound { .. })
    ));

    // one round: the hub floods the poison to the remaining leaves; the
    // rejoin barrier is still blocked by dirty flags
    sched.run_rounds(&mut engine, 1).expect("propagate");
    assert_eq!(engine.entry(NodeId(2), b).expect("C entry").distance, INFINITY);
    assert_eq!(engine.entry(NodeId(3), b).expect("D entry").distance, INFINITY);

    // once no node is dirty the queued node rejoins at a fresh position
    sched.run_rounds(&mut engine, 100).expect("rejoin");
    assert!(engine
        .churn_log()
        .iter()
        .any(|ev| matches!(ev, ChurnEvent::Rejoined { node, .. } if *node == b)));

    let node = engine.topology().node(b).expect("B is back");
    assert!(!node.neighbours().is_empty());
    let nb = *node.neighbours().iter().next().expect("a neighbour");
    assert_eq!(engine.entry(nb, b).expect("fresh entry").distance, 1);
    assert_eq!(engine.entry(b, nb).expect("fresh entry").distance, 1);
}

#[test]
fn removal_leaves_churn_log_ordered() {
    let mut engine = Dsdv::new(star4(), quiet_cfg(400), 11);
    let mut sched = Scheduler::default();
    sched.run_rounds(&mut engine, 40).expect("converge");

    engine.remove_node(NodeId(3), sched.round());
    sched.run_rounds(&mut engine, 100).expect("drain");

    let log = engine.churn_log();
    assert!(matches!(log[0], ChurnEvent::Removed { node, .. } if node == NodeId(3)));
    assert!(matches!(log[1], ChurnEvent::Rejoined { node, .. } if node == NodeId(3)));
}
