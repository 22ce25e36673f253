use crate::net::SimError;
use crate::topo::random_geo::{generate, node_name, GeoOpts};

#[test]
fn generated_topology_has_symmetric_neighbours() {
    let opts = GeoOpts {
        nodes: 20,
        ..GeoOpts::default()
    };
    let topo = generate(&opts, 7).expect("generate");
    for a in topo.nodes() {
        for &b in a.neighbours() {
            assert!(
                topo.nodes()[b.0].neighbours().contains(&a.id()),
                "{} -> {} is not symmetric",
                a.name(),
                topo.name_of(b)
            );
        }
    }
}

#[test]
fn generated_topology_has_no_isolated_nodes() {
    // Every node after the first is only placed once an existing node is in
    // range, and positions never move before the link pass.
    let opts = GeoOpts {
        nodes: 12,
        ..GeoOpts::default()
    };
    let topo = generate(&opts, 3).expect("generate");
    for n in topo.nodes() {
        assert!(!n.neighbours().is_empty(), "node {} is isolated", n.name());
    }
}

#[test]
fn same_seed_yields_identical_topologies() {
    let opts = GeoOpts {
        nodes: 10,
        ..GeoOpts::default()
    };
    let a = generate(&opts, 99).expect("generate");
    let b = generate(&opts, 99).expect("generate");
    for (na, nb) in a.nodes().iter().zip(b.nodes()) {
        assert_eq!(na.name(), nb.name());
        assert_eq!(na.x, nb.x);
        assert_eq!(na.y, nb.y);
        assert_eq!(na.neighbours(), nb.neighbours());
    }
}

#[test]
fn impossible_placement_fails_after_bounded_retries() {
    // A zero range means no sampled point can ever see a neighbour.
    let opts = GeoOpts {
        nodes: 3,
        range: 0.0,
        max_attempts: 50,
        ..GeoOpts::default()
    };
    let err = generate(&opts, 1).unwrap_err();
    assert!(matches!(err, SimError::Topology { attempts: 50 }));
}

#[test]
fn node_names_are_letters_then_numbered() {
    assert_eq!(node_name(0), "A");
    assert_eq!(node_name(25), "Z");
    assert_eq!(node_name(26), "N26");
}

#[test]
fn node_lookup_by_name() {
    let opts = GeoOpts {
        nodes: 4,
        ..GeoOpts::default()
    };
    let topo = generate(&opts, 5).expect("generate");
    let c = topo.node_by_name("C").expect("C exists");
    assert_eq!(topo.name_of(c), "C");

    let err = topo.node_by_name("Q").unwrap_err();
    assert!(matches!(err, SimError::NodeNotFound { .. }));
}
