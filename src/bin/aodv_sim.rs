//! AODV 路由发现仿真
//!
//! 随机拓扑上随机（或指定）选源和目的，跑一次按需路由发现，
//! 打印路径与各节点路由表。

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use manetsim_rs::net::{query_route, NodeId, RouteTable};
use manetsim_rs::proto::run_reactive_discovery;
use manetsim_rs::topo::random_geo::{self, GeoOpts};
use manetsim_rs::viz::Snapshot;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Parser)]
#[command(
    name = "aodv-sim",
    about = "AODV 按需路由发现仿真：随机拓扑上从源到目的找路"
)]
struct Args {
    /// 节点数量；0 表示随机取 5..=15
    #[arg(long, default_value_t = 0)]
    nodes: usize,
    /// 随机种子（拓扑与源/目的选择都由它确定）
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// 源节点名（默认随机选）
    #[arg(long)]
    source: Option<String>,
    /// 目的节点名（默认随机选，且不同于源）
    #[arg(long)]
    dest: Option<String>,
    /// 把最终拓扑/路径/表写成 JSON（供离线渲染）
    #[arg(long)]
    viz_json: Option<PathBuf>,
}

fn main() {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let mut rng = StdRng::seed_from_u64(args.seed);
    let count = if args.nodes == 0 {
        rng.gen_range(5..=15)
    } else {
        args.nodes
    };
    assert!(count >= 2, "need at least 2 nodes to discover a route");

    let opts = GeoOpts {
        nodes: count,
        ..GeoOpts::default()
    };
    let topo = random_geo::generate_with(&opts, &mut rng).expect("generate topology");

    let source = match &args.source {
        Some(name) => topo.node_by_name(name).expect("source node exists"),
        None => NodeId(rng.gen_range(0..count)),
    };
    let dest = match &args.dest {
        Some(name) => topo.node_by_name(name).expect("dest node exists"),
        None => loop {
            let d = NodeId(rng.gen_range(0..count));
            if d != source {
                break d;
            }
        },
    };
    let src_name = topo.name_of(source).to_string();
    let dst_name = topo.name_of(dest).to_string();

    let (engine, rounds) = run_reactive_discovery(topo, source, dest).expect("run discovery");
    let route = query_route(&engine, engine.topology(), source, dest).expect("query route");

    println!("Displaying route from '{src_name}' to '{dst_name}':");
    if route.is_empty() {
        println!("(no route found)");
    } else {
        for (i, hop) in route.windows(2).enumerate() {
            println!(
                "{}: {} --> {}",
                i + 1,
                engine.topology().name_of(hop[0]),
                engine.topology().name_of(hop[1])
            );
        }
    }

    println!();
    println!("Now printing table showing hops:");
    for node in engine.topology().nodes().iter().filter(|n| n.is_active()) {
        let dump = engine.dump_table(node.id()).expect("dump table");
        println!("Node: {}", dump.node);
        println!("Table: {} entries:", dump.entries.len());
        for e in &dump.entries {
            println!("Dest={}, hop={}", e.dest, e.next_hop);
        }
        println!();
    }

    println!(
        "done in {rounds} rounds, requests_forwarded={}, replies_sent={}, duplicates_discarded={}",
        engine.stats.requests_forwarded,
        engine.stats.replies_sent,
        engine.stats.duplicates_discarded
    );

    if let Some(path) = &args.viz_json {
        let snap = Snapshot::capture(engine.topology(), &route, &engine);
        let json = serde_json::to_string_pretty(&snap).expect("serialize snapshot");
        fs::write(path, json).expect("write viz json");
        println!("viz json written to {}", path.display());
    }
}
