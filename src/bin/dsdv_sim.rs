//! DSDV 协议仿真
//!
//! 随机拓扑上运行主动式距离向量协议若干回合，期间以小概率移除
//! 近孤立节点、待全网收敛后让它在新位置重新入网，最后打印 churn
//! 日志与各节点收敛后的路由表。

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use manetsim_rs::net::RouteTable;
use manetsim_rs::proto::{run_proactive, ChurnEvent, DsdvConfig};
use manetsim_rs::topo::random_geo::{self, GeoOpts};
use manetsim_rs::viz::Snapshot;

#[derive(Debug, Parser)]
#[command(
    name = "dsdv-sim",
    about = "DSDV 主动式路由仿真：全表广播 + 序列号 + 链路毒化 + churn"
)]
struct Args {
    /// 节点数量
    #[arg(long, default_value_t = 8)]
    nodes: usize,
    /// 回合预算（churn 在预算末尾 1000 回合前停止）
    #[arg(long, default_value_t = 8000)]
    rounds: u64,
    /// 随机种子
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// 把最终拓扑与表写成 JSON（供离线渲染）
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

    let opts = GeoOpts {
        nodes: args.nodes,
        ..GeoOpts::default()
    };
    let topo = random_geo::generate(&opts, args.seed).expect("generate topology");

    let cfg = DsdvConfig {
        rounds: args.rounds,
        placement: opts,
        ..DsdvConfig::default()
    };
    let engine = run_proactive(topo, cfg, args.seed).expect("run simulation");

    if engine.churn_log().is_empty() {
        println!("No churn events this run.");
    } else {
        println!("Churn events:");
        for ev in engine.churn_log() {
            match ev {
                ChurnEvent::Removed { round, node } => println!(
                    "round {round}: node {} left the network",
                    engine.topology().name_of(*node)
                ),
                ChurnEvent::Rejoined { round, node } => println!(
                    "round {round}: node {} rejoined",
                    engine.topology().name_of(*node)
                ),
            }
        }
    }

    println!();
    for node in engine.topology().nodes().iter().filter(|n| n.is_active()) {
        let dump = engine.dump_table(node.id()).expect("dump table");
        println!("Node: {}", dump.node);
        println!("Table: {} entries:", dump.entries.len());
        for e in &dump.entries {
            let dist = match e.distance {
                Some(d) => d.to_string(),
                None => "inf".to_string(),
            };
            println!(
                "Dest={}, hop={}, distance={}, seqno={}",
                e.dest,
                e.next_hop,
                dist,
                e.seq.unwrap_or(0)
            );
        }
        println!();
    }

    println!(
        "done, updates_processed={}, broadcasts_sent={}",
        engine.stats.updates_processed, engine.stats.broadcasts_sent
    );

    if let Some(path) = &args.viz_json {
        let snap = Snapshot::capture(engine.topology(), &[], &engine);
        let json = serde_json::to_string_pretty(&snap).expect("serialize snapshot");
        fs::write(path, json).expect("write viz json");
        println!("viz json written to {}", path.display());
    }
}
