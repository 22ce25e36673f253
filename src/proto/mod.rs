//! 路由协议模块
//!
//! 两种 MANET 路由协议的简化实现（仿真用途）：主动式距离向量
//! （DSDV 风格）与反应式按需发现（AODV 风格）。两个引擎都由
//! `sim::Scheduler` 的回合驱动，收敛后通过 `net::RouteTable` 查询。

pub mod aodv;
pub mod dsdv;

pub use aodv::{Aodv, AodvStats, RouteReply, RouteRequest};
pub use dsdv::{ChurnEvent, Dsdv, DsdvConfig, DsdvEntry, DsdvStats, DsdvUpdate, INFINITY};

use crate::net::{NodeId, SimError, Topology};
use crate::sim::Scheduler;

/// 在给定拓扑上从 `source` 向 `dest` 发起一次按需路由发现，
/// 跑到静默。返回带表的引擎和实际执行的回合数。
pub fn run_reactive_discovery(
    topo: Topology,
    source: NodeId,
    dest: NodeId,
) -> Result<(Aodv, u64), SimError> {
    let mut engine = Aodv::new(topo);
    engine.start(source, dest)?;
    let mut sched = Scheduler::default();
    let rounds = sched.run_until_quiescent(&mut engine)?;
    Ok((engine, rounds))
}

/// 在给定拓扑上运行主动式协议（含 churn），按 `cfg.rounds` 预算推进。
/// 返回带收敛表和 churn 日志的引擎。
pub fn run_proactive(topo: Topology, cfg: DsdvConfig, seed: u64) -> Result<Dsdv, SimError> {
    let budget = cfg.rounds;
    let mut engine = Dsdv::new(topo, cfg, seed);
    let mut sched = Scheduler::default();
    sched.run_rounds(&mut engine, budget)?;
    Ok(engine)
}
