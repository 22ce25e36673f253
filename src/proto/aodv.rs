//! AODV（反应式按需发现）协议引擎
//!
//! 路由不预先维护：需要时从源洪泛一条 RREQ，第一个知道（或就是）
//! 目的地的节点回一条 RREP，沿发现路径反向回送，一路建立各节点的
//! 下一跳表项。去重保证洪泛不成环，先到的请求路径获胜。

use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::{debug, info, trace};

use crate::net::{EntryDump, NodeId, RouteTable, SimError, TableDump, Topology};
use crate::sim::RoundWorld;

/// 路由请求（广播洪泛）。`broadcast_id` 全局单调递增。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRequest {
    pub broadcast_id: u64,
    pub source: NodeId,
    pub dest: NodeId,
}

/// 路由应答（沿反向路径单播回送），`broadcast_id` 对应发起的请求。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteReply {
    pub broadcast_id: u64,
    pub source: NodeId,
    pub dest: NodeId,
}

/// 流经节点 inbox 的两类消息。
#[derive(Debug, Clone, Copy)]
enum AodvMessage {
    Request { from: NodeId, req: RouteRequest },
    Reply { from: NodeId, rep: RouteReply },
}

/// 单个节点的协议侧状态。
#[derive(Debug, Default)]
struct AodvNode {
    /// 目的 → 下一跳。一旦写入就不再被后到的（可能更长的）应答覆盖。
    table: BTreeMap<NodeId, NodeId>,
    /// broadcast_id → 请求最先从哪个邻居到达（应答沿它反向回送）
    seen: HashMap<u64, NodeId>,
    inbox: VecDeque<AodvMessage>,
}

/// 运行统计
#[derive(Debug, Default)]
pub struct AodvStats {
    pub requests_forwarded: u64,
    pub replies_sent: u64,
    pub duplicates_discarded: u64,
}

/// AODV 引擎：拥有拓扑和全部节点的协议侧状态。
pub struct Aodv {
    topo: Topology,
    states: Vec<AodvNode>,
    next_broadcast_id: u64,
    pub stats: AodvStats,
}

impl Aodv {
    pub fn new(topo: Topology) -> Self {
        let states = (0..topo.len()).map(|_| AodvNode::default()).collect();
        Self {
            topo,
            states,
            next_broadcast_id: 1,
            stats: AodvStats::default(),
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topo
    }

    /// 某节点对某目的已建立的下一跳。
    pub fn table_entry(&self, node: NodeId, dest: NodeId) -> Option<NodeId> {
        self.states.get(node.0)?.table.get(&dest).copied()
    }

    /// 发起一次路由发现：给请求分配新的 broadcast_id，投进源节点
    /// 自己的 inbox（源以 from = 自己处理它，再向邻居洪泛）。
    pub fn start(&mut self, source: NodeId, dest: NodeId) -> Result<(), SimError> {
        self.topo.node(source)?;
        self.topo.node(dest)?;
        if source == dest {
            debug!(node = %self.topo.name_of(source), "源即目的，无需发现");
            return Ok(());
        }

        let req = RouteRequest {
            broadcast_id: self.next_broadcast_id,
            source,
            dest,
        };
        self.next_broadcast_id += 1;
        info!(
            source = %self.topo.name_of(source),
            dest = %self.topo.name_of(dest),
            broadcast_id = req.broadcast_id,
            "🔍 发起路由发现"
        );
        self.states[source.0]
            .inbox
            .push_back(AodvMessage::Request { from: source, req });
        Ok(())
    }

    /// 处理一条从邻居 `from` 到达的 RREQ。
    #[tracing::instrument(skip(self), fields(node = ?v, from = ?from, broadcast_id = req.broadcast_id))]
    fn handle_request(&mut self, v: NodeId, from: NodeId, req: RouteRequest) {
        if self.states[v.0].seen.contains_key(&req.broadcast_id) {
            trace!("重复请求，丢弃");
            self.stats.duplicates_discarded += 1;
            return;
        }

        if v == req.dest || self.states[v.0].table.contains_key(&req.dest) {
            debug!("命中目的地，回送 RREP");
            let rep = RouteReply {
                broadcast_id: req.broadcast_id,
                source: req.source,
                dest: req.dest,
            };
            self.states[from.0]
                .inbox
                .push_back(AodvMessage::Reply { from: v, rep });
            self.stats.replies_sent += 1;
            return;
        }

        // 记住回程方向，再向所有邻居续播
        self.states[v.0].seen.insert(req.broadcast_id, from);
        let nbrs: Vec<NodeId> = self.topo.slot(v).neighbours().iter().copied().collect();
        for nb in nbrs {
            self.states[nb.0]
                .inbox
                .push_back(AodvMessage::Request { from: v, req });
        }
        self.stats.requests_forwarded += 1;
    }

    /// 处理一条从邻居 `from` 到达的 RREP。
    ///
    /// 中间节点设好表项后，应答沿记下的反向路径在同一回合内迭代
    /// 继续回送（建模已发现路径上的瞬时反向信令，不是新的洪泛），
    /// 而不是递归；每一跳同时也把副本排进计划投递，副本到达时会
    /// 因“已有路由”被丢弃。
    #[tracing::instrument(skip(self), fields(node = ?v, from = ?from, broadcast_id = rep.broadcast_id))]
    fn handle_reply(&mut self, v: NodeId, from: NodeId, rep: RouteReply) {
        let mut cur = v;
        let mut from = from;
        loop {
            if rep.source == cur {
                // 发现源：反向路径走完了
                let st = &mut self.states[cur.0];
                if !st.table.contains_key(&rep.dest) {
                    st.table.insert(rep.dest, from);
                    info!(
                        source = %self.topo.name_of(cur),
                        dest = %self.topo.name_of(rep.dest),
                        "✅ 路由建立"
                    );
                }
                return;
            }

            if self.states[cur.0].table.contains_key(&rep.dest) {
                trace!(at = ?cur, "已有路由，后到应答丢弃");
                self.stats.duplicates_discarded += 1;
                return;
            }
            self.states[cur.0].table.insert(rep.dest, from);

            let Some(&prev) = self.states[cur.0].seen.get(&rep.broadcast_id) else {
                debug!(at = ?cur, "未知 broadcast_id，应答丢弃");
                return;
            };
            self.states[prev.0]
                .inbox
                .push_back(AodvMessage::Reply { from: cur, rep });
            from = cur;
            cur = prev;
        }
    }
}

impl RoundWorld for Aodv {
    #[tracing::instrument(skip(self))]
    fn step(&mut self, round: u64) -> Result<(), SimError> {
        for i in 0..self.states.len() {
            let id = NodeId(i);
            if !self.topo.slot(id).is_active() {
                continue;
            }
            let mut inbox = std::mem::take(&mut self.states[i].inbox);
            for msg in inbox.drain(..) {
                match msg {
                    AodvMessage::Request { from, req } => self.handle_request(id, from, req),
                    AodvMessage::Reply { from, rep } => self.handle_reply(id, from, rep),
                }
            }
        }
        Ok(())
    }

    /// 纯洪泛-沉降不动点：所有 inbox 排空即静默。
    fn quiescent(&self) -> bool {
        self.states.iter().all(|s| s.inbox.is_empty())
    }
}

impl RouteTable for Aodv {
    fn next_hop(&self, at: NodeId, dest: NodeId) -> Option<NodeId> {
        self.states.get(at.0)?.table.get(&dest).copied()
    }

    fn dump_table(&self, node: NodeId) -> Result<TableDump, SimError> {
        let n = self.topo.node(node)?;
        let entries = self.states[node.0]
            .table
            .iter()
            .map(|(dest, hop)| EntryDump {
                dest: self.topo.name_of(*dest).to_string(),
                next_hop: self.topo.name_of(*hop).to_string(),
                distance: None,
                seq: None,
            })
            .collect();
        Ok(TableDump {
            node: n.name().to_string(),
            entries,
        })
    }
}
