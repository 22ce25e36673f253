//! DSDV（主动式距离向量）协议引擎
//!
//! 每个节点持续维护到所有已知节点的完整路由表，通过周期性/触发式
//! 全表广播传播，Bellman-Ford 式松弛加序列号裁决新旧。链路失效用
//! 毒化（距离 = INFINITY）扩散。附带一个 churn 模拟器：以小概率移
//! 除近孤立节点，等全网收敛后把它放到新位置重新入网。
//!
//! 协议在渐近意义下收敛，但不在运行中做形式化的收敛判定；仿真按
//! 固定回合预算推进，预算尾段加了一个“整回合无变化”的提前退出。

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, trace};

use crate::net::{EntryDump, NodeId, RouteTable, SimError, TableDump, Topology};
use crate::sim::RoundWorld;
use crate::topo::random_geo::{self, GeoOpts};

/// 不可达哨兵。真实跳数永远不会取到它。
pub const INFINITY: u32 = u32::MAX;

/// 一条路由表项。每个目的至多一条。
/// `distance == INFINITY` 表示“不可达但仍被记住”的毒化状态，
/// 只有更高序列号的消息能把它救回来。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DsdvEntry {
    pub dest: NodeId,
    pub next_hop: NodeId,
    pub distance: u32,
    pub seq: u64,
}

/// 一条全表更新消息：发送方、消息序列号、发送时的表快照。
#[derive(Debug, Clone)]
pub struct DsdvUpdate {
    pub from: NodeId,
    pub seq: u64,
    pub entries: Vec<DsdvEntry>,
}

/// 单个节点的协议侧状态，与拓扑的节点槽位平行存放。
/// 表和 inbox 只在该节点自己的处理步骤里被修改。
#[derive(Debug, Default)]
struct DsdvNode {
    table: BTreeMap<NodeId, DsdvEntry>,
    inbox: VecDeque<DsdvUpdate>,
    need_to_send: bool,
}

/// churn 日志条目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChurnEvent {
    Removed { round: u64, node: NodeId },
    Rejoined { round: u64, node: NodeId },
}

/// 运行统计
#[derive(Debug, Default)]
pub struct DsdvStats {
    pub updates_processed: u64,
    pub broadcasts_sent: u64,
}

#[derive(Debug, Clone)]
pub struct DsdvConfig {
    /// 回合预算（churn 窗口按它计算）
    pub rounds: u64,
    /// 预算末尾这么多回合内不再移除节点，给网络留收敛余量
    pub churn_margin: u64,
    /// 每回合触发移除的概率（千分数）
    pub removal_permille: u32,
    /// 表没有变化时仍然广播的概率（百分数，抑制周期性流量同时保证活性）
    pub idle_send_percent: u32,
    /// 重新入网时的放置参数
    pub placement: GeoOpts,
}

impl Default for DsdvConfig {
    fn default() -> Self {
        Self {
            rounds: 8000,
            churn_margin: 1000,
            removal_permille: 1,
            idle_send_percent: 30,
            placement: GeoOpts::default(),
        }
    }
}

/// DSDV 引擎：拥有拓扑和全部节点的协议侧状态。
pub struct Dsdv {
    topo: Topology,
    states: Vec<DsdvNode>,
    cfg: DsdvConfig,
    rng: StdRng,
    next_seq: u64,
    removed: VecDeque<NodeId>,
    rounds_run: u64,
    changed_last_round: bool,
    churn_log: Vec<ChurnEvent>,
    pub stats: DsdvStats,
}

impl Dsdv {
    pub fn new(topo: Topology, cfg: DsdvConfig, seed: u64) -> Self {
        let states = (0..topo.len()).map(|_| DsdvNode::default()).collect();
        let mut engine = Self {
            topo,
            states,
            cfg,
            rng: StdRng::seed_from_u64(seed),
            next_seq: 1,
            removed: VecDeque::new(),
            rounds_run: 0,
            changed_last_round: true,
            churn_log: Vec::new(),
            stats: DsdvStats::default(),
        };
        engine.seed_direct_entries();
        engine
    }

    pub fn topology(&self) -> &Topology {
        &self.topo
    }

    pub fn churn_log(&self) -> &[ChurnEvent] {
        &self.churn_log
    }

    /// 某节点对某目的的当前表项。
    pub fn entry(&self, node: NodeId, dest: NodeId) -> Option<DsdvEntry> {
        self.states.get(node.0)?.table.get(&dest).copied()
    }

    /// 相邻节点互相播种 distance=1 的直连表项。
    fn seed_direct_entries(&mut self) {
        let seq = self.next_seq;
        for i in 0..self.topo.len() {
            let id = NodeId(i);
            let nbrs: Vec<NodeId> = self.topo.slot(id).neighbours().iter().copied().collect();
            let st = &mut self.states[i];
            for nb in nbrs {
                st.table.insert(
                    nb,
                    DsdvEntry {
                        dest: nb,
                        next_hop: nb,
                        distance: 1,
                        seq,
                    },
                );
                st.need_to_send = true;
            }
        }
        self.next_seq += 1;
    }

    fn any_need_to_send(&self) -> bool {
        self.states.iter().any(|s| s.need_to_send)
    }

    /// churn：小概率移除一个近孤立节点；待发送标志全部清空
    /// （全网收敛屏障）后，把最早离网的节点重新放回来。
    fn churn_step(&mut self, round: u64) -> Result<(), SimError> {
        let window_open = round + self.cfg.churn_margin < self.cfg.rounds;
        if window_open
            && self.topo.active_count() >= 2
            && self.rng.gen_range(0..1000) < self.cfg.removal_permille
        {
            if let Some(victim) = self.pick_removal_victim() {
                self.remove_node(victim, round);
            }
        }

        if !self.removed.is_empty() && !self.any_need_to_send() {
            let node = self.removed.pop_front().expect("queue non-empty");
            self.rejoin_node(node, round)?;
        }
        Ok(())
    }

    /// 从随机起点扫一圈，找第一个邻居数 ≤1 的在网节点。
    /// 扫完没有候选就这回合不移除。
    fn pick_removal_victim(&mut self) -> Option<NodeId> {
        let n = self.topo.len();
        let start = self.rng.gen_range(0..n);
        for off in 0..n {
            let id = NodeId((start + off) % n);
            let node = self.topo.slot(id);
            if node.is_active() && node.neighbours().len() <= 1 {
                return Some(id);
            }
        }
        None
    }

    /// 节点离网：旧邻居指向它的表项毒化并打上新序列号，邻接对称
    /// 拆除，节点自身状态清空、标记离网、排队等待重新入网。
    pub(crate) fn remove_node(&mut self, victim: NodeId, round: u64) {
        debug_assert!(self.topo.slot(victim).is_active());
        debug_assert!(self.topo.active_count() >= 2);

        info!(node = %self.topo.name_of(victim), round, "⚠️  节点离网");
        let seq = self.next_seq;
        let nbrs: Vec<NodeId> = self.topo.slot(victim).neighbours().iter().copied().collect();
        for nb in nbrs {
            let st = &mut self.states[nb.0];
            if let Some(e) = st.table.get_mut(&victim) {
                e.distance = INFINITY;
                e.seq = seq;
            }
            st.need_to_send = true;
            self.topo.unlink(nb, victim);
        }
        self.next_seq += 1;

        let st = &mut self.states[victim.0];
        st.table.clear();
        st.inbox.clear();
        st.need_to_send = false;
        self.topo.deactivate(victim);
        self.removed.push_back(victim);
        self.churn_log.push(ChurnEvent::Removed {
            round,
            node: victim,
        });
    }

    /// 节点重新入网：采样一个阈值内有在网节点的新位置，对称重建
    /// 链路，两侧都播种新序列号的 distance=1 表项并置脏。
    pub(crate) fn rejoin_node(&mut self, node: NodeId, round: u64) -> Result<(), SimError> {
        let (x, y) = random_geo::place_reachable(&self.topo, &self.cfg.placement, &mut self.rng)?;
        let nbrs = self.topo.nodes_within(x, y, self.topo.link_range());
        self.topo.activate_at(node, x, y);

        let seq = self.next_seq;
        for nb in nbrs.into_iter().filter(|&nb| nb != node) {
            self.topo.link(node, nb);
            self.states[nb.0].table.insert(
                node,
                DsdvEntry {
                    dest: node,
                    next_hop: node,
                    distance: 1,
                    seq,
                },
            );
            self.states[nb.0].need_to_send = true;
            self.states[node.0].table.insert(
                nb,
                DsdvEntry {
                    dest: nb,
                    next_hop: nb,
                    distance: 1,
                    seq,
                },
            );
        }
        self.states[node.0].need_to_send = true;
        self.next_seq += 1;

        info!(node = %self.topo.name_of(node), round, x, y, "🔄 节点重新入网");
        self.churn_log.push(ChurnEvent::Rejoined { round, node });
        Ok(())
    }

    /// 处理一条全表更新。返回表是否发生了实质变化
    /// （新目的入表或更新规则接受，也就是会置脏的那些路径）。
    #[tracing::instrument(skip(self, update), fields(node = ?v, from = ?update.from, seq = update.seq))]
    pub(crate) fn receive(&mut self, v: NodeId, update: &DsdvUpdate) -> bool {
        self.stats.updates_processed += 1;
        let mut changed = false;
        let st = &mut self.states[v.0];

        for row in &update.entries {
            if row.dest == v {
                continue;
            }
            let offered = row.distance.saturating_add(1).min(INFINITY);
            match st.table.entry(row.dest) {
                Entry::Vacant(slot) => {
                    trace!(dest = ?row.dest, distance = offered, "新目的入表");
                    slot.insert(DsdvEntry {
                        dest: row.dest,
                        next_hop: update.from,
                        distance: offered,
                        seq: row.seq,
                    });
                    st.need_to_send = true;
                    changed = true;
                }
                Entry::Occupied(mut slot) => {
                    let e = slot.get_mut();
                    // 接受条件：对方宣告不可达且序列号严格更新（毒化扩散），
                    // 或对方给出严格更短的距离且序列号不旧。
                    let poison = row.distance == INFINITY && row.seq > e.seq;
                    let shorter = offered < e.distance && row.seq >= e.seq;
                    if poison || shorter {
                        trace!(dest = ?row.dest, distance = offered, seq = row.seq, "更新表项");
                        e.distance = offered;
                        e.seq = row.seq;
                        e.next_hop = update.from;
                        st.need_to_send = true;
                        changed = true;
                    }
                }
            }

            // 该目的不可达时，立刻联动毒化所有经由它的其他表项，
            // 不等下一回合
            let now_infinite = st
                .table
                .get(&row.dest)
                .is_some_and(|e| e.distance == INFINITY);
            if now_infinite {
                for e in st.table.values_mut() {
                    if e.next_hop == row.dest && e.dest != row.dest {
                        e.distance = INFINITY;
                        e.seq = update.seq;
                    }
                }
            }
        }

        // 发送方永远是一跳直连；直连信息优先于任何转述信息
        st.table.insert(
            update.from,
            DsdvEntry {
                dest: update.from,
                next_hop: update.from,
                distance: 1,
                seq: update.seq,
            },
        );
        changed
    }

    /// 把自己的全表快照投进每个邻居的 inbox，每份拷贝带新序列号。
    fn broadcast(&mut self, from: NodeId) {
        let entries: Vec<DsdvEntry> = self.states[from.0].table.values().copied().collect();
        let nbrs: Vec<NodeId> = self.topo.slot(from).neighbours().iter().copied().collect();
        for nb in nbrs {
            let seq = self.next_seq;
            self.next_seq += 1;
            trace!(from = ?from, to = ?nb, seq, "投递全表更新");
            self.states[nb.0].inbox.push_back(DsdvUpdate {
                from,
                seq,
                entries: entries.clone(),
            });
            self.stats.broadcasts_sent += 1;
        }
    }

    /// 一个回合的消息处理：每个在网节点先排干自己当前的 inbox，
    /// 再决定是否广播（有变化必发，否则按固定概率保活）。
    fn process_round(&mut self) {
        let mut changed = false;
        for i in 0..self.topo.len() {
            let id = NodeId(i);
            if !self.topo.slot(id).is_active() {
                continue;
            }

            let mut inbox = std::mem::take(&mut self.states[i].inbox);
            for update in inbox.drain(..) {
                changed |= self.receive(id, &update);
            }

            if self.states[i].need_to_send
                || self.rng.gen_range(0..100) < self.cfg.idle_send_percent
            {
                self.broadcast(id);
                self.states[i].need_to_send = false;
            }
        }
        self.changed_last_round = changed;
    }
}

impl RoundWorld for Dsdv {
    fn step(&mut self, round: u64) -> Result<(), SimError> {
        self.churn_step(round)?;
        self.process_round();
        self.rounds_run = round + 1;
        Ok(())
    }

    /// 提前退出条件：churn 窗口已关闭、没有待入网节点、没有脏节点、
    /// 上一整回合表无变化、所有 inbox 已排空。
    fn quiescent(&self) -> bool {
        self.rounds_run + self.cfg.churn_margin >= self.cfg.rounds
            && self.removed.is_empty()
            && !self.any_need_to_send()
            && !self.changed_last_round
            && self.states.iter().all(|s| s.inbox.is_empty())
    }
}

impl RouteTable for Dsdv {
    fn next_hop(&self, at: NodeId, dest: NodeId) -> Option<NodeId> {
        self.states
            .get(at.0)?
            .table
            .get(&dest)
            .filter(|e| e.distance < INFINITY)
            .map(|e| e.next_hop)
    }

    fn dump_table(&self, node: NodeId) -> Result<TableDump, SimError> {
        let n = self.topo.node(node)?;
        let entries = self.states[node.0]
            .table
            .values()
            .map(|e| EntryDump {
                dest: self.topo.name_of(e.dest).to_string(),
                next_hop: self.topo.name_of(e.next_hop).to_string(),
                distance: (e.distance < INFINITY).then_some(e.distance),
                seq: Some(e.seq),
            })
            .collect();
        Ok(TableDump {
            node: n.name().to_string(),
            entries,
        })
    }
}
