//! 路由查询与表导出
//!
//! 两个协议引擎对外的统一查询面：逐跳走表得到显式路径，
//! 以及供打印/渲染方消费的结构化表导出。核心自身不做任何 I/O。

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::SimError;
use super::id::NodeId;
use super::topology::Topology;

/// 收敛后的路由表查询接口，两个引擎都实现它。
pub trait RouteTable {
    /// `at` 节点去往 `dest` 的下一跳。不可达（含被毒化的表项）返回 None。
    fn next_hop(&self, at: NodeId, dest: NodeId) -> Option<NodeId>;

    /// 某节点路由表的结构化导出。
    fn dump_table(&self, node: NodeId) -> Result<TableDump, SimError>;
}

/// 一个节点路由表的结构化列表。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDump {
    pub node: String,
    pub entries: Vec<EntryDump>,
}

/// 单条表项。距离向量表带 `distance`/`seq`；按需发现表只有目的与下一跳。
/// `distance` 为 None 且 `seq` 存在时表示该表项已被毒化（不可达）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryDump {
    pub dest: String,
    pub next_hop: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

/// 沿下一跳链从 `source` 走到 `dest`，返回途经节点序列（含两端）。
///
/// 空序列表示没有路由，这是正常结果而不是错误。走表在两种情况下停：
/// 当前节点对 `dest` 没有表项（目的节点自身就是这种情形），或者
/// 走到了已访问过的节点（环保护，即使格式良好的表不应产生环）。
pub fn query_route(
    tables: &impl RouteTable,
    topo: &Topology,
    source: NodeId,
    dest: NodeId,
) -> Result<Vec<NodeId>, SimError> {
    topo.node(source)?;
    topo.node(dest)?;

    let mut path = Vec::new();
    let mut visited = HashSet::new();
    let mut cur = source;
    loop {
        let Some(next) = tables.next_hop(cur, dest) else {
            break;
        };
        if !visited.insert(cur) {
            debug!(at = ?cur, "走表遇到环，停止");
            break;
        }
        if path.is_empty() {
            path.push(cur);
        }
        path.push(next);
        cur = next;
    }
    Ok(path)
}
