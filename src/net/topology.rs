//! 拓扑 arena
//!
//! 全部节点与对称邻接关系。节点用稳定的整数句柄（`NodeId` =
//! arena 下标）索引，名字只在外部接口边界解析一次。
//! 不变式：`a ∈ b.neighbours ⇔ b ∈ a.neighbours`，`link`/`unlink`
//! 是唯一的邻接变更入口。

use tracing::trace;

use super::error::SimError;
use super::id::NodeId;
use super::node::Node;

/// 拓扑：节点集 + 对称邻接 + 建链距离阈值。
#[derive(Debug, Clone)]
pub struct Topology {
    nodes: Vec<Node>,
    link_range: f64,
}

impl Default for Topology {
    fn default() -> Self {
        Self::new(20.0)
    }
}

impl Topology {
    pub fn new(link_range: f64) -> Self {
        Self {
            nodes: Vec::new(),
            link_range,
        }
    }

    /// 添加节点，返回稳定句柄。
    pub fn add_node(&mut self, name: impl Into<String>, x: f64, y: f64) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(id, name, x, y));
        id
    }

    /// 建立对称链路。
    pub fn link(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        trace!(a = ?a, b = ?b, "建链");
        self.nodes[a.0].neighbours.insert(b);
        self.nodes[b.0].neighbours.insert(a);
    }

    /// 拆除对称链路。
    pub fn unlink(&mut self, a: NodeId, b: NodeId) {
        trace!(a = ?a, b = ?b, "拆链");
        self.nodes[a.0].neighbours.remove(&b);
        self.nodes[b.0].neighbours.remove(&a);
    }

    /// 按 id 查找在网节点。离网或越界都显式失败，绝不返回陈旧引用。
    pub fn node(&self, id: NodeId) -> Result<&Node, SimError> {
        self.nodes
            .get(id.0)
            .filter(|n| n.active)
            .ok_or_else(|| SimError::NodeNotFound {
                name: format!("#{}", id.0),
            })
    }

    /// 按名字解析节点 id（只在外部接口边界使用）。
    pub fn node_by_name(&self, name: &str) -> Result<NodeId, SimError> {
        self.nodes
            .iter()
            .find(|n| n.active && n.name() == name)
            .map(Node::id)
            .ok_or_else(|| SimError::NodeNotFound {
                name: name.to_string(),
            })
    }

    /// 不检查在网状态的内部访问（churn 管理需要触达离网节点）。
    pub(crate) fn slot(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// 节点显示名（离网节点也要能打印，churn 日志用）。
    pub fn name_of(&self, id: NodeId) -> &str {
        self.nodes[id.0].name()
    }

    /// arena 槽位总数（含离网节点）。
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 在网节点数。
    pub fn active_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.active).count()
    }

    /// 全部槽位（含离网节点，渲染侧按 `is_active` 自行区分）。
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn link_range(&self) -> f64 {
        self.link_range
    }

    /// 两个节点是否在建链距离内（两个坐标轴独立判断，均须 < range）。
    pub fn is_nearby(&self, a: NodeId, b: NodeId) -> bool {
        let (na, nb) = (&self.nodes[a.0], &self.nodes[b.0]);
        within(na.x, na.y, nb.x, nb.y, self.link_range)
    }

    /// 给定坐标附近的在网节点。
    pub fn nodes_within(&self, x: f64, y: f64, range: f64) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.active && within(x, y, n.x, n.y, range))
            .map(Node::id)
            .collect()
    }

    /// 把节点标记为离网。调用方负责先拆掉它的全部链路。
    pub(crate) fn deactivate(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        node.neighbours.clear();
        node.active = false;
    }

    /// 在新坐标上重新激活节点。链路由调用方重建。
    pub(crate) fn activate_at(&mut self, id: NodeId, x: f64, y: f64) {
        let node = &mut self.nodes[id.0];
        node.x = x;
        node.y = y;
        node.active = true;
    }
}

fn within(ax: f64, ay: f64, bx: f64, by: f64, range: f64) -> bool {
    (ax - bx).abs() < range && (ay - by).abs() < range
}
