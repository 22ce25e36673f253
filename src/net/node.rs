//! 节点类型
//!
//! 移动网络中的一个节点：标识、平面坐标、对称邻居集。
//! 协议侧状态（路由表/inbox）不放在这里，由各引擎平行持有，
//! 保证表只被所属节点自己的处理步骤修改。

use std::collections::BTreeSet;

use super::id::NodeId;

/// 网络节点
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    name: String,
    pub x: f64,
    pub y: f64,
    pub(crate) neighbours: BTreeSet<NodeId>,
    pub(crate) active: bool,
}

impl Node {
    pub(crate) fn new(id: NodeId, name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id,
            name: name.into(),
            x,
            y,
            neighbours: BTreeSet::new(),
            active: true,
        }
    }

    /// 获取节点标识符
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// 获取节点名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 当前邻居集（对称关系，由 Topology 维护）
    pub fn neighbours(&self) -> &BTreeSet<NodeId> {
        &self.neighbours
    }

    /// 节点是否在网（churn 移除会把节点标记为离网）
    pub fn is_active(&self) -> bool {
        self.active
    }
}
