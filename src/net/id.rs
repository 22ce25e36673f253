//! 标识符类型
//!
//! 节点的唯一标识：arena 下标，拓扑固定后保持稳定。

/// 节点标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);
