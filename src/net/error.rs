//! 错误类型
//!
//! 仿真核心的显式失败路径。重复/过期的协议消息不算错误，
//! 它们在引擎内被静默丢弃。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// 在限定尝试次数内采样不到可达的放置位置。
    /// 放置循环必须有界，绝不允许无限重试。
    #[error("topology generation failed: no reachable position within {attempts} attempts")]
    Topology { attempts: u32 },

    /// 按名字或 id 查找节点失败（包括已离网节点）。
    #[error("node not found: {name}")]
    NodeNotFound { name: String },
}
