//! 仿真核心模块
//!
//! 回合制消息投递调度。所有节点在概念上同时动作；一个回合内
//! 按稳定顺序模拟，节点间的影响只通过 inbox 投递发生，绝不跨
//! 节点直接改字段。

mod round;

pub use round::{RoundWorld, Scheduler};
