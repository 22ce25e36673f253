//! 可视化快照（离线渲染用）
//!
//! 设计目标：
//! - **结构化**：用 JSON 快照而不是解析文本日志
//! - **轻量**：不引入渲染依赖，核心不做 I/O
//! - **自足**：一份快照包含拓扑、路径和全部路由表

mod types;

pub use types::{Snapshot, VizLink, VizNode};
