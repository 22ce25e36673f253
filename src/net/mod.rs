//! 网络模型模块
//!
//! 节点、拓扑 arena、错误类型与路由查询接口。

// 子模块声明
mod error;
mod id;
mod node;
mod query;
mod topology;

// 重新导出公共接口
pub use error::SimError;
pub use id::NodeId;
pub use node::Node;
pub use query::{query_route, EntryDump, RouteTable, TableDump};
pub use topology::Topology;
