//! 拓扑构建模块

pub mod random_geo;

pub use random_geo::{generate, node_name, GeoOpts};
