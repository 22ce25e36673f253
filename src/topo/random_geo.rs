//! 随机几何拓扑生成
//!
//! 在有界平面内随机撒点：0 号节点放区域中心，后续节点反复采样
//! 坐标，直到与某个已放置节点的两个坐标轴距离都小于建链阈值
//! （保证生成时没有孤立节点）。邻接关系在全部节点放好之后统一
//! 推导。坐标采样只消费一个均匀随机源，给定 seed 结果确定。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::net::{NodeId, SimError, Topology};

/// 随机几何拓扑配置
#[derive(Debug, Clone)]
pub struct GeoOpts {
    /// 目标节点数
    pub nodes: usize,
    /// 区域宽度 `[0, width)`
    pub width: f64,
    /// 区域高度 `[0, height)`
    pub height: f64,
    /// 建链距离阈值（每个坐标轴独立判断）
    pub range: f64,
    /// 单次放置的采样次数上限，超出即失败而不是挂死
    pub max_attempts: u32,
}

impl Default for GeoOpts {
    fn default() -> Self {
        Self {
            nodes: 8,
            width: 100.0,
            height: 100.0,
            range: 20.0,
            max_attempts: 10_000,
        }
    }
}

/// 节点显示名：A、B、…、Z，之后 N26、N27、…
pub fn node_name(index: usize) -> String {
    if index < 26 {
        char::from(b'A' + index as u8).to_string()
    } else {
        format!("N{index}")
    }
}

/// 生成随机几何拓扑。给定相同 seed 结果逐位相同。
pub fn generate(opts: &GeoOpts, seed: u64) -> Result<Topology, SimError> {
    let mut rng = StdRng::seed_from_u64(seed);
    generate_with(opts, &mut rng)
}

/// 用外部随机源生成（调用方可以把同一个源接着用于别的随机决策）。
pub fn generate_with(opts: &GeoOpts, rng: &mut impl Rng) -> Result<Topology, SimError> {
    let mut topo = Topology::new(opts.range);
    if opts.nodes == 0 {
        return Ok(topo);
    }

    // 0 号节点放在区域中心
    topo.add_node(node_name(0), opts.width / 2.0, opts.height / 2.0);

    for i in 1..opts.nodes {
        let (x, y) = place_reachable(&topo, opts, rng)?;
        debug!(node = %node_name(i), x, y, "放置节点");
        topo.add_node(node_name(i), x, y);
    }

    // 邻接关系在全部节点放置完之后统一推导
    for i in 0..opts.nodes {
        for j in (i + 1)..opts.nodes {
            if topo.is_nearby(NodeId(i), NodeId(j)) {
                topo.link(NodeId(i), NodeId(j));
            }
        }
    }

    info!(nodes = opts.nodes, "拓扑生成完成");
    Ok(topo)
}

/// 反复采样坐标，直到阈值内有在网节点；尝试次数有界。
///
/// churn 管理器重新放置离网节点时也走这条路径。
pub(crate) fn place_reachable(
    topo: &Topology,
    opts: &GeoOpts,
    rng: &mut impl Rng,
) -> Result<(f64, f64), SimError> {
    for _ in 0..opts.max_attempts {
        let x = rng.gen_range(0.0..opts.width);
        let y = rng.gen_range(0.0..opts.height);
        if !topo.nodes_within(x, y, opts.range).is_empty() {
            return Ok((x, y));
        }
    }
    Err(SimError::Topology {
        attempts: opts.max_attempts,
    })
}
