use serde::{Deserialize, Serialize};

use crate::net::{NodeId, RouteTable, TableDump, Topology};

/// 可视化节点信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizNode {
    pub id: usize,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub active: bool,
}

/// 可视化链路（无向，`from < to` 去重后各出现一次）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizLink {
    pub from: usize,
    pub to: usize,
    /// 是否落在发现得到的路径上（渲染侧高亮用）
    pub on_route: bool,
}

/// 一次仿真结束时的完整快照。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub nodes: Vec<VizNode>,
    pub links: Vec<VizLink>,
    /// 发现得到的路径（节点名序列）；空表示没有路由
    pub route: Vec<String>,
    #[serde(default)]
    pub tables: Vec<TableDump>,
}

impl Snapshot {
    /// 从收敛后的拓扑、查询得到的路径和路由表构建快照。
    pub fn capture(topo: &Topology, route: &[NodeId], tables: &impl RouteTable) -> Self {
        let nodes = topo
            .nodes()
            .iter()
            .map(|n| VizNode {
                id: n.id().0,
                name: n.name().to_string(),
                x: n.x,
                y: n.y,
                active: n.is_active(),
            })
            .collect();

        let on_route = |a: NodeId, b: NodeId| {
            route
                .windows(2)
                .any(|w| (w[0] == a && w[1] == b) || (w[0] == b && w[1] == a))
        };
        let mut links = Vec::new();
        for n in topo.nodes().iter().filter(|n| n.is_active()) {
            for &nb in n.neighbours() {
                if n.id() < nb {
                    links.push(VizLink {
                        from: n.id().0,
                        to: nb.0,
                        on_route: on_route(n.id(), nb),
                    });
                }
            }
        }

        let route_names = route.iter().map(|&id| topo.name_of(id).to_string()).collect();
        let table_dumps = topo
            .nodes()
            .iter()
            .filter(|n| n.is_active())
            .filter_map(|n| tables.dump_table(n.id()).ok())
            .collect();

        Snapshot {
            nodes,
            links,
            route: route_names,
            tables: table_dumps,
        }
    }
}
