//! 回合制调度器
//!
//! 驱动离散回合：每回合按稳定顺序访问节点，各节点排干自己
//! 回合开始时持有的 inbox，处理过程中可向其他节点的 inbox 投递
//! 新消息。反应式协议跑到静默为止；主动式协议按固定回合预算跑，
//! 收敛后允许提前结束。

use tracing::{debug, info};

use crate::net::SimError;

/// 回合制世界：由业务层（协议引擎）实现。
pub trait RoundWorld {
    /// 执行一个完整回合。`round` 从 0 递增。
    fn step(&mut self, round: u64) -> Result<(), SimError>;

    /// 是否已静默：没有待处理的入站消息、没有待发送的状态。
    fn quiescent(&self) -> bool;
}

/// 回合调度器：维护当前回合号。
#[derive(Default)]
pub struct Scheduler {
    round: u64,
}

impl Scheduler {
    /// 当前回合号
    pub fn round(&self) -> u64 {
        self.round
    }

    /// 运行到静默为止，返回执行的回合数。
    ///
    /// 用于反应式协议：去重保证洪泛有界，反向回送长度至多是图的
    /// 直径，所以不需要回合数上限。
    #[tracing::instrument(skip(self, world))]
    pub fn run_until_quiescent(&mut self, world: &mut dyn RoundWorld) -> Result<u64, SimError> {
        info!("▶️  开始运行（直到静默）");
        let start = self.round;
        while !world.quiescent() {
            world.step(self.round)?;
            self.round += 1;
        }
        let rounds = self.round - start;
        info!(rounds, "✅ 达到静默");
        Ok(rounds)
    }

    /// 按固定预算运行，提前收敛则提前结束。返回执行的回合数。
    #[tracing::instrument(skip(self, world))]
    pub fn run_rounds(
        &mut self,
        world: &mut dyn RoundWorld,
        budget: u64,
    ) -> Result<u64, SimError> {
        info!(budget, "▶️  开始运行（固定预算）");
        let start = self.round;
        for _ in 0..budget {
            if world.quiescent() {
                debug!(round = self.round, "提前收敛");
                break;
            }
            world.step(self.round)?;
            self.round += 1;
        }
        let rounds = self.round - start;
        info!(rounds, "✅ 运行结束");
        Ok(rounds)
    }
}
