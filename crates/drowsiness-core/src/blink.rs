//! 眨眼计数
//!
//! 由状态机的 Awake → EyesClosed 转换驱动（边沿触发），每个闭眼段只计一次。
//! 会话期间不清零。

use crate::drowsiness::Transition;

#[derive(Debug, Clone, Default)]
pub struct BlinkTracker {
    count: u64,
}

impl BlinkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 消费一帧的状态转换，返回是否记录了新的眨眼
    pub fn observe(&mut self, transition: Transition) -> bool {
        if transition == Transition::EyesClosed {
            self.count += 1;
            true
        } else {
            false
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}
