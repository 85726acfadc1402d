//! 眨眼频率滑动窗口
//!
//! 每跨过一个整秒边界采样一次眨眼增量，存入固定容量的 FIFO（默认 60）。
//! 会话开始 60 秒内历史不足，频率固定返回 15；之后返回窗口内增量之和。

use std::collections::VecDeque;

/// 历史不足时的占位频率（次/分钟）
pub const WARMUP_BLINK_RATE: f64 = 15.0;

const WARMUP_SECS: f64 = 60.0;

#[derive(Debug, Clone)]
pub struct RollingRateWindow {
    capacity: usize,
    window: VecDeque<u64>,
    last_sample_time: f64,
    last_sample_count: u64,
}

impl RollingRateWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            window: VecDeque::with_capacity(capacity + 1),
            last_sample_time: 0.0,
            last_sample_count: 0,
        }
    }

    /// 推进窗口并返回当前眨眼频率
    ///
    /// # 参数
    /// - `t_elapsed`: 会话开始以来的秒数
    /// - `blink_count`: 当前累计眨眼次数
    pub fn update(&mut self, t_elapsed: f64, blink_count: u64) -> f64 {
        if t_elapsed >= self.last_sample_time + 1.0 {
            let delta = blink_count.saturating_sub(self.last_sample_count);
            self.window.push_back(delta);
            while self.window.len() > self.capacity {
                self.window.pop_front();
            }
            self.last_sample_time = t_elapsed;
            self.last_sample_count = blink_count;
        }

        self.blink_rate(t_elapsed)
    }

    pub fn blink_rate(&self, t_elapsed: f64) -> f64 {
        if t_elapsed <= WARMUP_SECS {
            WARMUP_BLINK_RATE
        } else {
            self.window.iter().sum::<u64>() as f64
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn samples(&self) -> impl Iterator<Item = u64> + '_ {
        self.window.iter().copied()
    }
}
