//! 瞌睡状态机
//!
//! 两个状态：Awake（清醒）→ EyesClosed（闭眼）→ Awake
//!
//! 每帧按顺序判定：
//! 1. 闭眼条件 `ear < ear_threshold && mar < mar_threshold`：
//!    Awake 时进入 EyesClosed 并记录起始时间（眨眼开始事件）；EyesClosed 时保持。
//! 2. 退出条件 `(EyesClosed && ear >= ear_threshold) || (ear <= ear_threshold && mar >= mar_threshold)`：
//!    回到 Awake。第二个分支意味着张嘴可以在眼睛仍低于阈值时结束闭眼段。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum DrowsinessState {
    Awake,
    EyesClosed {
        #[serde(rename = "closedSince")]
        closed_since: f64,
    },
}

/// 单帧状态转换
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    /// Awake → EyesClosed，即一次眨眼开始
    EyesClosed,
    /// EyesClosed → Awake
    Awake,
}

#[derive(Debug, Clone)]
pub struct DrowsinessStateMachine {
    ear_threshold: f64,
    mar_threshold: f64,
    alert_duration_secs: f64,
    state: DrowsinessState,
}

impl DrowsinessStateMachine {
    pub fn new(ear_threshold: f64, mar_threshold: f64, alert_duration_secs: f64) -> Self {
        Self {
            ear_threshold,
            mar_threshold,
            alert_duration_secs,
            state: DrowsinessState::Awake,
        }
    }

    pub fn update(&mut self, ear: f64, mar: f64, now: f64) -> Transition {
        let mut transition = Transition::None;

        if ear < self.ear_threshold && mar < self.mar_threshold {
            if let DrowsinessState::Awake = self.state {
                self.state = DrowsinessState::EyesClosed { closed_since: now };
                transition = Transition::EyesClosed;
            }
        }

        let reopened = self.is_eyes_closed() && ear >= self.ear_threshold;
        let mouth_opened = ear <= self.ear_threshold && mar >= self.mar_threshold;
        if reopened || mouth_opened {
            if self.is_eyes_closed() {
                transition = Transition::Awake;
            }
            self.state = DrowsinessState::Awake;
        }

        transition
    }

    pub fn state(&self) -> DrowsinessState {
        self.state
    }

    pub fn is_eyes_closed(&self) -> bool {
        matches!(self.state, DrowsinessState::EyesClosed { .. })
    }

    pub fn closed_since(&self) -> Option<f64> {
        match self.state {
            DrowsinessState::EyesClosed { closed_since } => Some(closed_since),
            DrowsinessState::Awake => None,
        }
    }

    /// 当前闭眼段已持续的秒数；Awake 时为 0.0，时钟回拨时截断为 0.0
    pub fn elapsed_closed(&self, now: f64) -> f64 {
        match self.closed_since() {
            Some(since) => (now - since).max(0.0),
            None => 0.0,
        }
    }

    pub fn is_alert(&self, now: f64) -> bool {
        self.elapsed_closed(now) >= self.alert_duration_secs
    }

    pub fn reset(&mut self) {
        self.state = DrowsinessState::Awake;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> DrowsinessStateMachine {
        DrowsinessStateMachine::new(0.3, 0.1, 2.0)
    }

    #[test]
    fn starts_awake() {
        let m = machine();
        assert_eq!(m.state(), DrowsinessState::Awake);
        assert_eq!(m.closed_since(), None);
        assert_eq!(m.elapsed_closed(10.0), 0.0);
    }

    #[test]
    fn closing_emits_one_event_per_episode() {
        let mut m = machine();
        assert_eq!(m.update(0.2, 0.05, 1.0), Transition::EyesClosed);
        assert_eq!(m.update(0.2, 0.05, 1.5), Transition::None);
        assert_eq!(m.update(0.1, 0.0, 2.0), Transition::None);
        assert_eq!(m.closed_since(), Some(1.0));
        assert_eq!(m.elapsed_closed(2.0), 1.0);
    }

    #[test]
    fn reopening_eyes_returns_to_awake() {
        let mut m = machine();
        m.update(0.2, 0.05, 1.0);
        assert_eq!(m.update(0.3, 0.05, 1.2), Transition::Awake);
        assert_eq!(m.state(), DrowsinessState::Awake);
        assert_eq!(m.elapsed_closed(1.3), 0.0);
    }

    #[test]
    fn opening_mouth_cancels_episode_with_low_ear() {
        let mut m = machine();
        m.update(0.2, 0.05, 1.0);
        assert_eq!(m.update(0.2, 0.5, 1.1), Transition::Awake);
        assert!(!m.is_eyes_closed());
    }

    #[test]
    fn low_ear_with_open_mouth_never_closes() {
        let mut m = machine();
        assert_eq!(m.update(0.1, 0.2, 1.0), Transition::None);
        assert_eq!(m.state(), DrowsinessState::Awake);
    }

    #[test]
    fn alert_after_duration() {
        let mut m = machine();
        m.update(0.2, 0.05, 10.0);
        assert!(!m.is_alert(11.999));
        assert!(m.is_alert(12.0));
        assert!(m.is_alert(15.0));
        m.update(0.5, 0.05, 15.1);
        assert!(!m.is_alert(15.1));
    }

    #[test]
    fn clock_going_backwards_clamps_to_zero() {
        let mut m = machine();
        m.update(0.2, 0.05, 5.0);
        assert_eq!(m.elapsed_closed(4.0), 0.0);
    }
}
