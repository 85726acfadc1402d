//! 单帧编排
//!
//! 外部循环每帧调用一次 [`FrameProcessor::process`]：
//! 关键点 → EAR/MAR → 状态机 → 眨眼计数 → 频率窗口 → [`FrameSummary`]。
//! 时间由调用方传入，内部不读时钟。

use serde::{Deserialize, Serialize};

use crate::blink::BlinkTracker;
use crate::config::{ConfigError, MonitorConfig};
use crate::drowsiness::{DrowsinessStateMachine, Transition};
use crate::ear::EARCalculator;
use crate::geometry::Point;
use crate::mar::MARCalculator;
use crate::rate_window::{RollingRateWindow, WARMUP_BLINK_RATE};

/// 每帧输出给渲染端的汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSummary {
    pub ear: f64,
    pub mar: f64,
    /// mar >= mar_threshold
    pub mouth_open: bool,
    /// 状态为 EyesClosed
    pub drowsy: bool,
    pub closed_duration: f64,
    pub blink_count: u64,
    pub blink_rate_per_minute: f64,
    pub alert: bool,
}

impl Default for FrameSummary {
    fn default() -> Self {
        Self {
            ear: 0.0,
            mar: 0.0,
            mouth_open: false,
            drowsy: false,
            closed_duration: 0.0,
            blink_count: 0,
            blink_rate_per_minute: WARMUP_BLINK_RATE,
            alert: false,
        }
    }
}

/// 一个监测会话的全部状态
#[derive(Debug, Clone)]
pub struct FrameProcessor {
    config: MonitorConfig,
    session_start: f64,
    ear: EARCalculator,
    mar: MARCalculator,
    state_machine: DrowsinessStateMachine,
    blinks: BlinkTracker,
    window: RollingRateWindow,
    last_summary: FrameSummary,
    frames_processed: u64,
    frames_without_face: u64,
}

impl FrameProcessor {
    /// 调用方需保证配置已通过 [`MonitorConfig::validate`]
    pub fn new(config: MonitorConfig, session_start: f64) -> Self {
        let layout = config.layout;
        Self {
            ear: EARCalculator::new(layout.left_eye, layout.right_eye),
            mar: MARCalculator::new(layout.mouth),
            state_machine: DrowsinessStateMachine::new(
                config.ear_threshold,
                config.mar_threshold,
                config.alert_duration_secs,
            ),
            blinks: BlinkTracker::new(),
            window: RollingRateWindow::new(config.rolling_window_capacity),
            last_summary: FrameSummary::default(),
            frames_processed: 0,
            frames_without_face: 0,
            session_start,
            config,
        }
    }

    pub fn try_new(config: MonitorConfig, session_start: f64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config, session_start))
    }

    /// 处理一帧
    ///
    /// `landmarks` 为 `None` 表示本帧未检测到人脸：不改动任何状态，原样返回上一帧汇总。
    pub fn process(&mut self, landmarks: Option<&[Point]>, now: f64) -> FrameSummary {
        let Some(landmarks) = landmarks else {
            self.frames_without_face += 1;
            return self.last_summary.clone();
        };

        let ear = self.ear.calculate(landmarks);
        let mar = self.mar.calculate(landmarks);
        let was_alert = self.last_summary.alert;

        let transition = self.state_machine.update(ear, mar, now);
        match transition {
            Transition::EyesClosed => {
                tracing::debug!(now, ear, mar, "eyes closed, blink started");
            }
            Transition::Awake => {
                tracing::debug!(now, ear, mar, "eyes reopened");
            }
            Transition::None => {}
        }
        self.blinks.observe(transition);

        let t_elapsed = now - self.session_start;
        let blink_rate = self.window.update(t_elapsed, self.blinks.count());

        let closed_duration = self.state_machine.elapsed_closed(now);
        let alert = self.state_machine.is_alert(now);
        if alert && !was_alert {
            tracing::info!(closed_duration, "eyes closed too long, raising alert");
        }

        self.frames_processed += 1;
        self.last_summary = FrameSummary {
            ear,
            mar,
            mouth_open: mar >= self.config.mar_threshold,
            drowsy: self.state_machine.is_eyes_closed(),
            closed_duration,
            blink_count: self.blinks.count(),
            blink_rate_per_minute: blink_rate,
            alert,
        };
        self.last_summary.clone()
    }

    pub fn last_summary(&self) -> &FrameSummary {
        &self.last_summary
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn frames_without_face(&self) -> u64 {
        self.frames_without_face
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state_machine(&self) -> &DrowsinessStateMachine {
        &self.state_machine
    }

    pub fn rate_window(&self) -> &RollingRateWindow {
        &self.window
    }
}
