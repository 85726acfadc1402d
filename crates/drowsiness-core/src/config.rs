//! 监测参数与关键点索引布局
//!
//! 索引常量属于配置而非内部知识：默认值对应 468 点 face mesh 拓扑。

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_EAR_THRESHOLD: f64 = 0.3;
pub const DEFAULT_MAR_THRESHOLD: f64 = 0.1;
pub const DEFAULT_ALERT_DURATION_SECS: f64 = 2.0;
pub const DEFAULT_ROLLING_WINDOW_CAPACITY: usize = 60;

/// 单眼 6 点索引 `[p0..p5]`
///
/// EAR = (|p0-p1| + |p2-p3|) / (2 * |p4-p5|)，p4/p5 为眼角。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EyeIndices(pub [usize; 6]);

/// 嘴部 8 点索引 `[p0..p7]`
///
/// MAR = (|p0-p1| + |p2-p3| + |p4-p5|) / (2 * |p6-p7|)，p6/p7 为嘴角。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MouthIndices(pub [usize; 8]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexLayout {
    pub left_eye: EyeIndices,
    pub right_eye: EyeIndices,
    pub mouth: MouthIndices,
}

impl IndexLayout {
    /// 468 点 face mesh 的眼部与嘴部索引
    pub fn face_mesh() -> Self {
        Self {
            left_eye: EyeIndices([385, 380, 387, 373, 362, 263]),
            right_eye: EyeIndices([160, 144, 158, 153, 33, 133]),
            mouth: MouthIndices([82, 87, 13, 14, 312, 317, 78, 308]),
        }
    }
}

impl Default for IndexLayout {
    fn default() -> Self {
        Self::face_mesh()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidThreshold { field: &'static str, value: f64 },
    #[error("alertDurationSecs must be a finite, positive number (got {0})")]
    InvalidAlertDuration(f64),
    #[error("rollingWindowCapacity must be at least 1")]
    ZeroWindowCapacity,
}

/// 监测会话配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorConfig {
    /// EAR 低于此值视为闭眼
    pub ear_threshold: f64,
    /// MAR 不低于此值视为张嘴
    pub mar_threshold: f64,
    /// 持续闭眼达到该秒数时报警
    pub alert_duration_secs: f64,
    /// 每秒眨眼增量窗口容量
    pub rolling_window_capacity: usize,
    pub layout: IndexLayout,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            ear_threshold: DEFAULT_EAR_THRESHOLD,
            mar_threshold: DEFAULT_MAR_THRESHOLD,
            alert_duration_secs: DEFAULT_ALERT_DURATION_SECS,
            rolling_window_capacity: DEFAULT_ROLLING_WINDOW_CAPACITY,
            layout: IndexLayout::default(),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("earThreshold", self.ear_threshold),
            ("marThreshold", self.mar_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidThreshold { field, value });
            }
        }
        if !self.alert_duration_secs.is_finite() || self.alert_duration_secs <= 0.0 {
            return Err(ConfigError::InvalidAlertDuration(self.alert_duration_secs));
        }
        if self.rolling_window_capacity == 0 {
            return Err(ConfigError::ZeroWindowCapacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.ear_threshold, 0.3);
        assert_eq!(cfg.mar_threshold, 0.1);
        assert_eq!(cfg.alert_duration_secs, 2.0);
        assert_eq!(cfg.rolling_window_capacity, 60);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let cfg = MonitorConfig {
            ear_threshold: f64::NAN,
            ..MonitorConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidThreshold { field: "earThreshold", .. })
        ));

        let cfg = MonitorConfig {
            alert_duration_secs: 0.0,
            ..MonitorConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidAlertDuration(0.0)));

        let cfg = MonitorConfig {
            rolling_window_capacity: 0,
            ..MonitorConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroWindowCapacity));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: MonitorConfig =
            serde_json::from_str(r#"{"earThreshold":0.25,"layout":{"leftEye":[0,1,2,3,4,5],"rightEye":[6,7,8,9,10,11],"mouth":[0,1,2,3,4,5,6,7]}}"#)
                .expect("parse config");
        assert_eq!(cfg.ear_threshold, 0.25);
        assert_eq!(cfg.mar_threshold, 0.1);
        assert_eq!(cfg.layout.left_eye, EyeIndices([0, 1, 2, 3, 4, 5]));
    }
}
