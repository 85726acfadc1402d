//! EAR (Eye Aspect Ratio) 计算模块
//!
//! 每只眼 6 个关键点，公式: EAR = (|p0-p1| + |p2-p3|) / (2 * |p4-p5|)
//! - p0/p1, p2/p3: 上下眼睑配对（垂直方向）
//! - p4, p5: 眼角点（水平方向）
//!
//! 左右眼取平均。任意一侧索引越界或水平距离为 0 时，两侧均记为 0.0，
//! 结果为 0.0，不向外抛出错误。

use crate::config::EyeIndices;
use crate::geometry::{aspect_ratio, distance_between, MetricError, Point};

/// EAR 计算器
///
/// 不保留历史，每帧重新计算。
#[derive(Debug, Clone, Copy)]
pub struct EARCalculator {
    left: EyeIndices,
    right: EyeIndices,
}

impl EARCalculator {
    pub fn new(left: EyeIndices, right: EyeIndices) -> Self {
        Self { left, right }
    }

    /// 双眼平均 EAR；失败时为 0.0
    pub fn calculate(&self, landmarks: &[Point]) -> f64 {
        match self.try_calculate(landmarks) {
            Ok(ear) => ear,
            Err(err) => {
                tracing::trace!(error = %err, "EAR fell back to 0.0");
                0.0
            }
        }
    }

    /// 可失败版本，失败原因只用于内部诊断
    pub fn try_calculate(&self, landmarks: &[Point]) -> Result<f64, MetricError> {
        let left = eye_ratio(landmarks, &self.left)?;
        let right = eye_ratio(landmarks, &self.right)?;
        Ok((left + right) / 2.0)
    }
}

fn eye_ratio(landmarks: &[Point], eye: &EyeIndices) -> Result<f64, MetricError> {
    let [p0, p1, p2, p3, p4, p5] = eye.0;
    let horizontal = distance_between(landmarks, p4, p5)?;
    let vertical1 = distance_between(landmarks, p0, p1)?;
    let vertical2 = distance_between(landmarks, p2, p3)?;
    aspect_ratio(&[vertical1, vertical2], horizontal)
}
