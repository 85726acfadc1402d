//! MAR (Mouth Aspect Ratio) 计算模块
//!
//! MAR = (|p0-p1| + |p2-p3| + |p4-p5|) / (2 * |p6-p7|)
//! - p0/p1, p2/p3, p4/p5: 上下唇配对（垂直方向）
//! - p6, p7: 嘴角点（水平方向）
//!
//! MAR 高表示张嘴。失败策略与 EAR 相同：结果为 0.0。

use crate::config::MouthIndices;
use crate::geometry::{aspect_ratio, distance_between, MetricError, Point};

/// MAR 计算器
#[derive(Debug, Clone, Copy)]
pub struct MARCalculator {
    mouth: MouthIndices,
}

impl MARCalculator {
    pub fn new(mouth: MouthIndices) -> Self {
        Self { mouth }
    }

    pub fn calculate(&self, landmarks: &[Point]) -> f64 {
        self.try_calculate(landmarks).unwrap_or_else(|err| {
            tracing::trace!(error = %err, "MAR fell back to 0.0");
            0.0
        })
    }

    pub fn try_calculate(&self, landmarks: &[Point]) -> Result<f64, MetricError> {
        let [p0, p1, p2, p3, p4, p5, p6, p7] = self.mouth.0;
        let horizontal = distance_between(landmarks, p6, p7)?;
        let v1 = distance_between(landmarks, p0, p1)?;
        let v2 = distance_between(landmarks, p2, p3)?;
        let v3 = distance_between(landmarks, p4, p5)?;
        aspect_ratio(&[v1, v2, v3], horizontal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mouth_points() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 1.0),
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
        ]
    }

    fn calc() -> MARCalculator {
        MARCalculator::new(MouthIndices([0, 1, 2, 3, 4, 5, 6, 7]))
    }

    #[test]
    fn reference_mouth_gives_point_three() {
        assert_eq!(calc().calculate(&mouth_points()), 0.3);
    }

    #[test]
    fn zero_width_mouth_gives_zero() {
        let mut points = mouth_points();
        points[7] = points[6];
        assert_eq!(
            calc().try_calculate(&points),
            Err(MetricError::DegenerateGeometry)
        );
        let mar = calc().calculate(&points);
        assert_eq!(mar, 0.0);
        assert!(mar.is_finite());
    }

    #[test]
    fn short_landmark_set_gives_zero() {
        assert_eq!(calc().calculate(&mouth_points()[..7]), 0.0);
    }
}
