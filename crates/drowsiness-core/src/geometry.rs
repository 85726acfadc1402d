//! 几何工具
//!
//! 关键点坐标为归一化图像空间 [0,1]，由外部关键点检测器按固定拓扑编号给出。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 二维点
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 欧氏距离
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// 纵横比计算的内部失败类型，只在计算器内部流转，边界处统一折算为 0.0
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MetricError {
    #[error("landmark index {index} out of range (len {len})")]
    MissingLandmark { index: usize, len: usize },
    #[error("reference segment has zero length")]
    DegenerateGeometry,
}

/// 按索引取关键点
pub fn landmark(points: &[Point], index: usize) -> Result<Point, MetricError> {
    points
        .get(index)
        .copied()
        .ok_or(MetricError::MissingLandmark {
            index,
            len: points.len(),
        })
}

/// 两个索引对应关键点之间的距离
pub fn distance_between(points: &[Point], a: usize, b: usize) -> Result<f64, MetricError> {
    Ok(landmark(points, a)?.distance(&landmark(points, b)?))
}

/// 纵横比：`sum(vertical) / (2 * horizontal)`
///
/// 分母长度为 0 或非有限值、结果非有限值时返回 `DegenerateGeometry`。
pub fn aspect_ratio(vertical: &[f64], horizontal: f64) -> Result<f64, MetricError> {
    if horizontal == 0.0 || !horizontal.is_finite() {
        return Err(MetricError::DegenerateGeometry);
    }
    let ratio = vertical.iter().sum::<f64>() / (2.0 * horizontal);
    if ratio.is_finite() {
        Ok(ratio)
    } else {
        Err(MetricError::DegenerateGeometry)
    }
}

/// 把扁平的 `[x0, y0, x1, y1, ...]` 数组转换为点序列，末尾不成对的坐标被丢弃
pub fn points_from_flat(coords: &[f64]) -> Vec<Point> {
    coords
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}
