//! 瞌睡检测核心库
//!
//! 基于面部关键点逐帧判断闭眼、张嘴，统计闭眼时长、眨眼次数与眨眼频率，
//! 闭眼过久时给出报警。可作为 rlib 供服务端使用，也可编译为 WebAssembly
//! 在浏览器端运行。
//!
//! ## 模块
//! - `geometry`: 点与距离、内部失败类型
//! - `ear`: EAR (Eye Aspect Ratio) 眼部纵横比
//! - `mar`: MAR (Mouth Aspect Ratio) 嘴部纵横比
//! - `drowsiness`: 清醒/闭眼状态机
//! - `blink`: 眨眼计数
//! - `rate_window`: 每秒采样的眨眼频率窗口
//! - `processor`: 单帧编排与汇总
//! - `wasm`: 浏览器端绑定

pub mod blink;
pub mod config;
pub mod drowsiness;
pub mod ear;
pub mod geometry;
pub mod mar;
pub mod processor;
pub mod rate_window;
pub mod wasm;

// 重新导出核心类型，方便外部使用
pub use blink::BlinkTracker;
pub use config::{ConfigError, EyeIndices, IndexLayout, MonitorConfig, MouthIndices};
pub use drowsiness::{DrowsinessState, DrowsinessStateMachine, Transition};
pub use ear::EARCalculator;
pub use geometry::{MetricError, Point};
pub use mar::MARCalculator;
pub use processor::{FrameProcessor, FrameSummary};
pub use rate_window::{RollingRateWindow, WARMUP_BLINK_RATE};
pub use wasm::DrowsinessMonitor;
