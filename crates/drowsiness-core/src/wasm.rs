//! 浏览器端绑定
//!
//! 摄像头采集和 face mesh 推理在 JS 侧完成，每帧把关键点以扁平数组
//! `[x0, y0, x1, y1, ...]` 传入，未检测到人脸时传 `null`。

use js_sys::Float64Array;
use wasm_bindgen::prelude::*;

use crate::config::MonitorConfig;
use crate::geometry::points_from_flat;
use crate::processor::{FrameProcessor, FrameSummary};

/// 瞌睡监测器（单会话）
#[wasm_bindgen]
pub struct DrowsinessMonitor {
    processor: FrameProcessor,
}

#[wasm_bindgen]
impl DrowsinessMonitor {
    /// 使用默认 face mesh 索引创建监测器
    ///
    /// # 参数
    /// - `ear_threshold`: EAR 阈值，推荐 0.3
    /// - `mar_threshold`: MAR 阈值，推荐 0.1
    /// - `session_start`: 会话开始时间（秒），之后的 `now` 与之同一时间基准
    #[wasm_bindgen(constructor)]
    pub fn new(
        ear_threshold: f64,
        mar_threshold: f64,
        session_start: f64,
    ) -> Result<DrowsinessMonitor, JsError> {
        let config = MonitorConfig {
            ear_threshold,
            mar_threshold,
            ..MonitorConfig::default()
        };
        Self::build(config, session_start)
    }

    /// 使用完整配置对象创建，字段见 `MonitorConfig`（camelCase，缺省字段取默认值）
    #[wasm_bindgen(js_name = "withConfig")]
    pub fn with_config(config: JsValue, session_start: f64) -> Result<DrowsinessMonitor, JsError> {
        let config: MonitorConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsError::new(&e.to_string()))?;
        Self::build(config, session_start)
    }

    /// 处理一帧，返回汇总对象；转换失败时抛出 JS 异常，状态已照常推进
    #[wasm_bindgen(js_name = "processFrame")]
    pub fn process_frame(
        &mut self,
        landmarks: Option<Float64Array>,
        now_seconds: f64,
    ) -> Result<JsValue, JsError> {
        let coords = landmarks.map(|arr| arr.to_vec());
        let summary = self.process_flat(coords.as_deref(), now_seconds);
        serde_wasm_bindgen::to_value(&summary).map_err(|e| {
            tracing::warn!(error = %e, "failed to convert frame summary to JS");
            JsError::new(&e.to_string())
        })
    }

    #[wasm_bindgen(js_name = "getBlinkCount")]
    pub fn get_blink_count(&self) -> f64 {
        self.processor.last_summary().blink_count as f64
    }

    #[wasm_bindgen(js_name = "isAlert")]
    pub fn is_alert(&self) -> bool {
        self.processor.last_summary().alert
    }

    /// 以新的会话起点重置全部状态
    pub fn reset(&mut self, session_start: f64) {
        self.processor = FrameProcessor::new(self.processor.config().clone(), session_start);
    }
}

impl DrowsinessMonitor {
    fn build(config: MonitorConfig, session_start: f64) -> Result<Self, JsError> {
        let processor = FrameProcessor::try_new(config, session_start)
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Self { processor })
    }

    pub fn process_flat(&mut self, coords: Option<&[f64]>, now: f64) -> FrameSummary {
        match coords {
            Some(coords) => {
                let points = points_from_flat(coords);
                self.processor.process(Some(&points), now)
            }
            None => self.processor.process(None, now),
        }
    }
}
