use serde_json::{json, Value};

/// 紧凑布局：前 6 点为双眼共用，后 8 点为嘴部
pub fn compact_layout() -> Value {
    json!({
        "leftEye": [0, 1, 2, 3, 4, 5],
        "rightEye": [0, 1, 2, 3, 4, 5],
        "mouth": [6, 7, 8, 9, 10, 11, 12, 13],
    })
}

/// 创建会话的请求体，使用紧凑布局，其余参数取服务默认值
pub fn compact_session_body() -> Value {
    json!({ "layout": compact_layout() })
}

/// EAR、MAR 恰为给定值的 14 个关键点（眼宽 1，嘴宽 1）
pub fn face(ear: f64, mar: f64) -> Value {
    let mouth_h = 2.0 * mar / 3.0;
    json!([
        {"x": 0.0, "y": 0.0},
        {"x": 0.0, "y": ear},
        {"x": 0.5, "y": 0.0},
        {"x": 0.5, "y": ear},
        {"x": 0.0, "y": 0.0},
        {"x": 1.0, "y": 0.0},
        {"x": 0.0, "y": 0.0},
        {"x": 0.0, "y": mouth_h},
        {"x": 0.2, "y": 0.0},
        {"x": 0.2, "y": mouth_h},
        {"x": 0.4, "y": 0.0},
        {"x": 0.4, "y": mouth_h},
        {"x": 0.0, "y": 0.0},
        {"x": 1.0, "y": 0.0},
    ])
}

pub fn frame(ear: f64, mar: f64, timestamp: f64) -> Value {
    json!({ "landmarks": face(ear, mar), "timestamp": timestamp })
}

pub fn no_face_frame(timestamp: f64) -> Value {
    json!({ "landmarks": null, "timestamp": timestamp })
}
