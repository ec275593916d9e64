//! REST / push APIハンドラー
//!
//! 読み取り専用のデバイス参照と、スナップショットのSSE・WebSocket配信

pub mod dashboard_ws;
pub mod devices;
pub mod error;
pub mod sse;

use crate::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// APIルーターを作成
///
/// `cors_origin`はダッシュボードのオリジン。解釈できない値の場合は
/// CORSヘッダーを付与しない。
pub fn create_app(state: AppState, cors_origin: &str) -> Router {
    let router = Router::new()
        .route("/devices", get(devices::list_devices))
        .route("/devices/{id}", get(devices::get_device))
        .route("/devices/{id}/logs", get(devices::list_device_logs))
        .route("/live", get(devices::live_snapshot))
        .route("/sse", get(sse::sse_handler))
        .route("/ws/dashboard", get(dashboard_ws::dashboard_ws_handler))
        .with_state(state);

    let router = match cors_layer(cors_origin) {
        Some(cors) => router.layer(cors),
        None => {
            tracing::warn!(origin = %cors_origin, "Invalid CORS origin, CORS disabled");
            router
        }
    };

    router.layer(TraceLayer::new_for_http())
}

fn cors_layer(origin: &str) -> Option<CorsLayer> {
    let origin: HeaderValue = origin.parse().ok()?;
    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::OPTIONS]),
    )
}
