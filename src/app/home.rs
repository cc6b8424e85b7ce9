use crate::prelude::*;

/// Add all `home` routes to the router.
pub fn add_routes(router: AppRouter) -> AppRouter {
    router.public_routes(|r| r.route("/", get(ping)))
}

/// Health check.
async fn ping() -> Json<serde_json::Value> {
    Json(json!({"message": "Ping.."}))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;

    use super::*;
    use crate::app::tests::{body_json, TestApp};

    #[tokio::test]
    async fn ping_pongs() {
        let app = TestApp::new().await;
        let (status, res) = app.send(Request::builder().uri("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body_json(res).await, json!({"message": "Ping.."}));
    }
}
