use axum::extract::Request;
use axum::http::{HeaderValue, Method};
use axum::middleware::Next;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::prelude::*;
use crate::utils::config::CorsConfig;

/// Only let browsers on the allow-listed origins call us, with credentials, using GET and POST.
///
/// Requests carrying any other `Origin` are refused outright. Requests without one aren't from a browser page
/// and pass through.
pub fn add_middleware(router: AxumRouter, config: &CorsConfig) -> Result<AxumRouter> {
    let origins = config
        .origins
        .iter()
        .map(|o| {
            let o = o.trim_end_matches('/');
            HeaderValue::from_str(o).with_context(|| format!("parsing cors origin={o:?}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins.clone()))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let allowed = Arc::new(origins);
    let reject = axum::middleware::from_fn(move |req: Request, next: Next| {
        let allowed = Arc::clone(&allowed);
        async move {
            let denied = req.headers().get(header::ORIGIN).filter(|o| !allowed.contains(o)).cloned();
            if let Some(origin) = denied {
                tracing::warn!("Rejecting request from origin={origin:?}");
                return AppError::Forbidden("Not allowed by CORS").into_response();
            }
            next.run(req).await
        }
    });

    Ok(router.layer(cors).layer(reject))
}
