use axum::extract::DefaultBodyLimit;

use crate::db::SubmissionStore;
use crate::prelude::*;
use crate::utils::emailer::Emailer;
use crate::utils::geo::{GeoLocator, IpApi};
use crate::utils::mailer::Mailer;

mod contact;
mod home;

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn SubmissionStore>,
    /// Only set when geolocation enrichment is enabled.
    pub geo: Option<Arc<dyn GeoLocator>>,
    pub mailer: Mailer,
}

/// Connect to all collaborators named in the config.
pub async fn init(config: Config) -> Result<SharedAppState> {
    let db = crate::db::init(&config.db).await?;
    let emailer = Emailer::connect(&config)?;
    let geo: Option<Arc<dyn GeoLocator>> = match &config.geo {
        Some(geo) => Some(Arc::new(IpApi::new(geo)?)),
        None => None,
    };
    let mailer = Mailer::new(Arc::new(emailer), config.email.queue_capacity, config.email.workers);

    Ok(Arc::new(AppState { config, store: Arc::new(db), geo, mailer }))
}

pub fn build(state: &SharedAppState) -> Result<axum::Router<()>> {
    // Register business logic routes
    let r = AppRouter::new(state);
    let r = home::add_routes(r);
    let r = contact::add_routes(r);
    let (r, state) = r.finish();

    // Register app-wide routes
    let r = r.fallback(|| async { not_found() });

    // Register middleware
    let r = r.layer(DefaultBodyLimit::max(64 * 1024));
    let r = crate::utils::cors::add_middleware(r, &state.config.cors)?;
    let r = crate::utils::tracing::add_middleware(r);
    let r = r.with_state(state);

    Ok(r)
}
