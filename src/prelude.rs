pub use std::sync::Arc;
pub use std::time::Duration;

pub use anyhow::{Context as _, Result};
pub use askama::Template;
pub use axum::extract::State;
pub use axum::http::{header, StatusCode};
pub use axum::response::{IntoResponse, Response};
pub use axum::routing::{get, post};
pub use axum::Json;
pub use chrono::{NaiveDateTime, Utc};
pub use serde_json::json;

pub use crate::db::Db;
pub use crate::utils::config::Config;
pub use crate::utils::error::{invalid, not_found, AppError, JsonError, JsonResult};
pub use crate::utils::routing::{AppRouter, AxumRouter, ClientIp};
pub use crate::utils::types::SharedAppState;
