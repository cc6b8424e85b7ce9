pub mod config;
pub mod cors;
pub mod emailer;
pub mod error;
pub mod geo;
pub mod mailer;
pub mod routing;
pub mod tracing;
pub mod types;
