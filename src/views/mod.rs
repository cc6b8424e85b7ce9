pub mod emails;
pub mod filters;
