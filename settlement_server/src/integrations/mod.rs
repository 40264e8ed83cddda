pub mod notifications;
pub mod odds_api;
