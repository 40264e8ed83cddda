//! # Settlement server
//! This crate hosts the process that keeps the tipster marketplace's books straight. It is responsible for:
//! * Locking tickets once their first match has kicked off.
//! * Pulling match results from the score provider and reconciling match status locally.
//! * Settling tickets and paying out winning buyers.
//! * Warning subscribers before their subscription ends, and expiring it afterwards.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.

pub mod cli;
pub mod config;
pub mod errors;
pub mod integrations;
pub mod mailer;
pub mod server;
pub mod workers;

#[cfg(test)]
mod test;
