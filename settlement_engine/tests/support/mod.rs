#![allow(dead_code)]
pub mod events;
pub mod fixtures;
pub mod prepare_env;
