//! Command handlers

pub mod avatar;
pub mod config;
pub mod status;
pub mod user;
