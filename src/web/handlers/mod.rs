//! HTTP request handlers organized by domain

pub mod catalog;
pub mod health;
pub mod preferences;
pub mod relay;
