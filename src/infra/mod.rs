//! Infrastructure layer (adapters/implementations).
//!
//! This module contains IO-heavy integrations (HTTP, on-disk storage, config).

pub mod app_config;
pub mod http;
pub mod storage;
