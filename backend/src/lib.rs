//! Heat Pump Automation Backend Library
//!
//! This library provides the core functionality for the price-driven heat pump
//! automation service, including:
//! - Rolling-baseline price classification and temperature planning
//! - Daily schedule building and hour-by-hour execution against the pump
//! - Cloud device control for the heat pump (power and target temperature)
//! - Read access to ingested electricity prices and automation settings

pub mod api;
pub mod db;
pub mod device;
pub mod models;
pub mod schema;
pub mod services;
