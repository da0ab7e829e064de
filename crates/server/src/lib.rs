//! Prediction server: loads one model artifact and serves it over HTTP

pub mod api;
pub mod config;
