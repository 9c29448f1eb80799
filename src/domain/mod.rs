//! Core domain types and the index construction pipeline.

pub mod bar;
pub mod frame;
pub mod panel;
pub mod config;
pub mod config_validation;
pub mod signal;
pub mod weights;
pub mod positions;
pub mod returns;
pub mod pipeline;
pub mod performance;
pub mod universe;
pub mod backtest;
pub mod error;
