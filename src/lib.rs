//! Event-log analytics for open football event data: event table, player features,
//! pressing proxies and role/tactic recommendations.

pub mod config;
pub mod dataset;
pub mod event_table;
pub mod features;
pub mod open_data;
pub mod press;
pub mod report_export;
pub mod session;
pub mod tactics;
