//! Terminal front end: reads scenarios from the config and renders reports

pub mod compare;
pub mod setup;
pub mod simulate;
pub mod tiers;
pub mod ui;
