//! Integration flows.

pub mod fixtures;

mod history_flows;
mod write_flows;
