pub mod config;
pub mod logging;

pub mod control;
pub mod error;
pub mod extract;
pub mod model;
pub mod naming;
pub mod orchestrator;
pub mod session;
pub mod store;
pub mod transport;
