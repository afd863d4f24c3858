pub mod agent;
pub mod graph;
pub mod tooling;
pub mod workflow;
