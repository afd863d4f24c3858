pub mod database;
pub mod model;
pub mod retrieval;
pub mod sandbox;
