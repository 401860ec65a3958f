pub mod analysis;
pub mod api_connection;
pub mod cli;
pub mod controller;
pub mod encoder;
pub mod report;
