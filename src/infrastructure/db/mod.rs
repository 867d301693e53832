pub mod connection;
pub mod datasets;
