pub mod csv;
pub mod dataset;
pub mod error;
