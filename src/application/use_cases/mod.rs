pub mod aggregation;
pub mod retention;
pub mod upload;
pub mod validation;
