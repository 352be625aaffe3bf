pub mod common;
pub mod curve;
pub mod fraction;
pub mod quote;
