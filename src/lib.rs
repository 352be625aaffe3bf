pub mod error;
pub mod math;
pub mod model;
pub mod pool;
pub mod solver;
