pub mod stable;
pub mod standard;
