pub mod algorithm;
pub mod common;
pub mod pair;
pub mod route;
pub mod search;
pub mod split;
pub mod trade;
