pub mod amount;
pub mod price;
pub mod token;
