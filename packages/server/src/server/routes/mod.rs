// HTTP routes
pub mod health;
pub mod learning;

pub use health::*;
pub use learning::*;
