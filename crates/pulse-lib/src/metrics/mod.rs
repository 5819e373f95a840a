pub mod rate;
pub mod stats;

pub use rate::*;
