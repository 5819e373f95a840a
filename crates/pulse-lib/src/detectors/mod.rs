pub mod onset;
pub mod peaks;

pub use onset::*;
pub use peaks::*;
