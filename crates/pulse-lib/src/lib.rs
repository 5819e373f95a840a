pub mod config;
pub mod detectors;
pub mod error;
pub mod frames;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod plot;
pub mod signal;

pub use config::*;
pub use detectors::*;
pub use error::*;
pub use frames::*;
pub use metrics::*;
pub use pipeline::*;
pub use signal::*;
