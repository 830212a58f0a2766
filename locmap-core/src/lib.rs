//! locmap-core: Core types and traits for confidence-map object localization.
//!
//! This crate provides the foundational abstractions shared by the locmap
//! pipeline: bounded-support distributions, the mixture-fitting seam,
//! coordinate rescaling and the running-window smoother.
//!

pub mod beta;
pub mod coords;
pub mod error;
pub mod mixture;
pub mod window;

pub use beta::Beta;
pub use coords::CoordinateNormalizer;
pub use error::{Error, Result};
pub use mixture::{FittedMixture, MixtureComponent, MixtureFit};
pub use window::RunningWindow;
