//! Headless platform runner.
//!
//! [`Host`] owns a [`Runtime`](sidefx_core::Runtime) and a composition and
//! plays the role of the event loop: it runs tasks, recomposes, steps the
//! clock and delivers clicks, toggles and back presses.

pub mod error;
pub mod host;

pub use error::HostError;
pub use host::{Host, HostConfig};
