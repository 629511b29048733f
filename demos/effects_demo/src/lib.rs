#![allow(non_snake_case)]
//! Five small screens, each built around one lifecycle-bound effect:
//!
//! - [`Demo1`](pages::Demo1): `launched_effect!` restarting on a key.
//! - [`Demo2`](pages::Demo2): `remember_coroutine_scope` for click handlers.
//! - [`Demo3`](pages::Demo3): `remember_updated_state` inside a long task.
//! - [`Demo4`](pages::Demo4): `disposable_effect!` registering a back callback.
//! - [`Demo5`](pages::Demo5): `produce_state!` over an image load.

pub mod config;
pub mod pages;
pub mod repository;

pub use config::DemoConfig;
pub use pages::*;
pub use repository::{ImageData, ImageLoader, ImageRepository, LoadResult};
