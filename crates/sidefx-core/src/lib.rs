//! # State, Effects, and Tasks
//!
//! Sidefx is a small headless declarative runtime. A [`Composition`] calls a
//! content function that returns a [`View`] tree; the function is re-run
//! whenever a [`Signal`] it read changes.
//!
//! ## Signals
//!
//! ```rust
//! use sidefx_core::*;
//!
//! let count = signal(0);
//! count.set(1);
//! count.update(|v| *v += 1);
//! assert_eq!(count.get(), 2);
//! ```
//!
//! ## Remembered state
//!
//! `remember` and `remember_state` are order-based: the Nth call inside a
//! group refers to the Nth stored value. `remember_with_key` is stable across
//! conditional branches. A slot that is not visited during a pass has left
//! the composition; its value is dropped at the end of that pass, which is
//! what cancels tasks and runs cleanups bound to it.
//!
//! ## Effects
//!
//! - [`launched_effect!`] starts an async block after the pass and restarts
//!   it when its key changes. The previous run is cancelled first.
//! - [`disposable_effect!`] runs setup after the pass and its cleanup before
//!   the next setup or when the call site leaves.
//! - [`remember_coroutine_scope`] gives event handlers a scope to launch
//!   tasks in; leaving the composition cancels them.
//! - [`remember_updated_state`] lets a long-running task read the latest
//!   value passed by the caller without restarting.
//! - [`produce_state!`] exposes the result of an async producer as state.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use sidefx_core::*;
//!
//! let clock = TestClock::new();
//! let runtime = Runtime::new(Arc::new(clock.clone()));
//! let mut composition = Composition::new(runtime.handle(), || {
//!     let ticks = remember(|| signal(0));
//!     launched_effect!((), {
//!         let ticks = (*ticks).clone();
//!         move |_scope| async move {
//!             delay(Duration::from_secs(1)).await;
//!             ticks.update(|t| *t += 1);
//!         }
//!     });
//!     View::new(ViewKind::Text { text: ticks.get().to_string() })
//! });
//!
//! composition.compose();
//! runtime.run_until_idle();
//! clock.advance(Duration::from_secs(1));
//! runtime.run_until_idle();
//! composition.recompose_if_needed();
//! assert!(composition.view().is_some_and(|v| v.contains_text("1")));
//! ```
//!
//! ## Tasks
//!
//! Tasks run on a single-threaded [`Runtime`]. Use [`delay`] for timers on
//! the runtime clock and [`background`] to move blocking work to a worker
//! thread; the awaiting task resumes on the runtime thread.

pub mod animation;
pub mod clock;
pub mod coroutine;
pub mod effects;
pub mod effects_ext;
pub mod error;
pub mod executor;
pub mod reactive;
pub mod runtime;
pub mod scope;
pub mod semantics;
pub mod signal;
pub mod state;
pub mod tests;
pub mod view;

pub use animation::*;
pub use clock::*;
pub use coroutine::*;
pub use effects::*;
pub use effects_ext::*;
pub use error::*;
pub use executor::*;
pub use reactive::*;
pub use runtime::*;
pub use scope::*;
pub use semantics::*;
pub use signal::*;
pub use state::*;
pub use view::*;
