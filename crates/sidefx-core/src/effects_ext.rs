use std::cell::RefCell;
use std::future::Future;

use crate::coroutine::CoroutineScope;
use crate::runtime::{composition_runtime, remember_with_key, side_effect};
use crate::Dispose;

struct DisposableEffectState<K> {
    key: Option<K>,
    cleanup: Option<Dispose>,
}

impl<K> DisposableEffectState<K> {
    fn take_cleanup(&mut self) -> Option<Dispose> {
        self.cleanup.take()
    }
}

impl<K> Drop for DisposableEffectState<K> {
    fn drop(&mut self) {
        if let Some(d) = self.cleanup.take() {
            d.run();
        }
    }
}

/// Cleanup on key change or when the call site leaves the composition.
///
/// The effect runs after the pass. On a key change the previous cleanup runs
/// exactly once before the new effect starts.
pub fn disposable_effect_internal<K: PartialEq + Clone + 'static>(
    callsite: &'static str,
    key: K,
    effect: impl FnOnce() -> Dispose + 'static,
) {
    let state = remember_with_key(format!("disposable:{callsite}"), || {
        RefCell::new(DisposableEffectState::<K> {
            key: None,
            cleanup: None,
        })
    });

    let changed = state.borrow().key.as_ref() != Some(&key);
    if !changed {
        return;
    }
    state.borrow_mut().key = Some(key);

    side_effect(move || {
        let previous = state.borrow_mut().take_cleanup();
        if let Some(d) = previous {
            d.run();
        }
        let d = effect();
        state.borrow_mut().cleanup = Some(d);
    });
}

#[macro_export]
macro_rules! disposable_effect {
    ($key:expr, $effect:expr) => {
        $crate::effects_ext::disposable_effect_internal(
            concat!(module_path!(), ":", line!(), ":", column!()),
            $key,
            $effect,
        )
    };
}

struct LaunchedEffectState<K> {
    key: Option<K>,
    scope: Option<CoroutineScope>,
}

impl<K> Drop for LaunchedEffectState<K> {
    fn drop(&mut self) {
        if let Some(scope) = self.scope.take() {
            scope.cancel();
        }
    }
}

/// Internal implementation: keyed by a per-callsite id string.
///
/// Launches `block` after the pass whenever `key` changes, cancelling the
/// run started for the previous key. Leaving the composition cancels it.
pub fn launched_effect_internal<K, F, Fut>(callsite: &'static str, key: K, block: F)
where
    K: PartialEq + Clone + 'static,
    F: FnOnce(CoroutineScope) -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    let state = remember_with_key(format!("launched:{callsite}"), || {
        RefCell::new(LaunchedEffectState::<K> {
            key: None,
            scope: None,
        })
    });

    let mut last = state.borrow_mut();
    if last.key.as_ref() == Some(&key) {
        return;
    }
    last.key = Some(key);
    drop(last);

    let runtime = composition_runtime();
    side_effect(move || {
        let previous = state.borrow_mut().scope.take();
        if let Some(previous) = previous {
            log::debug!("launched effect {callsite}: key changed, cancelling previous run");
            previous.cancel();
        }
        let scope = CoroutineScope::new(runtime);
        if let Err(err) = scope.launch(block(scope.clone())) {
            log::warn!("launched effect {callsite} could not start: {err}");
        }
        state.borrow_mut().scope = Some(scope);
    });
}

#[macro_export]
macro_rules! launched_effect {
    ($key:expr, $effect:expr) => {
        $crate::effects_ext::launched_effect_internal(
            concat!(module_path!(), ":", line!(), ":", column!()),
            $key,
            $effect,
        )
    };
}
