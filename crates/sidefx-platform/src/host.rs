use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sidefx_core::{BackgroundWait, Clock, Composition, Job, Runtime, View, ViewKind};
use sidefx_navigation::BackDispatcher;

use crate::error::HostError;

#[derive(Clone, Debug)]
pub struct HostConfig {
    /// Upper bound on task/recompose rounds per frame.
    pub max_rounds_per_frame: usize,
    /// How long `settle` waits for one background job before giving up.
    pub background_timeout: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_rounds_per_frame: 64,
            background_timeout: Duration::from_secs(5),
        }
    }
}

/// Drives a composition without a window.
///
/// Input is delivered by semantics label, the way an accessibility client
/// would. Time moves only when asked to, so with a virtual clock every run
/// is deterministic.
pub struct Host {
    // Declared first so it drops before the runtime its tasks live on.
    composition: Composition,
    runtime: Runtime,
    clock: Arc<dyn Clock>,
    config: HostConfig,
}

impl Host {
    pub fn new(runtime: Runtime, content: impl Fn() -> View + 'static) -> Self {
        Self::with_config(runtime, HostConfig::default(), content)
    }

    pub fn with_config(
        runtime: Runtime,
        config: HostConfig,
        content: impl Fn() -> View + 'static,
    ) -> Self {
        let clock = runtime.clock();
        let composition = Composition::new(runtime.handle(), content);
        let mut host = Self {
            composition,
            runtime,
            clock,
            config,
        };
        host.frame();
        host
    }

    /// Runs ready tasks and recomposes until neither makes progress.
    pub fn frame(&mut self) {
        for _ in 0..self.config.max_rounds_per_frame {
            let ran = self.runtime.run_until_idle();
            let recomposed = self.composition.recompose_if_needed();
            if !ran && !recomposed && !self.runtime.has_ready_tasks() {
                return;
            }
        }
        log::warn!(
            "frame did not settle after {} rounds",
            self.config.max_rounds_per_frame
        );
    }

    /// Like [`frame`](Self::frame), but also waits for background work.
    pub fn settle(&mut self) {
        self.frame();
        loop {
            match self.runtime.wait_for_background(self.config.background_timeout) {
                BackgroundWait::Idle => break,
                BackgroundWait::Finished => self.frame(),
                BackgroundWait::TimedOut => {
                    log::warn!(
                        "background work still running after {:?}",
                        self.config.background_timeout
                    );
                    break;
                }
            }
        }
        self.frame();
    }

    /// Moves the clock forward by `by`, stopping at every timer deadline on
    /// the way so tasks observe time in order.
    pub fn advance_by(&mut self, by: Duration) {
        let target = self.clock.now() + by;
        self.settle();
        while let Some(deadline) = self.runtime.next_deadline().filter(|d| *d <= target) {
            self.clock.sleep_until(deadline);
            self.settle();
        }
        self.clock.sleep_until(target);
        self.settle();
    }

    /// Clicks the first enabled button labelled `label`.
    pub fn click(&mut self, label: &str) -> Result<(), HostError> {
        let callback = {
            let node = self.node(label)?;
            let enabled = node.semantics.as_ref().is_none_or(|s| s.enabled);
            match &node.kind {
                ViewKind::Button {
                    on_click: Some(cb), ..
                } if enabled => cb.clone(),
                _ => return Err(HostError::NotClickable(label.to_owned())),
            }
        };
        log::debug!("click {label:?}");
        callback();
        self.frame();
        Ok(())
    }

    /// Flips the switch labelled `label`.
    pub fn toggle(&mut self, label: &str) -> Result<bool, HostError> {
        let (callback, next) = {
            let node = self.node(label)?;
            match &node.kind {
                ViewKind::Switch {
                    checked,
                    on_change: Some(cb),
                } => (cb.clone(), !checked),
                _ => return Err(HostError::NotClickable(label.to_owned())),
            }
        };
        log::debug!("toggle {label:?} -> {next}");
        callback(next);
        self.frame();
        Ok(next)
    }

    /// Delivers a system back press. Returns whether a callback handled it.
    pub fn press_back(&mut self, dispatcher: &BackDispatcher) -> bool {
        let handled = dispatcher.on_back_pressed();
        self.frame();
        handled
    }

    /// Spawns a task on the host's runtime and runs a frame.
    pub fn launch(&mut self, future: impl Future<Output = ()> + 'static) -> Result<Job, HostError> {
        let job = self.runtime.handle().spawn(future)?;
        self.frame();
        Ok(job)
    }

    pub fn view(&self) -> Option<&View> {
        self.composition.view()
    }

    pub fn texts(&self) -> Vec<String> {
        self.view().map(View::texts).unwrap_or_default()
    }

    pub fn contains_text(&self, text: &str) -> bool {
        self.view().is_some_and(|v| v.contains_text(text))
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.view().and_then(|v| v.find_by_label(label)).is_some()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    fn node(&self, label: &str) -> Result<&View, HostError> {
        self.view()
            .and_then(|v| v.find_by_label(label))
            .ok_or_else(|| HostError::NodeNotFound(label.to_owned()))
    }
}
