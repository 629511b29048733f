use std::cell::Cell;
use std::rc::Rc;

use sidefx_core::{AnimationSpec, Signal, animate, remember, signal};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawerValue {
    Closed,
    Open,
}

/// State of a modal navigation drawer.
///
/// `offset` runs from 0.0 (closed) to 1.0 (fully open). Starting a new
/// animation takes over from one already running.
#[derive(Clone)]
pub struct DrawerState {
    offset: Signal<f32>,
    generation: Rc<Cell<u64>>,
    spec: AnimationSpec,
}

impl DrawerState {
    pub fn new(initial: DrawerValue) -> Self {
        let offset = match initial {
            DrawerValue::Closed => 0.0,
            DrawerValue::Open => 1.0,
        };
        Self {
            offset: signal(offset),
            generation: Rc::new(Cell::new(0)),
            spec: AnimationSpec::default(),
        }
    }

    pub fn with_spec(mut self, spec: AnimationSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn offset(&self) -> f32 {
        self.offset.get()
    }

    pub fn current_value(&self) -> DrawerValue {
        if self.offset.get() >= 1.0 {
            DrawerValue::Open
        } else {
            DrawerValue::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.current_value() == DrawerValue::Open
    }

    pub fn is_closed(&self) -> bool {
        self.offset.get() <= 0.0
    }

    pub async fn open(&self) {
        self.animate_to(1.0).await;
    }

    pub async fn close(&self) {
        self.animate_to(0.0).await;
    }

    /// Jumps to `value` without animating.
    pub fn snap_to(&self, value: DrawerValue) {
        self.generation.set(self.generation.get() + 1);
        self.offset.set(match value {
            DrawerValue::Closed => 0.0,
            DrawerValue::Open => 1.0,
        });
    }

    async fn animate_to(&self, target: f32) {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        let from = self.offset.get_untracked();
        if from == target {
            return;
        }
        log::trace!("drawer animating {from} -> {target}");
        let offset = self.offset.clone();
        let current = self.generation.clone();
        animate(from, target, self.spec, move |v| {
            if current.get() == generation {
                offset.set(v);
            }
        })
        .await;
    }
}

pub fn remember_drawer_state(initial: DrawerValue) -> DrawerState {
    (*remember(|| DrawerState::new(initial))).clone()
}
