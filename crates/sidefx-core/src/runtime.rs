use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::executor::{RuntimeHandle, current_runtime};
use crate::reactive::{self, ObserverId};
use crate::scope::Scope;
use crate::view::View;

thread_local! {
    static COMPOSER_STACK: RefCell<Vec<Rc<Composer>>> = const { RefCell::new(Vec::new()) };
}

struct GroupFrame {
    path: String,
    cursor: usize,
}

/// Slot storage for one composition.
///
/// Slots are addressed by the current group path plus either a positional
/// index (`remember`) or an explicit key (`remember_with_key`). A slot that
/// is not visited during a pass has left the composition and is dropped at
/// the end of that pass.
pub struct Composer {
    runtime: RuntimeHandle,
    slots: RefCell<HashMap<String, Box<dyn Any>>>,
    touched: RefCell<HashSet<String>>,
    groups: RefCell<Vec<GroupFrame>>,
    side_effects: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl Composer {
    fn new(runtime: RuntimeHandle) -> Self {
        Self {
            runtime,
            slots: RefCell::new(HashMap::new()),
            touched: RefCell::new(HashSet::new()),
            groups: RefCell::new(Vec::new()),
            side_effects: RefCell::new(Vec::new()),
        }
    }

    pub fn runtime(&self) -> RuntimeHandle {
        self.runtime.clone()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.borrow().len()
    }

    fn begin_pass(&self) {
        self.touched.borrow_mut().clear();
        self.side_effects.borrow_mut().clear();
        *self.groups.borrow_mut() = vec![GroupFrame {
            path: String::new(),
            cursor: 0,
        }];
    }

    /// Removes unvisited slots and hands back the queued side effects.
    fn end_pass(&self) -> (Vec<Box<dyn Any>>, Vec<Box<dyn FnOnce()>>) {
        let touched = std::mem::take(&mut *self.touched.borrow_mut());
        let forgotten: Vec<Box<dyn Any>> = {
            let mut slots = self.slots.borrow_mut();
            let stale: Vec<String> = slots
                .keys()
                .filter(|k| !touched.contains(*k))
                .cloned()
                .collect();
            stale
                .into_iter()
                .filter_map(|k| {
                    log::trace!("slot '{k}' left the composition");
                    slots.remove(&k)
                })
                .collect()
        };
        let effects = std::mem::take(&mut *self.side_effects.borrow_mut());
        (forgotten, effects)
    }

    fn positional_slot(&self) -> String {
        let mut groups = self.groups.borrow_mut();
        match groups.last_mut() {
            Some(frame) => {
                let slot = format!("{}#{}", frame.path, frame.cursor);
                frame.cursor += 1;
                slot
            }
            None => String::from("#orphan"),
        }
    }

    fn keyed_slot(&self, key: &str) -> String {
        let groups = self.groups.borrow();
        let path = groups.last().map(|f| f.path.as_str()).unwrap_or_default();
        format!("{path}@{key}")
    }

    fn lookup<T: 'static>(&self, slot: &str) -> Option<Rc<T>> {
        self.touched.borrow_mut().insert(slot.to_owned());
        self.slots
            .borrow()
            .get(slot)
            .and_then(|b| b.downcast_ref::<Rc<T>>().cloned())
    }

    fn store<T: 'static>(&self, slot: String, value: T) -> Rc<T> {
        let rc = Rc::new(value);
        let replaced = self.slots.borrow_mut().insert(slot.clone(), Box::new(rc.clone()));
        if replaced.is_some() {
            log::warn!(
                "remember: slot '{slot}' type changed; replacing. \
                 If this is due to conditional composition, wrap it in a group."
            );
        }
        drop(replaced);
        rc
    }

    fn remember_at<T: 'static>(&self, slot: String, init: impl FnOnce() -> T) -> Rc<T> {
        if let Some(rc) = self.lookup::<T>(&slot) {
            return rc;
        }
        let value = init();
        self.store(slot, value)
    }

    fn enter_group(&self, key: &str) {
        let mut groups = self.groups.borrow_mut();
        let parent = groups.last().map(|f| f.path.as_str()).unwrap_or_default();
        let path = format!("{parent}/{key}");
        groups.push(GroupFrame { path, cursor: 0 });
    }

    fn exit_group(&self) {
        self.groups.borrow_mut().pop();
    }

    pub fn register_side_effect(&self, effect: impl FnOnce() + 'static) {
        self.side_effects.borrow_mut().push(Box::new(effect));
    }
}

struct ComposerGuard;

impl Drop for ComposerGuard {
    fn drop(&mut self) {
        COMPOSER_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

fn current_composer() -> Option<Rc<Composer>> {
    COMPOSER_STACK.with(|stack| stack.borrow().last().cloned())
}

/// Access the active composer, if a pass is running.
pub fn with_composer<R>(f: impl FnOnce(&Composer) -> R) -> Option<R> {
    current_composer().map(|c| f(&c))
}

pub fn is_composing() -> bool {
    current_composer().is_some()
}

/// Runtime of the active composition, else the thread's current runtime.
pub fn composition_runtime() -> RuntimeHandle {
    with_composer(Composer::runtime)
        .or_else(current_runtime)
        .unwrap_or_else(RuntimeHandle::detached)
}

/// Slot-based remember (positional within the current group).
pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Rc<T> {
    match current_composer() {
        Some(c) => {
            let slot = c.positional_slot();
            c.remember_at(slot, init)
        }
        None => {
            log::warn!("remember called outside of a composition; value is not retained");
            Rc::new(init())
        }
    }
}

/// Key-based remember
pub fn remember_with_key<T: 'static>(key: impl Into<String>, init: impl FnOnce() -> T) -> Rc<T> {
    match current_composer() {
        Some(c) => {
            let slot = c.keyed_slot(&key.into());
            c.remember_at(slot, init)
        }
        None => {
            log::warn!("remember_with_key called outside of a composition; value is not retained");
            Rc::new(init())
        }
    }
}

pub fn remember_state<T: 'static>(init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
    remember(|| RefCell::new(init()))
}

pub fn remember_state_with_key<T: 'static>(
    key: impl Into<String>,
    init: impl FnOnce() -> T,
) -> Rc<RefCell<T>> {
    remember_with_key(key, || RefCell::new(init()))
}

/// Remembers a cell and overwrites it with `value` on every pass.
pub(crate) fn remember_latest<T: 'static>(value: T) -> Rc<RefCell<T>> {
    let Some(c) = current_composer() else {
        return Rc::new(RefCell::new(value));
    };
    let slot = c.positional_slot();
    match c.lookup::<RefCell<T>>(&slot) {
        Some(cell) => {
            *cell.borrow_mut() = value;
            cell
        }
        None => c.store(slot, RefCell::new(value)),
    }
}

/// Runs `content` inside a keyed group, giving its slots a stable identity
/// regardless of what was composed before it.
pub fn group<R>(key: impl AsRef<str>, content: impl FnOnce() -> R) -> R {
    let Some(c) = current_composer() else {
        return content();
    };
    c.enter_group(key.as_ref());
    let result = content();
    c.exit_group();
    result
}

/// Queues `effect` to run after the current pass completes.
///
/// Outside of a composition the effect runs immediately.
pub fn side_effect(effect: impl FnOnce() + 'static) {
    match current_composer() {
        Some(c) => c.register_side_effect(effect),
        None => effect(),
    }
}

/// A composable tree of views bound to one runtime.
///
/// `compose` runs a full pass: it tracks which signals the content reads,
/// drops the slots that were not visited, and then applies the side effects
/// queued during the pass.
pub struct Composition {
    composer: Rc<Composer>,
    scope: Scope,
    observer: ObserverId,
    dirty: Rc<Cell<bool>>,
    content: Box<dyn Fn() -> View>,
    view: Option<View>,
    passes: usize,
}

impl Composition {
    pub fn new(runtime: RuntimeHandle, content: impl Fn() -> View + 'static) -> Self {
        let dirty = Rc::new(Cell::new(true));
        let observer = reactive::new_observer({
            let dirty = dirty.clone();
            move || dirty.set(true)
        });
        Self {
            composer: Rc::new(Composer::new(runtime)),
            scope: Scope::new(),
            observer,
            dirty,
            content: Box::new(content),
            view: None,
            passes: 0,
        }
    }

    pub fn compose(&mut self) -> &View {
        COMPOSER_STACK.with(|stack| stack.borrow_mut().push(self.composer.clone()));
        let view = {
            let _guard = ComposerGuard;
            self.composer.begin_pass();
            let content = &self.content;
            let scope = &self.scope;
            reactive::track(self.observer, || scope.run(|| content()))
        };
        // Invalidations raised by the pass itself are already reflected.
        self.dirty.set(false);
        self.passes += 1;

        let (forgotten, effects) = self.composer.end_pass();
        if !forgotten.is_empty() {
            log::debug!("pass {}: {} slot(s) left the composition", self.passes, forgotten.len());
        }
        drop(forgotten);
        for effect in effects {
            effect();
        }

        self.view.insert(view)
    }

    /// Recomposes when a signal read by the last pass changed.
    pub fn recompose_if_needed(&mut self) -> bool {
        if self.dirty.get() {
            self.compose();
            true
        } else {
            false
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn slot_count(&self) -> usize {
        self.composer.slot_count()
    }

    pub fn runtime(&self) -> RuntimeHandle {
        self.composer.runtime()
    }

    /// Drops every slot and disposes the root scope.
    pub fn dispose(self) {}
}

impl Drop for Composition {
    fn drop(&mut self) {
        let slots = std::mem::take(&mut *self.composer.slots.borrow_mut());
        drop(slots);
        self.scope.dispose();
        reactive::remove_observer(self.observer);
    }
}
