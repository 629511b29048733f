use std::rc::Rc;

use sidefx_core::*;
use sidefx_ui::{Button, Column, ViewExt};

use crate::config::DemoConfig;

const TAG: &str = "rememberUpdatedState";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timeout {
    First,
    Second,
}

impl Timeout {
    fn number(self) -> u8 {
        match self {
            Timeout::First => 1,
            Timeout::Second => 2,
        }
    }

    fn other(self) -> Self {
        match self {
            Timeout::First => Timeout::Second,
            Timeout::Second => Timeout::First,
        }
    }
}

/// Swapping the landing callback while the landing timer runs. The timer is
/// not restarted and calls whichever callback is current when it ends.
///
/// `on_landed` observes which callback fired.
pub fn Demo3(config: &DemoConfig, on_landed: Rc<dyn Fn(Timeout)>) -> View {
    let choice = remember(|| signal(Timeout::First));
    let selected = choice.get();

    let on_timeout: Rc<dyn Fn()> = Rc::new(move || {
        log::debug!(target: TAG, "landing timeout {}.", selected.number());
        on_landed(selected);
    });

    let on_click = {
        let choice = (*choice).clone();
        move || choice.update(|c| *c = c.other())
    };
    Column().child((
        Button(format!("click{}", selected.number()), on_click),
        LandingScreen(config, on_timeout),
    ))
}

fn LandingScreen(config: &DemoConfig, on_timeout: Rc<dyn Fn()>) -> View {
    let current = remember_updated_state(on_timeout);
    let ticks = config.landing_ticks;
    let tick = config.landing_tick;

    launched_effect!((), move |_scope| async move {
        log::debug!(target: TAG, "LaunchedEffect");
        for i in 0..ticks {
            delay(tick).await;
            log::debug!(target: TAG, "delay {} s", i + 1);
        }
        (current.get())();
    });

    Column()
}
