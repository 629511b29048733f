//! Walks through every demo screen on a headless host, printing what each
//! one shows after a few scripted interactions.

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use effects_demo::pages::demo4::SWITCH_LABEL;
use effects_demo::{Demo1, Demo2, Demo3, Demo4, Demo5, DemoConfig, Timeout};
use sidefx_core::{Runtime, TestClock};
use sidefx_navigation::BackDispatcher;
use sidefx_platform::Host;

fn runtime() -> Runtime {
    // Virtual time, so the ten second landing timer does not block.
    Runtime::new(Arc::new(TestClock::new()))
}

fn show(name: &str, host: &Host) {
    println!("{name}: {:?}", host.texts());
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    let config = DemoConfig::default();

    let mut host = Host::new(runtime(), {
        let config = config.clone();
        move || Demo1(&config)
    });
    show("demo1", &host);
    host.click("click").context("demo1 click")?;
    show("demo1 after click", &host);
    host.click(&config.retry_label).context("demo1 retry")?;
    show("demo1 after retry", &host);

    let mut host = Host::new(runtime(), {
        let config = config.clone();
        move || Demo2(&config)
    });
    host.click("menu").context("demo2 menu")?;
    host.advance_by(Duration::from_millis(500));
    show("demo2 drawer", &host);
    host.click("floating button").context("demo2 fab")?;
    show("demo2 snackbar", &host);

    let mut host = Host::new(runtime(), {
        let config = config.clone();
        let on_landed: Rc<dyn Fn(Timeout)> = Rc::new(|t: Timeout| log::info!("landed with {t:?}"));
        move || Demo3(&config, on_landed.clone())
    });
    host.advance_by(Duration::from_secs(3));
    host.click("click1").context("demo3 switch callback")?;
    host.advance_by(config.landing_tick * config.landing_ticks);
    show("demo3", &host);

    let dispatcher = BackDispatcher::new();
    let mut host = Host::new(runtime(), {
        let dispatcher = dispatcher.clone();
        move || Demo4(&dispatcher)
    });
    host.toggle(SWITCH_LABEL).context("demo4 on")?;
    show("demo4", &host);
    let handled = host.press_back(&dispatcher);
    log::info!("back press handled: {handled}");
    host.toggle(SWITCH_LABEL).context("demo4 off")?;
    show("demo4", &host);

    let mut host = Host::new(runtime(), {
        let config = config.clone();
        move || Demo5(&config)
    });
    show("demo5", &host);
    host.advance_by(config.repository_delay);
    show("demo5 loaded", &host);
    host.click("click:0").context("demo5 click")?;
    show("demo5 reloading", &host);

    Ok(())
}
