use sidefx_core::*;
use sidefx_navigation::{BackCallback, BackDispatcher};
use sidefx_ui::{Row, Switch, Text, ViewExt};

const TAG: &str = "DisposableEffect";

pub const SWITCH_LABEL: &str = "back callback";

/// While the switch is on, a back callback is registered with `dispatcher`;
/// turning it off removes the callback.
pub fn Demo4(dispatcher: &BackDispatcher) -> View {
    let add_back_callback = remember(|| signal(false));
    let enabled = add_back_callback.get();

    let on_change = {
        let flag = (*add_back_callback).clone();
        move |_| flag.update(|f| *f = !*f)
    };
    let row = Row().child((
        Switch(enabled, SWITCH_LABEL, on_change),
        Text(if enabled {
            "add back callback"
        } else {
            "not add back callback"
        }),
    ));

    if enabled {
        group("back-callback", || {
            let callback = remember(|| {
                BackCallback::new(true, || log::debug!(target: TAG, "onBack"))
            });
            let callback = (*callback).clone();
            let target = dispatcher.clone();
            disposable_effect!(dispatcher.clone(), move || {
                target.add_callback(&callback);
                on_unmount(move || {
                    log::debug!(target: TAG, "onDispose");
                    callback.remove();
                })
            });
        });
    }

    row
}
