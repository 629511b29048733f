use sidefx_core::*;
use sidefx_material::{Scaffold, SnackbarDuration, remember_scaffold_state};
use sidefx_ui::{Box, Button, ViewExt};

use crate::config::DemoConfig;

/// A snackbar launched from composition. Clicking flips the effect key,
/// which cancels the snackbar on screen and shows a fresh one.
pub fn Demo1(config: &DemoConfig) -> View {
    let state = remember(|| signal(false));
    let scaffold_state = remember_scaffold_state();

    launched_effect!(state.get(), {
        let host = scaffold_state.snackbar_host_state.clone();
        let message = config.click_message.clone();
        let action = config.retry_label.clone();
        move |_scope| async move {
            let result = host
                .show_snackbar(message, Some(action), SnackbarDuration::Short)
                .await;
            log::debug!("demo1 snackbar: {result:?}");
        }
    });

    let on_click = {
        let state = (*state).clone();
        move || state.update(|s| *s = !*s)
    };
    Scaffold(
        &scaffold_state,
        None,
        None,
        None,
        Box().child(Button("click", on_click)),
    )
}
