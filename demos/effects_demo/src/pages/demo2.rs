use sidefx_core::*;
use sidefx_material::{
    ExtendedFloatingActionButton, IconButton, Scaffold, SnackbarDuration, TopAppBar,
    remember_scaffold_state,
};
use sidefx_ui::{Box, Icon, Text, ViewExt};

use crate::config::DemoConfig;

/// Tasks launched from click handlers through a remembered scope.
pub fn Demo2(config: &DemoConfig) -> View {
    let scaffold_state = remember_scaffold_state();
    let scope = remember_coroutine_scope();

    let open_drawer = {
        let scope = scope.clone();
        let drawer = scaffold_state.drawer_state.clone();
        move || {
            let drawer = drawer.clone();
            if let Err(err) = scope.launch(async move { drawer.open().await }) {
                log::warn!("could not open drawer: {err}");
            }
        }
    };

    let show_snackbar = {
        let host = scaffold_state.snackbar_host_state.clone();
        let message = config.fab_message.clone();
        move || {
            let host = host.clone();
            let message = message.clone();
            let launched = scope.launch(async move {
                host.show_snackbar(message, None, SnackbarDuration::Short)
                    .await;
            });
            if let Err(err) = launched {
                log::warn!("could not show snackbar: {err}");
            }
        }
    };

    Scaffold(
        &scaffold_state,
        Some(TopAppBar(
            "",
            Some(IconButton(Icon("menu", "menu"), open_drawer)),
        )),
        Some(Box().child(Text("drawer content"))),
        Some(ExtendedFloatingActionButton("floating button", show_snackbar)),
        Box().child(Text("content area")),
    )
}
