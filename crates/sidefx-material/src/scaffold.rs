use std::rc::Rc;

use sidefx_core::*;
use sidefx_ui::{Button, Column, Row, Stack, Text, ViewExt};

use crate::drawer::{DrawerState, DrawerValue, remember_drawer_state};
use crate::snackbar::{SnackbarHostState, remember_snackbar_host_state};

#[derive(Clone)]
pub struct ScaffoldState {
    pub drawer_state: DrawerState,
    pub snackbar_host_state: SnackbarHostState,
}

impl Default for ScaffoldState {
    fn default() -> Self {
        Self {
            drawer_state: DrawerState::new(DrawerValue::Closed),
            snackbar_host_state: SnackbarHostState::new(),
        }
    }
}

pub fn remember_scaffold_state() -> ScaffoldState {
    ScaffoldState {
        drawer_state: remember_drawer_state(DrawerValue::Closed),
        snackbar_host_state: remember_snackbar_host_state(),
    }
}

/// Screen frame: top bar, body, FAB, a modal drawer while it is (partly)
/// open, and the current snackbar.
pub fn Scaffold(
    state: &ScaffoldState,
    top_bar: Option<View>,
    drawer_content: Option<View>,
    floating_action_button: Option<View>,
    content: View,
) -> View {
    let drawer = drawer_content.filter(|_| state.drawer_state.offset() > 0.0);
    let snackbar = state
        .snackbar_host_state
        .current_snackbar()
        .map(|data| SnackbarView(&state.snackbar_host_state, &data.message, data.action_label));

    Stack().child((
        Column().child((top_bar, content)),
        floating_action_button,
        drawer.map(|d| Column().child(d)),
        snackbar,
    ))
}

fn SnackbarView(host: &SnackbarHostState, message: &str, action_label: Option<String>) -> View {
    let action = action_label.map(|label| {
        let host = host.clone();
        Button(label, move || host.perform_action())
    });
    Row().child((Text(message), action))
}

pub fn TopAppBar(title: impl Into<String>, navigation_icon: Option<View>) -> View {
    Row().child((navigation_icon, Text(title)))
}

/// A clickable icon. Labelled with the icon's description.
pub fn IconButton(icon: View, on_click: impl Fn() + 'static) -> View {
    let mut semantics = Semantics::new(Role::Button);
    semantics.label = icon.label().map(str::to_owned);
    View::new(ViewKind::Button {
        text: String::new(),
        on_click: Some(Rc::new(on_click)),
    })
    .semantics(semantics)
    .child(icon)
}

pub fn ExtendedFloatingActionButton(text: impl Into<String>, on_click: impl Fn() + 'static) -> View {
    Button(text, on_click)
}
