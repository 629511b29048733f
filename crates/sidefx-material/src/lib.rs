#![allow(non_snake_case)]
//! Material components: scaffold, modal drawer and snackbars.

pub mod drawer;
pub mod scaffold;
pub mod snackbar;

pub use drawer::*;
pub use scaffold::*;
pub use snackbar::*;
