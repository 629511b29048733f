#![allow(non_snake_case)]
//! Basic widgets. Each one returns a plain [`View`] node carrying the
//! semantics a host needs to find and drive it.

use std::rc::Rc;

use sidefx_core::*;

pub fn Box() -> View {
    View::new(ViewKind::Box)
}

pub fn Row() -> View {
    View::new(ViewKind::Row)
}

pub fn Column() -> View {
    View::new(ViewKind::Column)
}

/// Children are layered on top of each other, last one on top.
pub fn Stack() -> View {
    View::new(ViewKind::Stack)
}

pub fn Text(text: impl Into<String>) -> View {
    View::new(ViewKind::Text { text: text.into() })
        .semantics(Semantics::new(Role::Text))
}

pub fn Button(text: impl Into<String>, on_click: impl Fn() + 'static) -> View {
    View::new(ViewKind::Button {
        text: text.into(),
        on_click: Some(Rc::new(on_click)),
    })
    .semantics(Semantics::new(Role::Button))
}

/// A button the host cannot click.
pub fn DisabledButton(text: impl Into<String>) -> View {
    let mut semantics = Semantics::new(Role::Button);
    semantics.enabled = false;
    View::new(ViewKind::Button {
        text: text.into(),
        on_click: None,
    })
    .semantics(semantics)
}

pub fn Switch(checked: bool, label: impl Into<String>, on_change: impl Fn(bool) + 'static) -> View {
    View::new(ViewKind::Switch {
        checked,
        on_change: Some(Rc::new(on_change)),
    })
    .semantics(Semantics::new(Role::Switch).label(label))
}

/// `description` doubles as the semantics label.
pub fn Icon(name: impl Into<String>, description: impl Into<String>) -> View {
    View::new(ViewKind::Icon { name: name.into() })
        .semantics(Semantics::new(Role::Image).label(description))
}

pub trait ViewExt: Sized {
    fn child(self, children: impl IntoChildren) -> Self;
}

impl ViewExt for View {
    fn child(self, children: impl IntoChildren) -> Self {
        let mut v = self;
        v.children.extend(children.into_children());
        v
    }
}

pub trait IntoChildren {
    fn into_children(self) -> Vec<View>;
}

impl IntoChildren for View {
    fn into_children(self) -> Vec<View> {
        vec![self]
    }
}

impl IntoChildren for Vec<View> {
    fn into_children(self) -> Vec<View> {
        self
    }
}

impl IntoChildren for Option<View> {
    fn into_children(self) -> Vec<View> {
        self.into_iter().collect()
    }
}

impl<const N: usize> IntoChildren for [View; N] {
    fn into_children(self) -> Vec<View> {
        self.into()
    }
}

macro_rules! impl_into_children_tuple {
    ($($idx:tt $t:ident),+) => {
        impl<$($t: IntoChildren),+> IntoChildren for ($($t,)+) {
            fn into_children(self) -> Vec<View> {
                let mut v = Vec::new();
                $(v.extend(self.$idx.into_children());)+
                v
            }
        }
    };
}

impl_into_children_tuple!(0 A, 1 B);
impl_into_children_tuple!(0 A, 1 B, 2 C);
impl_into_children_tuple!(0 A, 1 B, 2 C, 3 D);
impl_into_children_tuple!(0 A, 1 B, 2 C, 3 D, 4 E);
