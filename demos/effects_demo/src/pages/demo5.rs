use std::rc::Rc;

use sidefx_core::*;
use sidefx_ui::{Button, Column, Text, ViewExt};

use crate::config::DemoConfig;
use crate::repository::{ImageLoader, ImageRepository, LoadResult};

/// Loads an image for the current index; clicking bumps the index, which
/// restarts the load.
pub fn Demo5(config: &DemoConfig) -> View {
    let latency = config.repository_delay;
    let repository = remember(|| Rc::new(ImageRepository::new(latency)) as Rc<dyn ImageLoader>);
    Demo5WithLoader((*repository).clone())
}

pub fn Demo5WithLoader(loader: Rc<dyn ImageLoader>) -> View {
    let index = remember(|| signal(0u32));
    let current = index.get();
    let result = Demo5Result(current, loader);

    let on_click = {
        let index = (*index).clone();
        move || index.update(|i| *i += 1)
    };
    Column().child((
        Button(format!("click:{current}"), on_click),
        Text(if result.with(LoadResult::is_loading) {
            "loading"
        } else {
            "ok"
        }),
    ))
}

pub fn Demo5Result(index: u32, loader: Rc<dyn ImageLoader>) -> State<LoadResult> {
    produce_state!(LoadResult::Loading, index, move |scope| async move {
        let image = loader.load(index).await;
        scope.set_value(LoadResult::from(image));
    })
}
