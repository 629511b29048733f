use std::sync::Arc;
use std::time::Duration;

use futures::future::{FutureExt, LocalBoxFuture};
use sidefx_core::{background, delay};

/// Decoded image bytes. Opaque to the screens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

/// Outcome of an image load. Only moves from `Loading` to one of the other
/// two.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadResult {
    Loading,
    Error,
    Success(ImageData),
}

impl LoadResult {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadResult::Loading)
    }
}

impl From<Option<ImageData>> for LoadResult {
    fn from(image: Option<ImageData>) -> Self {
        match image {
            Some(image) => LoadResult::Success(image),
            None => LoadResult::Error,
        }
    }
}

pub trait ImageLoader {
    fn load(&self, index: u32) -> LocalBoxFuture<'static, Option<ImageData>>;
}

/// Stand-in for a real image source: waits, then comes back empty from a
/// worker thread.
#[derive(Clone, Debug)]
pub struct ImageRepository {
    latency: Duration,
}

impl ImageRepository {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl ImageLoader for ImageRepository {
    fn load(&self, index: u32) -> LocalBoxFuture<'static, Option<ImageData>> {
        let latency = self.latency;
        async move {
            log::debug!("loading image {index}");
            delay(latency).await;
            match background(move |_token| None::<ImageData>).await {
                Ok(image) => image,
                Err(err) => {
                    log::warn!("image {index} failed to load: {err}");
                    None
                }
            }
        }
        .boxed_local()
    }
}
