#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    io::Cursor,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use image::{ImageFormat, Rgba, RgbaImage};
use marquee_core::{ImageUnavailable, image::RemoteImageSource};
use marquee_model::ImageLocator;
use tokio::sync::Semaphore;

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([30, 120, 200, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn locator(name: &str) -> ImageLocator {
    ImageLocator::parse(&format!("https://image.tmdb.org/t/p/w185/{name}.jpg")).unwrap()
}

/// Remote source with per-locator canned responses and optional gates.
///
/// A gated locator blocks inside `retrieve` until [`ScriptedSource::open`]
/// releases it. Unknown locators answer 404.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    responses: Mutex<HashMap<String, Result<Vec<u8>, ImageUnavailable>>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    panics: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, locator: &ImageLocator, response: Result<Vec<u8>, ImageUnavailable>) {
        self.responses
            .lock()
            .unwrap()
            .insert(locator.as_str().to_string(), response);
    }

    pub fn gate(&self, locator: &ImageLocator) {
        self.gates
            .lock()
            .unwrap()
            .insert(locator.as_str().to_string(), Arc::new(Semaphore::new(0)));
    }

    pub fn open(&self, locator: &ImageLocator) {
        if let Some(gate) = self.gates.lock().unwrap().get(locator.as_str()) {
            gate.add_permits(64);
        }
    }

    /// Make the next retrieval of `locator` panic instead of answering.
    pub fn panic_once(&self, locator: &ImageLocator) {
        self.panics
            .lock()
            .unwrap()
            .insert(locator.as_str().to_string());
    }

    pub fn calls_for(&self, locator: &ImageLocator) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(locator.as_str())
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteImageSource for ScriptedSource {
    async fn retrieve(&self, locator: &ImageLocator) -> Result<Vec<u8>, ImageUnavailable> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(locator.as_str().to_string())
            .or_default() += 1;

        let armed = self.panics.lock().unwrap().remove(locator.as_str());
        if armed {
            panic!("scripted source blew up for {locator}");
        }

        let gate = self.gates.lock().unwrap().get(locator.as_str()).cloned();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await.unwrap();
        }

        self.responses
            .lock()
            .unwrap()
            .get(locator.as_str())
            .cloned()
            .unwrap_or(Err(ImageUnavailable::Status(404)))
    }
}

/// Poll `condition` until it holds, failing the test after a few seconds.
pub async fn eventually<F: FnMut() -> bool>(mut condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
