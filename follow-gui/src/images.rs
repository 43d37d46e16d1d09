use std::collections::HashMap;
use std::sync::Arc;

use eframe::egui;
use follow_core::{ImageElement, LoadError};
use reqwest::Client;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::debug;

struct Decoded {
    key: String,
    requested: String,
    result: Result<egui::ColorImage, String>,
}

/// One image element plus its texture once decoded.
pub struct ImageSlot {
    pub element: ImageElement,
    pub texture: Option<egui::TextureHandle>,
    requested: Option<String>,
}

/// Fetches and decodes images on the runtime, feeding results back into the elements.
pub struct ImageLoader {
    runtime: Arc<Runtime>,
    client: Client,
    slots: HashMap<String, ImageSlot>,
    tx: mpsc::UnboundedSender<Decoded>,
    rx: mpsc::UnboundedReceiver<Decoded>,
}

impl ImageLoader {
    pub fn new(runtime: Arc<Runtime>, client: Client) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            client,
            slots: HashMap::new(),
            tx,
            rx,
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn slot(&self, key: &str) -> Option<&ImageSlot> {
        self.slots.get(key)
    }

    /// Registers `element` under `key` unless already known, then makes sure it is loading.
    pub fn track(&mut self, key: &str, element: impl FnOnce() -> ImageElement, ctx: &egui::Context) {
        self.slots.entry(key.to_owned()).or_insert_with(|| ImageSlot {
            element: element(),
            texture: None,
            requested: None,
        });
        self.request(key, ctx);
    }

    fn request(&mut self, key: &str, ctx: &egui::Context) {
        let Some(slot) = self.slots.get_mut(key) else {
            return;
        };
        let Some(current) = slot.element.current_src().map(str::to_owned) else {
            return;
        };
        if slot.requested.as_deref() == Some(current.as_str()) {
            return;
        }
        slot.requested = Some(current.clone());
        let tx = self.tx.clone();
        let client = self.client.clone();
        let key = key.to_owned();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let result = fetch_and_decode(&client, &current).await;
            let _ = tx.send(Decoded {
                key,
                requested: current,
                result,
            });
            ctx.request_repaint();
        });
    }

    /// Applies finished loads. Returns true if anything changed.
    pub fn poll(&mut self, ctx: &egui::Context) -> bool {
        let mut changed = false;
        while let Ok(decoded) = self.rx.try_recv() {
            let Some(slot) = self.slots.get_mut(&decoded.key) else {
                continue;
            };
            changed = true;
            match decoded.result {
                Ok(image) => {
                    slot.texture = Some(ctx.load_texture(
                        decoded.requested,
                        image,
                        egui::TextureOptions::LINEAR,
                    ));
                    slot.element.on_load();
                }
                Err(reason) => slot.element.on_error(LoadError {
                    src: decoded.requested,
                    reason,
                }),
            }
        }
        if changed {
            // A proxy failure switches the element to the original address.
            let keys: Vec<String> = self.slots.keys().cloned().collect();
            for key in keys {
                self.request(&key, ctx);
            }
        }
        changed
    }
}

async fn fetch_and_decode(client: &Client, src: &str) -> Result<egui::ColorImage, String> {
    debug!(%src, "loading image");
    let response = client.get(src).send().await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("http {}", response.status().as_u16()));
    }
    let bytes = response.bytes().await.map_err(|e| e.to_string())?;
    let decoded = image::load_from_memory(&bytes).map_err(|e| e.to_string())?;
    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(
        size,
        rgba.as_flat_samples().as_slice(),
    ))
}
