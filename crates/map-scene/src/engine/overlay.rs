// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! 3D overlay renderer abstraction and tileset load callbacks.
//!
//! Tileset metadata resolves asynchronously: the renderer invokes the entry's
//! [`TilesetCallbacks`] on a later turn of the event loop. By then the layer may
//! have been removed or the whole overlay dropped, so the callbacks only hold a
//! weak handle and re-check that their entry is still listed before touching
//! the camera.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::{json, Value};

/// Shared handle to the overlay renderer of a scene.
pub type OverlayHandle = Rc<RefCell<dyn OverlayRenderer>>;

/// Non-owning overlay handle held by pending tileset callbacks.
pub type WeakOverlayHandle = Weak<RefCell<dyn OverlayRenderer>>;

/// Camera move requested on the overlay once a tileset is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewTransition {
    pub longitude: f64,
    pub latitude: f64,
    pub transition_ms: u64,
}

/// Metadata reported by the renderer when a tileset resolves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TilesetMetadata {
    /// Geographic center as `[longitude, latitude, height]`.
    pub cartographic_center: Option<[f64; 3]>,
}

/// Drawing options of a tileset entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TilesetOptions {
    pub extruded: bool,
    pub opacity: f64,
    pub pickable: bool,
    pub point_size: f64,
    /// Loader options forwarded verbatim.
    pub load_options: Value,
}

impl Default for TilesetOptions {
    fn default() -> Self {
        Self {
            extruded: true,
            opacity: 1.0,
            pickable: true,
            point_size: 2.0,
            load_options: json!({
                "3d-tiles": {
                    "loadGLTF": true,
                    "decodeQuantizedPositions": false,
                    "isTileset": "auto",
                    "assetGltfUpAxis": null,
                    "workerUrl": null
                }
            }),
        }
    }
}

/// Load notifications for one tileset entry.
#[derive(Clone)]
pub struct TilesetCallbacks {
    layer_id: String,
    overlay: WeakOverlayHandle,
    transition_ms: u64,
}

impl std::fmt::Debug for TilesetCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TilesetCallbacks")
            .field("layer_id", &self.layer_id)
            .field("overlay_alive", &(self.overlay.strong_count() > 0))
            .field("transition_ms", &self.transition_ms)
            .finish()
    }
}

impl TilesetCallbacks {
    #[must_use]
    pub fn new(layer_id: impl Into<String>, overlay: WeakOverlayHandle, transition_ms: u64) -> Self {
        Self {
            layer_id: layer_id.into(),
            overlay,
            transition_ms,
        }
    }

    #[must_use]
    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    /// Tileset metadata became available.
    ///
    /// Recenters the overlay camera on the tileset and returns `true`, unless
    /// the overlay is gone, the entry was removed meanwhile, or the tileset
    /// has no center.
    pub fn on_tileset_load(&self, tileset: &TilesetMetadata) -> bool {
        let Some(overlay) = self.overlay.upgrade() else {
            debug!("Tileset {} resolved after its overlay was dropped", self.layer_id);
            return false;
        };
        let Ok(mut renderer) = overlay.try_borrow_mut() else {
            warn!("Overlay busy, skipping recenter for tileset {}", self.layer_id);
            return false;
        };
        if !renderer.layers().iter().any(|entry| entry.id == self.layer_id) {
            debug!("Tileset {} resolved after its layer was removed", self.layer_id);
            return false;
        }
        let Some([longitude, latitude, _]) = tileset.cartographic_center else {
            debug!("Tileset {} has no cartographic center", self.layer_id);
            return false;
        };

        info!(
            "Tileset {} loaded, recentering on {:.5}, {:.5}",
            self.layer_id, longitude, latitude
        );
        renderer.set_initial_view_state(ViewTransition {
            longitude,
            latitude,
            transition_ms: self.transition_ms,
        });
        true
    }

    /// Tileset metadata failed to resolve.
    ///
    /// Drops the failed entry from the overlay so no partial layer stays
    /// listed. Scene and node state are left untouched.
    pub fn on_tileset_error(&self, message: &str) {
        error!("Tileset error for layer {}: {}", self.layer_id, message);

        let Some(overlay) = self.overlay.upgrade() else {
            return;
        };
        let Ok(mut renderer) = overlay.try_borrow_mut() else {
            warn!("Overlay busy, failed tileset {} left listed", self.layer_id);
            return;
        };
        if renderer.layers().iter().any(|entry| entry.id == self.layer_id) {
            let remaining: Vec<_> = renderer
                .layers()
                .iter()
                .filter(|entry| entry.id != self.layer_id)
                .cloned()
                .collect();
            renderer.set_layers(remaining);
        }
    }
}

/// One drawable entry of the overlay renderer.
#[derive(Debug, Clone)]
pub struct OverlayEntry {
    pub id: String,
    /// Tileset locator (`tileset.json` address).
    pub data: String,
    pub visible: bool,
    pub options: TilesetOptions,
    pub callbacks: TilesetCallbacks,
}

/// External renderer drawing 3D content above the base map.
pub trait OverlayRenderer {
    /// Current drawable entries, bottom to top.
    fn layers(&self) -> &[OverlayEntry];

    /// Replace the drawable entries.
    fn set_layers(&mut self, layers: Vec<OverlayEntry>);

    fn set_initial_view_state(&mut self, view: ViewTransition);
}
