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

//! 3D tileset layers, drawn by the overlay renderer.

use std::rc::Rc;

use log::{debug, warn};

use super::DrawContext;
use crate::engine::{OverlayEntry, TilesetCallbacks, TilesetOptions};
use crate::node::NodeSource;

pub(super) fn load(layer_id: &str, node: &NodeSource, ctx: &mut DrawContext<'_>) {
    let Some(overlay) = ctx.overlay else {
        debug!("Overlay not ready, cannot draw tileset {}", layer_id);
        return;
    };
    let Some(url) = node.url.as_deref() else {
        warn!("Tileset layer {} has no tileset address", layer_id);
        return;
    };
    let Ok(mut renderer) = overlay.try_borrow_mut() else {
        warn!("Overlay busy, cannot draw tileset {}", layer_id);
        return;
    };

    let mut layers = renderer.layers().to_vec();
    if layers.iter().any(|entry| entry.id == layer_id) {
        debug!("Tileset {} already listed in overlay", layer_id);
        return;
    }
    layers.push(OverlayEntry {
        id: layer_id.to_string(),
        data: url.to_string(),
        visible: true,
        options: TilesetOptions::default(),
        callbacks: TilesetCallbacks::new(
            layer_id,
            Rc::downgrade(overlay),
            ctx.config.tileset_transition_ms,
        ),
    });
    renderer.set_layers(layers);
}

pub(super) fn remove(layer_id: &str, ctx: &mut DrawContext<'_>) {
    let Some(overlay) = ctx.overlay else {
        debug!("Overlay not ready, cannot remove tileset {}", layer_id);
        return;
    };
    let Ok(mut renderer) = overlay.try_borrow_mut() else {
        warn!("Overlay busy, cannot remove tileset {}", layer_id);
        return;
    };
    if !renderer.layers().iter().any(|entry| entry.id == layer_id) {
        return;
    }
    let remaining: Vec<_> = renderer
        .layers()
        .iter()
        .filter(|entry| entry.id != layer_id)
        .cloned()
        .collect();
    renderer.set_layers(remaining);
}

pub(super) fn set_visible(layer_id: &str, visible: bool, ctx: &mut DrawContext<'_>) {
    let Some(overlay) = ctx.overlay else {
        debug!("Overlay not ready, cannot toggle tileset {}", layer_id);
        return;
    };
    let Ok(mut renderer) = overlay.try_borrow_mut() else {
        warn!("Overlay busy, cannot toggle tileset {}", layer_id);
        return;
    };
    let mut layers = renderer.layers().to_vec();
    let Some(entry) = layers.iter_mut().find(|entry| entry.id == layer_id) else {
        return;
    };
    if entry.visible != visible {
        entry.visible = visible;
        renderer.set_layers(layers);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::config::SceneConfig;
    use crate::engine::{InMemoryOverlay, OverlayHandle, TilesetMetadata};

    fn tileset_node() -> NodeSource {
        let mut node = NodeSource::new("t", Some("city".to_string()));
        node.url = Some("http://x/resource/3DTiles/t/tileset.json".to_string());
        node
    }

    #[test]
    fn test_load_appends_entry_and_recenters() {
        let overlay = Rc::new(RefCell::new(InMemoryOverlay::new()));
        let handle: OverlayHandle = overlay.clone();
        let config = SceneConfig::default();
        let mut ctx = DrawContext {
            map: None,
            overlay: Some(&handle),
            config: &config,
        };

        load("t0", &tileset_node(), &mut ctx);
        load("t0", &tileset_node(), &mut ctx);
        assert_eq!(overlay.borrow().entry_ids(), ["t0"]);

        let callbacks = overlay.borrow().callbacks("t0").unwrap();
        let tileset = TilesetMetadata {
            cartographic_center: Some([119.0, 34.0, 0.0]),
        };
        assert!(callbacks.on_tileset_load(&tileset));
        let view = overlay.borrow().view().unwrap();
        assert!((view.longitude - 119.0).abs() < f64::EPSILON);
        assert_eq!(view.transition_ms, 1000);
    }

    #[test]
    fn test_late_callback_after_remove_is_noop() {
        let overlay = Rc::new(RefCell::new(InMemoryOverlay::new()));
        let handle: OverlayHandle = overlay.clone();
        let config = SceneConfig::default();
        let mut ctx = DrawContext {
            map: None,
            overlay: Some(&handle),
            config: &config,
        };

        load("t0", &tileset_node(), &mut ctx);
        let callbacks = overlay.borrow().callbacks("t0").unwrap();
        remove("t0", &mut ctx);
        assert!(overlay.borrow().entry_ids().is_empty());

        let tileset = TilesetMetadata {
            cartographic_center: Some([1.0, 2.0, 0.0]),
        };
        assert!(!callbacks.on_tileset_load(&tileset));
        assert!(overlay.borrow().view().is_none());
    }

    #[test]
    fn test_callback_after_overlay_dropped() {
        let overlay = Rc::new(RefCell::new(InMemoryOverlay::new()));
        let handle: OverlayHandle = overlay.clone();
        let config = SceneConfig::default();
        let callbacks = {
            let mut ctx = DrawContext {
                map: None,
                overlay: Some(&handle),
                config: &config,
            };
            load("t0", &tileset_node(), &mut ctx);
            overlay.borrow().callbacks("t0").unwrap()
        };
        drop(handle);
        drop(overlay);

        assert!(!callbacks.on_tileset_load(&TilesetMetadata::default()));
        callbacks.on_tileset_error("gone");
    }

    #[test]
    fn test_error_drops_entry() {
        let overlay = Rc::new(RefCell::new(InMemoryOverlay::new()));
        let handle: OverlayHandle = overlay.clone();
        let config = SceneConfig::default();
        let mut ctx = DrawContext {
            map: None,
            overlay: Some(&handle),
            config: &config,
        };

        load("t0", &tileset_node(), &mut ctx);
        let callbacks = overlay.borrow().callbacks("t0").unwrap();
        callbacks.on_tileset_error("404");
        assert!(overlay.borrow().entry_ids().is_empty());
        assert!(overlay.borrow().view().is_none());
    }

    #[test]
    fn test_visibility_toggle() {
        let overlay = Rc::new(RefCell::new(InMemoryOverlay::new()));
        let handle: OverlayHandle = overlay.clone();
        let config = SceneConfig::default();
        let mut ctx = DrawContext {
            map: None,
            overlay: Some(&handle),
            config: &config,
        };

        load("t0", &tileset_node(), &mut ctx);
        set_visible("t0", false, &mut ctx);
        assert!(!overlay.borrow().entry("t0").unwrap().visible);
        set_visible("t0", true, &mut ctx);
        assert!(overlay.borrow().entry("t0").unwrap().visible);
    }
}
