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

//! Drawable layers.
//!
//! A [`Layer`] is one drawable unit of a node. The set of layer kinds is closed;
//! [`Layer::load`], [`Layer::remove`], [`Layer::open`] and [`Layer::close`]
//! dispatch on the kind in one place each.
//!
//! Layers never guard against being loaded twice. The owning node does that
//! through its `active` flag. Removal, on the other hand, always checks that
//! the layer exists in the engine first.

pub mod hooks;
mod tiles3d;

pub use hooks::{CustomLayerEvent, Hooks, LifecycleEvent};

use log::{debug, warn};
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::SceneConfig;
use crate::engine::{DrawKind, LayerSpec, MapEngine, OverlayHandle, TerrainSpec};
use crate::error::EngineError;
use crate::node::NodeSource;
use crate::style;

/// Zoom range of every drawn 2D layer; sources carry the node's own bounds.
const LAYER_MIN_ZOOM: u8 = 0;
const LAYER_MAX_ZOOM: u8 = 22;

/// Kind of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Point,
    Line,
    Polygon,
    Label,
    /// Plain raster, or shaded relief for DEM-capable nodes.
    Raster,
    Custom,
    Tile3d,
}

/// Engines a layer draws into. Either may be absent while the canvas is
/// being set up or torn down.
pub struct DrawContext<'a> {
    pub map: Option<&'a mut dyn MapEngine>,
    pub overlay: Option<&'a OverlayHandle>,
    pub config: &'a SceneConfig,
}

impl std::fmt::Debug for DrawContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawContext")
            .field("map", &self.map.is_some())
            .field("overlay", &self.overlay.is_some())
            .finish_non_exhaustive()
    }
}

/// Kind-specific state of a layer.
#[derive(Debug)]
pub enum LayerBody {
    Point,
    Line,
    Polygon,
    Label,
    Raster,
    Custom(Hooks<CustomLayerEvent>),
    Tile3d,
}

impl LayerBody {
    #[must_use]
    pub fn new(kind: LayerKind) -> Self {
        match kind {
            LayerKind::Point => Self::Point,
            LayerKind::Line => Self::Line,
            LayerKind::Polygon => Self::Polygon,
            LayerKind::Label => Self::Label,
            LayerKind::Raster => Self::Raster,
            LayerKind::Custom => Self::Custom(Hooks::new()),
            LayerKind::Tile3d => Self::Tile3d,
        }
    }
}

/// One drawable unit owned by a node.
#[derive(Debug)]
pub struct Layer {
    id: String,
    node_id: String,
    body: LayerBody,
}

impl Layer {
    /// Create the `index`-th layer of a node; its id is `<node_id><index>`.
    #[must_use]
    pub fn new(node_id: &str, index: usize, kind: LayerKind) -> Self {
        Self {
            id: format!("{node_id}{index}"),
            node_id: node_id.to_string(),
            body: LayerBody::new(kind),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identifier of the owning node, which is also its source id.
    #[must_use]
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    #[must_use]
    pub fn kind(&self) -> LayerKind {
        match self.body {
            LayerBody::Point => LayerKind::Point,
            LayerBody::Line => LayerKind::Line,
            LayerBody::Polygon => LayerKind::Polygon,
            LayerBody::Label => LayerKind::Label,
            LayerBody::Raster => LayerKind::Raster,
            LayerBody::Custom(_) => LayerKind::Custom,
            LayerBody::Tile3d => LayerKind::Tile3d,
        }
    }

    /// Hook registry of a custom layer.
    pub fn hooks_mut(&mut self) -> Option<&mut Hooks<CustomLayerEvent>> {
        match &mut self.body {
            LayerBody::Custom(hooks) => Some(hooks),
            _ => None,
        }
    }

    /// Paint payload of this layer for the given node.
    #[must_use]
    pub fn paint(&self, node: &NodeSource) -> Value {
        match self.kind() {
            LayerKind::Raster if node.is_dem_source => style::hillshade_paint(),
            kind => style::paint(kind, node.is_geojson()),
        }
    }

    /// Whether the engine currently draws this layer.
    #[must_use]
    pub fn is_drawn(&self, map: &dyn MapEngine) -> bool {
        match self.kind() {
            LayerKind::Custom | LayerKind::Tile3d => false,
            _ => map.has_layer(&self.id),
        }
    }

    /// Draw the layer.
    pub fn load(&mut self, node: &NodeSource, ctx: &mut DrawContext<'_>) {
        match self.kind() {
            LayerKind::Custom => {
                self.emit(LifecycleEvent::Load);
            }
            LayerKind::Tile3d => tiles3d::load(&self.id, node, ctx),
            LayerKind::Label if node.is_geojson() => {
                debug!("Skipping label layer {} for standalone features", self.id);
            }
            kind => {
                let Some(map) = ctx.map.as_deref_mut() else {
                    debug!("Map engine not ready, cannot draw layer {}", self.id);
                    return;
                };
                if kind == LayerKind::Raster && node.is_dem_source && ctx.config.auto_terrain {
                    map.set_terrain(Some(TerrainSpec {
                        source: node.id.clone(),
                        exaggeration: ctx.config.terrain_exaggeration,
                    }));
                }
                let spec = self.spec(kind, node);
                report(&self.id, map.add_layer(spec));
            }
        }
    }

    /// Undraw the layer if it is drawn.
    pub fn remove(&mut self, node: &NodeSource, ctx: &mut DrawContext<'_>) {
        match self.kind() {
            LayerKind::Custom => {
                self.emit(LifecycleEvent::Remove);
            }
            LayerKind::Tile3d => tiles3d::remove(&self.id, ctx),
            kind => {
                let Some(map) = ctx.map.as_deref_mut() else {
                    debug!("Map engine not ready, cannot remove layer {}", self.id);
                    return;
                };
                if kind == LayerKind::Raster && node.is_dem_source && node.is_terrain(map) {
                    debug!("Clearing terrain held by layer {}", self.id);
                    map.set_terrain(None);
                }
                if map.has_layer(&self.id) {
                    report(&self.id, map.remove_layer(&self.id));
                }
            }
        }
    }

    /// Show a drawn layer.
    pub fn open(&mut self, ctx: &mut DrawContext<'_>) {
        self.set_visible(true, ctx);
    }

    /// Hide a drawn layer without undrawing it.
    pub fn close(&mut self, ctx: &mut DrawContext<'_>) {
        self.set_visible(false, ctx);
    }

    fn set_visible(&mut self, visible: bool, ctx: &mut DrawContext<'_>) {
        match self.kind() {
            LayerKind::Custom => {
                let event = if visible {
                    LifecycleEvent::Open
                } else {
                    LifecycleEvent::Close
                };
                self.emit(event);
            }
            LayerKind::Tile3d => tiles3d::set_visible(&self.id, visible, ctx),
            _ => {
                let Some(map) = ctx.map.as_deref_mut() else {
                    debug!("Map engine not ready, cannot toggle layer {}", self.id);
                    return;
                };
                if map.has_layer(&self.id) {
                    let value = if visible { "visible" } else { "none" };
                    report(
                        &self.id,
                        map.set_layout_property(&self.id, "visibility", json!(value)),
                    );
                }
            }
        }
    }

    fn emit(&mut self, event: LifecycleEvent) {
        let args = CustomLayerEvent {
            event,
            layer_id: self.id.clone(),
            node_id: self.node_id.clone(),
        };
        if let LayerBody::Custom(hooks) = &mut self.body {
            let handled = hooks.emit(event, &args);
            debug!("Custom layer {} {:?}: {} handler(s)", self.id, event, handled);
        }
    }

    fn spec(&self, kind: LayerKind, node: &NodeSource) -> LayerSpec {
        let tiled = !node.is_geojson();
        let (draw, source_layer, layout) = match kind {
            LayerKind::Point => (DrawKind::Circle, tiled, Value::Null),
            LayerKind::Line => (DrawKind::Line, tiled, Value::Null),
            LayerKind::Polygon => (DrawKind::Fill, tiled, Value::Null),
            LayerKind::Label => (
                DrawKind::Symbol,
                true,
                style::label_layout(node.label_field.as_deref()),
            ),
            _ if node.is_dem_source => (DrawKind::Hillshade, false, Value::Null),
            _ => (DrawKind::Raster, false, Value::Null),
        };
        let zoomed = tiled || kind == LayerKind::Raster;

        LayerSpec {
            id: self.id.clone(),
            kind: draw,
            source: node.id.clone(),
            source_layer: if source_layer { node.name.clone() } else { None },
            minzoom: zoomed.then_some(LAYER_MIN_ZOOM),
            maxzoom: zoomed.then_some(LAYER_MAX_ZOOM),
            layout,
            paint: self.paint(node),
        }
    }
}

fn report(layer_id: &str, result: Result<(), EngineError>) {
    if let Err(e) = result {
        warn!("Engine rejected call for layer {}: {}", layer_id, e);
    }
}
