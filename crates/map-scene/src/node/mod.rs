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

//! Scene nodes.
//!
//! A [`Node`] is one classified backend resource. It owns a fixed list of
//! layers chosen by its type at construction and tracks whether its source is
//! registered with the map engine. `active == true` means the source is
//! registered and every layer is drawn; `active == false` means neither.

mod classify;

pub use classify::layer_kinds;

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::config::{SceneConfig, ViewState};
use crate::engine::{MapEngine, SourceSpec};
use crate::error::SceneError;
use crate::layer::{CustomLayerEvent, DrawContext, Hooks, Layer, LayerKind};
use crate::resource::{ResourceDescriptor, SourceTemplate};

/// Classified type of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Point,
    Line,
    Polygon,
    /// DEM-capable raster.
    Raster,
    /// Underwater raster; plain imagery with a fixed camera preset.
    Underwater,
    #[serde(rename = "3d")]
    ThreeD,
    Custom,
}

/// Source data of a node, read by its layers when drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSource {
    /// Node identifier, also used as the engine source id.
    pub id: String,
    /// Display name; the vector tile layer name for tiled sources.
    pub name: Option<String>,
    /// Tile template or tileset address.
    pub url: Option<String>,
    pub label_field: Option<String>,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub tile_size: u32,
    pub is_dem_source: bool,
    /// Inline feature collection, when the source is not tiled.
    pub geojson: Option<Value>,
}

impl NodeSource {
    #[must_use]
    pub fn new(id: &str, name: Option<String>) -> Self {
        Self {
            id: id.to_string(),
            name,
            url: None,
            label_field: None,
            min_zoom: 0,
            max_zoom: 18,
            tile_size: 256,
            is_dem_source: false,
            geojson: None,
        }
    }

    /// Whether the source is a standalone feature collection rather than tiles.
    #[must_use]
    pub fn is_geojson(&self) -> bool {
        self.geojson.is_some()
    }

    /// Whether the engine's terrain is currently backed by this source.
    #[must_use]
    pub fn is_terrain(&self, map: &dyn MapEngine) -> bool {
        map.terrain().is_some_and(|terrain| terrain.source == self.id)
    }
}

/// One classified resource and its layers.
#[derive(Debug)]
pub struct Node {
    kind: NodeType,
    source: NodeSource,
    layers: Vec<Layer>,
    view_state: Option<ViewState>,
    active: bool,
}

impl Node {
    /// Classify a descriptor and build its inactive node.
    pub fn create_from_data(
        descriptor: &ResourceDescriptor,
        template: &SourceTemplate,
        config: &SceneConfig,
    ) -> Result<Self, SceneError> {
        if descriptor.id.trim().is_empty() {
            return Err(SceneError::MissingIdentifier {
                name: descriptor.name.clone(),
            });
        }

        let classified = classify::classify(descriptor, template, config);
        let mut node = Self {
            kind: classified.kind,
            source: classified.source,
            layers: Vec::new(),
            view_state: classified.view_state,
            active: false,
        };
        for &kind in layer_kinds(node.kind) {
            node.add_layer(kind);
        }
        debug!(
            "Created {:?} node {} with {} layer(s)",
            node.kind,
            node.source.id,
            node.layers.len()
        );
        Ok(node)
    }

    fn add_layer(&mut self, kind: LayerKind) -> usize {
        let index = self.layers.len();
        self.layers.push(Layer::new(&self.source.id, index, kind));
        index
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.source.id
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.source.name.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> NodeType {
        self.kind
    }

    #[must_use]
    pub fn source(&self) -> &NodeSource {
        &self.source
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn is_dem_source(&self) -> bool {
        self.source.is_dem_source
    }

    /// Camera preset of the node, if its type has one.
    #[must_use]
    pub fn view_state(&self) -> Option<&ViewState> {
        self.view_state.as_ref()
    }

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[must_use]
    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// Layer kinds in draw order.
    #[must_use]
    pub fn layer_kinds(&self) -> Vec<LayerKind> {
        self.layers.iter().map(Layer::kind).collect()
    }

    /// Hook registry of the node's custom layer, for custom nodes.
    pub fn custom_hooks_mut(&mut self) -> Option<&mut Hooks<CustomLayerEvent>> {
        self.layers.iter_mut().find_map(Layer::hooks_mut)
    }

    #[must_use]
    pub fn is_terrain(&self, map: &dyn MapEngine) -> bool {
        self.source.is_terrain(map)
    }

    /// Source registration payload for this node's type.
    #[must_use]
    pub fn source_spec(&self) -> Option<SourceSpec> {
        let source = &self.source;
        if matches!(self.kind, NodeType::Point | NodeType::Line | NodeType::Polygon) {
            if let Some(data) = &source.geojson {
                return Some(SourceSpec::Geojson { data: data.clone() });
            }
        }
        let tiles = vec![source.url.clone()?];
        match self.kind {
            NodeType::Raster if source.is_dem_source => Some(SourceSpec::RasterDem {
                tiles,
                tile_size: source.tile_size,
                minzoom: source.min_zoom,
                maxzoom: source.max_zoom,
            }),
            NodeType::Raster | NodeType::Underwater => Some(SourceSpec::Raster {
                tiles,
                tile_size: source.tile_size,
                minzoom: source.min_zoom,
                maxzoom: source.max_zoom,
            }),
            NodeType::Point | NodeType::Line | NodeType::Polygon => Some(SourceSpec::Vector {
                scheme: "xyz".to_string(),
                tiles,
                minzoom: source.min_zoom,
                maxzoom: source.max_zoom,
            }),
            NodeType::ThreeD | NodeType::Custom => None,
        }
    }

    /// Whether the engine this node draws into is attached: the overlay for
    /// 3D tilesets, the map for every other type.
    fn engine_ready(&self, ctx: &DrawContext<'_>) -> bool {
        let ready = match self.kind {
            NodeType::ThreeD => ctx.overlay.is_some(),
            _ => ctx.map.is_some(),
        };
        if !ready {
            debug!("Engine for {:?} node {} not ready", self.kind, self.source.id);
        }
        ready
    }

    /// Register the source and draw every layer in order.
    ///
    /// Returns `false` without touching the engine when the node is already
    /// active or the engine it draws into is not attached.
    pub fn load_all(&mut self, ctx: &mut DrawContext<'_>) -> bool {
        if self.active || !self.engine_ready(ctx) {
            return false;
        }

        if let (Some(spec), Some(map)) = (self.source_spec(), ctx.map.as_deref_mut()) {
            if let Err(e) = map.add_source(&self.source.id, spec) {
                warn!("Failed to register source {}: {}", self.source.id, e);
            }
        }
        for layer in &mut self.layers {
            layer.load(&self.source, ctx);
        }
        self.active = true;
        info!("Loaded node {} ({:?})", self.source.id, self.kind);
        true
    }

    /// Undraw every layer and deregister the source.
    ///
    /// Clears the terrain first if this node provides it. Returns `false`
    /// when the node is already inactive or its engine is not attached.
    pub fn remove_all(&mut self, ctx: &mut DrawContext<'_>) -> bool {
        if !self.active || !self.engine_ready(ctx) {
            return false;
        }

        for layer in &mut self.layers {
            layer.remove(&self.source, ctx);
        }
        if let Some(map) = ctx.map.as_deref_mut() {
            if self.source.is_terrain(map) {
                info!("Clearing terrain backed by node {}", self.source.id);
                map.set_terrain(None);
            }
            if map.has_source(&self.source.id) {
                if let Err(e) = map.remove_source(&self.source.id) {
                    warn!("Failed to remove source {}: {}", self.source.id, e);
                }
            }
        }
        self.active = false;
        info!("Removed node {}", self.source.id);
        true
    }

    /// Show every layer of an active node.
    pub fn open_all(&mut self, ctx: &mut DrawContext<'_>) -> bool {
        if !self.active || !self.engine_ready(ctx) {
            return false;
        }
        for layer in &mut self.layers {
            layer.open(ctx);
        }
        true
    }

    /// Hide every layer of an active node without undrawing it.
    pub fn close_all(&mut self, ctx: &mut DrawContext<'_>) -> bool {
        if !self.active || !self.engine_ready(ctx) {
            return false;
        }
        for layer in &mut self.layers {
            layer.close(ctx);
        }
        true
    }

    /// Move this node's drawn layers, as one block, below the first drawn
    /// layer of `target`, or to the top of the draw order when there is no
    /// target or the target draws nothing.
    pub fn move_before(&self, target: Option<&Node>, map: &mut dyn MapEngine) -> bool {
        if !self.active {
            return false;
        }
        if target.is_some_and(|target| target.id() == self.id()) {
            debug!("Node {} cannot be moved before itself", self.source.id);
            return false;
        }

        let before_id = target.and_then(|target| {
            target
                .layers
                .iter()
                .find(|layer| layer.is_drawn(&*map))
                .map(|layer| layer.id().to_string())
        });
        let drawn: Vec<&Layer> = self.layers.iter().filter(|layer| layer.is_drawn(&*map)).collect();
        for layer in &drawn {
            if let Err(e) = map.move_layer(layer.id(), before_id.as_deref()) {
                warn!("Failed to move layer {}: {}", layer.id(), e);
            }
        }
        debug!(
            "Moved {} layer(s) of node {} before {:?}",
            drawn.len(),
            self.source.id,
            before_id
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Category, Usage};

    fn template() -> SourceTemplate {
        SourceTemplate::from_base("http://backend")
    }

    fn create(descriptor: &ResourceDescriptor) -> Node {
        Node::create_from_data(descriptor, &template(), &SceneConfig::default()).unwrap()
    }

    #[test]
    fn test_missing_identifier_is_rejected() {
        let descriptor = ResourceDescriptor::new("  ").with_name("nameless");
        let err = Node::create_from_data(&descriptor, &template(), &SceneConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            SceneError::MissingIdentifier {
                name: Some("nameless".to_string())
            }
        );
    }

    #[test]
    fn test_usage_null_is_custom() {
        let node = create(&ResourceDescriptor::new("folder").with_category(Category::Vector));
        assert_eq!(node.kind(), NodeType::Custom);
        assert_eq!(node.layer_kinds(), [LayerKind::Custom]);
        assert!(node.source().url.is_none());
        assert!(node.source_spec().is_none());
    }

    #[test]
    fn test_raster_is_dem_capable() {
        let node = create(
            &ResourceDescriptor::new("dem")
                .with_category(Category::Raster)
                .with_usage(Usage {
                    min_zoom: Some("2".to_string()),
                    max_zoom: Some("14".to_string()),
                    size: Some("512".to_string()),
                    ..Default::default()
                }),
        );
        assert_eq!(node.kind(), NodeType::Raster);
        assert!(node.is_dem_source());
        assert!(node.view_state().is_none());
        assert_eq!(
            node.source_spec(),
            Some(SourceSpec::RasterDem {
                tiles: vec!["http://backend/resource/raster/getRasterTile/dem/{z}/{x}/{y}".to_string()],
                tile_size: 512,
                minzoom: 2,
                maxzoom: 14,
            })
        );
    }

    #[test]
    fn test_vector_subtypes() {
        for (subtype, expected) in [
            (Some("point"), NodeType::Point),
            (Some("line"), NodeType::Line),
            (Some("polygon"), NodeType::Polygon),
            (None, NodeType::Polygon),
        ] {
            let node = create(
                &ResourceDescriptor::new("v")
                    .with_category(Category::Vector)
                    .with_usage(Usage {
                        kind: subtype.map(str::to_string),
                        ..Default::default()
                    }),
            );
            assert_eq!(node.kind(), expected);
            assert!(matches!(node.source_spec(), Some(SourceSpec::Vector { .. })));
        }
    }

    #[test]
    fn test_vector_with_inline_features_uses_geojson_source() {
        let features = serde_json::json!({"type": "FeatureCollection", "features": []});
        let node = create(
            &ResourceDescriptor::new("g")
                .with_category(Category::Vector)
                .with_usage(Usage {
                    kind: Some("line".to_string()),
                    ..Default::default()
                })
                .with_geojson(features.clone()),
        );
        assert!(node.source().is_geojson());
        assert_eq!(node.source_spec(), Some(SourceSpec::Geojson { data: features }));
    }

    #[test]
    fn test_tileset_node() {
        let node = create(
            &ResourceDescriptor::new("city")
                .with_category(Category::Tiles3d)
                .with_usage(Usage::default()),
        );
        assert_eq!(node.kind(), NodeType::ThreeD);
        assert_eq!(node.layer_kinds(), [LayerKind::Tile3d]);
        assert_eq!(
            node.source().url.as_deref(),
            Some("http://backend/resource/3DTiles/city/tileset.json")
        );
        assert_eq!(node.view_state().and_then(|v| v.pitch), Some(70.0));
    }

    #[test]
    fn test_unknown_category_falls_back_to_custom() {
        let node = create(
            &ResourceDescriptor::new("odd")
                .with_category(Category::Other)
                .with_usage(Usage::default()),
        );
        assert_eq!(node.kind(), NodeType::Custom);
        assert_eq!(node.layer_kinds(), [LayerKind::Custom]);
    }

    #[test]
    fn test_layer_ids_are_indexed() {
        let node = create(
            &ResourceDescriptor::new("p")
                .with_category(Category::Vector)
                .with_usage(Usage::default()),
        );
        let ids: Vec<_> = node.layers().iter().map(Layer::id).collect();
        assert_eq!(ids, ["p0", "p1", "p2"]);
    }
}
