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

//! Headless engines.
//!
//! [`InMemoryMap`] keeps sources, layers and terrain the way a real map engine
//! would, including its refusal to remove a source that is still referenced.
//! Every mutating call is recorded so callers can inspect what was sent.

use std::cell::Cell;
use std::collections::HashMap;

use serde_json::{json, Map, Value};

use super::overlay::{OverlayEntry, OverlayRenderer, TilesetCallbacks, ViewTransition};
use super::{LayerSpec, MapEngine, SourceSpec, TerrainSpec};
use crate::config::ViewState;
use crate::error::EngineError;

/// A mutating call received by [`InMemoryMap`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    AddSource(String),
    RemoveSource(String),
    AddLayer(String),
    RemoveLayer(String),
    SetLayoutProperty { id: String, property: String, value: Value },
    MoveLayer { id: String, before_id: Option<String> },
    SetTerrain(Option<String>),
    EaseTo(ViewState),
}

/// In-memory 2D map engine.
#[derive(Debug, Default)]
pub struct InMemoryMap {
    sources: HashMap<String, SourceSpec>,
    /// Bottom to top.
    layers: Vec<LayerSpec>,
    terrain: Option<TerrainSpec>,
    camera: Option<ViewState>,
    calls: Vec<EngineCall>,
    queries: Cell<usize>,
}

impl InMemoryMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer identifiers in draw order, bottom to top.
    #[must_use]
    pub fn layer_order(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.id.as_str()).collect()
    }

    #[must_use]
    pub fn source(&self, id: &str) -> Option<&SourceSpec> {
        self.sources.get(id)
    }

    #[must_use]
    pub fn source_ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.sources.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    /// Layout `visibility` of a layer; layers default to `"visible"`.
    #[must_use]
    pub fn visibility(&self, id: &str) -> Option<&str> {
        self.layer(id).map(|layer| {
            layer
                .layout
                .get("visibility")
                .and_then(Value::as_str)
                .unwrap_or("visible")
        })
    }

    /// Last view state passed to `ease_to`.
    #[must_use]
    pub fn camera(&self) -> Option<&ViewState> {
        self.camera.as_ref()
    }

    /// Mutating calls received so far.
    #[must_use]
    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    /// Number of read calls received so far.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries.get()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
        self.queries.set(0);
    }

    /// Drawing state as JSON, for display.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        let mut sources = Map::new();
        for id in self.source_ids() {
            sources.insert(id.to_string(), json!(self.sources[id]));
        }
        json!({
            "sources": sources,
            "layers": self.layers,
            "terrain": self.terrain,
            "camera": self.camera,
        })
    }

    fn query(&self) {
        self.queries.set(self.queries.get() + 1);
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id == id)
    }
}

impl MapEngine for InMemoryMap {
    fn add_source(&mut self, id: &str, spec: SourceSpec) -> Result<(), EngineError> {
        self.calls.push(EngineCall::AddSource(id.to_string()));
        if self.sources.contains_key(id) {
            return Err(EngineError::DuplicateSource(id.to_string()));
        }
        self.sources.insert(id.to_string(), spec);
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), EngineError> {
        self.calls.push(EngineCall::RemoveSource(id.to_string()));
        if !self.sources.contains_key(id) {
            return Err(EngineError::MissingSource(id.to_string()));
        }
        if let Some(layer) = self.layers.iter().find(|layer| layer.source == id) {
            return Err(EngineError::SourceInUse {
                source_id: id.to_string(),
                layer_id: layer.id.clone(),
            });
        }
        if self.terrain.as_ref().is_some_and(|terrain| terrain.source == id) {
            return Err(EngineError::SourceInUse {
                source_id: id.to_string(),
                layer_id: "terrain".to_string(),
            });
        }
        self.sources.remove(id);
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool {
        self.query();
        self.sources.contains_key(id)
    }

    fn add_layer(&mut self, spec: LayerSpec) -> Result<(), EngineError> {
        self.calls.push(EngineCall::AddLayer(spec.id.clone()));
        if self.position(&spec.id).is_some() {
            return Err(EngineError::DuplicateLayer(spec.id));
        }
        if !self.sources.contains_key(&spec.source) {
            return Err(EngineError::MissingSource(spec.source));
        }
        self.layers.push(spec);
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), EngineError> {
        self.calls.push(EngineCall::RemoveLayer(id.to_string()));
        let index = self
            .position(id)
            .ok_or_else(|| EngineError::MissingLayer(id.to_string()))?;
        self.layers.remove(index);
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.query();
        self.position(id).is_some()
    }

    fn set_layout_property(
        &mut self,
        id: &str,
        property: &str,
        value: Value,
    ) -> Result<(), EngineError> {
        self.calls.push(EngineCall::SetLayoutProperty {
            id: id.to_string(),
            property: property.to_string(),
            value: value.clone(),
        });
        let index = self
            .position(id)
            .ok_or_else(|| EngineError::MissingLayer(id.to_string()))?;
        let layout = &mut self.layers[index].layout;
        if !layout.is_object() {
            *layout = Value::Object(Map::new());
        }
        if let Some(object) = layout.as_object_mut() {
            object.insert(property.to_string(), value);
        }
        Ok(())
    }

    fn move_layer(&mut self, id: &str, before_id: Option<&str>) -> Result<(), EngineError> {
        self.calls.push(EngineCall::MoveLayer {
            id: id.to_string(),
            before_id: before_id.map(str::to_string),
        });
        let from = self
            .position(id)
            .ok_or_else(|| EngineError::MissingLayer(id.to_string()))?;
        if let Some(before) = before_id {
            if self.position(before).is_none() {
                return Err(EngineError::MissingLayer(before.to_string()));
            }
        }
        if before_id == Some(id) {
            return Ok(());
        }

        let layer = self.layers.remove(from);
        let to = before_id
            .and_then(|before| self.position(before))
            .unwrap_or(self.layers.len());
        self.layers.insert(to, layer);
        Ok(())
    }

    fn terrain(&self) -> Option<TerrainSpec> {
        self.query();
        self.terrain.clone()
    }

    fn set_terrain(&mut self, terrain: Option<TerrainSpec>) {
        self.calls.push(EngineCall::SetTerrain(
            terrain.as_ref().map(|terrain| terrain.source.clone()),
        ));
        self.terrain = terrain;
    }

    fn ease_to(&mut self, view: &ViewState) {
        self.calls.push(EngineCall::EaseTo(view.clone()));
        self.camera = Some(view.clone());
    }
}

/// In-memory 3D overlay renderer.
#[derive(Debug, Default)]
pub struct InMemoryOverlay {
    layers: Vec<OverlayEntry>,
    view: Option<ViewTransition>,
    updates: usize,
}

impl InMemoryOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entry(&self, id: &str) -> Option<&OverlayEntry> {
        self.layers.iter().find(|entry| entry.id == id)
    }

    #[must_use]
    pub fn entry_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|entry| entry.id.as_str()).collect()
    }

    /// Callbacks of an entry, as a renderer would hold them while loading.
    #[must_use]
    pub fn callbacks(&self, id: &str) -> Option<TilesetCallbacks> {
        self.entry(id).map(|entry| entry.callbacks.clone())
    }

    /// Last camera move requested by a tileset callback.
    #[must_use]
    pub fn view(&self) -> Option<ViewTransition> {
        self.view
    }

    /// Number of `set_layers` calls received.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.updates
    }
}

impl OverlayRenderer for InMemoryOverlay {
    fn layers(&self) -> &[OverlayEntry] {
        &self.layers
    }

    fn set_layers(&mut self, layers: Vec<OverlayEntry>) {
        self.updates += 1;
        self.layers = layers;
    }

    fn set_initial_view_state(&mut self, view: ViewTransition) {
        self.view = Some(view);
    }
}
