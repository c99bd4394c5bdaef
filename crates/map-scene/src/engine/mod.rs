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

//! Rendering engine abstraction.
//!
//! The scene never draws anything itself. It issues source/layer commands to a
//! 2D [`MapEngine`] and hands 3D tileset entries to an [`OverlayRenderer`].
//! Both are external collaborators; this module defines the calls the scene
//! makes and the payloads it sends.
//!
//! Headless implementations live in [`memory`] and back the CLI and the tests.

pub mod memory;
pub mod overlay;

pub use memory::{EngineCall, InMemoryMap, InMemoryOverlay};
pub use overlay::{
    OverlayEntry, OverlayHandle, OverlayRenderer, TilesetCallbacks, TilesetMetadata,
    TilesetOptions, ViewTransition, WeakOverlayHandle,
};

use serde::Serialize;
use serde_json::Value;

use crate::config::ViewState;
use crate::error::EngineError;

/// Source registration payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SourceSpec {
    /// Elevation tiles usable for shaded relief and terrain.
    RasterDem {
        tiles: Vec<String>,
        #[serde(rename = "tileSize")]
        tile_size: u32,
        minzoom: u8,
        maxzoom: u8,
    },
    /// Plain image tiles.
    Raster {
        tiles: Vec<String>,
        #[serde(rename = "tileSize")]
        tile_size: u32,
        minzoom: u8,
        maxzoom: u8,
    },
    /// Mapbox vector tiles.
    Vector {
        scheme: String,
        tiles: Vec<String>,
        minzoom: u8,
        maxzoom: u8,
    },
    /// Standalone feature collection.
    Geojson { data: Value },
}

/// Shape a layer is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawKind {
    Circle,
    Line,
    Fill,
    Symbol,
    Raster,
    Hillshade,
}

/// Layer registration payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DrawKind,
    pub source: String,
    #[serde(rename = "source-layer", skip_serializing_if = "Option::is_none")]
    pub source_layer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<u8>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub layout: Value,
    pub paint: Value,
}

/// Terrain setting of the map engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerrainSpec {
    /// Identifier of the `raster-dem` source providing elevation.
    pub source: String,
    pub exaggeration: f64,
}

/// Commands the scene issues to the 2D map engine.
///
/// Implementations own all drawing state. The scene reads back through
/// [`has_source`](Self::has_source), [`has_layer`](Self::has_layer) and
/// [`terrain`](Self::terrain) rather than keeping its own copy.
pub trait MapEngine {
    fn add_source(&mut self, id: &str, spec: SourceSpec) -> Result<(), EngineError>;

    fn remove_source(&mut self, id: &str) -> Result<(), EngineError>;

    fn has_source(&self, id: &str) -> bool;

    /// Add a layer on top of the current draw order.
    fn add_layer(&mut self, spec: LayerSpec) -> Result<(), EngineError>;

    fn remove_layer(&mut self, id: &str) -> Result<(), EngineError>;

    fn has_layer(&self, id: &str) -> bool;

    fn set_layout_property(&mut self, id: &str, property: &str, value: Value)
        -> Result<(), EngineError>;

    /// Move a layer directly below `before_id`, or to the top when `None`.
    fn move_layer(&mut self, id: &str, before_id: Option<&str>) -> Result<(), EngineError>;

    fn terrain(&self) -> Option<TerrainSpec>;

    /// Set or clear (`None`) the terrain.
    fn set_terrain(&mut self, terrain: Option<TerrainSpec>);

    /// Animate the camera to a view state.
    fn ease_to(&mut self, view: &ViewState);
}
