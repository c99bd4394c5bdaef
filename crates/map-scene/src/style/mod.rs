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

//! Paint and layout payloads.
//!
//! The payloads are opaque to the scene: they are built here as JSON values in
//! the map engine's style language and forwarded verbatim.

use log::warn;
use serde_json::{json, Map, Value};

use crate::layer::LayerKind;

/// Derive the paint payload for a layer kind.
///
/// `is_geojson` selects the palette used for standalone feature collections
/// instead of tiled vector sources. Kinds without a paint style get an empty
/// object and a warning.
#[must_use]
pub fn paint(kind: LayerKind, is_geojson: bool) -> Value {
    match (kind, is_geojson) {
        (LayerKind::Point, true) => json!({
            "circle-radius": 8,
            "circle-color": "#D44F69",
            "circle-opacity": 1,
            "circle-stroke-width": 2,
            "circle-stroke-color": "#ffffff"
        }),
        (LayerKind::Point, false) => json!({
            "circle-radius": 4,
            "circle-color": "#5186D8",
            "circle-opacity": 0.8,
            "circle-stroke-width": 1,
            "circle-stroke-color": "#ffffff"
        }),
        (LayerKind::Line, true) => json!({
            "line-width": 3,
            "line-color": "#F71A00"
        }),
        (LayerKind::Line, false) => json!({
            "line-width": 2,
            "line-color": "#029BDD",
            "line-opacity": 0.8
        }),
        (LayerKind::Polygon, true) => json!({
            "fill-color": "#E76B50",
            "fill-opacity": 0.6,
            "fill-outline-color": "#F71A00"
        }),
        (LayerKind::Polygon, false) => json!({
            "fill-color": "#04EB13",
            "fill-opacity": 0.6,
            "fill-outline-color": "#000000"
        }),
        (LayerKind::Label, _) => json!({
            "text-color": "#630080",
            "text-halo-color": "#fff",
            "text-opacity": ["step", ["zoom"], 0, 10, 1],
            "text-halo-width": ["interpolate", ["linear"], ["zoom"], 1, 0, 5, 0.2, 9, 0.1, 10, 0.5, 22, 1]
        }),
        (LayerKind::Raster, _) => json!({
            "raster-opacity": 1
        }),
        (LayerKind::Custom | LayerKind::Tile3d, _) => {
            warn!("Unsupported geometry type for paint: {kind:?}");
            Value::Object(Map::new())
        }
    }
}

/// Shaded-relief paint for DEM rasters.
#[must_use]
pub fn hillshade_paint() -> Value {
    json!({
        "hillshade-accent-color": "#5a5a5a",
        "hillshade-exaggeration": 0.5,
        "hillshade-highlight-color": "#FFFFFF",
        "hillshade-illumination-anchor": "viewport",
        "hillshade-illumination-direction": 335,
        "hillshade-shadow-color": "#5a5a5a"
    })
}

/// Symbol layout for feature labels bound to `label_field`.
#[must_use]
pub fn label_layout(label_field: Option<&str>) -> Value {
    json!({
        "text-field": ["get", label_field],
        "text-font": ["Open Sans Bold", "Arial Unicode MS Bold"],
        "text-size": ["interpolate", ["linear"], ["zoom"], 2, 0, 5, 7, 15, 12, 22, 28],
        "text-offset": [0, 1.5],
        "text-max-width": 10,
        "symbol-sort-key": 999
    })
}
