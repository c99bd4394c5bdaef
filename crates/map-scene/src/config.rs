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

//! Scene configuration and camera view state.

use serde::{Deserialize, Serialize};

/// Camera view state handed to the map engine's `ease_to`.
///
/// Every field is optional; the engine keeps its current value for any
/// field left unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    /// Map center as `[longitude, latitude]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,
}

impl ViewState {
    /// Create a view state centered on the given longitude/latitude.
    #[must_use]
    pub fn centered(longitude: f64, latitude: f64, zoom: f64) -> Self {
        Self {
            center: Some([longitude, latitude]),
            zoom: Some(zoom),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = Some(pitch);
        self
    }

    #[must_use]
    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = Some(bearing);
        self
    }
}

/// Configuration for a [`Scene`](crate::Scene).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Initial camera view of the scene.
    #[serde(default = "default_view_state")]
    pub view_state: ViewState,

    /// Camera preset attached to underwater raster nodes.
    #[serde(default = "default_underwater_view")]
    pub underwater_view: ViewState,

    /// Camera preset attached to 3D tileset nodes.
    #[serde(default = "default_tileset_view")]
    pub tileset_view: ViewState,

    /// Let a DEM raster claim the terrain when it is drawn.
    #[serde(default = "default_true")]
    pub auto_terrain: bool,

    /// Vertical exaggeration applied when a terrain is set.
    #[serde(default = "default_terrain_exaggeration")]
    pub terrain_exaggeration: f64,

    /// Camera transition used when recentering on a loaded tileset (ms).
    #[serde(default = "default_tileset_transition_ms")]
    pub tileset_transition_ms: u64,

    /// Broadcast channel capacity for scene events.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

// Default value functions for serde
fn default_view_state() -> ViewState {
    ViewState::centered(118.5, 34.5, 7.0)
        .with_pitch(0.0)
        .with_bearing(0.0)
}

fn default_underwater_view() -> ViewState {
    ViewState::centered(120.280_392, 34.303_044, 12.0).with_pitch(0.0)
}

fn default_tileset_view() -> ViewState {
    ViewState::centered(119.134, 34.876, 11.0)
        .with_bearing(-8.81)
        .with_pitch(70.0)
}

fn default_true() -> bool {
    true
}

fn default_terrain_exaggeration() -> f64 {
    1.0
}

fn default_tileset_transition_ms() -> u64 {
    1000
}

fn default_event_channel_capacity() -> usize {
    256
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            view_state: default_view_state(),
            underwater_view: default_underwater_view(),
            tileset_view: default_tileset_view(),
            auto_terrain: true,
            terrain_exaggeration: default_terrain_exaggeration(),
            tileset_transition_ms: default_tileset_transition_ms(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}
