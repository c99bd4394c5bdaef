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

//! Scene state output for the command line.

use std::fmt::Write as _;

use log::info;
use map_scene::{InMemoryMap, InMemoryOverlay, MapEngine, Scene, SceneEvent};
use serde_json::{json, Value};
use tokio::sync::broadcast;

/// Log the scene events queued so far.
pub fn log_events(mut events: broadcast::Receiver<SceneEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            SceneEvent::NodeLoaded(id) => info!("event: node {} loaded", id),
            SceneEvent::NodeRemoved(id) => info!("event: node {} removed", id),
            SceneEvent::NodeMoved { id, before } => {
                info!("event: node {} moved before {}", id, before.as_deref().unwrap_or("top"));
            }
            SceneEvent::TerrainChanged(source) => {
                info!("event: terrain {}", source.as_deref().unwrap_or("cleared"));
            }
        }
    }
}

fn nodes_json(scene: &Scene<InMemoryMap>) -> Value {
    scene
        .nodes()
        .iter()
        .map(|node| {
            json!({
                "id": node.id(),
                "name": node.name(),
                "type": node.kind(),
                "active": node.is_active(),
                "layers": node.layer_kinds(),
            })
        })
        .collect()
}

/// Nodes, engine state and overlay entries as pretty-printed JSON.
pub fn to_json(
    scene: &Scene<InMemoryMap>,
    map: &InMemoryMap,
    overlay: &InMemoryOverlay,
) -> Result<String, serde_json::Error> {
    let state = json!({
        "nodes": nodes_json(scene),
        "map": map.snapshot(),
        "overlay": overlay.entry_ids(),
    });
    serde_json::to_string_pretty(&state)
}

/// Human-readable summary of nodes and draw order.
#[must_use]
pub fn to_text(scene: &Scene<InMemoryMap>, map: &InMemoryMap, overlay: &InMemoryOverlay) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Nodes:");
    for node in scene.nodes() {
        let kinds: Vec<String> = node
            .layer_kinds()
            .iter()
            .map(|kind| format!("{kind:?}").to_lowercase())
            .collect();
        let _ = writeln!(
            out,
            "  [{}] {:<16} {:<10} {:<24} {}",
            if node.is_active() { "x" } else { " " },
            node.id(),
            format!("{:?}", node.kind()).to_lowercase(),
            kinds.join(","),
            node.name().unwrap_or("-"),
        );
    }

    let _ = writeln!(out, "Draw order (bottom to top):");
    for id in map.layer_order() {
        let visibility = map.visibility(id).unwrap_or("visible");
        let _ = writeln!(out, "  {id} ({visibility})");
    }

    let terrain = map.terrain().map_or_else(|| "none".to_string(), |terrain| terrain.source);
    let _ = writeln!(out, "Terrain: {terrain}");

    let entries = overlay.entry_ids();
    if !entries.is_empty() {
        let _ = writeln!(out, "Overlay: {}", entries.join(", "));
    }
    if let Some(camera) = map.camera() {
        let _ = writeln!(out, "Camera: {camera:?}");
    }
    out
}
