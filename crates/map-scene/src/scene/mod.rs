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

//! The scene: node collection, camera and terrain of one map canvas.
//!
//! The scene is the only entry point the UI uses. Operations that reference an
//! unknown node, or a node already in the requested state, report `false`
//! instead of failing. The terrain is never stored here: it is read from and
//! written to the map engine, which stays the single source of truth.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use tokio::sync::broadcast;

use crate::config::{SceneConfig, ViewState};
use crate::engine::{MapEngine, OverlayHandle, TerrainSpec};
use crate::error::SceneError;
use crate::layer::DrawContext;
use crate::node::Node;
use crate::resource::{self, ResourceDescriptor, SourceTemplate};

/// Events emitted by the scene when node or terrain state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneEvent {
    /// A node's source and layers were drawn.
    NodeLoaded(String),
    /// A node's source and layers were removed.
    NodeRemoved(String),
    /// A node's layers were reordered before another node (`None` = top).
    NodeMoved { id: String, before: Option<String> },
    /// The engine terrain was set to a source, or cleared.
    TerrainChanged(Option<String>),
}

/// Layer scene of one map canvas.
pub struct Scene<M> {
    nodes: Vec<Node>,
    node_status: HashMap<String, bool>,
    view_state: ViewState,
    map: Option<M>,
    overlay: Option<OverlayHandle>,
    template: SourceTemplate,
    config: SceneConfig,
    loaded: bool,
    event_tx: broadcast::Sender<SceneEvent>,
}

impl<M> std::fmt::Debug for Scene<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("node_count", &self.nodes.len())
            .field("active", &self.nodes.iter().filter(|n| n.is_active()).count())
            .field("map_attached", &self.map.is_some())
            .field("overlay_attached", &self.overlay.is_some())
            .field("view_state", &self.view_state)
            .finish_non_exhaustive()
    }
}

impl<M: MapEngine> Scene<M> {
    /// Create an empty scene with no engines attached.
    #[must_use]
    pub fn new(template: SourceTemplate, config: SceneConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity.max(1));
        Self {
            nodes: Vec::new(),
            node_status: HashMap::new(),
            view_state: config.view_state.clone(),
            map: None,
            overlay: None,
            template,
            config,
            loaded: false,
            event_tx,
        }
    }

    /// Create a scene drawing into the given engines.
    #[must_use]
    pub fn with_engines(
        template: SourceTemplate,
        config: SceneConfig,
        map: M,
        overlay: Option<OverlayHandle>,
    ) -> Self {
        let mut scene = Self::new(template, config);
        scene.attach_map(map);
        if let Some(overlay) = overlay {
            scene.attach_overlay(overlay);
        }
        scene
    }

    pub fn attach_map(&mut self, map: M) {
        self.map = Some(map);
    }

    /// Detach the map engine. Nodes keep their state; engine calls become
    /// no-ops until an engine is attached again.
    pub fn detach_map(&mut self) -> Option<M> {
        self.map.take()
    }

    #[must_use]
    pub fn map(&self) -> Option<&M> {
        self.map.as_ref()
    }

    pub fn map_mut(&mut self) -> Option<&mut M> {
        self.map.as_mut()
    }

    pub fn attach_overlay(&mut self, overlay: OverlayHandle) {
        self.overlay = Some(overlay);
    }

    pub fn detach_overlay(&mut self) -> Option<OverlayHandle> {
        self.overlay.take()
    }

    #[must_use]
    pub fn overlay(&self) -> Option<&OverlayHandle> {
        self.overlay.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Subscribe to scene events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SceneEvent> {
        self.event_tx.subscribe()
    }

    /// Build every node of a resource tree, all inactive.
    ///
    /// Nothing is drawn. Fails on a descriptor without identifier, on
    /// duplicate identifiers, or when the scene was already loaded; in those
    /// cases the scene is left empty.
    pub fn load_from_data(&mut self, tree: &[ResourceDescriptor]) -> Result<usize, SceneError> {
        if self.loaded {
            return Err(SceneError::AlreadyLoaded);
        }

        let mut nodes = Vec::new();
        let mut seen = HashSet::new();
        for descriptor in resource::flatten(tree) {
            let node = Node::create_from_data(descriptor, &self.template, &self.config)?;
            if !seen.insert(node.id().to_string()) {
                return Err(SceneError::DuplicateNode(node.id().to_string()));
            }
            nodes.push(node);
        }

        for node in &nodes {
            self.node_status.insert(node.id().to_string(), false);
        }
        self.nodes = nodes;
        self.loaded = true;
        info!("Scene loaded with {} node(s)", self.nodes.len());
        Ok(self.nodes.len())
    }

    /// Nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn find_node_by_id(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id() == id)
    }

    pub fn find_node_by_id_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id() == id)
    }

    #[must_use]
    pub fn find_node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name() == Some(name))
    }

    /// Desired on/off status per node.
    #[must_use]
    pub fn node_status(&self) -> &HashMap<String, bool> {
        &self.node_status
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.id() == id)
    }

    /// Activate a node. Returns whether its state changed.
    pub fn load_node(&mut self, id: &str) -> bool {
        let Some(index) = self.position(id) else {
            debug!("load_node: no node {}", id);
            return false;
        };
        let mut ctx = DrawContext {
            map: self.map.as_mut().map(|map| map as &mut dyn MapEngine),
            overlay: self.overlay.as_ref(),
            config: &self.config,
        };
        if !self.nodes[index].load_all(&mut ctx) {
            return false;
        }
        self.node_status.insert(id.to_string(), true);
        let _ = self.event_tx.send(SceneEvent::NodeLoaded(id.to_string()));
        if self.nodes[index].is_dem_source() && self.terrain_id().as_deref() == Some(id) {
            let _ = self
                .event_tx
                .send(SceneEvent::TerrainChanged(Some(id.to_string())));
        }
        true
    }

    /// Deactivate a node. Returns whether its state changed.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let Some(index) = self.position(id) else {
            debug!("remove_node: no node {}", id);
            return false;
        };
        let had_terrain = self.terrain_id().is_some_and(|terrain| terrain == id);
        let mut ctx = DrawContext {
            map: self.map.as_mut().map(|map| map as &mut dyn MapEngine),
            overlay: self.overlay.as_ref(),
            config: &self.config,
        };
        if !self.nodes[index].remove_all(&mut ctx) {
            return false;
        }
        self.node_status.insert(id.to_string(), false);
        if had_terrain {
            let _ = self.event_tx.send(SceneEvent::TerrainChanged(None));
        }
        let _ = self.event_tx.send(SceneEvent::NodeRemoved(id.to_string()));
        true
    }

    /// Show the layers of an active node.
    pub fn open_node(&mut self, id: &str) -> bool {
        self.toggle_node(id, true)
    }

    /// Hide the layers of an active node without undrawing them.
    pub fn close_node(&mut self, id: &str) -> bool {
        self.toggle_node(id, false)
    }

    fn toggle_node(&mut self, id: &str, visible: bool) -> bool {
        let Some(index) = self.position(id) else {
            debug!("toggle_node: no node {}", id);
            return false;
        };
        let mut ctx = DrawContext {
            map: self.map.as_mut().map(|map| map as &mut dyn MapEngine),
            overlay: self.overlay.as_ref(),
            config: &self.config,
        };
        let node = &mut self.nodes[index];
        if visible {
            node.open_all(&mut ctx)
        } else {
            node.close_all(&mut ctx)
        }
    }

    /// Move an active node's layers below those of `before_id`, or to the top
    /// of the draw order when `before_id` is `None` or unknown.
    pub fn move_node(&mut self, id: &str, before_id: Option<&str>) -> bool {
        let Some(node) = self.nodes.iter().find(|node| node.id() == id) else {
            debug!("move_node: no node {}", id);
            return false;
        };
        let Some(map) = self.map.as_mut() else {
            debug!("Map engine not ready, cannot move node {}", id);
            return false;
        };
        let target = before_id.and_then(|before| self.nodes.iter().find(|node| node.id() == before));
        if before_id.is_some() && target.is_none() {
            debug!("move_node: unknown target {:?}, moving {} to top", before_id, id);
        }
        if !node.move_before(target, map) {
            return false;
        }
        let _ = self.event_tx.send(SceneEvent::NodeMoved {
            id: id.to_string(),
            before: target.map(|target| target.id().to_string()),
        });
        true
    }

    /// Apply desired on/off statuses, loading or removing nodes whose state
    /// differs. Returns how many nodes changed.
    ///
    /// The status map follows actual node state, so an update that could not
    /// be applied (no engine attached) leaves the recorded status unchanged.
    pub fn set_status<I, S>(&mut self, updates: I) -> usize
    where
        I: IntoIterator<Item = (S, bool)>,
        S: AsRef<str>,
    {
        let mut changed = 0;
        for (id, desired) in updates {
            let id = id.as_ref();
            if !self.node_status.contains_key(id) {
                warn!("set_status: no node {}", id);
                continue;
            }
            let did_change = if desired {
                self.load_node(id)
            } else {
                self.remove_node(id)
            };
            if did_change {
                changed += 1;
            }
        }
        changed
    }

    /// Deactivate every active node. Returns how many were removed.
    pub fn remove_all_nodes(&mut self) -> usize {
        let active: Vec<String> = self
            .nodes
            .iter()
            .filter(|node| node.is_active())
            .map(|node| node.id().to_string())
            .collect();
        active.iter().filter(|id| self.remove_node(id)).count()
    }

    /// Identifier of the source currently backing the engine terrain.
    #[must_use]
    pub fn terrain_id(&self) -> Option<String> {
        self.map
            .as_ref()
            .and_then(MapEngine::terrain)
            .map(|terrain| terrain.source)
    }

    /// Set the terrain to a registered source, or clear it with `None`.
    ///
    /// Returns `false`, leaving the terrain untouched, when the source is not
    /// registered with the engine or no engine is attached.
    pub fn set_terrain_id(&mut self, id: Option<&str>) -> bool {
        let exaggeration = self.config.terrain_exaggeration;
        let Some(map) = self.map.as_mut() else {
            debug!("Map engine not ready, cannot set terrain");
            return false;
        };
        match id {
            None => {
                map.set_terrain(None);
                info!("Terrain cleared");
            }
            Some(id) => {
                if !map.has_source(id) {
                    warn!("Cannot set terrain: source {} not registered", id);
                    return false;
                }
                map.set_terrain(Some(TerrainSpec {
                    source: id.to_string(),
                    exaggeration,
                }));
                info!("Terrain set to {}", id);
            }
        }
        let _ = self
            .event_tx
            .send(SceneEvent::TerrainChanged(id.map(str::to_string)));
        true
    }

    #[must_use]
    pub fn view_state(&self) -> &ViewState {
        &self.view_state
    }

    pub fn set_view_state(&mut self, view_state: ViewState) {
        self.view_state = view_state;
    }

    /// Animate the camera to the scene's view state.
    pub fn fly_to_this(&mut self) {
        match self.map.as_mut() {
            Some(map) => map.ease_to(&self.view_state),
            None => debug!("Map engine not ready, cannot fly to scene view"),
        }
    }

    /// Animate the camera to a node's preset. Returns `false` when the node is
    /// unknown or has no preset.
    pub fn fly_to_node(&mut self, id: &str) -> bool {
        let Some(view) = self.find_node_by_id(id).and_then(Node::view_state).cloned() else {
            return false;
        };
        let Some(map) = self.map.as_mut() else {
            debug!("Map engine not ready, cannot fly to node {}", id);
            return false;
        };
        map.ease_to(&view);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InMemoryMap;
    use crate::resource::{Category, Usage};

    fn scene() -> Scene<InMemoryMap> {
        Scene::with_engines(
            SourceTemplate::from_base("http://backend"),
            SceneConfig::default(),
            InMemoryMap::new(),
            None,
        )
    }

    fn vector(id: &str, subtype: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(id)
            .with_name(format!("{id}-name"))
            .with_category(Category::Vector)
            .with_usage(Usage {
                kind: Some(subtype.to_string()),
                visualization_field: Some("name".to_string()),
                ..Default::default()
            })
    }

    #[test]
    fn test_load_from_data_draws_nothing() {
        let mut scene = scene();
        let tree = vec![vector("a", "point").with_child(vector("b", "line"))];
        assert_eq!(scene.load_from_data(&tree), Ok(2));
        assert!(scene.nodes().iter().all(|node| !node.is_active()));
        assert_eq!(scene.node_status().get("b"), Some(&false));
        assert!(scene.map().unwrap().calls().is_empty());
    }

    #[test]
    fn test_load_from_data_only_once() {
        let mut scene = scene();
        scene.load_from_data(&[vector("a", "point")]).unwrap();
        assert_eq!(
            scene.load_from_data(&[vector("b", "point")]),
            Err(SceneError::AlreadyLoaded)
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut scene = scene();
        let tree = vec![vector("a", "point"), vector("a", "line")];
        assert_eq!(
            scene.load_from_data(&tree),
            Err(SceneError::DuplicateNode("a".to_string()))
        );
        assert!(scene.nodes().is_empty());
    }

    #[test]
    fn test_find_by_name() {
        let mut scene = scene();
        scene.load_from_data(&[vector("a", "point")]).unwrap();
        assert_eq!(scene.find_node_by_name("a-name").map(Node::id), Some("a"));
        assert!(scene.find_node_by_name("nope").is_none());
    }

    #[test]
    fn test_set_status_batches_loads() {
        let mut scene = scene();
        scene
            .load_from_data(&[vector("a", "point"), vector("b", "line")])
            .unwrap();
        assert_eq!(scene.set_status([("a", true), ("b", true), ("zz", true)]), 2);
        assert_eq!(scene.set_status([("a", true), ("b", false)]), 1);
        assert!(scene.find_node_by_id("a").unwrap().is_active());
        assert!(!scene.find_node_by_id("b").unwrap().is_active());
        assert_eq!(scene.node_status().get("b"), Some(&false));
    }

    #[test]
    fn test_events_are_broadcast() {
        let mut scene = scene();
        let mut rx = scene.subscribe();
        scene.load_from_data(&[vector("a", "point")]).unwrap();
        scene.load_node("a");
        scene.move_node("a", None);
        scene.remove_node("a");
        assert_eq!(rx.try_recv().unwrap(), SceneEvent::NodeLoaded("a".to_string()));
        assert_eq!(
            rx.try_recv().unwrap(),
            SceneEvent::NodeMoved {
                id: "a".to_string(),
                before: None
            }
        );
        assert_eq!(rx.try_recv().unwrap(), SceneEvent::NodeRemoved("a".to_string()));
    }

    #[test]
    fn test_detached_engine_is_noop() {
        let mut scene = scene();
        scene.load_from_data(&[vector("a", "point")]).unwrap();
        let map = scene.detach_map().unwrap();
        assert!(!scene.load_node("a"));
        assert!(!scene.set_terrain_id(None));
        assert_eq!(scene.terrain_id(), None);
        scene.fly_to_this();
        scene.attach_map(map);
        assert!(scene.load_node("a"));
    }

    #[test]
    fn test_toggle_without_engine_reports_no_effect() {
        let mut scene = scene();
        scene.load_from_data(&[vector("a", "line")]).unwrap();
        assert!(scene.load_node("a"));
        let map = scene.detach_map().unwrap();
        assert!(!scene.close_node("a"));
        assert!(!scene.open_node("a"));
        scene.attach_map(map);
        assert!(scene.close_node("a"));
        assert_eq!(scene.map().unwrap().visibility("a0"), Some("none"));
    }

    #[test]
    fn test_set_status_tracks_applied_state() {
        let mut scene = scene();
        scene.load_from_data(&[vector("a", "point")]).unwrap();
        let map = scene.detach_map().unwrap();
        assert_eq!(scene.set_status([("a", true)]), 0);
        assert_eq!(scene.node_status().get("a"), Some(&false));

        scene.attach_map(map);
        assert_eq!(scene.set_status([("a", true)]), 1);
        assert_eq!(scene.node_status().get("a"), Some(&true));
    }

    #[test]
    fn test_fly_to_this_passes_view_state() {
        let mut scene = scene();
        scene.fly_to_this();
        assert_eq!(
            scene.map().unwrap().camera(),
            Some(&SceneConfig::default().view_state)
        );
    }
}
