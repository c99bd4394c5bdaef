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

//! Layer management for tiled web map scenes.
//!
//! This library turns a backend's tree of map resources into drawable nodes
//! and keeps a 2D map engine (and an optional 3D tileset overlay) in sync with
//! the nodes the user switches on. It is organized in layers that can be used
//! on their own:
//!
//! - **Resource layer**: descriptor tree deserialization and tile address templates
//! - **Style layer**: paint/layout payloads per layer kind
//! - **Engine layer**: the [`MapEngine`] and [`OverlayRenderer`] traits, plus
//!   headless in-memory implementations
//! - **Scene layer**: [`Layer`], [`Node`] and [`Scene`] lifecycle, ordering and terrain
//!
//! # Quick Start
//!
//! ```
//! use map_scene::{InMemoryMap, Scene, SceneConfig, SourceTemplate};
//!
//! let tree = map_scene::parse_tree(
//!     r#"[{"id": "n1", "name": "stations", "category": "vector",
//!          "usage": {"type": "point", "visualizationField": "name"}}]"#,
//! )
//! .unwrap();
//!
//! let mut scene = Scene::with_engines(
//!     SourceTemplate::from_base("http://localhost:8080/api"),
//!     SceneConfig::default(),
//!     InMemoryMap::new(),
//!     None,
//! );
//! scene.load_from_data(&tree).unwrap();
//!
//! assert!(scene.load_node("n1"));
//! assert!(!scene.load_node("n1"));
//! assert_eq!(scene.map().unwrap().layer_order(), ["n10", "n11"]);
//! ```
//!
//! # Custom Layers
//!
//! Resources the library cannot classify get a custom layer whose lifecycle
//! is exposed through hooks:
//!
//! ```
//! use map_scene::{InMemoryMap, LifecycleEvent, ResourceDescriptor, Scene, SceneConfig, SourceTemplate};
//!
//! let mut scene = Scene::with_engines(
//!     SourceTemplate::from_base("http://localhost:8080/api"),
//!     SceneConfig::default(),
//!     InMemoryMap::new(),
//!     None,
//! );
//! scene.load_from_data(&[ResourceDescriptor::new("folder")]).unwrap();
//!
//! if let Some(hooks) = scene.find_node_by_id_mut("folder").and_then(|n| n.custom_hooks_mut()) {
//!     hooks.on(LifecycleEvent::Load, |event| println!("loaded {}", event.layer_id));
//! }
//! scene.load_node("folder");
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod layer;
pub mod node;
pub mod resource;
pub mod scene;
pub mod style;

pub use config::{SceneConfig, ViewState};
pub use engine::{
    EngineCall, InMemoryMap, InMemoryOverlay, MapEngine, OverlayEntry, OverlayHandle,
    OverlayRenderer, TerrainSpec, TilesetCallbacks, TilesetMetadata,
};
pub use error::{EngineError, SceneError};
pub use layer::{CustomLayerEvent, DrawContext, Hooks, Layer, LayerKind, LifecycleEvent};
pub use node::{Node, NodeSource, NodeType};
pub use resource::{flatten, parse_tree, Category, ResourceDescriptor, SourceTemplate, Usage};
pub use scene::{Scene, SceneEvent};
