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

//! Error types for scene construction and engine calls.

use thiserror::Error;

/// Errors raised while building a scene from a resource tree.
///
/// Only invalid input surfaces as an error. Unknown node ids, inactive nodes
/// and a detached engine are reported as "no effect" by the scene operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("resource descriptor has no identifier (name: {name:?})")]
    MissingIdentifier { name: Option<String> },

    #[error("duplicate node identifier: {0}")]
    DuplicateNode(String),

    #[error("scene has already been loaded from a resource tree")]
    AlreadyLoaded,
}

/// Errors reported by a [`MapEngine`](crate::engine::MapEngine) implementation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("source already exists: {0}")]
    DuplicateSource(String),

    #[error("layer already exists: {0}")]
    DuplicateLayer(String),

    #[error("source does not exist: {0}")]
    MissingSource(String),

    #[error("layer does not exist: {0}")]
    MissingLayer(String),

    #[error("source {source_id} is still used by layer {layer_id}")]
    SourceInUse { source_id: String, layer_id: String },
}
