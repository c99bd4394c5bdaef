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

//! Resource classification.

use std::str::FromStr;

use log::{debug, warn};

use super::{NodeSource, NodeType};
use crate::config::{SceneConfig, ViewState};
use crate::layer::LayerKind;
use crate::resource::{Category, ResourceDescriptor, SourceTemplate};

const DEFAULT_MIN_ZOOM: u8 = 0;
const DEFAULT_MAX_ZOOM: u8 = 18;
const DEFAULT_TILE_SIZE: u32 = 256;

/// Result of classifying one descriptor.
#[derive(Debug)]
pub(super) struct Classified {
    pub kind: NodeType,
    pub source: NodeSource,
    pub view_state: Option<ViewState>,
}

/// Layer kinds owned by a node type, in draw order.
#[must_use]
pub fn layer_kinds(kind: NodeType) -> &'static [LayerKind] {
    match kind {
        NodeType::Point => &[LayerKind::Point, LayerKind::Label],
        NodeType::Line => &[LayerKind::Line, LayerKind::Label],
        NodeType::Polygon => &[LayerKind::Polygon, LayerKind::Line, LayerKind::Label],
        NodeType::Raster | NodeType::Underwater => &[LayerKind::Raster],
        NodeType::ThreeD => &[LayerKind::Tile3d],
        NodeType::Custom => &[LayerKind::Custom],
    }
}

pub(super) fn classify(
    descriptor: &ResourceDescriptor,
    template: &SourceTemplate,
    config: &SceneConfig,
) -> Classified {
    let id = descriptor.id.as_str();
    let mut source = NodeSource::new(id, descriptor.name.clone());
    let mut view_state = None;

    let Some(usage) = descriptor.usage.as_ref() else {
        debug!("Resource {} has no usage, classified as custom", id);
        return Classified {
            kind: NodeType::Custom,
            source,
            view_state,
        };
    };

    let kind = match descriptor.category {
        Some(Category::Raster) => {
            source.url = Some(template.raster_tiles(id));
            source.min_zoom = parse_param(id, "minZoom", usage.min_zoom.as_deref(), DEFAULT_MIN_ZOOM);
            source.max_zoom = parse_param(id, "maxZoom", usage.max_zoom.as_deref(), DEFAULT_MAX_ZOOM);
            source.tile_size = parse_param(id, "size", usage.size.as_deref(), DEFAULT_TILE_SIZE);

            if usage.kind.as_deref() == Some("water") {
                view_state = Some(config.underwater_view.clone());
                NodeType::Underwater
            } else {
                source.is_dem_source = true;
                NodeType::Raster
            }
        }
        Some(Category::Vector) => {
            source.url = Some(template.vector_tiles(id));
            source.label_field = usage.label_field().map(str::to_string);
            source.geojson.clone_from(&descriptor.geojson);
            source.min_zoom = parse_param(id, "minZoom", usage.min_zoom.as_deref(), DEFAULT_MIN_ZOOM);
            source.max_zoom = parse_param(id, "maxZoom", usage.max_zoom.as_deref(), DEFAULT_MAX_ZOOM);

            match usage.kind.as_deref() {
                Some("point") => NodeType::Point,
                Some("line") => NodeType::Line,
                _ => NodeType::Polygon,
            }
        }
        Some(Category::Tiles3d) => {
            source.url = Some(template.tileset(id));
            view_state = Some(config.tileset_view.clone());
            NodeType::ThreeD
        }
        other => {
            warn!(
                "Unclassifiable resource {} (category {:?}), falling back to custom layer",
                id, other
            );
            NodeType::Custom
        }
    };

    Classified {
        kind,
        source,
        view_state,
    }
}

/// Parse a numeric usage parameter, falling back to `default` when absent or invalid.
fn parse_param<T: FromStr + Copy>(id: &str, field: &str, value: Option<&str>, default: T) -> T {
    let Some(raw) = value else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        warn!("Resource {}: invalid {} {:?}, using default", id, field, raw);
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param_fallbacks() {
        assert_eq!(parse_param("n", "size", Some("512"), 256_u32), 512);
        assert_eq!(parse_param("n", "size", Some(" 128 "), 256_u32), 128);
        assert_eq!(parse_param("n", "size", Some("big"), 256_u32), 256);
        assert_eq!(parse_param("n", "minZoom", None, 3_u8), 3);
    }

    #[test]
    fn test_layer_kinds_table() {
        assert_eq!(layer_kinds(NodeType::Point), [LayerKind::Point, LayerKind::Label]);
        assert_eq!(
            layer_kinds(NodeType::Polygon),
            [LayerKind::Polygon, LayerKind::Line, LayerKind::Label]
        );
        assert_eq!(layer_kinds(NodeType::Underwater), [LayerKind::Raster]);
        assert_eq!(layer_kinds(NodeType::ThreeD), [LayerKind::Tile3d]);
    }
}
