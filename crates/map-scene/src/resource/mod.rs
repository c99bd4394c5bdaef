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

//! Backend resource descriptors.
//!
//! The backend serves its map resources as a tree of layer records. Each record
//! names a resource category and carries category-specific usage parameters.
//! This module deserializes that tree and resolves the tile/tileset addresses
//! the rendering engines fetch from.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Resource category reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "raster")]
    Raster,
    #[serde(rename = "vector")]
    Vector,
    #[serde(rename = "3DTiles", alias = "3dtiles")]
    Tiles3d,
    #[serde(other)]
    Other,
}

/// Category-specific usage parameters of a resource.
///
/// Numeric parameters arrive as strings from the backend (`"256"`), but plain
/// JSON numbers are accepted as well.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    /// Subtype: `point`/`line`/`polygon` for vectors, `water` for underwater rasters.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub min_zoom: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub max_zoom: Option<String>,
    /// Tile size in pixels.
    #[serde(default, deserialize_with = "string_or_number")]
    pub size: Option<String>,
    /// Comma-separated attribute names; the first one labels vector features.
    #[serde(default)]
    pub visualization_field: Option<String>,
}

impl Usage {
    /// First entry of the visualization field list, if any.
    #[must_use]
    pub fn label_field(&self) -> Option<&str> {
        self.visualization_field
            .as_deref()
            .and_then(|fields| fields.split(',').next())
            .map(str::trim)
            .filter(|field| !field.is_empty())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// One record of the backend layer tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_cn: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub usage: Option<Usage>,
    /// Inline feature collection for vector resources that are not tiled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geojson: Option<Value>,
    #[serde(default)]
    pub children: Vec<ResourceDescriptor>,
}

impl ResourceDescriptor {
    /// Create a bare descriptor with the given identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    #[must_use]
    pub fn with_geojson(mut self, features: Value) -> Self {
        self.geojson = Some(features);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: ResourceDescriptor) -> Self {
        self.children.push(child);
        self
    }
}

/// Flatten a resource tree depth-first, parents before their children.
#[must_use]
pub fn flatten(tree: &[ResourceDescriptor]) -> Vec<&ResourceDescriptor> {
    let mut out = Vec::new();
    let mut stack: Vec<&ResourceDescriptor> = tree.iter().rev().collect();
    while let Some(descriptor) = stack.pop() {
        out.push(descriptor);
        stack.extend(descriptor.children.iter().rev());
    }
    out
}

/// Parse a layer tree as served by the backend.
///
/// Accepts either a bare array of records or a single root record.
pub fn parse_tree(json: &str) -> Result<Vec<ResourceDescriptor>, serde_json::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tree {
        Many(Vec<ResourceDescriptor>),
        One(Box<ResourceDescriptor>),
    }

    Ok(match serde_json::from_str(json)? {
        Tree::Many(records) => records,
        Tree::One(root) => vec![*root],
    })
}

/// Address template for backend-served tiles and tilesets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTemplate {
    base: String,
}

impl SourceTemplate {
    /// Build a template from the host (`host:port`) and the backend path prefix.
    #[must_use]
    pub fn new(host: &str, back_server: &str) -> Self {
        Self::from_base(format!("http://{host}{back_server}"))
    }

    /// Build a template from a full base URL.
    #[must_use]
    pub fn from_base(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// `{z}/{x}/{y}` raster tile address of a resource.
    #[must_use]
    pub fn raster_tiles(&self, id: &str) -> String {
        format!("{}/resource/raster/getRasterTile/{id}/{{z}}/{{x}}/{{y}}", self.base)
    }

    /// `{z}/{x}/{y}` Mapbox vector tile address of a resource.
    #[must_use]
    pub fn vector_tiles(&self, id: &str) -> String {
        format!("{}/resource/vector/getMVT/{id}/{{z}}/{{x}}/{{y}}", self.base)
    }

    /// Root `tileset.json` address of a 3D tiles resource.
    #[must_use]
    pub fn tileset(&self, id: &str) -> String {
        format!("{}/resource/3DTiles/{id}/tileset.json", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_usage_with_string_numbers() {
        let json = r#"[{"id":"n2","name":"bay","category":"raster",
            "usage":{"type":"water","minZoom":"0","maxZoom":10,"size":"256"}}]"#;
        let tree = parse_tree(json).unwrap();
        let usage = tree[0].usage.as_ref().unwrap();
        assert_eq!(tree[0].category, Some(Category::Raster));
        assert_eq!(usage.kind.as_deref(), Some("water"));
        assert_eq!(usage.min_zoom.as_deref(), Some("0"));
        assert_eq!(usage.max_zoom.as_deref(), Some("10"));
        assert_eq!(usage.size.as_deref(), Some("256"));
    }

    #[test]
    fn test_parse_categories() {
        let json = r#"[{"id":"a","category":"3DTiles"},{"id":"b","category":"3dtiles"},
            {"id":"c","category":"folder"},{"id":"d","category":null}]"#;
        let tree = parse_tree(json).unwrap();
        assert_eq!(tree[0].category, Some(Category::Tiles3d));
        assert_eq!(tree[1].category, Some(Category::Tiles3d));
        assert_eq!(tree[2].category, Some(Category::Other));
        assert_eq!(tree[3].category, None);
        assert!(tree[3].usage.is_none());
    }

    #[test]
    fn test_parse_single_root() {
        let json = r#"{"id":"root","children":[{"id":"leaf"}]}"#;
        let tree = parse_tree(json).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children[0].id, "leaf");
    }

    #[test]
    fn test_flatten_depth_first() {
        let tree = vec![
            ResourceDescriptor::new("a")
                .with_child(ResourceDescriptor::new("a1").with_child(ResourceDescriptor::new("a1x")))
                .with_child(ResourceDescriptor::new("a2")),
            ResourceDescriptor::new("b"),
        ];
        let ids: Vec<_> = flatten(&tree).iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["a", "a1", "a1x", "a2", "b"]);
    }

    #[test]
    fn test_label_field_takes_first_entry() {
        let usage = Usage {
            visualization_field: Some("name, code".to_string()),
            ..Default::default()
        };
        assert_eq!(usage.label_field(), Some("name"));
        assert_eq!(Usage::default().label_field(), None);
    }

    #[test]
    fn test_source_template_urls() {
        let template = SourceTemplate::new("localhost:8080", "/api/");
        assert_eq!(
            template.raster_tiles("r1"),
            "http://localhost:8080/api/resource/raster/getRasterTile/r1/{z}/{x}/{y}"
        );
        assert_eq!(
            template.vector_tiles("v1"),
            "http://localhost:8080/api/resource/vector/getMVT/v1/{z}/{x}/{y}"
        );
        assert_eq!(
            template.tileset("t1"),
            "http://localhost:8080/api/resource/3DTiles/t1/tileset.json"
        );
    }
}
