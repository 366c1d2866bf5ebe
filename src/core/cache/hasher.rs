//! Content hashing for design nodes
//!
//! A node hash must change when, and only when, the rendered output would
//! change. [`VisualContentHasher`] therefore hashes a projection of the node
//! document that keeps visual properties and drops identity and placement
//! (ids, names, absolute canvas position).

use crate::domain::stats::NodeHash;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Computes a stable hash of a node document
pub trait ContentHasher: Send + Sync {
    fn hash(&self, node: &Value) -> NodeHash;
}

/// Properties that affect how a node renders
const VISUAL_KEYS: &[&str] = &[
    "type",
    "visible",
    "opacity",
    "blendMode",
    "isMask",
    "fills",
    "strokes",
    "strokeWeight",
    "strokeAlign",
    "strokeCap",
    "strokeJoin",
    "strokeDashes",
    "strokeMiterAngle",
    "effects",
    "cornerRadius",
    "rectangleCornerRadii",
    "cornerSmoothing",
    "fillGeometry",
    "strokeGeometry",
    "rotation",
    "clipsContent",
    "booleanOperation",
    "characters",
    "style",
];

/// SHA-256 over the canonical JSON of the visual projection
///
/// ```
/// use exfig::core::cache::{ContentHasher, VisualContentHasher};
/// use serde_json::json;
///
/// let hasher = VisualContentHasher;
/// let a = json!({"id": "1:1", "name": "icon", "type": "VECTOR", "fills": []});
/// let b = json!({"id": "9:9", "name": "renamed", "type": "VECTOR", "fills": []});
/// assert_eq!(hasher.hash(&a), hasher.hash(&b));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct VisualContentHasher;

impl ContentHasher for VisualContentHasher {
    fn hash(&self, node: &Value) -> NodeHash {
        let projected = normalize_json(&project(node, None));

        let mut hasher = Sha256::new();
        hasher.update(projected.to_string().as_bytes());
        let result = hasher.finalize();

        format!("{result:x}")
    }
}

/// Keeps visual keys, the node size and its offset within the parent
fn project(node: &Value, parent_origin: Option<(f64, f64)>) -> Value {
    let Some(object) = node.as_object() else {
        return node.clone();
    };

    let mut projected = Map::new();
    for key in VISUAL_KEYS {
        if let Some(value) = object.get(*key) {
            projected.insert((*key).to_string(), value.clone());
        }
    }

    let bounds = object.get("absoluteBoundingBox").and_then(read_bounds);
    if let Some(bounds) = bounds {
        projected.insert(
            "size".to_string(),
            Value::from(vec![round(bounds.width), round(bounds.height)]),
        );
        if let Some((px, py)) = parent_origin {
            projected.insert(
                "offset".to_string(),
                Value::from(vec![round(bounds.x - px), round(bounds.y - py)]),
            );
        }
    }

    if let Some(children) = object.get("children").and_then(Value::as_array) {
        let origin = bounds.map(|b| (b.x, b.y));
        let children: Vec<Value> = children.iter().map(|child| project(child, origin)).collect();
        projected.insert("children".to_string(), Value::Array(children));
    }

    Value::Object(projected)
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

fn read_bounds(value: &Value) -> Option<Bounds> {
    Some(Bounds {
        x: value.get("x")?.as_f64()?,
        y: value.get("y")?.as_f64()?,
        width: value.get("width")?.as_f64()?,
        height: value.get("height")?.as_f64()?,
    })
}

/// Two decimals; sub-pixel float noise must not change the hash
fn round(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Recursively sorts object keys so equal documents serialize identically
fn normalize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), normalize_json(v)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize_json).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn icon(x: f64, fill: &str) -> Value {
        json!({
            "id": "1:2",
            "name": "icon_home",
            "type": "COMPONENT",
            "absoluteBoundingBox": {"x": x, "y": 100.0, "width": 24.0, "height": 24.0},
            "fills": [{"type": "SOLID", "color": fill}],
            "children": [{
                "id": "1:3",
                "type": "VECTOR",
                "absoluteBoundingBox": {"x": x + 2.0, "y": 102.0, "width": 20.0, "height": 20.0},
                "fills": [{"type": "SOLID", "color": fill}]
            }]
        })
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = VisualContentHasher.hash(&icon(0.0, "red"));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_moving_node_on_canvas_keeps_hash() {
        let hasher = VisualContentHasher;
        assert_eq!(hasher.hash(&icon(0.0, "red")), hasher.hash(&icon(500.0, "red")));
    }

    #[test]
    fn test_visual_change_changes_hash() {
        let hasher = VisualContentHasher;
        assert_ne!(hasher.hash(&icon(0.0, "red")), hasher.hash(&icon(0.0, "blue")));
    }

    #[test]
    fn test_child_offset_change_changes_hash() {
        let hasher = VisualContentHasher;
        let original = icon(0.0, "red");
        let mut shifted = original.clone();
        shifted["children"][0]["absoluteBoundingBox"]["x"] = json!(5.0);

        assert_ne!(hasher.hash(&original), hasher.hash(&shifted));
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let hasher = VisualContentHasher;
        let a: Value = serde_json::from_str(r#"{"type":"VECTOR","opacity":0.5}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"opacity":0.5,"type":"VECTOR"}"#).unwrap();
        assert_eq!(hasher.hash(&a), hasher.hash(&b));
    }
}
