//! Declarative content: the tag tree every document is written in, plus the
//! records parsed out of it.
//!
//! A document is a tree of `Node`s (tag, string attributes, children). Object
//! types, wave blocks, upgrades, GUI scenes, generated levels and the run save
//! all share this shape, serialized as JSON.

pub mod definitions;
pub mod level;
pub mod store;

use std::collections::{BTreeMap, HashMap};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

pub use definitions::{
    AnimationSpec, ContactFilter, DEFAULT_ANIMATION_STATE, FlipMode, GuiElementDefinition,
    GuiScene, MovementPattern, ObjectTypeDefinition, UpgradeDefinition, WaveBlock,
    WaveBlockEnemy, WaveBlockLine, category,
};
pub use level::{BossAttributes, Level, LevelEnemy, LevelWave};
pub use store::DefinitionStore;

/// One element of a content document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Node {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Builder: set an attribute
    pub fn attr(mut self, key: &str, value: impl ToString) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// Builder: append a child
    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.attributes.insert(key.to_string(), value.to_string());
    }

    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn find(&self, tag: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.tag == tag)
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Tag handler: mutates the record under construction
pub type NodeHandler<T> = fn(&Node, &mut T, &mut Warnings);

/// Tag-name → handler table walked over a document subtree
pub struct NodeHandlers<T> {
    handlers: HashMap<&'static str, NodeHandler<T>>,
}

impl<T> NodeHandlers<T> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register the handler for a tag
    pub fn on(mut self, tag: &'static str, handler: NodeHandler<T>) -> Self {
        self.handlers.insert(tag, handler);
        self
    }

    /// Pre-order walk; unknown tags are skipped but their children are still visited
    pub fn visit(&self, node: &Node, record: &mut T, warnings: &mut Warnings) {
        if let Some(handler) = self.handlers.get(node.tag.as_str()) {
            handler(node, record, warnings);
        }
        for child in &node.children {
            self.visit(child, record, warnings);
        }
    }
}

impl<T> Default for NodeHandlers<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Collected content-parse warnings
#[derive(Debug, Default)]
pub struct Warnings {
    pub items: Vec<CoreError>,
}

impl Warnings {
    pub fn push(&mut self, error: CoreError) {
        log::warn!("{}", error);
        self.items.push(error);
    }

    fn malformed(&mut self, node: &Node, key: &str, value: &str) {
        self.push(CoreError::ContentParse {
            tag: node.tag.clone(),
            attribute: key.to_string(),
            value: value.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

fn parse_components(value: &str, count: usize) -> Option<Vec<f32>> {
    let parts: Vec<f32> = value
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    (parts.len() == count).then_some(parts)
}

/// Attribute accessors; missing attributes are `None`, malformed ones also warn
pub fn attr_f32(node: &Node, key: &str, warnings: &mut Warnings) -> Option<f32> {
    let raw = node.get(key)?;
    match raw.trim().parse::<f32>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            warnings.malformed(node, key, raw);
            None
        }
    }
}

pub fn attr_i32(node: &Node, key: &str, warnings: &mut Warnings) -> Option<i32> {
    let raw = node.get(key)?;
    match raw.trim().parse::<i32>() {
        Ok(v) => Some(v),
        Err(_) => {
            warnings.malformed(node, key, raw);
            None
        }
    }
}

pub fn attr_bool(node: &Node, key: &str, warnings: &mut Warnings) -> Option<bool> {
    let raw = node.get(key)?;
    match raw.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => {
            warnings.malformed(node, key, raw);
            None
        }
    }
}

/// `"x,y"`
pub fn attr_vec2(node: &Node, key: &str, warnings: &mut Warnings) -> Option<Vec2> {
    let raw = node.get(key)?;
    match parse_components(raw, 2) {
        Some(p) => Some(Vec2::new(p[0], p[1])),
        None => {
            warnings.malformed(node, key, raw);
            None
        }
    }
}

/// `"x,y,z"`
pub fn attr_vec3(node: &Node, key: &str, warnings: &mut Warnings) -> Option<Vec3> {
    let raw = node.get(key)?;
    match parse_components(raw, 3) {
        Some(p) => Some(Vec3::new(p[0], p[1], p[2])),
        None => {
            warnings.malformed(node, key, raw);
            None
        }
    }
}

pub fn format_vec2(v: Vec2) -> String {
    format!("{},{}", v.x, v.y)
}
