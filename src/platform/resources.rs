//! Opaque resource ids

use std::collections::HashMap;

/// Opaque handle to a loaded texture/shader/font
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResourceId(pub u32);

pub trait ResourceLoader {
    fn load(&mut self, name: &str) -> ResourceId;

    /// Width / height of a texture resource
    fn aspect_ratio(&self, _id: ResourceId) -> f32 {
        1.0
    }
}

/// Assigns stable ids per resource name
#[derive(Debug, Default)]
pub struct ResourceCache {
    ids: HashMap<String, ResourceId>,
    aspects: HashMap<ResourceId, f32>,
    next: u32,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self {
            next: 1,
            ..Default::default()
        }
    }

    /// Register a known texture aspect ratio (headless hosts, tests)
    pub fn set_aspect_ratio(&mut self, name: &str, aspect: f32) {
        let id = self.load(name);
        self.aspects.insert(id, aspect);
    }
}

impl ResourceLoader for ResourceCache {
    fn load(&mut self, name: &str) -> ResourceId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = ResourceId(self.next.max(1));
        self.next = id.0 + 1;
        self.ids.insert(name.to_string(), id);
        id
    }

    fn aspect_ratio(&self, id: ResourceId) -> f32 {
        self.aspects.get(&id).copied().unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_stable_per_name() {
        let mut cache = ResourceCache::new();
        let a = cache.load("enemy_ship");
        let b = cache.load("bullet");
        assert_ne!(a, b);
        assert_eq!(cache.load("enemy_ship"), a);
        assert_eq!(cache.aspect_ratio(a), 1.0);
        cache.set_aspect_ratio("bullet", 0.5);
        assert_eq!(cache.aspect_ratio(b), 0.5);
    }
}
