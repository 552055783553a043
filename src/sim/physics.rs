//! Physics bridge: a small 2D rigid-body world
//!
//! Bodies are axis-aligned boxes with a category/mask filter. Dynamic bodies
//! integrate force and velocity with linear damping; static bodies (walls) push
//! overlapping dynamic bodies back out. Every step reports newly begun contacts,
//! which `CollisionTable` routes to callbacks keyed by unordered category pair.

use std::collections::{HashMap, HashSet};

use glam::Vec2;

use crate::content::ContactFilter;

/// Generational handle into the body arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyKind {
    #[default]
    Dynamic,
    Static,
}

/// Creation parameters
#[derive(Debug, Clone)]
pub struct BodyDef {
    pub kind: BodyKind,
    pub position: Vec2,
    pub half_extents: Vec2,
    pub filter: ContactFilter,
    pub density: f32,
    pub linear_damping: f32,
    pub velocity: Vec2,
    /// Name tag of the owning scene object
    pub user_data: String,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            kind: BodyKind::Dynamic,
            position: Vec2::ZERO,
            half_extents: Vec2::splat(0.5),
            filter: ContactFilter::default(),
            density: 1.0,
            linear_damping: 0.0,
            velocity: Vec2::ZERO,
            user_data: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Body {
    pub kind: BodyKind,
    pub position: Vec2,
    pub half_extents: Vec2,
    pub filter: ContactFilter,
    pub mass: f32,
    pub linear_damping: f32,
    pub velocity: Vec2,
    force: Vec2,
    awake: bool,
    pub user_data: String,
}

impl Body {
    pub fn is_awake(&self) -> bool {
        self.awake
    }

    fn overlaps(&self, other: &Body) -> bool {
        let d = (self.position - other.position).abs();
        let r = self.half_extents + other.half_extents;
        d.x < r.x && d.y < r.y
    }
}

/// A contact that began during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: BodyHandle,
    pub b: BodyHandle,
    pub category_a: u16,
    pub category_b: u16,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

#[derive(Debug, Default)]
pub struct PhysicsWorld {
    slots: Vec<Slot>,
    free: Vec<u32>,
    touching: HashSet<(BodyHandle, BodyHandle)>,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_body(&mut self, def: BodyDef) -> BodyHandle {
        let area = (def.half_extents.x * 2.0) * (def.half_extents.y * 2.0);
        let body = Body {
            kind: def.kind,
            position: def.position,
            half_extents: def.half_extents,
            filter: def.filter,
            mass: (def.density * area).max(f32::EPSILON),
            linear_damping: def.linear_damping.max(0.0),
            velocity: def.velocity,
            force: Vec2::ZERO,
            awake: true,
            user_data: def.user_data,
        };

        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.body = Some(body);
        BodyHandle {
            index,
            generation: slot.generation,
        }
    }

    /// Destroy a body; stale handles are ignored
    pub fn destroy_body(&mut self, handle: BodyHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return false;
        };
        if slot.generation != handle.generation || slot.body.is_none() {
            return false;
        }
        slot.body = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.touching.retain(|(a, b)| *a != handle && *b != handle);
        true
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.body.as_ref())
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.body.as_mut())
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.body(handle).is_some()
    }

    pub fn body_count(&self) -> usize {
        self.slots.iter().filter(|s| s.body.is_some()).count()
    }

    pub fn handles(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.body.as_ref().map(|_| BodyHandle {
                index: i as u32,
                generation: s.generation,
            })
        })
    }

    pub fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.body(handle).map(|b| b.position)
    }

    pub fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.velocity = velocity;
            body.awake = true;
        }
    }

    /// Accumulate a force for the next step; wakes the body
    pub fn apply_force(&mut self, handle: BodyHandle, force: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.force += force;
            body.awake = true;
        }
    }

    /// Sleeping bodies keep their place and drop any motion
    pub fn set_awake(&mut self, handle: BodyHandle, awake: bool) {
        if let Some(body) = self.body_mut(handle) {
            body.awake = awake;
            if !awake {
                body.velocity = Vec2::ZERO;
                body.force = Vec2::ZERO;
            }
        }
    }

    /// Advance by `dt` seconds; returns contacts that began this step
    pub fn step(&mut self, dt: f32) -> Vec<Contact> {
        for body in self.slots.iter_mut().filter_map(|s| s.body.as_mut()) {
            if body.kind == BodyKind::Static || !body.awake {
                continue;
            }
            body.velocity += body.force / body.mass * dt;
            body.velocity *= 1.0 / (1.0 + dt * body.linear_damping);
            body.position += body.velocity * dt;
            body.force = Vec2::ZERO;
        }

        let handles: Vec<BodyHandle> = self.handles().collect();
        let mut touching = HashSet::new();
        let mut began = Vec::new();

        for (i, &ha) in handles.iter().enumerate() {
            for &hb in &handles[i + 1..] {
                let (Some(a), Some(b)) = (self.body(ha), self.body(hb)) else {
                    continue;
                };
                if a.kind == BodyKind::Static && b.kind == BodyKind::Static {
                    continue;
                }
                if !a.filter.accepts(&b.filter) || !a.overlaps(b) {
                    continue;
                }
                let contact = Contact {
                    a: ha,
                    b: hb,
                    category_a: a.filter.category,
                    category_b: b.filter.category,
                };
                match (a.kind, b.kind) {
                    (BodyKind::Static, BodyKind::Dynamic) => self.push_out(hb, ha),
                    (BodyKind::Dynamic, BodyKind::Static) => self.push_out(ha, hb),
                    _ => {}
                }
                let key = (ha, hb);
                if !self.touching.contains(&key) {
                    began.push(contact);
                }
                touching.insert(key);
            }
        }

        self.touching = touching;
        began
    }

    /// Separate a dynamic body from a static one along the shallowest axis
    fn push_out(&mut self, dynamic: BodyHandle, wall: BodyHandle) {
        let Some(w) = self.body(wall).map(|w| (w.position, w.half_extents)) else {
            return;
        };
        let Some(body) = self.body_mut(dynamic) else {
            return;
        };
        let delta = body.position - w.0;
        let overlap = (body.half_extents + w.1) - delta.abs();
        if overlap.x < overlap.y {
            let sign = if delta.x < 0.0 { -1.0 } else { 1.0 };
            body.position.x += overlap.x * sign;
            if body.velocity.x * sign < 0.0 {
                body.velocity.x = 0.0;
            }
        } else {
            let sign = if delta.y < 0.0 { -1.0 } else { 1.0 };
            body.position.y += overlap.y * sign;
            if body.velocity.y * sign < 0.0 {
                body.velocity.y = 0.0;
            }
        }
    }
}

/// Unordered key of two category bits, stored as (min, max)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CategoryPair {
    lo: u16,
    hi: u16,
}

impl CategoryPair {
    pub fn new(a: u16, b: u16) -> Self {
        Self {
            lo: a.min(b),
            hi: a.max(b),
        }
    }

    pub fn categories(&self) -> (u16, u16) {
        (self.lo, self.hi)
    }
}

pub type CollisionCallback<C> = Box<dyn FnMut(&mut C, BodyHandle, BodyHandle)>;

struct CollisionEntry<C> {
    /// Category whose body is passed first
    first: u16,
    callback: CollisionCallback<C>,
}

/// Contact callbacks keyed by unordered category pair; at most one per pair
pub struct CollisionTable<C> {
    entries: HashMap<CategoryPair, CollisionEntry<C>>,
}

impl<C> Default for CollisionTable<C> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<C> CollisionTable<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback(ctx, first_body, second_body)`; the body of category
    /// `first` is always passed first regardless of contact order
    pub fn register(
        &mut self,
        first: u16,
        second: u16,
        callback: impl FnMut(&mut C, BodyHandle, BodyHandle) + 'static,
    ) {
        let pair = CategoryPair::new(first, second);
        let replaced = self
            .entries
            .insert(
                pair,
                CollisionEntry {
                    first,
                    callback: Box::new(callback),
                },
            )
            .is_some();
        if replaced {
            log::warn!(
                "Replacing collision callback for categories {:#06x}/{:#06x}",
                first,
                second
            );
        }
    }

    pub fn contains(&self, pair: CategoryPair) -> bool {
        self.entries.contains_key(&pair)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Invoke the callback for a contact, if any; returns whether one fired
    pub fn dispatch(&mut self, ctx: &mut C, contact: &Contact) -> bool {
        let pair = CategoryPair::new(contact.category_a, contact.category_b);
        let Some(entry) = self.entries.get_mut(&pair) else {
            return false;
        };
        if contact.category_a == entry.first {
            (entry.callback)(ctx, contact.a, contact.b);
        } else {
            (entry.callback)(ctx, contact.b, contact.a);
        }
        true
    }
}
