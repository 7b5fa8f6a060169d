//! Static geometry registry: platforms and doors, flattened into a list of solid rectangles that
//! bodies and projectiles resolve against.
//!
//! Geometry is composed from components rather than a class tree. Anything carrying `Solid`,
//! a `Transform` and a `Collider` is solid while it is not an open `Door`; `Hazardous` and
//! `Hookable` are independent markers layered on top.

use bevy::math::Rect;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::movement::Collider;
use crate::state::SimSet;
use crate::weapons::WeaponId;

/// Overlap below this depth counts as resting contact rather than penetration.
pub const CONTACT_EPSILON: f32 = 1e-3;

pub struct CollisionPlugin;

impl Plugin for CollisionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SolidGeometry>()
            .add_systems(
                Update,
                rebuild_geometry
                    .in_set(SimSet::Prepare)
                    .in_set(CollisionSystems),
            );
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollisionSystems;

/// Participates in body/projectile collision while not an open door.
#[derive(Component, Default)]
pub struct Solid;

/// Touching this geometry kills the player.
#[derive(Component, Default)]
pub struct Hazardous;

/// The grapple may attach to this geometry.
#[derive(Component, Default)]
pub struct Hookable;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Horizontal => "horizontal",
            Orientation::Vertical => "vertical",
        }
    }
}

#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Platform {
    pub orientation: Orientation,
}

/// A door is solid only while closed. Its locks are independent: each present lock must be
/// satisfied before the door opens.
#[derive(Component, Clone, Debug, Default)]
pub struct Door {
    pub id: String,
    pub open: bool,
    pub required_key: Option<String>,
    pub required_weapon: Option<WeaponId>,
}

impl Door {
    /// Whether the door would open for a player holding `has_key` and presenting `weapon`.
    /// Passing `None` for the weapon means no weapon is being presented.
    pub fn unlocks_with(&self, has_key: impl Fn(&str) -> bool, weapon: Option<WeaponId>) -> bool {
        let key_ok = self.required_key.as_deref().map_or(true, |key| has_key(key));
        let weapon_ok = self
            .required_weapon
            .map_or(true, |required| weapon == Some(required));
        key_ok && weapon_ok
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SolidShape {
    pub entity: Entity,
    pub rect: Rect,
    pub hookable: bool,
    pub hazardous: bool,
}

/// Flattened view of every solid rectangle, refreshed whenever geometry is added, removed or a
/// door changes.
#[derive(Resource, Default)]
pub struct SolidGeometry {
    shapes: Vec<SolidShape>,
}

impl SolidGeometry {
    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    pub fn shapes(&self) -> &[SolidShape] {
        &self.shapes
    }

    pub fn push(&mut self, shape: SolidShape) {
        self.shapes.push(shape);
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.shapes.iter().any(|shape| shape.entity == entity)
    }

    pub fn first_hookable(&self, rect: Rect) -> Option<&SolidShape> {
        self.shapes
            .iter()
            .find(|shape| shape.hookable && overlaps(rect, shape.rect))
    }

    pub fn touches_hazard(&self, rect: Rect, margin: f32) -> bool {
        self.shapes
            .iter()
            .any(|shape| shape.hazardous && touches(rect, shape.rect, margin))
    }
}

pub fn body_rect(center: Vec2, half_extents: Vec2) -> Rect {
    Rect::from_center_half_size(center, half_extents)
}

/// Strict overlap: rectangles sharing only an edge do not overlap.
pub fn overlaps(a: Rect, b: Rect) -> bool {
    a.min.x < b.max.x && a.max.x > b.min.x && a.min.y < b.max.y && a.max.y > b.min.y
}

pub fn penetrates(a: Rect, b: Rect) -> bool {
    a.min.x < b.max.x - CONTACT_EPSILON
        && a.max.x > b.min.x + CONTACT_EPSILON
        && a.min.y < b.max.y - CONTACT_EPSILON
        && a.max.y > b.min.y + CONTACT_EPSILON
}

/// Overlap after inflating `a` by `margin`, so resting on or leaning against `b` counts.
pub fn touches(a: Rect, b: Rect, margin: f32) -> bool {
    overlaps(a.inflate(margin), b)
}

fn rebuild_geometry(
    changed: Query<(), (With<Solid>, Or<(Added<Solid>, Changed<Door>, Changed<Transform>)>)>,
    mut removed: RemovedComponents<Solid>,
    solids: Query<(Entity, &Transform, &Collider, Option<&Door>, Has<Hookable>, Has<Hazardous>), With<Solid>>,
    mut geometry: ResMut<SolidGeometry>,
) {
    let removed_any = removed.read().count() > 0;
    let changed_any = changed.iter().next().is_some();
    if !removed_any && !changed_any {
        return;
    }

    geometry.clear();
    for (entity, transform, collider, door, hookable, hazardous) in &solids {
        if door.is_some_and(|door| door.open) {
            continue;
        }
        geometry.push(SolidShape {
            entity,
            rect: body_rect(transform.translation.truncate(), collider.half_extents),
            hookable,
            hazardous,
        });
    }
    debug!("Solid geometry rebuilt with {} shapes", geometry.shapes.len());
}
