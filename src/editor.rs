//! Typed property editing for level-definition entries.
//!
//! The interactive editor is an outside collaborator; this module gives it a schema per entry
//! kind and a single `set_property` entry point that coerces loosely typed input (text boxes,
//! checkboxes) into the declared kind. Integers outside their bounds are clamped, never rejected.

use bevy::log::warn;
use serde::{Deserialize, Serialize};

use crate::collision::Orientation;
use crate::error::PropertyError;
use crate::level::{DoorDef, EnemyDef, KeyDef, ObstacleDef, PlatformDef};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Int(i64),
    Bool(bool),
    Text(String),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PropertyKind {
    Int { min: i64, max: i64 },
    Bool,
    Enum(&'static [&'static str]),
    Text,
}

impl PropertyKind {
    fn describe(&self) -> &'static str {
        match self {
            PropertyKind::Int { .. } => "an integer",
            PropertyKind::Bool => "a boolean",
            PropertyKind::Enum(_) => "one of the listed options",
            PropertyKind::Text => "text",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropertySpec {
    pub name: &'static str,
    pub kind: PropertyKind,
}

const fn int(name: &'static str, min: i64, max: i64) -> PropertySpec {
    PropertySpec {
        name,
        kind: PropertyKind::Int { min, max },
    }
}

const fn flag(name: &'static str) -> PropertySpec {
    PropertySpec {
        name,
        kind: PropertyKind::Bool,
    }
}

const fn text(name: &'static str) -> PropertySpec {
    PropertySpec {
        name,
        kind: PropertyKind::Text,
    }
}

const MAX_EXTENT: i64 = 10_000;
const ORIENTATIONS: &[&str] = &["horizontal", "vertical"];
const WEAPON_LOCKS: &[&str] = &["", "normal", "blue", "red", "purple"];

const PLATFORM_SCHEMA: &[PropertySpec] = &[
    int("width", 1, MAX_EXTENT),
    int("height", 1, MAX_EXTENT),
    PropertySpec {
        name: "orientation",
        kind: PropertyKind::Enum(ORIENTATIONS),
    },
    flag("hazardous"),
    flag("hookable"),
];

const DOOR_SCHEMA: &[PropertySpec] = &[
    text("id"),
    text("required_key_id"),
    PropertySpec {
        name: "required_weapon",
        kind: PropertyKind::Enum(WEAPON_LOCKS),
    },
    flag("hazardous"),
    flag("hookable"),
];

const CHASER_SCHEMA: &[PropertySpec] = &[int("detection_range", 0, MAX_EXTENT)];
const PATROL_SCHEMA: &[PropertySpec] = &[int("range", 0, MAX_EXTENT)];
const KEY_SCHEMA: &[PropertySpec] = &[text("id")];
const SPIKE_SCHEMA: &[PropertySpec] = &[flag("instant_kill")];

/// Coerces `value` into `spec.kind`, clamping integers into range.
pub fn coerce(spec: &PropertySpec, value: PropertyValue) -> Result<PropertyValue, PropertyError> {
    let wrong_kind = || PropertyError::WrongKind {
        name: spec.name.to_owned(),
        expected: spec.kind.describe(),
    };

    match (spec.kind, value) {
        (PropertyKind::Int { min, max }, value) => {
            let raw = match value {
                PropertyValue::Int(raw) => raw,
                PropertyValue::Text(text) => text.trim().parse::<i64>().map_err(|_| wrong_kind())?,
                PropertyValue::Bool(_) => return Err(wrong_kind()),
            };
            let clamped = raw.clamp(min, max);
            if clamped != raw {
                warn!(
                    "Property '{}' value {} out of range; clamped to {}",
                    spec.name, raw, clamped
                );
            }
            Ok(PropertyValue::Int(clamped))
        }
        (PropertyKind::Bool, PropertyValue::Bool(flag)) => Ok(PropertyValue::Bool(flag)),
        (PropertyKind::Bool, PropertyValue::Text(text)) => match text.trim() {
            "true" | "True" => Ok(PropertyValue::Bool(true)),
            "false" | "False" | "" => Ok(PropertyValue::Bool(false)),
            _ => Err(wrong_kind()),
        },
        (PropertyKind::Enum(options), PropertyValue::Text(text)) => {
            let text = text.trim();
            if options.iter().any(|option| *option == text) {
                Ok(PropertyValue::Text(text.to_owned()))
            } else {
                Err(PropertyError::NotAnOption {
                    name: spec.name.to_owned(),
                    value: text.to_owned(),
                })
            }
        }
        (PropertyKind::Text, PropertyValue::Text(text)) => Ok(PropertyValue::Text(text)),
        (PropertyKind::Text, PropertyValue::Int(number)) => Ok(PropertyValue::Text(number.to_string())),
        _ => Err(wrong_kind()),
    }
}

/// Level entries whose properties the editor may inspect and change.
pub trait PropertyEditable {
    fn entity_name(&self) -> &'static str;

    fn schema(&self) -> &'static [PropertySpec];

    fn property(&self, name: &str) -> Option<PropertyValue>;

    /// Stores an already coerced value. Only called with names from `schema`.
    fn write_property(&mut self, name: &str, value: PropertyValue);

    /// Validates and applies an edit, returning the value actually stored.
    fn set_property(
        &mut self,
        name: &str,
        value: PropertyValue,
    ) -> Result<PropertyValue, PropertyError> {
        let spec = self
            .schema()
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| PropertyError::UnknownProperty {
                entity: self.entity_name(),
                name: name.to_owned(),
            })?;
        let value = coerce(spec, value)?;
        self.write_property(name, value.clone());
        Ok(value)
    }
}

fn as_int(value: &PropertyValue) -> Option<i64> {
    match value {
        PropertyValue::Int(number) => Some(*number),
        _ => None,
    }
}

fn as_bool(value: &PropertyValue) -> Option<bool> {
    match value {
        PropertyValue::Bool(flag) => Some(*flag),
        _ => None,
    }
}

fn as_optional_text(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::Text(text) if !text.is_empty() => Some(text.clone()),
        _ => None,
    }
}

impl PropertyEditable for PlatformDef {
    fn entity_name(&self) -> &'static str {
        "platform"
    }

    fn schema(&self) -> &'static [PropertySpec] {
        PLATFORM_SCHEMA
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "width" => Some(PropertyValue::Int(self.rect.width.round() as i64)),
            "height" => Some(PropertyValue::Int(self.rect.height.round() as i64)),
            "orientation" => Some(PropertyValue::Text(self.orientation.as_str().to_owned())),
            "hazardous" => Some(PropertyValue::Bool(self.hazardous)),
            "hookable" => Some(PropertyValue::Bool(self.hookable)),
            _ => None,
        }
    }

    fn write_property(&mut self, name: &str, value: PropertyValue) {
        match name {
            "width" => {
                if let Some(width) = as_int(&value) {
                    self.rect.width = width as f32;
                }
            }
            "height" => {
                if let Some(height) = as_int(&value) {
                    self.rect.height = height as f32;
                }
            }
            "orientation" => {
                self.orientation = match value {
                    PropertyValue::Text(text) if text == "vertical" => Orientation::Vertical,
                    _ => Orientation::Horizontal,
                };
            }
            "hazardous" => self.hazardous = as_bool(&value).unwrap_or(self.hazardous),
            "hookable" => self.hookable = as_bool(&value).unwrap_or(self.hookable),
            _ => {}
        }
    }
}

impl PropertyEditable for DoorDef {
    fn entity_name(&self) -> &'static str {
        "door"
    }

    fn schema(&self) -> &'static [PropertySpec] {
        DOOR_SCHEMA
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "id" => Some(PropertyValue::Text(self.id.clone())),
            "required_key_id" => Some(PropertyValue::Text(
                self.required_key_id.clone().unwrap_or_default(),
            )),
            "required_weapon" => Some(PropertyValue::Text(
                self.required_weapon.clone().unwrap_or_default(),
            )),
            "hazardous" => Some(PropertyValue::Bool(self.hazardous)),
            "hookable" => Some(PropertyValue::Bool(self.hookable)),
            _ => None,
        }
    }

    fn write_property(&mut self, name: &str, value: PropertyValue) {
        match name {
            "id" => {
                if let PropertyValue::Text(id) = value {
                    self.id = id;
                }
            }
            "required_key_id" => self.required_key_id = as_optional_text(&value),
            "required_weapon" => self.required_weapon = as_optional_text(&value),
            "hazardous" => self.hazardous = as_bool(&value).unwrap_or(self.hazardous),
            "hookable" => self.hookable = as_bool(&value).unwrap_or(self.hookable),
            _ => {}
        }
    }
}

impl PropertyEditable for EnemyDef {
    fn entity_name(&self) -> &'static str {
        match self {
            EnemyDef::Chaser { .. } => "chaser",
            EnemyDef::Patrol { .. } => "patrol",
        }
    }

    fn schema(&self) -> &'static [PropertySpec] {
        match self {
            EnemyDef::Chaser { .. } => CHASER_SCHEMA,
            EnemyDef::Patrol { .. } => PATROL_SCHEMA,
        }
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        match (self, name) {
            (
                EnemyDef::Chaser {
                    detection_range, ..
                },
                "detection_range",
            ) => detection_range.map(|range| PropertyValue::Int(range.round() as i64)),
            (EnemyDef::Patrol { range, .. }, "range") => {
                range.map(|range| PropertyValue::Int(range.round() as i64))
            }
            _ => None,
        }
    }

    fn write_property(&mut self, name: &str, value: PropertyValue) {
        let Some(number) = as_int(&value) else {
            return;
        };
        match (self, name) {
            (
                EnemyDef::Chaser {
                    detection_range, ..
                },
                "detection_range",
            ) => *detection_range = Some(number as f32),
            (EnemyDef::Patrol { range, .. }, "range") => *range = Some(number as f32),
            _ => {}
        }
    }
}

impl PropertyEditable for KeyDef {
    fn entity_name(&self) -> &'static str {
        "key"
    }

    fn schema(&self) -> &'static [PropertySpec] {
        KEY_SCHEMA
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        (name == "id").then(|| PropertyValue::Text(self.id.clone()))
    }

    fn write_property(&mut self, name: &str, value: PropertyValue) {
        if let ("id", PropertyValue::Text(id)) = (name, value) {
            self.id = id;
        }
    }
}

impl PropertyEditable for ObstacleDef {
    fn entity_name(&self) -> &'static str {
        "spike"
    }

    fn schema(&self) -> &'static [PropertySpec] {
        SPIKE_SCHEMA
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        (name == "instant_kill").then_some(PropertyValue::Bool(self.instant_kill))
    }

    fn write_property(&mut self, name: &str, value: PropertyValue) {
        if name == "instant_kill" {
            self.instant_kill = as_bool(&value).unwrap_or(self.instant_kill);
        }
    }
}
