//! Weapon slots and the per-weapon firing contract.
//!
//! `Arsenal` owns ammunition, reload and the three charge trackers. Its operations never fail:
//! contention (empty magazine, cooldown, reload in progress) is reported as "nothing happened"
//! through `bool` and `Option` results, and the caller decides whether to spawn a projectile.

use std::collections::{BTreeMap, BTreeSet};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::charge::ChargeTracker;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WeaponId {
    #[default]
    Normal,
    Blue,
    Red,
    Purple,
}

impl WeaponId {
    pub const ALL: [WeaponId; 4] = [
        WeaponId::Normal,
        WeaponId::Blue,
        WeaponId::Red,
        WeaponId::Purple,
    ];

    /// Maps the weapon-select keys 1..=4.
    pub fn from_slot(slot: u8) -> Option<Self> {
        match slot {
            1 => Some(WeaponId::Normal),
            2 => Some(WeaponId::Blue),
            3 => Some(WeaponId::Red),
            4 => Some(WeaponId::Purple),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeaponId::Normal => "normal",
            WeaponId::Blue => "blue",
            WeaponId::Red => "red",
            WeaponId::Purple => "purple",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|weapon| weapon.as_str() == value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeaponSlot {
    pub max_ammo: u32,
    pub current_ammo: u32,
    pub shoot_delay_ms: u64,
    pub reload_ms: u64,
    pub bullet_speed: f32,
    pub damage: f32,
    /// Fires on release of a held charge instead of on press.
    pub charged: bool,
    pub projectile_size: Vec2,
}

impl WeaponSlot {
    fn new(max_ammo: u32, shoot_delay_ms: u64, reload_ms: u64, speed: f32, damage: f32) -> Self {
        Self {
            max_ammo,
            current_ammo: max_ammo,
            shoot_delay_ms,
            reload_ms,
            bullet_speed: speed,
            damage,
            charged: false,
            projectile_size: Vec2::new(10.0, 5.0),
        }
    }

    fn charged(mut self) -> Self {
        self.charged = true;
        self
    }

    fn sized(mut self, size: Vec2) -> Self {
        self.projectile_size = size;
        self
    }
}

pub fn default_loadout() -> BTreeMap<WeaponId, WeaponSlot> {
    BTreeMap::from([
        (WeaponId::Normal, WeaponSlot::new(5, 250, 500, 20.0, 1.0)),
        (
            WeaponId::Blue,
            WeaponSlot::new(25, 50, 1500, 25.0, 0.5).sized(Vec2::new(8.0, 4.0)),
        ),
        // Speed and damage of the charged weapons come from the charge level at release.
        (
            WeaponId::Red,
            WeaponSlot::new(1, 0, 3000, 0.0, 0.0)
                .charged()
                .sized(Vec2::new(20.0, 10.0)),
        ),
        (
            WeaponId::Purple,
            WeaponSlot::new(2, 500, 2000, 0.0, 0.0)
                .charged()
                .sized(Vec2::splat(18.0)),
        ),
    ])
}

/// A shot the arsenal has committed to (ammo already spent). Projectile parameters that depend
/// on tuning rather than the weapon slot are resolved by the projectile system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShotOrder {
    Standard {
        weapon: WeaponId,
        speed: f32,
        damage: f32,
        size: Vec2,
    },
    Sniper { charge: f32 },
    Arc { charge: f32 },
    PowerShot { charge: f32 },
}

impl ShotOrder {
    /// Weapon credited with the shot; the power-up shot belongs to no weapon.
    pub fn weapon(&self) -> Option<WeaponId> {
        match self {
            ShotOrder::Standard { weapon, .. } => Some(*weapon),
            ShotOrder::Sniper { .. } => Some(WeaponId::Red),
            ShotOrder::Arc { .. } => Some(WeaponId::Purple),
            ShotOrder::PowerShot { .. } => None,
        }
    }
}

/// Outcome of pressing the secondary input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecondaryPress {
    /// Power-up charge started (or already running).
    Charging,
    /// Purple weapon equipped: the grapple should start seeking.
    Grapple,
    Ignored,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Charges {
    pub powerup: ChargeTracker,
    pub red: ChargeTracker,
    pub purple: ChargeTracker,
}

impl Charges {
    pub fn cancel_all(&mut self) {
        self.powerup.cancel();
        self.red.cancel();
        self.purple.cancel();
    }
}

#[derive(Component, Clone, Debug)]
pub struct Arsenal {
    pub slots: BTreeMap<WeaponId, WeaponSlot>,
    pub current: WeaponId,
    /// Weapon power-ups picked up. `Normal` is always usable and never stored here.
    pub owned: BTreeSet<WeaponId>,
    pub charge_powerup: bool,
    /// Start time of the reload running on the current weapon.
    pub reload_started_ms: Option<u64>,
    pub last_shot_ms: Option<u64>,
    pub charges: Charges,
}

impl Default for Arsenal {
    fn default() -> Self {
        Self::new(default_loadout())
    }
}

impl Arsenal {
    pub fn new(slots: BTreeMap<WeaponId, WeaponSlot>) -> Self {
        Self {
            slots,
            current: WeaponId::Normal,
            owned: BTreeSet::new(),
            charge_powerup: false,
            reload_started_ms: None,
            last_shot_ms: None,
            charges: Charges::default(),
        }
    }

    pub fn owns(&self, weapon: WeaponId) -> bool {
        weapon == WeaponId::Normal || self.owned.contains(&weapon)
    }

    pub fn current_slot(&self) -> Option<&WeaponSlot> {
        self.slots.get(&self.current)
    }

    pub fn ammo(&self, weapon: WeaponId) -> u32 {
        self.slots.get(&weapon).map_or(0, |slot| slot.current_ammo)
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_started_ms.is_some()
    }

    /// Switches to `weapon` if it is owned, dropping any reload or charge in progress. The caller
    /// is responsible for releasing the grapple.
    pub fn equip(&mut self, weapon: WeaponId) -> bool {
        if !self.owns(weapon) || !self.slots.contains_key(&weapon) {
            return false;
        }
        self.current = weapon;
        self.reload_started_ms = None;
        self.charges.cancel_all();
        true
    }

    /// Records a weapon power-up and equips it.
    pub fn grant(&mut self, weapon: WeaponId) -> bool {
        if weapon != WeaponId::Normal {
            self.owned.insert(weapon);
        }
        self.equip(weapon)
    }

    pub fn start_reload(&mut self, now_ms: u64) -> bool {
        if self.is_reloading() {
            return false;
        }
        let Some(slot) = self.current_slot() else {
            return false;
        };
        if slot.current_ammo >= slot.max_ammo {
            return false;
        }
        self.reload_started_ms = Some(now_ms);
        true
    }

    /// Completes a reload once its duration has elapsed, refilling the current weapon.
    pub fn finish_reload(&mut self, now_ms: u64) -> Option<WeaponId> {
        let started = self.reload_started_ms?;
        let slot = self.slots.get_mut(&self.current)?;
        if now_ms.saturating_sub(started) <= slot.reload_ms {
            return None;
        }
        slot.current_ammo = slot.max_ammo;
        self.reload_started_ms = None;
        Some(self.current)
    }

    fn charge_tracker(&mut self, weapon: WeaponId) -> &mut ChargeTracker {
        if weapon == WeaponId::Purple {
            &mut self.charges.purple
        } else {
            &mut self.charges.red
        }
    }

    /// Primary input pressed. Standard weapons fire immediately; charged weapons start charging.
    pub fn press_primary(&mut self, now_ms: u64) -> Option<ShotOrder> {
        if self.is_reloading() {
            return None;
        }
        let current = self.current;
        let last_shot = self.last_shot_ms;
        let slot = self.slots.get_mut(&current)?;
        if slot.current_ammo == 0 {
            return None;
        }

        if slot.charged {
            self.charge_tracker(current).begin(now_ms);
            return None;
        }
        let cooled =
            last_shot.map_or(true, |last| now_ms.saturating_sub(last) > slot.shoot_delay_ms);
        if !cooled {
            return None;
        }
        slot.current_ammo -= 1;
        self.last_shot_ms = Some(now_ms);
        Some(ShotOrder::Standard {
            weapon: current,
            speed: slot.bullet_speed,
            damage: slot.damage,
            size: slot.projectile_size,
        })
    }

    /// Primary input released. Fires the running charge if the current weapon is a charged one
    /// and always resets both weapon charge trackers. Purple charges into an arc round, every
    /// other charged weapon into a sniper round.
    pub fn release_primary(&mut self, now_ms: u64, charge_ms: u64) -> Option<ShotOrder> {
        let red = self.charges.red.release(now_ms, charge_ms);
        let purple = self.charges.purple.release(now_ms, charge_ms);
        if self.is_reloading() {
            return None;
        }

        let weapon = self.current;
        let charge = if weapon == WeaponId::Purple { purple } else { red }?;
        let slot = self.slots.get_mut(&weapon)?;
        if !slot.charged || slot.current_ammo == 0 {
            return None;
        }
        slot.current_ammo -= 1;
        self.last_shot_ms = Some(now_ms);

        Some(match weapon {
            WeaponId::Purple => ShotOrder::Arc { charge },
            _ => ShotOrder::Sniper { charge },
        })
    }

    pub fn press_secondary(&mut self, now_ms: u64) -> SecondaryPress {
        if self.is_reloading() {
            return SecondaryPress::Ignored;
        }
        if self.current == WeaponId::Purple {
            return SecondaryPress::Grapple;
        }
        if !self.charge_powerup {
            return SecondaryPress::Ignored;
        }
        self.charges.powerup.begin(now_ms);
        SecondaryPress::Charging
    }

    /// Secondary input released. Fires the power-up shot if it was charging, consuming the
    /// power-up.
    pub fn release_secondary(&mut self, now_ms: u64, charge_ms: u64) -> Option<ShotOrder> {
        let charge = self.charges.powerup.release(now_ms, charge_ms)?;
        if self.is_reloading() || !self.charge_powerup {
            return None;
        }
        self.charge_powerup = false;
        Some(ShotOrder::PowerShot { charge })
    }

    pub fn tick_charges(&mut self, now_ms: u64, charge_ms: u64) {
        self.charges.powerup.update(now_ms, charge_ms);
        self.charges.red.update(now_ms, charge_ms);
        self.charges.purple.update(now_ms, charge_ms);
    }
}
