//! Hold-to-charge timer shared by the power-up shot and the red and purple weapons.

/// Level rises linearly from 0 to 1 over the charge duration while active and snaps back to 0
/// the moment the tracker is released or cancelled.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChargeTracker {
    active: bool,
    started_ms: u64,
    level: f32,
}

impl ChargeTracker {
    /// Starts charging. Returns `false` if a charge is already in progress.
    pub fn begin(&mut self, now_ms: u64) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.started_ms = now_ms;
        self.level = 0.0;
        true
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Level the tracker would report at `now_ms`.
    pub fn level_at(&self, now_ms: u64, duration_ms: u64) -> f32 {
        if !self.active {
            return 0.0;
        }
        if duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now_ms.saturating_sub(self.started_ms);
        (elapsed as f32 / duration_ms as f32).min(1.0)
    }

    pub fn update(&mut self, now_ms: u64, duration_ms: u64) {
        self.level = self.level_at(now_ms, duration_ms);
    }

    /// Ends the charge and yields the level reached, or `None` if nothing was charging.
    pub fn release(&mut self, now_ms: u64, duration_ms: u64) -> Option<f32> {
        if !self.active {
            return None;
        }
        let level = self.level_at(now_ms, duration_ms);
        self.cancel();
        Some(level)
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }
}
