//! Single-liquid storage of one building.

use conflux_registry::LiquidId;
use serde::{Deserialize, Serialize};

/// Holds one liquid identity and its amount, bounded by a capacity.
///
/// Only `current` and `amount` are persisted; the capacity belongs to the
/// block type and is restored with [`LiquidContainer::restore`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiquidContainer {
    current: Option<LiquidId>,
    amount: f32,
    #[serde(skip)]
    capacity: f32,
}

impl LiquidContainer {
    /// Creates an empty container.
    #[must_use]
    pub const fn new(capacity: f32) -> Self {
        Self {
            current: None,
            amount: 0.0,
            capacity,
        }
    }

    /// Re-attaches a capacity to a deserialized container, clamping the amount.
    #[must_use]
    pub fn restore(mut self, capacity: f32) -> Self {
        self.capacity = capacity;
        self.amount = self.amount.clamp(0.0, capacity);
        self
    }

    /// The liquid currently held, if any was ever received.
    #[must_use]
    pub const fn current(&self) -> Option<LiquidId> {
        self.current
    }

    /// Amount of the current liquid.
    #[must_use]
    pub const fn amount(&self) -> f32 {
        self.amount
    }

    /// Maximum amount.
    #[must_use]
    pub const fn capacity(&self) -> f32 {
        self.capacity
    }

    /// Amount held of a specific liquid.
    #[must_use]
    pub fn get(&self, liquid: LiquidId) -> f32 {
        if self.current == Some(liquid) {
            self.amount
        } else {
            0.0
        }
    }

    /// Room left for `liquid`. A different liquid would replace the current one.
    #[must_use]
    pub fn free_space(&self, liquid: LiquidId) -> f32 {
        (self.capacity - self.get(liquid)).max(0.0)
    }

    /// `amount / capacity`.
    #[must_use]
    pub fn fill_ratio(&self) -> f32 {
        if self.capacity > 0.0 {
            self.amount / self.capacity
        } else {
            0.0
        }
    }

    /// Adds liquid and returns how much was stored.
    ///
    /// Receiving a liquid other than the current one switches the identity;
    /// whatever residue of the previous liquid was left is dropped.
    pub fn add(&mut self, liquid: LiquidId, amount: f32) -> f32 {
        if amount <= 0.0 || !amount.is_finite() {
            return 0.0;
        }
        if self.current != Some(liquid) {
            if self.amount > 0.0 {
                log::trace!(
                    "Dropping {:.4} of {:?} while switching to {liquid:?}",
                    self.amount,
                    self.current
                );
            }
            self.current = Some(liquid);
            self.amount = 0.0;
        }
        let stored = amount.min(self.capacity - self.amount).max(0.0);
        self.amount += stored;
        stored
    }

    /// Removes up to `amount` and returns how much was taken.
    pub fn remove(&mut self, amount: f32) -> f32 {
        let taken = amount.clamp(0.0, self.amount);
        self.amount -= taken;
        if self.amount < 0.0 {
            self.amount = 0.0;
        }
        taken
    }
}
