//! # Keyboard Service
//!
//! This crate hosts the keyboard input core and fans its state out to
//! presentation viewers.
//!
//! ## Philosophy
//!
//! - **Explicit subscriptions**: State is not ambient; viewers must request it
//! - **Capability-based**: Subscriptions are capabilities that can be revoked
//! - **Snapshots, not diffs**: Viewers receive the whole editing state each time
//! - **Single source of truth**: One core feeds every viewer the same state
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A renderer (no keycap layout, no highlight painting)
//! - A hardware driver (no scancodes, no interrupts)
//! - A focus router (which viewer is on screen is host policy)

use core::fmt;

use keyboard_core::{CoreOutcome, CoreSnapshot, KeyboardCore};
use keyboard_types::KeyId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

pub mod ticks;

pub use ticks::{ManualTicks, TickSource};

/// Identity of a presentation viewer (a renderer, a mirror, a test double)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewerId(Uuid);

impl ViewerId {
    /// Creates a new random viewer ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a viewer ID from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ViewerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Viewer({})", self.0)
    }
}

/// Snapshot subscription capability
///
/// Represents the right to receive keyboard state snapshots.
/// When revoked, no more snapshots are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotSubscription {
    /// Unique subscription ID
    pub id: u64,
    /// Viewer that owns this subscription
    pub viewer: ViewerId,
}

impl SnapshotSubscription {
    /// Creates a new snapshot subscription capability
    pub fn new(id: u64, viewer: ViewerId) -> Self {
        Self { id, viewer }
    }
}

/// Keyboard service error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyboardServiceError {
    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(u64),

    #[error("Subscription already exists for viewer: {0}")]
    SubscriptionAlreadyExists(ViewerId),

    #[error("Invalid subscription capability")]
    InvalidCapability,

    #[error("Snapshot delivery failed: {reason}")]
    DeliveryFailed { reason: String },
}

/// Encodes a snapshot as JSON for transport to an out-of-process viewer.
pub fn encode_snapshot(snapshot: &CoreSnapshot) -> Result<String, KeyboardServiceError> {
    serde_json::to_string(snapshot).map_err(|err| KeyboardServiceError::DeliveryFailed {
        reason: err.to_string(),
    })
}

/// Decodes a snapshot previously produced by encode_snapshot.
///
/// A payload whose selection violates the buffer's bounds invariant is
/// rejected here, so malformed frames fail at the boundary instead of
/// inside a later edit.
pub fn decode_snapshot(payload: &str) -> Result<CoreSnapshot, KeyboardServiceError> {
    let snapshot: CoreSnapshot =
        serde_json::from_str(payload).map_err(|err| KeyboardServiceError::DeliveryFailed {
            reason: err.to_string(),
        })?;

    if !snapshot.buffer.selection_in_bounds() {
        return Err(KeyboardServiceError::DeliveryFailed {
            reason: "selection out of bounds".to_string(),
        });
    }

    Ok(snapshot)
}

/// Sink interface for delivering snapshots (queue, channel, test double).
pub trait SnapshotSink {
    fn deliver(
        &mut self,
        cap: &SnapshotSubscription,
        snapshot: &CoreSnapshot,
    ) -> Result<(), KeyboardServiceError>;
}

/// Snapshot subscription record
#[derive(Debug, Clone)]
struct Subscription {
    cap: SnapshotSubscription,
    active: bool,
    deliveries: u64,
}

impl Subscription {
    fn new(cap: SnapshotSubscription) -> Self {
        Self {
            cap,
            active: true,
            deliveries: 0,
        }
    }
}

/// Keyboard service
///
/// Owns one input core and manages snapshot subscriptions. Every processed
/// trigger ends with a broadcast of the fresh snapshot to all active
/// subscriptions. Does NOT decide which viewer is visible (host policy).
pub struct KeyboardService {
    /// The input state machine being hosted
    core: KeyboardCore,
    /// Next subscription ID
    next_subscription_id: u64,
    /// Subscriptions by ID
    subscriptions: HashMap<u64, Subscription>,
    /// Viewer to subscription mapping (for lookup)
    viewer_subscriptions: HashMap<ViewerId, u64>,
    /// Total snapshots delivered across all subscriptions (for diagnostics)
    snapshots_delivered: u64,
}

impl KeyboardService {
    /// Creates a service around a fresh core
    pub fn new() -> Self {
        Self::with_core(KeyboardCore::new())
    }

    /// Creates a service around an existing core (e.g. preloaded content)
    pub fn with_core(core: KeyboardCore) -> Self {
        Self {
            core,
            next_subscription_id: 1,
            subscriptions: HashMap::new(),
            viewer_subscriptions: HashMap::new(),
            snapshots_delivered: 0,
        }
    }

    /// Subscribes a viewer to state snapshots
    ///
    /// Returns a capability that represents the subscription.
    /// Only one subscription per viewer is allowed.
    pub fn subscribe(
        &mut self,
        viewer: ViewerId,
    ) -> Result<SnapshotSubscription, KeyboardServiceError> {
        if self.viewer_subscriptions.contains_key(&viewer) {
            return Err(KeyboardServiceError::SubscriptionAlreadyExists(viewer));
        }

        let id = self.next_subscription_id;
        self.next_subscription_id += 1;

        let cap = SnapshotSubscription::new(id, viewer);
        let subscription = Subscription::new(cap);

        self.subscriptions.insert(id, subscription);
        self.viewer_subscriptions.insert(viewer, id);

        Ok(cap)
    }

    /// Revokes a subscription
    ///
    /// After revocation the subscription still exists but no more
    /// snapshots are delivered to it.
    pub fn revoke_subscription(
        &mut self,
        cap: &SnapshotSubscription,
    ) -> Result<(), KeyboardServiceError> {
        let subscription = self
            .subscriptions
            .get_mut(&cap.id)
            .ok_or(KeyboardServiceError::SubscriptionNotFound(cap.id))?;

        // Verify ownership
        if subscription.cap.viewer != cap.viewer {
            return Err(KeyboardServiceError::InvalidCapability);
        }

        subscription.active = false;
        Ok(())
    }

    /// Unsubscribes a viewer completely (removes the subscription)
    pub fn unsubscribe(&mut self, cap: &SnapshotSubscription) -> Result<(), KeyboardServiceError> {
        let subscription = self
            .subscriptions
            .get(&cap.id)
            .ok_or(KeyboardServiceError::SubscriptionNotFound(cap.id))?;

        // Verify ownership
        if subscription.cap.viewer != cap.viewer {
            return Err(KeyboardServiceError::InvalidCapability);
        }

        self.subscriptions.remove(&cap.id);
        self.viewer_subscriptions.remove(&cap.viewer);

        Ok(())
    }

    /// Validates delivery to a specific subscription
    ///
    /// Returns Ok(true) if the subscription may receive snapshots,
    /// Ok(false) if it is revoked, Err if it doesn't exist.
    pub fn deliver_snapshot(
        &self,
        cap: &SnapshotSubscription,
        _snapshot: &CoreSnapshot,
    ) -> Result<bool, KeyboardServiceError> {
        let subscription = self
            .subscriptions
            .get(&cap.id)
            .ok_or(KeyboardServiceError::SubscriptionNotFound(cap.id))?;

        // Verify ownership
        if subscription.cap.viewer != cap.viewer {
            return Err(KeyboardServiceError::InvalidCapability);
        }

        Ok(subscription.active)
    }

    /// Delivers a snapshot to one subscription via a sink.
    ///
    /// Returns Ok(true) if delivered, Ok(false) if the subscription is
    /// revoked (the sink is not invoked).
    pub fn deliver_snapshot_with<S: SnapshotSink>(
        &mut self,
        cap: &SnapshotSubscription,
        snapshot: &CoreSnapshot,
        sink: &mut S,
    ) -> Result<bool, KeyboardServiceError> {
        let active = self.deliver_snapshot(cap, snapshot)?;
        if active {
            sink.deliver(cap, snapshot)?;
            self.record_delivery(cap.id);
        }
        Ok(active)
    }

    /// Presses a keycap, then broadcasts the resulting state
    pub fn press<S: SnapshotSink>(
        &mut self,
        key: KeyId,
        sink: &mut S,
    ) -> Result<CoreOutcome, KeyboardServiceError> {
        let outcome = self.core.press(key);
        self.broadcast(sink)?;
        Ok(outcome)
    }

    /// Releases the held keycap, then broadcasts the resulting state
    pub fn release<S: SnapshotSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<CoreOutcome, KeyboardServiceError> {
        let outcome = self.core.release();
        self.broadcast(sink)?;
        Ok(outcome)
    }

    /// Handles the pointer leaving the held keycap, then broadcasts
    pub fn leave<S: SnapshotSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<CoreOutcome, KeyboardServiceError> {
        let outcome = self.core.leave();
        self.broadcast(sink)?;
        Ok(outcome)
    }

    /// Flips the one-shot Shift modifier, then broadcasts
    pub fn toggle_shift<S: SnapshotSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<CoreOutcome, KeyboardServiceError> {
        let outcome = self.core.toggle_shift();
        self.broadcast(sink)?;
        Ok(outcome)
    }

    /// Flips the CapsLock modifier, then broadcasts
    pub fn toggle_caps_lock<S: SnapshotSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<CoreOutcome, KeyboardServiceError> {
        let outcome = self.core.toggle_caps_lock();
        self.broadcast(sink)?;
        Ok(outcome)
    }

    /// Polls the tick source and fires any repeats that came due.
    ///
    /// Returns the number of repeat cycles that ran. Broadcasts at most
    /// once per poll: repeat cycles mutate the same buffer, so viewers
    /// only need the final state.
    pub fn poll<S: SnapshotSink>(
        &mut self,
        timer: &mut dyn TickSource,
        sink: &mut S,
    ) -> Result<usize, KeyboardServiceError> {
        let now = timer.poll_ticks();
        let fired = self.core.pump(now);
        if fired > 0 {
            self.broadcast(sink)?;
        }
        Ok(fired)
    }

    /// Checks if a subscription is active
    pub fn is_subscription_active(&self, cap: &SnapshotSubscription) -> bool {
        self.subscriptions
            .get(&cap.id)
            .map(|s| s.active && s.cap.viewer == cap.viewer)
            .unwrap_or(false)
    }

    /// Returns the subscription for a viewer, if any
    pub fn viewer_subscription(&self, viewer: ViewerId) -> Option<SnapshotSubscription> {
        self.viewer_subscriptions
            .get(&viewer)
            .and_then(|sub_id| self.subscriptions.get(sub_id))
            .map(|sub| sub.cap)
    }

    /// Returns the number of active subscriptions
    pub fn active_subscription_count(&self) -> usize {
        self.subscriptions.values().filter(|s| s.active).count()
    }

    /// Returns the total number of subscriptions (active + revoked)
    pub fn total_subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns the total number of snapshots delivered to viewers
    pub fn snapshots_delivered(&self) -> u64 {
        self.snapshots_delivered
    }

    /// Returns how many snapshots one subscription has received
    pub fn subscription_deliveries(&self, cap: &SnapshotSubscription) -> Option<u64> {
        self.subscriptions
            .get(&cap.id)
            .filter(|s| s.cap.viewer == cap.viewer)
            .map(|s| s.deliveries)
    }

    /// Returns the current editing state
    pub fn snapshot(&self) -> CoreSnapshot {
        self.core.snapshot()
    }

    /// Returns the hosted core
    pub fn core(&self) -> &KeyboardCore {
        &self.core
    }

    /// Returns the hosted core for host-side edits (selection, content)
    pub fn core_mut(&mut self) -> &mut KeyboardCore {
        &mut self.core
    }

    /// Delivers the current snapshot to every active subscription.
    ///
    /// The core has already committed its mutation when this runs, so a
    /// failing sink leaves the core advanced and delivery incomplete.
    fn broadcast<S: SnapshotSink>(&mut self, sink: &mut S) -> Result<(), KeyboardServiceError> {
        let snapshot = self.core.snapshot();

        // Ascending ID keeps fan-out order stable across runs
        let mut targets: Vec<SnapshotSubscription> = self
            .subscriptions
            .values()
            .filter(|s| s.active)
            .map(|s| s.cap)
            .collect();
        targets.sort_unstable_by_key(|cap| cap.id);

        for cap in targets {
            sink.deliver(&cap, &snapshot)?;
            self.record_delivery(cap.id);
        }
        Ok(())
    }

    fn record_delivery(&mut self, id: u64) {
        if let Some(subscription) = self.subscriptions.get_mut(&id) {
            subscription.deliveries += 1;
        }
        self.snapshots_delivered += 1;
    }
}

impl Default for KeyboardService {
    fn default() -> Self {
        Self::new()
    }
}
