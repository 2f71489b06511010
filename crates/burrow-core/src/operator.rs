//! Operator control state for a running simulation.
//!
//! [`OperatorState`] is shared between the run loop and whatever drives it
//! from outside (a signal handler, a test, an embedding application). The
//! host can pause and resume, change the tick interval, request spawns,
//! raise or clear the emergency, and stop the run. The loop picks the
//! requests up between ticks.
//!
//! All flags are atomics so the loop reads them without taking locks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use burrow_types::AgentKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

use crate::config::SimulationBoundsConfig;

/// Smallest tick interval the operator may set.
pub const MIN_TICK_INTERVAL_MS: u64 = 10;

/// Reason why the simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
    /// An operator issued a stop command.
    OperatorStop,
    /// Every resource node has been emptied.
    NodesExhausted,
}

/// Shared operator control state.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether the simulation is currently paused.
    paused: AtomicBool,
    /// Notification used to wake the run loop when resumed.
    resume_notify: Notify,
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,
    /// Whether the emergency should be in force.
    emergency: AtomicBool,
    /// Current tick interval in milliseconds (runtime-adjustable).
    tick_interval_ms: AtomicU64,
    /// Wall-clock time when the simulation started.
    started_at: DateTime<Utc>,
    /// Maximum number of ticks (0 = unlimited).
    max_ticks: u64,
    /// Maximum wall-clock seconds (0 = unlimited).
    max_real_time_seconds: u64,
    /// Spawns requested by the operator, in request order.
    spawn_requests: Mutex<Vec<AgentKind>>,
    /// Reason the simulation ended, if it has.
    end_reason: Mutex<Option<SimulationEndReason>>,
}

impl OperatorState {
    /// Create a new operator state from configuration.
    pub fn new(bounds: &SimulationBoundsConfig) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            emergency: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(bounds.tick_interval_ms),
            started_at: Utc::now(),
            max_ticks: bounds.max_ticks,
            max_real_time_seconds: bounds.max_real_time_seconds,
            spawn_requests: Mutex::new(Vec::new()),
            end_reason: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Check whether the simulation is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the simulation. The run loop sleeps until resumed.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the simulation and wake the run loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the simulation is no longer paused.
    pub async fn wait_if_paused(&self) {
        while self.paused.load(Ordering::Acquire) {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean simulation stop. Also wakes a paused loop so it can
    /// observe the request.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        if self.is_paused() {
            self.resume();
        }
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Record the reason the simulation ended.
    pub async fn set_end_reason(&self, reason: SimulationEndReason) {
        let mut guard = self.end_reason.lock().await;
        *guard = Some(reason);
    }

    /// Get the reason the simulation ended, if it has.
    pub async fn end_reason(&self) -> Option<SimulationEndReason> {
        *self.end_reason.lock().await
    }

    // -----------------------------------------------------------------------
    // Emergency
    // -----------------------------------------------------------------------

    /// Ask for the emergency to be raised or cleared at the next tick.
    pub fn set_emergency(&self, on: bool) {
        self.emergency.store(on, Ordering::Release);
    }

    /// Whether the emergency should be in force.
    pub fn emergency_requested(&self) -> bool {
        self.emergency.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Tick Speed
    // -----------------------------------------------------------------------

    /// Get the current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Set the tick interval in milliseconds.
    ///
    /// Returns the previous interval, or `None` if the value is below
    /// [`MIN_TICK_INTERVAL_MS`].
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_TICK_INTERVAL_MS {
            return None;
        }
        Some(self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Returns `true` if `max_ticks > 0` and `current_tick >= max_ticks`.
    pub const fn tick_limit_reached(&self, current_tick: u64) -> bool {
        self.max_ticks > 0 && current_tick >= self.max_ticks
    }

    /// Returns `true` if `max_real_time_seconds > 0` and that many seconds
    /// have passed since start.
    pub fn time_limit_reached(&self) -> bool {
        self.max_real_time_seconds > 0 && self.elapsed_seconds() >= self.max_real_time_seconds
    }

    /// Return the wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Return elapsed seconds since simulation start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now().signed_duration_since(self.started_at).num_seconds();
        // Negative if the wall clock stepped backwards.
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Get the configured max ticks.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Get the configured max real-time seconds.
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.max_real_time_seconds
    }

    // -----------------------------------------------------------------------
    // Spawn Requests
    // -----------------------------------------------------------------------

    /// Queue a spawn for the next tick.
    pub async fn request_spawn(&self, kind: AgentKind) {
        self.spawn_requests.lock().await.push(kind);
    }

    /// Drain all queued spawn requests.
    pub async fn drain_spawn_requests(&self) -> Vec<AgentKind> {
        std::mem::take(&mut *self.spawn_requests.lock().await)
    }
}
