//! REMB Arbiter - picks the single module allowed to emit REMB and throttles
//! how often a new receive-side bitrate estimate is forwarded to it.

use crate::module::{ModuleHandle, ModuleRole};
use crate::registry::ModuleRegistry;
use log::{debug, trace};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum time between two throttled REMB updates.
pub(crate) const DEFAULT_REMB_SEND_INTERVAL: Duration = Duration::from_millis(1000);

/// An estimate at or below this percentage of the last sent value bypasses
/// the send interval.
pub(crate) const DEFAULT_REMB_DECREASE_THRESHOLD_PERCENT: u32 = 97;

pub(crate) struct RembArbiter {
    active: Option<ModuleHandle>,
    last_sent_bitrate_bps: Option<u32>,
    /// Starts at construction time, so no REMB is sent by interval before one
    /// full interval has elapsed.
    last_send_time: Instant,
    send_interval: Duration,
    decrease_threshold_percent: u32,
}

impl RembArbiter {
    pub(crate) fn new(
        now: Instant,
        send_interval: Duration,
        decrease_threshold_percent: u32,
    ) -> Self {
        Self {
            active: None,
            last_sent_bitrate_bps: None,
            last_send_time: now,
            send_interval,
            decrease_threshold_percent,
        }
    }

    pub(crate) fn active(&self) -> Option<&ModuleHandle> {
        self.active.as_ref()
    }

    /// Re-evaluate the active module against the registry.
    ///
    /// The first send-side candidate wins; without one, the first
    /// receive-side candidate. Only the modules whose state actually changes
    /// are notified.
    pub(crate) fn determine_active_module(&mut self, registry: &ModuleRegistry) {
        let next = registry
            .first_remb_candidate(ModuleRole::Send)
            .or_else(|| registry.first_remb_candidate(ModuleRole::Receive))
            .cloned();

        let unchanged = match (&self.active, &next) {
            (Some(current), Some(next)) => Arc::ptr_eq(current, next),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        if let Some(previous) = self.active.take() {
            debug!("remb deactivated on module ssrc={}", previous.ssrc());
            previous.set_remb_active(false);
        }
        if let Some(next) = &next {
            debug!("remb activated on module ssrc={}", next.ssrc());
            next.set_remb_active(true);
        }
        self.active = next;
    }

    /// Handle a new receive-side bitrate estimate.
    ///
    /// Returns whether REMB data was forwarded to the active module.
    pub(crate) fn on_receive_bitrate_changed(
        &mut self,
        now: Instant,
        ssrcs: &[u32],
        bitrate_bps: u32,
    ) -> bool {
        let Some(active) = &self.active else {
            trace!("no active remb module, dropping estimate {bitrate_bps} bps");
            return false;
        };

        let threshold = u64::from(self.decrease_threshold_percent);
        let decreased = self
            .last_sent_bitrate_bps
            .is_some_and(|last| u64::from(bitrate_bps) * 100 <= u64::from(last) * threshold);
        let interval_elapsed =
            now.saturating_duration_since(self.last_send_time) >= self.send_interval;

        if !decreased && !interval_elapsed {
            trace!(
                "remb throttled: estimate {bitrate_bps} bps, last sent {:?} bps",
                self.last_sent_bitrate_bps
            );
            return false;
        }

        trace!("remb update {bitrate_bps} bps for ssrcs {ssrcs:?}");
        active.set_remb_data(bitrate_bps, ssrcs);
        self.last_sent_bitrate_bps = Some(bitrate_bps);
        self.last_send_time = now;
        true
    }

    /// Forward REMB data to the active module right away, leaving the
    /// throttle state untouched.
    pub(crate) fn send_remb(&self, bitrate_bps: u32, ssrcs: &[u32]) -> bool {
        match &self.active {
            Some(active) => {
                active.set_remb_data(bitrate_bps, ssrcs);
                true
            }
            None => false,
        }
    }
}
