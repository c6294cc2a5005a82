
use crate::error::{Error, Result};
use crate::module::{ModuleHandle, ModuleRole, PacedPacketInfo};
use crate::registry::ModuleRegistry;
use crate::remb::{
    DEFAULT_REMB_DECREASE_THRESHOLD_PERCENT, DEFAULT_REMB_SEND_INTERVAL, RembArbiter,
};
use crate::sequence::SequenceNumberAllocator;
use log::{debug, trace};
use parking_lot::Mutex;
use rtcp::transport_feedbacks::transport_layer_cc::TransportLayerCc;
use std::time::{Duration, Instant};

/// Builder for the [`PacketRouter`].
///
/// # Example
///
/// ```ignore
/// use rtc_pacing::PacketRouterBuilder;
/// use std::time::{Duration, Instant};
///
/// let router = PacketRouterBuilder::new()
///     .with_remb_send_interval(Duration::from_millis(500))
///     .with_remb_decrease_threshold_percent(95)
///     .build(Instant::now())?;
/// ```
#[derive(Debug, Clone)]
pub struct PacketRouterBuilder {
    remb_send_interval: Duration,
    remb_decrease_threshold_percent: u32,
    transport_sequence_number: u16,
}

impl Default for PacketRouterBuilder {
    fn default() -> Self {
        Self {
            remb_send_interval: DEFAULT_REMB_SEND_INTERVAL,
            remb_decrease_threshold_percent: DEFAULT_REMB_DECREASE_THRESHOLD_PERCENT,
            transport_sequence_number: 0,
        }
    }
}

impl PacketRouterBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum interval between two REMB updates for a stable or growing
    /// estimate. Defaults to 1 second.
    pub fn with_remb_send_interval(mut self, interval: Duration) -> Self {
        self.remb_send_interval = interval;
        self
    }

    /// An estimate at or below this percentage of the last sent estimate is
    /// forwarded immediately. Defaults to 97.
    pub fn with_remb_decrease_threshold_percent(mut self, percent: u32) -> Self {
        self.remb_decrease_threshold_percent = percent;
        self
    }

    /// Initial transport-wide sequence number; the first allocation returns
    /// this value plus one.
    pub fn with_transport_sequence_number(mut self, sequence_number: u16) -> Self {
        self.transport_sequence_number = sequence_number;
        self
    }

    /// Build the router. `now` starts the REMB send interval.
    pub fn build(self, now: Instant) -> Result<PacketRouter> {
        if !(1..=100).contains(&self.remb_decrease_threshold_percent) {
            return Err(Error::InvalidRembDecreaseThreshold(
                self.remb_decrease_threshold_percent,
            ));
        }

        Ok(self.into_router(now))
    }

    fn into_router(self, now: Instant) -> PacketRouter {
        PacketRouter {
            state: Mutex::new(RouterState {
                registry: ModuleRegistry::new(),
                remb: RembArbiter::new(
                    now,
                    self.remb_send_interval,
                    self.remb_decrease_threshold_percent,
                ),
                sequence: SequenceNumberAllocator::new(self.transport_sequence_number),
            }),
        }
    }
}

struct RouterState {
    registry: ModuleRegistry,
    remb: RembArbiter,
    sequence: SequenceNumberAllocator,
}

/// Routes paced packets, padding and transport feedback to registered
/// RTP/RTCP modules, and arbitrates which module emits REMB.
///
/// All state sits behind one lock, so the router can be shared between the
/// pacer thread and the thread managing streams. Module callbacks run while
/// the lock is held; see [`RtpRtcpModule`](crate::RtpRtcpModule).
///
/// Registering a module twice, or removing one that was never registered,
/// is a caller bug and panics.
pub struct PacketRouter {
    state: Mutex<RouterState>,
}

impl PacketRouter {
    /// Create a router with default settings.
    pub fn new(now: Instant) -> Self {
        PacketRouterBuilder::new().into_router(now)
    }

    pub fn add_send_module(&self, module: ModuleHandle, remb_candidate: bool) {
        self.add_module(ModuleRole::Send, module, remb_candidate);
    }

    pub fn remove_send_module(&self, module: &ModuleHandle) {
        self.remove_module(ModuleRole::Send, module);
    }

    pub fn add_receive_module(&self, module: ModuleHandle, remb_candidate: bool) {
        self.add_module(ModuleRole::Receive, module, remb_candidate);
    }

    pub fn remove_receive_module(&self, module: &ModuleHandle) {
        self.remove_module(ModuleRole::Receive, module);
    }

    fn add_module(&self, role: ModuleRole, module: ModuleHandle, remb_candidate: bool) {
        let mut state = self.state.lock();
        let RouterState { registry, remb, .. } = &mut *state;

        let ssrc = module.ssrc();
        if let Err(err) = registry.add(role, module, remb_candidate) {
            panic!("{err}");
        }
        debug!("added {role} module ssrc={ssrc} remb_candidate={remb_candidate}");
        remb.determine_active_module(registry);
    }

    fn remove_module(&self, role: ModuleRole, module: &ModuleHandle) {
        let mut state = self.state.lock();
        let RouterState { registry, remb, .. } = &mut *state;

        if let Err(err) = registry.remove(role, module) {
            panic!("{err}");
        }
        debug!("removed {role} module ssrc={}", module.ssrc());
        remb.determine_active_module(registry);
    }

    /// Send the packet `ssrc`/`sequence_number` on the first sending module
    /// whose SSRC matches.
    ///
    /// Returns `true` when no sending module claims the SSRC, even though
    /// nothing was sent: `true` does not mean the packet went out.
    pub fn time_to_send_packet(
        &self,
        ssrc: u32,
        sequence_number: u16,
        capture_time_ms: u64,
        retransmission: bool,
        pacing_info: &PacedPacketInfo,
    ) -> bool {
        let state = self.state.lock();
        for module in state.registry.modules(ModuleRole::Send) {
            let handle = &module.handle;
            if !handle.is_sending_media() {
                continue;
            }
            if handle.ssrc() == ssrc {
                return handle.send_timed_packet(
                    ssrc,
                    sequence_number,
                    capture_time_ms,
                    retransmission,
                    pacing_info,
                );
            }
        }

        trace!("no sending module for ssrc={ssrc} seq={sequence_number}, packet dropped");
        true
    }

    /// Spread a padding request over the sending modules, redundant-payload
    /// RTX modules first, and return the number of bytes actually sent.
    pub fn time_to_send_padding(&self, bytes: usize, pacing_info: &PacedPacketInfo) -> usize {
        let state = self.state.lock();
        let mut remaining = bytes;
        let mut total_sent = 0usize;

        for module in state.registry.padding_candidates() {
            if remaining == 0 {
                break;
            }
            let handle = &module.handle;
            if !handle.is_sending_media() || !handle.has_bandwidth_estimation_extension() {
                continue;
            }

            let sent = handle.send_padding(remaining, pacing_info);
            trace!("padding: sent {sent} of {remaining} bytes");
            total_sent = total_sent.saturating_add(sent);
            remaining = remaining.saturating_sub(sent);
        }

        total_sent
    }

    /// Hand a transport feedback packet to the first module accepting it,
    /// trying send modules before receive modules.
    pub fn send_transport_feedback(&self, packet: &TransportLayerCc) -> bool {
        let state = self.state.lock();
        let sent = state
            .registry
            .modules(ModuleRole::Send)
            .iter()
            .chain(state.registry.modules(ModuleRole::Receive))
            .any(|module| module.handle.send_feedback_packet(packet));

        if !sent {
            trace!("no module accepted transport feedback");
        }
        sent
    }

    /// Handle a new receive-side bitrate estimate, forwarding it to the
    /// active REMB module if it clears the send interval or is a large
    /// enough decrease.
    pub fn on_receive_bitrate_changed(&self, now: Instant, ssrcs: &[u32], bitrate_bps: u32) {
        let mut state = self.state.lock();
        let RouterState { registry, remb, .. } = &mut *state;

        remb.determine_active_module(registry);
        remb.on_receive_bitrate_changed(now, ssrcs, bitrate_bps);
    }

    /// Forward REMB data to the active module immediately.
    ///
    /// Returns `false` if no module is active.
    pub fn send_remb(&self, bitrate_bps: u32, ssrcs: &[u32]) -> bool {
        self.state.lock().remb.send_remb(bitrate_bps, ssrcs)
    }

    pub fn set_transport_wide_sequence_number(&self, sequence_number: u16) {
        self.state.lock().sequence.set(sequence_number);
    }

    pub fn allocate_sequence_number(&self) -> u16 {
        self.state.lock().sequence.allocate()
    }

    /// Last allocated (or last set) transport-wide sequence number.
    pub fn transport_sequence_number(&self) -> u16 {
        self.state.lock().sequence.current()
    }

    pub fn send_module_count(&self) -> usize {
        self.state.lock().registry.modules(ModuleRole::Send).len()
    }

    pub fn receive_module_count(&self) -> usize {
        self.state.lock().registry.modules(ModuleRole::Receive).len()
    }

    /// SSRC of the module currently emitting REMB, if any.
    pub fn active_remb_ssrc(&self) -> Option<u32> {
        self.state.lock().remb.active().map(|module| module.ssrc())
    }
}
