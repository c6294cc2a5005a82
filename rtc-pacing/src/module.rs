//! RTP/RTCP module capability surface used by the packet router.

use rtcp::transport_feedbacks::transport_layer_cc::TransportLayerCc;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a registered RTP/RTCP module.
///
/// The router identifies modules by handle (pointer) identity, never by SSRC,
/// since a module's SSRC may change while it is registered.
pub type ModuleHandle = Arc<dyn RtpRtcpModule>;

/// Whether a module is registered on the send side or the receive side.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ModuleRole {
    Send,
    Receive,
}

impl fmt::Display for ModuleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            ModuleRole::Send => "send",
            ModuleRole::Receive => "receive",
        };
        write!(f, "{s}")
    }
}

/// RTX send status of a module.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RetransmissionMode {
    /// RTX disabled.
    #[default]
    Off,
    /// Lost packets are retransmitted over RTX.
    Retransmitted,
    /// Padding is produced by resending redundant payloads over RTX.
    RedundantPayloads,
    /// Both retransmissions and redundant payloads are sent over RTX.
    RetransmittedAndRedundantPayloads,
}

/// Pacing/probing metadata attached to every packet or padding request.
///
/// Opaque to the router: it is forwarded untouched to the chosen module.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PacedPacketInfo {
    pub probe_cluster_id: i32,
    pub probe_cluster_min_probes: i32,
    pub probe_cluster_min_bytes: i32,
    pub send_bitrate_bps: i32,
}

impl PacedPacketInfo {
    /// Cluster id used when a packet is not part of a probe cluster.
    pub const NOT_A_PROBE: i32 = -1;

    pub fn new(
        probe_cluster_id: i32,
        probe_cluster_min_probes: i32,
        probe_cluster_min_bytes: i32,
    ) -> Self {
        Self {
            probe_cluster_id,
            probe_cluster_min_probes,
            probe_cluster_min_bytes,
            send_bitrate_bps: -1,
        }
    }

    pub fn is_probe(&self) -> bool {
        self.probe_cluster_id != Self::NOT_A_PROBE
    }
}

impl Default for PacedPacketInfo {
    fn default() -> Self {
        Self::new(Self::NOT_A_PROBE, -1, -1)
    }
}

/// Capability surface of an RTP/RTCP module as seen by the packet router.
///
/// Methods take `&self`: a module is shared between its owning stream and the
/// router, and keeps whatever state it needs behind its own synchronization.
///
/// The router calls these methods while holding its internal lock, so an
/// implementation must never call back into the router from inside them.
pub trait RtpRtcpModule: Send + Sync {
    /// Current SSRC of the media stream this module sends.
    fn ssrc(&self) -> u32;

    /// Whether the module currently sends media. Non-sending modules are
    /// skipped for packets and padding.
    fn is_sending_media(&self) -> bool;

    /// Send the stored packet identified by `ssrc` and `sequence_number`.
    fn send_timed_packet(
        &self,
        ssrc: u32,
        sequence_number: u16,
        capture_time_ms: u64,
        retransmission: bool,
        pacing_info: &PacedPacketInfo,
    ) -> bool;

    /// Send up to `bytes` of padding, returning the number of bytes sent.
    fn send_padding(&self, bytes: usize, pacing_info: &PacedPacketInfo) -> usize;

    /// Send a transport-wide congestion control feedback packet.
    fn send_feedback_packet(&self, packet: &TransportLayerCc) -> bool;

    /// RTX configuration, queried once when the module is registered.
    fn retransmission_mode(&self) -> RetransmissionMode;

    /// Whether the module negotiated a bandwidth estimation header extension
    /// (transport-wide sequence numbers or absolute send time).
    fn has_bandwidth_estimation_extension(&self) -> bool;

    /// Turn REMB emission on or off. Driven exclusively by the router.
    fn set_remb_active(&self, active: bool);

    /// Provide the bitrate estimate and SSRCs for the next REMB packet.
    fn set_remb_data(&self, bitrate_bps: u32, ssrcs: &[u32]);
}
