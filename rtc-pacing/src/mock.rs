//! Minimal recording module for unit tests.

use crate::module::{ModuleHandle, PacedPacketInfo, RetransmissionMode, RtpRtcpModule};
use parking_lot::Mutex;
use rtcp::transport_feedbacks::transport_layer_cc::TransportLayerCc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

pub(crate) struct FakeModule {
    ssrc: AtomicU32,
    sending: AtomicBool,
    bwe_extension: AtomicBool,
    retransmission_mode: RetransmissionMode,
    remb_active: AtomicBool,
    remb_status_calls: Mutex<Vec<bool>>,
    remb_data: Mutex<Vec<(u32, Vec<u32>)>>,
}

impl FakeModule {
    pub(crate) fn new(ssrc: u32) -> Arc<Self> {
        Self::build(ssrc, RetransmissionMode::Off)
    }

    pub(crate) fn handle(ssrc: u32) -> ModuleHandle {
        Self::new(ssrc)
    }

    pub(crate) fn with_retransmission_mode(ssrc: u32, mode: RetransmissionMode) -> ModuleHandle {
        Self::build(ssrc, mode)
    }

    fn build(ssrc: u32, retransmission_mode: RetransmissionMode) -> Arc<Self> {
        Arc::new(Self {
            ssrc: AtomicU32::new(ssrc),
            sending: AtomicBool::new(true),
            bwe_extension: AtomicBool::new(true),
            retransmission_mode,
            remb_active: AtomicBool::new(false),
            remb_status_calls: Mutex::new(vec![]),
            remb_data: Mutex::new(vec![]),
        })
    }

    pub(crate) fn remb_active(&self) -> bool {
        self.remb_active.load(Ordering::SeqCst)
    }

    pub(crate) fn remb_status_calls(&self) -> Vec<bool> {
        self.remb_status_calls.lock().clone()
    }

    pub(crate) fn remb_data(&self) -> Vec<(u32, Vec<u32>)> {
        self.remb_data.lock().clone()
    }
}

impl RtpRtcpModule for FakeModule {
    fn ssrc(&self) -> u32 {
        self.ssrc.load(Ordering::SeqCst)
    }

    fn is_sending_media(&self) -> bool {
        self.sending.load(Ordering::SeqCst)
    }

    fn send_timed_packet(
        &self,
        _ssrc: u32,
        _sequence_number: u16,
        _capture_time_ms: u64,
        _retransmission: bool,
        _pacing_info: &PacedPacketInfo,
    ) -> bool {
        true
    }

    fn send_padding(&self, bytes: usize, _pacing_info: &PacedPacketInfo) -> usize {
        bytes
    }

    fn send_feedback_packet(&self, _packet: &TransportLayerCc) -> bool {
        true
    }

    fn retransmission_mode(&self) -> RetransmissionMode {
        self.retransmission_mode
    }

    fn has_bandwidth_estimation_extension(&self) -> bool {
        self.bwe_extension.load(Ordering::SeqCst)
    }

    fn set_remb_active(&self, active: bool) {
        self.remb_active.store(active, Ordering::SeqCst);
        self.remb_status_calls.lock().push(active);
    }

    fn set_remb_data(&self, bitrate_bps: u32, ssrcs: &[u32]) {
        self.remb_data.lock().push((bitrate_bps, ssrcs.to_vec()));
    }
}
