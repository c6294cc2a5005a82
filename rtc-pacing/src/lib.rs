//! RTC Pacing - send-side packet and feedback router.
//!
//! The [`PacketRouter`] sits between the pacer and the set of RTP/RTCP modules
//! of a call. For every paced packet or padding opportunity it decides which
//! registered module transmits, it routes transport-wide congestion control
//! feedback, hands out transport-wide sequence numbers, and elects the single
//! module allowed to emit REMB (Receiver Estimated Maximum Bitrate).
//!
//! # Responsibilities
//!
//! | Part | Description |
//! |------|-------------|
//! | Module registry | Ordered send and receive module collections, identity by handle |
//! | Packet dispatch | [`time_to_send_packet`](PacketRouter::time_to_send_packet), [`time_to_send_padding`](PacketRouter::time_to_send_padding), [`send_transport_feedback`](PacketRouter::send_transport_feedback) |
//! | REMB arbitration | Active module election and update throttling in [`on_receive_bitrate_changed`](PacketRouter::on_receive_bitrate_changed) |
//! | Sequence numbers | Wrapping 16-bit transport-wide counter |
//!
//! # Time
//!
//! Like the rest of the stack, the router never reads the clock itself: the
//! construction time and the time of each bitrate update are passed in as
//! [`Instant`](std::time::Instant).
//!
//! # Example
//!
//! ```ignore
//! use rtc_pacing::{PacedPacketInfo, PacketRouter};
//! use std::sync::Arc;
//! use std::time::Instant;
//!
//! let router = Arc::new(PacketRouter::new(Instant::now()));
//! router.add_send_module(video_module.clone(), true);
//! router.add_receive_module(audio_receive_module.clone(), true);
//!
//! // Pacer context
//! router.time_to_send_packet(ssrc, seq, capture_time_ms, false, &PacedPacketInfo::default());
//! let sent = router.time_to_send_padding(500, &PacedPacketInfo::new(1, 5, 1000));
//!
//! // Congestion controller context
//! router.on_receive_bitrate_changed(Instant::now(), &[ssrc], 300_000);
//!
//! router.remove_send_module(&video_module);
//! ```

#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod error;
mod module;
mod registry;
mod remb;
mod router;
mod sequence;

#[cfg(test)]
mod mock;

pub use error::{Error, Result};
pub use module::{
    ModuleHandle, ModuleRole, PacedPacketInfo, RetransmissionMode, RtpRtcpModule,
};
pub use router::{PacketRouter, PacketRouterBuilder};
