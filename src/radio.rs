//! The capability surface the MAC requires of a radio. `MacCore` is
//! generic over this trait; it never depends on a concrete driver, which
//! is what lets it run against [`crate::mock::MockRadio`] in tests and
//! against a real SX1262 (or any other half-duplex packet radio) adapter
//! on hardware with no other code change.
//!
//! Every method reports failure as `false`/`None` rather than a `Result`:
//! per the error handling design, a radio-level fault (timeout, SPI
//! error, failed CRC) is indistinguishable to the MAC from "nothing
//! happened this poll", and is handled identically — back off and try
//! again. A concrete implementation is expected to log the underlying
//! fault itself before collapsing it to this contract.

use crate::frame::MAX_PAYLOAD_LEN;

const MAX_FRAME_LEN: usize = MAX_PAYLOAD_LEN + 1;

/// A single received frame: its type tag, payload, and link-quality
/// figures, captured as a fixed-size buffer rather than a borrowed slice
/// so the trait stays lifetime-free.
#[derive(Debug, Clone, Copy, defmt::Format)]
pub struct RxEvent {
    type_tag: u8,
    buf: [u8; MAX_FRAME_LEN],
    len: usize,
    /// Received signal strength, in dBm.
    pub rssi_dbm: i16,
    /// Signal-to-noise ratio, in dB.
    pub snr_db: f32,
}

impl RxEvent {
    /// Build an `RxEvent` from a decoded frame's type tag and payload
    /// bytes (the payload alone — the tag is not repeated in it). Returns
    /// `None` if `payload` is longer than this type can hold, which never
    /// happens for a frame this crate itself produced.
    pub fn new(type_tag: u8, payload: &[u8], rssi_dbm: i16, snr_db: f32) -> Option<Self> {
        if payload.len() > MAX_FRAME_LEN {
            return None;
        }
        let mut buf = [0u8; MAX_FRAME_LEN];
        buf[..payload.len()].copy_from_slice(payload);
        Some(Self {
            type_tag,
            buf,
            len: payload.len(),
            rssi_dbm,
            snr_db,
        })
    }

    pub fn type_tag(&self) -> u8 {
        self.type_tag
    }

    pub fn payload(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// What `MacCore` needs from a radio, per the MAC/radio interface seam.
pub trait RadioInterface {
    /// Run one Channel Activity Detection cycle. Returns `true` if
    /// activity is sensed. Known unreliable at range — the MAC treats
    /// `true` as advisory and `false` as inconclusive, never as proof the
    /// channel is clear. Implementations should complete within roughly
    /// 100ms, returning `false` on their own internal timeout rather than
    /// blocking indefinitely.
    fn cad(&mut self) -> bool;

    /// Arm the receiver for up to `timeout_ms` milliseconds.
    /// `timeout_ms == 0` means continuous reception until the next
    /// `start_rx` or `send_packet` call.
    fn start_rx(&mut self, timeout_ms: u32);

    /// Nonblocking poll: `true` once a complete packet has been decoded
    /// and is waiting in [`Self::read_packet`].
    fn rx_done(&mut self) -> bool;

    /// Consume the pending packet. Returns `None` on CRC failure, an
    /// empty buffer, or if nothing is actually pending — all three are
    /// "not a usable frame", handled identically by the MAC.
    fn read_packet(&mut self) -> Option<RxEvent>;

    /// Transmit `payload_bytes` with the on-air type tag `type_tag` set
    /// as the first byte, blocking until the radio reports the
    /// transmission complete. Returns `false` on a driver fault or a
    /// generous internal timeout (on real hardware, on the order of 10s).
    fn send_packet(&mut self, payload_bytes: &[u8], type_tag: u8) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rx_event_round_trips_payload() {
        let payload = [1u8, 2, 3, 4, 5];
        let ev = RxEvent::new(0x02, &payload, -42, 7.5).unwrap();
        assert_eq!(ev.type_tag(), 0x02);
        assert_eq!(ev.payload(), &payload);
        assert_eq!(ev.rssi_dbm, -42);
    }

    #[test]
    fn rx_event_rejects_oversized_input() {
        let bytes = [0u8; MAX_FRAME_LEN + 1];
        assert!(RxEvent::new(0x02, &bytes, 0, 0.0).is_none());
    }
}
