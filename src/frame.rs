//! On-air frame format: a one-byte type tag, first on the wire, followed
//! by a type-specific payload.
//!
//! ```text
//! Byte 0     : type_tag   (0x01 = RTS, 0x02 = DATA)
//! Bytes 1..N : payload
//! ```
//! For RTS frames the payload is always the 5-byte sequence
//! `CA FE BA BE LL`: a sync word so a receiver can tell this protocol's
//! traffic apart from channel noise, followed by the announced length of
//! the DATA frame that will follow. [`crate::radio::RadioInterface`]
//! handles the type tag directly (`send_packet`'s `type_tag` argument,
//! `RxEvent`'s tag field); this module only ever deals in payload bytes.

/// Sync word prefixed to an RTS frame's payload.
pub const RTS_MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

/// Largest payload a single explicit-header DATA frame can carry. Matches
/// the one-byte length field carried in the corresponding RTS.
pub const MAX_PAYLOAD_LEN: usize = 255;

/// The two frame types this MAC puts on air. `Rts` announces intent to
/// send and carries the length of the `Data` frame that will follow;
/// `Data` carries the actual application payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
#[repr(u8)]
pub enum FrameType {
    Rts = 0x01,
    Data = 0x02,
}

/// The on-air tag for [`FrameType::Rts`], as a raw byte for
/// [`crate::radio::RadioInterface::send_packet`].
pub const RTS_TAG: u8 = FrameType::Rts as u8;
/// The on-air tag for [`FrameType::Data`].
pub const DATA_TAG: u8 = FrameType::Data as u8;

impl FrameType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            RTS_TAG => Some(Self::Rts),
            DATA_TAG => Some(Self::Data),
            _ => None,
        }
    }
}

/// A decoded RTS frame: the announced length of the DATA frame that will
/// follow it. The RTS carries no application payload of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct RtsFrame {
    pub data_len: u8,
}

impl RtsFrame {
    /// Encode the RTS *payload* — sync word plus length, 5 bytes. `out`
    /// must be at least that long. Returns the number of bytes written.
    pub fn encode(&self, out: &mut [u8]) -> usize {
        out[0..4].copy_from_slice(&RTS_MAGIC);
        out[4] = self.data_len;
        5
    }

    /// Decode an RTS payload, as handed back by
    /// [`crate::radio::RxEvent::payload`] (type tag already stripped by
    /// the radio). Returns `None` if the magic doesn't match or the
    /// buffer is too short — "not our frame", not an error worth
    /// surfacing.
    pub fn decode(payload: &[u8]) -> Option<Self> {
        if payload.len() < 5 || payload[0..4] != RTS_MAGIC {
            return None;
        }
        Some(Self {
            data_len: payload[4],
        })
    }
}
