//! Air-time estimation: how long a frame of a given length occupies the
//! channel. The MAC uses this to size its NAV deferral and its listen
//! windows, so every model here is expected to round up rather than down —
//! an over-estimate costs a little throughput; an under-estimate risks a
//! collision.

/// Something that can estimate how long a frame takes to transmit, in
/// milliseconds, given only its on-air length in bytes.
pub trait AirTimeModel {
    fn time_on_air_ms(&self, payload_len: usize) -> u32;
}

/// A simple affine model: `base_ms + per_byte_ms * len`, calibrated against
/// a fixed SF/BW/CR combination. Cheap, no floating point, and close
/// enough for NAV sizing — it does not need to be exact, only a safe upper
/// bound.
///
/// The defaults correspond to SF12/BW125, the most conservative (longest
/// air-time) configuration this crate's `RadioParams` allows, matching the
/// spec's fixed air-time assumption.
#[derive(Debug, Clone, Copy, PartialEq, defmt::Format)]
pub struct FixedAirTimeModel {
    base_ms: u32,
    per_byte_ms: u32,
}

impl FixedAirTimeModel {
    pub fn new(base_ms: u32, per_byte_ms: u32) -> Self {
        Self {
            base_ms,
            per_byte_ms,
        }
    }
}

impl Default for FixedAirTimeModel {
    /// SF12/BW125, calibrated against an 8-byte RTS and a handful of small
    /// DATA frames.
    fn default() -> Self {
        Self {
            base_ms: 401,
            per_byte_ms: 37,
        }
    }
}

impl AirTimeModel for FixedAirTimeModel {
    fn time_on_air_ms(&self, payload_len: usize) -> u32 {
        self.base_ms + self.per_byte_ms * payload_len as u32
    }
}

/// A symbol-time based model following the Semtech AN1200.22 LoRa air-time
/// formula, parameterized over spreading factor, bandwidth, coding rate,
/// and the explicit/implicit-header + low-data-rate-optimize flags.
///
/// More accurate than [`FixedAirTimeModel`] across a range of radio
/// parameters, at the cost of a few floating-point operations per call.
/// Always rounds its final result up to the next whole millisecond, so it
/// never under-estimates air-time.
#[derive(Debug, Clone, Copy, PartialEq, defmt::Format)]
pub struct LoraAirTimeModel {
    /// Spreading factor, 7..=12.
    pub spreading_factor: u8,
    /// Bandwidth in Hz (e.g. 125_000, 250_000, 500_000).
    pub bandwidth_hz: u32,
    /// Coding rate denominator, 5..=8 (i.e. 4/5 .. 4/8).
    pub coding_rate_denom: u8,
    /// Number of bytes of preamble symbols (not payload), typically 8.
    pub preamble_symbols: u16,
    /// Whether the header is sent explicitly (adds one symbol group).
    pub explicit_header: bool,
    /// Low data rate optimization, mandatory at SF11/SF12 with 125kHz BW.
    pub low_data_rate_optimize: bool,
}

impl LoraAirTimeModel {
    pub fn new(
        spreading_factor: u8,
        bandwidth_hz: u32,
        coding_rate_denom: u8,
        preamble_symbols: u16,
    ) -> Self {
        let low_data_rate_optimize =
            spreading_factor >= 11 && bandwidth_hz <= 125_000;
        Self {
            spreading_factor,
            bandwidth_hz,
            coding_rate_denom,
            preamble_symbols,
            explicit_header: true,
            low_data_rate_optimize,
        }
    }

    fn symbol_time_ms(&self) -> f32 {
        (1u32 << self.spreading_factor) as f32 / self.bandwidth_hz as f32 * 1000.0
    }
}

impl Default for LoraAirTimeModel {
    fn default() -> Self {
        Self::new(12, 125_000, 5, 8)
    }
}

impl AirTimeModel for LoraAirTimeModel {
    fn time_on_air_ms(&self, payload_len: usize) -> u32 {
        let sf = self.spreading_factor as f32;
        let cr = self.coding_rate_denom as f32;
        let de = if self.low_data_rate_optimize { 1.0 } else { 0.0 };
        let ih = if self.explicit_header { 0.0 } else { 1.0 };

        let t_sym = self.symbol_time_ms();
        let t_preamble = (self.preamble_symbols as f32 + 4.25) * t_sym;

        let numerator = 8.0 * payload_len as f32 - 4.0 * sf + 28.0 + 16.0 - 20.0 * ih;
        let denominator = 4.0 * (sf - 2.0 * de);
        let payload_symbols = 8.0 + libm_ceil(numerator / denominator) * cr;
        let payload_symbols = if payload_symbols > 8.0 {
            payload_symbols
        } else {
            8.0
        };
        let t_payload = payload_symbols * t_sym;

        libm_ceil(t_preamble + t_payload) as u32
    }
}

/// `core` has no floating-point `ceil` (it lives behind `std` or the `libm`
/// crate); this MAC only needs it in one place, so it is inlined rather
/// than pulling in a dependency for a single function.
fn libm_ceil(x: f32) -> f32 {
    let truncated = x as i32 as f32;
    if x > truncated {
        truncated + 1.0
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_model_grows_with_length() {
        let model = FixedAirTimeModel::default();
        assert!(model.time_on_air_ms(50) > model.time_on_air_ms(10));
    }

    #[test]
    fn fixed_model_nonzero_at_zero_length() {
        let model = FixedAirTimeModel::default();
        assert!(model.time_on_air_ms(0) > 0);
    }

    #[test]
    fn lora_model_monotonic_in_length() {
        let model = LoraAirTimeModel::default();
        let mut prev = model.time_on_air_ms(0);
        for len in (1..=255usize).step_by(7) {
            let next = model.time_on_air_ms(len);
            assert!(next >= prev, "air time regressed at len {len}");
            prev = next;
        }
    }

    #[test]
    fn lora_model_larger_sf_is_slower() {
        let fast = LoraAirTimeModel::new(7, 125_000, 5, 8);
        let slow = LoraAirTimeModel::new(12, 125_000, 5, 8);
        assert!(slow.time_on_air_ms(32) > fast.time_on_air_ms(32));
    }

    #[test]
    fn lora_model_wider_bandwidth_is_faster() {
        let narrow = LoraAirTimeModel::new(10, 125_000, 5, 8);
        let wide = LoraAirTimeModel::new(10, 500_000, 5, 8);
        assert!(wide.time_on_air_ms(32) < narrow.time_on_air_ms(32));
    }

    #[test]
    fn ceil_matches_expectations() {
        assert_eq!(libm_ceil(3.0), 3.0);
        assert_eq!(libm_ceil(3.1), 4.0);
        assert_eq!(libm_ceil(-0.5), 0.0);
    }
}
