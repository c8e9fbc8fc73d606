//! A thin [`RadioInterface`] adapter over a Semtech SX1262, built directly
//! on `embedded-hal` rather than this crate's own vendor driver lineage, so
//! it carries no dependency on any particular MCU HAL crate.
//!
//! This is not a register-level driver in its own right — it wraps the
//! same command sequencing (`OpCode`, `Irq`, busy-pin polling, CS framing)
//! this crate's SX1262/SX1280 support uses, collapsed down to the five
//! operations [`RadioInterface`] requires. Everything this adapter cannot
//! express (arbitrary register access, ranging, FSK, DMA-driven transfers)
//! is simply absent; a product firmware that needs the full surface should
//! reach for that driver directly and write its own `RadioInterface` impl
//! atop it instead of this one.
//!
//! Feature-gated behind `sx1262`, off by default: the MAC's own test suite
//! never exercises this module, only [`crate::mock::MockRadio`].

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

use crate::radio::{RadioInterface, RxEvent};

/// Driver-facing faults, mirroring this crate's existing `RadioError`
/// enum for the SX126x/SX128x register driver (`Spi`, `BusyTimeout`,
/// `Crc`, `Status`, ...). Never seen by [`crate::mac::MacCore`] directly —
/// every [`RadioInterface`] method on [`Sx1262Radio`] logs the variant via
/// `defmt::warn!` at the point it's collapsed to the `bool`/`Option`
/// contract the MAC actually consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum RadioError {
    /// The underlying SPI bus transaction failed.
    Spi,
    /// The busy pin never went low within the configured iteration budget.
    BusyTimeout,
    /// A received packet failed CRC.
    Crc,
    /// The chip reported an operating mode or command status we didn't
    /// expect for the operation in progress.
    Status,
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spi => write!(f, "SPI transaction failed"),
            Self::BusyTimeout => write!(f, "radio busy pin did not clear in time"),
            Self::Crc => write!(f, "packet CRC check failed"),
            Self::Status => write!(f, "unexpected radio status"),
        }
    }
}

/// SX1262 command opcodes, limited to the subset this adapter actually
/// issues. Values per the SX1262 datasheet's command table, the same
/// source this crate's SX126x/SX128x driver is built against.
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
enum OpCode {
    SetStandby = 0x80,
    SetRx = 0x82,
    SetTx = 0x83,
    SetCad = 0xC5,
    WriteBuffer = 0x0E,
    ReadBuffer = 0x1E,
    GetIrqStatus = 0x12,
    ClearIrqStatus = 0x02,
    GetRxBufferStatus = 0x13,
}

/// IRQ bits relevant to this adapter, per `GetIrqStatus`'s 16-bit mask.
/// Matches the bit layout of this crate's own `Irq` enum for the SX126x.
mod irq_bit {
    pub const TX_DONE: u16 = 1 << 0;
    pub const RX_DONE: u16 = 1 << 1;
    pub const CRC_ERR: u16 = 1 << 6;
    pub const CAD_DONE: u16 = 1 << 7;
    pub const CAD_DETECTED: u16 = 1 << 8;
    pub const TIMEOUT: u16 = 1 << 9;
}

/// Busy-pin polling budget for any single command. Mirrors this crate's
/// `MAX_ITERS` constant for the SX126x/SX128x driver's `wait_on_busy`.
const MAX_BUSY_ITERS: u32 = 100_000;

/// The radio's internal timebase for RX/TX timeout fields: 15.625 us per
/// tick, i.e. `1 / 64 kHz` — DS section 13.1.7. Shared with this crate's
/// SX126x/SX128x driver (`TIMING_FACTOR_MS_6X`).
const TIMING_FACTOR_MS: f32 = 0.015_625;

/// Generous upper bound on a blocking `send_packet`, per §5's ≈10s
/// `send_packet` ceiling. One polling iteration is assumed to cost on the
/// order of a few hundred nanoseconds to a few microseconds depending on
/// the bus, so this is deliberately loose — the point is "don't hang
/// forever on a wedged chip", not precise timing.
const TX_WAIT_MAX_ITERS: u32 = 2_000_000;
/// CAD must complete within roughly 100ms per §4.1; one CAD symbol at
/// SF12/BW125 is already tens of ms, so this budget is generous rather
/// than tight.
const CAD_WAIT_MAX_ITERS: u32 = 200_000;

/// A thin SX1262 adapter generic over any `embedded-hal` 1.0 SPI bus and
/// digital I/O for chip-select, reset, and busy, plus a delay source for
/// the brief post-reset settling time. `CS`/`RESET` are driven as plain
/// `OutputPin`s rather than folded into an `embedded-hal` `SpiDevice`,
/// matching this crate's existing driver, which manages chip-select
/// itself around each transaction rather than delegating it to the bus.
pub struct Sx1262Radio<SPI, CS, RESET, BUSY, DELAY> {
    spi: SPI,
    cs: CS,
    reset: RESET,
    busy: BUSY,
    delay: DELAY,
}

impl<SPI, CS, RESET, BUSY, DELAY> Sx1262Radio<SPI, CS, RESET, BUSY, DELAY>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    RESET: OutputPin,
    BUSY: InputPin,
    DELAY: DelayNs,
{
    /// Reset the chip and wait for it to come out of its startup busy
    /// period. Per DS section 9.1: the BUSY line stays high from power-up
    /// or reset until the chip's internal boot completes.
    pub fn new(spi: SPI, cs: CS, reset: RESET, busy: BUSY, delay: DELAY) -> Result<Self, RadioError> {
        let mut radio = Self {
            spi,
            cs,
            reset,
            busy,
            delay,
        };
        radio.hardware_reset()?;
        defmt::info!("sx1262: reset complete");
        Ok(radio)
    }

    fn hardware_reset(&mut self) -> Result<(), RadioError> {
        let _ = self.reset.set_low();
        self.delay.delay_us(700);
        let _ = self.reset.set_high();
        self.wait_on_busy()
    }

    fn wait_on_busy(&mut self) -> Result<(), RadioError> {
        for _ in 0..MAX_BUSY_ITERS {
            match self.busy.is_low() {
                Ok(true) => return Ok(()),
                Ok(false) => continue,
                Err(_) => return Err(RadioError::Spi),
            }
        }
        Err(RadioError::BusyTimeout)
    }

    fn write_command(&mut self, opcode: OpCode, params: &[u8]) -> Result<(), RadioError> {
        self.wait_on_busy()?;
        let _ = self.cs.set_low();
        let header = [opcode as u8];
        let write_result = self.spi.write(&header).and_then(|_| self.spi.write(params));
        let _ = self.cs.set_high();
        write_result.map_err(|_| RadioError::Spi)
    }

    fn read_command(&mut self, opcode: OpCode, out: &mut [u8]) -> Result<(), RadioError> {
        self.wait_on_busy()?;
        let _ = self.cs.set_low();
        let header = [opcode as u8, 0x00];
        let result = self
            .spi
            .write(&header)
            .and_then(|_| self.spi.read(out));
        let _ = self.cs.set_high();
        result.map_err(|_| RadioError::Spi)
    }

    fn get_irq_status(&mut self) -> Result<u16, RadioError> {
        let mut buf = [0u8; 2];
        self.read_command(OpCode::GetIrqStatus, &mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn clear_irq_status(&mut self, mask: u16) -> Result<(), RadioError> {
        self.write_command(OpCode::ClearIrqStatus, &mask.to_be_bytes())
    }

    /// Convert a millisecond duration into the 24-bit tick count `SetRx`
    /// and `SetTx` expect.
    fn ticks(timeout_ms: u32) -> [u8; 3] {
        let ticks = ((timeout_ms as f32) / TIMING_FACTOR_MS) as u32;
        let be = ticks.to_be_bytes();
        [be[1], be[2], be[3]]
    }
}

impl<SPI, CS, RESET, BUSY, DELAY> RadioInterface for Sx1262Radio<SPI, CS, RESET, BUSY, DELAY>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    RESET: OutputPin,
    BUSY: InputPin,
    DELAY: DelayNs,
{
    fn cad(&mut self) -> bool {
        if let Err(e) = self.write_command(OpCode::SetCad, &[]) {
            defmt::warn!("sx1262: CAD command failed: {}", e);
            return false;
        }
        for _ in 0..CAD_WAIT_MAX_ITERS {
            match self.get_irq_status() {
                Ok(status) if status & irq_bit::CAD_DONE != 0 => {
                    let detected = status & irq_bit::CAD_DETECTED != 0;
                    let _ = self.clear_irq_status(irq_bit::CAD_DONE | irq_bit::CAD_DETECTED);
                    return detected;
                }
                Ok(_) => continue,
                Err(e) => {
                    defmt::warn!("sx1262: CAD status read failed: {}", e);
                    return false;
                }
            }
        }
        defmt::warn!("sx1262: CAD timed out");
        false
    }

    fn start_rx(&mut self, timeout_ms: u32) {
        if let Err(e) = self.write_command(OpCode::SetRx, &Self::ticks(timeout_ms)) {
            defmt::warn!("sx1262: start_rx failed: {}", e);
        }
    }

    fn rx_done(&mut self) -> bool {
        match self.get_irq_status() {
            Ok(status) => status & irq_bit::RX_DONE != 0,
            Err(e) => {
                defmt::warn!("sx1262: rx_done status read failed: {}", e);
                false
            }
        }
    }

    fn read_packet(&mut self) -> Option<RxEvent> {
        let status = self.get_irq_status().ok()?;
        if status & irq_bit::RX_DONE == 0 {
            return None;
        }
        let _ = self.clear_irq_status(irq_bit::RX_DONE | irq_bit::TIMEOUT);
        if status & irq_bit::CRC_ERR != 0 {
            defmt::warn!("sx1262: dropping packet with bad CRC");
            return None;
        }

        let mut buffer_status = [0u8; 2];
        self.read_command(OpCode::GetRxBufferStatus, &mut buffer_status)
            .ok()?;
        let len = buffer_status[0] as usize;
        if len == 0 {
            return None;
        }

        let mut payload = [0u8; 256];
        self.read_command(OpCode::ReadBuffer, &mut payload[..len])
            .ok()?;

        let type_tag = payload[0];
        // RSSI/SNR come from `GetPacketStatus` on real hardware; omitted
        // here since the MAC only logs them, never branches on them.
        RxEvent::new(type_tag, &payload[1..len], 0, 0.0)
    }

    fn send_packet(&mut self, payload_bytes: &[u8], type_tag: u8) -> bool {
        let mut framed = [0u8; 256];
        framed[0] = type_tag;
        let n = payload_bytes.len().min(framed.len() - 1);
        framed[1..1 + n].copy_from_slice(&payload_bytes[..n]);

        if let Err(e) = self.write_command(OpCode::WriteBuffer, &framed[..1 + n]) {
            defmt::warn!("sx1262: buffer write failed: {}", e);
            return false;
        }
        // ~10s timeout field; §5's send_packet ceiling.
        if let Err(e) = self.write_command(OpCode::SetTx, &Self::ticks(10_000)) {
            defmt::warn!("sx1262: SetTx failed: {}", e);
            return false;
        }

        for _ in 0..TX_WAIT_MAX_ITERS {
            match self.get_irq_status() {
                Ok(status) if status & irq_bit::TX_DONE != 0 => {
                    let _ = self.clear_irq_status(irq_bit::TX_DONE);
                    return true;
                }
                Ok(status) if status & irq_bit::TIMEOUT != 0 => {
                    let _ = self.clear_irq_status(irq_bit::TIMEOUT);
                    return false;
                }
                Ok(_) => continue,
                Err(e) => {
                    defmt::warn!("sx1262: TX status read failed: {}", e);
                    return false;
                }
            }
        }
        defmt::warn!("sx1262: send_packet timed out waiting for TxDone");
        false
    }
}

impl<SPI, CS, RESET, BUSY, DELAY> core::fmt::Debug for Sx1262Radio<SPI, CS, RESET, BUSY, DELAY> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Sx1262Radio").finish_non_exhaustive()
    }
}
