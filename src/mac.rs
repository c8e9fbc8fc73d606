//! The three-phase contention-avoidance state machine: Phase 1 (initial
//! channel listen), Phase 2 (RTS announce + contention listen), Phase 3
//! (DATA transmit) — backed off and deferred by NAV whenever the channel
//! looks busy.

use crate::airtime::AirTimeModel;
use crate::clock::{elapsed_ms, Clock};
use crate::config::{
    MacConfig, Priority, BACKOFF_GROWTH_PER_DEFERRAL, MAX_BACKOFF_MULTIPLIER, PRIME_OFFSETS_MS,
};
use crate::dispatch::{ReceiveDispatcher, RxCallback};
use crate::entropy::Entropy;
use crate::error::{ConfigError, MacError};
use crate::frame::{RtsFrame, DATA_TAG, MAX_PAYLOAD_LEN, RTS_TAG};
use crate::radio::{RadioInterface, RxEvent};
use crate::stats::Stats;

/// The MAC's current phase. Per invariant I1, this is only ever a hint —
/// `Nav`'s actual expiry is tracked by `nav_until` and surfaced through
/// [`MacCore::in_nav`], which is authoritative even when `phase` hasn't
/// been revisited yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Phase {
    Idle,
    Phase1Listen,
    Phase2Rts,
    Phase3Data,
    Nav,
}

/// Outcome of [`MacCore::send`]. A node never "gives up": it keeps
/// deferring and retrying (at the caller's discretion — `send` itself
/// makes exactly one attempt per call) rather than silently dropping a
/// chat message, so the only `Err` path is [`MacError::PayloadTooLarge`],
/// caught before any channel activity happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum SendResult {
    /// The full RTS/DATA handshake completed; exactly one RTS and one
    /// DATA frame went out, in that order.
    Sent,
    /// No DATA frame was emitted this attempt — the channel looked busy
    /// (NAV, CAD, or an observed RTS/DATA) before Phase 3 was reached.
    Deferred,
}

/// The MAC state machine for one node, generic over its radio, clock,
/// entropy source, and air-time model so it runs identically against
/// mocked and real collaborators.
pub struct MacCore<R, C, E, A> {
    radio: R,
    clock: C,
    entropy: E,
    airtime: A,
    config: MacConfig,
    phase: Phase,
    nav_until_ms: Option<u32>,
    consecutive_navs: u32,
    stats: Stats,
    dispatcher: ReceiveDispatcher,
}

impl<R, C, E, A> MacCore<R, C, E, A>
where
    R: RadioInterface,
    C: Clock,
    E: Entropy,
    A: AirTimeModel,
{
    /// Construct a node. Fails if `config` is not internally consistent;
    /// see [`MacConfig::validate`]. Logs at `info` on success.
    pub fn new(
        radio: R,
        clock: C,
        entropy: E,
        airtime: A,
        config: MacConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        defmt::info!(
            "mac init: difs_ms={} backoff_window={} phase2_probability={} use_cad={}",
            config.difs_ms,
            config.backoff_window,
            config.phase2_probability,
            config.use_cad
        );
        Ok(Self {
            radio,
            clock,
            entropy,
            airtime,
            config,
            phase: Phase::Idle,
            nav_until_ms: None,
            consecutive_navs: 0,
            stats: Stats::default(),
            dispatcher: ReceiveDispatcher::default(),
        })
    }

    /// Current phase, per I1 a hint rather than ground truth for NAV
    /// expiry — use [`Self::in_nav`] for that.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// I1's ground truth: whether a NAV deferral is currently in effect.
    /// Wraparound-safe, and treats an unset NAV as "not deferred".
    pub fn in_nav(&self) -> bool {
        match self.nav_until_ms {
            Some(until) => {
                let now = self.clock.now_ms();
                let remaining = elapsed_ms(now, until);
                remaining > 0 && remaining < u32::MAX / 2
            }
            None => false,
        }
    }

    /// `W · difs_ms + toa(5)` (I4): the fixed duration of the Phase 1
    /// listen window and the RX re-arm window at Phase 2 entry. Constant
    /// for a given config and air-time model.
    pub fn phase1_duration_ms(&self) -> u32 {
        self.config.backoff_window * self.config.difs_ms + self.airtime.time_on_air_ms(5)
    }

    pub fn get_stats(&self) -> Stats {
        self.stats
    }

    /// Reset every counter to zero.
    pub fn reset_stats(&mut self) {
        self.stats = Stats::default();
    }

    /// Register a `fn(payload, rssi_dbm, snr_db)` handler for DATA frames
    /// observed outside of an active `send`. Replaces any previously
    /// registered handler.
    pub fn on_receive(&mut self, callback: RxCallback) {
        self.dispatcher.set_callback(callback);
    }

    /// Enter continuous receive so DATA frames can be delivered to the
    /// application callback between `send` calls.
    pub fn start_listening(&mut self) {
        self.radio.start_rx(0);
    }

    /// Nonblocking: poll the radio once for an idle-time (outside of an
    /// active `send`) RX event and dispatch it. Per §4.4, DATA frames
    /// observed this way are delivered to the application callback only
    /// — they do not feed NAV, since the node isn't contending to
    /// transmit. Safe to call at any cadence; a no-op if nothing has
    /// arrived.
    pub fn poll_idle(&mut self) {
        if !self.radio.rx_done() {
            return;
        }
        let Some(event) = self.radio.read_packet() else {
            return;
        };
        match event.type_tag() {
            DATA_TAG => {
                self.stats.rx_data += 1;
                self.dispatcher.deliver(&event);
            }
            RTS_TAG => {
                self.stats.rx_rts += 1;
            }
            _ => {}
        }
    }

    /// Emit the current counters via `defmt`.
    pub fn log_stats(&self) {
        defmt::info!("mac stats: {}", self.stats);
    }

    /// Pretty-print the current counters to any `std::io::Write`. Host
    /// tooling only; `no_std` targets use [`Self::log_stats`] instead.
    #[cfg(feature = "std")]
    pub fn print_stats<W: std::io::Write>(&self, mut w: W) -> std::io::Result<()> {
        let s = &self.stats;
        writeln!(w, "tx_data:       {}", s.tx_data)?;
        writeln!(w, "tx_rts:        {}", s.tx_rts)?;
        writeln!(w, "rx_data:       {}", s.rx_data)?;
        writeln!(w, "rx_rts:        {}", s.rx_rts)?;
        writeln!(w, "nav_count:     {}", s.nav_count)?;
        writeln!(w, "cad_detected:  {}", s.cad_detected)?;
        writeln!(w, "backoff_count: {}", s.backoff_count)?;
        writeln!(w, "efficiency:    {:.3}", s.efficiency())?;
        Ok(())
    }

    /// Draw one of the five decorrelating prime offsets uniformly at
    /// random (`PrimeOffsets[U{0..4}]`), not by cycling through them.
    fn random_prime_offset_ms(&mut self) -> u32 {
        let idx = self.entropy.gen_range(PRIME_OFFSETS_MS.len() as u32) as usize;
        PRIME_OFFSETS_MS[idx]
    }

    /// `U{0..W}·difs_ms + PrimeOffsets[U{0..4}]`, drawn fresh before both
    /// the RTS and the DATA emission.
    fn compute_backoff_ms(&mut self) -> u32 {
        let slots = self.entropy.gen_range(self.config.backoff_window + 1);
        slots * self.config.difs_ms + self.random_prime_offset_ms()
    }

    /// Apply the exponential deferral multiplier (`min(1 + 0.3k, 2.5)`,
    /// `k` = `consecutive_navs` *before* this deferral), arm `nav_until`,
    /// advance `consecutive_navs`, and record the deferral in `stats` and
    /// `phase`. Shared by all three deferral paths per I3.
    fn arm_nav(&mut self, nav_base_ms: u32) {
        let k = self.consecutive_navs;
        let nav_ms = if k > 0 {
            let multiplier =
                (1.0 + BACKOFF_GROWTH_PER_DEFERRAL * k as f32).min(MAX_BACKOFF_MULTIPLIER);
            (nav_base_ms as f32 * multiplier) as u32
        } else {
            nav_base_ms
        };
        self.consecutive_navs += 1;
        let now = self.clock.now_ms();
        self.nav_until_ms = Some(now.wrapping_add(nav_ms));
        self.phase = Phase::Nav;
        self.stats.nav_count += 1;
    }

    /// `enter_nav_from_rts`: NAV sized from an overheard RTS's announced
    /// `data_len`, so this node waits out the sender's whole upcoming
    /// handshake plus jitter. The 5%-15% jitter band (of `base`) is what
    /// keeps every node that heard the same RTS from exiting NAV at
    /// exactly the same instant.
    fn enter_nav_from_rts(&mut self, data_len: u8) {
        let data_toa = self.airtime.time_on_air_ms(data_len as usize);
        let mut base = self.phase1_duration_ms()
            + self.config.backoff_window * self.config.difs_ms
            + data_toa;
        base += self.random_prime_offset_ms();

        let jitter_lo = (0.05 * base as f32) as u32;
        let jitter_hi = (0.15 * base as f32) as u32;
        let jitter = jitter_lo + self.entropy.gen_range(jitter_hi.saturating_sub(jitter_lo) + 1);

        self.arm_nav(base + jitter);
    }

    /// `enter_nav_random`: an unexpected DATA frame (from a node whose
    /// RTS this node missed) is treated as if it were maximum length,
    /// randomized rather than exact since the true size is unknown.
    fn enter_nav_random(&mut self) {
        let max_toa = self.airtime.time_on_air_ms(MAX_PAYLOAD_LEN);
        let lo = (0.8 * max_toa as f32) as u32;
        let hi = (1.2 * max_toa as f32) as u32;
        let span = hi.saturating_sub(lo) + 1;
        let nav_base = lo + self.entropy.gen_range(span) + self.random_prime_offset_ms();
        self.arm_nav(nav_base);
    }

    /// `defer_random`: CAD sensed energy before any frame was even
    /// decoded, so there's no length information to size NAV from —
    /// scaled off the Phase 1 listen window itself instead.
    fn defer_random(&mut self) {
        let phase1 = self.phase1_duration_ms();
        let span = (3 * phase1).saturating_sub(phase1) + 1;
        let nav_base = phase1 + self.entropy.gen_range(span) + self.random_prime_offset_ms();
        self.arm_nav(nav_base);
    }

    /// Dispatch a frame observed during an active listen window (Phase 1
    /// or Phase 2). Both paths always result in `Deferred`: an RTS or an
    /// unexpected DATA frame is equally a sign the channel is about to be
    /// busy. A DATA frame is also handed to the application callback per
    /// §4.4 — "prefer delivery over secrecy" — which double-counts
    /// `rx_data` against `nav_count` by design (see DESIGN.md).
    fn handle_contention_rx(&mut self, event: RxEvent) {
        match event.type_tag() {
            RTS_TAG => {
                self.stats.rx_rts += 1;
                match RtsFrame::decode(event.payload()) {
                    Some(rts) => self.enter_nav_from_rts(rts.data_len),
                    None => self.enter_nav_random(),
                }
            }
            DATA_TAG => {
                self.stats.rx_data += 1;
                self.dispatcher.deliver(&event);
                self.enter_nav_random();
            }
            _ => {}
        }
    }

    /// Listen for `duration_ms`, polling the radio at an adaptive cadence
    /// that relaxes the longer the channel stays quiet (~11ms for the
    /// first 3 polls, ~23ms for the next 4, ~41ms after that — reduces
    /// SPI duty cycle without hurting responsiveness at LoRa symbol
    /// rates). Returns `true` (and has already deferred via
    /// [`Self::handle_contention_rx`]) if a frame was observed; `false`
    /// on a clean timeout.
    fn listen_for_contention(&mut self, duration_ms: u32) -> bool {
        let start = self.clock.now_ms();
        let mut idle_polls = 0u32;

        loop {
            if self.radio.rx_done() {
                // Any activity at all — even a CRC failure or an
                // unparseable buffer — resets the cadence back to fast
                // polling, matching the channel actually being busy.
                idle_polls = 0;
                if let Some(event) = self.radio.read_packet() {
                    self.handle_contention_rx(event);
                    return true;
                }
                // CRC failure or empty buffer: not a usable frame, keep
                // listening out the rest of the window.
            }

            let elapsed = elapsed_ms(start, self.clock.now_ms());
            if elapsed >= duration_ms {
                return false;
            }

            let cadence_ms = if idle_polls < 3 {
                11
            } else if idle_polls < 7 {
                23
            } else {
                41
            };
            idle_polls += 1;
            self.clock.sleep_ms(cadence_ms.min(duration_ms - elapsed));
        }
    }

    /// Send `payload` once, blocking (via `Clock::sleep_ms`) through
    /// however much of the listen/RTS/DATA handshake this attempt
    /// reaches. Returns [`MacError::PayloadTooLarge`] before any channel
    /// activity if `payload` cannot fit in one frame (boundary B4).
    pub fn send(&mut self, payload: &[u8], priority: Priority) -> Result<SendResult, MacError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(MacError::PayloadTooLarge { len: payload.len() });
        }

        if self.in_nav() {
            self.phase = Phase::Nav;
            return Ok(SendResult::Deferred);
        }
        self.phase = Phase::Idle;

        if self.config.use_cad && self.radio.cad() {
            self.stats.cad_detected += 1;
            self.defer_random();
            return Ok(SendResult::Deferred);
        }

        let coin = self.entropy.gen_unit();
        let skip_phase1 = priority == Priority::High || coin < self.config.phase2_probability;

        if !skip_phase1 {
            self.phase = Phase::Phase1Listen;
            let phase1_duration = self.phase1_duration_ms();
            self.radio.start_rx(phase1_duration);
            if self.listen_for_contention(phase1_duration) {
                return Ok(SendResult::Deferred);
            }
        }

        self.phase = Phase::Phase2Rts;
        let rts_backoff = self.compute_backoff_ms();
        self.clock.sleep_ms(rts_backoff);
        self.stats.backoff_count += 1;

        let rts = RtsFrame {
            data_len: payload.len() as u8,
        };
        let mut rts_payload = [0u8; 5];
        rts.encode(&mut rts_payload);
        self.radio.send_packet(&rts_payload, RTS_TAG);
        self.stats.tx_rts += 1;

        let phase1_duration = self.phase1_duration_ms();
        self.radio.start_rx(phase1_duration);
        if self.listen_for_contention(phase1_duration) {
            return Ok(SendResult::Deferred);
        }

        self.phase = Phase::Phase3Data;
        let data_backoff = self.compute_backoff_ms();
        self.clock.sleep_ms(data_backoff);
        self.stats.backoff_count += 1;

        self.radio.send_packet(payload, DATA_TAG);
        self.stats.tx_data += 1;
        self.consecutive_navs = 0;
        self.phase = Phase::Idle;

        Ok(SendResult::Sent)
    }
}
