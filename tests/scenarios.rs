//! Integration coverage driving `MacCore` purely through its public API
//! (as an external crate would) against the in-memory mock radio.
//! Unit-level scenario coverage lives alongside the implementation in
//! `src/mac.rs`; this file exercises the same protocol from outside the
//! crate boundary.

use std::cell::Cell;

use lora_chat_mac::frame::RTS_TAG;
use lora_chat_mac::mock::{MockRadio, TestClock};
use lora_chat_mac::{
    FixedAirTimeModel, MacConfig, MacCore, Priority, RtsFrame, RxEvent, SendResult, Xorshift32,
};

fn build(
    now: &Cell<u32>,
    seed: u32,
    config: MacConfig,
) -> MacCore<MockRadio<'_>, TestClock<'_>, Xorshift32, FixedAirTimeModel> {
    MacCore::new(
        MockRadio::new(now),
        TestClock::new(now),
        Xorshift32::new(seed),
        FixedAirTimeModel::default(),
        config,
    )
    .expect("valid config")
}

fn encode_rts(data_len: u8) -> [u8; 5] {
    let mut payload = [0u8; 5];
    RtsFrame { data_len }.encode(&mut payload);
    payload
}

#[test]
fn a_quiet_channel_yields_exactly_one_rts_then_one_data_frame() {
    let now = Cell::new(0);
    let mut mac = build(&now, 11, MacConfig::for_testing());

    let result = mac.send(b"hello from the integration suite", Priority::Normal).unwrap();
    assert_eq!(result, SendResult::Sent);

    let stats = mac.get_stats();
    assert_eq!(stats.tx_rts, 1);
    assert_eq!(stats.tx_data, 1);
    assert_eq!(stats.nav_count, 0);
}

#[test]
fn a_heard_rts_defers_the_send_and_arms_nav() {
    let now = Cell::new(0);
    let mut config = MacConfig::for_testing();
    config.phase2_probability = 0.0001; // force the Phase 1 listen almost always

    let mut radio = MockRadio::new(&now);
    radio.schedule_rx(0, RxEvent::new(RTS_TAG, &encode_rts(4), -70, 6.0).unwrap());

    let mut mac = MacCore::new(
        radio,
        TestClock::new(&now),
        Xorshift32::new(23),
        FixedAirTimeModel::default(),
        config,
    )
    .unwrap();

    let result = mac.send(b"hi", Priority::Normal).unwrap();
    assert_eq!(result, SendResult::Deferred);
    assert_eq!(mac.get_stats().tx_data, 0);
    assert!(mac.in_nav());
}

#[test]
fn oversized_payload_is_rejected_before_touching_the_radio() {
    let now = Cell::new(0);
    let mut mac = build(&now, 31, MacConfig::for_testing());
    let oversized = vec![0u8; 256];
    assert!(mac.send(&oversized, Priority::Normal).is_err());
    assert_eq!(mac.get_stats().tx_rts, 0);
}

#[test]
fn a_successful_exchange_after_contention_lets_a_later_send_through() {
    let now = Cell::new(0);
    let mut config = MacConfig::for_testing();
    config.phase2_probability = 0.0001;

    let mut radio = MockRadio::new(&now);
    radio.schedule_rx(0, RxEvent::new(RTS_TAG, &encode_rts(2), -70, 6.0).unwrap());

    let mut mac = MacCore::new(
        radio,
        TestClock::new(&now),
        Xorshift32::new(41),
        FixedAirTimeModel::default(),
        config,
    )
    .unwrap();

    mac.send(b"hi", Priority::Normal).unwrap();
    assert!(mac.in_nav());

    // fast-forward well past the NAV window onto a now-quiet channel
    now.set(now.get() + 100_000);
    let result = mac.send(b"hi again", Priority::Normal).unwrap();
    assert_eq!(result, SendResult::Sent);
}

#[test]
fn every_preset_produces_a_config_that_constructs_successfully() {
    let now = Cell::new(0);
    for config in [
        MacConfig::for_dense(10),
        MacConfig::for_dense(500),
        MacConfig::for_testing(),
        MacConfig::for_long_range(),
        MacConfig::for_low_power(),
    ] {
        let _mac = build(&now, 1, config);
    }
}
