//! Collision-avoidance MAC for dense LoRa chat deployments.
//!
//! Coordinates channel access for nodes sharing a single LoRa channel: a
//! three-phase listen/announce/transmit protocol with randomized backoff,
//! a Network Allocation Vector (NAV) deferral mechanism, and
//! congestion-responsive exponential backoff. See [`mac::MacCore`] for the
//! state machine and [`radio::RadioInterface`] for the capability surface
//! it requires of the radio.
//!
//! Acknowledgements, retransmission, fragmentation, routing, encryption,
//! authentication, multi-channel operation, and time-synchronized slot
//! scheduling are all out of scope.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

pub mod airtime;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod entropy;
pub mod error;
pub mod frame;
pub mod mac;
pub mod radio;
pub mod stats;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(feature = "sx1262")]
pub mod sx1262;

pub use airtime::{AirTimeModel, FixedAirTimeModel, LoraAirTimeModel};
pub use clock::Clock;
pub use config::{MacConfig, Priority, RadioParams};
pub use dispatch::RxCallback;
pub use entropy::{Entropy, Xorshift32};
pub use error::{ConfigError, MacError};
pub use frame::{FrameType, RtsFrame, MAX_PAYLOAD_LEN};
pub use mac::{MacCore, Phase, SendResult};
pub use radio::{RadioInterface, RxEvent};
pub use stats::Stats;

#[cfg(feature = "sx1262")]
pub use sx1262::{RadioError as Sx1262Error, Sx1262Radio};
