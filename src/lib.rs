//! rv-testbus: memory-mapped address decoder and pseudo-peripheral bus
//! fabric for a single-core embedded test harness.
//!
//! One instruction channel (fetches, always RAM) and one data channel
//! (decoded each cycle to RAM, a peripheral action, or a fault) share a
//! unified RAM array. Peripherals cover console output, pass/fail and exit
//! signaling, a signature capture window, and a countdown timer with a
//! maskable interrupt. Exactly one requester per channel, no arbitration.

pub mod bus;
pub mod config;
pub mod control;
pub mod decode;
pub mod handshake;
pub mod memory;
pub mod periph;
pub mod savestate;
pub mod timer;

pub use bus::{BusError, CycleOutput, Fabric, InstrRequest};
pub use config::{FabricConfig, Strictness};
pub use decode::{ByteEnable, DecodedTarget, PeriphOp, Transaction};
pub use savestate::SaveState;
pub use timer::{Timer, TIMER_IRQ_ID};
