//! The bus fabric: decoder, RAM, peripheral bank, timer, and the two
//! handshake channels behind a single per-cycle `step`.
//!
//! Within a cycle: decode, side-effect latches, RAM service; register
//! commits (signature range, timer loads, grant -> valid shift, fault latch)
//! happen at the simulated clock edge at the end of the call. The
//! instruction channel bypasses decoding and always targets RAM.

use crate::config::{FabricConfig, Strictness};
use crate::decode::{self, DecodedTarget, PeriphOp, Transaction};
use crate::handshake::Channel;
use crate::memory::RamArray;
use crate::periph::PeripheralBank;
use crate::timer::Timer;
use std::fmt;
use std::io::Write;

/// Fatal fabric conditions. No retries anywhere: a transaction is either
/// resolved in its cycle or the simulation is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// A read decoded to no target. Latched the cycle before; indicates a
    /// harness or program defect rather than expected probing.
    UnmappedRead { addr: u32 },
    /// A write failed the legal-address check under `Strictness::Fatal`.
    IllegalWrite { addr: u32 },
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::UnmappedRead { addr } => {
                write!(f, "unmapped read at address {:#010x}", addr)
            }
            BusError::IllegalWrite { addr } => {
                write!(f, "illegal write at address {:#010x}", addr)
            }
        }
    }
}

impl std::error::Error for BusError {}

/// Instruction-channel request: a fetch address and a request strobe.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstrRequest {
    pub addr: u32,
    pub req: bool,
}

impl InstrRequest {
    pub fn fetch(addr: u32) -> Self {
        InstrRequest { addr, req: true }
    }

    pub fn idle() -> Self {
        InstrRequest::default()
    }
}

/// Everything the fabric presents for one cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleOutput {
    pub instr_grant: bool,
    pub instr_valid: bool,
    pub instr_rdata: u32,
    pub data_grant: bool,
    pub data_valid: bool,
    pub data_rdata: u32,
    pub tests_passed: bool,
    pub tests_failed: bool,
    pub exit_valid: bool,
    pub exit_value: u32,
    /// Level interrupt request from the timer (identity 7).
    pub timer_irq: bool,
}

pub struct Fabric {
    config: FabricConfig,
    pub(crate) ram: RamArray,
    pub(crate) periph: PeripheralBank,
    pub(crate) timer: Timer,
    pub(crate) instr_ch: Channel,
    pub(crate) data_ch: Channel,
    /// Registered read ports: data captured at the grant edge, presented
    /// with valid one cycle later.
    pub(crate) instr_rdata_q: u32,
    pub(crate) data_rdata_q: u32,
    pending_fault: Option<u32>,
}

impl Fabric {
    pub fn new(config: FabricConfig) -> Self {
        let periph = PeripheralBank::new(&config);
        Self::assemble(config, periph)
    }

    /// Construction with a redirected raw console stream (tests, harnesses).
    pub fn with_console_sink(config: FabricConfig, sink: Box<dyn Write + Send>) -> Self {
        let periph = PeripheralBank::with_console_sink(&config, sink);
        Self::assemble(config, periph)
    }

    fn assemble(config: FabricConfig, periph: PeripheralBank) -> Self {
        debug_assert!(config.capacity.is_power_of_two());
        debug_assert!(config.capacity <= decode::CONSOLE_OUT_ADDR);
        Fabric {
            ram: RamArray::new(config.capacity),
            periph,
            timer: Timer::new(),
            instr_ch: Channel::new(),
            data_ch: Channel::new(),
            instr_rdata_q: 0,
            data_rdata_q: 0,
            pending_fault: None,
            config,
        }
    }

    pub fn config(&self) -> &FabricConfig {
        &self.config
    }

    pub fn ram(&self) -> &RamArray {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut RamArray {
        &mut self.ram
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn signature_range(&self) -> (u32, u32) {
        self.periph.signature_range()
    }

    /// Synchronous reset: valids low, read ports cleared, timer and
    /// signature registers zeroed, any latched fault dropped. RAM contents
    /// survive, as they would in hardware.
    pub fn reset(&mut self) {
        self.instr_ch.reset();
        self.data_ch.reset();
        self.instr_rdata_q = 0;
        self.data_rdata_q = 0;
        self.timer.reset();
        self.periph.reset();
        self.pending_fault = None;
    }

    /// Advance one clock cycle.
    ///
    /// `irq_ack` is the external interrupt acknowledge, by identity, for this
    /// cycle. A fault decoded in cycle N surfaces as `Err` in cycle N+1.
    pub fn step(
        &mut self,
        instr: InstrRequest,
        data: Transaction,
        irq_ack: Option<u32>,
    ) -> Result<CycleOutput, BusError> {
        // The fault stays latched: once dead, every step fails until reset.
        if let Some(addr) = self.pending_fault {
            let err = BusError::UnmappedRead { addr };
            log::error!("{}", err);
            return Err(err);
        }

        let mut out = CycleOutput::default();

        // Instruction channel: fetches always target the RAM array.
        out.instr_grant = instr.req;
        out.instr_valid = self.instr_ch.shift(out.instr_grant);
        out.instr_rdata = self.instr_rdata_q;
        if out.instr_grant {
            self.instr_rdata_q = self.ram.fetch_word(instr.addr);
        }

        // Data channel: decode, then service the selected target.
        let (target, intents) = decode::decode(&data, self.config.capacity);
        let mut next_rdata = None;
        match target {
            DecodedTarget::Ram => {
                out.data_grant = true;
                if data.write {
                    log::trace!("ram write {:#010x} <- {:#010x}", data.addr, data.wdata);
                    self.ram.write_word(data.addr, data.wdata, data.be);
                } else {
                    next_rdata = Some(self.ram.read_word(data.addr));
                }
            }
            DecodedTarget::Periph(op) => {
                out.data_grant = true;
                log::debug!("peripheral {:?} at {:#010x}", op, data.addr);
                let latches = self.periph.apply(op, data.wdata, &self.ram);
                out.tests_passed = latches.tests_passed;
                out.tests_failed = latches.tests_failed;
                out.exit_valid = latches.exit_valid;
                out.exit_value = latches.exit_value;
                if op == PeriphOp::StatusProbe {
                    // No read payload on this path; the port still answers.
                    next_rdata = Some(0);
                }
            }
            DecodedTarget::Dropped => {
                if data.req
                    && data.write
                    && !decode::write_is_legal(data.addr, self.config.capacity)
                {
                    match self.config.strictness {
                        Strictness::Report => {
                            log::error!("write to illegal address {:#010x} dropped", data.addr)
                        }
                        Strictness::Fatal => {
                            return Err(BusError::IllegalWrite { addr: data.addr })
                        }
                    }
                }
            }
            DecodedTarget::Fault => {
                // Unrecoverable, but only at the next edge.
                self.pending_fault = Some(data.addr);
            }
        }

        out.data_valid = self.data_ch.shift(out.data_grant);
        out.data_rdata = self.data_rdata_q;
        if let Some(rdata) = next_rdata {
            self.data_rdata_q = rdata;
        }

        // Timer sees this cycle's load intents and the external acknowledge.
        self.timer
            .step(intents.timer_mask, intents.timer_count, irq_ack);
        out.timer_irq = self.timer.irq_pending();

        // Clock edge: commit the signature range registers.
        self.periph.commit_signature(intents.sig_begin, intents.sig_end);

        Ok(out)
    }
}
