//! Secondary control block: a register-mapped status/exit interface.
//!
//! The simpler sibling of the peripheral bank, living in its own address
//! region. A generic register responder supplies the request/grant/valid
//! protocol; this block only contributes three registers. Pass/fail are pure
//! combinational comparisons of the scratch register against the same
//! sentinels the test probe uses. No timer, no signature, no console.

use crate::decode::{FAIL_SENTINEL, PASS_SENTINEL};
use crate::handshake::Channel;

/// Register offsets within the block.
pub mod regs {
    /// Scratch register holding the most recent pass/fail code.
    pub const SCRATCH: u32 = 0x00;
    pub const EXIT_VALUE: u32 = 0x04;
    pub const EXIT_VALID: u32 = 0x08;
}

/// Contract of a register file exposed over the bus: the register-access
/// responder drives this, the block implements it.
pub trait RegisterPort {
    fn reg_read(&mut self, offset: u32) -> u32;
    fn reg_write(&mut self, offset: u32, value: u32);
}

/// One register access presented for a cycle.
#[derive(Debug, Clone, Copy)]
pub struct RegAccess {
    pub offset: u32,
    pub write: bool,
    pub wdata: u32,
}

impl RegAccess {
    pub fn read(offset: u32) -> Self {
        RegAccess {
            offset,
            write: false,
            wdata: 0,
        }
    }

    pub fn write(offset: u32, wdata: u32) -> Self {
        RegAccess {
            offset,
            write: true,
            wdata,
        }
    }
}

/// Responder outputs for one cycle. Read data is registered: it rides with
/// `valid`, one cycle after the granting access.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegResponse {
    pub grant: bool,
    pub valid: bool,
    pub rdata: u32,
}

/// Generic register-bus responder: accepts every access, grants in the same
/// cycle, answers with valid one cycle later. Same handshake contract as the
/// fabric channels.
pub struct RegisterResponder<P: RegisterPort> {
    port: P,
    ch: Channel,
    rdata_q: u32,
}

impl<P: RegisterPort> RegisterResponder<P> {
    pub fn new(port: P) -> Self {
        RegisterResponder {
            port,
            ch: Channel::new(),
            rdata_q: 0,
        }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn reset(&mut self) {
        self.ch.reset();
        self.rdata_q = 0;
    }

    pub fn step(&mut self, access: Option<RegAccess>) -> RegResponse {
        let mut out = RegResponse::default();
        out.grant = access.is_some();
        out.valid = self.ch.shift(out.grant);
        out.rdata = self.rdata_q;
        if let Some(access) = access {
            if access.write {
                self.port.reg_write(access.offset, access.wdata);
            } else {
                self.rdata_q = self.port.reg_read(access.offset);
            }
        }
        out
    }
}

/// The block's register file.
#[derive(Debug, Clone, Copy, Default)]
pub struct CtrlRegs {
    scratch: u32,
    exit_value: u32,
    exit_valid: bool,
}

impl RegisterPort for CtrlRegs {
    fn reg_read(&mut self, offset: u32) -> u32 {
        match offset {
            regs::SCRATCH => self.scratch,
            regs::EXIT_VALUE => self.exit_value,
            regs::EXIT_VALID => self.exit_valid as u32,
            _ => 0,
        }
    }

    fn reg_write(&mut self, offset: u32, value: u32) {
        match offset {
            regs::SCRATCH => self.scratch = value,
            regs::EXIT_VALUE => self.exit_value = value,
            regs::EXIT_VALID => self.exit_valid = value & 1 != 0,
            _ => {}
        }
    }
}

pub struct ControlBlock {
    responder: RegisterResponder<CtrlRegs>,
}

impl Default for ControlBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlBlock {
    pub fn new() -> Self {
        ControlBlock {
            responder: RegisterResponder::new(CtrlRegs::default()),
        }
    }

    pub fn reset(&mut self) {
        self.responder.reset();
        *self.responder.port_mut() = CtrlRegs::default();
    }

    pub fn step(&mut self, access: Option<RegAccess>) -> RegResponse {
        self.responder.step(access)
    }

    /// Combinational compare of the scratch register against the pass
    /// sentinel.
    pub fn tests_passed(&self) -> bool {
        self.responder.port().scratch == PASS_SENTINEL
    }

    pub fn tests_failed(&self) -> bool {
        self.responder.port().scratch == FAIL_SENTINEL
    }

    /// Mirrors of the exit registers (registered by the responder's file,
    /// not re-latched here).
    pub fn exit_valid(&self) -> bool {
        self.responder.port().exit_valid
    }

    pub fn exit_value(&self) -> u32 {
        self.responder.port().exit_value
    }
}
