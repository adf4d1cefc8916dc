//! Address decode for the data channel.
//!
//! Data-side transactions land either in RAM (anything below the configured
//! capacity), on one of the fixed peripheral addresses, or nowhere. The split
//! is write/read first, then RAM-range, then the fixed map: the peripheral
//! map is consulted only after the capacity check fails, so RAM always wins.
//!
//! Memory map (byte addresses):
//! ```text
//! 0x0000_0000 .. capacity   : RAM (R/W)
//! 0x1000_0000               : console byte out (W)
//! 0x1500_0000               : timer irq-mask set (W)
//! 0x1500_0004               : timer count reload (W)
//! 0x1500_1000               : timer status probe (R, grant only)
//! 0x1600_0000 .. 0x16FF_FFFF: reserved block (writes legal, unmodeled)
//! 0x2000_0000               : pass/fail sentinel probe (W)
//! 0x2000_0004               : exit trigger (W)
//! 0x2000_0008               : signature range begin (W)
//! 0x2000_000C               : signature range end (W)
//! 0x2000_0010               : dump signature and exit(0) (W)
//! ```

use bitflags::bitflags;

pub const CONSOLE_OUT_ADDR: u32 = 0x1000_0000;
pub const TIMER_MASK_ADDR: u32 = 0x1500_0000;
pub const TIMER_COUNT_ADDR: u32 = 0x1500_0004;
pub const TIMER_STATUS_ADDR: u32 = 0x1500_1000;
pub const TEST_PROBE_ADDR: u32 = 0x2000_0000;
pub const EXIT_ADDR: u32 = 0x2000_0004;
pub const SIG_BEGIN_ADDR: u32 = 0x2000_0008;
pub const SIG_END_ADDR: u32 = 0x2000_000C;
pub const SIG_DUMP_ADDR: u32 = 0x2000_0010;

/// Reserved 64K-aligned block: writes pass the legality check but hit nothing.
pub const RESERVED_BASE: u32 = 0x1600_0000;
pub const RESERVED_LAST: u32 = 0x16FF_FFFF;

/// Magic value written to the test probe to report success.
pub const PASS_SENTINEL: u32 = 123_456_789;
/// Magic value written to the test probe to report failure.
pub const FAIL_SENTINEL: u32 = 1;

bitflags! {
    /// Per-byte write lane mask accompanying a word write.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ByteEnable: u8 {
        const LANE0 = 0x1;
        const LANE1 = 0x2;
        const LANE2 = 0x4;
        const LANE3 = 0x8;
    }
}

impl ByteEnable {
    pub const WORD: ByteEnable = ByteEnable::all();

    /// Expand the lane mask to a 32-bit data mask.
    pub fn data_mask(self) -> u32 {
        let mut mask = 0u32;
        for lane in 0..4 {
            if self.bits() & (1 << lane) != 0 {
                mask |= 0xFF << (lane * 8);
            }
        }
        mask
    }
}

/// One data-channel bus transaction, presented for a single cycle.
#[derive(Debug, Clone, Copy)]
pub struct Transaction {
    pub addr: u32,
    pub write: bool,
    pub wdata: u32,
    pub be: ByteEnable,
    pub req: bool,
}

impl Transaction {
    pub fn idle() -> Self {
        Transaction {
            addr: 0,
            write: false,
            wdata: 0,
            be: ByteEnable::empty(),
            req: false,
        }
    }

    pub fn read(addr: u32) -> Self {
        Transaction {
            addr,
            write: false,
            wdata: 0,
            be: ByteEnable::empty(),
            req: true,
        }
    }

    pub fn write(addr: u32, wdata: u32) -> Self {
        Self::write_masked(addr, wdata, ByteEnable::WORD)
    }

    pub fn write_masked(addr: u32, wdata: u32, be: ByteEnable) -> Self {
        Transaction {
            addr,
            write: true,
            wdata,
            be,
            req: true,
        }
    }
}

/// Peripheral operation selected by a matched fixed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriphOp {
    ConsoleOut,
    TestProbe,
    ExitTrigger,
    SigBegin,
    SigEnd,
    SigDump,
    TimerMask,
    TimerCount,
    /// The one decoded read: grant only, no payload here.
    StatusProbe,
}

/// Where a data-channel transaction landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedTarget {
    Ram,
    Periph(PeriphOp),
    /// Unmapped write: request dropped, no grant, no error.
    Dropped,
    /// Unmapped read: fatal one cycle later.
    Fault,
}

impl DecodedTarget {
    /// Whether the transaction was accepted this cycle (drives the data grant).
    pub fn grants(self) -> bool {
        matches!(self, DecodedTarget::Ram | DecodedTarget::Periph(_))
    }
}

/// Register-update intents produced by decode and committed at the clock
/// edge. Keeping these out of the decode path means no shared state is
/// mutated mid-cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegIntents {
    pub timer_mask: Option<u32>,
    pub timer_count: Option<u32>,
    pub sig_begin: Option<u32>,
    pub sig_end: Option<u32>,
}

/// Classify a data-channel transaction. Pure: the fabric applies the returned
/// intents at the simulated clock edge.
pub fn decode(txn: &Transaction, capacity: u32) -> (DecodedTarget, RegIntents) {
    let mut intents = RegIntents::default();
    if !txn.req {
        return (DecodedTarget::Dropped, intents);
    }

    if txn.write {
        if txn.addr < capacity {
            return (DecodedTarget::Ram, intents);
        }
        let op = match txn.addr {
            CONSOLE_OUT_ADDR => PeriphOp::ConsoleOut,
            TEST_PROBE_ADDR => PeriphOp::TestProbe,
            EXIT_ADDR => PeriphOp::ExitTrigger,
            SIG_BEGIN_ADDR => {
                intents.sig_begin = Some(txn.wdata);
                PeriphOp::SigBegin
            }
            SIG_END_ADDR => {
                intents.sig_end = Some(txn.wdata);
                PeriphOp::SigEnd
            }
            SIG_DUMP_ADDR => PeriphOp::SigDump,
            TIMER_MASK_ADDR => {
                intents.timer_mask = Some(txn.wdata);
                PeriphOp::TimerMask
            }
            TIMER_COUNT_ADDR => {
                intents.timer_count = Some(txn.wdata);
                PeriphOp::TimerCount
            }
            _ => return (DecodedTarget::Dropped, intents),
        };
        (DecodedTarget::Periph(op), intents)
    } else {
        if txn.addr < capacity {
            (DecodedTarget::Ram, intents)
        } else if txn.addr == TIMER_STATUS_ADDR {
            (DecodedTarget::Periph(PeriphOp::StatusProbe), intents)
        } else {
            (DecodedTarget::Fault, intents)
        }
    }
}

/// Legal-address integrity check applied to every write: RAM range, the nine
/// mapped peripheral addresses, or the reserved block. Layered on top of the
/// silently-ignored-writes policy; a miss is a reportable condition, not a
/// decode error.
pub fn write_is_legal(addr: u32, capacity: u32) -> bool {
    addr < capacity
        || matches!(
            addr,
            CONSOLE_OUT_ADDR
                | TIMER_MASK_ADDR
                | TIMER_COUNT_ADDR
                | TIMER_STATUS_ADDR
                | TEST_PROBE_ADDR
                | EXIT_ADDR
                | SIG_BEGIN_ADDR
                | SIG_END_ADDR
                | SIG_DUMP_ADDR
        )
        || (RESERVED_BASE..=RESERVED_LAST).contains(&addr)
}
