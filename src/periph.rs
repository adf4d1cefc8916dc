//! The peripheral bank: side effects behind the fixed decode addresses.
//!
//! Each decoded write performs exactly one action. The pass/fail/exit outputs
//! are combinational latches that pulse for the single cycle of the
//! triggering write; nothing here holds them. Output sinks and verbosity are
//! injected at construction, never process-global.

use crate::config::FabricConfig;
use crate::decode::{PeriphOp, FAIL_SENTINEL, PASS_SENTINEL};
use crate::memory::RamArray;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Combinational result outputs for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultLatches {
    pub tests_passed: bool,
    pub tests_failed: bool,
    pub exit_valid: bool,
    pub exit_value: u32,
}

pub struct PeripheralBank {
    verbose: bool,
    signature_file: Option<PathBuf>,
    console_out: Box<dyn Write + Send>,
    /// Low byte of the most recent console write.
    pub(crate) console_byte: u8,
    /// Signature range registers; meaningful once both halves were written.
    pub(crate) sig_begin: u32,
    pub(crate) sig_end: u32,
}

impl PeripheralBank {
    pub fn new(config: &FabricConfig) -> Self {
        Self::with_console_sink(config, Box::new(std::io::stdout()))
    }

    /// Same as `new` but with the raw console byte stream redirected, which
    /// is how tests capture output.
    pub fn with_console_sink(config: &FabricConfig, sink: Box<dyn Write + Send>) -> Self {
        PeripheralBank {
            verbose: config.verbose_console,
            signature_file: config.signature_file.clone(),
            console_out: sink,
            console_byte: 0,
            sig_begin: 0,
            sig_end: 0,
        }
    }

    pub fn reset(&mut self) {
        self.console_byte = 0;
        self.sig_begin = 0;
        self.sig_end = 0;
    }

    /// Perform the decoded operation for this cycle and report the result
    /// pulses. Signature/timer register loads are not applied here; they
    /// arrive as intents and commit at the clock edge.
    pub fn apply(&mut self, op: PeriphOp, wdata: u32, ram: &RamArray) -> ResultLatches {
        let mut out = ResultLatches::default();
        match op {
            PeriphOp::ConsoleOut => self.console_write(wdata as u8),
            PeriphOp::TestProbe => {
                if wdata == PASS_SENTINEL {
                    out.tests_passed = true;
                } else if wdata == FAIL_SENTINEL {
                    out.tests_failed = true;
                }
            }
            PeriphOp::ExitTrigger => {
                out.exit_valid = true;
                out.exit_value = wdata;
            }
            PeriphOp::SigDump => {
                self.dump_signature(ram);
                out.exit_valid = true;
                out.exit_value = 0;
            }
            // Register loads commit at the edge; the dedicated grant is the
            // only same-cycle effect.
            PeriphOp::SigBegin
            | PeriphOp::SigEnd
            | PeriphOp::TimerMask
            | PeriphOp::TimerCount => {}
            // Grant only; the status value rides the timer's own read path.
            PeriphOp::StatusProbe => {}
        }
        out
    }

    /// Edge commit for the signature range registers.
    pub fn commit_signature(&mut self, begin: Option<u32>, end: Option<u32>) {
        if let Some(begin) = begin {
            self.sig_begin = begin;
        }
        if let Some(end) = end {
            self.sig_end = end;
        }
    }

    pub fn signature_range(&self) -> (u32, u32) {
        (self.sig_begin, self.sig_end)
    }

    fn console_write(&mut self, byte: u8) {
        self.console_byte = byte;
        if self.verbose {
            if (32..=127).contains(&byte) {
                log::info!("console: '{}'", byte as char);
            } else {
                log::info!("console: {}", byte);
            }
        } else {
            // Best effort; a broken pipe on stdout is not the fabric's
            // problem.
            let _ = self.console_out.write_all(&[byte]);
            let _ = self.console_out.flush();
        }
    }

    /// Format the words of `[begin, end)`: four bytes per line in descending
    /// offset order, hex, no separators. The walk runs in u64 so a range
    /// ending at the top of the 32-bit space terminates instead of wrapping.
    pub fn signature_words(&self, ram: &RamArray) -> Vec<String> {
        let (begin, end) = (self.sig_begin as u64, self.sig_end as u64);
        let mut lines = Vec::new();
        let mut addr = begin;
        while addr < end {
            lines.push(format!(
                "{:02x}{:02x}{:02x}{:02x}",
                ram.read_byte((addr + 3) as u32),
                ram.read_byte((addr + 2) as u32),
                ram.read_byte((addr + 1) as u32),
                ram.read_byte(addr as u32)
            ));
            addr += 4;
        }
        lines
    }

    fn dump_signature(&mut self, ram: &RamArray) {
        let lines = self.signature_words(ram);
        log::info!(
            "signature dump: [{:#010x}, {:#010x}), {} words",
            self.sig_begin,
            self.sig_end,
            lines.len()
        );

        let mut file = match &self.signature_file {
            Some(path) => match File::create(path) {
                Ok(f) => Some(f),
                Err(e) => {
                    // File output is best effort; the log stream still gets
                    // the dump.
                    log::error!("cannot open signature file {}: {}", path.display(), e);
                    None
                }
            },
            None => None,
        };

        for line in &lines {
            log::info!("{}", line);
            if let Some(f) = file.as_mut() {
                if let Err(e) = writeln!(f, "{}", line) {
                    log::error!("signature file write failed: {}", e);
                    file = None;
                }
            }
        }
    }
}
