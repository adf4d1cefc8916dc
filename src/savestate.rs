//! Fabric snapshots.
//!
//! Only architectural state is captured: RAM contents, timer registers, the
//! signature range, the console latch, and the per-channel delay registers.
//! Output sinks and configuration are reattached by the caller on restore.

use crate::bus::Fabric;
use crate::timer::Timer;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;

pub const SAVESTATE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
pub struct SaveState {
    pub version: u32,
    pub ram: Vec<u8>,
    pub timer: Timer,
    pub sig_begin: u32,
    pub sig_end: u32,
    pub console_byte: u8,
    pub instr_valid: bool,
    pub data_valid: bool,
    pub instr_rdata: u32,
    pub data_rdata: u32,
}

impl SaveState {
    pub fn capture(fabric: &Fabric) -> Self {
        let (sig_begin, sig_end) = fabric.signature_range();
        SaveState {
            version: SAVESTATE_VERSION,
            ram: fabric.ram.as_bytes().to_vec(),
            timer: fabric.timer.clone(),
            sig_begin,
            sig_end,
            console_byte: fabric.periph.console_byte,
            instr_valid: fabric.instr_ch.valid(),
            data_valid: fabric.data_ch.valid(),
            instr_rdata: fabric.instr_rdata_q,
            data_rdata: fabric.data_rdata_q,
        }
    }

    pub fn restore(&self, fabric: &mut Fabric) -> Result<(), String> {
        if self.version > SAVESTATE_VERSION {
            return Err(format!(
                "save state version {} is not supported (current: {})",
                self.version, SAVESTATE_VERSION
            ));
        }
        fabric.ram.restore_bytes(&self.ram)?;
        fabric.timer = self.timer.clone();
        fabric.periph.console_byte = self.console_byte;
        fabric.periph.sig_begin = self.sig_begin;
        fabric.periph.sig_end = self.sig_end;
        fabric.instr_ch.force(self.instr_valid);
        fabric.data_ch.force(self.data_valid);
        fabric.instr_rdata_q = self.instr_rdata;
        fabric.data_rdata_q = self.data_rdata;
        Ok(())
    }

    pub fn save_to_file(&self, filename: &str) -> Result<(), String> {
        let file =
            File::create(filename).map_err(|e| format!("Failed to create save file: {}", e))?;
        bincode::serialize_into(file, self)
            .map_err(|e| format!("Failed to serialize save state: {}", e))
    }

    pub fn load_from_file(filename: &str) -> Result<Self, String> {
        let file = File::open(filename).map_err(|e| format!("Failed to open save file: {}", e))?;
        bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| format!("Failed to deserialize save state: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InstrRequest;
    use crate::config::FabricConfig;
    use crate::decode::{Transaction, SIG_BEGIN_ADDR, SIG_END_ADDR, TIMER_COUNT_ADDR,
        TIMER_MASK_ADDR};

    fn fabric() -> Fabric {
        let config = FabricConfig {
            capacity: 0x1000,
            ..FabricConfig::default()
        };
        Fabric::with_console_sink(config, Box::new(std::io::sink()))
    }

    fn write(fab: &mut Fabric, addr: u32, wdata: u32) {
        fab.step(InstrRequest::idle(), Transaction::write(addr, wdata), None)
            .unwrap();
    }

    #[test]
    fn round_trip_restores_ram_timer_and_signature() {
        let mut fab = fabric();
        write(&mut fab, 0x40, 0x1234_5678);
        write(&mut fab, SIG_BEGIN_ADDR, 0x40);
        write(&mut fab, SIG_END_ADDR, 0x44);
        write(&mut fab, TIMER_MASK_ADDR, 1 << 7);
        write(&mut fab, TIMER_COUNT_ADDR, 9);

        let snap = SaveState::capture(&fab);

        let mut other = fabric();
        snap.restore(&mut other).unwrap();
        assert_eq!(other.ram().read_word(0x40), 0x1234_5678);
        assert_eq!(other.signature_range(), (0x40, 0x44));
        assert_eq!(other.timer().count(), 9);
        assert_eq!(other.timer().mask(), 1 << 7);
    }

    #[test]
    fn restore_rejects_newer_versions() {
        let fab = fabric();
        let mut snap = SaveState::capture(&fab);
        snap.version = SAVESTATE_VERSION + 1;
        let mut other = fabric();
        assert!(snap.restore(&mut other).is_err());
    }

    #[test]
    fn restore_rejects_mismatched_ram_size() {
        let fab = fabric();
        let snap = SaveState::capture(&fab);
        let mut bigger = Fabric::with_console_sink(
            FabricConfig {
                capacity: 0x2000,
                ..FabricConfig::default()
            },
            Box::new(std::io::sink()),
        );
        assert!(snap.restore(&mut bigger).is_err());
    }

    #[test]
    fn pending_valid_survives_the_round_trip() {
        let mut fab = fabric();
        // a granted read leaves valid pending in the delay register
        fab.step(InstrRequest::idle(), Transaction::read(0x0), None)
            .unwrap();
        let snap = SaveState::capture(&fab);

        let mut other = fabric();
        snap.restore(&mut other).unwrap();
        let out = other
            .step(InstrRequest::idle(), Transaction::idle(), None)
            .unwrap();
        assert!(out.data_valid);
    }
}
