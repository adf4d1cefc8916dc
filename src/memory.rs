//! Unified RAM array behind the fabric.
//!
//! Plain synchronous storage with word-aligned access and byte-lane write
//! masking. Instruction fetch and data access are independent read ports, so
//! a fetch and a data write in the same cycle are both serviced. Addresses
//! are masked to the power-of-two capacity; range policy lives in the
//! decoder, not here.

use crate::decode::ByteEnable;
use std::path::Path;

pub struct RamArray {
    bytes: Vec<u8>,
    addr_mask: u32,
}

impl RamArray {
    /// `capacity` must be a power of two (the config layer guarantees it).
    pub fn new(capacity: u32) -> Self {
        debug_assert!(capacity.is_power_of_two());
        RamArray {
            bytes: vec![0; capacity as usize],
            addr_mask: capacity - 1,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.bytes.len() as u32
    }

    fn word_base(&self, addr: u32) -> usize {
        // Word-aligned: the two low address bits are ignored.
        (addr & self.addr_mask & !3) as usize
    }

    /// Data-port word read (little-endian byte order).
    pub fn read_word(&self, addr: u32) -> u32 {
        let base = self.word_base(addr);
        u32::from_le_bytes([
            self.bytes[base],
            self.bytes[base + 1],
            self.bytes[base + 2],
            self.bytes[base + 3],
        ])
    }

    /// Instruction-port word read. Same storage, separate port.
    pub fn fetch_word(&self, addr: u32) -> u32 {
        self.read_word(addr)
    }

    /// Data-port word write with byte-lane masking: only enabled lanes change.
    pub fn write_word(&mut self, addr: u32, wdata: u32, be: ByteEnable) {
        let base = self.word_base(addr);
        let data = wdata.to_le_bytes();
        for lane in 0..4 {
            if be.bits() & (1 << lane) != 0 {
                self.bytes[base + lane] = data[lane];
            }
        }
    }

    /// Byte read for signature emission (non-destructive).
    pub fn read_byte(&self, addr: u32) -> u8 {
        self.bytes[(addr & self.addr_mask) as usize]
    }

    /// Copy a flat binary image into RAM at `offset`.
    pub fn load_image(&mut self, image: &[u8], offset: u32) -> Result<(), String> {
        let end = offset as usize + image.len();
        if end > self.bytes.len() {
            return Err(format!(
                "image of {} bytes at offset {:#x} exceeds RAM capacity {:#x}",
                image.len(),
                offset,
                self.bytes.len()
            ));
        }
        self.bytes[offset as usize..end].copy_from_slice(image);
        Ok(())
    }

    pub fn load_image_file<P: AsRef<Path>>(&mut self, path: P, offset: u32) -> Result<(), String> {
        let image = std::fs::read(path.as_ref())
            .map_err(|e| format!("failed to read image {}: {}", path.as_ref().display(), e))?;
        self.load_image(&image, offset)
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn restore_bytes(&mut self, bytes: &[u8]) -> Result<(), String> {
        if bytes.len() != self.bytes.len() {
            return Err(format!(
                "RAM snapshot is {} bytes, array holds {}",
                bytes.len(),
                self.bytes.len()
            ));
        }
        self.bytes.copy_from_slice(bytes);
        Ok(())
    }
}
