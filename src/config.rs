//! Injected fabric configuration.
//!
//! Everything that used to be process-global in harnesses of this kind
//! (verbosity, strictness, output paths) is carried here and handed to the
//! fabric at construction. `from_env` exists for the headless binary; library
//! users build the struct directly.

use std::path::PathBuf;

/// How an illegal (unmapped, non-reserved) write is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// Log a diagnostic and drop the write. The simulation default.
    Report,
    /// Abort with an error, for verification runs.
    Fatal,
}

#[derive(Debug, Clone)]
pub struct FabricConfig {
    /// RAM capacity in bytes; must be a power of two and sit below the first
    /// peripheral address.
    pub capacity: u32,
    /// Verbose console: format bytes as characters/integers to the log
    /// stream instead of emitting them raw.
    pub verbose_console: bool,
    pub strictness: Strictness,
    /// Optional file the signature dump is also written to (best effort).
    pub signature_file: Option<PathBuf>,
}

impl Default for FabricConfig {
    fn default() -> Self {
        FabricConfig {
            capacity: 0x40_0000,
            verbose_console: false,
            strictness: Strictness::Report,
            signature_file: None,
        }
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| {
            v.strip_prefix("0x")
                .map(|h| u32::from_str_radix(h, 16).ok())
                .unwrap_or_else(|| v.parse::<u32>().ok())
        })
        .unwrap_or(default)
}

impl FabricConfig {
    /// Read configuration from `TB_*` environment variables:
    /// `TB_RAM_BYTES` (rounded up to a power of two), `TB_VERBOSE`,
    /// `TB_STRICT_WRITES`, `TB_SIGNATURE_FILE`.
    pub fn from_env() -> Self {
        let defaults = FabricConfig::default();
        let capacity = env_u32("TB_RAM_BYTES", defaults.capacity)
            .max(16)
            .next_power_of_two();
        FabricConfig {
            capacity,
            verbose_console: env_flag("TB_VERBOSE", defaults.verbose_console),
            strictness: if env_flag("TB_STRICT_WRITES", false) {
                Strictness::Fatal
            } else {
                Strictness::Report
            },
            signature_file: std::env::var("TB_SIGNATURE_FILE").ok().map(PathBuf::from),
        }
    }
}
