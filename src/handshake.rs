//! Request/grant/valid sequencing, one instance per bus channel.
//!
//! Grant is combinational and computed by the caller; valid is grant delayed
//! by exactly one clock through an explicit delay register. Reset forces the
//! register low.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Channel {
    valid_q: bool,
}

impl Channel {
    pub fn new() -> Self {
        Channel::default()
    }

    pub fn reset(&mut self) {
        self.valid_q = false;
    }

    /// Clock edge: returns this cycle's valid (last cycle's grant) and loads
    /// the delay register with this cycle's grant.
    pub fn shift(&mut self, grant: bool) -> bool {
        let valid = self.valid_q;
        self.valid_q = grant;
        valid
    }

    pub fn valid(&self) -> bool {
        self.valid_q
    }

    pub(crate) fn force(&mut self, valid: bool) {
        self.valid_q = valid;
    }
}
