//! Free-running countdown timer with a maskable interrupt request.
//!
//! One transition per cycle, priority order: reset, mask-register write,
//! count-register write, free-running decrement. The request is level-style:
//! once raised it stays up until acknowledged, and re-arms only via a fresh
//! reload. A register write and a countdown step never touch the same
//! register in the same cycle.

use serde::{Deserialize, Serialize};

/// Fixed interrupt identity of the timer.
pub const TIMER_IRQ_ID: u32 = 7;

/// Bit of the mask register gating the interrupt raise.
const IRQ_MASK_BIT: u32 = 1 << TIMER_IRQ_ID;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timer {
    mask: u32,
    count: u32,
    irq_pending: bool,
}

impl Timer {
    pub fn new() -> Self {
        Timer::default()
    }

    pub fn reset(&mut self) {
        self.mask = 0;
        self.count = 0;
        self.irq_pending = false;
    }

    /// Advance one cycle. `mask_load`/`count_load` carry this cycle's decoded
    /// register writes; `ack` is an external interrupt acknowledge by
    /// identity. An acknowledge for the timer's identity clears the request
    /// even if the countdown would raise it this same cycle.
    pub fn step(&mut self, mask_load: Option<u32>, count_load: Option<u32>, ack: Option<u32>) {
        if let Some(mask) = mask_load {
            self.mask = mask;
        } else if let Some(count) = count_load {
            self.count = count;
        } else if self.count > 0 {
            if self.count == 1 && self.mask & IRQ_MASK_BIT != 0 {
                self.irq_pending = true;
            }
            self.count -= 1;
        }

        if ack == Some(TIMER_IRQ_ID) {
            self.irq_pending = false;
        }
    }

    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed(count: u32) -> Timer {
        let mut t = Timer::new();
        t.step(Some(IRQ_MASK_BIT), None, None);
        t.step(None, Some(count), None);
        t
    }

    #[test]
    fn raises_on_the_one_to_zero_transition() {
        let mut t = armed(3);
        t.step(None, None, None);
        assert!(!t.irq_pending());
        t.step(None, None, None);
        assert!(!t.irq_pending());
        // count goes 1 -> 0 here
        t.step(None, None, None);
        assert!(t.irq_pending());
        assert_eq!(t.count(), 0);
    }

    #[test]
    fn masked_out_timer_never_raises() {
        let mut t = Timer::new();
        t.step(None, Some(2), None);
        for _ in 0..4 {
            t.step(None, None, None);
        }
        assert!(!t.irq_pending());
    }

    #[test]
    fn reload_of_zero_never_raises() {
        let mut t = armed(0);
        for _ in 0..3 {
            t.step(None, None, None);
        }
        assert!(!t.irq_pending());
    }

    #[test]
    fn request_is_level_until_acknowledged() {
        let mut t = armed(1);
        t.step(None, None, None);
        assert!(t.irq_pending());
        // stays up with no ack
        t.step(None, None, None);
        assert!(t.irq_pending());
        // ack for a different identity does nothing
        t.step(None, None, Some(3));
        assert!(t.irq_pending());
        t.step(None, None, Some(TIMER_IRQ_ID));
        assert!(!t.irq_pending());
    }

    #[test]
    fn ack_beats_a_concurrent_raise() {
        let mut t = armed(1);
        // the same cycle both decrements 1 -> 0 and acknowledges
        t.step(None, None, Some(TIMER_IRQ_ID));
        assert!(!t.irq_pending());
        assert_eq!(t.count(), 0);
    }

    #[test]
    fn register_write_suppresses_the_countdown_that_cycle() {
        let mut t = armed(1);
        // a mask write in the 1 -> 0 cycle defers the decrement
        t.step(Some(IRQ_MASK_BIT), None, None);
        assert_eq!(t.count(), 1);
        assert!(!t.irq_pending());
        t.step(None, None, None);
        assert!(t.irq_pending());
    }

    #[test]
    fn reset_clears_everything() {
        let mut t = armed(1);
        t.step(None, None, None);
        assert!(t.irq_pending());
        t.reset();
        assert!(!t.irq_pending());
        assert_eq!(t.mask(), 0);
        assert_eq!(t.count(), 0);
    }
}
