//! Headless smoke harness for the bus fabric.
//!
//! Drives a scripted transaction sequence through every peripheral path:
//! console output, timer countdown to an interrupt with acknowledge, and a
//! signature window dump. Configuration comes from the `TB_*` environment
//! variables; the process exits with the fabric's captured exit value.

use rv_testbus::decode::{
    CONSOLE_OUT_ADDR, SIG_BEGIN_ADDR, SIG_DUMP_ADDR, SIG_END_ADDR, TIMER_COUNT_ADDR,
    TIMER_MASK_ADDR,
};
use rv_testbus::{Fabric, FabricConfig, InstrRequest, Transaction, TIMER_IRQ_ID};
use std::process;

fn drive_write(fabric: &mut Fabric, addr: u32, wdata: u32) -> u32 {
    match fabric.step(InstrRequest::idle(), Transaction::write(addr, wdata), None) {
        Ok(out) if out.exit_valid => out.exit_value,
        Ok(_) => 0,
        Err(e) => {
            log::error!("fabric fault: {}", e);
            process::exit(1);
        }
    }
}

fn main() {
    env_logger::init();

    let config = FabricConfig::from_env();
    log::info!(
        "fabric up: {:#x} bytes of RAM, verbose={}",
        config.capacity,
        config.verbose_console
    );
    let mut fabric = Fabric::new(config);
    fabric.reset();

    // Console path.
    for b in b"bus fabric smoke test\n" {
        drive_write(&mut fabric, CONSOLE_OUT_ADDR, *b as u32);
    }

    // Timer path: arm, count down to the interrupt, acknowledge it.
    drive_write(&mut fabric, TIMER_MASK_ADDR, 1 << 7);
    drive_write(&mut fabric, TIMER_COUNT_ADDR, 16);
    let mut cycles = 0u32;
    loop {
        let out = fabric
            .step(InstrRequest::idle(), Transaction::idle(), None)
            .unwrap_or_else(|e| {
                log::error!("fabric fault: {}", e);
                process::exit(1);
            });
        cycles += 1;
        if out.timer_irq {
            log::info!("timer irq after {} cycles", cycles);
            break;
        }
        if cycles > 64 {
            log::error!("timer never raised");
            process::exit(1);
        }
    }
    fabric
        .step(InstrRequest::idle(), Transaction::idle(), Some(TIMER_IRQ_ID))
        .expect("ack cycle");

    // Signature path: fill a window, program the range, dump and exit.
    for i in 0..8u32 {
        drive_write(&mut fabric, 0x100 + i * 4, 0xA500_0000 | i);
    }
    drive_write(&mut fabric, SIG_BEGIN_ADDR, 0x100);
    drive_write(&mut fabric, SIG_END_ADDR, 0x120);
    let exit_value = drive_write(&mut fabric, SIG_DUMP_ADDR, 0);

    log::info!("exit_value={}", exit_value);
    process::exit(exit_value as i32);
}
