//! Host serial transmit task
//!
//! Drains the outbox and writes each line to the UART.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use crate::channels::OUTBOX;

/// Serial TX task - sends echoes, replies and errors to the host
#[embassy_executor::task]
pub async fn serial_tx_task(mut tx: BufferedUartTx) {
    info!("Serial TX task started");

    loop {
        let line = OUTBOX.receive().await;

        if let Err(e) = tx.write_all(&line).await {
            warn!("Failed to send line: {:?}", e);
        } else {
            trace!("TX: {} bytes", line.len());
        }
    }
}
