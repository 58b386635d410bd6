//! Host serial receive task
//!
//! Collects `<...>` frames from the UART and runs each one against the
//! shared controller. The echo and any reply go out through the outbox.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use pneumo_protocol::{Frame, FrameReceiver};

use crate::board::SharedController;
use crate::channels::OUTBOX;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Serial RX task - receives frames from the host
#[embassy_executor::task]
pub async fn serial_rx_task(mut rx: BufferedUartRx, controller: &'static SharedController) {
    info!("Serial RX task started");

    let mut receiver = FrameReceiver::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for frame in receiver.frames(&buf[..n]) {
                    handle_frame(&frame, controller).await;
                }
            }
            Ok(_) => {
                // No bytes read, continue
            }
            Err(e) => {
                warn!("UART read error: {:?}", e);
                if receiver.in_frame() {
                    debug!("Discarding partial frame");
                    receiver.reset();
                }
            }
        }
    }
}

/// Execute one frame and queue its echo and any reply line
async fn handle_frame(frame: &Frame, controller: &SharedController) {
    if frame.is_truncated() {
        warn!("Frame truncated, {} bytes dropped", frame.dropped());
    }

    debug!("Frame: {=[u8]:a}", frame.as_bytes());

    let lines = controller.lock().await.handle_frame(frame);
    trace!("Frame answered with {} lines", lines.len());

    for line in lines {
        OUTBOX.send(line).await;
    }
}
