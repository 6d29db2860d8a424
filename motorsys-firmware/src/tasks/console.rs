//! Console task
//!
//! Line-oriented UART console onto the motor class:
//!
//! ```text
//! > stepper ctl forward 200
//! ok
//! > stepper state
//! forward
//! > wheel-left speed 40
//! ok
//! > list
//! stepper
//! ...
//! ```

use core::fmt::Write as _;

use defmt::*;
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embedded_io_async::{Read, Write};
use heapless::String;

use motorsys_protocol::{LineParser, MotorClass, Request};

/// Most motors the console can reach
pub const MAX_MOTORS: usize = 8;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 32;

#[embassy_executor::task]
pub async fn console_task(
    mut rx: BufferedUartRx,
    mut tx: BufferedUartTx,
    mut class: MotorClass<'static, MAX_MOTORS>,
) {
    info!("Console task started, {} motors", class.len());

    let mut parser = LineParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("UART read error: {:?}", e);
                parser.reset();
                continue;
            }
        };

        for &byte in &buf[..n] {
            let Some(request) = parser.push(byte) else {
                continue;
            };
            match request {
                Ok(request) => handle_request(&mut tx, &mut class, request).await,
                Err(e) => {
                    debug!("console parse error: {:?}", e);
                    respond(&mut tx, "error: bad request").await;
                }
            }
        }
    }
}

async fn handle_request(
    tx: &mut BufferedUartTx,
    class: &mut MotorClass<'static, MAX_MOTORS>,
    request: Request,
) {
    match request {
        Request::List => {
            for name in class.names() {
                respond(tx, name).await;
            }
        }
        Request::Suspend => {
            let count = class.suspend();
            let mut line: String<24> = String::new();
            let _ = core::write!(line, "suspended {}", count);
            respond(tx, &line).await;
        }
        Request::Resume => {
            class.resume();
            respond(tx, "ok").await;
        }
        Request::Attribute(line) => match class.dispatch(&line) {
            Ok(Some(reply)) => respond(tx, &reply).await,
            Ok(None) => respond(tx, "ok").await,
            Err(e) => {
                let mut text: String<40> = String::new();
                let _ = core::write!(text, "error: {}", e);
                respond(tx, &text).await;
            }
        },
    }
}

/// Write one reply line
async fn respond(tx: &mut BufferedUartTx, text: &str) {
    let result = match tx.write_all(text.as_bytes()).await {
        Ok(()) => tx.write_all(b"\r\n").await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!("UART write error: {:?}", e);
    }
}
