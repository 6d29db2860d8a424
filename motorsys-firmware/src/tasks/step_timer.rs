//! Step timer task
//!
//! Sleeps for the channel's interval and ticks it, for as long as the channel
//! asks to be rearmed. A cancel wakes the sleep early and drops the run.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Timer};

use motorsys_core::TickOutcome;

use crate::channels::StepperChannel;

#[embassy_executor::task(pool_size = 3)]
pub async fn step_timer_task(name: &'static str, channel: &'static StepperChannel) {
    info!("{}: step timer started", name);
    let timer = *channel.timer();

    loop {
        let mut after = timer.started().await;
        trace!("{}: armed, first tick in {} us", name, after.as_micros() as u64);

        loop {
            let sleep = Timer::after(Duration::from_micros(after.as_micros() as u64));
            match select(sleep, timer.cancelled()).await {
                Either::First(()) => match channel.tick() {
                    TickOutcome::Rearm(next) => after = next,
                    TickOutcome::Disarm => {
                        debug!("{}: idle", name);
                        break;
                    }
                },
                Either::Second(()) => {
                    debug!("{}: timer cancelled", name);
                    break;
                }
            }
        }
    }
}
