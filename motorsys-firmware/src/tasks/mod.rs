//! Embassy async tasks
//!
//! Each stepper channel gets a step timer task (the tick context) and an
//! actuation task (the deferred actuation context). The console task is the
//! command context.

pub mod actuation;
pub mod console;
pub mod step_timer;

pub use actuation::actuation_task;
pub use console::console_task;
pub use step_timer::step_timer_task;
