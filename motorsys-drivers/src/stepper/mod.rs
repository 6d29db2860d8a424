//! Stepper drivers

pub mod bank;
pub mod unipolar;

use core::fmt::Write;

use heapless::String;
use motorsys_core::MotorState;

/// Step-count state text, e.g. `forward 120`
pub type StateText = String<24>;

/// Render a signed remaining count as `forward <n>`, `backward <n>` or
/// `standby`
pub fn state_detail(remaining_steps: i32) -> StateText {
    let mut text = StateText::new();
    // 24 bytes always fit "backward " plus any i32 magnitude
    let _ = match remaining_steps {
        0 => text.push_str(MotorState::Standby.as_str()).map_err(|_| core::fmt::Error),
        n if n > 0 => write!(text, "{} {}", MotorState::Forward.as_str(), n),
        n => write!(text, "{} {}", MotorState::Backward.as_str(), n.unsigned_abs()),
    };
    text
}
