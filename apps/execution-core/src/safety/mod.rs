//! Safety primitives.

mod kill_switch;

pub use kill_switch::KillSwitch;
