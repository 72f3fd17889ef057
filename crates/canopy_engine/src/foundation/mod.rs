//! Foundation utilities shared by all engine subsystems

pub mod math;
pub mod time;
