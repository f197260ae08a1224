//! CLI-facing outcome shaping and timing.

pub(crate) mod outcome;
pub(crate) mod timings;
