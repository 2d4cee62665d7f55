//! Match-wide bookkeeping shared by every component

pub mod round;

pub use round::RoundClock;
