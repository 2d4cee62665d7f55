//! Deterministic random number generation
//!
//! Every random draw in a match goes through [`RngManager`]. Sources are
//! owned by whoever draws from them (a control provider, a test) and are
//! seeded from the match seed, never from global state.

mod xorshift;

pub use xorshift::RngManager;
