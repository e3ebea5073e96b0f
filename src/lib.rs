//! Live volleyball match tracking: rotation and scoring, substitutions,
//! timeouts, statistics and an in-memory archive of finished matches.
//!
//! [`state::Tracker`] owns everything and is changed only through
//! [`state::apply_command`]. The core is single-threaded; callers with more
//! than one input source serialize them into one command queue.

pub mod advisory;
pub mod archive;
pub mod config;
pub mod export;
pub mod lineup;
pub mod persist;
pub mod rally;
pub mod roster;
pub mod sim;
pub mod state;
pub mod stats;
pub mod subs;
