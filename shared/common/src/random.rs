//! Helpers for the per-invocation deterministic RNG. Unlike this workspace's original game loop,
//! the balancer never shares a single RNG across threads (§5: one invocation runs at a time, and
//! owns its own `SmallRng`) — so there is no global `RANDY` mutex here, just construction helpers.
use crate::*;

pub trait SmallRngExt {
    /// Uses thread rng as seed, to avoid going through the OS getrandom, which is way slower and
    /// more secure than we need.
    fn new_quick() -> SmallRng;
}

impl SmallRngExt for SmallRng {
    fn new_quick() -> SmallRng {
        SmallRng::from_rng(thread_rng()).expect("failed to seed quick rng")
    }
}
