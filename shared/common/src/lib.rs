pub use arrayvec::*;
pub use derive_more;
pub use float_ord::FloatOrd;
pub use itertools::*;
pub use ordered_float::OrderedFloat;
pub use parking_lot;
pub use rand::prelude::*;
pub use smallvec::*;
pub use thiserror::{self, Error};

pub use lazy_static::lazy_static;
pub use logging::{self, prelude::*, slog_kv_debug, slog_value_debug};
pub use metrics::{self, declare_cost_gauge};
pub use newtype::NormalizedFloat;

// common imports that annoyingly get resolved to other pub exports of std/core
// https://github.com/intellij-rust/intellij-rust/issues/5654
pub use std::{
    error::Error,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::Hash,
    iter::{empty, once},
    marker::PhantomData,
};

pub type BoxedResult<T> = Result<T, Box<dyn Error>>;

pub mod newtype;
pub mod random;

pub fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}
