// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Crate-internal logging macros.
//!
//! With the `defmt` feature the macros are defmt's own. Otherwise they forward to the `log`
//! facade, so host builds and tests can install any `log` backend. Format strings stick to `{}`
//! and `{:?}` so both backends accept them.

#![allow(unused_macros)]

#[allow(unused_imports)]
#[cfg(feature = "defmt")]
pub(crate) use defmt::{debug, error, info, trace, warn};

#[cfg(not(feature = "defmt"))]
macro_rules! trace {
    ($($arg:tt)+) => (log::trace!(target: "ot3_motion", $($arg)+))
}

#[cfg(not(feature = "defmt"))]
macro_rules! debug {
    ($($arg:tt)+) => (log::debug!(target: "ot3_motion", $($arg)+))
}

#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ($($arg:tt)+) => (log::info!(target: "ot3_motion", $($arg)+))
}

// `warn` collides with the builtin lint attribute when defined directly.
#[cfg(not(feature = "defmt"))]
macro_rules! warni {
    ($($arg:tt)+) => (log::warn!(target: "ot3_motion", $($arg)+))
}

#[cfg(not(feature = "defmt"))]
macro_rules! error {
    ($($arg:tt)+) => (log::error!(target: "ot3_motion", $($arg)+))
}

#[allow(unused_imports)]
#[cfg(not(feature = "defmt"))]
pub(crate) use {debug, error, info, trace, warni as warn};
