// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Fixed-point formats used by the motion path.
//!
//! Positions are `q31.31` in an `i64`: one step is `1 << 31`. Per-tick velocities and
//! accelerations share that scale, so a velocity of half a step per tick is `1 << 30`. Wire values
//! are signed `q0.31` in an `i32`.

use micromath::F32Ext;

/// Signed 64-bit position or per-tick rate, 31 fractional bits.
pub type Q31_31 = i64;

/// Signed 32-bit fraction, 31 fractional bits.
pub type Sq0_31 = i32;

pub const RADIX: u32 = 31;

/// One whole step in `q31.31`.
pub const ONE_STEP: Q31_31 = 1 << RADIX;

/// Convert a float to fixed point with `radix` fractional bits, rounding half away from zero.
///
/// Rounds in the 64-bit domain; `F32Ext::round` goes through `i32` and saturates at scale.
pub fn to_fixed_point(value: f32, radix: u32) -> i64 {
    let scaled = value * (1u64 << radix) as f32;
    (scaled + F32Ext::copysign(0.5, scaled)) as i64
}

/// Multiply a `q31.31` scale by a `q0.31` fraction. `None` if the result does not fit.
pub fn fixed_point_multiply(scale: Q31_31, fraction: Sq0_31) -> Option<Q31_31> {
    let product = (scale as i128 * fraction as i128) >> RADIX;
    i64::try_from(product).ok()
}

/// Whole steps in a `q31.31` position, rounded toward negative infinity.
#[inline]
pub const fn whole_steps(position: Q31_31) -> i64 {
    position >> RADIX
}
