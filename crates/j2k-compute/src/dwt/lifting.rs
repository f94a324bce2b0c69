//! In-place lifting on interleaved lines.
//!
//! Every routine here works on a line in its natural (interleaved) order:
//! even positions end up holding lowpass coefficients, odd positions
//! highpass. Splitting into halves is done by the caller.
//!
//! ```text
//! forward:  split -> predict odd -> update even -> ... -> scale
//! inverse:  unscale -> ... -> undo update -> undo predict -> merge
//! ```
//!
//! Boundaries use whole-sample symmetric extension, which for the two-tap
//! lifting neighbourhoods reduces to replicating the nearest neighbour of the
//! other parity: `x[-1] = x[1]` and `x[n] = x[n - 2]`.

use j2k_core::filter::{
    CDF97_ALPHA, CDF97_BETA, CDF97_DELTA, CDF97_GAMMA, CDF97_K, LiftingRole, LiftingScheme,
    LiftingStep,
};

/// CDF 9/7 lifting steps in forward order.
pub(crate) const CDF97_STEPS: [LiftingStep; 4] = [
    LiftingStep::new(CDF97_ALPHA, LiftingRole::PredictOdd),
    LiftingStep::new(CDF97_BETA, LiftingRole::UpdateEven),
    LiftingStep::new(CDF97_GAMMA, LiftingRole::PredictOdd),
    LiftingStep::new(CDF97_DELTA, LiftingRole::UpdateEven),
];

#[inline(always)]
fn neighbours<T: Copy>(x: &[T], i: usize) -> (T, T) {
    let n = x.len();
    let left = if i > 0 { x[i - 1] } else { x[i + 1] };
    let right = if i + 1 < n { x[i + 1] } else { x[i - 1] };
    (left, right)
}

// =============================================================================
// 5/3 reversible
// =============================================================================

/// `floor((a + b) / 2)` without intermediate overflow.
#[inline(always)]
fn predict_53(a: i32, b: i32) -> i32 {
    ((a as i64 + b as i64) >> 1) as i32
}

/// `floor((a + b + 2) / 4)` without intermediate overflow.
#[inline(always)]
fn update_53(a: i32, b: i32) -> i32 {
    ((a as i64 + b as i64 + 2) >> 2) as i32
}

/// Forward 5/3 on integers.
///
/// Wrapping adds keep the step exactly invertible for every `i32` input.
pub(crate) fn forward_53(x: &mut [i32]) {
    let n = x.len();
    for i in (1..n).step_by(2) {
        let (l, r) = neighbours(x, i);
        x[i] = x[i].wrapping_sub(predict_53(l, r));
    }
    for i in (0..n).step_by(2) {
        let (l, r) = neighbours(x, i);
        x[i] = x[i].wrapping_add(update_53(l, r));
    }
}

/// Inverse 5/3 on integers.
pub(crate) fn inverse_53(x: &mut [i32]) {
    let n = x.len();
    for i in (0..n).step_by(2) {
        let (l, r) = neighbours(x, i);
        x[i] = x[i].wrapping_sub(update_53(l, r));
    }
    for i in (1..n).step_by(2) {
        let (l, r) = neighbours(x, i);
        x[i] = x[i].wrapping_add(predict_53(l, r));
    }
}

/// Forward 5/3 evaluated in floating point.
///
/// Uses the same floor rounding as the integer path, so integer-valued
/// samples produce integer-valued coefficients.
pub(crate) fn forward_53_f32(x: &mut [f32]) {
    let n = x.len();
    for i in (1..n).step_by(2) {
        let (l, r) = neighbours(x, i);
        x[i] -= ((l + r) * 0.5).floor();
    }
    for i in (0..n).step_by(2) {
        let (l, r) = neighbours(x, i);
        x[i] += ((l + r + 2.0) * 0.25).floor();
    }
}

/// Inverse of [`forward_53_f32`].
pub(crate) fn inverse_53_f32(x: &mut [f32]) {
    let n = x.len();
    for i in (0..n).step_by(2) {
        let (l, r) = neighbours(x, i);
        x[i] -= ((l + r + 2.0) * 0.25).floor();
    }
    for i in (1..n).step_by(2) {
        let (l, r) = neighbours(x, i);
        x[i] += ((l + r) * 0.5).floor();
    }
}

// =============================================================================
// Floating-point lifting steps (9/7 and parameterized schemes)
// =============================================================================

#[inline]
fn apply_step(x: &mut [f32], step: &LiftingStep, sign: f32) {
    let c = step.coefficient * sign;
    let start = match step.role {
        LiftingRole::PredictOdd => 1,
        LiftingRole::UpdateEven => 0,
    };
    for i in (start..x.len()).step_by(2) {
        let (l, r) = neighbours(x, i);
        x[i] += c * (l + r);
    }
}

fn scale(x: &mut [f32], low: f32, high: f32) {
    for pair in x.chunks_mut(2) {
        pair[0] *= low;
        if let Some(h) = pair.get_mut(1) {
            *h *= high;
        }
    }
}

fn unscale(x: &mut [f32], low: f32, high: f32) {
    for pair in x.chunks_mut(2) {
        pair[0] /= low;
        if let Some(h) = pair.get_mut(1) {
            *h /= high;
        }
    }
}

/// Runs `steps` in order, then scales.
pub(crate) fn forward_steps(x: &mut [f32], steps: &[LiftingStep], scale_low: f32, scale_high: f32) {
    for step in steps {
        apply_step(x, step, 1.0);
    }
    scale(x, scale_low, scale_high);
}

/// Undoes the scaling, then replays `steps` backwards with negated coefficients.
pub(crate) fn inverse_steps(x: &mut [f32], steps: &[LiftingStep], scale_low: f32, scale_high: f32) {
    unscale(x, scale_low, scale_high);
    for step in steps.iter().rev() {
        apply_step(x, step, -1.0);
    }
}

/// Forward CDF 9/7.
pub(crate) fn forward_97(x: &mut [f32]) {
    forward_steps(x, &CDF97_STEPS, CDF97_K, 1.0 / CDF97_K);
}

/// Inverse CDF 9/7.
pub(crate) fn inverse_97(x: &mut [f32]) {
    inverse_steps(x, &CDF97_STEPS, CDF97_K, 1.0 / CDF97_K);
}

/// Forward parameterized lifting scheme.
pub(crate) fn forward_scheme(x: &mut [f32], scheme: &LiftingScheme) {
    forward_steps(x, scheme.steps(), scheme.scale_low(), scheme.scale_high());
}

/// Inverse parameterized lifting scheme.
pub(crate) fn inverse_scheme(x: &mut [f32], scheme: &LiftingScheme) {
    inverse_steps(x, scheme.steps(), scheme.scale_low(), scheme.scale_high());
}
