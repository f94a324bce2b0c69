//! Wavelet filter kernel catalog.
//!
//! A [`FilterKernel`] is an immutable description of how one line of samples
//! is split into lowpass and highpass halves. Two fixed lifting filters come
//! from JPEG 2000 Part 1, and two general forms cover custom filter banks:
//!
//! - [`FilterKernel::Reversible53`] - LeGall 5/3 integer lifting (lossless path)
//! - [`FilterKernel::Irreversible97`] - CDF 9/7 floating-point lifting (lossy path)
//! - [`FilterKernel::Arbitrary`] - analysis/synthesis FIR pair, applied by convolution
//! - [`FilterKernel::Lifting`] - ordered predict/update steps plus final scaling
//!
//! Validation happens at construction. A kernel that exists is always usable
//! by the transforms.
//!
//! # Example
//!
//! ```rust
//! use j2k_core::filter::{FilterKernel, LiftingRole, LiftingStep};
//!
//! let haar = FilterKernel::lifting(
//!     "haar",
//!     vec![
//!         LiftingStep::new(-1.0, LiftingRole::PredictOdd),
//!         LiftingStep::new(0.5, LiftingRole::UpdateEven),
//!     ],
//!     1.0,
//!     1.0,
//! )
//! .unwrap();
//! assert_eq!(haar.name(), "haar");
//!
//! let bad = FilterKernel::arbitrary("empty", vec![], vec![1.0], vec![1.0], vec![1.0]);
//! assert!(bad.is_err());
//! ```

use crate::error::{Error, Result};

/// CDF 9/7 first predict coefficient.
pub const CDF97_ALPHA: f32 = -1.586_134_3;
/// CDF 9/7 first update coefficient.
pub const CDF97_BETA: f32 = -0.052_980_118;
/// CDF 9/7 second predict coefficient.
pub const CDF97_GAMMA: f32 = 0.882_911_1;
/// CDF 9/7 second update coefficient.
pub const CDF97_DELTA: f32 = 0.443_506_87;
/// CDF 9/7 scaling constant.
pub const CDF97_K: f32 = 1.230_174_1;

/// Version of the catalog descriptors. Bumped whenever a preset changes numerically.
pub const CATALOG_VERSION: u32 = 1;

/// Names of the built-in presets, in catalog order.
pub const PRESET_NAMES: [&str; 3] = ["reversible53", "irreversible97", "lifting_cdf97"];

/// Which half of the signal a lifting step modifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiftingRole {
    /// Odd samples are updated from their even neighbours.
    PredictOdd,
    /// Even samples are updated from their odd neighbours.
    UpdateEven,
}

/// One step of a parameterized lifting scheme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiftingStep {
    /// Weight applied to the sum of the two neighbours.
    pub coefficient: f32,
    /// Samples modified by this step.
    pub role: LiftingRole,
}

impl LiftingStep {
    /// Creates a lifting step.
    pub const fn new(coefficient: f32, role: LiftingRole) -> Self {
        Self { coefficient, role }
    }
}

/// Analysis/synthesis FIR filter bank.
#[derive(Debug, Clone, PartialEq)]
pub struct FirBank {
    name: String,
    analysis_low: Vec<f32>,
    analysis_high: Vec<f32>,
    synthesis_low: Vec<f32>,
    synthesis_high: Vec<f32>,
}

impl FirBank {
    /// Bank name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowpass analysis taps.
    pub fn analysis_low(&self) -> &[f32] {
        &self.analysis_low
    }

    /// Highpass analysis taps.
    pub fn analysis_high(&self) -> &[f32] {
        &self.analysis_high
    }

    /// Lowpass synthesis taps.
    pub fn synthesis_low(&self) -> &[f32] {
        &self.synthesis_low
    }

    /// Highpass synthesis taps.
    pub fn synthesis_high(&self) -> &[f32] {
        &self.synthesis_high
    }
}

/// Ordered lifting steps with final lowpass/highpass scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct LiftingScheme {
    name: String,
    steps: Vec<LiftingStep>,
    scale_low: f32,
    scale_high: f32,
}

impl LiftingScheme {
    /// Scheme name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Steps in forward order.
    pub fn steps(&self) -> &[LiftingStep] {
        &self.steps
    }

    /// Final lowpass scale factor.
    pub fn scale_low(&self) -> f32 {
        self.scale_low
    }

    /// Final highpass scale factor.
    pub fn scale_high(&self) -> f32 {
        self.scale_high
    }
}

/// Wavelet filter kernel.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKernel {
    /// LeGall 5/3 reversible integer lifting.
    Reversible53,
    /// CDF 9/7 irreversible floating-point lifting.
    Irreversible97,
    /// General FIR analysis/synthesis pair.
    Arbitrary(FirBank),
    /// General lifting-step sequence.
    Lifting(LiftingScheme),
}

impl FilterKernel {
    /// The 5/3 reversible preset.
    pub fn reversible53() -> Self {
        Self::Reversible53
    }

    /// The 9/7 irreversible preset.
    pub fn irreversible97() -> Self {
        Self::Irreversible97
    }

    /// CDF 9/7 expressed as a parameterized lifting scheme.
    ///
    /// Numerically matches [`FilterKernel::Irreversible97`], but runs through
    /// the general lifting path.
    pub fn lifting_cdf97() -> Self {
        Self::Lifting(LiftingScheme {
            name: "lifting_cdf97".into(),
            steps: vec![
                LiftingStep::new(CDF97_ALPHA, LiftingRole::PredictOdd),
                LiftingStep::new(CDF97_BETA, LiftingRole::UpdateEven),
                LiftingStep::new(CDF97_GAMMA, LiftingRole::PredictOdd),
                LiftingStep::new(CDF97_DELTA, LiftingRole::UpdateEven),
            ],
            scale_low: CDF97_K,
            scale_high: 1.0 / CDF97_K,
        })
    }

    /// Looks up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "reversible53" => Some(Self::reversible53()),
            "irreversible97" => Some(Self::irreversible97()),
            "lifting_cdf97" => Some(Self::lifting_cdf97()),
            _ => None,
        }
    }

    /// Builds an arbitrary FIR kernel.
    ///
    /// All four tap sequences must be non-empty and finite.
    pub fn arbitrary(
        name: impl Into<String>,
        analysis_low: Vec<f32>,
        analysis_high: Vec<f32>,
        synthesis_low: Vec<f32>,
        synthesis_high: Vec<f32>,
    ) -> Result<Self> {
        for (label, taps) in [
            ("analysis lowpass", &analysis_low),
            ("analysis highpass", &analysis_high),
            ("synthesis lowpass", &synthesis_low),
            ("synthesis highpass", &synthesis_high),
        ] {
            if taps.is_empty() {
                return Err(Error::parameter(format!("{label} taps must not be empty")));
            }
            if taps.iter().any(|t| !t.is_finite()) {
                return Err(Error::parameter(format!("{label} taps must be finite")));
            }
        }

        Ok(Self::Arbitrary(FirBank {
            name: name.into(),
            analysis_low,
            analysis_high,
            synthesis_low,
            synthesis_high,
        }))
    }

    /// Builds a parameterized lifting kernel.
    ///
    /// Requires at least one step and non-zero, finite scale factors.
    pub fn lifting(
        name: impl Into<String>,
        steps: Vec<LiftingStep>,
        scale_low: f32,
        scale_high: f32,
    ) -> Result<Self> {
        if steps.is_empty() {
            return Err(Error::parameter("lifting scheme needs at least one step"));
        }
        if steps.iter().any(|s| !s.coefficient.is_finite()) {
            return Err(Error::parameter("lifting coefficients must be finite"));
        }
        for (label, scale) in [("lowpass", scale_low), ("highpass", scale_high)] {
            if scale == 0.0 || !scale.is_finite() {
                return Err(Error::parameter(format!(
                    "{label} scale factor must be non-zero and finite, got {scale}"
                )));
            }
        }

        Ok(Self::Lifting(LiftingScheme {
            name: name.into(),
            steps,
            scale_low,
            scale_high,
        }))
    }

    /// Kernel name.
    pub fn name(&self) -> &str {
        match self {
            Self::Reversible53 => "reversible53",
            Self::Irreversible97 => "irreversible97",
            Self::Arbitrary(bank) => bank.name(),
            Self::Lifting(scheme) => scheme.name(),
        }
    }

    /// Descriptor version.
    pub fn version(&self) -> u32 {
        CATALOG_VERSION
    }

    /// True when integer samples round-trip exactly.
    pub fn is_reversible(&self) -> bool {
        matches!(self, Self::Reversible53)
    }

    /// True for the two fixed JPEG 2000 filters.
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Reversible53 | Self::Irreversible97)
    }

    /// True if GPU DWT kernels exist for this filter.
    pub fn is_gpu_capable(&self) -> bool {
        self.is_fixed()
    }

    /// Minimum line length below which the transform is a lazy split.
    pub fn min_lift_len(&self) -> usize {
        if self.is_fixed() { 4 } else { 2 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        for name in PRESET_NAMES {
            let kernel = FilterKernel::preset(name).unwrap();
            assert_eq!(kernel.name(), name);
            assert_eq!(kernel.version(), CATALOG_VERSION);
        }
        assert!(FilterKernel::preset("haar").is_none());
        assert!(FilterKernel::reversible53().is_reversible());
        assert!(!FilterKernel::irreversible97().is_reversible());
    }

    #[test]
    fn test_lifting_cdf97_matches_constants() {
        let FilterKernel::Lifting(scheme) = FilterKernel::lifting_cdf97() else {
            panic!("expected lifting scheme");
        };
        assert_eq!(scheme.steps().len(), 4);
        assert_eq!(scheme.steps()[0].role, LiftingRole::PredictOdd);
        assert_eq!(scheme.steps()[3].coefficient, CDF97_DELTA);
        approx::assert_relative_eq!(scheme.scale_low() * scheme.scale_high(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_arbitrary_validation() {
        let ok = FilterKernel::arbitrary("lazy", vec![1.0], vec![1.0], vec![1.0], vec![1.0]);
        assert!(ok.is_ok());

        for empty in 0..4 {
            let mut taps = vec![vec![1.0f32]; 4];
            taps[empty].clear();
            let err = FilterKernel::arbitrary(
                "bad",
                taps[0].clone(),
                taps[1].clone(),
                taps[2].clone(),
                taps[3].clone(),
            )
            .unwrap_err();
            assert!(err.is_parameter());
        }

        let nan = FilterKernel::arbitrary("nan", vec![f32::NAN], vec![1.0], vec![1.0], vec![1.0]);
        assert!(nan.unwrap_err().is_parameter());
    }

    #[test]
    fn test_lifting_validation() {
        let step = LiftingStep::new(-0.5, LiftingRole::PredictOdd);
        assert!(FilterKernel::lifting("x", vec![], 1.0, 1.0).unwrap_err().is_parameter());
        assert!(FilterKernel::lifting("x", vec![step], 0.0, 1.0).unwrap_err().is_parameter());
        assert!(FilterKernel::lifting("x", vec![step], 1.0, 0.0).unwrap_err().is_parameter());
        assert!(FilterKernel::lifting("x", vec![step], 1.0, f32::INFINITY).is_err());
        assert!(FilterKernel::lifting("x", vec![step], 2.0, 0.5).is_ok());
    }

    #[test]
    fn test_min_lift_len() {
        assert_eq!(FilterKernel::reversible53().min_lift_len(), 4);
        assert_eq!(FilterKernel::lifting_cdf97().min_lift_len(), 2);
    }
}
