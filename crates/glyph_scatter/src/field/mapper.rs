//! Affine range mappers with optional quantization into bins.
//!
//! Coefficients are computed on first use and then fixed for the lifetime of
//! the mapper. Quantization maps each field value to the midpoint of the first
//! (ascending) bin whose closed interval contains it, which yields discrete
//! glyph size classes instead of continuous variation.
use std::sync::OnceLock;

use glam::DVec3;
use tracing::debug;

use crate::error::{Error, Result};
use crate::field::{AxisRange, Domain, ScalarField};

/// `v ↦ a·v + b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
}

impl Affine {
    /// Maps `input` onto `output`; `input` must have non-zero width.
    fn between(input: AxisRange, output: AxisRange) -> Self {
        let a = output.width() / input.width();
        let b = output.max - a * input.max;
        debug!("Linear mapping coefficients: a={a:.6} b={b:.6}.");
        Self { a, b }
    }

    #[inline]
    pub fn apply(&self, v: f64) -> f64 {
        self.a * v + self.b
    }
}

fn check_input_width(input: AxisRange) -> Result<()> {
    if input.width() == 0.0 {
        return Err(Error::InvalidConfig(format!(
            "input range [{}, {}] has zero width",
            input.min, input.max
        )));
    }
    Ok(())
}

/// Maps a known input range onto an output range.
#[derive(Debug)]
pub struct LinearMapper {
    input: AxisRange,
    output: AxisRange,
    coefficients: OnceLock<Affine>,
}

impl LinearMapper {
    pub fn new(input: impl Into<AxisRange>, output: impl Into<AxisRange>) -> Result<Self> {
        let input = input.into();
        check_input_width(input)?;
        Ok(Self {
            input,
            output: output.into(),
            coefficients: OnceLock::new(),
        })
    }

    pub fn coefficients(&self) -> Affine {
        *self
            .coefficients
            .get_or_init(|| Affine::between(self.input, self.output))
    }

    pub fn map(&self, value: f64) -> f64 {
        self.coefficients().apply(value)
    }
}

/// Closed interval of field values represented by its midpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub value: f64,
}

impl Bin {
    pub fn contains(&self, v: f64) -> bool {
        self.lower <= v && v <= self.upper
    }
}

/// `num_bins` equal-width bins covering `[range.min, range.max]`, ascending.
fn build_bins(range: AxisRange, num_bins: usize) -> Vec<Bin> {
    let bucket = range.width() / num_bins as f64;
    (0..num_bins)
        .map(|i| {
            let lower = range.min + i as f64 * bucket;
            let upper = if i + 1 == num_bins {
                range.max
            } else {
                range.min + (i + 1) as f64 * bucket
            };
            Bin {
                lower,
                upper,
                value: (lower + upper) / 2.0,
            }
        })
        .collect()
}

/// Result of range discovery: the empirical field range, the affine map and the bins.
#[derive(Clone, Debug, PartialEq)]
pub struct Calibration {
    pub range: AxisRange,
    pub affine: Affine,
    pub bins: Vec<Bin>,
}

impl Calibration {
    /// Representative value of the first bin containing `v`, or `v` when unbinned.
    pub fn quantize(&self, v: f64) -> f64 {
        self.bins
            .iter()
            .find(|bin| bin.contains(v))
            .map_or(v, |bin| bin.value)
    }

    #[inline]
    pub fn apply(&self, v: f64) -> f64 {
        self.affine.apply(self.quantize(v))
    }
}

/// Maps a scalar field over a 3D domain onto an output range.
///
/// The field's range is discovered by evaluating it at every point of the
/// domain grid on first use.
pub struct FieldMapper3D<F> {
    domain: Domain,
    field: F,
    output: AxisRange,
    num_bins: Option<usize>,
    calibration: OnceLock<Calibration>,
}

impl<F: ScalarField> FieldMapper3D<F> {
    pub fn new(domain: Domain, field: F, output: impl Into<AxisRange>) -> Self {
        Self {
            domain,
            field,
            output: output.into(),
            num_bins: None,
            calibration: OnceLock::new(),
        }
    }

    /// Quantize field values into `num_bins` classes before mapping.
    pub fn with_bins(mut self, num_bins: usize) -> Self {
        self.num_bins = Some(num_bins);
        self.calibration = OnceLock::new();
        self
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    pub fn validate(&self) -> Result<()> {
        self.domain.validate()?;
        if !self.output.min.is_finite() || !self.output.max.is_finite() {
            return Err(Error::InvalidConfig("output range must be finite".into()));
        }
        if self.num_bins == Some(0) {
            return Err(Error::InvalidConfig("num_bins must be > 0".into()));
        }
        Ok(())
    }

    /// Field range discovered over the domain grid.
    pub fn discover_range(&self) -> Result<AxisRange> {
        self.validate()?;
        let (fmin, fmax) = self
            .domain
            .grid_points()
            .map(|p| self.field.sample(p))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        Ok(AxisRange::new(fmin, fmax))
    }

    /// Calibrates on first call and returns the cached result afterwards.
    pub fn calibration(&self) -> Result<&Calibration> {
        if let Some(calibration) = self.calibration.get() {
            return Ok(calibration);
        }

        let range = self.discover_range()?;
        if !range.min.is_finite() || !range.max.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "field range [{}, {}] over the domain is not finite",
                range.min, range.max
            )));
        }
        check_input_width(range)?;

        let calibration = Calibration {
            range,
            affine: Affine::between(range, self.output),
            bins: self
                .num_bins
                .map(|n| build_bins(range, n))
                .unwrap_or_default(),
        };
        debug!(
            "Field range [{:.6}, {:.6}] with {} bins.",
            range.min,
            range.max,
            calibration.bins.len()
        );
        Ok(self.calibration.get_or_init(|| calibration))
    }

    pub fn map(&self, p: DVec3) -> Result<f64> {
        Ok(self.calibration()?.apply(self.field.sample(p)))
    }

    /// Like [`FieldMapper3D::map`], for a point inside the polygon outlined by `polygon`.
    pub fn map_on(&self, p: DVec3, polygon: &[DVec3]) -> Result<f64> {
        Ok(self.calibration()?.apply(self.field.sample_on(p, polygon)))
    }

    /// Calibrates now and returns an infallible value function for the distribution engine.
    pub fn value_fn(&self) -> Result<impl Fn(DVec3, &[DVec3]) -> f64 + '_> {
        let calibration = self.calibration()?;
        Ok(move |p: DVec3, polygon: &[DVec3]| calibration.apply(self.field.sample_on(p, polygon)))
    }

    /// Like [`FieldMapper3D::value_fn`], ignoring the enclosing polygon.
    ///
    /// This is the form value-dependent exclusion rules take, see
    /// [`crate::scatter::species::GlyphStyle::exclusion`].
    pub fn point_fn(&self) -> Result<impl Fn(DVec3) -> f64 + '_> {
        let calibration = self.calibration()?;
        Ok(move |p: DVec3| calibration.apply(self.field.sample(p)))
    }
}
