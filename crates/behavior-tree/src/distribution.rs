//! Random distributions used as task parameters.
//!
//! Each numeric domain has its own distribution type. The DSL writes them as
//! `category,arg,...` literals (see [`crate::parser::DistributionAdapters`]);
//! their [`Display`](fmt::Display) output uses the same form.

use std::f64::consts::TAU;
use std::fmt;

use rand::Rng;

/// Numeric domain of a distribution.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DistributionKind {
    Double,
    Float,
    Integer,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DoubleDistribution {
    Constant(f64),
    Uniform { low: f64, high: f64 },
    Triangular { low: f64, high: f64, mode: f64 },
    Gaussian { mean: f64, std_dev: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FloatDistribution {
    Constant(f32),
    Uniform { low: f32, high: f32 },
    Triangular { low: f32, high: f32, mode: f32 },
    Gaussian { mean: f32, std_dev: f32 },
}

/// Integer distributions; the triangular mode is fractional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntegerDistribution {
    Constant(i32),
    Uniform { low: i32, high: i32 },
    Triangular { low: i32, high: i32, mode: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LongDistribution {
    Constant(i64),
    Uniform { low: i64, high: i64 },
    Triangular { low: i64, high: i64, mode: f64 },
}

/// A distribution of any domain, as produced by the adapters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distribution {
    Double(DoubleDistribution),
    Float(FloatDistribution),
    Integer(IntegerDistribution),
    Long(LongDistribution),
}

impl DoubleDistribution {
    pub const ZERO: Self = DoubleDistribution::Constant(0.0);

    pub fn next_double<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            DoubleDistribution::Constant(value) => value,
            DoubleDistribution::Uniform { low, high } => uniform(rng, low, high),
            DoubleDistribution::Triangular { low, high, mode } => triangular(rng, low, high, mode),
            DoubleDistribution::Gaussian { mean, std_dev } => gaussian(rng, mean, std_dev),
        }
    }
}

impl FloatDistribution {
    pub const ZERO: Self = FloatDistribution::Constant(0.0);

    pub fn next_float<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        match *self {
            FloatDistribution::Constant(value) => value,
            FloatDistribution::Uniform { low, high } => uniform(rng, low.into(), high.into()) as f32,
            FloatDistribution::Triangular { low, high, mode } => {
                triangular(rng, low.into(), high.into(), mode.into()) as f32
            }
            FloatDistribution::Gaussian { mean, std_dev } => {
                gaussian(rng, mean.into(), std_dev.into()) as f32
            }
        }
    }
}

impl IntegerDistribution {
    pub fn next_int<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        match *self {
            IntegerDistribution::Constant(value) => value,
            IntegerDistribution::Uniform { low, high } => {
                if low <= high {
                    rng.gen_range(low..=high)
                } else {
                    rng.gen_range(high..=low)
                }
            }
            IntegerDistribution::Triangular { low, high, mode } => {
                triangular(rng, low.into(), high.into(), mode.into()).round() as i32
            }
        }
    }
}

impl LongDistribution {
    pub fn next_long<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        match *self {
            LongDistribution::Constant(value) => value,
            LongDistribution::Uniform { low, high } => {
                if low <= high {
                    rng.gen_range(low..=high)
                } else {
                    rng.gen_range(high..=low)
                }
            }
            LongDistribution::Triangular { low, high, mode } => {
                triangular(rng, low as f64, high as f64, mode).round() as i64
            }
        }
    }
}

impl Distribution {
    pub fn kind(&self) -> DistributionKind {
        match self {
            Distribution::Double(_) => DistributionKind::Double,
            Distribution::Float(_) => DistributionKind::Float,
            Distribution::Integer(_) => DistributionKind::Integer,
            Distribution::Long(_) => DistributionKind::Long,
        }
    }

    pub fn into_double(self) -> Option<DoubleDistribution> {
        match self {
            Distribution::Double(d) => Some(d),
            _ => None,
        }
    }

    pub fn into_float(self) -> Option<FloatDistribution> {
        match self {
            Distribution::Float(d) => Some(d),
            _ => None,
        }
    }

    pub fn into_integer(self) -> Option<IntegerDistribution> {
        match self {
            Distribution::Integer(d) => Some(d),
            _ => None,
        }
    }

    pub fn into_long(self) -> Option<LongDistribution> {
        match self {
            Distribution::Long(d) => Some(d),
            _ => None,
        }
    }
}

impl From<DoubleDistribution> for Distribution {
    fn from(distribution: DoubleDistribution) -> Self {
        Distribution::Double(distribution)
    }
}

impl From<FloatDistribution> for Distribution {
    fn from(distribution: FloatDistribution) -> Self {
        Distribution::Float(distribution)
    }
}

impl From<IntegerDistribution> for Distribution {
    fn from(distribution: IntegerDistribution) -> Self {
        Distribution::Integer(distribution)
    }
}

impl From<LongDistribution> for Distribution {
    fn from(distribution: LongDistribution) -> Self {
        Distribution::Long(distribution)
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    low + rng.r#gen::<f64>() * (high - low)
}

fn triangular<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64, mode: f64) -> f64 {
    let span = high - low;
    if span == 0.0 {
        return low;
    }
    let u = rng.r#gen::<f64>();
    if u <= (mode - low) / span {
        low + (u * span * (mode - low)).sqrt()
    } else {
        high - ((1.0 - u) * span * (high - mode)).sqrt()
    }
}

// Box-Muller transform.
fn gaussian<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    let u1 = 1.0 - rng.r#gen::<f64>();
    let u2 = rng.r#gen::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos();
    mean + z * std_dev
}

impl fmt::Display for DoubleDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => write!(f, "constant,{value:?}"),
            Self::Uniform { low, high } => write!(f, "uniform,{low:?},{high:?}"),
            Self::Triangular { low, high, mode } => write!(f, "triangular,{low:?},{high:?},{mode:?}"),
            Self::Gaussian { mean, std_dev } => write!(f, "gaussian,{mean:?},{std_dev:?}"),
        }
    }
}

impl fmt::Display for FloatDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => write!(f, "constant,{value:?}"),
            Self::Uniform { low, high } => write!(f, "uniform,{low:?},{high:?}"),
            Self::Triangular { low, high, mode } => write!(f, "triangular,{low:?},{high:?},{mode:?}"),
            Self::Gaussian { mean, std_dev } => write!(f, "gaussian,{mean:?},{std_dev:?}"),
        }
    }
}

impl fmt::Display for IntegerDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => write!(f, "constant,{value}"),
            Self::Uniform { low, high } => write!(f, "uniform,{low},{high}"),
            Self::Triangular { low, high, mode } => write!(f, "triangular,{low},{high},{mode:?}"),
        }
    }
}

impl fmt::Display for LongDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => write!(f, "constant,{value}"),
            Self::Uniform { low, high } => write!(f, "uniform,{low},{high}"),
            Self::Triangular { low, high, mode } => write!(f, "triangular,{low},{high},{mode:?}"),
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::Double(d) => d.fmt(f),
            Distribution::Float(d) => d.fmt(f),
            Distribution::Integer(d) => d.fmt(f),
            Distribution::Long(d) => d.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn constant_always_yields_its_value() {
        let mut rng = StdRng::seed_from_u64(7);
        let d = DoubleDistribution::Constant(5.5);
        for _ in 0..32 {
            assert_eq!(d.next_double(&mut rng), 5.5);
        }
    }

    #[test]
    fn uniform_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let d = FloatDistribution::Uniform { low: 1.0, high: 5.0 };
        for _ in 0..256 {
            let v = d.next_float(&mut rng);
            assert!((1.0..=5.0).contains(&v), "{v} out of range");
        }
        let i = IntegerDistribution::Uniform { low: 3, high: -3 };
        for _ in 0..256 {
            assert!((-3..=3).contains(&i.next_int(&mut rng)));
        }
    }

    #[test]
    fn triangular_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let d = DoubleDistribution::Triangular {
            low: 0.0,
            high: 20.0,
            mode: 15.0,
        };
        for _ in 0..256 {
            let v = d.next_double(&mut rng);
            assert!((0.0..=20.0).contains(&v));
        }
        let l = LongDistribution::Triangular {
            low: 10,
            high: 10,
            mode: 10.0,
        };
        assert_eq!(l.next_long(&mut rng), 10);
    }

    #[test]
    fn gaussian_centers_on_mean() {
        let mut rng = StdRng::seed_from_u64(42);
        let d = DoubleDistribution::Gaussian {
            mean: 10.0,
            std_dev: 1.0,
        };
        let n = 2000;
        let mean = (0..n).map(|_| d.next_double(&mut rng)).sum::<f64>() / n as f64;
        assert!((mean - 10.0).abs() < 0.2, "sample mean {mean}");
    }

    #[test]
    fn display_matches_literal_form() {
        assert_eq!(DoubleDistribution::Constant(5.5).to_string(), "constant,5.5");
        assert_eq!(FloatDistribution::Constant(3.14).to_string(), "constant,3.14");
        assert_eq!(
            DoubleDistribution::Gaussian {
                mean: 0.0,
                std_dev: 1.0
            }
            .to_string(),
            "gaussian,0.0,1.0"
        );
        assert_eq!(
            DoubleDistribution::Uniform {
                low: 0.0,
                high: 10.0
            }
            .to_string(),
            "uniform,0.0,10.0"
        );
        assert_eq!(IntegerDistribution::Constant(42).to_string(), "constant,42");
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Float".parse::<DistributionKind>().ok(), Some(DistributionKind::Float));
        assert_eq!(DistributionKind::Integer.to_string(), "integer");
    }
}
