//! Conversion between distribution literals and distributions.
//!
//! A literal is a category followed by numeric arguments, separated by
//! commas or whitespace: `constant,5`, `uniform,1,5`, `triangular 0 20 15`,
//! `gaussian,0.0,1.0`. Each (category, domain) pair has its own adapter.

use std::collections::HashMap;
use std::fmt;

use crate::distribution::{
    Distribution, DistributionKind, DoubleDistribution, FloatDistribution, IntegerDistribution,
    LongDistribution,
};
use crate::error::DistributionFormatError;

type AdapterFn = dyn Fn(&[&str]) -> Result<Distribution, DistributionFormatError> + Send + Sync;

/// Registry of distribution adapters keyed by category and domain.
pub struct DistributionAdapters {
    adapters: HashMap<(String, DistributionKind), Box<AdapterFn>>,
}

impl DistributionAdapters {
    /// Adapters for `constant`, `uniform`, `triangular` (all domains) and
    /// `gaussian` (double and float).
    pub fn new() -> Self {
        let mut adapters = Self::empty();
        adapters.add_defaults();
        adapters
    }

    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Registers an adapter, replacing any previous one for the same pair.
    /// The adapter receives the arguments after the category.
    pub fn add<F>(&mut self, category: impl Into<String>, kind: DistributionKind, adapter: F)
    where
        F: Fn(&[&str]) -> Result<Distribution, DistributionFormatError> + Send + Sync + 'static,
    {
        self.adapters.insert((category.into(), kind), Box::new(adapter));
    }

    pub fn contains(&self, category: &str, kind: DistributionKind) -> bool {
        self.adapters.contains_key(&(category.to_string(), kind))
    }

    pub fn to_distribution(
        &self,
        value: &str,
        kind: DistributionKind,
    ) -> Result<Distribution, DistributionFormatError> {
        let tokens: Vec<&str> = value
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .collect();
        let Some((category, args)) = tokens.split_first() else {
            return Err(DistributionFormatError::MissingType);
        };
        let adapter = self
            .adapters
            .get(&((*category).to_string(), kind))
            .ok_or_else(|| DistributionFormatError::UnknownCategory {
                category: (*category).to_string(),
                kind,
            })?;
        adapter(args)
    }

    /// Renders a distribution back to its literal form.
    pub fn to_string(&self, distribution: &Distribution) -> String {
        distribution.to_string()
    }

    fn register(
        &mut self,
        category: &'static str,
        kind: DistributionKind,
        counts: &'static [usize],
        expected: &'static str,
        build: fn(&[&str]) -> Result<Distribution, DistributionFormatError>,
    ) {
        self.add(category, kind, move |args: &[&str]| {
            if !counts.contains(&args.len()) {
                return Err(DistributionFormatError::ArgumentCount {
                    category: category.to_string(),
                    expected,
                    found: args.len(),
                });
            }
            build(args)
        });
    }

    fn add_defaults(&mut self) {
        use DistributionKind::{Double, Float, Integer, Long};

        self.register("constant", Double, &[1], "1", |a| {
            Ok(DoubleDistribution::Constant(parse_double(a[0])?).into())
        });
        self.register("uniform", Double, &[1, 2], "1 or 2", |a| {
            let (low, high) = match a {
                [high] => (0.0, parse_double(high)?),
                _ => (parse_double(a[0])?, parse_double(a[1])?),
            };
            Ok(DoubleDistribution::Uniform { low, high }.into())
        });
        self.register("triangular", Double, &[1, 2, 3], "1, 2 or 3", |a| {
            let (low, high, mode) = match a {
                [high] => {
                    let high = parse_double(high)?;
                    (-high, high, 0.0)
                }
                [low, high] => {
                    let (low, high) = (parse_double(low)?, parse_double(high)?);
                    (low, high, (low + high) / 2.0)
                }
                _ => (parse_double(a[0])?, parse_double(a[1])?, parse_double(a[2])?),
            };
            Ok(DoubleDistribution::Triangular { low, high, mode }.into())
        });
        self.register("gaussian", Double, &[2], "2", |a| {
            Ok(DoubleDistribution::Gaussian {
                mean: parse_double(a[0])?,
                std_dev: parse_double(a[1])?,
            }
            .into())
        });

        self.register("constant", Float, &[1], "1", |a| {
            Ok(FloatDistribution::Constant(parse_float(a[0])?).into())
        });
        self.register("uniform", Float, &[1, 2], "1 or 2", |a| {
            let (low, high) = match a {
                [high] => (0.0, parse_float(high)?),
                _ => (parse_float(a[0])?, parse_float(a[1])?),
            };
            Ok(FloatDistribution::Uniform { low, high }.into())
        });
        self.register("triangular", Float, &[1, 2, 3], "1, 2 or 3", |a| {
            let (low, high, mode) = match a {
                [high] => {
                    let high = parse_float(high)?;
                    (-high, high, 0.0)
                }
                [low, high] => {
                    let (low, high) = (parse_float(low)?, parse_float(high)?);
                    (low, high, (low + high) / 2.0)
                }
                _ => (parse_float(a[0])?, parse_float(a[1])?, parse_float(a[2])?),
            };
            Ok(FloatDistribution::Triangular { low, high, mode }.into())
        });
        self.register("gaussian", Float, &[2], "2", |a| {
            Ok(FloatDistribution::Gaussian {
                mean: parse_float(a[0])?,
                std_dev: parse_float(a[1])?,
            }
            .into())
        });

        self.register("constant", Integer, &[1], "1", |a| {
            Ok(IntegerDistribution::Constant(parse_integer(a[0])?).into())
        });
        self.register("uniform", Integer, &[1, 2], "1 or 2", |a| {
            let (low, high) = match a {
                [high] => (0, parse_integer(high)?),
                _ => (parse_integer(a[0])?, parse_integer(a[1])?),
            };
            Ok(IntegerDistribution::Uniform { low, high }.into())
        });
        self.register("triangular", Integer, &[1, 2, 3], "1, 2 or 3", |a| {
            let (low, high, mode) = match a {
                [high] => {
                    let high = parse_integer(high)?;
                    (-high, high, 0.0)
                }
                [low, high] => {
                    let (low, high) = (parse_integer(low)?, parse_integer(high)?);
                    (low, high, (low as f32 + high as f32) / 2.0)
                }
                _ => (parse_integer(a[0])?, parse_integer(a[1])?, parse_float(a[2])?),
            };
            Ok(IntegerDistribution::Triangular { low, high, mode }.into())
        });

        self.register("constant", Long, &[1], "1", |a| {
            Ok(LongDistribution::Constant(parse_long(a[0])?).into())
        });
        self.register("uniform", Long, &[1, 2], "1 or 2", |a| {
            let (low, high) = match a {
                [high] => (0, parse_long(high)?),
                _ => (parse_long(a[0])?, parse_long(a[1])?),
            };
            Ok(LongDistribution::Uniform { low, high }.into())
        });
        self.register("triangular", Long, &[1, 2, 3], "1, 2 or 3", |a| {
            let (low, high, mode) = match a {
                [high] => {
                    let high = parse_long(high)?;
                    (-high, high, 0.0)
                }
                [low, high] => {
                    let (low, high) = (parse_long(low)?, parse_long(high)?);
                    (low, high, (low as f64 + high as f64) / 2.0)
                }
                _ => (parse_long(a[0])?, parse_long(a[1])?, parse_double(a[2])?),
            };
            Ok(LongDistribution::Triangular { low, high, mode }.into())
        });
    }
}

impl Default for DistributionAdapters {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DistributionAdapters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .adapters
            .keys()
            .map(|(category, kind)| format!("{category}:{kind}"))
            .collect();
        keys.sort();
        f.debug_struct("DistributionAdapters")
            .field("adapters", &keys)
            .finish()
    }
}

fn not_a_number(value: &str, expected: &'static str) -> DistributionFormatError {
    DistributionFormatError::NotANumber {
        value: value.to_string(),
        expected,
    }
}

fn strip_suffix<'a>(value: &'a str, suffixes: &[char]) -> &'a str {
    value.strip_suffix(suffixes).unwrap_or(value)
}

/// Parses a double, accepting a trailing `d`, `D`, `f` or `F`.
pub fn parse_double(value: &str) -> Result<f64, DistributionFormatError> {
    strip_suffix(value, &['d', 'D', 'f', 'F'])
        .parse()
        .map_err(|_| not_a_number(value, "double"))
}

/// Parses a float, accepting a trailing `f`, `F`, `d` or `D`.
pub fn parse_float(value: &str) -> Result<f32, DistributionFormatError> {
    strip_suffix(value, &['f', 'F', 'd', 'D'])
        .parse()
        .map_err(|_| not_a_number(value, "float"))
}

pub fn parse_integer(value: &str) -> Result<i32, DistributionFormatError> {
    value.parse().map_err(|_| not_a_number(value, "integer"))
}

/// Parses a long, accepting a trailing `l` or `L`.
pub fn parse_long(value: &str) -> Result<i64, DistributionFormatError> {
    strip_suffix(value, &['l', 'L'])
        .parse()
        .map_err(|_| not_a_number(value, "long"))
}
