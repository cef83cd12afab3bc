use std::time::Duration;

use thiserror::Error;

/// Solver options attached to a problem.
///
/// Only the options listed here are recognized. Anything else is rejected when
/// the options are built, rather than being passed through to a solver that may
/// silently ignore it. Every option is optional; `None` leaves the choice to
/// the solver.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawOptions"))]
pub struct SolverOptions {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    abstol: Option<f64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    reltol: Option<f64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    maxiters: Option<usize>,
    #[cfg_attr(
        feature = "serde",
        serde(
            skip_serializing_if = "Option::is_none",
            serialize_with = "seconds::serialize"
        )
    )]
    maxtime: Option<Duration>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    verbose: Option<bool>,
}

/// A loosely typed option value, as read from a key/value source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionValue {
    Float(f64),
    Int(usize),
    Bool(bool),
}

impl OptionValue {
    fn kind(self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Int(_) => "integer",
            Self::Bool(_) => "bool",
        }
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<usize> for OptionValue {
    fn from(value: usize) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Errors that can occur when building solver options.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptionsError {
    #[error("unknown solver option `{0}`, expected one of: {keys}", keys = SolverOptions::KEYS.join(", "))]
    UnknownOption(String),

    #[error("solver option `{key}` expects a {expected}, got a {found}")]
    InvalidType {
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("abstol must be finite and non-negative")]
    AbsTol,

    #[error("reltol must be finite and non-negative")]
    RelTol,

    #[error("maxtime must be finite and positive")]
    MaxTime,
}

impl SolverOptions {
    /// Names of every recognized option.
    pub const KEYS: [&'static str; 5] = ["abstol", "reltol", "maxiters", "maxtime", "verbose"];

    /// Builds options from key/value pairs.
    ///
    /// Integer values are accepted where a float is expected. `maxtime` is
    /// given in seconds.
    ///
    /// # Errors
    ///
    /// Returns an error for an unrecognized key, a value of the wrong type, or
    /// a value that fails validation.
    pub fn from_pairs<I, K>(pairs: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = (K, OptionValue)>,
        K: AsRef<str>,
    {
        pairs
            .into_iter()
            .try_fold(Self::default(), |options, (key, value)| {
                options.set(key.as_ref(), value)
            })
    }

    fn set(self, key: &str, value: OptionValue) -> Result<Self, OptionsError> {
        match key {
            "abstol" => self.with_abstol(expect_float("abstol", value)?),
            "reltol" => self.with_reltol(expect_float("reltol", value)?),
            "maxiters" => match value {
                OptionValue::Int(n) => Ok(self.with_maxiters(n)),
                other => Err(invalid_type("maxiters", "integer", other)),
            },
            "maxtime" => {
                let seconds = expect_float("maxtime", value)?;
                if !(seconds.is_finite() && seconds > 0.0) {
                    return Err(OptionsError::MaxTime);
                }
                // Sub-nanosecond limits round up rather than truncating to zero.
                let maxtime = Duration::try_from_secs_f64(seconds)
                    .map_err(|_| OptionsError::MaxTime)?
                    .max(Duration::from_nanos(1));
                self.with_maxtime(maxtime)
            }
            "verbose" => match value {
                OptionValue::Bool(flag) => Ok(self.with_verbose(flag)),
                other => Err(invalid_type("verbose", "bool", other)),
            },
            unknown => Err(OptionsError::UnknownOption(unknown.to_owned())),
        }
    }

    /// Sets the absolute tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::AbsTol`] if `abstol` is negative or non-finite.
    pub fn with_abstol(self, abstol: f64) -> Result<Self, OptionsError> {
        if !abstol.is_finite() || abstol < 0.0 {
            return Err(OptionsError::AbsTol);
        }
        Ok(Self {
            abstol: Some(abstol),
            ..self
        })
    }

    /// Sets the relative tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::RelTol`] if `reltol` is negative or non-finite.
    pub fn with_reltol(self, reltol: f64) -> Result<Self, OptionsError> {
        if !reltol.is_finite() || reltol < 0.0 {
            return Err(OptionsError::RelTol);
        }
        Ok(Self {
            reltol: Some(reltol),
            ..self
        })
    }

    #[must_use]
    pub fn with_maxiters(self, maxiters: usize) -> Self {
        Self {
            maxiters: Some(maxiters),
            ..self
        }
    }

    /// Sets the wall-clock limit for a solve.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::MaxTime`] if `maxtime` is zero.
    pub fn with_maxtime(self, maxtime: Duration) -> Result<Self, OptionsError> {
        if maxtime.is_zero() {
            return Err(OptionsError::MaxTime);
        }
        Ok(Self {
            maxtime: Some(maxtime),
            ..self
        })
    }

    #[must_use]
    pub fn with_verbose(self, verbose: bool) -> Self {
        Self {
            verbose: Some(verbose),
            ..self
        }
    }

    #[must_use]
    pub fn abstol(&self) -> Option<f64> {
        self.abstol
    }

    #[must_use]
    pub fn reltol(&self) -> Option<f64> {
        self.reltol
    }

    #[must_use]
    pub fn maxiters(&self) -> Option<usize> {
        self.maxiters
    }

    #[must_use]
    pub fn maxtime(&self) -> Option<Duration> {
        self.maxtime
    }

    #[must_use]
    pub fn verbose(&self) -> Option<bool> {
        self.verbose
    }

    /// Returns `true` if no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn invalid_type(key: &'static str, expected: &'static str, found: OptionValue) -> OptionsError {
    OptionsError::InvalidType {
        key,
        expected,
        found: found.kind(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn expect_float(key: &'static str, value: OptionValue) -> Result<f64, OptionsError> {
    match value {
        OptionValue::Float(x) => Ok(x),
        OptionValue::Int(n) => Ok(n as f64),
        other @ OptionValue::Bool(_) => Err(invalid_type(key, "float", other)),
    }
}

/// Unvalidated mirror of [`SolverOptions`] used for deserialization.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    abstol: Option<f64>,
    reltol: Option<f64>,
    maxiters: Option<usize>,
    maxtime: Option<f64>,
    verbose: Option<bool>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawOptions> for SolverOptions {
    type Error = OptionsError;

    fn try_from(raw: RawOptions) -> Result<Self, Self::Error> {
        let pairs = [
            ("abstol", raw.abstol.map(OptionValue::Float)),
            ("reltol", raw.reltol.map(OptionValue::Float)),
            ("maxiters", raw.maxiters.map(OptionValue::Int)),
            ("maxtime", raw.maxtime.map(OptionValue::Float)),
            ("verbose", raw.verbose.map(OptionValue::Bool)),
        ];

        Self::from_pairs(
            pairs
                .into_iter()
                .filter_map(|(key, value)| value.map(|value| (key, value))),
        )
    }
}

#[cfg(feature = "serde")]
mod seconds {
    use std::time::Duration;

    use serde::Serializer;

    #[allow(clippy::ref_option)]
    pub(super) fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }
}
