use std::convert::Infallible;

use ndarray::Array1;
use thiserror::Error;

/// Marker for a problem that was built without parameters.
///
/// Every problem type defaults its parameter slot to this singleton. Solvers
/// may check [`IndexParameters::is_supplied`] before threading parameters
/// through, and any attempt to index into it fails with
/// [`ParameterError::NoParameters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NullParameters;

/// Errors that can occur when indexing into problem parameters.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParameterError {
    #[error("parameters were indexed but no parameters were supplied to the problem")]
    NoParameters,

    #[error("parameter index {index} is out of bounds for {len} parameter(s)")]
    OutOfBounds { index: usize, len: usize },
}

/// Positional access into a problem's parameters.
pub trait IndexParameters {
    type Value;

    /// Returns the number of parameters.
    fn len(&self) -> usize;

    /// Returns the parameter at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::OutOfBounds`] for an index past the end, or
    /// [`ParameterError::NoParameters`] if no parameters were supplied at all.
    fn get(&self, index: usize) -> Result<&Self::Value, ParameterError>;

    /// Returns `false` only for [`NullParameters`].
    fn is_supplied(&self) -> bool {
        true
    }

    /// Returns `true` if there are no parameters to index.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IndexParameters for NullParameters {
    type Value = Infallible;

    fn len(&self) -> usize {
        0
    }

    fn get(&self, _index: usize) -> Result<&Infallible, ParameterError> {
        Err(ParameterError::NoParameters)
    }

    fn is_supplied(&self) -> bool {
        false
    }
}

fn index_slice<T>(values: &[T], index: usize) -> Result<&T, ParameterError> {
    values.get(index).ok_or(ParameterError::OutOfBounds {
        index,
        len: values.len(),
    })
}

impl<T> IndexParameters for Vec<T> {
    type Value = T;

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn get(&self, index: usize) -> Result<&T, ParameterError> {
        index_slice(self, index)
    }
}

impl<T, const N: usize> IndexParameters for [T; N] {
    type Value = T;

    fn len(&self) -> usize {
        N
    }

    fn get(&self, index: usize) -> Result<&T, ParameterError> {
        index_slice(self, index)
    }
}

impl<T> IndexParameters for Array1<T> {
    type Value = T;

    fn len(&self) -> usize {
        self.dim()
    }

    fn get(&self, index: usize) -> Result<&T, ParameterError> {
        ndarray::ArrayBase::get(self, index).ok_or(ParameterError::OutOfBounds {
            index,
            len: self.dim(),
        })
    }
}
