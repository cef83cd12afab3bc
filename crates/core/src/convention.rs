use std::fmt;

use log::trace;
use thiserror::Error;

/// How a function or operator delivers its result.
///
/// The convention is resolved once, when a problem is constructed, and never
/// changes afterwards. Solvers match on it to pick a calling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Convention {
    /// The callable writes its result into a caller-provided output buffer.
    InPlace,
    /// The callable allocates and returns a fresh value.
    OutOfPlace,
}

impl Convention {
    /// Returns `true` for [`Convention::InPlace`].
    #[must_use]
    pub fn is_in_place(self) -> bool {
        matches!(self, Self::InPlace)
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InPlace => write!(f, "in-place"),
            Self::OutOfPlace => write!(f, "out-of-place"),
        }
    }
}

/// A call shape declared by a callable.
///
/// `arity` counts every argument, including the output buffer of an in-place
/// signature. A nonlinear residual `f(du, u, p)` is declared as
/// `Signature::in_place(3)`, its allocating form `f(u, p)` as
/// `Signature::out_of_place(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    pub arity: usize,
    pub convention: Convention,
}

impl Signature {
    /// Declares a signature that mutates its first argument.
    #[must_use]
    pub const fn in_place(arity: usize) -> Self {
        Self {
            arity,
            convention: Convention::InPlace,
        }
    }

    /// Declares a signature that returns a fresh value.
    #[must_use]
    pub const fn out_of_place(arity: usize) -> Self {
        Self {
            arity,
            convention: Convention::OutOfPlace,
        }
    }
}

/// Errors that can occur when classifying a callable's calling convention.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error(
        "no declared signature matches: expected an in-place signature of arity {in_place_arity} \
         or an out-of-place signature of arity {out_of_place_arity}, found {declared:?}"
    )]
    NoMatchingSignature {
        in_place_arity: usize,
        out_of_place_arity: usize,
        declared: Vec<Signature>,
    },
}

/// Classifies a callable from its declared signatures.
///
/// An in-place signature with `in_place_arity` arguments takes precedence.
/// Otherwise an out-of-place signature with one argument fewer is accepted.
/// The callable itself is never invoked.
///
/// # Errors
///
/// Returns [`SignatureError::NoMatchingSignature`] if neither form is declared.
pub fn infer_convention(
    signatures: &[Signature],
    in_place_arity: usize,
) -> Result<Convention, SignatureError> {
    let declares = |wanted: Signature| signatures.iter().any(|sig| *sig == wanted);

    let out_of_place_arity = in_place_arity.saturating_sub(1);

    let convention = if declares(Signature::in_place(in_place_arity)) {
        Convention::InPlace
    } else if in_place_arity > 0 && declares(Signature::out_of_place(out_of_place_arity)) {
        Convention::OutOfPlace
    } else {
        return Err(SignatureError::NoMatchingSignature {
            in_place_arity,
            out_of_place_arity,
            declared: signatures.to_vec(),
        });
    };

    trace!("inferred {convention} convention from {} declared signature(s)", signatures.len());
    Ok(convention)
}
