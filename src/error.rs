//! Errors raised while resolving a production chain

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CalcError {
    #[error("unknown facility class: {0}")]
    UnknownFacility(String),

    #[error("material not found in recipe output: {0}")]
    OutputNotFound(String),

    #[error("invalid recipe/multiplier: zero divisor ({what} = {value} while producing {material})")]
    ZeroDivisor {
        material: String,
        what: &'static str,
        value: f64,
    },

    #[error("{facility} variant '{variant}' is not in the multiplier table")]
    VariantNotFound { facility: String, variant: String },

    #[error("cannot combine amounts of different materials: {left} and {right}")]
    MaterialMismatch { left: String, right: String },

    #[error("input breakdown for {material} does not line up ({existing} vs {incoming} entries)")]
    InputBreakdownMismatch {
        material: String,
        existing: usize,
        incoming: usize,
    },

    #[error("maximum recursion depth exceeded at {0} - possible cycle in recipe graph")]
    DepthExceeded(String),
}
