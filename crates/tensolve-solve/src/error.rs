//! Error taxonomy of the engine.

use tensolve_core::{ExprError, Shape};
use thiserror::Error;

/// Errors raised by the solving strategies.
///
/// `NonLinear`, `NotInvertible` and `Unsupported` are local failures of one
/// isolation attempt; the strategies catch them and move on. `Unsolvable`
/// names the symbol an elimination order got stuck on. `NotASymbol`,
/// `KnownInOrder` and `RepeatedSymbol` report caller misuse and are
/// returned immediately.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SolveError {
    /// The variable's rank differs from the equation's.
    #[error("cannot isolate the {variable} `{name}` from a {equation} equation")]
    RankMismatch {
        /// Variable name.
        name: String,
        /// Shape of the variable.
        variable: Shape,
        /// Shape of the equation.
        equation: Shape,
    },

    /// The equation is not linear in the variable.
    #[error("equation is not linear in `{0}`")]
    NonLinear(String),

    /// A coefficient that has to be divided out has no inverse.
    #[error("no inverse exists for {0}")]
    NotInvertible(String),

    /// No reduction rule applies to this expression.
    #[error("cannot isolate `{name}` from {expr}")]
    Unsupported {
        /// Variable name.
        name: String,
        /// The expression that could not be reduced.
        expr: String,
    },

    /// No equation determines the symbol.
    #[error("no equation determines `{0}`")]
    Unsolvable(String),

    /// A known or an order entry is not a symbol.
    #[error("`{0}` is not a symbol")]
    NotASymbol(String),

    /// A known or constant symbol was given in an elimination order.
    #[error("`{0}` is known and cannot be eliminated")]
    KnownInOrder(String),

    /// A symbol occurs twice in an elimination order.
    #[error("`{0}` appears more than once in the elimination order")]
    RepeatedSymbol(String),

    /// Any other failure while building expressions.
    #[error(transparent)]
    Expr(ExprError),
}

impl From<ExprError> for SolveError {
    fn from(err: ExprError) -> Self {
        match err {
            ExprError::NotInvertible(what) => SolveError::NotInvertible(what),
            other => SolveError::Expr(other),
        }
    }
}

impl SolveError {
    /// Returns true for the failures the strategies recover from.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            SolveError::RankMismatch { .. }
                | SolveError::NonLinear(_)
                | SolveError::NotInvertible(_)
                | SolveError::Unsupported { .. }
        )
    }
}
