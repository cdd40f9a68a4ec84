//! Tensor shapes and the per-kind rank rules.
//!
//! Every node in the arena carries a [`Shape`]. Shapes are computed once, when
//! the node is interned, from the shapes of its children. A node whose children
//! do not fit the rule for its kind is never created.

use std::fmt;

/// The shape of an expression.
///
/// Rank-1 tensors come in two orientations so that `Transpose(s)·r` can be
/// told apart from `r·Transpose(s)`: the first is a scalar, the second an
/// outer product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Shape {
    /// Rank 0.
    Scalar,
    /// Rank 1, column orientation (the orientation symbols are declared with).
    Column,
    /// Rank 1, row orientation (a transposed column).
    Row,
    /// Rank 2.
    Matrix,
    /// Rank 3 and above. Only scalars multiply these.
    Tensor(u8),
}

impl Shape {
    /// Returns the shape a symbol of the given rank is declared with.
    #[must_use]
    pub const fn from_rank(rank: u8) -> Self {
        match rank {
            0 => Shape::Scalar,
            1 => Shape::Column,
            2 => Shape::Matrix,
            k => Shape::Tensor(k),
        }
    }

    /// Returns the tensor rank.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Shape::Scalar => 0,
            Shape::Column | Shape::Row => 1,
            Shape::Matrix => 2,
            Shape::Tensor(k) => k,
        }
    }

    /// Returns true for rank 0. Scalars commute with everything.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        matches!(self, Shape::Scalar)
    }

    /// Returns true if an inverse can exist for this shape.
    #[must_use]
    pub const fn is_invertible(self) -> bool {
        matches!(self, Shape::Scalar | Shape::Matrix)
    }

    /// Shape of the product `self · rhs`, or `None` if the factors do not chain.
    #[must_use]
    pub const fn compose(self, rhs: Shape) -> Option<Shape> {
        match (self, rhs) {
            (Shape::Scalar, other) | (other, Shape::Scalar) => Some(other),
            (Shape::Column, Shape::Row) | (Shape::Matrix, Shape::Matrix) => Some(Shape::Matrix),
            (Shape::Row, Shape::Column) => Some(Shape::Scalar),
            (Shape::Matrix, Shape::Column) => Some(Shape::Column),
            (Shape::Row, Shape::Matrix) => Some(Shape::Row),
            _ => None,
        }
    }

    /// Shape of the transpose.
    #[must_use]
    pub const fn transpose(self) -> Shape {
        match self {
            Shape::Column => Shape::Row,
            Shape::Row => Shape::Column,
            other => other,
        }
    }

    /// Shape after a gradient: one rank higher.
    #[must_use]
    pub const fn raised(self) -> Shape {
        match self {
            Shape::Scalar => Shape::Column,
            Shape::Column | Shape::Row => Shape::Matrix,
            Shape::Matrix => Shape::Tensor(3),
            Shape::Tensor(k) => Shape::Tensor(k.saturating_add(1)),
        }
    }

    /// Shape after a divergence: one rank lower, `None` for scalars.
    #[must_use]
    pub const fn lowered(self) -> Option<Shape> {
        match self {
            Shape::Scalar => None,
            Shape::Column | Shape::Row => Some(Shape::Scalar),
            Shape::Matrix => Some(Shape::Column),
            Shape::Tensor(3) => Some(Shape::Matrix),
            Shape::Tensor(k) => Some(Shape::from_rank(k.saturating_sub(1))),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar => write!(f, "scalar"),
            Shape::Column => write!(f, "column vector"),
            Shape::Row => write!(f, "row vector"),
            Shape::Matrix => write!(f, "matrix"),
            Shape::Tensor(k) => write!(f, "rank-{k} tensor"),
        }
    }
}
