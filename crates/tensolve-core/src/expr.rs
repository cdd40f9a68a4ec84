//! Expression node types.
//!
//! This module defines the node kinds stored in the arena and the rank rule
//! attached to every operator.

use dashu::rational::RBig;
use smallvec::SmallVec;

use crate::handle::ExprHandle;
use crate::shape::Shape;
use crate::ExprError;

/// Unique identifier for a symbol.
pub type SymbolId = u32;

/// Unique identifier for a named non-linear function.
pub type FunctionId = u32;

/// An expression node stored in the arena.
///
/// Multiplication is not commutative: the factor list of [`ExprNode::Mul`]
/// is an ordered product. Only rank-0 factors may be reordered, and the
/// canonical constructors in `tensolve-tensor` do so.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprNode {
    // === Atoms ===
    /// An exact rational literal.
    Number(RBig),

    /// A symbolic tensor. Its rank lives in the symbol table.
    Symbol(SymbolId),

    // === Compound Expressions ===
    /// Sum of expressions: a + b + c + ...
    ///
    /// Invariant: at least 2 arguments, all of the same shape.
    Add(SmallVec<[ExprHandle; 4]>),

    /// Ordered product of expressions: a · b · c · ...
    ///
    /// Invariant: at least 2 arguments whose shapes chain.
    Mul(SmallVec<[ExprHandle; 4]>),

    /// Power expression: base^exp. The exponent is a scalar.
    Pow {
        /// The base of the power.
        base: ExprHandle,
        /// The exponent.
        exp: ExprHandle,
    },

    /// An operator applied to one or two operands.
    Operator {
        /// Which operator.
        op: Operator,
        /// The operands.
        args: SmallVec<[ExprHandle; 2]>,
    },
}

impl ExprNode {
    /// Returns true if this node is an atom (no children).
    #[must_use]
    pub fn is_atom(&self) -> bool {
        matches!(self, ExprNode::Number(_) | ExprNode::Symbol(_))
    }

    /// Returns true if this node is a numeric literal.
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, ExprNode::Number(_))
    }

    /// Returns true if this is the literal zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, ExprNode::Number(n) if n.is_zero())
    }

    /// Returns true if this is the literal one.
    #[must_use]
    pub fn is_one(&self) -> bool {
        matches!(self, ExprNode::Number(n) if n.is_one())
    }

    /// Returns the operator if this is an operator application of kind `op`.
    #[must_use]
    pub fn operand_of(&self, op: Operator) -> Option<&[ExprHandle]> {
        match self {
            ExprNode::Operator { op: o, args } if *o == op => Some(args),
            _ => None,
        }
    }

    /// Returns the children of this node.
    #[must_use]
    pub fn children(&self) -> SmallVec<[ExprHandle; 4]> {
        match self {
            ExprNode::Number(_) | ExprNode::Symbol(_) => SmallVec::new(),
            ExprNode::Add(args) | ExprNode::Mul(args) => args.clone(),
            ExprNode::Pow { base, exp } => smallvec::smallvec![*base, *exp],
            ExprNode::Operator { args, .. } => args.iter().copied().collect(),
        }
    }
}

/// Tensor operators.
///
/// Each operator has a fixed arity, a differential order and a rank rule
/// ([`Operator::result_shape`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    /// `div(u)`: lowers the rank by one.
    Divergence,
    /// `grad(u)`: raises the rank by one.
    Gradient,
    /// `∂u/∂t`.
    TimeDerivative,
    /// `∂u/∂x`.
    SpaceDerivative,
    /// `∂u/∂n`.
    NormalDerivative,
    /// `curl(u)` of a column vector.
    Curl,
    /// Inner product of two tensors of the same shape.
    Inner,
    /// Multiplicative inverse.
    Inverse,
    /// Transpose.
    Transpose,
    /// A named non-linear function applied element-wise.
    Function(FunctionId),
}

impl Operator {
    /// Number of operands the operator takes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Operator::Inner => 2,
            _ => 1,
        }
    }

    /// Order of differentiation the operator contributes.
    #[must_use]
    pub const fn differential_order(self) -> u32 {
        match self {
            Operator::Divergence
            | Operator::Gradient
            | Operator::TimeDerivative
            | Operator::SpaceDerivative
            | Operator::NormalDerivative
            | Operator::Curl => 1,
            Operator::Inner | Operator::Inverse | Operator::Transpose | Operator::Function(_) => 0,
        }
    }

    /// Short name used in diagnostics and display.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Operator::Divergence => "div",
            Operator::Gradient => "grad",
            Operator::TimeDerivative => "dt",
            Operator::SpaceDerivative => "dx",
            Operator::NormalDerivative => "dn",
            Operator::Curl => "curl",
            Operator::Inner => "inner",
            Operator::Inverse => "inv",
            Operator::Transpose => "T",
            Operator::Function(_) => "fn",
        }
    }

    /// Applies the rank rule to the operand shapes.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::Arity`] for a wrong operand count,
    /// [`ExprError::NotInvertible`] for inverses of vectors and higher
    /// tensors, and [`ExprError::InvalidOperand`] or
    /// [`ExprError::ShapeMismatch`] when the operand shapes break the rule.
    pub fn result_shape(self, operands: &[Shape]) -> Result<Shape, ExprError> {
        if operands.len() != self.arity() {
            return Err(ExprError::Arity {
                op: self.name(),
                expected: self.arity(),
                found: operands.len(),
            });
        }
        let arg = operands[0];
        let invalid = || ExprError::InvalidOperand {
            op: self.name(),
            shape: arg,
        };
        match self {
            Operator::Divergence => arg.lowered().ok_or_else(invalid),
            Operator::Gradient => Ok(arg.raised()),
            Operator::TimeDerivative | Operator::SpaceDerivative | Operator::NormalDerivative => {
                Ok(arg)
            }
            Operator::Curl => match arg {
                Shape::Column => Ok(Shape::Column),
                _ => Err(invalid()),
            },
            Operator::Inner => {
                if operands[1] == arg {
                    Ok(Shape::Scalar)
                } else {
                    Err(ExprError::ShapeMismatch {
                        context: "inner product",
                        left: arg,
                        right: operands[1],
                    })
                }
            }
            Operator::Inverse => {
                if arg.is_invertible() {
                    Ok(arg)
                } else {
                    Err(ExprError::NotInvertible(format!("a {arg}")))
                }
            }
            Operator::Transpose => Ok(arg.transpose()),
            Operator::Function(_) => Ok(arg),
        }
    }
}
