//! Plain-text rendering of expressions for logs and error messages.

use std::fmt;

use dashu::rational::RBig;

use crate::arena::ExprArena;
use crate::expr::{ExprNode, Operator};
use crate::handle::ExprHandle;

/// Borrowing wrapper that renders an expression with symbol names.
pub struct ExprDisplay<'a> {
    arena: &'a ExprArena,
    handle: ExprHandle,
}

impl ExprArena {
    /// Returns a value that formats `handle` as readable text.
    #[must_use]
    pub fn display(&self, handle: ExprHandle) -> ExprDisplay<'_> {
        ExprDisplay {
            arena: self,
            handle,
        }
    }
}

impl ExprDisplay<'_> {
    fn child(&self, handle: ExprHandle) -> Self {
        ExprDisplay {
            arena: self.arena,
            handle,
        }
    }

    /// Writes a factor, parenthesised unless it binds tighter than `*`.
    fn write_factor(&self, f: &mut fmt::Formatter<'_>, handle: ExprHandle) -> fmt::Result {
        match self.arena.get(handle) {
            ExprNode::Add(_) | ExprNode::Mul(_) => write!(f, "({})", self.child(handle)),
            ExprNode::Number(n) if !n.denominator().is_one() || *n < RBig::ZERO => {
                write!(f, "({n})")
            }
            _ => write!(f, "{}", self.child(handle)),
        }
    }
}

impl fmt::Display for ExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.arena.get(self.handle) {
            ExprNode::Number(n) => write!(f, "{n}"),
            ExprNode::Symbol(id) => match self.arena.symbol_name(*id) {
                Some(name) => write!(f, "{name}"),
                None => write!(f, "?{id}"),
            },
            ExprNode::Add(args) => {
                for (i, &arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write!(f, "{}", self.child(arg))?;
                }
                Ok(())
            }
            ExprNode::Mul(args) => {
                let mut rest = &args[..];
                if let Some((&first, tail)) = args.split_first() {
                    if self.arena.as_number(first).is_some_and(|n| *n == -RBig::ONE) {
                        write!(f, "-")?;
                        rest = tail;
                    }
                }
                for (i, &arg) in rest.iter().enumerate() {
                    if i > 0 {
                        write!(f, "*")?;
                    }
                    self.write_factor(f, arg)?;
                }
                Ok(())
            }
            ExprNode::Pow { base, exp } => {
                self.write_factor(f, *base)?;
                write!(f, "^")?;
                self.write_factor(f, *exp)
            }
            ExprNode::Operator { op, args } => {
                match op {
                    Operator::Function(id) => {
                        write!(f, "{}", self.arena.function_name(*id).unwrap_or("fn"))?;
                    }
                    other => write!(f, "{}", other.name())?,
                }
                write!(f, "(")?;
                for (i, &arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", self.child(arg))?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Debug for ExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
