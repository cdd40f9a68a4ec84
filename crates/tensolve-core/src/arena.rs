//! Arena allocator for expression storage.
//!
//! This module provides a contiguous memory arena for storing expression
//! nodes together with their shapes. Nodes are validated against the rank
//! rules when they are interned, so every handle the arena gives out refers
//! to a well-shaped expression.

use dashu::integer::{IBig, UBig};
use dashu::rational::RBig;
use hashbrown::HashMap;

use crate::expr::{ExprNode, FunctionId, SymbolId};
use crate::handle::ExprHandle;
use crate::intern::{NameTable, SymbolInfo, SymbolTable};
use crate::shape::Shape;
use crate::ExprError;

/// The main arena for storing expressions.
///
/// All expressions are stored contiguously in a `Vec`, with hash-consing
/// ensuring each unique expression is stored exactly once. Nodes are never
/// mutated or removed; transformations always intern new nodes.
#[derive(Debug, Default)]
pub struct ExprArena {
    /// Storage for all expression nodes.
    nodes: Vec<ExprNode>,
    /// Shape of each node, parallel to `nodes`.
    shapes: Vec<Shape>,
    /// Interning table: maps node content to its handle.
    intern_map: HashMap<ExprNode, ExprHandle>,
    /// Declared symbols.
    symbols: SymbolTable,
    /// Names of non-linear functions.
    functions: NameTable<String>,
    /// Counter for generated symbol names.
    fresh: u32,
}

impl ExprArena {
    /// Creates a new empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an arena with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            shapes: Vec::with_capacity(capacity),
            intern_map: HashMap::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Interns an expression node, returning its handle.
    ///
    /// If an identical node already exists, returns the existing handle.
    /// Otherwise the node's shape is derived from its children and the node
    /// is stored. This does no simplification; see `tensolve-tensor` for
    /// canonical constructors.
    ///
    /// # Errors
    ///
    /// Returns an error if the children's shapes break the rule for the
    /// node kind.
    pub fn intern(&mut self, node: ExprNode) -> Result<ExprHandle, ExprError> {
        if let Some(&handle) = self.intern_map.get(&node) {
            return Ok(handle);
        }
        let shape = self.node_shape(&node)?;
        Ok(self.insert(node, shape))
    }

    fn insert(&mut self, node: ExprNode, shape: Shape) -> ExprHandle {
        if let Some(&handle) = self.intern_map.get(&node) {
            return handle;
        }
        let index = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
        let handle = ExprHandle::new(index);
        self.nodes.push(node.clone());
        self.shapes.push(shape);
        self.intern_map.insert(node, handle);
        handle
    }

    fn node_shape(&self, node: &ExprNode) -> Result<Shape, ExprError> {
        match node {
            ExprNode::Number(_) => Ok(Shape::Scalar),
            ExprNode::Symbol(id) => self
                .symbols
                .get(*id)
                .map(|info| info.shape)
                .ok_or(ExprError::UnknownSymbol(*id)),
            ExprNode::Add(args) => {
                if args.len() < 2 {
                    return Err(ExprError::Arity {
                        op: "+",
                        expected: 2,
                        found: args.len(),
                    });
                }
                let first = self.shape(args[0]);
                for &arg in &args[1..] {
                    let shape = self.shape(arg);
                    if shape != first {
                        return Err(ExprError::ShapeMismatch {
                            context: "sum",
                            left: first,
                            right: shape,
                        });
                    }
                }
                Ok(first)
            }
            ExprNode::Mul(args) => {
                if args.len() < 2 {
                    return Err(ExprError::Arity {
                        op: "*",
                        expected: 2,
                        found: args.len(),
                    });
                }
                let mut acc = self.shape(args[0]);
                for &arg in &args[1..] {
                    let shape = self.shape(arg);
                    acc = acc.compose(shape).ok_or(ExprError::ShapeMismatch {
                        context: "product",
                        left: acc,
                        right: shape,
                    })?;
                }
                Ok(acc)
            }
            ExprNode::Pow { base, exp } => {
                let exp_shape = self.shape(*exp);
                if !exp_shape.is_scalar() {
                    return Err(ExprError::InvalidOperand {
                        op: "^",
                        shape: exp_shape,
                    });
                }
                let base_shape = self.shape(*base);
                let integral = self.as_number(*exp).is_some_and(|n| n.denominator().is_one());
                match base_shape {
                    Shape::Scalar => Ok(Shape::Scalar),
                    Shape::Matrix if integral => Ok(Shape::Matrix),
                    other => Err(ExprError::InvalidOperand {
                        op: "^",
                        shape: other,
                    }),
                }
            }
            ExprNode::Operator { op, args } => {
                let shapes: Vec<Shape> = args.iter().map(|&a| self.shape(a)).collect();
                op.result_shape(&shapes)
            }
        }
    }

    /// Gets the node at the given handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle did not come from this arena.
    #[must_use]
    pub fn get(&self, handle: ExprHandle) -> &ExprNode {
        &self.nodes[handle.index() as usize]
    }

    /// Gets the shape of the expression at the given handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle did not come from this arena.
    #[must_use]
    pub fn shape(&self, handle: ExprHandle) -> Shape {
        self.shapes[handle.index() as usize]
    }

    /// Gets the tensor rank of the expression at the given handle.
    #[must_use]
    pub fn rank(&self, handle: ExprHandle) -> u8 {
        self.shape(handle).rank()
    }

    /// Returns the number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // === Symbols ===

    /// Declares (or re-fetches) a symbol of the given rank.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::Redeclared`] if the name is already taken by a
    /// symbol of a different rank.
    pub fn symbol(&mut self, name: &str, rank: u8) -> Result<ExprHandle, ExprError> {
        self.declare(name, Shape::from_rank(rank), None)
    }

    /// Declares a named constant with a fixed value.
    ///
    /// Constants are never treated as unknowns by the solvers.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::Redeclared`] if the name is already taken by a
    /// symbol of a different rank.
    pub fn constant(&mut self, name: &str, rank: u8, value: RBig) -> Result<ExprHandle, ExprError> {
        self.declare(name, Shape::from_rank(rank), Some(value))
    }

    fn declare(
        &mut self,
        name: &str,
        shape: Shape,
        value: Option<RBig>,
    ) -> Result<ExprHandle, ExprError> {
        let (id, _) = self.symbols.get_or_insert_with(name, || SymbolInfo {
            name: name.to_string(),
            shape,
            value,
        });
        let declared = self.symbols.get(id).map_or(shape, |info| info.shape);
        if declared != shape {
            return Err(ExprError::Redeclared {
                name: name.to_string(),
                declared,
                requested: shape,
            });
        }
        Ok(self.insert(ExprNode::Symbol(id), shape))
    }

    /// Creates a symbol with a generated name that is not in use yet.
    pub fn fresh_symbol(&mut self, prefix: &str, shape: Shape) -> ExprHandle {
        loop {
            let name = format!("{prefix}{}", self.fresh);
            self.fresh += 1;
            if self.symbols.id(&name).is_none() {
                let (id, _) = self.symbols.get_or_insert_with(&name, || SymbolInfo {
                    name: name.clone(),
                    shape,
                    value: None,
                });
                return self.insert(ExprNode::Symbol(id), shape);
            }
        }
    }

    /// Looks a declared symbol up by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<ExprHandle> {
        let id = self.symbols.id(name)?;
        self.intern_map.get(&ExprNode::Symbol(id)).copied()
    }

    /// Returns the symbol information if `handle` is a symbol.
    #[must_use]
    pub fn symbol_info(&self, handle: ExprHandle) -> Option<&SymbolInfo> {
        match self.get(handle) {
            ExprNode::Symbol(id) => self.symbols.get(*id),
            _ => None,
        }
    }

    /// Gets the name of a symbol by its ID.
    #[must_use]
    pub fn symbol_name(&self, id: SymbolId) -> Option<&str> {
        self.symbols.get(id).map(|info| info.name.as_str())
    }

    /// Returns true if `handle` is a symbol.
    #[must_use]
    pub fn is_symbol(&self, handle: ExprHandle) -> bool {
        matches!(self.get(handle), ExprNode::Symbol(_))
    }

    /// Returns true if `handle` is a symbol with a fixed value.
    #[must_use]
    pub fn is_constant(&self, handle: ExprHandle) -> bool {
        self.symbol_info(handle).is_some_and(SymbolInfo::is_constant)
    }

    // === Functions ===

    /// Interns the name of a non-linear function.
    pub fn function(&mut self, name: &str) -> FunctionId {
        self.functions.get_or_insert_with(name, || name.to_string()).0
    }

    /// Gets the name of a function by its ID.
    #[must_use]
    pub fn function_name(&self, id: FunctionId) -> Option<&str> {
        self.functions.get(id).map(String::as_str)
    }

    // === Numbers ===

    /// Creates a rational literal.
    pub fn number(&mut self, value: RBig) -> ExprHandle {
        self.insert(ExprNode::Number(value), Shape::Scalar)
    }

    /// Creates an integer literal.
    pub fn integer(&mut self, value: i64) -> ExprHandle {
        self.number(RBig::from(IBig::from(value)))
    }

    /// Creates the literal `num / den`.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::NotInvertible`] if `den` is zero.
    pub fn rational(&mut self, num: i64, den: u64) -> Result<ExprHandle, ExprError> {
        if den == 0 {
            return Err(ExprError::NotInvertible("0".to_string()));
        }
        Ok(self.number(RBig::from_parts(IBig::from(num), UBig::from(den))))
    }

    /// The literal `0`.
    pub fn zero(&mut self) -> ExprHandle {
        self.number(RBig::ZERO)
    }

    /// The literal `1`.
    pub fn one(&mut self) -> ExprHandle {
        self.number(RBig::ONE)
    }

    /// Returns the value if `handle` is a numeric literal.
    #[must_use]
    pub fn as_number(&self, handle: ExprHandle) -> Option<&RBig> {
        match self.get(handle) {
            ExprNode::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Returns true if `handle` is the literal zero.
    #[must_use]
    pub fn is_zero(&self, handle: ExprHandle) -> bool {
        self.get(handle).is_zero()
    }

    /// Returns true if `handle` is the literal one.
    #[must_use]
    pub fn is_one(&self, handle: ExprHandle) -> bool {
        self.get(handle).is_one()
    }
}
