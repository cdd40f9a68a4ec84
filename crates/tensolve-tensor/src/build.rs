//! Canonical constructors.
//!
//! Every transformation in this crate builds its results through these
//! functions, so structurally equal values always end up on the same handle:
//!
//! - sums are flattened, like terms are combined, zero is dropped and the
//!   addends are sorted by handle;
//! - products carry their numeric coefficient first, then the scalar factors
//!   (sorted, equal bases merged into powers), then the non-scalar factors in
//!   their original order with adjacent `A·A⁻¹` pairs cancelled;
//! - a run of non-scalar factors that contracts to a scalar (`Tᵀ(s)·q`) is
//!   kept as one scalar factor, because it commutes as a whole.

use dashu::base::Inverse as _;
use dashu::rational::RBig;
use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};
use tensolve_core::{ExprArena, ExprError, ExprHandle, ExprNode, Operator, Shape};

use crate::Result;

/// Builds the canonical sum of `terms`.
///
/// # Errors
///
/// Returns [`ExprError::ShapeMismatch`] if the surviving addends differ in
/// shape.
pub fn add(arena: &mut ExprArena, terms: &[ExprHandle]) -> Result<ExprHandle> {
    let mut flat: Vec<ExprHandle> = Vec::with_capacity(terms.len());
    for &t in terms {
        match arena.get(t) {
            ExprNode::Add(args) => flat.extend(args.iter().copied()),
            _ => flat.push(t),
        }
    }

    let mut constant = RBig::ZERO;
    let mut order: Vec<ExprHandle> = Vec::new();
    let mut coeffs: FxHashMap<ExprHandle, RBig> = FxHashMap::default();
    for t in flat {
        if let Some(n) = arena.as_number(t) {
            constant = &constant + n;
            continue;
        }
        let (c, body) = split_numeric(arena, t)?;
        match coeffs.get_mut(&body) {
            Some(existing) => *existing = &*existing + &c,
            None => {
                coeffs.insert(body, c);
                order.push(body);
            }
        }
    }

    let mut out: Vec<ExprHandle> = Vec::with_capacity(order.len() + 1);
    for body in order {
        let Some(c) = coeffs.remove(&body) else {
            continue;
        };
        if c.is_zero() {
            continue;
        }
        out.push(scale(arena, c, body)?);
    }
    if !constant.is_zero() {
        out.push(arena.number(constant));
    }
    out.sort_unstable();

    match out.len() {
        0 => Ok(arena.zero()),
        1 => Ok(out[0]),
        _ => arena.intern(ExprNode::Add(out.into_iter().collect())),
    }
}

/// Splits a term into its numeric coefficient and the rest.
fn split_numeric(arena: &mut ExprArena, term: ExprHandle) -> Result<(RBig, ExprHandle)> {
    if let ExprNode::Mul(args) = arena.get(term) {
        if let Some(c) = arena.as_number(args[0]) {
            let c = c.clone();
            let rest: SmallVec<[ExprHandle; 4]> = args[1..].iter().copied().collect();
            let body = if rest.len() == 1 {
                rest[0]
            } else {
                arena.intern(ExprNode::Mul(rest))?
            };
            return Ok((c, body));
        }
    }
    Ok((RBig::ONE, term))
}

fn scale(arena: &mut ExprArena, c: RBig, body: ExprHandle) -> Result<ExprHandle> {
    if c.is_one() {
        return Ok(body);
    }
    let c = arena.number(c);
    mul(arena, &[c, body])
}

/// Builds the canonical ordered product of `factors`.
///
/// An empty product is `1`; a zero coefficient makes the product `0`.
///
/// # Errors
///
/// Returns [`ExprError::ShapeMismatch`] if the non-scalar factors do not
/// chain.
pub fn mul(arena: &mut ExprArena, factors: &[ExprHandle]) -> Result<ExprHandle> {
    let mut acc = Factors::new();
    for &f in factors {
        acc.absorb(arena, f)?;
    }
    acc.finish(arena)
}

/// Factors of a product while it is being normalised.
struct Factors {
    coeff: RBig,
    scalars: Vec<ExprHandle>,
    chain: Vec<ExprHandle>,
}

impl Factors {
    fn new() -> Self {
        Self {
            coeff: RBig::ONE,
            scalars: Vec::new(),
            chain: Vec::new(),
        }
    }

    fn absorb(&mut self, arena: &mut ExprArena, f: ExprHandle) -> Result<()> {
        let node = arena.get(f).clone();
        match node {
            ExprNode::Number(n) => self.coeff = &self.coeff * &n,
            ExprNode::Mul(args) => {
                let contracted = arena.shape(f).is_scalar()
                    && args.iter().any(|&a| !arena.shape(a).is_scalar());
                if !contracted {
                    for &a in &args {
                        self.absorb(arena, a)?;
                    }
                    return Ok(());
                }
                // A scalar built from tensors: pull out its scalar parts and
                // keep the contracted chain as one commuting factor.
                let mut chain: SmallVec<[ExprHandle; 4]> = SmallVec::new();
                for &a in &args {
                    if let Some(n) = arena.as_number(a) {
                        self.coeff = &self.coeff * n;
                    } else if arena.shape(a).is_scalar() {
                        self.scalars.push(a);
                    } else {
                        chain.push(a);
                    }
                }
                let atom = if chain.len() == args.len() {
                    f
                } else {
                    arena.intern(ExprNode::Mul(chain))?
                };
                self.scalars.push(atom);
            }
            _ if arena.shape(f).is_scalar() => self.scalars.push(f),
            _ => self.chain.push(f),
        }
        Ok(())
    }

    fn finish(mut self, arena: &mut ExprArena) -> Result<ExprHandle> {
        if self.coeff.is_zero() {
            return Ok(arena.zero());
        }
        let chain = cancel_inverse_pairs(arena, std::mem::take(&mut self.chain));
        let chain = self.group_contractions(arena, chain)?;
        let scalars = merge_powers(arena, &self.scalars)?;

        // c·(a + b) distributes the literal
        if let ([only], []) | ([], [only]) = (scalars.as_slice(), chain.as_slice()) {
            if let ExprNode::Add(terms) = arena.get(*only).clone() {
                if !self.coeff.is_one() {
                    let mut scaled = Vec::with_capacity(terms.len());
                    for &t in &terms {
                        scaled.push(scale(arena, self.coeff.clone(), t)?);
                    }
                    return add(arena, &scaled);
                }
            }
        }

        let mut args: SmallVec<[ExprHandle; 4]> = SmallVec::new();
        if !self.coeff.is_one() {
            args.push(arena.number(self.coeff));
        }
        args.extend(scalars);
        args.extend(chain);

        match args.len() {
            0 => Ok(arena.one()),
            1 => Ok(args[0]),
            _ => arena.intern(ExprNode::Mul(args)),
        }
    }

    /// Moves every run `Row · … · Column` that contracts to a scalar into the
    /// scalar factors, unless that run is the whole product.
    fn group_contractions(
        &mut self,
        arena: &mut ExprArena,
        chain: Vec<ExprHandle>,
    ) -> Result<Vec<ExprHandle>> {
        let bare = self.coeff.is_one() && self.scalars.is_empty();
        let mut out = Vec::with_capacity(chain.len());
        let mut i = 0;
        while i < chain.len() {
            if arena.shape(chain[i]) == Shape::Row {
                let mut acc = Shape::Row;
                let mut end = None;
                for (j, &f) in chain.iter().enumerate().skip(i + 1) {
                    let shape = arena.shape(f);
                    acc = acc.compose(shape).ok_or(ExprError::ShapeMismatch {
                        context: "product",
                        left: acc,
                        right: shape,
                    })?;
                    if acc.is_scalar() {
                        end = Some(j);
                        break;
                    }
                }
                if let Some(j) = end {
                    let whole = bare && i == 0 && j + 1 == chain.len();
                    if !whole {
                        let run: SmallVec<[ExprHandle; 4]> = chain[i..=j].iter().copied().collect();
                        let atom = arena.intern(ExprNode::Mul(run))?;
                        self.scalars.push(atom);
                        i = j + 1;
                        continue;
                    }
                }
            }
            out.push(chain[i]);
            i += 1;
        }
        Ok(out)
    }
}

fn is_inverse_of(arena: &ExprArena, candidate: ExprHandle, of: ExprHandle) -> bool {
    arena.get(candidate).operand_of(Operator::Inverse) == Some(&[of][..])
}

fn cancel_inverse_pairs(arena: &ExprArena, chain: Vec<ExprHandle>) -> Vec<ExprHandle> {
    let mut stack: Vec<ExprHandle> = Vec::with_capacity(chain.len());
    for f in chain {
        match stack.last() {
            Some(&top) if is_inverse_of(arena, f, top) || is_inverse_of(arena, top, f) => {
                stack.pop();
            }
            _ => stack.push(f),
        }
    }
    stack
}

/// Splits a scalar factor into base and numeric exponent.
pub(crate) fn scalar_power(arena: &ExprArena, factor: ExprHandle) -> (ExprHandle, RBig) {
    match arena.get(factor) {
        ExprNode::Pow { base, exp } => {
            if let Some(n) = arena.as_number(*exp) {
                return (*base, n.clone());
            }
        }
        ExprNode::Operator {
            op: Operator::Inverse,
            args,
        } if arena.shape(args[0]).is_scalar() => return (args[0], -RBig::ONE),
        _ => {}
    }
    (factor, RBig::ONE)
}

/// Emits `base^exp` in canonical form, `None` for a zero exponent.
fn power_of(arena: &mut ExprArena, base: ExprHandle, exp: &RBig) -> Result<Option<ExprHandle>> {
    if exp.is_zero() {
        return Ok(None);
    }
    if exp.is_one() {
        return Ok(Some(base));
    }
    if *exp == -RBig::ONE {
        return arena
            .intern(ExprNode::Operator {
                op: Operator::Inverse,
                args: smallvec![base],
            })
            .map(Some);
    }
    let exp = arena.number(exp.clone());
    arena.intern(ExprNode::Pow { base, exp }).map(Some)
}

fn merge_powers(arena: &mut ExprArena, scalars: &[ExprHandle]) -> Result<Vec<ExprHandle>> {
    let mut order: Vec<ExprHandle> = Vec::new();
    let mut exps: FxHashMap<ExprHandle, RBig> = FxHashMap::default();
    for &s in scalars {
        let (base, e) = scalar_power(arena, s);
        match exps.get_mut(&base) {
            Some(existing) => *existing = &*existing + &e,
            None => {
                exps.insert(base, e);
                order.push(base);
            }
        }
    }
    let mut out = Vec::with_capacity(order.len());
    for base in order {
        let Some(e) = exps.remove(&base) else {
            continue;
        };
        if let Some(h) = power_of(arena, base, &e)? {
            out.push(h);
        }
    }
    out.sort_unstable();
    Ok(out)
}

/// Returns the value of an integral literal that fits in `i64`.
pub(crate) fn small_integer(value: &RBig) -> Option<i64> {
    if !value.denominator().is_one() {
        return None;
    }
    i64::try_from(value.numerator().clone()).ok()
}

fn number_pow(arena: &mut ExprArena, base: &RBig, k: i64) -> Result<ExprHandle> {
    if k < 0 && base.is_zero() {
        return Err(ExprError::NotInvertible("0".to_string()));
    }
    let magnitude = usize::try_from(k.unsigned_abs()).unwrap_or(usize::MAX);
    let value = base.pow(magnitude);
    let value = if k < 0 { value.inv() } else { value };
    Ok(arena.number(value))
}

/// Builds `base^exp`.
///
/// # Errors
///
/// Returns an error for powers of vectors, non-integral powers of matrices
/// and negative powers of zero.
pub fn pow(arena: &mut ExprArena, base: ExprHandle, exp: ExprHandle) -> Result<ExprHandle> {
    if let Some(e) = arena.as_number(exp).cloned() {
        if e.is_zero() {
            return Ok(arena.one());
        }
        if e.is_one() {
            return Ok(base);
        }
        if let (Some(b), Some(k)) = (arena.as_number(base).cloned(), small_integer(&e)) {
            return number_pow(arena, &b, k);
        }
        if arena.shape(base).is_scalar() {
            let (b, e0) = scalar_power(arena, base);
            let total = &e0 * &e;
            return match power_of(arena, b, &total)? {
                Some(h) => Ok(h),
                None => Ok(arena.one()),
            };
        }
    }
    arena.intern(ExprNode::Pow { base, exp })
}

/// Builds `-a`.
///
/// # Errors
///
/// Propagates shape errors from [`mul`].
pub fn neg(arena: &mut ExprArena, a: ExprHandle) -> Result<ExprHandle> {
    let minus_one = arena.integer(-1);
    mul(arena, &[minus_one, a])
}

/// Builds `a - b`.
///
/// # Errors
///
/// Returns [`ExprError::ShapeMismatch`] if `a` and `b` differ in shape.
pub fn sub(arena: &mut ExprArena, a: ExprHandle, b: ExprHandle) -> Result<ExprHandle> {
    let nb = neg(arena, b)?;
    add(arena, &[a, nb])
}

/// Builds the multiplicative inverse of `a`.
///
/// Numbers invert exactly, `(a⁻¹)⁻¹ = a`, products of scalars invert factor
/// by factor and matrix products reverse. Anything else becomes an
/// `Inverse` node.
///
/// # Errors
///
/// Returns [`ExprError::NotInvertible`] for zero, for vectors and higher
/// tensors, and for matrix products with a non-invertible factor.
pub fn inverse(arena: &mut ExprArena, a: ExprHandle) -> Result<ExprHandle> {
    if let Some(n) = arena.as_number(a) {
        if n.is_zero() {
            return Err(ExprError::NotInvertible("0".to_string()));
        }
        let value = n.clone().inv();
        return Ok(arena.number(value));
    }
    let shape = arena.shape(a);
    if !shape.is_invertible() {
        return Err(ExprError::NotInvertible(arena.display(a).to_string()));
    }
    let node = arena.get(a).clone();
    match node {
        ExprNode::Operator {
            op: Operator::Inverse,
            args,
        } => Ok(args[0]),
        ExprNode::Mul(args)
            if shape.is_scalar() && args.iter().all(|&f| arena.shape(f).is_scalar()) =>
        {
            let mut inv = Vec::with_capacity(args.len());
            for &f in &args {
                inv.push(inverse(arena, f)?);
            }
            mul(arena, &inv)
        }
        ExprNode::Mul(args) if shape == Shape::Matrix => {
            let mut inv = Vec::with_capacity(args.len());
            for &f in args.iter().rev() {
                inv.push(inverse(arena, f)?);
            }
            mul(arena, &inv)
        }
        ExprNode::Pow { .. } if shape.is_scalar() => {
            let minus_one = arena.integer(-1);
            pow(arena, a, minus_one)
        }
        _ => arena.intern(ExprNode::Operator {
            op: Operator::Inverse,
            args: smallvec![a],
        }),
    }
}

/// Builds the transpose of `a`.
///
/// # Errors
///
/// Propagates errors from rebuilding sums, products and inverses.
pub fn transpose(arena: &mut ExprArena, a: ExprHandle) -> Result<ExprHandle> {
    if arena.shape(a).is_scalar() {
        return Ok(a);
    }
    let node = arena.get(a).clone();
    match node {
        ExprNode::Operator {
            op: Operator::Transpose,
            args,
        } => Ok(args[0]),
        ExprNode::Operator {
            op: Operator::Inverse,
            args,
        } => {
            let t = transpose(arena, args[0])?;
            inverse(arena, t)
        }
        ExprNode::Add(args) => {
            let mut terms = Vec::with_capacity(args.len());
            for &t in &args {
                terms.push(transpose(arena, t)?);
            }
            add(arena, &terms)
        }
        ExprNode::Mul(args) => {
            let mut factors = Vec::with_capacity(args.len());
            for &f in args.iter().rev() {
                factors.push(transpose(arena, f)?);
            }
            mul(arena, &factors)
        }
        ExprNode::Pow { base, exp } => {
            let t = transpose(arena, base)?;
            pow(arena, t, exp)
        }
        _ => arena.intern(ExprNode::Operator {
            op: Operator::Transpose,
            args: smallvec![a],
        }),
    }
}

/// Builds the inner product of two tensors of the same shape.
///
/// # Errors
///
/// Returns [`ExprError::ShapeMismatch`] for operands of different shapes.
pub fn inner(arena: &mut ExprArena, a: ExprHandle, b: ExprHandle) -> Result<ExprHandle> {
    if arena.is_zero(a) || arena.is_zero(b) {
        return Ok(arena.zero());
    }
    if arena.shape(a).is_scalar() && arena.shape(b).is_scalar() {
        return mul(arena, &[a, b]);
    }
    arena.intern(ExprNode::Operator {
        op: Operator::Inner,
        args: smallvec![a, b],
    })
}

/// Applies an operator to its operands.
///
/// Linear operators of zero are zero.
///
/// # Errors
///
/// Returns [`ExprError::Arity`] for a wrong operand count and propagates
/// the operator's rank rule otherwise.
pub fn apply(arena: &mut ExprArena, op: Operator, args: &[ExprHandle]) -> Result<ExprHandle> {
    if args.len() != op.arity() {
        return Err(ExprError::Arity {
            op: op.name(),
            expected: op.arity(),
            found: args.len(),
        });
    }
    match op {
        Operator::Inverse => inverse(arena, args[0]),
        Operator::Transpose => transpose(arena, args[0]),
        Operator::Inner => inner(arena, args[0], args[1]),
        Operator::Function(_) => arena.intern(ExprNode::Operator {
            op,
            args: args.iter().copied().collect(),
        }),
        _ if arena.is_zero(args[0]) => Ok(args[0]),
        _ => arena.intern(ExprNode::Operator {
            op,
            args: args.iter().copied().collect(),
        }),
    }
}

/// Applies the named non-linear function to `arg`.
///
/// # Errors
///
/// Never fails for a single operand; the signature matches [`apply`].
pub fn function(arena: &mut ExprArena, name: &str, arg: ExprHandle) -> Result<ExprHandle> {
    let id = arena.function(name);
    apply(arena, Operator::Function(id), &[arg])
}

/// Rebuilds `expr` with new children through the canonical constructors.
///
/// `children` must match [`ExprNode::children`] of `expr` in length.
///
/// # Errors
///
/// Propagates errors from the constructors.
pub fn rebuild(arena: &mut ExprArena, expr: ExprHandle, children: &[ExprHandle]) -> Result<ExprHandle> {
    let node = arena.get(expr).clone();
    match node {
        ExprNode::Number(_) | ExprNode::Symbol(_) => Ok(expr),
        ExprNode::Add(_) => add(arena, children),
        ExprNode::Mul(_) => mul(arena, children),
        ExprNode::Pow { .. } => pow(arena, children[0], children[1]),
        ExprNode::Operator { op, .. } => apply(arena, op, children),
    }
}
