//! Boolean expression simplification.
//!
//! [`BoolExpr::simp`] rewrites an expression into an equivalent, usually smaller one. The rule set
//! is sound but not complete; simplification is total and idempotent. The relative order of the
//! operands an n-ary connective keeps is preserved, modulo the flattening of nested connectives.

crate::prelude!();

use expr::{BoolExpr, Expr, IntExpr};

impl<V: Clone + Eq> BoolExpr<V> {
    /// Simplifies an expression.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use starling_api::{build_bexpr, expr::BoolExpr};
    /// let expr = build_bexpr!((and (or false (a: bool)) (=> (b: bool) true)));
    /// assert_eq!(expr.simp(), build_bexpr!((a: bool)));
    /// let expr = build_bexpr!((not (and (a: bool) (> (n: int) 0))));
    /// assert_eq!(expr.simp(), build_bexpr!((or (not (a: bool)) (<= (n: int) 0))));
    /// ```
    pub fn simp(&self) -> Self {
        match self {
            Self::Not(arg) => simp_not(arg.simp()),
            Self::Implies(lft, rgt) => match (lft.simp(), rgt.simp()) {
                (Self::Lit(false), _) => Self::Lit(true),
                (_, Self::Lit(true)) => Self::Lit(true),
                (Self::Lit(true), rgt) => rgt,
                (lft, Self::Lit(false)) => simp_not(lft),
                (lft, rgt) => Self::implies(lft, rgt),
            },
            Self::And(ops) => norm_and(ops.iter().map(Self::simp).collect()),
            Self::Or(ops) => norm_or(ops.iter().map(Self::simp).collect()),
            Self::Eq(lft, rgt) => simp_eq(lft, rgt),
            Self::Ge(lft, rgt) => mk_ge((**lft).clone(), (**rgt).clone()),
            Self::Le(lft, rgt) => mk_le((**lft).clone(), (**rgt).clone()),
            Self::Var(_) | Self::Lit(_) | Self::Gt(_, _) | Self::Lt(_, _) | Self::Idx { .. } => {
                self.clone()
            }
        }
    }
}

/// Folds over `items`, allowing the step function to short-circuit.
///
/// The step function returns `Err(value)` to stop the fold immediately with `value`.
fn fold_fast<T, Acc>(
    items: impl IntoIterator<Item = T>,
    init: Acc,
    mut step: impl FnMut(Acc, T) -> Result<Acc, Acc>,
) -> Acc {
    let mut acc = init;
    for item in items {
        match step(acc, item) {
            Ok(next) => acc = next,
            Err(last) => return last,
        }
    }
    acc
}

/// Trivial-equivalence check.
///
/// Recognizes `a = b ≡ b = a` and `¬a ≡ ¬b` whenever `a ≡ b`; otherwise structural equality.
fn triv_equiv<V: Eq>(lft: &BoolExpr<V>, rgt: &BoolExpr<V>) -> bool {
    match (lft, rgt) {
        (BoolExpr::Eq(l_1, r_1), BoolExpr::Eq(l_2, r_2)) => {
            (l_1 == l_2 && r_1 == r_2) || (l_1 == r_2 && r_1 == l_2)
        }
        (BoolExpr::Not(lft), BoolExpr::Not(rgt)) => triv_equiv(lft, rgt),
        _ => lft == rgt,
    }
}

/// Appends `op` to `ops` unless a trivially-equivalent operand is already there.
fn push_new<V: Eq>(ops: &mut Vec<BoolExpr<V>>, op: BoolExpr<V>) {
    if !ops.iter().any(|prev| triv_equiv(prev, &op)) {
        ops.push(op)
    }
}

/// Normalizes a conjunction of already-simplified operands.
///
/// Flattens nested conjunctions, drops `true` and duplicate operands, and short-circuits on
/// `false`. An empty conjunction is `true`, a singleton its sole operand.
fn norm_and<V: Clone + Eq>(ops: Vec<BoolExpr<V>>) -> BoolExpr<V> {
    let folded = fold_fast(ops, Some(Vec::new()), |acc, op| {
        let mut nu = match acc {
            Some(nu) => nu,
            None => vec![],
        };
        match op {
            BoolExpr::Lit(true) => Ok(Some(nu)),
            BoolExpr::Lit(false) => Err(None),
            BoolExpr::And(inner) => {
                for op in inner {
                    push_new(&mut nu, op)
                }
                Ok(Some(nu))
            }
            op => {
                push_new(&mut nu, op);
                Ok(Some(nu))
            }
        }
    });
    match folded {
        None => BoolExpr::Lit(false),
        Some(mut ops) => match ops.pop() {
            None => BoolExpr::Lit(true),
            Some(op) if ops.is_empty() => op,
            Some(op) => {
                ops.push(op);
                BoolExpr::And(ops)
            }
        },
    }
}

/// Normalizes a disjunction of already-simplified operands, dual to [`norm_and`].
fn norm_or<V: Clone + Eq>(ops: Vec<BoolExpr<V>>) -> BoolExpr<V> {
    let folded = fold_fast(ops, Some(Vec::new()), |acc, op| {
        let mut nu = match acc {
            Some(nu) => nu,
            None => vec![],
        };
        match op {
            BoolExpr::Lit(false) => Ok(Some(nu)),
            BoolExpr::Lit(true) => Err(None),
            BoolExpr::Or(inner) => {
                for op in inner {
                    push_new(&mut nu, op)
                }
                Ok(Some(nu))
            }
            op => {
                push_new(&mut nu, op);
                Ok(Some(nu))
            }
        }
    });
    match folded {
        None => BoolExpr::Lit(true),
        Some(mut ops) => match ops.pop() {
            None => BoolExpr::Lit(false),
            Some(op) if ops.is_empty() => op,
            Some(op) => {
                ops.push(op);
                BoolExpr::Or(ops)
            }
        },
    }
}

/// Pushes a negation into an already-simplified expression.
fn simp_not<V: Clone + Eq>(expr: BoolExpr<V>) -> BoolExpr<V> {
    match expr {
        BoolExpr::Lit(b) => BoolExpr::Lit(!b),
        BoolExpr::Not(arg) => *arg,
        BoolExpr::And(ops) => norm_or(ops.into_iter().map(simp_not).collect()),
        BoolExpr::Or(ops) => norm_and(ops.into_iter().map(simp_not).collect()),
        BoolExpr::Implies(lft, rgt) => norm_and(vec![*lft, simp_not(*rgt)]),
        BoolExpr::Gt(lft, rgt) => mk_le(*lft, *rgt),
        BoolExpr::Ge(lft, rgt) => BoolExpr::Lt(lft, rgt),
        BoolExpr::Le(lft, rgt) => BoolExpr::Gt(lft, rgt),
        BoolExpr::Lt(lft, rgt) => mk_ge(*lft, *rgt),
        expr => expr.negate(),
    }
}

/// Builds `lft ≥ rgt`, applying reflexivity.
fn mk_ge<V: Clone + Eq>(lft: IntExpr<V>, rgt: IntExpr<V>) -> BoolExpr<V> {
    if lft == rgt {
        BoolExpr::Lit(true)
    } else {
        BoolExpr::Ge(Box::new(lft), Box::new(rgt))
    }
}
/// Builds `lft ≤ rgt`, applying reflexivity.
fn mk_le<V: Clone + Eq>(lft: IntExpr<V>, rgt: IntExpr<V>) -> BoolExpr<V> {
    if lft == rgt {
        BoolExpr::Lit(true)
    } else {
        BoolExpr::Le(Box::new(lft), Box::new(rgt))
    }
}

/// Simplifies an equality.
///
/// Structural reflexivity applies at any type; Boolean equalities additionally collapse by
/// truth-table against literal operands.
fn simp_eq<V: Clone + Eq>(lft: &Expr<V>, rgt: &Expr<V>) -> BoolExpr<V> {
    let (lft, rgt) = (simp_side(lft), simp_side(rgt));
    if lft == rgt {
        return BoolExpr::Lit(true);
    }
    match (lft, rgt) {
        (Expr::Bool(BoolExpr::Lit(lft)), Expr::Bool(BoolExpr::Lit(rgt))) => {
            BoolExpr::Lit(lft == rgt)
        }
        (Expr::Bool(BoolExpr::Lit(true)), Expr::Bool(other))
        | (Expr::Bool(other), Expr::Bool(BoolExpr::Lit(true))) => other,
        (Expr::Bool(BoolExpr::Lit(false)), Expr::Bool(other))
        | (Expr::Bool(other), Expr::Bool(BoolExpr::Lit(false))) => simp_not(other),
        (lft, rgt) => BoolExpr::Eq(Box::new(lft), Box::new(rgt)),
    }
}

/// Simplifies the Boolean side of an equality, leaves other sides untouched.
fn simp_side<V: Clone + Eq>(side: &Expr<V>) -> Expr<V> {
    match side {
        Expr::Bool(expr) => Expr::Bool(expr.simp()),
        side => side.clone(),
    }
}
