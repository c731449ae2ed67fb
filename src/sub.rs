//! Position-aware substitution over expressions.
//!
//! Substitutions thread a [`SubCtx`] recording the *sign* of the position being rewritten.
//! Negation flips the sign, an implication's antecedent flips it, and the operands of comparisons
//! and equalities keep their parent's sign. Guards of guarded items are substituted under the
//! flipped context (a guard is an antecedent), items under the unchanged one.
//!
//! The walkers are explicit visitor functions over a [`VarSubst`] implementation; [`Renamer`] and
//! [`SymRenamer`] adapt plain variable-to-variable functions, and [`Approx`] implements the
//! over/under-approximation of Boolean symbols.

crate::prelude!();

use expr::{ArrayExpr, BoolExpr, Expr, IntExpr, MarkedVar, Sym, Typ};

/// Sign of a position inside a Boolean expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// A position the toplevel expression is monotone in.
    Positive,
    /// A position the toplevel expression is antitone in.
    Negative,
}

/// Context carried by a substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubCtx {
    /// Sign of the current position.
    pub sign: Sign,
}
impl SubCtx {
    /// Positive context, the starting point of most substitutions.
    pub fn positive() -> Self {
        Self {
            sign: Sign::Positive,
        }
    }
    /// Negative context.
    pub fn negative() -> Self {
        Self {
            sign: Sign::Negative,
        }
    }
    /// Flips the sign.
    pub fn flip(self) -> Self {
        match self.sign {
            Sign::Positive => Self::negative(),
            Sign::Negative => Self::positive(),
        }
    }
}

/// A variable substitution from variables `V` to expressions over `W`.
///
/// Each method receives the context of the position the variable occurs at, and builds the
/// replacement expression at the matching type.
pub trait VarSubst<V, W> {
    /// Replaces a variable occurring at integer type.
    fn int_var(&mut self, ctx: SubCtx, var: &V) -> Res<IntExpr<W>>;
    /// Replaces a variable occurring at Boolean type.
    fn bool_var(&mut self, ctx: SubCtx, var: &V) -> Res<BoolExpr<W>>;
    /// Replaces a variable occurring at array type.
    fn array_var(&mut self, ctx: SubCtx, var: &V, elt: &Typ, len: Option<usize>)
        -> Res<ArrayExpr<W>>;
}

/// Substitutes through an integer expression.
pub fn int_expr<V, W, S: VarSubst<V, W> + ?Sized>(
    subst: &mut S,
    ctx: SubCtx,
    expr: &IntExpr<V>,
) -> Res<IntExpr<W>> {
    let res = match expr {
        IntExpr::Var(var) => subst.int_var(ctx, var)?,
        IntExpr::Lit(i) => IntExpr::Lit(i.clone()),
        IntExpr::Add(ops) => IntExpr::Add(int_exprs(subst, ctx, ops)?),
        IntExpr::Sub(ops) => IntExpr::Sub(int_exprs(subst, ctx, ops)?),
        IntExpr::Mul(ops) => IntExpr::Mul(int_exprs(subst, ctx, ops)?),
        IntExpr::Div(lft, rgt) => IntExpr::Div(
            Box::new(int_expr(subst, ctx, lft)?),
            Box::new(int_expr(subst, ctx, rgt)?),
        ),
        IntExpr::Mod(lft, rgt) => IntExpr::Mod(
            Box::new(int_expr(subst, ctx, lft)?),
            Box::new(int_expr(subst, ctx, rgt)?),
        ),
        IntExpr::Idx { arr, idx } => IntExpr::Idx {
            arr: Box::new(array_expr(subst, ctx, arr)?),
            idx: Box::new(int_expr(subst, ctx, idx)?),
        },
    };
    Ok(res)
}

/// Substitutes through a list of integer expressions.
fn int_exprs<V, W, S: VarSubst<V, W> + ?Sized>(
    subst: &mut S,
    ctx: SubCtx,
    exprs: &[IntExpr<V>],
) -> Res<Vec<IntExpr<W>>> {
    exprs.iter().map(|expr| int_expr(subst, ctx, expr)).collect()
}

/// Substitutes through a Boolean expression.
pub fn bool_expr<V, W, S: VarSubst<V, W> + ?Sized>(
    subst: &mut S,
    ctx: SubCtx,
    expr: &BoolExpr<V>,
) -> Res<BoolExpr<W>> {
    let res = match expr {
        BoolExpr::Var(var) => subst.bool_var(ctx, var)?,
        BoolExpr::Lit(b) => BoolExpr::Lit(*b),
        BoolExpr::And(ops) => BoolExpr::And(bool_exprs(subst, ctx, ops)?),
        BoolExpr::Or(ops) => BoolExpr::Or(bool_exprs(subst, ctx, ops)?),
        BoolExpr::Implies(lft, rgt) => BoolExpr::Implies(
            Box::new(bool_expr(subst, ctx.flip(), lft)?),
            Box::new(bool_expr(subst, ctx, rgt)?),
        ),
        BoolExpr::Not(arg) => BoolExpr::Not(Box::new(bool_expr(subst, ctx.flip(), arg)?)),
        BoolExpr::Eq(lft, rgt) => BoolExpr::Eq(
            Box::new(any_expr(subst, ctx, lft)?),
            Box::new(any_expr(subst, ctx, rgt)?),
        ),
        BoolExpr::Gt(lft, rgt) => BoolExpr::Gt(
            Box::new(int_expr(subst, ctx, lft)?),
            Box::new(int_expr(subst, ctx, rgt)?),
        ),
        BoolExpr::Ge(lft, rgt) => BoolExpr::Ge(
            Box::new(int_expr(subst, ctx, lft)?),
            Box::new(int_expr(subst, ctx, rgt)?),
        ),
        BoolExpr::Le(lft, rgt) => BoolExpr::Le(
            Box::new(int_expr(subst, ctx, lft)?),
            Box::new(int_expr(subst, ctx, rgt)?),
        ),
        BoolExpr::Lt(lft, rgt) => BoolExpr::Lt(
            Box::new(int_expr(subst, ctx, lft)?),
            Box::new(int_expr(subst, ctx, rgt)?),
        ),
        BoolExpr::Idx { arr, idx } => BoolExpr::Idx {
            arr: Box::new(array_expr(subst, ctx, arr)?),
            idx: Box::new(int_expr(subst, ctx, idx)?),
        },
    };
    Ok(res)
}

/// Substitutes through a list of Boolean expressions.
fn bool_exprs<V, W, S: VarSubst<V, W> + ?Sized>(
    subst: &mut S,
    ctx: SubCtx,
    exprs: &[BoolExpr<V>],
) -> Res<Vec<BoolExpr<W>>> {
    exprs
        .iter()
        .map(|expr| bool_expr(subst, ctx, expr))
        .collect()
}

/// Substitutes through an array expression.
pub fn array_expr<V, W, S: VarSubst<V, W> + ?Sized>(
    subst: &mut S,
    ctx: SubCtx,
    expr: &ArrayExpr<V>,
) -> Res<ArrayExpr<W>> {
    let res = match expr {
        ArrayExpr::Var { elt, len, var } => subst.array_var(ctx, var, elt, *len)?,
        ArrayExpr::Idx { elt, len, arr, idx } => ArrayExpr::Idx {
            elt: elt.clone(),
            len: *len,
            arr: Box::new(array_expr(subst, ctx, arr)?),
            idx: Box::new(int_expr(subst, ctx, idx)?),
        },
        ArrayExpr::Upd {
            elt,
            len,
            arr,
            idx,
            val,
        } => ArrayExpr::Upd {
            elt: elt.clone(),
            len: *len,
            arr: Box::new(array_expr(subst, ctx, arr)?),
            idx: Box::new(int_expr(subst, ctx, idx)?),
            val: Box::new(any_expr(subst, ctx, val)?),
        },
    };
    Ok(res)
}

/// Substitutes through an expression of any type.
pub fn any_expr<V, W, S: VarSubst<V, W> + ?Sized>(
    subst: &mut S,
    ctx: SubCtx,
    expr: &Expr<V>,
) -> Res<Expr<W>> {
    let res = match expr {
        Expr::Int(expr) => Expr::Int(int_expr(subst, ctx, expr)?),
        Expr::Bool(expr) => Expr::Bool(bool_expr(subst, ctx, expr)?),
        Expr::Array(expr) => Expr::Array(array_expr(subst, ctx, expr)?),
    };
    Ok(res)
}

/// Adapts a variable-to-variable function into a [`VarSubst`].
pub struct Renamer<F> {
    /// The underlying renaming.
    rename: F,
}
impl<F> Renamer<F> {
    /// Constructor.
    pub fn new(rename: F) -> Self {
        Self { rename }
    }
}
impl<V, W, F: FnMut(&V) -> W> VarSubst<V, W> for Renamer<F> {
    fn int_var(&mut self, _: SubCtx, var: &V) -> Res<IntExpr<W>> {
        Ok(IntExpr::Var((self.rename)(var)))
    }
    fn bool_var(&mut self, _: SubCtx, var: &V) -> Res<BoolExpr<W>> {
        Ok(BoolExpr::Var((self.rename)(var)))
    }
    fn array_var(
        &mut self,
        _: SubCtx,
        var: &V,
        elt: &Typ,
        len: Option<usize>,
    ) -> Res<ArrayExpr<W>> {
        Ok(ArrayExpr::var(elt.clone(), len, (self.rename)(var)))
    }
}

/// Renames the regular variables under a symbolic wrapper, descending into symbol arguments.
pub struct SymRenamer<F> {
    /// The underlying renaming over regular variables.
    rename: F,
}
impl<F> SymRenamer<F> {
    /// Constructor.
    pub fn new(rename: F) -> Self {
        Self { rename }
    }

    /// Renames one symbolic variable.
    pub fn sym<A, B>(&mut self, ctx: SubCtx, sym: &Sym<A>) -> Res<Sym<B>>
    where
        F: FnMut(&A) -> B,
    {
        match sym {
            Sym::Reg(var) => Ok(Sym::Reg((self.rename)(var))),
            Sym::Sym(func) => {
                let params = func
                    .params
                    .iter()
                    .map(|arg| any_expr(self, ctx, arg))
                    .collect::<Res<Vec<_>>>()?;
                Ok(Sym::sym(&func.name, params))
            }
        }
    }
}
impl<A, B, F: FnMut(&A) -> B> VarSubst<Sym<A>, Sym<B>> for SymRenamer<F> {
    fn int_var(&mut self, ctx: SubCtx, var: &Sym<A>) -> Res<IntExpr<Sym<B>>> {
        Ok(IntExpr::Var(self.sym(ctx, var)?))
    }
    fn bool_var(&mut self, ctx: SubCtx, var: &Sym<A>) -> Res<BoolExpr<Sym<B>>> {
        Ok(BoolExpr::Var(self.sym(ctx, var)?))
    }
    fn array_var(
        &mut self,
        ctx: SubCtx,
        var: &Sym<A>,
        elt: &Typ,
        len: Option<usize>,
    ) -> Res<ArrayExpr<Sym<B>>> {
        Ok(ArrayExpr::var(elt.clone(), len, self.sym(ctx, var)?))
    }
}

/// Replaces Boolean symbols by their position-appropriate approximation.
///
/// In a positive position an opaque predicate is over-approximated by `true`; in a negative one it
/// is under-approximated by `false`. Regular variables, and symbols in non-Boolean positions, are
/// left untouched.
pub struct Approx;
impl VarSubst<Sym<MarkedVar>, Sym<MarkedVar>> for Approx {
    fn int_var(&mut self, _: SubCtx, var: &Sym<MarkedVar>) -> Res<IntExpr<Sym<MarkedVar>>> {
        Ok(IntExpr::Var(var.clone()))
    }
    fn bool_var(&mut self, ctx: SubCtx, var: &Sym<MarkedVar>) -> Res<BoolExpr<Sym<MarkedVar>>> {
        match var {
            Sym::Reg(_) => Ok(BoolExpr::Var(var.clone())),
            Sym::Sym(_) => match ctx.sign {
                Sign::Positive => Ok(BoolExpr::Lit(true)),
                Sign::Negative => Ok(BoolExpr::Lit(false)),
            },
        }
    }
    fn array_var(
        &mut self,
        _: SubCtx,
        var: &Sym<MarkedVar>,
        elt: &Typ,
        len: Option<usize>,
    ) -> Res<ArrayExpr<Sym<MarkedVar>>> {
        Ok(ArrayExpr::var(elt.clone(), len, var.clone()))
    }
}
