//! Defines the typed expression structures used to represent predicates and commands.
//!
//! Expressions are split by type: [`IntExpr`] for arithmetic, [`BoolExpr`] for predicates and
//! [`ArrayExpr`] for array values, with [`Expr`] as the tagged union of the three. All of them are
//! polymorphic in the type of variables, which lets the same grammar range over plain [`Var`]s,
//! [`MarkedVar`]s (pre/post/intermediate/goal state) and [`Sym`]bolic variables.

crate::prelude!();

use rsmt2::print::{Expr2Smt, Sort2Smt, Sym2Smt};

#[cfg(test)]
mod test;

pub mod simp;

pub use crate::{build_bexpr, build_iexpr, build_typ, build_var};

/// A type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Typ {
    /// Bool type.
    Bool,
    /// Integer type.
    Int,
    /// Array type, with an element type and an optional length.
    Array {
        /// Type of the array's elements.
        elt: Box<Typ>,
        /// Length of the array, if known.
        len: Option<usize>,
    },
}
impl Typ {
    /// Creates a bool type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use starling_api::expr::Typ;
    /// let bool_typ = Typ::bool();
    /// assert_eq!(&bool_typ.to_string(), "bool")
    /// ```
    pub fn bool() -> Self {
        Self::Bool
    }
    /// Creates an integer type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use starling_api::expr::Typ;
    /// let int_typ = Typ::int();
    /// assert_eq!(&int_typ.to_string(), "int")
    /// ```
    pub fn int() -> Self {
        Self::Int
    }
    /// Creates an array type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use starling_api::expr::Typ;
    /// let arr_typ = Typ::array(Typ::int(), Some(10));
    /// assert_eq!(&arr_typ.to_string(), "int[10]")
    /// ```
    pub fn array(elt: Typ, len: Option<usize>) -> Self {
        Self::Array {
            elt: Box::new(elt),
            len,
        }
    }

    /// True if the type is an array type.
    pub fn is_array(&self) -> bool {
        match self {
            Self::Bool | Self::Int => false,
            Self::Array { .. } => true,
        }
    }

    /// True if two types agree.
    ///
    /// Two array types agree if their element types agree and their lengths are equal, where an
    /// unknown length agrees with anything.
    pub fn compatible(&self, other: &Typ) -> bool {
        match (self, other) {
            (Self::Bool, Self::Bool) | (Self::Int, Self::Int) => true,
            (
                Self::Array { elt: e_1, len: l_1 },
                Self::Array { elt: e_2, len: l_2 },
            ) => {
                e_1.compatible(e_2)
                    && match (l_1, l_2) {
                        (Some(l_1), Some(l_2)) => l_1 == l_2,
                        _ => true,
                    }
            }
            _ => false,
        }
    }
}
impl Sort2Smt for Typ {
    fn sort_to_smt2<W: Write>(&self, w: &mut W) -> SmtRes<()> {
        match self {
            Self::Bool => write!(w, "Bool")?,
            Self::Int => write!(w, "Int")?,
            Self::Array { elt, .. } => {
                write!(w, "(Array Int ")?;
                elt.sort_to_smt2(w)?;
                write!(w, ")")?;
            }
        }
        Ok(())
    }
}

/// Trait implemented by everything that has a type.
pub trait HasTyp: fmt::Display {
    /// Type accessor.
    fn typ(&self) -> Typ;
}

/// A plain variable.
///
/// # Examples
///
/// ```rust
/// # use starling_api::expr::{Var, Typ};
/// let var = Var::new("serving", Typ::Int);
/// assert_eq!(var.id(), "serving");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Var {
    /// Variable identifier.
    id: String,
    /// Type of the variable.
    typ: Typ,
}
impl Var {
    /// Constructor.
    pub fn new<S: Into<String>>(id: S, typ: Typ) -> Self {
        Self { id: id.into(), typ }
    }

    /// Identifier accessor.
    pub fn id(&self) -> &str {
        &self.id
    }
}
impl HasTyp for Var {
    fn typ(&self) -> Typ {
        self.typ.clone()
    }
}

/// A variable tagged by the role it plays in a two-state predicate.
///
/// A command's semantics relates a pre-state to a post-state; a variable occurrence must say which
/// state it reads. `Intermediate` variables belong to internal stages of a sequential composition,
/// and `Goal` variables to (the parameters of) a numbered goal view.
///
/// # Examples
///
/// ```rust
/// # use starling_api::expr::{MarkedVar, Var, Typ};
/// let var = Var::new("ticket", Typ::Int);
/// assert_eq!(&MarkedVar::Before(var.clone()).to_string(), "ticket!before");
/// assert_eq!(&MarkedVar::After(var.clone()).to_string(), "ticket!after");
/// assert_eq!(&MarkedVar::Intermediate(0, var.clone()).to_string(), "ticket!int!0");
/// assert_eq!(&MarkedVar::Goal(2, var).to_string(), "ticket!goal!2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum MarkedVar {
    /// A variable not tied to any state.
    Unmarked(Var),
    /// Pre-state variable.
    Before(Var),
    /// Post-state variable.
    After(Var),
    /// Variable of stage `n` of a sequential composition.
    Intermediate(Stage, Var),
    /// Variable belonging to the `n`-th goal view.
    Goal(usize, Var),
}
impl MarkedVar {
    /// The underlying variable.
    pub fn var(&self) -> &Var {
        match self {
            Self::Unmarked(var)
            | Self::Before(var)
            | Self::After(var)
            | Self::Intermediate(_, var)
            | Self::Goal(_, var) => var,
        }
    }

    /// True if the variable is a post-state variable.
    pub fn is_after(&self) -> bool {
        match self {
            Self::After(_) => true,
            _ => false,
        }
    }
}
impl HasTyp for MarkedVar {
    fn typ(&self) -> Typ {
        self.var().typ()
    }
}
impl Sym2Smt<()> for MarkedVar {
    fn sym_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
        write!(w, "{}", self)?;
        Ok(())
    }
}

/// A function application shape: a name and an ordered parameter list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Func<T> {
    /// Name of the function.
    pub name: String,
    /// Ordered parameters.
    pub params: Vec<T>,
}
impl<T> Func<T> {
    /// Constructor.
    pub fn new<S: Into<String>>(name: S, params: Vec<T>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}
impl<T: fmt::Display> fmt::Display for Func<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}(", self.name)?;
        for (idx, param) in self.params.iter().enumerate() {
            if idx > 0 {
                write!(fmt, ", ")?;
            }
            param.fmt(fmt)?;
        }
        write!(fmt, ")")
    }
}

/// A possibly-symbolic variable.
///
/// A `Sym` is either a regular variable or a symbolic function: an opaque predicate the tool
/// cannot interpret but can substitute through. Symbolic arguments are full expressions over
/// `Sym<V>` itself, so traversals must descend into them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Sym<V> {
    /// A regular variable.
    Reg(V),
    /// A symbolic function.
    Sym(Func<Expr<Sym<V>>>),
}
impl<V> Sym<V> {
    /// Symbolic function constructor.
    pub fn sym<S: Into<String>>(name: S, args: Vec<Expr<Sym<V>>>) -> Self {
        Self::Sym(Func::new(name, args))
    }

    /// Applies `f` to every regular variable in `self`, descending into symbol arguments.
    pub fn collect_regs(&self, f: &mut dyn FnMut(&V)) {
        match self {
            Self::Reg(var) => f(var),
            Self::Sym(func) => {
                for arg in &func.params {
                    arg.collect_vars(&mut |sym: &Sym<V>| sym.collect_regs(f))
                }
            }
        }
    }
}
impl<V: Sym2Smt<()>> Sym2Smt<()> for Sym<V> {
    fn sym_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
        match self {
            Self::Reg(var) => var.sym_to_smt2(w, ()),
            Self::Sym(func) => {
                if func.params.is_empty() {
                    write!(w, "{}", func.name)?;
                } else {
                    write!(w, "({}", func.name)?;
                    for arg in &func.params {
                        write!(w, " ")?;
                        arg.expr_to_smt2(w, ())?;
                    }
                    write!(w, ")")?;
                }
                Ok(())
            }
        }
    }
}

/// An integer expression.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum IntExpr<V> {
    /// An integer variable.
    Var(V),
    /// An integer literal.
    Lit(Int),
    /// N-ary addition.
    Add(Vec<IntExpr<V>>),
    /// N-ary subtraction.
    Sub(Vec<IntExpr<V>>),
    /// N-ary multiplication.
    Mul(Vec<IntExpr<V>>),
    /// Integer division.
    Div(Box<IntExpr<V>>, Box<IntExpr<V>>),
    /// Integer remainder.
    Mod(Box<IntExpr<V>>, Box<IntExpr<V>>),
    /// Subscript of an integer-element array.
    Idx {
        /// The array subscripted.
        arr: Box<ArrayExpr<V>>,
        /// The index.
        idx: Box<IntExpr<V>>,
    },
}
impl<V> IntExpr<V> {
    /// Literal constructor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use starling_api::expr::{IntExpr, Var};
    /// let five: IntExpr<Var> = IntExpr::lit(5);
    /// assert_eq!(&five.to_string(), "5");
    /// ```
    pub fn lit<I: Into<Int>>(i: I) -> Self {
        Self::Lit(i.into())
    }

    /// Subscript constructor.
    ///
    /// Fails if the array's elements are not integers.
    pub fn idx(arr: ArrayExpr<V>, idx: IntExpr<V>) -> Res<Self> {
        if arr.elt() != &Typ::Int {
            bail!(ErrorKind::BadSemantics(format!(
                "integer subscript of an array with `{}` elements",
                arr.elt(),
            )))
        }
        Ok(Self::Idx {
            arr: Box::new(arr),
            idx: Box::new(idx),
        })
    }

    /// Applies `f` to every variable in the expression.
    pub fn collect_vars(&self, f: &mut dyn FnMut(&V)) {
        match self {
            Self::Var(var) => f(var),
            Self::Lit(_) => (),
            Self::Add(ops) | Self::Sub(ops) | Self::Mul(ops) => {
                for op in ops {
                    op.collect_vars(f)
                }
            }
            Self::Div(lft, rgt) | Self::Mod(lft, rgt) => {
                lft.collect_vars(f);
                rgt.collect_vars(f)
            }
            Self::Idx { arr, idx } => {
                arr.collect_vars(f);
                idx.collect_vars(f)
            }
        }
    }
}

/// A Boolean expression.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum BoolExpr<V> {
    /// A Boolean variable.
    Var(V),
    /// A Boolean literal.
    Lit(bool),
    /// N-ary conjunction.
    And(Vec<BoolExpr<V>>),
    /// N-ary disjunction.
    Or(Vec<BoolExpr<V>>),
    /// Implication.
    Implies(Box<BoolExpr<V>>, Box<BoolExpr<V>>),
    /// Negation.
    Not(Box<BoolExpr<V>>),
    /// Equality between two expressions of agreeing types.
    Eq(Box<Expr<V>>, Box<Expr<V>>),
    /// Strictly-greater-than comparison.
    Gt(Box<IntExpr<V>>, Box<IntExpr<V>>),
    /// Greater-than-or-equal comparison.
    Ge(Box<IntExpr<V>>, Box<IntExpr<V>>),
    /// Less-than-or-equal comparison.
    Le(Box<IntExpr<V>>, Box<IntExpr<V>>),
    /// Strictly-less-than comparison.
    Lt(Box<IntExpr<V>>, Box<IntExpr<V>>),
    /// Subscript of a Boolean-element array.
    Idx {
        /// The array subscripted.
        arr: Box<ArrayExpr<V>>,
        /// The index.
        idx: Box<IntExpr<V>>,
    },
}
impl<V> BoolExpr<V> {
    /// Literal constructor.
    pub fn lit(b: bool) -> Self {
        Self::Lit(b)
    }
    /// Negation constructor.
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }
    /// Implication constructor.
    pub fn implies(lhs: Self, rhs: Self) -> Self {
        Self::Implies(Box::new(lhs), Box::new(rhs))
    }

    /// Equality constructor.
    ///
    /// Fails if the two sides have incompatible types.
    pub fn eq(lft: Expr<V>, rgt: Expr<V>) -> Res<Self> {
        let (l_typ, r_typ) = (lft.typ(), rgt.typ());
        if !l_typ.compatible(&r_typ) {
            bail!(ErrorKind::TypeMismatch(
                "=".into(),
                l_typ.to_string(),
                r_typ.to_string(),
            ))
        }
        Ok(Self::Eq(Box::new(lft), Box::new(rgt)))
    }

    /// Subscript constructor.
    ///
    /// Fails if the array's elements are not Booleans.
    pub fn idx(arr: ArrayExpr<V>, idx: IntExpr<V>) -> Res<Self> {
        if arr.elt() != &Typ::Bool {
            bail!(ErrorKind::BadSemantics(format!(
                "Boolean subscript of an array with `{}` elements",
                arr.elt(),
            )))
        }
        Ok(Self::Idx {
            arr: Box::new(arr),
            idx: Box::new(idx),
        })
    }

    /// Applies `f` to every variable in the expression.
    pub fn collect_vars(&self, f: &mut dyn FnMut(&V)) {
        match self {
            Self::Var(var) => f(var),
            Self::Lit(_) => (),
            Self::And(ops) | Self::Or(ops) => {
                for op in ops {
                    op.collect_vars(f)
                }
            }
            Self::Implies(lft, rgt) => {
                lft.collect_vars(f);
                rgt.collect_vars(f)
            }
            Self::Not(arg) => arg.collect_vars(f),
            Self::Eq(lft, rgt) => {
                lft.collect_vars(f);
                rgt.collect_vars(f)
            }
            Self::Gt(lft, rgt) | Self::Ge(lft, rgt) | Self::Le(lft, rgt) | Self::Lt(lft, rgt) => {
                lft.collect_vars(f);
                rgt.collect_vars(f)
            }
            Self::Idx { arr, idx } => {
                arr.collect_vars(f);
                idx.collect_vars(f)
            }
        }
    }

    /// The set of variables mentioned in the expression.
    pub fn vars(&self) -> Set<V>
    where
        V: Clone + Ord,
    {
        let mut set = Set::new();
        self.collect_vars(&mut |var| {
            set.insert(var.clone());
        });
        set
    }
}

/// An array expression.
///
/// Every node carries the element type and optional length of the array value it denotes, so that
/// subscripts can be typed without an environment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ArrayExpr<V> {
    /// An array variable.
    Var {
        /// Element type.
        elt: Typ,
        /// Optional length.
        len: Option<usize>,
        /// The variable itself.
        var: V,
    },
    /// Subscript of an array-element array.
    Idx {
        /// Element type of the *result*.
        elt: Typ,
        /// Optional length of the *result*.
        len: Option<usize>,
        /// The array subscripted.
        arr: Box<ArrayExpr<V>>,
        /// The index.
        idx: Box<IntExpr<V>>,
    },
    /// Functional update: the array equal to `arr` everywhere except at `idx`, where it is `val`.
    Upd {
        /// Element type.
        elt: Typ,
        /// Optional length.
        len: Option<usize>,
        /// The array updated.
        arr: Box<ArrayExpr<V>>,
        /// The index updated.
        idx: Box<IntExpr<V>>,
        /// The new value.
        val: Box<Expr<V>>,
    },
}
impl<V> ArrayExpr<V> {
    /// Array-variable constructor.
    pub fn var(elt: Typ, len: Option<usize>, var: V) -> Self {
        Self::Var { elt, len, var }
    }

    /// Subscript constructor, for subscripts denoting arrays.
    ///
    /// Fails if the elements of `arr` are not themselves arrays.
    pub fn idx(arr: ArrayExpr<V>, idx: IntExpr<V>) -> Res<Self> {
        match arr.elt().clone() {
            Typ::Array { elt, len } => Ok(Self::Idx {
                elt: *elt,
                len,
                arr: Box::new(arr),
                idx: Box::new(idx),
            }),
            typ => bail!(ErrorKind::BadSemantics(format!(
                "array subscript of an array with `{}` elements",
                typ,
            ))),
        }
    }

    /// Update constructor.
    ///
    /// Fails if `val`'s type does not agree with the element type of `arr`.
    pub fn upd(arr: ArrayExpr<V>, idx: IntExpr<V>, val: Expr<V>) -> Res<Self> {
        let (elt, len) = (arr.elt().clone(), arr.len());
        if !val.typ().compatible(&elt) {
            bail!(ErrorKind::TypeMismatch(
                "store".into(),
                elt.to_string(),
                val.typ().to_string(),
            ))
        }
        Ok(Self::Upd {
            elt,
            len,
            arr: Box::new(arr),
            idx: Box::new(idx),
            val: Box::new(val),
        })
    }

    /// Element type of the array denoted by this expression.
    pub fn elt(&self) -> &Typ {
        match self {
            Self::Var { elt, .. } | Self::Idx { elt, .. } | Self::Upd { elt, .. } => elt,
        }
    }
    /// Length of the array denoted by this expression, if known.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Var { len, .. } | Self::Idx { len, .. } | Self::Upd { len, .. } => *len,
        }
    }
    /// Type of the array denoted by this expression.
    pub fn typ(&self) -> Typ {
        Typ::array(self.elt().clone(), self.len())
    }

    /// Applies `f` to every variable in the expression.
    pub fn collect_vars(&self, f: &mut dyn FnMut(&V)) {
        match self {
            Self::Var { var, .. } => f(var),
            Self::Idx { arr, idx, .. } => {
                arr.collect_vars(f);
                idx.collect_vars(f)
            }
            Self::Upd { arr, idx, val, .. } => {
                arr.collect_vars(f);
                idx.collect_vars(f);
                val.collect_vars(f)
            }
        }
    }
}

/// The tagged union of the three expression grammars.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Expr<V> {
    /// An integer expression.
    Int(IntExpr<V>),
    /// A Boolean expression.
    Bool(BoolExpr<V>),
    /// An array expression.
    Array(ArrayExpr<V>),
}
impl<V> Expr<V> {
    /// Builds the expression reading variable `var` at type `typ`.
    pub fn of_var(var: V, typ: &Typ) -> Self {
        match typ {
            Typ::Int => Self::Int(IntExpr::Var(var)),
            Typ::Bool => Self::Bool(BoolExpr::Var(var)),
            Typ::Array { elt, len } => {
                Self::Array(ArrayExpr::var((**elt).clone(), *len, var))
            }
        }
    }

    /// Type of the expression.
    ///
    /// Note that this only inspects the toplevel tag (and array type annotations): it needs no
    /// typing environment for the variables.
    pub fn typ(&self) -> Typ {
        match self {
            Self::Int(_) => Typ::Int,
            Self::Bool(_) => Typ::Bool,
            Self::Array(arr) => arr.typ(),
        }
    }

    /// Extracts an integer expression, if the tag matches.
    pub fn into_int(self) -> Option<IntExpr<V>> {
        match self {
            Self::Int(e) => Some(e),
            _ => None,
        }
    }
    /// Extracts a Boolean expression, if the tag matches.
    pub fn into_bool(self) -> Option<BoolExpr<V>> {
        match self {
            Self::Bool(e) => Some(e),
            _ => None,
        }
    }
    /// Extracts an array expression, if the tag matches.
    pub fn into_array(self) -> Option<ArrayExpr<V>> {
        match self {
            Self::Array(e) => Some(e),
            _ => None,
        }
    }

    /// Applies `f` to every variable in the expression.
    pub fn collect_vars(&self, f: &mut dyn FnMut(&V)) {
        match self {
            Self::Int(e) => e.collect_vars(f),
            Self::Bool(e) => e.collect_vars(f),
            Self::Array(e) => e.collect_vars(f),
        }
    }
}

/// Generates fresh indices for composition stages and goal views.
///
/// This is a plain monotonic counter: it is deterministic, and **not** thread-safe. All callers
/// working on the same model must share one.
#[derive(Debug, Clone, Default)]
pub struct FreshGen {
    /// Next index.
    next: usize,
}
impl FreshGen {
    /// Constructor.
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Yields a fresh index.
    pub fn fresh(&mut self) -> usize {
        let next = self.next;
        self.next += 1;
        next
    }
}

/// Packs basic trait implementations.
mod trait_impls {
    use super::*;

    impl fmt::Display for Typ {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::Bool => write!(fmt, "bool"),
                Self::Int => write!(fmt, "int"),
                Self::Array { elt, len } => {
                    elt.fmt(fmt)?;
                    match len {
                        Some(len) => write!(fmt, "[{}]", len),
                        None => write!(fmt, "[]"),
                    }
                }
            }
        }
    }

    impl fmt::Display for Var {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            write!(fmt, "{}", self.id)
        }
    }

    impl fmt::Display for MarkedVar {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::Unmarked(var) => var.fmt(fmt),
                Self::Before(var) => write!(fmt, "{}!before", var),
                Self::After(var) => write!(fmt, "{}!after", var),
                Self::Intermediate(stage, var) => write!(fmt, "{}!int!{}", var, stage),
                Self::Goal(goal, var) => write!(fmt, "{}!goal!{}", var, goal),
            }
        }
    }

    impl<V: fmt::Display> fmt::Display for Sym<V> {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::Reg(var) => var.fmt(fmt),
                Self::Sym(func) => write!(fmt, "%{{{}}}", func),
            }
        }
    }

    impl<V: fmt::Display> fmt::Display for IntExpr<V> {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::Var(var) => var.fmt(fmt),
                Self::Lit(i) => {
                    if i.sign() == Sign::Minus {
                        write!(fmt, "(- {})", -i)
                    } else {
                        i.fmt(fmt)
                    }
                }
                Self::Add(ops) => write_app(fmt, "+", ops),
                Self::Sub(ops) => write_app(fmt, "-", ops),
                Self::Mul(ops) => write_app(fmt, "*", ops),
                Self::Div(lft, rgt) => write!(fmt, "(div {} {})", lft, rgt),
                Self::Mod(lft, rgt) => write!(fmt, "(mod {} {})", lft, rgt),
                Self::Idx { arr, idx } => write!(fmt, "(select {} {})", arr, idx),
            }
        }
    }

    impl<V: fmt::Display> fmt::Display for BoolExpr<V> {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::Var(var) => var.fmt(fmt),
                Self::Lit(b) => b.fmt(fmt),
                Self::And(ops) => write_app(fmt, "and", ops),
                Self::Or(ops) => write_app(fmt, "or", ops),
                Self::Implies(lft, rgt) => write!(fmt, "(=> {} {})", lft, rgt),
                Self::Not(arg) => write!(fmt, "(not {})", arg),
                Self::Eq(lft, rgt) => write!(fmt, "(= {} {})", lft, rgt),
                Self::Gt(lft, rgt) => write!(fmt, "(> {} {})", lft, rgt),
                Self::Ge(lft, rgt) => write!(fmt, "(>= {} {})", lft, rgt),
                Self::Le(lft, rgt) => write!(fmt, "(<= {} {})", lft, rgt),
                Self::Lt(lft, rgt) => write!(fmt, "(< {} {})", lft, rgt),
                Self::Idx { arr, idx } => write!(fmt, "(select {} {})", arr, idx),
            }
        }
    }

    impl<V: fmt::Display> fmt::Display for ArrayExpr<V> {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::Var { var, .. } => var.fmt(fmt),
                Self::Idx { arr, idx, .. } => write!(fmt, "(select {} {})", arr, idx),
                Self::Upd { arr, idx, val, .. } => write!(fmt, "(store {} {} {})", arr, idx, val),
            }
        }
    }

    impl<V: fmt::Display> fmt::Display for Expr<V> {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::Int(e) => e.fmt(fmt),
                Self::Bool(e) => e.fmt(fmt),
                Self::Array(e) => e.fmt(fmt),
            }
        }
    }

    /// Writes an s-expression application.
    fn write_app<T: fmt::Display>(fmt: &mut fmt::Formatter, op: &str, args: &[T]) -> fmt::Result {
        write!(fmt, "({}", op)?;
        for arg in args {
            write!(fmt, " {}", arg)?
        }
        write!(fmt, ")")
    }
}

/// Packs the SMT-LIB printers.
///
/// These make expressions over symbolic marked variables directly assertable on any [`rsmt2`]
/// solver; the actual solver driver lives outside this crate.
mod smt_impls {
    use super::*;

    impl<V: Sym2Smt<()>> Expr2Smt<()> for IntExpr<V> {
        fn expr_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
            match self {
                Self::Var(var) => var.sym_to_smt2(w, ())?,
                Self::Lit(i) => {
                    if i.sign() == Sign::Minus {
                        write!(w, "(- {})", -i)?
                    } else {
                        write!(w, "{}", i)?
                    }
                }
                Self::Add(ops) => write_smt_app(w, "+", ops)?,
                Self::Sub(ops) => write_smt_app(w, "-", ops)?,
                Self::Mul(ops) => write_smt_app(w, "*", ops)?,
                Self::Div(lft, rgt) => write_smt_bin(w, "div", &**lft, &**rgt)?,
                Self::Mod(lft, rgt) => write_smt_bin(w, "mod", &**lft, &**rgt)?,
                Self::Idx { arr, idx } => {
                    write!(w, "(select ")?;
                    arr.expr_to_smt2(w, ())?;
                    write!(w, " ")?;
                    idx.expr_to_smt2(w, ())?;
                    write!(w, ")")?;
                }
            }
            Ok(())
        }
    }

    impl<V: Sym2Smt<()>> Expr2Smt<()> for BoolExpr<V> {
        fn expr_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
            match self {
                Self::Var(var) => var.sym_to_smt2(w, ())?,
                Self::Lit(b) => write!(w, "{}", b)?,
                Self::And(ops) => {
                    if ops.is_empty() {
                        write!(w, "true")?
                    } else {
                        write_smt_app(w, "and", ops)?
                    }
                }
                Self::Or(ops) => {
                    if ops.is_empty() {
                        write!(w, "false")?
                    } else {
                        write_smt_app(w, "or", ops)?
                    }
                }
                Self::Implies(lft, rgt) => write_smt_bin(w, "=>", &**lft, &**rgt)?,
                Self::Not(arg) => {
                    write!(w, "(not ")?;
                    arg.expr_to_smt2(w, ())?;
                    write!(w, ")")?;
                }
                Self::Eq(lft, rgt) => write_smt_bin(w, "=", &**lft, &**rgt)?,
                Self::Gt(lft, rgt) => write_smt_bin(w, ">", &**lft, &**rgt)?,
                Self::Ge(lft, rgt) => write_smt_bin(w, ">=", &**lft, &**rgt)?,
                Self::Le(lft, rgt) => write_smt_bin(w, "<=", &**lft, &**rgt)?,
                Self::Lt(lft, rgt) => write_smt_bin(w, "<", &**lft, &**rgt)?,
                Self::Idx { arr, idx } => {
                    write!(w, "(select ")?;
                    arr.expr_to_smt2(w, ())?;
                    write!(w, " ")?;
                    idx.expr_to_smt2(w, ())?;
                    write!(w, ")")?;
                }
            }
            Ok(())
        }
    }

    impl<V: Sym2Smt<()>> Expr2Smt<()> for ArrayExpr<V> {
        fn expr_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
            match self {
                Self::Var { var, .. } => var.sym_to_smt2(w, ())?,
                Self::Idx { arr, idx, .. } => {
                    write!(w, "(select ")?;
                    arr.expr_to_smt2(w, ())?;
                    write!(w, " ")?;
                    idx.expr_to_smt2(w, ())?;
                    write!(w, ")")?;
                }
                Self::Upd { arr, idx, val, .. } => {
                    write!(w, "(store ")?;
                    arr.expr_to_smt2(w, ())?;
                    write!(w, " ")?;
                    idx.expr_to_smt2(w, ())?;
                    write!(w, " ")?;
                    val.expr_to_smt2(w, ())?;
                    write!(w, ")")?;
                }
            }
            Ok(())
        }
    }

    impl<V: Sym2Smt<()>> Expr2Smt<()> for Expr<V> {
        fn expr_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
            match self {
                Self::Int(e) => e.expr_to_smt2(w, ()),
                Self::Bool(e) => e.expr_to_smt2(w, ()),
                Self::Array(e) => e.expr_to_smt2(w, ()),
            }
        }
    }

    /// Writes an n-ary SMT-LIB application.
    fn write_smt_app<W: Write, T: Expr2Smt<()>>(w: &mut W, op: &str, args: &[T]) -> SmtRes<()> {
        write!(w, "({}", op)?;
        for arg in args {
            write!(w, " ")?;
            arg.expr_to_smt2(w, ())?;
        }
        write!(w, ")")?;
        Ok(())
    }

    /// Writes a binary SMT-LIB application.
    fn write_smt_bin<W: Write, T1: Expr2Smt<()>, T2: Expr2Smt<()>>(
        w: &mut W,
        op: &str,
        lft: &T1,
        rgt: &T2,
    ) -> SmtRes<()> {
        write!(w, "({} ", op)?;
        lft.expr_to_smt2(w, ())?;
        write!(w, " ")?;
        rgt.expr_to_smt2(w, ())?;
        write!(w, ")")?;
        Ok(())
    }
}
