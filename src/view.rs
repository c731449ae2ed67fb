//! Guarded views and view prototypes.
//!
//! A *view* is a thread's knowledge of the shared state, written `{| v |}` in source. After
//! desugaring and modelling, a view is a [`GView`]: a multiset of guarded view atoms. Multisets
//! matter: views are separation-style conjunctions, so duplicate instances are significant.

crate::prelude!();

use expr::{BoolExpr, Expr, Func, Typ};
use sub::{SubCtx, VarSubst};

/// An order-independent multiset.
///
/// Backed by a sorted vector, so that two multisets with the same elements compare equal whatever
/// the insertion order.
///
/// # Examples
///
/// ```rust
/// # use starling_api::view::Multiset;
/// let mut lft = Multiset::new();
/// lft.insert(2);
/// lft.insert(1);
/// lft.insert(2);
/// let rgt: Multiset<usize> = vec![2, 2, 1].into_iter().collect();
/// assert_eq!(lft, rgt);
/// assert_eq!(lft.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Multiset<T> {
    /// Elements, sorted.
    elems: Vec<T>,
}
impl<T: Ord> Multiset<T> {
    /// The empty multiset.
    pub fn new() -> Self {
        Self { elems: vec![] }
    }
    /// The multiset with a single element.
    pub fn singleton(elem: T) -> Self {
        Self { elems: vec![elem] }
    }

    /// Inserts an element, preserving duplicates.
    pub fn insert(&mut self, elem: T) {
        let pos = match self.elems.binary_search(&elem) {
            Ok(pos) | Err(pos) => pos,
        };
        self.elems.insert(pos, elem)
    }

    /// Multiset union: contains every instance from both sides.
    pub fn join(mut self, other: Self) -> Self {
        for elem in other.elems {
            self.insert(elem)
        }
        self
    }

    /// Number of elements, duplicates included.
    pub fn len(&self) -> usize {
        self.elems.len()
    }
    /// True if the multiset is empty.
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Iterator over the elements in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elems.iter()
    }

    /// Maps a function over all elements.
    pub fn map<U: Ord>(self, f: impl FnMut(T) -> U) -> Multiset<U> {
        self.elems.into_iter().map(f).collect()
    }

    /// Maps a fallible function over all elements.
    pub fn try_map<U: Ord>(self, mut f: impl FnMut(T) -> Res<U>) -> Res<Multiset<U>> {
        let mut res = Multiset::new();
        for elem in self.elems {
            res.insert(f(elem)?)
        }
        Ok(res)
    }

    /// Keeps the elements satisfying a predicate.
    pub fn retain(&mut self, f: impl FnMut(&T) -> bool) {
        self.elems.retain(f)
    }
}
impl<T: Ord> Default for Multiset<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T: Ord> std::iter::FromIterator<T> for Multiset<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut elems: Vec<T> = iter.into_iter().collect();
        elems.sort();
        Self { elems }
    }
}
impl<T> IntoIterator for Multiset<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.elems.into_iter()
    }
}
impl<T: fmt::Display> fmt::Display for Multiset<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        if self.elems.is_empty() {
            return write!(fmt, "emp");
        }
        for (idx, elem) in self.elems.iter().enumerate() {
            if idx > 0 {
                write!(fmt, " * ")?;
            }
            elem.fmt(fmt)?;
        }
        Ok(())
    }
}

/// A conditional item: `item` holds only when `cond` does.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Guarded<V, I> {
    /// The guard.
    pub cond: BoolExpr<V>,
    /// The item guarded.
    pub item: I,
}
impl<V, I> Guarded<V, I> {
    /// Constructor.
    pub fn new(cond: BoolExpr<V>, item: I) -> Self {
        Self { cond, item }
    }
    /// An unconditional item.
    pub fn always(item: I) -> Self {
        Self {
            cond: BoolExpr::Lit(true),
            item,
        }
    }

    /// Maps a function over the item, leaving the guard alone.
    pub fn map_item<J>(self, f: impl FnOnce(I) -> J) -> Guarded<V, J> {
        Guarded {
            cond: self.cond,
            item: f(self.item),
        }
    }
}
impl<V: fmt::Display, I: fmt::Display> fmt::Display for Guarded<V, I> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match &self.cond {
            BoolExpr::Lit(true) => self.item.fmt(fmt),
            cond => write!(fmt, "if {} {{ {} }}", cond, self.item),
        }
    }
}

/// A guarded view atom.
pub type GFunc<V> = Guarded<V, Func<Expr<V>>>;

/// A guarded view: a multiset of guarded view atoms.
pub type GView<V> = Multiset<GFunc<V>>;

/// Substitutes through a guarded item.
///
/// The guard is an antecedent, so it is rewritten under the flipped context; the item keeps the
/// context unchanged.
pub fn gfunc_sub<V, W, S>(subst: &mut S, ctx: SubCtx, gfunc: &GFunc<V>) -> Res<GFunc<W>>
where
    S: VarSubst<V, W> + ?Sized,
{
    let cond = sub::bool_expr(subst, ctx.flip(), &gfunc.cond)?;
    let params = gfunc
        .item
        .params
        .iter()
        .map(|param| sub::any_expr(subst, ctx, param))
        .collect::<Res<Vec<_>>>()?;
    Ok(Guarded::new(cond, Func::new(&gfunc.item.name, params)))
}

/// Substitutes through a whole guarded view.
pub fn gview_sub<V, W, S>(subst: &mut S, ctx: SubCtx, view: &GView<V>) -> Res<GView<W>>
where
    V: Ord,
    W: Ord,
    S: VarSubst<V, W> + ?Sized,
{
    let mut res = Multiset::new();
    for gfunc in view.iter() {
        res.insert(gfunc_sub(subst, ctx, gfunc)?)
    }
    Ok(res)
}

/// Prunes a guarded view.
///
/// Simplifies every guard; atoms whose guard simplifies to `false` are dropped.
pub fn prune<V: Clone + Ord>(view: GView<V>) -> GView<V> {
    let mut res = Multiset::new();
    for gfunc in view {
        match gfunc.cond.simp() {
            BoolExpr::Lit(false) => (),
            cond => res.insert(Guarded::new(cond, gfunc.item)),
        }
    }
    res
}

/// A view prototype: a named, typed parameter list declaring a view shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ViewProto {
    /// Name and typed parameters.
    pub view: Func<(Typ, String)>,
    /// True if the prototype was synthesized rather than declared.
    pub is_anonymous: bool,
    /// Iterator count parameter, for iterated prototypes.
    pub iterator: Option<String>,
}
impl ViewProto {
    /// Plain prototype constructor.
    pub fn new<S: Into<String>>(name: S, params: Vec<(Typ, String)>) -> Self {
        Self {
            view: Func::new(name, params),
            is_anonymous: false,
            iterator: None,
        }
    }
    /// Anonymous (synthesized) prototype constructor.
    pub fn anonymous<S: Into<String>>(name: S, params: Vec<(Typ, String)>) -> Self {
        Self {
            view: Func::new(name, params),
            is_anonymous: true,
            iterator: None,
        }
    }
    /// Iterated prototype constructor.
    pub fn iterated<S: Into<String>>(
        name: S,
        params: Vec<(Typ, String)>,
        iterator: impl Into<String>,
    ) -> Self {
        Self {
            view: Func::new(name, params),
            is_anonymous: false,
            iterator: Some(iterator.into()),
        }
    }

    /// Name accessor.
    pub fn name(&self) -> &str {
        &self.view.name
    }
    /// Typed parameter accessor.
    pub fn params(&self) -> &[(Typ, String)] {
        &self.view.params
    }
}
impl fmt::Display for ViewProto {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "view ")?;
        if let Some(iterator) = &self.iterator {
            write!(fmt, "iter[{}] ", iterator)?;
        }
        write!(fmt, "{}(", self.view.name)?;
        for (idx, (typ, id)) in self.view.params.iter().enumerate() {
            if idx > 0 {
                write!(fmt, ", ")?;
            }
            write!(fmt, "{} {}", typ, id)?;
        }
        write!(fmt, ")")
    }
}

/// A view expression: a view, plus how much the prover must trust it.
///
/// `Mandatory` views come from user annotations and must be established; `Advisory` views were
/// synthesized to fill an annotation gap, and the solver is free to weaken them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ViewExpr<V> {
    /// A view that must hold as written.
    Mandatory(V),
    /// A synthesized view the solver may weaken.
    Advisory(V),
}
impl<V> ViewExpr<V> {
    /// The underlying view, dropping the trust marker.
    pub fn inner(&self) -> &V {
        match self {
            Self::Mandatory(view) | Self::Advisory(view) => view,
        }
    }
    /// The underlying view, by value.
    pub fn into_inner(self) -> V {
        match self {
            Self::Mandatory(view) | Self::Advisory(view) => view,
        }
    }

    /// Maps a function over the underlying view.
    pub fn map<W>(self, f: impl FnOnce(V) -> W) -> ViewExpr<W> {
        match self {
            Self::Mandatory(view) => ViewExpr::Mandatory(f(view)),
            Self::Advisory(view) => ViewExpr::Advisory(f(view)),
        }
    }

    /// Maps a fallible function over the underlying view.
    pub fn try_map<W>(self, f: impl FnOnce(V) -> Res<W>) -> Res<ViewExpr<W>> {
        match self {
            Self::Mandatory(view) => Ok(ViewExpr::Mandatory(f(view)?)),
            Self::Advisory(view) => Ok(ViewExpr::Advisory(f(view)?)),
        }
    }
}
impl<V: fmt::Display> fmt::Display for ViewExpr<V> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Mandatory(view) => write!(fmt, "{{| {} |}}", view),
            Self::Advisory(view) => write!(fmt, "{{| {} ? |}}", view),
        }
    }
}
