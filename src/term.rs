//! Verification-term construction, and the whole-pipeline entry point.
//!
//! A [`Term`] is the proof obligation `wpre ∧ cmd ⇒ goal`: the weakest-precondition view and the
//! command's two-state semantics on the left, a goal view on the right. One term is produced for
//! every (axiom, goal view) pair; goal views instantiate the model's prototypes with
//! `Goal`-marked parameters, numbered by a shared fresh-index generator.

crate::prelude!();

use expr::{BoolExpr, Expr, FreshGen, Func, MarkedVar, Sym, Typ, Var};
use model::Model;
use semantics::PrimSemanticsMap;
use sub::{Approx, SubCtx, SymRenamer, VarSubst};
use view::{GView, ViewProto};

#[cfg(test)]
mod test;

/// A verification condition: `wpre ∧ cmd ⇒ goal`.
#[readonly::make]
#[derive(Debug, Clone)]
pub struct Term {
    /// The command's two-state semantics.
    pub cmd: BoolExpr<Sym<MarkedVar>>,
    /// The weakest-precondition view, over pre-state variables.
    pub wpre: GView<Sym<MarkedVar>>,
    /// The goal view.
    pub goal: Func<Expr<Sym<MarkedVar>>>,
}
impl Term {
    /// Applies a variable substitution uniformly across all three parts.
    ///
    /// The term reads `wpre ∧ cmd ⇒ goal`, so the precondition and command are rewritten under a
    /// negative context and the goal under a positive one.
    pub fn sub_vars<S>(&self, subst: &mut S) -> Res<Term>
    where
        S: VarSubst<Sym<MarkedVar>, Sym<MarkedVar>>,
    {
        let mut run = || -> Res<Term> {
            let cmd = sub::bool_expr(subst, SubCtx::negative(), &self.cmd)?;
            let wpre = view::gview_sub(subst, SubCtx::negative(), &self.wpre)?;
            let params = self
                .goal
                .params
                .iter()
                .map(|param| sub::any_expr(subst, SubCtx::positive(), param))
                .collect::<Res<Vec<_>>>()?;
            Ok(Term {
                cmd,
                wpre,
                goal: Func::new(&self.goal.name, params),
            })
        };
        run().chain_err(|| ErrorKind::Traversal("substitution over a term".into()))
    }

    /// Replaces every Boolean symbol by its position-appropriate approximation.
    pub fn approx(&self) -> Res<Term> {
        self.sub_vars(&mut Approx)
    }
}
impl fmt::Display for Term {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{} ⋀ {} ⇒ {}", self.wpre, self.cmd, self.goal)
    }
}

/// The output of the core: a model of verification terms.
#[derive(Debug, Clone)]
pub struct TermModel {
    /// Shared variables, in declaration order.
    pub shared: Vec<(Typ, String)>,
    /// Thread-local variables, in declaration order.
    pub thread: Vec<(Typ, String)>,
    /// All view prototypes, declared and generated.
    pub protos: Vec<ViewProto>,
    /// Modelled constraints, for the solver-side backends.
    pub constraints: Vec<model::Constraint>,
    /// The verification terms.
    pub terms: Vec<Term>,
    /// Search-depth hint.
    pub search_depth: Option<usize>,
}
impl TermModel {
    /// Pretty, multi-line string representation.
    pub fn to_ml_string(&self) -> String {
        let mut s = String::new();
        s.push_str("terms:");
        for term in &self.terms {
            s.push_str(&format!("\n    {}", term));
        }
        s
    }
}

/// Marks every variable of a precondition view as pre-state.
fn mark_wpre(view: &GView<Sym<Var>>) -> Res<GView<Sym<MarkedVar>>> {
    let mut renamer = SymRenamer::new(|var: &Var| MarkedVar::Before(var.clone()));
    view::gview_sub(&mut renamer, SubCtx::negative(), view)
        .chain_err(|| ErrorKind::Traversal("pre-state marking of a precondition".into()))
}

/// Instantiates a prototype as the `goal`-th goal view.
fn goal_view(proto: &ViewProto, goal: usize) -> Func<Expr<Sym<MarkedVar>>> {
    let params = proto
        .params()
        .iter()
        .map(|(typ, id)| {
            Expr::of_var(
                Sym::Reg(MarkedVar::Goal(goal, Var::new(id, typ.clone()))),
                typ,
            )
        })
        .collect();
    Func::new(proto.name(), params)
}

/// Builds the verification terms of a model: one per (axiom, prototype) pair.
pub fn terms_of_model(model: &Model) -> Res<Vec<Term>> {
    let vars = model.all_vars();
    let mut fresh = FreshGen::new();
    let mut terms = vec![];

    for axiom in &model.axioms {
        let sem = semantics::command_semantics(&model.semantics, &axiom.cmd, &vars)?;
        let wpre = mark_wpre(axiom.pre.inner())?;
        for proto in &model.protos {
            let goal = goal_view(proto, fresh.fresh());
            terms.push(Term {
                cmd: sem.semantics.clone(),
                wpre: wpre.clone(),
                goal,
            })
        }
    }

    Ok(terms)
}

/// Runs the front-to-middle-end pipeline over a collated script.
///
/// Desugars, models, and translates the script down to verification terms, using the base
/// primitive semantics.
pub fn obligations(script: &ast::CollatedScript) -> Res<TermModel> {
    obligations_with(script, semantics::base_semantics())
}

/// Same as [`obligations`], under a caller-supplied semantics map.
pub fn obligations_with(
    script: &ast::CollatedScript,
    semantics: PrimSemanticsMap,
) -> Res<TermModel> {
    let des = desugar::script(script)?;
    let model = model::model(&des, semantics)?;
    let terms = terms_of_model(&model)?;
    Ok(TermModel {
        shared: model.shared,
        thread: model.thread,
        protos: model.protos,
        constraints: model.constraints,
        terms,
        search_depth: model.search_depth,
    })
}
