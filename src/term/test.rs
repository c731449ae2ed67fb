//! Tests over term construction.

crate::prelude!();

use expr::{BoolExpr, Expr, IntExpr, MarkedVar, Sym, Typ, Var};
use model::{Axiom, Model};
use sub::{Approx, SubCtx};
use view::{Guarded, Multiset, ViewExpr, ViewProto};

/// A one-axiom, two-prototype model over `shared int serving; thread int t`.
fn tiny_model(guard: BoolExpr<Sym<Var>>) -> Model {
    let hold_tick = expr::Func::new(
        "holdTick",
        vec![Expr::Int(IntExpr::Var(Sym::Reg(Var::new("t", Typ::Int))))],
    );
    let pre = ViewExpr::Mandatory(Multiset::singleton(Guarded::new(guard, hold_tick)));
    let axiom = Axiom {
        pre: pre.clone(),
        cmd: vec![],
        post: pre,
    };
    Model {
        shared: vec![(Typ::Int, "serving".to_string())],
        thread: vec![(Typ::Int, "t".to_string())],
        protos: vec![
            ViewProto::new("holdTick", vec![(Typ::Int, "t".to_string())]),
            ViewProto::new("holdLock", vec![]),
        ],
        constraints: vec![],
        axioms: vec![axiom],
        semantics: semantics::base_semantics(),
        search_depth: None,
    }
}

#[test]
fn one_term_per_axiom_and_proto() {
    let mut model = tiny_model(BoolExpr::Lit(true));
    let axiom = model.axioms[0].clone();
    model.axioms.push(axiom);

    let terms = term::terms_of_model(&model).unwrap();
    assert_eq!(terms.len(), 4);

    // Goal indices are globally fresh across axioms.
    let goal_param = |idx: usize| match terms[idx].goal.params.first() {
        Some(Expr::Int(IntExpr::Var(Sym::Reg(MarkedVar::Goal(goal, var))))) => {
            Some((*goal, var.id().to_string()))
        }
        _ => None,
    };
    assert_eq!(terms[0].goal.name, "holdTick");
    assert_eq!(goal_param(0), Some((0, "t".to_string())));
    assert_eq!(terms[1].goal.name, "holdLock");
    assert!(terms[1].goal.params.is_empty());
    assert_eq!(goal_param(2), Some((2, "t".to_string())));
}

#[test]
fn wpre_is_marked_before() {
    let model = tiny_model(BoolExpr::Lit(true));
    let terms = term::terms_of_model(&model).unwrap();

    let gfuncs: Vec<_> = terms[0].wpre.iter().collect();
    assert_eq!(gfuncs.len(), 1);
    assert_eq!(
        gfuncs[0].item.params,
        vec![Expr::Int(IntExpr::Var(Sym::Reg(MarkedVar::Before(
            Var::new("t", Typ::Int),
        ))))],
    );
}

#[test]
fn skip_semantics_is_frame() {
    let model = tiny_model(BoolExpr::Lit(true));
    let terms = term::terms_of_model(&model).unwrap();
    assert_eq!(
        terms[0].cmd,
        build_bexpr!((and
            (= (serving @ 1: int) (serving @ 0: int))
            (= (t @ 1: int) (t @ 0: int))
        )),
    );
}

#[test]
fn approx_replaces_bool_symbols() {
    // Positive position: over-approximated to true.
    let sym: BoolExpr<Sym<MarkedVar>> = BoolExpr::Var(Sym::sym("inv", vec![]));
    let res = sub::bool_expr(&mut Approx, SubCtx::positive(), &sym).unwrap();
    assert_eq!(res, BoolExpr::Lit(true));

    // Under a negation the sign flips.
    let res = sub::bool_expr(&mut Approx, SubCtx::positive(), &sym.clone().negate()).unwrap();
    assert_eq!(res, BoolExpr::Not(Box::new(BoolExpr::Lit(false))));

    // An implication flips its antecedent only.
    let impl_expr = BoolExpr::implies(sym.clone(), sym);
    let res = sub::bool_expr(&mut Approx, SubCtx::positive(), &impl_expr).unwrap();
    assert_eq!(
        res,
        BoolExpr::implies(BoolExpr::Lit(false), BoolExpr::Lit(true)),
    );
}

#[test]
fn term_approx_uses_positions() {
    // A symbolic guard in the precondition: guards are antecedents of a negative part, so the
    // symbol lands in a positive position and over-approximates to true.
    let model = tiny_model(BoolExpr::Var(Sym::sym("lockInv", vec![])));
    let terms = term::terms_of_model(&model).unwrap();
    let approxed = terms[0].approx().unwrap();

    let gfuncs: Vec<_> = approxed.wpre.iter().collect();
    assert_eq!(gfuncs[0].cond, BoolExpr::Lit(true));
}
