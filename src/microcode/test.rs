//! Tests over microcode normalisation and marking.

crate::prelude!();

use expr::{ArrayExpr, Expr, IntExpr, MarkedVar, Sym, Typ, Var};
use microcode::Microcode;

/// An integer array variable `a`.
fn arr_var() -> Var {
    Var::new("a", Typ::array(Typ::int(), Some(8)))
}

/// The lvalue `a[i]` for an integer variable `i`.
fn arr_at(idx: &str) -> Expr<Sym<Var>> {
    let arr = ArrayExpr::var(Typ::int(), Some(8), Sym::Reg(arr_var()));
    Expr::Int(IntExpr::Idx {
        arr: Box::new(arr),
        idx: Box::new(IntExpr::Var(Sym::Reg(Var::new(idx, Typ::Int)))),
    })
}

/// The assignment `lvalue := rvalue`.
fn assign(
    lvalue: Expr<Sym<Var>>,
    rvalue: Expr<Sym<Var>>,
) -> Microcode<Expr<Sym<Var>>, Sym<Var>> {
    Microcode::Assign {
        lvalue,
        rvalue: Some(rvalue),
    }
}

#[test]
fn subscript_writes_merge() {
    // a[i] := 1; a[j] := 2
    let listing = vec![
        assign(arr_at("i"), Expr::Int(IntExpr::lit(1))),
        assign(arr_at("j"), Expr::Int(IntExpr::lit(2))),
    ];
    let normed = microcode::normalise(&listing).unwrap();

    // One whole-variable assignment: a := store(store(a, i, 1), j, 2).
    assert_eq!(normed.len(), 1);
    match &normed[0] {
        Microcode::Assign {
            lvalue,
            rvalue: Some(rvalue),
        } => {
            assert_eq!(lvalue, &arr_var());
            assert_eq!(&rvalue.to_string(), "(store (store a i 1) j 2)");
        }
        instr => panic!("expected a whole-variable assign, got `{}`", instr),
    }
}

#[test]
fn whole_write_then_subscript_fails() {
    let whole = Expr::Array(ArrayExpr::var(Typ::int(), Some(8), Sym::Reg(arr_var())));
    let listing = vec![
        assign(whole, Expr::Array(ArrayExpr::var(Typ::int(), Some(8), Sym::Reg(Var::new("b", Typ::array(Typ::int(), Some(8))))))),
        assign(arr_at("i"), Expr::Int(IntExpr::lit(1))),
    ];
    let err = microcode::normalise(&listing).unwrap_err();
    assert_eq!(
        err.to_string(),
        "malformed semantics: indexed write over a whole-variable write",
    );
}

#[test]
fn double_write_fails() {
    let x = Expr::Int(IntExpr::Var(Sym::Reg(Var::new("x", Typ::Int))));
    let listing = vec![
        assign(x.clone(), Expr::Int(IntExpr::lit(1))),
        assign(x, Expr::Int(IntExpr::lit(2))),
    ];
    let err = microcode::normalise(&listing).unwrap_err();
    assert_eq!(
        err.to_string(),
        "malformed semantics: two writes to the same variable in one listing",
    );
}

#[test]
fn index_over_non_array_fails() {
    // x[i] := 1 where x: int.
    let arr = ArrayExpr::var(Typ::int(), None, Sym::Reg(Var::new("x", Typ::Int)));
    let lvalue = Expr::Int(IntExpr::Idx {
        arr: Box::new(arr),
        idx: Box::new(IntExpr::Var(Sym::Reg(Var::new("i", Typ::Int)))),
    });
    let listing = vec![assign(lvalue, Expr::Int(IntExpr::lit(1)))];
    let err = microcode::normalise(&listing).unwrap_err();
    assert_eq!(
        err.to_string(),
        "malformed semantics: indexed write to `x`, which has non-array type `int`",
    );
}

#[test]
fn nested_havoc_propagates() {
    // a[i] := 1; havoc a[j]  =>  havoc a (as a whole).
    let listing = vec![
        assign(arr_at("i"), Expr::Int(IntExpr::lit(1))),
        Microcode::Assign {
            lvalue: arr_at("j"),
            rvalue: None,
        },
    ];
    let normed = microcode::normalise(&listing).unwrap();
    assert_eq!(normed.len(), 1);
    match &normed[0] {
        Microcode::Assign { lvalue, rvalue } => {
            assert_eq!(lvalue, &arr_var());
            assert!(rvalue.is_none());
        }
        instr => panic!("expected a havoc, got `{}`", instr),
    }
}

#[test]
fn symbolic_lvalue_ignored() {
    let lvalue = Expr::Bool(expr::BoolExpr::Var(Sym::sym("resource", vec![])));
    let listing = vec![Microcode::Assign {
        lvalue,
        rvalue: Some(Expr::Bool(expr::BoolExpr::Lit(true))),
    }];
    let normed = microcode::normalise(&listing).unwrap();
    assert!(normed.is_empty());
}

#[test]
fn marking_reads_state() {
    let (t, ticket) = (Var::new("t", Typ::Int), Var::new("ticket", Typ::Int));
    let listing: Vec<Microcode<Var, Sym<Var>>> = vec![Microcode::Assign {
        lvalue: t.clone(),
        rvalue: Some(Expr::Int(IntExpr::Var(Sym::Reg(ticket.clone())))),
    }];

    // `ticket` was assigned by stage 0, so it reads as intermediate.
    let mut state = Map::new();
    state.insert(
        "ticket".to_string(),
        MarkedVar::Intermediate(0, ticket.clone()),
    );

    let marker = |var: &Var| MarkedVar::After(var.clone());
    let marked = microcode::mark_listing(&marker, &state, &listing).unwrap();
    assert_eq!(
        marked,
        vec![Microcode::Assign {
            lvalue: MarkedVar::After(t),
            rvalue: Some(Expr::Int(IntExpr::Var(Sym::Reg(MarkedVar::Intermediate(
                0, ticket,
            ))))),
        }],
    );
}

#[test]
fn marking_defaults_to_before() {
    let x = Var::new("x", Typ::Bool);
    let listing: Vec<Microcode<Var, Sym<Var>>> = vec![Microcode::Assume(expr::BoolExpr::Var(
        Sym::Reg(x.clone()),
    ))];
    let marked = microcode::mark_listing(
        &|var: &Var| MarkedVar::After(var.clone()),
        &Map::new(),
        &listing,
    )
    .unwrap();
    assert_eq!(
        marked,
        vec![Microcode::Assume(expr::BoolExpr::Var(Sym::Reg(
            MarkedVar::Before(x),
        )))],
    );
}

#[test]
fn assigned_vars_sees_branches() {
    let (x, y) = (Var::new("x", Typ::Int), Var::new("y", Typ::Int));
    let listing: Vec<Microcode<Var, Sym<Var>>> = vec![Microcode::Branch {
        cond: expr::BoolExpr::Lit(true),
        tru: vec![Microcode::Assign {
            lvalue: x.clone(),
            rvalue: Some(Expr::Int(IntExpr::lit(0))),
        }],
        fls: vec![Microcode::Assign {
            lvalue: y.clone(),
            rvalue: Some(Expr::Int(IntExpr::lit(1))),
        }],
    }];
    let mut set = Set::new();
    microcode::assigned_vars(&listing, &mut set);
    assert_eq!(set, vec![x, y].into_iter().collect::<Set<_>>());
}
