//! Parser tests, and an end-to-end run over the demo script.

crate::prelude!();

use ast::{Atomic, FetchMode, Marked};
use expr::Typ;

#[test]
fn parse_decls() {
    let script = parse::script(
        "\
shared int ticket, serving;\n\
thread bool done;\n\
shared int[8] queue;\n\
        ",
    )
    .unwrap();
    assert_eq!(
        script.shared,
        vec![
            (Typ::Int, "ticket".to_string()),
            (Typ::Int, "serving".to_string()),
            (Typ::array(Typ::Int, Some(8)), "queue".to_string()),
        ],
    );
    assert_eq!(script.thread, vec![(Typ::Bool, "done".to_string())]);
}

#[test]
fn parse_duplicate_var() {
    let err = parse::script("shared int x;\nthread int x;").unwrap_err();
    assert_eq!(err.to_string(), "variable `x` is declared twice");
}

#[test]
fn parse_protos() {
    let script = parse::script(
        "view holdTick(int t);\nview holdLock();\nview iter[n] queued(int x);",
    )
    .unwrap();
    assert_eq!(script.protos.len(), 3);
    assert_eq!(script.protos[0].name(), "holdTick");
    assert!(script.protos[1].params().is_empty());
    assert_eq!(script.protos[2].iterator.as_deref(), Some("n"));
}

#[test]
fn parse_atomics() {
    use parse::rules::atomic;

    assert_eq!(
        atomic("t = ticket++").unwrap(),
        Atomic::Fetch {
            dest: ast::Expr::ident("t"),
            src: ast::Expr::ident("ticket"),
            mode: FetchMode::Incr,
        },
    );
    assert_eq!(
        atomic("serving--").unwrap(),
        Atomic::Postfix {
            operand: ast::Expr::ident("serving"),
            mode: FetchMode::Decr,
        },
    );
    assert_eq!(
        atomic("CAS(lk, test, true)").unwrap(),
        Atomic::Cas {
            dest: ast::Expr::ident("lk"),
            test: ast::Expr::ident("test"),
            set: ast::Expr::True,
        },
    );
    assert!(matches!(atomic("assume(s == t)").unwrap(), Atomic::Assume(_)));
    assert!(matches!(
        atomic("if (ok) { x = 1 } else { error }").unwrap(),
        Atomic::Cond { .. },
    ));
}

#[test]
fn parse_marked_views() {
    use parse::rules::marked_view;

    assert_eq!(marked_view("?").unwrap(), Marked::Unknown);
    assert!(matches!(
        marked_view("holdTick(t) ?").unwrap(),
        Marked::Questioned(_),
    ));
    assert!(matches!(
        marked_view("holdTick(t) * holdLock()").unwrap(),
        Marked::Unmarked(ast::View::Join(_, _)),
    ));
}

#[test]
fn parse_error_pos() {
    let err = parse::script("shared int x").unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.starts_with("error @0:12: `shared int x`"),
        "unexpected message: {}",
        msg,
    );
}

#[test]
fn demo_parses() {
    let script = parse::script(crate::DEMO).unwrap();
    assert_eq!(script.shared.len(), 2);
    assert_eq!(script.thread.len(), 2);
    assert_eq!(script.protos.len(), 2);
    assert_eq!(script.constraints.len(), 6);
    assert_eq!(script.methods.len(), 2);
}

#[test]
fn demo_obligations() {
    let script = parse::script(crate::DEMO).unwrap();
    let terms = term::obligations(&script).unwrap();

    // `lock` yields five axioms (fetch, loop body, loop entry/back/exit edges), `unlock` one;
    // one term per axiom and prototype.
    assert_eq!(terms.protos.len(), 2);
    assert_eq!(terms.terms.len(), 6 * 2);

    // First axiom: `{| emp |} <t = ticket++> {| holdTick(t) |}`, against goal `holdTick`.
    let first = &terms.terms[0];
    assert!(first.wpre.is_empty());
    assert_eq!(first.goal.name, "holdTick");
    assert_eq!(
        first.cmd,
        build_bexpr!((and
            (= (t @ 1: int) (ticket @ 0: int))
            (= (ticket @ 1: int) (+ (ticket @ 0: int) 1))
            (= (serving @ 1: int) (serving @ 0: int))
            (= (s @ 1: int) (s @ 0: int))
        )),
    );
}

#[test]
fn demo_constraints_modelled() {
    let script = parse::script(crate::DEMO).unwrap();
    let des = desugar::script(&script).unwrap();
    let model = model::model(&des, semantics::base_semantics()).unwrap();

    assert_eq!(model.constraints.len(), 6);
    // `constraint emp -> ticket >= serving` has an empty pattern and a definite body over
    // unmarked variables.
    assert!(model.constraints[0].pattern.is_empty());
    let ivar = |id: &str| {
        Box::new(expr::IntExpr::Var(expr::Sym::Reg(expr::Var::new(
            id,
            Typ::Int,
        ))))
    };
    assert_eq!(
        model.constraints[0].def,
        Some(expr::BoolExpr::Ge(ivar("ticket"), ivar("serving"))),
    );
}
