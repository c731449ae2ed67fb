//! Tests over instantiation and routine translation.

crate::prelude!();

use expr::{BoolExpr, Expr, IntExpr, MarkedVar, Sym, Typ, Var};
use microcode::Microcode;
use semantics::{base_semantics, PrimCommand, PrimSemantics};

/// The integer expression reading unmarked variable `id`.
fn ivar(id: &str) -> Expr<Sym<Var>> {
    Expr::Int(IntExpr::Var(Sym::Reg(Var::new(id, Typ::Int))))
}

#[test]
fn ticket_fetch() {
    // t = ticket++, as a single primitive: t := ticket; ticket := ticket + 1.
    let cmd = vec![PrimCommand::Stored {
        name: "!ILoad++".into(),
        args: vec![ivar("ticket")],
        results: vec![ivar("t"), ivar("ticket")],
    }];
    let vars = vec![(Typ::Int, "t".to_string()), (Typ::Int, "ticket".to_string())];

    let res = semantics::command_semantics(&base_semantics(), &cmd, &vars).unwrap();
    assert_eq!(
        res.semantics,
        build_bexpr!((and
            (= (t @ 1: int) (ticket @ 0: int))
            (= (ticket @ 1: int) (+ (ticket @ 0: int) 1))
        )),
    );
}

#[test]
fn ticket_fetch_frames_others() {
    let cmd = vec![PrimCommand::Stored {
        name: "!ILoad++".into(),
        args: vec![ivar("ticket")],
        results: vec![ivar("t"), ivar("ticket")],
    }];
    let vars = vec![
        (Typ::Int, "t".to_string()),
        (Typ::Int, "ticket".to_string()),
        (Typ::Int, "serving".to_string()),
    ];

    let res = semantics::command_semantics(&base_semantics(), &cmd, &vars).unwrap();
    assert_eq!(
        res.semantics,
        build_bexpr!((and
            (= (t @ 1: int) (ticket @ 0: int))
            (= (ticket @ 1: int) (+ (ticket @ 0: int) 1))
            (= (serving @ 1: int) (serving @ 0: int))
        )),
    );
}

#[test]
fn skip_is_pure_frame() {
    let vars = vec![(Typ::Int, "x".to_string()), (Typ::Bool, "b".to_string())];
    let res = semantics::command_semantics(&base_semantics(), &[], &vars).unwrap();
    assert_eq!(
        res.semantics,
        BoolExpr::And(vec![
            build_bexpr!((= (x @ 1: int) (x @ 0: int))),
            build_bexpr!((beq (b @ 1: bool) (b @ 0: bool))),
        ]),
    );
}

#[test]
fn two_stage_routine_uses_intermediates() {
    // <t = ticket; ticket++>: two primitives, hence two stages.
    let cmd = vec![
        PrimCommand::Stored {
            name: "!ILoad".into(),
            args: vec![ivar("ticket")],
            results: vec![ivar("t")],
        },
        PrimCommand::Stored {
            name: "!I++".into(),
            args: vec![],
            results: vec![ivar("ticket")],
        },
    ];
    let vars = vec![(Typ::Int, "t".to_string()), (Typ::Int, "ticket".to_string())];

    let res = semantics::command_semantics(&base_semantics(), &cmd, &vars).unwrap();
    assert_eq!(
        res.semantics,
        build_bexpr!((and
            (= (t @ i 0: int) (ticket @ 0: int))
            (= (ticket @ 1: int) (+ (ticket @ 0: int) 1))
            (= (t @ 1: int) (t @ i 0: int))
        )),
    );
}

#[test]
fn havoc_leaves_variable_unconstrained() {
    let cmd = vec![PrimCommand::Stored {
        name: "IHavoc".into(),
        args: vec![],
        results: vec![ivar("x")],
    }];
    let vars = vec![(Typ::Int, "x".to_string())];
    let res = semantics::command_semantics(&base_semantics(), &cmd, &vars).unwrap();
    // `x` was assigned (to nothing), so there is no frame and no constraint.
    assert_eq!(res.semantics, BoolExpr::Lit(true));
}

#[test]
fn cas_branches() {
    let cmd = vec![PrimCommand::Stored {
        name: "ICAS".into(),
        args: vec![ivar("set")],
        results: vec![ivar("dest"), ivar("test")],
    }];
    let vars = vec![
        (Typ::Int, "dest".to_string()),
        (Typ::Int, "set".to_string()),
        (Typ::Int, "test".to_string()),
    ];
    let res = semantics::command_semantics(&base_semantics(), &cmd, &vars).unwrap();

    assert_eq!(
        res.semantics,
        build_bexpr!((and
            (=> (= (dest @ 0: int) (test @ 0: int))
                (= (dest @ 1: int) (set @ 0: int)))
            (=> (not (= (dest @ 0: int) (test @ 0: int)))
                (= (test @ 1: int) (dest @ 0: int)))
            (= (set @ 1: int) (set @ 0: int))
        )),
    );
}

#[test]
fn missing_def() {
    let cmd = PrimCommand::Stored {
        name: "!IMaybeLoad".into(),
        args: vec![],
        results: vec![],
    };
    let err = semantics::instantiate(&base_semantics(), &cmd).unwrap_err();
    // The instantiation wrapper comes first, its cause after.
    let msgs: Vec<_> = err.iter().map(|e| e.to_string()).collect();
    assert_eq!(
        msgs,
        vec![
            "while instantiating primitive `!IMaybeLoad`".to_string(),
            "no semantic schema for primitive `!IMaybeLoad`".to_string(),
        ],
    );
}

#[test]
fn count_mismatch() {
    let cmd = PrimCommand::Stored {
        name: "!ILoad".into(),
        args: vec![ivar("a"), ivar("b")],
        results: vec![ivar("c")],
    };
    let err = semantics::instantiate(&base_semantics(), &cmd).unwrap_err();
    assert_eq!(
        err.iter().nth(1).map(|e| e.to_string()),
        Some("expected 1 parameter(s), got 2".to_string()),
    );
}

#[test]
fn type_mismatch() {
    let cmd = PrimCommand::Stored {
        name: "!ILoad".into(),
        args: vec![Expr::Bool(BoolExpr::Var(Sym::Reg(Var::new(
            "b",
            Typ::Bool,
        ))))],
        results: vec![ivar("c")],
    };
    let err = semantics::instantiate(&base_semantics(), &cmd).unwrap_err();
    assert_eq!(
        err.iter().nth(1).map(|e| e.to_string()),
        Some("parameter `src` expects a value of type `int`, got `bool`".to_string()),
    );
}

#[test]
fn free_var_in_schema() {
    // A malformed schema whose body mentions a variable that is not a parameter.
    let mut map = base_semantics();
    map.insert(
        "Broken".to_string(),
        PrimSemantics {
            args: vec![],
            results: vec![Var::new("x", Typ::Int)],
            body: vec![Microcode::Assign {
                lvalue: Expr::Int(IntExpr::Var(Var::new("x", Typ::Int))),
                rvalue: Some(Expr::Int(IntExpr::Var(Var::new("oops", Typ::Int)))),
            }],
        },
    );
    let cmd = PrimCommand::Stored {
        name: "Broken".into(),
        args: vec![],
        results: vec![ivar("x")],
    };
    let err = semantics::instantiate(&map, &cmd).unwrap_err();
    assert_eq!(
        err.iter().nth(1).map(|e| e.to_string()),
        Some("variable `oops` is not covered by the substitution".to_string()),
    );
}

#[test]
fn every_var_pinned_once() {
    // Every declared variable ends up on the left of exactly one `v!after = ...` equality,
    // either from an assignment in some stage or from the frame.
    let cmd = vec![
        PrimCommand::Stored {
            name: "!ILoad".into(),
            args: vec![ivar("ticket")],
            results: vec![ivar("t")],
        },
        PrimCommand::Stored {
            name: "!I++".into(),
            args: vec![],
            results: vec![ivar("ticket")],
        },
    ];
    let vars = vec![
        (Typ::Int, "t".to_string()),
        (Typ::Int, "ticket".to_string()),
        (Typ::Int, "serving".to_string()),
    ];
    let listings: Vec<_> = cmd
        .iter()
        .map(|prim| semantics::instantiate(&base_semantics(), prim).unwrap())
        .collect();
    let res = semantics::routine_to_bool(&listings, &vars).unwrap();

    let conjuncts = match res {
        BoolExpr::And(ops) => ops,
        expr => panic!("expected a conjunction, got `{}`", expr),
    };
    for (_, id) in &vars {
        let pins = conjuncts
            .iter()
            .filter(|conj| match conj {
                BoolExpr::Eq(lhs, _) => match &**lhs {
                    Expr::Int(IntExpr::Var(Sym::Reg(MarkedVar::After(var)))) => var.id() == id,
                    _ => false,
                },
                _ => false,
            })
            .count();
        assert_eq!(pins, 1, "variable `{}`", id);
    }
}
