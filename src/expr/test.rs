//! Tests over expressions and simplification.

crate::prelude!();

use expr::{ArrayExpr, BoolExpr, Expr, IntExpr, Sym, Typ, Var};

#[test]
fn typing_eq() {
    let lft = Expr::Int(build_iexpr!((n: int)));
    let rgt = Expr::Int(build_iexpr!(7));
    let eq = BoolExpr::eq(lft, rgt).unwrap();
    assert_eq!(eq, build_bexpr!((= (n: int) 7)));

    let lft = Expr::Int(build_iexpr!((n: int)));
    let rgt = Expr::Bool(build_bexpr!((b: bool)));
    let err = BoolExpr::eq(lft, rgt).unwrap_err();
    assert_eq!(
        err.to_string(),
        "parameter `=` expects a value of type `int`, got `bool`",
    );
}

#[test]
fn typing_idx() {
    let arr = ArrayExpr::var(Typ::int(), Some(10), Var::new("a", Typ::array(Typ::int(), Some(10))));
    let sel = IntExpr::idx(arr.clone(), build_iexpr!((i: int))).unwrap();
    assert_eq!(&sel.to_string(), "(select a i)");

    let err = BoolExpr::idx(arr, build_iexpr!((i: int))).unwrap_err();
    assert_eq!(
        err.to_string(),
        "malformed semantics: Boolean subscript of an array with `int` elements",
    );
}

#[test]
fn simp_literals() {
    let expr = build_bexpr!((and true (a: bool) true));
    assert_eq!(expr.simp(), build_bexpr!((a: bool)));

    let expr = build_bexpr!((and (a: bool) false (b: bool)));
    assert_eq!(expr.simp(), BoolExpr::Lit(false));

    let expr: BoolExpr<Var> = build_bexpr!((or false false));
    assert_eq!(expr.simp(), BoolExpr::Lit(false));

    let expr = build_bexpr!((or (a: bool) true));
    assert_eq!(expr.simp(), BoolExpr::Lit(true));
}

#[test]
fn simp_flatten() {
    let expr = build_bexpr!((and (and (a: bool) (b: bool)) (c: bool)));
    assert_eq!(
        expr.simp(),
        build_bexpr!((and (a: bool) (b: bool) (c: bool))),
    );
    // Duplicates are removed, first occurrence wins.
    let expr = build_bexpr!((or (a: bool) (or (b: bool) (a: bool))));
    assert_eq!(expr.simp(), build_bexpr!((or (a: bool) (b: bool))));
}

#[test]
fn simp_not() {
    let expr = build_bexpr!((not (not (a: bool))));
    assert_eq!(expr.simp(), build_bexpr!((a: bool)));

    // De Morgan, with comparison negation pushed through.
    let expr = build_bexpr!((not (and (a: bool) (> (n: int) 0))));
    assert_eq!(
        expr.simp(),
        build_bexpr!((or (not (a: bool)) (<= (n: int) 0))),
    );

    let expr = build_bexpr!((not (=> (a: bool) (b: bool))));
    assert_eq!(expr.simp(), build_bexpr!((and (a: bool) (not (b: bool)))));
}

#[test]
fn simp_implies() {
    assert_eq!(
        build_bexpr!((=> false (a: bool))).simp(),
        BoolExpr::Lit(true),
    );
    assert_eq!(
        build_bexpr!((=> (a: bool) true)).simp(),
        BoolExpr::Lit(true),
    );
    assert_eq!(
        build_bexpr!((=> true (a: bool))).simp(),
        build_bexpr!((a: bool)),
    );
    assert_eq!(
        build_bexpr!((=> (a: bool) false)).simp(),
        build_bexpr!((not (a: bool))),
    );
}

#[test]
fn simp_reflexive() {
    assert_eq!(build_bexpr!((= (n: int) (n: int))).simp(), BoolExpr::Lit(true));
    assert_eq!(build_bexpr!((>= (n: int) (n: int))).simp(), BoolExpr::Lit(true));
    assert_eq!(build_bexpr!((<= (n: int) (n: int))).simp(), BoolExpr::Lit(true));
    // Strict comparisons are left alone.
    assert_eq!(
        build_bexpr!((> (n: int) (n: int))).simp(),
        build_bexpr!((> (n: int) (n: int))),
    );
}

#[test]
fn simp_bool_eq() {
    assert_eq!(
        build_bexpr!((beq (a: bool) true)).simp(),
        build_bexpr!((a: bool)),
    );
    assert_eq!(
        build_bexpr!((beq false (a: bool))).simp(),
        build_bexpr!((not (a: bool))),
    );
    assert_eq!(build_bexpr!((beq true false)).simp(), BoolExpr::<Var>::Lit(false));
    assert_eq!(build_bexpr!((beq false false)).simp(), BoolExpr::<Var>::Lit(true));
}

#[test]
fn simp_eq_symmetric_dedup() {
    let expr = BoolExpr::And(vec![
        build_bexpr!((= (n: int) (m: int))),
        build_bexpr!((= (m: int) (n: int))),
    ]);
    assert_eq!(expr.simp(), build_bexpr!((= (n: int) (m: int))));
}

/// A handful of expressions exercising most simplification rules.
fn samples() -> Vec<BoolExpr<Var>> {
    vec![
        build_bexpr!((and (or false (a: bool)) (=> (b: bool) true))),
        build_bexpr!((not (and (a: bool) (not (b: bool)) (> (n: int) (m: int))))),
        build_bexpr!((=> (and (a: bool) (a: bool)) (or (b: bool) false))),
        build_bexpr!((beq (a: bool) (beq (b: bool) true))),
        build_bexpr!((or (= (n: int) 0) (not (= 0 (n: int))))),
        build_bexpr!((and (>= (n: int) (n: int)) (< (n: int) (+ (n: int) 1)))),
        build_bexpr!((not (=> (a: bool) (= (n: int) (n: int))))),
    ]
}

#[test]
fn simp_idempotent() {
    for expr in samples() {
        let once = expr.simp();
        let twice = once.simp();
        assert_eq!(once, twice, "simplifying `{}`", expr);
    }
}

/// Evaluates an integer expression under a valuation.
fn eval_int(expr: &IntExpr<Var>, sigma: &Map<String, Expr<Var>>) -> Int {
    match expr {
        IntExpr::Var(var) => match sigma.get(var.id()) {
            Some(Expr::Int(IntExpr::Lit(i))) => i.clone(),
            _ => panic!("no integer value for `{}`", var),
        },
        IntExpr::Lit(i) => i.clone(),
        IntExpr::Add(ops) => ops.iter().map(|op| eval_int(op, sigma)).sum(),
        IntExpr::Sub(ops) => {
            let mut ops = ops.iter().map(|op| eval_int(op, sigma));
            let first = ops.next().expect("empty subtraction");
            ops.fold(first, |acc, op| acc - op)
        }
        IntExpr::Mul(ops) => ops.iter().map(|op| eval_int(op, sigma)).product(),
        IntExpr::Div(lft, rgt) => eval_int(lft, sigma) / eval_int(rgt, sigma),
        IntExpr::Mod(lft, rgt) => eval_int(lft, sigma) % eval_int(rgt, sigma),
        IntExpr::Idx { .. } => panic!("array subscript in evaluation test"),
    }
}

/// Evaluates a Boolean expression under a valuation.
fn eval_bool(expr: &BoolExpr<Var>, sigma: &Map<String, Expr<Var>>) -> bool {
    match expr {
        BoolExpr::Var(var) => match sigma.get(var.id()) {
            Some(Expr::Bool(BoolExpr::Lit(b))) => *b,
            _ => panic!("no Boolean value for `{}`", var),
        },
        BoolExpr::Lit(b) => *b,
        BoolExpr::And(ops) => ops.iter().all(|op| eval_bool(op, sigma)),
        BoolExpr::Or(ops) => ops.iter().any(|op| eval_bool(op, sigma)),
        BoolExpr::Implies(lft, rgt) => !eval_bool(lft, sigma) || eval_bool(rgt, sigma),
        BoolExpr::Not(arg) => !eval_bool(arg, sigma),
        BoolExpr::Eq(lft, rgt) => match (&**lft, &**rgt) {
            (Expr::Int(lft), Expr::Int(rgt)) => eval_int(lft, sigma) == eval_int(rgt, sigma),
            (Expr::Bool(lft), Expr::Bool(rgt)) => eval_bool(lft, sigma) == eval_bool(rgt, sigma),
            _ => panic!("ill-typed equality in evaluation test"),
        },
        BoolExpr::Gt(lft, rgt) => eval_int(lft, sigma) > eval_int(rgt, sigma),
        BoolExpr::Ge(lft, rgt) => eval_int(lft, sigma) >= eval_int(rgt, sigma),
        BoolExpr::Le(lft, rgt) => eval_int(lft, sigma) <= eval_int(rgt, sigma),
        BoolExpr::Lt(lft, rgt) => eval_int(lft, sigma) < eval_int(rgt, sigma),
        BoolExpr::Idx { .. } => panic!("array subscript in evaluation test"),
    }
}

#[test]
fn simp_sound() {
    let mut valuations = vec![];
    for a in &[false, true] {
        for b in &[false, true] {
            for n in &[-1i64, 0, 2] {
                for m in &[0i64, 2] {
                    let mut sigma = Map::new();
                    sigma.insert("a".to_string(), Expr::Bool(BoolExpr::Lit(*a)));
                    sigma.insert("b".to_string(), Expr::Bool(BoolExpr::Lit(*b)));
                    sigma.insert("n".to_string(), Expr::Int(IntExpr::lit(*n)));
                    sigma.insert("m".to_string(), Expr::Int(IntExpr::lit(*m)));
                    valuations.push(sigma)
                }
            }
        }
    }
    for expr in samples() {
        let simped = expr.simp();
        for sigma in &valuations {
            assert_eq!(
                eval_bool(&expr, sigma),
                eval_bool(&simped, sigma),
                "`{}` versus `{}`",
                expr,
                simped,
            );
        }
    }
}

#[test]
fn collect_vars() {
    let expr = build_bexpr!((and (a: bool) (= (n: int) (+ (m: int) (n: int)))));
    let vars = expr.vars();
    let ids: Vec<_> = vars.iter().map(Var::id).collect();
    assert_eq!(ids, vec!["a", "m", "n"]);
}

#[test]
fn sym_vars() {
    // Symbol arguments are descended into transparently.
    let sym: Sym<Var> = Sym::sym(
        "lockInvariant",
        vec![Expr::Int(IntExpr::Var(Sym::Reg(Var::new("t", Typ::Int))))],
    );
    let expr: BoolExpr<Sym<Var>> = BoolExpr::And(vec![
        BoolExpr::Var(sym),
        BoolExpr::Var(Sym::Reg(Var::new("ok", Typ::Bool))),
    ]);
    let mut ids = vec![];
    expr.collect_vars(&mut |sym: &Sym<Var>| {
        sym.collect_regs(&mut |var| ids.push(var.id().to_string()))
    });
    assert_eq!(ids, vec!["t".to_string(), "ok".to_string()]);
}

#[test]
fn smt_print() {
    use rsmt2::print::Expr2Smt;

    let expr = build_bexpr!((and (= (t @ 1: int) (ticket @ 0: int)) (ok @ 1: bool)));
    let mut buff = vec![];
    expr.expr_to_smt2(&mut buff, ()).unwrap();
    let s = String::from_utf8_lossy(&buff);
    assert_eq!(&s, "(and (= t!after ticket!before) ok!after)");
}
