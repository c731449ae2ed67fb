//! Tests over desugaring.

crate::prelude!();

use ast::{Atomic, BlockEntry, Command, FetchMode, Marked, View};
use desugar::{DesugarCtx, DesugaredAtomic, FullCommand};
use expr::{Func, Typ};
use view::ViewExpr;

fn empty_ctx() -> DesugarCtx {
    DesugarCtx::new(vec![], vec![], &[]).unwrap()
}

#[test]
fn falsehood_generates_lift() {
    let mut ctx = empty_ctx();
    let res = desugar::marked_view(&mut ctx, &Marked::Unmarked(View::Falsehood));

    assert_eq!(
        res,
        ViewExpr::Mandatory(vec![(
            ast::Expr::True,
            Func::new("__lift_0", vec![ast::Expr::False]),
        )]),
    );
    assert_eq!(ctx.local_lift_view.as_deref(), Some("__lift_0"));
    let protos: Vec<_> = ctx.generated_protos.iter().collect();
    assert_eq!(protos.len(), 1);
    assert_eq!(protos[0].name(), "__lift_0");
    assert_eq!(protos[0].params(), &[(Typ::Bool, "x".to_string())]);
}

#[test]
fn lift_generated_once() {
    let mut ctx = empty_ctx();
    let _ = desugar::view(&mut ctx, None, &View::Local(ast::Expr::ident("b")));
    let _ = desugar::view(&mut ctx, None, &View::Falsehood);
    assert_eq!(ctx.generated_protos.len(), 1);
}

#[test]
fn unknown_view() {
    let mut ctx = DesugarCtx::new(
        vec![],
        vec![(Typ::Int, "s".to_string()), (Typ::Int, "t".to_string())],
        &[],
    )
    .unwrap();
    let res = desugar::marked_view(&mut ctx, &Marked::Unknown);

    assert_eq!(
        res,
        ViewExpr::Advisory(vec![(
            ast::Expr::True,
            Func::new(
                "__unknown_0",
                vec![ast::Expr::ident("s"), ast::Expr::ident("t")],
            ),
        )]),
    );
    let protos: Vec<_> = ctx.generated_protos.iter().collect();
    assert_eq!(protos.len(), 1);
    assert_eq!(
        protos[0].params(),
        &[(Typ::Int, "s".to_string()), (Typ::Int, "t".to_string())],
    );
}

#[test]
fn conditional_view() {
    let mut ctx = empty_ctx();
    // `if s { foo(bar) }`, no else.
    let v = View::If {
        cond: ast::Expr::ident("s"),
        tru: Box::new(View::Func(Func::new("foo", vec![ast::Expr::ident("bar")]))),
        fls: None,
    };
    let res = desugar::view(&mut ctx, None, &v);
    assert_eq!(
        res,
        vec![(
            ast::Expr::ident("s"),
            Func::new("foo", vec![ast::Expr::ident("bar")]),
        )],
    );
}

#[test]
fn join_keeps_duplicates() {
    let mut ctx = empty_ctx();
    let atom = View::Func(Func::new("foo", vec![]));
    let v = View::join(atom.clone(), atom);
    let res = desugar::view(&mut ctx, None, &v);
    assert_eq!(res.len(), 2);
}

#[test]
fn assert_allocates_okay() {
    let mut ctx = DesugarCtx::new(
        vec![
            (Typ::Bool, "__ok_0".to_string()),
            (Typ::Int, "serving".to_string()),
        ],
        vec![(Typ::Bool, "__ok_1".to_string())],
        &[],
    )
    .unwrap();
    let res = desugar::atomic(&mut ctx, &Atomic::Assert(ast::Expr::ident("x")));

    assert_eq!(
        res,
        DesugaredAtomic::Prim(Atomic::Fetch {
            dest: ast::Expr::ident("__ok_2"),
            src: ast::Expr::ident("x"),
            mode: FetchMode::Direct,
        }),
    );
    assert_eq!(ctx.okay_bool.as_deref(), Some("__ok_2"));
    // Prepended to the shared variables, with type bool.
    assert_eq!(ctx.shared_vars[0], (Typ::Bool, "__ok_2".to_string()));
}

#[test]
fn error_is_assert_false() {
    let mut ctx = empty_ctx();
    let res = desugar::atomic(&mut ctx, &Atomic::Error);
    assert_eq!(
        res,
        DesugaredAtomic::Prim(Atomic::Fetch {
            dest: ast::Expr::ident("__ok_0"),
            src: ast::Expr::False,
            mode: FetchMode::Direct,
        }),
    );
}

#[test]
fn fill_caps_both_ends() {
    let mut ctx = empty_ctx();
    // A block that is a single command: both a precondition and a postcondition get filled in.
    let blk = vec![BlockEntry::Cmd(Command::Prim(vec![Atomic::Id]))];
    let full = desugar::block(&mut ctx, &blk);

    assert!(matches!(full.pre, ViewExpr::Advisory(_)));
    assert_eq!(full.cmds.len(), 1);
    assert!(matches!(full.cmds[0].1, ViewExpr::Advisory(_)));
    assert_eq!(ctx.generated_protos.len(), 2);
}

#[test]
fn fill_single_view() {
    let mut ctx = empty_ctx();
    let blk = vec![BlockEntry::View(Marked::Unmarked(View::Unit))];
    let full = desugar::block(&mut ctx, &blk);
    assert_eq!(full.pre, ViewExpr::Mandatory(vec![]));
    assert!(full.cmds.is_empty());
}

#[test]
fn fill_adjacent_views_get_skip() {
    let mut ctx = empty_ctx();
    let blk = vec![
        BlockEntry::View(Marked::Unmarked(View::Unit)),
        BlockEntry::View(Marked::Unmarked(View::Func(Func::new("foo", vec![])))),
    ];
    let full = desugar::block(&mut ctx, &blk);
    assert_eq!(full.cmds.len(), 1);
    match &full.cmds[0] {
        (FullCommand::Prim(prims), ViewExpr::Mandatory(gview)) => {
            assert!(prims.is_empty());
            assert_eq!(gview.len(), 1);
        }
        pair => panic!("expected a skip command, got {:?}", pair),
    }
}

#[test]
fn fill_adjacent_commands_get_unknown() {
    let mut ctx = empty_ctx();
    let blk = vec![
        BlockEntry::View(Marked::Unmarked(View::Unit)),
        BlockEntry::Cmd(Command::Prim(vec![Atomic::Id])),
        BlockEntry::Cmd(Command::Prim(vec![Atomic::Id])),
        BlockEntry::View(Marked::Unmarked(View::Unit)),
    ];
    let full = desugar::block(&mut ctx, &blk);
    assert_eq!(full.cmds.len(), 2);
    assert!(matches!(full.cmds[0].1, ViewExpr::Advisory(_)));
    assert!(matches!(full.cmds[1].1, ViewExpr::Mandatory(_)));
}

#[test]
fn generated_names_stay_unique() {
    let mut ctx = DesugarCtx::new(vec![], vec![], &[view::ViewProto::new("__unknown_0", vec![])])
        .unwrap();
    let first = ctx.fresh_unknown();
    let second = ctx.fresh_unknown();
    assert_eq!(first.name, "__unknown_1");
    assert_eq!(second.name, "__unknown_2");
}
