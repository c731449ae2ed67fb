//! The modeller: types the desugared AST and axiomatises control flow.
//!
//! Identifiers are resolved against the shared/thread declarations, surface expressions become
//! typed expressions over possibly-symbolic variables, views are checked against their prototypes,
//! and surface statements are lowered onto the base primitive vocabulary of
//! [`semantics::base_semantics`]. Structured control flow is flattened into [`Axiom`]s: one
//! Hoare-style (pre-view, command, post-view) triple per edge, with `Assume` commands on branch
//! and loop edges.

crate::prelude!();

use ast::{Atomic, FetchMode};
use desugar::{DView, Desugared, DesugaredAtomic, DesugaredGView, FullBlock, FullCommand};
use expr::{ArrayExpr, BoolExpr, Expr, Func, HasTyp, IntExpr, Sym, Typ, Var};
use semantics::{PrimCommand, PrimSemanticsMap};
use view::{GView, Guarded, Multiset, ViewExpr, ViewProto};

/// A modelled view annotation.
pub type MView = ViewExpr<GView<Sym<Var>>>;

/// An axiom: a command bracketed by its pre- and post-views.
#[derive(Debug, Clone)]
pub struct Axiom {
    /// The view before the command.
    pub pre: MView,
    /// The command.
    pub cmd: Vec<PrimCommand>,
    /// The view after the command.
    pub post: MView,
}
impl fmt::Display for Axiom {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{} <", self.pre)?;
        for (idx, cmd) in self.cmd.iter().enumerate() {
            if idx > 0 {
                write!(fmt, "; ")?;
            }
            cmd.fmt(fmt)?;
        }
        write!(fmt, "> {}", self.post)
    }
}

/// A modelled constraint: a typed view pattern and its optional definition.
#[derive(Debug, Clone)]
pub struct Constraint {
    /// The `*`-joined pattern; parameters are typed binders.
    pub pattern: Vec<Func<Var>>,
    /// The defining expression, over the binders and the shared variables; `None` when
    /// indefinite.
    pub def: Option<BoolExpr<Sym<Var>>>,
}

/// A modelled script, ready for semantic translation.
#[derive(Debug, Clone)]
pub struct Model {
    /// Shared variables, in declaration order.
    pub shared: Vec<(Typ, String)>,
    /// Thread-local variables, in declaration order.
    pub thread: Vec<(Typ, String)>,
    /// All view prototypes, declared and generated.
    pub protos: Vec<ViewProto>,
    /// Modelled constraints.
    pub constraints: Vec<Constraint>,
    /// The axioms of all methods, in method order.
    pub axioms: Vec<Axiom>,
    /// The primitive semantics in force.
    pub semantics: PrimSemanticsMap,
    /// Search-depth hint.
    pub search_depth: Option<usize>,
}
impl Model {
    /// All variables, shared then thread, in declaration order.
    pub fn all_vars(&self) -> Vec<(Typ, String)> {
        let mut vars = self.shared.clone();
        vars.extend(self.thread.iter().cloned());
        vars
    }

    /// Pretty, multi-line string representation of the model.
    pub fn to_ml_string(&self) -> String {
        let mut s = String::new();
        s.push_str("shared:");
        for (typ, id) in &self.shared {
            s.push_str(&format!("\n    {} {}", typ, id));
        }
        s.push_str("\nthread:");
        for (typ, id) in &self.thread {
            s.push_str(&format!("\n    {} {}", typ, id));
        }
        s.push_str("\nviews:");
        for proto in &self.protos {
            s.push_str(&format!("\n    {}", proto));
        }
        s.push_str("\naxioms:");
        for axiom in &self.axioms {
            s.push_str(&format!("\n    {}", axiom));
        }
        s
    }
}

/// Variables in scope during modelling.
#[derive(Debug, Clone)]
pub struct Scope {
    /// Shared variables.
    shared: Map<String, Typ>,
    /// Local variables: thread variables, or constraint binders.
    locals: Map<String, Typ>,
}
impl Scope {
    /// Builds a scope from declaration lists.
    pub fn new(shared: &[(Typ, String)], locals: &[(Typ, String)]) -> Self {
        let to_map = |decls: &[(Typ, String)]| {
            decls
                .iter()
                .map(|(typ, id)| (id.clone(), typ.clone()))
                .collect()
        };
        Self {
            shared: to_map(shared),
            locals: to_map(locals),
        }
    }

    /// Type of an identifier, locals first.
    fn typ_of(&self, id: &str) -> Res<Typ> {
        match self.locals.get(id).or_else(|| self.shared.get(id)) {
            Some(typ) => Ok(typ.clone()),
            None => bail!("variable `{}` is not declared", id),
        }
    }

    /// True if the identifier names a shared variable (and not a shadowing local).
    fn is_shared(&self, id: &str) -> bool {
        !self.locals.contains_key(id) && self.shared.contains_key(id)
    }
}

/// Models a surface expression, inferring its type.
///
/// Bare symbols are modelled at Boolean type; use [`int_expr`] for symbols in arithmetic
/// position.
pub fn any_expr(scope: &Scope, expr: &ast::Expr) -> Res<Expr<Sym<Var>>> {
    use ast::{Bop, Uop};

    let res = match expr {
        ast::Expr::True => Expr::Bool(BoolExpr::Lit(true)),
        ast::Expr::False => Expr::Bool(BoolExpr::Lit(false)),
        ast::Expr::Int(i) => Expr::Int(IntExpr::Lit(i.clone())),
        ast::Expr::Ident(id) => {
            let typ = scope.typ_of(id)?;
            Expr::of_var(Sym::Reg(Var::new(id, typ.clone())), &typ)
        }
        ast::Expr::Sym { name, args } => {
            let args = args
                .iter()
                .map(|arg| any_expr(scope, arg))
                .collect::<Res<Vec<_>>>()?;
            Expr::Bool(BoolExpr::Var(Sym::sym(name, args)))
        }
        ast::Expr::Idx { arr, idx } => {
            let arr = array_expr(scope, arr)?;
            let idx = int_expr(scope, idx)?;
            match arr.elt() {
                Typ::Int => Expr::Int(IntExpr::idx(arr, idx)?),
                Typ::Bool => Expr::Bool(BoolExpr::idx(arr, idx)?),
                Typ::Array { .. } => Expr::Array(ArrayExpr::idx(arr, idx)?),
            }
        }
        ast::Expr::Uop { op: Uop::Not, arg } => {
            Expr::Bool(bool_expr(scope, arg)?.negate())
        }
        ast::Expr::Uop { op: Uop::Neg, arg } => {
            Expr::Int(IntExpr::Sub(vec![int_expr(scope, arg)?]))
        }
        ast::Expr::Bop { op, lft, rgt } => match op {
            Bop::Add | Bop::Sub | Bop::Mul => {
                let (lft, rgt) = (int_expr(scope, lft)?, int_expr(scope, rgt)?);
                Expr::Int(match op {
                    Bop::Add => IntExpr::Add(vec![lft, rgt]),
                    Bop::Sub => IntExpr::Sub(vec![lft, rgt]),
                    _ => IntExpr::Mul(vec![lft, rgt]),
                })
            }
            Bop::Div => Expr::Int(IntExpr::Div(
                Box::new(int_expr(scope, lft)?),
                Box::new(int_expr(scope, rgt)?),
            )),
            Bop::Mod => Expr::Int(IntExpr::Mod(
                Box::new(int_expr(scope, lft)?),
                Box::new(int_expr(scope, rgt)?),
            )),
            Bop::Lt | Bop::Le | Bop::Gt | Bop::Ge => {
                let (lft, rgt) = (
                    Box::new(int_expr(scope, lft)?),
                    Box::new(int_expr(scope, rgt)?),
                );
                Expr::Bool(match op {
                    Bop::Lt => BoolExpr::Lt(lft, rgt),
                    Bop::Le => BoolExpr::Le(lft, rgt),
                    Bop::Gt => BoolExpr::Gt(lft, rgt),
                    _ => BoolExpr::Ge(lft, rgt),
                })
            }
            Bop::Eq => Expr::Bool(BoolExpr::eq(
                any_expr(scope, lft)?,
                any_expr(scope, rgt)?,
            )?),
            Bop::Neq => Expr::Bool(
                BoolExpr::eq(any_expr(scope, lft)?, any_expr(scope, rgt)?)?.negate(),
            ),
            Bop::And => Expr::Bool(BoolExpr::And(vec![
                bool_expr(scope, lft)?,
                bool_expr(scope, rgt)?,
            ])),
            Bop::Or => Expr::Bool(BoolExpr::Or(vec![
                bool_expr(scope, lft)?,
                bool_expr(scope, rgt)?,
            ])),
            Bop::Implies => Expr::Bool(BoolExpr::implies(
                bool_expr(scope, lft)?,
                bool_expr(scope, rgt)?,
            )),
        },
    };
    Ok(res)
}

/// Models a surface expression at integer type.
pub fn int_expr(scope: &Scope, expr: &ast::Expr) -> Res<IntExpr<Sym<Var>>> {
    if let ast::Expr::Sym { name, args } = expr {
        let args = args
            .iter()
            .map(|arg| any_expr(scope, arg))
            .collect::<Res<Vec<_>>>()?;
        return Ok(IntExpr::Var(Sym::sym(name, args)));
    }
    match any_expr(scope, expr)? {
        Expr::Int(res) => Ok(res),
        other => bail!(
            "expected an `int` expression, got `{}` of type `{}`",
            expr,
            other.typ(),
        ),
    }
}

/// Models a surface expression at Boolean type.
pub fn bool_expr(scope: &Scope, expr: &ast::Expr) -> Res<BoolExpr<Sym<Var>>> {
    match any_expr(scope, expr)? {
        Expr::Bool(res) => Ok(res),
        other => bail!(
            "expected a `bool` expression, got `{}` of type `{}`",
            expr,
            other.typ(),
        ),
    }
}

/// Models a surface expression at array type.
pub fn array_expr(scope: &Scope, expr: &ast::Expr) -> Res<ArrayExpr<Sym<Var>>> {
    match any_expr(scope, expr)? {
        Expr::Array(res) => Ok(res),
        other => bail!(
            "expected an array expression, got `{}` of type `{}`",
            expr,
            other.typ(),
        ),
    }
}

/// Root identifier of an lvalue expression, if any.
fn lvalue_root(expr: &ast::Expr) -> Option<&str> {
    match expr {
        ast::Expr::Ident(id) => Some(id),
        ast::Expr::Idx { arr, .. } => lvalue_root(arr),
        _ => None,
    }
}

/// Performs modelling over one script, carrying the scope and prototypes.
struct Modeller<'scr> {
    /// Variables in scope.
    scope: Scope,
    /// Known prototypes.
    protos: &'scr [ViewProto],
}
impl<'scr> Modeller<'scr> {
    /// Models a desugared guarded view.
    fn gview(&self, dgv: &DesugaredGView) -> Res<GView<Sym<Var>>> {
        let mut res = Multiset::new();
        for (guard, func) in dgv {
            let cond = bool_expr(&self.scope, guard)?;
            let proto = match self.protos.iter().find(|p| p.name() == func.name) {
                Some(proto) => proto,
                None => bail!("view `{}` is not declared", func.name),
            };
            if func.params.len() != proto.params().len() {
                bail!(ErrorKind::CountMismatch(
                    proto.params().len(),
                    func.params.len(),
                ))
            }
            let mut params = vec![];
            for (arg, (typ, id)) in func.params.iter().zip(proto.params().iter()) {
                let arg = match typ {
                    Typ::Int => Expr::Int(int_expr(&self.scope, arg)?),
                    Typ::Bool => Expr::Bool(bool_expr(&self.scope, arg)?),
                    Typ::Array { .. } => {
                        let arr = array_expr(&self.scope, arg)?;
                        if !arr.typ().compatible(typ) {
                            bail!(ErrorKind::TypeMismatch(
                                id.clone(),
                                typ.to_string(),
                                arr.typ().to_string(),
                            ))
                        }
                        Expr::Array(arr)
                    }
                };
                params.push(arg)
            }
            res.insert(Guarded::new(cond, Func::new(&func.name, params)))
        }
        Ok(res)
    }

    /// Models a view annotation.
    fn view(&self, view: &DView) -> Res<MView> {
        view.clone().try_map(|dgv| self.gview(&dgv))
    }

    /// Models a desugared atomic statement.
    fn atomic(&self, atomic: &DesugaredAtomic) -> Res<PrimCommand> {
        match atomic {
            DesugaredAtomic::Prim(prim) => self.prim_atomic(prim),
            DesugaredAtomic::Cond { cond, tru, fls } => Ok(PrimCommand::Branch {
                cond: bool_expr(&self.scope, cond)?,
                tru: tru
                    .iter()
                    .map(|a| self.atomic(a))
                    .collect::<Res<Vec<_>>>()?,
                fls: fls
                    .iter()
                    .map(|a| self.atomic(a))
                    .collect::<Res<Vec<_>>>()?,
            }),
        }
    }

    /// Models a primitive atomic statement onto the base vocabulary.
    fn prim_atomic(&self, atomic: &Atomic) -> Res<PrimCommand> {
        match atomic {
            Atomic::Fetch { dest, src, mode } => {
                let dest_m = any_expr(&self.scope, dest)?;
                let typ = dest_m.typ();
                match (&typ, mode) {
                    (Typ::Int, FetchMode::Direct) => {
                        let name = if self.stores_to_shared(dest) {
                            "!IStore"
                        } else {
                            "!ILoad"
                        };
                        Ok(PrimCommand::Stored {
                            name: name.into(),
                            args: vec![Expr::Int(int_expr(&self.scope, src)?)],
                            results: vec![dest_m],
                        })
                    }
                    (Typ::Bool, FetchMode::Direct) => {
                        let name = if self.stores_to_shared(dest) {
                            "!BStore"
                        } else {
                            "!BLoad"
                        };
                        Ok(PrimCommand::Stored {
                            name: name.into(),
                            args: vec![Expr::Bool(bool_expr(&self.scope, src)?)],
                            results: vec![dest_m],
                        })
                    }
                    (Typ::Int, FetchMode::Incr) | (Typ::Int, FetchMode::Decr) => {
                        let name = if *mode == FetchMode::Incr {
                            "!ILoad++"
                        } else {
                            "!ILoad--"
                        };
                        let src_m = any_expr(&self.scope, src)?;
                        if src_m.typ() != Typ::Int {
                            bail!(
                                "cannot increment `{}` of type `{}`",
                                src,
                                src_m.typ(),
                            )
                        }
                        Ok(PrimCommand::Stored {
                            name: name.into(),
                            args: vec![src_m.clone()],
                            results: vec![dest_m, src_m],
                        })
                    }
                    (typ, FetchMode::Direct) => bail!(
                        "cannot assign `{}` of type `{}` as a whole",
                        dest,
                        typ,
                    ),
                    (typ, _) => bail!("cannot increment `{}` of type `{}`", dest, typ),
                }
            }
            Atomic::Postfix { operand, mode } => {
                let operand_m = any_expr(&self.scope, operand)?;
                if operand_m.typ() != Typ::Int {
                    bail!(
                        "cannot increment `{}` of type `{}`",
                        operand,
                        operand_m.typ(),
                    )
                }
                let name = match mode {
                    FetchMode::Incr => "!I++",
                    FetchMode::Decr => "!I--",
                    FetchMode::Direct => bail!(ErrorKind::BadSemantics(
                        "postfix statement without a direction".into()
                    )),
                };
                Ok(PrimCommand::Stored {
                    name: name.into(),
                    args: vec![],
                    results: vec![operand_m],
                })
            }
            Atomic::Cas { dest, test, set } => {
                let dest_m = any_expr(&self.scope, dest)?;
                let (name, args) = match dest_m.typ() {
                    Typ::Int => (
                        "ICAS",
                        vec![Expr::Int(int_expr(&self.scope, set)?)],
                    ),
                    Typ::Bool => (
                        "BCAS",
                        vec![Expr::Bool(bool_expr(&self.scope, set)?)],
                    ),
                    typ => bail!("cannot CAS `{}` of type `{}`", dest, typ),
                };
                let test_m = any_expr(&self.scope, test)?;
                Ok(PrimCommand::Stored {
                    name: name.into(),
                    args,
                    results: vec![dest_m, test_m],
                })
            }
            Atomic::Havoc(id) => {
                let typ = self.scope.typ_of(id)?;
                let name = match typ {
                    Typ::Int => "IHavoc",
                    Typ::Bool => "BHavoc",
                    typ => bail!("cannot havoc `{}` of type `{}`", id, typ),
                };
                Ok(PrimCommand::Stored {
                    name: name.into(),
                    args: vec![],
                    results: vec![Expr::of_var(Sym::Reg(Var::new(id, typ.clone())), &typ)],
                })
            }
            Atomic::Id => Ok(PrimCommand::Stored {
                name: "Id".into(),
                args: vec![],
                results: vec![],
            }),
            Atomic::Assume(cond) => Ok(assume(bool_expr(&self.scope, cond)?)),
            Atomic::Assert(_) | Atomic::Error | Atomic::Cond { .. } => {
                bail!(ErrorKind::BadSemantics(
                    "assert/error/conditional atomic survived desugaring".into()
                ))
            }
        }
    }

    /// True if the lvalue writes to a shared variable.
    fn stores_to_shared(&self, lvalue: &ast::Expr) -> bool {
        match lvalue_root(lvalue) {
            Some(id) => self.scope.is_shared(id),
            None => false,
        }
    }

    /// Models a full command into a primitive list, one stage per atomic.
    fn command(&self, atomics: &[DesugaredAtomic]) -> Res<Vec<PrimCommand>> {
        atomics.iter().map(|a| self.atomic(a)).collect()
    }

    /// Axiomatises a block; returns its modelled pre- and post-views.
    fn block_axioms(
        &self,
        blk: &FullBlock<DView, FullCommand>,
        out: &mut Vec<Axiom>,
    ) -> Res<(MView, MView)> {
        let pre = self.view(&blk.pre)?;
        let mut cur = pre.clone();
        for (cmd, post_view) in &blk.cmds {
            let post = self.view(post_view)?;
            match cmd {
                FullCommand::Prim(atomics) => out.push(Axiom {
                    pre: cur.clone(),
                    cmd: self.command(atomics)?,
                    post: post.clone(),
                }),
                FullCommand::If { cond, tru, fls } => {
                    let cond = bool_expr(&self.scope, cond)?;
                    let (t_pre, t_post) = self.block_axioms(tru, out)?;
                    out.push(Axiom {
                        pre: cur.clone(),
                        cmd: vec![assume(cond.clone())],
                        post: t_pre,
                    });
                    out.push(Axiom {
                        pre: t_post,
                        cmd: vec![],
                        post: post.clone(),
                    });
                    match fls {
                        Some(fls) => {
                            let (f_pre, f_post) = self.block_axioms(fls, out)?;
                            out.push(Axiom {
                                pre: cur.clone(),
                                cmd: vec![assume(cond.negate())],
                                post: f_pre,
                            });
                            out.push(Axiom {
                                pre: f_post,
                                cmd: vec![],
                                post: post.clone(),
                            });
                        }
                        None => out.push(Axiom {
                            pre: cur.clone(),
                            cmd: vec![assume(cond.negate())],
                            post: post.clone(),
                        }),
                    }
                }
                FullCommand::While { cond, block } => {
                    let cond = bool_expr(&self.scope, cond)?;
                    let (b_pre, b_post) = self.block_axioms(block, out)?;
                    // Entry, loop back, and exit edges.
                    out.push(Axiom {
                        pre: cur.clone(),
                        cmd: vec![assume(cond.clone())],
                        post: b_pre,
                    });
                    out.push(Axiom {
                        pre: b_post,
                        cmd: vec![],
                        post: cur.clone(),
                    });
                    out.push(Axiom {
                        pre: cur.clone(),
                        cmd: vec![assume(cond.negate())],
                        post: post.clone(),
                    });
                }
                FullCommand::DoWhile { block, cond } => {
                    let cond = bool_expr(&self.scope, cond)?;
                    let (b_pre, b_post) = self.block_axioms(block, out)?;
                    out.push(Axiom {
                        pre: cur.clone(),
                        cmd: vec![],
                        post: b_pre.clone(),
                    });
                    out.push(Axiom {
                        pre: b_post.clone(),
                        cmd: vec![assume(cond.clone())],
                        post: b_pre,
                    });
                    out.push(Axiom {
                        pre: b_post,
                        cmd: vec![assume(cond.negate())],
                        post: post.clone(),
                    });
                }
                FullCommand::Blocks(blocks) => {
                    for block in blocks {
                        let (b_pre, b_post) = self.block_axioms(block, out)?;
                        out.push(Axiom {
                            pre: cur.clone(),
                            cmd: vec![],
                            post: b_pre,
                        });
                        out.push(Axiom {
                            pre: b_post,
                            cmd: vec![],
                            post: post.clone(),
                        });
                    }
                }
            }
            cur = post
        }
        Ok((pre, cur))
    }

    /// Models a constraint.
    fn constraint(&self, constraint: &ast::Constraint) -> Res<Constraint> {
        let mut pattern = vec![];
        let mut binders = vec![];
        for func in &constraint.pattern {
            let proto = match self.protos.iter().find(|p| p.name() == func.name) {
                Some(proto) => proto,
                None => bail!("view `{}` is not declared", func.name),
            };
            if func.params.len() != proto.params().len() {
                bail!(ErrorKind::CountMismatch(
                    proto.params().len(),
                    func.params.len(),
                ))
            }
            let params: Vec<Var> = func
                .params
                .iter()
                .zip(proto.params().iter())
                .map(|(id, (typ, _))| Var::new(id, typ.clone()))
                .collect();
            for param in &params {
                binders.push((param.typ(), param.id().to_string()))
            }
            pattern.push(Func::new(&func.name, params))
        }

        let def = match &constraint.def {
            None => None,
            Some(def) => {
                let shared: Vec<(Typ, String)> = self
                    .scope
                    .shared
                    .iter()
                    .map(|(id, typ)| (typ.clone(), id.clone()))
                    .collect();
                let scope = Scope::new(&shared, &binders);
                Some(bool_expr(&scope, def)?)
            }
        };

        Ok(Constraint { pattern, def })
    }
}

/// Builds the `Assume` command over a condition.
fn assume(cond: BoolExpr<Sym<Var>>) -> PrimCommand {
    PrimCommand::Stored {
        name: "Assume".into(),
        args: vec![Expr::Bool(cond)],
        results: vec![],
    }
}

/// Models a whole desugared script.
pub fn model(des: &Desugared, semantics: PrimSemanticsMap) -> Res<Model> {
    let modeller = Modeller {
        scope: Scope::new(&des.shared, &des.thread),
        protos: &des.protos,
    };

    let mut axioms = vec![];
    for method in &des.methods {
        modeller
            .block_axioms(&method.block, &mut axioms)
            .chain_err(|| format!("while modelling method `{}`", method.name))?;
    }

    let constraints = des
        .constraints
        .iter()
        .map(|c| modeller.constraint(c))
        .collect::<Res<Vec<_>>>()?;

    Ok(Model {
        shared: des.shared.clone(),
        thread: des.thread.clone(),
        protos: des.protos.clone(),
        constraints,
        axioms,
        semantics,
        search_depth: des.search_depth,
    })
}
