//! Lowers surface views and atomics onto their desugared forms.
//!
//! Desugaring rewrites every syntactic view into a list of guarded view atoms, lowers `assert` and
//! `error` onto an assignment to a synthesized error-tracking Boolean, and fills every annotation
//! gap of a method body with a fresh unknown view. It threads a [`DesugarCtx`] that records the
//! names generated so far; generators only ever add to the context.

crate::prelude!();

use ast::{AFunc, Atomic, BlockEntry, Command, FetchMode, Marked, View};
use expr::{Func, Typ};
use view::{ViewExpr, ViewProto};

#[cfg(test)]
mod test;

/// A desugared view: a list of (guard, view atom) pairs.
///
/// The guard is `true` for unconditional atoms. Guards are still surface expressions at this
/// stage; the modeller types them later.
pub type DesugaredGView = Vec<(ast::Expr, AFunc)>;

/// A desugared atomic: conditionals survive, everything else is a primitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DesugaredAtomic {
    /// A primitive atomic statement.
    Prim(Atomic),
    /// A conditional atomic.
    Cond {
        /// The condition.
        cond: ast::Expr,
        /// Statements when the condition holds.
        tru: Vec<DesugaredAtomic>,
        /// Statements when it does not.
        fls: Vec<DesugaredAtomic>,
    },
}

/// A block in which every command is paired with the view holding after it.
///
/// The view paired with the last command is the block's postcondition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FullBlock<V, C> {
    /// The block's precondition.
    pub pre: V,
    /// The commands, each paired with its postcondition.
    pub cmds: Vec<(C, V)>,
}

/// A view annotation after desugaring.
pub type DView = ViewExpr<DesugaredGView>;

/// A desugared command.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FullCommand {
    /// A set of primitive atomics, run as one command.
    Prim(Vec<DesugaredAtomic>),
    /// A conditional.
    If {
        /// The condition.
        cond: ast::Expr,
        /// The then-branch.
        tru: FullBlock<DView, FullCommand>,
        /// The else-branch, if any.
        fls: Option<FullBlock<DView, FullCommand>>,
    },
    /// A while loop.
    While {
        /// The condition.
        cond: ast::Expr,
        /// The body.
        block: FullBlock<DView, FullCommand>,
    },
    /// A do-while loop.
    DoWhile {
        /// The body.
        block: FullBlock<DView, FullCommand>,
        /// The condition.
        cond: ast::Expr,
    },
    /// Parallel composition.
    Blocks(Vec<FullBlock<DView, FullCommand>>),
}

/// The state threaded through desugaring.
///
/// Grows monotonically: generators only add variables and prototypes. Names in
/// `generated_protos ∪ existing_protos` are unique; `okay_bool`, when present, occurs in
/// `shared_vars` with type `bool`; the lift view, when present, has exactly one `bool` parameter.
#[derive(Debug, Clone)]
pub struct DesugarCtx {
    /// Shared variables, in declaration order.
    pub shared_vars: Vec<(Typ, String)>,
    /// Thread-local variables, in declaration order.
    pub thread_vars: Vec<(Typ, String)>,
    /// Name of the Boolean-lifting view, once generated.
    pub local_lift_view: Option<String>,
    /// Prototypes generated by desugaring.
    pub generated_protos: Set<ViewProto>,
    /// Prototypes declared by the script.
    pub existing_protos: Set<ViewProto>,
    /// Name of the error-tracking Boolean, once generated.
    pub okay_bool: Option<String>,
}
impl DesugarCtx {
    /// Constructor.
    ///
    /// Fails if two declared prototypes share a name.
    pub fn new(
        shared_vars: Vec<(Typ, String)>,
        thread_vars: Vec<(Typ, String)>,
        protos: &[ViewProto],
    ) -> Res<Self> {
        let mut existing_protos = Set::new();
        for proto in protos {
            if existing_protos
                .iter()
                .any(|prev: &ViewProto| prev.name() == proto.name())
            {
                bail!("view `{}` is declared twice", proto.name())
            }
            existing_protos.insert(proto.clone());
        }
        Ok(Self {
            shared_vars,
            thread_vars,
            local_lift_view: None,
            generated_protos: Set::new(),
            existing_protos,
            okay_bool: None,
        })
    }

    /// True if some prototype, declared or generated, has this name.
    fn proto_name_taken(&self, name: &str) -> bool {
        self.existing_protos.iter().any(|p| p.name() == name)
            || self.generated_protos.iter().any(|p| p.name() == name)
    }

    /// Smallest `{prefix}{n}` not naming a prototype.
    fn fresh_proto_name(&self, prefix: &str) -> String {
        let mut n = 0;
        loop {
            let candidate = format!("{}{}", prefix, n);
            if !self.proto_name_taken(&candidate) {
                return candidate;
            }
            n += 1
        }
    }

    /// Smallest `{prefix}{n}` not naming a shared or thread variable.
    fn fresh_var_name(&self, prefix: &str) -> String {
        let taken = |name: &str| {
            self.shared_vars.iter().any(|(_, id)| id == name)
                || self.thread_vars.iter().any(|(_, id)| id == name)
        };
        let mut n = 0;
        loop {
            let candidate = format!("{}{}", prefix, n);
            if !taken(&candidate) {
                return candidate;
            }
            n += 1
        }
    }

    /// The Boolean-lifting view, generated on first use.
    pub fn lift_view(&mut self) -> String {
        if let Some(name) = &self.local_lift_view {
            return name.clone();
        }
        let name = self.fresh_proto_name("__lift_");
        self.generated_protos.insert(ViewProto::anonymous(
            &name,
            vec![(Typ::Bool, "x".to_string())],
        ));
        self.local_lift_view = Some(name.clone());
        name
    }

    /// The error-tracking Boolean, generated and prepended to the shared variables on first use.
    pub fn okay_bool(&mut self) -> String {
        if let Some(name) = &self.okay_bool {
            return name.clone();
        }
        let name = self.fresh_var_name("__ok_");
        self.shared_vars.insert(0, (Typ::Bool, name.clone()));
        self.okay_bool = Some(name.clone());
        name
    }

    /// A fresh unknown view, instantiated with the thread-local variables in declaration order.
    pub fn fresh_unknown(&mut self) -> AFunc {
        let name = self.fresh_proto_name("__unknown_");
        self.generated_protos
            .insert(ViewProto::anonymous(&name, self.thread_vars.clone()));
        let args = self
            .thread_vars
            .iter()
            .map(|(_, id)| ast::Expr::ident(id))
            .collect();
        Func::new(name, args)
    }
}

/// Conjoins a condition onto an optional suffix.
fn join_suffix(suffix: Option<&ast::Expr>, cond: ast::Expr) -> ast::Expr {
    match suffix {
        None => cond,
        Some(suffix) => ast::Expr::and(suffix.clone(), cond),
    }
}

/// Desugars a view under a guard suffix.
pub fn view(ctx: &mut DesugarCtx, suffix: Option<&ast::Expr>, view: &View) -> DesugaredGView {
    match view {
        View::Unit => vec![],
        View::Falsehood => self::view(ctx, suffix, &View::Local(ast::Expr::False)),
        View::Local(expr) => {
            let lift = ctx.lift_view();
            self::view(ctx, suffix, &View::Func(Func::new(lift, vec![expr.clone()])))
        }
        View::Func(func) => {
            let guard = suffix.cloned().unwrap_or(ast::Expr::True);
            vec![(guard, func.clone())]
        }
        View::Join(lft, rgt) => {
            let mut res = self::view(ctx, suffix, lft);
            res.extend(self::view(ctx, suffix, rgt));
            res
        }
        View::If { cond, tru, fls } => {
            let t_suffix = join_suffix(suffix, cond.clone());
            let f_suffix = join_suffix(suffix, cond.clone().negate());
            let mut res = self::view(ctx, Some(&t_suffix), tru);
            match fls {
                Some(fls) => res.extend(self::view(ctx, Some(&f_suffix), fls)),
                None => res.extend(self::view(ctx, Some(&f_suffix), &View::Unit)),
            }
            res
        }
    }
}

/// Desugars a marked view annotation.
///
/// Unknown annotations generate a fresh prototype over the thread-local variables and come out
/// advisory; everything else is mandatory.
pub fn marked_view(ctx: &mut DesugarCtx, marked: &Marked<View>) -> DView {
    match marked {
        Marked::Unmarked(v) | Marked::Questioned(v) => ViewExpr::Mandatory(view(ctx, None, v)),
        Marked::Unknown => {
            let func = ctx.fresh_unknown();
            ViewExpr::Advisory(vec![(ast::Expr::True, func)])
        }
    }
}

/// Desugars an atomic statement.
///
/// `assert e` becomes `ok := e` for the context's error-tracking Boolean; `error` is
/// `assert false`.
pub fn atomic(ctx: &mut DesugarCtx, atomic: &Atomic) -> DesugaredAtomic {
    match atomic {
        Atomic::Assert(cond) => {
            let okay = ctx.okay_bool();
            DesugaredAtomic::Prim(Atomic::Fetch {
                dest: ast::Expr::ident(okay),
                src: cond.clone(),
                mode: FetchMode::Direct,
            })
        }
        Atomic::Error => self::atomic(ctx, &Atomic::Assert(ast::Expr::False)),
        Atomic::Cond { cond, tru, fls } => DesugaredAtomic::Cond {
            cond: cond.clone(),
            tru: tru.iter().map(|a| self::atomic(ctx, a)).collect(),
            fls: match fls {
                Some(fls) => fls.iter().map(|a| self::atomic(ctx, a)).collect(),
                None => vec![],
            },
        },
        prim => DesugaredAtomic::Prim(prim.clone()),
    }
}

/// Caps and slides a block into a precondition and (command, postcondition) pairs.
///
/// Capping prepends (resp. appends) an unknown view if the block does not start (resp. end) with
/// one. The slide walks a window of size 2: two adjacent views get a `skip` between them, two
/// adjacent commands get an unknown view between them.
fn fill(block: &[BlockEntry]) -> (Marked<View>, Vec<(Command, Marked<View>)>) {
    let mut entries = block.to_vec();
    match entries.first() {
        Some(BlockEntry::View(_)) => (),
        _ => entries.insert(0, BlockEntry::View(Marked::Unknown)),
    }
    match entries.last() {
        Some(BlockEntry::View(_)) => (),
        _ => entries.push(BlockEntry::View(Marked::Unknown)),
    }

    let pre = match &entries[0] {
        BlockEntry::View(view) => view.clone(),
        BlockEntry::Cmd(_) => Marked::Unknown,
    };

    let mut cmds = vec![];
    for window in entries.windows(2) {
        match (&window[0], &window[1]) {
            (BlockEntry::View(_), BlockEntry::View(view)) => {
                cmds.push((Command::skip(), view.clone()))
            }
            (BlockEntry::View(_), BlockEntry::Cmd(_)) => (),
            (BlockEntry::Cmd(cmd), BlockEntry::View(view)) => {
                cmds.push((cmd.clone(), view.clone()))
            }
            (BlockEntry::Cmd(cmd), BlockEntry::Cmd(_)) => {
                cmds.push((cmd.clone(), Marked::Unknown))
            }
        }
    }
    (pre, cmds)
}

/// Desugars a block, left to right.
pub fn block(ctx: &mut DesugarCtx, blk: &[BlockEntry]) -> FullBlock<DView, FullCommand> {
    let (pre, pairs) = fill(blk);
    let pre = marked_view(ctx, &pre);
    let cmds = pairs
        .into_iter()
        .map(|(cmd, v)| {
            let cmd = command(ctx, &cmd);
            let v = marked_view(ctx, &v);
            (cmd, v)
        })
        .collect();
    FullBlock { pre, cmds }
}

/// Desugars a command.
pub fn command(ctx: &mut DesugarCtx, cmd: &Command) -> FullCommand {
    match cmd {
        Command::Prim(atomics) => {
            FullCommand::Prim(atomics.iter().map(|a| atomic(ctx, a)).collect())
        }
        Command::If { cond, tru, fls } => FullCommand::If {
            cond: cond.clone(),
            tru: block(ctx, tru),
            fls: fls.as_ref().map(|fls| block(ctx, fls)),
        },
        Command::While { cond, block: body } => FullCommand::While {
            cond: cond.clone(),
            block: block(ctx, body),
        },
        Command::DoWhile { block: body, cond } => FullCommand::DoWhile {
            block: block(ctx, body),
            cond: cond.clone(),
        },
        Command::Blocks(blocks) => {
            FullCommand::Blocks(blocks.iter().map(|b| block(ctx, b)).collect())
        }
    }
}

/// A desugared method.
#[derive(Debug, Clone)]
pub struct Method {
    /// Name of the method.
    pub name: String,
    /// Its filled, desugared body.
    pub block: FullBlock<DView, FullCommand>,
}

/// A desugared script.
#[derive(Debug, Clone)]
pub struct Desugared {
    /// Shared variables, including any generated error-tracking Boolean.
    pub shared: Vec<(Typ, String)>,
    /// Thread-local variables.
    pub thread: Vec<(Typ, String)>,
    /// Declared prototypes, in declaration order, followed by the generated ones.
    pub protos: Vec<ViewProto>,
    /// Constraints, untouched by desugaring.
    pub constraints: Vec<ast::Constraint>,
    /// Desugared methods.
    pub methods: Vec<Method>,
    /// Search-depth hint.
    pub search_depth: Option<usize>,
}

/// Desugars a whole collated script.
pub fn script(script: &ast::CollatedScript) -> Res<Desugared> {
    let mut ctx = DesugarCtx::new(
        script.shared.clone(),
        script.thread.clone(),
        &script.protos,
    )?;

    let methods = script
        .methods
        .iter()
        .map(|method| Method {
            name: method.name.clone(),
            block: block(&mut ctx, &method.block),
        })
        .collect();

    let mut protos = script.protos.clone();
    protos.extend(ctx.generated_protos.iter().cloned());

    Ok(Desugared {
        shared: ctx.shared_vars,
        thread: ctx.thread_vars,
        protos,
        constraints: script.constraints.clone(),
        methods,
        search_depth: script.search_depth,
    })
}
