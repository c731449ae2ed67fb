//! Primitive-command semantics: schemas, instantiation, and routine-to-Boolean translation.
//!
//! Every primitive command names a schema in a [`PrimSemanticsMap`]; instantiation substitutes the
//! caller's expressions for the schema's parameters, yielding a microcode listing. A command is a
//! *routine*, a sequence of such listings composed sequentially: translation marks each stage,
//! conjoins the stages' Boolean encodings, and closes the result with a frame equating the
//! post-state of every unassigned variable with its last-known marker.

crate::prelude!();

use expr::{BoolExpr, Expr, HasTyp, IntExpr, MarkedVar, Sym, Typ, Var};
use microcode::Microcode;
use sub::{SubCtx, VarSubst};

#[cfg(test)]
mod test;

/// The semantic schema of a primitive.
#[derive(Debug, Clone)]
pub struct PrimSemantics {
    /// Typed input parameters.
    pub args: Vec<Var>,
    /// Typed output parameters.
    pub results: Vec<Var>,
    /// The microcode body, over the parameters.
    pub body: Vec<Microcode<Expr<Var>, Var>>,
}

/// Maps primitive names to their schemas.
pub type PrimSemanticsMap = Map<String, PrimSemantics>;

/// A modelled primitive command.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrimCommand {
    /// A call to a named primitive.
    Stored {
        /// Name of the primitive.
        name: String,
        /// Input expressions.
        args: Vec<Expr<Sym<Var>>>,
        /// Output lvalue expressions.
        results: Vec<Expr<Sym<Var>>>,
    },
    /// A conditional over primitive commands.
    Branch {
        /// The condition.
        cond: BoolExpr<Sym<Var>>,
        /// Commands when the condition holds.
        tru: Vec<PrimCommand>,
        /// Commands when it does not.
        fls: Vec<PrimCommand>,
    },
}
impl fmt::Display for PrimCommand {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Stored {
                name,
                args,
                results,
            } => {
                write!(fmt, "{}(", name)?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        write!(fmt, ", ")?;
                    }
                    arg.fmt(fmt)?;
                }
                write!(fmt, ")")?;
                if !results.is_empty() {
                    write!(fmt, " -> (")?;
                    for (idx, result) in results.iter().enumerate() {
                        if idx > 0 {
                            write!(fmt, ", ")?;
                        }
                        result.fmt(fmt)?;
                    }
                    write!(fmt, ")")?;
                }
                Ok(())
            }
            Self::Branch { cond, tru, fls } => {
                write!(fmt, "if {} {{", cond)?;
                for cmd in tru {
                    write!(fmt, " {};", cmd)?;
                }
                write!(fmt, " }} else {{")?;
                for cmd in fls {
                    write!(fmt, " {};", cmd)?;
                }
                write!(fmt, " }}")
            }
        }
    }
}

/// Substitutes schema parameters by caller expressions.
struct SchemaSubst<'call> {
    /// Parameter name to caller expression.
    map: &'call Map<String, Expr<Sym<Var>>>,
}
impl<'call> VarSubst<Var, Sym<Var>> for SchemaSubst<'call> {
    fn int_var(&mut self, _: SubCtx, var: &Var) -> Res<IntExpr<Sym<Var>>> {
        match self.map.get(var.id()) {
            None => bail!(ErrorKind::FreeVarInSub(var.id().into())),
            Some(Expr::Int(expr)) => Ok(expr.clone()),
            Some(other) => bail!(ErrorKind::TypeMismatch(
                var.id().into(),
                "int".into(),
                other.typ().to_string(),
            )),
        }
    }
    fn bool_var(&mut self, _: SubCtx, var: &Var) -> Res<BoolExpr<Sym<Var>>> {
        match self.map.get(var.id()) {
            None => bail!(ErrorKind::FreeVarInSub(var.id().into())),
            Some(Expr::Bool(expr)) => Ok(expr.clone()),
            Some(other) => bail!(ErrorKind::TypeMismatch(
                var.id().into(),
                "bool".into(),
                other.typ().to_string(),
            )),
        }
    }
    fn array_var(
        &mut self,
        _: SubCtx,
        var: &Var,
        elt: &Typ,
        len: Option<usize>,
    ) -> Res<expr::ArrayExpr<Sym<Var>>> {
        match self.map.get(var.id()) {
            None => bail!(ErrorKind::FreeVarInSub(var.id().into())),
            Some(Expr::Array(expr)) => Ok(expr.clone()),
            Some(other) => bail!(ErrorKind::TypeMismatch(
                var.id().into(),
                Typ::array(elt.clone(), len).to_string(),
                other.typ().to_string(),
            )),
        }
    }
}

/// Substitutes through one schema instruction.
fn subst_instr(
    subst: &mut SchemaSubst,
    instr: &Microcode<Expr<Var>, Var>,
) -> Res<Microcode<Expr<Sym<Var>>, Sym<Var>>> {
    let ctx = SubCtx::positive();
    let res = match instr {
        Microcode::Assign { lvalue, rvalue } => Microcode::Assign {
            lvalue: sub::any_expr(subst, ctx, lvalue)?,
            rvalue: match rvalue {
                Some(rvalue) => Some(sub::any_expr(subst, ctx, rvalue)?),
                None => None,
            },
        },
        Microcode::Assume(cond) => Microcode::Assume(sub::bool_expr(subst, ctx, cond)?),
        Microcode::Branch { cond, tru, fls } => Microcode::Branch {
            cond: sub::bool_expr(subst, ctx, cond)?,
            tru: tru
                .iter()
                .map(|instr| subst_instr(subst, instr))
                .collect::<Res<Vec<_>>>()?,
            fls: fls
                .iter()
                .map(|instr| subst_instr(subst, instr))
                .collect::<Res<Vec<_>>>()?,
        },
    };
    Ok(res)
}

/// Checks a caller parameter list against a schema parameter list, and extends the substitution.
fn bind_params(
    schema: &[Var],
    caller: &[Expr<Sym<Var>>],
    map: &mut Map<String, Expr<Sym<Var>>>,
) -> Res<()> {
    if schema.len() != caller.len() {
        bail!(ErrorKind::CountMismatch(schema.len(), caller.len()))
    }
    for (param, expr) in schema.iter().zip(caller.iter()) {
        let (expected, actual) = (param.typ(), expr.typ());
        if !actual.compatible(&expected) {
            bail!(ErrorKind::TypeMismatch(
                param.id().into(),
                expected.to_string(),
                actual.to_string(),
            ))
        }
        map.insert(param.id().into(), expr.clone());
    }
    Ok(())
}

/// Instantiates a primitive command into a microcode listing.
///
/// Failures during the instantiation of a named primitive are wrapped in
/// [`ErrorKind::Instantiate`].
pub fn instantiate(
    map: &PrimSemanticsMap,
    prim: &PrimCommand,
) -> Res<Vec<Microcode<Expr<Sym<Var>>, Sym<Var>>>> {
    match prim {
        PrimCommand::Stored {
            name,
            args,
            results,
        } => instantiate_stored(map, name, args, results)
            .chain_err(|| ErrorKind::Instantiate(name.clone())),
        PrimCommand::Branch { cond, tru, fls } => {
            let mut tru_instrs = vec![];
            for cmd in tru {
                tru_instrs.extend(instantiate(map, cmd)?)
            }
            let mut fls_instrs = vec![];
            for cmd in fls {
                fls_instrs.extend(instantiate(map, cmd)?)
            }
            Ok(vec![Microcode::Branch {
                cond: cond.clone(),
                tru: tru_instrs,
                fls: fls_instrs,
            }])
        }
    }
}

/// Instantiates a call to a named primitive.
fn instantiate_stored(
    map: &PrimSemanticsMap,
    name: &str,
    args: &[Expr<Sym<Var>>],
    results: &[Expr<Sym<Var>>],
) -> Res<Vec<Microcode<Expr<Sym<Var>>, Sym<Var>>>> {
    let schema = match map.get(name) {
        Some(schema) => schema,
        None => bail!(ErrorKind::MissingDef(name.into())),
    };

    let mut binding = Map::new();
    bind_params(&schema.args, args, &mut binding)?;
    bind_params(&schema.results, results, &mut binding)?;

    let mut subst = SchemaSubst { map: &binding };
    schema
        .body
        .iter()
        .map(|instr| subst_instr(&mut subst, instr))
        .collect()
}

/// Translates one marked instruction into a Boolean.
fn instr_to_bool(instr: &Microcode<MarkedVar, Sym<MarkedVar>>) -> Res<BoolExpr<Sym<MarkedVar>>> {
    match instr {
        Microcode::Assign {
            lvalue,
            rvalue: Some(rvalue),
        } => {
            let lhs = Expr::of_var(Sym::Reg(lvalue.clone()), &lvalue.typ());
            BoolExpr::eq(lhs, rvalue.clone())
        }
        // A havoc constrains nothing.
        Microcode::Assign { rvalue: None, .. } => Ok(BoolExpr::Lit(true)),
        Microcode::Assume(cond) => Ok(cond.clone()),
        Microcode::Branch { cond, tru, fls } => {
            let tru = BoolExpr::And(
                tru.iter()
                    .map(instr_to_bool)
                    .collect::<Res<Vec<_>>>()?,
            );
            let fls = BoolExpr::And(
                fls.iter()
                    .map(instr_to_bool)
                    .collect::<Res<Vec<_>>>()?,
            );
            Ok(BoolExpr::And(vec![
                BoolExpr::implies(cond.clone(), tru),
                BoolExpr::implies(cond.clone().negate(), fls),
            ]))
        }
    }
}

/// Composes a routine into a two-state Boolean over `vars`.
///
/// Stage `i` of `n` marks its lvalues `Intermediate(i, _)`, except the last stage which marks them
/// `After`. Rvalues read the last marker recorded for their variable, starting from `Before`. The
/// result is closed with the frame: `After(v) = latest(v)` for every variable whose latest marker
/// is not already `After`.
pub fn routine_to_bool(
    listings: &[Vec<Microcode<Expr<Sym<Var>>, Sym<Var>>>],
    vars: &[(Typ, String)],
) -> Res<BoolExpr<Sym<MarkedVar>>> {
    let mut state: Map<String, MarkedVar> = vars
        .iter()
        .map(|(typ, id)| (id.clone(), MarkedVar::Before(Var::new(id, typ.clone()))))
        .collect();

    let count = listings.len();
    let mut conj = vec![];

    for (stage, listing) in listings.iter().enumerate() {
        let last = stage + 1 == count;
        let marker = move |var: &Var| {
            if last {
                MarkedVar::After(var.clone())
            } else {
                MarkedVar::Intermediate(stage, var.clone())
            }
        };

        let normed = microcode::normalise(listing)?;
        let marked = microcode::mark_listing(&marker, &state, &normed)?;
        for instr in &marked {
            conj.push(instr_to_bool(instr)?)
        }

        let mut assigned = Set::new();
        microcode::assigned_vars(&normed, &mut assigned);
        for var in assigned {
            state.insert(var.id().into(), marker(&var));
        }
    }

    // Frame, in declaration order.
    for (typ, id) in vars {
        if let Some(latest) = state.get(id) {
            if !latest.is_after() {
                let var = Var::new(id, typ.clone());
                let lhs = Expr::of_var(Sym::Reg(MarkedVar::After(var)), typ);
                let rhs = Expr::of_var(Sym::Reg(latest.clone()), typ);
                conj.push(BoolExpr::Eq(Box::new(lhs), Box::new(rhs)))
            }
        }
    }

    Ok(BoolExpr::And(conj))
}

/// A command paired with its two-state semantics.
#[derive(Debug, Clone)]
pub struct CommandSemantics {
    /// The original command.
    pub cmd: Vec<PrimCommand>,
    /// Its two-state Boolean encoding, simplified.
    pub semantics: BoolExpr<Sym<MarkedVar>>,
}
impl fmt::Display for CommandSemantics {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "<")?;
        for (idx, cmd) in self.cmd.iter().enumerate() {
            if idx > 0 {
                write!(fmt, "; ")?;
            }
            cmd.fmt(fmt)?;
        }
        write!(fmt, "> : {}", self.semantics)
    }
}

/// Builds the semantics of a command, one stage per primitive.
pub fn command_semantics(
    map: &PrimSemanticsMap,
    cmd: &[PrimCommand],
    vars: &[(Typ, String)],
) -> Res<CommandSemantics> {
    let listings = cmd
        .iter()
        .map(|prim| instantiate(map, prim))
        .collect::<Res<Vec<_>>>()?;
    let semantics = routine_to_bool(&listings, vars)?.simp();
    Ok(CommandSemantics {
        cmd: cmd.to_vec(),
        semantics,
    })
}

/// The built-in semantics map for the primitive vocabulary.
///
/// Scripts do not declare these: the modeller lowers surface statements onto them. `ICAS`/`BCAS`
/// branch inside a single stage; the `++`/`--` flavors read and write their operand in one
/// listing, so both sides see the pre-stage value.
pub fn base_semantics() -> PrimSemanticsMap {
    let ivar = |id: &str| Var::new(id, Typ::Int);
    let bvar = |id: &str| Var::new(id, Typ::Bool);
    let iexpr = |id: &str| Expr::Int(IntExpr::Var(ivar(id)));
    let bexpr = |id: &str| Expr::Bool(BoolExpr::Var(bvar(id)));
    let assign = |lvalue: Expr<Var>, rvalue: Expr<Var>| Microcode::Assign {
        lvalue,
        rvalue: Some(rvalue),
    };
    let shift = |id: &str, up: bool, by: Int| {
        let op = vec![IntExpr::Var(ivar(id)), IntExpr::Lit(by)];
        Expr::Int(if up { IntExpr::Add(op) } else { IntExpr::Sub(op) })
    };

    let mut map = Map::new();

    map.insert(
        "Id".to_string(),
        PrimSemantics {
            args: vec![],
            results: vec![],
            body: vec![],
        },
    );
    map.insert(
        "Assume".to_string(),
        PrimSemantics {
            args: vec![bvar("x")],
            results: vec![],
            body: vec![Microcode::Assume(BoolExpr::Var(bvar("x")))],
        },
    );
    map.insert(
        "!ILoad".to_string(),
        PrimSemantics {
            args: vec![ivar("src")],
            results: vec![ivar("dest")],
            body: vec![assign(iexpr("dest"), iexpr("src"))],
        },
    );
    map.insert(
        "!ILoad++".to_string(),
        PrimSemantics {
            args: vec![ivar("src")],
            results: vec![ivar("dest"), ivar("src")],
            body: vec![
                assign(iexpr("dest"), iexpr("src")),
                assign(iexpr("src"), shift("src", true, Int::one())),
            ],
        },
    );
    map.insert(
        "!ILoad--".to_string(),
        PrimSemantics {
            args: vec![ivar("src")],
            results: vec![ivar("dest"), ivar("src")],
            body: vec![
                assign(iexpr("dest"), iexpr("src")),
                assign(iexpr("src"), shift("src", false, Int::one())),
            ],
        },
    );
    map.insert(
        "!IStore".to_string(),
        PrimSemantics {
            args: vec![ivar("src")],
            results: vec![ivar("dest")],
            body: vec![assign(iexpr("dest"), iexpr("src"))],
        },
    );
    map.insert(
        "!BLoad".to_string(),
        PrimSemantics {
            args: vec![bvar("src")],
            results: vec![bvar("dest")],
            body: vec![assign(bexpr("dest"), bexpr("src"))],
        },
    );
    map.insert(
        "!BStore".to_string(),
        PrimSemantics {
            args: vec![bvar("src")],
            results: vec![bvar("dest")],
            body: vec![assign(bexpr("dest"), bexpr("src"))],
        },
    );
    map.insert(
        "!I++".to_string(),
        PrimSemantics {
            args: vec![],
            results: vec![ivar("src")],
            body: vec![assign(iexpr("src"), shift("src", true, Int::one()))],
        },
    );
    map.insert(
        "!I--".to_string(),
        PrimSemantics {
            args: vec![],
            results: vec![ivar("src")],
            body: vec![assign(iexpr("src"), shift("src", false, Int::one()))],
        },
    );
    map.insert(
        "ICAS".to_string(),
        PrimSemantics {
            args: vec![ivar("set")],
            results: vec![ivar("dest"), ivar("test")],
            body: vec![Microcode::Branch {
                cond: BoolExpr::Eq(Box::new(iexpr("dest")), Box::new(iexpr("test"))),
                tru: vec![assign(iexpr("dest"), iexpr("set"))],
                fls: vec![assign(iexpr("test"), iexpr("dest"))],
            }],
        },
    );
    map.insert(
        "BCAS".to_string(),
        PrimSemantics {
            args: vec![bvar("set")],
            results: vec![bvar("dest"), bvar("test")],
            body: vec![Microcode::Branch {
                cond: BoolExpr::Eq(Box::new(bexpr("dest")), Box::new(bexpr("test"))),
                tru: vec![assign(bexpr("dest"), bexpr("set"))],
                fls: vec![assign(bexpr("test"), bexpr("dest"))],
            }],
        },
    );
    map.insert(
        "IHavoc".to_string(),
        PrimSemantics {
            args: vec![],
            results: vec![ivar("x")],
            body: vec![Microcode::Assign {
                lvalue: iexpr("x"),
                rvalue: None,
            }],
        },
    );
    map.insert(
        "BHavoc".to_string(),
        PrimSemantics {
            args: vec![],
            results: vec![bvar("x")],
            body: vec![Microcode::Assign {
                lvalue: bexpr("x"),
                rvalue: None,
            }],
        },
    );

    map
}
