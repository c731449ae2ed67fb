//! Microcode: the intermediate language encoding primitive-command semantics.
//!
//! A microcode listing is a set of assignments, assumptions and branches. Normalisation rewrites a
//! listing so that every assignment targets a *whole* variable, merging subscripted writes into
//! functional-update cascades through a write map. Marking then rewrites a normalised listing so
//! that every variable occurrence says which state it reads or writes.

crate::prelude!();

use expr::{ArrayExpr, BoolExpr, Expr, HasTyp, IntExpr, MarkedVar, Sym, Typ, Var};
use sub::{SubCtx, SymRenamer};

#[cfg(test)]
mod test;

/// A microcode instruction, over lvalues `L` and variables `V`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Microcode<L, V> {
    /// An assignment; a `None` right-hand side is a havoc.
    Assign {
        /// The lvalue written.
        lvalue: L,
        /// The value written, if any.
        rvalue: Option<Expr<V>>,
    },
    /// An assumption.
    Assume(BoolExpr<V>),
    /// A branch.
    Branch {
        /// The condition.
        cond: BoolExpr<V>,
        /// Instructions when the condition holds.
        tru: Vec<Microcode<L, V>>,
        /// Instructions when it does not.
        fls: Vec<Microcode<L, V>>,
    },
}
impl<L: fmt::Display, V: fmt::Display> fmt::Display for Microcode<L, V> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Assign {
                lvalue,
                rvalue: Some(rvalue),
            } => write!(fmt, "{} := {}", lvalue, rvalue),
            Self::Assign {
                lvalue,
                rvalue: None,
            } => write!(fmt, "havoc {}", lvalue),
            Self::Assume(cond) => write!(fmt, "assume {}", cond),
            Self::Branch { cond, tru, fls } => {
                write!(fmt, "if {} {{", cond)?;
                for instr in tru {
                    write!(fmt, " {};", instr)?;
                }
                write!(fmt, " }} else {{")?;
                for instr in fls {
                    write!(fmt, " {};", instr)?;
                }
                write!(fmt, " }}")
            }
        }
    }
}

/// Collects the variables assigned anywhere in a listing, branches included.
pub fn assigned_vars<L: Clone + Ord, V>(instrs: &[Microcode<L, V>], set: &mut Set<L>) {
    for instr in instrs {
        match instr {
            Microcode::Assign { lvalue, .. } => {
                set.insert(lvalue.clone());
            }
            Microcode::Assume(_) => (),
            Microcode::Branch { tru, fls, .. } => {
                assigned_vars(tru, set);
                assigned_vars(fls, set)
            }
        }
    }
}

/// Records which components of a possibly-nested-array variable a listing wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteRec {
    /// The whole variable was written; `None` is a havoc.
    Entire(Option<Expr<Sym<Var>>>),
    /// Some components were written, keyed by index expression in first-write order.
    Indices(Vec<(IntExpr<Sym<Var>>, WriteRec)>),
}

/// Extracts the index path of an lvalue expression.
///
/// A well-formed lvalue is a variable, subscripted zero or more times. Symbolic lvalues yield
/// `None`: they carry no write information. Anything else is a malformed schema.
fn lvalue_path(lvalue: &Expr<Sym<Var>>) -> Res<Option<(Var, Vec<IntExpr<Sym<Var>>>)>> {
    fn of_sym(sym: &Sym<Var>) -> Option<(Var, Vec<IntExpr<Sym<Var>>>)> {
        match sym {
            Sym::Reg(var) => Some((var.clone(), vec![])),
            Sym::Sym(_) => None,
        }
    }
    fn of_array(arr: &ArrayExpr<Sym<Var>>) -> Res<Option<(Var, Vec<IntExpr<Sym<Var>>>)>> {
        match arr {
            ArrayExpr::Var { var, .. } => Ok(of_sym(var)),
            ArrayExpr::Idx { arr, idx, .. } => Ok(of_array(arr)?.map(|(root, mut path)| {
                path.push((**idx).clone());
                (root, path)
            })),
            ArrayExpr::Upd { .. } => bail!(ErrorKind::BadSemantics(
                "assignment to an array update".into()
            )),
        }
    }

    match lvalue {
        Expr::Int(IntExpr::Var(sym)) | Expr::Bool(BoolExpr::Var(sym)) => Ok(of_sym(sym)),
        Expr::Int(IntExpr::Idx { arr, idx }) | Expr::Bool(BoolExpr::Idx { arr, idx }) => {
            Ok(of_array(arr)?.map(|(root, mut path)| {
                path.push((**idx).clone());
                (root, path)
            }))
        }
        Expr::Array(arr) => of_array(arr),
        lvalue => bail!(ErrorKind::BadSemantics(format!(
            "assignment to non-lvalue `{}`",
            lvalue,
        ))),
    }
}

/// Records a write at `path` into a write record.
fn mark_write(
    prior: Option<WriteRec>,
    path: &[IntExpr<Sym<Var>>],
    rvalue: Option<Expr<Sym<Var>>>,
) -> Res<WriteRec> {
    match (path.split_first(), prior) {
        (None, None) => Ok(WriteRec::Entire(rvalue)),
        (None, Some(_)) => bail!(ErrorKind::BadSemantics(
            "two writes to the same variable in one listing".into()
        )),
        (Some((idx, rest)), None) => Ok(WriteRec::Indices(vec![(
            idx.clone(),
            mark_write(None, rest, rvalue)?,
        )])),
        (Some(_), Some(WriteRec::Entire(_))) => bail!(ErrorKind::BadSemantics(
            "indexed write over a whole-variable write".into()
        )),
        (Some((idx, rest)), Some(WriteRec::Indices(mut indices))) => {
            if let Some(pos) = indices.iter().position(|(prev, _)| prev == idx) {
                let (idx, prior) = indices.remove(pos);
                let nu = mark_write(Some(prior), rest, rvalue)?;
                indices.insert(pos, (idx, nu));
            } else {
                indices.push((idx.clone(), mark_write(None, rest, rvalue)?));
            }
            Ok(WriteRec::Indices(indices))
        }
    }
}

/// Folds a write record back into a functional-update cascade over `base`.
///
/// A havoc anywhere along the path havocs the whole update.
fn upd_cascade(
    base: ArrayExpr<Sym<Var>>,
    writes: &[(IntExpr<Sym<Var>>, WriteRec)],
) -> Res<Option<ArrayExpr<Sym<Var>>>> {
    let mut acc = base;
    for (idx, write) in writes {
        match write {
            WriteRec::Entire(None) => return Ok(None),
            WriteRec::Entire(Some(val)) => {
                acc = ArrayExpr::upd(acc, idx.clone(), val.clone())?;
            }
            WriteRec::Indices(inner) => {
                let elem = ArrayExpr::idx(acc.clone(), idx.clone())?;
                match upd_cascade(elem, inner)? {
                    None => return Ok(None),
                    Some(sub) => acc = ArrayExpr::upd(acc, idx.clone(), Expr::Array(sub))?,
                }
            }
        }
    }
    Ok(Some(acc))
}

/// The whole-variable value a write record amounts to.
fn write_rvalue(var: &Var, write: WriteRec) -> Res<Option<Expr<Sym<Var>>>> {
    match write {
        WriteRec::Entire(rvalue) => Ok(rvalue),
        WriteRec::Indices(writes) => {
            let (elt, len) = match var.typ() {
                Typ::Array { elt, len } => (*elt, len),
                typ => bail!(ErrorKind::BadSemantics(format!(
                    "indexed write to `{}`, which has non-array type `{}`",
                    var, typ,
                ))),
            };
            let base = ArrayExpr::var(elt, len, Sym::Reg(var.clone()));
            Ok(upd_cascade(base, &writes)?.map(Expr::Array))
        }
    }
}

/// Normalises a listing so that every assignment targets a whole variable.
///
/// Assignments are merged through a write map and come out in first-write order, followed by the
/// assumptions and then the branches (recursively normalised), each in input order.
pub fn normalise(
    instrs: &[Microcode<Expr<Sym<Var>>, Sym<Var>>],
) -> Res<Vec<Microcode<Var, Sym<Var>>>> {
    let mut writes: Vec<(Var, WriteRec)> = vec![];
    let mut assumes = vec![];
    let mut branches = vec![];

    for instr in instrs {
        match instr {
            Microcode::Assign { lvalue, rvalue } => match lvalue_path(lvalue)? {
                // Symbolic lvalue, no write information.
                None => (),
                Some((root, path)) => {
                    if let Some(pos) = writes.iter().position(|(var, _)| *var == root) {
                        let (var, prior) = writes.remove(pos);
                        let nu = mark_write(Some(prior), &path, rvalue.clone())?;
                        writes.insert(pos, (var, nu));
                    } else {
                        let nu = mark_write(None, &path, rvalue.clone())?;
                        writes.push((root, nu));
                    }
                }
            },
            Microcode::Assume(cond) => assumes.push(Microcode::Assume(cond.clone())),
            Microcode::Branch { cond, tru, fls } => branches.push(Microcode::Branch {
                cond: cond.clone(),
                tru: normalise(tru)?,
                fls: normalise(fls)?,
            }),
        }
    }

    let mut res = vec![];
    for (var, write) in writes {
        let rvalue = write_rvalue(&var, write)?;
        res.push(Microcode::Assign {
            lvalue: var,
            rvalue,
        });
    }
    res.extend(assumes);
    res.extend(branches);
    Ok(res)
}

/// Marks a normalised listing.
///
/// Every lvalue takes this stage's `marker`; every rvalue variable reads the last marker recorded
/// for it in `state`, defaulting to `Before`. The caller updates `state` afterwards, from
/// [`assigned_vars`].
pub fn mark_listing(
    marker: &dyn Fn(&Var) -> MarkedVar,
    state: &Map<String, MarkedVar>,
    instrs: &[Microcode<Var, Sym<Var>>],
) -> Res<Vec<Microcode<MarkedVar, Sym<MarkedVar>>>> {
    let mut renamer = SymRenamer::new(|var: &Var| match state.get(var.id()) {
        Some(marked) => marked.clone(),
        None => MarkedVar::Before(var.clone()),
    });
    instrs
        .iter()
        .map(|instr| mark_instr(marker, &mut renamer, instr))
        .collect()
}

/// Marks one instruction.
fn mark_instr<F: FnMut(&Var) -> MarkedVar>(
    marker: &dyn Fn(&Var) -> MarkedVar,
    renamer: &mut SymRenamer<F>,
    instr: &Microcode<Var, Sym<Var>>,
) -> Res<Microcode<MarkedVar, Sym<MarkedVar>>> {
    let ctx = SubCtx::positive();
    let res = match instr {
        Microcode::Assign { lvalue, rvalue } => Microcode::Assign {
            lvalue: marker(lvalue),
            rvalue: match rvalue {
                Some(rvalue) => Some(sub::any_expr(renamer, ctx, rvalue)?),
                None => None,
            },
        },
        Microcode::Assume(cond) => Microcode::Assume(sub::bool_expr(renamer, ctx, cond)?),
        Microcode::Branch { cond, tru, fls } => {
            let cond = sub::bool_expr(renamer, ctx, cond)?;
            let tru = tru
                .iter()
                .map(|instr| mark_instr(marker, renamer, instr))
                .collect::<Res<Vec<_>>>()?;
            let fls = fls
                .iter()
                .map(|instr| mark_instr(marker, renamer, instr))
                .collect::<Res<Vec<_>>>()?;
            Microcode::Branch { cond, tru, fls }
        }
    };
    Ok(res)
}
