//! Common imports throughout this project.

pub use std::{
    collections::{BTreeMap as Map, BTreeSet as Set},
    fmt,
    io::Write,
    ops::{Deref, DerefMut},
};

pub use error_chain::bail;
pub use num::{bigint::Sign, BigInt as Int, One, Zero};
pub use rsmt2::SmtRes;

pub use crate::{ast, desugar, expr, microcode, model, parse, semantics, sub, term, view};

/// Stage index.
///
/// A command is a *routine*: a sequence of microcode listings composed sequentially. Variables
/// assigned by a non-final listing are tagged with the index of that listing, its *stage*. If a
/// routine has three listings, variables written by the first one come out of it as `v!int!0`,
/// and only the last listing writes `v!after`.
pub type Stage = usize;

error_chain::error_chain! {
    types {
        Error, ErrorKind, ResExt, Res;
    }

    links {
        Smt2(rsmt2::errors::Error, rsmt2::errors::ErrorKind)
        /// An error from the `rsmt2` crate.
        ;
    }

    foreign_links {
        Io(std::io::Error)
        /// I/O error.
        ;
    }

    errors {
        /// A parse error.
        ///
        /// **NB**: `row` and `col` start at zero.
        ParseErr(row: usize, col: usize, line: String, msg: String) {
            description("parse error")
            display("error @{}:{}: `{}`, {}", row, col, line, msg)
        }
        /// A primitive command has no semantic schema.
        MissingDef(prim: String) {
            description("primitive has no semantics")
            display("no semantic schema for primitive `{}`", prim)
        }
        /// A primitive or view was applied to the wrong number of parameters.
        CountMismatch(expected: usize, actual: usize) {
            description("parameter count mismatch")
            display("expected {} parameter(s), got {}", expected, actual)
        }
        /// A parameter's type does not match its declaration.
        TypeMismatch(param: String, expected: String, actual: String) {
            description("parameter type mismatch")
            display(
                "parameter `{}` expects a value of type `{}`, got `{}`",
                param, expected, actual,
            )
        }
        /// A semantic schema is malformed.
        BadSemantics(reason: String) {
            description("malformed semantics")
            display("malformed semantics: {}", reason)
        }
        /// A substitution encountered a variable it has no mapping for.
        FreeVarInSub(param: String) {
            description("free variable in substitution")
            display("variable `{}` is not covered by the substitution", param)
        }
        /// Wraps a failure during instantiation of a specific primitive.
        Instantiate(prim: String) {
            description("instantiation failure")
            display("while instantiating primitive `{}`", prim)
        }
        /// An error raised by a generic tree-walker.
        Traversal(msg: String) {
            description("traversal failure")
            display("while traversing an expression: {}", msg)
        }
    }
}
