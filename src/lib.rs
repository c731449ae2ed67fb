//! Turns view-annotated concurrent programs into SMT-ready proof obligations.
//!
//! A script declares shared and thread-local state, view prototypes, separation-style
//! constraints, and methods whose commands are interleaved with view annotations `{| v |}`. The
//! pipeline lowers such a script into a set of verification *terms*, each of the form
//! `wpre ∧ cmd ⇒ goal`:
//!
//! - [`parse`] turns source text into a collated script;
//! - [`desugar`] rewrites syntactic views into guarded view multisets, lowers `assert`/`error`
//!   onto a synthesized error flag, and fills every annotation gap with a fresh unknown view;
//! - [`model`] types expressions and views, lowers statements onto the primitive vocabulary, and
//!   flattens control flow into axioms;
//! - [`semantics`] instantiates each primitive's microcode schema and composes it into a
//!   two-state Boolean with automatic framing;
//! - [`term`] pairs every axiom with every goal view.
//!
//! The resulting terms print through [`rsmt2`], ready for an external solver driver; this crate
//! performs no proof search itself.

#![forbid(missing_docs)]

pub extern crate rsmt2;

#[macro_use]
mod macros;

pub mod prelude;

pub mod ast;
pub mod desugar;
pub mod expr;
pub mod microcode;
pub mod model;
pub mod parse;
pub mod semantics;
pub mod sub;
pub mod term;
pub mod view;

/// String representation of a simple demo script: a ticket lock.
pub const DEMO: &str = r#"// A ticket lock.
//
// A script is made of declarations:
//
// - `shared` variables, the state all threads interfere on;
// - `thread` variables, each thread's private state;
// - `view` prototypes, the shapes of the predicates threads annotate their code with;
// - `constraint`s, giving the views meaning over the shared state;
// - `method`s, the code to verify, with a view annotation `{| ... |}` between commands.
//
// Atomic commands are wrapped in `<...>`. A `{| ? |}` annotation asks the tool to fill the gap
// with a fresh unknown view.

shared int ticket, serving;
thread int t, s;

view holdTick(int t);
view holdLock();

// The next ticket is never behind the one being served.
constraint emp -> ticket >= serving;

// Holding a ticket means the dispenser is past it; holding the lock means someone is being
// served.
constraint holdTick(t) -> ticket > t;
constraint holdLock() -> ticket > serving;

// Tickets are unique, and exclude the lock being held on them.
constraint holdTick(ta) * holdTick(tb) -> ta != tb;
constraint holdLock() * holdTick(t) -> serving != t;
constraint holdLock() * holdLock() -> false;

method lock() {
  {| emp |}
    <t = ticket++>;
  {| holdTick(t) |}
    do {
      {| holdTick(t) |}
        <s = serving>;
      {| if s == t { holdLock() } else { holdTick(t) } |}
    } while (s != t);
  {| holdLock() |}
}

method unlock() {
  {| holdLock() |}
    <serving++>;
  {| emp |}
}
"#;
