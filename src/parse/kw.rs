//! Keywords of the surface language.

#![allow(non_upper_case_globals)]

crate::prelude!();

macro_rules! build_keywords {
    {
        $(
            $(#[$mod_meta:meta])*
            $mod_ident:ident {
                $(
                    $(#[$kw_meta:meta])*
                    $kw_ident:ident : $kw_str:expr
                ),*
                $(,)?
            }
        )*
    } => {
        $(
            $(#[$mod_meta])*
            pub mod $mod_ident {
                $(
                    $(#[$kw_meta])*
                    pub const $kw_ident: &str = $kw_str;
                )*
            }
        )*

        lazy_static::lazy_static! {
            /// Set of all the keywords.
            pub static ref all: Set<&'static str> = {
                let mut set = Set::new();
                $($(
                    let is_new = set.insert($kw_str);
                    if !is_new {
                        panic!("[internal] keyword `{}` is defined twice", $kw_str)
                    }
                )*)*
                set
            };
        }
    };
}

build_keywords! {
    /// Declaration keywords.
    decl {
        /// Shared-variable declaration.
        shared: "shared",
        /// Thread-variable declaration.
        thread: "thread",
        /// View prototype declaration.
        view: "view",
        /// Iterated-prototype marker.
        iter: "iter",
        /// Method declaration.
        method: "method",
        /// Constraint declaration.
        cstr: "constraint",
        /// Search-depth hint.
        search: "search",
    }
    /// Statement keywords.
    stmt {
        /// Conditional.
        cnd_if: "if",
        /// Conditional, else branch.
        cnd_else: "else",
        /// While loop.
        loop_while: "while",
        /// Do-while loop.
        loop_do: "do",
        /// Assumption.
        assume: "assume",
        /// Assertion.
        assert: "assert",
        /// Unconditional failure.
        error: "error",
        /// Havoc statement.
        havoc: "havoc",
        /// No-op statement.
        id: "id",
        /// Compare-and-swap.
        cas: "CAS",
    }
    /// Expression and view keywords.
    tkn {
        /// True literal.
        tru: "true",
        /// False literal.
        fls: "false",
        /// Unit view.
        emp: "emp",
        /// Integer type.
        int: "int",
        /// Boolean type.
        bool_typ: "bool",
    }
}

/// True if the input is a keyword.
pub fn is_kw<Str: AsRef<str>>(s: Str) -> bool {
    all.contains(s.as_ref())
}
