//! Parser for the surface language, and collation of the parsed declarations.
//!
//! The surface language is C-like: `shared`/`thread` declarations, `view` prototypes, `method`
//! bodies with view annotations `{| ... |}` and atomic sections `<...>` or `<| ... |>`, and
//! separation-style `constraint` clauses joining view patterns with `*`. Comments are one-line
//! rust-style, `// ...`.

crate::prelude!();

use ast::{Atomic, BlockEntry, CollatedScript, Command, FetchMode, Marked, Method};
use expr::{Func, Typ};
use view::ViewProto;

pub mod kw;

#[cfg(test)]
mod test;

use kw::is_kw;

/// A toplevel declaration, as parsed.
#[derive(Debug, Clone)]
pub enum Item {
    /// Shared-variable declarations.
    Shared(Vec<(Typ, String)>),
    /// Thread-variable declarations.
    Thread(Vec<(Typ, String)>),
    /// A view prototype.
    Proto(ViewProto),
    /// A constraint.
    Constraint(ast::Constraint),
    /// A method.
    Method(Method),
    /// A search-depth hint.
    Search(usize),
}

peg::parser! {
    /// PEG parsing rules.
    ///
    /// The [`crate::DEMO`] constant illustrates the syntax expected by the parser.
    pub grammar rules() for str {
        /// Whitespace.
        rule whitespace() = quiet! {
            [ ' ' | '\n' | '\t' | '\r' ]
        }

        /// Comment.
        ///
        /// ```rust
        /// # use starling_api::parse::rules::comment;
        /// assert_eq!(comment("// some comment\n"), Ok(()));
        /// assert_eq!(comment("// some comment"), Ok(()));
        /// ```
        pub rule comment() = quiet! {
            "//" [^ '\n' ]* ("\n" / ![_])
        }
        / expected!("comment")

        /// Whitespace or comment.
        rule _() = quiet! { ( whitespace() / comment() )* }

        /// End of an alphanumeric word.
        rule word_end() = ![ 'a'..='z' | 'A'..='Z' | '0'..='9' | '_' ]

        /// Ident parsing.
        ///
        /// # Examples
        ///
        /// ```rust
        /// # use starling_api::parse::rules::ident;
        /// assert_eq!(ident("serving").unwrap(), "serving");
        /// assert_eq!(ident("my_var_7").unwrap(), "my_var_7");
        /// // Keywords are rejected.
        /// assert!(ident("while").is_err());
        /// // Cannot start with a digit.
        /// assert!(ident("0_illegal").is_err());
        /// ```
        pub rule ident() -> String
        = quiet! {
            id:$(
                [ 'a'..='z' | 'A'..='Z' | '_' ]
                [ 'a'..='z' | 'A'..='Z' | '_' | '0'..='9' ]*
            ) {?
                if is_kw(id) {
                    Err("unexpected keyword")
                } else {
                    Ok(id.to_string())
                }
            }
        }
        / expected!("identifier")

        /// Recognizes numbers: `0` and `[1-9][0-9]*`.
        rule number() -> &'input str
        = $("0" / ['1'..='9']['0'..='9']*)

        /// Parses an unsigned [`Int`].
        pub rule uint() -> Int
        = quiet! {
            digits:number() {?
                Int::parse_bytes(digits.as_bytes(), 10).ok_or("illegal unsigned integer")
            }
        }
        / expected!("integer")

        /// Parses an array length.
        rule length() -> usize
        = digits:number() {?
            digits.parse().map_err(|_| "illegal array length")
        }

        /// Parses a type.
        ///
        /// Base types are `int` and `bool`; `[n]` and `[]` suffixes build arrays, leftmost suffix
        /// outermost.
        ///
        /// ```rust
        /// # use starling_api::{expr::Typ, parse::rules::typ};
        /// assert_eq!(typ("int").unwrap(), Typ::Int);
        /// assert_eq!(typ("bool[4]").unwrap(), Typ::array(Typ::Bool, Some(4)));
        /// assert_eq!(
        ///     typ("int[2][]").unwrap(),
        ///     Typ::array(Typ::array(Typ::Int, None), Some(2)),
        /// );
        /// ```
        pub rule typ() -> Typ
        = quiet! {
            base:(
                "int" word_end() { Typ::Int }
                / "bool" word_end() { Typ::Bool }
            )
            suffixes:( _ "[" _ len:length()? _ "]" { len } )* {
                suffixes
                    .into_iter()
                    .rev()
                    .fold(base, |elt, len| Typ::array(elt, len))
            }
        }
        / expected!("a type (`int` or `bool`, possibly with `[...]` suffixes)")

        /// Parses a symbolic expression, `%{name}(args)`.
        rule sym_expr() -> ast::Expr
        = "%{" _ name:ident() _ "}" args:(
            _ "(" _ args:( expr() ** (_ "," _) ) _ ")" { args }
        )? {
            ast::Expr::Sym {
                name,
                args: args.unwrap_or_default(),
            }
        }

        /// Parses expressions.
        ///
        /// # Examples
        ///
        /// ```rust
        /// # use starling_api::parse::rules::expr;
        /// let ast = expr("s == t && queue[s] > 0").unwrap();
        /// assert_eq!(&ast.to_string(), "((s == t) && (queue[s] > 0))");
        /// ```
        pub rule expr() -> ast::Expr
        = precedence! {
            lft:@ _ "=>" _ rgt:(@) { ast::Expr::bop(ast::Bop::Implies, lft, rgt) }
            --
            lft:(@) _ "||" _ rgt:@ { ast::Expr::bop(ast::Bop::Or, lft, rgt) }
            --
            lft:(@) _ "&&" _ rgt:@ { ast::Expr::bop(ast::Bop::And, lft, rgt) }
            --
            lft:(@) _ "==" _ rgt:@ { ast::Expr::bop(ast::Bop::Eq, lft, rgt) }
            lft:(@) _ "!=" _ rgt:@ { ast::Expr::bop(ast::Bop::Neq, lft, rgt) }
            --
            lft:(@) _ "<=" _ rgt:@ { ast::Expr::bop(ast::Bop::Le, lft, rgt) }
            lft:(@) _ "<" !"|" _ rgt:@ { ast::Expr::bop(ast::Bop::Lt, lft, rgt) }
            lft:(@) _ ">=" _ rgt:@ { ast::Expr::bop(ast::Bop::Ge, lft, rgt) }
            lft:(@) _ ">" _ rgt:@ { ast::Expr::bop(ast::Bop::Gt, lft, rgt) }
            --
            lft:(@) _ "+" !"+" _ rgt:@ { ast::Expr::bop(ast::Bop::Add, lft, rgt) }
            lft:(@) _ "-" !"-" _ rgt:@ { ast::Expr::bop(ast::Bop::Sub, lft, rgt) }
            --
            lft:(@) _ "*" _ rgt:@ { ast::Expr::bop(ast::Bop::Mul, lft, rgt) }
            lft:(@) _ "/" _ rgt:@ { ast::Expr::bop(ast::Bop::Div, lft, rgt) }
            lft:(@) _ "%" !"{" _ rgt:@ { ast::Expr::bop(ast::Bop::Mod, lft, rgt) }
            --
            "!" !"=" _ arg:@ { arg.negate() }
            "-" _ arg:@ { ast::Expr::uop(ast::Uop::Neg, arg) }
            --
            arr:(@) _ "[" _ idx:expr() _ "]" {
                ast::Expr::Idx { arr: Box::new(arr), idx: Box::new(idx) }
            }
            --
            "true" word_end() { ast::Expr::True }
            "false" word_end() { ast::Expr::False }
            i:uint() { ast::Expr::Int(i) }
            s:sym_expr() { s }
            id:ident() { ast::Expr::Ident(id) }
            "(" _ e:expr() _ ")" { e }
        }

        /// Parses a view expression.
        ///
        /// `emp` is the unit view; `*` joins; a bare Boolean expression is lifted; `if` guards.
        pub rule view_expr() -> ast::View
        = vs:( view_atom() ++ (_ "*" _) ) {
            let mut vs = vs.into_iter();
            let first = vs.next().unwrap_or(ast::View::Unit);
            vs.fold(first, ast::View::join)
        }

        /// Parses one view atom.
        rule view_atom() -> ast::View
        = "emp" word_end() { ast::View::Unit }
        / "false" word_end() { ast::View::Falsehood }
        / "if" word_end() _ cond:expr() _ "{" _ tru:view_expr() _ "}"
          fls:( _ "else" word_end() _ "{" _ fls:view_expr() _ "}" { fls } )? {
            ast::View::If {
                cond,
                tru: Box::new(tru),
                fls: fls.map(Box::new),
            }
        }
        / name:ident() _ "(" _ args:( expr() ** (_ "," _) ) _ ")" {
            ast::View::Func(Func::new(name, args))
        }
        / e:expr() { ast::View::Local(e) }

        /// Parses a marked view annotation body: `?`, `v ?` or `v`.
        pub rule marked_view() -> Marked<ast::View>
        = "?" { Marked::Unknown }
        / v:view_expr() q:( _ "?" )? {
            match q {
                Some(_) => Marked::Questioned(v),
                None => Marked::Unmarked(v),
            }
        }

        /// Parses `++` or `--`.
        rule fetch_mode() -> FetchMode
        = "++" { FetchMode::Incr }
        / "--" { FetchMode::Decr }

        /// Parses an assignment or fetch, `lv = e`, `lv = e++`, `lv = e--`.
        rule assign() -> Atomic
        = dest:expr() _ "=" !"=" _ src:expr() mode:( _ m:fetch_mode() { m } )? {
            Atomic::Fetch {
                dest,
                src,
                mode: mode.unwrap_or(FetchMode::Direct),
            }
        }

        /// Parses a postfix statement, `lv++` or `lv--`.
        rule postfix() -> Atomic
        = operand:expr() _ mode:fetch_mode() {
            Atomic::Postfix { operand, mode }
        }

        /// Parses an atomic statement.
        pub rule atomic() -> Atomic
        = "assume" word_end() _ "(" _ cond:expr() _ ")" { Atomic::Assume(cond) }
        / "assert" word_end() _ "(" _ cond:expr() _ ")" { Atomic::Assert(cond) }
        / "error" word_end() { Atomic::Error }
        / "havoc" word_end() _ id:ident() { Atomic::Havoc(id) }
        / "id" word_end() { Atomic::Id }
        / "CAS" _ "(" _ dest:expr() _ "," _ test:expr() _ "," _ set:expr() _ ")" {
            Atomic::Cas { dest, test, set }
        }
        / "if" word_end() _ "(" _ cond:expr() _ ")" _ "{" _ tru:atomics() _ "}"
          fls:( _ "else" word_end() _ "{" _ fls:atomics() _ "}" { fls } )? {
            Atomic::Cond { cond, tru, fls }
        }
        / assign()
        / postfix()

        /// Parses `;`-separated atomic statements.
        pub rule atomics() -> Vec<Atomic>
        = atomics:( atomic() ** (_ ";" _) ) (_ ";")? {
            atomics
        }

        /// Parses a command.
        pub rule command() -> Command
        = "<|" _ atomics:atomics() _ "|>" _ ";" { Command::Prim(atomics) }
        / "<" _ atomics:atomics() _ ">" _ ";" { Command::Prim(atomics) }
        / "if" word_end() _ "(" _ cond:expr() _ ")" _ tru:block()
          fls:( _ "else" word_end() _ fls:block() { fls } )? {
            Command::If { cond, tru, fls }
        }
        / "while" word_end() _ "(" _ cond:expr() _ ")" _ block:block() {
            Command::While { cond, block }
        }
        / "do" word_end() _ block:block() _ "while" word_end() _ "(" _ cond:expr() _ ")" _ ";" {
            Command::DoWhile { block, cond }
        }
        / blocks:( block() ++ _ ) { Command::Blocks(blocks) }
        / a:assign() _ ";" { Command::Prim(vec![a]) }
        / a:postfix() _ ";" { Command::Prim(vec![a]) }

        /// Parses one entry of a block.
        rule block_entry() -> BlockEntry
        = "{|" _ view:marked_view() _ "|}" { BlockEntry::View(view) }
        / cmd:command() { BlockEntry::Cmd(cmd) }

        /// Parses a block.
        pub rule block() -> ast::Block
        = "{" _ entries:( block_entry() ** _ ) _ "}" { entries }

        /// Parses a prototype parameter.
        rule proto_param() -> (Typ, String)
        = typ:typ() _ id:ident() { (typ, id) }

        /// Parses a view-pattern atom of a constraint.
        rule pattern_func() -> Func<String>
        = name:ident() _ "(" _ args:( ident() ** (_ "," _) ) _ ")" {
            Func::new(name, args)
        }

        /// Parses a toplevel declaration.
        pub rule item() -> Item
        = "shared" word_end() _ typ:typ() _ ids:( ident() ++ (_ "," _) ) _ ";" {
            Item::Shared(ids.into_iter().map(|id| (typ.clone(), id)).collect())
        }
        / "thread" word_end() _ typ:typ() _ ids:( ident() ++ (_ "," _) ) _ ";" {
            Item::Thread(ids.into_iter().map(|id| (typ.clone(), id)).collect())
        }
        / "view" word_end() _
          iterator:( "iter" word_end() _ "[" _ i:ident() _ "]" _ { i } )?
          name:ident() _ "(" _ params:( proto_param() ** (_ "," _) ) _ ")" _ ";" {
            match iterator {
                Some(iterator) => Item::Proto(ViewProto::iterated(name, params, iterator)),
                None => Item::Proto(ViewProto::new(name, params)),
            }
        }
        / "constraint" word_end() _
          pattern:(
            "emp" word_end() { vec![] }
            / funcs:( pattern_func() ++ (_ "*" _) ) { funcs }
          )
          _ "->" _
          def:( "?" { None } / def:expr() { Some(def) } )
          _ ";" {
            Item::Constraint(ast::Constraint { pattern, def })
        }
        / "search" word_end() _ depth:length() _ ";" {
            Item::Search(depth)
        }
        / "method" word_end() _ name:ident() _ "(" _ ")" _ block:block() {
            Item::Method(Method { name, block })
        }

        /// Parses a full script.
        pub rule script() -> Vec<Item>
        = _ items:( item() ** _ ) _ ![_] { items }
    }
}

/// Collates parsed items into a script.
///
/// Fails on duplicate variable declarations and duplicate search hints; prototype name clashes
/// are caught later, by [`desugar::DesugarCtx::new`].
pub fn collate(items: Vec<Item>) -> Res<CollatedScript> {
    let mut script = CollatedScript::default();

    let mut check_var = |script: &CollatedScript, id: &str| -> Res<()> {
        let dup = script
            .shared
            .iter()
            .chain(script.thread.iter())
            .any(|(_, prev)| prev == id);
        if dup {
            bail!("variable `{}` is declared twice", id)
        }
        Ok(())
    };

    for item in items {
        match item {
            Item::Shared(decls) => {
                for (typ, id) in decls {
                    check_var(&script, &id)?;
                    script.shared.push((typ, id))
                }
            }
            Item::Thread(decls) => {
                for (typ, id) in decls {
                    check_var(&script, &id)?;
                    script.thread.push((typ, id))
                }
            }
            Item::Proto(proto) => script.protos.push(proto),
            Item::Constraint(constraint) => script.constraints.push(constraint),
            Item::Method(method) => script.methods.push(method),
            Item::Search(depth) => {
                if script.search_depth.is_some() {
                    bail!("search depth is declared twice")
                }
                script.search_depth = Some(depth)
            }
        }
    }

    Ok(script)
}

/// Extracts the line of a parse-error position.
fn error_line(txt: &str, row: usize) -> String {
    txt.lines()
        .nth(row)
        .map(|line| line.to_string())
        .unwrap_or_else(|| "<EOI>".to_string())
}

/// Parses a script.
///
/// Comments are one-line rust-style: `// ...\n`. The [`crate::DEMO`] constant illustrates the
/// syntax.
pub fn script(txt: &str) -> Res<CollatedScript> {
    match rules::script(txt) {
        Ok(items) => collate(items),
        Err(e) => {
            let (row, col) = (e.location.line - 1, e.location.column - 1);
            bail!(ErrorKind::ParseErr(
                row,
                col,
                error_line(txt, row),
                format!("expected {}", e.expected),
            ))
        }
    }
}
