// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Serializing XSX: a common [Printer] contract with three layout
//! strategies. [CompactPrinter] emits minimal separators,
//! [IndentingPrinter] leaves line breaks and indentation to the
//! caller, [PrettyPrinter] puts every structural token on its own
//! line. All three keep their own closing-bracket stack, so
//! [end](Printer::end) never needs to be told which bracket closes,
//! and all three stay reusable across multiple top-level values.

use crate::quote::{cond_quote_to, quote_to, QuoteMode, META};
use crate::value::Parenkind;
use kstring::KString;
use std::io::{self, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrintError {
    /// `end()` with no open sequence.
    #[error("nothing to end")]
    NothingToEnd,
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub trait Printer {
    fn begin(&mut self, kind: Parenkind, meta: bool) -> Result<(), PrintError>;
    fn end(&mut self) -> Result<(), PrintError>;
    fn atom(&mut self, text: &str, meta: bool, quote: QuoteMode) -> Result<(), PrintError>;
    /// Emit `count` line breaks and adjust the indent level by
    /// `indent`. A layout hint; printers with a fixed layout ignore
    /// it.
    fn newline(&mut self, count: usize, indent: i32) -> Result<(), PrintError>;
}

/// The atom emission policy every printer shares: meta prefix first,
/// then the text under the requested quote mode.
fn print_atom(
    wr: &mut impl Write,
    text: &str,
    meta: bool,
    quote: QuoteMode,
) -> Result<(), PrintError> {
    if meta {
        write!(wr, "{}", META)?;
    }
    match quote {
        QuoteMode::Conditional => {
            cond_quote_to(text, wr)?;
        }
        QuoteMode::Forced => quote_to(text, wr)?,
        QuoteMode::Suppressed => wr.write_all(text.as_bytes())?,
    }
    Ok(())
}

/// Minimal output: no line breaks, a single space only between
/// consecutive atoms that would otherwise run together.
pub struct CompactPrinter<W: Write> {
    wr: W,
    nest: Vec<Parenkind>,
    sep: bool,
}

impl<W: Write> CompactPrinter<W> {
    pub fn new(wr: W) -> Self {
        CompactPrinter {
            wr,
            nest: Vec::new(),
            sep: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.wr
    }
}

impl<W: Write> Printer for CompactPrinter<W> {
    fn begin(&mut self, kind: Parenkind, meta: bool) -> Result<(), PrintError> {
        self.sep = false;
        if meta {
            write!(self.wr, "{}", META)?;
        }
        write!(self.wr, "{}", kind.opening())?;
        self.nest.push(kind);
        Ok(())
    }

    fn end(&mut self) -> Result<(), PrintError> {
        self.sep = false;
        let kind = self.nest.pop().ok_or(PrintError::NothingToEnd)?;
        write!(self.wr, "{}", kind.closing())?;
        Ok(())
    }

    fn atom(&mut self, text: &str, meta: bool, quote: QuoteMode) -> Result<(), PrintError> {
        if self.sep {
            self.wr.write_all(b" ")?;
        }
        self.sep = true;
        print_atom(&mut self.wr, text, meta, quote)
    }

    fn newline(&mut self, _count: usize, _indent: i32) -> Result<(), PrintError> {
        Ok(())
    }
}

/// Caller-driven layout: [newline](Printer::newline) emits breaks and
/// moves the indent level; indentation is written lazily just before
/// the next token.
pub struct IndentingPrinter<W: Write> {
    wr: W,
    indent: String,
    nest: Vec<Parenkind>,
    level: i32,
    need_indent: bool,
    need_sep: bool,
}

impl<W: Write> IndentingPrinter<W> {
    pub fn new(wr: W, indent: &str) -> Self {
        IndentingPrinter {
            wr,
            indent: indent.to_string(),
            nest: Vec::new(),
            level: 0,
            need_indent: false,
            need_sep: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.wr
    }

    fn write_indent(&mut self) -> io::Result<()> {
        if self.need_indent {
            for _ in 0..self.level.max(0) {
                self.wr.write_all(self.indent.as_bytes())?;
            }
            self.need_indent = false;
        }
        Ok(())
    }
}

impl<W: Write> Printer for IndentingPrinter<W> {
    fn begin(&mut self, kind: Parenkind, meta: bool) -> Result<(), PrintError> {
        self.write_indent()?;
        if self.need_sep {
            self.wr.write_all(b" ")?;
            self.need_sep = false;
        }
        if meta {
            write!(self.wr, "{}", META)?;
        }
        write!(self.wr, "{}", kind.opening())?;
        self.nest.push(kind);
        Ok(())
    }

    fn end(&mut self) -> Result<(), PrintError> {
        self.write_indent()?;
        let kind = self.nest.pop().ok_or(PrintError::NothingToEnd)?;
        write!(self.wr, "{}", kind.closing())?;
        self.need_sep = true;
        Ok(())
    }

    fn atom(&mut self, text: &str, meta: bool, quote: QuoteMode) -> Result<(), PrintError> {
        self.write_indent()?;
        if self.need_sep {
            self.wr.write_all(b" ")?;
        }
        self.need_sep = true;
        print_atom(&mut self.wr, text, meta, quote)
    }

    fn newline(&mut self, count: usize, indent: i32) -> Result<(), PrintError> {
        for _ in 0..count {
            self.wr.write_all(b"\n")?;
        }
        self.level += indent;
        self.need_indent = true;
        self.need_sep = false;
        Ok(())
    }
}

/// Automatic layout: every begin, end and atom on its own line,
/// indented one fixed step per nesting level.
pub struct PrettyPrinter<W: Write> {
    wr: W,
    indent: String,
    level: usize,
    ends: Vec<Parenkind>,
}

impl<W: Write> PrettyPrinter<W> {
    pub fn new(wr: W, indent: &str) -> Self {
        PrettyPrinter {
            wr,
            indent: indent.to_string(),
            level: 0,
            ends: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.wr
    }

    fn write_indent(&mut self) -> io::Result<()> {
        for _ in 0..self.level {
            self.wr.write_all(self.indent.as_bytes())?;
        }
        Ok(())
    }
}

impl<W: Write> Printer for PrettyPrinter<W> {
    fn begin(&mut self, kind: Parenkind, meta: bool) -> Result<(), PrintError> {
        self.write_indent()?;
        if meta {
            write!(self.wr, "{}", META)?;
        }
        writeln!(self.wr, "{}", kind.opening())?;
        self.level += 1;
        self.ends.push(kind);
        Ok(())
    }

    fn end(&mut self) -> Result<(), PrintError> {
        let kind = self.ends.pop().ok_or(PrintError::NothingToEnd)?;
        self.level -= 1;
        self.write_indent()?;
        writeln!(self.wr, "{}", kind.closing())?;
        Ok(())
    }

    fn atom(&mut self, text: &str, meta: bool, quote: QuoteMode) -> Result<(), PrintError> {
        self.write_indent()?;
        print_atom(&mut self.wr, text, meta, quote)?;
        self.wr.write_all(b"\n")?;
        Ok(())
    }

    fn newline(&mut self, _count: usize, _indent: i32) -> Result<(), PrintError> {
        Ok(())
    }
}

/// The markup vocabulary driven through any [Printer] by [print].
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Open(Parenkind),
    OpenMeta(Parenkind),
    Close,
    Newline { count: usize, indent: i32 },
    Atom {
        text: KString,
        meta: bool,
        quote: QuoteMode,
    },
}

impl Item {
    /// An ordinary atom, conditionally quoted.
    pub fn atom(text: &str) -> Item {
        Item::Atom {
            text: KString::from_ref(text),
            meta: false,
            quote: QuoteMode::Conditional,
        }
    }

    /// A meta atom, conditionally quoted.
    pub fn meta_atom(text: &str) -> Item {
        Item::Atom {
            text: KString::from_ref(text),
            meta: true,
            quote: QuoteMode::Conditional,
        }
    }

    /// A scalar formatted via `Display` and written verbatim. Meant
    /// for numbers, booleans and the like, whose rendering never
    /// needs quoting.
    pub fn scalar(value: impl std::fmt::Display) -> Item {
        Item::Atom {
            text: KString::from_string(value.to_string()),
            meta: false,
            quote: QuoteMode::Suppressed,
        }
    }
}

impl From<&str> for Item {
    fn from(s: &str) -> Item {
        Item::atom(s)
    }
}

impl From<i64> for Item {
    fn from(v: i64) -> Item {
        Item::scalar(v)
    }
}

impl From<u64> for Item {
    fn from(v: u64) -> Item {
        Item::scalar(v)
    }
}

impl From<f64> for Item {
    fn from(v: f64) -> Item {
        Item::scalar(v)
    }
}

impl From<bool> for Item {
    fn from(v: bool) -> Item {
        Item::scalar(v)
    }
}

/// Walk `items` and drive `p`. [Item::Close] picks the matching
/// bracket through the printer's own stack.
pub fn print<P: Printer>(
    p: &mut P,
    items: impl IntoIterator<Item = Item>,
) -> Result<(), PrintError> {
    for item in items {
        match item {
            Item::Open(kind) => p.begin(kind, false)?,
            Item::OpenMeta(kind) => p.begin(kind, true)?,
            Item::Close => p.end()?,
            Item::Newline { count, indent } => p.newline(count, indent)?,
            Item::Atom { text, meta, quote } => p.atom(text.as_str(), meta, quote)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use Parenkind::*;

    fn compact_output(f: impl FnOnce(&mut CompactPrinter<Vec<u8>>)) -> String {
        let mut p = CompactPrinter::new(Vec::new());
        f(&mut p);
        String::from_utf8(p.into_inner()).unwrap()
    }

    #[test]
    fn compact_mixed_structure() {
        let out = compact_output(|p| {
            p.begin(Round, false).unwrap();
            p.atom("foo", false, QuoteMode::Conditional).unwrap();
            p.begin(Curly, true).unwrap();
            p.atom("bar", false, QuoteMode::Forced).unwrap();
            p.atom("baz", true, QuoteMode::Conditional).unwrap();
            p.end().unwrap();
            p.atom("quux", true, QuoteMode::Forced).unwrap();
            p.end().unwrap();
        });
        assert_eq!(out, "(foo\\{\"bar\" \\baz}\\\"quux\")");
    }

    #[test]
    fn compact_separates_consecutive_atoms_only() {
        let out = compact_output(|p| {
            p.atom("a", false, QuoteMode::Conditional).unwrap();
            p.atom("b", false, QuoteMode::Conditional).unwrap();
            p.begin(Round, false).unwrap();
            p.atom("c", false, QuoteMode::Conditional).unwrap();
            p.end().unwrap();
            p.atom("d", false, QuoteMode::Conditional).unwrap();
        });
        assert_eq!(out, "a b(c)d");
    }

    #[test]
    fn compact_conditional_quoting() {
        let out = compact_output(|p| {
            p.atom("a b", false, QuoteMode::Conditional).unwrap();
            p.atom("", false, QuoteMode::Conditional).unwrap();
        });
        assert_eq!(out, "\"a b\" \"\"");
    }

    #[test]
    fn compact_suppressed_quoting_is_verbatim() {
        let out = compact_output(|p| {
            p.atom("4711", false, QuoteMode::Suppressed).unwrap();
        });
        assert_eq!(out, "4711");
    }

    #[test]
    fn compact_reusable_across_top_level_values() {
        let out = compact_output(|p| {
            for atom in ["a", "b"] {
                p.begin(Round, false).unwrap();
                p.atom(atom, false, QuoteMode::Conditional).unwrap();
                p.end().unwrap();
            }
        });
        assert_eq!(out, "(a)(b)");
    }

    #[test]
    fn end_without_begin_is_an_error() {
        let mut c = CompactPrinter::new(Vec::new());
        assert!(matches!(c.end(), Err(PrintError::NothingToEnd)));
        let mut i = IndentingPrinter::new(Vec::new(), "  ");
        assert!(matches!(i.end(), Err(PrintError::NothingToEnd)));
        let mut p = PrettyPrinter::new(Vec::new(), "  ");
        assert!(matches!(p.end(), Err(PrintError::NothingToEnd)));
    }

    #[test]
    fn indenting_caller_driven_layout() {
        let mut p = IndentingPrinter::new(Vec::new(), "  ");
        print(
            &mut p,
            [
                Item::Open(Round),
                Item::from("foo"),
                Item::Newline { count: 1, indent: 1 },
                Item::OpenMeta(Curly),
                Item::from("bar"),
                Item::from(4711_i64),
                Item::Close,
                Item::Newline { count: 1, indent: -1 },
                Item::Close,
            ],
        )
        .unwrap();
        let out = String::from_utf8(p.into_inner()).unwrap();
        assert_eq!(out, "(foo\n  \\{bar 4711}\n)");
    }

    #[test]
    fn pretty_one_token_per_line() {
        let mut p = PrettyPrinter::new(Vec::new(), "  ");
        p.begin(Round, false).unwrap();
        p.atom("foo", false, QuoteMode::Conditional).unwrap();
        p.begin(Curly, true).unwrap();
        p.atom("bar", false, QuoteMode::Forced).unwrap();
        p.atom("...", false, QuoteMode::Conditional).unwrap();
        p.atom("baz", true, QuoteMode::Conditional).unwrap();
        p.end().unwrap();
        p.atom("quux", true, QuoteMode::Forced).unwrap();
        p.end().unwrap();
        let out = String::from_utf8(p.into_inner()).unwrap();
        assert_eq!(
            out,
            "(\n  foo\n  \\{\n    \"bar\"\n    ...\n    \\baz\n  }\n  \\\"quux\"\n)\n"
        );
    }

    #[test]
    fn item_conversions() {
        assert_eq!(Item::from("x"), Item::atom("x"));
        assert_eq!(
            Item::from(true),
            Item::Atom {
                text: KString::from_ref("true"),
                meta: false,
                quote: QuoteMode::Suppressed,
            }
        );
        assert_eq!(
            Item::from(1.5_f64),
            Item::Atom {
                text: KString::from_ref("1.5"),
                meta: false,
                quote: QuoteMode::Suppressed,
            }
        );
    }

    #[test]
    fn meta_atom_item() {
        let mut p = CompactPrinter::new(Vec::new());
        print(&mut p, [Item::meta_atom("note"), Item::atom("data")]).unwrap();
        assert_eq!(String::from_utf8(p.into_inner()).unwrap(), "\\note data");
    }
}
