// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Quoting and escaping of atom text. These are pure functions; both
//! the printers and user code wanting to emit XSX by hand use them.

use crate::value::Parenkind;
use std::borrow::Cow;
use std::io::{self, Write};

/// The escape prefix character that marks meta values and, inside
/// quoted atoms, escapes the following character.
pub const META: char = '\\';

/// The delimiter of quoted atoms.
pub const QUOTE: char = '"';

/// Output-side policy for [atom](crate::print::Printer::atom) emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteMode {
    /// Quote only if [needs_quote] says the text requires it.
    #[default]
    Conditional,
    /// Always wrap in quotes, escaping embedded `"` and `\`.
    Forced,
    /// Write the text verbatim. The caller guarantees that the result
    /// is still valid XSX.
    Suppressed,
}

/// Whether `s` would not survive as a bare atom: true iff `s` is
/// empty or contains whitespace, the quote or escape character, or
/// any bracket character.
pub fn needs_quote(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    s.chars().any(|c| {
        c == QUOTE || c == META || c.is_whitespace() || Parenkind::is_bracket_char(c)
    })
}

/// Escape `"` and `\` in `s`, appending to `out`. Returns the number
/// of characters that needed escaping.
pub fn escape_into(s: &str, out: &mut String) -> usize {
    let mut n = 0;
    for c in s.chars() {
        if c == QUOTE || c == META {
            out.push(META);
            n += 1;
        }
        out.push(c);
    }
    n
}

/// The inverse of [escape_into]: a backslash takes the following
/// character literally, everything else stands for itself.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;
    for c in s.chars() {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == META {
            escaped = true;
        } else {
            out.push(c);
        }
    }
    out
}

/// `s` wrapped in quotes with embedded `"` and `\` escaped.
pub fn quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push(QUOTE);
    escape_into(s, &mut out);
    out.push(QUOTE);
    out
}

/// Quote `s` only when necessary; borrows when it is not.
pub fn cond_quoted(s: &str) -> Cow<'_, str> {
    if needs_quote(s) {
        Cow::Owned(quoted(s))
    } else {
        Cow::Borrowed(s)
    }
}

pub fn quote_to(s: &str, wr: &mut impl Write) -> io::Result<()> {
    let mut tmp = String::with_capacity(s.len() + 2);
    tmp.push(QUOTE);
    escape_into(s, &mut tmp);
    tmp.push(QUOTE);
    wr.write_all(tmp.as_bytes())
}

/// Write `s`, quoted only when necessary. Returns whether it was
/// quoted.
pub fn cond_quote_to(s: &str, wr: &mut impl Write) -> io::Result<bool> {
    if needs_quote(s) {
        quote_to(s, wr)?;
        Ok(true)
    } else {
        wr.write_all(s.as_bytes())?;
        Ok(false)
    }
}
