// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The bracket vocabulary shared by the scanner, the pull parser and
//! the printers.

/// The three bracket families an XSX sequence can be delimited
/// by. Open and close must be of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parenkind {
    Round,
    Square,
    Curly
}

impl Parenkind {
    pub fn opening(self) -> char {
        match self {
            Parenkind::Round => '(',
            Parenkind::Square => '[',
            Parenkind::Curly => '{'
        }
    }

    pub fn closing(self) -> char {
        match self {
            Parenkind::Round => ')',
            Parenkind::Square => ']',
            Parenkind::Curly => '}'
        }
    }

    pub fn from_opening(c: char) -> Option<Parenkind> {
        match c {
            '(' => Some(Parenkind::Round),
            '[' => Some(Parenkind::Square),
            '{' => Some(Parenkind::Curly),
            _ => None
        }
    }

    pub fn from_closing(c: char) -> Option<Parenkind> {
        match c {
            ')' => Some(Parenkind::Round),
            ']' => Some(Parenkind::Square),
            '}' => Some(Parenkind::Curly),
            _ => None
        }
    }

    /// True for any of the six bracket characters, either side.
    pub fn is_bracket_char(c: char) -> bool {
        Parenkind::from_opening(c).is_some()
            || Parenkind::from_closing(c).is_some()
    }
}
