// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The token-oriented pull parser. A [PullParser] wraps a
//! [Scanner](crate::scan::Scanner) whose events land in a small
//! queue; [next](PullParser::next) advances the underlying character
//! source only as far as needed to produce one token. The expectation
//! helpers validate token kind, bracket identity and meta policy and
//! return sentinel [PullError] variants a caller branches on.

use crate::buffered_chars::buffered_chars;
use crate::pos::Pos;
use crate::scan::{EventSink, ScanErrorAt, Scanner};
use crate::value::Parenkind;
use kstring::KString;
use std::collections::VecDeque;
use std::io::Read;
use thiserror::Error;

/// One pulled token. `Atom` text is reference-counted; cloning a
/// token is cheap.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Begin {
        kind: Parenkind,
        meta: bool,
    },
    End {
        kind: Parenkind,
        /// The flag the sequence was opened with.
        meta: bool,
    },
    Atom {
        text: KString,
        meta: bool,
        quoted: bool,
    },
    Eoi,
}

impl Token {
    pub fn name(&self) -> &'static str {
        match self {
            Token::Begin { .. } => "begin",
            Token::End { .. } => "end",
            Token::Atom { .. } => "atom",
            Token::Eoi => "end of input",
        }
    }

    pub fn is_meta(&self) -> bool {
        match self {
            Token::Begin { meta, .. } => *meta,
            Token::End { meta, .. } => *meta,
            Token::Atom { meta, .. } => *meta,
            Token::Eoi => false,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
           -> Result<(), std::fmt::Error> {
        f.write_str(self.name())
    }
}

/// Meta policy for the expectation helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetaPolicy {
    #[default]
    Allow,
    Require,
    Forbid,
}

#[derive(Error, Debug)]
pub enum PullError {
    #[error("{0}")]
    Scan(#[from] ScanErrorAt),
    #[error("input error: {0}")]
    Io(anyhow::Error),
    /// End of input where a token was required. Expected and
    /// recoverable; callers branch on it.
    #[error("pulled end of input")]
    Eoi,
    /// Meta marker present where the policy forbids one.
    #[error("pulled meta token")]
    Meta,
    /// Meta marker absent where the policy requires one.
    #[error("missing required meta marker")]
    NoMeta,
    #[error("expected {expected} token, got {got}")]
    UnexpectedToken {
        expected: &'static str,
        got: &'static str,
    },
    #[error("expected one of '{expected}', got '{got}'")]
    UnexpectedBracket { expected: String, got: char },
}

impl PullError {
    pub fn is_eoi(&self) -> bool {
        matches!(self, PullError::Eoi)
    }

    /// True for either direction of meta-policy violation.
    pub fn is_meta_violation(&self) -> bool {
        matches!(self, PullError::Meta | PullError::NoMeta)
    }
}

/// Sink collecting scanner events as tokens. Closing a bracket can
/// produce at most two tokens from one input character (a flushed
/// atom plus the end event), but the queue is sized defensively.
#[derive(Default)]
struct TokenQueue {
    toks: VecDeque<Token>,
}

impl EventSink for TokenQueue {
    fn begin(&mut self, meta: bool, kind: Parenkind) -> anyhow::Result<()> {
        self.toks.push_back(Token::Begin { kind, meta });
        Ok(())
    }

    fn end(&mut self, kind: Parenkind, meta: bool) -> anyhow::Result<()> {
        self.toks.push_back(Token::End { kind, meta });
        Ok(())
    }

    fn atom(&mut self, text: &str, meta: bool, quoted: bool) -> anyhow::Result<()> {
        self.toks.push_back(Token::Atom {
            text: KString::from_ref(text),
            meta,
            quoted,
        });
        Ok(())
    }
}

pub struct PullParser<I: Iterator<Item = anyhow::Result<char>>> {
    chars: I,
    scn: Scanner<TokenQueue>,
    last: Option<Token>,
    at_eof: bool,
}

/// Pull tokens from any `Read`, decoding UTF-8.
pub fn from_reader<R: Read>(rd: R) -> PullParser<impl Iterator<Item = anyhow::Result<char>>> {
    PullParser::new(buffered_chars(rd))
}

/// Pull tokens from an in-memory string.
pub fn from_str(s: &str) -> PullParser<impl Iterator<Item = anyhow::Result<char>> + '_> {
    PullParser::new(s.chars().map(Ok))
}

impl<I: Iterator<Item = anyhow::Result<char>>> PullParser<I> {
    pub fn new(chars: I) -> Self {
        PullParser {
            chars,
            scn: Scanner::new(TokenQueue::default()),
            last: None,
            at_eof: false,
        }
    }

    /// Label scan errors with a source name.
    pub fn src_hint(&mut self, hint: &str) {
        self.scn.src_hint(hint);
    }

    /// Characters consumed so far.
    pub fn pos(&self) -> Pos {
        self.scn.pos()
    }

    /// Advance to the next token. After the source is exhausted every
    /// further call yields [Token::Eoi].
    pub fn next(&mut self) -> Result<Token, PullError> {
        loop {
            if let Some(tok) = self.scn.sink_mut().toks.pop_front() {
                self.last = Some(tok.clone());
                return Ok(tok);
            }
            if self.at_eof {
                self.last = Some(Token::Eoi);
                return Ok(Token::Eoi);
            }
            match self.chars.next() {
                None => {
                    self.scn.finish()?;
                    self.at_eof = true;
                }
                Some(Err(e)) => return Err(PullError::Io(e)),
                Some(Ok(c)) => {
                    self.scn.push(c)?;
                }
            }
        }
    }

    /// The most recently pulled token, if any.
    pub fn last_token(&self) -> Option<&Token> {
        self.last.as_ref()
    }

    /// Bracket kind of the last token when it was a begin or end.
    pub fn last_kind(&self) -> Option<Parenkind> {
        match self.last {
            Some(Token::Begin { kind, .. }) => Some(kind),
            Some(Token::End { kind, .. }) => Some(kind),
            _ => None,
        }
    }

    pub fn was_meta(&self) -> bool {
        self.last.as_ref().map(Token::is_meta).unwrap_or(false)
    }

    /// Text of the last token when it was an atom. Valid until the
    /// next [next](PullParser::next) call replaces the token.
    pub fn last_atom(&self) -> Option<&str> {
        match &self.last {
            Some(Token::Atom { text, .. }) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn was_quoted(&self) -> bool {
        matches!(&self.last, Some(Token::Atom { quoted: true, .. }))
    }

    /// Skip over the current meta value, if the last token was one. A
    /// meta atom needs no skipping; a meta begin advances until the
    /// matching end has been consumed, discarding the whole subtree.
    pub fn skip_meta(&mut self) -> Result<(), PullError> {
        match &self.last {
            Some(Token::Begin { meta: true, .. }) => {
                let mut depth = 1usize;
                while depth > 0 {
                    match self.next()? {
                        Token::Begin { .. } => depth += 1,
                        Token::End { .. } => depth -= 1,
                        Token::Atom { .. } => {}
                        Token::Eoi => return Err(PullError::Eoi),
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn check_meta(&self, policy: MetaPolicy) -> Result<(), PullError> {
        match policy {
            MetaPolicy::Allow => Ok(()),
            MetaPolicy::Require => {
                if self.was_meta() {
                    Ok(())
                } else {
                    Err(PullError::NoMeta)
                }
            }
            MetaPolicy::Forbid => {
                if self.was_meta() {
                    Err(PullError::Meta)
                } else {
                    Ok(())
                }
            }
        }
    }

    fn unexpected(&self, expected: &'static str) -> PullError {
        PullError::UnexpectedToken {
            expected,
            got: self.last.as_ref().map(Token::name).unwrap_or("no token"),
        }
    }

    /// Validate that the current token is a begin with one of the
    /// `allowed` bracket kinds (empty slice: any) under the given
    /// meta policy.
    pub fn expect_begin(&self, allowed: &[Parenkind], policy: MetaPolicy)
                        -> Result<(), PullError> {
        match &self.last {
            Some(Token::Eoi) => Err(PullError::Eoi),
            Some(Token::Begin { kind, .. }) => {
                if !allowed.is_empty() && !allowed.contains(kind) {
                    return Err(PullError::UnexpectedBracket {
                        expected: allowed.iter().map(|k| k.opening()).collect(),
                        got: kind.opening(),
                    });
                }
                self.check_meta(policy)
            }
            _ => Err(self.unexpected("begin")),
        }
    }

    pub fn next_begin(&mut self, allowed: &[Parenkind], policy: MetaPolicy)
                      -> Result<(), PullError> {
        self.next()?;
        self.expect_begin(allowed, policy)
    }

    /// Validate that the current token is a non-meta end with one of
    /// the `allowed` bracket kinds (empty slice: any). A meta token
    /// here is [PullError::Meta] so that a caller iterating list
    /// members can dispatch to [skip_meta](PullParser::skip_meta).
    pub fn expect_end(&self, allowed: &[Parenkind]) -> Result<(), PullError> {
        match &self.last {
            Some(Token::Eoi) => Err(PullError::Eoi),
            Some(t) if t.is_meta() => Err(PullError::Meta),
            Some(Token::End { kind, .. }) => {
                if !allowed.is_empty() && !allowed.contains(kind) {
                    return Err(PullError::UnexpectedBracket {
                        expected: allowed.iter().map(|k| k.closing()).collect(),
                        got: kind.closing(),
                    });
                }
                Ok(())
            }
            _ => Err(self.unexpected("end")),
        }
    }

    pub fn next_end(&mut self, allowed: &[Parenkind]) -> Result<(), PullError> {
        self.next()?;
        self.expect_end(allowed)
    }

    /// Validate that the current token is an atom under the given
    /// meta policy and return its text.
    pub fn expect_atom(&self, policy: MetaPolicy) -> Result<&str, PullError> {
        match &self.last {
            Some(Token::Eoi) => Err(PullError::Eoi),
            Some(Token::Atom { text, .. }) => {
                self.check_meta(policy)?;
                Ok(text.as_str())
            }
            _ => Err(self.unexpected("atom")),
        }
    }

    pub fn next_atom(&mut self, policy: MetaPolicy) -> Result<KString, PullError> {
        self.next()?;
        self.expect_atom(policy).map(KString::from_ref)
    }
}
