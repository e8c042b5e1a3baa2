// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The incremental scanning state machine. A [Scanner] consumes one
//! code point at a time and fires begin/end/atom events on its
//! [EventSink] as structural units complete. Input may be split into
//! arbitrary chunks (down to a single character per call); the event
//! sequence is the same no matter where the splits fall. The only
//! state carried across chunk boundaries is the in-progress token
//! buffer and the quote/escape sub-state.
//!
//! Chunking is defined over code points: decode bytes to `char`
//! before feeding the scanner (see
//! [buffered_chars](crate::buffered_chars)), then any split between
//! two code points is safe.

use crate::buffered_chars::buffered_chars;
use crate::pos::Pos;
use crate::quote::{META, QUOTE};
use crate::value::Parenkind;
use kstring::KString;
use std::io::Read;
use thiserror::Error;

/// The text of the synthetic atom emitted for a meta marker with
/// nothing to attach to.
const META_ATOM: &str = "\\";

/// Receiver of structural events. All three callbacks may fail; a
/// failure aborts the current scan and is reported as
/// [ScanError::Callback] with the scan position attached.
pub trait EventSink {
    /// An opening bracket was consumed.
    fn begin(&mut self, meta: bool, kind: Parenkind) -> anyhow::Result<()>;
    /// The matching closing bracket was consumed. `meta` is the flag
    /// the sequence was opened with.
    fn end(&mut self, kind: Parenkind, meta: bool) -> anyhow::Result<()>;
    /// A complete atom was consumed.
    fn atom(&mut self, text: &str, meta: bool, quoted: bool) -> anyhow::Result<()>;
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("unbalanced bracing: '{found}', expected '{expected}'")]
    Mismatch { expected: char, found: char },
    #[error("closing '{0}' at top level")]
    UnexpectedClosing(char),
    #[error("unterminated quoted atom")]
    UnterminatedQuoted,
    #[error("cannot finish scanning in nested expression")]
    UnfinishedNesting,
    #[error("{event} event handler failed: {source}")]
    Callback {
        event: &'static str,
        source: anyhow::Error,
    },
    #[error("input error: {0}")]
    Io(anyhow::Error),
}

/// A [ScanError] with the position it occurred at and an optional
/// label for the input source.
#[derive(Error, Debug)]
pub struct ScanErrorAt {
    pub err: ScanError,
    pub pos: Pos,
    pub hint: Option<KString>,
}

impl std::fmt::Display for ScanErrorAt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
           -> Result<(), std::fmt::Error> {
        if let Some(hint) = &self.hint {
            f.write_str(hint)?;
        }
        f.write_fmt(format_args!("{}:{}", self.pos, self.err))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Between tokens.
    Idle,
    /// Inside a bare atom; the text so far is in the token buffer.
    Bare,
    /// Inside a quoted atom. `escaped` is set for exactly one
    /// character after an unconsumed backslash.
    Quoted { escaped: bool },
}

#[derive(Debug, Clone, Copy)]
struct Nesting {
    meta: bool,
    kind: Parenkind,
}

/// The scanner proper. Create once, drive via [push](Scanner::push) /
/// [scan_str](Scanner::scan_str) / [read](Scanner::read) plus a final
/// [finish](Scanner::finish), and [reset](Scanner::reset) for reuse.
/// Not for shared use across threads; all state is unsynchronized.
pub struct Scanner<S: EventSink> {
    sink: S,
    hint: Option<KString>,
    pos: Pos,
    meta: bool,
    state: ScanState,
    buf: String,
    nest: Vec<Nesting>,
    ws: Option<String>,
}

impl<S: EventSink> Scanner<S> {
    pub fn new(sink: S) -> Self {
        Scanner {
            sink,
            hint: None,
            pos: Pos::default(),
            meta: false,
            state: ScanState::Idle,
            buf: String::new(),
            nest: Vec::new(),
            ws: None,
        }
    }

    /// Label errors from this scanner with a source name, e.g. a file
    /// path.
    pub fn src_hint(&mut self, hint: &str) {
        self.hint = Some(KString::from_ref(hint));
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Characters consumed since creation or the last reset.
    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// Current structural nesting depth.
    pub fn depth(&self) -> usize {
        self.nest.len()
    }

    /// True when the scanner is between top-level values: no token in
    /// progress, no pending meta marker, depth zero.
    pub fn is_complete(&self) -> bool {
        self.state == ScanState::Idle && !self.meta && self.nest.is_empty()
    }

    /// Buffer consumed whitespace verbatim so that a caller can
    /// reproduce the input spacing. Off by default.
    pub fn retain_whitespace(&mut self, on: bool) {
        if on {
            if self.ws.is_none() {
                self.ws = Some(String::new());
            }
        } else {
            self.ws = None;
        }
    }

    /// Drain the whitespace retained since the last call. Empty when
    /// retention is off.
    pub fn take_whitespace(&mut self) -> String {
        self.ws.as_mut().map(std::mem::take).unwrap_or_default()
    }

    /// Return to the initial state without reallocating, discarding
    /// any partial token, pending meta marker and open nesting.
    pub fn reset(&mut self) {
        self.pos = Pos::default();
        self.meta = false;
        self.state = ScanState::Idle;
        self.buf.clear();
        self.nest.clear();
        if let Some(ws) = &mut self.ws {
            ws.clear();
        }
    }

    fn err(&self, err: ScanError) -> ScanErrorAt {
        ScanErrorAt {
            err,
            pos: self.pos,
            hint: self.hint.clone(),
        }
    }

    fn callback_err(&self, event: &'static str, source: anyhow::Error) -> ScanErrorAt {
        self.err(ScanError::Callback { event, source })
    }

    /// Consume one code point. `Ok(true)` exactly when this character
    /// closed a top-level sequence, i.e. a whole structure is
    /// complete; an incremental reader uses this to hand off one form
    /// at a time.
    pub fn push(&mut self, c: char) -> Result<bool, ScanErrorAt> {
        let res = self.step(c);
        if res.is_ok() {
            self.pos.advance();
        }
        res
    }

    /// Consume a contiguous chunk. Chunk boundaries are
    /// insignificant: any partitioning of the input into `scan_str`
    /// calls yields the same event sequence.
    pub fn scan_str(&mut self, chunk: &str) -> Result<(), ScanErrorAt> {
        for c in chunk.chars() {
            self.push(c)?;
        }
        Ok(())
    }

    /// Scan everything from `rd` and finish.
    pub fn read(&mut self, rd: impl Read) -> Result<(), ScanErrorAt> {
        for r in buffered_chars(rd) {
            match r {
                Err(e) => return Err(self.err(ScanError::Io(e))),
                Ok(c) => {
                    self.push(c)?;
                }
            }
        }
        self.finish()
    }

    /// Declare end of input. Fails while nested or inside a quoted
    /// atom; otherwise flushes a pending bare atom or meta marker.
    /// A second call after success is a no-op.
    pub fn finish(&mut self) -> Result<(), ScanErrorAt> {
        if !self.nest.is_empty() {
            return Err(self.err(ScanError::UnfinishedNesting));
        }
        match self.state {
            ScanState::Quoted { .. } => Err(self.err(ScanError::UnterminatedQuoted)),
            ScanState::Bare => self.flush_atom(false),
            ScanState::Idle => {
                if self.meta {
                    self.flush_meta_marker()
                } else {
                    Ok(())
                }
            }
        }
    }

    fn step(&mut self, c: char) -> Result<bool, ScanErrorAt> {
        match self.state {
            ScanState::Quoted { escaped } => {
                if escaped {
                    self.buf.push(c);
                    self.state = ScanState::Quoted { escaped: false };
                } else if c == META {
                    self.state = ScanState::Quoted { escaped: true };
                } else if c == QUOTE {
                    self.flush_atom(true)?;
                } else {
                    self.buf.push(c);
                }
                Ok(false)
            }
            ScanState::Bare => {
                if is_atom_delimiter(c) {
                    self.flush_atom(false)?;
                    self.dispatch_idle(c)
                } else {
                    self.buf.push(c);
                    Ok(false)
                }
            }
            ScanState::Idle => self.dispatch_idle(c),
        }
    }

    fn dispatch_idle(&mut self, c: char) -> Result<bool, ScanErrorAt> {
        if c.is_whitespace() {
            if self.meta {
                self.flush_meta_marker()?;
            }
            if let Some(ws) = &mut self.ws {
                ws.push(c);
            }
            return Ok(false);
        }
        if let Some(kind) = Parenkind::from_opening(c) {
            self.fire_begin(kind)?;
            return Ok(false);
        }
        if let Some(kind) = Parenkind::from_closing(c) {
            if self.meta {
                self.flush_meta_marker()?;
            }
            return self.fire_end(kind);
        }
        if c == QUOTE {
            self.buf.clear();
            self.state = ScanState::Quoted { escaped: false };
        } else if c == META {
            if self.meta {
                // Doubled escape: one literal escape character as an
                // ordinary atom.
                self.flush_meta_marker()?;
            } else {
                self.meta = true;
            }
        } else {
            self.buf.clear();
            self.buf.push(c);
            self.state = ScanState::Bare;
        }
        Ok(false)
    }

    fn fire_begin(&mut self, kind: Parenkind) -> Result<(), ScanErrorAt> {
        let meta = self.meta;
        self.sink
            .begin(meta, kind)
            .map_err(|e| self.callback_err("begin", e))?;
        self.nest.push(Nesting { meta, kind });
        self.meta = false;
        Ok(())
    }

    fn fire_end(&mut self, found: Parenkind) -> Result<bool, ScanErrorAt> {
        let n = match self.nest.pop() {
            Some(n) => n,
            None => {
                return Err(self.err(ScanError::UnexpectedClosing(found.closing())));
            }
        };
        if n.kind != found {
            return Err(self.err(ScanError::Mismatch {
                expected: n.kind.closing(),
                found: found.closing(),
            }));
        }
        self.sink
            .end(found, n.meta)
            .map_err(|e| self.callback_err("end", e))?;
        Ok(self.nest.is_empty())
    }

    /// Emit the buffered token and return to Idle. Consumes the meta
    /// flag.
    fn flush_atom(&mut self, quoted: bool) -> Result<(), ScanErrorAt> {
        let meta = self.meta;
        self.sink
            .atom(&self.buf, meta, quoted)
            .map_err(|e| self.callback_err("atom", e))?;
        self.meta = false;
        self.buf.clear();
        self.state = ScanState::Idle;
        Ok(())
    }

    /// A pending meta marker followed by nothing it could attach to
    /// becomes a literal escape-character atom, non-meta.
    fn flush_meta_marker(&mut self) -> Result<(), ScanErrorAt> {
        self.meta = false;
        self.sink
            .atom(META_ATOM, false, false)
            .map_err(|e| self.callback_err("atom", e))
    }
}

/// Characters that terminate a bare atom.
fn is_atom_delimiter(c: char) -> bool {
    c.is_whitespace() || c == QUOTE || c == META || Parenkind::is_bracket_char(c)
}
