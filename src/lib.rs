// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Reading and writing Extended S-Expressions (XSX). "Extended"
//! means two things compared to plain S-expressions:
//!
//! * Nested structures are delimited by any of the balanced bracket
//!   pairs `()`, `[]` or `{}`, not only by `()`, and the kinds must
//!   match.
//!
//! * A `\` prefix tags the following atom or sequence as a *meta*
//!   value: out-of-band annotation that consumers can treat
//!   separately from (or skip entirely within) the ordinary data.
//!
//! The crate is organized in three layers:
//!
//! * [scan]: the incremental scanning state machine. Push characters
//!   in chunks of any size (down to one at a time) and receive
//!   begin/end/atom events through an
//!   [EventSink](crate::scan::EventSink); the event sequence does not
//!   depend on where the chunks were split.
//!
//! * [pull]: a token-at-a-time pull parser over the scanner, with
//!   expectation helpers for consumers that know what shape they are
//!   reading.
//!
//! * [print]: the output side. Three
//!   [Printer](crate::print::Printer) implementations (compact,
//!   caller-indented, pretty) share one atom quoting policy, found in
//!   [quote] together with the escape/unescape primitives.
//!
//! Atom contents are never interpreted: numbers, booleans and
//! whatever else are plain text here, typing is the caller's
//! business. All types hold their cursor and stack state inline and
//! are meant for single-threaded use; create one per stream.

pub mod buffered_chars;
pub mod pos;
pub mod print;
pub mod pull;
pub mod quote;
pub mod scan;
pub mod value;
