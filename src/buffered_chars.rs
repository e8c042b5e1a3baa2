// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Decode code points from anything implementing `Read`. The scanner
//! is fed `char`s, never raw bytes, so a read boundary can never fall
//! inside a multi-byte sequence; the decoder buffers partial
//! sequences across reads.

use anyhow::{anyhow, Result};
use genawaiter::rc::Gen;
use std::io::{self, Read};
use utf8::BufReadDecoder;

pub fn buffered_chars<R>(fh: R) -> impl Iterator<Item = Result<char>>
where
    R: Read,
{
    Gen::new(|co| async move {
        let mut inp = BufReadDecoder::new(io::BufReader::new(fh));
        while let Some(r) = inp.next_strict() {
            match r {
                Ok(x) => {
                    for c in x.chars() {
                        co.yield_(Ok(c)).await;
                    }
                }
                Err(e) => {
                    co.yield_(Err(anyhow!("buffered_chars: {}", e))).await;
                    return;
                }
            }
        }
    })
    .into_iter()
}
