// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! The token model produced by the ANSI tokenizer, and its encoder.
//!
//! Encoding is the inverse of parsing for every token stream this crate
//! emits: parameters are written in canonical form (defaults omitted — `1`
//! for cursor moves, `0` for erase modes), and OSC terminators round-trip
//! as parsed (BEL stays BEL, ST stays ST).

use std::fmt::{Display, Formatter, Result, Write as _};

use crate::SgrParams;

pub const ESC: char = '\u{1b}';
pub const BEL: char = '\u{7}';
/// String terminator, `ESC \`.
pub const ST: &str = "\u{1b}\\";

/// How an OSC sequence was (and will be) terminated.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum OscTerminator {
    #[default]
    Bel,
    St,
}

/// One lexical unit of an ANSI byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnsiToken {
    /// A run of printable text between escape sequences.
    Text(String),
    /// `ESC [ params m` — Select Graphic Rendition. An empty parameter list
    /// encodes as `ESC [ m` and means reset, per ECMA-48 defaults.
    Sgr(SgrParams),
    /// `ESC [ n F` with `F ∈ {A,B,C,D,E,F,G}` — relative cursor movement.
    Cursor { count: u16, final_byte: char },
    /// `ESC [ mode F` with `F ∈ {J,K}` — erase in display / line.
    Erase { mode: u16, kind: char },
    /// `ESC ] cmd ; data terminator` — Operating System Command.
    Osc {
        cmd: String,
        data: String,
        terminator: OscTerminator,
    },
    /// Any other escape sequence, carried verbatim (including the leading
    /// ESC) so it can be re-emitted untouched.
    Control(String),
}

impl Display for AnsiToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            AnsiToken::Text(text) => f.write_str(text),
            AnsiToken::Sgr(params) => {
                write!(f, "{ESC}[")?;
                write_params(f, params)?;
                f.write_char('m')
            }
            AnsiToken::Cursor { count, final_byte } => {
                write!(f, "{ESC}[")?;
                if *count != 1 {
                    write!(f, "{count}")?;
                }
                f.write_char(*final_byte)
            }
            AnsiToken::Erase { mode, kind } => {
                write!(f, "{ESC}[")?;
                if *mode != 0 {
                    write!(f, "{mode}")?;
                }
                f.write_char(*kind)
            }
            AnsiToken::Osc {
                cmd,
                data,
                terminator,
            } => {
                write!(f, "{ESC}]{cmd}")?;
                if !data.is_empty() {
                    write!(f, ";{data}")?;
                }
                match terminator {
                    OscTerminator::Bel => f.write_char(BEL),
                    OscTerminator::St => f.write_str(ST),
                }
            }
            AnsiToken::Control(raw) => f.write_str(raw),
        }
    }
}

fn write_params(f: &mut Formatter<'_>, params: &[u16]) -> Result {
    for (index, param) in params.iter().enumerate() {
        if index > 0 {
            f.write_char(';')?;
        }
        write!(f, "{param}")?;
    }
    Ok(())
}

/// Serialize a token stream back into ANSI bytes.
#[must_use]
pub fn encode_tokens(tokens: &[AnsiToken]) -> String {
    let mut acc = String::new();
    for token in tokens {
        let _unused = write!(acc, "{token}");
    }
    acc
}
