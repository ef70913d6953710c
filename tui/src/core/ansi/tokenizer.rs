// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Single-pass ANSI tokenizer.
//!
//! A small DFA over the input bytes recognises `ESC [` (CSI), `ESC ]` (OSC)
//! and bare ESC. CSI sequences consume parameter bytes (`0x30..=0x3F`),
//! intermediate bytes (`0x20..=0x2F`) and a final byte (`0x40..=0x7E`).
//! Scanning byte-wise is safe on `&str` input because `0x1B` never occurs
//! inside a multi-byte UTF-8 scalar, so every cut lands on a char boundary.
//!
//! Malformed input policy:
//! - an unterminated OSC (or CSI) at end of input is emitted as [`AnsiToken::Text`],
//!   never as a partial structured token;
//! - a CSI with exotic parameter bytes (`?`, `:`, `<`, …) or intermediates is
//!   carried verbatim as [`AnsiToken::Control`];
//! - a bare ESC is carried as a one-byte [`AnsiToken::Control`].

use smallvec::smallvec;

use super::token::{AnsiToken, BEL, ESC, OscTerminator};
use crate::SgrParams;

const PARAM_LO: u8 = 0x30;
const PARAM_HI: u8 = 0x3F;
const INTERMEDIATE_LO: u8 = 0x20;
const INTERMEDIATE_HI: u8 = 0x2F;
const FINAL_LO: u8 = 0x40;
const FINAL_HI: u8 = 0x7E;

/// Tokenize an ANSI byte stream.
#[must_use]
pub fn tokenize(input: &str) -> Vec<AnsiToken> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut index = 0;

    while index < bytes.len() {
        if bytes[index] != 0x1B {
            index += 1;
            continue;
        }

        if text_start < index {
            tokens.push(AnsiToken::Text(input[text_start..index].to_string()));
        }

        match bytes.get(index + 1) {
            Some(b'[') => match scan_csi(input, index) {
                Some((token, end)) => {
                    tokens.push(token);
                    index = end;
                }
                None => {
                    // Unterminated CSI: the remainder is plain text.
                    tokens.push(AnsiToken::Text(input[index..].to_string()));
                    index = bytes.len();
                }
            },
            Some(b']') => match scan_osc(input, index) {
                Some((token, end)) => {
                    tokens.push(token);
                    index = end;
                }
                None => {
                    tokens.push(AnsiToken::Text(input[index..].to_string()));
                    index = bytes.len();
                }
            },
            _ => {
                // Bare ESC (possibly at end of input).
                tokens.push(AnsiToken::Control(ESC.to_string()));
                index += 1;
            }
        }
        text_start = index;
    }

    if text_start < bytes.len() {
        tokens.push(AnsiToken::Text(input[text_start..].to_string()));
    }

    tokens
}

/// Scan a CSI sequence starting at `start` (which points at ESC). Returns the
/// token and the index one past the final byte, or `None` if no final byte
/// exists in the input.
fn scan_csi(input: &str, start: usize) -> Option<(AnsiToken, usize)> {
    let bytes = input.as_bytes();
    let mut cursor = start + 2;
    let params_start = cursor;

    while cursor < bytes.len() && (PARAM_LO..=PARAM_HI).contains(&bytes[cursor]) {
        cursor += 1;
    }
    let params_end = cursor;

    let intermediates_start = cursor;
    while cursor < bytes.len()
        && (INTERMEDIATE_LO..=INTERMEDIATE_HI).contains(&bytes[cursor])
    {
        cursor += 1;
    }
    let has_intermediates = cursor > intermediates_start;

    let final_byte = *bytes.get(cursor)?;
    if !(FINAL_LO..=FINAL_HI).contains(&final_byte) {
        return None;
    }
    let end = cursor + 1;

    let params_raw = &input[params_start..params_end];
    let canonical_params = params_raw.bytes().all(|b| b.is_ascii_digit() || b == b';');

    // Private-parameter or intermediate-laden sequences are not ours to
    // interpret; carry them verbatim.
    if !canonical_params || has_intermediates {
        return Some((AnsiToken::Control(input[start..end].to_string()), end));
    }

    let token = match final_byte {
        b'm' => AnsiToken::Sgr(parse_params(params_raw)),
        b'A'..=b'G' => AnsiToken::Cursor {
            count: first_param(params_raw, 1),
            final_byte: char::from(final_byte),
        },
        b'J' | b'K' => AnsiToken::Erase {
            mode: first_param(params_raw, 0),
            kind: char::from(final_byte),
        },
        _ => AnsiToken::Control(input[start..end].to_string()),
    };
    Some((token, end))
}

/// Scan an OSC sequence starting at `start`. Accepts BEL or `ESC \` as the
/// terminator. Returns `None` when unterminated.
fn scan_osc(input: &str, start: usize) -> Option<(AnsiToken, usize)> {
    let bytes = input.as_bytes();
    let body_start = start + 2;
    let mut cursor = body_start;

    let (body_end, terminator, end) = loop {
        match bytes.get(cursor)? {
            0x07 => break (cursor, OscTerminator::Bel, cursor + 1),
            0x1B if bytes.get(cursor + 1) == Some(&b'\\') => {
                break (cursor, OscTerminator::St, cursor + 2);
            }
            _ => cursor += 1,
        }
    };

    let body = &input[body_start..body_end];
    let (cmd, data) = match body.split_once(';') {
        Some((cmd, data)) => (cmd.to_string(), data.to_string()),
        None => (body.to_string(), String::new()),
    };

    Some((
        AnsiToken::Osc {
            cmd,
            data,
            terminator,
        },
        end,
    ))
}

fn parse_params(raw: &str) -> SgrParams {
    if raw.is_empty() {
        return smallvec![];
    }
    raw.split(';')
        .map(|group| {
            group
                .bytes()
                .fold(0_u32, |acc, digit| {
                    (acc * 10 + u32::from(digit - b'0')).min(u32::from(u16::MAX))
                })
                .min(u32::from(u16::MAX)) as u16
        })
        .collect()
}

fn first_param(raw: &str, default: u16) -> u16 {
    let params = parse_params(raw);
    match params.first() {
        Some(first) => *first,
        None => default,
    }
}
