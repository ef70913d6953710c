// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Incremental key-event decoder.
//!
//! [`InputDecoder::feed`] appends raw bytes to an internal buffer and drains
//! as many complete events as the buffer allows, leaving partial sequences
//! (a lone ESC, a half-received CSI, a paste body without its end marker)
//! for the next read.
//!
//! Decode order per iteration:
//! 1. paste mode: scan for `ESC [ 201 ~`, accumulate until it arrives;
//! 2. `0x03` → Ctrl-C, `0x04` → Ctrl-D;
//! 3. `ESC [ 200 ~` at position 0 → enter paste mode;
//! 4. ESC sequences: CSI (`ESC [`), SS3 (`ESC O`), otherwise consume the ESC
//!    alone;
//! 5. plain bytes: Tab / Enter / Backspace / printable UTF-8 become key
//!    events; anything else is dropped one byte at a time, never emitted.
//!
//! Unknown or malformed sequences never poison the buffer: the decoder
//! always either waits for more bytes or consumes at least one.

use super::key_event::{KeyEvent, KeyKind, Modifiers};

const PASTE_START: &[u8] = b"\x1b[200~";
const PASTE_END: &[u8] = b"\x1b[201~";
const ESC: u8 = 0x1B;

/// What one decode step decided.
enum Step {
    Emit(KeyEvent, usize),
    Consume(usize),
    Wait,
}

/// Incremental decoder state: the byte buffer and, while inside a bracketed
/// paste, the accumulated paste body.
#[derive(Debug, Default)]
pub struct InputDecoder {
    buffer: Vec<u8>,
    paste: Option<Vec<u8>>,
}

impl InputDecoder {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Feed raw bytes; returns every event that became complete.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<KeyEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        loop {
            if self.paste.is_some() {
                match self.step_paste() {
                    Some(event) => events.push(event),
                    None => break,
                }
                continue;
            }

            match self.step() {
                Step::Emit(event, consumed) => {
                    events.push(event);
                    self.buffer.drain(..consumed);
                }
                Step::Consume(consumed) => {
                    self.buffer.drain(..consumed);
                }
                Step::Wait => break,
            }
        }

        events
    }

    /// In paste mode: look for the end marker; otherwise move everything
    /// except a possible partial marker suffix into the paste body and wait.
    fn step_paste(&mut self) -> Option<KeyEvent> {
        let paste_body = self.paste.as_mut()?;
        if let Some(position) = find_subsequence(&self.buffer, PASTE_END) {
            paste_body.extend_from_slice(&self.buffer[..position]);
            let text = String::from_utf8_lossy(paste_body).into_owned();
            self.paste = None;
            self.buffer.drain(..position + PASTE_END.len());
            return Some(KeyEvent::Paste(text));
        }

        let keep = longest_partial_marker_suffix(&self.buffer, PASTE_END);
        let cut = self.buffer.len() - keep;
        paste_body.extend_from_slice(&self.buffer[..cut]);
        self.buffer.drain(..cut);
        None
    }

    fn step(&mut self) -> Step {
        let Some(&first) = self.buffer.first() else {
            return Step::Wait;
        };

        match first {
            0x03 => return Step::Emit(KeyEvent::CtrlC, 1),
            0x04 => return Step::Emit(KeyEvent::CtrlD, 1),
            _ => {}
        }

        if self.buffer.starts_with(PASTE_START) {
            self.paste = Some(Vec::new());
            return Step::Consume(PASTE_START.len());
        }
        if PASTE_START.starts_with(&self.buffer) {
            // Partial paste-start marker; indistinguishable from other CSI
            // prefixes, so wait either way.
            return Step::Wait;
        }

        if first == ESC {
            if self.buffer.len() == 1 {
                return Step::Wait;
            }
            return match self.buffer[1] {
                b'[' => decode_csi(&self.buffer),
                b'O' => decode_ss3(&self.buffer),
                // Unknown ESC sequence: consume the ESC only.
                _ => Step::Consume(1),
            };
        }

        decode_plain(&self.buffer)
    }
}

/// `ESC [ params final` with `final ∈ A..Z | ~`.
fn decode_csi(buffer: &[u8]) -> Step {
    let mut cursor = 2;
    loop {
        let Some(&byte) = buffer.get(cursor) else {
            return Step::Wait;
        };
        match byte {
            // Parameter bytes keep the scan alive.
            0x30..=0x3F => cursor += 1,
            // Any final byte ends the sequence; which ones produce events is
            // decided below.
            0x40..=0x7E => break,
            // Malformed: consume the ESC only.
            _ => return Step::Consume(1),
        }
    }

    let final_byte = buffer[cursor];
    let consumed = cursor + 1;
    let body = &buffer[2..cursor];

    if !body.iter().all(|b| b.is_ascii_digit() || *b == b';') {
        // Private parameters (`?`, `<`, ...): swallow the sequence whole,
        // emit nothing.
        return Step::Consume(consumed);
    }

    let params: Vec<u16> = if body.is_empty() {
        Vec::new()
    } else {
        body.split(|b| *b == b';')
            .map(|group| {
                group.iter().fold(0_u32, |acc, digit| {
                    (acc * 10 + u32::from(digit - b'0')).min(u32::from(u16::MAX))
                }) as u16
            })
            .collect()
    };

    let modifiers = params
        .get(1)
        .map_or(Modifiers::NONE, |code| Modifiers::from_xterm_code(*code));

    let event = match final_byte {
        b'A' | b'B' | b'C' | b'D' => {
            let kind = match final_byte {
                b'A' => KeyKind::Up,
                b'B' => KeyKind::Down,
                b'C' => KeyKind::Right,
                _ => KeyKind::Left,
            };
            if params.len() >= 2 {
                Some(KeyEvent::key_with(kind, modifiers))
            } else {
                // Back-compat bare arrows.
                Some(match kind {
                    KeyKind::Up => KeyEvent::ArrowUp,
                    KeyKind::Down => KeyEvent::ArrowDown,
                    KeyKind::Right => KeyEvent::ArrowRight,
                    _ => KeyEvent::ArrowLeft,
                })
            }
        }
        b'H' => Some(KeyEvent::key_with(KeyKind::Home, modifiers)),
        b'F' => Some(KeyEvent::key_with(KeyKind::End, modifiers)),
        b'Z' => {
            // Shift-Tab. The shift is implied by the final byte itself.
            let mut mods = modifiers;
            mods.shift = true;
            Some(KeyEvent::key_with(KeyKind::Tab, mods))
        }
        b'~' => tilde_family_kind(params.first().copied().unwrap_or(0))
            .map(|kind| KeyEvent::key_with(kind, modifiers)),
        _ => None,
    };

    match event {
        Some(event) => Step::Emit(event, consumed),
        None => Step::Consume(consumed),
    }
}

fn tilde_family_kind(code: u16) -> Option<KeyKind> {
    match code {
        2 => Some(KeyKind::Insert),
        3 => Some(KeyKind::Delete),
        5 => Some(KeyKind::PageUp),
        6 => Some(KeyKind::PageDown),
        15 => Some(KeyKind::Function(5)),
        17 => Some(KeyKind::Function(6)),
        18 => Some(KeyKind::Function(7)),
        19 => Some(KeyKind::Function(8)),
        20 => Some(KeyKind::Function(9)),
        21 => Some(KeyKind::Function(10)),
        23 => Some(KeyKind::Function(11)),
        24 => Some(KeyKind::Function(12)),
        _ => None,
    }
}

/// `ESC O final`: three-byte application-mode sequences.
fn decode_ss3(buffer: &[u8]) -> Step {
    let Some(&final_byte) = buffer.get(2) else {
        return Step::Wait;
    };
    let event = match final_byte {
        b'A' => Some(KeyEvent::ArrowUp),
        b'B' => Some(KeyEvent::ArrowDown),
        b'C' => Some(KeyEvent::ArrowRight),
        b'D' => Some(KeyEvent::ArrowLeft),
        b'P' => Some(KeyEvent::key(KeyKind::Function(1))),
        b'Q' => Some(KeyEvent::key(KeyKind::Function(2))),
        b'R' => Some(KeyEvent::key(KeyKind::Function(3))),
        b'S' => Some(KeyEvent::key(KeyKind::Function(4))),
        b'H' => Some(KeyEvent::key(KeyKind::Home)),
        b'F' => Some(KeyEvent::key(KeyKind::End)),
        _ => None,
    };
    match event {
        Some(event) => Step::Emit(event, 3),
        // Unknown SS3: consume the ESC only.
        None => Step::Consume(1),
    }
}

/// Plain bytes: the handful of C0 keys we surface, plus printable UTF-8.
fn decode_plain(buffer: &[u8]) -> Step {
    let first = buffer[0];
    match first {
        0x09 => Step::Emit(KeyEvent::key(KeyKind::Tab), 1),
        0x0A | 0x0D => Step::Emit(KeyEvent::key(KeyKind::Enter), 1),
        0x08 | 0x7F => Step::Emit(KeyEvent::key(KeyKind::Backspace), 1),
        0x20..=0x7E => Step::Emit(
            KeyEvent::key(KeyKind::Char(char::from(first))),
            1,
        ),
        0xC2..=0xF4 => {
            let needed = match first {
                0xC2..=0xDF => 2,
                0xE0..=0xEF => 3,
                _ => 4,
            };
            if buffer.len() < needed {
                return Step::Wait;
            }
            match std::str::from_utf8(&buffer[..needed]) {
                Ok(text) => match text.chars().next() {
                    Some(scalar) => Step::Emit(
                        KeyEvent::key(KeyKind::Char(scalar)),
                        needed,
                    ),
                    None => Step::Consume(1),
                },
                Err(_) => Step::Consume(1),
            }
        }
        // Remaining control / invalid bytes: dropped, never emitted.
        _ => Step::Consume(1),
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Longest suffix of `buffer` that is a proper prefix of `marker`, so a
/// marker split across two reads is not swallowed into the paste body.
fn longest_partial_marker_suffix(buffer: &[u8], marker: &[u8]) -> usize {
    for keep in (1..marker.len()).rev() {
        if buffer.len() >= keep && buffer.ends_with(&marker[..keep]) {
            return keep;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn feed_all(bytes: &[u8]) -> Vec<KeyEvent> {
        InputDecoder::new().feed(bytes)
    }

    #[test]
    fn test_ctrl_c_and_d() {
        assert_eq!(feed_all(b"\x03\x04"), vec![KeyEvent::CtrlC, KeyEvent::CtrlD]);
    }

    #[test]
    fn test_bare_arrows() {
        assert_eq!(
            feed_all(b"\x1b[A\x1b[B\x1b[C\x1b[D"),
            vec![
                KeyEvent::ArrowUp,
                KeyEvent::ArrowDown,
                KeyEvent::ArrowRight,
                KeyEvent::ArrowLeft,
            ]
        );
    }

    #[test]
    fn test_ctrl_arrow_modifier_decoding() {
        assert_eq!(
            feed_all(b"\x1b[1;5A"),
            vec![KeyEvent::key_with(KeyKind::Up, Modifiers::CTRL)]
        );
    }

    #[test_case(b"\x1b[5~", KeyKind::PageUp; "page up")]
    #[test_case(b"\x1b[6~", KeyKind::PageDown; "page down")]
    #[test_case(b"\x1b[2~", KeyKind::Insert; "insert")]
    #[test_case(b"\x1b[3~", KeyKind::Delete; "delete")]
    #[test_case(b"\x1b[15~", KeyKind::Function(5); "f5")]
    #[test_case(b"\x1b[23~", KeyKind::Function(11); "f11")]
    #[test_case(b"\x1b[24~", KeyKind::Function(12); "f12")]
    fn test_tilde_family(bytes: &[u8], expected: KeyKind) {
        assert_eq!(feed_all(bytes), vec![KeyEvent::key(expected)]);
    }

    #[test]
    fn test_tilde_family_with_modifier() {
        assert_eq!(
            feed_all(b"\x1b[15;5~"),
            vec![KeyEvent::key_with(KeyKind::Function(5), Modifiers::CTRL)]
        );
    }

    #[test]
    fn test_home_end_and_modifiers() {
        assert_eq!(feed_all(b"\x1b[H"), vec![KeyEvent::key(KeyKind::Home)]);
        assert_eq!(
            feed_all(b"\x1b[1;2F"),
            vec![KeyEvent::key_with(KeyKind::End, Modifiers::SHIFT)]
        );
    }

    #[test]
    fn test_ss3_sequences() {
        assert_eq!(feed_all(b"\x1bOP"), vec![KeyEvent::key(KeyKind::Function(1))]);
        assert_eq!(feed_all(b"\x1bOS"), vec![KeyEvent::key(KeyKind::Function(4))]);
        assert_eq!(feed_all(b"\x1bOA"), vec![KeyEvent::ArrowUp]);
        assert_eq!(feed_all(b"\x1bOH"), vec![KeyEvent::key(KeyKind::Home)]);
    }

    #[test]
    fn test_tab_and_shift_tab() {
        assert_eq!(feed_all(b"\t"), vec![KeyEvent::key(KeyKind::Tab)]);
        assert_eq!(
            feed_all(b"\x1b[Z"),
            vec![KeyEvent::key_with(KeyKind::Tab, Modifiers::SHIFT)]
        );
    }

    #[test]
    fn test_bracketed_paste_single_event() {
        assert_eq!(
            feed_all(b"\x1b[200~hello\x1b[201~"),
            vec![KeyEvent::Paste("hello".into())]
        );
    }

    #[test]
    fn test_bracketed_paste_split_across_reads() {
        let mut decoder = InputDecoder::new();
        assert!(decoder.feed(b"\x1b[200~hel").is_empty());
        assert!(decoder.feed(b"lo\x1b[2").is_empty());
        assert_eq!(
            decoder.feed(b"01~"),
            vec![KeyEvent::Paste("hello".into())]
        );
    }

    #[test]
    fn test_paste_body_keys_are_not_emitted() {
        let events = feed_all(b"\x1b[200~a\x03\x1b[A\x1b[201~");
        assert_eq!(
            events,
            vec![KeyEvent::Paste("a\u{3}\u{1b}[A".into())]
        );
    }

    #[test]
    fn test_partial_csi_waits_for_more() {
        let mut decoder = InputDecoder::new();
        assert!(decoder.feed(b"\x1b").is_empty());
        assert!(decoder.feed(b"[1;5").is_empty());
        assert_eq!(
            decoder.feed(b"A"),
            vec![KeyEvent::key_with(KeyKind::Up, Modifiers::CTRL)]
        );
    }

    #[test]
    fn test_unknown_esc_sequence_consumes_esc_only() {
        // `ESC x`: the ESC is consumed, then 'x' decodes as a char key.
        assert_eq!(
            feed_all(b"\x1bx"),
            vec![KeyEvent::key(KeyKind::Char('x'))]
        );
    }

    #[test]
    fn test_private_csi_sequences_are_swallowed() {
        assert_eq!(feed_all(b"\x1b[?25l"), vec![]);
    }

    #[test]
    fn test_plain_text_and_utf8() {
        assert_eq!(
            feed_all(b"ab"),
            vec![
                KeyEvent::key(KeyKind::Char('a')),
                KeyEvent::key(KeyKind::Char('b')),
            ]
        );
        assert_eq!(
            feed_all("é".as_bytes()),
            vec![KeyEvent::key(KeyKind::Char('é'))]
        );
    }

    #[test]
    fn test_utf8_scalar_split_across_reads() {
        let bytes = "世".as_bytes();
        let mut decoder = InputDecoder::new();
        assert!(decoder.feed(&bytes[..1]).is_empty());
        assert!(decoder.feed(&bytes[1..2]).is_empty());
        assert_eq!(
            decoder.feed(&bytes[2..]),
            vec![KeyEvent::key(KeyKind::Char('世'))]
        );
    }

    #[test]
    fn test_stray_control_bytes_dropped() {
        assert_eq!(feed_all(b"\x01\x02\x1f"), vec![]);
    }

    #[test]
    fn test_enter_and_backspace() {
        assert_eq!(
            feed_all(b"\r\x7f"),
            vec![
                KeyEvent::key(KeyKind::Enter),
                KeyEvent::key(KeyKind::Backspace),
            ]
        );
    }
}
