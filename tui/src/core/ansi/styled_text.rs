// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Styled text: ordered spans of `(text, attributes)`.
//!
//! This is the value type components render into, and the intermediate form
//! the wrap/slice layer operates over. Converting to ANSI uses the
//! minimal-diff SGR discipline; converting from ANSI runs the tokenizer and
//! the SGR machine. Width operations treat the concatenated span texts as one
//! Unicode text.

use std::fmt::Write as _;

use super::{
    attributes::TextAttributes,
    sgr::{apply_sgr_params, minimal_sgr_transition},
    token::{AnsiToken, ESC},
    tokenizer::tokenize,
};
use crate::{ColWidth, GraphemeWidthExt, width};

/// A contiguous string fragment with one attribute set. Empty-string spans
/// are legal; they carry no cells but survive round trips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextSpan {
    pub text: String,
    pub attributes: TextAttributes,
}

impl TextSpan {
    #[must_use]
    pub fn new(text: impl Into<String>, attributes: TextAttributes) -> Self {
        Self {
            text: text.into(),
            attributes,
        }
    }

    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextAttributes::default())
    }
}

/// Ordered sequence of [`TextSpan`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledText {
    pub spans: Vec<TextSpan>,
}

impl StyledText {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn from_spans(spans: impl Into<Vec<TextSpan>>) -> Self {
        Self {
            spans: spans.into(),
        }
    }

    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            spans: vec![TextSpan::plain(text)],
        }
    }

    /// Append a span, merging with the tail when the attributes match.
    pub fn push_span(&mut self, span: TextSpan) {
        if let Some(tail) = self.spans.last_mut()
            && tail.attributes == span.attributes
        {
            tail.text.push_str(&span.text);
            return;
        }
        self.spans.push(span);
    }

    /// Concatenation of all span texts.
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut acc = String::new();
        for span in &self.spans {
            acc.push_str(&span.text);
        }
        acc
    }

    /// Display width of the concatenated text.
    #[must_use]
    pub fn display_width(&self) -> ColWidth {
        let total: u16 = self
            .spans
            .iter()
            .map(|span| span.text.display_width().as_u16())
            .sum();
        width(total)
    }

    /// True iff there are no spans or every span's text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|span| span.text.is_empty())
    }

    /// Parse an ANSI string into spans by running the tokenizer and the SGR
    /// state machine. Non-SGR sequences (cursor moves, erases, OSC) carry no
    /// styling information for a single line of content and are dropped.
    #[must_use]
    pub fn from_ansi(input: &str) -> Self {
        let mut acc = Self::new();
        let mut state = TextAttributes::default();
        for token in tokenize(input) {
            match token {
                AnsiToken::Text(text) => {
                    acc.push_span(TextSpan::new(text, state));
                }
                AnsiToken::Sgr(params) => apply_sgr_params(&mut state, &params),
                AnsiToken::Cursor { .. }
                | AnsiToken::Erase { .. }
                | AnsiToken::Osc { .. }
                | AnsiToken::Control(_) => {}
            }
        }
        acc
    }

    /// Serialize to ANSI with minimal SGR transitions between spans.
    ///
    /// End-of-stream invariant: if the last emitted state is non-default, a
    /// single final `[0]` closes the stream; at most one trailing reset is
    /// ever produced.
    #[must_use]
    pub fn to_ansi(&self) -> String {
        let mut acc = String::new();
        let mut state = TextAttributes::default();
        for span in &self.spans {
            let transition = minimal_sgr_transition(&state, &span.attributes);
            if !transition.is_empty() {
                let _unused = write!(acc, "{}", AnsiToken::Sgr(transition));
                state = span.attributes;
            }
            acc.push_str(&span.text);
        }
        if !state.is_default() {
            let _unused = write!(acc, "{ESC}[0m");
        }
        acc
    }
}

impl From<TextSpan> for StyledText {
    fn from(span: TextSpan) -> Self {
        Self { spans: vec![span] }
    }
}
