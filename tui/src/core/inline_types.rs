// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Stack-allocated storage aliases used on hot paths.
//!
//! Most strings and vectors in this crate are tiny: a grapheme cluster, a
//! handful of SGR parameters, a few spans per line. [`smallvec::SmallVec`] and
//! [`smallstr::SmallString`] keep those inline on the stack and only spill to
//! the heap past the inline capacity.

use smallstr::SmallString;
use smallvec::SmallVec;

/// Inline capacity for [`InlineString`]. Big enough for any single grapheme
/// cluster (max 4-byte scalars × a few joiners) and most cell runs.
pub const DEFAULT_STRING_STORAGE_SIZE: usize = 16;

/// Inline capacity for [`InlineVec`].
pub const DEFAULT_VEC_STORAGE_SIZE: usize = 8;

/// Stack-allocated string. Spills to the heap past
/// [`DEFAULT_STRING_STORAGE_SIZE`] bytes.
pub type InlineString = SmallString<[u8; DEFAULT_STRING_STORAGE_SIZE]>;

/// Stack-allocated vector. Spills to the heap past
/// [`DEFAULT_VEC_STORAGE_SIZE`] items.
pub type InlineVec<T> = SmallVec<[T; DEFAULT_VEC_STORAGE_SIZE]>;

/// SGR parameter list. `38;2;r;g;b` is the longest group we emit in one go.
pub type SgrParams = SmallVec<[u16; 8]>;
