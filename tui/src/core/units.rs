// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Terminal geometry newtypes.
//!
//! A terminal cell grid mixes up three kinds of numbers that are all "just
//! integers": display widths, column indices, and row indices. Mixing them up
//! is the classic off-by-one factory, so each one gets its own type, along
//! with lowercase constructor fns ([`width`], [`height`], [`col`], [`row`])
//! that keep call sites terse.
//!
//! Indices are 0-based. The ANSI wire format is 1-based; the renderer is the
//! only place that conversion happens.

use std::fmt::{Debug, Display, Formatter, Result};

/// Display width measured in terminal columns.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColWidth(pub u16);

/// Height measured in terminal rows.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowHeight(pub u16);

/// 0-based column index.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColIndex(pub u16);

/// 0-based row index.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowIndex(pub u16);

/// Constructor fn for [`ColWidth`].
#[must_use]
pub fn width(arg: impl Into<u16>) -> ColWidth { ColWidth(arg.into()) }

/// Constructor fn for [`RowHeight`].
#[must_use]
pub fn height(arg: impl Into<u16>) -> RowHeight { RowHeight(arg.into()) }

/// Constructor fn for [`ColIndex`].
#[must_use]
pub fn col(arg: impl Into<u16>) -> ColIndex { ColIndex(arg.into()) }

/// Constructor fn for [`RowIndex`].
#[must_use]
pub fn row(arg: impl Into<u16>) -> RowIndex { RowIndex(arg.into()) }

macro_rules! impl_unit {
    ($name:ident) => {
        impl $name {
            #[must_use]
            pub fn as_usize(self) -> usize { usize::from(self.0) }

            #[must_use]
            pub fn as_u16(self) -> u16 { self.0 }
        }

        impl From<u16> for $name {
            fn from(it: u16) -> Self { Self(it) }
        }

        impl From<$name> for usize {
            fn from(it: $name) -> Self { usize::from(it.0) }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> Result {
                write!(f, "{}", self.0)
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

impl_unit!(ColWidth);
impl_unit!(RowHeight);
impl_unit!(ColIndex);
impl_unit!(RowIndex);

/// Terminal viewport dimensions.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub col_count: ColWidth,
    pub row_count: RowHeight,
}

/// Constructor fn for [`Size`].
#[must_use]
pub fn size(arg_width: impl Into<u16>, arg_height: impl Into<u16>) -> Size {
    Size {
        col_count: width(arg_width),
        row_count: height(arg_height),
    }
}

impl Debug for Size {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "Size[{}x{}]", self.col_count, self.row_count)
    }
}

impl Display for Size {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}x{}", self.col_count, self.row_count)
    }
}
