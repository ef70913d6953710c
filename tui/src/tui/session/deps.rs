// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Dependency tokens for effects and memos.
//!
//! A deps token is a stable textual encoding of a dependency list. Three
//! shapes matter:
//! - [`DepsToken::Always`] — no memoization, re-run on every commit;
//! - [`DepsToken::Once`] — mount-only / compute-once;
//! - [`DepsToken::Token`] — re-run when the encoded text changes.
//!
//! Primitive values encode as `type=value` with `\`, `|` and `=` escaped,
//! joined by `|`. [`IdentityDep`] encodes by object identity (pointer) only.
//! Anything else can fall back to [`DebugDep`], which encodes as
//! `type-name#debug-repr` — this is collision-prone (two values with the
//! same Debug output compare equal), so correctness-critical dependencies
//! should wrap in [`IdentityDep`] instead.

use std::sync::Arc;

/// An effect's / memo's dependency description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepsToken {
    /// Re-run every commit.
    Always,
    /// Run on mount only / compute once.
    Once,
    /// Re-run when the token text changes.
    Token(String),
}

impl DepsToken {
    /// Build a token from encoded parts. An empty list is mount-only.
    #[must_use]
    pub fn from_parts(parts: &[&dyn DepEncode]) -> DepsToken {
        if parts.is_empty() {
            return DepsToken::Once;
        }
        let encoded: Vec<String> = parts
            .iter()
            .map(|part| format!("{}={}", part.type_tag(), escape(&part.value_repr())))
            .collect();
        DepsToken::Token(encoded.join("|"))
    }

    /// Should an effect re-run given the previously stored token?
    #[must_use]
    pub fn should_rerun(&self, previous: &DepsToken) -> bool {
        match self {
            DepsToken::Always => true,
            DepsToken::Once => false,
            DepsToken::Token(token) => match previous {
                DepsToken::Token(previous_token) => token != previous_token,
                DepsToken::Always | DepsToken::Once => true,
            },
        }
    }
}

fn escape(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace('=', "\\=")
}

/// One encodable dependency value.
pub trait DepEncode {
    fn type_tag(&self) -> &'static str;
    fn value_repr(&self) -> String;
}

macro_rules! impl_dep_encode {
    ($($ty:ty => $tag:literal),* $(,)?) => {
        $(
            impl DepEncode for $ty {
                fn type_tag(&self) -> &'static str { $tag }
                fn value_repr(&self) -> String { self.to_string() }
            }
        )*
    };
}

impl_dep_encode! {
    bool => "bool",
    char => "char",
    i8 => "int", i16 => "int", i32 => "int", i64 => "int", isize => "int",
    u8 => "uint", u16 => "uint", u32 => "uint", u64 => "uint", usize => "uint",
    f32 => "float", f64 => "float",
}

impl DepEncode for &str {
    fn type_tag(&self) -> &'static str { "str" }
    fn value_repr(&self) -> String { (*self).to_string() }
}

impl DepEncode for String {
    fn type_tag(&self) -> &'static str { "str" }
    fn value_repr(&self) -> String { self.clone() }
}

/// Encodes by object identity: two tokens are equal iff they point at the
/// same allocation. The escape hatch for values without a stable encoding.
#[derive(Debug, Clone)]
pub struct IdentityDep<T: ?Sized>(pub Arc<T>);

impl<T: ?Sized> DepEncode for IdentityDep<T> {
    fn type_tag(&self) -> &'static str { "identity" }
    fn value_repr(&self) -> String {
        format!("{:p}", Arc::as_ptr(&self.0).cast::<u8>())
    }
}

/// Fallback encoding: `type-name#debug-repr`. Documented as collision-prone.
#[derive(Debug, Clone, Copy)]
pub struct DebugDep<'a, T: std::fmt::Debug>(pub &'a T);

impl<T: std::fmt::Debug> DepEncode for DebugDep<'_, T> {
    fn type_tag(&self) -> &'static str { std::any::type_name::<T>() }
    fn value_repr(&self) -> String { format!("#{:?}", self.0) }
}

/// Build a [`DepsToken`] from a dependency list: `deps![]` is mount-only,
/// `deps![count, name]` re-runs when any encoded value changes.
#[macro_export]
macro_rules! deps {
    () => { $crate::DepsToken::Once };
    ( $( $dep:expr ),+ $(,)? ) => {
        $crate::DepsToken::from_parts(&[ $( &$dep ),+ ])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_primitive_encoding() {
        let token = DepsToken::from_parts(&[&true, &7_u32, &"a|b"]);
        assert_eq!(
            token,
            DepsToken::Token("bool=true|uint=7|str=a\\|b".into())
        );
    }

    #[test]
    fn test_escaping_round_trips_distinctness() {
        // Without escaping these two would collide.
        let lhs = DepsToken::from_parts(&[&"a|b", &"c"]);
        let rhs = DepsToken::from_parts(&[&"a", &"b|c"]);
        assert_ne!(lhs, rhs);
    }

    #[test]
    fn test_should_rerun() {
        assert!(DepsToken::Always.should_rerun(&DepsToken::Always));
        assert!(!DepsToken::Once.should_rerun(&DepsToken::Once));
        let one = DepsToken::from_parts(&[&1_i32]);
        let two = DepsToken::from_parts(&[&2_i32]);
        assert!(two.should_rerun(&one));
        assert!(!one.should_rerun(&one.clone()));
    }

    #[test]
    fn test_identity_dep() {
        let value = Arc::new(vec![1, 2, 3]);
        let same = DepsToken::from_parts(&[&IdentityDep(value.clone())]);
        let again = DepsToken::from_parts(&[&IdentityDep(value.clone())]);
        let other = DepsToken::from_parts(&[&IdentityDep(Arc::new(vec![1, 2, 3]))]);
        assert_eq!(same, again);
        assert_ne!(same, other);
    }

    #[test]
    fn test_deps_macro() {
        assert_eq!(deps![], DepsToken::Once);
        let token = deps![1_u8, "x"];
        assert_eq!(token, DepsToken::Token("uint=1|str=x".into()));
    }
}
