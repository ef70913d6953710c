// Copyright (c) 2025 the rune_tui authors. Licensed under Apache License, Version 2.0.

//! Stable identity paths.
//!
//! A component instance is identified across renders by a slash-joined path
//! built from its type name, its optional explicit identity, and its
//! parent's path — `Root/List:sidebar/Item:3`. Paths are the keys for state,
//! effects, input handlers and focus; they are stable as long as the view
//! shape is, which is exactly what arena indices are not.
//!
//! Two children producing the same path in one frame are treated as a single
//! logical component (last writer wins); give siblings explicit identities
//! to distinguish them.

/// Path segment for one component: `TypeName` or `TypeName:identity`.
#[must_use]
pub fn identity_segment(type_name: &str, identity: Option<&str>) -> String {
    match identity {
        Some(id) => format!("{type_name}:{id}"),
        None => type_name.to_string(),
    }
}

/// Child path under `parent`.
#[must_use]
pub fn child_identity_path(
    parent: &str,
    type_name: &str,
    identity: Option<&str>,
) -> String {
    let segment = identity_segment(type_name, identity);
    if parent.is_empty() {
        segment
    } else {
        format!("{parent}/{segment}")
    }
}

/// Does `id` match any segment of `path`? A segment matches on its full text
/// or on its explicit-identity part (`List:sidebar` matches both
/// `"List:sidebar"` and `"sidebar"`).
#[must_use]
pub fn path_matches_id(path: &str, id: &str) -> bool {
    path.split('/').any(|segment| {
        segment == id
            || segment
                .split_once(':')
                .is_some_and(|(_, identity)| identity == id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_child_path_building() {
        let root = identity_segment("App", None);
        assert_eq!(root, "App");
        let list = child_identity_path(&root, "List", Some("sidebar"));
        assert_eq!(list, "App/List:sidebar");
        let item = child_identity_path(&list, "Item", Some("3"));
        assert_eq!(item, "App/List:sidebar/Item:3");
    }

    #[test]
    fn test_path_matches_id() {
        let path = "App/List:sidebar/Item:3";
        assert!(path_matches_id(path, "sidebar"));
        assert!(path_matches_id(path, "List:sidebar"));
        assert!(path_matches_id(path, "App"));
        assert!(path_matches_id(path, "3"));
        assert!(!path_matches_id(path, "Item:4"));
        assert!(!path_matches_id(path, "side"));
    }
}
