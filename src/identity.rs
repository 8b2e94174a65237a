// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Qualified identifiers for nodes in the architecture graph
//!
//! A qualified ID has the form `<kind>:<seg>[/<seg>...]` with exactly one
//! segment per hierarchy level of the kind:
//!
//! - `system:shop`
//! - `container:shop/api`
//! - `component:shop/api/auth`
//!
//! Segments escape `%` as `%25` and `/` as `%2F`, so short names containing
//! a slash can never be confused with a deeper path.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three C4 levels tracked by the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Level 1: a software system
    System,
    /// Level 2: a deployable unit inside a system
    Container,
    /// Level 3: a unit of functionality inside a container
    Component,
}

impl NodeKind {
    /// Hierarchy level (1 for systems, 3 for components)
    #[must_use]
    pub fn level(self) -> u8 {
        match self {
            Self::System => 1,
            Self::Container => 2,
            Self::Component => 3,
        }
    }

    /// Kind for a hierarchy level
    #[must_use]
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::System),
            2 => Some(Self::Container),
            3 => Some(Self::Component),
            _ => None,
        }
    }

    /// Prefix used in qualified IDs
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Container => "container",
            Self::Component => "component",
        }
    }

    /// Parse a kind prefix
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(Self::System),
            "container" => Some(Self::Container),
            "component" => Some(Self::Component),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The parts recovered from a qualified ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedParts {
    /// Node kind
    pub kind: NodeKind,
    /// System short ID
    pub system: String,
    /// Container short ID, empty for systems
    pub container: String,
    /// Component short ID, empty for systems and containers
    pub component: String,
}

/// Build the qualified ID for an entity.
///
/// Only the segments relevant to `kind` are used; `container` is ignored for
/// systems and `component` for systems and containers.
#[must_use]
pub fn qualified_id(kind: NodeKind, system: &str, container: &str, component: &str) -> String {
    let segments: &[&str] = match kind {
        NodeKind::System => &[system],
        NodeKind::Container => &[system, container],
        NodeKind::Component => &[system, container, component],
    };

    let mut id = String::with_capacity(16 + segments.iter().map(|s| s.len()).sum::<usize>());
    id.push_str(kind.as_str());
    id.push(':');
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            id.push('/');
        }
        escape_into(segment, &mut id);
    }
    id
}

/// Split a qualified ID back into its parts.
///
/// Returns `None` for unknown kinds, a segment count that does not match
/// the kind, or malformed escapes.
#[must_use]
pub fn parse_qualified_id(id: &str) -> Option<QualifiedParts> {
    let (prefix, rest) = id.split_once(':')?;
    let kind = NodeKind::parse(prefix)?;

    let segments = rest
        .split('/')
        .map(unescape)
        .collect::<Option<Vec<_>>>()?;

    if segments.len() != usize::from(kind.level()) {
        return None;
    }

    let mut segments = segments.into_iter();
    let system = segments.next().unwrap_or_default();
    let container = segments.next().unwrap_or_default();
    let component = segments.next().unwrap_or_default();

    Some(QualifiedParts {
        kind,
        system,
        container,
        component,
    })
}

/// Whether a string parses as a qualified ID
#[must_use]
pub fn is_qualified(id: &str) -> bool {
    parse_qualified_id(id).is_some()
}

fn escape_into(segment: &str, out: &mut String) {
    for c in segment.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            other => out.push(other),
        }
    }
}

fn unescape(segment: &str) -> Option<String> {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let code: String = chars.by_ref().take(2).collect();
        match code.as_str() {
            "25" => out.push('%'),
            "2F" => out.push('/'),
            _ => return None,
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_qualified_id_format() {
        assert_eq!(qualified_id(NodeKind::System, "shop", "", ""), "system:shop");
        assert_eq!(
            qualified_id(NodeKind::Container, "shop", "api", ""),
            "container:shop/api"
        );
        assert_eq!(
            qualified_id(NodeKind::Component, "shop", "api", "auth"),
            "component:shop/api/auth"
        );
    }

    #[test]
    fn test_higher_levels_ignore_trailing_segments() {
        assert_eq!(
            qualified_id(NodeKind::System, "shop", "api", "auth"),
            "system:shop"
        );
        assert_eq!(
            qualified_id(NodeKind::Container, "shop", "api", "auth"),
            "container:shop/api"
        );
    }

    #[test]
    fn test_same_short_name_different_parents() {
        let a = qualified_id(NodeKind::Component, "shop", "api", "auth");
        let b = qualified_id(NodeKind::Component, "billing", "api", "auth");
        let c = qualified_id(NodeKind::Component, "shop", "worker", "auth");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_slash_in_segment_is_escaped() {
        // "a/b" + "c" must not collide with "a" + "b/c"
        let left = qualified_id(NodeKind::Container, "a/b", "c", "");
        let right = qualified_id(NodeKind::Container, "a", "b/c", "");
        assert_ne!(left, right);
        assert_eq!(left, "container:a%2Fb/c");

        let parts = parse_qualified_id(&left).unwrap();
        assert_eq!(parts.system, "a/b");
        assert_eq!(parts.container, "c");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_qualified_id("").is_none());
        assert!(parse_qualified_id("auth").is_none());
        assert!(parse_qualified_id("widget:shop").is_none());
        assert!(parse_qualified_id("system:shop/api").is_none());
        assert!(parse_qualified_id("component:shop/api").is_none());
        assert!(parse_qualified_id("system:sh%4Fp").is_none());
        assert!(parse_qualified_id("system:shop%2").is_none());
    }

    #[test]
    fn test_parse_component() {
        let parts = parse_qualified_id("component:shop/api/auth").unwrap();
        assert_eq!(parts.kind, NodeKind::Component);
        assert_eq!(parts.system, "shop");
        assert_eq!(parts.container, "api");
        assert_eq!(parts.component, "auth");
    }

    #[test]
    fn test_kind_levels() {
        for kind in [NodeKind::System, NodeKind::Container, NodeKind::Component] {
            assert_eq!(NodeKind::from_level(kind.level()), Some(kind));
            assert_eq!(NodeKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NodeKind::from_level(0), None);
        assert_eq!(NodeKind::from_level(4), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_component_ids_round_trip(
            system in "[a-z%/:-]{0,8}",
            container in "[a-z%/:-]{0,8}",
            component in "[a-z%/:-]{0,8}",
        ) {
            let id = qualified_id(NodeKind::Component, &system, &container, &component);
            let parts = parse_qualified_id(&id).unwrap();
            prop_assert_eq!(parts.kind, NodeKind::Component);
            prop_assert_eq!(parts.system, system);
            prop_assert_eq!(parts.container, container);
            prop_assert_eq!(parts.component, component);
        }

        #[test]
        fn prop_distinct_paths_never_collide(
            a in ("[a-z/%]{1,4}", "[a-z/%]{1,4}", "[a-z/%]{1,4}"),
            b in ("[a-z/%]{1,4}", "[a-z/%]{1,4}", "[a-z/%]{1,4}"),
        ) {
            let id_a = qualified_id(NodeKind::Component, &a.0, &a.1, &a.2);
            let id_b = qualified_id(NodeKind::Component, &b.0, &b.1, &b.2);
            prop_assert_eq!(a == b, id_a == id_b);
        }

        #[test]
        fn prop_parse_never_panics(input in ".{0,32}") {
            let _ = parse_qualified_id(&input);
        }
    }
}
