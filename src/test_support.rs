// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Entity tree builders shared by unit tests

use crate::entity::{Component, Container, EntityTree, System};
use std::path::PathBuf;

pub fn system(id: &str, containers: Vec<Container>) -> System {
    System {
        id: id.into(),
        name: id.into(),
        description: format!("{id} system"),
        containers,
    }
}

pub fn container(id: &str, components: Vec<Component>) -> Container {
    Container {
        id: id.into(),
        name: id.into(),
        description: String::new(),
        technology: Some("Rust".into()),
        components,
    }
}

pub fn component(id: &str, relationships: &[(&str, &str)]) -> Component {
    Component {
        id: id.into(),
        name: id.into(),
        description: String::new(),
        technology: None,
        relationships: relationships
            .iter()
            .map(|(t, d)| ((*t).to_string(), (*d).to_string()))
            .collect(),
        path: None,
    }
}

pub fn component_at(id: &str, relationships: &[(&str, &str)], path: PathBuf) -> Component {
    Component {
        path: Some(path),
        ..component(id, relationships)
    }
}

/// One system, one container, components wired as given
pub fn flat_tree(components: Vec<Component>) -> EntityTree {
    EntityTree::new(vec![system("sys", vec![container("app", components)])])
}

/// Qualified ID of a component inside [`flat_tree`]
pub fn flat_id(component: &str) -> String {
    format!("component:sys/app/{component}")
}
