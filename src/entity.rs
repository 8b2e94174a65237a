// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Entity tree: the System → Container → Component input records
//!
//! The tree is read-only input to the engine. Graph nodes point back into it
//! through [`EntityRef`], which can be resolved with [`EntityTree::resolve`].

use crate::identity::{qualified_id, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Capabilities shared by every entity record
pub trait Entity {
    /// Short (non-hierarchical) identifier
    fn id(&self) -> &str;
    /// Display name
    fn name(&self) -> &str;
    /// C4 level of this record
    fn kind(&self) -> NodeKind;
}

/// The root of an architecture description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityTree {
    /// All systems
    #[serde(default)]
    pub systems: Vec<System>,
}

/// A software system (C4 level 1)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct System {
    /// Short identifier, unique among systems
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Containers inside this system
    #[serde(default)]
    pub containers: Vec<Container>,
}

/// A deployable unit inside a system (C4 level 2)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Container {
    /// Short identifier, unique within its system
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Technology (e.g. "Rust / axum")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
    /// Components inside this container
    #[serde(default)]
    pub components: Vec<Component>,
}

/// A unit of functionality inside a container (C4 level 3)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Component {
    /// Short identifier, unique within its container
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Technology
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
    /// Declared relationships: target identifier → description.
    /// Targets may be short IDs or qualified IDs.
    #[serde(default)]
    pub relationships: BTreeMap<String, String>,
    /// Directory holding this component's files (and its diagram)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Entity for System {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn kind(&self) -> NodeKind {
        NodeKind::System
    }
}

impl Entity for Container {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn kind(&self) -> NodeKind {
        NodeKind::Container
    }
}

impl Entity for Component {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn kind(&self) -> NodeKind {
        NodeKind::Component
    }
}

/// Locator for the entity a graph node was derived from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntityRef {
    /// A system
    System {
        /// System short ID
        system: String,
    },
    /// A container
    Container {
        /// System short ID
        system: String,
        /// Container short ID
        container: String,
    },
    /// A component
    Component {
        /// System short ID
        system: String,
        /// Container short ID
        container: String,
        /// Component short ID
        component: String,
    },
}

impl EntityRef {
    /// Kind of the referenced entity
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::System { .. } => NodeKind::System,
            Self::Container { .. } => NodeKind::Container,
            Self::Component { .. } => NodeKind::Component,
        }
    }

    /// Short ID of the referenced entity
    #[must_use]
    pub fn short_id(&self) -> &str {
        match self {
            Self::System { system } => system,
            Self::Container { container, .. } => container,
            Self::Component { component, .. } => component,
        }
    }

    /// Qualified ID of the referenced entity
    #[must_use]
    pub fn qualified_id(&self) -> String {
        match self {
            Self::System { system } => qualified_id(NodeKind::System, system, "", ""),
            Self::Container { system, container } => {
                qualified_id(NodeKind::Container, system, container, "")
            }
            Self::Component {
                system,
                container,
                component,
            } => qualified_id(NodeKind::Component, system, container, component),
        }
    }
}

/// Borrowed view of a resolved entity
#[derive(Debug, Clone, Copy)]
pub enum EntityView<'a> {
    /// A system record
    System(&'a System),
    /// A container record
    Container(&'a Container),
    /// A component record
    Component(&'a Component),
}

impl<'a> EntityView<'a> {
    /// The record as a capability object
    #[must_use]
    pub fn as_entity(&self) -> &'a dyn Entity {
        match *self {
            Self::System(s) => s,
            Self::Container(c) => c,
            Self::Component(c) => c,
        }
    }
}

/// A component together with its position in the hierarchy
#[derive(Debug, Clone, Copy)]
pub struct ComponentEntry<'a> {
    /// Owning system
    pub system: &'a System,
    /// Owning container
    pub container: &'a Container,
    /// The component
    pub component: &'a Component,
}

impl ComponentEntry<'_> {
    /// Qualified ID of the component
    #[must_use]
    pub fn qualified_id(&self) -> String {
        qualified_id(
            NodeKind::Component,
            &self.system.id,
            &self.container.id,
            &self.component.id,
        )
    }
}

impl EntityTree {
    /// Create a tree from a list of systems
    #[must_use]
    pub fn new(systems: Vec<System>) -> Self {
        Self { systems }
    }

    /// Whether the tree holds no systems
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Iterate every component with its parents, in declaration order
    pub fn components(&self) -> impl Iterator<Item = ComponentEntry<'_>> {
        self.systems.iter().flat_map(|system| {
            system.containers.iter().flat_map(move |container| {
                container.components.iter().map(move |component| ComponentEntry {
                    system,
                    container,
                    component,
                })
            })
        })
    }

    /// Total number of entities (systems + containers + components)
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.systems
            .iter()
            .map(|s| 1 + s.containers.iter().map(|c| 1 + c.components.len()).sum::<usize>())
            .sum()
    }

    /// Look up the record an [`EntityRef`] points at
    #[must_use]
    pub fn resolve(&self, entity: &EntityRef) -> Option<EntityView<'_>> {
        match entity {
            EntityRef::System { system } => self.system(system).map(EntityView::System),
            EntityRef::Container { system, container } => self
                .system(system)?
                .containers
                .iter()
                .find(|c| &c.id == container)
                .map(EntityView::Container),
            EntityRef::Component {
                system,
                container,
                component,
            } => self
                .system(system)?
                .containers
                .iter()
                .find(|c| &c.id == container)?
                .components
                .iter()
                .find(|c| &c.id == component)
                .map(EntityView::Component),
        }
    }

    fn system(&self, id: &str) -> Option<&System> {
        self.systems.iter().find(|s| s.id == id)
    }
}
