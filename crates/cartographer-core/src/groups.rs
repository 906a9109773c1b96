//! Folder hierarchy for exported endpoints
//!
//! Groups live in an arena and point at their parent by index, so inherited
//! attributes are looked up by walking upwards without shared ownership.

use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

use crate::auth::{AuthStrategy, AuthStrategyFactory};
use crate::config::ExportConfig;
use crate::error::{ExportError, ExportResult};
use crate::provider::UnitMetadata;
use crate::scripts::ScriptCollection;
use crate::types::{Endpoint, Header, StructureMode};

/// Index of a group within its [`GroupTree`]
pub type GroupId = usize;

/// A folder in the exported collection
#[derive(Debug, Clone)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub parent: Option<GroupId>,
    /// Child groups in insertion order
    pub children: Vec<GroupId>,
    /// Indices into [`GroupTree::endpoints`], in insertion order
    pub endpoints: Vec<usize>,
    pub authentication: Option<AuthStrategy>,
    pub headers: Vec<Header>,
    pub scripts: ScriptCollection,
}

impl Group {
    fn new(name: String, description: String, parent: Option<GroupId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            parent,
            children: Vec::new(),
            endpoints: Vec::new(),
            authentication: None,
            headers: Vec::new(),
            scripts: ScriptCollection::new(),
        }
    }
}

/// Top-level entry of the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeItem {
    Group(GroupId),
    Endpoint(usize),
}

/// Groups and the endpoints they own
#[derive(Debug, Clone, Default)]
pub struct GroupTree {
    groups: Vec<Group>,
    roots: Vec<TreeItem>,
    endpoints: Vec<Endpoint>,
}

impl GroupTree {
    pub fn roots(&self) -> &[TreeItem] {
        &self.roots
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(id)
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn endpoint(&self, index: usize) -> Option<&Endpoint> {
        self.endpoints.get(index)
    }

    /// Groups from `id` up to its root
    pub fn ancestry(&self, id: GroupId) -> impl Iterator<Item = &Group> {
        let mut current = self.groups.get(id);
        std::iter::from_fn(move || {
            let group = current?;
            current = group.parent.and_then(|p| self.groups.get(p));
            Some(group)
        })
    }

    /// Own authentication, else the nearest ancestor's
    pub fn effective_authentication(&self, id: GroupId) -> Option<&AuthStrategy> {
        self.ancestry(id).find_map(|g| g.authentication.as_ref())
    }

    /// Own headers, else the nearest ancestor's
    pub fn effective_headers(&self, id: GroupId) -> &[Header] {
        self.ancestry(id)
            .find(|g| !g.headers.is_empty())
            .map(|g| g.headers.as_slice())
            .unwrap_or(&[])
    }

    /// Own scripts, else the nearest ancestor's
    pub fn effective_scripts(&self, id: GroupId) -> Option<&ScriptCollection> {
        self.ancestry(id)
            .map(|g| &g.scripts)
            .find(|s| !s.is_empty())
    }

    /// Number of ancestors
    pub fn depth(&self, id: GroupId) -> usize {
        self.ancestry(id).count().saturating_sub(1)
    }
}

/// Partitions endpoints into a [`GroupTree`]
pub struct GroupBuilder<'a> {
    config: &'a ExportConfig,
    factory: &'a AuthStrategyFactory,
    units: IndexMap<String, UnitMetadata>,
    tree: GroupTree,
    /// Lowercased `/seg1/seg2` path to group
    cache: HashMap<String, GroupId>,
    /// Groups whose description came from unit metadata
    described: HashSet<GroupId>,
}

impl<'a> GroupBuilder<'a> {
    pub fn new(config: &'a ExportConfig, factory: &'a AuthStrategyFactory) -> Self {
        Self {
            config,
            factory,
            units: IndexMap::new(),
            tree: GroupTree::default(),
            cache: HashMap::new(),
            described: HashSet::new(),
        }
    }

    /// Unit metadata used to describe explicitly assigned groups
    pub fn with_units(mut self, units: IndexMap<String, UnitMetadata>) -> Self {
        self.units = units;
        self
    }

    pub fn build(mut self, endpoints: Vec<Endpoint>) -> ExportResult<GroupTree> {
        if !self.config.structured {
            return Ok(self.build_unstructured(endpoints));
        }

        let mode = self.config.structure_mode()?;
        for endpoint in endpoints {
            let index = self.tree.endpoints.len();

            let target = match endpoint.group.as_deref() {
                Some(name) => Some(self.explicit_group(name, endpoint.unit.as_deref())?),
                None => self.segment_group(&endpoint, mode),
            };

            match target {
                Some(id) => {
                    if let Some(group) = self.tree.groups.get_mut(id) {
                        group.endpoints.push(index);
                    }
                }
                None => self.tree.roots.push(TreeItem::Endpoint(index)),
            }
            self.tree.endpoints.push(endpoint);
        }

        debug!(
            "Built {} groups for {} endpoints",
            self.tree.groups.len(),
            self.tree.endpoints.len()
        );
        Ok(self.tree)
    }

    fn build_unstructured(mut self, endpoints: Vec<Endpoint>) -> GroupTree {
        let mut group = Group::new(self.config.name.clone(), self.config.description.clone(), None);
        group.endpoints = (0..endpoints.len()).collect();
        self.tree.groups.push(group);
        self.tree.roots.push(TreeItem::Group(0));
        self.tree.endpoints = endpoints;
        self.tree
    }

    /// Root group named by an explicit assignment
    fn explicit_group(&mut self, name: &str, unit: Option<&str>) -> ExportResult<GroupId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ExportError::EmptyField("group"));
        }

        let declaring = unit.and_then(|u| self.units.get(u)).filter(|u| {
            u.group
                .as_deref()
                .is_some_and(|g| g.trim().eq_ignore_ascii_case(name))
        });
        let description = declaring.and_then(|u| u.description.clone());
        let authentication = match declaring.and_then(|u| u.auth.as_deref()) {
            Some(auth_type) => Some(self.factory.create(
                auth_type,
                self.config.authentication.token.clone(),
                &self.config.authentication.options,
            )?),
            None => None,
        };

        let key = format!("/{}", name.to_lowercase());
        let id = match self.cache.get(&key) {
            Some(&id) => id,
            None => {
                let group = Group::new(title_case(name), format!("Endpoints for {}", name), None);
                self.insert_group(key, group)
            }
        };

        // Node may predate its declaring unit; first unit description wins
        let described = self.described.contains(&id);
        if let Some(group) = self.tree.groups.get_mut(id) {
            if let Some(description) = description.filter(|_| !described) {
                group.description = description;
                self.described.insert(id);
            }
            if group.authentication.is_none() {
                group.authentication = authentication;
            }
        }
        Ok(id)
    }

    /// Terminal group for structural segments, `None` for root placement
    fn segment_group(&mut self, endpoint: &Endpoint, mode: StructureMode) -> Option<GroupId> {
        let (segments, path_rules) = match (mode, endpoint.route_name.as_deref()) {
            (StructureMode::Route, Some(route_name)) => (name_segments(route_name), false),
            _ => (path_segments(&endpoint.uri), true),
        };

        if segments.is_empty() || (path_rules && segments.len() == 1) {
            return None;
        }

        let mut parent = None;
        let mut key = String::new();
        for segment in &segments[..segments.len() - 1] {
            key.push('/');
            key.push_str(&segment.to_lowercase());

            let id = match self.cache.get(&key) {
                Some(&id) => id,
                None => {
                    let group = Group::new(
                        title_case(segment),
                        format!("Endpoints for {}", segment),
                        parent,
                    );
                    self.insert_group(key.clone(), group)
                }
            };
            parent = Some(id);
        }
        parent
    }

    fn insert_group(&mut self, key: String, group: Group) -> GroupId {
        let id = self.tree.groups.len();
        match group.parent.and_then(|p| self.tree.groups.get_mut(p)) {
            Some(parent) => parent.children.push(id),
            None => self.tree.roots.push(TreeItem::Group(id)),
        }
        debug!("Created group \"{}\" for {}", group.name, key);
        self.tree.groups.push(group);
        self.cache.insert(key, id);
        id
    }
}

/// URI segments without placeholders
fn path_segments(uri: &str) -> Vec<String> {
    uri.split('/')
        .filter(|s| !s.is_empty() && !s.starts_with('{'))
        .map(str::to_string)
        .collect()
}

/// Route name split on runs of `.` and `:`
fn name_segments(name: &str) -> Vec<String> {
    name.split(|c| c == '.' || c == ':')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `user-profiles` -> `User-Profiles`
pub fn title_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut at_word_start = true;
    for c in segment.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
