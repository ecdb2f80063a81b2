//! Skeleton flattening: nested `name -> children` descriptions become a
//! parent-indexed bone list.
//!
//! The emitted order is a pre-order walk in declaration order, so a parent is
//! always listed before every one of its descendants. Animation frames are
//! matched to this list by position.

use std::fmt;

use hashbrown::HashMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::HierarchyError;
use crate::MAX_NAME_LENGTH;

/// Conventional name of the root bone.
pub const DEFAULT_ROOT: &str = "root";

/// One bone of a resolved skeleton. `parent_index == -1` marks the root.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoneSpec {
    pub name: String,
    pub parent_index: i32,
}

impl BoneSpec {
    pub fn new(name: impl Into<String>, parent_index: i32) -> Self {
        Self {
            name: name.into(),
            parent_index,
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent_index < 0
    }
}

/// Nested skeleton description.
///
/// Children are kept as an ordered list of `(name, subtree)` pairs rather than
/// a map: declaration order is preserved and repeated names survive parsing so
/// [`resolve`] can reject them instead of one silently replacing the other.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkeletonTree {
    children: Vec<(String, SkeletonTree)>,
}

impl SkeletonTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append of a child subtree.
    pub fn with_child(mut self, name: impl Into<String>, subtree: SkeletonTree) -> Self {
        self.children.push((name.into(), subtree));
        self
    }

    /// Builder-style append of a childless bone.
    pub fn with_leaf(self, name: impl Into<String>) -> Self {
        self.with_child(name, SkeletonTree::new())
    }

    pub fn push(&mut self, name: impl Into<String>, subtree: SkeletonTree) {
        self.children.push((name.into(), subtree));
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &SkeletonTree)> {
        self.children.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of named nodes in this tree, at every depth.
    pub fn node_count(&self) -> usize {
        self.children
            .iter()
            .map(|(_, sub)| 1 + sub.node_count())
            .sum()
    }

    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl Serialize for SkeletonTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.children.len()))?;
        for (name, sub) in &self.children {
            map.serialize_entry(name, sub)?;
        }
        map.end()
    }
}

struct TreeVisitor;

impl<'de> Visitor<'de> for TreeVisitor {
    type Value = SkeletonTree;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of bone names to child maps")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut children = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, sub)) = access.next_entry::<String, Option<SkeletonTree>>()? {
            children.push((name, sub.unwrap_or_default()));
        }
        Ok(SkeletonTree { children })
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(SkeletonTree::default())
    }
}

impl<'de> Deserialize<'de> for SkeletonTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TreeVisitor)
    }
}

/// Resolve `tree` using the conventional `"root"` bone.
pub fn resolve(tree: &SkeletonTree) -> Result<Vec<BoneSpec>, HierarchyError> {
    resolve_with_root(tree, DEFAULT_ROOT)
}

/// Flatten `tree` into a bone list whose first entry is `root`.
///
/// The top level must hold exactly the root key; any other top-level name would
/// be a second, parentless root.
pub fn resolve_with_root(tree: &SkeletonTree, root: &str) -> Result<Vec<BoneSpec>, HierarchyError> {
    let mut roots = tree.children().filter(|(name, _)| *name == root);
    let (_, root_subtree) = roots
        .next()
        .ok_or_else(|| HierarchyError::MissingRoot(root.to_string()))?;
    if roots.next().is_some() {
        return Err(HierarchyError::DuplicateName(root.to_string()));
    }
    if let Some((stray, _)) = tree.children().find(|(name, _)| *name != root) {
        return Err(HierarchyError::StrayTopLevel {
            name: stray.to_string(),
            root: root.to_string(),
        });
    }

    // (name, parent name) in pre-order
    let mut links: Vec<(&str, Option<&str>)> = Vec::with_capacity(tree.node_count());
    walk(root, None, root_subtree, &mut links);

    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(links.len());
    let mut bones = Vec::with_capacity(links.len());
    for (pos, (name, parent)) in links.into_iter().enumerate() {
        check_name(name)?;
        if positions.insert(name, pos).is_some() {
            return Err(HierarchyError::DuplicateName(name.to_string()));
        }
        let parent_index = match parent {
            None => -1,
            // parents were inserted on an earlier iteration of this loop
            Some(p) => positions[p] as i32,
        };
        bones.push(BoneSpec::new(name, parent_index));
    }
    Ok(bones)
}

fn walk<'t>(
    name: &'t str,
    parent: Option<&'t str>,
    subtree: &'t SkeletonTree,
    out: &mut Vec<(&'t str, Option<&'t str>)>,
) {
    out.push((name, parent));
    for (child, sub) in subtree.children() {
        walk(child, Some(name), sub, out);
    }
}

fn check_name(name: &str) -> Result<(), HierarchyError> {
    if name.len() >= MAX_NAME_LENGTH {
        return Err(HierarchyError::NameTooLong {
            name: name.to_string(),
            len: name.len(),
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(())
}

/// Lookup helpers over a resolved bone list.
pub trait BoneTable {
    fn index_of(&self, name: &str) -> Option<usize>;
    fn parent_of(&self, index: usize) -> Option<usize>;
    fn names(&self) -> Vec<&str>;
}

impl BoneTable for [BoneSpec] {
    fn index_of(&self, name: &str) -> Option<usize> {
        self.iter().position(|b| b.name == name)
    }

    fn parent_of(&self, index: usize) -> Option<usize> {
        self.get(index)
            .and_then(|b| usize::try_from(b.parent_index).ok())
    }

    fn names(&self) -> Vec<&str> {
        self.iter().map(|b| b.name.as_str()).collect()
    }
}
