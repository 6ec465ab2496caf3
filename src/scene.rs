//! Scene graph: grouping hierarchy, name and material bindings.
//!
//! The scene tracks logical identities only — never versions — so bindings
//! survive every replace. Each tracked item belongs to exactly one group
//! (root by default), the group tree is acyclic, and children keep
//! insertion order.

use crate::error::{GeomError, Result};
use crate::types::{GroupId, ItemId, MaterialId};
use ahash::AHashMap;
use indexmap::IndexMap;
use log::debug;
use std::fmt;

/// A reference to a scene node: either an item or a nested group.
///
/// Doubles as the tagged entry type returned by [`Scene::list`] and as the
/// key for name bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneRef {
    Item(ItemId),
    Group(GroupId),
}

impl fmt::Display for SceneRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneRef::Item(id) => write!(f, "{id}"),
            SceneRef::Group(id) => write!(f, "{id}"),
        }
    }
}

impl From<ItemId> for SceneRef {
    fn from(id: ItemId) -> Self {
        SceneRef::Item(id)
    }
}

impl From<GroupId> for SceneRef {
    fn from(id: GroupId) -> Self {
        SceneRef::Group(id)
    }
}

#[derive(Debug, Clone, Default)]
struct GroupNode {
    parent: Option<GroupId>,
    children: Vec<SceneRef>,
}

/// The grouping hierarchy with name and material bindings.
#[derive(Debug)]
pub struct Scene {
    /// Groups in creation order, root first
    groups: IndexMap<GroupId, GroupNode>,
    item_parent: AHashMap<ItemId, GroupId>,
    names: AHashMap<SceneRef, String>,
    materials: AHashMap<ItemId, MaterialId>,
    next_group: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a scene containing only the empty root group
    pub fn new() -> Self {
        let mut groups = IndexMap::new();
        groups.insert(GroupId::ROOT, GroupNode::default());
        Scene {
            groups,
            item_parent: AHashMap::new(),
            names: AHashMap::new(),
            materials: AHashMap::new(),
            next_group: 1,
        }
    }

    /// The root group
    pub fn root(&self) -> GroupId {
        GroupId::ROOT
    }

    fn node(&self, group: GroupId) -> Result<&GroupNode> {
        self.groups
            .get(&group)
            .ok_or_else(|| GeomError::not_found(group.to_string()))
    }

    fn node_mut(&mut self, group: GroupId) -> Result<&mut GroupNode> {
        self.groups
            .get_mut(&group)
            .ok_or_else(|| GeomError::not_found(group.to_string()))
    }

    fn exists(&self, node: SceneRef) -> bool {
        match node {
            SceneRef::Item(id) => self.item_parent.contains_key(&id),
            SceneRef::Group(id) => self.groups.contains_key(&id),
        }
    }

    fn require(&self, node: SceneRef) -> Result<()> {
        if self.exists(node) {
            Ok(())
        } else {
            Err(GeomError::not_found(node.to_string()))
        }
    }

    // ----------------------------------------------------------------
    // Item tracking
    // ----------------------------------------------------------------

    /// Start tracking a newly created item; it lands in the root group
    pub fn add_item(&mut self, id: ItemId) -> Result<()> {
        if self.item_parent.contains_key(&id) {
            return Err(GeomError::Internal(format!("{id} tracked twice")));
        }
        self.item_parent.insert(id, GroupId::ROOT);
        self.groups
            .get_mut(&GroupId::ROOT)
            .expect("root always exists")
            .children
            .push(SceneRef::Item(id));
        Ok(())
    }

    /// Release all scene state for a removed item
    pub fn prune_item(&mut self, id: ItemId) -> bool {
        let Some(parent) = self.item_parent.remove(&id) else {
            return false;
        };
        if let Some(node) = self.groups.get_mut(&parent) {
            node.children.retain(|c| *c != SceneRef::Item(id));
        }
        self.names.remove(&SceneRef::Item(id));
        self.materials.remove(&id);
        debug!("pruned {id} from scene");
        true
    }

    /// Whether an item is tracked by the scene
    pub fn contains_item(&self, id: ItemId) -> bool {
        self.item_parent.contains_key(&id)
    }

    // ----------------------------------------------------------------
    // Groups
    // ----------------------------------------------------------------

    /// Create an empty group under the root
    pub fn create_group(&mut self) -> GroupId {
        let id = GroupId::new(self.next_group);
        self.next_group += 1;
        self.groups.insert(
            id,
            GroupNode {
                parent: Some(GroupId::ROOT),
                children: Vec::new(),
            },
        );
        self.groups
            .get_mut(&GroupId::ROOT)
            .expect("root always exists")
            .children
            .push(SceneRef::Group(id));
        id
    }

    /// Recreate a group under a known id (document load path).
    ///
    /// Parent and children are wired up afterwards by
    /// [`restore_children`](Self::restore_children).
    pub(crate) fn restore_group(&mut self, id: GroupId) -> Result<()> {
        if self.groups.contains_key(&id) {
            return Err(GeomError::Internal(format!("{id} restored twice")));
        }
        self.next_group = self.next_group.max(id.value() + 1);
        self.groups.insert(id, GroupNode::default());
        Ok(())
    }

    /// Overwrite every group's child list at once (document load path).
    ///
    /// Reproduces captured ordering exactly; parents are recomputed from
    /// the lists.
    pub(crate) fn restore_children(
        &mut self,
        lists: &[(GroupId, Vec<SceneRef>)],
    ) -> Result<()> {
        for (group, children) in lists {
            self.node(*group)?;
            for child in children {
                self.require(*child)?;
            }
        }
        for node in self.groups.values_mut() {
            node.children.clear();
        }
        for (group, children) in lists {
            for child in children {
                match child {
                    SceneRef::Item(id) => {
                        self.item_parent.insert(*id, *group);
                    }
                    SceneRef::Group(id) => {
                        self.node_mut(*id)?.parent = Some(*group);
                    }
                }
            }
            self.node_mut(*group)?.children = children.clone();
        }
        Ok(())
    }

    /// Delete an empty group.
    ///
    /// Fails with `InvalidPrecondition` if the group still has children;
    /// cascading is a separate, explicit operation.
    pub fn delete_group(&mut self, group: GroupId) -> Result<()> {
        let node = self.node(group)?;
        if group.is_root() {
            return Err(GeomError::precondition("cannot delete the root group"));
        }
        if !node.children.is_empty() {
            return Err(GeomError::precondition(format!(
                "{group} is not empty; move its children out or delete with cascade"
            )));
        }
        let parent = node.parent.expect("non-root group has a parent");
        self.groups
            .get_mut(&parent)
            .expect("parent exists")
            .children
            .retain(|c| *c != SceneRef::Group(group));
        self.groups.shift_remove(&group);
        self.names.remove(&SceneRef::Group(group));
        Ok(())
    }

    /// Delete a group, reassigning its children to the group's parent.
    ///
    /// Children are appended to the parent's child list in their current
    /// order.
    pub fn delete_group_cascade(&mut self, group: GroupId) -> Result<()> {
        let node = self.node(group)?;
        if group.is_root() {
            return Err(GeomError::precondition("cannot delete the root group"));
        }
        let parent = node.parent.expect("non-root group has a parent");
        let children = node.children.clone();
        for child in &children {
            match child {
                SceneRef::Item(id) => {
                    self.item_parent.insert(*id, parent);
                }
                SceneRef::Group(id) => {
                    self.node_mut(*id)?.parent = Some(parent);
                }
            }
        }
        self.node_mut(group)?.children.clear();
        self.node_mut(parent)?.children.extend(children);
        self.delete_group(group)
    }

    /// Move an item or group into another group, appended last
    pub fn move_to_group(&mut self, node: SceneRef, target: GroupId) -> Result<()> {
        self.node(target)?;
        self.require(node)?;

        if let SceneRef::Group(group) = node {
            if group.is_root() {
                return Err(GeomError::precondition("cannot move the root group"));
            }
            // Reject cycles: target must not be the group itself or any
            // of its descendants.
            let mut cursor = Some(target);
            while let Some(g) = cursor {
                if g == group {
                    return Err(GeomError::precondition(format!(
                        "moving {group} under {target} would create a cycle"
                    )));
                }
                cursor = self.node(g)?.parent;
            }
        }

        let old_parent = match node {
            SceneRef::Item(id) => self.item_parent[&id],
            SceneRef::Group(id) => self.node(id)?.parent.expect("non-root group"),
        };
        self.node_mut(old_parent)?.children.retain(|c| *c != node);
        self.node_mut(target)?.children.push(node);
        match node {
            SceneRef::Item(id) => {
                self.item_parent.insert(id, target);
            }
            SceneRef::Group(id) => {
                self.node_mut(id)?.parent = Some(target);
            }
        }
        Ok(())
    }

    /// Ordered children of a group
    pub fn list(&self, group: GroupId) -> Result<&[SceneRef]> {
        Ok(&self.node(group)?.children)
    }

    /// Groups with their children, in creation order (root first)
    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &[SceneRef])> {
        self.groups
            .iter()
            .map(|(id, node)| (*id, node.children.as_slice()))
    }

    /// Number of groups, including the root
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    // ----------------------------------------------------------------
    // Name & material bindings
    // ----------------------------------------------------------------

    /// Bind a name to an item or group
    pub fn set_name(&mut self, node: impl Into<SceneRef>, name: impl Into<String>) -> Result<()> {
        let node = node.into();
        self.require(node)?;
        self.names.insert(node, name.into());
        Ok(())
    }

    /// Name bound to an item or group.
    ///
    /// Fails with `NotFound` when the node is not present or was never
    /// named.
    pub fn get_name(&self, node: impl Into<SceneRef>) -> Result<&str> {
        let node = node.into();
        self.require(node)?;
        self.names
            .get(&node)
            .map(String::as_str)
            .ok_or_else(|| GeomError::not_found(format!("name of {node}")))
    }

    /// Remove a name binding
    pub fn clear_name(&mut self, node: impl Into<SceneRef>) -> Result<()> {
        let node = node.into();
        self.require(node)?;
        self.names.remove(&node);
        Ok(())
    }

    /// Bind a material to an item
    pub fn set_material(&mut self, item: ItemId, material: MaterialId) -> Result<()> {
        self.require(SceneRef::Item(item))?;
        self.materials.insert(item, material);
        Ok(())
    }

    /// Material bound to an item.
    ///
    /// Fails with `NotFound` when the item is not present; a present item
    /// with no binding reports `None` ("use the default material").
    pub fn get_material(&self, item: ItemId) -> Result<Option<MaterialId>> {
        self.require(SceneRef::Item(item))?;
        Ok(self.materials.get(&item).copied())
    }

    /// Remove a material binding
    pub fn clear_material(&mut self, item: ItemId) -> Result<()> {
        self.require(SceneRef::Item(item))?;
        self.materials.remove(&item);
        Ok(())
    }

    /// Whether the scene is untouched (empty root, no bindings)
    pub fn is_pristine(&self) -> bool {
        self.groups.len() == 1
            && self.groups[&GroupId::ROOT].children.is_empty()
            && self.item_parent.is_empty()
            && self.names.is_empty()
            && self.materials.is_empty()
    }
}
