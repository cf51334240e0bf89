use indexmap::IndexMap;

use crate::error::EditError;
use crate::model::{
    Connection, DEFAULT_BG_COLOR, DEFAULT_OUTLINE_COLOR, DEFAULT_TEXT_COLOR, Layout, Model, Node,
    Shape, Subgroup, SubgroupStyle, System, SystemStyle,
};
use crate::sanitize::sanitize_color;

pub type EditResult<T> = std::result::Result<T, EditError>;

/// Result of a rename that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renamed {
    Renamed,
    /// Old and new names are equal after trimming.
    Unchanged,
}

/// Raw field values of a node card, flushed into the model by [`Model::save_node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeForm {
    pub label: String,
    pub desc: String,
    pub shape: String,
    pub system: String,
    pub subgroup: String,
    pub text_color: String,
    pub bg_color: String,
    pub outline_color: String,
}

impl Default for NodeForm {
    fn default() -> Self {
        Self {
            label: String::new(),
            desc: String::new(),
            shape: Shape::Rect.as_str().to_string(),
            system: String::new(),
            subgroup: String::new(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            bg_color: DEFAULT_BG_COLOR.to_string(),
            outline_color: DEFAULT_OUTLINE_COLOR.to_string(),
        }
    }
}

impl NodeForm {
    pub fn from_node(node: &Node) -> Self {
        Self {
            label: node.label.clone(),
            desc: node.desc.clone(),
            shape: node.shape.as_str().to_string(),
            system: node.system.clone(),
            subgroup: node.subgroup.clone(),
            text_color: node.text_color.clone(),
            bg_color: node.bg_color.clone(),
            outline_color: node.outline_color.clone(),
        }
    }
}

fn rekey<V>(map: IndexMap<String, V>, old: &str, new: &str) -> IndexMap<String, V> {
    map.into_iter()
        .map(|(k, v)| if k == old { (new.to_string(), v) } else { (k, v) })
        .collect()
}

impl Model {
    pub fn add_system(&mut self, name: &str, style: &SystemStyle) -> EditResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditError::EmptyName);
        }
        if self.systems.contains_key(name) {
            return Err(EditError::SystemExists {
                name: name.to_string(),
            });
        }

        self.systems
            .insert(name.to_string(), System::from_style(style));
        if !self.systems_order.iter().any(|s| s == name) {
            self.systems_order.push(name.to_string());
        }
        self.ensure_placement(name);
        Ok(())
    }

    /// Renames a system and cascades the new name to order, placement and node references.
    ///
    /// All checks run before the first write, so a failed rename leaves the model untouched.
    pub fn rename_system(&mut self, old: &str, new: &str) -> EditResult<Renamed> {
        let (old, new) = (old.trim(), new.trim());
        if old.is_empty() || new.is_empty() {
            return Err(EditError::NamesRequired);
        }
        if !self.systems.contains_key(old) {
            return Err(EditError::SystemNotFound {
                name: old.to_string(),
            });
        }
        if old == new {
            return Ok(Renamed::Unchanged);
        }
        if self.systems.contains_key(new) {
            return Err(EditError::SystemExists {
                name: new.to_string(),
            });
        }

        self.systems = rekey(std::mem::take(&mut self.systems), old, new);
        self.placement = rekey(std::mem::take(&mut self.placement), old, new);
        for name in &mut self.systems_order {
            if name == old {
                *name = new.to_string();
            }
        }
        for node in &mut self.nodes {
            if node.system == old {
                node.system = new.to_string();
            }
        }
        Ok(Renamed::Renamed)
    }

    /// Deletes a system with its subgroups; member nodes move to the root.
    pub fn delete_system(&mut self, name: &str) -> EditResult<System> {
        let name = name.trim();
        let Some(removed) = self.systems.shift_remove(name) else {
            return Err(EditError::SystemNotFound {
                name: name.to_string(),
            });
        };
        self.systems_order.retain(|s| s != name);
        self.placement.shift_remove(name);
        for node in &mut self.nodes {
            if node.system == name {
                node.system.clear();
                node.subgroup.clear();
            }
        }
        Ok(removed)
    }

    pub fn update_system(&mut self, name: &str, style: &SystemStyle) -> EditResult<()> {
        let system = self
            .systems
            .get_mut(name)
            .ok_or_else(|| EditError::SystemNotFound {
                name: name.to_string(),
            })?;
        system.apply_style(style);
        Ok(())
    }

    pub fn add_subgroup(
        &mut self,
        system: &str,
        name: &str,
        style: &SubgroupStyle,
    ) -> EditResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditError::EmptyName);
        }
        let sys = self
            .systems
            .get_mut(system)
            .ok_or_else(|| EditError::SystemNotFound {
                name: system.to_string(),
            })?;
        if sys.subgroups.contains_key(name) {
            return Err(EditError::SubgroupExists {
                system: system.to_string(),
                name: name.to_string(),
            });
        }
        sys.subgroups
            .insert(name.to_string(), Subgroup::from_style(style));
        Ok(())
    }

    /// Restyles a subgroup and optionally renames it in place, cascading to member nodes.
    pub fn update_subgroup(
        &mut self,
        system: &str,
        name: &str,
        new_name: &str,
        style: &SubgroupStyle,
    ) -> EditResult<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(EditError::EmptyName);
        }
        let sys = self
            .systems
            .get_mut(system)
            .ok_or_else(|| EditError::SystemNotFound {
                name: system.to_string(),
            })?;
        if !sys.subgroups.contains_key(name) {
            return Err(EditError::SubgroupNotFound {
                system: system.to_string(),
                name: name.to_string(),
            });
        }
        if new_name != name && sys.subgroups.contains_key(new_name) {
            return Err(EditError::SubgroupExists {
                system: system.to_string(),
                name: new_name.to_string(),
            });
        }

        if new_name != name {
            sys.subgroups = rekey(std::mem::take(&mut sys.subgroups), name, new_name);
            for node in &mut self.nodes {
                if node.system == system && node.subgroup == name {
                    node.subgroup = new_name.to_string();
                }
            }
        }
        if let Some(sg) = sys.subgroups.get_mut(new_name) {
            *sg = Subgroup::from_style(style);
        }
        Ok(())
    }

    /// Deletes a subgroup; nodes that pointed at it lose both their system and subgroup.
    pub fn delete_subgroup(&mut self, system: &str, name: &str) -> EditResult<Subgroup> {
        let removed = self
            .systems
            .get_mut(system)
            .and_then(|s| s.subgroups.shift_remove(name))
            .ok_or_else(|| EditError::SubgroupNotFound {
                system: system.to_string(),
                name: name.to_string(),
            })?;
        for node in &mut self.nodes {
            if node.system == system && node.subgroup == name {
                node.system.clear();
                node.subgroup.clear();
            }
        }
        Ok(removed)
    }

    /// Appends a fresh unassigned node with the next free `N<counter>` id.
    ///
    /// Ids already present are skipped; the counter only moves forward. `u64::MAX` is never
    /// handed out, so reaching it means the id space is used up.
    pub fn add_node(&mut self) -> EditResult<&Node> {
        let id = loop {
            if self.node_counter == u64::MAX {
                return Err(EditError::NodeIdsExhausted);
            }
            let candidate = format!("N{}", self.node_counter);
            self.node_counter += 1;
            if self.node(&candidate).is_none() {
                break candidate;
            }
        };
        self.nodes.push(Node::new(id));
        let idx = self.nodes.len() - 1;
        Ok(&self.nodes[idx])
    }

    /// Removes a node. Connections elsewhere that name it as their source are kept.
    pub fn delete_node(&mut self, id: &str) -> EditResult<Node> {
        let idx = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| EditError::NodeNotFound { id: id.to_string() })?;
        Ok(self.nodes.remove(idx))
    }

    /// Flushes a node card's fields into the model.
    pub fn save_node(&mut self, id: &str, form: &NodeForm) -> EditResult<()> {
        let system = form.system.trim();
        let subgroup = form.subgroup.trim();
        if !system.is_empty() && !self.systems.contains_key(system) {
            return Err(EditError::SystemNotFound {
                name: system.to_string(),
            });
        }
        if !subgroup.is_empty() {
            if system.is_empty() {
                return Err(EditError::SystemRequired {
                    subgroup: subgroup.to_string(),
                });
            }
            if !self.has_subgroup(system, subgroup) {
                return Err(EditError::SubgroupNotFound {
                    system: system.to_string(),
                    name: subgroup.to_string(),
                });
            }
        }

        let node = self
            .node_mut(id)
            .ok_or_else(|| EditError::NodeNotFound { id: id.to_string() })?;
        node.label = form.label.trim().to_string();
        node.desc = form.desc.clone();
        node.shape = Shape::from_name(&form.shape);
        node.system = system.to_string();
        node.subgroup = subgroup.to_string();
        node.text_color = sanitize_color(&form.text_color);
        node.bg_color = sanitize_color(&form.bg_color);
        node.outline_color = sanitize_color(&form.outline_color);
        Ok(())
    }

    pub fn set_node_label(&mut self, id: &str, label: &str) -> EditResult<()> {
        let node = self
            .node_mut(id)
            .ok_or_else(|| EditError::NodeNotFound { id: id.to_string() })?;
        node.label = label.trim().to_string();
        Ok(())
    }

    /// Appends a blank connection to `target`, returning its index.
    pub fn add_connection(&mut self, target: &str) -> EditResult<usize> {
        let node = self.node_mut(target).ok_or_else(|| EditError::NodeNotFound {
            id: target.to_string(),
        })?;
        node.connections.push(Connection::default());
        Ok(node.connections.len() - 1)
    }

    pub fn update_connection(
        &mut self,
        target: &str,
        index: usize,
        connection: Connection,
    ) -> EditResult<()> {
        let slot = self.connection_mut(target, index)?;
        *slot = connection.normalized();
        Ok(())
    }

    pub fn remove_connection(&mut self, target: &str, index: usize) -> EditResult<Connection> {
        self.connection_mut(target, index)?;
        let node = self.node_mut(target).ok_or_else(|| EditError::NodeNotFound {
            id: target.to_string(),
        })?;
        Ok(node.connections.remove(index))
    }

    fn connection_mut(&mut self, target: &str, index: usize) -> EditResult<&mut Connection> {
        let node = self.node_mut(target).ok_or_else(|| EditError::NodeNotFound {
            id: target.to_string(),
        })?;
        node.connections
            .get_mut(index)
            .ok_or_else(|| EditError::ConnectionNotFound {
                target: target.to_string(),
                index,
            })
    }

    pub fn set_arrangement(&mut self, layout: Layout) {
        self.arrangement = layout;
    }

    pub fn set_legend(&mut self, legend: impl Into<String>) {
        self.legend = legend.into();
    }
}
