//! Hardware hierarchy stored as an arena keyed by [`NodeId`].
//!
//! Nodes arrive as a flat list with parent ids. Children keep their input
//! order, so pre-order traversal reproduces the indented-list order used
//! for display.

use rk_common::{Error, NodeId, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::prediction::{PartInputs, PredictionResult};

/// How a node's active hazard rate is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureRateType {
    /// Predicted for parts, summed from children for assemblies.
    #[default]
    Assessed,
    SpecifiedHazardRate,
    SpecifiedMtbf,
}

/// Values written by the rollup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeOutputs {
    pub failure_rate_active: f64,
    pub failure_rate_dormant: f64,
    pub failure_rate_software: f64,
    /// Active + dormant + software.
    pub failure_rate_predicted: f64,
    /// Rate over the mission profile.
    pub failure_rate_mission: f64,
    pub mtbf: f64,
    pub reliability: f64,
    pub availability: f64,
    pub total_cost: f64,
    pub part_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictionResult>,
}

/// One item of the hardware hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareNode {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub name: String,
    /// Prediction inputs for a part leaf.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part: Option<PartInputs>,

    pub quantity: u32,
    /// Percent of mission time the item operates.
    pub duty_cycle: f64,
    pub environment_active: u32,
    pub environment_dormant: u32,
    pub temperature_active: f64,
    pub temperature_dormant: f64,
    /// Mission time, hours.
    pub mission_time: f64,
    /// Additive adjustment, failures per 10⁶ hours.
    pub add_adjustment: f64,
    pub mult_adjustment: f64,

    pub failure_rate_type: FailureRateType,
    pub specified_hazard_rate: f64,
    pub specified_mtbf: f64,
    /// Dormant and software rates owned by this node, per hour.
    pub failure_rate_dormant: f64,
    pub failure_rate_software: f64,
    /// Mean time to repair, hours.
    pub mttr: f64,
    /// Unit cost.
    pub cost: f64,

    pub outputs: NodeOutputs,
}

impl Default for HardwareNode {
    fn default() -> Self {
        Self {
            id: NodeId(0),
            parent_id: None,
            name: String::new(),
            part: None,
            quantity: 1,
            duty_cycle: 100.0,
            environment_active: 1,
            environment_dormant: 1,
            temperature_active: 30.0,
            temperature_dormant: 25.0,
            mission_time: 100.0,
            add_adjustment: 0.0,
            mult_adjustment: 1.0,
            failure_rate_type: FailureRateType::Assessed,
            specified_hazard_rate: 0.0,
            specified_mtbf: 0.0,
            failure_rate_dormant: 0.0,
            failure_rate_software: 0.0,
            mttr: 0.0,
            cost: 0.0,
            outputs: NodeOutputs::default(),
        }
    }
}

impl HardwareNode {
    pub fn new(id: u32, parent_id: Option<u32>, name: impl Into<String>) -> Self {
        Self {
            id: NodeId(id),
            parent_id: parent_id.map(NodeId),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_part(mut self, part: PartInputs) -> Self {
        self.part = Some(part);
        self
    }
}

/// Arena of hardware nodes with a single root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<HardwareNode>", into = "Vec<HardwareNode>")]
pub struct HardwareTree {
    root: NodeId,
    nodes: BTreeMap<NodeId, HardwareNode>,
    /// Parent → ordered children.
    children: BTreeMap<NodeId, Vec<NodeId>>,
}

impl HardwareTree {
    /// Build the arena from a flat node list.
    ///
    /// Exactly one node may lack a parent. Every parent id must name a node
    /// in the list, and every node must be reachable from the root.
    pub fn from_nodes(list: Vec<HardwareNode>) -> Result<Self> {
        let mut nodes = BTreeMap::new();
        let mut order = Vec::with_capacity(list.len());
        for node in list {
            order.push((node.id, node.parent_id));
            if nodes.insert(node.id, node).is_some() {
                let (id, _) = order[order.len() - 1];
                return Err(Error::invalid("hardware.id", format!("duplicate node id {}", id)));
            }
        }

        let mut root = None;
        let mut children: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
        for (id, parent) in order {
            match parent {
                None => {
                    if let Some(first) = root.replace(id) {
                        return Err(Error::invalid(
                            "hardware.parent_id",
                            format!("nodes {} and {} both lack a parent", first, id),
                        ));
                    }
                }
                Some(p) if !nodes.contains_key(&p) => {
                    return Err(Error::UnknownNode { id: p.0 });
                }
                Some(p) => children.entry(p).or_default().push(id),
            }
        }
        let root = root.ok_or_else(|| Error::invalid("hardware", "tree has no root node"))?;

        let tree = Self {
            root,
            nodes,
            children,
        };
        let reached = tree.pre_order().len();
        if reached != tree.nodes.len() {
            return Err(Error::invalid(
                "hardware.parent_id",
                format!("{} node(s) are not reachable from the root", tree.nodes.len() - reached),
            ));
        }
        Ok(tree)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Result<&HardwareNode> {
        self.nodes.get(&id).ok_or(Error::UnknownNode { id: id.0 })
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut HardwareNode> {
        self.nodes.get_mut(&id).ok_or(Error::UnknownNode { id: id.0 })
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(&id).map_or(&[], |c| c.as_slice())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent_id)
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.children(id).is_empty()
    }

    /// Root first, each node before its children.
    pub fn pre_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut seen = HashSet::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            out.push(id);
            for child in self.children(id).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Every node after all of its children; the root comes last.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut seen = HashSet::new();
        let mut stack = vec![(self.root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                out.push(id);
                continue;
            }
            if !seen.insert(id) {
                continue;
            }
            stack.push((id, true));
            for child in self.children(id).iter().rev() {
                stack.push((*child, false));
            }
        }
        out
    }

    /// Nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &HardwareNode> {
        self.pre_order().into_iter().filter_map(move |id| self.nodes.get(&id))
    }
}

impl TryFrom<Vec<HardwareNode>> for HardwareTree {
    type Error = Error;

    fn try_from(list: Vec<HardwareNode>) -> Result<Self> {
        Self::from_nodes(list)
    }
}

impl From<HardwareTree> for Vec<HardwareNode> {
    fn from(mut tree: HardwareTree) -> Self {
        tree.pre_order()
            .into_iter()
            .filter_map(|id| tree.nodes.remove(&id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HardwareTree {
        HardwareTree::from_nodes(vec![
            HardwareNode::new(1, None, "system"),
            HardwareNode::new(2, Some(1), "sub-a"),
            HardwareNode::new(3, Some(1), "sub-b"),
            HardwareNode::new(4, Some(2), "part-a1"),
            HardwareNode::new(5, Some(2), "part-a2"),
            HardwareNode::new(6, Some(3), "part-b1"),
        ])
        .unwrap()
    }

    fn ids(v: Vec<NodeId>) -> Vec<u32> {
        v.into_iter().map(|n| n.0).collect()
    }

    #[test]
    fn traversal_orders() {
        let tree = sample();
        assert_eq!(ids(tree.pre_order()), vec![1, 2, 4, 5, 3, 6]);
        assert_eq!(ids(tree.post_order()), vec![4, 5, 2, 6, 3, 1]);
    }

    #[test]
    fn children_keep_input_order() {
        let tree = sample();
        assert_eq!(ids(tree.children(NodeId(1)).to_vec()), vec![2, 3]);
        assert!(tree.is_leaf(NodeId(6)));
        assert_eq!(tree.parent(NodeId(6)), Some(NodeId(3)));
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let err = HardwareTree::from_nodes(vec![
            HardwareNode::new(1, None, "system"),
            HardwareNode::new(2, Some(9), "orphan"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::UnknownNode { id: 9 }));
    }

    #[test]
    fn two_roots_are_rejected() {
        assert!(HardwareTree::from_nodes(vec![
            HardwareNode::new(1, None, "a"),
            HardwareNode::new(2, None, "b"),
        ])
        .is_err());
    }

    #[test]
    fn cycle_detached_from_root_is_rejected() {
        let err = HardwareTree::from_nodes(vec![
            HardwareNode::new(1, None, "system"),
            HardwareNode::new(2, Some(3), "x"),
            HardwareNode::new(3, Some(2), "y"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    #[test]
    fn json_round_trip_preserves_pre_order() {
        let tree = sample();
        let json = serde_json::to_string(&tree).unwrap();
        let back: HardwareTree = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
        let names: Vec<&str> = back.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names[..3], ["system", "sub-a", "part-a1"]);
    }
}
