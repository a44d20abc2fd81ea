//! Tether tree topology of a multi-kite system
use std::collections::BTreeMap;

use crate::error::ConstraintError;
use crate::variables::NodePair;

/// Node attached to the ground station; its tether is the main tether
pub const MAIN_NODE: NodePair = NodePair { node: 1, parent: 0 };

/// Node → parent tree rooted at the ground station (node 0)
///
/// Kite nodes are the leaves of the tree, listed in ascending order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Architecture {
    parent_map: BTreeMap<u32, u32>,
    kite_nodes: Vec<u32>,
}

impl Architecture {
    pub fn new(parent_map: BTreeMap<u32, u32>) -> Result<Self, ConstraintError> {
        if !parent_map.contains_key(&MAIN_NODE.node) {
            return Err(ConstraintError::InvalidArchitecture(
                "node 1 (main tether) is missing".to_string(),
            ));
        }
        for (&node, &parent) in &parent_map {
            if node == 0 {
                return Err(ConstraintError::InvalidArchitecture(
                    "node 0 is reserved for the ground station".to_string(),
                ));
            }
            if parent != 0 && !parent_map.contains_key(&parent) {
                return Err(ConstraintError::InvalidArchitecture(format!(
                    "parent {parent} of node {node} is not a node"
                )));
            }
            if parent >= node {
                return Err(ConstraintError::InvalidArchitecture(format!(
                    "node {node} must be numbered after its parent {parent}"
                )));
            }
        }

        let kite_nodes = parent_map
            .keys()
            .copied()
            .filter(|n| !parent_map.values().any(|p| p == n))
            .collect();

        Ok(Self {
            parent_map,
            kite_nodes,
        })
    }

    /// Build from `(node, parent)` pairs, e.g. `[(1, 0), (2, 1), (3, 1)]`
    pub fn from_pairs(pairs: &[(u32, u32)]) -> Result<Self, ConstraintError> {
        Self::new(pairs.iter().copied().collect())
    }

    pub fn parent(&self, node: u32) -> Result<u32, ConstraintError> {
        self.parent_map
            .get(&node)
            .copied()
            .ok_or(ConstraintError::UnknownNode(node))
    }

    /// Node pair of `node` and its parent, as used in variable suffixes
    pub fn node_pair(&self, node: u32) -> Result<NodePair, ConstraintError> {
        Ok(NodePair::new(node, self.parent(node)?))
    }

    pub fn kite_nodes(&self) -> &[u32] {
        &self.kite_nodes
    }

    pub fn parent_map(&self) -> &BTreeMap<u32, u32> {
        &self.parent_map
    }

    pub fn number_of_nodes(&self) -> usize {
        self.parent_map.len()
    }

    /// Children of `node`, ascending
    pub fn children(&self, node: u32) -> Vec<u32> {
        self.parent_map
            .iter()
            .filter(|&(_, &p)| p == node)
            .map(|(&n, _)| n)
            .collect()
    }

    /// Tether depth of `node`; the main node is layer 1
    pub fn layer(&self, node: u32) -> Result<u32, ConstraintError> {
        let mut layer = 0;
        let mut current = node;
        while current != 0 {
            current = self.parent(current)?;
            layer += 1;
        }
        Ok(layer)
    }

    /// Nodes at tether depth `layer`, ascending
    pub fn layer_nodes(&self, layer: u32) -> Vec<u32> {
        self.parent_map
            .keys()
            .copied()
            .filter(|&n| self.layer(n).is_ok_and(|l| l == layer))
            .collect()
    }

    /// Deepest layer of the tree
    pub fn number_of_layers(&self) -> u32 {
        self.parent_map
            .keys()
            .filter_map(|&n| self.layer(n).ok())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kite_nodes_are_the_leaves() {
        let arch = Architecture::from_pairs(&[(1, 0), (2, 1), (3, 1)]).unwrap();
        assert_eq!(arch.kite_nodes(), &[2, 3]);
        assert_eq!(arch.children(1), vec![2, 3]);
        assert_eq!(arch.node_pair(3).unwrap(), NodePair::new(3, 1));
    }

    #[test]
    fn layers_follow_tether_depth() {
        let arch = Architecture::from_pairs(&[(1, 0), (2, 1), (3, 1), (4, 2), (5, 2)]).unwrap();
        assert_eq!(arch.layer(1).unwrap(), 1);
        assert_eq!(arch.layer(3).unwrap(), 2);
        assert_eq!(arch.layer(5).unwrap(), 3);
        assert_eq!(arch.layer_nodes(2), vec![2, 3]);
        assert_eq!(arch.layer_nodes(3), vec![4, 5]);
        assert!(arch.layer_nodes(4).is_empty());
        assert_eq!(arch.number_of_layers(), 3);
        assert!(matches!(arch.layer(9), Err(ConstraintError::UnknownNode(9))));
    }

    #[test]
    fn single_kite_is_its_own_main_node() {
        let arch = Architecture::from_pairs(&[(1, 0)]).unwrap();
        assert_eq!(arch.kite_nodes(), &[1]);
    }

    #[test]
    fn rejects_dangling_parents() {
        assert!(Architecture::from_pairs(&[(1, 0), (3, 2)]).is_err());
        assert!(Architecture::from_pairs(&[(2, 0)]).is_err());
        assert!(matches!(
            Architecture::from_pairs(&[(1, 0)]).unwrap().parent(4),
            Err(ConstraintError::UnknownNode(4))
        ));
    }
}
