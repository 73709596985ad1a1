//! Grouping keys for signature fitting.

use anyhow::{anyhow, Result};
use std::fmt;

/// Position of a phylogenetic node relative to the tumor's trunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BranchRole {
    /// Root node (node 0): mutations shared by every clone.
    Ancestral,
    /// Any node below the root.
    Descendant,
}

impl BranchRole {
    pub fn from_node(node: u32) -> Self {
        if node == 0 {
            BranchRole::Ancestral
        } else {
            BranchRole::Descendant
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BranchRole::Ancestral => "Ancestral",
            BranchRole::Descendant => "Descendant",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ancestral" => Ok(BranchRole::Ancestral),
            "descendant" => Ok(BranchRole::Descendant),
            other => Err(anyhow!(
                "Unknown branch role: {}. Use: Ancestral or Descendant",
                other
            )),
        }
    }

    pub fn is_ancestral(&self) -> bool {
        matches!(self, BranchRole::Ancestral)
    }
}

impl fmt::Display for BranchRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of one fitted document (a sample or a clone node).
///
/// Ordering follows the label, so tables come out sorted by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub label: String,
    pub role: Option<BranchRole>,
}

impl GroupKey {
    pub fn new(label: impl Into<String>, role: Option<BranchRole>) -> Self {
        Self {
            label: label.into(),
            role,
        }
    }

    /// `{patient}_{sample}`; samples have no branch role.
    pub fn sample(patient_id: &str, sample_id: &str) -> Self {
        Self::new(format!("{}_{}", patient_id, sample_id), None)
    }

    /// `{patient}_Node{node}`, with the role taken from the node number.
    pub fn node(patient_id: &str, node: u32) -> Self {
        Self::new(
            format!("{}_Node{}", patient_id, node),
            Some(BranchRole::from_node(node)),
        )
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}
