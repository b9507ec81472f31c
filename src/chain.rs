// src/chain.rs - Joint count and ordering from a kinematic chain description
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::config::{ChainConfig, JointKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("Tip link '{0}' is not the child of any joint")]
    UnknownLink(String),
    #[error("Link '{0}' has no parent joint before reaching the root link")]
    Disconnected(String),
    #[error("Chain loops back through link '{0}'")]
    Cycle(String),
    #[error("Joint '{0}' is declared more than once")]
    DuplicateJoint(String),
    #[error("Link '{0}' is the child of more than one joint")]
    DuplicateChild(String),
    #[error("No movable joints between '{root}' and '{tip}'")]
    NoMovableJoints { root: String, tip: String },
}

/// A joint along the resolved chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainJoint {
    pub name: String,
    pub kind: JointKind,
}

/// Movable joints from root to tip, in control order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KinematicChain {
    root_link: String,
    tip_link: String,
    joints: Vec<ChainJoint>,
}

impl KinematicChain {
    /// Walk from the tip link back to the root link and collect the movable
    /// joints in root-to-tip order.
    pub fn resolve(description: &ChainConfig) -> Result<Self, ChainError> {
        let mut names = HashSet::new();
        let mut parent_of = HashMap::new();
        for joint in &description.joints {
            if !names.insert(joint.name.as_str()) {
                return Err(ChainError::DuplicateJoint(joint.name.clone()));
            }
            if parent_of.insert(joint.child.as_str(), joint).is_some() {
                return Err(ChainError::DuplicateChild(joint.child.clone()));
            }
        }

        let mut joints = Vec::new();
        let mut visited = HashSet::new();
        let mut link = description.tip_link.as_str();
        while link != description.root_link {
            if !visited.insert(link) {
                return Err(ChainError::Cycle(link.to_string()));
            }
            let Some(joint) = parent_of.get(link) else {
                return Err(if link == description.tip_link {
                    ChainError::UnknownLink(link.to_string())
                } else {
                    ChainError::Disconnected(link.to_string())
                });
            };
            if joint.kind.is_movable() {
                joints.push(ChainJoint {
                    name: joint.name.clone(),
                    kind: joint.kind,
                });
            }
            link = joint.parent.as_str();
        }
        joints.reverse();

        if joints.is_empty() {
            return Err(ChainError::NoMovableJoints {
                root: description.root_link.clone(),
                tip: description.tip_link.clone(),
            });
        }

        tracing::info!(
            "Resolved chain {} -> {} with {} movable joints",
            description.root_link,
            description.tip_link,
            joints.len()
        );
        Ok(Self {
            root_link: description.root_link.clone(),
            tip_link: description.tip_link.clone(),
            joints,
        })
    }

    pub fn n_dof(&self) -> usize {
        self.joints.len()
    }

    pub fn joints(&self) -> &[ChainJoint] {
        &self.joints
    }

    pub fn joint_names(&self) -> Vec<String> {
        self.joints.iter().map(|j| j.name.clone()).collect()
    }

    pub fn root_link(&self) -> &str {
        &self.root_link
    }

    pub fn tip_link(&self) -> &str {
        &self.tip_link
    }
}
