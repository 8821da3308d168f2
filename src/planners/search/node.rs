use std::rc::Rc;

use crate::state::{JointAction, Plan, WorldState};

/// A world snapshot plus the provenance the search needs to read a plan back.
pub struct SearchNode {
    pub state: WorldState,
    pub parent: Option<Rc<SearchNode>>,
    pub joint_action: Option<JointAction>,
    pub g: u32,
}

impl SearchNode {
    pub fn root(state: WorldState) -> Rc<Self> {
        Rc::new(Self {
            state,
            parent: None,
            joint_action: None,
            g: 0,
        })
    }

    pub fn child(
        parent: &Rc<SearchNode>,
        joint_action: JointAction,
        state: WorldState,
    ) -> Rc<Self> {
        Rc::new(Self {
            state,
            parent: Some(Rc::clone(parent)),
            joint_action: Some(joint_action),
            g: parent.g + 1,
        })
    }

    /// Joint actions from the root to this node.
    pub fn extract_plan(&self) -> Plan {
        let mut plan = Vec::with_capacity(self.g as usize);
        let mut joint = self.joint_action.as_ref();
        let mut parent = self.parent.as_ref();
        while let Some(action) = joint {
            plan.push(action.clone());
            joint = parent.and_then(|p| p.joint_action.as_ref());
            parent = parent.and_then(|p| p.parent.as_ref());
        }
        plan.reverse();
        plan
    }
}

impl Drop for SearchNode {
    // Unlink the parent chain iteratively; deep chains would otherwise
    // recurse once per ancestor.
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(node) = parent {
            match Rc::try_unwrap(node) {
                Ok(mut inner) => parent = inner.parent.take(),
                Err(_) => break,
            }
        }
    }
}
