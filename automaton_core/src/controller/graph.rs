//! Graph queries over the registry: reachability, persistent ids and
//! validation.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;
use tracing::warn;

use super::Controller;
use crate::node::NodeId;
use crate::transition::TransitionTag;

/// A structural problem found by [`Controller::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphIssue {
    /// A rule points at a node that was never registered.
    DanglingTarget {
        from: NodeId,
        rule: usize,
        target: NodeId,
    },
    /// Two rules on one node carry the same tag; only the first is ever
    /// selected by tag.
    DuplicateTag { node: NodeId, tag: TransitionTag },
    /// Several nodes share a path; their saves match by registration order.
    AmbiguousPersistentId { node: NodeId, persistent_id: String },
}

impl fmt::Display for GraphIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphIssue::DanglingTarget { from, rule, target } => {
                write!(f, "rule {rule} of {from} targets unregistered node {target}")
            }
            GraphIssue::DuplicateTag { node, tag } => {
                write!(f, "{node} has more than one rule tagged {tag}")
            }
            GraphIssue::AmbiguousPersistentId {
                node,
                persistent_id,
            } => write!(f, "{node} shares its path and is saved as '{persistent_id}'"),
        }
    }
}

impl Controller {
    /// Every node reachable from the root of `system` over rules and child
    /// edges, root included.
    pub fn reachable_from(&self, system: &str) -> BTreeSet<NodeId> {
        let mut seen = BTreeSet::new();
        let Some(root) = self.system_root(system) else {
            return seen;
        };

        let mut queue = VecDeque::from([root]);
        seen.insert(root);
        while let Some(id) = queue.pop_front() {
            let core = self.nodes[id.0].core();
            let next = core
                .rules()
                .iter()
                .map(|rule| rule.target)
                .chain(core.children().iter().copied());
            for target in next {
                if self.contains(target) && seen.insert(target) {
                    queue.push_back(target);
                }
            }
        }
        seen
    }

    pub fn is_reachable(&self, system: &str, node: NodeId) -> bool {
        self.reachable_from(system).contains(&node)
    }

    /// Name path from the top of the child hierarchy down to `id`.
    fn name_path(&self, id: NodeId) -> String {
        let mut names = vec![self.nodes[id.0].name()];
        let mut parent = self.nodes[id.0].core().parent();
        while let Some(p) = parent {
            names.push(self.nodes[p.0].name());
            parent = self.nodes[p.0].core().parent();
        }
        names.reverse();
        names.join("/")
    }

    /// Stable identifiers used to match save records, indexed by node.
    ///
    /// A node's id is its name path along child edges. Nodes sharing a path
    /// get `#2`, `#3`, ... appended in registration order.
    pub fn persistent_ids(&self) -> Vec<String> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        (0..self.nodes.len())
            .map(|i| {
                let path = self.name_path(NodeId(i));
                let n = counts.entry(path.clone()).or_insert(0);
                *n += 1;
                if *n == 1 {
                    path
                } else {
                    format!("{path}#{n}")
                }
            })
            .collect()
    }

    pub fn persistent_id(&self, id: NodeId) -> Option<String> {
        if !self.contains(id) {
            return None;
        }
        self.persistent_ids().into_iter().nth(id.0)
    }

    pub fn find_by_persistent_id(&self, persistent_id: &str) -> Option<NodeId> {
        self.persistent_ids()
            .iter()
            .position(|pid| pid == persistent_id)
            .map(NodeId)
    }

    /// Check the registry for problems the controller tolerates at runtime
    /// but that usually mean a wiring mistake.
    pub fn validate(&self) -> Vec<GraphIssue> {
        let mut issues = Vec::new();

        for (i, node) in self.nodes.iter().enumerate() {
            let from = NodeId(i);
            let mut tags: Vec<&TransitionTag> = Vec::new();
            for (rule_index, rule) in node.core().rules().iter().enumerate() {
                if !self.contains(rule.target) {
                    issues.push(GraphIssue::DanglingTarget {
                        from,
                        rule: rule_index,
                        target: rule.target,
                    });
                }
                if let Some(tag) = &rule.tag {
                    if tags.contains(&tag) {
                        issues.push(GraphIssue::DuplicateTag {
                            node: from,
                            tag: tag.clone(),
                        });
                    } else {
                        tags.push(tag);
                    }
                }
            }
        }

        for (i, persistent_id) in self.persistent_ids().into_iter().enumerate() {
            if persistent_id.contains('#') {
                issues.push(GraphIssue::AmbiguousPersistentId {
                    node: NodeId(i),
                    persistent_id,
                });
            }
        }

        for issue in &issues {
            warn!(%issue, "graph issue");
        }
        issues
    }
}
