//! The controller - node registry, per-system cursors and save/restore.

mod graph;

pub use graph::GraphIssue;

use game_context::GameContext;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::action::Action;
use crate::config::PersistenceConfig;
use crate::error::{EngineError, Result};
use crate::input::Input;
use crate::node::{Node, NodeId, Resolution};
use crate::persistence::{
    NodeRecord, RecordReader, RecordWriter, SaveFile, SavedCursor, SystemEntry,
};
use crate::transition::{TransitionRule, TransitionTag};

/// What happened to an input submitted through [`Controller::process_input`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The cursor moved; `from.on_exit` and `to.on_enter` ran.
    Transitioned { from: NodeId, to: NodeId },
    /// The node handled the input in place; no hooks ran.
    Stayed,
    /// No rule accepted the input; nothing changed.
    NoMatch,
    /// No system is registered under that name; nothing changed.
    UnknownSystem,
}

impl Outcome {
    pub fn moved(&self) -> bool {
        matches!(self, Outcome::Transitioned { .. })
    }

    /// Whether some node accepted the input.
    pub fn handled(&self) -> bool {
        matches!(self, Outcome::Transitioned { .. } | Outcome::Stayed)
    }
}

/// Owns every node for the life of the process and drives one cursor per
/// named system.
pub struct Controller {
    nodes: Vec<Box<dyn Node>>,
    system_roots: BTreeMap<String, NodeId>,
    current: BTreeMap<String, NodeId>,
    context: GameContext,
    limits: PersistenceConfig,
    last_save_id: Option<Uuid>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self::with_limits(PersistenceConfig::default())
    }

    /// Create a controller whose saves use the given bounds.
    pub fn with_limits(limits: PersistenceConfig) -> Self {
        Self {
            nodes: Vec::new(),
            system_roots: BTreeMap::new(),
            current: BTreeMap::new(),
            context: GameContext::default(),
            limits,
            last_save_id: None,
        }
    }

    pub fn with_context(mut self, context: GameContext) -> Self {
        self.context = context;
        self
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Register a node permanently and return its handle.
    pub fn create_node<T: Node>(&mut self, node: T) -> NodeId {
        let id = NodeId(self.nodes.len());
        debug!(node = %node.name(), kind = node.kind(), %id, "registered node");
        self.nodes.push(Box::new(node));
        id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&dyn Node> {
        self.nodes.get(id.0).map(|node| node.as_ref())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut (dyn Node + 'static)> {
        self.nodes.get_mut(id.0).map(|node| node.as_mut())
    }

    /// Typed access to a registered node.
    pub fn node_as<T: Node>(&self, id: NodeId) -> Option<&T> {
        let node: &dyn Node = self.nodes.get(id.0)?.as_ref();
        node.as_any().downcast_ref::<T>()
    }

    pub fn node_as_mut<T: Node>(&mut self, id: NodeId) -> Option<&mut T> {
        let node: &mut dyn Node = self.nodes.get_mut(id.0)?.as_mut();
        node.as_any_mut().downcast_mut::<T>()
    }

    /// First registered node with this name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name() == name)
            .map(NodeId)
    }

    fn require(&self, id: NodeId) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(EngineError::UnknownNode(id))
        }
    }

    // ------------------------------------------------------------------
    // Topology
    // ------------------------------------------------------------------

    /// Make `child` an owned child of `parent`.
    ///
    /// A node has at most one parent and the child hierarchy stays acyclic;
    /// transition rules are free to form any graph.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.require(parent)?;
        self.require(child)?;

        if self.nodes[child.0].core().parent.is_some() {
            return Err(EngineError::InvalidHierarchy {
                parent,
                child,
                reason: "child already has a parent",
            });
        }
        let mut ancestor = Some(parent);
        while let Some(id) = ancestor {
            if id == child {
                return Err(EngineError::InvalidHierarchy {
                    parent,
                    child,
                    reason: "would create a cycle",
                });
            }
            ancestor = self.nodes[id.0].core().parent;
        }

        self.nodes[child.0].core_mut().parent = Some(parent);
        self.nodes[parent.0].core_mut().children.push(child);
        Ok(())
    }

    /// Append a rule to `from`. Rules are evaluated in the order added.
    pub fn add_transition<F>(
        &mut self,
        from: NodeId,
        guard: F,
        target: NodeId,
        label: impl Into<String>,
    ) -> Result<()>
    where
        F: Fn(&Input) -> bool + 'static,
    {
        self.push_rule(from, TransitionRule::new(guard, target, label))
    }

    /// Append a rule that domain handlers can select by `tag`.
    pub fn add_tagged_transition<F>(
        &mut self,
        from: NodeId,
        tag: TransitionTag,
        guard: F,
        target: NodeId,
        label: impl Into<String>,
    ) -> Result<()>
    where
        F: Fn(&Input) -> bool + 'static,
    {
        self.push_rule(from, TransitionRule::new(guard, target, label).with_tag(tag))
    }

    fn push_rule(&mut self, from: NodeId, rule: TransitionRule) -> Result<()> {
        self.require(from)?;
        self.require(rule.target)?;
        self.nodes[from.0].core_mut().add_rule(rule);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Systems and cursors
    // ------------------------------------------------------------------

    /// Declare `root` as the initial and reset node of `system`.
    ///
    /// The cursor is placed on `root` if the system has none yet. No hooks
    /// run.
    pub fn set_system_root(&mut self, system: impl Into<String>, root: NodeId) -> Result<()> {
        self.require(root)?;
        let system = system.into();
        debug!(%system, %root, "system root set");
        self.current.entry(system.clone()).or_insert(root);
        self.system_roots.insert(system, root);
        Ok(())
    }

    pub fn system_root(&self, system: &str) -> Option<NodeId> {
        self.system_roots.get(system).copied()
    }

    pub fn current_node(&self, system: &str) -> Option<NodeId> {
        self.current.get(system).copied()
    }

    pub fn systems(&self) -> impl Iterator<Item = &str> {
        self.system_roots.keys().map(String::as_str)
    }

    pub fn context(&self) -> &GameContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut GameContext {
        &mut self.context
    }

    pub fn limits(&self) -> &PersistenceConfig {
        &self.limits
    }

    /// Id of the most recent save written or loaded.
    pub fn last_save_id(&self) -> Option<Uuid> {
        self.last_save_id
    }

    /// Route `input` to the current node of `system`.
    pub fn process_input(&mut self, system: &str, input: &Input) -> Outcome {
        let Some(current) = self.current_node(system) else {
            warn!(%system, kind = %input.kind, "input for unknown system ignored");
            return Outcome::UnknownSystem;
        };

        let resolution = self.nodes[current.0].evaluate_transition(input, &mut self.context);
        match resolution {
            Resolution::Unhandled => {
                debug!(%system, kind = %input.kind, "no transition matched");
                Outcome::NoMatch
            }
            Resolution::Stay => Outcome::Stayed,
            Resolution::MoveTo(target) if target == current => Outcome::Stayed,
            Resolution::MoveTo(target) if !self.contains(target) => {
                warn!(%system, %target, "transition target is not registered");
                Outcome::NoMatch
            }
            Resolution::MoveTo(target) => {
                self.move_cursor(system, current, target);
                Outcome::Transitioned {
                    from: current,
                    to: target,
                }
            }
        }
    }

    fn move_cursor(&mut self, system: &str, from: NodeId, to: NodeId) {
        self.nodes[from.0].on_exit(&mut self.context);
        self.current.insert(system.to_string(), to);

        let node = &mut self.nodes[to.0];
        let visits = node.core().visits.saturating_add(1);
        node.core_mut().visits = visits;
        debug!(
            %system,
            from = %from,
            to = %to,
            node = %node.name(),
            "transition"
        );
        node.on_enter(&mut self.context);
    }

    /// Actions offered by the current node of `system`.
    pub fn available_actions(&self, system: &str) -> Vec<Action> {
        self.current_node(system)
            .map(|id| self.nodes[id.0].available_actions(&self.context))
            .unwrap_or_default()
    }

    /// Move the cursor of `system` back to its root.
    pub fn reset_system(&mut self, system: &str) -> Outcome {
        let (Some(current), Some(root)) = (self.current_node(system), self.system_root(system))
        else {
            return Outcome::UnknownSystem;
        };
        if current == root {
            return Outcome::Stayed;
        }
        self.move_cursor(system, current, root);
        Outcome::Transitioned {
            from: current,
            to: root,
        }
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write the whole engine state to `path`.
    pub fn save_state(&mut self, path: impl AsRef<Path>) -> Result<Uuid> {
        let path = path.as_ref();
        // Encode first so a failed save never creates or truncates the file.
        let (save_id, bytes) = self.encode_save()?;
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(&bytes)?;
        out.flush()?;
        self.last_save_id = Some(save_id);
        info!(path = %path.display(), %save_id, nodes = self.nodes.len(), "state saved");
        Ok(save_id)
    }

    /// Restore state from `path`. On error nothing is changed.
    pub fn load_state(&mut self, path: impl AsRef<Path>) -> Result<Uuid> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let save_id = self.load_from_reader(BufReader::new(file))?;
        info!(path = %path.display(), %save_id, "state loaded");
        Ok(save_id)
    }

    pub fn save_to_writer<W: Write>(&mut self, mut out: W) -> Result<Uuid> {
        let (save_id, bytes) = self.encode_save()?;
        out.write_all(&bytes)?;
        out.flush()?;
        self.last_save_id = Some(save_id);
        Ok(save_id)
    }

    fn encode_save(&self) -> Result<(Uuid, Vec<u8>)> {
        let save = self.snapshot()?;
        let bytes = save.encode(self.limits)?;
        Ok((save.save_id, bytes))
    }

    pub fn load_from_reader<R: Read>(&mut self, source: R) -> Result<Uuid> {
        let save = SaveFile::decode(source, self.limits)?;
        let save_id = save.save_id;
        self.apply(save)?;
        self.last_save_id = Some(save_id);
        Ok(save_id)
    }

    /// Capture cursors, node records and context as an in-memory save.
    pub fn snapshot(&self) -> Result<SaveFile> {
        let ids = self.persistent_ids();

        let systems = self
            .system_roots
            .keys()
            .map(|name| SystemEntry {
                name: name.clone(),
                cursor: self.current.get(name).map(|id| SavedCursor {
                    persistent_id: ids[id.0].clone(),
                    node_name: self.nodes[id.0].name().to_string(),
                }),
            })
            .collect();

        let records = self
            .nodes
            .iter()
            .zip(&ids)
            .map(|(node, persistent_id)| {
                Ok(NodeRecord {
                    persistent_id: persistent_id.clone(),
                    kind: node.kind().to_string(),
                    data: self.encode_record(node.as_ref())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SaveFile {
            save_id: Uuid::new_v4(),
            systems,
            records,
            context: self.context.clone(),
        })
    }

    /// Apply a parsed save. Either every record is applied or none is.
    pub fn apply(&mut self, save: SaveFile) -> Result<()> {
        let ids = self.persistent_ids();
        let by_id: HashMap<&str, NodeId> = ids
            .iter()
            .enumerate()
            .map(|(i, pid)| (pid.as_str(), NodeId(i)))
            .collect();

        // Resolve and type-check every record before touching any node.
        let mut resolved: Vec<(NodeId, &[u8])> = Vec::with_capacity(save.records.len());
        let mut seen = vec![false; self.nodes.len()];
        for record in &save.records {
            let Some(&id) = by_id.get(record.persistent_id.as_str()) else {
                warn!(node = %record.persistent_id, "no registered node for saved record, skipping");
                continue;
            };
            let expected = self.nodes[id.0].kind();
            if record.kind != expected {
                return Err(EngineError::KindMismatch {
                    node: record.persistent_id.clone(),
                    expected: expected.to_string(),
                    found: record.kind.clone(),
                });
            }
            if std::mem::replace(&mut seen[id.0], true) {
                return Err(EngineError::Corrupt(format!(
                    "duplicate record for '{}'",
                    record.persistent_id
                )));
            }
            resolved.push((id, record.data.as_slice()));
        }

        let backup = self
            .nodes
            .iter()
            .map(|node| self.encode_record(node.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        for (id, data) in resolved {
            if let Err(err) = self.decode_record(id, data) {
                warn!(node = %ids[id.0], error = %err, "record rejected, rolling back load");
                self.restore_records(&backup);
                return Err(err);
            }
        }

        self.restore_cursors(&save.systems, &by_id);
        self.context = save.context;
        Ok(())
    }

    fn encode_record(&self, node: &dyn Node) -> Result<Vec<u8>> {
        let mut w = RecordWriter::new(self.limits);
        w.write_u32(node.core().visits)?;
        node.save_state(&mut w)?;
        Ok(w.into_bytes())
    }

    fn decode_record(&mut self, id: NodeId, data: &[u8]) -> Result<()> {
        let mut r = RecordReader::new(data, self.limits);
        let visits = r.read_u32("visit count")?;

        let node = &mut self.nodes[id.0];
        node.load_state(&mut r)?;
        if !r.is_exhausted() {
            return Err(EngineError::Corrupt(format!(
                "{} trailing bytes in record for '{}'",
                r.remaining(),
                node.name()
            )));
        }
        node.core_mut().visits = visits;
        Ok(())
    }

    fn restore_records(&mut self, backup: &[Vec<u8>]) {
        for (i, data) in backup.iter().enumerate() {
            if let Err(err) = self.decode_record(NodeId(i), data) {
                error!(node = %self.nodes[i].name(), error = %err, "failed to roll back node state");
            }
        }
    }

    fn restore_cursors(&mut self, entries: &[SystemEntry], by_id: &HashMap<&str, NodeId>) {
        let saved: HashMap<&str, Option<&SavedCursor>> = entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.cursor.as_ref()))
            .collect();

        for entry in entries {
            if !self.system_roots.contains_key(&entry.name) {
                warn!(system = %entry.name, "saved system is not registered, skipping");
            }
        }

        let systems: Vec<(String, NodeId)> = self
            .system_roots
            .iter()
            .map(|(name, root)| (name.clone(), *root))
            .collect();

        for (system, root) in systems {
            let cursor = match saved.get(system.as_str()) {
                Some(Some(saved_cursor)) => self.resolve_cursor(&system, saved_cursor, by_id),
                _ => None,
            };
            let cursor = cursor.unwrap_or_else(|| {
                debug!(%system, "cursor reset to system root");
                root
            });
            self.current.insert(system, cursor);
        }
    }

    /// Find the saved cursor by persistent id, then by name, within the
    /// nodes reachable from the system root.
    fn resolve_cursor(
        &self,
        system: &str,
        saved: &SavedCursor,
        by_id: &HashMap<&str, NodeId>,
    ) -> Option<NodeId> {
        let reachable = self.reachable_from(system);
        let persistent_id = saved.persistent_id.as_str();

        if let Some(&id) = by_id.get(persistent_id) {
            if reachable.contains(&id) {
                return Some(id);
            }
        }

        let name = saved.node_name.as_str();
        let found = reachable
            .iter()
            .copied()
            .find(|id| self.nodes[id.0].name() == name);
        match found {
            Some(id) => {
                debug!(%system, %persistent_id, node = %name, "cursor matched by name");
                Some(id)
            }
            None => {
                warn!(%system, %persistent_id, "saved cursor not found");
                None
            }
        }
    }
}
