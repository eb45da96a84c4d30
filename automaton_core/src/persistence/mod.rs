//! Save file format.
//!
//! ```text
//! magic "TASV" | version u8 | save id (16 bytes)
//! system count u64
//!   name | has cursor u8 | cursor persistent id | cursor node name
//! node count u64
//!   persistent id | kind | record (u64 length + bytes)
//! context (u64 length + JSON bytes)
//! ```
//!
//! Only node-local state is stored. Topology is rebuilt by the code that
//! registers the nodes, so records are matched back to nodes by persistent
//! id and kind. Reading a file produces a [`SaveFile`] without touching any
//! live state; the controller applies it afterwards.

mod codec;

pub use codec::{RecordReader, RecordWriter};

use game_context::GameContext;
use std::io::Read;
use uuid::Uuid;

use crate::config::PersistenceConfig;
use crate::error::{EngineError, Result};

pub const MAGIC: &[u8; 4] = b"TASV";
pub const VERSION: u8 = 1;

/// Where a saved cursor pointed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCursor {
    pub persistent_id: String,
    /// The node's own name, used when the persistent id no longer resolves.
    pub node_name: String,
}

/// Cursor position of one system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemEntry {
    pub name: String,
    pub cursor: Option<SavedCursor>,
}

/// Serialized state of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub persistent_id: String,
    pub kind: String,
    /// Base bookkeeping followed by the node's own state.
    pub data: Vec<u8>,
}

/// A fully parsed and bounds-checked save file.
#[derive(Debug, Clone)]
pub struct SaveFile {
    pub save_id: Uuid,
    pub systems: Vec<SystemEntry>,
    pub records: Vec<NodeRecord>,
    pub context: GameContext,
}

impl SaveFile {
    /// Encode into the on-disk representation.
    pub fn encode(&self, limits: PersistenceConfig) -> Result<Vec<u8>> {
        if self.systems.len() > limits.max_systems {
            return Err(EngineError::Oversized {
                field: "system count",
                len: self.systems.len(),
                max: limits.max_systems,
            });
        }
        if self.records.len() > limits.max_nodes {
            return Err(EngineError::Oversized {
                field: "node count",
                len: self.records.len(),
                max: limits.max_nodes,
            });
        }

        let mut w = RecordWriter::new(limits);
        w.write_raw(MAGIC);
        w.write_u8(VERSION)?;
        w.write_raw(self.save_id.as_bytes());

        w.write_len("system count", self.systems.len(), limits.max_systems)?;
        for system in &self.systems {
            w.write_key("system name", &system.name)?;
            w.write_bool(system.cursor.is_some())?;
            if let Some(cursor) = &system.cursor {
                w.write_str("cursor id", &cursor.persistent_id)?;
                w.write_str("cursor name", &cursor.node_name)?;
            }
        }

        w.write_len("node count", self.records.len(), limits.max_nodes)?;
        for record in &self.records {
            w.write_str("persistent id", &record.persistent_id)?;
            w.write_key("node kind", &record.kind)?;
            w.write_blob("node record", &record.data)?;
        }

        let context = self.context.to_json_bytes()?;
        w.write_blob("context", &context)?;
        Ok(w.into_bytes())
    }

    /// Parse a save, validating every declared size before reading it.
    pub fn decode<R: Read>(source: R, limits: PersistenceConfig) -> Result<Self> {
        let mut r = RecordReader::new(source, limits);

        let magic = r.read_array::<4>("magic")?;
        if &magic != MAGIC {
            return Err(EngineError::BadMagic);
        }
        let version = r.read_u8("version")?;
        if version != VERSION {
            return Err(EngineError::UnsupportedVersion(version));
        }
        let save_id = Uuid::from_bytes(r.read_array::<16>("save id")?);

        let system_count = r.read_len("system count", limits.max_systems)?;
        let mut systems = Vec::with_capacity(system_count);
        for _ in 0..system_count {
            let name = r.read_key("system name")?;
            let cursor = if r.read_bool("cursor flag")? {
                Some(SavedCursor {
                    persistent_id: r.read_str("cursor id")?,
                    node_name: r.read_str("cursor name")?,
                })
            } else {
                None
            };
            systems.push(SystemEntry { name, cursor });
        }

        let node_count = r.read_len("node count", limits.max_nodes)?;
        let mut records = Vec::with_capacity(node_count);
        for _ in 0..node_count {
            let persistent_id = r.read_str("persistent id")?;
            let kind = r.read_key("node kind")?;
            let data = r.read_blob("node record")?;
            records.push(NodeRecord {
                persistent_id,
                kind,
                data,
            });
        }

        let context_bytes = r.read_blob("context")?;
        r.expect_end("context")?;
        let context = GameContext::from_json_slice(&context_bytes)
            .map_err(|e| EngineError::Corrupt(format!("context: {e}")))?;

        Ok(Self {
            save_id,
            systems,
            records,
            context,
        })
    }
}
