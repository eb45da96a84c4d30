//! The shared game context every node reads and writes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::inventory::Inventory;
use crate::stats::CharacterStats;
use crate::world_state::WorldState;

/// Item id used for currency.
pub const GOLD: &str = "gold";

/// The single mutable context passed explicitly to node hooks.
///
/// Cross-system reads and writes should prefer the accessor methods below
/// over reaching into the fields, so the coupling between subsystems stays
/// visible at the call site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameContext {
    pub player_stats: CharacterStats,
    pub world: WorldState,
    pub inventory: Inventory,

    /// Quest id -> status.
    pub quest_journal: BTreeMap<String, String>,

    /// NPC or topic -> last dialogue node seen.
    pub dialogue_history: BTreeMap<String, String>,

    /// Text produced by node hooks since the front end last drained it.
    #[serde(skip)]
    narration: Vec<String>,
}

impl GameContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reputation(&self, faction: &str) -> i32 {
        self.player_stats
            .faction_reputation
            .get(faction)
            .copied()
            .unwrap_or(0)
    }

    pub fn adjust_reputation(&mut self, faction: &str, delta: i32) {
        self.player_stats.change_faction_rep(faction, delta);
    }

    pub fn gold(&self) -> u32 {
        self.inventory.quantity_of(GOLD)
    }

    /// Spend gold, leaving the purse untouched when it is too light.
    pub fn spend_gold(&mut self, amount: u32) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        self.inventory.remove_item(GOLD, amount)
    }

    pub fn flag(&self, flag: &str) -> bool {
        self.world.has_flag(flag)
    }

    pub fn set_flag(&mut self, flag: impl Into<String>, value: bool) {
        self.world.set_flag(flag, value);
    }

    pub fn current_region(&self) -> &str {
        &self.world.current_region
    }

    pub fn set_current_region(&mut self, region: impl Into<String>) {
        self.world.current_region = region.into();
    }

    /// Queue a line of text for the player.
    pub fn narrate(&mut self, line: impl Into<String>) {
        self.narration.push(line.into());
    }

    pub fn pending_narration(&self) -> &[String] {
        &self.narration
    }

    /// Take every queued line, oldest first.
    pub fn drain_narration(&mut self) -> Vec<String> {
        std::mem::take(&mut self.narration)
    }

    /// Encode the whole context as JSON. Queued narration is not included.
    ///
    /// Fails on a non-finite float anywhere in the context, since it could
    /// not be read back.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
