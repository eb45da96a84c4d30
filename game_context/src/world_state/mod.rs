//! World state - locations, factions, global flags and the calendar.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Days per season.
pub const DAYS_PER_SEASON: u32 = 90;

/// World time tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WorldTime {
    pub day: u32,
    pub hour: u8,
}

impl WorldTime {
    pub fn new(day: u32, hour: u8) -> Self {
        Self { day, hour }
    }
}

/// Seasons of the year.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Season {
    #[default]
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub fn next(self) -> Self {
        match self {
            Season::Spring => Season::Summer,
            Season::Summer => Season::Autumn,
            Season::Autumn => Season::Winter,
            Season::Winter => Season::Spring,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        }
    }
}

/// The mutable state of the game world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    /// Location name -> state ("peaceful", "wild", ...).
    pub location_states: BTreeMap<String, String>,

    /// Faction name -> state ("normal", "aggressive", ...).
    pub faction_states: BTreeMap<String, String>,

    /// Global boolean flags.
    pub world_flags: BTreeMap<String, bool>,

    pub time: WorldTime,
    pub season: Season,

    /// Region the player is currently in.
    pub current_region: String,
}

impl Default for WorldState {
    fn default() -> Self {
        let location_states = [
            ("village", "peaceful"),
            ("forest", "wild"),
            ("mountain", "unexplored"),
            ("castle", "occupied"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let faction_states = [
            ("villagers", "normal"),
            ("bandits", "aggressive"),
            ("merchants", "traveling"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let world_flags = ["war_active", "plague_spreading", "dragons_returned"]
            .into_iter()
            .map(|k| (k.to_string(), false))
            .collect();

        Self {
            location_states,
            faction_states,
            world_flags,
            time: WorldTime::default(),
            season: Season::default(),
            current_region: "default".to_string(),
        }
    }
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A flag that was never set reads as `false`.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.world_flags.get(flag).copied().unwrap_or(false)
    }

    pub fn set_flag(&mut self, flag: impl Into<String>, value: bool) {
        self.world_flags.insert(flag.into(), value);
    }

    pub fn location_state(&self, location: &str) -> &str {
        self.location_states
            .get(location)
            .map_or("unknown", String::as_str)
    }

    pub fn faction_state(&self, faction: &str) -> &str {
        self.faction_states
            .get(faction)
            .map_or("unknown", String::as_str)
    }

    pub fn set_location_state(&mut self, location: impl Into<String>, state: impl Into<String>) {
        self.location_states.insert(location.into(), state.into());
    }

    pub fn set_faction_state(&mut self, faction: impl Into<String>, state: impl Into<String>) {
        self.faction_states.insert(faction.into(), state.into());
    }

    /// Check if it's currently night.
    pub fn is_night(&self) -> bool {
        self.time.hour < 6 || self.time.hour >= 20
    }

    /// Advance one day, rotating the season every [`DAYS_PER_SEASON`] days.
    pub fn advance_day(&mut self) {
        self.advance_days(1);
    }

    /// Advance several days at once. The day counter saturates at `u32::MAX`.
    pub fn advance_days(&mut self, days: u32) {
        let start = self.time.day;
        self.time.day = start.saturating_add(days);
        let rotations = self.time.day / DAYS_PER_SEASON - start / DAYS_PER_SEASON;
        for _ in 0..rotations % 4 {
            self.season = self.season.next();
        }
    }

    /// Advance the clock by whole hours, rolling over into new days.
    pub fn advance_hours(&mut self, hours: u32) {
        let total = u64::from(self.time.hour) + u64::from(hours);
        self.time.hour = (total % 24) as u8;
        self.advance_days(u32::try_from(total / 24).unwrap_or(u32::MAX));
    }
}
