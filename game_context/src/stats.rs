//! Player statistics: attributes, skills, reputation and knowledge.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Attribute types for modifier calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

/// Character stats read by dialogue, progression, crime and weather systems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterStats {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,

    /// Skill name -> level.
    pub skills: BTreeMap<String, i32>,
    /// Faction name -> reputation score.
    pub faction_reputation: BTreeMap<String, i32>,
    pub known_facts: BTreeSet<String>,
    pub unlocked_abilities: BTreeSet<String>,
}

impl Default for CharacterStats {
    fn default() -> Self {
        let skills = [
            "combat",
            "stealth",
            "persuasion",
            "survival",
            "alchemy",
            "crafting",
            "magic",
        ]
        .into_iter()
        .map(|s| (s.to_string(), 0))
        .collect();

        let faction_reputation = [
            ("villagers", 0),
            ("merchants", 0),
            ("nobility", 0),
            ("bandits", -50),
        ]
        .into_iter()
        .map(|(f, r)| (f.to_string(), r))
        .collect();

        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
            skills,
            faction_reputation,
            known_facts: BTreeSet::new(),
            unlocked_abilities: BTreeSet::new(),
        }
    }
}

impl CharacterStats {
    /// Modifier for a given attribute (D&D style: (value - 10) / 2).
    pub fn modifier(&self, attribute: Attribute) -> i32 {
        let value = match attribute {
            Attribute::Strength => self.strength,
            Attribute::Dexterity => self.dexterity,
            Attribute::Constitution => self.constitution,
            Attribute::Intelligence => self.intelligence,
            Attribute::Wisdom => self.wisdom,
            Attribute::Charisma => self.charisma,
        };
        value.saturating_sub(10).div_euclid(2)
    }

    /// Current level of a skill, 0 when never trained.
    pub fn skill(&self, skill: &str) -> i32 {
        self.skills.get(skill).copied().unwrap_or(0)
    }

    pub fn has_skill(&self, skill: &str, min_level: i32) -> bool {
        self.skills.get(skill).is_some_and(|lvl| *lvl >= min_level)
    }

    pub fn has_faction_reputation(&self, faction: &str, min_rep: i32) -> bool {
        self.faction_reputation
            .get(faction)
            .is_some_and(|rep| *rep >= min_rep)
    }

    pub fn knows(&self, fact: &str) -> bool {
        self.known_facts.contains(fact)
    }

    pub fn has_ability(&self, ability: &str) -> bool {
        self.unlocked_abilities.contains(ability)
    }

    pub fn learn_fact(&mut self, fact: impl Into<String>) {
        self.known_facts.insert(fact.into());
    }

    pub fn unlock_ability(&mut self, ability: impl Into<String>) {
        self.unlocked_abilities.insert(ability.into());
    }

    pub fn improve_skill(&mut self, skill: &str, amount: i32) {
        let level = self.skills.entry(skill.to_string()).or_default();
        *level = level.saturating_add(amount);
    }

    pub fn change_faction_rep(&mut self, faction: &str, amount: i32) {
        let rep = self
            .faction_reputation
            .entry(faction.to_string())
            .or_default();
        *rep = rep.saturating_add(amount);
    }
}
