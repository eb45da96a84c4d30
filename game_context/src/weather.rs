//! Weather vocabulary shared by the weather system and anything that reacts to it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Weather state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum WeatherType {
    #[default]
    Clear,
    Cloudy,
    Foggy,
    Rainy,
    Stormy,
    Snowy,
    Blizzard,
    /// Desert regions only.
    SandStorm,
}

/// How strong the current weather is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum WeatherIntensity {
    #[default]
    None,
    Light,
    Moderate,
    Heavy,
    Severe,
}

/// Gameplay effects a weather condition can impose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherEffect {
    None,
    ReducedVisibility,
    SlowMovement,
    DamageOverTime,
    BonusToSkill,
    PenaltyToSkill,
    SpecialEncounter,
}

impl WeatherType {
    pub const ALL: [WeatherType; 8] = [
        WeatherType::Clear,
        WeatherType::Cloudy,
        WeatherType::Foggy,
        WeatherType::Rainy,
        WeatherType::Stormy,
        WeatherType::Snowy,
        WeatherType::Blizzard,
        WeatherType::SandStorm,
    ];

    /// Stable on-disk discriminant.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.get(usize::from(raw)).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            WeatherType::Clear => "clear",
            WeatherType::Cloudy => "cloudy",
            WeatherType::Foggy => "foggy",
            WeatherType::Rainy => "rainy",
            WeatherType::Stormy => "stormy",
            WeatherType::Snowy => "snowy",
            WeatherType::Blizzard => "blizzard",
            WeatherType::SandStorm => "sandstorm",
        }
    }

    /// Parse a weather name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        Self::ALL.into_iter().find(|w| w.name() == lower)
    }

    /// Effects this weather imposes at the given intensity.
    pub fn effects(self, intensity: WeatherIntensity) -> Vec<WeatherEffect> {
        let severe = matches!(
            intensity,
            WeatherIntensity::Heavy | WeatherIntensity::Severe
        );
        match self {
            WeatherType::Clear | WeatherType::Cloudy => Vec::new(),
            WeatherType::Foggy => vec![WeatherEffect::ReducedVisibility],
            WeatherType::Rainy if severe => {
                vec![WeatherEffect::ReducedVisibility, WeatherEffect::SlowMovement]
            }
            WeatherType::Rainy => vec![WeatherEffect::SlowMovement],
            WeatherType::Stormy => vec![
                WeatherEffect::ReducedVisibility,
                WeatherEffect::SlowMovement,
                WeatherEffect::PenaltyToSkill,
            ],
            WeatherType::Snowy => vec![WeatherEffect::SlowMovement],
            WeatherType::Blizzard | WeatherType::SandStorm => vec![
                WeatherEffect::ReducedVisibility,
                WeatherEffect::SlowMovement,
                WeatherEffect::DamageOverTime,
            ],
        }
    }
}

impl WeatherIntensity {
    pub const ALL: [WeatherIntensity; 5] = [
        WeatherIntensity::None,
        WeatherIntensity::Light,
        WeatherIntensity::Moderate,
        WeatherIntensity::Heavy,
        WeatherIntensity::Severe,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.get(usize::from(raw)).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            WeatherIntensity::None => "none",
            WeatherIntensity::Light => "light",
            WeatherIntensity::Moderate => "moderate",
            WeatherIntensity::Heavy => "heavy",
            WeatherIntensity::Severe => "severe",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        Self::ALL.into_iter().find(|i| i.name() == lower)
    }
}

impl WeatherEffect {
    pub const ALL: [WeatherEffect; 7] = [
        WeatherEffect::None,
        WeatherEffect::ReducedVisibility,
        WeatherEffect::SlowMovement,
        WeatherEffect::DamageOverTime,
        WeatherEffect::BonusToSkill,
        WeatherEffect::PenaltyToSkill,
        WeatherEffect::SpecialEncounter,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.get(usize::from(raw)).copied()
    }
}

impl fmt::Display for WeatherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for WeatherIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Weather in effect for one region (or globally).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WeatherCondition {
    pub weather_type: WeatherType,
    pub intensity: WeatherIntensity,
    pub description: String,
    pub active_effects: Vec<WeatherEffect>,
}

impl WeatherCondition {
    /// Build a condition with the effects implied by its type and intensity.
    pub fn new(weather_type: WeatherType, intensity: WeatherIntensity) -> Self {
        let description = if weather_type == WeatherType::Clear {
            "The sky is clear.".to_string()
        } else {
            format!("The weather is {intensity} and {weather_type}.")
        };
        Self {
            weather_type,
            intensity,
            description,
            active_effects: weather_type.effects(intensity),
        }
    }

    pub fn has_effect(&self, effect: WeatherEffect) -> bool {
        self.active_effects.contains(&effect)
    }
}
