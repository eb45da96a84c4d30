//! Weather system node.
//!
//! Global weather changes on a timer, rolled from a seasonal transition
//! table. Regions may carry their own weather, which drifts alongside the
//! global roll. Rolls use a seeded RNG whose state is saved with the node,
//! so a restored game continues the same weather sequence.

use game_context::{
    GameContext, Season, WeatherCondition, WeatherEffect, WeatherIntensity, WeatherType,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::error::{EngineError, Result};
use crate::input::Input;
use crate::node::{Node, NodeCore, Resolution};
use crate::persistence::{RecordReader, RecordWriter};
use crate::transition::TransitionTag;

/// Input kind handled by [`WeatherNode`].
pub const WEATHER_ACTION: &str = "weather_action";

pub const MAX_ACTIVE_EFFECTS: usize = 100;
pub const MAX_FORECAST_DAYS: usize = 100;

const FORECAST_DAYS: u32 = 3;

const EMBEDDED_TABLE: &str = include_str!("../../data/weather.json");

/// Hours between weather changes, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeInterval {
    pub min_hours: u32,
    pub max_hours: u32,
}

impl ChangeInterval {
    fn roll(&self, rng: &mut StdRng) -> u32 {
        rng.gen_range(self.min_hours..=self.max_hours)
    }
}

/// Narration for one weather type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Descriptions {
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub by_intensity: BTreeMap<WeatherIntensity, String>,
}

/// Probability tables driving weather changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherTable {
    pub change_interval: ChangeInterval,
    /// Current type -> relative weight of each next type.
    pub transitions: BTreeMap<WeatherType, BTreeMap<WeatherType, f32>>,
    /// Season -> multiplier applied to a next type's weight. Missing means 1.
    #[serde(default)]
    pub seasonal_modifiers: BTreeMap<Season, BTreeMap<WeatherType, f32>>,
    #[serde(default)]
    pub intensities: BTreeMap<WeatherType, BTreeMap<WeatherIntensity, f32>>,
    #[serde(default)]
    pub descriptions: BTreeMap<WeatherType, Descriptions>,
}

impl WeatherTable {
    /// Parse and validate a table from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json)
            .map_err(|e| EngineError::Config(format!("weather table: {e}")))?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// The table shipped with the engine.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_TABLE)
    }

    pub fn validate(&self) -> Result<()> {
        let interval = self.change_interval;
        if interval.min_hours == 0 || interval.min_hours > interval.max_hours {
            return Err(EngineError::Config(format!(
                "weather change interval {}..={} is invalid",
                interval.min_hours, interval.max_hours
            )));
        }
        if self.transitions.is_empty() {
            return Err(EngineError::Config("weather table has no transitions".into()));
        }
        for (from, row) in &self.transitions {
            check_weights(&format!("transitions from {from}"), row.values())?;
        }
        for (ty, row) in &self.intensities {
            check_weights(&format!("intensities of {ty}"), row.values())?;
        }
        for (season, row) in &self.seasonal_modifiers {
            if row.values().any(|m| !m.is_finite() || *m < 0.0) {
                return Err(EngineError::Config(format!(
                    "seasonal modifiers for {} must be finite and non-negative",
                    season.name()
                )));
            }
        }
        Ok(())
    }

    /// Pick the type following `current`. `roll` is uniform in `[0, 1)`.
    ///
    /// Keeps `current` when it has no transitions or every weight is zero
    /// after seasonal modifiers.
    pub fn next_type(&self, current: WeatherType, season: Season, roll: f32) -> WeatherType {
        let Some(row) = self.transitions.get(&current) else {
            return current;
        };
        let modifiers = self.seasonal_modifiers.get(&season);
        let weighted = row.iter().map(|(ty, weight)| {
            let modifier = modifiers.and_then(|m| m.get(ty)).copied().unwrap_or(1.0);
            (*ty, weight * modifier)
        });
        pick_weighted(weighted, roll).unwrap_or(current)
    }

    pub fn next_intensity(&self, ty: WeatherType, roll: f32) -> WeatherIntensity {
        let fallback = if ty == WeatherType::Clear {
            WeatherIntensity::None
        } else {
            WeatherIntensity::Light
        };
        self.intensities
            .get(&ty)
            .and_then(|row| pick_weighted(row.iter().map(|(i, w)| (*i, *w)), roll))
            .unwrap_or(fallback)
    }

    /// A condition with effects and table-provided narration.
    pub fn condition(&self, ty: WeatherType, intensity: WeatherIntensity) -> WeatherCondition {
        let mut condition = WeatherCondition::new(ty, intensity);
        if let Some(text) = self.descriptions.get(&ty).and_then(|d| {
            d.by_intensity
                .get(&intensity)
                .or(d.default.as_ref())
        }) {
            condition.description = text.clone();
        }
        condition
    }
}

fn check_weights<'a>(what: &str, weights: impl Iterator<Item = &'a f32>) -> Result<()> {
    let mut total = 0.0f32;
    for w in weights {
        if !w.is_finite() || *w < 0.0 {
            return Err(EngineError::Config(format!(
                "{what}: weights must be finite and non-negative"
            )));
        }
        total += *w;
    }
    if total <= 0.0 {
        return Err(EngineError::Config(format!("{what}: total weight must be positive")));
    }
    Ok(())
}

/// Cumulative pick over `(item, weight)`; `None` when no weight is positive.
fn pick_weighted<T: Copy>(items: impl Iterator<Item = (T, f32)> + Clone, roll: f32) -> Option<T> {
    let total: f32 = items.clone().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let target = roll.clamp(0.0, 1.0) * total;
    let mut cumulative = 0.0;
    let mut last = None;
    for (item, weight) in items {
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last = Some(item);
        if target < cumulative {
            return Some(item);
        }
    }
    last
}

/// Predicted weather for a day ahead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forecast {
    pub day_offset: u32,
    pub weather_type: WeatherType,
    pub intensity: WeatherIntensity,
    /// Confidence in `[0, 1]`, dropping with distance.
    pub accuracy: f32,
}

/// Global and regional weather for the world.
#[derive(Debug)]
pub struct WeatherNode {
    core: NodeCore,
    table: WeatherTable,
    global: WeatherCondition,
    regional: BTreeMap<String, WeatherCondition>,
    hours_until_change: u32,
    forecast: Vec<Forecast>,
    rng_state: u64,
}

impl WeatherNode {
    /// A weather node using the embedded table.
    pub fn new(name: impl Into<String>, seed: u64) -> Result<Self> {
        Self::with_table(name, WeatherTable::embedded()?, seed)
    }

    /// A weather node driven by `table`, which is validated first.
    pub fn with_table(name: impl Into<String>, table: WeatherTable, seed: u64) -> Result<Self> {
        table.validate()?;
        let mut node = Self {
            core: NodeCore::new(name),
            global: table.condition(WeatherType::Clear, WeatherIntensity::None),
            table,
            regional: BTreeMap::new(),
            hours_until_change: 0,
            forecast: Vec::new(),
            rng_state: seed,
        };
        let mut rng = node.rng();
        node.hours_until_change = node.table.change_interval.roll(&mut rng);
        node.regenerate_forecast(&mut rng);
        node.store_rng(&mut rng);
        Ok(node)
    }

    pub fn table(&self) -> &WeatherTable {
        &self.table
    }

    pub fn global(&self) -> &WeatherCondition {
        &self.global
    }

    pub fn set_global_weather(&mut self, condition: WeatherCondition) {
        self.global = condition;
    }

    pub fn regional_weather(&self, region: &str) -> Option<&WeatherCondition> {
        self.regional.get(region)
    }

    pub fn set_regional_weather(&mut self, region: impl Into<String>, condition: WeatherCondition) {
        self.regional.insert(region.into(), condition);
    }

    pub fn clear_regional_weather(&mut self, region: &str) -> Option<WeatherCondition> {
        self.regional.remove(region)
    }

    /// Weather in `region`, falling back to the global weather.
    pub fn weather_for(&self, region: &str) -> &WeatherCondition {
        self.regional.get(region).unwrap_or(&self.global)
    }

    pub fn hours_until_change(&self) -> u32 {
        self.hours_until_change
    }

    pub fn forecast(&self) -> &[Forecast] {
        &self.forecast
    }

    fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.rng_state)
    }

    fn store_rng(&mut self, rng: &mut StdRng) {
        self.rng_state = rng.gen();
    }

    /// Let `hours` pass. Returns whether the weather changed.
    pub fn advance(&mut self, hours: u32, ctx: &mut GameContext) -> bool {
        if hours < self.hours_until_change {
            self.hours_until_change -= hours;
            return false;
        }

        let season = ctx.world.season;
        let mut rng = self.rng();

        let next = self
            .table
            .next_type(self.global.weather_type, season, rng.gen());
        let intensity = self.table.next_intensity(next, rng.gen());
        self.global = self.table.condition(next, intensity);

        for condition in self.regional.values_mut() {
            let ty = self.table.next_type(condition.weather_type, season, rng.gen());
            let intensity = self.table.next_intensity(ty, rng.gen());
            *condition = self.table.condition(ty, intensity);
        }

        self.hours_until_change = self.table.change_interval.roll(&mut rng);
        self.regenerate_forecast(&mut rng);
        self.store_rng(&mut rng);

        info!(
            node = %self.core.name,
            weather = %next,
            %intensity,
            next_change_in = self.hours_until_change,
            "weather changed"
        );
        ctx.narrate(self.global.description.clone());
        true
    }

    /// Forecast the next few days. Accuracy falls with distance; an
    /// inaccurate forecast predicts a random common weather.
    fn regenerate_forecast(&mut self, rng: &mut StdRng) {
        const COMMON: [WeatherType; 5] = [
            WeatherType::Clear,
            WeatherType::Cloudy,
            WeatherType::Foggy,
            WeatherType::Rainy,
            WeatherType::Stormy,
        ];
        const INTENSITIES: [WeatherIntensity; 3] = [
            WeatherIntensity::Light,
            WeatherIntensity::Moderate,
            WeatherIntensity::Heavy,
        ];

        self.forecast = (1..=FORECAST_DAYS)
            .map(|day_offset| {
                let accuracy = rng.gen_range(0.5f32..1.0) * (1.0 - day_offset as f32 * 0.1);
                let (weather_type, intensity) = if rng.gen::<f32>() < accuracy {
                    (self.global.weather_type, self.global.intensity)
                } else {
                    (
                        COMMON[rng.gen_range(0..COMMON.len())],
                        INTENSITIES[rng.gen_range(0..INTENSITIES.len())],
                    )
                };
                Forecast {
                    day_offset,
                    weather_type,
                    intensity,
                    accuracy,
                }
            })
            .collect();
    }

    fn narrate_weather(&self, ctx: &mut GameContext) {
        let region = ctx.current_region().to_string();
        let condition = self.weather_for(&region);
        ctx.narrate(format!("Weather in {region}: {}", condition.description));
        if condition.has_effect(WeatherEffect::ReducedVisibility) {
            ctx.narrate("Visibility is poor.");
        }
        if condition.has_effect(WeatherEffect::SlowMovement) {
            ctx.narrate("Travel will be slow.");
        }
    }
}

impl Node for WeatherNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "weather"
    }

    fn on_enter(&mut self, ctx: &mut GameContext) {
        debug!(node = %self.core.name, "entered weather system");
        self.narrate_weather(ctx);
    }

    fn available_actions(&self, _ctx: &GameContext) -> Vec<Action> {
        let mut actions = vec![
            Action::emitting(
                "check_weather",
                "Look at the sky",
                Input::action(WEATHER_ACTION, "check"),
            ),
            Action::emitting(
                "wait",
                "Wait a few hours",
                Input::action(WEATHER_ACTION, "advance").with_param("hours", 4),
            ),
            Action::emitting(
                "forecast",
                "Read the signs for the coming days",
                Input::action(WEATHER_ACTION, "forecast"),
            ),
        ];
        if let Some(rule) = self.core.rule_by_tag(&TransitionTag::Exit) {
            actions.push(Action::emitting(
                "leave",
                rule.label.clone(),
                Input::action(WEATHER_ACTION, "leave"),
            ));
        }
        actions
    }

    fn evaluate_transition(&mut self, input: &Input, ctx: &mut GameContext) -> Resolution {
        if input.is(WEATHER_ACTION) {
            match input.param_str("action") {
                Some("check") => {
                    self.narrate_weather(ctx);
                    return Resolution::Stay;
                }
                Some("advance") => {
                    let hours = input.param_int("hours").unwrap_or(1);
                    match u32::try_from(hours) {
                        Ok(hours) if hours > 0 => {
                            self.advance(hours, ctx);
                            return Resolution::Stay;
                        }
                        _ => warn!(node = %self.core.name, hours, "invalid weather advance"),
                    }
                }
                Some("forecast") => {
                    let mut rng = self.rng();
                    self.regenerate_forecast(&mut rng);
                    self.store_rng(&mut rng);
                    for f in &self.forecast {
                        ctx.narrate(format!(
                            "In {} day(s): {} {} ({:.0}% sure)",
                            f.day_offset,
                            f.intensity,
                            f.weather_type,
                            f.accuracy * 100.0
                        ));
                    }
                    return Resolution::Stay;
                }
                Some("leave") => {
                    if let Some(target) = self.core.target_for(&TransitionTag::Exit) {
                        return Resolution::MoveTo(target);
                    }
                }
                _ => {}
            }
        }
        self.core.match_rules(input).into()
    }

    fn save_state(&self, out: &mut RecordWriter) -> Result<()> {
        write_condition(out, &self.global)?;
        out.write_u32(self.hours_until_change)?;
        out.write_u64(self.rng_state)?;

        out.write_count("region count", self.regional.len())?;
        for (region, condition) in &self.regional {
            out.write_key("region name", region)?;
            write_condition(out, condition)?;
        }

        out.write_len("forecast days", self.forecast.len(), MAX_FORECAST_DAYS)?;
        for f in &self.forecast {
            out.write_u32(f.day_offset)?;
            out.write_u8(f.weather_type.as_u8())?;
            out.write_u8(f.intensity.as_u8())?;
            out.write_f32(f.accuracy)?;
        }
        Ok(())
    }

    fn load_state(&mut self, input: &mut RecordReader<&[u8]>) -> Result<()> {
        let global = read_condition(input)?;
        let hours_until_change = input.read_u32("hours until change")?;
        let rng_state = input.read_u64("rng state")?;

        let region_count = input.read_count("region count")?;
        let mut regional = BTreeMap::new();
        for _ in 0..region_count {
            let region = input.read_key("region name")?;
            regional.insert(region, read_condition(input)?);
        }

        let days = input.read_len("forecast days", MAX_FORECAST_DAYS)?;
        let mut forecast = Vec::with_capacity(days);
        for _ in 0..days {
            forecast.push(Forecast {
                day_offset: input.read_u32("forecast day")?,
                weather_type: read_weather_type(input)?,
                intensity: read_intensity(input)?,
                accuracy: input.read_f32("forecast accuracy")?,
            });
        }

        self.global = global;
        self.hours_until_change = hours_until_change;
        self.rng_state = rng_state;
        self.regional = regional;
        self.forecast = forecast;
        Ok(())
    }
}

fn write_condition(out: &mut RecordWriter, condition: &WeatherCondition) -> Result<()> {
    out.write_u8(condition.weather_type.as_u8())?;
    out.write_u8(condition.intensity.as_u8())?;
    out.write_str("weather description", &condition.description)?;
    out.write_len(
        "active effects",
        condition.active_effects.len(),
        MAX_ACTIVE_EFFECTS,
    )?;
    for effect in &condition.active_effects {
        out.write_u8(effect.as_u8())?;
    }
    Ok(())
}

fn read_condition(input: &mut RecordReader<&[u8]>) -> Result<WeatherCondition> {
    let weather_type = read_weather_type(input)?;
    let intensity = read_intensity(input)?;
    let description = input.read_str("weather description")?;
    let count = input.read_len("active effects", MAX_ACTIVE_EFFECTS)?;
    let mut active_effects = Vec::with_capacity(count);
    for _ in 0..count {
        let raw = input.read_u8("weather effect")?;
        let effect = WeatherEffect::from_u8(raw)
            .ok_or_else(|| EngineError::Corrupt(format!("invalid weather effect {raw}")))?;
        active_effects.push(effect);
    }
    Ok(WeatherCondition {
        weather_type,
        intensity,
        description,
        active_effects,
    })
}

fn read_weather_type(input: &mut RecordReader<&[u8]>) -> Result<WeatherType> {
    let raw = input.read_u8("weather type")?;
    WeatherType::from_u8(raw).ok_or_else(|| EngineError::Corrupt(format!("invalid weather type {raw}")))
}

fn read_intensity(input: &mut RecordReader<&[u8]>) -> Result<WeatherIntensity> {
    let raw = input.read_u8("weather intensity")?;
    WeatherIntensity::from_u8(raw)
        .ok_or_else(|| EngineError::Corrupt(format!("invalid weather intensity {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PersistenceConfig;

    fn round_trip(node: &WeatherNode) -> Result<WeatherNode> {
        let mut w = RecordWriter::new(PersistenceConfig::default());
        node.save_state(&mut w)?;
        let bytes = w.into_bytes();

        let mut restored = WeatherNode::new("Weather", 0)?;
        let mut r = RecordReader::new(bytes.as_slice(), PersistenceConfig::default());
        restored.load_state(&mut r)?;
        assert!(r.is_exhausted());
        Ok(restored)
    }

    #[test]
    fn test_embedded_table_is_valid() {
        let table = WeatherTable::embedded().unwrap();
        assert!(table.transitions.contains_key(&WeatherType::Clear));
        assert_eq!(
            table.condition(WeatherType::Clear, WeatherIntensity::None).description,
            "Clear skies with a gentle breeze."
        );
    }

    #[test]
    fn test_with_table_rejects_inverted_interval() {
        let mut table = WeatherTable::embedded().unwrap();
        table.change_interval.min_hours = 10;
        table.change_interval.max_hours = 2;

        assert!(matches!(
            WeatherNode::with_table("Weather", table, 7),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_tables_rejected() {
        let zero_weights = r#"{
            "change_interval": { "min_hours": 1, "max_hours": 2 },
            "transitions": { "Clear": { "Cloudy": 0.0 } }
        }"#;
        assert!(matches!(
            WeatherTable::from_json(zero_weights),
            Err(EngineError::Config(_))
        ));

        let bad_interval = r#"{
            "change_interval": { "min_hours": 5, "max_hours": 2 },
            "transitions": { "Clear": { "Clear": 1.0 } }
        }"#;
        assert!(WeatherTable::from_json(bad_interval).is_err());
        assert!(WeatherTable::from_json("not json").is_err());
    }

    #[test]
    fn test_seasonal_modifier_excludes_snow() {
        let table = WeatherTable::embedded().unwrap();
        for i in 0..100 {
            let roll = i as f32 / 100.0;
            let next = table.next_type(WeatherType::Clear, Season::Summer, roll);
            assert_ne!(next, WeatherType::Snowy);
        }
    }

    #[test]
    fn test_pick_weighted() {
        let items = [("a", 1.0), ("b", 0.0), ("c", 3.0)];
        assert_eq!(pick_weighted(items.iter().copied(), 0.0), Some("a"));
        assert_eq!(pick_weighted(items.iter().copied(), 0.5), Some("c"));
        assert_eq!(pick_weighted(items.iter().copied(), 1.0), Some("c"));
        assert_eq!(pick_weighted([("x", 0.0)].into_iter(), 0.3), None);
    }

    #[test]
    fn test_same_seed_same_weather() {
        let mut ctx = GameContext::new();
        let mut a = WeatherNode::new("Weather", 42).unwrap();
        let mut b = WeatherNode::new("Weather", 42).unwrap();

        for _ in 0..20 {
            a.advance(6, &mut ctx);
            b.advance(6, &mut ctx);
        }
        assert_eq!(a.global(), b.global());
        assert_eq!(a.forecast(), b.forecast());
    }

    #[test]
    fn test_advance_counts_down_before_changing() {
        let mut ctx = GameContext::new();
        let mut node = WeatherNode::new("Weather", 7).unwrap();
        let remaining = node.hours_until_change();
        assert!(remaining >= 4);

        assert!(!node.advance(1, &mut ctx));
        assert_eq!(node.hours_until_change(), remaining - 1);
        assert!(ctx.pending_narration().is_empty());

        assert!(node.advance(remaining, &mut ctx));
        assert_eq!(ctx.pending_narration().len(), 1);
    }

    #[test]
    fn test_check_narrates_regional_weather() {
        let mut ctx = GameContext::new();
        ctx.set_current_region("Forest");
        let mut node = WeatherNode::new("Weather", 1).unwrap();
        node.set_regional_weather(
            "Forest",
            WeatherCondition::new(WeatherType::Foggy, WeatherIntensity::Light),
        );

        let resolution =
            node.evaluate_transition(&Input::action(WEATHER_ACTION, "check"), &mut ctx);

        assert_eq!(resolution, Resolution::Stay);
        let lines = ctx.drain_narration();
        assert!(lines[0].starts_with("Weather in Forest"));
        assert!(lines.iter().any(|l| l == "Visibility is poor."));
    }

    #[test]
    fn test_leave_without_exit_rule_is_unhandled() {
        let mut ctx = GameContext::new();
        let mut node = WeatherNode::new("Weather", 1).unwrap();
        let resolution =
            node.evaluate_transition(&Input::action(WEATHER_ACTION, "leave"), &mut ctx);
        assert_eq!(resolution, Resolution::Unhandled);
    }

    #[test]
    fn test_negative_hours_ignored() {
        let mut ctx = GameContext::new();
        let mut node = WeatherNode::new("Weather", 1).unwrap();
        let before = node.hours_until_change();
        let input = Input::action(WEATHER_ACTION, "advance").with_param("hours", -3);

        assert_eq!(node.evaluate_transition(&input, &mut ctx), Resolution::Unhandled);
        assert_eq!(node.hours_until_change(), before);
    }

    #[test]
    fn test_state_round_trip() {
        let mut node = WeatherNode::new("Weather", 99).unwrap();
        node.set_global_weather(WeatherCondition::new(
            WeatherType::Stormy,
            WeatherIntensity::Heavy,
        ));
        node.set_regional_weather(
            "Forest",
            WeatherCondition::new(WeatherType::Foggy, WeatherIntensity::Light),
        );

        let restored = round_trip(&node).unwrap();

        assert_eq!(restored.global(), node.global());
        assert_eq!(restored.regional_weather("Forest"), node.regional_weather("Forest"));
        assert_eq!(restored.forecast(), node.forecast());
        assert_eq!(restored.hours_until_change(), node.hours_until_change());
        assert_eq!(restored.rng_state, node.rng_state);
    }

    #[test]
    fn test_oversized_description_refused_on_save() {
        let mut node = WeatherNode::new("Weather", 3).unwrap();
        let mut condition = WeatherCondition::new(WeatherType::Rainy, WeatherIntensity::Light);
        condition.description = "x".repeat(10_001);
        node.set_global_weather(condition);

        let mut w = RecordWriter::new(PersistenceConfig::default());
        assert!(matches!(
            node.save_state(&mut w),
            Err(EngineError::Oversized { .. })
        ));
    }

    #[test]
    fn test_invalid_discriminant_is_corrupt() {
        let node = WeatherNode::new("Weather", 3).unwrap();
        let mut w = RecordWriter::new(PersistenceConfig::default());
        node.save_state(&mut w).unwrap();
        let mut bytes = w.into_bytes();
        bytes[0] = 200;

        let mut restored = WeatherNode::new("Weather", 0).unwrap();
        let before = restored.global().clone();
        let mut r = RecordReader::new(bytes.as_slice(), PersistenceConfig::default());

        assert!(matches!(restored.load_state(&mut r), Err(EngineError::Corrupt(_))));
        assert_eq!(restored.global(), &before);
    }
}
