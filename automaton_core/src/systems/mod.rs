//! Domain nodes built on the engine.

pub mod bounty;
pub mod weather;

pub use bounty::{BountyOfficeNode, BOUNTY_ACTION};
pub use weather::{Forecast, WeatherNode, WeatherTable, WEATHER_ACTION};
