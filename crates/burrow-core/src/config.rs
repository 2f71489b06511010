//! Configuration loading and typed config structures for the Burrow economy.
//!
//! The canonical configuration lives in `burrow-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure and converts them into the values the world and agent crates
//! take ([`GridSpec`], [`KindTuning`]). Every section and field is optional;
//! missing values fall back to the defaults below.

use std::collections::BTreeMap;
use std::path::Path;

use burrow_agents::KindTuning;
use burrow_types::{AgentKind, GridCoord, WorldPoint};
use burrow_world::{GridSpec, PathGrid, Terrain, TerrainLayout, WorldError};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `burrow-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Grid extent, terrain and the fixed points agents travel to.
    #[serde(default)]
    pub world: WorldConfig,

    /// Resource nodes placed at startup.
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,

    /// Miner tunables.
    #[serde(default)]
    pub miners: KindConfig,

    /// Hauler tunables.
    #[serde(default)]
    pub haulers: KindConfig,

    /// Population caps and coordinator intervals.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Run-loop pacing and boundaries.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `BURROW_TICK_MS` overrides `simulation.tick_interval_ms` when set to
    /// a valid integer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty map.
        if yaml.trim().is_empty() {
            let mut config = Self::default();
            config.simulation.apply_env_overrides();
            return Ok(config);
        }
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.simulation.apply_env_overrides();
        Ok(config)
    }

    /// The tunables of `kind`, resolved against the world's fixed points.
    pub fn tuning(&self, kind: AgentKind) -> KindTuning {
        let section = match kind {
            AgentKind::Miner => &self.miners,
            AgentKind::Hauler => &self.haulers,
        };
        section.tuning(&self.world)
    }

    /// Spawn cap of `kind`.
    pub const fn max_agents(&self, kind: AgentKind) -> u32 {
        match kind {
            AgentKind::Miner => self.economy.max_miners,
            AgentKind::Hauler => self.economy.max_haulers,
        }
    }

    /// Seconds between automatic spawns of `kind`.
    pub const fn spawn_interval(&self, kind: AgentKind) -> f32 {
        match kind {
            AgentKind::Miner => self.miners.spawn_interval,
            AgentKind::Hauler => self.haulers.spawn_interval,
        }
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Center of the covered rectangle.
    #[serde(default)]
    pub origin: WorldPoint,

    /// Width of the covered rectangle in world units.
    #[serde(default = "default_world_extent")]
    pub width: f32,

    /// Height of the covered rectangle in world units.
    #[serde(default = "default_world_extent")]
    pub height: f32,

    /// Half the side length of a grid cell.
    #[serde(default = "default_node_radius")]
    pub node_radius: f32,

    /// Terrain rows, top to bottom. Empty means open ground everywhere.
    #[serde(default)]
    pub layout: Vec<String>,

    /// Terrain of each layout character. Keys must be single characters;
    /// characters without an entry are clear ground. Weighted ground uses
    /// the variant tag, as in `"~": !open { weight: 30 }`.
    #[serde(default)]
    pub legend: BTreeMap<String, Terrain>,

    /// Where miners unload and haulers pick up supplies.
    #[serde(default)]
    pub home: WorldPoint,

    /// Where agents wait out an emergency.
    #[serde(default = "default_shelter")]
    pub shelter: WorldPoint,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl WorldConfig {
    /// The rectangle and cell size of the grid.
    pub const fn grid_spec(&self) -> GridSpec {
        GridSpec {
            origin: self.origin,
            width: self.width,
            height: self.height,
            node_radius: self.node_radius,
        }
    }

    /// The legend keyed by character. Multi-character keys are skipped
    /// with a warning.
    pub fn legend_chars(&self) -> BTreeMap<char, Terrain> {
        let mut legend = BTreeMap::new();
        for (key, terrain) in &self.legend {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => {
                    legend.insert(c, *terrain);
                }
                _ => tracing::warn!(key = %key, "Ignoring terrain legend key that is not one character"),
            }
        }
        legend
    }

    /// Sample the grid from the terrain layout (or open ground when no
    /// layout is given).
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidGrid`] for a malformed layout or a
    /// degenerate extent.
    pub fn build_grid(&self) -> Result<PathGrid, WorldError> {
        let spec = self.grid_spec();
        if self.layout.is_empty() {
            return PathGrid::build(spec, &|_: WorldPoint, _: f32| Terrain::CLEAR);
        }
        let layout = TerrainLayout::new(self.layout.as_slice(), self.legend_chars(), spec)?;
        PathGrid::build(spec, &layout)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            origin: WorldPoint::ZERO,
            width: default_world_extent(),
            height: default_world_extent(),
            node_radius: default_node_radius(),
            layout: Vec::new(),
            legend: BTreeMap::new(),
            home: WorldPoint::ZERO,
            shelter: default_shelter(),
            seed: default_seed(),
        }
    }
}

/// One resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NodeConfig {
    /// Grid cell the node sits on.
    pub cell: GridCoord,

    /// Primary units available for extraction.
    #[serde(default = "default_node_primary")]
    pub primary: u32,

    /// Secondary units available for consumption.
    #[serde(default = "default_node_secondary")]
    pub secondary: u32,
}

/// Tunables shared by both agent kinds. Fields a kind does not use are
/// ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KindConfig {
    /// Seconds between automatic spawns.
    #[serde(default = "default_spawn_interval")]
    pub spawn_interval: f32,

    /// Travel speed in world units per second.
    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Seconds between extraction attempts.
    #[serde(default = "default_action_interval")]
    pub extract_interval: f32,

    /// Seconds between meal attempts.
    #[serde(default = "default_action_interval")]
    pub consume_interval: f32,

    /// Units a miner carries before heading home.
    #[serde(default = "default_max_carry")]
    pub max_carry: u32,

    /// Successful extractions between meals.
    #[serde(default = "default_actions_per_food")]
    pub actions_per_food: u32,

    /// Seconds spent loading supplies.
    #[serde(default = "default_action_interval")]
    pub load_duration: f32,

    /// Seconds spent handing units over.
    #[serde(default = "default_action_interval")]
    pub deposit_duration: f32,

    /// Secondary units a hauler loads and delivers per trip.
    #[serde(default = "default_load_amount")]
    pub load_amount: u32,

    /// Steer with the decision policy while idle.
    #[serde(default)]
    pub roam_when_idle: bool,
}

impl KindConfig {
    /// Resolve into the tuning handed to the machine builder.
    pub fn tuning(&self, world: &WorldConfig) -> KindTuning {
        KindTuning {
            speed: self.speed,
            home: world.home,
            shelter: world.shelter,
            extract_interval: self.extract_interval,
            consume_interval: self.consume_interval,
            max_carry: self.max_carry,
            actions_per_food: self.actions_per_food,
            load_duration: self.load_duration,
            deposit_duration: self.deposit_duration,
            load_amount: self.load_amount,
            roam_when_idle: self.roam_when_idle,
        }
    }
}

impl Default for KindConfig {
    fn default() -> Self {
        Self {
            spawn_interval: default_spawn_interval(),
            speed: default_speed(),
            extract_interval: default_action_interval(),
            consume_interval: default_action_interval(),
            max_carry: default_max_carry(),
            actions_per_food: default_actions_per_food(),
            load_duration: default_action_interval(),
            deposit_duration: default_action_interval(),
            load_amount: default_load_amount(),
            roam_when_idle: false,
        }
    }
}

/// Population caps and coordinator intervals.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EconomyConfig {
    /// Maximum number of miners alive at once.
    #[serde(default = "default_max_miners")]
    pub max_miners: u32,

    /// Maximum number of haulers alive at once.
    #[serde(default = "default_max_haulers")]
    pub max_haulers: u32,

    /// Seconds between recomputations of the nodes in use.
    #[serde(default = "default_in_use_check_interval")]
    pub in_use_check_interval: f32,

    /// Radius of the random offset applied to spawn positions around home.
    #[serde(default = "default_spawn_jitter")]
    pub spawn_jitter: f32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            max_miners: default_max_miners(),
            max_haulers: default_max_haulers(),
            in_use_check_interval: default_in_use_check_interval(),
            spawn_jitter: default_spawn_jitter(),
        }
    }
}

/// Run-loop pacing and boundaries.
///
/// A value of 0 for either `max_ticks` or `max_real_time_seconds` means
/// unlimited.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Simulated seconds advanced per tick.
    #[serde(default = "default_dt")]
    pub dt: f32,

    /// Maximum number of ticks before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Maximum wall-clock seconds before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,

    /// Where the extraction partition's cost cache is stored between runs.
    /// Empty disables caching.
    #[serde(default = "default_cache_path")]
    pub cache_path: String,
}

impl SimulationBoundsConfig {
    /// Override pacing with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("BURROW_TICK_MS") {
            match val.parse() {
                Ok(ms) => self.tick_interval_ms = ms,
                Err(_) => tracing::warn!(value = %val, "Ignoring invalid BURROW_TICK_MS"),
            }
        }
    }
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            dt: default_dt(),
            max_ticks: 0,
            max_real_time_seconds: 0,
            cache_path: default_cache_path(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Pretty,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_world_extent() -> f32 {
    20.0
}

const fn default_node_radius() -> f32 {
    0.5
}

const fn default_shelter() -> WorldPoint {
    WorldPoint::new(-8.0, -8.0)
}

const fn default_seed() -> u64 {
    42
}

const fn default_node_primary() -> u32 {
    30
}

const fn default_node_secondary() -> u32 {
    10
}

const fn default_spawn_interval() -> f32 {
    5.0
}

const fn default_speed() -> f32 {
    4.0
}

const fn default_action_interval() -> f32 {
    1.0
}

const fn default_max_carry() -> u32 {
    15
}

const fn default_actions_per_food() -> u32 {
    5
}

const fn default_load_amount() -> u32 {
    10
}

const fn default_max_miners() -> u32 {
    10
}

const fn default_max_haulers() -> u32 {
    3
}

const fn default_in_use_check_interval() -> f32 {
    2.0
}

const fn default_spawn_jitter() -> f32 {
    0.25
}

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_dt() -> f32 {
    0.05
}

fn default_cache_path() -> String {
    "burrow-partition.json".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.world.seed, 42);
        assert_eq!(config.economy.max_miners, 10);
        assert_eq!(config.economy.max_haulers, 3);
        assert_eq!(config.miners.max_carry, 15);
        assert!(config.nodes.is_empty());
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r##"
world:
  origin: { x: 0.0, y: 0.0 }
  width: 10.0
  height: 10.0
  node_radius: 0.5
  layout:
    - "...."
    - ".##."
    - ".~~."
    - "...."
  legend:
    "#": blocked
    "~": !open { weight: 30 }
  home: { x: -4.5, y: -4.5 }
  shelter: { x: 4.5, y: -4.5 }
  seed: 7

nodes:
  - cell: { x: 1, y: 8 }
    primary: 5
  - cell: { x: 8, y: 8 }

miners:
  spawn_interval: 2.0
  speed: 6.0
  max_carry: 3

haulers:
  load_amount: 4
  roam_when_idle: true

economy:
  max_miners: 4
  max_haulers: 1
  in_use_check_interval: 0.5

simulation:
  dt: 0.1
  max_ticks: 500
  cache_path: ""

logging:
  level: "debug"
  format: json
"##;

        let config = SimulationConfig::parse(yaml);
        assert!(config.is_ok(), "{config:?}");
        let config = config.ok().unwrap_or_else(SimulationConfig::default);

        assert_eq!(config.world.seed, 7);
        assert_eq!(config.world.layout.len(), 4);
        assert_eq!(config.world.legend_chars().get(&'#'), Some(&Terrain::Blocked));
        assert_eq!(
            config.world.legend_chars().get(&'~'),
            Some(&Terrain::Open { weight: 30 })
        );
        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.nodes.first().map(|n| n.primary), Some(5));
        assert_eq!(config.nodes.get(1).map(|n| n.secondary), Some(10));
        assert_eq!(config.miners.max_carry, 3);
        assert_eq!(config.max_agents(AgentKind::Miner), 4);
        assert_eq!(config.max_agents(AgentKind::Hauler), 1);
        assert!(config.tuning(AgentKind::Hauler).roam_when_idle);
        assert_eq!(config.tuning(AgentKind::Hauler).load_amount, 4);
        assert_eq!(config.tuning(AgentKind::Miner).home, WorldPoint::new(-4.5, -4.5));
        assert_eq!(config.simulation.max_ticks, 500);
        assert!(config.simulation.cache_path.is_empty());
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "world:\n  seed: 9\n";
        let config = SimulationConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_else(SimulationConfig::default);

        assert_eq!(config.world.seed, 9);
        assert_eq!(config.economy.in_use_check_interval.to_bits(), 2.0_f32.to_bits());
        assert_eq!(config.haulers.load_amount, 10);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = SimulationConfig::parse("");
        assert!(config.is_ok());
    }

    #[test]
    fn multi_char_legend_keys_are_skipped() {
        let mut world = WorldConfig::default();
        world.legend.insert(String::from("ab"), Terrain::Blocked);
        world.legend.insert(String::from("x"), Terrain::Blocked);
        let legend = world.legend_chars();
        assert_eq!(legend.len(), 1);
        assert!(legend.contains_key(&'x'));
    }

    #[test]
    fn layout_drives_grid_sampling() {
        let world = WorldConfig {
            width: 4.0,
            height: 4.0,
            layout: vec![String::from("#..."), String::from("...."), String::from("...."), String::from("....")],
            legend: BTreeMap::from([(String::from("#"), Terrain::Blocked)]),
            ..WorldConfig::default()
        };
        let grid = world.build_grid();
        assert!(grid.is_ok());
        let grid = grid.ok();
        let grid = grid.as_ref();
        assert_eq!(grid.map(PathGrid::width), Some(4));
        // The first layout row is the top (maximum y) edge.
        assert_eq!(grid.map(|g| g.is_passable(GridCoord::new(0, 3))), Some(false));
        assert_eq!(grid.map(|g| g.is_passable(GridCoord::new(0, 0))), Some(true));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("burrow-config.yaml");
        if path.exists() {
            let config = SimulationConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
            let config = config.ok().unwrap_or_else(SimulationConfig::default);
            assert_eq!(
                config.world.legend_chars().get(&'~'),
                Some(&Terrain::Open { weight: 30 })
            );
            assert!(config.world.build_grid().is_ok());
        }
    }
}
