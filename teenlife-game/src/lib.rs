//! Teen Life Simulation Engine
//!
//! Platform-agnostic core logic for a turn-based teen life simulation.
//! This crate provides every simulation rule without UI or platform-specific dependencies.

pub mod actions;
pub mod activities;
pub mod chores;
pub mod clock;
pub mod config;
pub mod constants;
pub mod controller;
pub mod data;
pub mod education;
pub mod endings;
pub mod error;
pub mod events;
pub mod generator;
pub mod inventory;
pub mod numbers;
pub mod relationships;
pub mod rng;
pub mod save;
pub mod school;
pub mod shop;
pub mod state;
pub mod stats;
pub mod storage;

use anyhow::Context;

// Re-export commonly used types
pub use actions::ActionEconomy;
pub use activities::{ActivityContext, ActivityOutcome, check_available, list_available};
pub use chores::{ChoreKind, ChoreProgress};
pub use clock::{Clock, ClockStart, DayRollover, MonthDay, Period, PeriodAdvance};
pub use config::{CategoryWeight, ConfigError, EventStrategy, ForcedTrigger, SimConfig};
pub use controller::{Consequence, Milestone, Outcome, SimulationController};
pub use data::{
    ActivityDef, ActivityKind, CatalogData, CatalogError, Choice, Effects, EventCategory,
    EventDef, ItemDef, Requirements, ShopItem,
};
pub use education::{EducationTracker, SubjectId, Tier, TierBasis, TierBudget, TierChange};
pub use endings::{Ending, detect_ending};
pub use error::{CommandError, ValidationError};
pub use events::{AcademicOutcome, EventOrigin, EventQueue, PendingEvent};
pub use generator::{CannedEventSource, EventSource, GenerationContext, SourceError};
#[cfg(feature = "async")]
pub use generator::{AsyncEventSource, generate_with_timeout};
pub use inventory::{Inventory, ItemSale, ItemUse};
pub use relationships::{Relationship, RelationshipCategory, RelationshipLedger};
pub use rng::{RandomSource, RngBundle, RollStream, ScriptedRolls};
pub use save::PersistenceError;
pub use school::{SchoolAttendanceResolver, SkipOdds, SkipOutcome};
pub use shop::Purchase;
pub use state::{ActivityLog, GameState, Gender, LogEntry, Player};
pub use stats::{StatBoard, StatDelta, StatId};
pub use storage::MemoryStorage;

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the activity, event, shop and item catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<CatalogData, Self::Error>;

    /// Load configuration data for a specific system
    ///
    /// Returns `Ok(None)` when no override exists and defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration exists but cannot be parsed.
    fn load_config<T>(&self, config_name: &str) -> Result<Option<T>, Self::Error>
    where
        T: serde::de::DeserializeOwned;
}

/// Trait for abstracting save/load operations
/// Platform-specific implementations should provide this
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store an encoded save blob
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be stored.
    fn save_game(&self, save_name: &str, blob: &str) -> Result<(), Self::Error>;

    /// Fetch an encoded save blob
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read.
    fn load_game(&self, save_name: &str) -> Result<Option<String>, Self::Error>;

    /// Delete saved game
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Loader backed by the assets compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDataLoader;

impl DataLoader for StaticDataLoader {
    type Error = CatalogError;

    fn load_catalog(&self) -> Result<CatalogData, Self::Error> {
        Ok(CatalogData::default_catalog().clone())
    }

    fn load_config<T>(&self, _config_name: &str) -> Result<Option<T>, Self::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        Ok(None)
    }
}

/// Main game engine for managing game instances
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    data_loader: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    /// Create a new game engine with the provided data loader and storage
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    /// Simulation config from the loader, or defaults when none is provided.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded or is invalid.
    pub fn load_config(&self) -> anyhow::Result<SimConfig> {
        let config = self
            .data_loader
            .load_config::<SimConfig>("simulation")
            .context("loading simulation config")?
            .unwrap_or_default();
        config.validate().context("validating simulation config")?;
        Ok(config)
    }

    /// Start a new game for `name` with the given seed.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or config cannot be loaded.
    pub fn create_game(
        &self,
        name: &str,
        gender: Gender,
        seed: u64,
    ) -> anyhow::Result<SimulationController> {
        let config = self.load_config()?;
        let catalog = self
            .data_loader
            .load_catalog()
            .context("loading catalog")?;
        let mut controller = SimulationController::new(config, catalog, seed);
        controller.new_game(name, gender, seed);
        Ok(controller)
    }

    /// Save a game into a named slot
    ///
    /// # Errors
    ///
    /// Returns an error if the game cannot be encoded or stored.
    pub fn save_game<R: RandomSource>(
        &self,
        save_name: &str,
        controller: &SimulationController<R>,
    ) -> anyhow::Result<()> {
        let blob = controller.save().context("encoding save")?;
        self.storage
            .save_game(save_name, &blob)
            .with_context(|| format!("writing save slot '{save_name}'"))
    }

    /// Load a named slot into `controller`. Returns `false` when the slot is
    /// empty or holds a save from another version.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be read or the save is corrupt;
    /// the controller keeps its current game in that case.
    pub fn load_game<R: RandomSource>(
        &self,
        save_name: &str,
        controller: &mut SimulationController<R>,
    ) -> anyhow::Result<bool> {
        let Some(blob) = self
            .storage
            .load_game(save_name)
            .with_context(|| format!("reading save slot '{save_name}'"))?
        else {
            return Ok(false);
        };
        controller
            .load(&blob)
            .with_context(|| format!("decoding save slot '{save_name}'"))
    }

    /// Delete a named slot
    ///
    /// # Errors
    ///
    /// Returns an error if the storage rejects the deletion.
    pub fn delete_save(&self, save_name: &str) -> Result<(), S::Error> {
        self.storage.delete_save(save_name)
    }
}
