//! Error types for the simulation core.
//!
//! Fatal errors (bad data, corrupt packs, failed generation) are
//! [`SimError`]s. Player commands that the rules refuse are not errors in
//! that sense: they return [`CommandRejection`] or
//! [`DockRejection`](crate::docking::DockRejection) values carrying the
//! message to show, and leave the simulation untouched.

use thiserror::Error;

use crate::components::{EntityId, SlotId};
use crate::data::{BlueprintId, ItemId};
use crate::generation::GenerationError;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum SimError {
    /// Item data referenced by id does not exist in the database.
    #[error("Unknown item: {0:?}")]
    UnknownItem(ItemId),

    /// Blueprint referenced by id does not exist in the database.
    #[error("Unknown blueprint: {0:?}")]
    UnknownBlueprint(BlueprintId),

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The referenced item is not the expected kind (hull, gear, commodity).
    #[error("Item {item:?} is not a {expected}")]
    WrongItemKind {
        /// Item that was referenced.
        item: ItemId,
        /// Kind that was expected.
        expected: &'static str,
    },

    /// A loadout could not be applied to its hull.
    #[error("Invalid loadout: {0}")]
    InvalidLoadout(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Data failed validation.
    #[error("Data validation failed: {0:?}")]
    ValidationFailed(Vec<String>),

    /// Pack bytes could not be encoded or decoded.
    #[error("Pack error: {0}")]
    Pack(String),

    /// Zone generation failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Invalid simulation state.
    #[error("Invalid simulation state: {0}")]
    InvalidState(String),
}

/// A player or AI command the rules refused.
///
/// Carries no state change: the caller shows the message and moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandRejection {
    /// The entity does not exist in this zone.
    #[error("Entity not found")]
    NoSuchEntity,

    /// The entity is dead.
    #[error("Entity is destroyed")]
    Dead,

    /// No gear is equipped in the given slot.
    #[error("Nothing equipped in slot {0:?}")]
    EmptySlot(SlotId),

    /// The slot has no factory behavior.
    #[error("Slot {0:?} has no factory")]
    NotAFactory(SlotId),

    /// The blueprint cannot be produced by this factory.
    #[error("Factory cannot produce this blueprint")]
    WrongFactory,

    /// Targeting oneself.
    #[error("Cannot target self")]
    SelfTarget,
}
