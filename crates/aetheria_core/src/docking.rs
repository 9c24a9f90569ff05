//! Docking rules.
//!
//! A host offers a fixed number of docking bays. Each bay carries a small
//! transfer hold that docked ships load and unload through. The checks here
//! are pure; [`Zone::dock`](crate::zone::Zone::dock) and
//! [`Zone::undock`](crate::zone::Zone::undock) apply them and only mutate
//! state when they pass.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::behaviors::Behavior;
use crate::components::EntityId;
use crate::data::GlobalData;
use crate::entity::Entity;
use crate::items::CargoBay;
use crate::math::fixed_from_f32;

/// Why a dock or undock request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DockRejection {
    /// Ship or host does not exist.
    #[error("Nothing to dock with!")]
    NoSuchEntity,
    /// Ship or host is destroyed.
    #[error("Can't dock with a destroyed ship!")]
    Dead,
    /// Ship and host are the same entity.
    #[error("Can't dock with yourself!")]
    SelfDock,
    /// Only ships dock.
    #[error("Only ships can dock!")]
    NotMobile,
    /// The ship is already docked.
    #[error("Already docked!")]
    AlreadyDocked,
    /// The ship is not docked.
    #[error("Not docked!")]
    NotDocked,
    /// The host is itself docked.
    #[error("Can't dock with a docked ship!")]
    HostDocked,
    /// Host is beyond docking distance.
    #[error("Too far away to dock!")]
    OutOfRange,
    /// Every bay of the host is taken, or it has none.
    #[error("No free docking bay!")]
    NoFreeBay,
    /// Undocking requires a cockpit.
    #[error("Can't undock. Missing cockpit component!")]
    MissingCockpit,
    /// Undocking requires a thruster.
    #[error("Can't undock. Missing thruster component!")]
    MissingThruster,
    /// Undocking requires a reactor.
    #[error("Can't undock. Missing reactor component!")]
    MissingReactor,
    /// The ship's transfer hold still holds items.
    #[error("Must empty docking bay!")]
    BayNotEmpty,
}

/// One docking bay of a host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DockingBay {
    occupant: Option<EntityId>,
    /// Transfer hold.
    pub cargo: CargoBay,
}

impl DockingBay {
    /// Create an empty bay with a transfer hold of `capacity`.
    #[must_use]
    pub const fn new(capacity: f32) -> Self {
        Self {
            occupant: None,
            cargo: CargoBay::new(capacity),
        }
    }

    /// Ship docked here.
    #[must_use]
    pub const fn occupant(&self) -> Option<EntityId> {
        self.occupant
    }

    /// Whether no ship is docked here.
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.occupant.is_none()
    }

    pub(crate) fn set_occupant(&mut self, occupant: Option<EntityId>) {
        self.occupant = occupant;
    }
}

/// Check a dock request. Returns the bay the ship would take.
///
/// # Errors
///
/// Returns the first rule the request breaks.
pub fn check_dock(ship: &Entity, host: &Entity, global: &GlobalData) -> Result<usize, DockRejection> {
    if ship.id() == host.id() {
        return Err(DockRejection::SelfDock);
    }
    if !ship.is_alive() || !host.is_alive() {
        return Err(DockRejection::Dead);
    }
    if !ship.kind().is_mobile() {
        return Err(DockRejection::NotMobile);
    }
    if ship.parent().is_some() {
        return Err(DockRejection::AlreadyDocked);
    }
    if host.parent().is_some() {
        return Err(DockRejection::HostDocked);
    }
    let reach = fixed_from_f32(global.docking_distance);
    if ship.position().distance_squared(host.position()) > reach.saturating_mul(reach) {
        return Err(DockRejection::OutOfRange);
    }
    host.docking_bays()
        .iter()
        .position(DockingBay::is_free)
        .ok_or(DockRejection::NoFreeBay)
}

/// Check an undock request. Returns the bay the ship occupies.
///
/// # Errors
///
/// Returns the first rule the request breaks.
pub fn check_undock(ship: &Entity, host: &Entity) -> Result<usize, DockRejection> {
    if !ship.is_alive() {
        return Err(DockRejection::Dead);
    }
    if ship.parent() != Some(host.id()) {
        return Err(DockRejection::NotDocked);
    }
    if !ship.has_behavior(|b| matches!(b, Behavior::Cockpit(_))) {
        return Err(DockRejection::MissingCockpit);
    }
    if !ship.has_behavior(|b| matches!(b, Behavior::Thruster(_))) {
        return Err(DockRejection::MissingThruster);
    }
    if !ship.has_behavior(|b| matches!(b, Behavior::Reactor(_))) {
        return Err(DockRejection::MissingReactor);
    }
    let bay = host
        .docking_bays()
        .iter()
        .position(|bay| bay.occupant() == Some(ship.id()))
        .ok_or(DockRejection::NotDocked)?;
    if !host.docking_bays()[bay].cargo.is_empty() {
        return Err(DockRejection::BayNotEmpty);
    }
    Ok(bay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ItemInstance;
    use crate::math::Vec2Fixed;
    use crate::test_fixtures::{self, ids};

    fn pair() -> (Entity, Entity, GlobalData) {
        let ctx = test_fixtures::context();
        let mut ship = test_fixtures::skiff(&ctx);
        ship.set_id(1);
        let mut host = test_fixtures::outpost(&ctx);
        host.set_id(2);
        host.set_position(Vec2Fixed::from_f32(30.0, 0.0));
        (ship, host, ctx.global)
    }

    #[test]
    fn test_dock_checks() {
        let (ship, host, global) = pair();
        assert_eq!(check_dock(&ship, &host, &global), Ok(0));
        assert_eq!(check_dock(&ship, &ship, &global), Err(DockRejection::SelfDock));
        assert_eq!(check_dock(&host, &ship, &global), Err(DockRejection::NotMobile));

        let (mut far, host, global) = pair();
        far.set_position(Vec2Fixed::from_f32(500.0, 0.0));
        assert_eq!(check_dock(&far, &host, &global), Err(DockRejection::OutOfRange));
    }

    #[test]
    fn test_docked_host_rejects() {
        let (ship, mut host, global) = pair();
        host.set_parent(Some(7));
        assert_eq!(check_dock(&ship, &host, &global), Err(DockRejection::HostDocked));
    }

    #[test]
    fn test_full_host_rejects() {
        let (ship, mut host, global) = pair();
        for bay in host.docking_bays_mut() {
            bay.set_occupant(Some(99));
        }
        assert_eq!(check_dock(&ship, &host, &global), Err(DockRejection::NoFreeBay));
    }

    #[test]
    fn test_undock_requires_core_systems() {
        let ctx = test_fixtures::context();
        let (mut ship, mut host, _) = pair();
        ship.set_parent(Some(host.id()));
        host.docking_bays_mut()[0].set_occupant(Some(ship.id()));
        assert_eq!(check_undock(&ship, &host), Ok(0));

        host.docking_bays_mut()[0]
            .cargo
            .try_store(
                ItemInstance::Commodity {
                    item: ids::ORE,
                    quantity: 1,
                },
                &ctx.items,
            )
            .expect("fits");
        assert_eq!(check_undock(&ship, &host), Err(DockRejection::BayNotEmpty));

        let cockpit = ship
            .slot_of(ids::COCKPIT)
            .expect("skiff carries a cockpit");
        ship.unequip(&ctx.items, cockpit);
        assert_eq!(
            check_undock(&ship, &host),
            Err(DockRejection::MissingCockpit)
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            DockRejection::MissingCockpit.to_string(),
            "Can't undock. Missing cockpit component!"
        );
        assert_eq!(DockRejection::BayNotEmpty.to_string(), "Must empty docking bay!");
    }
}
