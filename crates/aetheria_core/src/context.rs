//! Shared read-only data passed into every update.

use crate::data::{GlobalData, ItemDatabase, ZoneSettings};
use crate::error::{Result, SimError};

/// Static data a zone needs to run.
///
/// Built once at startup and borrowed by [`Zone::update`](crate::zone::Zone::update)
/// and the constructors that look up item definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationContext {
    /// Hulls, gear, commodities and blueprints.
    pub items: ItemDatabase,
    /// Global tuning.
    pub global: GlobalData,
    /// Zone generation tuning.
    pub zone_settings: ZoneSettings,
}

impl SimulationContext {
    /// Context with default tuning.
    #[must_use]
    pub fn new(items: ItemDatabase) -> Self {
        Self {
            items,
            global: GlobalData::default(),
            zone_settings: ZoneSettings::default(),
        }
    }

    /// Replace the global tuning.
    #[must_use]
    pub fn with_global(mut self, global: GlobalData) -> Self {
        self.global = global;
        self
    }

    /// Replace the zone generation tuning.
    #[must_use]
    pub fn with_zone_settings(mut self, zone_settings: ZoneSettings) -> Self {
        self.zone_settings = zone_settings;
        self
    }

    /// Parse all three data files from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DataParseError`] naming the offending document,
    /// or [`SimError::ValidationFailed`] listing every problem found.
    pub fn from_ron(items: &str, global: &str, zone_settings: &str) -> Result<Self> {
        let items = ItemDatabase::from_ron(items)?;
        let global: GlobalData = ron::from_str(global).map_err(|e| SimError::DataParseError {
            path: "global".to_string(),
            message: e.to_string(),
        })?;
        let zone_settings: ZoneSettings =
            ron::from_str(zone_settings).map_err(|e| SimError::DataParseError {
                path: "zone_settings".to_string(),
                message: e.to_string(),
            })?;
        let context = Self {
            items,
            global,
            zone_settings,
        };
        context.validate()?;
        Ok(context)
    }

    /// Validate every table and the references between them.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ValidationFailed`] listing every problem found.
    pub fn validate(&self) -> Result<()> {
        let mut errors = self.items.validate();
        errors.extend(self.global.validate());
        errors.extend(self.zone_settings.validate());
        if let Some(hull) = self.zone_settings.station_hull {
            if self.items.hull(hull).is_none() {
                errors.push(format!("zone_settings: station hull {hull:?} is not a hull"));
            }
        }
        for resource in &self.zone_settings.resources {
            if self.items.commodity(resource.commodity).is_none() {
                errors.push(format!(
                    "zone_settings: resource {:?} is not a commodity",
                    resource.commodity
                ));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SimError::ValidationFailed(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ItemId, ResourceDistribution};

    #[test]
    fn test_default_context_is_valid() {
        assert!(SimulationContext::default().validate().is_ok());
    }

    #[test]
    fn test_dangling_references_fail_validation() {
        let mut settings = ZoneSettings::default();
        settings.station_hull = Some(ItemId::new(99));
        settings.resources.push(ResourceDistribution {
            commodity: ItemId::new(98),
            density: 1.0,
            classes: Vec::new(),
            belts: true,
        });
        let context = SimulationContext::default().with_zone_settings(settings);
        match context.validate() {
            Err(SimError::ValidationFailed(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_from_ron_reports_document() {
        let result = SimulationContext::from_ron("(items: [], blueprints: [])", "(", "()");
        assert!(matches!(
            result,
            Err(SimError::DataParseError { ref path, .. }) if path == "global"
        ));
    }
}
