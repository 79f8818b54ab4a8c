//! Installed bundles and their per-bundle switches.

use crate::core::BundleOption;
use crate::error::{NotificationError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An application known to the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleInfo {
    pub bundle: String,
    pub uid: i32,
    #[serde(default, alias = "systemApp")]
    pub system_app: bool,
}

impl BundleInfo {
    pub fn new(bundle: impl Into<String>, uid: i32) -> Self {
        Self {
            bundle: bundle.into(),
            uid,
            system_app: false,
        }
    }

    pub fn system(bundle: impl Into<String>, uid: i32) -> Self {
        Self {
            system_app: true,
            ..Self::new(bundle, uid)
        }
    }
}

#[derive(Debug)]
struct BundleState {
    info: BundleInfo,
    notifications_enabled: bool,
    badge_displayed: bool,
}

#[derive(Debug, Default)]
pub struct BundleRegistry {
    bundles: HashMap<String, BundleState>,
}

impl BundleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs or reinstalls a bundle. Reinstalling keeps its switches.
    pub fn install(&mut self, info: BundleInfo) {
        match self.bundles.get_mut(&info.bundle) {
            Some(state) => state.info = info,
            None => {
                self.bundles.insert(
                    info.bundle.clone(),
                    BundleState {
                        info,
                        notifications_enabled: true,
                        badge_displayed: true,
                    },
                );
            }
        }
    }

    pub fn get(&self, bundle: &str) -> Result<&BundleInfo> {
        self.bundles
            .get(bundle)
            .map(|state| &state.info)
            .ok_or_else(|| NotificationError::BundleNotFound(bundle.to_string()))
    }

    /// Resolves an option to an installed bundle whose uid matches.
    pub fn resolve(&self, option: &BundleOption) -> Result<&BundleInfo> {
        let info = self.get(&option.bundle)?;
        if option.matches(&info.bundle, info.uid) {
            Ok(info)
        } else {
            Err(NotificationError::BundleNotFound(format!(
                "{} with uid {:?}",
                option.bundle, option.uid
            )))
        }
    }

    pub fn require_system(&self, caller: &str) -> Result<&BundleInfo> {
        let info = self.get(caller)?;
        if info.system_app {
            Ok(info)
        } else {
            Err(NotificationError::NotSystemApp(caller.to_string()))
        }
    }

    pub fn set_enabled(&mut self, bundle: &str, enabled: bool) -> Result<()> {
        self.state_mut(bundle)?.notifications_enabled = enabled;
        Ok(())
    }

    pub fn is_enabled(&self, bundle: &str) -> bool {
        self.bundles
            .get(bundle)
            .is_some_and(|state| state.notifications_enabled)
    }

    pub fn set_badge_displayed(&mut self, bundle: &str, displayed: bool) -> Result<()> {
        self.state_mut(bundle)?.badge_displayed = displayed;
        Ok(())
    }

    pub fn is_badge_displayed(&self, bundle: &str) -> bool {
        self.bundles
            .get(bundle)
            .is_some_and(|state| state.badge_displayed)
    }

    fn state_mut(&mut self, bundle: &str) -> Result<&mut BundleState> {
        self.bundles
            .get_mut(bundle)
            .ok_or_else(|| NotificationError::BundleNotFound(bundle.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_checks_uid() {
        let mut registry = BundleRegistry::new();
        registry.install(BundleInfo::new("com.example.app", 100));

        assert!(registry.resolve(&BundleOption::new("com.example.app")).is_ok());
        assert!(registry
            .resolve(&BundleOption::with_uid("com.example.app", 100))
            .is_ok());
        assert!(matches!(
            registry.resolve(&BundleOption::with_uid("com.example.app", 7)),
            Err(NotificationError::BundleNotFound(_))
        ));
        assert!(registry.resolve(&BundleOption::new("missing")).is_err());
    }

    #[test]
    fn test_require_system() {
        let mut registry = BundleRegistry::new();
        registry.install(BundleInfo::new("com.example.app", 100));
        registry.install(BundleInfo::system("com.example.systemui", 1000));

        assert!(matches!(
            registry.require_system("com.example.app"),
            Err(NotificationError::NotSystemApp(_))
        ));
        assert!(registry.require_system("com.example.systemui").is_ok());
    }

    #[test]
    fn test_reinstall_keeps_switches() {
        let mut registry = BundleRegistry::new();
        registry.install(BundleInfo::new("com.example.app", 100));
        registry.set_enabled("com.example.app", false).unwrap();
        registry.install(BundleInfo::new("com.example.app", 101));

        assert!(!registry.is_enabled("com.example.app"));
        assert_eq!(registry.get("com.example.app").unwrap().uid, 101);
        assert!(registry.is_badge_displayed("com.example.app"));
    }
}
