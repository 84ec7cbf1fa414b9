//! Whether the automation service is switched on
//!
//! The presentation layer uses this to decide between one-tap automation and
//! sending the user to the accessibility settings first.

use crate::platforms::AccessibilityEngine;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Identity of an accessibility service component
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceComponent {
    pub package: String,
    /// Fully-qualified class name
    pub class_name: String,
}

impl ServiceComponent {
    pub fn new(package: &str, class_name: &str) -> Self {
        Self {
            package: package.to_string(),
            class_name: class_name.to_string(),
        }
    }

    /// `package/fully.qualified.Class`
    pub fn flatten_to_string(&self) -> String {
        format!("{}/{}", self.package, self.class_name)
    }

    /// `package/Class`
    pub fn short_form(&self) -> String {
        let simple_name = self
            .class_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.class_name);
        format!("{}/{}", self.package, simple_name)
    }
}

impl fmt::Display for ServiceComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flatten_to_string())
    }
}

/// Check the service registry first, then the raw secure settings.
///
/// The fallback requires both the colon-separated enabled-services list to
/// name the component (flattened or short form, case-insensitive) and the
/// global accessibility flag to be on.
pub fn is_automation_enabled(engine: &dyn AccessibilityEngine, component: &ServiceComponent) -> bool {
    let enabled_by_registry = engine
        .enabled_services()
        .map(|services| {
            services.iter().any(|service| {
                service.package == component.package && service.class_name == component.class_name
            })
        })
        .unwrap_or(false);
    if enabled_by_registry {
        debug!(%component, "Service enabled according to registry");
        return true;
    }

    let flattened = component.flatten_to_string();
    let short = component.short_form();
    let listed = engine
        .enabled_services_setting()
        .map(|setting| {
            setting.split(':').any(|entry| {
                let entry = entry.trim();
                entry.eq_ignore_ascii_case(&flattened) || entry.eq_ignore_ascii_case(&short)
            })
        })
        .unwrap_or(false);
    let accessibility_enabled = engine.accessibility_enabled();
    debug!(
        %component,
        listed, accessibility_enabled, "Service state from secure settings"
    );
    listed && accessibility_enabled
}
