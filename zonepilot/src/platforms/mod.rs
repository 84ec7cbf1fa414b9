use crate::launch::EntryPoint;
use crate::service::ServiceComponent;
use crate::{AutomationError, Node};

/// The hosting environment the automation runs inside
///
/// On a device this is backed by the accessibility service binding: the
/// active window root, activity launching, and the secure settings store.
/// [`synthetic::SyntheticEngine`] implements it in memory.
pub trait AccessibilityEngine: Send + Sync {
    /// Root of the active window, read live. `None` while no window is available.
    fn active_root(&self) -> Option<Node>;

    /// Start the given entry point. `Ok` only says the launch call itself succeeded.
    fn launch(&self, entry: &EntryPoint) -> Result<(), AutomationError>;

    /// Enabled accessibility services as reported by the service registry,
    /// or `None` if the registry is unavailable
    fn enabled_services(&self) -> Option<Vec<ServiceComponent>>;

    /// Raw colon-separated enabled-services secure setting
    fn enabled_services_setting(&self) -> Option<String>;

    /// The separate "accessibility enabled" secure flag
    fn accessibility_enabled(&self) -> bool;
}

pub mod synthetic;
