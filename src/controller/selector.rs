//! # Device Selector Module
//!
//! Tracks connected joysticks and decides which one steers the camera.
//!
//! Resolution rules, applied while nothing is selected:
//!
//! - With a name pattern, candidates are the joysticks whose name contains
//!   the pattern (case-insensitive) or whose hardware id equals it.
//!   Without a pattern every connected joystick is a candidate.
//! - Exactly one candidate is selected and kept until it disconnects.
//! - No candidate means waiting; the caller polls again later.
//! - Several candidates is a configuration error: the selector never picks
//!   one of them at random.

use std::collections::BTreeMap;
use tracing::{error, info, warn};

use super::event::{InstanceId, JoystickIdentity};
use crate::error::{PtzError, Result};

/// Connected joysticks by instance id.
#[derive(Debug, Clone, Default)]
pub struct JoystickRegistry {
    devices: BTreeMap<InstanceId, JoystickIdentity>,
}

impl JoystickRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, instance: InstanceId, identity: JoystickIdentity) {
        self.devices.insert(instance, identity);
    }

    pub fn remove(&mut self, instance: InstanceId) -> Option<JoystickIdentity> {
        self.devices.remove(&instance)
    }

    #[must_use]
    pub fn get(&self, instance: InstanceId) -> Option<&JoystickIdentity> {
        self.devices.get(&instance)
    }

    #[must_use]
    pub fn contains(&self, instance: InstanceId) -> bool {
        self.devices.contains_key(&instance)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Iterates joysticks in instance id order.
    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &JoystickIdentity)> {
        self.devices.iter().map(|(id, identity)| (*id, identity))
    }
}

/// Name rule used to pick a joystick out of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    raw: String,
    lowered: String,
}

impl NamePattern {
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        Self {
            raw: pattern.to_string(),
            lowered: pattern.to_lowercase(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use camera_ptz::controller::event::JoystickIdentity;
    /// use camera_ptz::controller::selector::NamePattern;
    ///
    /// let stick = JoystickIdentity {
    ///     name: "Logitech Extreme 3D".to_string(),
    ///     guid: "0003046dc2150110".to_string(),
    ///     path: PathBuf::from("/dev/input/event5"),
    /// };
    /// assert!(NamePattern::new("extreme").matches(&stick));
    /// assert!(NamePattern::new("0003046dc2150110").matches(&stick));
    /// assert!(!NamePattern::new("xbox").matches(&stick));
    /// ```
    #[must_use]
    pub fn matches(&self, identity: &JoystickIdentity) -> bool {
        identity.name.to_lowercase().contains(&self.lowered)
            || identity.guid.eq_ignore_ascii_case(&self.raw)
    }
}

/// Outcome of one resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// A joystick is selected; `fresh` is true on the pass that picked it.
    Active { instance: InstanceId, fresh: bool },
    /// Nothing matches yet.
    Waiting,
}

/// Owns the registry and the active selection.
#[derive(Debug)]
pub struct DeviceSelector {
    registry: JoystickRegistry,
    pattern: Option<NamePattern>,
    active: Option<InstanceId>,
    reported_absence: bool,
}

impl DeviceSelector {
    #[must_use]
    pub fn new(pattern: Option<&str>) -> Self {
        Self {
            registry: JoystickRegistry::new(),
            pattern: pattern.map(NamePattern::new),
            active: None,
            reported_absence: false,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &JoystickRegistry {
        &self.registry
    }

    #[must_use]
    pub fn active(&self) -> Option<InstanceId> {
        self.active
    }

    #[must_use]
    pub fn is_active(&self, instance: InstanceId) -> bool {
        self.active == Some(instance)
    }

    /// Identity of the selected joystick.
    #[must_use]
    pub fn active_identity(&self) -> Option<&JoystickIdentity> {
        self.active.and_then(|id| self.registry.get(id))
    }

    /// Records a newly connected joystick.
    pub fn device_added(&mut self, instance: InstanceId, identity: JoystickIdentity) {
        info!("Joystick {} connected: {}", instance, identity);
        self.registry.insert(instance, identity);
    }

    /// Forgets a disconnected joystick. Returns true when it was the active one.
    pub fn device_removed(&mut self, instance: InstanceId) -> bool {
        let identity = self.registry.remove(instance);
        let was_active = self.active == Some(instance);

        match (identity, was_active) {
            (Some(identity), true) => {
                warn!(
                    "Active joystick {} ({}) disconnected, please connect a joystick",
                    instance, identity.name
                );
                self.active = None;
                self.reported_absence = false;
            }
            (Some(identity), false) => {
                info!("Joystick {} ({}) disconnected", instance, identity.name);
            }
            (None, _) => {}
        }

        was_active
    }

    /// Resolves the active joystick from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`PtzError::AmbiguousJoystick`] when more than one joystick
    /// matches and none is selected yet.
    pub fn resolve(&mut self) -> Result<Selection> {
        if let Some(instance) = self.active {
            return Ok(Selection::Active { instance, fresh: false });
        }

        let candidates: Vec<(InstanceId, &JoystickIdentity)> = self
            .registry
            .iter()
            .filter(|(_, identity)| {
                self.pattern
                    .as_ref()
                    .map_or(true, |pattern| pattern.matches(identity))
            })
            .collect();

        match candidates.as_slice() {
            [] => {
                if !self.reported_absence {
                    match &self.pattern {
                        Some(pattern) => info!(
                            "Waiting for a joystick matching '{}' ({} connected)",
                            pattern.as_str(),
                            self.registry.len()
                        ),
                        None => info!("Waiting for a joystick to be connected"),
                    }
                    self.reported_absence = true;
                }
                Ok(Selection::Waiting)
            }
            [(instance, identity)] => {
                info!("Using joystick {}: {}", instance, identity);
                let instance = *instance;
                self.active = Some(instance);
                self.reported_absence = false;
                Ok(Selection::Active { instance, fresh: true })
            }
            many => {
                let candidates: Vec<String> = many
                    .iter()
                    .map(|(instance, identity)| format!("{} {}", instance, identity))
                    .collect();
                for candidate in &candidates {
                    error!("Candidate joystick: {}", candidate);
                }
                Err(PtzError::AmbiguousJoystick {
                    pattern: self.pattern.as_ref().map(|p| p.as_str().to_string()),
                    candidates,
                })
            }
        }
    }
}
