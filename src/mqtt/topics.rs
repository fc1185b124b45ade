//! Topic routing for a single Smartbike.
//!
//! Every channel the bike exposes lives under `bike/<device-id>/...`. The
//! [`TopicRegistry`] resolves all of them once at startup; afterwards it is
//! shared read-only between the dispatcher and the feedback subscriber.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether the console writes to a channel or only listens on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Write,
    Read,
}

/// Logical role of a channel, independent of which bike it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    InclineControl,
    ResistanceControl,
    FanControl,
    WorkoutSelector,
    InclineReport,
    ResistanceReport,
    Speed,
    Cadence,
    Power,
    ButtonReport,
}

impl Role {
    pub const ALL: [Role; 10] = [
        Role::InclineControl,
        Role::ResistanceControl,
        Role::FanControl,
        Role::WorkoutSelector,
        Role::InclineReport,
        Role::ResistanceReport,
        Role::Speed,
        Role::Cadence,
        Role::Power,
        Role::ButtonReport,
    ];

    pub fn direction(self) -> Direction {
        match self {
            Role::InclineControl
            | Role::ResistanceControl
            | Role::FanControl
            | Role::WorkoutSelector => Direction::Write,
            _ => Direction::Read,
        }
    }

    /// Path below `bike/<device-id>/`.
    ///
    /// The incline report shares its path with the incline control channel;
    /// the firmware has always been addressed this way.
    fn suffix(self) -> &'static str {
        match self {
            Role::InclineControl => "incline/control",
            Role::ResistanceControl => "resistance/control",
            Role::FanControl => "fan/control",
            Role::WorkoutSelector => "workout",
            Role::InclineReport => "incline/control",
            Role::ResistanceReport => "resistance/report",
            Role::Speed => "speed",
            Role::Cadence => "cadence",
            Role::Power => "power",
            Role::ButtonReport => "button/report",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::InclineControl => "incline-control",
            Role::ResistanceControl => "resistance-control",
            Role::FanControl => "fan-control",
            Role::WorkoutSelector => "workout-selector",
            Role::InclineReport => "incline-report",
            Role::ResistanceReport => "resistance-report",
            Role::Speed => "speed",
            Role::Cadence => "cadence",
            Role::Power => "power",
            Role::ButtonReport => "button-report",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown channel role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.name() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// A channel resolved for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub role: Role,
    pub direction: Direction,
    pub routed_name: String,
}

/// Resolves the routed name of a role for a given device identifier.
///
/// The identifier is used verbatim, so malformed identifiers simply produce
/// the literal concatenation.
pub fn route(device_id: &str, role: Role) -> String {
    format!("bike/{}/{}", device_id, role.suffix())
}

/// All channels of one bike, resolved once.
#[derive(Debug, Clone)]
pub struct TopicRegistry {
    device_id: String,
    channels: Vec<Channel>,
}

impl TopicRegistry {
    pub fn new(device_id: impl Into<String>) -> Self {
        let device_id = device_id.into();
        let channels = Role::ALL
            .into_iter()
            .map(|role| Channel {
                role,
                direction: role.direction(),
                routed_name: route(&device_id, role),
            })
            .collect();

        TopicRegistry {
            device_id,
            channels,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn channel(&self, role: Role) -> &Channel {
        // `channels` is built from `Role::ALL` in declaration order
        &self.channels[role as usize]
    }

    pub fn routed_name(&self, role: Role) -> &str {
        &self.channel(role).routed_name
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }
}
