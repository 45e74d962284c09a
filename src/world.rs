//! World-state model: trains, stations, and the per-round snapshot.
//!
//! A [`WorldState`] is built fresh from every channel response and never
//! mutated in place; the session loop holds the current snapshot plus the
//! immediately preceding one for the reward delta.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a train in the fixed roster.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TrainId(pub u8);

/// Identifier of a station in the fixed roster.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct StationId(pub u8);

/// Identifier of a track segment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TrackId(pub u8);

/// Identifier of a metro line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LineId(pub u8);

macro_rules! impl_id_display {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl $ty {
                /// Index form for use with roster-ordered sequences.
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

impl_id_display!(TrainId, StationId, TrackId, LineId);

/// Fixed roster sizes of the simulated network.
///
/// Encoded vector length and action-space shape depend only on these counts,
/// never on the content of a particular round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub trains: usize,
    pub stations: usize,
    pub tracks: usize,
    pub lines: usize,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            trains: 8,
            stations: 16,
            tracks: 12,
            lines: 4,
        }
    }
}

/// Where a train currently is.
///
/// `AtStation` only while the train is docked; evacuation is legal exactly
/// in that case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TrainLocation {
    AtStation { station: StationId, track: TrackId },
    OnTrack { track: TrackId, position: f64 },
}

impl TrainLocation {
    /// Station the train is docked at, if any.
    pub fn station(&self) -> Option<StationId> {
        match self {
            TrainLocation::AtStation { station, .. } => Some(*station),
            TrainLocation::OnTrack { .. } => None,
        }
    }

    /// Track the train occupies (docked trains sit on the station's track).
    pub fn track(&self) -> TrackId {
        match self {
            TrainLocation::AtStation { track, .. } => *track,
            TrainLocation::OnTrack { track, .. } => *track,
        }
    }

    /// Normalized position along the track; 0.0 while docked.
    pub fn position(&self) -> f64 {
        match self {
            TrainLocation::AtStation { .. } => 0.0,
            TrainLocation::OnTrack { position, .. } => *position,
        }
    }
}

/// Running direction of a train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }
}

/// Operational status of a train.
///
/// `Unknown` covers status strings outside the documented set; such trains
/// may only be monitored (plus evacuated while docked).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainStatus {
    Running,
    Stopped,
    Trapped,
    Unknown,
}

impl TrainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainStatus::Running => "running",
            TrainStatus::Stopped => "stopped",
            TrainStatus::Trapped => "trapped",
            TrainStatus::Unknown => "unknown",
        }
    }
}

/// One train of the fixed roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    pub id: TrainId,
    pub location: TrainLocation,
    pub passengers: u32,
    pub capacity: u32,
    pub delayed_rounds: u32,
    pub direction: Direction,
    pub line: LineId,
    pub status: TrainStatus,
}

impl Train {
    /// Whether the train is currently docked at a station.
    pub fn is_docked(&self) -> bool {
        matches!(self.location, TrainLocation::AtStation { .. })
    }
}

/// One station of the fixed roster. Read-only from the client's perspective;
/// flooding and pump state evolve simulator-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub x: f64,
    pub y: f64,
    pub passengers: u32,
    pub is_transfer: bool,
    pub flood_level: f64,
    pub is_failure_point: bool,
    pub elevation: f64,
    pub pump_used: bool,
}

/// Typed snapshot of one simulation round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub round: u32,
    pub score: f64,
    pub trains: Vec<Train>,
    pub stations: Vec<Station>,
}

impl WorldState {
    /// Topology implied by the roster lengths; line/track counts fall back
    /// to the defaults since responses do not carry them.
    pub fn topology(&self) -> Topology {
        Topology {
            trains: self.trains.len(),
            stations: self.stations.len(),
            ..Topology::default()
        }
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;

    /// A running train out on a track, tests override what they need.
    pub fn running_train(id: u8) -> Train {
        Train {
            id: TrainId(id),
            location: TrainLocation::OnTrack {
                track: TrackId(id % 12),
                position: 0.25,
            },
            passengers: 40,
            capacity: 100,
            delayed_rounds: 0,
            direction: Direction::Forward,
            line: LineId(id % 4),
            status: TrainStatus::Running,
        }
    }

    pub fn docked_train(id: u8, station: u8, status: TrainStatus) -> Train {
        Train {
            id: TrainId(id),
            location: TrainLocation::AtStation {
                station: StationId(station),
                track: TrackId(id % 12),
            },
            status,
            ..running_train(id)
        }
    }

    pub fn station(id: u8) -> Station {
        Station {
            id: StationId(id),
            x: 100.0 + f64::from(id),
            y: 200.0,
            passengers: 30,
            is_transfer: id % 4 == 0,
            flood_level: 0.0,
            is_failure_point: false,
            elevation: 5.0,
            pump_used: false,
        }
    }

    /// Default-topology snapshot with all trains running on tracks.
    pub fn world(score: f64, round: u32) -> WorldState {
        WorldState {
            round,
            score,
            trains: (0..8).map(running_train).collect(),
            stations: (0..16).map(station).collect(),
        }
    }
}
