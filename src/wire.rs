//! Wire-level message records exchanged with the simulator.
//!
//! Field names and shapes follow the simulator's payloads verbatim
//! (camelCase keys, nullable stationId). Decoding produces a fresh
//! [`WorldState`] and validates roster lengths against the topology.

use serde::{Deserialize, Serialize};

use crate::{
    actions::JointAction,
    error::{Error, Result},
    world::{
        Direction, LineId, Station, StationId, Topology, TrackId, Train, TrainId, TrainLocation,
        TrainStatus, WorldState,
    },
};

/// One command record of a reset or step message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub train_id: u8,
    pub action_type: String,
}

/// The reset directive: a single-element sequence addressed to train 0.
pub fn reset_message() -> Vec<ActionRecord> {
    vec![ActionRecord {
        train_id: 0,
        action_type: "reset".to_string(),
    }]
}

/// A joint action as the simulator expects it: one record per train, in
/// train-id order.
pub fn step_message(action: &JointAction) -> Vec<ActionRecord> {
    action
        .commands()
        .iter()
        .map(|command| ActionRecord {
            train_id: command.train.0,
            action_type: command.kind.as_str().to_string(),
        })
        .collect()
}

/// Per-train record of a response frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainRecord {
    pub id: u8,
    pub station_id: Option<u8>,
    pub track_id: u8,
    pub node_position: f64,
    pub capacity: u32,
    pub passengers: u32,
    pub delayed_rounds: u32,
    pub direction: String,
    pub line_id: u8,
    pub status: String,
}

/// Per-station record of a response frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationRecord {
    pub id: u8,
    pub x: f64,
    pub y: f64,
    pub passengers: u32,
    pub is_transfer: bool,
    pub flood_level: f64,
    pub is_failure_point: bool,
    pub elevation: f64,
    pub pump_used: bool,
}

/// Round metadata of a response frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoRecord {
    pub round: u32,
}

/// A full reset/step response frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub trains: Vec<TrainRecord>,
    pub stations: Vec<StationRecord>,
    pub score: f64,
    pub info: InfoRecord,
}

impl TrainRecord {
    fn into_train(self) -> Result<Train> {
        let direction = match self.direction.as_str() {
            "forward" => Direction::Forward,
            "backward" => Direction::Backward,
            other => {
                return Err(Error::InvalidDirection {
                    train: self.id,
                    value: other.to_string(),
                });
            }
        };
        // Statuses outside the documented set degrade to Unknown; the
        // legal-action table then only permits monitoring.
        let status = match self.status.as_str() {
            "running" => TrainStatus::Running,
            "stopped" => TrainStatus::Stopped,
            "trapped" => TrainStatus::Trapped,
            _ => TrainStatus::Unknown,
        };
        let location = match self.station_id {
            Some(station) => TrainLocation::AtStation {
                station: StationId(station),
                track: TrackId(self.track_id),
            },
            None => TrainLocation::OnTrack {
                track: TrackId(self.track_id),
                position: self.node_position,
            },
        };
        Ok(Train {
            id: TrainId(self.id),
            location,
            passengers: self.passengers,
            capacity: self.capacity,
            delayed_rounds: self.delayed_rounds,
            direction,
            line: LineId(self.line_id),
            status,
        })
    }
}

impl From<StationRecord> for Station {
    fn from(record: StationRecord) -> Self {
        Station {
            id: StationId(record.id),
            x: record.x,
            y: record.y,
            passengers: record.passengers,
            is_transfer: record.is_transfer,
            flood_level: record.flood_level,
            is_failure_point: record.is_failure_point,
            elevation: record.elevation,
            pump_used: record.pump_used,
        }
    }
}

impl ResponseMessage {
    /// Convert a decoded response into a world-state snapshot.
    ///
    /// # Errors
    ///
    /// Fails when roster lengths disagree with the topology or a train
    /// record carries an undocumented direction.
    pub fn into_state(self, topology: &Topology) -> Result<WorldState> {
        if self.trains.len() != topology.trains {
            return Err(Error::RosterMismatch {
                roster: "train",
                expected: topology.trains,
                got: self.trains.len(),
            });
        }
        if self.stations.len() != topology.stations {
            return Err(Error::RosterMismatch {
                roster: "station",
                expected: topology.stations,
                got: self.stations.len(),
            });
        }

        let trains = self
            .trains
            .into_iter()
            .map(TrainRecord::into_train)
            .collect::<Result<Vec<_>>>()?;
        let stations = self.stations.into_iter().map(Station::from).collect();

        Ok(WorldState {
            round: self.info.round,
            score: self.score,
            trains,
            stations,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;

    pub fn train_record(id: u8, station_id: Option<u8>, status: &str) -> TrainRecord {
        TrainRecord {
            id,
            station_id,
            track_id: id % 12,
            node_position: 0.25,
            capacity: 100,
            passengers: 50,
            delayed_rounds: 0,
            direction: "forward".to_string(),
            line_id: id % 4,
            status: status.to_string(),
        }
    }

    pub fn station_record(id: u8) -> StationRecord {
        StationRecord {
            id,
            x: 100.0,
            y: 200.0,
            passengers: 30,
            is_transfer: false,
            flood_level: 0.0,
            is_failure_point: false,
            elevation: 5.0,
            pump_used: false,
        }
    }

    /// A default-topology response with every train running on a track.
    pub fn response(score: f64, round: u32) -> ResponseMessage {
        ResponseMessage {
            trains: (0..8).map(|id| train_record(id, None, "running")).collect(),
            stations: (0..16).map(station_record).collect(),
            score,
            info: InfoRecord { round },
        }
    }
}
