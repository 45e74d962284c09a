//! Shared fixtures for integration tests: scripted wire responses.

use floodline::wire::{InfoRecord, ResponseMessage, StationRecord, TrainRecord};

pub fn train_record(id: u8, station_id: Option<u8>, status: &str) -> TrainRecord {
    TrainRecord {
        id,
        station_id,
        track_id: id % 12,
        node_position: if station_id.is_some() { 0.0 } else { 0.4 },
        capacity: 100,
        passengers: 35,
        delayed_rounds: 0,
        direction: "forward".to_string(),
        line_id: id % 4,
        status: status.to_string(),
    }
}

pub fn station_record(id: u8) -> StationRecord {
    StationRecord {
        id,
        x: 100.0 + f64::from(id) * 10.0,
        y: 250.0,
        passengers: 20,
        is_transfer: id % 5 == 0,
        flood_level: 0.0,
        is_failure_point: id == 9,
        elevation: 4.0,
        pump_used: false,
    }
}

/// Full default-topology response: 8 running trains, 16 stations.
pub fn response(score: f64, round: u32) -> ResponseMessage {
    ResponseMessage {
        trains: (0..8).map(|id| train_record(id, None, "running")).collect(),
        stations: (0..16).map(station_record).collect(),
        score,
        info: InfoRecord { round },
    }
}

/// Tiny 2-train/3-station response for tests that expand the joint space.
pub fn tiny_response(score: f64, round: u32) -> ResponseMessage {
    ResponseMessage {
        trains: vec![
            train_record(0, Some(1), "stopped"),
            train_record(1, None, "running"),
        ],
        stations: (0..3).map(station_record).collect(),
        score,
        info: InfoRecord { round },
    }
}

pub fn encode(response: &ResponseMessage) -> Vec<u8> {
    rmp_serde::to_vec_named(response).expect("fixture encodes")
}
