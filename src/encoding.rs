//! State encoders: symbolic attribute mappings and dense feature vectors.
//!
//! Both forms are derived from the same [`WorldState`] without mutating it.
//! The symbolic form feeds the instance-based cognitive agent; the dense
//! form feeds the value-network agent. Dense vector length is a function of
//! the topology alone, never of round content.

use std::{
    collections::BTreeMap,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

use crate::{
    actions::JointAction,
    world::{StationId, Topology, TrainId, WorldState},
};

/// Named per-train attribute of the symbolic encoding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TrainAttribute {
    Station,
    Track,
    NodePosition,
    Passengers,
    DelayedRounds,
    Direction,
    Status,
}

/// Named per-station attribute of the symbolic encoding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum StationAttribute {
    IsTransfer,
    FloodLevel,
    IsFailurePoint,
    Elevation,
    PumpUsed,
}

/// Structural attribute key: roster index plus attribute name, replacing
/// the string-suffixed key scheme of flat attribute tables.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AttributeKey {
    Train(TrainId, TrainAttribute),
    Station(StationId, StationAttribute),
}

/// Attribute value of the symbolic encoding.
///
/// Floats compare and hash by bit pattern so attribute maps can key an
/// instance memory; encoders never produce NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Eq for AttributeValue {}

impl Hash for AttributeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            AttributeValue::Null => 0u8.hash(state),
            AttributeValue::Bool(b) => (1u8, b).hash(state),
            AttributeValue::Int(i) => (2u8, i).hash(state),
            AttributeValue::Float(f) => (3u8, f.to_bits()).hash(state),
            AttributeValue::Text(s) => (4u8, s).hash(state),
        }
    }
}

/// Symbolic attribute mapping of one world state: 7 attributes per train,
/// 5 per station. Mapping semantics; key order carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateAttributes(BTreeMap<AttributeKey, AttributeValue>);

impl StateAttributes {
    /// Encode a world state into its symbolic attribute mapping.
    pub fn from_state(state: &WorldState) -> Self {
        let mut map = BTreeMap::new();

        for train in &state.trains {
            let id = train.id;
            let station = match train.location.station() {
                Some(s) => AttributeValue::Text(s.to_string()),
                None => AttributeValue::Null,
            };
            map.insert(AttributeKey::Train(id, TrainAttribute::Station), station);
            map.insert(
                AttributeKey::Train(id, TrainAttribute::Track),
                AttributeValue::Int(i64::from(train.location.track().0)),
            );
            map.insert(
                AttributeKey::Train(id, TrainAttribute::NodePosition),
                AttributeValue::Float(train.location.position()),
            );
            map.insert(
                AttributeKey::Train(id, TrainAttribute::Passengers),
                AttributeValue::Int(i64::from(train.passengers)),
            );
            map.insert(
                AttributeKey::Train(id, TrainAttribute::DelayedRounds),
                AttributeValue::Int(i64::from(train.delayed_rounds)),
            );
            map.insert(
                AttributeKey::Train(id, TrainAttribute::Direction),
                AttributeValue::Text(train.direction.as_str().to_string()),
            );
            map.insert(
                AttributeKey::Train(id, TrainAttribute::Status),
                AttributeValue::Text(train.status.as_str().to_string()),
            );
        }

        for station in &state.stations {
            let id = station.id;
            map.insert(
                AttributeKey::Station(id, StationAttribute::IsTransfer),
                AttributeValue::Bool(station.is_transfer),
            );
            map.insert(
                AttributeKey::Station(id, StationAttribute::FloodLevel),
                AttributeValue::Float(station.flood_level),
            );
            map.insert(
                AttributeKey::Station(id, StationAttribute::IsFailurePoint),
                AttributeValue::Bool(station.is_failure_point),
            );
            map.insert(
                AttributeKey::Station(id, StationAttribute::Elevation),
                AttributeValue::Float(station.elevation),
            );
            map.insert(
                AttributeKey::Station(id, StationAttribute::PumpUsed),
                AttributeValue::Bool(station.pump_used),
            );
        }

        StateAttributes(map)
    }

    pub fn get(&self, key: &AttributeKey) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Hash for StateAttributes {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // BTreeMap iterates in key order, so equal maps hash equally.
        for (key, value) in &self.0 {
            key.hash(state);
            value.hash(state);
        }
    }
}

/// A candidate joint action together with the state it was offered in; the
/// retrieval key of the instance-based agent's memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChoiceSignature {
    pub action: JointAction,
    pub attributes: StateAttributes,
}

/// Features per train in the dense encoding, given a topology.
fn train_feature_len(topology: &Topology) -> usize {
    // one-hot id + one-hot station-or-none + one-hot track
    // + position/capacity/passengers/delayed + direction bit
    // + one-hot line + 3-way status
    topology.trains + (topology.stations + 1) + topology.tracks + 4 + 1 + topology.lines + 3
}

/// Features per station in the dense encoding, given a topology.
fn station_feature_len(topology: &Topology) -> usize {
    // one-hot id + x/y/passengers + transfer/failure/pump bits
    // + flood/elevation scalars
    topology.stations + 8
}

/// Length of the dense state vector for a topology; constant across all
/// rounds of a run.
pub fn dense_len(topology: &Topology) -> usize {
    topology.trains * train_feature_len(topology)
        + topology.stations * station_feature_len(topology)
}

fn push_one_hot(vector: &mut Vec<f64>, width: usize, hot: Option<usize>) {
    for i in 0..width {
        vector.push(if Some(i) == hot { 1.0 } else { 0.0 });
    }
}

/// Encode a world state into its fixed-length dense feature vector.
pub fn encode_dense(state: &WorldState, topology: &Topology) -> Vec<f64> {
    let mut vector = Vec::with_capacity(dense_len(topology));

    for train in &state.trains {
        push_one_hot(&mut vector, topology.trains, Some(train.id.index()));

        // Station one-hot with a trailing "not docked" slot.
        let station = train.location.station().map(StationId::index);
        push_one_hot(&mut vector, topology.stations, station);
        vector.push(if station.is_none() { 1.0 } else { 0.0 });

        push_one_hot(
            &mut vector,
            topology.tracks,
            Some(train.location.track().index()),
        );

        vector.push(train.location.position());
        vector.push(f64::from(train.capacity));
        vector.push(f64::from(train.passengers));
        vector.push(f64::from(train.delayed_rounds));
        vector.push(match train.direction {
            crate::world::Direction::Forward => 1.0,
            crate::world::Direction::Backward => 0.0,
        });
        push_one_hot(&mut vector, topology.lines, Some(train.line.index()));

        // 3-way status indicator; unknown statuses encode as all zeros.
        use crate::world::TrainStatus::*;
        for status in [Running, Stopped, Trapped] {
            vector.push(if train.status == status { 1.0 } else { 0.0 });
        }
    }

    for station in &state.stations {
        push_one_hot(&mut vector, topology.stations, Some(station.id.index()));
        vector.push(station.x);
        vector.push(station.y);
        vector.push(f64::from(station.passengers));
        vector.push(if station.is_transfer { 1.0 } else { 0.0 });
        vector.push(station.flood_level);
        vector.push(if station.is_failure_point { 1.0 } else { 0.0 });
        vector.push(station.elevation);
        vector.push(if station.pump_used { 1.0 } else { 0.0 });
    }

    debug_assert_eq!(vector.len(), dense_len(topology));
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{TrainStatus, test_fixtures};

    #[test]
    fn symbolic_mapping_has_seven_per_train_and_five_per_station() {
        let world = test_fixtures::world(0.0, 0);
        let attributes = StateAttributes::from_state(&world);
        assert_eq!(attributes.len(), 7 * 8 + 5 * 16);
    }

    #[test]
    fn symbolic_station_is_string_or_null() {
        let mut world = test_fixtures::world(0.0, 0);
        world.trains[0] = test_fixtures::docked_train(0, 3, TrainStatus::Stopped);
        let attributes = StateAttributes::from_state(&world);

        assert_eq!(
            attributes.get(&AttributeKey::Train(TrainId(0), TrainAttribute::Station)),
            Some(&AttributeValue::Text("3".to_string()))
        );
        assert_eq!(
            attributes.get(&AttributeKey::Train(TrainId(1), TrainAttribute::Station)),
            Some(&AttributeValue::Null)
        );
    }

    #[test]
    fn equal_states_produce_equal_signatures() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let a = StateAttributes::from_state(&test_fixtures::world(10.0, 1));
        let b = StateAttributes::from_state(&test_fixtures::world(10.0, 1));
        assert_eq!(a, b);

        let mut ha = DefaultHasher::new();
        let mut hb = DefaultHasher::new();
        a.hash(&mut ha);
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }

    #[test]
    fn dense_length_depends_only_on_topology() {
        let topology = Topology::default();

        let a = test_fixtures::world(1600.0, 1);
        let mut b = test_fixtures::world(-40.0, 99);
        for station in &mut b.stations {
            station.flood_level = 12.5;
        }
        b.trains[4] = test_fixtures::docked_train(4, 7, TrainStatus::Trapped);

        let va = encode_dense(&a, &topology);
        let vb = encode_dense(&b, &topology);
        assert_eq!(va.len(), vb.len());
        assert_eq!(va.len(), dense_len(&topology));
    }

    #[test]
    fn dense_length_matches_default_layout() {
        // 8*(8 + 17 + 12 + 4 + 1 + 4 + 3) + 16*(16 + 8)
        assert_eq!(dense_len(&Topology::default()), 8 * 49 + 16 * 24);
    }

    #[test]
    fn docked_train_sets_station_slot_not_none_slot() {
        let topology = Topology::default();
        let mut world = test_fixtures::world(0.0, 0);
        world.trains[0] = test_fixtures::docked_train(0, 3, TrainStatus::Stopped);
        let vector = encode_dense(&world, &topology);

        // Train 0 block: id one-hot (8), then station one-hot (16) + none.
        let station_block = &vector[8..8 + 17];
        assert_eq!(station_block[3], 1.0);
        assert_eq!(station_block[16], 0.0);
        assert_eq!(station_block.iter().sum::<f64>(), 1.0);

        // Train 1 is on a track: the none slot is set.
        let next_block = &vector[49 + 8..49 + 8 + 17];
        assert_eq!(next_block[16], 1.0);
    }

    #[test]
    fn status_indicator_is_three_way_one_hot() {
        let topology = Topology::default();
        let mut world = test_fixtures::world(0.0, 0);
        world.trains[0].status = TrainStatus::Unknown;
        let vector = encode_dense(&world, &topology);

        // Status indicator is the last 3 entries of the train block.
        let status = &vector[49 - 3..49];
        assert_eq!(status, &[0.0, 0.0, 0.0]);

        let running = &vector[2 * 49 - 3..2 * 49];
        assert_eq!(running, &[1.0, 0.0, 0.0]);
    }
}
