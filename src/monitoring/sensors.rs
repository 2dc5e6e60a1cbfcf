//! Infrastructure sensor model and seed data

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of city infrastructure a sensor watches
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InfrastructureType {
    /// Lamp output in lumens
    Streetlight,
    /// Signal state, 0 or 1
    TrafficSignal,
    /// Line pressure in PSI
    WaterSupply,
    /// Fill level in percent
    WasteBin,
}

impl InfrastructureType {
    pub const ALL: [InfrastructureType; 4] = [
        Self::Streetlight,
        Self::TrafficSignal,
        Self::WaterSupply,
        Self::WasteBin,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Streetlight => "streetlight",
            Self::TrafficSignal => "traffic_signal",
            Self::WaterSupply => "water_supply",
            Self::WasteBin => "waste_bin",
        }
    }

    /// Unit of the reading
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Streetlight => "lumens",
            Self::TrafficSignal => "state",
            Self::WaterSupply => "PSI",
            Self::WasteBin => "%",
        }
    }

    /// Name suffix, e.g. `TRAFFIC SIGNAL`
    pub fn display_label(&self) -> String {
        self.as_str().replace('_', " ").to_uppercase()
    }

    /// Draw a plausible first reading
    pub fn initial_value<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Self::Streetlight => rng.gen_range(200..700) as f64,
            Self::TrafficSignal => {
                if rng.gen_bool(0.5) {
                    1.0
                } else {
                    0.0
                }
            }
            Self::WaterSupply => rng.gen_range(20..120) as f64,
            Self::WasteBin => rng.gen_range(0..100) as f64,
        }
    }
}

impl fmt::Display for InfrastructureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health classification shown on the dashboard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Healthy
    Green,
    /// Under maintenance
    Yellow,
    /// Anomaly detected
    Red,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
}

/// One monitored piece of infrastructure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Infrastructure {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InfrastructureType,
    pub name: String,
    pub location: Location,
    pub value: f64,
    pub status: HealthStatus,
    pub last_updated: DateTime<Utc>,
    pub anomaly: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_scheduled: Option<DateTime<Utc>>,
}

impl Infrastructure {
    pub fn new(kind: InfrastructureType, location: Location, value: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: format!("{} {}", location.name, kind.display_label()),
            kind,
            location,
            value,
            status: HealthStatus::Green,
            last_updated: Utc::now(),
            anomaly: None,
            maintenance_scheduled: None,
        }
    }
}

/// Landmarks the demo city places sensors at
pub const LANDMARKS: [(f64, f64, &str); 8] = [
    (40.7128, -74.0060, "Times Square"),
    (40.7580, -73.9855, "Central Park"),
    (40.7505, -73.9934, "Penn Station"),
    (40.7549, -73.9840, "Grand Central"),
    (40.7614, -73.9776, "Rockefeller Center"),
    (40.7061, -74.0088, "Wall Street"),
    (40.6892, -74.0445, "Statue of Liberty"),
    (40.7831, -73.9712, "Upper East Side"),
];

/// Anomaly text carried by items that start out red
pub const SEED_ANOMALY: &str = "High voltage detected";

/// Fabricate the starting item list, one sensor per landmark.
///
/// Types are dealt round-robin. Roughly 10% of items start red and a
/// further share starts yellow, so the dashboard has something to show
/// before the first tick.
pub fn seed_city<R: Rng + ?Sized>(rng: &mut R) -> Vec<Infrastructure> {
    LANDMARKS
        .iter()
        .enumerate()
        .map(|(index, &(lat, lng, name))| {
            let kind = InfrastructureType::ALL[index % InfrastructureType::ALL.len()];
            let value = kind.initial_value(rng);
            let location = Location {
                lat,
                lng,
                name: name.to_string(),
            };
            let mut item = Infrastructure::new(kind, location, value);

            item.status = if rng.gen_bool(0.1) {
                HealthStatus::Red
            } else if rng.gen_bool(0.3) {
                HealthStatus::Yellow
            } else {
                HealthStatus::Green
            };
            if item.status == HealthStatus::Red {
                item.anomaly = Some(SEED_ANOMALY.to_string());
            }
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_seed_assigns_types_round_robin() {
        let mut rng = StdRng::seed_from_u64(1);
        let city = seed_city(&mut rng);

        assert_eq!(city.len(), LANDMARKS.len());
        assert_eq!(city[0].kind, InfrastructureType::Streetlight);
        assert_eq!(city[1].kind, InfrastructureType::TrafficSignal);
        assert_eq!(city[2].kind, InfrastructureType::WaterSupply);
        assert_eq!(city[3].kind, InfrastructureType::WasteBin);
        assert_eq!(city[4].kind, InfrastructureType::Streetlight);
        assert_eq!(city[1].name, "Central Park TRAFFIC SIGNAL");
    }

    #[test]
    fn test_seed_values_within_type_ranges() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            for item in seed_city(&mut rng) {
                let v = item.value;
                match item.kind {
                    InfrastructureType::Streetlight => assert!((200.0..700.0).contains(&v)),
                    InfrastructureType::TrafficSignal => assert!(v == 0.0 || v == 1.0),
                    InfrastructureType::WaterSupply => assert!((20.0..120.0).contains(&v)),
                    InfrastructureType::WasteBin => assert!((0.0..100.0).contains(&v)),
                }
                assert_eq!(
                    item.anomaly.is_some(),
                    item.status == HealthStatus::Red,
                    "only red seed items carry an anomaly"
                );
            }
        }
    }

    #[test]
    fn test_wire_format() {
        let location = Location {
            lat: 1.0,
            lng: 2.0,
            name: "Somewhere".to_string(),
        };
        let item = Infrastructure::new(InfrastructureType::WaterSupply, location, 50.0);
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["type"], "water_supply");
        assert_eq!(json["status"], "green");
        assert!(json["lastUpdated"].is_string());
        assert!(json["anomaly"].is_null());
        assert!(json.get("maintenanceScheduled").is_none());
    }

    #[test]
    fn test_units_and_labels() {
        assert_eq!(InfrastructureType::WaterSupply.unit(), "PSI");
        assert_eq!(InfrastructureType::WasteBin.unit(), "%");
        assert_eq!(InfrastructureType::WasteBin.display_label(), "WASTE BIN");
    }
}
