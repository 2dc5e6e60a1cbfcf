//! Threshold-based anomaly detection

use crate::monitoring::sensors::{Infrastructure, InfrastructureType};
use serde::Serialize;

/// Direction a threshold is crossed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    GreaterThan,
    LessThan,
    /// Reading is neither 0 nor 1
    NotBinary,
}

/// One detection rule
#[derive(Debug, Clone, Serialize)]
pub struct ThresholdRule {
    pub kind: InfrastructureType,
    pub comparison: Comparison,
    pub threshold: f64,
    pub message: &'static str,
}

impl ThresholdRule {
    const fn new(
        kind: InfrastructureType,
        comparison: Comparison,
        threshold: f64,
        message: &'static str,
    ) -> Self {
        Self {
            kind,
            comparison,
            threshold,
            message,
        }
    }

    pub fn triggers(&self, value: f64) -> bool {
        match self.comparison {
            Comparison::GreaterThan => value > self.threshold,
            Comparison::LessThan => value < self.threshold,
            Comparison::NotBinary => value != 0.0 && value != 1.0,
        }
    }
}

/// Built-in rules. Order matters: the first matching rule names the anomaly.
pub const DEFAULT_RULES: [ThresholdRule; 6] = [
    ThresholdRule::new(
        InfrastructureType::Streetlight,
        Comparison::GreaterThan,
        650.0,
        "High voltage detected",
    ),
    ThresholdRule::new(
        InfrastructureType::Streetlight,
        Comparison::LessThan,
        220.0,
        "Low voltage detected",
    ),
    ThresholdRule::new(
        InfrastructureType::TrafficSignal,
        Comparison::NotBinary,
        0.0,
        "Signal malfunction",
    ),
    ThresholdRule::new(
        InfrastructureType::WaterSupply,
        Comparison::GreaterThan,
        110.0,
        "High pressure warning",
    ),
    ThresholdRule::new(
        InfrastructureType::WaterSupply,
        Comparison::LessThan,
        30.0,
        "Low pressure warning",
    ),
    ThresholdRule::new(
        InfrastructureType::WasteBin,
        Comparison::GreaterThan,
        90.0,
        "Bin almost full",
    ),
];

/// Anomaly detector
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    rules: Vec<ThresholdRule>,
}

impl AnomalyDetector {
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES.to_vec(),
        }
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    /// Classify a reading, returning the anomaly message if any
    pub fn check(&self, kind: InfrastructureType, value: f64) -> Option<&'static str> {
        self.rules
            .iter()
            .filter(|rule| rule.kind == kind)
            .find(|rule| rule.triggers(value))
            .map(|rule| rule.message)
    }

    pub fn check_item(&self, item: &Infrastructure) -> Option<&'static str> {
        self.check(item.kind, item.value)
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::sensors::InfrastructureType::*;

    #[test]
    fn test_streetlight_bounds() {
        let detector = AnomalyDetector::new();
        assert_eq!(detector.check(Streetlight, 651.0), Some("High voltage detected"));
        assert_eq!(detector.check(Streetlight, 219.9), Some("Low voltage detected"));
        // strict comparisons
        assert_eq!(detector.check(Streetlight, 650.0), None);
        assert_eq!(detector.check(Streetlight, 220.0), None);
        assert_eq!(detector.check(Streetlight, 400.0), None);
    }

    #[test]
    fn test_traffic_signal_must_be_binary() {
        let detector = AnomalyDetector::new();
        assert_eq!(detector.check(TrafficSignal, 0.0), None);
        assert_eq!(detector.check(TrafficSignal, 1.0), None);
        assert_eq!(detector.check(TrafficSignal, 0.5), Some("Signal malfunction"));
        assert_eq!(detector.check(TrafficSignal, 7.3), Some("Signal malfunction"));
    }

    #[test]
    fn test_water_supply_pressure() {
        let detector = AnomalyDetector::new();
        assert_eq!(detector.check(WaterSupply, 110.5), Some("High pressure warning"));
        assert_eq!(detector.check(WaterSupply, 29.0), Some("Low pressure warning"));
        assert_eq!(detector.check(WaterSupply, 70.0), None);
    }

    #[test]
    fn test_waste_bin_has_no_low_threshold() {
        let detector = AnomalyDetector::new();
        assert_eq!(detector.check(WasteBin, 90.1), Some("Bin almost full"));
        assert_eq!(detector.check(WasteBin, 90.0), None);
        assert_eq!(detector.check(WasteBin, 0.0), None);
    }

    #[test]
    fn test_every_type_has_a_rule() {
        let detector = AnomalyDetector::new();
        assert_eq!(detector.rules().len(), DEFAULT_RULES.len());
        for kind in crate::monitoring::sensors::InfrastructureType::ALL {
            assert!(detector.rules().iter().any(|rule| rule.kind == kind));
        }
    }
}
