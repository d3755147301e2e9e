//! Adaptation Engine
//!
//! Maps each scored feature to a recommended action through a small rule
//! table keyed by risk tier. A feature gets its tier's recommendation only
//! when its exposure index reaches the rule's threshold; otherwise, or when
//! the tier has no rule, it gets [`FALLBACK_RECOMMENDATION`].
//!
//! Thresholds are compared against the raw exposure index. The default
//! thresholds (0.2 to 0.5) look calibrated for a `[0, 1]` index, while the
//! scorer keeps input units, so unnormalized inputs such as population
//! density clear every threshold.

use serde::{Deserialize, Serialize};

use super::classify::RiskLevel;
use super::scored::ScoredLayer;

/// Recommendation for features below their tier's threshold
pub const FALLBACK_RECOMMENDATION: &str = "Monitor conditions";

/// One row of the rule table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationRule {
    pub risk_level: RiskLevel,
    pub exposure_threshold: f64,
    pub recommendation: String,
}

impl AdaptationRule {
    pub fn new(risk_level: RiskLevel, exposure_threshold: f64, recommendation: &str) -> Self {
        Self {
            risk_level,
            exposure_threshold,
            recommendation: recommendation.to_string(),
        }
    }
}

/// The built-in rule table
pub fn default_rules() -> Vec<AdaptationRule> {
    vec![
        AdaptationRule::new(RiskLevel::Low, 0.2, "Prepare community bulletins"),
        AdaptationRule::new(RiskLevel::Medium, 0.4, "Activate evacuation shelters"),
        AdaptationRule::new(RiskLevel::High, 0.5, "Issue evacuation order"),
    ]
}

/// Rule-based recommendation generator
///
/// The table is fixed at construction and only read afterwards, so one
/// engine can serve concurrent callers without locking.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptationEngine {
    rules: [Option<AdaptationRule>; 3],
}

impl AdaptationEngine {
    /// Build the table; a later rule for the same tier replaces an earlier one
    pub fn new<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = AdaptationRule>,
    {
        let mut table: [Option<AdaptationRule>; 3] = [None, None, None];
        for rule in rules {
            let slot = rule.risk_level.index();
            table[slot] = Some(rule);
        }
        Self { rules: table }
    }

    pub fn rule(&self, level: RiskLevel) -> Option<&AdaptationRule> {
        self.rules[level.index()].as_ref()
    }

    /// Rules in tier order
    pub fn rules(&self) -> impl Iterator<Item = &AdaptationRule> {
        self.rules.iter().flatten()
    }

    /// Decision for a single feature
    pub fn recommend(&self, level: RiskLevel, exposure: f64) -> &str {
        match self.rule(level) {
            Some(rule) if exposure >= rule.exposure_threshold => &rule.recommendation,
            _ => FALLBACK_RECOMMENDATION,
        }
    }

    /// Copy of `risk_map` with a `recommendation` per feature
    pub fn generate(&self, risk_map: &ScoredLayer) -> ScoredLayer {
        let recommendations = risk_map
            .levels()
            .iter()
            .zip(risk_map.exposure())
            .map(|(level, exposure)| self.recommend(*level, *exposure).to_string())
            .collect();
        risk_map.with_recommendations(recommendations)
    }
}

impl Default for AdaptationEngine {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(RiskLevel::Low, 0.2, "Prepare community bulletins" ; "low at threshold")]
    #[test_case(RiskLevel::Low, 0.19, FALLBACK_RECOMMENDATION ; "low below threshold")]
    #[test_case(RiskLevel::Medium, 0.4, "Activate evacuation shelters" ; "medium at threshold")]
    #[test_case(RiskLevel::Medium, 0.3, FALLBACK_RECOMMENDATION ; "medium below threshold")]
    #[test_case(RiskLevel::High, 0.9, "Issue evacuation order" ; "high above threshold")]
    #[test_case(RiskLevel::High, 0.49, FALLBACK_RECOMMENDATION ; "high below threshold")]
    #[test_case(RiskLevel::Low, 100.0, "Prepare community bulletins" ; "raw units clear threshold")]
    fn test_default_rules(level: RiskLevel, exposure: f64, expected: &str) {
        assert_eq!(AdaptationEngine::default().recommend(level, exposure), expected);
    }

    #[test]
    fn test_last_rule_wins() {
        let engine = AdaptationEngine::new(vec![
            AdaptationRule::new(RiskLevel::High, 0.5, "first"),
            AdaptationRule::new(RiskLevel::High, 0.7, "second"),
        ]);
        assert_eq!(engine.rule(RiskLevel::High).unwrap().recommendation, "second");
        assert_eq!(engine.recommend(RiskLevel::High, 0.6), FALLBACK_RECOMMENDATION);
        assert_eq!(engine.rules().count(), 1);
    }

    #[test]
    fn test_missing_tier_falls_back() {
        let engine = AdaptationEngine::new(vec![AdaptationRule::new(RiskLevel::High, 0.0, "evacuate")]);
        assert_eq!(engine.recommend(RiskLevel::Low, 10.0), FALLBACK_RECOMMENDATION);
    }

    #[test]
    fn test_rules_deserialize_from_json() {
        let rules: Vec<AdaptationRule> = serde_json::from_str(
            r#"[{"risk_level": "medium", "exposure_threshold": 0.1, "recommendation": "Sandbag"}]"#,
        )
        .unwrap();
        assert_eq!(rules[0], AdaptationRule::new(RiskLevel::Medium, 0.1, "Sandbag"));
    }
}
