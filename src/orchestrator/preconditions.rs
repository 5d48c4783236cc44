//! Checks run before any backend call is made.

use thiserror::Error;

use crate::network::network_graph::GraphStore;
use crate::network::results::Weights;

/// Largest batch the backend accepts in one run-tests call.
pub const MAX_TESTS: u32 = 20;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Generate a network first")]
    NoGraph,
    #[error("Weights must sum to 1.0 (currently {0:.2})")]
    WeightsNotNormalized(f64),
}

pub fn require_graph(store: &GraphStore) -> Result<(), ValidationError> {
    if store.is_loaded() {
        Ok(())
    } else {
        Err(ValidationError::NoGraph)
    }
}

pub fn validate_weights(weights: &Weights) -> Result<(), ValidationError> {
    if weights.is_normalized() {
        Ok(())
    } else {
        Err(ValidationError::WeightsNotNormalized(weights.sum()))
    }
}

/// Caps the batch size; larger requests are silently reduced. `max` never
/// lifts the cap above [`MAX_TESTS`].
pub fn clamp_test_count(requested: u32, max: u32) -> u32 {
    requested.min(max.min(MAX_TESTS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::results::WEIGHT_SUM_TOLERANCE;

    #[test]
    fn test_weights_within_tolerance() {
        assert!(validate_weights(&Weights::new(0.5, 0.3, 0.2)).is_ok());
        assert!(validate_weights(&Weights::default()).is_ok());
        assert!(validate_weights(&Weights::new(0.5, 0.3, 0.205)).is_ok());
        let err = validate_weights(&Weights::new(0.5, 0.3, 0.3)).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::WeightsNotNormalized(sum) if (sum - 1.1).abs() < 1e-9
        ));
        assert_eq!(err.to_string(), "Weights must sum to 1.0 (currently 1.10)");
        assert!(WEIGHT_SUM_TOLERANCE > 0.0);
    }

    #[test]
    fn test_clamp_test_count() {
        assert_eq!(clamp_test_count(35, MAX_TESTS), 20);
        assert_eq!(clamp_test_count(20, MAX_TESTS), 20);
        assert_eq!(clamp_test_count(3, MAX_TESTS), 3);
        assert_eq!(clamp_test_count(35, 10), 10);
    }

    #[test]
    fn test_clamp_ignores_configured_max_above_cap() {
        assert_eq!(clamp_test_count(35, 50), MAX_TESTS);
        assert_eq!(clamp_test_count(u32::MAX, u32::MAX), MAX_TESTS);
    }

    #[test]
    fn test_require_graph() {
        assert_eq!(require_graph(&GraphStore::default()), Err(ValidationError::NoGraph));
    }
}
