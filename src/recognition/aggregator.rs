//! Turns a raw label distribution into a ranked, gated result.

use crate::config::RecognitionConfig;
use crate::defaults;
use crate::error::{Result, SignError};
use crate::recognition::result::{Candidate, RecognitionResult};
use std::cmp::Ordering;

/// Ranks labels and applies the minimum-confidence gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultAggregator {
    top_k: usize,
    min_confidence: f32,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new(defaults::TOP_K, defaults::MIN_CONFIDENCE)
    }
}

impl ResultAggregator {
    pub fn new(top_k: usize, min_confidence: f32) -> Self {
        Self {
            top_k,
            min_confidence,
        }
    }

    pub fn from_config(config: &RecognitionConfig) -> Self {
        Self::new(config.top_k, config.min_confidence)
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    /// Rank `distribution` (one probability per label) into a result.
    ///
    /// Sorting is stable, so labels with exactly equal probability keep
    /// their vocabulary order. When the top probability is below the gate
    /// the gloss is empty but `top` still lists the candidates.
    ///
    /// # Errors
    /// Returns `SignError::Inference` if the distribution and labels differ
    /// in length or a probability is not finite.
    pub fn aggregate(
        &self,
        labels: &[String],
        distribution: &[f32],
        sequence: u64,
    ) -> Result<RecognitionResult> {
        if labels.len() != distribution.len() {
            return Err(SignError::Inference {
                message: format!(
                    "model returned {} probabilities for {} labels",
                    distribution.len(),
                    labels.len()
                ),
            });
        }
        if let Some(index) = distribution.iter().position(|p| !p.is_finite()) {
            return Err(SignError::Inference {
                message: format!("probability for '{}' is not finite", labels[index]),
            });
        }

        let mut order: Vec<usize> = (0..distribution.len()).collect();
        order.sort_by(|&a, &b| {
            distribution[b]
                .partial_cmp(&distribution[a])
                .unwrap_or(Ordering::Equal)
        });

        let top: Vec<Candidate> = order
            .into_iter()
            .take(self.top_k)
            .map(|i| Candidate::new(labels[i].clone(), distribution[i]))
            .collect();

        let Some(best) = top.first() else {
            return Ok(RecognitionResult::empty(sequence));
        };

        let confidence = best.probability.clamp(0.0, 1.0);
        let gloss = if confidence < self.min_confidence {
            defaults::NO_GLOSS.to_string()
        } else {
            best.label.clone()
        };

        Ok(RecognitionResult {
            gloss,
            confidence,
            top,
            sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_ranks_top_three() {
        let aggregator = ResultAggregator::new(3, 0.0);
        let result = aggregator
            .aggregate(
                &labels(&["THANKS", "HELLO", "PLEASE", "SORRY"]),
                &[0.05, 0.92, 0.03, 0.0],
                9,
            )
            .unwrap();

        assert_eq!(result.gloss, "HELLO");
        assert_eq!(result.confidence, 0.92);
        assert_eq!(
            result.top,
            vec![
                Candidate::new("HELLO", 0.92),
                Candidate::new("THANKS", 0.05),
                Candidate::new("PLEASE", 0.03),
            ]
        );
        assert_eq!(result.sequence, 9);
    }

    #[test]
    fn test_gate_blanks_gloss_but_keeps_candidates() {
        let aggregator = ResultAggregator::new(3, 0.5);
        let result = aggregator
            .aggregate(&labels(&["A", "B", "C", "D"]), &[0.3, 0.25, 0.25, 0.2], 1)
            .unwrap();

        assert_eq!(result.gloss, "");
        assert_eq!(result.confidence, 0.3);
        assert_eq!(result.top.len(), 3);
        assert_eq!(result.top[0], Candidate::new("A", 0.3));
    }

    #[test]
    fn test_gate_is_inclusive() {
        let aggregator = ResultAggregator::new(1, 0.5);
        let result = aggregator
            .aggregate(&labels(&["YES", "NO"]), &[0.5, 0.5], 0)
            .unwrap();
        assert_eq!(result.gloss, "YES");
    }

    #[test]
    fn test_ties_keep_input_order() {
        let aggregator = ResultAggregator::new(3, 0.0);
        let result = aggregator
            .aggregate(&labels(&["FIRST", "SECOND"]), &[0.5, 0.5], 0)
            .unwrap();

        assert_eq!(result.top[0].label, "FIRST");
        assert_eq!(result.top[1].label, "SECOND");
        assert_eq!(result.gloss, "FIRST");

        let result = aggregator
            .aggregate(
                &labels(&["LOW", "TIE-A", "TIE-B", "TIE-C"]),
                &[0.1, 0.3, 0.3, 0.3],
                0,
            )
            .unwrap();
        let ranked: Vec<&str> = result.top.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(ranked, vec!["TIE-A", "TIE-B", "TIE-C"]);
    }

    #[test]
    fn test_fewer_labels_than_k() {
        let aggregator = ResultAggregator::new(5, 0.0);
        let result = aggregator
            .aggregate(&labels(&["ONLY"]), &[1.0], 0)
            .unwrap();
        assert_eq!(result.top.len(), 1);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_empty_distribution_is_empty_result() {
        let aggregator = ResultAggregator::default();
        let result = aggregator.aggregate(&[], &[], 4).unwrap();
        assert_eq!(result, RecognitionResult::empty(4));
    }

    #[test]
    fn test_length_mismatch_is_inference_error() {
        let aggregator = ResultAggregator::default();
        let result = aggregator.aggregate(&labels(&["A", "B"]), &[1.0], 0);
        assert!(matches!(result, Err(SignError::Inference { .. })));
    }

    #[test]
    fn test_nan_is_inference_error() {
        let aggregator = ResultAggregator::default();
        match aggregator.aggregate(&labels(&["A", "B"]), &[f32::NAN, 0.5], 0) {
            Err(SignError::Inference { message }) => assert!(message.contains("'A'")),
            other => panic!("Expected Inference error, got {:?}", other),
        }
    }

    #[test]
    fn test_confidence_is_clamped() {
        let aggregator = ResultAggregator::default();
        let result = aggregator
            .aggregate(&labels(&["OVER"]), &[1.2], 0)
            .unwrap();
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.top[0].probability, 1.2);
    }
}
