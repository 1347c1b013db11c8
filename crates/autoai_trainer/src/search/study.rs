//! Trials and studies

use serde::{Deserialize, Serialize};

use super::space::HyperParams;

/// Outcome of one trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrialState {
    Complete { score: f64 },
    Failed { reason: String },
}

/// One hyperparameter-search iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub index: usize,
    pub params: HyperParams,
    #[serde(flatten)]
    pub state: TrialState,
}

impl Trial {
    /// Validation score, if the trial completed
    pub fn score(&self) -> Option<f64> {
        match self.state {
            TrialState::Complete { score } => Some(score),
            TrialState::Failed { .. } => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.score().is_some()
    }
}

/// Record of a full search run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Study {
    pub trials: Vec<Trial>,
    /// Rows the trials were fitted on
    pub train_rows: usize,
    /// Rows the trials were scored on
    pub validation_rows: usize,
}

impl Study {
    /// Highest-scoring completed trial; on ties the earliest wins
    pub fn best_trial(&self) -> Option<&Trial> {
        let mut best: Option<(&Trial, f64)> = None;
        for trial in &self.trials {
            if let Some(score) = trial.score() {
                if best.map_or(true, |(_, best_score)| score > best_score) {
                    best = Some((trial, score));
                }
            }
        }
        best.map(|(trial, _)| trial)
    }

    pub fn n_complete(&self) -> usize {
        self.trials.iter().filter(|t| t.is_complete()).count()
    }

    pub fn n_failed(&self) -> usize {
        self.trials.len() - self.n_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(index: usize, state: TrialState) -> Trial {
        Trial {
            index,
            params: HyperParams::new(),
            state,
        }
    }

    #[test]
    fn test_best_trial_prefers_earliest_on_ties() {
        let study = Study {
            trials: vec![
                trial(0, TrialState::Complete { score: 0.7 }),
                trial(1, TrialState::Complete { score: 0.9 }),
                trial(2, TrialState::Failed {
                    reason: "boom".to_string(),
                }),
                trial(3, TrialState::Complete { score: 0.9 }),
            ],
            train_rows: 60,
            validation_rows: 20,
        };

        assert_eq!(study.best_trial().map(|t| t.index), Some(1));
        assert_eq!(study.n_complete(), 3);
        assert_eq!(study.n_failed(), 1);
    }

    #[test]
    fn test_no_complete_trials_has_no_best() {
        let study = Study {
            trials: vec![trial(0, TrialState::Failed {
                reason: "x".to_string(),
            })],
            ..Study::default()
        };
        assert!(study.best_trial().is_none());
    }

    #[test]
    fn test_trial_serializes_flat() {
        let json = serde_json::to_value(trial(4, TrialState::Complete { score: 0.5 })).expect("json");
        assert_eq!(json["state"], "complete");
        assert_eq!(json["score"], 0.5);
        assert_eq!(json["index"], 4);
    }
}
