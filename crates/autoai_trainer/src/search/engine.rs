//! Trial loop
//!
//! The engine splits the training rows once into a fitting part and a
//! validation part, then runs a fixed number of trials against that pair.
//! Scores are maximized: accuracy for classification, R² for regression.

use autoai_core::metrics::score;
use autoai_core::{split, AutoAiError, Result, Samples, Scalar, TrainingStage};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::sampler::{RandomSampler, Sampler, TpeOptions, TpeSampler};
use super::space::HyperParams;
use super::study::{Study, Trial, TrialState};
use crate::registry::{ModelConstructor, DEFAULT_SEED};

/// Which sampler drives the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerKind {
    #[default]
    Tpe,
    Random,
}

/// Search budget and sampling settings
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Hard cap on trials; there is no early stop
    pub n_trials: usize,
    /// Share of the training rows held out for scoring trials
    pub validation_fraction: f64,
    pub seed: u64,
    pub sampler: SamplerKind,
    pub n_startup_trials: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_trials: 20,
            validation_fraction: 0.25,
            seed: DEFAULT_SEED,
            sampler: SamplerKind::Tpe,
            n_startup_trials: TpeOptions::default().n_startup_trials,
        }
    }
}

/// Runs trials for one constructor
pub struct SearchEngine {
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search the constructor's space on `train` and return the best
    /// parameters together with the study.
    ///
    /// Suggested values are merged over the family defaults, so the returned
    /// assignment is complete.
    pub fn search(
        &self,
        train: &Samples,
        constructor: &ModelConstructor,
        classes: &[Scalar],
    ) -> Result<(HyperParams, Study)> {
        let space = constructor.search_space();
        let mut sampler: Box<dyn Sampler> = match self.config.sampler {
            SamplerKind::Tpe => Box::new(TpeSampler::new(
                space,
                self.config.seed,
                TpeOptions {
                    n_startup_trials: self.config.n_startup_trials,
                    ..TpeOptions::default()
                },
            )),
            SamplerKind::Random => Box::new(RandomSampler::new(space, self.config.seed)),
        };

        info!(
            model = constructor.name(),
            task = %constructor.task(),
            trials = self.config.n_trials,
            sampler = ?self.config.sampler,
            "starting hyperparameter search"
        );

        let task = constructor.task();
        let study = self.search_with(train, sampler.as_mut(), |params, fit_rows, validation| {
            let mut model = constructor.build(params)?;
            model.fit(fit_rows, classes)?;
            let predictions = model.predict_encoded(&validation.rows)?;
            score(task, &validation.targets, &predictions)
        })?;

        let best = study
            .best_trial()
            .ok_or_else(|| AutoAiError::training(TrainingStage::Search, "no trial completed"))?;

        let mut params = constructor.defaults();
        params.extend(best.params.iter().map(|(k, v)| (k.clone(), *v)));

        info!(
            best_trial = best.index,
            best_score = best.score().unwrap_or(f64::NAN),
            failed = study.n_failed(),
            "search finished"
        );
        Ok((params, study))
    }

    /// Run the trial loop with an arbitrary objective.
    ///
    /// `objective(params, fit_rows, validation_rows)` is called exactly once
    /// per trial. An error marks the trial failed; the loop continues.
    pub fn search_with<F>(
        &self,
        train: &Samples,
        sampler: &mut dyn Sampler,
        mut objective: F,
    ) -> Result<Study>
    where
        F: FnMut(&HyperParams, &Samples, &Samples) -> Result<f64>,
    {
        let parts = split(train, 1.0 - self.config.validation_fraction, self.config.seed)
            .map_err(|err| AutoAiError::training(TrainingStage::Search, err))?;

        let mut study = Study {
            trials: Vec::with_capacity(self.config.n_trials),
            train_rows: parts.train.len(),
            validation_rows: parts.test.len(),
        };

        for index in 0..self.config.n_trials {
            let params = sampler.suggest(index, &study.trials);

            let state = match objective(&params, &parts.train, &parts.test) {
                Ok(value) if value.is_finite() => TrialState::Complete { score: value },
                Ok(value) => TrialState::Failed {
                    reason: format!("non-finite score {value}"),
                },
                Err(err) => TrialState::Failed {
                    reason: err.to_string(),
                },
            };

            match &state {
                TrialState::Complete { score } => {
                    sampler.report(index, *score);
                    info!(trial = index, score, "trial complete");
                }
                TrialState::Failed { reason } => {
                    sampler.report(index, f64::NEG_INFINITY);
                    warn!(trial = index, %reason, "trial failed");
                }
            }

            study.trials.push(Trial {
                index,
                params,
                state,
            });
        }

        if study.n_complete() == 0 {
            return Err(AutoAiError::training(
                TrainingStage::Search,
                format!("all {} trials failed", study.trials.len()),
            ));
        }
        Ok(study)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::resolve;
    use crate::search::space::{ParamValue, SearchSpace};
    use autoai_core::Task;

    fn samples(n: usize) -> Samples {
        let rows: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let targets = (0..n).map(|i| 2.0 * i as f64 + 1.0).collect();
        Samples::new(rows, targets).expect("samples")
    }

    fn engine(n_trials: usize) -> SearchEngine {
        SearchEngine::new(SearchConfig {
            n_trials,
            ..SearchConfig::default()
        })
    }

    #[test]
    fn test_every_trial_calls_the_objective_once() {
        let train = samples(40);
        let space = resolve(Task::Regression, "xgboost").expect("xgboost").search_space();
        let mut sampler = RandomSampler::new(space, 1);

        let mut calls = 0;
        let study = engine(20)
            .search_with(&train, &mut sampler, |_, fit_rows, validation| {
                calls += 1;
                assert_eq!(fit_rows.len() + validation.len(), 40);
                Ok(calls as f64)
            })
            .expect("search");

        assert_eq!(calls, 20);
        assert_eq!(study.trials.len(), 20);
        assert_eq!(study.train_rows, 30);
        assert_eq!(study.validation_rows, 10);
        assert_eq!(study.best_trial().map(|t| t.index), Some(19));
    }

    #[test]
    fn test_failed_trials_are_recorded_and_skipped() {
        let train = samples(20);
        let space = resolve(Task::Regression, "lightgbm").expect("lightgbm").search_space();
        let mut sampler = TpeSampler::new(space, 5, TpeOptions::default());

        let study = engine(6)
            .search_with(&train, &mut sampler, |_, _, _| Ok(0.5))
            .expect("search");
        assert_eq!(study.n_complete(), 6);

        let mut sampler = RandomSampler::new(SearchSpace::new(), 5);
        let mut index = 0;
        let study = engine(4)
            .search_with(&train, &mut sampler, |_, _, _| {
                index += 1;
                if index % 2 == 0 {
                    Err(AutoAiError::Model("diverged".to_string()))
                } else {
                    Ok(f64::NAN)
                }
            });
        assert!(matches!(
            study,
            Err(AutoAiError::TrainingFailed {
                stage: TrainingStage::Search,
                ..
            })
        ));
    }

    #[test]
    fn test_search_returns_complete_assignment() {
        let train = samples(40);
        let constructor = resolve(Task::Regression, "xgboost").expect("xgboost");
        let engine = SearchEngine::new(SearchConfig {
            n_trials: 3,
            sampler: SamplerKind::Random,
            ..SearchConfig::default()
        });

        let (params, study) = engine.search(&train, &constructor, &[]).expect("search");
        assert_eq!(study.trials.len(), 3);
        assert_eq!(params.len(), constructor.defaults().len());
        assert!(matches!(params["max_depth"], ParamValue::Int(3..=10)));
        assert_eq!(params["gamma"], ParamValue::Float(0.0));
    }

    #[test]
    fn test_too_few_rows_fail_the_search() {
        let train = samples(1);
        let mut sampler = RandomSampler::new(SearchSpace::new(), 0);
        let result = engine(2).search_with(&train, &mut sampler, |_, _, _| Ok(1.0));
        assert!(matches!(
            result,
            Err(AutoAiError::TrainingFailed {
                stage: TrainingStage::Search,
                ..
            })
        ));
    }
}
