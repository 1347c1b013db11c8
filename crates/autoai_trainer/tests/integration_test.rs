//! End-to-end tests for the training pipeline

use autoai_core::{
    AutoAiError, Column, Estimator, InferenceAligner, PredictionRequest, Result, Samples, Scalar,
    Table, Task, TrainedArtifact,
};
use autoai_trainer::search::{RandomSampler, TpeOptions, TpeSampler};
use autoai_trainer::{
    resolve, train_from_csv, ExplanationReport, Explainer, SearchConfig, SearchEngine,
    TaskSelection, TrainRequest, Trainer, TrainerConfig,
};
use std::collections::HashMap;
use std::fs;

const REGIONS: [&str; 3] = ["north", "south", "east"];

/// 60 rows; `price` has 60 distinct values, `grade` has 5
fn dataset() -> Table {
    let n = 60;
    let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let z: Vec<f64> = (0..n).map(|i| ((i * 7) % 11) as f64).collect();
    let region: Vec<&str> = (0..n).map(|i| REGIONS[i % 3]).collect();
    let price: Vec<f64> = (0..n)
        .map(|i| 3.0 * i as f64 + if i % 3 == 1 { 10.0 } else { 0.0 } + 0.5 * ((i * 7) % 11) as f64)
        .collect();
    let grade: Vec<f64> = (0..n).map(|i| (i / 12) as f64).collect();

    Table::new(vec![
        Column::numeric("x", &x),
        Column::numeric("z", &z),
        Column::text("region", &region),
        Column::numeric("price", &price),
        Column::numeric("grade", &grade),
    ])
    .expect("table")
}

fn config(dir: &tempfile::TempDir) -> TrainerConfig {
    let mut config = TrainerConfig::default();
    config.explain.output_path = dir.path().join("importance.json");
    config
}

#[test]
fn test_identical_runs_give_identical_scores() {
    let dir = tempfile::tempdir().expect("tempdir");
    let table = dataset().without("grade");
    let request = TrainRequest::new("price");

    let first = Trainer::new(config(&dir)).train(&table, &request).expect("first run");
    let second = Trainer::new(config(&dir)).train(&table, &request).expect("second run");

    assert_eq!(first.test_score, second.test_score);
    assert_eq!(first.artifact, second.artifact);
    assert_eq!(first.artifact.columns, vec!["x", "z", "region_north", "region_south"]);
}

#[test]
fn test_search_runs_exactly_the_trial_budget() {
    let space = resolve(Task::Regression, "xgboost").expect("xgboost").search_space();
    let rows: Vec<Vec<f64>> = (0..48).map(|i| vec![i as f64]).collect();
    let targets: Vec<f64> = (0..48).map(|i| i as f64 * 2.0).collect();
    let train = Samples::new(rows, targets).expect("samples");

    let engine = SearchEngine::new(SearchConfig::default());
    let mut fits = 0;
    let mut sampler = TpeSampler::new(space, 42, TpeOptions::default());
    let study = engine
        .search_with(&train, &mut sampler, |_, _, _| {
            fits += 1;
            Ok(fits as f64 / 100.0)
        })
        .expect("search");

    assert_eq!(fits, 20);
    assert_eq!(study.trials.len(), 20);
}

#[test]
fn test_tuned_run_searches_only_the_train_split() {
    let dir = tempfile::tempdir().expect("tempdir");
    let table = dataset().without("grade");
    let request = TrainRequest::new("price").with_tuning(true);

    let outcome = Trainer::new(config(&dir)).train(&table, &request).expect("train");
    let study = outcome.study.as_ref().expect("study");

    assert_eq!(study.trials.len(), 20);
    assert_eq!(study.train_rows + study.validation_rows, outcome.train_rows);
    assert_eq!(outcome.train_rows + outcome.test_rows, 60);
    assert_eq!((study.train_rows, study.validation_rows), (36, 12));

    let best = study.best_trial().expect("best trial");
    for (name, value) in &best.params {
        assert_eq!(outcome.params.get(name), Some(value));
    }
}

#[test]
fn test_task_detection_from_cardinality() {
    let dir = tempfile::tempdir().expect("tempdir");
    let trainer = Trainer::new(config(&dir));

    let price = trainer
        .train(&dataset().without("grade"), &TrainRequest::new("price"))
        .expect("price");
    assert_eq!(price.task, Task::Regression);
    assert_eq!(price.metric, "r2");

    let grade = trainer
        .train(&dataset().without("price"), &TrainRequest::new("grade"))
        .expect("grade");
    assert_eq!(grade.task, Task::Classification);
    assert_eq!(grade.artifact.model.classes.len(), 5);

    let forced = trainer
        .train(
            &dataset().without("price"),
            &TrainRequest::new("grade").with_task(TaskSelection::Regression),
        )
        .expect("forced regression");
    assert_eq!(forced.task, Task::Regression);
}

#[test]
fn test_unknown_family_is_unsupported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = Trainer::new(config(&dir)).train(
        &dataset(),
        &TrainRequest::new("price").with_family("random_forest"),
    );
    assert!(matches!(result, Err(AutoAiError::UnsupportedConfiguration(_))));
}

struct BrokenRenderer;

impl Explainer for BrokenRenderer {
    fn explain(
        &self,
        _model: &Estimator,
        _samples: &Samples,
        _columns: &[String],
        _task: Task,
    ) -> Result<ExplanationReport> {
        Err(AutoAiError::ExplainabilityFailed("renderer unavailable".to_string()))
    }
}

#[test]
fn test_explanation_failure_does_not_fail_training() {
    let dir = tempfile::tempdir().expect("tempdir");
    let table = dataset().without("grade");
    let request = TrainRequest::new("price").with_explain(true);

    let outcome = Trainer::new(config(&dir))
        .with_explainer(BrokenRenderer)
        .train(&table, &request)
        .expect("train");
    assert!(outcome.explanation.is_none());
    assert!(outcome
        .explanation_error
        .as_deref()
        .is_some_and(|e| e.contains("renderer unavailable")));

    let explained = Trainer::new(config(&dir)).train(&table, &request).expect("train");
    let report = explained.explanation.expect("explanation");
    assert_eq!(report.importances.len(), explained.artifact.columns.len());
    assert!(dir.path().join("importance.json").exists());
}

#[test]
fn test_every_family_trains_both_tasks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let trainer = Trainer::new(config(&dir));
    for family in ["xgboost", "lightgbm", "catboost"] {
        let regression = trainer
            .train(
                &dataset().without("grade"),
                &TrainRequest::new("price").with_family(family),
            )
            .expect("regression");
        assert_eq!(regression.family, family);
        assert!(regression.artifact.model.is_fitted());

        let classification = trainer
            .train(
                &dataset().without("price"),
                &TrainRequest::new("grade").with_family(family),
            )
            .expect("classification");
        assert_eq!(classification.task, Task::Classification);
    }
}

#[test]
fn test_csv_to_prediction() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv_path = dir.path().join("customers.csv");
    let mut csv = String::from("age,plan,monthly_spend,churned\n");
    for i in 0..40 {
        let plan = ["basic", "pro", "team"][i % 3];
        let spend = if i == 7 {
            String::new()
        } else {
            format!("{}", 20 + (i * 13) % 50)
        };
        let churned = if i % 2 == 0 { "yes" } else { "no" };
        csv.push_str(&format!("{},{plan},{spend},{churned}\n", 20 + i));
    }
    fs::write(&csv_path, csv).expect("write csv");

    let artifact_path = dir.path().join("trained_model.json");
    let request = TrainRequest::new("churned");
    let (outcome, digest) =
        train_from_csv(&csv_path, &request, config(&dir), &artifact_path).expect("train");
    assert_eq!(digest.len(), 64);
    assert_eq!(outcome.task, Task::Classification);

    let loaded = TrainedArtifact::load(&artifact_path).expect("load");
    assert_eq!(loaded.columns, outcome.artifact.columns);
    assert_eq!(loaded.columns, vec!["age", "monthly_spend", "plan_pro", "plan_team"]);

    let mut data = HashMap::new();
    data.insert("age".to_string(), Some(Scalar::Number(31.0)));
    data.insert("plan".to_string(), Some(Scalar::from("pro")));
    data.insert("plan_pro".to_string(), Some(Scalar::Number(1.0)));
    data.insert("unused".to_string(), Some(Scalar::Number(5.0)));
    let response = InferenceAligner::new(&artifact_path)
        .predict(&PredictionRequest { data })
        .expect("predict");
    assert!(matches!(response.prediction, Scalar::Text(ref label) if label == "yes" || label == "no"));
}

/// Table minus one column
trait Without {
    fn without(self, name: &str) -> Table;
}

impl Without for Table {
    fn without(self, name: &str) -> Table {
        let columns = self
            .columns()
            .iter()
            .filter(|c| c.name != name)
            .cloned()
            .collect();
        Table::new(columns).expect("table")
    }
}

#[test]
fn test_random_sampler_search_is_reproducible() {
    let space = resolve(Task::Regression, "catboost").expect("catboost").search_space();
    let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
    let train = Samples::new(rows, vec![0.0; 20]).expect("samples");
    let engine = SearchEngine::new(SearchConfig {
        n_trials: 5,
        ..SearchConfig::default()
    });

    let run = || {
        let mut sampler = RandomSampler::new(space.clone(), 9);
        engine
            .search_with(&train, &mut sampler, |params, _, _| {
                Ok(params["depth"].as_f64())
            })
            .expect("search")
    };
    assert_eq!(run(), run());
}
