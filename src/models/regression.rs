//! Линейная регрессия (OLS) с разбиением на train/test

use std::collections::{BTreeMap, HashSet};

use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::data::Table;
use crate::error::{DataError, Result};

pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionMetrics {
    pub train_rmse: f64,
    pub test_rmse: f64,
    pub train_r2: f64,
    pub test_r2: f64,
}

/// Точки для диаграммы рассеяния по одному признаку
#[derive(Debug, Clone, Serialize)]
pub struct FeaturePlot {
    pub feature: String,
    pub coefficient: f64,
    pub x_train: Vec<f64>,
    pub y_train: Vec<f64>,
    pub x_test: Vec<f64>,
    pub y_test: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegressionResult {
    pub coefficients: BTreeMap<String, f64>,
    pub intercept: f64,
    pub metrics: RegressionMetrics,
    pub feature_importance: BTreeMap<String, f64>,
    pub equation: String,
    pub plot_data: Vec<FeaturePlot>,
    pub n_train: usize,
    pub n_test: usize,
}

/// Разбиение позиций строк на обучающую и тестовую части
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Перемешивание с фиксированным seed: одинаковые входные данные дают одинаковое разбиение.
/// Размер теста - ceil(test_size * n).
pub fn train_test_split(n_rows: usize, test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(DataError::invalid(format!(
            "test_size must be between 0 and 1, got {test_size}"
        )));
    }

    let n_test = (test_size * n_rows as f64).ceil() as usize;
    let n_train = n_rows.saturating_sub(n_test);
    if n_test == 0 || n_train < 2 {
        return Err(DataError::invalid(format!(
            "not enough rows ({n_rows}) for a train/test split with test_size={test_size}"
        )));
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(TrainTestSplit {
        train,
        test: indices,
    })
}

pub fn linear_regression(
    table: &Table,
    features: &[String],
    target: &str,
    test_size: f64,
    seed: u64,
) -> Result<RegressionResult> {
    if features.is_empty() {
        return Err(DataError::invalid("at least one feature is required"));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = features.iter().find(|f| !seen.insert(f.as_str())) {
        return Err(DataError::invalid(format!("feature '{dup}' listed more than once")));
    }

    let columns: Vec<Vec<f64>> = features
        .iter()
        .map(|f| complete_numeric(table, f))
        .collect::<Result<_>>()?;
    let y = Array1::from(complete_numeric(table, target)?);

    let split = train_test_split(table.n_rows(), test_size, seed)?;

    let design = |rows: &[usize]| {
        Array2::from_shape_fn((rows.len(), features.len()), |(i, j)| columns[j][rows[i]])
    };
    let x_train = design(&split.train);
    let x_test = design(&split.test);
    let y_train: Array1<f64> = split.train.iter().map(|&i| y[i]).collect();
    let y_test: Array1<f64> = split.test.iter().map(|&i| y[i]).collect();

    check_design(&x_train, features)?;

    let dataset = Dataset::new(x_train.clone(), y_train.clone());
    let model = LinearRegression::new()
        .fit(&dataset)
        .map_err(|e| DataError::Computation(format!("linear regression failed: {e}")))?;

    let pred_train = model.predict(&x_train);
    let pred_test = model.predict(&x_test);

    let metrics = RegressionMetrics {
        train_rmse: rmse(&y_train, &pred_train),
        test_rmse: rmse(&y_test, &pred_test),
        train_r2: r2_score(&y_train, &pred_train),
        test_r2: r2_score(&y_test, &pred_test),
    };

    let params = model.params();
    let intercept = model.intercept();

    let coefficients: BTreeMap<String, f64> = features
        .iter()
        .cloned()
        .zip(params.iter().copied())
        .collect();
    let feature_importance = coefficients
        .iter()
        .map(|(name, coef)| (name.clone(), coef.abs()))
        .collect();

    let terms: Vec<String> = features
        .iter()
        .zip(params.iter())
        .map(|(name, coef)| format!("{coef:.4} * {name}"))
        .collect();
    let equation = format!("{target} = {} + {intercept:.4}", terms.join(" + "));

    let plot_data = features
        .iter()
        .enumerate()
        .map(|(j, name)| FeaturePlot {
            feature: name.clone(),
            coefficient: params[j],
            x_train: x_train.column(j).to_vec(),
            y_train: y_train.to_vec(),
            x_test: x_test.column(j).to_vec(),
            y_test: y_test.to_vec(),
        })
        .collect();

    tracing::info!(
        "Fitted {} on {} features: train R2={:.4}, test R2={:.4}",
        target,
        features.len(),
        metrics.train_r2,
        metrics.test_r2
    );

    Ok(RegressionResult {
        coefficients,
        intercept,
        metrics,
        feature_importance,
        equation,
        plot_data,
        n_train: split.train.len(),
        n_test: split.test.len(),
    })
}

/// Матрица признаков должна иметь полный ранг, иначе коэффициенты не определены однозначно
fn check_design(x_train: &Array2<f64>, features: &[String]) -> Result<()> {
    let (n_train, n_features) = x_train.dim();
    if n_train <= n_features {
        return Err(DataError::invalid(format!(
            "training set has {n_train} rows, need more than the {n_features} features"
        )));
    }

    let mut centered = x_train.clone();
    for (j, mut column) in centered.axis_iter_mut(Axis(1)).enumerate() {
        let mean = column.mean().unwrap_or(0.0);
        column.mapv_inplace(|v| v - mean);
        let scale = column.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if scale == 0.0 {
            return Err(DataError::invalid(format!(
                "feature '{}' is constant in the training set",
                features[j]
            )));
        }
        column.mapv_inplace(|v| v / scale);
    }

    if design_rank(centered) < n_features {
        return Err(DataError::invalid(
            "features are linearly dependent, remove redundant columns",
        ));
    }
    Ok(())
}

/// Ранг методом Гаусса с выбором ведущего элемента по столбцу
fn design_rank(mut m: Array2<f64>) -> usize {
    const TOLERANCE: f64 = 1e-9;
    let (n_rows, n_cols) = m.dim();
    let mut rank = 0;

    for col in 0..n_cols {
        if rank == n_rows {
            break;
        }
        let (pivot, magnitude) = (rank..n_rows)
            .map(|r| (r, m[[r, col]].abs()))
            .fold((rank, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });
        if magnitude <= TOLERANCE {
            continue;
        }

        for c in 0..n_cols {
            m.swap([rank, c], [pivot, c]);
        }
        for r in rank + 1..n_rows {
            let factor = m[[r, col]] / m[[rank, col]];
            for c in col..n_cols {
                let v = m[[rank, c]];
                m[[r, c]] -= factor * v;
            }
        }
        rank += 1;
    }

    rank
}

/// Числовая колонка без пропусков
fn complete_numeric(table: &Table, name: &str) -> Result<Vec<f64>> {
    let values = table
        .require_column(name)?
        .as_numeric()
        .ok_or_else(|| DataError::invalid(format!("column '{name}' is not numeric")))?;

    values
        .iter()
        .map(|v| {
            v.ok_or_else(|| {
                DataError::invalid(format!(
                    "column '{name}' contains missing values, handle them before fitting"
                ))
            })
        })
        .collect()
}

pub fn rmse(actual: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    let mse = (actual - predicted).mapv(|e| e * e).mean().unwrap_or(0.0);
    mse.sqrt()
}

/// Коэффициент детерминации. При нулевой дисперсии цели: 1.0 для точного прогноза, иначе 0.0
pub fn r2_score(actual: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    let mean = actual.mean().unwrap_or(0.0);
    let ss_res: f64 = (actual - predicted).mapv(|e| e * e).sum();
    let ss_tot: f64 = actual.mapv(|v| (v - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}
