/// Аналитические модели

pub mod regression;

pub use regression::{
    linear_regression, train_test_split, FeaturePlot, RegressionMetrics, RegressionResult,
    TrainTestSplit,
};
