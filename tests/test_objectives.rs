//! Tests for the objective functions
//!
//! This file tests the public objective API:
//! - Rosenbrock values, gradients and minimum
//! - Logistic regression loss, batch evaluation and stability
//! - Custom datasets through the Dataset trait
//! - FnObjective adapters

use approx::{assert_abs_diff_eq, assert_relative_eq};
use rust_gradient_descent::objectives::{
    Dataset, FnObjective, InMemoryDataset, LogisticRegression, Objective, Rosenbrock,
    SampledObjective,
};
use rust_gradient_descent::utils::{max_relative_error, numeric_gradient};
use rust_gradient_descent::Error;

// ============================================================================
// Rosenbrock
// ============================================================================

mod rosenbrock_tests {
    use super::*;

    #[test]
    fn test_values() {
        let f = Rosenbrock::default();
        assert_eq!(f.dimension(), 2);
        assert_eq!(f.loss(&[1.0, 1.0]), 0.0);
        assert_eq!(f.loss(&[0.0, 0.0]), 1.0);
        assert_eq!(f.loss(&[2.0, -1.0]), 2501.0);
    }

    #[test]
    fn test_gradient_at_known_points() {
        let f = Rosenbrock::default();
        assert_eq!(f.gradient(&[0.0, 0.0]).unwrap(), vec![-2.0, 0.0]);
        assert_eq!(f.gradient(&[1.0, 1.0]).unwrap(), vec![0.0, 0.0]);
        assert_eq!(f.gradient(&[2.0, -1.0]).unwrap(), vec![4002.0, -1000.0]);
    }

    #[test]
    fn test_custom_parameters() {
        let f = Rosenbrock::new(-2.0, 3.0);
        assert_eq!(f.minimum(), [-2.0, 4.0]);
        assert_eq!(f.loss(&f.minimum()), 0.0);
        assert_eq!(f.gradient(&f.minimum()).unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_from_json() {
        let f: Rosenbrock = serde_json::from_str(r#"{ "a": 2.0, "b": 50.0 }"#).unwrap();
        assert_eq!(f, Rosenbrock::new(2.0, 50.0));
    }
}

// ============================================================================
// Logistic Regression
// ============================================================================

mod logistic_tests {
    use super::*;

    fn dataset() -> InMemoryDataset {
        InMemoryDataset::new(
            vec![
                vec![1.0, 2.0],
                vec![1.0, -1.0],
                vec![1.0, 0.5],
                vec![1.0, -3.0],
            ],
            vec![1.0, 0.0, 1.0, 0.0],
        )
        .unwrap()
    }

    #[test]
    fn test_loss_matches_cross_entropy() {
        let model = LogisticRegression::new(dataset()).unwrap();
        let w = [0.2, 0.7];
        let data = dataset();
        let expected: f64 = (0..data.len())
            .map(|i| {
                let z: f64 = w.iter().zip(data.features(i)).map(|(a, b)| a * b).sum();
                let p = 1.0 / (1.0 + (-z).exp());
                let y = data.label(i);
                -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
            })
            .sum::<f64>()
            / data.len() as f64;
        assert_relative_eq!(model.loss(&w), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_batch_loss_averages_selected_samples() {
        let model = LogisticRegression::new(dataset()).unwrap();
        let w = [0.1, -0.4];
        let pair = (model.batch_loss(&w, &[0]) + model.batch_loss(&w, &[3])) / 2.0;
        assert_relative_eq!(model.batch_loss(&w, &[0, 3]), pair, max_relative = 1e-12);
        assert_eq!(model.num_samples(), 4);
    }

    #[test]
    fn test_batch_gradient_check() {
        let model = LogisticRegression::new(dataset()).unwrap();
        let w = [0.3, 0.9];
        let indices = [1, 2];
        let numeric =
            numeric_gradient(|p: &[f64]| model.batch_loss(p, &indices), &w, 1e-5).unwrap();
        let analytic = model.batch_gradient(&w, &indices).unwrap();
        assert!(max_relative_error(&analytic, &numeric).unwrap() < 1e-6);
    }

    #[test]
    fn test_huge_weights_do_not_overflow() {
        let model = LogisticRegression::new(dataset()).unwrap();
        // Misclassifies every sample by a huge margin.
        let w = [0.0, -1e6];
        let loss = model.loss(&w);
        assert!(loss.is_finite());
        assert!(loss > 1e5);
        // Perfect separation drives the loss to zero.
        assert_abs_diff_eq!(model.loss(&[0.0, 1e6]), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_accuracy() {
        let model = LogisticRegression::new(dataset()).unwrap();
        assert_eq!(model.accuracy(&[0.0, 1.0]), 1.0);
        assert_eq!(model.accuracy(&[-10.0, 0.0]), 0.5);
    }
}

// ============================================================================
// Custom Datasets
// ============================================================================

mod dataset_tests {
    use super::*;

    /// One feature, label 1 for even indices.
    struct Alternating {
        rows: Vec<[f64; 1]>,
    }

    impl Dataset for Alternating {
        fn len(&self) -> usize {
            self.rows.len()
        }

        fn num_features(&self) -> usize {
            1
        }

        fn features(&self, index: usize) -> &[f64] {
            &self.rows[index]
        }

        fn label(&self, index: usize) -> f64 {
            if index % 2 == 0 {
                1.0
            } else {
                0.0
            }
        }
    }

    #[test]
    fn test_logistic_over_custom_dataset() {
        let data = Alternating {
            rows: vec![[1.0], [-1.0], [2.0], [-2.0]],
        };
        let model = LogisticRegression::new(data).unwrap();
        assert_eq!(model.dimension(), 1);
        assert_eq!(model.accuracy(&[1.0]), 1.0);
        assert!(model.gradient(&[0.0]).unwrap()[0] < 0.0);
    }

    #[test]
    fn test_empty_custom_dataset_rejected() {
        let data = Alternating { rows: vec![] };
        assert!(matches!(LogisticRegression::new(data), Err(Error::EmptyDataset)));
    }

    /// Claims two features but stores rows of any width.
    struct Ragged {
        rows: Vec<Vec<f64>>,
    }

    impl Dataset for Ragged {
        fn len(&self) -> usize {
            self.rows.len()
        }

        fn num_features(&self) -> usize {
            2
        }

        fn features(&self, index: usize) -> &[f64] {
            &self.rows[index]
        }

        fn label(&self, index: usize) -> f64 {
            (index % 2) as f64
        }
    }

    #[test]
    fn test_ragged_custom_dataset_rejected() {
        let data = Ragged {
            rows: vec![vec![1.0, 0.5], vec![1.0], vec![1.0, -0.5]],
        };
        match LogisticRegression::new(data) {
            Err(Error::DimensionMismatch { expected, found, .. }) => {
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected result {:?}", other.map(|m| m.dimension())),
        }
    }

    #[test]
    fn test_consistent_custom_dataset_accepted() {
        let data = Ragged {
            rows: vec![vec![1.0, 0.5], vec![1.0, -0.5]],
        };
        let model = LogisticRegression::new(data).unwrap();
        assert_eq!(model.dimension(), 2);
        assert!(model.loss(&[0.0, 0.0]).is_finite());
    }

    #[test]
    fn test_label_validation_reports_index() {
        let result =
            InMemoryDataset::new(vec![vec![1.0], vec![2.0], vec![3.0]], vec![0.0, 1.0, 2.0]);
        match result {
            Err(Error::InvalidLabel { index, label }) => {
                assert_eq!(index, 2);
                assert_eq!(label, 2.0);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}

// ============================================================================
// Closure Objectives
// ============================================================================

mod fn_objective_tests {
    use super::*;

    #[test]
    fn test_closure_objective_with_gradient() {
        let centre = [3.0, -1.0];
        let f = FnObjective::new(2, |x: &[f64]| {
            x.iter().zip(&centre).map(|(a, c)| (a - c).powi(2)).sum()
        })
        .with_gradient(|x: &[f64]| x.iter().zip(&centre).map(|(a, c)| 2.0 * (a - c)).collect());

        assert_eq!(f.loss(&[3.0, -1.0]), 0.0);
        assert_eq!(f.gradient(&[4.0, -1.0]).unwrap(), vec![2.0, 0.0]);
    }

    #[test]
    fn test_trait_object_usage() {
        let objectives: Vec<Box<dyn Objective>> = vec![
            Box::new(Rosenbrock::default()),
            Box::new(FnObjective::new(2, |x: &[f64]| x[0].abs() + x[1].abs())),
        ];
        assert_eq!(objectives[0].loss(&[1.0, 1.0]), 0.0);
        assert_eq!(objectives[1].loss(&[1.0, -2.0]), 3.0);
        assert!(objectives[1].gradient(&[1.0, 1.0]).is_none());
    }
}
