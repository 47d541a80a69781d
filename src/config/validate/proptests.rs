//! Property-based tests for configuration validation

use super::error::ValidationError;
use super::validator::{validate_config, validate_trainer};
use crate::config::schema::*;
use crate::train::LossSpec;
use proptest::prelude::*;

fn arb_resolvable() -> impl Strategy<Value = Resolvable<usize>> {
    prop_oneof![Just(Resolvable::Infer), (1usize..10_000).prop_map(Resolvable::Value)]
}

fn arb_valid_config() -> impl Strategy<Value = TaskConfig> {
    (
        1e-6f32..1.0,      // lr
        arb_resolvable(),  // max_steps
        arb_resolvable(),  // max_epochs
        1usize..16,        // accumulate_grad_batches
        0usize..8,         // num_gpus
        2usize..10,        // n_splits
        0.01f64..=1.0,     // limit_train_batches
    )
        .prop_map(|(lr, max_steps, max_epochs, accumulate, gpus, n_splits, fraction)| {
            TaskConfig {
                model: ModelHypers { lr },
                loss: Some(LossSpec::new("FocalLoss")),
                optimization: Some(OptimizationConfig {
                    optimizer: OptimizerSpec::named("Adam"),
                    max_steps,
                    max_epochs,
                    ..Default::default()
                }),
                trainer: Some(TrainerConfig {
                    accumulate_grad_batches: accumulate,
                    num_gpus: gpus,
                    limit_train_batches: Some(BatchLimit::Fraction(fraction)),
                    max_epochs: Some(1),
                    ..Default::default()
                }),
                data: Some(DataConfig { n_splits, ..Default::default() }),
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_valid_configs_pass(config in arb_valid_config()) {
        prop_assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn prop_non_positive_lr_fails(config in arb_valid_config(), lr in -1.0f32..=0.0) {
        let mut config = config;
        config.model.lr = lr;
        let result = validate_config(&config);
        prop_assert!(matches!(result, Err(ValidationError::InvalidLearningRate(_))));
    }

    #[test]
    fn prop_fraction_above_one_fails(fraction in 1.0001f64..100.0) {
        let trainer = TrainerConfig {
            limit_train_batches: Some(BatchLimit::Fraction(fraction)),
            ..Default::default()
        };
        prop_assert_eq!(
            validate_trainer(&trainer),
            Err(ValidationError::InvalidBatchFraction(fraction))
        );
    }

    #[test]
    fn prop_too_few_splits_fail(config in arb_valid_config(), n_splits in 0usize..2) {
        let mut config = config;
        if let Some(data) = config.data.as_mut() {
            data.n_splits = n_splits;
        }
        prop_assert_eq!(validate_config(&config), Err(ValidationError::InvalidSplits(n_splits)));
    }
}
