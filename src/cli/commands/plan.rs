//! Plan command implementation

use super::write_text;
use crate::cli::args::PlanArgs;
use crate::cli::logging::{log, LogLevel};
use crate::config::{load_config, OptimizationConfig};
use crate::error::{Error, Result};
use crate::train::{process_optim_config, TrainerContext};

/// Trainer context from the config's `trainer` section and CLI overrides
pub fn trainer_context(
    args: &PlanArgs,
    base: Option<&crate::config::TrainerConfig>,
) -> TrainerContext {
    let mut trainer = match base {
        Some(config) => TrainerContext::from_config(config, args.num_batches),
        None => TrainerContext::new(args.num_batches),
    };
    if let Some(max_epochs) = args.max_epochs {
        trainer = trainer.with_max_epochs(max_epochs);
    }
    if let Some(max_steps) = args.max_steps {
        trainer = trainer.with_max_steps(max_steps);
    }
    if let Some(accumulate) = args.accumulate {
        trainer = trainer.with_accumulate_grad_batches(accumulate);
    }
    if let Some(gpus) = args.gpus {
        trainer = trainer.with_num_gpus(gpus);
    }
    trainer
}

/// Resolve the config at `args.config` against the trainer
pub fn resolve_plan(args: &PlanArgs) -> Result<OptimizationConfig> {
    let config = load_config(&args.config)?;
    let optimization = config
        .optimization
        .ok_or_else(|| Error::config("Config has no optimization section"))?;
    let trainer = trainer_context(args, config.trainer.as_ref());
    process_optim_config(&optimization, &trainer)
}

pub fn run_plan(args: PlanArgs, level: LogLevel) -> Result<()> {
    let resolved = resolve_plan(&args)?;

    write_text(&serde_yaml::to_string(&resolved)?, args.output.as_deref())?;

    // stderr, so redirected YAML stays parseable
    log(
        level,
        LogLevel::Normal,
        &format!(
            "✓ {} steps over {} epochs ({} steps per epoch)",
            resolved.max_steps, resolved.max_epochs, resolved.steps_per_epoch
        ),
    );
    if let Some(output) = &args.output {
        log(level, LogLevel::Verbose, &format!("  Written to {}", output.display()));
    }
    Ok(())
}
