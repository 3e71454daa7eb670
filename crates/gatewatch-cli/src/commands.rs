//! Command handlers

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use chrono::NaiveDateTime;
use log::info;

use gatewatch_app::repository::{open_engine, open_pipeline};
use gatewatch_app::{run_concurrent, run_polling, AlertThrottle, Config, ConcurrentOptions};
use gatewatch_domain::{Clock, ManualClock, SystemClock};
use gatewatch_infra::source::DirectoryFrameSource;
use gatewatch_types::{DecisionEvent, Frame, OutputFormat, Result};
use gatewatch_vision::annotate_observation;

use crate::cli::{Cli, Commands};
use crate::output::{output_event, output_observation, output_stats};

/// Execute CLI command
pub fn execute(cli: Cli) -> Result<()> {
    // Load config
    let mut config = Config::load()?;

    // Override from CLI args
    if let Some(ref registry) = cli.registry {
        config.registry_path = Some(registry.clone());
    }
    if cli.ocr_command.is_some() {
        config.ocr_command = cli.ocr_command.clone();
    }
    let output_format = cli.format.unwrap_or(config.output_format);

    match &cli.command {
        Commands::Watch {
            frames,
            concurrent,
            workers,
            ephemeral,
        } => {
            if let Some(workers) = workers {
                config.workers = *workers;
            }
            cmd_watch(&config, frames, *concurrent, *ephemeral, output_format)
        }

        Commands::Recognize { image, annotate } => cmd_recognize(&config, image, annotate.as_deref(), output_format),

        Commands::Decide { plate, at, ephemeral } => cmd_decide(&config, plate, *at, *ephemeral, output_format),

        Commands::Config {
            show,
            set_registry,
            set_ocr_command,
            set_debounce,
            set_min_area,
            set_output,
            reset,
        } => cmd_config(
            *show,
            set_registry.clone(),
            set_ocr_command.clone(),
            *set_debounce,
            *set_min_area,
            *set_output,
            *reset,
        ),
    }
}

fn cmd_watch(config: &Config, frames: &Path, concurrent: bool, ephemeral: bool, output_format: OutputFormat) -> Result<()> {
    config.validate()?;
    let engine = open_engine(config, ephemeral, true, Box::new(SystemClock))?;
    let mut source = DirectoryFrameSource::open(frames)?;
    let stop = AtomicBool::new(false);

    // Printing errors end the replay on the next frame
    let mut print_error = None;
    let mut alerts = AlertThrottle::new(config.alert_quiet());
    let mut on_event = |event: &DecisionEvent| {
        if *event == DecisionEvent::NoObservation || print_error.is_some() {
            return;
        }
        if !alerts.admit(event, Instant::now()) {
            return;
        }
        if let Err(e) = output_event(output_format, event) {
            print_error = Some(e);
        }
    };

    let stats = if concurrent {
        let options = ConcurrentOptions {
            tick: config.tick(),
            workers: config.worker_count(),
        };
        run_concurrent(&engine, &mut source, &options, &stop, &mut on_event)?
    } else {
        run_polling(&engine, &mut source, config.tick(), &stop, &mut on_event)?
    };

    if let Some(e) = print_error {
        return Err(e);
    }
    output_stats(output_format, &stats)
}

fn cmd_recognize(config: &Config, image: &Path, annotate: Option<&Path>, output_format: OutputFormat) -> Result<()> {
    config.validate()?;
    let pipeline = open_pipeline(config)?;
    let frame = Frame::open(image)?;

    let observation = pipeline.observe(&frame)?;
    output_observation(output_format, observation.as_ref())?;

    if let (Some(path), Some(observation)) = (annotate, observation.as_ref()) {
        annotate_observation(&frame, observation).save(path)?;
        info!("annotated image written to {}", path.display());
    }
    Ok(())
}

fn cmd_decide(
    config: &Config,
    plate: &str,
    at: Option<NaiveDateTime>,
    ephemeral: bool,
    output_format: OutputFormat,
) -> Result<()> {
    config.validate()?;
    let clock: Box<dyn Clock> = match at {
        Some(at) => Box::new(ManualClock::new(at)),
        None => Box::new(SystemClock),
    };
    let engine = open_engine(config, ephemeral, false, clock)?;
    let event = engine.decide_plate(plate)?;
    output_event(output_format, &event)
}

fn cmd_config(
    show: bool,
    set_registry: Option<PathBuf>,
    set_ocr_command: Option<String>,
    set_debounce: Option<u64>,
    set_min_area: Option<f64>,
    set_output: Option<OutputFormat>,
    reset: bool,
) -> Result<()> {
    if reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(registry) = set_registry {
        config.registry_path = Some(registry);
        modified = true;
    }

    if let Some(command) = set_ocr_command {
        config.ocr_command = Some(command).filter(|c| !c.trim().is_empty());
        modified = true;
    }

    if let Some(debounce_secs) = set_debounce {
        config.debounce_secs = debounce_secs;
        modified = true;
    }

    if let Some(min_area) = set_min_area {
        config.min_plate_area = min_area;
        modified = true;
    }

    if let Some(output_format) = set_output {
        config.output_format = output_format;
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration updated");
    }

    if show || !modified {
        println!("{}", config);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatewatch_types::Error;

    #[test]
    fn test_decide_rejects_invalid_config() {
        let config = Config {
            canny_low: f32::NAN,
            ..Config::default()
        };
        let result = cmd_decide(&config, "ABC1234", None, true, OutputFormat::Json);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
