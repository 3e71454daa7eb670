//! Adapters wiring config to the persistence layer and the vision stages

use gatewatch_domain::{AccessLedger, Clock, SessionTracker};
use gatewatch_infra::persistence::{FileAccessLedger, FileVehicleRegistry, InMemoryAccessLedger};
use gatewatch_types::{ConfigError, Result};
use gatewatch_vision::{CommandTextRecognizer, PlateLocator, PlateReader, RecognitionPipeline};

use crate::config::Config;
use crate::engine::AccessDecisionEngine;

/// Open the vehicle registry named in the config
pub fn open_registry(config: &Config) -> Result<FileVehicleRegistry> {
    FileVehicleRegistry::open(config.registry_path()?)
}

/// Open the access ledger; `ephemeral` keeps it in memory only
pub fn open_ledger(config: &Config, ephemeral: bool) -> Result<Box<dyn AccessLedger>> {
    if ephemeral {
        return Ok(Box::new(InMemoryAccessLedger::new()));
    }
    let ledger = FileAccessLedger::open(config.ledger_dir()?)?;
    Ok(Box::new(ledger))
}

/// Build the recognition pipeline; requires `ocr_command`
pub fn open_pipeline(config: &Config) -> Result<RecognitionPipeline> {
    let command = config.ocr_command.as_deref().ok_or_else(|| {
        ConfigError::Invalid(
            "ocr_command is not set (gatewatch config --set-ocr-command \"...\")".to_string(),
        )
    })?;
    let locator_config = config.locator_config();
    locator_config.validate()?;

    let recognizer = CommandTextRecognizer::from_command_line(command)?;
    let locator = PlateLocator::new(locator_config);
    let reader = PlateReader::new(Box::new(recognizer), config.reader_config());
    Ok(RecognitionPipeline::new(locator, reader))
}

/// Assemble a decision engine from the config
pub fn open_engine(
    config: &Config,
    ephemeral: bool,
    with_pipeline: bool,
    clock: Box<dyn Clock>,
) -> Result<AccessDecisionEngine> {
    let registry = open_registry(config)?;
    let tracker = SessionTracker::new(open_ledger(config, ephemeral)?, config.debounce());
    let engine = AccessDecisionEngine::new(Box::new(registry), tracker, clock);
    if with_pipeline {
        Ok(engine.with_pipeline(open_pipeline(config)?))
    } else {
        Ok(engine)
    }
}
