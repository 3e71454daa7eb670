//! Output formatting module

use gatewatch_app::LoopStats;
use gatewatch_types::{DecisionEvent, OutputFormat, PlateObservation, Result};

/// Print one decision; JSON mode writes one object per line
pub fn output_event(output_format: OutputFormat, event: &DecisionEvent) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string(event)?);
    } else {
        let time = match event {
            DecisionEvent::Entry { time, .. } | DecisionEvent::Exit { time, .. } => {
                time.format("%Y-%m-%d %H:%M:%S").to_string()
            }
            _ => String::new(),
        };
        println!("{:<19}  {:<17}  {}", time, event.kind(), event);
    }
    Ok(())
}

pub fn output_stats(output_format: OutputFormat, stats: &LoopStats) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(stats)?);
    } else {
        println!("\nReplay Summary");
        println!("==============");
        println!("Frames:          {}", stats.frames);
        println!("Plates read:     {}", stats.observations);
        println!("Vision faults:   {}", stats.faults);
        println!("Dropped frames:  {}", stats.dropped_frames);
        println!("-------------------------");
        println!("Entries:         {}", stats.entries);
        println!("Exits:           {}", stats.exits);
        println!("Duplicates:      {}", stats.duplicates);
        println!("Unknown:         {}", stats.unknown_vehicles);
        println!("Blocked alerts:  {}", stats.blocked_alerts);
    }
    Ok(())
}

pub fn output_observation(output_format: OutputFormat, observation: Option<&PlateObservation>) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&observation)?);
        return Ok(());
    }

    println!("\nRecognition Result");
    println!("==================");
    match observation {
        Some(observation) => {
            let (min_x, min_y, max_x, max_y) = observation.region.bounds();
            println!("Plate:           {}", observation.text);
            println!("Confidence:      {:.0}%", observation.confidence * 100.0);
            println!("Region:          ({}, {}) - ({}, {})", min_x, min_y, max_x, max_y);
        }
        None => println!("No plate found"),
    }
    Ok(())
}
