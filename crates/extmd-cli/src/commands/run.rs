use crate::cli::RunArgs;
use crate::config::PartialRunConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use extmd::{
    core::io::{traits::TrajectoryFormat, trr::TrrFormat},
    engine::{external::ExternalEngine, progress::ProgressReporter},
    workflows::segment::{self, StopReason},
};
use tracing::{info, warn};

pub fn run(args: RunArgs) -> Result<()> {
    let partial_config = PartialRunConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;

    let mut engine = ExternalEngine::new(config.engine);
    info!(
        "Engine '{}' working in {:?}",
        engine.name(),
        engine.base_dir()
    );

    if let Some(source) = &args.initial_frame {
        info!("Loading initial condition from {:?}", source);
        let frame = TrrFormat.read(source, 0)?;
        let snapshot = engine.write_initial_frame(&frame)?;
        println!(
            "Initial frame ({} atoms) written as {}",
            frame.n_atoms(),
            snapshot
        );
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Running segment {}...", args.segment);
    let result = segment::run(
        &mut engine,
        args.segment,
        &config.polling,
        |_| Ok(false),
        &reporter,
    )?;

    let trajectory = engine.trajectory_path(args.segment);
    match result.stop_reason {
        StopReason::PollLimit => {
            warn!("Gave up waiting for frame {}.", result.snapshots.len());
            println!(
                "Warning: no new frame after {} polls; engine was stopped.",
                config.polling.max_transient_polls.unwrap_or_default()
            );
        }
        StopReason::ProcessExited if result.exit_code != 0 => {
            warn!("mdrun exited with code {}.", result.exit_code);
            println!("Warning: mdrun exited with code {}.", result.exit_code);
        }
        _ => {}
    }

    match result.last() {
        Some(last) => println!(
            "✓ {} frame(s) in {} (last: {})",
            result.snapshots.len(),
            trajectory.display(),
            last
        ),
        None => println!("No complete frame was written to {}", trajectory.display()),
    }

    Ok(())
}
