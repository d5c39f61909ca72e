use kalman_pose_filter::simulation::{run_session, TrajectoryConfig};
use kalman_pose_filter::{ConfigurationManager, FilterPipeline};
use log::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 3 {
        eprintln!(
            "Usage: {} [config.json] [seed]",
            args.first().map_or("pose-filter-demo", |s| s.as_str())
        );
        return Err("Invalid arguments".into());
    }

    let manager = match args.get(1) {
        Some(path) => {
            info!("loading filter configuration from {}", path);
            ConfigurationManager::from_file(path)?
        }
        None => ConfigurationManager::new(),
    };
    let seed = match args.get(2) {
        Some(s) => s.parse::<u64>()?,
        None => TrajectoryConfig::default().seed,
    };

    let trajectory = TrajectoryConfig {
        seed,
        ..TrajectoryConfig::default()
    };
    let frames = trajectory.frames;
    let dt = trajectory.dt;

    let mut pipeline = FilterPipeline::new(manager.config().clone());
    let summary = run_session(&mut pipeline, trajectory)?;

    println!("=== Pose filter session ===");
    println!("Frames: {} at {:.1} Hz ({} stale)", frames, 1.0 / dt, summary.stale_frames);
    println!(
        "RMS error:  raw {:.4}, filtered {:.4}",
        summary.raw_rms_error, summary.filtered_rms_error
    );
    println!(
        "Jitter:     raw {:.4}, filtered {:.4}",
        summary.raw_jitter, summary.filtered_jitter
    );
    println!("Final process noise scale: {:.3}", pipeline.scaler().scale());
    println!("\n--- Diagnostics ---");
    println!("{}", pipeline.diagnostics().to_json()?);

    Ok(())
}
