use anyhow::Result;
use std::time::Instant;
use std::fs::File;
use std::io::Write;
use log::{info, warn, error, debug, trace};
use rand::prelude::*;

use sphere_common::{EngineConfig, Snapshot, Vec3};
use sphere_engine::placement::place_initial_spheres;
use sphere_engine::{Brick, RestSpring, World};

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting Sphere Engine...");

    // --- Load Configuration ---
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = EngineConfig::load(&config_path)?;
    debug!("Configuration: {:#?}", config);

    // --- Initialize World ---
    let interactor = RestSpring::from_config(&config.interaction, config.timing.dt);
    let mut world = World::with_bounds(
        Vec3::from(config.domain.min),
        Vec3::from(config.domain.max),
        Vec3::from(config.domain.cell_size),
        interactor,
        config.timing.dt,
    );

    match &config.output.resume_from {
        Some(path) => {
            info!("Resuming from checkpoint '{}'...", path);
            world.load(path)?;
        }
        None => {
            info!("Placing initial spheres...");
            let mut rng = StdRng::seed_from_u64(config.initial_conditions.placement_seed);
            for s in place_initial_spheres(&config, &mut rng)? {
                world.add_sphere(s);
            }
            for b in &config.bricks {
                world.add_brick(Brick::new(Vec3::from(b.min), Vec3::from(b.max)));
            }
        }
    }
    info!(
        "World initialized with {} spheres, {} bricks, grid {:?}.",
        world.num_spheres(),
        world.num_bricks(),
        world.cell_counts()
    );

    // --- Simulation Loop ---
    let total_steps = config.timing.total_steps;
    let mut record_interval_steps = config.timing.record_interval_steps;
    if record_interval_steps == 0 {
        warn!("Record interval is 0 steps. Recording every step.");
        record_interval_steps = 1;
    }
    let with_positions = config.output.save_positions_in_snapshot;

    info!("Starting simulation loop for {} steps...", total_steps);
    let start_time = Instant::now();
    let mut previous_print_time = start_time;
    let mut removed_total: u32 = 0;
    let mut snapshots: Vec<Snapshot> = vec![world.snapshot(0, 0, with_positions)];

    for step in 0..total_steps {
        let step_start_time = Instant::now();
        removed_total += world.step() as u32;
        let step_duration = step_start_time.elapsed();

        let current_time = Instant::now();
        let print_interval_secs = 5.0;
        let should_print_status = current_time.duration_since(previous_print_time).as_secs_f64() >= print_interval_secs;
        let is_record_step = (step + 1) % record_interval_steps == 0;
        let is_last_step = step == total_steps - 1;

        if is_record_step || is_last_step {
            snapshots.push(world.snapshot(step + 1, removed_total, with_positions));
        }

        if should_print_status || is_last_step {
            info!(
                "Step [{}/{}] (t = {:.4}) | Spheres: {} | Removed: {} | Step Time: {:6.2} ms | Elapsed: {:.2} s",
                step + 1,
                total_steps,
                world.time(),
                world.num_spheres(),
                removed_total,
                step_duration.as_secs_f64() * 1000.0,
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = current_time;
        } else {
            trace!(
                "Step [{}/{}] completed in {:.2} ms",
                step + 1,
                total_steps,
                step_duration.as_secs_f64() * 1000.0
            );
        }
    }

    let total_duration = start_time.elapsed();
    info!("Simulation finished in {:.3} seconds.", total_duration.as_secs_f64());

    // --- Save Recorded Data ---
    let base = &config.output.base_filename;
    if config.output.save_snapshots {
        let output_format = config.output.format.as_deref().unwrap_or("json");
        if let Err(e) = write_snapshots(base, output_format, &snapshots) {
            error!("Error saving snapshots: {}", e);
        }
    } else {
        info!("Skipping saving snapshots as per config (save_snapshots is false).");
    }

    if config.output.save_positions {
        let filename = format!("{}_final_positions.csv", base);
        let mut writer = csv::Writer::from_path(&filename)?;
        writer.write_record(["x", "y", "z"])?;
        for s in world.spheres() {
            writer.write_record(&[format!("{:.6}", s.x.x), format!("{:.6}", s.x.y), format!("{:.6}", s.x.z)])?;
        }
        writer.flush()?;
        info!("Final positions saved to {}", filename);
    } else {
        info!("Skipping saving final positions as per config.");
    }

    if let Some(path) = &config.output.checkpoint {
        world.save(path)?;
    }

    info!("Simulation Complete.");
    Ok(())
}

/// Writes all recorded snapshots in the requested format. Unknown formats fall back to JSON.
fn write_snapshots(base: &str, format: &str, snapshots: &[Snapshot]) -> Result<()> {
    match format {
        "bincode" => {
            // Binary format (much more compact)
            let filename = format!("{}_snapshots.bin", base);
            bincode::serialize_into(File::create(&filename)?, snapshots)?;
            info!("All snapshots saved to {} (binary format)", filename);
        }
        "messagepack" => {
            // MessagePack format (compact and cross-platform)
            let filename = format!("{}_snapshots.msgpack", base);
            rmp_serde::encode::write(&mut File::create(&filename)?, snapshots)?;
            info!("All snapshots saved to {} (MessagePack format)", filename);
        }
        other => {
            if other != "json" {
                error!("Unknown output format: {}. Using JSON instead.", other);
            }
            let filename = format!("{}_snapshots.json", base);
            let json_string = serde_json::to_string(snapshots)?;
            File::create(&filename)?.write_all(json_string.as_bytes())?;
            info!("All snapshots saved to {} ({} bytes)", filename, json_string.len());
        }
    }
    Ok(())
}
