//! Voxel flow CLI - Run simulations from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use voxel_flow::{
    compute::{Simulation, SimulationStats},
    schema::{Seed, SimulationConfig},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [steps]", args[0]);
        eprintln!();
        eprintln!("Run a voxel flow simulation from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to simulation configuration file");
        eprintln!("  steps        Number of ticks (default: 100)");
        eprintln!();
        eprintln!("Print an example configuration with --example.");
        std::process::exit(1);
    }

    let config_path = PathBuf::from(&args[1]);
    let steps: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);

    let config = SimulationConfig::load(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });

    // Load or create seed
    let seed_path = config_path.with_extension("seed.json");
    let seed: Seed = if seed_path.exists() {
        let seed_str = fs::read_to_string(&seed_path).unwrap_or_else(|e| {
            eprintln!("Error reading seed file: {}", e);
            std::process::exit(1);
        });
        serde_json::from_str(&seed_str).unwrap_or_else(|e| {
            eprintln!("Error parsing seed: {}", e);
            std::process::exit(1);
        })
    } else {
        Seed::default()
    };

    println!("Voxel Flow Simulation");
    println!("=====================");
    println!(
        "Grid: {}x{}x{} (max density {})",
        config.width, config.height, config.depth, config.max_density
    );
    println!("Directions: {:?}", Vec::from(config.flow.directions));
    println!(
        "Flow rate: {} ({:?}, {:?})",
        config.flow.flow_rate, config.flow.scheme, config.mode
    );
    println!("Steps: {}", steps);
    println!();

    let mut simulation = Simulation::from_seed(&seed, config).unwrap_or_else(|e| {
        eprintln!("Error initializing simulation: {}", e);
        std::process::exit(1);
    });
    if let Some(random_seed) = simulation.last_seed() {
        println!("Random seed: {}", random_seed);
    }

    let initial_stats = simulation.stats();
    println!("Initial state:");
    print_stats(&initial_stats);
    println!();

    println!("Running simulation...");
    let start = Instant::now();

    for i in 0..steps {
        simulation.tick();

        // Print progress every 10%
        if (i + 1) % (steps / 10).max(1) == 0 {
            let stats = simulation.stats();
            let elapsed = start.elapsed().as_secs_f32();
            let steps_per_sec = (i + 1) as f32 / elapsed;
            println!(
                "  Step {}/{}: density={}, active={}, {:.1} steps/s",
                i + 1,
                steps,
                stats.total_density,
                stats.active_cells,
                steps_per_sec
            );
        }
    }

    let elapsed = start.elapsed();
    let final_stats = simulation.stats();

    println!();
    println!("Final state:");
    print_stats(&final_stats);
    println!();
    println!(
        "Density drift: {:+}",
        final_stats.total_density - initial_stats.total_density
    );
    println!(
        "Time: {:.2}s ({:.1} steps/s)",
        elapsed.as_secs_f32(),
        steps as f32 / elapsed.as_secs_f32()
    );

    simulation.dispose();
}

fn print_stats(stats: &SimulationStats) {
    println!("  Total density: {}", stats.total_density);
    println!("  Active cells: {}", stats.active_cells);
    println!(
        "  Value range: [{}, {}], mean {:.3}",
        stats.min_density, stats.max_density, stats.mean_density
    );
}

fn print_example_config() {
    let config = SimulationConfig::default();
    let seed = Seed::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
    println!();
    println!("Example seed (config.seed.json):");
    match serde_json::to_string_pretty(&seed) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing seed: {}", e),
    }
}
