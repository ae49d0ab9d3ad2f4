//! Gridlife CLI - Run simulations from JSON configuration.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use gridlife::{Simulator, schema::SimulationConfig};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [generations]", args[0]);
        eprintln!();
        eprintln!("Run a gridlife simulation from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to simulation configuration file");
        eprintln!("  generations  Number of generations (default: max_generations)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: SimulationConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    let generations: u32 = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(config.max_generations);

    println!("Gridlife Simulation");
    println!("===================");
    println!("Grid: {}x{}", config.width, config.height);
    println!("Population: {}", config.population);
    println!("Steps per generation: {}", config.steps_per_generation);
    println!(
        "Catalogue: {} sensors, {} actions",
        config.sensors.len(),
        config.actions.len()
    );
    println!("Challenge: {:?}", config.challenge);
    println!("Generations: {}", generations);
    println!();

    let mut sim = Simulator::new(config).unwrap_or_else(|e| {
        eprintln!("Error creating simulation: {}", e);
        std::process::exit(1);
    });
    println!("Seed: {}", sim.seed());
    println!();

    println!("Running simulation...");
    let start = Instant::now();

    let result = sim.run_with_callback(generations, |stats| {
        let elapsed = start.elapsed().as_secs_f32();
        println!(
            "  Generation {}: survivors={}/{} ({:.1}%), kills={}, diversity={:.3}, genome={:.1}, {:.1}s",
            stats.generation,
            stats.survivors,
            stats.population,
            stats.survival_percentage,
            stats.kills,
            stats.genetic_diversity,
            stats.mean_genome_length,
            elapsed
        );
    });
    if let Err(e) = result {
        eprintln!("Simulation stopped: {}", e);
        std::process::exit(1);
    }

    let elapsed = start.elapsed();
    let best = sim
        .history()
        .iter()
        .map(|s| s.survival_percentage)
        .fold(0.0f32, f32::max);

    println!();
    println!("Final state:");
    println!("  Generation: {}", sim.generation());
    println!("  Living: {}", sim.living().count());
    println!("  Best survival: {:.1}%", best);
    println!(
        "Time: {:.2}s ({:.2} generations/s)",
        elapsed.as_secs_f32(),
        generations as f32 / elapsed.as_secs_f32()
    );
}

fn print_example_config() {
    let config = SimulationConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
