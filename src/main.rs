use sphsim::simulation::integrator;
use sphsim::{bench_gravity, bench_step};
use sphsim::{KernelTable, Scenario, ScenarioConfig, System};

use anyhow::{Context, Result};
use clap::Parser;

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
struct Args {
    /// Scenario YAML; the built-in reference cloud is used when omitted
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// File for the final particle records; must not exist yet
    #[arg(short, long, default_value = "log.txt")]
    output: PathBuf,

    /// Run the gravity and pipeline benchmarks instead of a simulation
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario(args: &Args) -> Result<ScenarioConfig> {
    match &args.scenario {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open scenario {}", path.display()))?;
            let reader = BufReader::new(file);
            let cfg: ScenarioConfig = serde_yaml::from_reader(reader)?;
            Ok(cfg)
        }
        None => Ok(ScenarioConfig::default()),
    }
}

/// One line per particle: the three position components and the density.
fn write_final_state(path: &Path, system: &System) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for p in &system.particles {
        writeln!(out, "{} {} {} {}", p.x.x, p.x.y, p.x.z, p.rho)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.bench {
        bench_gravity();
        bench_step();
        return Ok(());
    }

    let cfg = load_scenario(&args)?;
    let Scenario {
        parameters,
        mut system,
    } = Scenario::build_scenario(cfg);
    let kernel = KernelTable::new();

    println!(
        "running {} particles to t = {} with dt = {}",
        system.len(),
        parameters.t_end,
        parameters.dt
    );

    let mut steps = 0usize;
    while system.t < parameters.t_end {
        integrator::step(&mut system, &parameters, &kernel)?;
        steps += 1;
        if steps % 100 == 0 {
            println!("step {steps:5}, t = {:8.1}", system.t);
        }
    }

    write_final_state(&args.output, &system)?;
    println!("finished after {steps} steps; wrote {}", args.output.display());

    Ok(())
}
