//! Runs the two-tank demo and prints tank masses as the levels settle.
//!
//! ```sh
//! RUST_LOG=info cargo run -p bulkflow-network --example two_tanks [path/to/network.toml]
//! ```

use std::{env, error::Error, fs};

use bulkflow_network::{
    config::NetworkConfig,
    simulate::{self, Action, Event},
};
use nalgebra::Vector3;
use uom::si::{mass::kilogram, time::second};

const STEPS: usize = 6000;
const PRINT_EVERY: usize = 500;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let path = env::args().nth(1).unwrap_or_else(|| {
        concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos/two_tanks.toml").to_owned()
    });
    let config = NetworkConfig::from_toml_str(&fs::read_to_string(&path)?)?;
    let mut built = config.build()?;

    let mut names = vec![String::new(); built.names.len()];
    for (name, id) in &built.names {
        names[id.index()].clone_from(name);
    }

    println!("{:>8}  {}", "t [s]", names.join("  "));
    let print = |event: &Event| -> Option<Action> {
        if event.step % PRINT_EVERY == 0 {
            let masses: Vec<String> = event
                .report
                .masses
                .iter()
                .zip(&names)
                .map(|(mass, name)| format!("{:>w$.1}", mass.get::<kilogram>(), w = name.len()))
                .collect();
            println!("{:>8.2}  {}", event.time.get::<second>(), masses.join("  "));
        }
        None
    };

    let gravity = Vector3::new(0.0, 0.0, -9.81);
    let solution = simulate::run(&mut built.network, gravity, built.time_step, STEPS, print)?;

    println!(
        "finished after {} steps, {:.1} kg in the network",
        solution.steps,
        built.network.total_mass().get::<kilogram>()
    );
    Ok(())
}
