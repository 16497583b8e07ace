#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod basecall;
mod classify;
mod cli;
mod config;
mod patient;
mod pipeline;
mod qc;
mod report;
mod utils;

fn main() -> anyhow::Result<()> {
    // Set up configuration from CLI
    let cfg = config::handle_cli()?;
    debug!("{:?}", cfg);

    // Run the pipeline stages
    pipeline::run(&cfg)
}
