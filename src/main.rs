use std::process::ExitCode;

use anyhow::Result;

use engine::{Engine, EngineConfig};

fn run() -> Result<()> {
    let config = EngineConfig::from_env()?;
    let engine = Engine::new(config)?;
    engine.run()
}

fn main() -> ExitCode {
    pretty_env_logger::init();

    match run() {
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::FAILURE
        }
        Ok(()) => ExitCode::SUCCESS,
    }
}
