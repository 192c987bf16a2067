use std::env;

use anyhow::Result;
use log::*;

use engine::{Engine, EngineConfig};

const SHADER_DIR_VAR: &str = "HELLO_TRIANGLE_SHADER_DIR";

fn main() -> Result<()> {
    pretty_env_logger::init();

    let shader_dir = env::var(SHADER_DIR_VAR)
        .unwrap_or_else(|_| concat!(env!("CARGO_MANIFEST_DIR"), "/shaders").to_string());
    let config = EngineConfig::default().with_shader_dir(shader_dir);

    match Engine::new(&config).and_then(Engine::run) {
        Err(err) => error!("{:#}", err),
        Ok(()) => info!("Exited cleanly."),
    }

    Ok(())
}
