//! list_models - print the model ids offered by the configured chat provider

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use objeto3d::llm::{list_models, models_url};
use objeto3d::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "list_models", about = "List models available from the chat provider")]
struct Args {
    /// TOML config file (default: $APP_CONFIG)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = AppConfig::load(args.config.as_deref())?;
    cfg.llm.validate()?;
    log::info!("querying {}", models_url(&cfg.llm.base_url));

    for id in list_models(&cfg.llm)? {
        println!("{}", id);
    }
    Ok(())
}
