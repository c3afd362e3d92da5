use std::io;
use std::sync::Arc;

use anyhow::Result;
use log::info;

use namescope::config::Config;
use namescope::data::loader;
use namescope::worker::Worker;

fn main() -> Result<()> {
    let config = Config::from_env();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level)).init();

    // The dataset is fully loaded before the worker can see it.
    let dataset = Arc::new(loader::load_file(&config.data_path)?);
    let worker = Worker::new(dataset);

    info!("ready, reading queries from stdin");
    worker.run(io::stdin().lock(), io::stdout().lock())
}
