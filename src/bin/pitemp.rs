// bin/pitemp.rs

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use pitemp::*;
use tokio::task::JoinSet;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let hostname = short_hostname().context("Cannot obtain hostname")?;
    let config = MyConfig::from_args(args, &hostname).context("Incorrect use of flags")?;

    info!("Starting up pitemp {PKG_VERSION} ({GIT_COMMIT}).");
    info!("Thermal file: {:?}.", config.thermal_file);

    let mqtt_enabled = config.mqtt.enabled;
    let shared_state = Arc::new(MyState::new(config));

    let mut tasks = JoinSet::new();
    let state = shared_state.clone();
    tasks.spawn(async move { ("run_api_server()", run_api_server(state).await) });
    if mqtt_enabled {
        let state = shared_state.clone();
        tasks.spawn(async move { ("run_mqtt()", run_mqtt(state).await) });
    }

    while let Some(joined) = tasks.join_next().await {
        let (name, res) = joined.context("task panicked")?;
        match res {
            Ok(()) => info!("{name} ended."),
            Err(e) => return Err(e.context(format!("{name} failed"))),
        }
    }

    info!("All tasks ended, exit.");
    Ok(())
}

// EOF
