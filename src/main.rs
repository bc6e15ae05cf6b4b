use clap::Parser;
use log::{error, info, LevelFilter};
use registrar::configuration::config::{Args, Config};
use registrar::controller::controller_handler::Controller;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            // logging is configured from the file, so report this one directly
            env_logger::Builder::from_default_env()
                .filter_level(LevelFilter::Info)
                .format_target(false)
                .init();
            error!("Unable to import configuration from file: {}", e);
            std::process::exit(1);
        }
    };

    env_logger::Builder::new()
        .filter_level(config.log_filter().unwrap_or(LevelFilter::Info))
        .parse_default_env()
        .format_target(false)
        .init();

    info!(
        "Registrar v{} starting with configuration {}",
        env!("CARGO_PKG_VERSION"),
        args.config_file.display()
    );

    let mut controller = match Controller::new(config) {
        Ok(controller) => controller,
        Err(e) => {
            error!("Unable to create a controller instance: {}, exiting...", e);
            std::process::exit(1);
        }
    };

    let result = tokio::spawn(async move {
        info!("Spawning the controller");
        controller.run().await
    })
    .await;

    match result {
        Ok(Ok(())) => info!("Registrar stopped"),
        Ok(Err(e)) => {
            error!("Error occured in the controller process: {}, exiting...", e);
            std::process::exit(1);
        }
        Err(e) => {
            error!("Error joining at the end of execution: {:?}", e);
            std::process::exit(1);
        }
    }
}
