use std::{path::PathBuf, process::exit};

use clap::Parser;

use crate::{
    app_init::{check_project_access, initialize_app, load_config, AppComponents},
    config::default_config_path,
    server::{ServerConfig, DEFAULT_HOST, DEFAULT_PORT},
};

mod app_init;
mod client;
mod config;
mod domain;
mod event;
mod id;
mod labels;
mod logging;
mod patterns;
mod result;
mod server;
mod webhook;
mod workflow;

/// GitLab webhook receiver that moves issues through a label workflow
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Alternate path to the configuration file.
    #[arg(short, long, value_name = "FILE", env = "AUTOLABEL_CONFIG")]
    config: Option<PathBuf>,
    /// Address to bind.
    #[arg(long, env = "AUTOLABEL_HOST", default_value = DEFAULT_HOST)]
    host: String,
    /// Port to listen on.
    #[arg(long, env = "AUTOLABEL_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Print the path to the configuration file and exit.
    #[arg(short, long)]
    print_config_path: bool,
    /// Load and validate the configuration file, then exit.
    #[arg(long)]
    check_config: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(default_config_path);

    if args.print_config_path {
        println!("{}", config_path.display());
        exit(0);
    }

    if args.check_config {
        load_config(&config_path)?;
        println!("{} is valid", config_path.display());
        exit(0);
    }

    let debug = std::env::var("AUTOLABEL_DEBUG").is_ok();
    let server_config = ServerConfig { host: args.host, port: args.port };

    let AppComponents { server, api, _log_guard } =
        initialize_app(&config_path, server_config, debug)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        check_project_access(&api).await;
        server.serve().await
    })?;

    Ok(())
}
