//! Command-line access to Foscam cameras listed in the camera registry.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use foscam_cgi as app;
use tracing_subscriber::EnvFilter;

use app::cgi::{CameraClient, CommandRequest, CommandResult, ConfigSection, Params};
use app::config::{CamerasConfig, ConfigLoadResult};

/// Send CGI commands to Foscam cameras.
#[derive(Parser)]
#[command(name = "foscam-cgi", version)]
struct Cli {
    /// Camera registry file (.toml or legacy .json)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Log every command URL and reply
    #[arg(long, short)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List configured cameras
    List,
    /// Run any CGI command
    Exec {
        camera: String,
        /// Command name, e.g. getDevState
        cmd: String,
        /// Parameters as key=value
        #[arg(value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Save a JPEG snapshot
    Snap {
        camera: String,
        #[arg(long, short, default_value = "snapshot.jpg")]
        output: PathBuf,
    },
    /// Turn motion detection on or off
    Motion {
        camera: String,
        state: Toggle,
        /// Use the FI9900P command set
        #[arg(long)]
        alt: bool,
    },
    /// Show alarm, record and storage state
    DevState { camera: String },
    /// Read device log records
    Log {
        camera: String,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        #[arg(long, default_value_t = 10)]
        count: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let _guard = match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    };

    let config_path = cli.config.clone().unwrap_or_else(CamerasConfig::default_path);
    tracing::debug!("Config path: {:?}", config_path);

    let config = match CamerasConfig::try_load(&config_path) {
        ConfigLoadResult::Loaded(config) => config,
        ConfigLoadResult::Missing => bail!("{} does not exist", config_path.display()),
        ConfigLoadResult::Invalid(e) => bail!("Config invalid: {e}"),
    };

    match cli.command {
        Command::List => {
            for (name, camera) in &config.cameras {
                println!("{name:16} {}:{} ({})", camera.host, camera.port, camera.login);
            }
        }
        Command::Exec { camera, cmd, params } => {
            let client = connect(&config, &camera, cli.verbose)?;
            let result = client.execute(&cmd, params.into_iter().collect()).await;
            print_result(&result);
        }
        Command::Snap { camera, output } => {
            let client = connect(&config, &camera, cli.verbose)?;
            let result = client.send_command(&CommandRequest::new("snapPicture2").raw()).await;
            let bytes = match result.into_raw_bytes() {
                Some(bytes) => bytes,
                None => bail!("Snapshot failed: camera unavailable"),
            };
            std::fs::write(&output, &bytes).with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Saved {} bytes to {}", bytes.len(), output.display());
        }
        Command::Motion { camera, state, alt } => {
            let client = connect(&config, &camera, cli.verbose)?;
            let enabled = matches!(state, Toggle::On);
            let code = if alt {
                client.set_motion_detection1(enabled).await
            } else {
                client.set_motion_detection(enabled).await
            };
            let section = if alt { ConfigSection::MotionDetect1 } else { ConfigSection::MotionDetect };
            println!("{}: {code}", section.set_command());
        }
        Command::DevState { camera } => {
            let client = connect(&config, &camera, cli.verbose)?;
            let result = client.execute("getDevState", Params::new()).await;
            print_result(&result);
        }
        Command::Log { camera, offset, count } => {
            let client = connect(&config, &camera, cli.verbose)?;
            let params = Params::new().with("offset", offset).with("count", count);
            let result = client.execute("getLog", params).await;
            print_result(&result);
        }
    }

    Ok(())
}

/// Build a client for a registry camera.
///
/// The CLI prints each reply, so it always awaits and ignores the `daemon` setting.
fn connect(config: &CamerasConfig, camera: &str, verbose: bool) -> anyhow::Result<CameraClient> {
    let settings = config.camera(camera)?;
    let endpoint = settings
        .endpoint_builder()
        .verbose(verbose || settings.verbose)
        .detached(false)
        .build()?;
    Ok(CameraClient::new(endpoint)?)
}

fn print_result(result: &CommandResult) {
    println!("result: {}", result.code);
    if let Some(fields) = result.fields() {
        for (key, value) in fields.iter() {
            println!("  {key} = {}", value.as_deref().unwrap_or(""));
        }
    }
}
