use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, error, info};

use influxcat::commands::{
    execute_dump, execute_restore, execute_version, failure_message, VERSION,
};
use influxcat::{init_logging, FileConfig, LogFormat, LoggingConfig, Overrides, Settings};

#[derive(Parser)]
#[command(name = "influxcat")]
#[command(about = "Dump and restore InfluxDB measurements as JSON snapshots")]
#[command(version)]
struct Cli {
    /// Configuration file path (default: $HOME/.influxcat.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// InfluxDB address
    #[arg(short, long, env = "INFLUXCAT_ADDR", global = true)]
    addr: Option<String>,

    /// InfluxDB username
    #[arg(short, long, env = "INFLUXCAT_USERNAME", global = true)]
    username: Option<String>,

    /// InfluxDB password
    #[arg(short, long, env = "INFLUXCAT_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Database to dump from or restore into
    #[arg(short, long, env = "INFLUXCAT_DATABASE", global = true)]
    database: Option<String>,

    /// Measurement to dump or restore
    #[arg(short, long, env = "INFLUXCAT_SERIES", global = true)]
    series: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump a measurement to a snapshot file
    Dump {
        /// Snapshot file to write
        output: PathBuf,
        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Restore a measurement from a snapshot file
    Restore {
        /// Snapshot file to read
        input: PathBuf,
    },
    /// Print the version number
    Version,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            addr: self.addr.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            series: self.series.clone(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let log_format = cli.log_format;

    if let Err(e) = init_logging(&LoggingConfig::new(cli.verbose, log_format)) {
        eprintln!("{:#}", e);
    }

    if let Err(e) = run(cli).await {
        if log_format == LogFormat::Json {
            error!("{:#}", e);
        }
        // Printed regardless of the log filter
        eprintln!("{}", failure_message(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Version = cli.command {
        execute_version();
        return Ok(());
    }

    debug!("influxcat v{} starting", VERSION);

    let file = FileConfig::locate(cli.config.as_deref())?;
    let settings = Settings::resolve(cli.overrides(), file);
    debug!(
        "Using {} (database {:?}, series {:?})",
        settings.influx.addr, settings.database, settings.series
    );

    match cli.command {
        Commands::Dump { output, pretty } => {
            let summary = execute_dump(&settings, &output, pretty).await?;
            info!("Wrote {}", summary.path.display());
        }
        Commands::Restore { input } => {
            let stats = execute_restore(&settings, &input).await?;
            if stats.dropped_values > 0 {
                info!("{} values had no column mapping and were skipped", stats.dropped_values);
            }
        }
        Commands::Version => {}
    }

    Ok(())
}
