//! Station Host command-line client
//!
//! Queries a running Station Host (version, items, poses, parameters) and
//! converts poses between controller formats offline.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use station_link::{AsyncSession, ItemType, PortRange, PoseFormat, StationConfig};
use tracing::info;

/// Command line arguments for the Station Host client
#[derive(Parser)]
#[command(name = "station")]
#[command(about = "Talk to a Station Host simulation server")]
#[command(version)]
struct Args {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Server host override
    #[arg(long, global = true)]
    host: Option<String>,

    /// Server port override
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Show timing information
    #[arg(long, global = true)]
    timing: bool,

    /// Output format: text, json
    #[arg(long, default_value = "text", global = true)]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the server version and protocol build
    Version,
    /// List station items
    Items {
        /// Only items of this type code (2 = robot, 3 = frame, ...)
        #[arg(short = 't', long = "type")]
        kind: Option<i32>,
    },
    /// Show the pose of an item
    Pose {
        /// Item name
        name: String,
        /// Pose format (xyzrpw, kuka, abb, ur, ...)
        #[arg(long, default_value = "xyzrpw")]
        pose_format: PoseFormat,
        /// Absolute pose instead of relative to the parent
        #[arg(long)]
        absolute: bool,
    },
    /// Read or write a station parameter
    Param {
        name: String,
        /// New value; reads the parameter when omitted
        value: Option<String>,
    },
    /// Convert a pose between formats without a server
    Convert {
        #[arg(long)]
        from: PoseFormat,
        #[arg(long)]
        to: PoseFormat,
        /// Input values, in the order of the source format
        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<f64>,
    },
    /// Toggle automatic rendering
    Render {
        /// Render after every change
        #[arg(long)]
        always: bool,
    },
}

/// One JSON output record
#[derive(Serialize)]
struct Report<T: Serialize> {
    timestamp: String,
    command: &'static str,
    data: T,
}

#[derive(Serialize)]
struct ItemEntry {
    name: String,
    kind: i32,
    ptr: String,
}

#[derive(Serialize)]
struct PoseEntry {
    name: String,
    format: PoseFormat,
    values: Vec<f64>,
}

fn emit<T: Serialize>(args: &Args, command: &'static str, data: T, text: impl FnOnce(&T)) -> Result<()> {
    match args.format.as_str() {
        "json" => {
            let report = Report {
                timestamp: Utc::now().to_rfc3339(),
                command,
                data,
            };
            println!("{}", serde_json::to_string(&report)?);
        }
        "text" => text(&data),
        other => bail!("Unknown output format: {}", other),
    }
    Ok(())
}

fn format_values(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.6}", v))
        .collect::<Vec<_>>()
        .join(" ")
}

fn load_config(args: &Args) -> Result<StationConfig> {
    let mut config = match &args.config {
        Some(path) => StationConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => StationConfig::from_env().context("Failed to read environment overrides")?,
    };
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.ports = PortRange::single(port);
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging based on verbosity
    let filter = if args.verbose {
        "station=debug,station_link=debug"
    } else {
        "station=warn,station_link=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Convert { from, to, values } = &args.command {
        return convert(&args, *from, *to, values);
    }

    let config = load_config(&args)?;
    let start_time = Instant::now();
    let session = AsyncSession::connect(config)
        .await
        .context("Failed to connect to Station Host")?;
    info!(
        "Connected to Station Host (API {}, build {})",
        session.session().api_version(),
        session.session().build()
    );

    let result = run_command(&args, &session).await;
    if args.timing {
        eprintln!("Timing: {}ms", start_time.elapsed().as_millis());
    }
    session.disconnect().await?;
    result
}

async fn run_command(args: &Args, session: &AsyncSession) -> Result<()> {
    match &args.command {
        Commands::Version => {
            let version = session.version().await.context("Version query failed")?;
            emit(args, "version", version, |v| {
                println!("{} {} ({}-bit, built {})", v.application, v.version, v.bits, v.build_date);
            })
        }
        Commands::Items { kind } => {
            let kind = kind.map(ItemType::from);
            let entries = session
                .run(move |s| {
                    s.items(kind)?
                        .into_iter()
                        .map(|item| -> station_link::Result<ItemEntry> {
                            Ok(ItemEntry {
                                name: item.name()?,
                                kind: item.kind().code(),
                                ptr: format!("{:#x}", item.ptr()),
                            })
                        })
                        .collect::<station_link::Result<Vec<_>>>()
                })
                .await
                .context("Item listing failed")?;
            emit(args, "items", entries, |entries| {
                for entry in entries {
                    println!("{:>4}  {}", entry.kind, entry.name);
                }
            })
        }
        Commands::Pose {
            name,
            pose_format,
            absolute,
        } => {
            let item = session.item(name, None).await?;
            if !item.valid() {
                bail!("No item named {:?}", name);
            }
            let absolute = *absolute;
            let pose = session
                .run(move |_| if absolute { item.pose_abs() } else { item.pose() })
                .await
                .with_context(|| format!("Failed to read pose of {}", name))?;
            let entry = PoseEntry {
                name: name.clone(),
                format: *pose_format,
                values: pose_format.encode(&pose),
            };
            emit(args, "pose", entry, |entry| {
                println!("{} [{}]: {}", entry.name, entry.format, format_values(&entry.values));
            })
        }
        Commands::Param { name, value } => {
            let (name, value) = (name.clone(), value.clone());
            let shown = name.clone();
            let current = session
                .run(move |s| {
                    if let Some(value) = value {
                        s.set_param(&name, value)?;
                    }
                    s.param(&name)
                })
                .await
                .with_context(|| format!("Parameter {} failed", shown))?;
            emit(args, "param", current, |current| match current {
                Some(value) => println!("{} = {}", shown, value),
                None => println!("{} is not set", shown),
            })
        }
        Commands::Render { always } => {
            let always = *always;
            session.run(move |s| s.render(always)).await?;
            emit(args, "render", always, |always| {
                println!("Rendering {}", if *always { "always on" } else { "on demand" });
            })
        }
        Commands::Convert { .. } => Ok(()),
    }
}

fn convert(args: &Args, from: PoseFormat, to: PoseFormat, values: &[f64]) -> Result<()> {
    let pose = from
        .decode(values)
        .with_context(|| format!("Invalid {} pose", from))?;
    let entry = PoseEntry {
        name: from.to_string(),
        format: to,
        values: to.encode(&pose),
    };
    emit(args, "convert", entry, |entry| {
        println!("{}", format_values(&entry.values));
    })
}
