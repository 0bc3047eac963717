use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (gnsspack ",
    env!("GNSSPACK_VERSION"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Debug, ClapParser)]
#[command(
    name       = env!("CARGO_PKG_NAME"),
    version    = VERSION,
    author     = env!("CARGO_PKG_AUTHORS"),
    about      = "Tools for inspecting and de-multiplexing bit-packed GNSS sample recordings",
    long_about = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Split a recording into one output file per stream.
    Convert(ConvertArgs),

    /// Print the lane plans and stream metadata of a descriptor
    Info(InfoArgs),

    /// Print per-stream sample statistics as YAML.
    Stats(StatsArgs),
}

#[derive(Debug, Args)]
pub struct RecordingArgs {
    /// YAML format descriptor.
    #[arg(value_name = "DESCRIPTOR")]
    pub descriptor: PathBuf,

    /// Directory the descriptor's file URLs are relative to
    /// (defaults to the descriptor's directory).
    #[arg(long, value_name = "PATH")]
    pub path_prefix: Option<PathBuf>,

    /// Run every lane on its own thread.
    #[arg(long)]
    pub parallel: bool,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub recording: RecordingArgs,

    /// Output directory and base name, e.g. `out/session1`.
    #[arg(long, value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// Container for the sample files.
    #[arg(long, value_enum, default_value_t = OutputFormat::Raw)]
    pub format: OutputFormat,

    /// Numeric type each sample component is written as.
    #[arg(long, value_enum, default_value_t = SampleType::I16)]
    pub sample_type: SampleType,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// YAML format descriptor.
    #[arg(value_name = "DESCRIPTOR")]
    pub descriptor: PathBuf,

    /// Also list every unit of every chunk plan.
    #[arg(long)]
    pub units: bool,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub recording: RecordingArgs,

    /// Leave value histograms out of the report.
    #[arg(long)]
    pub no_histogram: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Headerless little-endian samples, I/Q interleaved.
    Raw,
    /// Sony Wave64 (.w64), one channel for real and two for complex streams.
    W64,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SampleType {
    I8,
    I16,
    I32,
    /// IEEE 754 single precision.
    F32,
}

impl SampleType {
    pub fn bits(self) -> u32 {
        match self {
            SampleType::I8 => 8,
            SampleType::I16 => 16,
            SampleType::I32 | SampleType::F32 => 32,
        }
    }

    pub fn is_float(self) -> bool {
        self == SampleType::F32
    }
}
