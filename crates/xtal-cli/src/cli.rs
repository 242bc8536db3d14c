use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use xtal::core::density::map::DEFAULT_RADIUS;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "xtal - inspect crystallographic coordinate files, CIF dictionaries and electron density maps.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Configuration file in TOML format with [connectivity] and [map] tables
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a PDB, mmCIF, small-molecule CIF or monomer library file and summarize it.
    Model(ModelArgs),
    /// Decode a CCP4 or DSN6 density map and summarize it.
    Map(MapArgs),
    /// List the data blocks, categories and loops of any CIF file.
    Cif(CifArgs),
}

/// Arguments for the `model` subcommand.
#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Structure file (.pdb, .ent, .cif, .mmcif).
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Print the atoms matching a selection, e.g. "chain=A resi=10-20 name=CA".
    #[arg(short, long, value_name = "EXPR")]
    pub select: Option<String>,

    /// Override the heavy-atom bond threshold in Angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub max_bond_length: Option<f64>,

    /// Override the spatial hash bucket edge in Angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub box_length: Option<f64>,
}

/// Arguments for the `map` subcommand.
#[derive(Args, Debug)]
pub struct MapArgs {
    /// Density map (.ccp4, .map, .mrc, .dsn6, .omap, .brix).
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Extract the grid box around a Cartesian point given as x,y,z.
    #[arg(long, value_name = "X,Y,Z", value_parser = parse_point, allow_hyphen_values = true)]
    pub center: Option<[f64; 3]>,

    /// Half-edge of the extracted box in Angstroms.
    #[arg(long, value_name = "FLOAT", default_value_t = DEFAULT_RADIUS)]
    pub radius: f64,

    /// Keep raw DSN6 densities instead of normalizing to mean 0, sigma 1.
    #[arg(long)]
    pub no_sigma_scale: bool,
}

/// Arguments for the `cif` subcommand.
#[derive(Args, Debug)]
pub struct CifArgs {
    /// Any CIF or mmCIF file.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

fn parse_point(text: &str) -> Result<[f64; 3], String> {
    let values = text
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate in '{}': {}", text, e))?;
    <[f64; 3]>::try_from(values).map_err(|v| format!("expected three comma-separated values, got {}", v.len()))
}
