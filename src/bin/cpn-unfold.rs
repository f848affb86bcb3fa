//! Command-line front end for the unfolder
//!
//! Usage: cpn-unfold unfold --context-type FREE --net Bank.lna ... [options]

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use cpn_unfolder::{translate, unfold, ContextKind, UnfoldInputs};

mod cli;

use cli::{OutputFiles, OutputFormat};

#[derive(Parser)]
#[command(name = "cpn-unfold")]
#[command(about = "Unfold smart-contract CPNs and compile LTL properties for Helena", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the contract net with a context and compile the property
    Unfold {
        /// Context type (DCR, CPN or FREE)
        #[arg(long)]
        context_type: ContextKind,

        /// Context net in LNA (DCR contexts already translated)
        #[arg(long)]
        context: Option<PathBuf>,

        /// Contract net in LNA
        #[arg(long)]
        net: PathBuf,

        /// Statement index JSON
        #[arg(long)]
        statements: PathBuf,

        /// Property request JSON
        #[arg(long)]
        property: PathBuf,

        /// Initial marking JSON
        #[arg(long)]
        marking: PathBuf,

        /// Output directory
        #[arg(long, default_value = "./")]
        output_path: PathBuf,

        /// Output file stem
        #[arg(long, default_value = "output")]
        output_name: String,

        /// Seed for the random balance policy
        #[arg(long)]
        seed: Option<u64>,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Compile only the property
    Property {
        /// Statement index JSON
        #[arg(long)]
        statements: PathBuf,

        /// Property request JSON
        #[arg(long)]
        property: PathBuf,

        /// Output directory
        #[arg(long, default_value = "./")]
        output_path: PathBuf,

        /// Output file stem
        #[arg(long, default_value = "output")]
        output_name: String,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match cli.command {
        Commands::Unfold {
            context_type,
            context,
            net,
            statements,
            property,
            marking,
            output_path,
            output_name,
            seed,
            format,
        } => handle_unfold(UnfoldArgs {
            context_type,
            context,
            net,
            statements,
            property,
            marking,
            output: OutputFiles::new(&output_path, &output_name),
            seed,
            format,
        }),
        Commands::Property {
            statements,
            property,
            output_path,
            output_name,
            format,
        } => handle_property(
            statements,
            property,
            OutputFiles::new(&output_path, &output_name),
            format,
        ),
    };

    std::process::exit(exit_code);
}

struct UnfoldArgs {
    context_type: ContextKind,
    context: Option<PathBuf>,
    net: PathBuf,
    statements: PathBuf,
    property: PathBuf,
    marking: PathBuf,
    output: OutputFiles,
    seed: Option<u64>,
    format: OutputFormat,
}

fn handle_unfold(args: UnfoldArgs) -> i32 {
    match run_unfold(args) {
        Ok(summary) => {
            print!("{}", summary);
            0
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn run_unfold(args: UnfoldArgs) -> Result<String> {
    let context = cli::load_context(args.context_type, args.context.as_deref())?;
    let contract = cli::load_net(&args.net)?;
    let index = cli::load_index(&args.statements)?;
    let request = cli::load_request(&args.property)?;
    let marking = cli::load_marking(&args.marking)?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let inputs = UnfoldInputs {
        index: &index,
        request: &request,
        marking: &marking,
        contract,
    };
    let unfolded = unfold(inputs, &context, &mut rng).context("Unfolding failed")?;

    let mut output = args.output;
    let net_path = output.add(".lna", unfolded.net.clone());
    let property_path = output.add(".prop.lna", unfolded.property.clone());
    output.write_all()?;
    info!("wrote {} and {}", net_path.display(), property_path.display());

    Ok(cli::format_unfold(
        &unfolded,
        args.context_type,
        &net_path,
        &property_path,
        args.format,
    ))
}

fn handle_property(statements: PathBuf, property: PathBuf, output: OutputFiles, format: OutputFormat) -> i32 {
    match run_property(&statements, &property, output, format) {
        Ok(summary) => {
            print!("{}", summary);
            0
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn run_property(
    statements: &Path,
    property: &Path,
    mut output: OutputFiles,
    format: OutputFormat,
) -> Result<String> {
    let index = cli::load_index(statements)?;
    let request = cli::load_request(property)?;
    let compiled = translate(&index, &request).context("Property compilation failed")?;

    let property_path = output.add(".prop.lna", compiled.property.clone());
    let propositions_path = output.add(".propositions.lna", compiled.propositions.clone());
    output.write_all()?;

    Ok(cli::format_property(&compiled, &property_path, &propositions_path, format))
}
