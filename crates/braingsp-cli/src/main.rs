//! CLI for braingsp: graph signal processing of brain timeseries on structural graphs.

mod commands;
mod error;
mod io;

use braingsp_core::{DEFAULT_ALPHA, DEFAULT_N_SURR, Tail};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "braingsp")]
#[command(about = "braingsp: structural decoupling and surrogate significance on structural graphs")]
#[command(version = braingsp_core::VERSION)]
struct Cli {
    /// Log debug detail (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph Laplacian of a structural connectivity matrix
    Laplacian {
        /// Structural connectivity matrix (.1D, .csv, .tsv or whitespace-separated text)
        #[arg(long)]
        sc: String,

        /// Use the symmetric-normalized Laplacian
        #[arg(long)]
        normalize: bool,

        /// Negative weight handling: absolute (default), remove, rescale
        #[arg(long, default_value = "absolute", value_parser = ["absolute", "remove", "rescale"])]
        negative: String,

        /// Output file; the extension picks the format (.csv when missing)
        #[arg(long)]
        output: String,
    },

    /// Eigendecompose the Laplacian and write eigenvalues and eigenvectors
    Decompose {
        #[arg(long)]
        sc: String,

        #[arg(long)]
        normalize: bool,

        #[arg(long, default_value = "absolute", value_parser = ["absolute", "remove", "rescale"])]
        negative: String,

        /// Writes PREFIX_eigenval and PREFIX_eigenvec
        #[arg(long)]
        output_prefix: String,

        /// Output format
        #[arg(long, default_value = "csv", value_parser = ["1D", "csv", "tsv"])]
        format: String,
    },

    /// Generate sign-flip surrogates of a timeseries as a JSON report.
    /// The last surrogate slice is the unrandomized reconstruction.
    Surrogates {
        #[arg(long)]
        sc: String,

        /// Timeseries matrix (nodes x timepoints)
        #[arg(long)]
        timeseries: String,

        /// Surrogate family: informed (true graph) or uninformed (configuration model)
        #[arg(long, default_value = "informed", value_parser = ["informed", "uninformed"])]
        kind: String,

        /// Number of surrogates
        #[arg(long, default_value_t = DEFAULT_N_SURR)]
        n_surr: usize,

        /// Random seed (defaults to 42 for informed, 98 for uninformed)
        #[arg(long)]
        seed: Option<u64>,

        /// Build surrogates from the unnormalized Laplacian
        #[arg(long)]
        no_normalize: bool,

        #[arg(long, default_value = "absolute", value_parser = ["absolute", "remove", "rescale"])]
        negative: String,

        /// JSON output file
        #[arg(long)]
        output: String,
    },

    /// Full structural decoupling workflow with surrogate significance testing
    Sdi {
        #[arg(long)]
        sc: String,

        /// Timeseries files, one per subject (nodes x timepoints each)
        #[arg(long, num_args = 1.., required = true)]
        timeseries: Vec<String>,

        #[arg(long, default_value = "informed", value_parser = ["informed", "uninformed"])]
        kind: String,

        #[arg(long, default_value_t = DEFAULT_N_SURR)]
        n_surr: usize,

        #[arg(long)]
        seed: Option<u64>,

        /// Testing method: frequentist (per subject) or bernoulli (group)
        #[arg(long, default_value = "frequentist")]
        method: String,

        /// Tail of the null distribution: two, greater, less
        #[arg(long, default_value = "two")]
        tail: String,

        /// Significance level
        #[arg(long, default_value_t = DEFAULT_ALPHA)]
        alpha: f64,

        /// Report SDI as a plain high/low ratio instead of on a log2 scale
        #[arg(long)]
        linear: bool,

        /// Skip z-scoring the timeseries
        #[arg(long)]
        no_zscore: bool,

        #[arg(long)]
        no_normalize: bool,

        #[arg(long, default_value = "absolute", value_parser = ["absolute", "remove", "rescale"])]
        negative: String,

        /// Writes PREFIX_sdi, PREFIX_sdi_masked, PREFIX_gsdi and PREFIX_report.json
        #[arg(long)]
        output_prefix: String,

        #[arg(long, default_value = "csv", value_parser = ["1D", "csv", "tsv"])]
        format: String,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn run(command: Commands) -> error::Result<()> {
    match command {
        Commands::Laplacian {
            sc,
            normalize,
            negative,
            output,
        } => commands::laplacian::run(commands::laplacian::LaplacianCommandConfig {
            sc_path: &sc,
            normalize,
            negative: commands::parse_negative(&negative),
            output_path: &output,
        }),
        Commands::Decompose {
            sc,
            normalize,
            negative,
            output_prefix,
            format,
        } => commands::decompose::run(commands::decompose::DecomposeCommandConfig {
            sc_path: &sc,
            normalize,
            negative: commands::parse_negative(&negative),
            output_prefix: &output_prefix,
            format: &format,
        }),
        Commands::Surrogates {
            sc,
            timeseries,
            kind,
            n_surr,
            seed,
            no_normalize,
            negative,
            output,
        } => commands::surrogates::run(commands::surrogates::SurrogatesCommandConfig {
            sc_path: &sc,
            timeseries_path: &timeseries,
            kind: commands::parse_kind(&kind),
            n_surr,
            seed,
            normalize: !no_normalize,
            negative: commands::parse_negative(&negative),
            output_path: &output,
        }),
        Commands::Sdi {
            sc,
            timeseries,
            kind,
            n_surr,
            seed,
            method,
            tail,
            alpha,
            linear,
            no_zscore,
            no_normalize,
            negative,
            output_prefix,
            format,
        } => commands::sdi::run(commands::sdi::SdiCommandConfig {
            sc_path: &sc,
            timeseries_paths: &timeseries,
            kind: commands::parse_kind(&kind),
            n_surr,
            seed,
            method: commands::parse_method(&method)?,
            tail: tail.parse::<Tail>()?,
            alpha,
            log2: !linear,
            zscore: !no_zscore,
            normalize: !no_normalize,
            negative: commands::parse_negative(&negative),
            output_prefix: &output_prefix,
            format: &format,
        }),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
