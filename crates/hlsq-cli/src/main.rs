//! `hlsq`: HLS project generation and equivalence testing.
//!
//! ```text
//! USAGE:
//!   hlsq generate [--topological]     Settings-driven generation pipeline
//!   hlsq compare <data> [-k] [-p]     Test and compare model variants
//!         [-c LOG] [-r LOG] [-s] [-v] [-n N] [--topological]
//! ```
//!
//! `generate` reads its settings from the `HLS4ML_*` and `VIVADO_BIN_DIR`
//! environment variables. `compare` uses the same variables for the network
//! source, precisions and toolchain location.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use hlsq_flow::backends::{EmulatedNetwork, Hls4mlBackend};
use hlsq_flow::toolchain::Toolchain;
use hlsq_flow::{
    ConfigGenerator, EquivalenceTester, FlowSettings, HlsBackend, InterfaceLayers, IoType,
    ManifestWriter, ModelBuilder, ModelDefaults, Pipeline, PipelineOutcome, ProjectTarget,
    RunLimits, SimLog, SynthesisPlan, Variant,
};
use hlsq_models::{DatasetProvider, JsonDatasetProvider, JsonNetworkProvider, NetworkProvider};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// `EX_USAGE` from sysexits.h
const EX_USAGE: i32 = 64;

#[derive(Parser)]
#[command(name = "hlsq", about = "HLS precision configuration and equivalence testing", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Generate the HLS project, test it and optionally synthesize it.
    Generate {
        /// Detect input/output layers by graph position instead of by name.
        #[arg(long)]
        topological: bool,
    },
    /// Test and compare the trained model, the hardware model and simulation logs.
    Compare(CompareArgs),
}

#[derive(Args)]
struct CompareArgs {
    /// Test data (JSON with samples and labels).
    data_path: PathBuf,
    /// Number of samples to test (default: every sample; logs must then
    /// hold exactly one line per sample).
    #[arg(short, long)]
    num: Option<usize>,
    /// Test and compare the trained model.
    #[arg(short = 'k', long = "trained")]
    trained: bool,
    /// Test and compare the emulated hardware model.
    #[arg(short = 'p', long = "hardware")]
    hardware: bool,
    /// Log file containing output from the C simulation.
    #[arg(short, long)]
    csim: Option<PathBuf>,
    /// Log file containing output from the C/RTL cosimulation.
    #[arg(short = 'r', long)]
    cosim: Option<PathBuf>,
    /// Run HLS synthesis of the model.
    #[arg(short, long)]
    synth: bool,
    /// Run Verilog synthesis of the model.
    #[arg(short, long)]
    vsynth: bool,
    /// Expected number of classes per log line (default: from the test data).
    #[arg(long)]
    classes: Option<usize>,
    /// Directory for the test project.
    #[arg(long, default_value = "./hls4ml_test_proj")]
    project: PathBuf,
    /// Detect input/output layers by graph position instead of by name.
    #[arg(long)]
    topological: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Flag combinations are checked before anything else happens.
    if let Cmd::Compare(args) = &cli.command {
        if let Err(e) = SynthesisPlan::new(args.synth, args.vsynth) {
            eprintln!("{e}");
            std::process::exit(EX_USAGE);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    match cli.command {
        Cmd::Generate { topological } => cmd_generate(topological)?,
        Cmd::Compare(args) => cmd_compare(&args)?,
    }

    Ok(())
}

fn cmd_generate(topological: bool) -> Result<()> {
    println!("Beginning generation of HLS project");
    println!();

    let settings = FlowSettings::from_env().context("Invalid settings")?;
    println!("{}", settings.describe());

    let backend = Hls4mlBackend::new(Toolchain::new(&settings.toolchain_dir));
    let mut pipeline = Pipeline::new(settings, &JsonNetworkProvider, &JsonDatasetProvider, &backend)
        .with_generator_name(generator_name());
    if topological {
        pipeline = pipeline.with_interface(InterfaceLayers::Topological);
    }

    match pipeline.run()? {
        PipelineOutcome::Completed { project, test, reports } => {
            if let Some(test) = test {
                print!("{}", test.report());
            }
            for report in reports.csynth.iter().chain(&reports.vsynth) {
                println!("Report: {}", report.display());
            }
            println!("Project written to {}", project.output_dir().display());
        }
        PipelineOutcome::Rejected { test, .. } => {
            print!("{}", test.report());
            println!(
                "Network fails to meet match threshold of {}%. Skipping build of network",
                pipeline.settings().match_threshold
            );
        }
    }

    Ok(())
}

fn cmd_compare(args: &CompareArgs) -> Result<()> {
    let plan = SynthesisPlan::new(args.synth, args.vsynth)?;
    if !(args.trained || args.hardware || args.csim.is_some() || args.cosim.is_some() || args.synth) {
        bail!("Nothing to compare: pass -k, -p, -c or -r");
    }

    let settings = FlowSettings::from_env().context("Invalid settings")?;
    let dataset = JsonDatasetProvider.load_dataset(&args.data_path)?;
    let num_classes = args.classes.unwrap_or_else(|| dataset.num_classes());
    tracing::debug!("{} samples, {num_classes} classes", dataset.len());

    let needs_project = args.hardware || args.synth;
    let network = if args.trained || needs_project {
        Some(JsonNetworkProvider.load_network(&settings.weights_path)?)
    } else {
        None
    };

    let backend = Hls4mlBackend::new(Toolchain::new(&settings.toolchain_dir));
    let manifest = ManifestWriter::new(&args.project);
    let built = match &network {
        Some(network) if needs_project => {
            let mut generator = ConfigGenerator::new(settings.interface_precision)
                .with_override(settings.overrides.clone());
            if args.topological {
                generator = generator.with_interface(InterfaceLayers::Topological);
            }
            let config = generator.generate(
                network.graph(),
                ProjectTarget::new(&args.project, &settings.weights_path),
            )?;
            let params = settings.parameter_record(&ModelDefaults::default(), IoType::default());
            Some(
                ModelBuilder::new(&backend, &manifest)
                    .with_generator(generator_name())
                    .build(&config, network, &params)?,
            )
        }
        _ => None,
    };

    let mut tester = EquivalenceTester::new().with_limit(args.num);
    if let (true, Some(network)) = (args.trained, &network) {
        tester = tester.with_model(Variant::Trained, network);
    }
    if let (true, Some(built)) = (args.hardware, &built) {
        tester = tester.with_model(Variant::Emulated, &built.emulated);
    }
    for (variant, path) in [(Variant::CSim, &args.csim), (Variant::Cosim, &args.cosim)] {
        if let Some(path) = path {
            let log = SimLog::from_file(path, num_classes)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            tester = tester.with_log(variant, log);
        }
    }

    if args.trained || args.hardware || args.csim.is_some() || args.cosim.is_some() {
        let outcome = tester.run(&dataset)?;
        print!("{}", outcome.report());
        if built.is_some() {
            manifest.append_test_results(&outcome)?;
        }
    }

    if let (true, Some(built)) = (args.synth, &built) {
        let limits = RunLimits::unlimited().with_timeout(settings.synth_timeout);
        let reports = backend.synthesize(&built.project, plan, &limits)?;
        manifest.append_synthesis_reports(&reports)?;
        for report in reports.csynth.iter().chain(&reports.vsynth) {
            println!("Report: {}", report.display());
        }
    }

    Ok(())
}

/// Program name recorded in the manifest
fn generator_name() -> String {
    std::env::args().next().unwrap_or_else(|| "hlsq".into())
}
