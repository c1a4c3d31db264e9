use anyhow::Result;
use clap::{Parser, Subcommand};
use ssd_qual::command::SystemRunner;
use ssd_qual::drives::MountGuard;
use ssd_qual::logging::init_command_logging;
use ssd_qual::scheduler::TestOutcome;
use ssd_qual::{QualConfig, QualError, QualOrchestrator, TestCase};

#[derive(Parser)]
#[command(name = "ssd-qual")]
#[command(about = "SSD qualification orchestrator: discovery, secure erase and benchmark scheduling")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Model identifier used to filter the device inventory
    #[arg(long, global = true, env = "SSD_QUAL_MODEL")]
    model: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check run preconditions (root privileges)
    Initialise,

    /// Install environment prerequisites (not yet implemented)
    InstallPrerequisites,

    /// List discovered drives with their mount status
    List,

    /// Discover, mount-check and format the full drive pool
    SetupRaid {
        /// Request crypto erase where the controller supports it
        #[arg(long)]
        secure: bool,
    },

    /// Discover drives and run the benchmark suite on the first N
    RunTest {
        /// How many drives from the head of the ordered pool to test
        #[arg(long)]
        count: Option<usize>,

        /// Root directory for per-run working/report directories
        #[arg(long)]
        output_dir: Option<String>,

        /// External benchmark engine command
        #[arg(long)]
        engine: Option<String>,

        /// Comma-separated suite override (iops,latency,throughput)
        #[arg(long)]
        suite: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    let _logging = init_command_logging(cli.debug);

    if let Err(err) = run(&cli) {
        tracing::error!("{}", err);
        // Walk the cause chain for the debug log
        for cause in err.chain().skip(1) {
            tracing::debug!("caused by: {}", cause);
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    // Every command shares the privilege precondition
    ensure_root()?;

    let mut config = QualConfig::default();
    if let Some(model) = &cli.model {
        config.device_identifier = model.as_str().into();
    }

    let runner = SystemRunner;

    match &cli.command {
        Commands::Initialise => {
            tracing::info!("preconditions satisfied");
            Ok(())
        }

        Commands::InstallPrerequisites => {
            Err(QualError::Unimplemented("install-prerequisites").into())
        }

        Commands::List => {
            let orchestrator = QualOrchestrator::new(config, &runner);
            let drives = orchestrator.discover()?;
            if drives.is_empty() {
                println!("No drives matched the device identifier.");
                return Ok(());
            }
            for drive in &drives {
                let mounted = MountGuard::is_mounted(&runner, drive)?;
                println!(
                    "{:<16} controller {:<12} {}",
                    drive.addressable_path,
                    drive.control_path(),
                    if mounted { "MOUNTED" } else { "not mounted" }
                );
            }
            Ok(())
        }

        Commands::SetupRaid { secure } => {
            config.secure_erase = *secure;
            let orchestrator = QualOrchestrator::new(config, &runner);
            let pool = orchestrator.setup_raid()?;
            println!("Formatted {} drive(s).", pool.len());
            Ok(())
        }

        Commands::RunTest {
            count,
            output_dir,
            engine,
            suite,
        } => {
            if let Some(count) = count {
                config.drives_to_test = *count;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir.clone();
            }
            if let Some(engine) = engine {
                config.engine_command = engine.clone();
            }
            if let Some(spec) = suite {
                let parsed = parse_suite(spec);
                if parsed.is_empty() {
                    anyhow::bail!("no recognized test cases in suite '{}'", spec);
                }
                config.suite = parsed;
            }

            let orchestrator = QualOrchestrator::new(config, &runner);
            let report = orchestrator.run_test()?;

            for run in &report.runs {
                let status = match &run.outcome {
                    TestOutcome::Passed => "PASS".to_string(),
                    TestOutcome::Failed(reason) => format!("FAIL ({})", reason),
                    TestOutcome::Pending => "PENDING".to_string(),
                };
                println!(
                    "{:<16} {:<12} {} -> {}",
                    run.drive_path,
                    run.test,
                    run.report_dir.display(),
                    status
                );
            }

            if !report.all_passed() {
                let failed = report
                    .runs
                    .iter()
                    .filter(|r| matches!(r.outcome, TestOutcome::Failed(_)))
                    .count();
                tracing::error!(failed, "qualification suite failed");
                std::process::exit(1);
            }

            tracing::info!(
                runs = report.runs.len(),
                "qualification suite completed successfully"
            );
            Ok(())
        }
    }
}

fn ensure_root() -> Result<()> {
    if !nix::unistd::Uid::effective().is_root() {
        return Err(QualError::Privilege.into());
    }
    Ok(())
}

fn parse_suite(spec: &str) -> Vec<TestCase> {
    spec.split(',')
        .filter_map(|name| match name.trim() {
            "iops" => Some(TestCase::Iops),
            "latency" => Some(TestCase::Latency),
            "throughput" => Some(TestCase::Throughput),
            _ => None,
        })
        .collect()
}
