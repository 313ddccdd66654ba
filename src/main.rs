use anyhow::{Context, Result};
use clap::Parser;
use ebsnvme_id::{
    identify_and_report, report, DeviceResolver, EbsError, OutputSelection, SystemDevices,
    DEFAULT_DEV_DIR, PROGRAM_NAME,
};
use log::debug;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "ebsnvme-id")]
#[command(about = "Report the EBS volume ID and block device name of an EC2 NVMe disk")]
#[command(disable_help_flag = true, disable_version_flag = true)]
#[command(override_usage = "ebsnvme-id [-b] [-m] [-s] [-u] [-v] device")]
#[command(args_override_self = true)]
struct Cli {
    /// Print the block device name from the EBS block device mapping
    #[arg(short = 'b')]
    block_device: bool,

    /// Same as -b (output suitable for udev rules)
    #[arg(short = 'u')]
    udev: bool,

    /// Print the model number (EBS and instance store)
    #[arg(short = 'm')]
    model_number: bool,

    /// Print the serial number (EBS and instance store)
    #[arg(short = 's')]
    serial_number: bool,

    /// Print the EBS volume ID
    #[arg(short = 'v')]
    volume_id: bool,

    /// Device to query, e.g. nvme1n1 or /dev/nvme1n1
    device: PathBuf,

    /// Enable debug logging
    #[arg(long, hide = true)]
    debug: bool,

    /// Device directory
    #[arg(long, env = "EBSNVME_ID_DEV_DIR", default_value = DEFAULT_DEV_DIR, hide = true)]
    dev_dir: String,
}

impl Cli {
    /// Values to print; `-u` is an alias of `-b`.
    fn outputs(&self) -> OutputSelection {
        OutputSelection::from_flags(
            self.block_device || self.udev,
            self.model_number,
            self.serial_number,
            self.volume_id,
        )
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(_) => {
            eprintln!("{}", EbsError::Usage);
            return ExitCode::FAILURE;
        }
    };

    // Set up logging
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {:#}", PROGRAM_NAME, err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let outputs = cli.outputs();
    debug!("Requested outputs: {:?}", outputs);

    let resolver = DeviceResolver::with_dev_dir(SystemDevices::new(), cli.dev_dir.as_str());
    let device = resolver.normalize(&cli.device).display().to_string();

    let controller = resolver.resolve(&cli.device)?.into_device();
    let identity = identify_and_report(&controller, &device, &outputs)?;
    drop(controller);

    // Everything is derived by now, so a failure above leaves stdout untouched
    let stdout = io::stdout();
    let mut out = stdout.lock();
    report(&identity, &outputs, &mut out).context("failed to write output")?;
    out.flush().context("failed to write output")?;

    Ok(())
}
