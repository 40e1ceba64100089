use clap::Parser;
use freshos::{
    boot::{reboot, FirstStage, FirstStageOutcome},
    cli::BootArgs,
    config::Layout,
    device::{Blkid, Target},
    parser::read_cmdline,
    sys::SystemMounter,
    FreshosError, FreshosResult,
};
use tracing_subscriber::{fmt, EnvFilter};

//--------------------------------------------------------------------------------------------------
// Functions: main
//--------------------------------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() {
    fmt()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = BootArgs::parse();
    match run(args).await {
        Ok(code) => std::process::exit(code),
        Err(FreshosError::DataDeviceNotFound(target)) => {
            tracing::error!("no data device for {}", target);
            eprintln!("Data partition not found");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(e.errno());
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: *
//--------------------------------------------------------------------------------------------------

async fn run(args: BootArgs) -> FreshosResult<i32> {
    let params = read_cmdline(&args.cmdline)?;
    let target = Target::from_params(&params);
    tracing::info!("looking for {}", target.describe());

    let layout = Layout::new(&args.memory);
    let mounter = SystemMounter;
    let probe = Blkid::default();
    let stage = FirstStage {
        mounter: &mounter,
        probe: &probe,
        layout: &layout,
        ld_linux: args.ld_linux,
    };

    match stage.run(&target).await? {
        FirstStageOutcome::Executed { script, status } => {
            tracing::info!("{} exited with {}", script.display(), status);
            Ok(status)
        }
        FirstStageOutcome::Initialized(_) => {
            println!("Please reboot your computer with Ctrl+Alt+Delete if it does not restart");
            reboot().await?;
            Ok(0)
        }
    }
}
