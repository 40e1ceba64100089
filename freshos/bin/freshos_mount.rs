use std::path::Path;

use clap::Parser;
use freshos::{
    boot::second_stage,
    cli::MountArgs,
    config::{BootArguments, Layout, TOOLS_SHARE_DIR},
    sys::SystemMounter,
    FreshosResult,
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

    let args = MountArgs::parse();
    if let Err(e) = run(args).await {
        eprintln!("{}", e);
        std::process::exit(e.errno());
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: *
//--------------------------------------------------------------------------------------------------

async fn run(args: MountArgs) -> FreshosResult<()> {
    let layout = Layout::new(&args.memory);
    let arguments = BootArguments::load(layout.arguments())?;
    let tools_dir = Path::new("/").join(TOOLS_SHARE_DIR);

    let union = second_stage(
        &SystemMounter,
        &arguments,
        args.data_options.as_deref(),
        &tools_dir,
    )
    .await?;

    tracing::info!("union root ready at {}", union.display());
    Ok(())
}
