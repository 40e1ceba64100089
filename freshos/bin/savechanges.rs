use clap::Parser;
use freshos::{
    cli::{confirm, SavechangesArgs, SavechangesSubcommand},
    config::{Layout, DEFAULT_INITRAMFS_PATH},
    snapshot::{self, SaveOptions, SnapshotStore},
    sys::ensure_root,
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
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = SavechangesArgs::parse()
        .validate()
        .unwrap_or_else(|e| e.exit());
    if let Err(e) = run(args).await {
        eprintln!("{}", e);
        std::process::exit(e.errno());
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: *
//--------------------------------------------------------------------------------------------------

async fn run(args: SavechangesArgs) -> FreshosResult<()> {
    match args.subcommand {
        Some(SavechangesSubcommand::List) => {
            tracing::trace!("listing snapshots");
            for snapshot in snapshot::list(&SnapshotStore::live()?)? {
                println!("{}", snapshot.file_name);
            }
        }
        Some(SavechangesSubcommand::Rollback) => {
            ensure_root()?;
            let store = SnapshotStore::live()?;
            if let Some(path) = snapshot::rollback(&store, args.yes, confirm)? {
                println!("Deleted \"{}\"", path.display());
            }
        }
        Some(SavechangesSubcommand::Pack { output }) => {
            ensure_root()?;
            tracing::trace!("packing system: output={output:?}");
            snapshot::pack(std::path::Path::new("/"), &output, args.yes, confirm).await?;
        }
        Some(SavechangesSubcommand::Export { output }) => {
            ensure_root()?;
            tracing::trace!("exporting boot environment: output={output:?}");
            snapshot::export(&DEFAULT_INITRAMFS_PATH, &output)?;
        }
        None => {
            ensure_root()?;
            let store = SnapshotStore::live()?;
            let options = SaveOptions {
                no_cleanup: args.no_cleanup,
                yes: args.yes,
            };
            let changes = Layout::live().changes();
            if let Some(path) = snapshot::save(&store, &changes, options, confirm).await? {
                println!("Saved \"{}\"", path.display());
            }
        }
    }

    Ok(())
}
