use std::path::PathBuf;

use crate::{
    config::Layout,
    sys::{MountSpec, Mounter},
    FreshosError, FreshosResult,
};

use super::{Bundle, BundleChain};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Mounts every bundle of the chain and stacks them into the union root.
///
/// Bundles are mounted in enumeration order, each on its own mountpoint (created when
/// missing), and `on_mounted` is called after each one. The overlay is only attempted once
/// every layer is in place. Any failure aborts immediately; layers that were already mounted
/// stay mounted and are the caller's business.
///
/// Returns the union root.
pub async fn mount_chain(
    mounter: &dyn Mounter,
    layout: &Layout,
    chain: &BundleChain,
    mut on_mounted: impl FnMut(&Bundle),
) -> FreshosResult<PathBuf> {
    if chain.is_empty() {
        return Err(FreshosError::UnionMountFailed(
            "no bundles to stack".to_string(),
        ));
    }

    for bundle in chain.bundles() {
        std::fs::create_dir_all(bundle.mountpoint())?;
        mounter
            .mount(&MountSpec::bundle(bundle.path(), bundle.mountpoint()))
            .await?;

        tracing::info!(
            "mounted {} on {}",
            bundle.path().display(),
            bundle.mountpoint().display()
        );
        on_mounted(bundle);
    }

    let union = layout.union();
    let changes = layout.changes();
    let workdir = layout.workdir();
    for dir in [&changes, &workdir, &union] {
        std::fs::create_dir_all(dir)?;
    }

    let overlay = MountSpec::overlay(chain.lowerdir(), &changes, &workdir, &union);
    mounter
        .mount(&overlay)
        .await
        .map_err(|e| FreshosError::UnionMountFailed(e.to_string()))?;

    tracing::info!("union root ready at {}", union.display());
    Ok(union)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::sys::fake::FakeMounter;

    use super::*;

    fn home_with_bundles(names: &[&str]) -> anyhow::Result<TempDir> {
        let home = TempDir::new()?;
        for name in names {
            let path = home.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap())?;
            std::fs::write(path, b"hsqs")?;
        }
        Ok(home)
    }

    #[test_log::test(tokio::test)]
    async fn test_mount_chain_mounts_layers_before_union() -> anyhow::Result<()> {
        let home = home_with_bundles(&["01-core.sb", "snapshots/01-20240101T000000.sb"])?;
        let memory = TempDir::new()?;
        let layout = Layout::new(memory.path());
        let chain = BundleChain::discover(home.path(), &layout.bundles())?;

        let mounter = FakeMounter::default();
        let mut announced = Vec::new();
        let union = mount_chain(&mounter, &layout, &chain, |b| announced.push(b.file_name()))
            .await?;

        assert_eq!(union, layout.union());
        assert_eq!(announced, vec!["01-core.sb", "01-20240101T000000.sb"]);

        let history = mounter.history();
        assert_eq!(history.len(), 3);
        assert!(history[..2].iter().all(|spec| spec.loop_device));
        assert_eq!(history[2].fstype, "overlay");
        assert_eq!(
            history[2].options[0],
            format!(
                "lowerdir={}:{}",
                layout.bundles().join("snapshots/01-20240101T000000").display(),
                layout.bundles().join("01-core").display()
            )
        );

        assert!(layout.bundles().join("snapshots/01-20240101T000000").is_dir());
        assert!(layout.changes().is_dir());
        assert!(layout.workdir().is_dir());
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_mount_chain_aborts_on_layer_failure() -> anyhow::Result<()> {
        let home = home_with_bundles(&["01-core.sb", "02-extra.sb"])?;
        let memory = TempDir::new()?;
        let layout = Layout::new(memory.path());
        let chain = BundleChain::discover(home.path(), &layout.bundles())?;

        let broken = home.path().join("02-extra.sb").display().to_string();
        let mounter = FakeMounter::default().failing(&broken);

        let result = mount_chain(&mounter, &layout, &chain, |_| {}).await;
        assert!(matches!(result, Err(FreshosError::MountFailed { .. })));
        assert!(mounter.history().iter().all(|spec| spec.fstype != "overlay"));
        assert_eq!(mounter.active(), vec![layout.bundles().join("01-core")]);
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_union_failure_is_reported() -> anyhow::Result<()> {
        let home = home_with_bundles(&["01-core.sb"])?;
        let memory = TempDir::new()?;
        let layout = Layout::new(memory.path());
        let chain = BundleChain::discover(home.path(), &layout.bundles())?;

        let mounter = FakeMounter::default().failing("overlay");
        let result = mount_chain(&mounter, &layout, &chain, |_| {}).await;
        assert!(matches!(result, Err(FreshosError::UnionMountFailed(_))));

        let empty = mount_chain(&mounter, &layout, &BundleChain::default(), |_| {}).await;
        assert!(matches!(empty, Err(FreshosError::UnionMountFailed(_))));
        Ok(())
    }
}
