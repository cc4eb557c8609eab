//! Persists successful deployments so later tooling can find the contract.

use {
    crate::deploy::Deployment,
    anyhow::{Context, Result},
    std::path::{Path, PathBuf},
};

/// Writes `deployment` as pretty JSON to
/// `<dir>/<chain id>/<contract name>.json`, replacing an earlier record of the
/// same contract on the same chain.
pub fn write(dir: &Path, deployment: &Deployment) -> Result<PathBuf> {
    let dir = dir.join(deployment.chain_id.to_string());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("could not create {}", dir.display()))?;

    // Fully qualified names contain the source path.
    let name = deployment
        .contract_name
        .rsplit(':')
        .next()
        .unwrap_or(&deployment.contract_name);
    let path = dir.join(format!("{name}.json"));
    let json = serde_json::to_string_pretty(deployment)?;
    std::fs::write(&path, json + "\n")
        .with_context(|| format!("could not write {}", path.display()))?;
    Ok(path)
}
