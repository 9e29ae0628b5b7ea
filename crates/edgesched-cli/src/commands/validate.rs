use std::path::Path;

use anyhow::Context;
use edgesched_model::{Infrastructure, Snapshot};

pub fn validate(input: &Path) -> anyhow::Result<()> {
    let snapshot = Snapshot::from_file(input)
        .with_context(|| format!("failed to load snapshot {}", input.display()))?;
    let digest = snapshot.digest()?;
    let infra = Infrastructure::new(snapshot)
        .with_context(|| format!("snapshot {} is inconsistent", input.display()))?;

    println!("✓ {} is valid", input.display());
    println!("  users:        {}", infra.users().len());
    println!("  applications: {}", infra.applications().len());
    println!("  services:     {}", infra.services().len());
    println!("  edge servers: {}", infra.edge_servers().len());
    println!("  pending:      {}", infra.pending_services().count());
    println!("  SHA256:       {digest}");
    Ok(())
}
