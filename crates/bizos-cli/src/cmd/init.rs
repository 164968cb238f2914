use anyhow::Context;
use bizos_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing AI Business OS in: {}", root.display());

    let dir = paths::bizos_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config = if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
        Config::load(root).context("failed to load config")?
    } else {
        let cfg = Config::default();
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
        cfg
    };

    let store_path = config.store_path(root);
    let created = io::write_if_missing(&store_path, b"{}\n")
        .with_context(|| format!("failed to create {}", store_path.display()))?;
    let label = if created { "created:" } else { "exists: " };
    println!("  {label} {}/{}", paths::BIZOS_DIR, config.store_file);

    println!("\nNext: bizos select --business <ideas.json> --idea <id>");
    Ok(())
}
