//! Modlink CLI
//!
//! Loads native plugins, verifies them, and drives notify calls with the
//! host-owned shared state.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use modlink::config::ModlinkConfig;
use modlink::host::Host;
use modlink::plugin::{PluginManifest, PluginRegistry};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "modlink")]
#[command(version)]
#[command(about = "Native plugin host with explicit state injection", long_about = None)]
struct Cli {
    /// Additional plugin search path (may be repeated)
    #[arg(long = "search-path", global = true, value_name = "DIR")]
    search_paths: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a plugin's ABI version and declared exports
    Inspect {
        /// Plugin name or path to its shared library
        plugin: String,
    },

    /// List plugins discoverable in the search paths
    List,

    /// Load a plugin and invoke its notify entry point once
    Run {
        /// Plugin name or path to its shared library
        /// (default: plugins.default_plugin from modlink.toml)
        plugin: Option<String>,

        /// Value passed to the plugin
        #[arg(long, default_value_t = 42)]
        value: i64,

        /// Host shared value (overrides modlink.toml)
        #[arg(long)]
        global: Option<i64>,

        /// Explicit manifest file (otherwise discovered next to the
        /// library)
        #[arg(long, value_name = "FILE")]
        manifest: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ModlinkConfig::load_from_cwd().context("failed to load modlink.toml")?;

    let mut registry = PluginRegistry::new();
    for path in &config.plugins.search_paths {
        registry.add_search_path(path);
    }
    for path in &cli.search_paths {
        registry.add_search_path(path);
    }

    match cli.command {
        Commands::Inspect { plugin } => cmd_inspect(&mut registry, &plugin),
        Commands::List => cmd_list(&registry),
        Commands::Run {
            plugin,
            value,
            global,
            manifest,
        } => cmd_run(&mut registry, &config, plugin, value, global, manifest),
    }
}

fn cmd_run(
    registry: &mut PluginRegistry,
    config: &ModlinkConfig,
    plugin: Option<String>,
    value: i64,
    global: Option<i64>,
    manifest: Option<PathBuf>,
) -> Result<()> {
    let name = plugin
        .or_else(|| config.plugins.default_plugin.clone())
        .context("no plugin given and no default_plugin in modlink.toml")?;

    let mut host = Host::new();
    host.init(global.unwrap_or(config.host.shared));

    if let Some(path) = manifest {
        let manifest = PluginManifest::load(&path)
            .with_context(|| format!("failed to read manifest '{}'", path.display()))?;
        registry.load_with_manifest(&name, manifest)?;
    } else {
        registry.load(&name)?;
    }

    host.notify(registry, &name, value)?;
    Ok(())
}

fn cmd_inspect(registry: &mut PluginRegistry, name: &str) -> Result<()> {
    let plugin = registry.load(name)?;

    println!("plugin:      {}", plugin.manifest.name);
    println!("version:     {}", plugin.manifest.version);
    println!("library:     {}", plugin.path.display());
    println!("abi version: {}", plugin.abi_version);
    if !plugin.manifest.description.is_empty() {
        println!("description: {}", plugin.manifest.description);
    }
    println!("exports:");
    // Loading already verified every declared export; a plugin that fails
    // verification never reaches this point.
    for export in &plugin.manifest.exports {
        if export.description.is_empty() {
            println!("  [verified] {}", export.signature);
        } else {
            println!("  [verified] {}  - {}", export.signature, export.description);
        }
    }
    Ok(())
}

fn cmd_list(registry: &PluginRegistry) -> Result<()> {
    let discovered = registry.discover();
    if discovered.is_empty() {
        println!("no plugins found in search paths");
        return Ok(());
    }
    for plugin in discovered {
        println!(
            "{} {} ({})",
            plugin.name,
            plugin.manifest.version,
            plugin.manifest_path.display()
        );
    }
    Ok(())
}
