use anyhow::{Context, Result};
use ballot_tree::config::Config;
use ballot_tree::store::{persist_build, PathStore};
use ballot_tree::{build_tree, parse_allowlist, Election};
use clap::Parser;
use log::{debug, info};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Allowlist CSV file (defaults to the configured file)
    #[arg(short, long)]
    allowlist: Option<PathBuf>,

    /// Election id (overrides the ELECTION env var and the config file)
    #[arg(short, long)]
    election: Option<String>,

    /// Tree depth (overrides the config file)
    #[arg(short, long)]
    depth: Option<usize>,

    /// Output file for the tree summary
    #[arg(short, long)]
    tree_out: Option<PathBuf>,

    /// Output directory for per-voter path files
    #[arg(short, long)]
    paths_dir: Option<PathBuf>,

    #[arg(short, long, default_value = "ballot-tree.toml")]
    config: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Config::load_from_file_or_default(&args.config);

    let election_id = args
        .election
        .or_else(|| std::env::var("ELECTION").ok())
        .unwrap_or_else(|| config.election.id.clone());
    let depth = args.depth.unwrap_or(config.election.depth);
    let allowlist_file = args.allowlist.unwrap_or_else(|| config.allowlist.file.clone());
    let tree_out = args.tree_out.unwrap_or_else(|| config.output.tree_file.clone());
    let paths_dir = args.paths_dir.unwrap_or_else(|| config.output.paths_dir.clone());

    if !allowlist_file.exists() {
        return Err(anyhow::anyhow!(
            "Allowlist file does not exist: {}",
            allowlist_file.display()
        ));
    }

    println!("Loading allowlist from: {}", allowlist_file.display());
    debug!("Starting allowlist validation");

    let metadata =
        fs::metadata(&allowlist_file).context("Failed to read allowlist file metadata")?;
    debug!("Allowlist file size: {} bytes", metadata.len());

    if metadata.len() > config.allowlist.max_file_size {
        return Err(anyhow::anyhow!(
            "Allowlist file too large: {} bytes (max {} bytes). Raise allowlist.max_file_size in {} if the list is genuinely this big",
            metadata.len(),
            config.allowlist.max_file_size,
            args.config.display()
        ));
    }

    let content = fs::read_to_string(&allowlist_file).context("Failed to read allowlist file")?;
    let entries = parse_allowlist(&content)?;
    println!(
        "Loaded {} entries from {}",
        entries.len(),
        allowlist_file.display()
    );

    println!("Building commitment tree for election '{election_id}' (depth {depth})...");
    let election = Election::new(&election_id);
    let build = build_tree(&entries, &election, depth)?;

    println!("Merkle root: {}", build.artifact.merkle_root);
    println!("Election id hash: {}", build.artifact.election_id_hash);

    let store = PathStore::create(&paths_dir)?;
    println!("Writing path files to: {}", store.dir().display());
    println!("Writing tree summary to: {}", tree_out.display());
    persist_build(&store, &tree_out, &build)?;
    info!(
        "Wrote {} path files to {}",
        build.paths.len(),
        store.dir().display()
    );

    println!("Tree successfully built and saved!");
    println!("  Entries: {}", build.artifact.count);
    println!("  Depth: {}", build.artifact.depth);
    println!("  Path files: {}", build.paths.len());

    Ok(())
}
