use anyhow::{Context, Result};
use ballot_tree::assembler::{assemble_from_store, VoteRequest};
use ballot_tree::config::Config;
use ballot_tree::store::PathStore;
use clap::Parser;
use log::{debug, info};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Election id (overrides the ELECTION env var and the config file)
    #[arg(short, long)]
    election: Option<String>,

    /// Voter email the path artifact was issued to
    #[arg(long)]
    email: String,

    /// Ballot choice
    #[arg(long)]
    choice: u64,

    /// Voting token as 64 hex characters (falls back to BALLOT_TOKEN;
    /// prefer the environment variable to keep the secret out of shell
    /// history)
    #[arg(long)]
    token: Option<String>,

    /// Optional reply-channel text to scan before assembly
    #[arg(long)]
    reply_file: Option<PathBuf>,

    /// Directory of per-voter path files
    #[arg(short, long)]
    paths_dir: Option<PathBuf>,

    /// Tree depth (overrides the config file)
    #[arg(short, long)]
    depth: Option<usize>,

    /// Output file for the private witness document
    #[arg(long, default_value = "vote.json")]
    vote_out: PathBuf,

    /// Output file for the public inputs document
    #[arg(long, default_value = "public.json")]
    public_out: PathBuf,

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
    let paths_dir = args.paths_dir.unwrap_or_else(|| config.output.paths_dir.clone());

    let token_hex = match args.token {
        Some(token) => token,
        None => std::env::var("BALLOT_TOKEN")
            .context("No token given: pass --token or set BALLOT_TOKEN")?,
    };

    let reply_body = match &args.reply_file {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read reply file: {}", path.display()))?,
        ),
        None => None,
    };

    let store = PathStore::open(&paths_dir);
    println!(
        "Assembling circuit inputs for {} from: {}",
        args.email,
        store.dir().display()
    );
    debug!("Election id: {election_id}, depth: {depth}");

    let request = VoteRequest {
        election_id,
        email: args.email,
        token_hex,
        choice: args.choice,
        reply_body,
    };
    let inputs = assemble_from_store(&request, &store, depth)?;
    info!("Circuit inputs assembled");

    println!("Writing vote inputs to: {}", args.vote_out.display());
    let vote_json =
        serde_json::to_string_pretty(&inputs.vote).context("Failed to serialize vote inputs")?;
    fs::write(&args.vote_out, vote_json).context("Failed to write vote inputs file")?;

    println!("Writing public inputs to: {}", args.public_out.display());
    let public_json = serde_json::to_string_pretty(&inputs.public)
        .context("Failed to serialize public inputs")?;
    fs::write(&args.public_out, public_json).context("Failed to write public inputs file")?;

    println!("Circuit inputs successfully assembled!");
    println!("  Merkle Root: {}", inputs.public.merkle_root);
    println!("  Nullifier: {}", inputs.public.nullifier);
    println!("  Choice: {}", inputs.public.choice);

    Ok(())
}
