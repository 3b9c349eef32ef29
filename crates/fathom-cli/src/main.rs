use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use fathom_tree::{extract, HostNode, Projection, RenderedOutput};

#[derive(Parser)]
#[command(name = "fathom", about = "Fathom — deterministic host tree snapshots")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a snapshot of a host tree stored as JSON.
    Snapshot {
        /// Host tree file (JSON); its top node is the root wrapper.
        file: PathBuf,
        #[command(flatten)]
        projection: ProjectionArgs,
        /// Print the structured JSON view instead of JSX.
        #[arg(long)]
        json: bool,
        /// Write the snapshot to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the SHA-256 digest of a host tree's JSX snapshot.
    Digest {
        /// Host tree file (JSON)
        file: PathBuf,
        #[command(flatten)]
        projection: ProjectionArgs,
    },
}

#[derive(Args, Default)]
struct ProjectionArgs {
    /// Projection config file (JSON). Flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Comma-separated props list: `width,height`, `!style*`, `layoutMetrics-*`.
    #[arg(long, value_delimiter = ',')]
    props: Option<Vec<String>>,
    /// Keep tags and keys only.
    #[arg(long, conflicts_with = "props")]
    structure_only: bool,
    /// Include derived layoutMetrics-* props.
    #[arg(long)]
    layout: bool,
    /// Keep the root wrapper node.
    #[arg(long)]
    include_root: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Snapshot {
            file,
            projection,
            json,
            output,
        } => {
            let rendered = snapshot_file(&file, &projection)?;
            let text = if json {
                serde_json::to_string_pretty(&rendered.to_json())?
            } else {
                rendered.to_jsx()
            };
            match output {
                Some(path) => {
                    fs::write(&path, format!("{text}\n"))?;
                    println!("snapshot written to {}", path.display());
                }
                None => println!("{text}"),
            }
        }
        Command::Digest { file, projection } => {
            let rendered = snapshot_file(&file, &projection)?;
            println!("{}", rendered.digest());
        }
    }
    Ok(())
}

fn snapshot_file(file: &Path, args: &ProjectionArgs) -> Result<RenderedOutput, Box<dyn std::error::Error>> {
    let tree = load_tree(file)?;
    let projection = resolve_projection(args)?;
    log::debug!(
        "snapshotting {} ({} nodes) with {:?}",
        file.display(),
        tree.node_count(),
        projection
    );
    Ok(extract(&tree, &projection)?)
}

fn load_tree(path: &Path) -> Result<HostNode, Box<dyn std::error::Error>> {
    let data = fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let tree = serde_json::from_str(&data).map_err(|e| format!("invalid host tree {}: {e}", path.display()))?;
    Ok(tree)
}

fn resolve_projection(args: &ProjectionArgs) -> Result<Projection, Box<dyn std::error::Error>> {
    let mut projection = match &args.config {
        Some(path) => {
            let data = fs::read_to_string(path)?;
            serde_json::from_str(&data)
                .map_err(|e| format!("invalid projection config {}: {e}", path.display()))?
        }
        None => Projection::default(),
    };

    if args.structure_only {
        projection.props = Some(Vec::new());
    } else if let Some(props) = &args.props {
        projection.props = Some(props.clone());
    }
    if args.layout {
        projection.include_layout_metrics = true;
    }
    if args.include_root {
        projection.include_root = true;
    }
    // Fail on a bad props list before reading any tree.
    projection.filter()?;
    Ok(projection)
}
