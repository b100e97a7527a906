use clap::{Parser, Subcommand};
use mummy::context::Context;
use mummy::output::{self, PlanDisplay};
use mummy::{config, deploy, planner, references};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn version_string() -> &'static str {
    let on_tag = env!("MUMMY_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("MUMMY_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "mummy")]
#[command(about = "Static site generator: plan a source tree, mummify it into a site")]
#[command(long_about = "\
Static site generator: plan a source tree, mummify it into a site

Every file in the source tree is planned into an artifact, then written to
the target tree by the handler that claims it.

Source structure:

  site/
  ├── config.toml                  # Site config (optional)
  ├── index.md                     # Root page (rendered to index.html)
  ├── 010-about.md                 # Page; the prefix orders listings
  ├── 020-blog.meta.toml           # Describes 020-blog/'s listing page
  ├── 020-blog/                    # No index.md: a listing page is generated
  │   ├── 010-first.md
  │   └── 010-first.md.meta.toml   # Sidecar metadata for 010-first.md
  ├── photos/
  │   ├── index.md
  │   └── dawn.jpg                 # Scaled down if too large, plus aspect variants
  ├── assets/style.css             # Copied verbatim
  └── _drafts/                     # Veiled: built, but no generated listing

Page titles (first available wins):
  sidecar title → first '# ' heading or <title> → file name (010-about.md → \"about\")

Run 'mummy gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Source directory
    #[arg(long, default_value = "site", global = true)]
    source: PathBuf,

    /// Target directory
    #[arg(long, default_value = "dist", global = true)]
    target: PathBuf,

    /// Log planning and mummification details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan the source tree and print the artifact graph
    Plan {
        /// Print the graph as JSON instead of a tree
        #[arg(long)]
        json: bool,
        /// Show a content fingerprint per artifact
        #[arg(long)]
        fingerprints: bool,
    },
    /// Run the full pipeline: plan → mummify
    Build,
    /// Validate the source tree without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Plan { json, fingerprints } => {
            let context = load_context(&cli)?;
            let root = planner::plan(&context)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&root)?);
                return Ok(());
            }
            let prints = if fingerprints {
                let mut prints = BTreeMap::new();
                for artifact in root.walk() {
                    prints.insert(
                        artifact.source_path().to_path_buf(),
                        references::fingerprint(artifact)?,
                    );
                }
                Some(prints)
            } else {
                None
            };
            output::print_plan_output(
                &root,
                &PlanDisplay {
                    source_root: context.source_root(),
                    target_root: context.target_root(),
                    fingerprints: prints.as_ref(),
                },
            );
        }
        Command::Build => {
            let context = load_context(&cli)?;
            println!("==> Building {} → {}", cli.source.display(), cli.target.display());
            let target_root = context.target_root().to_path_buf();
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    println!("{}", output::format_mummify_event(&event, &target_root));
                }
            });
            let result = deploy::build(&context, None, Some(tx));
            printer.join().ok();
            let outcome = result?;
            println!("{}", output::format_plan_counts(&outcome.root));
            output::print_target_summary(&output::summarize_target(context.target_root())?);
            println!("==> Build complete: {}", cli.target.display());
        }
        Command::Check => {
            let context = load_context(&cli)?;
            println!("==> Checking {}", cli.source.display());
            let root = planner::plan(&context)?;
            println!("{}", output::format_plan_counts(&root));
            println!("==> Source is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the source tree's config and size the worker pool from it.
fn load_context(cli: &Cli) -> Result<Context, config::ConfigError> {
    let context = Context::load(&cli.source, &cli.target)?;
    init_thread_pool(&context.config().processing);
    Ok(context)
}

/// Log to stderr. `RUST_LOG` wins; otherwise warnings only, or debug with
/// `--verbose`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "mummy=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. Users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
