use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use interactome_atlas::config::RuntimeConfig;
use interactome_atlas::dataset::DatasetView;
use interactome_atlas::explore::backend::BackendChoice;
use interactome_atlas::explore::{ExplorerApp, ExplorerOptions};
use interactome_atlas::external::{
    AnnotationSource, CachedAnnotationSource, KeggSource, MyGeneSource, PathwaySource, default_cache_path,
};
use interactome_atlas::generate::{GenerateOptions, run_generate};
use interactome_atlas::network::{ColumnSpec, IngestOptions};
use interactome_atlas::oracle::ForceLouvainOracle;

#[derive(Debug, Parser)]
#[command(name = "interactome-atlas")]
#[command(about = "Lay out, partition and explore protein interaction networks")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the network (and optionally locality) datasets from a TSV table
    Generate(GenerateArgs),
    /// Open the interactive explorer on generated datasets
    Explore(ExploreArgs),
    /// Fetch a KEGG pathway definition (KGML)
    Pathway(PathwayArgs),
}

#[derive(Debug, clap::Args)]
struct GenerateArgs {
    /// Tab-separated relation table
    #[arg(long)]
    input: PathBuf,

    /// Network dataset to write
    #[arg(long, default_value = "data/network.json")]
    output: PathBuf,

    /// Locality dataset to write; skipped when absent
    #[arg(long)]
    locality_output: Option<PathBuf>,

    #[arg(long, default_value = "protein1")]
    source_col: String,

    #[arg(long, default_value = "protein2")]
    target_col: String,

    #[arg(long)]
    weight_col: Option<String>,

    #[arg(long)]
    confidence_col: Option<String>,

    #[arg(long)]
    provenance_col: Option<String>,

    #[arg(long)]
    source_label_col: Option<String>,

    #[arg(long)]
    target_label_col: Option<String>,

    #[arg(long)]
    source_locality_col: Option<String>,

    #[arg(long)]
    target_locality_col: Option<String>,

    /// Optional node table with `id`, `label` and `locality` columns
    #[arg(long)]
    nodes: Option<PathBuf>,

    /// Keep `a->b` and `b->a` as distinct edges
    #[arg(long)]
    directed: bool,

    /// Stop after this many data rows
    #[arg(long)]
    limit: Option<usize>,

    #[arg(long, default_value_t = 120)]
    layout_iterations: usize,

    /// Seed for locality placement
    #[arg(long, env = "INTERACTOME_SEED")]
    seed: Option<u64>,
}

#[derive(Debug, clap::Args)]
struct ExploreArgs {
    #[arg(long, env = "INTERACTOME_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = ViewArg::Network)]
    view: ViewArg,

    #[arg(long, value_enum, env = "INTERACTOME_BACKEND", default_value_t = BackendChoice::Auto)]
    backend: BackendChoice,

    /// Annotation cache file; defaults to the user cache directory
    #[arg(long, env = "INTERACTOME_ANNOTATION_CACHE")]
    annotation_cache: Option<PathBuf>,

    /// Disable annotation lookups
    #[arg(long)]
    offline: bool,

    /// Camera ratio above which communities replace individual nodes
    #[arg(long)]
    cluster_ratio: Option<f32>,

    /// Seconds between clicking empty space and leaving focus
    #[arg(long)]
    defocus_delay: Option<f64>,

    /// Camera flight duration in seconds
    #[arg(long)]
    animation_secs: Option<f64>,

    /// Days an annotation cache entry stays valid
    #[arg(long)]
    annotation_ttl_days: Option<i64>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum ViewArg {
    Network,
    Locality,
}

impl From<ViewArg> for DatasetView {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::Network => DatasetView::Network,
            ViewArg::Locality => DatasetView::Locality,
        }
    }
}

#[derive(Debug, clap::Args)]
struct PathwayArgs {
    /// Pathway id, e.g. `hsa04115`
    id: String,

    /// Write the document here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match args.command {
        Command::Generate(args) => generate(args),
        Command::Explore(args) => explore(args),
        Command::Pathway(args) => pathway(args),
    }
}

fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let columns = ColumnSpec {
        weight: args.weight_col,
        confidence: args.confidence_col,
        provenance: args.provenance_col,
        source_label: args.source_label_col,
        target_label: args.target_label_col,
        source_locality: args.source_locality_col,
        target_locality: args.target_locality_col,
        ..ColumnSpec::new(args.source_col, args.target_col)
    };
    let options = GenerateOptions {
        input: args.input,
        output: args.output,
        locality_output: args.locality_output,
        nodes: args.nodes,
        ingest: IngestOptions {
            columns,
            directed: args.directed,
            limit: args.limit,
        },
        seed: args.seed,
    };

    let oracle = ForceLouvainOracle::with_iterations(args.layout_iterations);
    run_generate(&options, &oracle)
        .with_context(|| format!("failed to generate datasets from {}", options.input.display()))?;
    Ok(())
}

fn runtime_config(args: &ExploreArgs) -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    if let Some(ratio) = args.cluster_ratio {
        config.cluster_ratio = ratio;
        config.edge_ratio = config.edge_ratio.max(ratio);
    }
    if let Some(delay) = args.defocus_delay {
        config.defocus_delay_secs = delay.max(0.0);
    }
    if let Some(secs) = args.animation_secs {
        config.animation_secs = secs.max(0.0);
    }
    if let Some(days) = args.annotation_ttl_days {
        config.annotation_ttl = chrono::Duration::days(days.max(0));
    }
    config
}

fn explore(args: ExploreArgs) -> anyhow::Result<()> {
    let config = runtime_config(&args);

    let annotations: Option<Arc<dyn AnnotationSource>> = if args.offline {
        info!("annotation lookups disabled");
        None
    } else {
        let cache_path = args.annotation_cache.clone().or_else(default_cache_path);
        if cache_path.is_none() {
            warn!("no cache directory available, annotations will not persist");
        }
        let source: Arc<dyn AnnotationSource> = Arc::new(CachedAnnotationSource::new(
            MyGeneSource::default(),
            cache_path,
            config.annotation_ttl,
        ));
        Some(source)
    };

    let options = ExplorerOptions {
        data_dir: args.data_dir,
        view: args.view.into(),
        backend: args.backend,
        annotations,
        config,
    };

    let native = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "interactome atlas",
        native,
        Box::new(move |cc| Ok(Box::new(ExplorerApp::new(cc, options)))),
    )
    .map_err(|error| anyhow::anyhow!("explorer window failed: {error}"))
}

fn pathway(args: PathwayArgs) -> anyhow::Result<()> {
    let document = KeggSource::default()
        .fetch(&args.id)
        .with_context(|| format!("failed to fetch pathway {}", args.id))?;

    match args.out {
        Some(path) => {
            std::fs::write(&path, &document).with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {} ({} bytes)", path.display(), document.len());
        }
        None => print!("{document}"),
    }
    Ok(())
}
