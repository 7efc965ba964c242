use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use reelsim::{
    resolve_category, AppState, CachedOracle, CandidateFilter, CategoryFilter, CategoryOracle,
    MemoryOracle, Metric, ModelManager, QueryEngine, RestApi, Settings, StopWords, TmdbOracle,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Content-based item-to-item recommender
#[derive(Parser, Debug)]
#[command(name = "reelsim")]
#[command(about = "Recommend similar items from their descriptions", long_about = None)]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true, env = "REELSIM_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Vectorize the catalog and persist the similarity model
    Build {
        #[command(flatten)]
        data: DataArgs,

        /// Vocabulary cap
        #[arg(long)]
        max_features: Option<usize>,

        /// `english`, `none`, or a comma separated word list
        #[arg(long)]
        stop_words: Option<StopWords>,

        /// `cosine` or `jaccard`
        #[arg(long)]
        metric: Option<Metric>,
    },

    /// Print the items most similar to one catalog item
    Recommend {
        #[command(flatten)]
        data: DataArgs,

        /// Catalog index of the selected item
        #[arg(long, conflicts_with = "title", required_unless_present = "title")]
        index: Option<usize>,

        /// Title of the selected item (first match wins)
        #[arg(long)]
        title: Option<String>,

        /// Number of recommendations
        #[arg(short, default_value_t = 5)]
        n: usize,

        /// Only recommend items in this category (id or name)
        #[arg(long)]
        category: Option<String>,

        #[command(flatten)]
        oracle: OracleArgs,

        #[command(flatten)]
        engine: EngineArgs,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the categories the oracle knows about
    Categories {
        #[command(flatten)]
        oracle: OracleArgs,
    },

    /// Serve the REST API
    Serve {
        #[command(flatten)]
        data: DataArgs,

        /// HTTP API port
        #[arg(long, env = "REELSIM_HTTP_PORT")]
        http_port: Option<u16>,

        #[command(flatten)]
        oracle: OracleArgs,

        #[command(flatten)]
        engine: EngineArgs,
    },
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Catalog CSV; row order defines item indices
    #[arg(long, default_value = "dataset.csv")]
    catalog: PathBuf,

    /// Persisted similarity model
    #[arg(long, default_value = "similarity.bin")]
    model: PathBuf,

    /// Column holding the item description
    #[arg(long)]
    description_column: Option<String>,

    /// Only compare item counts when opening the model
    #[arg(long)]
    skip_fingerprint_check: bool,
}

#[derive(Args, Debug)]
struct OracleArgs {
    /// JSON category table used instead of TMDB
    #[arg(long)]
    categories_file: Option<PathBuf>,

    /// TMDB API key
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true)]
    tmdb_api_key: Option<String>,
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Minimum candidate pool size
    #[arg(long)]
    pool_min: Option<usize>,

    /// Candidates drawn per requested result
    #[arg(long)]
    expansion_factor: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(log_level).into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Build {
            data,
            max_features,
            stop_words,
            metric,
        } => {
            if let Some(max_features) = max_features {
                settings.vectorizer.max_features = max_features;
            }
            if let Some(stop_words) = stop_words {
                settings.vectorizer.stop_words = stop_words;
            }
            if let Some(metric) = metric {
                settings.metric = metric;
            }
            let manager = model_manager(&data, &mut settings);

            info!("Building model from {:?}", manager.catalog_path());
            let report = manager
                .build(&settings.vectorizer, settings.metric)
                .context("model build failed")?;

            println!(
                "Built {} model for {} items ({} terms, {} empty descriptions) in {:.2?}",
                report.metric, report.items, report.vocabulary_size, report.empty_descriptions, report.elapsed
            );
            println!("Wrote {} bytes to {}", report.bytes, report.model_path.display());
        }

        Command::Recommend {
            data,
            index,
            title,
            n,
            category,
            oracle,
            engine,
            json,
        } => {
            engine.apply(&mut settings);
            let engine = open_engine(&data, &mut settings)?;

            let selected = match (index, title.as_deref()) {
                (Some(index), _) => index,
                (None, Some(title)) => engine.store().resolve_title(title)?,
                (None, None) => anyhow::bail!("either --index or --title is required"),
            };

            let filter = match category {
                None => None,
                Some(category) => {
                    let oracle = build_oracle(&oracle, &settings, false)?
                        .context("--category needs --categories-file or a TMDB API key")?;
                    Some(category_filter(oracle, &category)?)
                }
            };

            let recs = engine.recommend(
                selected,
                n,
                filter.as_ref().map(|f| f as &dyn CandidateFilter),
            )?;

            if json {
                println!("{}", serde_json::to_string_pretty(&recs)?);
                return Ok(());
            }

            let item = engine.store().item(selected)?;
            println!("Because you picked \"{}\":", item.title);
            for (rank, rec) in recs.items.iter().enumerate() {
                println!("{:>3}. {} ({:.3})", rank + 1, rec.title, rec.score);
            }
            if recs.is_empty() {
                println!("No recommendations found.");
            } else if recs.is_partial() {
                println!(
                    "Only {} of {} requested recommendations found among the top {} candidates.",
                    recs.len(),
                    recs.requested,
                    recs.pool_size
                );
            }
        }

        Command::Categories { oracle } => {
            let oracle = build_oracle(&oracle, &settings, false)?
                .context("no category oracle configured; pass --categories-file or a TMDB API key")?;
            for category in oracle.categories()? {
                println!("{:>6}  {}", category.id, category.name);
            }
        }

        Command::Serve {
            data,
            http_port,
            oracle,
            engine,
        } => {
            engine.apply(&mut settings);
            let port = http_port.unwrap_or(settings.http.port);
            let engine = Arc::new(open_engine(&data, &mut settings)?);

            let mut state = AppState::new(engine).with_image_url(settings.tmdb.image_url.clone());
            if let Some(oracle) = build_oracle(&oracle, &settings, true)? {
                state = state.with_oracle(oracle);
            }

            info!("Starting reelsim v{}", env!("CARGO_PKG_VERSION"));
            info!("HTTP API: http://localhost:{}/", port);

            let sys = actix_web::rt::System::new();
            sys.block_on(RestApi::start(state, port))
                .context("HTTP server error")?;
            info!("HTTP server stopped");
        }
    }

    Ok(())
}

impl EngineArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(pool_min) = self.pool_min {
            settings.engine.pool_min = pool_min;
        }
        if let Some(expansion_factor) = self.expansion_factor {
            settings.engine.expansion_factor = expansion_factor;
        }
    }
}

fn model_manager(data: &DataArgs, settings: &mut Settings) -> ModelManager {
    if let Some(column) = &data.description_column {
        settings.description_column = column.clone();
    }
    if data.skip_fingerprint_check {
        settings.verify_fingerprint = false;
    }
    let manager = ModelManager::new(&data.catalog, &data.model)
        .with_description_column(settings.description_column.clone());
    if settings.verify_fingerprint {
        manager
    } else {
        manager.skip_fingerprint_check()
    }
}

fn open_engine(data: &DataArgs, settings: &mut Settings) -> anyhow::Result<QueryEngine> {
    let manager = model_manager(data, settings);
    let store = manager.open().with_context(|| {
        format!(
            "cannot open model {} for catalog {}; rebuild it with `reelsim build`",
            manager.model_path().display(),
            manager.catalog_path().display()
        )
    })?;
    info!(items = store.len(), "Similarity store loaded");
    Ok(QueryEngine::new(Arc::new(store), settings.engine)?)
}

/// Shortest interval between background cache purges
const MIN_PURGE_INTERVAL: Duration = Duration::from_secs(60);

fn build_oracle(
    args: &OracleArgs,
    settings: &Settings,
    background_purge: bool,
) -> anyhow::Result<Option<Arc<dyn CategoryOracle>>> {
    if let Some(path) = args.categories_file.as_ref().or(settings.categories_file.as_ref()) {
        let oracle = MemoryOracle::from_path(path)
            .with_context(|| format!("cannot load categories file {}", path.display()))?;
        info!(titles = oracle.len(), "Using in-memory category oracle");
        return Ok(Some(Arc::new(oracle)));
    }

    let mut tmdb = settings.tmdb.clone();
    if let Some(key) = &args.tmdb_api_key {
        tmdb.api_key = key.clone();
    }
    if tmdb.api_key.trim().is_empty() {
        return Ok(None);
    }
    let ttl = settings.cache_ttl();
    let oracle = Arc::new(CachedOracle::with_ttl(TmdbOracle::new(tmdb)?, ttl));
    if background_purge {
        oracle.start_background_purge(ttl.max(MIN_PURGE_INTERVAL));
    }
    Ok(Some(oracle as Arc<dyn CategoryOracle>))
}

fn category_filter(
    oracle: Arc<dyn CategoryOracle>,
    query: &str,
) -> anyhow::Result<CategoryFilter<Arc<dyn CategoryOracle>>> {
    let id = resolve_category(&oracle, query).context("cannot resolve --category")?;
    let filter = CategoryFilter::new(oracle, id);
    info!(category = filter.category(), oracle = filter.oracle_name(), "Filtering by category");
    Ok(filter)
}
