use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use offer_core::listing::{self, OfferFilter};
use offer_core::{
    prompt, CreatedOffer, IdStrategy, LinePrompter, OfferDraft, OfferManager, Prompter,
};
use offer_store::DocumentStore;
use std::env;
use std::io;
use std::path::PathBuf;

mod http_api;
mod server_security;

pub use http_api::router;

const DATA_DIR_ENV: &str = "OFFERS_DATA_DIR";
const ID_STRATEGY_ENV: &str = "OFFERS_ID_STRATEGY";
const DEFAULT_DATA_DIR: &str = "data";

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "offers")]
#[command(about = "Manage influencer offers and their payouts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the JSON collections (env: OFFERS_DATA_DIR, default: ./data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// How new offer ids are generated (env: OFFERS_ID_STRATEGY)
    #[arg(long, global = true, value_enum)]
    id_strategy: Option<IdStrategyArg>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an offer with its base payout and an optional custom payout
    Create(CreateArgs),

    /// Update an offer; press Enter at any prompt to keep the stored value
    Update(UpdateArgs),

    /// List offers with their payouts
    List(ListArgs),

    /// List the custom payouts of one influencer
    #[command(name = "influencer-offers")]
    InfluencerOffers(InfluencerOffersArgs),

    /// Serve the collections read-only over HTTP
    ServeHttp(ServeArgs),
}

#[derive(Args)]
struct CreateArgs {
    /// Read the offer from a JSON draft instead of prompting
    #[arg(long)]
    from: Option<PathBuf>,
}

#[derive(Args)]
struct UpdateArgs {
    /// Offer id (prompted when omitted)
    offer_id: Option<String>,
}

#[derive(Args)]
struct ListArgs {
    /// Case-insensitive title substring
    #[arg(long)]
    title: Option<String>,

    /// Only offers with a custom payout for this influencer
    #[arg(long)]
    influencer: Option<String>,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct InfluencerOffersArgs {
    /// Influencer id, e.g. INF_1 (prompted when omitted)
    influencer_id: Option<String>,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ServeArgs {
    /// Bind address
    #[arg(long, default_value = "127.0.0.1:5000")]
    bind: String,

    /// Allow binding to non-loopback addresses
    #[arg(long)]
    public: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum IdStrategyArg {
    Sequential,
    Timestamp,
}

impl IdStrategyArg {
    fn as_domain(self) -> IdStrategy {
        match self {
            IdStrategyArg::Sequential => IdStrategy::Sequential,
            IdStrategyArg::Timestamp => IdStrategy::Timestamp,
        }
    }
}

struct RunConfig {
    store: DocumentStore,
    id_strategy: IdStrategy,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers.
    let json_output = match &cli.command {
        Commands::List(args) => args.json,
        Commands::InfluencerOffers(args) => args.json,
        _ => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = RunConfig {
        store: DocumentStore::new(resolve_data_dir(cli.data_dir.take())),
        id_strategy: resolve_id_strategy(cli.id_strategy)?,
    };
    log::debug!(
        "Data directory: {} (id strategy: {:?})",
        config.store.dir().display(),
        config.id_strategy
    );

    match cli.command {
        Commands::Create(args) => run_create(args, &config).await?,
        Commands::Update(args) => run_update(args, &config).await?,
        Commands::List(args) => run_list(args, &config).await?,
        Commands::InfluencerOffers(args) => run_influencer_offers(args, &config).await?,
        Commands::ServeHttp(args) => serve_http(args, &config).await?,
    }

    Ok(())
}

fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| {
        env::var(DATA_DIR_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
    })
    .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

fn resolve_id_strategy(flag: Option<IdStrategyArg>) -> Result<IdStrategy> {
    if let Some(arg) = flag {
        return Ok(arg.as_domain());
    }
    match env::var(ID_STRATEGY_ENV) {
        Ok(raw) if !raw.trim().is_empty() => IdStrategyArg::from_str(raw.trim(), true)
            .map(IdStrategyArg::as_domain)
            .map_err(|_| {
                anyhow::anyhow!(
                    "Invalid {ID_STRATEGY_ENV}={raw:?}; expected sequential or timestamp"
                )
            }),
        _ => Ok(IdStrategy::default()),
    }
}

fn stdio_prompter() -> LinePrompter<io::StdinLock<'static>, io::Stdout> {
    LinePrompter::new(io::stdin().lock(), io::stdout())
}

async fn run_create(args: CreateArgs, config: &RunConfig) -> Result<()> {
    let mut catalog = config.store.load_catalog().await;

    let created: CreatedOffer = match &args.from {
        Some(path) => {
            let raw = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read offer draft {}", path.display()))?;
            let draft: OfferDraft = serde_json::from_slice(&raw)
                .with_context(|| format!("Invalid offer draft {}", path.display()))?;
            let new_offer = draft.validate().context("Offer draft rejected")?;
            offer_core::create_offer(&mut catalog, new_offer, config.id_strategy)
        }
        None => OfferManager::new(stdio_prompter(), config.id_strategy).create(&mut catalog)?,
    };

    config
        .store
        .save_catalog(&catalog)
        .await
        .context("Failed to save offer catalog")?;

    print_stdout(&format!(
        "\nOffer created successfully! Offer ID: {}",
        created.offer.id
    ))?;
    if !created.custom_payouts.is_empty() {
        print_stdout("Custom payouts added for specific influencers.")?;
    }
    Ok(())
}

async fn run_update(args: UpdateArgs, config: &RunConfig) -> Result<()> {
    let mut catalog = config.store.load_catalog().await;
    let mut prompter = stdio_prompter();

    let offer_id = match args.offer_id {
        Some(id) => id,
        None => prompt::ask_required(&mut prompter, "Enter Offer ID to update: ")?,
    };

    let updated = OfferManager::new(prompter, config.id_strategy).update(&mut catalog, &offer_id)?;

    config
        .store
        .save_catalog(&catalog)
        .await
        .context("Failed to save offer catalog")?;

    print_stdout(&format!("Offer {} updated successfully", updated.offer.id))?;
    Ok(())
}

async fn run_list(args: ListArgs, config: &RunConfig) -> Result<()> {
    let catalog = config.store.load_catalog().await;
    let filter = OfferFilter {
        title: args.title,
        influencer: args.influencer,
    };
    let listings = listing::list_offers(&catalog, &filter);

    if args.json {
        let entries: Vec<_> = listings.iter().map(|l| l.to_entry()).collect();
        return print_stdout(&serde_json::to_string_pretty(&entries)?);
    }

    if listings.is_empty() {
        return print_stdout("No offers found.");
    }

    let mut out = String::new();
    for item in &listings {
        out.push_str(&format!("{}  {}\n", item.offer.id, item.offer.title));
        out.push_str(&format!("  {}\n", item.offer.description));
        out.push_str(&format!(
            "  Categories: {}\n",
            item.offer.categories.join(", ")
        ));
        let label = if item.payout.is_custom() {
            "Custom payout"
        } else {
            "Payout"
        };
        out.push_str(&format!("  {label}: {}\n", item.display_payout()));
    }
    print_stdout(out.trim_end())
}

async fn run_influencer_offers(args: InfluencerOffersArgs, config: &RunConfig) -> Result<()> {
    let influencer_id = match args.influencer_id {
        Some(id) => id,
        None => {
            let mut prompter = stdio_prompter();
            prompter.ask("Enter Influencer ID: ")?
        }
    };
    let influencer_id = influencer_id.trim().to_string();
    if influencer_id.is_empty() {
        anyhow::bail!("Influencer ID is required!");
    }

    let catalog = config.store.load_catalog().await;
    let offers = listing::influencer_offers(&catalog, &influencer_id);

    if args.json {
        let entries: Vec<_> = offers.iter().map(|o| o.to_entry()).collect();
        return print_stdout(&serde_json::to_string_pretty(&entries)?);
    }

    if offers.is_empty() {
        return print_stdout(&format!("No offers found for influencer {influencer_id}"));
    }

    let mut out = format!("\nOffers for Influencer {influencer_id}:\n\n");
    for item in &offers {
        out.push_str("---\n");
        match item.offer {
            Some(offer) => {
                out.push_str(&format!("ID: {}\n", offer.id));
                out.push_str(&format!("Title: {}\n", offer.title));
                out.push_str(&format!("Description: {}\n", offer.description));
                out.push_str(&format!("Categories: {}\n", offer.categories.join(", ")));
            }
            None => out.push_str(&format!(
                "Offer ID: {} (details not found)\n",
                item.payout.offer_id
            )),
        }
        let summary = offer_core::payout::summarize(Some(&item.payout.terms));
        let amount = match (&summary.fixed, summary.kind) {
            (Some(fixed), "FIXED") => format!("${fixed}"),
            _ => summary.display.clone(),
        };
        out.push_str("Payout:\n");
        out.push_str(&format!("Type: {}\n", summary.kind));
        out.push_str(&format!("Amount: {amount}\n"));
    }
    out.push_str("\nEnd of list.");
    print_stdout(&out)
}

async fn serve_http(args: ServeArgs, config: &RunConfig) -> Result<()> {
    let addrs = server_security::resolve_guarded_bind_addrs(&args.bind, args.public).await?;

    let app = router(config.store.clone());
    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    let local_addr = listener.local_addr()?;
    let base_url = format!("http://{local_addr}");

    print_stdout(&format!("Backend running on {base_url}"))?;
    print_stdout(&format!(
        "Serving data from {}",
        config.store.dir().display()
    ))?;
    if args.public {
        let addrs = addrs
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        print_stdout(&format!(
            "Public bind enabled (--public). Resolved addresses: {addrs}"
        ))?;
    }
    print_stdout(&format!("Try: curl {base_url}/offers"))?;

    axum::serve(listener, app).await?;
    Ok(())
}
