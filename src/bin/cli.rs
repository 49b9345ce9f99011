//! XJTU notice CLI
//!
//! Manages subscriptions and rules and keeps a local notice inbox.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use xjtu_notice::{
    challenge::{BlobClientIdStore, ChallengeSolver, ClientIdStore},
    crawlers::{CrawlContext, CrawlerRegistry},
    error::{AppError, Result},
    models::{Config, Notification, Source},
    pipeline,
    rules::{Filter, Ruleset, RulesetId},
    services::{
        NotificationManager,
        inbox::{self, SortOrder},
    },
    storage::{self, BlobStore, LocalBlobStore},
};

/// xjtu-notice - campus notice subscriptions
#[derive(Parser, Debug)]
#[command(
    name = "xjtu-notice",
    version,
    about = "Subscribe to XJTU notice boards and filter them with rules"
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List known sources and whether they are subscribed
    Sources,

    /// Subscribe to a source
    Subscribe {
        #[arg(value_parser = parse_source)]
        source: Source,
    },

    /// Unsubscribe from a source
    Unsubscribe {
        #[arg(value_parser = parse_source)]
        source: Source,

        /// Keep the source's rulesets for a later re-subscribe
        #[arg(long)]
        keep_rules: bool,
    },

    /// Manage rulesets
    #[command(subcommand)]
    Rules(RulesCommand),

    /// Fetch subscribed sources into the inbox
    Fetch {
        /// Listing pages per source (default: 2 on first fetch, then config)
        #[arg(short, long)]
        pages: Option<usize>,
    },

    /// Show the inbox
    List {
        /// Only unread notices
        #[arg(long)]
        unread: bool,
    },

    /// Mark notices as read
    Read {
        /// 1-based position as shown by `list`
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        index: Option<usize>,

        /// Mark everything as read
        #[arg(long)]
        all: bool,
    },

    /// Remove notices from the inbox
    Purge {
        /// Only remove notices already read
        #[arg(long)]
        read_only: bool,
    },

    /// Forget cached site verification ids
    ResetClientId,

    /// Validate configuration and stored data
    Validate,
}

#[derive(Subcommand, Debug)]
enum RulesCommand {
    /// Show rulesets, for one source or all
    List {
        #[arg(value_parser = parse_source)]
        source: Option<Source>,
    },

    /// Add a ruleset; all given conditions must hold
    Add(AddRuleset),

    /// Remove a ruleset
    Remove(RulesetRef),

    /// Enable a ruleset
    Enable(RulesetRef),

    /// Disable a ruleset
    Disable(RulesetRef),
}

#[derive(Args, Debug)]
struct AddRuleset {
    #[arg(value_parser = parse_source)]
    source: Source,

    #[arg(long, default_value = "")]
    name: String,

    /// Title must contain this text
    #[arg(long = "title")]
    title_contains: Vec<String>,

    /// Title must not contain this text
    #[arg(long = "no-title")]
    title_excludes: Vec<String>,

    /// Notice must carry this tag
    #[arg(long = "tag")]
    tag_contains: Vec<String>,

    /// Notice must not carry this tag
    #[arg(long = "no-tag")]
    tag_excludes: Vec<String>,

    /// Store the ruleset disabled
    #[arg(long)]
    disabled: bool,
}

impl AddRuleset {
    fn into_ruleset(self) -> Result<(Source, Ruleset)> {
        let filters = self
            .title_contains
            .into_iter()
            .map(Filter::title_contains)
            .chain(self.title_excludes.into_iter().map(Filter::title_excludes))
            .chain(self.tag_contains.into_iter().map(Filter::tag_contains))
            .chain(self.tag_excludes.into_iter().map(Filter::tag_excludes))
            .collect::<Vec<_>>();
        if filters.iter().any(|f| f.operand().is_empty()) {
            return Err(AppError::validation("filter text must not be empty"));
        }

        let mut ruleset = Ruleset::with_filters(self.name, filters);
        ruleset.enable = !self.disabled;
        Ok((self.source, ruleset))
    }
}

#[derive(Args, Debug)]
struct RulesetRef {
    #[arg(value_parser = parse_source)]
    source: Source,

    /// 1-based position as shown by `rules list`
    index: usize,
}

fn parse_source(value: &str) -> std::result::Result<Source, String> {
    match value.to_ascii_lowercase().as_str() {
        "jwc" | "dean" => Ok(Source::Jwc),
        "gs" => Ok(Source::Gs),
        "se" => Ok(Source::Se),
        _ => Source::from_display(value).map_err(|e| e.to_string()),
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

struct Stores {
    data: LocalBlobStore,
    cache: Arc<LocalBlobStore>,
}

impl Stores {
    fn new(config: &Config) -> Self {
        Self {
            data: LocalBlobStore::new(config.storage.data_dir.clone()),
            cache: Arc::new(LocalBlobStore::new(config.storage.cache_dir.clone())),
        }
    }

    async fn manager(&self, config: &Config) -> NotificationManager {
        storage::load_manager(&self.data, &config.storage.config_blob).await
    }

    async fn save_manager(&self, config: &Config, manager: &NotificationManager) -> Result<()> {
        storage::save_manager(&self.data, &config.storage.config_blob, manager).await
    }

    /// Inbox in display order, so positions match `list`.
    async fn inbox(&self, config: &Config) -> Result<Vec<Notification>> {
        let mut list =
            storage::load_notifications(self.cache.as_ref(), &config.storage.notifications_blob)
                .await?;
        inbox::sort(&mut list, SortOrder::default());
        Ok(list)
    }

    async fn save_inbox(&self, config: &Config, list: &[Notification]) -> Result<()> {
        storage::save_notifications(self.cache.as_ref(), &config.storage.notifications_blob, list)
            .await
    }

    fn client_ids(&self, config: &Config) -> Arc<dyn ClientIdStore> {
        let cache: Arc<dyn BlobStore> = self.cache.clone();
        Arc::new(BlobClientIdStore::new(cache, config.challenge.cache_blob.clone()))
    }
}

fn ruleset_at(manager: &NotificationManager, r: &RulesetRef) -> Result<RulesetId> {
    r.index
        .checked_sub(1)
        .and_then(|i| manager.rulesets(r.source).get(i))
        .map(Ruleset::id)
        .ok_or(AppError::RulesetNotFound(r.source))
}

fn print_rulesets(manager: &NotificationManager, source: Source) {
    let rulesets = manager.rulesets(source);
    let state = if manager.is_subscribed(source) { "" } else { " (not subscribed)" };
    println!("{source}{state}");
    if rulesets.is_empty() {
        println!("  (no rules, everything is shown)");
    }
    for (i, ruleset) in rulesets.iter().enumerate() {
        let name = if ruleset.name.is_empty() { "(unnamed)" } else { ruleset.name.as_str() };
        let flag = if ruleset.enable { "on " } else { "off" };
        println!("  {:>2}. [{flag}] {name}: {}", i + 1, ruleset.describe());
    }
}

fn print_notice(index: usize, notice: &Notification) {
    let mark = if notice.is_read { " " } else { "*" };
    let tags = if notice.tags.is_empty() {
        String::new()
    } else {
        format!(
            " [{}]",
            notice.tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
        )
    };
    println!(
        "{mark}{:>4}. {} {} {}{}\n        {}",
        index + 1,
        notice.date,
        notice.source,
        notice.title,
        tags,
        notice.link
    );
}

async fn run_rules(config: &Config, stores: &Stores, command: RulesCommand) -> Result<()> {
    let mut manager = stores.manager(config).await;

    match command {
        RulesCommand::List { source } => {
            match source {
                Some(source) => print_rulesets(&manager, source),
                None => {
                    for source in Source::ALL {
                        if manager.is_subscribed(source) || !manager.rulesets(source).is_empty() {
                            print_rulesets(&manager, source);
                        }
                    }
                }
            }
            return Ok(());
        }
        RulesCommand::Add(add) => {
            let (source, ruleset) = add.into_ruleset()?;
            log::info!("Adding ruleset to {}: {}", source, ruleset.describe());
            manager.add_ruleset(source, ruleset)?;
        }
        RulesCommand::Remove(r) => {
            let id = ruleset_at(&manager, &r)?;
            let removed = manager.remove_ruleset(r.source, id)?;
            log::info!("Removed ruleset {} from {}", removed.describe(), r.source);
        }
        RulesCommand::Enable(r) => {
            let id = ruleset_at(&manager, &r)?;
            manager.ruleset_mut(r.source, id)?.enable = true;
        }
        RulesCommand::Disable(r) => {
            let id = ruleset_at(&manager, &r)?;
            manager.ruleset_mut(r.source, id)?.enable = false;
        }
    }

    stores.save_manager(config, &manager).await
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config);
    init_logging(cli.verbose, &config.logging.level);
    config.validate()?;

    let stores = Stores::new(&config);

    match cli.command {
        Command::Sources => {
            let manager = stores.manager(&config).await;
            for source in Source::ALL {
                let mark = if manager.is_subscribed(source) { "x" } else { " " };
                println!("[{mark}] {source}  {}", source.landing_url());
            }
        }

        Command::Subscribe { source } => {
            let mut manager = stores.manager(&config).await;
            if manager.is_subscribed(source) {
                log::info!("Already subscribed to {}", source);
                return Ok(());
            }
            manager.add_subscription(source, []);
            stores.save_manager(&config, &manager).await?;
            log::info!("Subscribed to {}", source);
        }

        Command::Unsubscribe { source, keep_rules } => {
            let mut manager = stores.manager(&config).await;
            manager.remove_subscription(source, !keep_rules)?;
            stores.save_manager(&config, &manager).await?;
            log::info!("Unsubscribed from {}", source);
        }

        Command::Rules(command) => run_rules(&config, &stores, command).await?,

        Command::Fetch { pages } => {
            let solver = ChallengeSolver::new(
                &config.crawler,
                &config.challenge,
                stores.client_ids(&config),
            );
            let ctx = CrawlContext::new(Arc::new(solver))
                .with_delay(Duration::from_millis(config.crawler.request_delay_ms));
            let registry = CrawlerRegistry::standard(ctx);

            match pipeline::run_fetch(&config, &stores.data, stores.cache.as_ref(), &registry, pages)
                .await
            {
                Ok(summary) => {
                    println!(
                        "{} fetched, {} new, {} in inbox",
                        summary.fetched, summary.added, summary.total
                    );
                }
                Err(e) => {
                    log::error!("Fetch failed: {}", e);
                    eprintln!("{}", e.user_message());
                    return Err(e);
                }
            }
        }

        Command::List { unread } => {
            let list = stores.inbox(&config).await?;
            if list.is_empty() {
                println!("Inbox is empty. Subscribe to a source and run `fetch`.");
            }
            for (i, notice) in list.iter().enumerate() {
                if !unread || !notice.is_read {
                    print_notice(i, notice);
                }
            }
            let manager = stores.manager(&config).await;
            if manager.has_active_rules() {
                println!("(rules are active; some notices may be hidden)");
            }
        }

        Command::Read { index, all } => {
            let mut list = stores.inbox(&config).await?;
            if all {
                inbox::mark_all_read(&mut list);
            } else if let Some(index) = index {
                let target = index
                    .checked_sub(1)
                    .and_then(|i| list.get(i))
                    .cloned()
                    .ok_or_else(|| AppError::validation(format!("no notice at {index}")))?;
                inbox::mark_read(&mut list, &target, true);
                println!("{}", target.link);
            }
            stores.save_inbox(&config, &list).await?;
        }

        Command::Purge { read_only } => {
            let mut list = stores.inbox(&config).await?;
            let removed = inbox::purge(&mut list, read_only);
            stores.save_inbox(&config, &list).await?;
            log::info!("Removed {} notice(s)", removed);
        }

        Command::ResetClientId => {
            stores.client_ids(&config).clear().await?;
            log::info!("Cached client ids cleared");
        }

        Command::Validate => {
            let manager = stores.manager(&config).await;
            let list = stores.inbox(&config).await?;
            log::info!("Configuration OK");
            log::info!(
                "{} subscribed source(s), {} notice(s), {} unread",
                manager.subscriptions().count(),
                list.len(),
                inbox::unread_count(&list)
            );
        }
    }

    Ok(())
}
