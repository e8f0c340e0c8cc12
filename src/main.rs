use std::path::{Path, PathBuf};

use cet_select::{
    access::{AccessGate, IdentityProvider, Session, SessionStore},
    cli::{AdminCommands, Cli, Commands, FilterArgs, OptionKind, OutputFormat},
    config::{Config, DEFAULT_LOG_FILTER},
    cutoff::{self, Category, CutoffRecord, DatasetCache, RankQuery, RecordFilter, ToleranceBand},
    error,
    storage::{self, UserStatus, UserStore},
    utils,
};
use clap::Parser;
use colored::*;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const RECORD_WIDTHS: [usize; 7] = [8, 34, 14, 6, 30, 8, 11];
const RECORD_HEADERS: [&str; 7] = [
    "College", "College Name", "Location", "Branch", "Branch Name", "Category", "Cutoff Rank",
];

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let app = App::new(config);

    let result = match cli.command {
        Commands::Init => {
            info!("Initializing...");
            initialize(&app, &cli.config)
        }

        Commands::Register { username, password } => register(&app, &username, &password),

        Commands::Login { username, password, admin } => login(&app, &username, &password, admin),

        Commands::Logout => logout(&app),

        Commands::Whoami => whoami(&app),

        Commands::Explore { filters, category, format, limit } => {
            explore(&app, filters, category, format, limit)
        }

        Commands::Predict { rank, category, filters, format, limit } => {
            predict(&app, rank, category, filters, format, limit)
        }

        Commands::Options { kind } => show_options(&app, kind),

        Commands::LabelCs { input, output } => label_cs(&input, &output),

        Commands::Reload => reload(&app),

        Commands::Admin { command } => admin(&app, command),
    };

    if let Err(e) = result {
        error!("{}", e);
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

/// Everything a command handler needs; built once per invocation.
struct App {
    config: Config,
    sessions: SessionStore,
    dataset: DatasetCache,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            sessions: SessionStore::new(&config.session.path),
            dataset: DatasetCache::from_path(&config.data.path),
            config,
        }
    }

    fn gate(&self) -> error::Result<AccessGate<UserStore>> {
        let store = UserStore::new(&self.config.database.path)?;
        Ok(AccessGate::new(store, self.config.admin.clone()))
    }

    fn lookup_session(&self) -> error::Result<Session> {
        let session = self.sessions.load()?;
        Ok(self.gate()?.require_lookup(session.as_ref())?.clone())
    }

    fn admin_session(&self) -> error::Result<Session> {
        let session = self.sessions.load()?;
        Ok(self.gate()?.require_admin(session.as_ref())?.clone())
    }
}

fn initialize(app: &App, config_path: &str) -> error::Result<()> {
    println!("{}", "Initializing CET Select...".green());

    let store = UserStore::new(&app.config.database.path)?;
    println!("{}", "✓ User database initialized".green());

    let mut config_file = PathBuf::from(config_path);
    if config_file.extension().is_none() {
        config_file.set_extension("toml");
    }
    if config_file.exists() {
        println!("{}", format!("✓ Using existing {}", config_file.display()).green());
    } else {
        app.config.write_toml(&config_file)?;
        println!("{}", format!("✓ Wrote default {}", config_file.display()).green());
    }

    let stats = store.get_stats()?;
    println!("\n{}", "Configuration:".cyan());
    println!("  Dataset:        {}", app.config.data.path.display());
    println!("  User database:  {}", app.config.database.path);
    println!("  Session file:   {}", app.config.session.path.display());
    println!("  Admin user:     {}", app.config.admin.username);
    println!("  Users:          {} ({} active)", stats.total_users, stats.active_users);

    if app.config.uses_default_admin_password() {
        println!(
            "\n{}",
            "⚠ The admin password is still the default. Set admin.password_hash.".yellow()
        );
    }

    println!("\n{}", "Ready to use! Try running:".cyan());
    println!("  {} to create an account", "cet-select register <name> -p <password>".yellow());
    println!("  {} to search by rank", "cet-select predict <rank> -k GM".yellow());
    Ok(())
}

fn register(app: &App, username: &str, password: &str) -> error::Result<()> {
    let gate = app.gate()?;
    let account = gate.provider().register(username, password)?;
    println!(
        "{}",
        format!("✓ Registered {}. Please complete the next step.", account.username).green()
    );
    println!("{}", "You are registered but not yet activated.".yellow());
    println!(
        "After payment, send your username and transaction ID to the administrator ({}).",
        app.config.admin.username
    );
    Ok(())
}

fn login(app: &App, username: &str, password: &str, as_admin: bool) -> error::Result<()> {
    let gate = app.gate()?;
    let session = if as_admin {
        gate.admin_login(username, password)?
    } else {
        gate.login(username, password)?
    };
    app.sessions.save(&session)?;

    let role = if session.is_admin() { "admin" } else { "user" };
    println!(
        "{}",
        format!("✓ Logged in as {} ({})", session.username(), role).green()
    );
    Ok(())
}

fn logout(app: &App) -> error::Result<()> {
    let current = app.sessions.load()?;
    if app.sessions.clear()? {
        if let Some(session) = current {
            info!("{} logged out", session.username());
        }
        println!("{}", "✓ Logged out".green());
    } else {
        println!("{}", "Nobody is logged in".yellow());
    }
    Ok(())
}

fn whoami(app: &App) -> error::Result<()> {
    match app.sessions.load()? {
        Some(session) => {
            let role = if session.is_admin() { "admin" } else { "user" };
            println!(
                "Logged in as {} ({}) since {}",
                session.username().cyan(),
                role,
                utils::format_timestamp(&session.started_at)
            );
        }
        None => println!("{}", "Not logged in".yellow()),
    }
    Ok(())
}

fn build_filter(args: FilterArgs, category: Option<Category>) -> RecordFilter {
    let filter = RecordFilter::new()
        .with_branches(&args.branches)
        .with_locations(&args.locations);
    let filter = match args.college {
        Some(college) => filter.with_college(college),
        None => filter,
    };
    match category {
        Some(category) => filter.with_category(category),
        None => filter,
    }
}

fn explore(
    app: &App,
    filters: FilterArgs,
    category: Option<Category>,
    format: OutputFormat,
    limit: Option<usize>,
) -> error::Result<()> {
    app.lookup_session()?;
    let dataset = app.dataset.get()?;
    let filter = build_filter(filters, category);
    let rows = cutoff::filter_records(&dataset, &filter);

    if format == OutputFormat::Json {
        let body = serde_json::json!({
            "count": rows.len(),
            "records": rows,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("\n{}", "=== Available Branches and Cutoffs ===".cyan().bold());
    if rows.is_empty() {
        println!("{}", "No matching records found.".yellow());
        return Ok(());
    }
    println!(
        "{}",
        format!("Found {} matching record(s).", rows.len()).green()
    );
    print_records(&rows, limit);
    Ok(())
}

fn predict(
    app: &App,
    rank: i64,
    category: Category,
    filters: FilterArgs,
    format: OutputFormat,
    limit: Option<usize>,
) -> error::Result<()> {
    // Reject bad ranks before touching the session or the dataset
    ToleranceBand::for_rank(rank)?;
    app.lookup_session()?;

    let dataset = app.dataset.get()?;
    let query = RankQuery::new(rank, category).with_filters(build_filter(filters, None));
    let eligible = cutoff::find_eligible(&dataset, &query)?;
    let band = eligible.band;

    if format == OutputFormat::Json {
        let body = serde_json::json!({
            "count": eligible.len(),
            "rank": band.rank,
            "category": category.code(),
            "tolerance": band.tolerance,
            "min_rank": band.min_rank,
            "max_rank": band.max_rank,
            "records": eligible.records,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("\n{}", "=== Eligible Colleges and Branches ===".cyan().bold());
    println!(
        "Rank {} ({}): cutoffs from {} to {}",
        band.rank,
        utils::format_category(category),
        band.min_rank,
        band.max_rank
    );
    if eligible.is_empty() {
        println!(
            "{}",
            "No eligible colleges found. Try adjusting your filters.".yellow()
        );
        return Ok(());
    }
    println!(
        "{}",
        format!(
            "Found {} option(s) within ±{} ranks.",
            eligible.len(),
            band.tolerance
        )
        .green()
    );
    print_records(&eligible.records, limit);
    Ok(())
}

fn print_records(rows: &[&CutoffRecord], limit: Option<usize>) {
    let shown = limit.unwrap_or(rows.len()).min(rows.len());
    let width = RECORD_WIDTHS.iter().sum::<usize>() + 2 * (RECORD_WIDTHS.len() - 1);

    utils::print_table_border(width);
    utils::print_table_row(&RECORD_HEADERS, &RECORD_WIDTHS);
    utils::print_table_border(width);
    for record in &rows[..shown] {
        utils::print_table_row(
            &[
                &record.college_code,
                &record.college_name,
                &record.location,
                &record.branch_code,
                &record.branch_name,
                &record.category,
                &utils::format_rank(record.cutoff_rank),
            ],
            &RECORD_WIDTHS,
        );
    }
    utils::print_table_border(width);

    if shown < rows.len() {
        println!("... {} more (raise --limit to see them)", rows.len() - shown);
    }
}

fn show_options(app: &App, kind: OptionKind) -> error::Result<()> {
    if kind == OptionKind::Categories {
        for category in Category::ALL {
            println!("{}", utils::format_category(category));
        }
        return Ok(());
    }

    app.lookup_session()?;
    let dataset = app.dataset.get()?;
    let lines: Vec<String> = match kind {
        OptionKind::Colleges => dataset
            .colleges()
            .into_iter()
            .map(|(code, name)| format!("{} – {}", code, name))
            .collect(),
        OptionKind::Branches => dataset
            .branches()
            .into_iter()
            .map(|(code, name)| format!("{} – {}", code, name))
            .collect(),
        OptionKind::Locations => dataset.locations(),
        OptionKind::Categories => Vec::new(),
    };

    for line in &lines {
        println!("{}", line);
    }
    info!("Listed {} {:?}", lines.len(), kind);
    Ok(())
}

fn label_cs(input: &Path, output: &Path) -> error::Result<()> {
    let changed = cutoff::labels::relabel_file(input, output)?;
    println!(
        "{}",
        format!("✓ Updated file written to {} ({} branch name(s) tagged)", output.display(), changed)
            .green()
    );
    Ok(())
}

fn reload(app: &App) -> error::Result<()> {
    app.admin_session()?;
    let dataset = app.dataset.reload()?;

    println!("{}", "=== Cutoff Dataset ===".cyan().bold());
    println!("  Source:     {}", app.dataset.source().path().display());
    println!("  Rows:       {}", dataset.len());
    println!("  Ranked:     {}", dataset.ranked_count().to_string().green());
    let unranked = dataset.len() - dataset.ranked_count();
    if unranked > 0 {
        warn!("{} row(s) have no usable cutoff rank", unranked);
        println!("  Unranked:   {}", unranked.to_string().yellow());
    }
    println!("  Colleges:   {}", dataset.colleges().len());
    println!("  Branches:   {}", dataset.branches().len());
    println!("  Locations:  {}", dataset.locations().len());
    Ok(())
}

fn admin(app: &App, command: AdminCommands) -> error::Result<()> {
    let session = app.admin_session()?;
    let gate = app.gate()?;
    let users = gate.provider();

    match command {
        AdminCommands::Users { status } => {
            let list = users.list_users(status)?;
            println!("\n{}", format!("=== Users ({}) ===", status).cyan().bold());
            if list.is_empty() {
                println!("{}", "No users".yellow());
                return Ok(());
            }
            utils::print_table_border(64);
            utils::print_table_row(&["Username", "Status", "Registered"], &[28, 10, 22]);
            utils::print_table_border(64);
            for user in &list {
                let status = if user.active { "Active" } else { "Inactive" };
                utils::print_table_row(
                    &[
                        &user.username,
                        status,
                        &utils::format_timestamp(&user.created_at),
                    ],
                    &[28, 10, 22],
                );
            }
            utils::print_table_border(64);
        }

        AdminCommands::Activate { username } => {
            users.set_active(&username, true)?;
            info!("{} activated {}", session.username(), username);
            println!("{}", format!("✓ Activated {}", username).green());
        }

        AdminCommands::Deactivate { username } => {
            users.set_active(&username, false)?;
            info!("{} deactivated {}", session.username(), username);
            println!("{}", format!("✓ Deactivated {}", username).yellow());
        }

        AdminCommands::Export { status, output } => {
            if status == UserStatus::All {
                warn!("Exporting every user, active and inactive");
            }
            let list = users.list_users(status)?;
            let written = storage::export_users(&list, &output)?;
            println!(
                "{}",
                format!("✓ Exported {} {} user(s) to {}", written, status, output.display()).green()
            );
        }

        AdminCommands::Stats => {
            let stats = users.get_stats()?;
            println!("{}", "=== User Statistics ===".cyan().bold());
            println!("  Total:      {}", stats.total_users);
            println!("  Active:     {}", stats.active_users.to_string().green());
            println!("  Inactive:   {}", stats.inactive_users.to_string().yellow());
        }
    }

    Ok(())
}
