use std::{path::PathBuf, sync::Arc};

use clap::{ArgAction, Parser};
use pkgview::{
    AppError, Catalog, CatalogEvent, CatalogStore, FilterState, PackageRecord, SearchField,
    SearchMode, SortField, StatusFlags,
    config::Config,
    filter::sort_records,
    format::{DateStyle, format_size},
    pman::Pacman,
    resolver::find_target,
    source::{spawn_refresh, spawn_update_check},
    specifier::{plain, render_list},
    structs::{package::RelationKind, packageupdate::UpdateCheck},
    utils::thousands,
};

/// Browse the pacman package catalog
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Config file (default ~/.config/pkgview/config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Only this repository
    #[arg(short, long, default_value = "")]
    repo: String,
    /// Status names, e.g. explicit,orphan or installed
    #[arg(short, long)]
    status: Option<String>,
    /// Search text
    #[arg(short, long)]
    query: Option<String>,
    /// Fields to search, e.g. name,description,files
    #[arg(long)]
    by: Option<String>,
    /// substring, all, any or exact
    #[arg(long)]
    mode: Option<String>,
    #[arg(long, default_value = "name")]
    sort: String,
    #[arg(long)]
    reverse: bool,
    /// Check for updates
    #[arg(long)]
    updates: bool,
    /// Show details of a package (or what provides it)
    #[arg(long)]
    info: Option<String>,
    /// Per repository statistics
    #[arg(long)]
    stats: bool,
    #[arg(long)]
    groups: bool,
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(args).await {
        eprintln!("{e}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(args: Args) -> Result<(), AppError> {
    let config = Config::load(args.config.as_deref())?;
    let filter = filter_state(&args, &config)?;
    let sort: SortField = args.sort.parse()?;

    let pacman = Arc::new(Pacman::new(&config));
    if !pacman.exists().await {
        return Err(format!("{} is not installed", config.pacman).into());
    }

    let store = Arc::new(CatalogStore::new());
    store.subscribe(|event| match event {
        CatalogEvent::Replaced { generation, count } => {
            log::debug!("Catalog {generation}: {count} packages")
        }
        CatalogEvent::Updated { generation, names } => {
            log::debug!("Catalog {generation}: {} updated", names.len())
        }
    });

    eprintln!("Collecting packages...");
    spawn_refresh(store.clone(), pacman.clone(), config.timeout())
        .await
        .map_err(|e| AppError::Other(e.to_string()))??;
    for failure in store.snapshot().failures() {
        eprintln!("Skipped {}: {}", failure.source_name, failure.reason);
    }

    if args.updates {
        let report = spawn_update_check(store.clone(), pacman, config.timeout())
            .await
            .map_err(|e| AppError::Other(e.to_string()))?;
        match report.check {
            UpdateCheck::Available(list) => eprintln!("{} updates available", list.len()),
            UpdateCheck::NoUpdates => eprintln!("No updates available"),
            UpdateCheck::Failed(reason) => eprintln!("{}", AppError::UpdateCheckFailed(reason)),
        }
    }

    let catalog = store.snapshot();
    if let Some(name) = &args.info {
        let record = find_target(&catalog, name)
            .ok_or_else(|| AppError::Other(format!("Package not found: {name}")))?;
        print_info(&catalog, record, config.size_decimals);
    } else if args.stats {
        print_stats(&catalog, config.size_decimals);
    } else if args.groups {
        for (group, members) in catalog.groups() {
            println!("{group:<24} {}", members.join(" "));
        }
    } else {
        let mut records = catalog.filter(&filter);
        sort_records(&mut records, sort, args.reverse);
        for r in records.iter() {
            println!(
                "{:<36} {:<28} {:<12} {}",
                r.name(),
                r.version_display(),
                r.repository(),
                r.status_text()
            );
        }
        eprintln!("{} of {} packages", thousands(records.len()), thousands(catalog.len()));
    }
    Ok(())
}

fn filter_state(args: &Args, config: &Config) -> Result<FilterState, AppError> {
    let mut search = config.search.clone();
    if let Some(by) = &args.by {
        search.fields = if by == "all" {
            SearchField::ALL.to_vec()
        } else {
            SearchField::parse_list(by)?
        };
    }
    if let Some(mode) = &args.mode {
        search.mode = mode.parse::<SearchMode>()?;
    }
    let status_mask = match &args.status {
        Some(s) => StatusFlags::from_names(s)?,
        None => config.default_status,
    };
    Ok(FilterState {
        repository: args.repo.clone(),
        status_mask,
        search_text: args.query.clone().unwrap_or_default(),
        search,
    })
}

fn print_info(catalog: &Catalog, record: &PackageRecord, decimals: u8) {
    let field = |key: &str, value: &str| {
        let value = value.replace('\n', &format!("\n{:18}", ""));
        println!("{key:<16}: {value}");
    };
    let list = |kind: RelationKind| render_list(record.relations(kind), plain);

    field("Name", record.name());
    field("Version", &record.version_display());
    field("Description", record.description());
    field("Repository", record.repository());
    field("URL", record.url());
    field("Package URL", &record.package_url());
    field("Licenses", &record.licenses_display());
    field("Groups", &record.group_display());
    for kind in [RelationKind::Provides, RelationKind::Depends, RelationKind::Optdepends] {
        field(&kind.to_string(), &list(kind));
    }
    field("Required By", &record.required_by_display(catalog));
    field("Optional For", &record.optional_for_display(catalog));
    for kind in [RelationKind::Conflicts, RelationKind::Replaces] {
        field(&kind.to_string(), &list(kind));
    }
    field("Download Size", &record.download_size_display(decimals));
    field("Installed Size", &record.install_size_display(decimals));
    field("Packager", record.packager());
    field("Build Date", &record.build_date_display(DateStyle::Long));
    field("Install Date", &record.install_date_display(DateStyle::Long));
    field("Status", record.status_text());
    field("Install Script", if record.has_script() { "Yes" } else { "No" });
    let validation: Vec<&str> = record.validation().iter_names().map(|(n, _)| n).collect();
    field("Validated By", &validation.join(" "));
    field("Files", &thousands(record.files().len()));
    let backup: Vec<String> = record
        .backup()
        .iter()
        .map(|b| format!("/{}  ({})", b.path.trim_start_matches('/'), b.status().text()))
        .collect();
    field("Backup Files", &backup.join("\n"));
}

fn print_stats(catalog: &Catalog, decimals: u8) {
    let stats = catalog.stats();
    println!("{:<16} {:>10} {:>10} {:>14}", "Repository", "Packages", "Installed", "Size");
    for s in stats.repos.iter().chain([&stats.total]) {
        println!(
            "{:<16} {:>10} {:>10} {:>14}",
            s.repository,
            thousands(s.count),
            thousands(s.installed),
            format_size(s.installed_size, decimals)
        );
    }
}
