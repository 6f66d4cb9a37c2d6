use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;

use areal_route::assistant::GREETING;
use areal_route::{
    distinct_categories, distinct_districts, format_area, Dashboard, FilterCriteria, NullMarkerSink,
    PlannerConfig, Site,
};

#[derive(Parser, Debug)]
#[command(name = "areal", version, about = "Site catalog and visit route planner")]
struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,
    #[arg(
        long,
        global = true,
        default_value = "areal.json",
        help = "Config file (missing file means defaults)"
    )]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Default)]
struct FilterArgs {
    #[arg(long, default_value = "", help = "Text matched against name or locality")]
    search: String,
    #[arg(long, default_value = "all")]
    district: String,
    #[arg(long, default_value = "all", help = "Category, or an empty string for unclassified")]
    category: String,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria::default()
            .search(self.search.as_str())
            .district(self.district.as_str())
            .category(self.category.as_str())
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List sites matching the filters
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Count, area and fence totals for the filtered sites
    Stats {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Distinct districts and categories in the catalog
    Districts,
    /// Sites near another site
    Nearby {
        id: String,
        #[arg(long, default_value_t = 5_000.0, help = "Radius in meters")]
        radius: f64,
    },
    /// Navigation link to a single site
    Navigate { id: String },
    /// Show and edit the visit route
    Route {
        #[command(subcommand)]
        command: RouteCommands,
    },
    /// Ask the mower FAQ assistant
    Ask { question: Vec<String> },
}

#[derive(Subcommand, Debug)]
enum RouteCommands {
    /// List stops in visit order with totals
    Show,
    /// Append sites by id, skipping ones already on the route
    Add { ids: Vec<String> },
    /// Remove one stop by id
    Remove { id: String },
    /// Remove every stop
    Clear,
    /// Print a navigation URL visiting every stop in order
    Export,
}

#[derive(Serialize)]
struct JsonOut<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Serialize)]
struct Tags {
    districts: Vec<String>,
    categories: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = PlannerConfig::load(Some(&cli.config))
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;
    let mut dashboard = Dashboard::start(config, Box::new(NullMarkerSink));

    let result = run(&cli, &mut dashboard);
    for notice in dashboard.take_notices() {
        eprintln!("{}", notice);
    }
    result
}

fn run(cli: &Cli, dashboard: &mut Dashboard) -> anyhow::Result<()> {
    match &cli.command {
        Commands::List { filter } => {
            let view = dashboard.apply_filters(filter.criteria());
            print_out(cli.json, &view.sites, site_row)?;
        }
        Commands::Stats { filter } => {
            let view = dashboard.apply_filters(filter.criteria());
            print_one(cli.json, view.stats, |s| {
                format!(
                    "sites: {}\narea: {} m2\nfence: {:.0} m",
                    s.count,
                    format_area(s.total_area),
                    s.total_fence_length
                )
            })?;
        }
        Commands::Districts => {
            let sites = dashboard.catalog().sites();
            let tags = Tags {
                districts: distinct_districts(sites),
                categories: distinct_categories(sites),
            };
            print_one(cli.json, tags, |t| {
                format!(
                    "districts: {}\ncategories: {}",
                    t.districts.join(", "),
                    t.categories
                        .iter()
                        .map(|c| if c.is_empty() { "(none)" } else { c.as_str() })
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })?;
        }
        Commands::Nearby { id, radius } => {
            if !dashboard.catalog().contains(id) {
                bail!("site not found: {}", id);
            }
            let sites: Vec<Site> = dashboard.nearby_sites(id, *radius).into_iter().cloned().collect();
            print_out(cli.json, &sites, site_row)?;
        }
        Commands::Navigate { id } => match dashboard.site_navigation_url(id) {
            Some(url) => print_one(cli.json, url, |u| u.clone())?,
            None => bail!("site not found or has no coordinates: {}", id),
        },
        Commands::Route { command } => run_route(cli.json, command, dashboard)?,
        Commands::Ask { question } => {
            let question = question.join(" ");
            let answer = if question.trim().is_empty() {
                GREETING
            } else {
                dashboard.ask(&question)
            };
            print_one(cli.json, answer, |a| a.to_string())?;
        }
    }
    Ok(())
}

fn run_route(json: bool, command: &RouteCommands, dashboard: &mut Dashboard) -> anyhow::Result<()> {
    match command {
        RouteCommands::Show => {
            let summary = dashboard.route_summary();
            if json {
                #[derive(Serialize)]
                struct RouteOut<'a> {
                    stops: &'a [Site],
                    summary: areal_route::RouteSummary,
                }
                print_one(json, RouteOut { stops: dashboard.route(), summary }, |_| String::new())?;
            } else {
                for (i, site) in dashboard.route().iter().enumerate() {
                    println!("{}. {}", i + 1, site_row(site));
                }
                println!(
                    "stops: {}, area: {} m2, distance: {:.1} km",
                    summary.stops,
                    format_area(summary.total_area),
                    summary.travel_distance / 1000.0
                );
            }
        }
        RouteCommands::Add { ids } => {
            if ids.is_empty() {
                bail!("no site ids given");
            }
            let mut unknown = Vec::new();
            for id in ids {
                if !dashboard.catalog().contains(id) {
                    unknown.push(id.as_str());
                    continue;
                }
                dashboard.add_to_route_by_id(id);
            }
            if !unknown.is_empty() {
                bail!("site not found: {}", unknown.join(", "));
            }
        }
        RouteCommands::Remove { id } => {
            if !dashboard.remove_from_route(id) {
                bail!("site not on route: {}", id);
            }
        }
        RouteCommands::Clear => {
            dashboard.clear_route();
        }
        RouteCommands::Export => {
            let url = dashboard.export_route_url()?;
            print_one(json, url, |u| u.clone())?;
        }
    }
    Ok(())
}

fn site_row(site: &Site) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        site.id,
        site.name,
        site.district,
        site.category.as_deref().unwrap_or("-"),
        site.locality
    )
}

fn print_out<T: Serialize>(json: bool, data: &[T], row: impl Fn(&T) -> String) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&JsonOut { ok: true, data })?);
    } else {
        for d in data {
            println!("{}", row(d));
        }
    }
    Ok(())
}

fn print_one<T: Serialize>(json: bool, data: T, row: impl Fn(&T) -> String) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&JsonOut { ok: true, data })?);
    } else {
        println!("{}", row(&data));
    }
    Ok(())
}
