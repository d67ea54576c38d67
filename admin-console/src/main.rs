#![deny(rust_2018_idioms)]
#![deny(clippy::all)]

use std::{io, time::Duration};

use clap::{crate_version, Arg, ArgMatches, Command};
use slog::{error, info, Logger};

use admin_console::AdStoreApi;
use primitives::{
    config::{configuration, Environment},
    util::logging::new_logger,
    AdFields, AdId, Config,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let ad_arg = Arg::new("id")
        .help("the `0x` prefixed hex id of the ad")
        .required(true)
        .takes_value(true);
    let fields_args = [
        Arg::new("title")
            .long("title")
            .required(true)
            .takes_value(true),
        Arg::new("description")
            .long("description")
            .required(true)
            .takes_value(true),
        Arg::new("image-url")
            .long("image-url")
            .required(true)
            .takes_value(true),
        Arg::new("link-url")
            .long("link-url")
            .required(true)
            .takes_value(true),
        Arg::new("location")
            .long("location")
            .help("optional free-text targeting hint")
            .takes_value(true),
        Arg::new("inactive")
            .long("inactive")
            .help("exclude the ad from random selection"),
    ];

    let cli = Command::new("Admin console")
        .version(crate_version!())
        .arg(
            Arg::new("config")
                .help("the config file of the admin console")
                .takes_value(true),
        )
        .subcommand_required(true)
        .subcommand(Command::new("list").about("List all ads"))
        .subcommand(
            Command::new("get")
                .about("Get a single ad by id")
                .arg(ad_arg.clone()),
        )
        .subcommand(
            Command::new("create")
                .about("Create a new ad")
                .args(&fields_args),
        )
        .subcommand(
            Command::new("update")
                .about("Update an ad (full replace of the editable fields)")
                .arg(ad_arg.clone())
                .args(&fields_args),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete an ad - irreversible")
                .arg(ad_arg)
                .arg(
                    Arg::new("yes")
                        .long("yes")
                        .help("skip the confirmation prompt"),
                ),
        )
        .subcommand(Command::new("stats").about("Show the aggregate analytics stats"))
        .subcommand(
            Command::new("watch")
                .about("Periodically refresh the stats & the ad list until interrupted"),
        )
        .get_matches();

    let environment = match std::env::var("ENV") {
        Ok(value) => value.parse::<Environment>()?,
        Err(_) => Environment::default(),
    };
    let config = configuration(environment, cli.value_of("config"))?;

    let logger = new_logger("admin-console");
    let api = AdStoreApi::new(&config)?;

    let result = match cli.subcommand() {
        Some(("list", _)) => list(&api, &logger).await,
        Some(("get", matches)) => get(&api, &logger, matches).await,
        Some(("create", matches)) => create(&api, &logger, matches).await,
        Some(("update", matches)) => update(&api, &logger, matches).await,
        Some(("delete", matches)) => delete(&api, &logger, matches).await,
        Some(("stats", _)) => stats(&api, &logger).await,
        Some(("watch", _)) => {
            watch(&api, &config, &logger).await;
            Ok(())
        }
        _ => unreachable!("a subcommand is required"),
    };

    // every failure collapses into a single logged error line
    if let Err(error) = result {
        error!(&logger, "{}", error; "module" => "main");
    }

    Ok(())
}

type CliError = Box<dyn std::error::Error>;

async fn list(api: &AdStoreApi, logger: &Logger) -> Result<(), CliError> {
    let response = api.list_ads().await?;

    info!(&logger, "{} ad(s)", response.count);
    for ad in &response.data {
        info!(
            &logger,
            "{}", ad.title;
            "ad_id" => ad.ad_id.to_string(),
            "active" => ad.active,
            "impressions" => ad.impressions,
            "clicks" => ad.clicks
        );
    }

    Ok(())
}

async fn get(api: &AdStoreApi, logger: &Logger, matches: &ArgMatches) -> Result<(), CliError> {
    let ad_id = parse_id(matches)?;
    let ad = api.get_ad(ad_id).await?;

    info!(&logger, "{}", serde_json::to_string_pretty(&ad).expect("Ad serializes"));

    Ok(())
}

async fn create(api: &AdStoreApi, logger: &Logger, matches: &ArgMatches) -> Result<(), CliError> {
    let ad = api.create_ad(&fields_from(matches)).await?;

    info!(&logger, "Ad created successfully"; "ad_id" => ad.ad_id.to_string());

    Ok(())
}

async fn update(api: &AdStoreApi, logger: &Logger, matches: &ArgMatches) -> Result<(), CliError> {
    let ad_id = parse_id(matches)?;
    let ad = api.update_ad(ad_id, &fields_from(matches)).await?;

    info!(&logger, "Ad updated successfully"; "ad_id" => ad.ad_id.to_string());

    Ok(())
}

async fn delete(api: &AdStoreApi, logger: &Logger, matches: &ArgMatches) -> Result<(), CliError> {
    let ad_id = parse_id(matches)?;

    if !matches.is_present("yes") && !confirm(ad_id)? {
        info!(&logger, "Aborted"; "ad_id" => ad_id.to_string());
        return Ok(());
    }

    let message = api.delete_ad(ad_id).await?;
    info!(&logger, "{}", message; "ad_id" => ad_id.to_string());

    Ok(())
}

async fn stats(api: &AdStoreApi, logger: &Logger) -> Result<(), CliError> {
    let stats = api.stats().await?;

    info!(
        &logger,
        "Analytics stats";
        "total_impressions" => stats.total_impressions,
        "total_clicks" => stats.total_clicks,
        "ctr" => format!("{}%", stats.ctr)
    );

    Ok(())
}

/// The periodic refresh of the console - the stats every
/// `stats_poll_interval` seconds and the ad list every `ads_poll_interval`
/// seconds, until Ctrl+C. Both reads are idempotent and safe to overlap.
async fn watch(api: &AdStoreApi, config: &Config, logger: &Logger) {
    let mut stats_interval =
        tokio::time::interval(Duration::from_secs(config.stats_poll_interval.into()));
    let mut ads_interval =
        tokio::time::interval(Duration::from_secs(config.ads_poll_interval.into()));

    loop {
        tokio::select! {
            _ = stats_interval.tick() => {
                if let Err(error) = stats(api, logger).await {
                    error!(&logger, "Failed to refresh stats: {}", error; "module" => "watch");
                }
            },
            _ = ads_interval.tick() => {
                if let Err(error) = list(api, logger).await {
                    error!(&logger, "Failed to refresh the ad list: {}", error; "module" => "watch");
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!(&logger, "Received Ctrl+C, stopping the watch..");
                break;
            },
        }
    }
}

fn parse_id(matches: &ArgMatches) -> Result<AdId, CliError> {
    let ad_id = matches
        .value_of("id")
        .expect("the id argument is required")
        .parse::<AdId>()?;

    Ok(ad_id)
}

fn fields_from(matches: &ArgMatches) -> AdFields {
    AdFields {
        title: matches.value_of("title").map(ToString::to_string),
        description: matches.value_of("description").map(ToString::to_string),
        image_url: matches.value_of("image-url").map(ToString::to_string),
        link_url: matches.value_of("link-url").map(ToString::to_string),
        location: matches.value_of("location").map(ToString::to_string),
        active: Some(!matches.is_present("inactive")),
    }
}

/// Asks for confirmation on stdin - delete is irreversible.
fn confirm(ad_id: AdId) -> Result<bool, io::Error> {
    println!("Delete ad {}? This cannot be undone. [y/N]", ad_id);

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;

    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
