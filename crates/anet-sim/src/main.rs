use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use rand::rngs::StdRng;
use rand::SeedableRng;

use anet_client::GraphQlClient;
use anet_sim::{init_logging, run_buildup, scenario, SimConfig, SimContext, WorkloadScheduler};

fn cli() -> Command {
    Command::new("anet-sim")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Statistical workload simulator for the ANET GraphQL API")
        .arg(
            Arg::new("scenario")
                .value_name("SCENARIO")
                .help("Scenario to run (default, lotsOfData)"),
        )
        .arg(
            Arg::new("cycles")
                .value_name("CYCLES")
                .value_parser(value_parser!(f64))
                .help("Scheduling cycles of one minute each"),
        )
        .arg(
            Arg::new("minutes")
                .value_name("MINUTES")
                .value_parser(value_parser!(f64))
                .help("Running time of the scheduled stories"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(value_parser!(u64))
                .help("Random seed for a reproducible schedule"),
        )
        .arg(
            Arg::new("skip-buildup")
                .long("skip-buildup")
                .action(ArgAction::SetTrue)
                .help("Go straight to the scheduled stories"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .action(ArgAction::SetTrue)
                .help("Log as JSON lines"),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("log-json"));

    let mut config = SimConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .context("loading configuration")?;
    if let Some(name) = matches.get_one::<String>("scenario") {
        config = config.with_scenario(name);
    }
    if let Some(cycles) = matches.get_one::<f64>("cycles") {
        config = config.with_cycles(*cycles);
    }
    if let Some(minutes) = matches.get_one::<f64>("minutes") {
        config = config.with_minutes(*minutes);
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.seed = Some(*seed);
    }

    let scenario = scenario(&config.scenario)?;
    scenario.validate()?;
    println!("Scenario: {scenario}");

    let client = GraphQlClient::new(config.client.clone()).context("building GraphQL client")?;
    let ctx = SimContext::new(Arc::new(client), config.admin.clone());

    if !matches.get_flag("skip-buildup") {
        for report in run_buildup(&ctx, &scenario).await {
            println!("{report}");
        }
    }

    if scenario.stories.is_empty() {
        println!("No scenario stories found.");
        return Ok(());
    }
    println!(
        "Sim stories starting, cycles: {}, running time: {} minutes",
        config.cycles, config.minutes
    );
    let rng = config.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let mut scheduler = WorkloadScheduler::with_rng(
        ctx,
        scenario.user_types.clone(),
        &scenario.stories,
        config.cycle_length(),
        rng,
    )
    .with_role_delay(config.role_delay());
    scheduler.run(config.running_time()).await;

    for line in scheduler.summary() {
        println!("{line}");
    }
    Ok(())
}
