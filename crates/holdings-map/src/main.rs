use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use futures::StreamExt;
use holdings_map::{HeadlessSurface, Pin, SurfaceEvent, ViewBinder};
use holdings_model::{HoldingsConfig, Marker, MarkerFields, Position};
use holdings_store::{MemoryStore, StorePath};
use holdings_sync::SyncEngine;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let seed = Arg::new("seed")
        .long("seed")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("JSON file with the initial holders and holdings trees");
    let config = Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("TOML configuration file");

    Command::new("holdings-map")
        .version(holdings_map::VERSION)
        .about("Render and edit holdings markers against a seeded store")
        .subcommand_required(true)
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("render")
                .about("Render the seeded markers onto a headless map and print the pins")
                .arg(seed.clone())
                .arg(config.clone())
                .arg(
                    Arg::new("edit")
                        .long("edit")
                        .action(ArgAction::SetTrue)
                        .help("Render pins in edit mode (draggable)"),
                ),
        )
        .subcommand(
            Command::new("create")
                .about("Create a marker in the seeded store and print the stored record")
                .arg(seed)
                .arg(config)
                .arg(
                    Arg::new("name")
                        .long("name")
                        .required(true)
                        .help("Marker name"),
                )
                .arg(
                    Arg::new("lat")
                        .long("lat")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(f64))
                        .help("Vertical image coordinate"),
                )
                .arg(
                    Arg::new("lng")
                        .long("lng")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(f64))
                        .help("Horizontal image coordinate"),
                )
                .arg(
                    Arg::new("holder")
                        .long("holder")
                        .help("Holder name; sets the marker color"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(args: &ArgMatches) -> Result<HoldingsConfig> {
    match args.get_one::<PathBuf>("config") {
        Some(path) => HoldingsConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(HoldingsConfig::default()),
    }
}

fn load_seed(args: &ArgMatches) -> Result<MemoryStore> {
    let path = args
        .get_one::<PathBuf>("seed")
        .context("--seed is required")?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed {}", path.display()))?;
    let root: Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing seed {}", path.display()))?;
    Ok(MemoryStore::with_root(root))
}

async fn render(args: &ArgMatches) -> Result<Value> {
    let config = load_config(args)?;
    let store = load_seed(args)?;
    let engine = SyncEngine::start(Arc::new(store), &config.sync).context("starting sync engine")?;
    engine.synced().await;

    let surface = HeadlessSurface::new();
    let (mut binder, _events) = ViewBinder::attach(surface.clone(), &engine, &config);
    binder.set_edit_mode(args.get_flag("edit"));

    let mut combined = engine.combined();
    binder.handle_event(SurfaceEvent::Ready);
    let view = combined.next().await.context("marker feed ended before the first snapshot")?;
    binder.reconcile(&view.markers);

    for marker in view.markers.iter() {
        if !config.map.bounds.contains(marker.position()) {
            tracing::warn!(id = ?marker.id(), position = ?marker.position(), "marker outside the map image");
        }
    }

    tokio::time::sleep(config.map.settle_delay()).await;
    binder.frame();
    engine.shutdown();

    let pins: Vec<Pin> = surface.pins().into_iter().map(|(_, pin)| pin).collect();
    Ok(json!({
        "overlay": surface.overlay(),
        "viewport": surface.viewport(),
        "pins": pins,
    }))
}

async fn create(args: &ArgMatches) -> Result<Value> {
    let config = load_config(args)?;
    let store = load_seed(args)?;
    let engine =
        SyncEngine::start(Arc::new(store.clone()), &config.sync).context("starting sync engine")?;
    engine.synced().await;

    let name = args.get_one::<String>("name").context("--name is required")?;
    let latitude = *args.get_one::<f64>("lat").context("--lat is required")?;
    let longitude = *args.get_one::<f64>("lng").context("--lng is required")?;
    let position = Position::new(latitude, longitude);
    if !config.map.bounds.contains(position) {
        tracing::warn!(?position, "marker outside the map image");
    }

    let mut fields = MarkerFields::at(position).with_name(name.as_str());
    if let Some(holder) = args.get_one::<String>("holder") {
        fields = fields.with_holder(holder.as_str());
    }

    let id = engine
        .commands()
        .create(Marker::Unsaved(fields))
        .await
        .context("creating marker")?;
    engine.shutdown();

    let path = StorePath::parse(&config.sync.holdings_path)?.child(id.as_str())?;
    Ok(json!({
        "id": id,
        "record": store.get(&path),
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json"));

    let output = match matches.subcommand() {
        Some(("render", args)) => render(args).await?,
        Some(("create", args)) => create(args).await?,
        Some((other, _)) => anyhow::bail!("unknown command: {other}"),
        None => anyhow::bail!("no command given"),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
