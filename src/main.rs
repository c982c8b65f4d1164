#[macro_use]
extern crate tracing;

use std::path::PathBuf;

use structopt::StructOpt;
use tokio::runtime::Builder;
use tokio::signal;

use ledvirt::{
    global::{Event, HookRunner, Paths},
    models::backend::{ConfigBackend, ConfigExt, DbBackend, FileBackend},
};

#[derive(Debug, StructOpt)]
struct Opts {
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u32,
    #[structopt(short, long = "db-path")]
    database_path: Option<String>,
    #[structopt(short, long = "config")]
    config_path: Option<PathBuf>,
    #[structopt(long)]
    dump_config: bool,
    #[structopt(long = "user-root")]
    user_root: Option<PathBuf>,
}

async fn run(opts: Opts) -> color_eyre::eyre::Result<()> {
    // Load configuration
    let config = {
        if let Some(config_path) = opts.config_path.as_deref() {
            FileBackend::new(config_path).load().await?
        } else {
            // Connect to database
            let db = ledvirt::db::Db::try_default(opts.database_path.as_deref()).await?;
            DbBackend::new(db).load().await?
        }
    };

    // Dump configuration if this was asked
    if opts.dump_config {
        print!("{}", ConfigExt::to_string(&config)?);
        return Ok(());
    }

    let paths = Paths::new(opts.user_root.clone())?;

    // Create the global state object
    let global = ledvirt::global::GlobalData::new(&config).wrap();

    // Run the event hooks
    tokio::spawn(
        HookRunner::new(
            config.global.hooks.clone(),
            global.subscribe_events().await,
        )
        .run(),
    );

    // Start the JSON server
    let _json_server = ledvirt::servers::bind(
        "JSON",
        config.global.json_server,
        global.clone(),
        ledvirt::servers::json::handle_client,
    )
    .await?;

    // Start the panel web server
    let web_server = ledvirt::web::bind(global.clone(), &config.global.web_config, &paths).await?;
    tokio::spawn(web_server);

    global.get_event_tx().await.send(Event::Start).ok();

    // Should we continue running?
    let mut abort = false;

    while !abort {
        tokio::select! {
            _ = signal::ctrl_c() => {
                abort = true;
            }
        }
    }

    info!("terminating");
    global.get_event_tx().await.send(Event::Stop).ok();

    Ok(())
}

fn install_tracing(opts: &Opts) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let fmt_layer = fmt::layer();

    let filter_layer = EnvFilter::try_from_env("LEDVIRT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(match opts.verbose {
            0 => "ledvirt=warn,ledvirtd=warn",
            1 => "ledvirt=info,ledvirtd=info",
            2 => "ledvirt=debug,ledvirtd=debug",
            _ => "ledvirt=trace,ledvirtd=trace",
        })
    });

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .try_init()
}

#[paw::main]
fn main(opts: Opts) -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    install_tracing(&opts)?;

    // Create tokio runtime
    let thd_count = match num_cpus::get() {
        1 => 2,
        other => other.min(4),
    };

    let rt = Builder::new_multi_thread()
        .worker_threads(thd_count)
        .enable_all()
        .build()?;
    rt.block_on(run(opts))
}
