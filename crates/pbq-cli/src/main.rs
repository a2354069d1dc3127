use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pbq::Db;
use pbq_config::{Config, Overrides};
use pbq_print::Printer;
use pbq_proto::Registry;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Query PostgreSQL with protobuf-encoded parameters and template-decoded
/// results.
#[derive(Parser, Debug)]
#[command(name = "pbq", version)]
struct Args {
    /// Path to a config file. If not provided, an optional "config.json" is assumed
    #[arg(short = 'f', value_name = "PATH")]
    file: Option<PathBuf>,

    /// Path to protoc. If not provided, "protoc" is assumed
    #[arg(short = 'c', value_name = "PATH")]
    protoc: Option<String>,

    /// Protobuf source root directory
    #[arg(short = 'b', value_name = "DIR")]
    proto_dir: Option<String>,

    /// Database driver name. Possible values: postgres
    #[arg(short = 'd')]
    driver: Option<String>,

    /// Host name or IP address
    #[arg(short = 's')]
    host: Option<String>,

    /// Port number
    #[arg(short = 'p')]
    port: Option<u16>,

    /// Database name
    #[arg(short = 'n')]
    name: Option<String>,

    /// User name
    #[arg(short = 'u')]
    user_name: Option<String>,

    /// Password
    #[arg(short = 'w')]
    password: Option<String>,

    /// Do not auto-decode values in columns whose names match message aliases
    #[arg(long = "no-auto-map")]
    no_auto_map: bool,

    /// SQL to execute. When omitted and stdin is piped, each line runs as a
    /// separate query
    query: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            protoc: self.protoc.clone(),
            proto_dir: self.proto_dir.clone(),
            driver: self.driver.clone(),
            host: self.host.clone(),
            port: self.port,
            name: self.name.clone(),
            user_name: self.user_name.clone(),
            password: self.password.clone(),
            query: self.query.clone(),
            // only an explicit --no-auto-map overrides the file value
            auto_map: self.no_auto_map.then_some(false),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run() {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[tokio::main]
async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let registry = Registry::new(&config.proto.c, &config.proto.dir, false)?;

    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let db = Db::connect(
        &config.db,
        registry,
        config.in_messages,
        config.out_messages,
        config.auto_map,
    )
    .await?;
    let res = run_queries(&db, &token, &config.db.query).await;
    db.close();
    res
}

async fn run_queries(
    db: &Db,
    token: &CancellationToken,
    query: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    db.ping(token).await?;

    let stdout = io::stdout();
    let mut printer = Printer::<io::StdoutLock>::builder().build(stdout.lock())?;

    if !query.is_empty() {
        return run_one(db, token, query, &mut printer).await;
    }
    if io::stdin().is_terminal() {
        return Err("no query given and stdin is not piped".into());
    }
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        run_one(db, token, &line, &mut printer).await?;
    }
    Ok(())
}

async fn run_one<W: Write>(
    db: &Db,
    token: &CancellationToken,
    query: &str,
    printer: &mut Printer<W>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!(query, "executing");
    let (cols, rows) = db.query(token, query).await?;
    printer.print(&cols, &rows)?;
    Ok(())
}

/// Load the config file, if any, and merge the CLI overrides. A missing
/// default config file is fine; a missing explicitly-given one is not.
fn load_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let bytes = match &args.file {
        Some(path) => Some(
            std::fs::read(path)
                .map_err(|err| format!("could not read config file {}: {err}", path.display()))?,
        ),
        None => std::fs::read(DEFAULT_CONFIG_FILE).ok(),
    };
    Ok(Config::load(bytes.as_deref(), &args.overrides())?)
}
