use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::prelude::*;

use clinn_timetable::{query_table, MemoryStore, Store};

use crate::ascii::table;
use crate::routes::{router, AppState};

mod ascii;
mod error;
mod routes;

#[derive(Parser)]
#[command(author, version, about, long_about)]
struct Args {
  /// JSON file with faculties, departments, professors, topics, users and tables.
  #[arg(long, short, env = "CLINN_FIXTURE")]
  fixture: PathBuf,
  #[arg(long, env = "CLINN_SENTRY_DSN")]
  sentry_dsn: Option<String>,
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the timetable API.
  Serve {
    #[arg(long, short, env = "CLINN_LISTEN", default_value = "0.0.0.0:8080")]
    listen: SocketAddr,
    #[arg(long, env = "CLINN_API_TOKEN")]
    api_token: Option<String>,
  },
  /// Print the merged timetable of a user.
  Show {
    #[arg(long, short)]
    user: u32,
    #[command(flatten)]
    filter: Filter,
  },
}

#[derive(clap::Args)]
struct Filter {
  #[arg(long, value_delimiter = ',')]
  topics: Option<Vec<u32>>,
  #[arg(long, value_delimiter = ',')]
  professors: Option<Vec<u32>>,
  #[arg(long, value_delimiter = ',')]
  days: Option<Vec<usize>>,
  #[arg(long, value_delimiter = ',')]
  periods: Option<Vec<usize>>,
}

impl From<Filter> for clinn_timetable::Query {
  fn from(filter: Filter) -> Self {
    Self {
      topics: filter.topics.map(|ids| ids.into_iter().collect()),
      professors: filter.professors.map(|ids| ids.into_iter().collect()),
      days: filter.days.map(|days| days.into_iter().collect()),
      periods: filter.periods.map(|periods| periods.into_iter().collect()),
    }
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let args = Args::parse();

  let _sentry = args.sentry_dsn.as_deref().map(|dsn| {
    sentry::init((
      dsn,
      sentry::ClientOptions {
        release: sentry::release_name!(),
        ..Default::default()
      },
    ))
  });

  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer())
    .with(sentry_tracing::layer())
    .init();

  let store = MemoryStore::load(&args.fixture)?;

  match args.command {
    Command::Serve { listen, api_token } => {
      let app = router(AppState::new(store), api_token.as_deref());
      let listener = TcpListener::bind(listen).await?;

      info!("Listening on {}", listen);
      axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    }
    Command::Show { user, filter } => {
      let account = store.user(user)?;
      let merged = query_table(&store, account, &filter.into());

      println!("Timetable of {}\n{}", account.username, table(&merged.table));
      for choice in &merged.choices {
        println!("- {}", choice);
      }
    }
  }

  Ok(())
}

async fn shutdown_signal() {
  if let Err(err) = signal::ctrl_c().await {
    tracing::error!("Unable to listen for shutdown signal: {}", err);
  }
  info!("Shutting down");
}
