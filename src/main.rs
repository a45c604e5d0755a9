use std::env;
use std::io;
use std::path::Path;
use std::process::ExitCode;

use golf_wagers::Scorecard;
use golf_wagers::csv::{read_records, write_balances, write_transactions};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Level, error, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: golf-wagers <round.csv> [transactions|balances]";

/// What to print once the round is settled.
enum Report {
    Transactions,
    Balances,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Level::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };
    let report = match args.next().as_deref() {
        None | Some("transactions") => Report::Transactions,
        Some("balances") => Report::Balances,
        Some(other) => {
            eprintln!("unknown report '{other}'\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let records = match read_records(Path::new(&path)) {
        Ok(records) => records,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut scorecard = Scorecard::new();
    let (record_sender, record_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in records {
            match result {
                Ok(record) => {
                    if record_sender.send(record).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    scorecard.run(ReceiverStream::new(record_receiver)).await;

    let settlement = match scorecard.settle() {
        Ok(settlement) => settlement,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    let written = match report {
        Report::Transactions => write_transactions(&settlement.transactions, stdout.lock()),
        Report::Balances => write_balances(&settlement, stdout.lock()),
    };
    if let Err(e) = written {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
