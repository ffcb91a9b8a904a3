use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::Parser;
use datastore::import::import_records;
use datastore::{Database, JsonStorage, Result, StorageError, logging};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "import",
    about = "Reads bar delimited records and upserts them into a JSON datastore file"
)]
struct Cli {
    /// JSON database file to load or create
    #[arg(short, long, default_value = "db.json", env = "DATASTORE_DB")]
    db: PathBuf,

    /// JSON scheme file, used when the database file does not exist yet
    #[arg(short, long, default_value = "Scheme.json", env = "DATASTORE_SCHEME")]
    scheme: PathBuf,

    /// Input file, standard input when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,
}

fn main() {
    logging::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut db = Database::open(JsonStorage::open_or_create(&cli.db, &cli.scheme)?)?;

    let (reader, source): (Box<dyn BufRead>, &Path) = match &cli.input {
        Some(path) => {
            let file = File::open(path).map_err(|source| StorageError::Io {
                path: path.clone(),
                source,
            })?;
            (Box::new(BufReader::new(file)) as Box<dyn BufRead>, path.as_path())
        }
        None => (Box::new(io::stdin().lock()) as Box<dyn BufRead>, Path::new("<stdin>")),
    };

    let summary = match import_records(&mut db, reader, source) {
        Ok(summary) => summary,
        Err(e) => {
            db.discard();
            return Err(e);
        }
    };
    db.close()?;

    info!(
        db = %cli.db.display(),
        inserted = summary.inserted,
        replaced = summary.replaced,
        "import complete"
    );
    Ok(())
}
