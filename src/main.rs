use clap::Parser;
use log::{debug, error, info};
use notebook::{
    persistence, App, BlobStore, Cli, Commands, Config, FileBlobStore, Notebook, NotebookError,
    Result,
};

pub fn initialize_logger(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    debug!("Logger initialized at {}", log::max_level());
}

fn open_notebook(cli: &Cli, config: &Config) -> Result<Notebook> {
    let file_store = FileBlobStore::open(config.data_dir.clone())?;
    info!("Using data directory {}", file_store.dir().display());
    let blobs: Box<dyn BlobStore> = Box::new(file_store);

    // Unlock carries its own password for opening the encrypted notes
    let password = match &cli.command {
        Commands::Unlock { password } => Some(password.as_str()),
        _ => cli.password.as_deref(),
    };

    if persistence::is_encrypted(blobs.as_ref()) {
        let password = password.ok_or_else(|| NotebookError::ApplicationError {
            message: "Notes are encrypted; pass --password".to_string(),
        })?;
        Notebook::open_encrypted(blobs, password)
    } else {
        Notebook::open(blobs)
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.clone())?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &cli.sync_dir {
        config.sync_dir = Some(dir.clone());
    }
    let notebook = open_notebook(&cli, &config)?;
    let mut app = App::new(notebook, config, cli.verbose);
    app.run(cli.command).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
