use std::sync::Arc;

use clap::Parser;
use dictionary::{Dictionary, DictionarySource, Lookup, ModelBackend, ModelClient};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Cli;
use routes::AppState;
use storage::{Storage, VocabularyStore};

mod config;
mod routes;
mod storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let dictionary = Dictionary::new(&cli.dictionary_url, cli.dictionary_timeout())?;
    let model = ModelClient::from_key(cli.model_api_key.clone(), cli.model_settings())?;
    let lookup = Lookup::new(
        Arc::new(dictionary) as Arc<dyn DictionarySource>,
        model.map(|model| Arc::new(model) as Arc<dyn ModelBackend>),
        cli.lookup_config(),
    );
    if !lookup.model_configured() {
        warn!("MINIMAX_API_KEY is not set, model fallback is disabled");
    }

    let store = match &cli.database_url {
        Some(url) => {
            let storage = Storage::connect(url).await?;
            info!("Vocabulary store ready at {url}");
            Some(Arc::new(storage) as Arc<dyn VocabularyStore>)
        }
        None => {
            warn!("DATABASE_URL is not set, vocabulary storage is disabled");
            None
        }
    };

    let app = routes::router(AppState {
        lookup: Arc::new(lookup),
        store,
    });

    let addr = format!("{}:{}", cli.host, cli.port);
    info!("vocab-vault listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
