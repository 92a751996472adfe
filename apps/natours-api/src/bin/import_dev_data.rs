use clap::{ArgGroup, Parser};
use core_config::{Environment, FromEnv};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::mongodb::MongoConfig;
use natours_api::{api, dev_data::DevData};
use resource_handler::{DocumentStore, MongoStore};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Load the development data set into MongoDB, or remove it"
)]
#[command(group(ArgGroup::new("action").required(true).args(["import", "delete"])))]
struct Args {
    /// Insert tours, users and reviews
    #[arg(long)]
    import: bool,

    /// Remove every tour, user and review
    #[arg(long)]
    delete: bool,

    /// Directory holding tours.json, users.json and reviews.json
    #[arg(long, default_value = "dev-data")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();
    let args = Args::parse();
    init_tracing(&Environment::from_env());

    let mongodb = MongoConfig::from_env()?;
    let client = database::mongodb::connect_from_config_with_retry(&mongodb, None).await?;
    let store: Arc<dyn DocumentStore> = Arc::new(MongoStore::new(client.database(mongodb.database())));
    let data = DevData::new(store.clone());

    if args.import {
        api::ensure_indexes(&store).await?;
        let summary = data.import(&args.data_dir).await?;
        println!(
            "Data successfully loaded: {} tours, {} users, {} reviews",
            summary.tours, summary.users, summary.reviews
        );
    } else {
        let removed = data.delete().await?;
        println!("Data successfully deleted: {removed} documents");
    }

    Ok(())
}
