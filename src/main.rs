use mimalloc::MiMalloc;
use serde_json::json;
use tracing::info;

use virtcol::db::{self, SqliteConnector, connect_or_create};
use virtcol::utils::logging::init_tracing;
use virtcol::{Access, Config, Registry, ValueType, VirtcolError};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    init_tracing(&cfg.basic.loglevel);

    info!(
        database = %cfg.database.database,
        username = %cfg.database.username,
        host = %cfg.database.host,
        port = cfg.database.port,
        data_dir = %cfg.basic.data_dir.display(),
        redeclare = ?cfg.basic.redeclare,
        loglevel = %cfg.basic.loglevel,
        "configuration loaded"
    );

    let connector = SqliteConnector::new(&cfg.basic.data_dir);
    let store = connect_or_create(&cfg.database, &connector).await?;
    let handle = db::spawn(store).await?;

    let mut registry = Registry::new(cfg.basic.redeclare);
    declare_models(&mut registry)?;
    for model in &cfg.models {
        registry.declare_model(model)?;
    }
    let catalog = registry.finalize_all(&handle).await?;
    for model in catalog.iter() {
        info!(
            model = model.name(),
            table = model.table(),
            columns = model.columns().count(),
            properties = model.properties().count(),
            "model ready"
        );
    }

    let user_model = catalog.model("User")?;
    let idea_model = catalog.model("Idea")?;

    let user = handle
        .create(&user_model, json!({"name": "Stef", "happiness": 1}))
        .await?;
    let user_id = user.id().ok_or_else(|| VirtcolError::Validation("user has no id".into()))?;

    let idea = handle
        .create(
            &idea_model,
            json!({
                "name": "A way to work a bit faster with models",
                "silliness": 4,
                "originality": 0.5,
                "user_id": user_id,
            }),
        )
        .await?;

    info!(user = %user.to_json()?, "user created");
    info!(idea = %idea.to_json()?, "idea created");

    handle.stop();
    Ok(())
}

fn declare_models(registry: &mut Registry) -> Result<(), VirtcolError> {
    registry
        .register("User")?
        .column("name", ValueType::String, Access::Accessible)?
        .prop("happiness", ValueType::Integer, Access::Accessible)?;

    registry
        .register("Idea")?
        .column("name", ValueType::String, Access::Accessible)?
        .column("user_id", ValueType::Integer, Access::Accessible)?
        .prop("silliness", ValueType::Integer, Access::Accessible)?
        .prop("originality", ValueType::Float, Access::Accessible)?;

    Ok(())
}
