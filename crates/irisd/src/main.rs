use anyhow::Result;
use iris_core::Pipeline;
use tracing_subscriber::EnvFilter;

mod config;
mod dbus_interface;
mod engine;

const BUS_NAME: &str = "org.irisattend.Attendance1";
const OBJECT_PATH: &str = "/org/irisattend/Attendance1";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("irisd starting");

    let config = config::Config::from_env();
    let pipeline = Pipeline::new(config.engine_config()?)?;
    let engine = engine::spawn_engine(pipeline, &config.db_path)?;

    let builder = match config.bus {
        config::BusKind::Session => zbus::connection::Builder::session()?,
        config::BusKind::System => zbus::connection::Builder::system()?,
    };
    let _connection = builder
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, dbus_interface::AttendanceService::new(engine))?
        .build()
        .await?;

    tracing::info!(bus = ?config.bus, name = BUS_NAME, "irisd ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("irisd shutting down");

    Ok(())
}
