use account_ingest::{
    AccountRecord, CustomerRecord, InMemoryRepository, JsonExporter, Pipeline, Settings,
    XmlExporter, setup_logging,
};
use anyhow::Result;
use tracing::debug;

fn main() -> Result<()> {
    setup_logging()?;

    let settings = Settings::from_env()?;
    debug!(?settings, "loaded settings");

    let mut pipeline = Pipeline::new(
        settings.cipher()?,
        InMemoryRepository::<AccountRecord>::new(),
        InMemoryRepository::<CustomerRecord>::new(),
    );
    if let Some(parallelism) = settings.parallelism {
        pipeline = pipeline.with_parallelism(parallelism);
    }

    let summary = pipeline.run(
        &settings.account_file,
        &settings.customer_file,
        &JsonExporter::new(&settings.output_dir),
        &XmlExporter::new(&settings.output_dir),
    )?;
    println!("{summary}");

    Ok(())
}
