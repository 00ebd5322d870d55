use crate::services::resources::ResourceStore;
use crate::{Config, Database};
use anyhow::Result;

pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub resources: ResourceStore,
    pub session_lifetime_hours: i64,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Result<Self> {
        let max_upload_bytes = config.resources.max_upload_bytes()?;
        let session_lifetime_hours = config.auth.session_lifetime_hours()?;
        let resources = ResourceStore::new(&config.resources.root, max_upload_bytes);
        std::fs::create_dir_all(resources.root())?;

        Ok(Self {
            config,
            db,
            resources,
            session_lifetime_hours,
            max_upload_bytes,
        })
    }
}
