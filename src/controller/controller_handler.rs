use std::sync::Arc;

use log::{debug, info};

use crate::configuration::config::Config;
use crate::configuration::types::SeedConfig;
use crate::employees::EmployeeService;
use crate::error_handling::types::*;
use crate::records::RecordService;
use crate::storage::DatabaseStorage;
use crate::web_interface::WebServer;

/// Counts of seed rows actually inserted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub students: usize,
    pub courses: usize,
    pub roles: usize,
}

/// Insert missing seed rows; existing keys are left as they are.
pub async fn apply_seed(
    storage: &DatabaseStorage,
    seed: &SeedConfig,
) -> Result<SeedReport, StorageError> {
    let mut report = SeedReport::default();
    for student in &seed.students {
        if storage.seed_student(student).await? {
            report.students += 1;
        }
    }
    for course in &seed.courses {
        if storage.seed_course(course).await? {
            report.courses += 1;
        }
    }
    for role in &seed.roles {
        if storage.seed_role(role).await? {
            report.roles += 1;
        }
    }
    Ok(report)
}

/// Owns the configuration and wires storage, services and the web server.
pub struct Controller {
    pub config: Config,
}

impl Controller {
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Open the database, apply the seed and build the web server.
    pub async fn build(&self) -> Result<WebServer, ControllerError> {
        info!("Opening database {}", self.config.database_url);
        let storage = Arc::new(DatabaseStorage::connect(&self.config.database_url).await?);

        if !self.config.seed.is_empty() {
            let report = apply_seed(&storage, &self.config.seed).await?;
            info!(
                "Seeded {} student(s), {} course(s), {} role(s)",
                report.students, report.courses, report.roles
            );
        }

        let records = Arc::new(RecordService::new(storage.clone()));
        let employees = Arc::new(EmployeeService::new(storage));
        debug!("Services ready");
        Ok(WebServer::new(records, employees))
    }

    /// Serve until ctrl-c.
    pub async fn run(&mut self) -> Result<(), ControllerError> {
        let server = self.build().await?;
        server.start(&self.config.bind_address).await?;
        info!("Controller stopped");
        Ok(())
    }
}
