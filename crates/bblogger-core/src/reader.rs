//! One acquisition cycle: log in, query every command group, extract, store.

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::catalog::ExtractError;
use crate::config::{Credentials, SessionConfig};
use crate::driver::ModemDriver;
use crate::report::ReportRecord;
use crate::session::{Connector, Session, SessionError};
use crate::store::{StagedUpdates, StatStore};

/// Result of one successful cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Values written to the store.
    pub updated: usize,
    /// Identifiers whose extraction missed; their previous values were kept.
    pub missed: Vec<&'static str>,
}

/// Reads a modem's statistics into a [`StatStore`].
///
/// A fresh session is opened for every call. Values are staged while the
/// command groups are read and committed only once all of them have been, so
/// a failed cycle leaves the store exactly as it was.
pub struct StatReader<D, C> {
    driver: D,
    connector: C,
    session: SessionConfig,
    store: StatStore,
}

impl<D: ModemDriver, C: Connector> StatReader<D, C> {
    pub fn new(driver: D, connector: C, session: SessionConfig) -> Self {
        Self {
            driver,
            connector,
            session,
            store: StatStore::new(),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn store(&self) -> &StatStore {
        &self.store
    }

    /// Current store contents in catalog order.
    pub fn record(&self, at: DateTime<Local>) -> ReportRecord {
        self.store.record(self.driver.catalog(), at)
    }

    /// Runs one cycle against `credentials.host`.
    pub fn read_stats(&mut self, credentials: &Credentials) -> Result<CycleOutcome, SessionError> {
        let mut session = Session::connect(
            &self.connector,
            &credentials.host,
            self.driver.prompts(),
            &self.session,
        )?;

        let staged = match self.query(&mut session, credentials) {
            Ok(staged) => staged,
            Err(e) => {
                session.close();
                return Err(e);
            }
        };
        session.close();

        let (updates, missed) = staged;
        let updated = self.store.commit(updates);
        debug!(
            "{}: {} values updated, {} missed",
            self.driver.model(),
            updated,
            missed.len()
        );
        Ok(CycleOutcome { updated, missed })
    }

    fn query(
        &self,
        session: &mut Session<C::Stream>,
        credentials: &Credentials,
    ) -> Result<(StagedUpdates, Vec<&'static str>), SessionError> {
        session.login(&credentials.account, &credentials.password)?;

        let mut updates = StagedUpdates::new();
        let mut missed = Vec::new();
        for group in self.driver.query_groups() {
            let response = session.send_command(group.command())?;
            for (name, extracted) in self.driver.parse(group, &response) {
                match extracted {
                    Ok(value) => updates.push((name, value)),
                    Err(ExtractError::NoMatch) => {
                        warn!("Did not find {} in '{}' output", name, group.command());
                        missed.push(name);
                    }
                    Err(ExtractError::Invalid(e)) => {
                        warn!("Could not read {} from '{}' output: {}", name, group.command(), e);
                        missed.push(name);
                    }
                }
            }
        }
        Ok((updates, missed))
    }
}
