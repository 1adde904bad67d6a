use std::path::{Path, PathBuf};

use execvnode::AccountingRecord;

use crate::common::config::Config;
use crate::common::fsutils::FileLock;
use crate::server::accounting::AccountingLog;
use crate::server::state::State;

pub mod accounting;
pub mod job;
pub mod state;

/// Exclusive access to the state file for one command.
///
/// Changes made through [`Session::state_mut`] are only persisted by [`Session::commit`].
pub struct Session {
    state: State,
    state_path: PathBuf,
    accounting: AccountingLog,
    _lock: FileLock,
}

impl Session {
    pub fn open(state_path: &Path, config: &Config) -> crate::Result<Session> {
        let lock = FileLock::acquire(state_path)?;
        let state = State::load(state_path)?;
        Ok(Session {
            state,
            state_path: state_path.to_path_buf(),
            accounting: AccountingLog::new(config.accounting_log()),
            _lock: lock,
        })
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    /// Stores the state and appends the records of the committed transition.
    pub fn commit(self, job_id: Option<&str>, records: &[AccountingRecord]) -> crate::Result<()> {
        self.state.save(&self.state_path)?;
        if let Some(job_id) = job_id {
            self.accounting.append(job_id, records)?;
        }
        Ok(())
    }
}
