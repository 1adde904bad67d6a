use std::path::{Path, PathBuf};

use crate::client::output::outputs::Output;
use crate::common::config::Config;
use crate::server::Session;

pub struct GlobalSettings {
    config: Config,
    state_path: PathBuf,
    printer: Box<dyn Output>,
}

impl GlobalSettings {
    pub fn new(config: Config, state_path: PathBuf, printer: Box<dyn Output>) -> Self {
        GlobalSettings {
            config,
            state_path,
            printer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn printer(&self) -> &dyn Output {
        self.printer.as_ref()
    }

    /// Locks the state file for the duration of one command.
    pub fn open_session(&self) -> crate::Result<Session> {
        Session::open(&self.state_path, &self.config)
    }
}
