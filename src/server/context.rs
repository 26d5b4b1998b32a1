use std::path::PathBuf;
use std::time::Duration;

use crate::access_log::AccessLog;
use crate::config::Config;
use crate::files::Resolver;
use crate::http::response::ResponseComposer;

/// Read-only state shared by all connection tasks.
#[derive(Debug, Clone)]
pub struct ServerContext {
    pub resolver: Resolver,
    pub composer: ResponseComposer,
    pub access_log: AccessLog,
    pub timeout: Option<Duration>,
}

impl ServerContext {
    pub fn new(root: impl Into<PathBuf>, access_log: AccessLog) -> Self {
        Self {
            resolver: Resolver::new(root),
            composer: ResponseComposer::default(),
            access_log,
            timeout: None,
        }
    }

    pub fn from_config(cfg: &Config, access_log: AccessLog) -> Self {
        Self::new(cfg.root.clone(), access_log).with_timeout(cfg.timeout)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
