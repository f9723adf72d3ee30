use std::rc::Rc;

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::engine::{Engine, EngineFactory, InstanceHandle};
use crate::error::{ErrorReporter, Result, VlcError};

/// Process-wide handle to the playback engine
///
/// Every [`Media`](crate::Media) and [`MediaPlayer`](crate::MediaPlayer)
/// borrows the instance it was created from, so none of them can outlive it.
/// Dropping the instance releases the engine.
pub struct Instance {
    engine: Rc<dyn Engine>,
    handle: InstanceHandle,
}

impl Instance {
    /// Start the engine with the given arguments
    ///
    /// The engine may be shared with other instances; each instance holds
    /// its own engine-side handle.
    pub fn new(engine: Rc<dyn Engine>, args: &[String]) -> Result<Self> {
        debug!("Creating engine instance with args {:?}", args);
        ErrorReporter::begin(engine.as_ref());
        match engine.instance_new(args) {
            Some(handle) => {
                info!("Engine instance ready: {}", engine.version());
                Ok(Self { engine, handle })
            }
            None => {
                let reason = engine
                    .errmsg()
                    .unwrap_or_else(|| "engine returned no instance".to_string());
                engine.clearerr();
                Err(VlcError::EngineInit(reason))
            }
        }
    }

    /// Load the configured backend and start it
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let engine = EngineFactory::from_config(config)?;
        Self::with_config(Rc::from(engine), config)
    }

    /// Start an already loaded engine with the configured arguments and user agent
    pub fn with_config(engine: Rc<dyn Engine>, config: &EngineConfig) -> Result<Self> {
        let instance = Self::new(engine, &config.args)?;
        if let Some(agent) = &config.user_agent {
            instance.set_user_agent(&agent.name, &agent.http);
        }
        Ok(instance)
    }

    /// Raw instance handle, for objects created from this instance
    pub fn core(&self) -> InstanceHandle {
        self.handle
    }

    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    /// Version of the running engine
    pub fn lib_version(&self) -> String {
        self.engine.version()
    }

    /// Version of this connector
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Application name and HTTP user agent the engine reports to servers
    pub fn set_user_agent(&self, application: &str, http: &str) {
        ErrorReporter::begin(self.engine());
        self.engine.set_user_agent(self.handle, application, http);
        ErrorReporter::check(self.engine(), "set user agent");
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        debug!("Releasing engine instance");
        self.engine.instance_release(self.handle);
        ErrorReporter::check(self.engine(), "instance release");
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance").field("handle", &self.handle).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineBackend, UserAgent};
    use crate::engine::MemoryEngine;

    #[test]
    fn test_new_with_empty_args() {
        let instance = Instance::new(Rc::new(MemoryEngine::new()), &[]).unwrap();
        assert!(instance.lib_version().contains("memory"));
        assert_eq!(Instance::version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_failed_start_is_engine_init_error() {
        let args = vec!["not-an-option".to_string()];
        let result = Instance::new(Rc::new(MemoryEngine::new()), &args);
        match result {
            Err(VlcError::EngineInit(reason)) => assert!(reason.contains("not-an-option")),
            other => panic!("expected EngineInit, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_from_config_applies_user_agent() {
        let config = EngineConfig {
            backend: EngineBackend::Memory,
            args: Vec::new(),
            user_agent: Some(UserAgent {
                name: "Test Player".to_string(),
                http: "TestPlayer/1.0".to_string(),
            }),
        };
        let instance = Instance::from_config(&config).unwrap();
        assert!(ErrorReporter::last_error().is_none());
        assert!(instance.lib_version().contains("memory"));
    }

    #[test]
    fn test_user_agent_reaches_engine() {
        let engine = Rc::new(MemoryEngine::new());
        let instance = Instance::new(engine.clone(), &[]).unwrap();
        instance.set_user_agent("Test Player", "TestPlayer/1.0");
        assert_eq!(
            engine.user_agent(),
            Some(("Test Player".to_string(), "TestPlayer/1.0".to_string()))
        );
    }

    #[test]
    fn test_drop_releases_engine_instance() {
        let engine = Rc::new(MemoryEngine::new());
        let instance = Instance::new(engine.clone(), &[]).unwrap();
        assert_eq!(engine.live_instances(), 1);
        drop(instance);
        assert_eq!(engine.live_instances(), 0);
    }
}
