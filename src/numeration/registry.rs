use std::rc::Rc;

use hashbrown::{HashMap, HashSet};

use super::NumberSystem;
use crate::config::Config;
use crate::error::{Error, Result};

/// Number systems by name, built on first use and kept for the lifetime of
/// the registry.
pub struct Registry {
    config: Config,
    systems: HashMap<String, Rc<NumberSystem>>,
    loading: HashSet<String>,
}

impl Registry {
    pub fn new(config: Config) -> Self {
        Registry {
            config,
            systems: HashMap::new(),
            loading: HashSet::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn get(&mut self, name: &str) -> Result<Rc<NumberSystem>> {
        if let Some(system) = self.systems.get(name) {
            return Ok(system.clone());
        }
        // a library file of a system may not refer to the system itself
        if !self.loading.insert(name.to_string()) {
            return Err(Error::UndefinedNumberSystem(name.to_string()));
        }
        let system = NumberSystem::load(name, self);
        self.loading.remove(name);
        let system = Rc::new(system?);
        self.systems.insert(name.to_string(), system.clone());
        Ok(system)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.systems.contains_key(name)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new(Config::default())
    }
}
