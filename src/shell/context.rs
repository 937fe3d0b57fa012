use crate::config::ShellConfig;
use crate::shell::commands::Executable;
use crate::shell::commands::system::SystemCommand;
use std::sync::Arc;

pub struct ShellContext {
    pub config: ShellConfig,
    // Exit code of the last external command, or 128+signal.
    pub last_status: i32,
    pub registry: Arc<Registry>,
    pub external: Arc<dyn Executable>,
}

impl ShellContext {
    pub fn new(config: ShellConfig) -> Self {
        let mut ctx = Self {
            config,
            last_status: 0,
            registry: Arc::new(Registry::default()),
            external: Arc::new(SystemCommand),
        };
        crate::shell::commands::builtins::register_all_builtins(&mut ctx);
        ctx
    }

    pub fn register_command(&mut self, name: &str, command: Box<dyn Executable>) {
        if let Some(registry) = Arc::get_mut(&mut self.registry) {
            registry.insert(name, command);
        } else {
            // This should not happen during initialization phase
            panic!("Cannot register command: Registry is shared");
        }
    }
}

/// Builtins in registration order. Lookup is by exact name, first match wins.
#[derive(Default)]
pub struct Registry {
    entries: Vec<(String, Box<dyn Executable>)>,
}

impl Registry {
    pub fn insert(&mut self, name: &str, command: Box<dyn Executable>) {
        self.entries.push((name.to_string(), command));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Executable> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, command)| &**command)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}
