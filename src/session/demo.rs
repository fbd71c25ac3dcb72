//! Persisted demo-mode flag
//!
//! Read once at startup. Only [`DemoFlag::enter`] and [`DemoFlag::exit`]
//! change it, and both write through to disk so the mode survives restarts.

use std::fs;
use std::path::{Path, PathBuf};

const FLAG_FILE: &str = "demo_mode";

#[derive(Debug)]
pub struct DemoFlag {
    path: PathBuf,
    enabled: bool,
}

impl DemoFlag {
    pub fn load(data_dir: &Path) -> std::io::Result<Self> {
        let path = data_dir.join(FLAG_FILE);
        let enabled = match fs::read_to_string(&path) {
            Ok(content) => content.trim() == "true",
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e),
        };
        Ok(Self { path, enabled })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enter(&mut self) -> std::io::Result<()> {
        self.write(true)
    }

    pub fn exit(&mut self) -> std::io::Result<()> {
        self.write(false)
    }

    fn write(&mut self, enabled: bool) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, if enabled { "true" } else { "false" })?;
        self.enabled = enabled;
        log::info!("Demo mode {}", if enabled { "entered" } else { "exited" });
        Ok(())
    }
}
