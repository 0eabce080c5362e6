use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RuneterraConfig {
    pub api_port: u16,
    pub paths: RuneterraPaths,
}

impl RuneterraConfig {
    pub fn from_env() -> Result<Self> {
        let base = env::var("RUNETERRA_DATA_DIR")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let paths = RuneterraPaths::from_base_dir(base)?;
        let api_port = env::var("RUNETERRA_API_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(3001);
        Ok(Self { api_port, paths })
    }

    pub fn new(api_port: u16, paths: RuneterraPaths) -> Self {
        Self { api_port, paths }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RuneterraPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub avatars_dir: PathBuf,
    pub post_images_dir: PathBuf,
}

impl RuneterraPaths {
    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("runeterra.db");
        let uploads_dir = base.join("uploads");
        let avatars_dir = uploads_dir.join("avatars");
        let post_images_dir = uploads_dir.join("posts");

        Ok(Self {
            base,
            data_dir,
            db_path,
            uploads_dir,
            avatars_dir,
            post_images_dir,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.avatars_dir)?;
        std::fs::create_dir_all(&self.post_images_dir)?;
        Ok(())
    }
}
