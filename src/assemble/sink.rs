// src/assemble/sink.rs
use std::fs;
use std::path::PathBuf;

use log::debug;

use crate::errors::EpubError;

// Destino de los archivos Markdown generados.
pub trait OutputSink {
    fn write_file(&mut self, name: &str, contents: &str) -> Result<PathBuf, EpubError>;
}

// Escribe archivos en un directorio, creándolo la primera vez.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: PathBuf) -> Self {
        DirectorySink { dir }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

impl OutputSink for DirectorySink {
    fn write_file(&mut self, name: &str, contents: &str) -> Result<PathBuf, EpubError> {
        fs::create_dir_all(&self.dir).map_err(|source| EpubError::Write {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(name);
        fs::write(&path, contents).map_err(|source| EpubError::Write {
            path: path.clone(),
            source,
        })?;
        debug!("escrito {}", path.display());
        Ok(path)
    }
}
