// src/errors.rs
use thiserror::Error;
use std::path::PathBuf;

#[derive(Error, Debug)]
pub enum EpubError {
    #[error("Error de I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error al procesar archivo ZIP: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Error al parsear XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("No se encontró el documento de paquete (.opf) en el EPUB")]
    MissingPackageDocument,

    #[error("No se pudo encontrar el elemento 'package' en {0}")]
    MissingPackageElement(PathBuf),

    #[error("No se pudo encontrar el elemento 'manifest' en {0}")]
    MissingManifestElement(PathBuf),

    #[error("No se pudo leer el archivo de contenido {path}: {source}")]
    ContentRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No se pudo escribir {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
