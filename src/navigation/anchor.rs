// src/navigation/anchor.rs
use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;

// Resuelve un href de navegación ("Text/ch%201.xhtml#sec2") contra el directorio del
// documento que lo contiene. Devuelve la ruta normalizada y el fragmento, si lo hay.
// Aquí no se comprueba que el archivo exista.
pub fn resolve_href(href: &str, base_dir: &Path) -> (PathBuf, Option<String>) {
    let decoded = percent_decode_str(href).decode_utf8_lossy();
    let (file_part, fragment) = match decoded.split_once('#') {
        Some((file, frag)) => (file, Some(frag)),
        None => (&*decoded, None),
    };

    let fragment = fragment.filter(|f| !f.is_empty()).map(str::to_string);
    let path = normalize_path(&base_dir.join(file_part.replace('\\', "/")));
    (path, fragment)
}

// Normalización léxica: colapsa "." y ".." sin tocar el sistema de archivos.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // ".." en la raíz se queda en la raíz
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            other => components.push(other),
        }
    }

    if components.is_empty() {
        PathBuf::from(".")
    } else {
        components.iter().collect()
    }
}
