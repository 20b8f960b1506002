// src/metadata.rs
use roxmltree::Node;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BookMetadata {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub publisher: Option<String>,
}

impl BookMetadata {
    // Lee los campos Dublin Core del nodo <metadata> del OPF.
    // Los prefijos (dc:) se ignoran comparando el nombre local.
    pub fn parse(metadata_node: Node) -> Self {
        let mut metadata = BookMetadata::default();

        for child in metadata_node.descendants().filter(Node::is_element) {
            let Some(text) = child.text().map(str::trim).filter(|t| !t.is_empty()) else {
                continue;
            };
            match child.tag_name().name() {
                "title" if metadata.title.is_none() => metadata.title = Some(text.to_string()),
                "creator" => metadata.authors.push(text.to_string()),
                "publisher" if metadata.publisher.is_none() => {
                    metadata.publisher = Some(text.to_string())
                }
                _ => {}
            }
        }
        metadata
    }

    // Bloque de front matter, una sola vez al inicio del libro completo.
    pub fn front_matter(&self, book_title: &str) -> String {
        let mut header = vec!["---".to_string(), format!("title: {}", book_title)];
        if !self.authors.is_empty() {
            header.push(format!("author: {}", self.authors.join(", ")));
        }
        if let Some(publisher) = &self.publisher {
            header.push(format!("publisher: {}", publisher));
        }
        header.push("---".to_string());
        header.push(String::new());
        header.join("\n")
    }
}
