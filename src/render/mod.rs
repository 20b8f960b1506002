// src/render/mod.rs
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};

// Elementos cuyos límites cortan la línea de texto actual
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "dd", "div", "dl", "dt",
    "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

// Elementos sin texto visible
const HIDDEN_TAGS: &[&str] = &["head", "title", "script", "style", "noscript", "template"];

// Texto visible de un documento o fragmento, una línea recortada y no vacía por bloque.
pub fn visible_lines(document: &Html) -> Vec<String> {
    let mut output = String::new();
    process_node(document.root_element(), &mut output);

    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

// Un corte que empieza dentro de una tabla pierde filas y celdas sin un <table> alrededor
static TABLE_PART_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*<(tr|td|th|tbody|thead|tfoot|caption|colgroup|col)[\s/>]")
        .expect("table part regex")
});

// Markup recortado de un archivo mayor; se toleran etiquetas sin cerrar.
pub fn fragment_lines(markup: &str) -> Vec<String> {
    if TABLE_PART_RE.is_match(markup) {
        let wrapped = format!("<table>{}</table>", markup);
        return visible_lines(&Html::parse_fragment(&wrapped));
    }
    visible_lines(&Html::parse_fragment(markup))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Texto de un elemento, con las partes unidas por espacios y el espacio colapsado.
pub fn element_text(element: ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn process_node(node: ElementRef, output: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                for ch in text.text.chars() {
                    if ch.is_whitespace() {
                        if !output.is_empty() && !output.ends_with(char::is_whitespace) {
                            output.push(' ');
                        }
                    } else {
                        output.push(ch);
                    }
                }
            }
            Node::Element(element) => {
                let tag_name = element.name().to_lowercase();
                if HIDDEN_TAGS.contains(&tag_name.as_str()) {
                    continue;
                }
                let is_block = BLOCK_TAGS.contains(&tag_name.as_str());

                if is_block {
                    output.push('\n');
                }
                if let Some(element_ref) = ElementRef::wrap(child) {
                    process_node(element_ref, output);
                }
                if is_block {
                    output.push('\n');
                }
            }
            // comentarios, doctype, instrucciones de procesamiento
            _ => {}
        }
    }
}
