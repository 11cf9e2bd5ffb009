//! Pre-parsed IETF documents: a title and a tree of sections holding text and artwork.
//!
//! Extraction only ever reads artwork, in depth-first section order. The plain-text loader puts
//! every blank-line-separated block into a single section as artwork and lets the grammar
//! decide what is a definition.

use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Title {
    pub text: Option<String>,
    pub abbrev: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Text(String),
    Artwork(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub title: Option<String>,
    pub content: Vec<Block>,
    pub sections: Vec<Section>,
}

impl Section {
    fn collect_artwork<'a>(&'a self, out: &mut Vec<&'a str>) {
        for block in &self.content {
            if let Block::Artwork(text) = block {
                out.push(text);
            }
        }
        for sub in &self.sections {
            sub.collect_artwork(out);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub title: Title,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn from_text(text: &str) -> Self {
        let mut content = Vec::new();
        let mut current = String::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    content.push(Block::Artwork(std::mem::take(&mut current)));
                }
                continue;
            }
            current.push_str(line);
            current.push('\n');
        }
        if !current.is_empty() {
            content.push(Block::Artwork(current));
        }
        Document {
            title: Title::default(),
            sections: vec![Section {
                title: None,
                content,
                sections: Vec::new(),
            }],
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_text(&text))
    }

    pub fn with_title(mut self, title: Title) -> Self {
        self.title = title;
        self
    }

    /// Artwork text of every section, depth first, in document order.
    pub fn artwork(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for section in &self.sections {
            section.collect_artwork(&mut out);
        }
        out
    }

    /// The part of the title before `:` (as in "QUIC: A UDP-Based Multiplexed and Secure
    /// Transport"), otherwise the abbreviated title.
    pub fn protocol_name(&self) -> Option<String> {
        let from_text = self
            .title
            .text
            .as_deref()
            .and_then(|t| t.split_once(':'))
            .map(|(name, _)| name.trim().to_string())
            .filter(|name| !name.is_empty());
        from_text.or_else(|| self.title.abbrev.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artwork_is_depth_first() {
        let doc = Document {
            title: Title::default(),
            sections: vec![
                Section {
                    title: Some("1".into()),
                    content: vec![Block::Artwork("a".into()), Block::Text("prose".into())],
                    sections: vec![Section {
                        title: Some("1.1".into()),
                        content: vec![Block::Artwork("b".into())],
                        sections: vec![],
                    }],
                },
                Section {
                    title: Some("2".into()),
                    content: vec![Block::Artwork("c".into())],
                    sections: vec![],
                },
            ],
        };
        assert_eq!(doc.artwork(), ["a", "b", "c"]);
    }

    #[test]
    fn text_blocks_split_on_blank_lines() {
        let doc = Document::from_text("A {\n  B (8),\n}\n\n   \nC = D | E\n");
        assert_eq!(doc.artwork(), ["A {\n  B (8),\n}\n", "C = D | E\n"]);
    }

    #[test]
    fn protocol_name_from_title() {
        let title = Title {
            text: Some("QUIC: A UDP-Based Multiplexed and Secure Transport".into()),
            abbrev: Some("QUIC Transport Protocol".into()),
        };
        let doc = Document::default().with_title(title);
        assert_eq!(doc.protocol_name().as_deref(), Some("QUIC"));

        let doc = Document::default().with_title(Title {
            text: Some("No Colon Here".into()),
            abbrev: Some("NCH".into()),
        });
        assert_eq!(doc.protocol_name().as_deref(), Some("NCH"));
        assert_eq!(Document::default().protocol_name(), None);
    }

    #[test]
    fn from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "Ping Frame {\n  Type (i) = 0x01,\n}\n").unwrap();
        let doc = Document::from_path(&path).unwrap();
        assert_eq!(doc.artwork().len(), 1);
        assert!(Document::from_path(dir.path().join("missing.txt")).is_err());
    }
}
