//! Compilation options.

/// Knobs for extraction and lowering. `CompileOptions::default()` matches IETF conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Bare size name meaning a self-describing variable-length integer, as in `Length (i)`.
    pub varint_marker: String,
    /// Lower-case suffix that marks a sibling as the length of another field.
    pub length_suffix: String,
    /// Overrides the name derived from the document title.
    pub protocol_name: Option<String>,
    /// Register top-level structures and enums as PDUs.
    pub define_pdus: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            varint_marker: "i".to_string(),
            length_suffix: " length".to_string(),
            protocol_name: None,
            define_pdus: true,
        }
    }
}

impl CompileOptions {
    pub fn with_varint_marker(mut self, marker: impl Into<String>) -> Self {
        self.varint_marker = marker.into();
        self
    }

    pub fn with_length_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.length_suffix = suffix.into().to_lowercase();
        self
    }

    pub fn with_protocol_name(mut self, name: impl Into<String>) -> Self {
        self.protocol_name = Some(name.into());
        self
    }

    pub fn with_pdus(mut self, define_pdus: bool) -> Self {
        self.define_pdus = define_pdus;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_setters() {
        let options = CompileOptions::default();
        assert_eq!(options.varint_marker, "i");
        assert_eq!(options.length_suffix, " length");
        assert!(options.define_pdus);

        let options = options
            .with_length_suffix(" Len")
            .with_protocol_name("QUIC")
            .with_pdus(false);
        assert_eq!(options.length_suffix, " len");
        assert_eq!(options.protocol_name.as_deref(), Some("QUIC"));
        assert!(!options.define_pdus);
    }
}
