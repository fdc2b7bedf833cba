//! `META-INF/MANIFEST.MF` of an exploded archive

use crate::context::StagingContext;

const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JarManifest {
    attributes: Vec<(String, String)>,
}

impl JarManifest {
    /// Parse `Key: value` lines. A line starting with a single space
    /// continues the previous value.
    pub fn parse(content: &str) -> Self {
        let mut attributes: Vec<(String, String)> = Vec::new();

        for line in content.lines() {
            let line = line.trim_end_matches('\r');
            if let Some(continuation) = line.strip_prefix(' ') {
                if let Some((_, value)) = attributes.last_mut() {
                    value.push_str(continuation);
                }
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                attributes.push((key.trim().to_string(), value.trim().to_string()));
            }
        }

        Self { attributes }
    }

    /// The application's manifest, if it has one
    pub fn load(context: &StagingContext) -> Option<Self> {
        let path = context.app_path(MANIFEST_PATH);
        context
            .fs()
            .read_to_string(&path)
            .ok()
            .map(|content| Self::parse(&content))
    }

    /// Attribute value; names compare case-insensitively like the JDK does
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
    }

    pub fn main_class(&self) -> Option<&str> {
        self.get("Main-Class")
    }
}
