//! Material (product) catalog

use serde::{Deserialize, Serialize};

use super::correlation::ExtractCorrelation;

/// Label used when a reading carries no material at all
pub const BLANK_MATERIAL: &str = "(vuoto)";

/// A product that can sit in a vessel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpec {
    /// Code reported by the cellar instrumentation
    pub code: String,
    /// Display name used for grouping
    pub name: String,
    /// Free-text spellings recognized as this material
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Marks the "vessel empty" pseudo-material
    #[serde(default)]
    pub empty: bool,
    /// Correlation used instead of the default one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation: Option<ExtractCorrelation>,
}

impl MaterialSpec {
    fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            aliases: Vec::new(),
            empty: false,
            correlation: None,
        }
    }

    fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }
}

/// Lookup table from instrument material codes to product names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialCatalog {
    pub materials: Vec<MaterialSpec>,
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        let mut empty = MaterialSpec::new("0", "vuoto");
        empty.empty = true;

        Self {
            materials: vec![
                MaterialSpec::new("7", "ichnusa").with_aliases(&["ichnusa"]),
                MaterialSpec::new("8", "non filtrata").with_aliases(&["non filtrata", "nonfiltrata"]),
                MaterialSpec::new("9", "cruda").with_aliases(&["cruda"]),
                MaterialSpec::new("28", "ambra limpida").with_aliases(&["ambra limpida"]),
                empty,
                MaterialSpec::new("10", "ich(prop)"),
                MaterialSpec::new("32", "Recovered Beer"),
                MaterialSpec::new("36", "Recovered Beer"),
                MaterialSpec::new("3", "NF Bottle"),
                MaterialSpec::new("1", "Ich Bottle"),
                MaterialSpec::new("2", "Ich Fusti"),
            ],
        }
    }
}

impl MaterialCatalog {
    pub fn new(materials: Vec<MaterialSpec>) -> Self {
        Self { materials }
    }

    fn by_code(&self, code: &str) -> Option<&MaterialSpec> {
        self.materials.iter().find(|m| m.code == code)
    }

    /// Find a material by its display name
    pub fn find_by_name(&self, name: &str) -> Option<&MaterialSpec> {
        self.materials.iter().find(|m| m.name == name)
    }

    /// Map a raw material cell to a display name
    ///
    /// Blank cells become [`BLANK_MATERIAL`]. Codes are matched exactly, then
    /// as integers ("7.0" is "7"); unmapped integers are returned as-is.
    /// Text is matched against aliases with case and accents folded, and
    /// anything else is kept verbatim.
    pub fn normalize(&self, raw: &str) -> String {
        let s = raw.trim();
        if s.is_empty() {
            return BLANK_MATERIAL.to_string();
        }

        if let Some(spec) = self.by_code(s) {
            return spec.name.clone();
        }

        if let Ok(value) = s.replace(',', ".").parse::<f64>() {
            if value.is_finite() {
                let code = format!("{}", value.trunc() as i64);
                return match self.by_code(&code) {
                    Some(spec) => spec.name.clone(),
                    None => code,
                };
            }
        }

        let folded = fold_accents(&s.to_lowercase());
        for spec in &self.materials {
            if spec
                .aliases
                .iter()
                .any(|alias| folded.contains(&fold_accents(&alias.to_lowercase())))
            {
                return spec.name.clone();
            }
        }

        s.to_string()
    }

    /// Whether a normalized name means "nothing in the vessel"
    pub fn is_empty_material(&self, name: &str) -> bool {
        name == BLANK_MATERIAL
            || self
                .materials
                .iter()
                .any(|m| m.empty && m.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Correlation override for a normalized material name
    pub fn correlation_for(&self, name: &str) -> Option<ExtractCorrelation> {
        self.find_by_name(name).and_then(|m| m.correlation)
    }
}

/// Replace accented vowels with their plain form
fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            'à' | 'á' | 'â' | 'ä' => 'a',
            'è' | 'é' | 'ê' | 'ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'ò' | 'ó' | 'ô' | 'ö' => 'o',
            'ù' | 'ú' | 'û' | 'ü' => 'u',
            other => other,
        })
        .collect()
}
