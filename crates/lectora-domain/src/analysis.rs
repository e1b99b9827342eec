//! Analysis results: per-fragment findings and the consolidated synthesis

use crate::category::{Category, CATEGORY_COUNT};
use serde::{Deserialize, Serialize};

/// Sentinel used for metadata fields the service could not determine
pub const UNSPECIFIED: &str = "No especificado";

fn unspecified() -> String {
    UNSPECIFIED.to_string()
}

/// A concrete proposal found in the program
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Proposal {
    /// Short title
    #[serde(rename = "titulo", default)]
    pub title: String,

    /// Detailed description
    #[serde(rename = "descripcion", default)]
    pub description: String,
}

impl Proposal {
    /// Create a new proposal
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Ideological reading of a category (free-form enumerated strings)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Perspective {
    /// Role of the state (subsidiary, active manager, regulator, guarantor)
    #[serde(rename = "rol_del_estado", default, skip_serializing_if = "Option::is_none")]
    pub role_of_state: Option<String>,

    /// Ideological stance
    #[serde(rename = "enfoque_ideologico", default, skip_serializing_if = "Option::is_none")]
    pub stance: Option<String>,

    /// Tone of the text
    #[serde(rename = "tono", default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

impl Perspective {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.role_of_state.is_none() && self.stance.is_none() && self.tone.is_none()
    }
}

/// What the service found about one category in one fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFinding {
    /// Canonical category
    #[serde(rename = "categoria")]
    pub category: Category,

    /// Perspective descriptor
    #[serde(rename = "analisis_perspectiva", default)]
    pub perspective: Perspective,

    /// Ordered proposals
    #[serde(rename = "propuestas_clave", default)]
    pub proposals: Vec<Proposal>,

    /// Verbatim quotes
    #[serde(rename = "citas_textuales", default)]
    pub quotes: Vec<String>,
}

impl CategoryFinding {
    /// Create an empty finding for a category
    pub fn new(category: Category) -> Self {
        Self {
            category,
            perspective: Perspective::default(),
            proposals: Vec::new(),
            quotes: Vec::new(),
        }
    }
}

/// Result of analyzing a single fragment
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PartialAnalysis {
    /// 1-based index of the analyzed fragment
    #[serde(rename = "fragmento")]
    pub fragment_index: usize,

    /// Findings, possibly empty
    #[serde(rename = "categorias_encontradas")]
    pub findings: Vec<CategoryFinding>,

    /// Category names returned by the service that are not canonical
    #[serde(skip)]
    pub rejected_categories: Vec<String>,
}

impl PartialAnalysis {
    /// Create a partial analysis for a fragment
    pub fn new(fragment_index: usize, findings: Vec<CategoryFinding>) -> Self {
        Self {
            fragment_index,
            findings,
            rejected_categories: Vec::new(),
        }
    }

    /// True when the fragment produced no findings
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Candidate metadata extracted from the lead text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Candidate name
    #[serde(rename = "candidato", default = "unspecified")]
    pub candidate: String,

    /// Party or coalition
    #[serde(rename = "partido_coalicion", default = "unspecified")]
    pub party: String,

    /// Election or program year
    #[serde(rename = "año", default = "unspecified")]
    pub year: String,
}

impl Metadata {
    /// Metadata with every field set to the sentinel value
    pub fn unspecified() -> Self {
        Self {
            candidate: unspecified(),
            party: unspecified(),
            year: unspecified(),
        }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::unspecified()
    }
}

/// Consolidated record for one category of one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// Canonical category
    #[serde(rename = "categoria")]
    pub category: Category,

    /// Whether the program addresses this category
    #[serde(rename = "presente")]
    pub present: bool,

    /// Perspective descriptor
    #[serde(rename = "analisis_perspectiva", default)]
    pub perspective: Perspective,

    /// Proposals
    #[serde(rename = "propuestas_clave", default)]
    pub proposals: Vec<Proposal>,

    /// Verbatim quotes
    #[serde(rename = "citas_textuales", default)]
    pub quotes: Vec<String>,
}

impl CategoryRecord {
    /// Empty record marked not present
    pub fn absent(category: Category) -> Self {
        Self {
            category,
            present: false,
            perspective: Perspective::default(),
            proposals: Vec::new(),
            quotes: Vec::new(),
        }
    }

    /// Present record built from a finding
    pub fn from_finding(finding: CategoryFinding) -> Self {
        Self {
            category: finding.category,
            present: true,
            perspective: finding.perspective,
            proposals: finding.proposals,
            quotes: finding.quotes,
        }
    }
}

/// One consolidated record per document: metadata plus exactly one
/// record per canonical category, in taxonomy order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Synthesis {
    metadata: Metadata,
    #[serde(rename = "categorias")]
    categories: Vec<CategoryRecord>,
    #[serde(skip)]
    rejected_categories: Vec<String>,
}

impl Synthesis {
    /// Skeleton with every category absent
    pub fn skeleton(metadata: Metadata) -> Self {
        Self::from_records(metadata, Vec::new())
    }

    /// Build a synthesis from arbitrary records
    ///
    /// The first record seen for a category wins; later duplicates are
    /// dropped. Categories without a record are padded as absent.
    pub fn from_records(
        metadata: Metadata,
        records: impl IntoIterator<Item = CategoryRecord>,
    ) -> Self {
        let mut slots: Vec<Option<CategoryRecord>> = vec![None; CATEGORY_COUNT];
        for record in records {
            let slot = &mut slots[record.category as usize];
            if slot.is_none() {
                *slot = Some(record);
            }
        }

        let categories = Category::ALL
            .iter()
            .zip(slots)
            .map(|(category, slot)| slot.unwrap_or_else(|| CategoryRecord::absent(*category)))
            .collect();

        Self {
            metadata,
            categories,
            rejected_categories: Vec::new(),
        }
    }

    /// Record category names that were dropped for not being canonical
    pub fn with_rejected_categories(mut self, names: Vec<String>) -> Self {
        self.rejected_categories = names;
        self
    }

    /// Take the dropped category names, leaving none behind
    pub fn take_rejected_categories(&mut self) -> Vec<String> {
        std::mem::take(&mut self.rejected_categories)
    }

    /// Candidate metadata
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// All 16 records in taxonomy order
    pub fn records(&self) -> &[CategoryRecord] {
        &self.categories
    }

    /// Record for one category
    pub fn record(&self, category: Category) -> &CategoryRecord {
        &self.categories[category as usize]
    }

    /// Whether a category is flagged present
    pub fn is_present(&self, category: Category) -> bool {
        self.record(category).present
    }

    /// Categories flagged present, in taxonomy order
    pub fn present_categories(&self) -> Vec<Category> {
        self.categories
            .iter()
            .filter(|r| r.present)
            .map(|r| r.category)
            .collect()
    }

    /// Install a record only if its category is not already present
    ///
    /// Returns `true` when the record was installed.
    pub fn insert_if_absent(&mut self, record: CategoryRecord) -> bool {
        let slot = &mut self.categories[record.category as usize];
        if slot.present {
            return false;
        }
        *slot = record;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_has_all_categories_absent() {
        let synthesis = Synthesis::skeleton(Metadata::unspecified());
        assert_eq!(synthesis.records().len(), CATEGORY_COUNT);
        assert!(synthesis.records().iter().all(|r| !r.present));
        assert!(synthesis.present_categories().is_empty());
    }

    #[test]
    fn test_from_records_orders_and_pads() {
        let records = vec![
            CategoryRecord::from_finding(CategoryFinding::new(Category::Salud)),
            CategoryRecord::from_finding(CategoryFinding::new(Category::Economia)),
        ];
        let synthesis = Synthesis::from_records(Metadata::default(), records);

        assert_eq!(synthesis.records().len(), CATEGORY_COUNT);
        for (record, expected) in synthesis.records().iter().zip(Category::ALL) {
            assert_eq!(record.category, expected);
        }
        assert_eq!(
            synthesis.present_categories(),
            vec![Category::Economia, Category::Salud]
        );
    }

    #[test]
    fn test_from_records_keeps_first_duplicate() {
        let mut first = CategoryFinding::new(Category::Salud);
        first.quotes.push("primera".to_string());
        let mut second = CategoryFinding::new(Category::Salud);
        second.quotes.push("segunda".to_string());

        let synthesis = Synthesis::from_records(
            Metadata::default(),
            vec![
                CategoryRecord::from_finding(first),
                CategoryRecord::from_finding(second),
            ],
        );
        assert_eq!(synthesis.record(Category::Salud).quotes, vec!["primera"]);
    }

    #[test]
    fn test_insert_if_absent_never_overwrites_present() {
        let mut original = CategoryFinding::new(Category::Salud);
        original.quotes.push("original".to_string());
        let mut synthesis = Synthesis::from_records(
            Metadata::default(),
            vec![CategoryRecord::from_finding(original)],
        );

        let mut replacement = CategoryFinding::new(Category::Salud);
        replacement.quotes.push("nueva".to_string());
        assert!(!synthesis.insert_if_absent(CategoryRecord::from_finding(replacement)));
        assert_eq!(synthesis.record(Category::Salud).quotes, vec!["original"]);

        assert!(synthesis.insert_if_absent(CategoryRecord::from_finding(
            CategoryFinding::new(Category::Vivienda)
        )));
        assert!(synthesis.is_present(Category::Vivienda));
    }

    #[test]
    fn test_metadata_defaults_missing_fields() {
        let metadata: Metadata = serde_json::from_str(r#"{"candidato": "Ana Pérez"}"#).unwrap();
        assert_eq!(metadata.candidate, "Ana Pérez");
        assert_eq!(metadata.party, UNSPECIFIED);
        assert_eq!(metadata.year, UNSPECIFIED);
    }

    #[test]
    fn test_synthesis_serializes_with_original_keys() {
        let synthesis = Synthesis::skeleton(Metadata::unspecified());
        let value = serde_json::to_value(&synthesis).unwrap();

        assert_eq!(value["metadata"]["año"], UNSPECIFIED);
        let categories = value["categorias"].as_array().unwrap();
        assert_eq!(categories.len(), CATEGORY_COUNT);
        assert_eq!(categories[0]["categoria"], "Economía y Desarrollo");
        assert_eq!(categories[0]["presente"], false);
        assert!(categories[0]["analisis_perspectiva"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_rejected_categories_are_taken_once_and_not_serialized() {
        let mut synthesis = Synthesis::skeleton(Metadata::unspecified())
            .with_rejected_categories(vec!["Deportes".to_string()]);

        let value = serde_json::to_value(&synthesis).unwrap();
        assert!(value.get("rejected_categories").is_none());

        assert_eq!(synthesis.take_rejected_categories(), vec!["Deportes"]);
        assert!(synthesis.take_rejected_categories().is_empty());
    }
}
