//! Parse service output into analysis values

use crate::error::AnalyzerError;
use lectora_domain::{
    Category, CategoryFinding, CategoryRecord, Metadata, PartialAnalysis, Perspective, Proposal,
    Synthesis, UNSPECIFIED,
};
use serde_json::{Map, Value};
use tracing::warn;

/// Parse a fragment analysis response
///
/// The payload must be an object with a `categorias_encontradas` array.
/// Entries that cannot be read are skipped; entries naming a category
/// outside the taxonomy are recorded in `rejected_categories`.
pub fn parse_fragment_analysis(
    fragment_index: usize,
    response: &str,
) -> Result<PartialAnalysis, AnalyzerError> {
    let json = decode(response)?;

    let entries = json
        .get("categorias_encontradas")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            AnalyzerError::InvalidFormat("Expected a 'categorias_encontradas' array".to_string())
        })?;

    let mut partial = PartialAnalysis::new(fragment_index, Vec::new());
    for (idx, entry) in entries.iter().enumerate() {
        match parse_finding(entry) {
            Ok(finding) => partial.findings.push(finding),
            Err(AnalyzerError::UnknownCategory(name)) => {
                warn!(
                    "Fragment {}: finding {} dropped, {}",
                    fragment_index,
                    idx,
                    AnalyzerError::UnknownCategory(name.clone())
                );
                partial.rejected_categories.push(name);
            }
            Err(e) => {
                warn!("Fragment {}: failed to parse finding {}: {}", fragment_index, idx, e);
            }
        }
    }

    Ok(partial)
}

/// Parse a metadata response
///
/// Returns `Ok(None)` when the payload is valid JSON but not a single
/// record (nor a list starting with one); callers fall back to defaults
/// without retrying. A payload that is not JSON at all is an error.
pub fn parse_metadata(response: &str) -> Result<Option<Metadata>, AnalyzerError> {
    let json = decode(response)?;

    let record = match &json {
        Value::Object(obj) => Some(obj),
        Value::Array(items) => items.first().and_then(Value::as_object),
        _ => None,
    };

    Ok(record.map(metadata_from_object))
}

/// Parse a synthesis response
///
/// The payload must hold a `categorias` array. A missing or empty
/// `metadata` section is filled with `fallback_metadata`. Records naming a
/// category outside the taxonomy are dropped and their names kept on the
/// result. The result always holds all 16 categories.
pub fn parse_synthesis(
    response: &str,
    fallback_metadata: &Metadata,
) -> Result<Synthesis, AnalyzerError> {
    let json = decode(response)?;

    let entries = json
        .get("categorias")
        .and_then(Value::as_array)
        .ok_or_else(|| AnalyzerError::InvalidFormat("Expected a 'categorias' array".to_string()))?;

    let metadata = json
        .get("metadata")
        .and_then(Value::as_object)
        .filter(|m| !m.is_empty())
        .map(metadata_from_object)
        .unwrap_or_else(|| fallback_metadata.clone());

    let mut records = Vec::with_capacity(entries.len());
    let mut rejected = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        match parse_record(entry) {
            Ok(record) => records.push(record),
            Err(AnalyzerError::UnknownCategory(name)) => {
                warn!("Synthesis: record {} dropped, unknown category: {}", idx, name);
                rejected.push(name);
            }
            Err(e) => warn!("Synthesis: record {} dropped: {}", idx, e),
        }
    }

    Ok(Synthesis::from_records(metadata, records).with_rejected_categories(rejected))
}

/// Decode JSON, tolerating a markdown code fence around it
fn decode(response: &str) -> Result<Value, AnalyzerError> {
    let json_str = extract_json(response)?;
    serde_json::from_str(&json_str).map_err(AnalyzerError::from)
}

/// Extract JSON from response, handling markdown code blocks
pub(crate) fn extract_json(response: &str) -> Result<String, AnalyzerError> {
    let trimmed = response.trim();

    if !trimmed.starts_with("```") {
        return Ok(trimmed.to_string());
    }

    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() < 2 {
        return Err(AnalyzerError::InvalidFormat("Empty code block".to_string()));
    }

    // Skip the opening fence and, when present, the closing one
    let body = &lines[1..];
    let body = match body.last() {
        Some(last) if last.trim() == "```" => &body[..body.len() - 1],
        _ => body,
    };
    Ok(body.join("\n"))
}

fn parse_finding(json: &Value) -> Result<CategoryFinding, AnalyzerError> {
    let obj = as_object(json)?;
    let mut finding = CategoryFinding::new(category_of(obj)?);
    finding.perspective = perspective_of(obj);
    finding.proposals = proposals_of(obj);
    finding.quotes = quotes_of(obj);
    Ok(finding)
}

fn parse_record(json: &Value) -> Result<CategoryRecord, AnalyzerError> {
    let obj = as_object(json)?;
    Ok(CategoryRecord {
        category: category_of(obj)?,
        present: obj.get("presente").and_then(Value::as_bool).unwrap_or(true),
        perspective: perspective_of(obj),
        proposals: proposals_of(obj),
        quotes: quotes_of(obj),
    })
}

fn as_object(json: &Value) -> Result<&Map<String, Value>, AnalyzerError> {
    json.as_object()
        .ok_or_else(|| AnalyzerError::InvalidFormat("Entry is not a JSON object".to_string()))
}

fn category_of(obj: &Map<String, Value>) -> Result<Category, AnalyzerError> {
    let name = obj
        .get("categoria")
        .and_then(Value::as_str)
        .ok_or_else(|| AnalyzerError::InvalidFormat("Missing or invalid 'categoria'".to_string()))?;

    Category::from_name(name).ok_or_else(|| AnalyzerError::UnknownCategory(name.trim().to_string()))
}

fn perspective_of(obj: &Map<String, Value>) -> Perspective {
    let Some(p) = obj.get("analisis_perspectiva").and_then(Value::as_object) else {
        return Perspective::default();
    };
    Perspective {
        role_of_state: text_field(p, "rol_del_estado"),
        stance: text_field(p, "enfoque_ideologico"),
        tone: text_field(p, "tono"),
    }
}

fn proposals_of(obj: &Map<String, Value>) -> Vec<Proposal> {
    let Some(items) = obj.get("propuestas_clave").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(p) => Some(Proposal::new(
                text_field(p, "titulo").unwrap_or_default(),
                text_field(p, "descripcion").unwrap_or_default(),
            )),
            // Some responses list bare titles
            Value::String(title) => Some(Proposal::new(title.clone(), String::new())),
            _ => None,
        })
        .collect()
}

fn quotes_of(obj: &Map<String, Value>) -> Vec<String> {
    obj.get("citas_textuales")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn metadata_from_object(obj: &Map<String, Value>) -> Metadata {
    let field = |key: &str| text_field(obj, key).unwrap_or_else(|| UNSPECIFIED.to_string());
    Metadata {
        candidate: field("candidato"),
        party: field("partido_coalicion"),
        year: field("año"),
    }
}

/// Non-empty string (or number) field
fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
