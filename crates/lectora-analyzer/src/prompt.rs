//! Prompt construction for the four analysis calls
//!
//! Prompts are written in Spanish, the language of the programs being read.
//! The category list is always rendered from the compiled taxonomy, so the
//! names the service is told to use are the names the parser accepts.

use crate::error::AnalyzerError;
use lectora_domain::{truncate_chars, Category, Fragment, PartialAnalysis};

/// Characters of lead text embedded in metadata and synthesis prompts
pub const PROMPT_LEAD_TEXT_CHARS: usize = 5000;

/// Numbered list of the canonical categories
pub fn category_list(categories: &[Category]) -> String {
    categories
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c.name()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// System instruction for fragment analysis
pub fn fragment_system_prompt() -> String {
    let mut prompt = String::new();

    prompt.push_str(FRAGMENT_INSTRUCTIONS);
    prompt.push_str("\n\nCATEGORÍAS (usa exactamente estos nombres):\n");
    prompt.push_str(&category_list(&Category::ALL));
    prompt.push_str("\n\n");
    prompt.push_str(FINDINGS_FORMAT);
    prompt.push_str("\n\n");
    prompt.push_str(FRAGMENT_RULES);

    prompt
}

/// User message carrying one fragment and its position
pub fn fragment_user_prompt(fragment: &Fragment) -> String {
    format!(
        "Fragmento {}/{} del programa:\n\n{}",
        fragment.index, fragment.total, fragment.text
    )
}

/// Prompt asking for candidate metadata from the lead text
pub fn metadata_prompt(lead_text: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(METADATA_INSTRUCTIONS);
    prompt.push_str("\n\nTEXTO:\n---\n");
    prompt.push_str(truncate_chars(lead_text, PROMPT_LEAD_TEXT_CHARS));
    prompt.push_str("\n---\n\n");
    prompt.push_str(METADATA_FORMAT);

    prompt
}

/// Prompt consolidating every partial analysis into one 16-category record
pub fn synthesis_prompt(
    partials: &[PartialAnalysis],
    lead_text: &str,
) -> Result<String, AnalyzerError> {
    let partials_json = serde_json::to_string_pretty(partials)?;
    let mut prompt = String::new();

    prompt.push_str(SYNTHESIS_INSTRUCTIONS);
    prompt.push_str("\n\nLAS 16 CATEGORÍAS:\n");
    prompt.push_str(&category_list(&Category::ALL));
    prompt.push_str("\n\nANÁLISIS PARCIALES:\n");
    prompt.push_str(&partials_json);
    prompt.push_str("\n\nPRIMERAS PÁGINAS DEL PROGRAMA (para la metadata):\n---\n");
    prompt.push_str(truncate_chars(lead_text, PROMPT_LEAD_TEXT_CHARS));
    prompt.push_str("\n---\n\n");
    prompt.push_str(SYNTHESIS_FORMAT);

    Ok(prompt)
}

/// Prompt for a focused pass over categories the first pass missed
pub fn reanalysis_prompt(missing: &[Category], fragment: &Fragment) -> String {
    let mut prompt = String::new();

    prompt.push_str(REANALYSIS_INSTRUCTIONS);
    prompt.push_str("\n\nCATEGORÍAS A BUSCAR:\n");
    prompt.push_str(&category_list(missing));
    prompt.push_str(&format!(
        "\n\nFragmento {}/{} del programa:\n---\n",
        fragment.index, fragment.total
    ));
    prompt.push_str(&fragment.text);
    prompt.push_str("\n---\n\n");
    prompt.push_str(FINDINGS_FORMAT);
    prompt.push_str("\n\nIncluye SOLO las categorías de la lista anterior para las que encuentres información. \
Si no encuentras ninguna, devuelve {\"categorias_encontradas\": []}.");

    prompt
}

const FRAGMENT_INSTRUCTIONS: &str = r#"Eres un analista de políticas públicas que lee programas de gobierno presidenciales.
Analiza el fragmento que se te entrega y extrae, para cada categoría temática que aparezca, toda la información concreta que contenga.

Pautas:
- Las categorías se infieren del contenido; no hace falta que el texto las nombre (por ejemplo, "listas de espera en hospitales" corresponde a Salud).
- Si el texto enumera medidas, extráelas todas, no solo las principales.
- Conserva cifras, porcentajes, plazos y montos.
- Prefiere citas textuales con datos concretos por sobre frases genéricas.
- Describe la perspectiva: rol del Estado (Subsidiario, Gestor activo, Regulador, Garante), enfoque ideológico (Liberal, Socialdemócrata, Conservador, Progresista, Tecnocrático) y tono (Técnico, Urgente, Aspiracional, Populista, Pragmático)."#;

const FINDINGS_FORMAT: &str = r#"FORMATO DE SALIDA (solo JSON válido):
{
  "categorias_encontradas": [
    {
      "categoria": "Nombre exacto de una categoría de la lista",
      "analisis_perspectiva": {
        "rol_del_estado": "...",
        "enfoque_ideologico": "...",
        "tono": "..."
      },
      "propuestas_clave": [
        {"titulo": "Título específico", "descripcion": "Descripción con los datos del texto"}
      ],
      "citas_textuales": ["Cita literal del programa"]
    }
  ]
}"#;

const FRAGMENT_RULES: &str = r#"Reglas:
- Devuelve únicamente el JSON, sin texto antes ni después.
- Si el fragmento no trata ninguna categoría, devuelve {"categorias_encontradas": []}.
- Usa los nombres de categoría tal como aparecen en la lista."#;

const METADATA_INSTRUCTIONS: &str = r#"Lee el comienzo de este programa presidencial e identifica:
1. El nombre completo del candidato o candidata
2. El partido político o la coalición
3. El año de la elección o del programa"#;

const METADATA_FORMAT: &str = r#"Devuelve ÚNICAMENTE un objeto JSON:
{
  "candidato": "Nombre completo",
  "partido_coalicion": "Partido o coalición",
  "año": "Año"
}

Usa "No especificado" para cualquier dato que no encuentres. No inventes información."#;

const SYNTHESIS_INSTRUCTIONS: &str = r#"Eres un analista de políticas públicas. Recibes los análisis parciales de todos los fragmentos de un mismo programa presidencial y debes consolidarlos en un único registro.

Pautas:
- Agrupa por categoría todas las propuestas de los análisis parciales; elimina duplicados exactos y conserva las variantes.
- No pierdas cifras, fechas ni montos al consolidar.
- Obtén la metadata del candidato a partir de las primeras páginas.
- El registro final debe contener las 16 categorías; las que no aparezcan en ningún análisis parcial van con "presente": false.
- No agregues información que no esté en los análisis."#;

const SYNTHESIS_FORMAT: &str = r#"FORMATO DE SALIDA (solo JSON válido):
{
  "metadata": {
    "candidato": "Nombre completo",
    "partido_coalicion": "Partido o coalición",
    "año": "Año"
  },
  "categorias": [
    {
      "categoria": "Nombre exacto de la categoría",
      "presente": true,
      "analisis_perspectiva": {"rol_del_estado": "...", "enfoque_ideologico": "...", "tono": "..."},
      "propuestas_clave": [{"titulo": "...", "descripcion": "..."}],
      "citas_textuales": ["Hasta 5 citas, las más específicas"]
    },
    {
      "categoria": "Categoría sin información",
      "presente": false,
      "analisis_perspectiva": {},
      "propuestas_clave": [],
      "citas_textuales": []
    }
  ]
}

Devuelve únicamente el JSON."#;

const REANALYSIS_INSTRUCTIONS: &str = r#"Eres un analista de políticas públicas. Una primera lectura de este programa presidencial no encontró información sobre algunas categorías.
Vuelve a leer el fragmento buscando específicamente esas categorías, incluidas menciones indirectas. Si algo se relaciona con ellas, inclúyelo."#;
