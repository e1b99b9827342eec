//! Category module - the fixed taxonomy every program is analyzed against

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Number of canonical categories
pub const CATEGORY_COUNT: usize = 16;

/// One of the 16 canonical topic categories
///
/// The display name is the exact string the analysis service must return.
/// Names are matched verbatim (after trimming surrounding whitespace), so
/// accents and punctuation matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Economía y Desarrollo
    Economia,
    /// Seguridad Social
    SeguridadSocial,
    /// Salud
    Salud,
    /// Educación
    Educacion,
    /// Vivienda y Urbanismo
    Vivienda,
    /// Seguridad y Orden Público
    SeguridadOrdenPublico,
    /// Justicia, Derechos y Libertades
    Justicia,
    /// Medio Ambiente y Energía
    MedioAmbiente,
    /// Agricultura y Desarrollo Rural
    Agricultura,
    /// Transporte e Infraestructura
    Transporte,
    /// Políticas Sociales y Comunidad
    PoliticasSociales,
    /// Gobernanza, Instituciones y Estado
    Gobernanza,
    /// Política Exterior
    PoliticaExterior,
    /// Innovación, Tecnología y Digitalización
    Innovacion,
    /// Cultura, Ciencia y Sociedad
    Cultura,
    /// Perfil y Estilo Político del Candidato
    PerfilCandidato,
}

impl Category {
    /// All canonical categories in taxonomy order
    pub const ALL: [Category; CATEGORY_COUNT] = [
        Category::Economia,
        Category::SeguridadSocial,
        Category::Salud,
        Category::Educacion,
        Category::Vivienda,
        Category::SeguridadOrdenPublico,
        Category::Justicia,
        Category::MedioAmbiente,
        Category::Agricultura,
        Category::Transporte,
        Category::PoliticasSociales,
        Category::Gobernanza,
        Category::PoliticaExterior,
        Category::Innovacion,
        Category::Cultura,
        Category::PerfilCandidato,
    ];

    /// Canonical name as it appears in prompts and output
    pub fn name(&self) -> &'static str {
        match self {
            Category::Economia => "Economía y Desarrollo",
            Category::SeguridadSocial => "Seguridad Social",
            Category::Salud => "Salud",
            Category::Educacion => "Educación",
            Category::Vivienda => "Vivienda y Urbanismo",
            Category::SeguridadOrdenPublico => "Seguridad y Orden Público",
            Category::Justicia => "Justicia, Derechos y Libertades",
            Category::MedioAmbiente => "Medio Ambiente y Energía",
            Category::Agricultura => "Agricultura y Desarrollo Rural",
            Category::Transporte => "Transporte e Infraestructura",
            Category::PoliticasSociales => "Políticas Sociales y Comunidad",
            Category::Gobernanza => "Gobernanza, Instituciones y Estado",
            Category::PoliticaExterior => "Política Exterior",
            Category::Innovacion => "Innovación, Tecnología y Digitalización",
            Category::Cultura => "Cultura, Ciencia y Sociedad",
            Category::PerfilCandidato => "Perfil y Estilo Político del Candidato",
        }
    }

    /// Look up a category by its canonical name
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
