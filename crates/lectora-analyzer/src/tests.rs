//! End-to-end tests for the analysis pipeline

#[cfg(test)]
mod tests {
    use crate::{
        AnalysisOrchestrator, DocumentSource, FailureKind, PipelineConfig, ProgramAnalyzer,
        SourceError, TextAnalysisService,
    };
    use async_trait::async_trait;
    use lectora_domain::{Category, Document, Fragment, Metadata, TokenUsage, CATEGORY_COUNT};
    use lectora_llm::{MockProvider, MockReply};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    const FRAGMENT_REPLY: &str = r#"{
        "categorias_encontradas": [
            {
                "categoria": "Salud",
                "analisis_perspectiva": {"rol_del_estado": "Garante"},
                "propuestas_clave": [{"titulo": "Más hospitales", "descripcion": "20 hospitales al 2030"}],
                "citas_textuales": ["Construiremos 20 hospitales"]
            },
            {
                "categoria": "Educación",
                "propuestas_clave": [{"titulo": "Sala cuna universal", "descripcion": ""}],
                "citas_textuales": ["Sala cuna para todas las familias"]
            }
        ]
    }"#;

    const METADATA_REPLY: &str =
        r#"{"candidato": "Ana Pérez", "partido_coalicion": "Coalición Futuro", "año": "2025"}"#;

    /// In-memory documents keyed by file name; unknown names fail extraction
    struct MemorySource {
        documents: HashMap<String, String>,
    }

    impl MemorySource {
        fn new(documents: &[(&str, String)]) -> Self {
            Self {
                documents: documents
                    .iter()
                    .map(|(name, text)| (name.to_string(), text.clone()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl DocumentSource for MemorySource {
        async fn load(&self, path: &Path) -> Result<Document, SourceError> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            match self.documents.get(&name) {
                Some(text) => Ok(Document::new(name, text.clone())),
                None => Err(SourceError::Extraction {
                    path: path.to_path_buf(),
                    reason: "corrupt file".to_string(),
                }),
            }
        }
    }

    fn program_text(chars: usize) -> String {
        let sentence = "El programa propone mejoras concretas para el país. ";
        sentence.repeat(chars / sentence.len() + 1).chars().take(chars).collect()
    }

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            max_fragment_chars: 6000,
            overlap_chars: 600,
            ..PipelineConfig::default().without_delays()
        }
    }

    /// Provider whose synthesis always fails
    fn provider_without_synthesis() -> MockProvider {
        let provider = MockProvider::new(FRAGMENT_REPLY);
        provider.add_error("ANÁLISIS PARCIALES");
        provider.add_response("TEXTO:", METADATA_REPLY);
        provider
    }

    #[tokio::test]
    async fn test_failed_synthesis_still_yields_complete_record() {
        let config = small_config();
        let provider = provider_without_synthesis();
        let service = ProgramAnalyzer::new(provider.clone(), &config);
        let orchestrator = AnalysisOrchestrator::new(service, MemorySource::new(&[]), &config);

        let document = Document::new("programa.txt", program_text(20_000));
        let mut usage = TokenUsage::default();
        let outcome = orchestrator.analyze_document(&document, &mut usage).await;

        assert!(outcome.fragments >= 4);
        assert_eq!(outcome.analyzed, outcome.fragments);
        assert_eq!(outcome.with_findings, outcome.fragments);

        let synthesis = &outcome.synthesis;
        assert_eq!(synthesis.records().len(), CATEGORY_COUNT);
        assert_eq!(
            synthesis.present_categories(),
            vec![Category::Salud, Category::Educacion]
        );
        assert_eq!(
            synthesis.records().iter().filter(|r| !r.present).count(),
            CATEGORY_COUNT - 2
        );

        // Merged locally: one perspective, every proposal, deduplicated quotes
        let salud = synthesis.record(Category::Salud);
        assert_eq!(salud.perspective.role_of_state.as_deref(), Some("Garante"));
        assert_eq!(salud.proposals.len(), outcome.fragments);
        assert_eq!(salud.quotes, vec!["Construiremos 20 hospitales"]);

        assert_eq!(synthesis.metadata().candidate, "Ana Pérez");
        assert_eq!(synthesis.metadata().party, "Coalición Futuro");

        // 14 missing is above the reanalysis threshold
        let validation = outcome.validation.unwrap();
        assert_eq!(validation.missing.len(), 14);
        assert!(outcome.reanalysis_added.is_empty());

        // Fragments, metadata, then two failed synthesis attempts
        assert_eq!(provider.call_count(), outcome.fragments + 1 + 2);
        // Only successful calls are metered
        let successful = (outcome.fragments + 1) as u64;
        assert_eq!(usage, TokenUsage::new(100 * successful, 50 * successful));
    }

    #[tokio::test]
    async fn test_reanalysis_fills_missing_categories_only() {
        let present = [
            "Economía y Desarrollo",
            "Seguridad Social",
            "Salud",
            "Educación",
            "Vivienda y Urbanismo",
            "Seguridad y Orden Público",
            "Justicia, Derechos y Libertades",
            "Medio Ambiente y Energía",
            "Agricultura y Desarrollo Rural",
            "Transporte e Infraestructura",
        ];
        let findings: Vec<String> = present
            .iter()
            .map(|name| format!(r#"{{"categoria": "{}", "citas_textuales": ["original"]}}"#, name))
            .collect();
        let first_pass = format!(r#"{{"categorias_encontradas": [{}]}}"#, findings.join(","));

        let config = small_config();
        let provider = MockProvider::new(first_pass);
        provider.add_error("ANÁLISIS PARCIALES");
        provider.add_response(
            "CATEGORÍAS A BUSCAR",
            r#"{"categorias_encontradas": [
                {"categoria": "Política Exterior", "citas_textuales": ["Integración regional"]},
                {"categoria": "Salud", "citas_textuales": ["reemplazo"]}
            ]}"#,
        );
        let service = ProgramAnalyzer::new(provider.clone(), &config);
        let orchestrator = AnalysisOrchestrator::new(service, MemorySource::new(&[]), &config);

        let document = Document::new("programa.txt", program_text(8_000));
        let mut usage = TokenUsage::default();
        let outcome = orchestrator.analyze_document(&document, &mut usage).await;

        assert_eq!(outcome.reanalysis_added, vec![Category::PoliticaExterior]);
        assert!(outcome.synthesis.is_present(Category::PoliticaExterior));
        assert_eq!(outcome.synthesis.record(Category::Salud).quotes, vec!["original"]);
        assert_eq!(outcome.synthesis.records().len(), CATEGORY_COUNT);

        let validation = outcome.validation.unwrap();
        assert_eq!(validation.found.len(), 11);
        assert_eq!(validation.missing.len(), 5);

        let reanalysis_calls = provider
            .prompts()
            .iter()
            .filter(|p| p.contains("CATEGORÍAS A BUSCAR"))
            .count();
        // A single pass, one call per fragment
        assert_eq!(reanalysis_calls, outcome.fragments);
    }

    #[tokio::test]
    async fn test_reanalysis_disabled() {
        let mut config = small_config();
        config.reanalyze_missing = false;

        let provider = MockProvider::new(
            r#"{"categorias_encontradas": [{"categoria": "Salud"}, {"categoria": "Educación"},
                {"categoria": "Economía y Desarrollo"}, {"categoria": "Seguridad Social"},
                {"categoria": "Vivienda y Urbanismo"}, {"categoria": "Cultura, Ciencia y Sociedad"},
                {"categoria": "Política Exterior"}, {"categoria": "Transporte e Infraestructura"},
                {"categoria": "Medio Ambiente y Energía"}, {"categoria": "Políticas Sociales y Comunidad"}]}"#,
        );
        provider.add_error("ANÁLISIS PARCIALES");
        let service = ProgramAnalyzer::new(provider.clone(), &config);
        let orchestrator = AnalysisOrchestrator::new(service, MemorySource::new(&[]), &config);

        let document = Document::new("programa.txt", program_text(3_000));
        let mut usage = TokenUsage::default();
        let outcome = orchestrator.analyze_document(&document, &mut usage).await;

        assert_eq!(outcome.validation.unwrap().missing.len(), 6);
        assert!(outcome.reanalysis_added.is_empty());
        assert!(!provider.prompts().iter().any(|p| p.contains("CATEGORÍAS A BUSCAR")));
    }

    #[tokio::test]
    async fn test_validation_disabled() {
        let mut config = small_config();
        config.enable_validation = false;

        let service = ProgramAnalyzer::new(provider_without_synthesis(), &config);
        let orchestrator = AnalysisOrchestrator::new(service, MemorySource::new(&[]), &config);

        let document = Document::new("programa.txt", program_text(3_000));
        let mut usage = TokenUsage::default();
        let outcome = orchestrator.analyze_document(&document, &mut usage).await;

        assert!(outcome.validation.is_none());
        assert_eq!(outcome.synthesis.records().len(), CATEGORY_COUNT);
    }

    #[tokio::test]
    async fn test_failed_fragment_is_dropped() {
        let config = small_config();
        let provider = provider_without_synthesis();
        // The first fragment exhausts its two attempts
        provider.enqueue(MockReply::Fail("boom".to_string()));
        provider.enqueue(MockReply::Fail("boom".to_string()));
        let service = ProgramAnalyzer::new(provider, &config);
        let orchestrator = AnalysisOrchestrator::new(service, MemorySource::new(&[]), &config);

        let document = Document::new("programa.txt", program_text(12_000));
        let mut usage = TokenUsage::default();
        let outcome = orchestrator.analyze_document(&document, &mut usage).await;

        assert!(outcome.fragments >= 2);
        assert_eq!(outcome.analyzed, outcome.fragments - 1);
        assert!(outcome.synthesis.is_present(Category::Salud));
    }

    #[tokio::test]
    async fn test_no_findings_yields_all_absent_record() {
        let config = small_config();
        let provider = MockProvider::new(r#"{"categorias_encontradas": []}"#);
        provider.add_response("TEXTO:", METADATA_REPLY);
        let service = ProgramAnalyzer::new(provider.clone(), &config);
        let orchestrator = AnalysisOrchestrator::new(service, MemorySource::new(&[]), &config);

        let document = Document::new("programa.txt", program_text(3_000));
        let mut usage = TokenUsage::default();
        let outcome = orchestrator.analyze_document(&document, &mut usage).await;

        assert_eq!(outcome.with_findings, 0);
        assert!(outcome.synthesis.present_categories().is_empty());
        assert_eq!(outcome.synthesis.records().len(), CATEGORY_COUNT);
        // No synthesis call without findings
        assert!(!provider.prompts().iter().any(|p| p.contains("ANÁLISIS PARCIALES")));
    }

    #[tokio::test]
    async fn test_unknown_categories_are_reported() {
        let config = small_config();
        let provider = MockProvider::new(
            r#"{"categorias_encontradas": [{"categoria": "Deportes"}, {"categoria": "Salud"}]}"#,
        );
        provider.add_error("ANÁLISIS PARCIALES");
        let service = ProgramAnalyzer::new(provider, &config);
        let orchestrator = AnalysisOrchestrator::new(service, MemorySource::new(&[]), &config);

        let document = Document::new("programa.txt", program_text(3_000));
        let mut usage = TokenUsage::default();
        let outcome = orchestrator.analyze_document(&document, &mut usage).await;

        assert_eq!(outcome.rejected_categories, vec!["Deportes"]);
        assert_eq!(outcome.synthesis.present_categories(), vec![Category::Salud]);
    }

    #[tokio::test]
    async fn test_unknown_categories_from_synthesis_and_reanalysis_are_reported() {
        let present = [
            "Economía y Desarrollo",
            "Seguridad Social",
            "Salud",
            "Educación",
            "Vivienda y Urbanismo",
            "Seguridad y Orden Público",
            "Justicia, Derechos y Libertades",
            "Medio Ambiente y Energía",
            "Agricultura y Desarrollo Rural",
            "Transporte e Infraestructura",
        ];
        let mut records: Vec<String> = present
            .iter()
            .map(|name| format!(r#"{{"categoria": "{}", "presente": true}}"#, name))
            .collect();
        records.push(r#"{"categoria": "Deportes", "presente": true}"#.to_string());
        let synthesis_reply = format!(r#"{{"categorias": [{}]}}"#, records.join(","));

        let config = small_config();
        let provider = MockProvider::new(r#"{"categorias_encontradas": [{"categoria": "Salud"}]}"#);
        provider.add_response("ANÁLISIS PARCIALES", synthesis_reply);
        provider.add_response(
            "CATEGORÍAS A BUSCAR",
            r#"{"categorias_encontradas": [{"categoria": "Turismo"}]}"#,
        );
        let service = ProgramAnalyzer::new(provider, &config);
        let orchestrator = AnalysisOrchestrator::new(service, MemorySource::new(&[]), &config);

        let document = Document::new("programa.txt", program_text(3_000));
        let mut usage = TokenUsage::default();
        let outcome = orchestrator.analyze_document(&document, &mut usage).await;

        assert_eq!(outcome.fragments, 1);
        assert_eq!(outcome.rejected_categories, vec!["Deportes", "Turismo"]);
        assert!(outcome.reanalysis_added.is_empty());
        assert_eq!(outcome.synthesis.present_categories().len(), 10);
    }

    #[tokio::test]
    async fn test_run_skips_unreadable_documents() {
        let config = small_config();
        let source = MemorySource::new(&[
            ("a.txt", program_text(3_000)),
            ("c.txt", program_text(3_000)),
        ]);
        let service = ProgramAnalyzer::new(provider_without_synthesis(), &config);
        let orchestrator = AnalysisOrchestrator::new(service, source, &config);

        let paths = vec![
            PathBuf::from("programas/a.txt"),
            PathBuf::from("programas/b.pdf"),
            PathBuf::from("programas/c.txt"),
        ];
        let mut usage = TokenUsage::default();
        let report = orchestrator.run(&paths, &mut usage).await;

        assert_eq!(report.total_candidatos, 2);
        let names: Vec<_> = report.candidatos.iter().map(|r| r.pdf_filename.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "c.txt"]);
        for record in &report.candidatos {
            assert_eq!(record.synthesis.records().len(), CATEGORY_COUNT);
            assert_eq!(record.synthesis.metadata().candidate, "Ana Pérez");
        }
        assert!(usage.total() > 0);
    }

    #[tokio::test]
    async fn test_rate_limited_metadata_falls_back_to_defaults() {
        let config = small_config();
        let provider = MockProvider::default();
        provider.add_rate_limit("TEXTO:");
        let service = ProgramAnalyzer::new(provider.clone(), &config);

        let mut usage = TokenUsage::default();
        let metadata = service.extract_metadata("Programa de gobierno", &mut usage).await;

        assert_eq!(metadata, Metadata::unspecified());
        assert_eq!(provider.call_count(), config.max_retries as usize);
        assert_eq!(usage, TokenUsage::default());
    }

    #[tokio::test]
    async fn test_queued_throttling_then_success() {
        let config = small_config();
        let provider = provider_without_synthesis();
        let service = ProgramAnalyzer::new(provider.clone(), &config);

        let mut usage = TokenUsage::default();
        for _ in 0..config.max_retries - 1 {
            provider.enqueue(MockReply::RateLimited);
        }
        let metadata = service.extract_metadata("Programa de gobierno", &mut usage).await;

        assert_eq!(metadata.candidate, "Ana Pérez");
        assert_eq!(provider.call_count(), config.max_retries as usize);
        assert_eq!(usage, TokenUsage::new(100, 50));
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion_kind() {
        let config = small_config();
        let provider = MockProvider::default();
        for _ in 0..config.max_retries {
            provider.enqueue(MockReply::RateLimited);
        }
        let service = ProgramAnalyzer::new(provider, &config);

        let fragment = Fragment {
            index: 1,
            total: 1,
            start: 0,
            end: 5,
            text: "texto".to_string(),
        };
        let mut usage = TokenUsage::default();
        let failure = service.analyze_fragment(&fragment, &mut usage).await.unwrap_err();

        assert_eq!(failure.kind, FailureKind::RateLimited);
        assert_eq!(failure.attempts, config.max_retries);
    }
}
