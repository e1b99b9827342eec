//! One end-to-end analysis run.

use crate::config::AppConfig;
use crate::error::Result;
use crate::output::{write_report, RunSummary};
use lectora_analyzer::{discover_documents, AnalysisOrchestrator, FileSource, ProgramAnalyzer};
use lectora_domain::{Pricing, TokenUsage};
use lectora_llm::{Backend, LlmProvider, MockProvider};
use tracing::info;

/// Reply used by the scripted backend: no findings
const DRY_RUN_REPLY: &str = r#"{"categorias_encontradas": []}"#;

/// Analyze every program in the configured directory and write the report.
///
/// In a dry run, documents are discovered, extracted and segmented as
/// usual but the backend is scripted, so no credentials are needed and no
/// tokens are spent.
pub async fn analyze(config: &mut AppConfig) -> Result<RunSummary> {
    let (backend, pricing) = if config.dry_run {
        info!("Dry run: using the scripted backend");
        let provider = MockProvider::new(DRY_RUN_REPLY).with_usage(TokenUsage::default());
        (Backend::Mock(provider), Pricing::default())
    } else {
        let key = config.resolve_credentials()?;
        let backend = Backend::connect(config.backend, key, config.model.clone())?;
        (backend, config.pricing())
    };
    info!("Backend: {} ({})", backend.name(), backend.model());

    let paths = discover_documents(&config.programs_dir)?;
    let summary_backend = backend.name().to_string();
    let summary_model = backend.model().to_string();

    let service = ProgramAnalyzer::new(backend, &config.pipeline);
    let orchestrator = AnalysisOrchestrator::new(service, FileSource::new(), &config.pipeline);

    let mut usage = TokenUsage::default();
    let report = orchestrator.run(&paths, &mut usage).await;
    write_report(&report, &config.output_file)?;

    Ok(RunSummary {
        backend: summary_backend,
        model: summary_model,
        discovered: paths.len(),
        processed: report.total_candidatos,
        output: config.output_file.clone(),
        usage,
        pricing,
    })
}
