//! The text-analysis service boundary
//!
//! [`TextAnalysisService`] is the single interface the orchestrator and
//! reconciler talk to. [`ProgramAnalyzer`] implements it on top of any
//! [`LlmProvider`], so every backend shares the same prompts, parsing and
//! retry discipline.

use crate::config::PipelineConfig;
use crate::error::AnalyzerError;
use crate::parser;
use crate::prompt;
use crate::retry::{CallError, FailureKind, Metered, RetryFailure, RetryPolicy};
use async_trait::async_trait;
use lectora_domain::{Category, Fragment, Metadata, PartialAnalysis, Synthesis, TokenUsage};
use lectora_llm::{GenerationRequest, LlmProvider};
use tracing::{debug, info, warn};

/// Capabilities the pipeline needs from a text-understanding service
///
/// Every call takes the caller's [`TokenUsage`] accumulator; successful
/// calls add what they consumed.
#[async_trait]
pub trait TextAnalysisService: Send + Sync {
    /// Analyze one fragment
    async fn analyze_fragment(
        &self,
        fragment: &Fragment,
        usage: &mut TokenUsage,
    ) -> Result<PartialAnalysis, RetryFailure>;

    /// Extract candidate metadata from the lead text
    ///
    /// Never fails: unknown fields are "No especificado".
    async fn extract_metadata(&self, lead_text: &str, usage: &mut TokenUsage) -> Metadata;

    /// Consolidate partial analyses into a 16-category synthesis
    async fn synthesize(
        &self,
        partials: &[PartialAnalysis],
        lead_text: &str,
        metadata: &Metadata,
        usage: &mut TokenUsage,
    ) -> Result<Synthesis, RetryFailure>;

    /// Look for specific missing categories in one fragment
    async fn reanalyze_fragment(
        &self,
        fragment: &Fragment,
        missing: &[Category],
        usage: &mut TokenUsage,
    ) -> Result<PartialAnalysis, RetryFailure>;
}

/// [`TextAnalysisService`] backed by an LLM provider
pub struct ProgramAnalyzer<P: LlmProvider> {
    provider: P,
    policy: RetryPolicy,
    fragment_system: String,
    max_output_tokens_fragment: u32,
    max_output_tokens_synthesis: u32,
}

impl<P: LlmProvider> ProgramAnalyzer<P> {
    /// Create an analyzer using the limits and retry settings of `config`
    pub fn new(provider: P, config: &PipelineConfig) -> Self {
        Self {
            provider,
            policy: RetryPolicy::from_config(config),
            fragment_system: prompt::fragment_system_prompt(),
            max_output_tokens_fragment: config.max_output_tokens_fragment,
            max_output_tokens_synthesis: config.max_output_tokens_synthesis,
        }
    }

    /// Replace the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The underlying provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// One attempt: generate, then decode
    ///
    /// Decoding failures are reported as malformed responses so the retry
    /// policy can tell them apart from service errors.
    async fn attempt<T, F>(
        &self,
        request: &GenerationRequest,
        decode: F,
    ) -> Result<Metered<T>, CallError>
    where
        F: Fn(&str) -> Result<T, AnalyzerError>,
    {
        let completion = self.provider.generate(request).await?;
        debug!(
            "{} returned {} chars ({} in / {} out tokens)",
            self.provider.name(),
            completion.text.len(),
            completion.usage.input_tokens,
            completion.usage.output_tokens
        );

        match decode(&completion.text) {
            Ok(value) => Ok(Metered::new(value, completion.usage)),
            Err(e) => Err(CallError::Malformed {
                raw: completion.text,
                reason: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl<P: LlmProvider> TextAnalysisService for ProgramAnalyzer<P> {
    async fn analyze_fragment(
        &self,
        fragment: &Fragment,
        usage: &mut TokenUsage,
    ) -> Result<PartialAnalysis, RetryFailure> {
        let label = format!("fragment {}/{}", fragment.index, fragment.total);
        let request = GenerationRequest::new(prompt::fragment_user_prompt(fragment))
            .with_system(self.fragment_system.clone())
            .with_max_output_tokens(self.max_output_tokens_fragment);
        let index = fragment.index;

        let partial = self
            .policy
            .call(&label, usage, |_| {
                self.attempt(&request, move |text: &str| parser::parse_fragment_analysis(index, text))
            })
            .await?;

        info!("{}: {} categories found", label, partial.findings.len());
        Ok(partial)
    }

    async fn extract_metadata(&self, lead_text: &str, usage: &mut TokenUsage) -> Metadata {
        let request = GenerationRequest::new(prompt::metadata_prompt(lead_text))
            .with_max_output_tokens(self.max_output_tokens_fragment);

        let outcome = self
            .policy
            .call("metadata", usage, |_| self.attempt(&request, parser::parse_metadata))
            .await;

        match outcome {
            Ok(Some(metadata)) => {
                info!("Metadata extracted: {} ({})", metadata.candidate, metadata.party);
                metadata
            }
            Ok(None) => {
                warn!("Metadata response is not a single record, using defaults");
                Metadata::unspecified()
            }
            Err(failure) => {
                warn!("Metadata extraction failed ({}), using defaults", failure);
                Metadata::unspecified()
            }
        }
    }

    async fn synthesize(
        &self,
        partials: &[PartialAnalysis],
        lead_text: &str,
        metadata: &Metadata,
        usage: &mut TokenUsage,
    ) -> Result<Synthesis, RetryFailure> {
        let prompt = prompt::synthesis_prompt(partials, lead_text).map_err(|e| RetryFailure {
            kind: FailureKind::Service,
            attempts: 0,
            detail: e.to_string(),
        })?;
        let request =
            GenerationRequest::new(prompt).with_max_output_tokens(self.max_output_tokens_synthesis);

        info!("Synthesizing {} partial analyses", partials.len());
        let synthesis = self
            .policy
            .call("synthesis", usage, |_| {
                self.attempt(&request, move |text: &str| parser::parse_synthesis(text, metadata))
            })
            .await?;

        info!(
            "Synthesis complete: {} categories present",
            synthesis.present_categories().len()
        );
        Ok(synthesis)
    }

    async fn reanalyze_fragment(
        &self,
        fragment: &Fragment,
        missing: &[Category],
        usage: &mut TokenUsage,
    ) -> Result<PartialAnalysis, RetryFailure> {
        let label = format!("reanalysis {}/{}", fragment.index, fragment.total);
        let request = GenerationRequest::new(prompt::reanalysis_prompt(missing, fragment))
            .with_max_output_tokens(self.max_output_tokens_fragment);
        let index = fragment.index;

        self.policy
            .call(&label, usage, |_| {
                self.attempt(&request, move |text: &str| parser::parse_fragment_analysis(index, text))
            })
            .await
    }
}
