use std::sync::Arc;

use diffsarif_core::{Config, Credential, DiffSarifError, DiffUnit};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::llm::{CompletionProvider, LlmClient};
use crate::parser;
use crate::prompt;
use crate::sarif::{self, SarifReport, SarifResult, ToolDriver};

/// Analysis orchestrator that drives the full diff-to-SARIF pipeline.
///
/// For every [`DiffUnit`]: build the prompt, ask the completion service,
/// parse the reply and normalize the findings. Files are analyzed
/// concurrently up to `analysis.max_concurrent`; the report always lists
/// results in input order regardless of which call finishes first.
#[derive(Clone)]
pub struct AnalysisPipeline {
    provider: Arc<dyn CompletionProvider>,
    model: String,
    max_concurrent: usize,
    api_key_env: String,
    driver: ToolDriver,
}

impl AnalysisPipeline {
    /// Create a pipeline around an existing completion provider.
    pub fn new(provider: Arc<dyn CompletionProvider>, config: &Config) -> Self {
        Self {
            provider,
            model: config.llm.model.clone(),
            max_concurrent: config.analysis.max_concurrent.max(1),
            api_key_env: config.llm.api_key_env.clone(),
            driver: ToolDriver::from_config(&config.report),
        }
    }

    /// Create a pipeline backed by an [`LlmClient`] built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DiffSarifError::Config`] if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, DiffSarifError> {
        let client = LlmClient::new(&config.llm)?;
        Ok(Self::new(Arc::new(client), config))
    }

    /// Ask the completion service whether it accepts `credential`.
    ///
    /// # Errors
    ///
    /// Returns [`DiffSarifError::InvalidCredential`] if the key is rejected,
    /// or [`DiffSarifError::Upstream`] if the service cannot be reached.
    pub async fn verify_credential(&self, credential: &Credential) -> Result<(), DiffSarifError> {
        self.provider.verify_credential(credential).await
    }

    /// Analyze `files` and return one aggregated SARIF report.
    ///
    /// Inputs are checked before any completion call is made. The first
    /// failing completion call aborts the remaining ones; no partial report
    /// is returned.
    ///
    /// # Errors
    ///
    /// - [`DiffSarifError::Validation`] for a blank credential or a file
    ///   without a name.
    /// - [`DiffSarifError::InvalidCredential`] / [`DiffSarifError::Upstream`]
    ///   from the completion service.
    pub async fn analyze(
        &self,
        credential: &Credential,
        files: &[DiffUnit],
    ) -> Result<SarifReport, DiffSarifError> {
        if credential.is_blank() {
            return Err(DiffSarifError::Validation("a credential is required".into()));
        }
        if files.iter().any(|unit| unit.filename.trim().is_empty()) {
            return Err(DiffSarifError::Validation(
                "every file needs a non-empty name".into(),
            ));
        }

        info!(
            files = files.len(),
            model = %self.model,
            max_concurrent = self.max_concurrent,
            "starting diff analysis"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut join_set = JoinSet::new();

        for (index, unit) in files.iter().cloned().enumerate() {
            let provider = Arc::clone(&self.provider);
            let sem = Arc::clone(&semaphore);
            let model = self.model.clone();
            let credential = credential.clone();

            join_set.spawn(async move {
                let _permit = match sem.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return (
                            index,
                            Err(DiffSarifError::Upstream(format!(
                                "analysis scheduler closed: {e}"
                            ))),
                        )
                    }
                };
                let outcome = analyze_unit(provider.as_ref(), &model, &credential, &unit).await;
                (index, outcome)
            });
        }

        let mut per_file: Vec<Option<Vec<SarifResult>>> = vec![None; files.len()];
        while let Some(joined) = join_set.join_next().await {
            let (index, outcome) = joined
                .map_err(|e| DiffSarifError::Upstream(format!("analysis task failed: {e}")))?;
            match outcome {
                Ok(results) => per_file[index] = Some(results),
                Err(e) => {
                    warn!(file = %files[index].filename, error = %e, "analysis aborted");
                    join_set.abort_all();
                    return Err(e);
                }
            }
        }

        let report = sarif::aggregate(
            self.driver.clone(),
            per_file.into_iter().map(Option::unwrap_or_default),
        );
        info!(
            files = files.len(),
            findings = report.results().len(),
            "diff analysis finished"
        );
        Ok(report)
    }

    /// Same as [`analyze`](Self::analyze), with the credential read from the
    /// configured environment variable (`OPENAI_API_KEY` by default).
    ///
    /// # Errors
    ///
    /// Returns [`DiffSarifError::Validation`] if the variable is unset, plus
    /// everything [`analyze`](Self::analyze) can return.
    pub async fn analyze_with_env(&self, files: &[DiffUnit]) -> Result<SarifReport, DiffSarifError> {
        let credential = Credential::from_env(&self.api_key_env)?;
        self.analyze(&credential, files).await
    }
}

async fn analyze_unit(
    provider: &dyn CompletionProvider,
    model: &str,
    credential: &Credential,
    unit: &DiffUnit,
) -> Result<Vec<SarifResult>, DiffSarifError> {
    let prompt = prompt::build_prompt(&unit.filename, &unit.diff_text)?;
    let raw = provider.complete(model, &prompt, credential).await?;
    let records = parser::parse_response(&unit.filename, &raw);
    debug!(file = %unit.filename, findings = records.len(), "parsed model reply");
    Ok(records.iter().map(sarif::normalize).collect())
}
