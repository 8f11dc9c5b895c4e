use diffsarif_core::Config;
use diffsarif_review::pipeline::AnalysisPipeline;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: AnalysisPipeline,
    /// Upper bound on files per request.
    pub max_files: usize,
}

impl AppState {
    pub fn new(pipeline: AnalysisPipeline, config: &Config) -> Self {
        Self {
            pipeline,
            max_files: config.server.max_files,
        }
    }
}
