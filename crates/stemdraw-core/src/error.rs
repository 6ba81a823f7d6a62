use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("invalid input: {0}")]
    InputInvalid(String),

    #[error("extractor unavailable: {0}")]
    ExtractorUnavailable(String),

    #[error("extractor timed out: {0}")]
    ExtractorTimeout(String),

    #[error("LLM failure: {0}")]
    LlmFailure(String),

    #[error("plan produced no entities")]
    PlanEmpty,

    #[error("layout unsatisfiable: {0}")]
    LayoutUnsat(String),

    #[error("render failure: {0}")]
    RenderFailure(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("budget exceeded: {0}")]
    BudgetExceeded(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("graph error: {0}")]
    Graph(String),

    #[error("primitive store error: {0}")]
    PrimitiveStore(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DiagramError {
    /// Stable machine-readable kind used in wire responses and trace records.
    pub fn kind(&self) -> &'static str {
        match self {
            DiagramError::InputInvalid(_) => "INPUT_INVALID",
            DiagramError::ExtractorUnavailable(_) => "EXTRACTOR_UNAVAILABLE",
            DiagramError::ExtractorTimeout(_) => "EXTRACTOR_TIMEOUT",
            DiagramError::LlmFailure(_) => "LLM_FAILURE",
            DiagramError::PlanEmpty => "PLAN_EMPTY",
            DiagramError::LayoutUnsat(_) => "LAYOUT_UNSAT",
            DiagramError::RenderFailure(_) => "RENDER_FAILURE",
            DiagramError::Validation(_) => "VALIDATION_ERROR",
            DiagramError::BudgetExceeded(_) => "BUDGET_EXCEEDED",
            DiagramError::Configuration(_) => "CONFIG_INVALID",
            DiagramError::Graph(_) => "INTERNAL",
            DiagramError::PrimitiveStore(_) => "INTERNAL",
            DiagramError::Serialization(_) => "INTERNAL",
            DiagramError::Io(_) => "INTERNAL",
            DiagramError::Internal(_) => "INTERNAL",
        }
    }
}

pub type Result<T> = std::result::Result<T, DiagramError>;
