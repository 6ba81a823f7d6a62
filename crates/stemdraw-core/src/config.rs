use crate::error::{DiagramError, Result};
use crate::types::ToolId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    Strict,
    Warn,
    Off,
}

impl Default for ValidationMode {
    fn default() -> Self {
        ValidationMode::Warn
    }
}

/// Per-phase budgets in milliseconds. Every phase also runs under the
/// global `request_timeout_ms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhaseTimeouts {
    pub extractor_ms: u64,
    pub llm_ms: u64,
    pub layout_smt_ms: u64,
    pub render_ms: u64,
}

impl Default for PhaseTimeouts {
    fn default() -> Self {
        Self {
            extractor_ms: 2_000,
            llm_ms: 15_000,
            layout_smt_ms: 5_000,
            render_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmBackendConfig {
    /// "ollama", "openai", "anthropic" or "mock".
    pub backend: String,
    pub model: Option<String>,
    /// Name of the environment variable holding the API key. The key itself
    /// never appears in config files.
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub max_retries: u32,
}

impl Default for LlmBackendConfig {
    fn default() -> Self {
        Self {
            backend: "mock".to_string(),
            model: None,
            api_key_env: None,
            base_url: None,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrimitiveLibraryConfig {
    /// "memory" or "file".
    pub backend: String,
    pub path: Option<PathBuf>,
}

impl Default for PrimitiveLibraryConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            path: None,
        }
    }
}

fn default_canvas_width() -> f64 {
    1200.0
}

fn default_canvas_height() -> f64 {
    800.0
}

fn default_nlp_tools() -> BTreeSet<ToolId> {
    ToolId::ALL.iter().copied().collect()
}

fn default_refinement_max_iterations() -> u32 {
    3
}

fn default_refinement_target_score() -> f64 {
    90.0
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_max_input_chars() -> usize {
    8_000
}

/// The validated pipeline configuration. Unknown keys are rejected at
/// parse time; every missing key has an explicit default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub validation_mode: ValidationMode,
    pub nlp_tools: BTreeSet<ToolId>,

    pub enable_llm_planning: bool,
    pub enable_llm_audit: bool,
    pub enable_llm_enrichment: bool,
    pub enable_visual_validation: bool,
    pub enable_primitive_library: bool,
    pub enable_ontology_validation: bool,
    pub enable_layout_smt: bool,
    pub enable_layout_symbolic: bool,
    pub enable_refinement: bool,

    pub refinement_max_iterations: u32,
    pub refinement_target_score: f64,
    pub request_timeout_ms: u64,
    pub phase_timeouts: PhaseTimeouts,

    pub llm: LlmBackendConfig,
    pub primitive_library: PrimitiveLibraryConfig,

    pub log_dir: Option<PathBuf>,
    pub max_input_chars: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            validation_mode: ValidationMode::default(),
            nlp_tools: default_nlp_tools(),
            enable_llm_planning: false,
            enable_llm_audit: false,
            enable_llm_enrichment: false,
            enable_visual_validation: false,
            enable_primitive_library: false,
            enable_ontology_validation: false,
            enable_layout_smt: false,
            enable_layout_symbolic: false,
            enable_refinement: false,
            refinement_max_iterations: default_refinement_max_iterations(),
            refinement_target_score: default_refinement_target_score(),
            request_timeout_ms: default_request_timeout_ms(),
            phase_timeouts: PhaseTimeouts::default(),
            llm: LlmBackendConfig::default(),
            primitive_library: PrimitiveLibraryConfig::default(),
            log_dir: None,
            max_input_chars: default_max_input_chars(),
        }
    }
}

impl GeneratorConfig {
    pub fn load_toml(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: GeneratorConfig = toml::from_str(&raw)
            .map_err(|e| DiagramError::Configuration(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.canvas_width < 400.0 || self.canvas_height < 300.0 {
            return Err(DiagramError::Configuration(format!(
                "canvas must be at least 400x300, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }
        if self.max_input_chars == 0 {
            return Err(DiagramError::Configuration(
                "max_input_chars must be positive".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.refinement_target_score) {
            return Err(DiagramError::Configuration(format!(
                "refinement_target_score must be in [0, 100], got {}",
                self.refinement_target_score
            )));
        }
        match self.llm.backend.as_str() {
            "ollama" | "openai" | "anthropic" | "mock" => {}
            other => {
                return Err(DiagramError::Configuration(format!(
                    "unknown llm backend '{}'; expected ollama, openai, anthropic or mock",
                    other
                )))
            }
        }
        match self.primitive_library.backend.as_str() {
            "memory" => {}
            "file" => {
                if self.primitive_library.path.is_none() {
                    return Err(DiagramError::Configuration(
                        "primitive_library.backend = \"file\" requires primitive_library.path"
                            .to_string(),
                    ));
                }
            }
            other => {
                return Err(DiagramError::Configuration(format!(
                    "unknown primitive library backend '{}'",
                    other
                )))
            }
        }
        Ok(())
    }
}

/// Partial override carried in a request body. Every field optional;
/// unknown keys rejected the same way as the full config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigPatch {
    pub canvas_width: Option<f64>,
    pub canvas_height: Option<f64>,
    pub validation_mode: Option<ValidationMode>,
    pub nlp_tools: Option<BTreeSet<ToolId>>,
    pub enable_llm_planning: Option<bool>,
    pub enable_llm_audit: Option<bool>,
    pub enable_llm_enrichment: Option<bool>,
    pub enable_visual_validation: Option<bool>,
    pub enable_primitive_library: Option<bool>,
    pub enable_ontology_validation: Option<bool>,
    pub enable_layout_smt: Option<bool>,
    pub enable_layout_symbolic: Option<bool>,
    pub enable_refinement: Option<bool>,
    pub refinement_max_iterations: Option<u32>,
    pub refinement_target_score: Option<f64>,
    pub request_timeout_ms: Option<u64>,
}

impl GeneratorConfig {
    /// Apply a request-level patch on top of the server config, then
    /// re-validate the result.
    pub fn patched(&self, patch: &ConfigPatch) -> Result<GeneratorConfig> {
        let mut out = self.clone();
        macro_rules! apply {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = patch.$field.clone() { out.$field = v; })*
            };
        }
        apply!(
            canvas_width,
            canvas_height,
            validation_mode,
            nlp_tools,
            enable_llm_planning,
            enable_llm_audit,
            enable_llm_enrichment,
            enable_visual_validation,
            enable_primitive_library,
            enable_ontology_validation,
            enable_layout_smt,
            enable_layout_symbolic,
            enable_refinement,
            refinement_max_iterations,
            refinement_target_score,
            request_timeout_ms,
        );
        out.validate()?;
        Ok(out)
    }
}
