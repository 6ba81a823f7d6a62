use crate::refine::refine;
use crate::response::{ErrorBody, GenerateMetadata, GenerateResult};
use dashmap::DashMap;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use stemdraw_ai::schemas::{AuditResponse, AuditSeverity, PlanningResponse};
use stemdraw_ai::{LlmProviderFactory, PromptId, StructuredLlm};
use stemdraw_core::{
    Canvas, CanonicalSpec, Constraint, ConstraintKind, DiagramError, DiagramPlan, DistanceSpec,
    Domain, GeneratorConfig, PlanEntity, PrimitiveKind, PrimitiveMap, PrimitiveStore, RequestId,
    RequestTrace, Scene, Strategy, TextEmbedder, Tracer, ValidationMode,
};
use stemdraw_layout::{place_labels, LayoutSolver};
use stemdraw_nlp::{merge_results, ExtractorRegistry, HashEmbedder};
use stemdraw_plan::{canonicalize, classify, enrich_graph, DiagramPlanner, InterpreterRegistry};
use stemdraw_primitives::{default_primitives, ingest_scene, open_store, to_primitive_map};
use stemdraw_render::{GenericRenderer, RendererRegistry};
use stemdraw_validate::ValidatorSet;
use uuid::Uuid;

const CLASSIFIER_CONFIDENCE_FLOOR: f64 = 0.3;

/// The pipeline orchestrator. One instance serves many concurrent
/// requests; the only shared mutable state is the primitive library,
/// the classifier cache and the trace index.
pub struct DiagramPipeline {
    config: GeneratorConfig,
    registry: ExtractorRegistry,
    planner: DiagramPlanner,
    interpreters: InterpreterRegistry,
    renderers: RendererRegistry,
    validators: ValidatorSet,
    llm: Option<StructuredLlm>,
    store: Option<Arc<dyn PrimitiveStore>>,
    embedder: Arc<dyn TextEmbedder>,
    classifier_cache: DashMap<String, (Domain, f64)>,
    traces: DashMap<RequestId, RequestTrace>,
}

impl DiagramPipeline {
    pub async fn new(config: GeneratorConfig) -> stemdraw_core::Result<Self> {
        config.validate()?;

        let embedder: Arc<dyn TextEmbedder> = Arc::new(HashEmbedder::default());
        let registry =
            ExtractorRegistry::new(config.phase_timeouts.extractor_ms, Arc::clone(&embedder));

        let wants_llm = config.enable_llm_enrichment
            || config.enable_llm_planning
            || config.enable_llm_audit;
        let llm = if wants_llm {
            match LlmProviderFactory::create(&config.llm) {
                Ok(provider) => Some(StructuredLlm::new(provider, config.llm.max_retries)),
                Err(e) => {
                    tracing::warn!("LLM backend unavailable, falling back to heuristics: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let store = if config.enable_primitive_library {
            let store = open_store(&config.primitive_library, Some(Arc::clone(&embedder)))?;
            match default_primitives(&GenericRenderer) {
                Ok(defaults) => {
                    let added = store.bootstrap(defaults).await?;
                    tracing::info!(added, "primitive library bootstrapped");
                }
                Err(e) => tracing::warn!("primitive bootstrap failed: {}", e),
            }
            Some(store)
        } else {
            None
        };

        Ok(Self {
            config,
            registry,
            planner: DiagramPlanner::new(),
            interpreters: InterpreterRegistry::new(),
            renderers: RendererRegistry::new(),
            validators: ValidatorSet::new(),
            llm,
            store,
            embedder,
            classifier_cache: DashMap::new(),
            traces: DashMap::new(),
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn trace(&self, request_id: RequestId) -> Option<RequestTrace> {
        self.traces.get(&request_id).map(|t| t.clone())
    }

    /// Feature availability for the health endpoint.
    pub async fn features(&self) -> serde_json::Value {
        let nlp: BTreeMap<String, bool> = self
            .registry
            .availability()
            .into_iter()
            .map(|(tool, ok)| (tool.to_string(), ok))
            .collect();
        let tiers: BTreeMap<String, bool> = LayoutSolver::available_tiers()
            .into_iter()
            .map(|(tier, ok)| (tier.to_string(), ok))
            .collect();
        let mut llm_backends = serde_json::Map::new();
        if let Some(llm) = &self.llm {
            llm_backends.insert(
                llm.provider().provider_name().to_string(),
                serde_json::Value::Bool(true),
            );
        }
        let primitive_library = match &self.store {
            Some(store) => serde_json::json!({
                "backend": store.backend(),
                "size": store.len().await,
            }),
            None => serde_json::Value::Null,
        };
        serde_json::json!({
            "nlp_tools": nlp,
            "llm_backends": llm_backends,
            "layout_tiers": tiers,
            "renderers": self.renderers.names(),
            "primitive_library": primitive_library,
        })
    }

    pub async fn generate(&self, text: &str) -> GenerateResult {
        let config = self.config.clone();
        self.generate_with(text, &config).await
    }

    /// Run the full phase sequence under the request budget. The
    /// pipeline never panics or returns a bare error: every outcome is a
    /// structured result with a request id and a trace.
    pub async fn generate_with(&self, text: &str, config: &GeneratorConfig) -> GenerateResult {
        let request_id = Uuid::new_v4();
        let tracer = Tracer::new(request_id, config.log_dir.clone());
        let partial_svg: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

        let budget = Duration::from_millis(config.request_timeout_ms);
        let run = self.run(text, config, request_id, &tracer, &partial_svg);

        let result = match tokio::time::timeout(budget, run).await {
            Ok(result) => result,
            Err(_) => {
                let error = DiagramError::BudgetExceeded(format!(
                    "request exceeded {} ms",
                    config.request_timeout_ms
                ));
                let trace = tracer.finalize(Some(&error));
                let mut metadata = GenerateMetadata::empty(request_id);
                metadata.partial = true;
                metadata
                    .warnings
                    .push("request budget exceeded; best-effort output".to_string());
                let salvage = partial_svg.lock().take();
                let error_body = if salvage.is_none() {
                    Some(ErrorBody {
                        kind: error.kind().to_string(),
                        message: error.to_string(),
                    })
                } else {
                    None
                };
                GenerateResult {
                    request_id,
                    svg: salvage,
                    metadata,
                    error: error_body,
                    trace: Some(trace),
                }
            }
        };

        if let Some(trace) = &result.trace {
            self.traces.insert(request_id, trace.clone());
        }
        result
    }

    async fn run(
        &self,
        text: &str,
        config: &GeneratorConfig,
        request_id: RequestId,
        tracer: &Tracer,
        partial_svg: &Arc<Mutex<Option<String>>>,
    ) -> GenerateResult {
        let mut metadata = GenerateMetadata::empty(request_id);

        // input bounds
        if text.trim().is_empty() {
            return self.fail(
                tracer,
                metadata,
                DiagramError::InputInvalid("problem text is empty".to_string()),
            );
        }
        if text.chars().count() > config.max_input_chars {
            return self.fail(
                tracer,
                metadata,
                DiagramError::InputInvalid(format!(
                    "problem text exceeds {} characters",
                    config.max_input_chars
                )),
            );
        }

        // phase 0: NLP fan-out
        let mut phase = tracer
            .begin("nlp_extract", "run extractor adapters concurrently")
            .input(format!(
                "{} chars, {} tools enabled",
                text.len(),
                config.nlp_tools.len()
            ));
        let results = self.registry.extract_all(text, &config.nlp_tools).await;
        let mut ok = 0usize;
        for (tool, result) in &results {
            match result.status {
                stemdraw_core::ExtractorStatus::Success => ok += 1,
                stemdraw_core::ExtractorStatus::Failed => {
                    phase.log(format!("{} failed: {}", tool, result.errors.join(", ")));
                    metadata
                        .warnings
                        .push(format!("extractor {} failed", tool));
                }
                stemdraw_core::ExtractorStatus::Skipped => {
                    phase.log(format!("{} skipped: {}", tool, result.errors.join(", ")));
                }
            }
        }
        phase.success(format!("{}/{} extractors succeeded", ok, results.len()));

        // phase 0.5: property graph build
        let phase = tracer.begin("graph_build", "merge extractor output into the property graph");
        let mut graph = merge_results(&results);
        if graph.is_empty() {
            phase.warn("empty graph; continuing with raw text only");
        } else {
            phase.success(format!(
                "{} nodes, {} edges",
                graph.node_count(),
                graph.edge_count()
            ));
        }

        // phase 0.6: enrichment
        if config.enable_llm_enrichment {
            let mut phase = tracer.begin("enrich", "graph enrichment");
            let outcome = enrich_graph(&mut graph, text, self.llm.as_ref()).await;
            if let Some(stats) = &outcome.stats {
                phase.log(stats.summary());
            }
            phase.success(format!(
                "+{} nodes, +{} edges ({})",
                outcome.added_nodes,
                outcome.added_edges,
                if outcome.used_llm { "llm" } else { "heuristic" }
            ));
        } else {
            tracer.begin("enrich", "graph enrichment").skip("disabled");
        }

        metadata.graph_nodes = graph.node_count();
        metadata.graph_edges = graph.edge_count();

        // phase 1: classify + canonicalize (critical)
        let phase = tracer.begin("canonicalize", "domain classification and canonical spec");
        let cache_key = text_digest(text);
        let (domain, confidence) = match self.classifier_cache.get(&cache_key) {
            Some(hit) => *hit,
            None => {
                let classification = classify(&graph, text, CLASSIFIER_CONFIDENCE_FLOOR);
                let value = (classification.domain, classification.confidence);
                self.classifier_cache.insert(cache_key, value);
                value
            }
        };
        let spec = canonicalize(&graph, domain, text);
        metadata.domain = spec.domain;
        metadata.complexity_score = spec.complexity_score;
        phase.success(format!(
            "domain={} (confidence {:.2}), {} objects, complexity {:.2}",
            spec.domain,
            confidence,
            spec.objects.len(),
            spec.complexity_score
        ));

        // phase 2: plan (falls back to a placeholder plan, never fatal)
        let mut phase = tracer.begin("plan", "five-stage diagram planning");
        let mut plan = self.planner.plan(&spec);
        if plan.entities.is_empty() {
            plan = placeholder_plan();
            metadata.warnings.push("PLAN_EMPTY_RECOVERED".to_string());
            phase.log("planner produced no entities; placeholder recovery".to_string());
        }
        if config.enable_llm_planning {
            if let Some(llm) = &self.llm {
                let stats = self.llm_assist_plan(llm, &spec, &mut plan).await;
                if let Some(stats) = stats {
                    phase.log(stats);
                }
            }
        }
        metadata.strategy = Some(plan.strategy);
        phase.success(format!(
            "{} entities, {} relations, {} constraints, strategy={}",
            plan.entities.len(),
            plan.relations.len(),
            plan.global_constraints.len(),
            plan.strategy
        ));

        // phase 3: interpret (critical)
        let phase = tracer.begin("interpret", "plan to unpositioned scene");
        let canvas = Canvas {
            width: config.canvas_width,
            height: config.canvas_height,
        };
        let mut scene = match self.interpreters.interpret(&plan, &spec, canvas) {
            Ok(scene) => scene,
            Err(e) => {
                phase.fail(&e);
                return self.fail(tracer, metadata, e);
            }
        };
        phase.success(format!(
            "{} objects, {} constraints",
            scene.objects.len(),
            scene.constraints.len()
        ));

        // phase 3.5: ontology check
        if config.enable_ontology_validation {
            let mut phase = tracer.begin("ontology", "scene consistency against the graph");
            let notes = ontology_check(&scene, &spec);
            for note in &notes {
                phase.log(note.clone());
                metadata.warnings.push(note.clone());
            }
            phase.success(format!("{} note(s)", notes.len()));
        } else {
            tracer
                .begin("ontology", "scene consistency against the graph")
                .skip("ontology backend not configured");
        }

        // phase 4: domain validation (fatal only in strict mode)
        if config.validation_mode == ValidationMode::Off {
            tracer
                .begin("validate_domain", "domain-rule engines")
                .skip("validation_mode=off");
        } else {
            let mut phase = tracer.begin("validate_domain", "domain-rule engines");
            let domain_report = self.validators.check_domain_rules(&scene, &spec);
            for issue in &domain_report.errors {
                phase.log(issue.message.clone());
            }
            if config.validation_mode == ValidationMode::Strict && !domain_report.is_clean() {
                let error = DiagramError::Validation(domain_report.errors[0].message.clone());
                phase.fail(&error);
                return self.fail(tracer, metadata, error);
            }
            for issue in &domain_report.errors {
                metadata.warnings.push(issue.message.clone());
            }
            phase.finish(
                if domain_report.is_clean() {
                    stemdraw_core::PhaseStatus::Success
                } else {
                    stemdraw_core::PhaseStatus::Warn
                },
                format!("score {:.0}", domain_report.score),
            );
        }

        // phase 5: layout cascade (critical; at least one tier must hold)
        let phase = tracer.begin("layout", "SMT/symbolic/heuristic cascade");
        let solver = LayoutSolver::new(
            config.enable_layout_smt,
            config.enable_layout_symbolic,
            config.phase_timeouts.layout_smt_ms,
        );
        let layout = match solver.solve(&mut scene) {
            Ok(outcome) => outcome,
            Err(e) => {
                phase.fail(&e);
                return self.fail(tracer, metadata, e);
            }
        };
        metadata.layout_tier_used = Some(layout.tier);
        phase.success(format!("tier={}: {}", layout.tier, layout.reason));

        // phase 5.5: label placement (skip on failure, defaults remain)
        let phase = tracer.begin("labels", "scored label placement");
        let placed = place_labels(&mut scene);
        phase.success(format!("{} label(s) placed", placed));

        // phase 5.6: spatial validation (+ phase 8 refinement)
        let mut phase = tracer.begin("validate_spatial", "overlap, bounds, z-order");
        let mut spatial_report = self.validators.check_spatial(&scene);
        phase.log(format!(
            "{} error(s), {} warning(s)",
            spatial_report.errors.len(),
            spatial_report.warnings.len()
        ));
        phase.finish(
            if spatial_report.is_clean() {
                stemdraw_core::PhaseStatus::Success
            } else {
                stemdraw_core::PhaseStatus::Warn
            },
            format!("score {:.0}", spatial_report.score),
        );

        if config.enable_refinement && spatial_report.score < config.refinement_target_score {
            let phase = tracer.begin("refine", "auto-fix and re-validate loop");
            let outcome = refine(
                &mut scene,
                &self.validators,
                &solver,
                config.refinement_max_iterations,
                config.refinement_target_score,
            );
            metadata.refinement_iterations = outcome.iterations;
            spatial_report = outcome.report.clone();
            phase.success(format!(
                "{} iteration(s), {} fix(es), final score {:.0}",
                outcome.iterations, outcome.report.auto_fixes_applied, outcome.report.score
            ));
        }
        for issue in spatial_report.errors.iter().chain(&spatial_report.warnings) {
            metadata.warnings.push(issue.message.clone());
        }

        // phase 6: render (critical)
        let mut phase = tracer.begin("render", "scene to SVG");
        let renderer = self.renderers.pick(spec.domain);
        let primitives = self.lookup_primitives(&scene, spec.domain).await;
        if !primitives.is_empty() {
            phase.log(format!("substituting {} stored fragment(s)", primitives.len()));
        }
        let mut svg = match renderer.render(&scene, &primitives) {
            Ok(svg) => svg,
            Err(e) => {
                phase.fail(&e);
                return self.fail(tracer, metadata, e);
            }
        };
        *partial_svg.lock() = Some(svg.clone());
        phase.success(format!("{} bytes via {}", svg.len(), renderer.name()));

        // phase 6.5: visual validation
        if config.enable_visual_validation {
            let mut phase = tracer.begin("validate_visual", "SVG sanity checks");
            let notes = visual_check(&svg, &scene);
            for note in &notes {
                phase.log(note.clone());
                metadata.warnings.push(note.clone());
            }
            phase.success(format!("{} note(s)", notes.len()));
        } else {
            tracer
                .begin("validate_visual", "SVG sanity checks")
                .skip("disabled");
        }

        // phase 7: LLM audit
        if config.enable_llm_audit {
            if let Some(llm) = &self.llm {
                let mut phase = tracer.begin("llm_audit", "post-render scene audit");
                let (audit, stats) = self.llm_audit(llm, &scene, text).await;
                phase.log(stats);
                if let Some(audit) = audit {
                    let critical: Vec<String> = audit
                        .issues
                        .iter()
                        .filter(|i| i.severity == AuditSeverity::Critical)
                        .map(|i| i.description.clone())
                        .collect();
                    for issue in &audit.issues {
                        metadata
                            .warnings
                            .push(format!("audit: {}", issue.description));
                    }
                    if !critical.is_empty() && config.enable_refinement {
                        let outcome = refine(
                            &mut scene,
                            &self.validators,
                            &solver,
                            config.refinement_max_iterations,
                            config.refinement_target_score,
                        );
                        metadata.refinement_iterations += outcome.iterations;
                        if outcome.iterations > 0 {
                            if let Ok(rerendered) = renderer.render(&scene, &primitives) {
                                svg = rerendered;
                                *partial_svg.lock() = Some(svg.clone());
                            }
                        }
                    }
                    phase.success(format!(
                        "score {:.0}, {} issue(s)",
                        audit.overall_score,
                        audit.issues.len()
                    ));
                } else {
                    phase.warn("audit call failed; skipped");
                }
            } else {
                tracer
                    .begin("llm_audit", "post-render scene audit")
                    .skip("no LLM backend");
            }
        } else {
            tracer
                .begin("llm_audit", "post-render scene audit")
                .skip("disabled");
        }

        // primitive ingest (non-fatal, post-render)
        if let Some(store) = &self.store {
            let ingested = ingest_scene(
                store,
                renderer,
                Some(&self.embedder),
                &scene,
                spec.domain,
            )
            .await;
            if ingested > 0 {
                tracing::debug!(ingested, "primitives ingested");
            }
        }

        let trace = tracer.finalize(None);
        GenerateResult {
            request_id,
            svg: Some(svg),
            metadata,
            error: None,
            trace: Some(trace),
        }
    }

    fn fail(
        &self,
        tracer: &Tracer,
        metadata: GenerateMetadata,
        error: DiagramError,
    ) -> GenerateResult {
        let trace = tracer.finalize(Some(&error));
        GenerateResult {
            request_id: metadata.request_id,
            svg: None,
            metadata,
            error: Some(ErrorBody {
                kind: error.kind().to_string(),
                message: error.to_string(),
            }),
            trace: Some(trace),
        }
    }

    /// Ask the configured LLM for extra layout constraints; anything
    /// malformed is discarded, and a failed call leaves the heuristic
    /// plan untouched.
    async fn llm_assist_plan(
        &self,
        llm: &StructuredLlm,
        spec: &CanonicalSpec,
        plan: &mut DiagramPlan,
    ) -> Option<String> {
        let mut vars = BTreeMap::new();
        vars.insert(
            "spec".to_string(),
            serde_json::to_string(spec).unwrap_or_default(),
        );
        let (response, stats) = llm
            .call::<PlanningResponse>(PromptId::DiagramPlanning, &vars)
            .await;
        let summary = stats.summary();
        let Some(response) = response else {
            return Some(summary);
        };

        if let Some(strategy) = response.strategy.as_deref() {
            plan.strategy = match strategy {
                "constraint_based" => Strategy::ConstraintBased,
                "symbolic_physics" => Strategy::SymbolicPhysics,
                "hierarchical" => Strategy::Hierarchical,
                _ => plan.strategy,
            };
        }

        let known: Vec<String> = plan.entities.iter().map(|e| e.id.clone()).collect();
        for planned in response.constraints {
            let constraint = constraint_from_parts(&planned.kind, &planned.ids, planned.value);
            if let Some(constraint) = constraint {
                if constraint
                    .object_ids()
                    .iter()
                    .all(|id| known.iter().any(|k| k == id))
                {
                    plan.global_constraints.push(constraint);
                }
            }
        }
        Some(summary)
    }

    async fn llm_audit(
        &self,
        llm: &StructuredLlm,
        scene: &Scene,
        text: &str,
    ) -> (Option<AuditResponse>, String) {
        let mut vars = BTreeMap::new();
        vars.insert("scene".to_string(), scene_summary(scene));
        vars.insert("text".to_string(), text.to_string());
        let (response, stats) = llm.call::<AuditResponse>(PromptId::SceneAudit, &vars).await;
        (response, stats.summary())
    }

    async fn lookup_primitives(&self, scene: &Scene, domain: Domain) -> PrimitiveMap {
        let Some(store) = &self.store else {
            return PrimitiveMap::new();
        };
        let mut categories: Vec<String> = scene
            .objects
            .iter()
            .filter(|o| o.primitive != PrimitiveKind::Text)
            .map(|o| o.primitive.category())
            .collect();
        categories.sort();
        categories.dedup();

        let mut entries = Vec::new();
        for category in categories {
            match store.semantic_search(&category, 1, Some(domain)).await {
                Ok(hits) => entries.extend(hits),
                Err(e) => tracing::warn!(category = %category, "primitive search failed: {}", e),
            }
        }
        to_primitive_map(entries)
    }
}

fn text_digest(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// The single-placeholder recovery scene for texts with no recognizable
/// entities.
fn placeholder_plan() -> DiagramPlan {
    let entity = PlanEntity {
        id: "unknown".to_string(),
        label: "unknown".to_string(),
        primitive: PrimitiveKind::Rect,
        source_object: None,
        inferred: true,
        properties: BTreeMap::new(),
    };
    DiagramPlan {
        entities: vec![entity],
        relations: vec![],
        global_constraints: vec![],
        style_hints: BTreeMap::new(),
        strategy: Strategy::Heuristic,
    }
}

fn constraint_from_parts(kind: &str, ids: &[String], value: Option<f64>) -> Option<Constraint> {
    let pair = || -> Option<(String, String)> {
        (ids.len() == 2).then(|| (ids[0].clone(), ids[1].clone()))
    };
    let kind = match kind {
        "aligned_horizontally" if ids.len() >= 2 => ConstraintKind::AlignedHorizontally {
            ids: ids.to_vec(),
        },
        "aligned_vertically" if ids.len() >= 2 => ConstraintKind::AlignedVertically {
            ids: ids.to_vec(),
        },
        "distance" => {
            let (a, b) = pair()?;
            ConstraintKind::Distance {
                a,
                b,
                spec: DistanceSpec::Exact(value?),
            }
        }
        "above" => {
            let (a, b) = pair()?;
            ConstraintKind::Above {
                a,
                b,
                min_gap: value.unwrap_or(0.0),
            }
        }
        "below" => {
            let (a, b) = pair()?;
            ConstraintKind::Below {
                a,
                b,
                min_gap: value.unwrap_or(0.0),
            }
        }
        "left_of" => {
            let (a, b) = pair()?;
            ConstraintKind::LeftOf {
                a,
                b,
                min_gap: value.unwrap_or(0.0),
            }
        }
        "right_of" => {
            let (a, b) = pair()?;
            ConstraintKind::RightOf {
                a,
                b,
                min_gap: value.unwrap_or(0.0),
            }
        }
        _ => return None,
    };
    Some(Constraint::high(kind))
}

/// Ontology-style consistency notes: scene objects whose plan lineage is
/// missing, and constraints over inferred-only pairs. Warnings only.
fn ontology_check(scene: &Scene, spec: &CanonicalSpec) -> Vec<String> {
    let mut notes = Vec::new();
    for object in &scene.objects {
        if object.primitive == PrimitiveKind::Text || object.properties.contains_key("from") {
            continue;
        }
        let known = spec.object(&object.id).is_some();
        if !known && object.label_target.is_none() {
            notes.push(format!(
                "object '{}' has no counterpart in the canonical spec",
                object.id
            ));
        }
    }
    notes
}

/// Cheap post-render checks: every placed label's text must appear in
/// the SVG, and the document must stay standalone.
fn visual_check(svg: &str, scene: &Scene) -> Vec<String> {
    let mut notes = Vec::new();
    for object in &scene.objects {
        if let Some(text) = object.label_text() {
            if !text.is_empty() && !svg.contains(&stemdraw_render::shapes::escape(text)) {
                notes.push(format!("label text '{}' missing from output", text));
            }
        }
    }
    if svg.contains("href=") {
        notes.push("output references external content".to_string());
    }
    notes
}

/// Compact scene description for the audit prompt.
fn scene_summary(scene: &Scene) -> String {
    let mut lines = Vec::new();
    for object in &scene.objects {
        let position = object
            .position
            .map(|p| format!("({:.0}, {:.0})", p.x, p.y))
            .unwrap_or_else(|| "unplaced".to_string());
        lines.push(format!(
            "{} [{:?}, layer {:?}] at {}",
            object.id, object.primitive, object.layer, position
        ));
    }
    lines.join("\n")
}
