//! Boundary with a node-based host application.
//!
//! Each node is described by a static [`NodeSchema`]: typed inputs with
//! ranges and enumerations, its outputs and whether the host may cache its
//! result. Schemas are checked once when added to a [`NodeRegistry`];
//! host-supplied input maps are resolved against them at call time.

use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;

use crate::client::LetzClient;
use crate::config::ClientConfig;
use crate::error::{LetzError, Result};
use crate::report::Reporter;
use crate::selector;
use crate::tensor::ImageBatch;
use crate::types::{GenerationRequest, Mode, SystemVersion, MAX_DIMENSION, MAX_LEVEL, MIN_DIMENSION};

pub const GENERATOR_CLASS: &str = "LetzAI Generator";
pub const SELECTOR_CLASS: &str = "Image Selector";

/// Whether the host may reuse a previous result for identical inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHint {
    Cacheable,
    /// Re-run on every execution; remote generation is never deterministic.
    AlwaysRerun,
}

/// Type and constraints of one node input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputKind {
    Text { multiline: bool, placeholder: &'static str },
    Int { default: u64, min: u64, max: u64, step: u64 },
    Choice { options: Vec<Value>, default: Value },
    Bool { default: bool },
    Image,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub name: &'static str,
    pub kind: InputKind,
}

impl InputSpec {
    fn new(name: &'static str, kind: InputKind) -> Self {
        Self { name, kind }
    }

    fn default_value(&self) -> Option<Value> {
        match &self.kind {
            InputKind::Text { .. } => Some(json!("")),
            InputKind::Int { default, .. } => Some(json!(default)),
            InputKind::Choice { default, .. } => Some(default.clone()),
            InputKind::Bool { default } => Some(json!(default)),
            InputKind::Image => None,
        }
    }

    fn check(&self, value: &Value) -> Result<()> {
        let bad = |what: String| LetzError::InvalidInput(format!("{}: {}", self.name, what));
        match &self.kind {
            InputKind::Text { .. } => {
                if !value.is_string() {
                    return Err(bad(format!("expected text, got {}", value)));
                }
            }
            InputKind::Int { min, max, .. } => {
                let n = value
                    .as_u64()
                    .ok_or_else(|| bad(format!("expected a non-negative integer, got {}", value)))?;
                if n < *min || n > *max {
                    return Err(bad(format!("{} is outside {}..={}", n, min, max)));
                }
            }
            InputKind::Choice { options, .. } => {
                if !options.contains(value) {
                    return Err(bad(format!("{} is not one of {:?}", value, options)));
                }
            }
            InputKind::Bool { .. } => {
                if !value.is_boolean() {
                    return Err(bad(format!("expected a boolean, got {}", value)));
                }
            }
            InputKind::Image => {}
        }
        Ok(())
    }
}

/// Static description of a node as the host sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSchema {
    pub class_name: &'static str,
    pub display_name: &'static str,
    pub category: &'static str,
    pub inputs: Vec<InputSpec>,
    pub outputs: Vec<&'static str>,
    pub output_node: bool,
    pub cache: CacheHint,
}

impl NodeSchema {
    /// Check internal consistency: unique input names, defaults inside
    /// their ranges, non-empty choice lists.
    pub fn validate(&self) -> Result<()> {
        let bad = |what: String| LetzError::InvalidInput(format!("node {}: {}", self.class_name, what));
        if self.outputs.is_empty() {
            return Err(bad("declares no outputs".into()));
        }
        for (i, spec) in self.inputs.iter().enumerate() {
            if self.inputs[..i].iter().any(|s| s.name == spec.name) {
                return Err(bad(format!("duplicate input {}", spec.name)));
            }
            match &spec.kind {
                InputKind::Int { default, min, max, step } => {
                    if min > max || default < min || default > max || *step == 0 {
                        return Err(bad(format!("inconsistent range for {}", spec.name)));
                    }
                }
                InputKind::Choice { options, default } => {
                    if options.is_empty() || !options.contains(default) {
                        return Err(bad(format!("bad choices for {}", spec.name)));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Fill in defaults for missing inputs and check every value against
    /// its declaration. Unknown keys are rejected.
    pub fn resolve(&self, inputs: &Map<String, Value>) -> Result<Map<String, Value>> {
        if let Some(extra) = inputs
            .keys()
            .find(|k| !self.inputs.iter().any(|s| s.name == k.as_str()))
        {
            return Err(LetzError::InvalidInput(format!("unknown input {}", extra)));
        }

        let mut resolved = Map::new();
        for spec in &self.inputs {
            let value = match inputs.get(spec.name) {
                Some(v) => v.clone(),
                None => spec.default_value().ok_or_else(|| {
                    LetzError::InvalidInput(format!("missing required input {}", spec.name))
                })?,
            };
            spec.check(&value)?;
            resolved.insert(spec.name.to_string(), value);
        }
        Ok(resolved)
    }
}

/// Registered nodes, keyed by class name.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: Vec<NodeSchema>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the generator and selector nodes.
    pub fn with_builtin() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(GeneratorNode::schema())?;
        registry.register(SelectorNode::schema())?;
        Ok(registry)
    }

    /// Validate and add a schema.
    pub fn register(&mut self, schema: NodeSchema) -> Result<()> {
        schema.validate()?;
        if self.get(schema.class_name).is_some() {
            return Err(LetzError::InvalidInput(format!(
                "node {} is already registered",
                schema.class_name
            )));
        }
        tracing::debug!(class = schema.class_name, "registered node");
        self.nodes.push(schema);
        Ok(())
    }

    pub fn get(&self, class_name: &str) -> Option<&NodeSchema> {
        self.nodes.iter().find(|n| n.class_name == class_name)
    }

    pub fn display_name(&self, class_name: &str) -> Option<&'static str> {
        self.get(class_name).map(|n| n.display_name)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.nodes.iter().map(|n| n.class_name)
    }
}

/// Decoded inputs of the generator node.
#[derive(Debug, Clone)]
pub struct GeneratorInputs {
    pub api_key: String,
    pub request: GenerationRequest,
}

/// Text-to-image node backed by the LetzAI API.
#[derive(Debug)]
pub struct GeneratorNode {
    config: ClientConfig,
}

impl GeneratorNode {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn schema() -> NodeSchema {
        let level = |default| InputKind::Int { default, min: 1, max: MAX_LEVEL as u64, step: 1 };
        let dimension = InputKind::Int {
            default: 1600,
            min: MIN_DIMENSION as u64,
            max: MAX_DIMENSION as u64,
            step: 8,
        };
        NodeSchema {
            class_name: GENERATOR_CLASS,
            display_name: "LetzAI Image Generator",
            category: "LetzAI",
            inputs: vec![
                InputSpec::new(
                    "api_key",
                    InputKind::Text { multiline: false, placeholder: "Enter your LetzAI API key" },
                ),
                InputSpec::new(
                    "prompt",
                    InputKind::Text { multiline: true, placeholder: "Enter your prompt here" },
                ),
                InputSpec::new("width", dimension.clone()),
                InputSpec::new("height", dimension),
                InputSpec::new("quality", level(2)),
                InputSpec::new("creativity", level(2)),
                InputSpec::new(
                    "mode",
                    InputKind::Choice {
                        options: Mode::ALL.iter().map(|m| json!(m.as_str())).collect(),
                        default: json!(Mode::default().as_str()),
                    },
                ),
                InputSpec::new(
                    "version",
                    InputKind::Choice {
                        options: SystemVersion::ALL.iter().map(|v| json!(v.number())).collect(),
                        default: json!(SystemVersion::default().number()),
                    },
                ),
                InputSpec::new(
                    "seed",
                    InputKind::Int { default: 0, min: 0, max: u64::MAX, step: 1 },
                ),
                InputSpec::new("has_watermark", InputKind::Bool { default: true }),
            ],
            outputs: vec!["IMAGE"],
            output_node: true,
            cache: CacheHint::AlwaysRerun,
        }
    }

    /// Resolve host inputs into an API key and a request. A seed of 0
    /// means "no seed".
    pub fn request_from_inputs(inputs: &Map<String, Value>) -> Result<GeneratorInputs> {
        let values = Self::schema().resolve(inputs)?;
        let text = |key: &str| values.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
        let int = |key: &str| values.get(key).and_then(Value::as_u64).unwrap_or_default();

        // Ranges were checked by resolve, the narrowing casts below are lossless
        let mode = values
            .get("mode")
            .and_then(Value::as_str)
            .and_then(Mode::parse)
            .unwrap_or_default();
        let version = values
            .get("version")
            .and_then(Value::as_u64)
            .and_then(SystemVersion::from_number)
            .unwrap_or_default();

        let mut request = GenerationRequest::new(text("prompt"))
            .size(int("width") as u32, int("height") as u32)
            .quality(int("quality") as u8)
            .creativity(int("creativity") as u8)
            .mode(mode)
            .version(version)
            .watermark(values.get("has_watermark").and_then(Value::as_bool).unwrap_or(true));
        let seed = int("seed");
        if seed > 0 {
            request = request.seed(seed);
        }

        Ok(GeneratorInputs {
            api_key: text("api_key"),
            request,
        })
    }

    /// Run one generation for the given host inputs.
    pub async fn execute(
        &self,
        inputs: &Map<String, Value>,
        cancel: &CancellationToken,
        reporter: &dyn Reporter,
    ) -> Result<ImageBatch> {
        let decoded = match Self::request_from_inputs(inputs) {
            Ok(d) => d,
            Err(err) => {
                reporter.error(&format!("LetzAI generation failed: {}", err));
                return Err(err);
            }
        };
        let client = LetzClient::with_config(decoded.api_key, self.config.clone());
        client.generate(&decoded.request, cancel, reporter).await
    }

    pub fn cache_hint(&self) -> CacheHint {
        CacheHint::AlwaysRerun
    }
}

/// Picks the brightest image out of a batch.
#[derive(Debug, Default)]
pub struct SelectorNode;

impl SelectorNode {
    pub fn schema() -> NodeSchema {
        NodeSchema {
            class_name: SELECTOR_CLASS,
            display_name: "Image Selector",
            category: "LetzAI",
            inputs: vec![InputSpec::new("images", InputKind::Image)],
            outputs: vec!["IMAGE"],
            output_node: false,
            cache: CacheHint::Cacheable,
        }
    }

    pub fn execute(&self, images: &ImageBatch) -> Result<ImageBatch> {
        selector::select_best(images)
    }

    pub fn cache_hint(&self) -> CacheHint {
        CacheHint::Cacheable
    }
}
