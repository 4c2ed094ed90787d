pub mod escape;
pub mod tags;

use std::sync::LazyLock;

/// A single markup sanitization layer.
pub trait Sanitizer: Send + Sync {
    /// Return the input with this layer's threats neutralized.
    fn sanitize(&self, input: &str) -> String;

    /// Name of this sanitizer layer (for logging/debugging).
    fn name(&self) -> &str;
}

/// The complete markup pipeline. Runs all layers in sequence.
pub struct SanitizePipeline {
    layers: Vec<Box<dyn Sanitizer>>,
}

impl SanitizePipeline {
    /// Default pipeline. Order: strip dangerous tags/attributes -> escape.
    /// Stripping must run first; once escaped, tags no longer look like tags.
    pub fn default_pipeline() -> Self {
        Self {
            layers: vec![
                Box::new(tags::TagStripper::new()),
                Box::new(escape::HtmlEscaper),
            ],
        }
    }

    /// Create a pipeline from custom layers.
    pub fn new(layers: Vec<Box<dyn Sanitizer>>) -> Self {
        Self { layers }
    }

    /// Run all sanitization layers in sequence.
    pub fn sanitize(&self, input: &str) -> String {
        let mut result = input.to_string();
        for layer in &self.layers {
            result = layer.sanitize(&result);
        }
        result
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name()).collect()
    }
}

static DEFAULT_PIPELINE: LazyLock<SanitizePipeline> =
    LazyLock::new(SanitizePipeline::default_pipeline);

/// Strip active markup and escape the rest. Idempotent.
pub fn sanitize_markup(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    DEFAULT_PIPELINE.sanitize(text)
}
