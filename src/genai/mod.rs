//! Generative text backend: model discovery, selection, and generation.

mod gemini;

pub use gemini::GeminiBackend;

use async_trait::async_trait;

use crate::error::SummarizeError;

/// One generation-capable model reported by discovery. Transient, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub name: String,
    pub api_variant: String,
    pub supports_generation: bool,
}

#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Query available generation-capable models. Fails with
    /// `DiscoveryUnavailable` when no API variant yields a qualifying model.
    async fn discover(&self, credential: &str) -> Result<Vec<ModelDescriptor>, SummarizeError>;

    /// Run one generation call and return the extracted plain text.
    async fn generate(
        &self,
        credential: &str,
        model: &ModelDescriptor,
        prompt: &str,
    ) -> Result<String, SummarizeError>;
}

/// Deterministic model preference: ranked known-good names first, then the
/// first model carrying the fast/economical marker, then whatever discovery
/// returned first. Biases toward low-cost models while tolerating catalog
/// drift.
pub fn pick_model<'a>(
    models: &'a [ModelDescriptor],
    preferred: &[String],
    economical_marker: &str,
) -> Option<&'a ModelDescriptor> {
    for name in preferred {
        if let Some(m) = models.iter().find(|m| {
            m.name == *name || m.name.strip_prefix("models/") == Some(name.as_str())
        }) {
            return Some(m);
        }
    }

    if !economical_marker.is_empty() {
        if let Some(m) = models.iter().find(|m| m.name.contains(economical_marker)) {
            return Some(m);
        }
    }

    models.first()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(name: &str) -> ModelDescriptor {
        ModelDescriptor {
            name: name.to_string(),
            api_variant: "v1".to_string(),
            supports_generation: true,
        }
    }

    #[test]
    fn test_preferred_name_wins() {
        let models = vec![
            model("models/gemini-pro"),
            model("models/gemini-1.5-flash"),
        ];
        let picked = pick_model(&models, &["gemini-1.5-flash".to_string()], "flash").unwrap();
        assert_eq!(picked.name, "models/gemini-1.5-flash");
    }

    #[test]
    fn test_marker_fallback() {
        let models = vec![model("models/gemini-pro"), model("models/gemini-2.5-flash")];
        let picked = pick_model(&models, &["gemini-9.9-ultra".to_string()], "flash").unwrap();
        assert_eq!(picked.name, "models/gemini-2.5-flash");
    }

    #[test]
    fn test_first_model_fallback() {
        let models = vec![model("models/gemini-pro"), model("models/gemini-ultra")];
        let picked = pick_model(&models, &[], "flash").unwrap();
        assert_eq!(picked.name, "models/gemini-pro");
    }

    #[test]
    fn test_empty_catalog_yields_none() {
        assert!(pick_model(&[], &[], "flash").is_none());
    }

    #[test]
    fn test_selection_is_deterministic() {
        let models = vec![
            model("models/gemini-2.0-flash"),
            model("models/gemini-1.5-flash"),
            model("models/gemini-pro"),
        ];
        let prefs = vec!["gemini-1.5-flash".to_string()];
        let first = pick_model(&models, &prefs, "flash").unwrap().name.clone();
        for _ in 0..5 {
            assert_eq!(pick_model(&models, &prefs, "flash").unwrap().name, first);
        }
    }
}
