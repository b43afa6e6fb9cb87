//! Strategy-chain type inference: annotation, then usage, then the builtin
//! registry. Each strategy either produces a result or
//! defers to the next; nothing ever aborts the chain.

use crate::inference::context::InferenceContext;
use crate::inference::registry::TypeRegistry;
use crate::prescan::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSource {
    Annotation,
    Inference,
    Registry,
    Builtin,
    External,
}

#[derive(Debug, Clone)]
pub struct TypeInferenceResult {
    pub type_string: String,
    pub confidence: f32,
    pub source: TypeSource,
    pub language: Language,
    /// Free-form disambiguator for where the inference ran (e.g. the
    /// enclosing function QN), kept optional since most strategies have
    /// nothing more specific to say than the result itself.
    pub context: Option<String>,
}

/// Data-only surfaces the engine never attempts inference over.
const NO_INFERENCE_LANGUAGES: &[&str] = &[
    "json", "yaml", "html", "css", "scss", "graphql", "dockerfile", "sql", "vue", "svelte",
];

pub struct TypeInferenceEngine;

impl TypeInferenceEngine {
    pub fn is_inferable_surface(language_tag: &str) -> bool {
        !NO_INFERENCE_LANGUAGES.contains(&language_tag)
    }

    /// `annotation` is the literal type text read from the AST's type subtree,
    /// if the language and this declaration have one. `context` names the
    /// enclosing declaration (a QN) the annotation was read from, if known.
    pub fn infer_annotated(language: Language, annotation: Option<&str>, context: Option<&str>) -> Option<TypeInferenceResult> {
        annotation.map(|type_string| TypeInferenceResult {
            type_string: type_string.to_string(),
            confidence: 1.0,
            source: TypeSource::Annotation,
            language,
            context: context.map(|s| s.to_string()),
        })
    }

    /// Usage-based inference: literal/constructor/call-result shapes, backed
    /// by what the context already knows about functions and variables.
    pub fn infer_from_usage(
        ctx: &InferenceContext,
        language: Language,
        expression_text: &str,
        called_function_qn: Option<&str>,
    ) -> Option<TypeInferenceResult> {
        if let Some(qn) = called_function_qn {
            if let Some(return_type) = ctx.function_return_types.get(qn) {
                return Some(TypeInferenceResult {
                    type_string: return_type.clone(),
                    confidence: 0.75,
                    source: TypeSource::Inference,
                    language,
                    context: Some(qn.to_string()),
                });
            }
        }
        if expression_text.starts_with('"') || expression_text.starts_with('\'') {
            return Some(literal(language, "str", 0.9));
        }
        if expression_text.parse::<i64>().is_ok() {
            return Some(literal(language, "int", 0.9));
        }
        if expression_text.parse::<f64>().is_ok() {
            return Some(literal(language, "float", 0.85));
        }
        if expression_text == "true" || expression_text == "false" {
            return Some(literal(language, "bool", 0.9));
        }
        if let Some(var_name) = ctx.lookup_variable(expression_text) {
            return Some(literal(language, var_name, 0.6));
        }
        None
    }

    pub fn infer_from_registry(language: Language, name: &str) -> Option<TypeInferenceResult> {
        TypeRegistry::lookup(language, name).map(|t| TypeInferenceResult {
            type_string: t.to_string(),
            confidence: 0.5,
            source: TypeSource::Registry,
            language,
            context: None,
        })
    }

    /// Runs the full chain; degrades to an `Any`-equivalent rather than failing.
    pub fn infer(
        ctx: &InferenceContext,
        language: Language,
        annotation: Option<&str>,
        expression_text: &str,
        called_function_qn: Option<&str>,
    ) -> TypeInferenceResult {
        Self::infer_annotated(language, annotation, called_function_qn)
            .or_else(|| Self::infer_from_usage(ctx, language, expression_text, called_function_qn))
            .or_else(|| Self::infer_from_registry(language, expression_text))
            .unwrap_or_else(|| TypeInferenceResult {
                type_string: "Any".to_string(),
                confidence: 0.0,
                source: TypeSource::Builtin,
                language,
                context: None,
            })
    }
}

fn literal(language: Language, type_string: &str, confidence: f32) -> TypeInferenceResult {
    TypeInferenceResult {
        type_string: type_string.to_string(),
        confidence,
        source: TypeSource::Inference,
        language,
        context: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_wins_over_everything_else() {
        let ctx = InferenceContext::default();
        let result = TypeInferenceEngine::infer(&ctx, Language::Python, Some("str"), "42", None);
        assert_eq!(result.type_string, "str");
        assert_eq!(result.source, TypeSource::Annotation);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn falls_back_to_registry_for_builtin_name() {
        let ctx = InferenceContext::default();
        let result = TypeInferenceEngine::infer(&ctx, Language::Python, None, "dict", None);
        assert_eq!(result.type_string, "dict");
        assert_eq!(result.source, TypeSource::Registry);
    }

    #[test]
    fn degrades_to_any_when_nothing_matches() {
        let ctx = InferenceContext::default();
        let result = TypeInferenceEngine::infer(&ctx, Language::Python, None, "some_unknown_thing", None);
        assert_eq!(result.type_string, "Any");
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn data_only_surfaces_are_not_inferable() {
        assert!(!TypeInferenceEngine::is_inferable_surface("yaml"));
        assert!(TypeInferenceEngine::is_inferable_surface("python"));
    }
}
