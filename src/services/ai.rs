//! Gemini integration for drafting resource descriptions and tags.
//!
//! The service builds a strict-format prompt, calls the Gemini
//! `generateContent` endpoint with a bounded timeout, and normalizes the
//! completion into a fixed shape: one description plus exactly three
//! lowercase tags. When no API key is configured it degrades to a
//! deterministic local heuristic and never touches the network.

use crate::config::GeminiConfig;
use crate::models::ResourceType;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Hard ceiling on the upstream call; exceeding it surfaces `Unavailable`.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Generic tags used to pad short tag lists up to exactly three entries.
const FALLBACK_TAGS: [&str; 3] = ["educação", "aprendizado", "estudo"];

/// Portuguese stop words skipped when deriving tags from a title.
const STOP_WORDS: &[&str] = &[
    "de", "do", "da", "dos", "das", "em", "no", "na", "a", "o", "e", "à", "ao", "para", "com",
    "por",
];

/// System instruction sent with every generation request. Kept in
/// Portuguese because the catalog serves Brazilian university courses.
const SYSTEM_PROMPT: &str = "\
Você é um Assistente Pedagógico Especializado em curadoria de materiais \
educacionais para ensino superior. Sua função é auxiliar professores e \
alunos na catalogação inteligente de recursos didáticos.\n\n\
REGRAS OBRIGATÓRIAS:\n\
1. Você DEVE responder EXCLUSIVAMENTE em formato JSON válido, sem \
markdown, sem explicações adicionais, sem blocos de código.\n\
2. O JSON deve conter exatamente dois campos: \"description\" (string) e \
\"tags\" (array de 3 strings).\n\
3. A descrição deve ter entre 2 e 4 frases, ser informativa e útil para \
alunos universitários.\n\
4. A descrição deve explicar o que o aluno aprenderá ou encontrará no \
recurso.\n\
5. As 3 tags devem ser palavras-chave relevantes em português, em letras \
minúsculas.\n\
6. Adapte o tom e vocabulário ao tipo de recurso (vídeo = linguagem \
dinâmica, PDF = linguagem técnica, link = linguagem informativa).\n\n\
EXEMPLO DE SAÍDA ESPERADA:\n\
{\"description\": \"Este vídeo apresenta os conceitos fundamentais de \
derivadas e integrais, essenciais para o curso de Cálculo I. O aluno \
aprenderá a resolver problemas práticos de taxa de variação e área sob \
curvas, com exemplos resolvidos passo a passo.\", \"tags\": [\"cálculo\", \
\"derivadas\", \"integrais\"]}\n\n\
IMPORTANTE: Retorne APENAS o JSON, sem nenhum texto antes ou depois.";

/// Error type for AI generation, classified for the HTTP boundary.
#[derive(Error, Debug)]
pub enum AiError {
    /// Network failure, timeout, or non-2xx status from the model API.
    #[error("AI service unavailable: {0}")]
    Unavailable(String),

    /// The model answered but its payload could not be normalized.
    #[error("AI response could not be parsed: {0}")]
    Malformed(String),

    /// Anything uncategorized.
    #[error("Unexpected AI service error: {0}")]
    Unexpected(String),
}

/// Ephemeral generation result; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDescription {
    pub description: String,
    /// Always exactly three lowercase entries.
    pub tags: Vec<String>,
}

/// Client for the Gemini text-generation API with a local fallback mode.
#[derive(Clone)]
pub struct AiService {
    client: Client,
    api_key: Option<String>,
    model: String,
}

impl AiService {
    pub fn new(config: &GeminiConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Generate a pedagogical description and exactly three tags for a
    /// resource title. Falls back to the local heuristic when no API key
    /// is configured.
    pub async fn generate(
        &self,
        title: &str,
        resource_type: ResourceType,
    ) -> Result<GeneratedDescription, AiError> {
        let Some(api_key) = &self.api_key else {
            tracing::warn!("GEMINI_API_KEY not configured, using local fallback");
            return Ok(fallback_response(title, resource_type));
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            GEMINI_API_BASE, self.model, api_key
        );
        let payload = build_request(title, resource_type);

        tracing::debug!(
            model = %self.model,
            title = %title,
            resource_type = %resource_type,
            "Sending request to Gemini API"
        );

        let started = Instant::now();

        let response = match self.client.post(&url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                log_ai_request(title, resource_type, started.elapsed(), None, false);
                return Err(AiError::Unavailable(format!(
                    "Could not reach the Gemini API: {}",
                    e
                )));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log_ai_request(title, resource_type, started.elapsed(), None, false);
            tracing::error!(
                status = %status,
                body = %truncate(&body, 300),
                "Gemini API returned an error"
            );
            return Err(AiError::Unavailable(format!(
                "Gemini API error (HTTP {}). Check your GEMINI_API_KEY and try again.",
                status
            )));
        }

        let api_response: GenerateContentResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                log_ai_request(title, resource_type, started.elapsed(), None, false);
                return Err(AiError::Malformed(format!(
                    "Failed to decode Gemini response body: {}",
                    e
                )));
            }
        };

        let token_usage = api_response
            .usage_metadata
            .as_ref()
            .and_then(|u| u.total_token_count);
        log_ai_request(title, resource_type, started.elapsed(), token_usage, true);

        let text = api_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .ok_or_else(|| AiError::Malformed("Gemini response contains no candidates".into()))?;

        normalize_completion(&text)
    }
}

// ----------------------------------------------------------------------------
// Request construction
// ----------------------------------------------------------------------------

/// Human-readable Portuguese label for the user message.
fn type_label(resource_type: ResourceType) -> &'static str {
    match resource_type {
        ResourceType::Video => "Vídeo Educacional",
        ResourceType::Pdf => "Documento PDF",
        ResourceType::Link => "Link/Recurso Web",
    }
}

fn build_request(title: &str, resource_type: ResourceType) -> GenerateContentRequest {
    let user_message = format!(
        "Gere uma descrição pedagógica e 3 tags para o seguinte recurso:\n\
         - Título: {}\n\
         - Tipo: {}\n\n\
         Responda APENAS com o JSON no formato especificado.",
        title,
        type_label(resource_type)
    );

    GenerateContentRequest {
        system_instruction: Content {
            role: None,
            parts: vec![ContentPart {
                text: SYSTEM_PROMPT.to_string(),
            }],
        },
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![ContentPart { text: user_message }],
        }],
        // Tuned for short, consistent completions.
        generation_config: GenerationConfig {
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
            max_output_tokens: 500,
        },
    }
}

// ----------------------------------------------------------------------------
// Response normalization
// ----------------------------------------------------------------------------

/// Turn a raw completion into the fixed `{description, tags[3]}` shape.
fn normalize_completion(text: &str) -> Result<GeneratedDescription, AiError> {
    let parsed = parse_completion_json(text)?;

    let description = match parsed.get("description") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
        None => {
            return Err(AiError::Malformed(
                "Field 'description' missing from AI response".into(),
            ))
        }
    };

    let raw_tags = match parsed.get("tags") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>(),
        _ => {
            return Err(AiError::Malformed(
                "Field 'tags' missing or not a list in AI response".into(),
            ))
        }
    };

    Ok(GeneratedDescription {
        description,
        tags: normalize_tags(raw_tags),
    })
}

/// Cascading parse: direct JSON, then the contents of a fenced code
/// block, then the span between the first `{` and the last `}`.
/// Short-circuits on the first attempt that yields valid JSON.
fn parse_completion_json(text: &str) -> Result<Value, AiError> {
    let text = text.trim();

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    if let Some(inner) = extract_fenced_block(text) {
        if let Ok(value) = serde_json::from_str::<Value>(&inner) {
            return Ok(value);
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&text[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(AiError::Malformed(format!(
        "No JSON object found in completion: {}",
        truncate(text, 200)
    )))
}

/// Extract the contents of the last fenced code block, preferring a
/// ```json fence when one is present.
fn extract_fenced_block(text: &str) -> Option<String> {
    let inner = if let Some(idx) = text.rfind("```json") {
        &text[idx + "```json".len()..]
    } else {
        let parts: Vec<&str> = text.split("```").collect();
        if parts.len() < 3 {
            return None;
        }
        parts[parts.len() - 2]
    };

    let inner = inner.split("```").next().unwrap_or(inner);
    Some(inner.trim().to_string())
}

/// Normalize a candidate tag list to exactly three entries: trim and
/// lowercase each tag, truncate past three, and pad short lists from the
/// fallback pool, skipping pool tags already present. The visible list
/// itself is intentionally not deduplicated.
pub fn normalize_tags(raw: Vec<String>) -> Vec<String> {
    let mut tags: Vec<String> = raw
        .into_iter()
        .map(|tag| tag.trim().to_lowercase())
        .collect();

    if tags.len() > 3 {
        tags.truncate(3);
    } else if tags.len() < 3 {
        for fallback in FALLBACK_TAGS {
            if tags.len() >= 3 {
                break;
            }
            if !tags.iter().any(|t| t == fallback) {
                tags.push(fallback.to_string());
            }
        }
    }

    tags
}

// ----------------------------------------------------------------------------
// Local fallback heuristic
// ----------------------------------------------------------------------------

/// Deterministic, network-free generation used when no API key is
/// configured: a per-type description template plus tags derived from
/// the significant words of the title.
pub fn fallback_response(title: &str, resource_type: ResourceType) -> GeneratedDescription {
    let description = match resource_type {
        ResourceType::Video => format!(
            "Este vídeo educacional sobre '{}' apresenta os conceitos \
             fundamentais do tema de forma dinâmica e acessível. O conteúdo \
             é ideal para alunos que buscam compreender a teoria e suas \
             aplicações práticas no contexto acadêmico.",
            title
        ),
        ResourceType::Pdf => format!(
            "Este documento PDF sobre '{}' oferece uma abordagem técnica e \
             aprofundada do assunto. O material inclui definições formais, \
             exemplos resolvidos e exercícios propostos para fixação do \
             conteúdo.",
            title
        ),
        ResourceType::Link => format!(
            "Este recurso web sobre '{}' disponibiliza conteúdo interativo \
             e atualizado sobre o tema. O aluno encontrará referências \
             complementares e materiais de apoio para aprofundar seus \
             estudos.",
            title
        ),
    };

    let words: Vec<String> = title
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .map(|w| w.to_lowercase())
        .collect();

    let tags: Vec<String> = if words.len() >= 3 {
        words.into_iter().take(3).collect()
    } else {
        words
            .into_iter()
            .chain(FALLBACK_TAGS.iter().map(|t| t.to_string()))
            .take(3)
            .collect()
    };

    tracing::info!(
        title = %title,
        resource_type = %resource_type,
        "Generated local fallback description"
    );

    GeneratedDescription { description, tags }
}

// ----------------------------------------------------------------------------
// Observability
// ----------------------------------------------------------------------------

/// One structured log line per AI call, success or failure.
fn log_ai_request(
    title: &str,
    resource_type: ResourceType,
    latency: Duration,
    token_usage: Option<i64>,
    success: bool,
) {
    let latency_ms = latency.as_millis() as u64;
    if success {
        tracing::info!(
            title = %title,
            resource_type = %resource_type,
            latency_ms = latency_ms,
            token_usage = ?token_usage,
            success = success,
            "AI request completed"
        );
    } else {
        tracing::error!(
            title = %title,
            resource_type = %resource_type,
            latency_ms = latency_ms,
            success = success,
            "AI request failed"
        );
    }
}

/// Char-safe prefix for log snippets.
fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ----------------------------------------------------------------------------
// Gemini API request/response types
// ----------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pure_json_completion() {
        let text = r#"{"description": "x", "tags": ["a", "b", "c"]}"#;
        let result = normalize_completion(text).unwrap();
        assert_eq!(result.description, "x");
        assert_eq!(result.tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn parses_fenced_json_completion() {
        let text = "```json\n{\"description\": \"x\", \"tags\": [\"a\",\"B\",\"a\"]}\n```";
        let result = normalize_completion(text).unwrap();
        assert_eq!(result.description, "x");
        // Trim/lowercase applies and the visible list is not deduplicated.
        assert_eq!(result.tags, vec!["a", "b", "a"]);
        assert_eq!(result.tags.len(), 3);
    }

    #[test]
    fn parses_bare_fenced_completion() {
        let text = "```\n{\"description\": \"y\", \"tags\": [\"um\", \"dois\", \"três\"]}\n```";
        let result = normalize_completion(text).unwrap();
        assert_eq!(result.description, "y");
        assert_eq!(result.tags, vec!["um", "dois", "três"]);
    }

    #[test]
    fn parses_json_embedded_in_prose() {
        let text = "Claro! Aqui está o resultado: {\"description\": \"z\", \"tags\": [\"t1\", \"t2\", \"t3\"]} Espero que ajude.";
        let result = normalize_completion(text).unwrap();
        assert_eq!(result.description, "z");
        assert_eq!(result.tags, vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn rejects_completion_without_json() {
        let err = normalize_completion("no json here at all").unwrap_err();
        assert!(matches!(err, AiError::Malformed(_)));
    }

    #[test]
    fn rejects_missing_description_field() {
        let err = normalize_completion(r#"{"tags": ["a", "b", "c"]}"#).unwrap_err();
        assert!(matches!(err, AiError::Malformed(_)));
    }

    #[test]
    fn rejects_tags_that_are_not_a_list() {
        let err = normalize_completion(r#"{"description": "x", "tags": "a"}"#).unwrap_err();
        assert!(matches!(err, AiError::Malformed(_)));
    }

    #[test]
    fn normalize_tags_truncates_past_three() {
        let tags = normalize_tags(vec![
            "A".into(),
            "b".into(),
            "C".into(),
            "d".into(),
            "e".into(),
        ]);
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn normalize_tags_pads_from_pool_skipping_present_entries() {
        let tags = normalize_tags(vec!["Educação".into()]);
        assert_eq!(tags, vec!["educação", "aprendizado", "estudo"]);
    }

    #[test]
    fn normalize_tags_pads_empty_list_with_full_pool() {
        let tags = normalize_tags(vec![]);
        assert_eq!(tags, vec!["educação", "aprendizado", "estudo"]);
    }

    #[test]
    fn normalize_tags_trims_and_lowercases() {
        let tags = normalize_tags(vec!["  RUST ".into(), "Async".into(), "Web".into()]);
        assert_eq!(tags, vec!["rust", "async", "web"]);
    }

    #[test]
    fn fallback_uses_significant_title_words_as_tags() {
        let result = fallback_response("Introdução à Álgebra Linear", ResourceType::Video);
        assert!(result.description.contains("Introdução à Álgebra Linear"));
        // "à" is a stop word and too short; the three remaining words win.
        assert_eq!(result.tags, vec!["introdução", "álgebra", "linear"]);
    }

    #[test]
    fn fallback_pads_short_titles_with_generic_tags() {
        let result = fallback_response("Cálculo I", ResourceType::Video);
        assert!(result.description.contains("Cálculo I"));
        assert_eq!(result.tags.len(), 3);
        // "I" has a single char and is discarded; generic tags pad the rest.
        assert_eq!(result.tags, vec!["cálculo", "educação", "aprendizado"]);
    }

    #[test]
    fn fallback_description_varies_by_type() {
        let video = fallback_response("Teste de Conteúdo", ResourceType::Video);
        let pdf = fallback_response("Teste de Conteúdo", ResourceType::Pdf);
        let link = fallback_response("Teste de Conteúdo", ResourceType::Link);
        assert!(video.description.starts_with("Este vídeo educacional"));
        assert!(pdf.description.starts_with("Este documento PDF"));
        assert!(link.description.starts_with("Este recurso web"));
    }

    #[test]
    fn fenced_block_extraction_prefers_json_fence() {
        let text = "```\nnot it\n```\n```json\n{\"k\": 1}\n```";
        assert_eq!(extract_fenced_block(text).unwrap(), "{\"k\": 1}");
    }
}
