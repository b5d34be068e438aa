//! The `web_search` tool: protocol-facing shell around a search backend

use crate::backend::{SearchBackend, SearchHit};
use async_trait::async_trait;
use std::sync::Arc;
use toolwire_core::error::{WireError, WireResult};
use toolwire_core::tool::Tool;
use toolwire_core::types::{Arguments, ContentBlock, ParamSpec};
use tracing::debug;

/// Web search over whichever backend it was built with
pub struct WebSearchTool {
    backend: Arc<dyn SearchBackend>,
}

impl WebSearchTool {
    /// Create the tool around a backend
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web using Google Custom Search. \
         Returns a list of search results with titles, URLs, and snippets."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::string("query", "The search query string"),
            ParamSpec::integer("num_results", "Number of results to return (1-10, default: 5)")
                .optional()
                .with_default(5)
                .with_range(1.0, 10.0),
        ]
    }

    async fn execute(&self, arguments: &Arguments) -> WireResult<Vec<ContentBlock>> {
        // Presence, types, and the 1-10 bound were already checked against
        // the descriptor; no network call happens for rejected input.
        let query = arguments
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| WireError::invalid_arguments("query parameter is required"))?;
        let num_results = arguments
            .get("num_results")
            .and_then(|v| v.as_u64())
            .unwrap_or(5) as u8;

        debug!(query, num_results, "running web search");
        let hits = self
            .backend
            .search(query, num_results)
            .await
            .map_err(|e| WireError::handler(format!("search API error: {e}")))?;

        Ok(vec![ContentBlock::text(format_hits(&hits))])
    }
}

/// Render hits the way downstream agents expect to read them
fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No search results found.".to_string();
    }

    let mut out = format!("Found {} search results:\n\n", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        out.push_str(&format!("[{}] {}\n", i + 1, hit.title));
        out.push_str(&format!("    URL: {}\n", hit.url));
        out.push_str(&format!("    {}\n\n", hit.snippet));
    }
    out
}
