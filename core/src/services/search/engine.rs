//! The hybrid search engine: candidate fetch, chunk aggregation, RRF fusion,
//! boosts, agentic expansion, and pagination (spec §4.4).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use nectra_nlp_engine::EmbeddingClient;

use crate::db::{asset_store, chunk_store, knowledge_store, search_log_store, Db};
use crate::models::{KnowledgeStatus, KnowledgeType, SearchLogResult};

use super::boosts::{path_boost, recency_boost};
use super::expansion::{generate_variants, has_non_stopword_token, ExpansionConfig};
use super::pagination::{parse_cursor, split_has_more};
use super::rrf::{fuse, merge_max_score, LEXICAL_WEIGHT, SEMANTIC_WEIGHT};
use crate::services::error::CoreError;

const SNIPPET_MAX_CHARS: usize = 220;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Hybrid,
    Semantic,
    Lexical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceScope {
    Knowledge,
    Asset,
    All,
}

#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub project_id: Option<Uuid>,
    pub knowledge_type: Option<KnowledgeType>,
    pub status: Option<KnowledgeStatus>,
    pub path_prefix: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub org_id: Uuid,
    pub query: String,
    pub filters: SearchFilters,
    pub mode: SearchMode,
    pub exact: bool,
    pub source_scope: SourceScope,
    pub limit: i64,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: Uuid,
    pub source: &'static str,
    pub title: String,
    pub snippet: String,
    pub score: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub has_more: bool,
    pub next_cursor: String,
    pub search_id: Uuid,
}

/// Intermediate candidate shape shared by every retrieval path, before
/// fusion and boosting collapse it down to a [`SearchHit`].
#[derive(Debug, Clone)]
struct Candidate {
    key: String,
    id: Uuid,
    source: &'static str,
    title: String,
    scope: Option<String>,
    snippet: String,
    raw_score: f32,
    updated_at: Option<DateTime<Utc>>,
}

pub struct SearchEngine {
    db: Db,
    embedding_client: Arc<dyn EmbeddingClient>,
    expansion: ExpansionConfig,
}

impl SearchEngine {
    pub fn new(db: Db, embedding_client: Arc<dyn EmbeddingClient>, expansion: ExpansionConfig) -> Self {
        Self {
            db,
            embedding_client,
            expansion,
        }
    }

    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, CoreError> {
        let started = Utc::now();
        let limit = request.limit.max(1);
        let cursor = parse_cursor(request.cursor.as_deref())?;
        let fetch_count = (limit + cursor.offset + 1) as usize;

        let mut candidates = self.search_once(&request, fetch_count).await?;

        if !request.exact && self.expansion.enabled && candidates.len() < self.expansion.min_results {
            let variants = generate_variants(&request.query, self.expansion.max_variants);
            let mut merged: HashMap<String, Candidate> =
                candidates.drain(..).map(|c| (c.key.clone(), c)).collect();

            for variant in variants.into_iter().take(self.expansion.max_iterations) {
                if merged.len() >= fetch_count {
                    break;
                }
                let mut variant_request = request.clone();
                variant_request.query = variant;
                let variant_hits = self.search_once(&variant_request, fetch_count).await?;
                for hit in variant_hits {
                    merged
                        .entry(hit.key.clone())
                        .and_modify(|existing| {
                            if hit.raw_score > existing.raw_score {
                                *existing = hit.clone();
                            }
                        })
                        .or_insert(hit);
                }
            }
            candidates = merged.into_values().collect();
            candidates.sort_by(|a, b| b.raw_score.partial_cmp(&a.raw_score).unwrap_or(std::cmp::Ordering::Equal));
        }

        let now = Utc::now();
        let mut scored: Vec<SearchHit> = candidates
            .into_iter()
            .map(|c| {
                let boost =
                    path_boost(c.scope.as_deref(), request.filters.path_prefix.as_deref()) + recency_boost(c.updated_at, now);
                SearchHit {
                    id: c.id,
                    source: c.source,
                    title: c.title,
                    snippet: c.snippet,
                    score: c.raw_score as f64 + boost,
                    updated_at: c.updated_at,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });

        let offset = cursor.offset.max(0) as usize;
        let page = scored.into_iter().skip(offset).collect::<Vec<_>>();
        let (results, has_more) = split_has_more(page, limit as usize);

        let search_id = Uuid::new_v4();
        let log_results: Vec<SearchLogResult> = results
            .iter()
            .map(|r| SearchLogResult {
                id: r.id,
                source: r.source.to_string(),
                score: r.score as f32,
            })
            .collect();
        let duration_ms = (Utc::now() - started).num_milliseconds();
        if let Err(err) = search_log_store::insert(
            self.db.pool(),
            search_id,
            request.org_id,
            request.filters.project_id,
            &request.query,
            &json!({
                "knowledge_type": request.filters.knowledge_type.map(|t| t.as_str()),
                "status": request.filters.status.map(|s| s.as_str()),
                "path_prefix": request.filters.path_prefix,
            }),
            mode_label(request.mode),
            limit as i32,
            &log_results,
            duration_ms,
        )
        .await
        {
            tracing::warn!(error = %err, "failed to persist search log");
        }

        Ok(SearchResponse {
            results,
            has_more,
            next_cursor: cursor.next(limit).encode(),
            search_id,
        })
    }

    /// One full candidate-fetch-and-rank pass for a single query string, with
    /// no expansion and no pagination applied yet.
    async fn search_once(&self, request: &SearchRequest, candidate_count: usize) -> Result<Vec<Candidate>, CoreError> {
        let candidate_limit = (request.limit * 4).clamp(20, 200);

        let run_semantic = request.mode != SearchMode::Lexical;
        let run_lexical = request.mode != SearchMode::Semantic && has_non_stopword_token(&request.query);
        let include_knowledge = request.source_scope != SourceScope::Asset;
        let include_assets = request.source_scope != SourceScope::Knowledge;

        let query_embedding = if run_semantic {
            Some(self.embedding_client.generate(&request.query).await?)
        } else {
            None
        };

        let chunk_filters = chunk_store::ChunkFilters {
            project_id: request.filters.project_id,
            knowledge_type: request.filters.knowledge_type,
            status: request.filters.status,
            path_prefix: request.filters.path_prefix.clone(),
        };

        let mut semantic_knowledge = Vec::new();
        let mut lexical_knowledge = Vec::new();
        let mut semantic_assets = Vec::new();
        let mut lexical_assets = Vec::new();

        if include_knowledge {
            if let Some(embedding) = &query_embedding {
                let chunk_hits =
                    chunk_store::semantic_search(self.db.pool(), request.org_id, embedding, &chunk_filters, candidate_limit)
                        .await?;
                semantic_knowledge = if chunk_hits.is_empty() {
                    knowledge_doc_semantic_fallback(&self.db, request, embedding, candidate_limit).await?
                } else {
                    aggregate_chunk_hits(chunk_hits, "knowledge")
                };
            }
            if run_lexical {
                let chunk_hits =
                    chunk_store::lexical_search(self.db.pool(), request.org_id, &request.query, &chunk_filters, candidate_limit)
                        .await?;
                lexical_knowledge = if chunk_hits.is_empty() {
                    knowledge_doc_lexical_fallback(&self.db, request, candidate_limit).await?
                } else {
                    aggregate_chunk_hits(chunk_hits, "knowledge")
                };
            }
        }

        if include_assets {
            if let Some(embedding) = &query_embedding {
                let hits = asset_store::semantic_search(
                    self.db.pool(),
                    request.org_id,
                    request.filters.project_id,
                    embedding,
                    candidate_limit,
                )
                .await?;
                semantic_assets = hits.into_iter().map(asset_hit_to_candidate).collect();
            }
            if run_lexical {
                let hits = asset_store::lexical_search(
                    self.db.pool(),
                    request.org_id,
                    request.filters.project_id,
                    &request.query,
                    candidate_limit,
                )
                .await?;
                lexical_assets = hits.into_iter().map(asset_hit_to_candidate).collect();
            }
        }

        let mut by_key: HashMap<String, Candidate> = HashMap::new();
        for candidate in semantic_knowledge
            .iter()
            .chain(lexical_knowledge.iter())
            .chain(semantic_assets.iter())
            .chain(lexical_assets.iter())
        {
            by_key.entry(candidate.key.clone()).or_insert_with(|| candidate.clone());
        }

        let ranked = if request.mode == SearchMode::Hybrid {
            let lists = [
                (ranked_keys(&semantic_knowledge), SEMANTIC_WEIGHT),
                (ranked_keys(&lexical_knowledge), LEXICAL_WEIGHT),
                (ranked_keys(&semantic_assets), SEMANTIC_WEIGHT),
                (ranked_keys(&lexical_assets), LEXICAL_WEIGHT),
            ];
            let scores = fuse(&lists);
            scores
                .into_iter()
                .filter_map(|(key, score)| by_key.get(&key).map(|c| (key, score, c)))
                .map(|(key, score, c)| (key, score as f32, c))
                .collect::<Vec<_>>()
        } else {
            let raw_lists = [
                scored_pairs(&semantic_knowledge),
                scored_pairs(&lexical_knowledge),
                scored_pairs(&semantic_assets),
                scored_pairs(&lexical_assets),
            ];
            let merged = merge_max_score(&raw_lists);
            merged
                .into_iter()
                .filter_map(|(key, score)| by_key.get(&key).map(|c| (key, score, c)))
                .collect::<Vec<_>>()
        };

        let mut out: Vec<Candidate> = ranked
            .into_iter()
            .map(|(key, score, c)| Candidate {
                key,
                id: c.id,
                source: c.source,
                title: c.title.clone(),
                scope: c.scope.clone(),
                snippet: c.snippet.clone(),
                raw_score: score,
                updated_at: c.updated_at,
            })
            .collect();

        out.sort_by(|a, b| b.raw_score.partial_cmp(&a.raw_score).unwrap_or(std::cmp::Ordering::Equal));
        out.truncate(candidate_count.max(candidate_limit as usize));
        Ok(out)
    }
}

fn mode_label(mode: SearchMode) -> &'static str {
    match mode {
        SearchMode::Hybrid => "hybrid",
        SearchMode::Semantic => "semantic",
        SearchMode::Lexical => "lexical",
    }
}

fn ranked_keys(candidates: &[Candidate]) -> Vec<String> {
    candidates.iter().map(|c| c.key.clone()).collect()
}

fn scored_pairs(candidates: &[Candidate]) -> Vec<(String, f32)> {
    candidates.iter().map(|c| (c.key.clone(), c.raw_score)).collect()
}

fn aggregate_chunk_hits(hits: Vec<chunk_store::ChunkHit>, source: &'static str) -> Vec<Candidate> {
    let mut best: HashMap<Uuid, Candidate> = HashMap::new();
    let mut order: Vec<Uuid> = Vec::new();
    for hit in hits {
        let entry = best.entry(hit.knowledge_id);
        match entry {
            std::collections::hash_map::Entry::Vacant(v) => {
                order.push(hit.knowledge_id);
                v.insert(Candidate {
                    key: format!("{source}:{}", hit.knowledge_id),
                    id: hit.knowledge_id,
                    source,
                    title: hit.title,
                    scope: hit.scope,
                    snippet: snippet_of(&hit.content),
                    raw_score: hit.raw_score,
                    updated_at: Some(hit.updated_at),
                });
            }
            std::collections::hash_map::Entry::Occupied(mut o) => {
                if hit.raw_score > o.get().raw_score {
                    let title = hit.title;
                    let scope = hit.scope;
                    let snippet = snippet_of(&hit.content);
                    let updated_at = hit.updated_at;
                    let raw_score = hit.raw_score;
                    let slot = o.get_mut();
                    slot.title = title;
                    slot.scope = scope;
                    slot.snippet = snippet;
                    slot.updated_at = Some(updated_at);
                    slot.raw_score = raw_score;
                }
            }
        }
    }
    order.into_iter().filter_map(|id| best.remove(&id)).collect()
}

fn asset_hit_to_candidate(hit: asset_store::AssetHit) -> Candidate {
    Candidate {
        key: format!("asset:{}", hit.asset_id),
        id: hit.asset_id,
        source: "asset",
        title: hit.filename,
        scope: None,
        snippet: snippet_of(&hit.description),
        raw_score: hit.raw_score,
        updated_at: Some(hit.created_at),
    }
}

fn snippet_of(content: &str) -> String {
    let normalized = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.chars().count() <= SNIPPET_MAX_CHARS {
        normalized
    } else {
        let truncated: String = normalized.chars().take(SNIPPET_MAX_CHARS).collect();
        format!("{truncated}...")
    }
}

fn doc_filters(request: &SearchRequest) -> knowledge_store::DocFilters {
    knowledge_store::DocFilters {
        project_id: request.filters.project_id,
        knowledge_type: request.filters.knowledge_type,
        status: request.filters.status,
        path_prefix: request.filters.path_prefix.clone(),
    }
}

async fn knowledge_doc_semantic_fallback(
    db: &Db,
    request: &SearchRequest,
    embedding: &[f32],
    limit: i64,
) -> Result<Vec<Candidate>, CoreError> {
    let hits = knowledge_store::semantic_search_documents(db.pool(), request.org_id, embedding, &doc_filters(request), limit).await?;
    Ok(hits.into_iter().map(doc_hit_to_candidate).collect())
}

async fn knowledge_doc_lexical_fallback(
    db: &Db,
    request: &SearchRequest,
    limit: i64,
) -> Result<Vec<Candidate>, CoreError> {
    let hits = knowledge_store::lexical_search_documents(db.pool(), request.org_id, &request.query, &doc_filters(request), limit).await?;
    Ok(hits.into_iter().map(doc_hit_to_candidate).collect())
}

fn doc_hit_to_candidate(hit: knowledge_store::KnowledgeDocHit) -> Candidate {
    Candidate {
        key: format!("knowledge:{}", hit.knowledge_id),
        id: hit.knowledge_id,
        source: "knowledge",
        title: hit.title,
        scope: hit.scope,
        snippet: snippet_of(&hit.body),
        raw_score: hit.raw_score,
        updated_at: Some(hit.updated_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_truncates_and_normalizes_whitespace() {
        let long = "word ".repeat(100);
        let snippet = snippet_of(&long);
        assert!(snippet.ends_with("..."));
        assert!(snippet.chars().count() <= SNIPPET_MAX_CHARS + 3);
    }

    #[test]
    fn short_content_is_returned_verbatim() {
        assert_eq!(snippet_of("hello   world"), "hello world");
    }
}
