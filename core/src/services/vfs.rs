//! Virtual filesystem read surface unifying knowledge documents, individual
//! chunks, and asset metadata (spec §4.5).

use uuid::Uuid;

use crate::db::{asset_store, chunk_store, knowledge_store, list_store, Db};
use crate::services::object_store::ObjectStore;

use super::error::CoreError;

const DEFAULT_MAX_CHARS: usize = 4000;
const MAX_MAX_CHARS: usize = 16000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Knowledge,
    Chunk,
    Asset,
}

/// `List`'s source selector (spec §4.5: "Sources: knowledge (default), asset,
/// or both"). Kept separate from [`SourceType`] since `Open` dispatches on a
/// single item and has no `Both` case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListSource {
    #[default]
    Knowledge,
    Asset,
    Both,
}

/// One row of a merged listing: either side of the `Both` union.
#[derive(Debug, Clone)]
pub enum ListedItem {
    Knowledge(list_store::KnowledgeListItem),
    Asset(list_store::AssetListItem),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LineRange {
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
    pub max_chars: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub id: Uuid,
    pub source_type: SourceType,
    pub chunk_id: Option<Uuid>,
    pub range: Option<LineRange>,
    pub include_url: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OpenedContent {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub total_lines: usize,
    pub total_chars: usize,
    pub chunk_count: i64,
    pub chunk_index: i32,
    pub chunk_id: Option<Uuid>,
    pub filename: String,
    pub mime_type: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub download_url: String,
}

/// Split on `\n`, clamp `start_line`/`end_line` into range, and byte-slice to
/// `max_chars` (spec §4.5 "Range semantics"). An out-of-range request yields
/// an empty string rather than erroring.
pub fn apply_range(content: &str, range: Option<&LineRange>) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let len = lines.len();

    let range = range.cloned().unwrap_or_default();
    let start_line = range.start_line.unwrap_or(0);
    if start_line >= len {
        return String::new();
    }

    let end_line = range.end_line.unwrap_or(len).min(len);
    if end_line <= start_line {
        return String::new();
    }

    let sliced = lines[start_line..end_line].join("\n");
    let max_chars = range.max_chars.unwrap_or(DEFAULT_MAX_CHARS).min(MAX_MAX_CHARS);
    truncate_bytes(&sliced, max_chars)
}

/// Byte-prefix slice to at most `max_bytes` bytes (spec §4.5: "max_chars ...
/// truncation is a byte-prefix slice"), backing off to the previous char
/// boundary so a multi-byte codepoint is never split.
fn truncate_bytes(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

fn total_lines(content: &str) -> usize {
    if content.is_empty() {
        0
    } else {
        content.matches('\n').count() + 1
    }
}

pub struct Vfs<'a> {
    db: &'a Db,
    object_store: &'a dyn ObjectStore,
}

impl<'a> Vfs<'a> {
    pub fn new(db: &'a Db, object_store: &'a dyn ObjectStore) -> Self {
        Self { db, object_store }
    }

    pub async fn open(&self, org_id: Uuid, request: OpenRequest) -> Result<OpenedContent, CoreError> {
        if let Some(chunk_id) = request.chunk_id {
            return self.open_chunk(org_id, chunk_id, request.range.as_ref()).await;
        }

        match request.source_type {
            SourceType::Knowledge => self.open_knowledge(org_id, request.id, request.range.as_ref()).await,
            SourceType::Chunk => self.open_chunk(org_id, request.id, request.range.as_ref()).await,
            SourceType::Asset => self.open_asset(org_id, request.id, request.include_url).await,
        }
    }

    async fn open_knowledge(&self, org_id: Uuid, id: Uuid, range: Option<&LineRange>) -> Result<OpenedContent, CoreError> {
        let knowledge = knowledge_store::get_by_id(self.db.pool(), org_id, id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("knowledge {id} not found")))?;
        let chunk_count = chunk_store::count_for_knowledge(self.db.pool(), id).await?;

        Ok(OpenedContent {
            id: knowledge.id,
            title: knowledge.title,
            content: apply_range(&knowledge.body, range),
            total_lines: total_lines(&knowledge.body),
            total_chars: knowledge.body.chars().count(),
            chunk_count,
            chunk_index: -1,
            chunk_id: None,
            ..Default::default()
        })
    }

    async fn open_chunk(&self, org_id: Uuid, chunk_id: Uuid, range: Option<&LineRange>) -> Result<OpenedContent, CoreError> {
        let chunk = chunk_store::get_by_id(self.db.pool(), chunk_id)
            .await?
            .filter(|c| c.org_id == org_id)
            .ok_or_else(|| CoreError::not_found(format!("chunk {chunk_id} not found")))?;
        let chunk_count = chunk_store::count_for_knowledge(self.db.pool(), chunk.knowledge_id).await?;

        Ok(OpenedContent {
            id: chunk.knowledge_id,
            title: chunk.title,
            content: apply_range(&chunk.content, range),
            total_lines: total_lines(&chunk.content),
            total_chars: chunk.content.chars().count(),
            chunk_count,
            chunk_index: chunk.chunk_index,
            chunk_id: Some(chunk.id),
            ..Default::default()
        })
    }

    async fn open_asset(&self, org_id: Uuid, id: Uuid, include_url: bool) -> Result<OpenedContent, CoreError> {
        let asset = asset_store::get_by_id(self.db.pool(), org_id, id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("asset {id} not found")))?;

        let download_url = if include_url {
            self.object_store
                .generate_download_url(&asset.storage_key)
                .await
                .unwrap_or_default()
        } else {
            String::new()
        };

        Ok(OpenedContent {
            id: asset.id,
            filename: asset.filename,
            mime_type: asset.mime_type,
            description: asset.description,
            keywords: asset.keywords,
            download_url,
            chunk_index: -1,
            ..Default::default()
        })
    }

    pub async fn list_knowledge(
        &self,
        org_id: Uuid,
        filters: &list_store::ListFilters,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<list_store::KnowledgeListItem>, bool), CoreError> {
        let rows = list_store::list_knowledge(self.db.pool(), org_id, filters, offset, limit + 1).await?;
        let (rows, has_more) = crate::services::search::pagination::split_has_more(rows, limit as usize);
        Ok((rows, has_more))
    }

    pub async fn list_assets(
        &self,
        org_id: Uuid,
        project_id: Option<Uuid>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<list_store::AssetListItem>, bool), CoreError> {
        let rows = list_store::list_assets(self.db.pool(), org_id, project_id, offset, limit + 1).await?;
        let (rows, has_more) = crate::services::search::pagination::split_has_more(rows, limit as usize);
        Ok((rows, has_more))
    }

    /// The `List` operation's unified entry point (spec §4.5). `source =
    /// Both` concatenates knowledge rows then asset rows, in that order,
    /// before truncating to `limit`.
    pub async fn list(
        &self,
        org_id: Uuid,
        source: ListSource,
        project_id: Option<Uuid>,
        filters: &list_store::ListFilters,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<ListedItem>, bool), CoreError> {
        match source {
            ListSource::Knowledge => {
                let (rows, has_more) = self.list_knowledge(org_id, filters, offset, limit).await?;
                Ok((rows.into_iter().map(ListedItem::Knowledge).collect(), has_more))
            }
            ListSource::Asset => {
                let (rows, has_more) = self.list_assets(org_id, project_id, offset, limit).await?;
                Ok((rows.into_iter().map(ListedItem::Asset).collect(), has_more))
            }
            ListSource::Both => {
                let window = offset + limit + 1;
                let knowledge_rows = list_store::list_knowledge(self.db.pool(), org_id, filters, 0, window).await?;
                let asset_rows = list_store::list_assets(self.db.pool(), org_id, project_id, 0, window).await?;

                let mut merged: Vec<ListedItem> = knowledge_rows.into_iter().map(ListedItem::Knowledge).collect();
                merged.extend(asset_rows.into_iter().map(ListedItem::Asset));

                let page: Vec<ListedItem> = merged.into_iter().skip(offset as usize).collect();
                let (page, has_more) = crate::services::search::pagination::split_has_more(page, limit as usize);
                Ok((page, has_more))
            }
        }
    }
}
