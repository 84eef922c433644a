use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::comments::{Comment, SortOrder},
    repositories::{CommentStore, NewComment, path},
};

/// In-memory comment store with the same observable contract as the
/// PostgreSQL backend. Used by tests and ephemeral deployments.
#[derive(Default, Clone)]
pub struct MemoryCommentStore {
    rows: Arc<RwLock<Vec<Comment>>>,
}

impl MemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_by_id(&self, id: Uuid) -> Option<Comment> {
        self.rows
            .read()
            .unwrap()
            .iter()
            .find(|comment| comment.id == id)
            .cloned()
    }
}

/// Lowercased alphanumeric terms, the tokenization `plainto_tsquery`
/// applies on the PostgreSQL side.
fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn occurrences(content_terms: &[String], query_terms: &[String]) -> usize {
    query_terms
        .iter()
        .map(|query_term| {
            content_terms
                .iter()
                .filter(|term| *term == query_term)
                .count()
        })
        .sum()
}

fn page(rows: Vec<Comment>, limit: u32, offset: u32) -> Vec<Comment> {
    rows.into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect()
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn create(&self, new: NewComment) -> Result<Comment, AppError> {
        let id = Uuid::now_v7();
        let now = Utc::now();

        let path = match new.parent_id {
            None => path::root_path(id),
            Some(parent_id) => {
                let parent = self
                    .find_by_id(parent_id)
                    .ok_or(AppError::ParentNotFound(parent_id))?;
                path::child_path(&parent.path, id)
            }
        };

        let comment = Comment {
            id,
            parent_id: new.parent_id,
            path,
            content: new.content,
            author: new.author,
            created_at: now,
            updated_at: now,
        };

        self.rows.write().unwrap().push(comment.clone());

        Ok(comment)
    }

    async fn fetch_thread(
        &self,
        parent_id: Uuid,
        limit: u32,
        offset: u32,
        sort: SortOrder,
    ) -> Result<Vec<Comment>, AppError> {
        let parent = self
            .find_by_id(parent_id)
            .ok_or(AppError::ParentNotFound(parent_id))?;

        let mut rows: Vec<Comment> = self
            .rows
            .read()
            .unwrap()
            .iter()
            .filter(|comment| path::in_subtree(&comment.path, &parent.path))
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            let ascending = a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id));
            match sort {
                SortOrder::Asc => ascending,
                SortOrder::Desc => ascending.reverse(),
            }
        });

        Ok(page(rows, limit, offset))
    }

    async fn delete_thread(&self, id: Uuid) -> Result<u64, AppError> {
        let target = self.find_by_id(id).ok_or(AppError::NotFound(id))?;

        let mut rows = self.rows.write().unwrap();
        let before = rows.len();
        rows.retain(|comment| !path::in_subtree(&comment.path, &target.path));

        Ok((before - rows.len()) as u64)
    }

    async fn search(&self, query: &str, limit: u32, offset: u32) -> Result<Vec<Comment>, AppError> {
        let query_terms = terms(query);

        let mut rows: Vec<Comment> = self.rows.read().unwrap().clone();

        if query_terms.is_empty() {
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            return Ok(page(rows, limit, offset));
        }

        // Every term must match, mirroring plainto_tsquery's AND semantics.
        let mut scored: Vec<(usize, Comment)> = rows
            .into_iter()
            .filter_map(|comment| {
                let content_terms = terms(&comment.content);
                query_terms
                    .iter()
                    .all(|term| content_terms.contains(term))
                    .then(|| (occurrences(&content_terms, &query_terms), comment))
            })
            .collect();

        scored.sort_by(|(score_a, a), (score_b, b)| {
            score_b
                .cmp(score_a)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });

        let ranked = scored.into_iter().map(|(_, comment)| comment).collect();
        Ok(page(ranked, limit, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed(store: &MemoryCommentStore, parent_id: Option<Uuid>, content: &str) -> Comment {
        store
            .create(NewComment {
                content: content.to_string(),
                author: "tester".to_string(),
                parent_id,
            })
            .await
            .unwrap()
    }

    fn ids(rows: &[Comment]) -> Vec<Uuid> {
        rows.iter().map(|comment| comment.id).collect()
    }

    #[tokio::test]
    async fn create_derives_path_from_parent() {
        let store = MemoryCommentStore::new();

        let root = seed(&store, None, "root").await;
        assert_eq!(root.path, root.id.to_string());
        assert!(root.parent_id.is_none());

        let child = seed(&store, Some(root.id), "child").await;
        assert_eq!(child.path, format!("{}/{}", root.path, child.id));

        let grandchild = seed(&store, Some(child.id), "grandchild").await;
        assert_eq!(grandchild.path, format!("{}/{}", child.path, grandchild.id));
        assert_eq!(path::depth(&grandchild.path), 3);
    }

    #[tokio::test]
    async fn create_under_missing_parent_is_rejected() {
        let store = MemoryCommentStore::new();
        let ghost = Uuid::now_v7();

        let err = store
            .create(NewComment {
                content: "orphan".to_string(),
                author: "tester".to_string(),
                parent_id: Some(ghost),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ParentNotFound(id) if id == ghost));
    }

    #[tokio::test]
    async fn fetch_thread_returns_whole_subtree_including_root() {
        let store = MemoryCommentStore::new();

        let root = seed(&store, None, "root").await;
        let reply = seed(&store, Some(root.id), "reply").await;
        let nested = seed(&store, Some(reply.id), "nested").await;
        let other_root = seed(&store, None, "unrelated").await;
        let other_reply = seed(&store, Some(other_root.id), "unrelated reply").await;

        let thread = store
            .fetch_thread(root.id, 100, 0, SortOrder::Asc)
            .await
            .unwrap();

        assert_eq!(ids(&thread), vec![root.id, reply.id, nested.id]);
        assert!(!ids(&thread).contains(&other_reply.id));

        // A mid-tree node anchors its own subtree.
        let subthread = store
            .fetch_thread(reply.id, 100, 0, SortOrder::Asc)
            .await
            .unwrap();
        assert_eq!(ids(&subthread), vec![reply.id, nested.id]);
    }

    #[tokio::test]
    async fn fetch_thread_desc_reverses_asc() {
        let store = MemoryCommentStore::new();

        let root = seed(&store, None, "root").await;
        for n in 0..5 {
            seed(&store, Some(root.id), &format!("reply {n}")).await;
        }

        let asc = store
            .fetch_thread(root.id, 100, 0, SortOrder::Asc)
            .await
            .unwrap();
        let desc = store
            .fetch_thread(root.id, 100, 0, SortOrder::Desc)
            .await
            .unwrap();

        let mut reversed = ids(&asc);
        reversed.reverse();
        assert_eq!(ids(&desc), reversed);
    }

    #[tokio::test]
    async fn fetch_thread_pages_are_gapless_and_disjoint() {
        let store = MemoryCommentStore::new();

        let root = seed(&store, None, "root").await;
        for n in 0..7 {
            seed(&store, Some(root.id), &format!("reply {n}")).await;
        }

        let full = store
            .fetch_thread(root.id, 100, 0, SortOrder::Asc)
            .await
            .unwrap();
        assert_eq!(full.len(), 8);

        let mut paged = Vec::new();
        for page_index in 0..3 {
            let page = store
                .fetch_thread(root.id, 3, page_index * 3, SortOrder::Asc)
                .await
                .unwrap();
            paged.extend(page);
        }

        assert_eq!(ids(&paged), ids(&full));

        let past_end = store
            .fetch_thread(root.id, 3, 100, SortOrder::Asc)
            .await
            .unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn fetch_thread_unknown_parent_is_rejected() {
        let store = MemoryCommentStore::new();
        let ghost = Uuid::now_v7();

        let err = store
            .fetch_thread(ghost, 20, 0, SortOrder::Asc)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ParentNotFound(id) if id == ghost));
    }

    #[tokio::test]
    async fn delete_thread_removes_subtree_and_nothing_else() {
        let store = MemoryCommentStore::new();

        let root = seed(&store, None, "root").await;
        let reply = seed(&store, Some(root.id), "reply").await;
        seed(&store, Some(reply.id), "nested").await;
        let survivor = seed(&store, None, "survivor").await;
        let survivor_reply = seed(&store, Some(survivor.id), "survivor reply").await;

        let removed = store.delete_thread(root.id).await.unwrap();
        assert_eq!(removed, 3);

        let err = store
            .fetch_thread(root.id, 20, 0, SortOrder::Asc)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ParentNotFound(_)));

        let untouched = store
            .fetch_thread(survivor.id, 20, 0, SortOrder::Asc)
            .await
            .unwrap();
        assert_eq!(ids(&untouched), vec![survivor.id, survivor_reply.id]);
    }

    #[tokio::test]
    async fn delete_thread_twice_reports_missing_target() {
        let store = MemoryCommentStore::new();
        let root = seed(&store, None, "root").await;

        assert_eq!(store.delete_thread(root.id).await.unwrap(), 1);

        let err = store.delete_thread(root.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(id) if id == root.id));
    }

    #[tokio::test]
    async fn deleting_a_reply_keeps_its_ancestors() {
        let store = MemoryCommentStore::new();

        let root = seed(&store, None, "root").await;
        let reply = seed(&store, Some(root.id), "reply").await;
        seed(&store, Some(reply.id), "nested").await;

        let removed = store.delete_thread(reply.id).await.unwrap();
        assert_eq!(removed, 2);

        let remaining = store
            .fetch_thread(root.id, 20, 0, SortOrder::Asc)
            .await
            .unwrap();
        assert_eq!(ids(&remaining), vec![root.id]);
    }

    #[tokio::test]
    async fn blank_search_browses_newest_first() {
        let store = MemoryCommentStore::new();

        let first = seed(&store, None, "first").await;
        let second = seed(&store, None, "second").await;
        let third = seed(&store, None, "third").await;

        let browsed = store.search("   ", 20, 0).await.unwrap();
        assert_eq!(ids(&browsed), vec![third.id, second.id, first.id]);

        let offset_page = store.search("", 2, 1).await.unwrap();
        assert_eq!(ids(&offset_page), vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn search_requires_every_term() {
        let store = MemoryCommentStore::new();

        let both = seed(&store, None, "rust ownership and rust lifetimes").await;
        seed(&store, None, "ownership only").await;
        seed(&store, None, "nothing relevant").await;

        let found = store.search("rust ownership", 20, 0).await.unwrap();
        assert_eq!(ids(&found), vec![both.id]);
    }

    #[tokio::test]
    async fn search_ranks_by_term_frequency() {
        let store = MemoryCommentStore::new();

        let once = seed(&store, None, "tokio scheduler notes").await;
        let twice = seed(&store, None, "tokio tasks feed the tokio runtime").await;

        let found = store.search("tokio", 20, 0).await.unwrap();
        assert_eq!(ids(&found), vec![twice.id, once.id]);
    }

    #[tokio::test]
    async fn search_ties_break_on_id() {
        let store = MemoryCommentStore::new();

        // create() stamps distinct times, so rows with identical rank and
        // timestamp are written directly to reach the final tiebreaker.
        let stamp = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let seeded: Vec<Uuid> = (1..=3).map(Uuid::from_u128).collect();
        {
            let mut rows = store.rows.write().unwrap();
            for id in &seeded {
                rows.push(Comment {
                    id: *id,
                    parent_id: None,
                    path: path::root_path(*id),
                    content: "identical text".to_string(),
                    author: "tester".to_string(),
                    created_at: stamp,
                    updated_at: stamp,
                });
            }
        }

        let found = store.search("identical", 20, 0).await.unwrap();
        let mut newest_id_first = seeded;
        newest_id_first.reverse();
        assert_eq!(ids(&found), newest_id_first);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_bounded() {
        let store = MemoryCommentStore::new();

        for n in 0..4 {
            seed(&store, None, &format!("Borrow checker session {n}")).await;
        }
        seed(&store, None, "unrelated").await;

        let found = store.search("BORROW", 2, 0).await.unwrap();
        assert_eq!(found.len(), 2);

        let rest = store.search("borrow", 20, 2).await.unwrap();
        assert_eq!(rest.len(), 2);

        let missing = store.search("nonexistent", 20, 0).await.unwrap();
        assert!(missing.is_empty());
    }
}
