use std::sync::Arc;

use crate::usecases::CommentService;

#[derive(Clone)]
pub struct AppState {
    pub comments: Arc<CommentService>,
}

impl AppState {
    pub fn new(comments: CommentService) -> Self {
        Self {
            comments: Arc::new(comments),
        }
    }
}
