use uuid::Uuid;

/// Separator between ancestry segments in a materialized path.
pub const PATH_SEPARATOR: char = '/';

/// Path for a comment with no parent: the id's canonical text form.
pub fn root_path(id: Uuid) -> String {
    id.to_string()
}

/// Path for a reply: the parent's full path plus one new segment.
pub fn child_path(parent_path: &str, id: Uuid) -> String {
    format!("{parent_path}{PATH_SEPARATOR}{id}")
}

/// Whether `candidate` lies in the subtree rooted at the comment whose path
/// is `root`, the root itself included.
///
/// An anchored prefix match is an exact subtree test only because every
/// segment is a fixed-width canonical UUID string: no path can be a proper
/// prefix of another without aligning on a segment boundary.
pub fn in_subtree(candidate: &str, root: &str) -> bool {
    candidate.starts_with(root)
}

/// Number of ancestors encoded in `path` (0 for a root comment).
pub fn depth(path: &str) -> usize {
    path.matches(PATH_SEPARATOR).count()
}
