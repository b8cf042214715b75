use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::AppError;
pub use crate::store::MemberDirectory;

/// Resolves the receiver set for a business event. Pure lookups against the
/// injected [`MemberDirectory`]; lookup failures (unknown project, post or
/// comment) propagate to the caller.
#[derive(Clone)]
pub struct TargetFinder {
    directory: Arc<dyn MemberDirectory>,
}

impl TargetFinder {
    pub fn new(directory: Arc<dyn MemberDirectory>) -> Self {
        Self { directory }
    }

    /// All members of a project, client and dev side combined.
    pub async fn find_all_members_of_project(
        &self,
        project_id: i64,
    ) -> Result<HashSet<i64>, AppError> {
        let mut members = self.directory.project_client_member_ids(project_id).await?;
        members.extend(self.directory.project_dev_member_ids(project_id).await?);
        Ok(members)
    }

    pub async fn find_all_dev_members_of_project(
        &self,
        project_id: i64,
    ) -> Result<HashSet<i64>, AppError> {
        self.directory.project_dev_member_ids(project_id).await
    }

    pub async fn find_all_client_members_of_project(
        &self,
        project_id: i64,
    ) -> Result<HashSet<i64>, AppError> {
        self.directory.project_client_member_ids(project_id).await
    }

    pub async fn find_post_author(&self, post_id: i64) -> Result<i64, AppError> {
        self.directory.post_author_id(post_id).await
    }

    pub async fn find_comment_author(&self, comment_id: i64) -> Result<i64, AppError> {
        self.directory.comment_author_id(comment_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedDirectory;

    #[async_trait]
    impl MemberDirectory for FixedDirectory {
        async fn project_dev_member_ids(&self, project_id: i64) -> Result<HashSet<i64>, AppError> {
            if project_id != 7 {
                return Err(AppError::ProjectNotFound);
            }
            Ok(HashSet::from([1, 2]))
        }

        async fn project_client_member_ids(
            &self,
            project_id: i64,
        ) -> Result<HashSet<i64>, AppError> {
            if project_id != 7 {
                return Err(AppError::ProjectNotFound);
            }
            // user 2 sits on both sides; the union must not duplicate it
            Ok(HashSet::from([2, 3]))
        }

        async fn post_author_id(&self, _post_id: i64) -> Result<i64, AppError> {
            Ok(5)
        }

        async fn comment_author_id(&self, _comment_id: i64) -> Result<i64, AppError> {
            Err(AppError::CommentNotFound)
        }
    }

    #[tokio::test]
    async fn all_members_is_the_union_of_both_sides() {
        let finder = TargetFinder::new(Arc::new(FixedDirectory));
        let members = finder.find_all_members_of_project(7).await.unwrap();
        assert_eq!(members, HashSet::from([1, 2, 3]));
    }

    #[tokio::test]
    async fn unknown_project_propagates() {
        let finder = TargetFinder::new(Arc::new(FixedDirectory));
        assert!(matches!(
            finder.find_all_members_of_project(99).await,
            Err(AppError::ProjectNotFound)
        ));
    }

    #[tokio::test]
    async fn author_lookup_failures_propagate() {
        let finder = TargetFinder::new(Arc::new(FixedDirectory));
        assert_eq!(finder.find_post_author(42).await.unwrap(), 5);
        assert!(matches!(
            finder.find_comment_author(42).await,
            Err(AppError::CommentNotFound)
        ));
    }
}
