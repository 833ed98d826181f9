/// Opt-in relation loading
///
/// Listings return bare rows by default; callers name the relations they
/// want with `include=owner,tags` and anything outside the endpoint's
/// allow-list is silently ignored. Included relations load in one batched
/// query per relation over the whole page, never per row.

use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::tag::Tag;
use crate::models::task::Task;
use crate::models::user::User;

/// A loadable task relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Owner,
    Tags,
}

impl Relation {
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "owner" => Some(Self::Owner),
            "tags" => Some(Self::Tags),
            _ => None,
        }
    }
}

/// Relations the task endpoints allow callers to include.
pub const TASK_RELATIONS: &[Relation] = &[Relation::Owner, Relation::Tags];

/// Which relations a request asked for, resolved against an allow-list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskInclude {
    pub owner: bool,
    pub tags: bool,
}

impl TaskInclude {
    /// Parses a comma-separated `include` value. Unknown names and names
    /// outside `allowed` are no-ops.
    pub fn from_param(include: Option<&str>, allowed: &[Relation]) -> Self {
        let mut resolved = Self::default();
        let Some(include) = include else {
            return resolved;
        };
        for token in include.split(',') {
            match Relation::from_param(token.trim()) {
                Some(relation) if allowed.contains(&relation) => match relation {
                    Relation::Owner => resolved.owner = true,
                    Relation::Tags => resolved.tags = true,
                },
                _ => {}
            }
        }
        resolved
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        !self.owner && !self.tags
    }

    /// Attaches the requested relations to a page of tasks.
    ///
    /// Each relation costs one query regardless of page size. Relations
    /// that were not requested come back as `None` so serialization can
    /// omit them entirely.
    pub async fn load(
        &self,
        pool: &PgPool,
        tasks: Vec<Task>,
    ) -> Result<Vec<TaskWithRelations>, sqlx::Error> {
        let mut owners: HashMap<Uuid, User> = HashMap::new();
        let mut tags: HashMap<Uuid, Vec<Tag>> = HashMap::new();

        if self.owner {
            owners = User::for_tasks(pool, &tasks).await?;
        }
        if self.tags {
            let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
            tags = Tag::for_tasks(pool, &ids).await?;
        }

        Ok(tasks
            .into_iter()
            .map(|task| {
                let owner = if self.owner {
                    task.assigned_to.and_then(|id| owners.get(&id).cloned())
                } else {
                    None
                };
                // an included-but-empty tag list serializes as [], not null
                let task_tags = if self.tags {
                    Some(tags.remove(&task.id).unwrap_or_default())
                } else {
                    None
                };
                TaskWithRelations {
                    task,
                    owner,
                    tags: task_tags,
                }
            })
            .collect())
    }
}

/// A task row plus whichever relations the request included.
#[derive(Debug, Clone)]
pub struct TaskWithRelations {
    pub task: Task,
    pub owner: Option<User>,
    pub tags: Option<Vec<Tag>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_param_includes_nothing() {
        let include = TaskInclude::from_param(None, TASK_RELATIONS);
        assert!(include.is_empty());
    }

    #[test]
    fn test_parses_known_relations() {
        let include = TaskInclude::from_param(Some("owner, tags"), TASK_RELATIONS);
        assert!(include.owner);
        assert!(include.tags);
    }

    #[test]
    fn test_unknown_names_are_ignored() {
        let include = TaskInclude::from_param(Some("owner,comments"), TASK_RELATIONS);
        assert!(include.owner);
        assert!(!include.tags);
    }

    #[test]
    fn test_allow_list_trumps_recognition() {
        // "tags" is a real relation but this endpoint does not offer it
        let include = TaskInclude::from_param(Some("tags"), &[Relation::Owner]);
        assert!(include.is_empty());
    }

    #[test]
    fn test_empty_value_includes_nothing() {
        let include = TaskInclude::from_param(Some(""), TASK_RELATIONS);
        assert!(include.is_empty());
    }
}
