//! Workflow registry.
//!
//! A registry is simply two ordered lists of already-parsed workflow
//! definitions: user-authored workflows and published library workflows.
//! Lookup is by exact identifier match, user list first. The core never
//! parses YAML itself -- loading is the infrastructure layer's job.

use weft_types::workflow::WorkflowDefinition;

/// In-memory workflow source consulted by nested-call resolution.
#[derive(Debug, Default)]
pub struct WorkflowRegistry {
    user: Vec<WorkflowDefinition>,
    library: Vec<WorkflowDefinition>,
}

impl WorkflowRegistry {
    /// Build a registry from user-authored and library workflow lists.
    pub fn new(user: Vec<WorkflowDefinition>, library: Vec<WorkflowDefinition>) -> Self {
        Self { user, library }
    }

    /// Add a user-authored workflow.
    pub fn add_user(&mut self, workflow: WorkflowDefinition) {
        self.user.push(workflow);
    }

    /// Add a published library workflow.
    pub fn add_library(&mut self, workflow: WorkflowDefinition) {
        self.library.push(workflow);
    }

    /// Resolve an identifier, checking user workflows before the library.
    pub fn resolve(&self, id: &str) -> Option<&WorkflowDefinition> {
        self.user
            .iter()
            .find(|w| w.id == id)
            .or_else(|| self.library.iter().find(|w| w.id == id))
    }

    /// All registered workflows, user list first.
    pub fn iter(&self) -> impl Iterator<Item = &WorkflowDefinition> {
        self.user.iter().chain(self.library.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workflow(id: &str, title: &str) -> WorkflowDefinition {
        WorkflowDefinition {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            params: Default::default(),
            allowed_domains: None,
            steps: vec![weft_types::workflow::Step::Stop { message: None }],
        }
    }

    #[test]
    fn resolve_prefers_user_over_library() {
        let registry = WorkflowRegistry::new(
            vec![workflow("digest", "User Digest")],
            vec![workflow("digest", "Library Digest")],
        );
        assert_eq!(registry.resolve("digest").unwrap().title, "User Digest");
    }

    #[test]
    fn resolve_falls_back_to_library() {
        let registry =
            WorkflowRegistry::new(Vec::new(), vec![workflow("shared", "Library Shared")]);
        assert_eq!(registry.resolve("shared").unwrap().title, "Library Shared");
    }

    #[test]
    fn resolve_is_exact_match() {
        let registry = WorkflowRegistry::new(vec![workflow("digest", "Digest")], Vec::new());
        assert!(registry.resolve("Digest").is_none());
        assert!(registry.resolve("dig").is_none());
    }
}
