//! Command registry: pure data behind the autocomplete overlay.

/// One registered command with its ordered subcommand table.
///
/// Identity is the name; declaration order inside the registry is
/// meaningful and preserved for empty-input match listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
    pub subcommands: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            subcommands: Vec::new(),
        }
    }

    pub fn with_subcommands(
        mut self,
        subcommands: Vec<(impl Into<String>, impl Into<String>)>,
    ) -> Self {
        self.subcommands = subcommands
            .into_iter()
            .map(|(name, description)| (name.into(), description.into()))
            .collect();
        self
    }
}

/// Immutable command set, constructed once at startup and passed by
/// reference into the session.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<CommandSpec>,
}

impl CommandRegistry {
    pub fn new(commands: Vec<CommandSpec>) -> Self {
        Self { commands }
    }

    /// The command set served by the stock client.
    pub fn builtin() -> Self {
        Self::new(vec![
            CommandSpec::new(
                "status",
                "Show comprehensive status line with time, model, git info",
            ),
            CommandSpec::new("read", "Read file with syntax highlighting"),
            CommandSpec::new("write", "Write content to file with backup"),
            CommandSpec::new("edit", "Search and replace in file"),
            CommandSpec::new("ls", "List files with rich formatting"),
            CommandSpec::new("grep", "Search files with context"),
            CommandSpec::new("bash", "Execute shell command safely"),
            CommandSpec::new("task", "Task management (add/done/list/clear)").with_subcommands(
                vec![
                    ("add", "Add task to current list"),
                    ("done", "Mark task as completed"),
                    ("list", "Show all tasks"),
                    ("clear", "Clear completed tasks"),
                ],
            ),
            CommandSpec::new("search", "Web search"),
            CommandSpec::new("fetch", "Fetch web content"),
            CommandSpec::new("memory", "Memory management (history/projects/note/forget)")
                .with_subcommands(vec![
                    ("history", "Show recent conversation history"),
                    ("projects", "List remembered projects"),
                    ("note", "Add note about current project"),
                    ("forget", "Clear memory for project"),
                ]),
            CommandSpec::new("agent", "Specialized agent operations (list/help/stats/auto)")
                .with_subcommands(vec![
                    ("list", "Show all available specialized agents"),
                    ("help", "Detailed help for agent commands"),
                    ("stats", "Show agent usage statistics"),
                    ("auto", "Auto-route question to best agent"),
                ]),
            CommandSpec::new(
                "workflow",
                "Smart workflow management (list/help/history/suggest)",
            )
            .with_subcommands(vec![
                ("list", "Show all available smart workflows"),
                ("help", "Detailed help for workflow commands"),
                ("history", "Show workflow execution history"),
                ("suggest", "Get workflow recommendations"),
            ]),
            CommandSpec::new("model", "Model management (list/set/benchmark/costs/features)")
                .with_subcommands(vec![
                    ("list", "Show model variants and pricing"),
                    ("set", "Switch to specific model"),
                    ("benchmark", "Show performance comparisons"),
                    ("costs", "Show cost analysis"),
                    ("features", "Show feature comparisons"),
                ]),
        ])
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    pub fn find(&self, name: &str) -> Option<&CommandSpec> {
        self.commands
            .iter()
            .find(|command| command.name.eq_ignore_ascii_case(name))
    }

    /// Whether `name` exactly matches a registered top-level command.
    pub fn has_exact(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::CommandRegistry;

    #[test]
    fn builtin_registry_preserves_declaration_order() {
        let registry = CommandRegistry::builtin();
        let names: Vec<&str> = registry
            .commands()
            .iter()
            .map(|command| command.name.as_str())
            .collect();
        assert_eq!(names.first(), Some(&"status"));
        assert_eq!(names.last(), Some(&"model"));
        assert_eq!(names.len(), 14);
    }

    #[test]
    fn find_is_case_insensitive() {
        let registry = CommandRegistry::builtin();
        assert!(registry.find("TASK").is_some());
        assert!(registry.find("nope").is_none());
    }

    #[test]
    fn task_subcommands_are_ordered() {
        let registry = CommandRegistry::builtin();
        let task = registry.find("task").expect("task command registered");
        let subs: Vec<&str> = task
            .subcommands
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(subs, vec!["add", "done", "list", "clear"]);
    }
}
