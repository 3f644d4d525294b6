//! Ranked command matching for the autocomplete overlay.

use crate::core::commands::CommandRegistry;

/// Presentation cap for the overlay; `command_matches` itself is unbounded.
pub const MAX_VISIBLE_MATCHES: usize = 10;

/// One match: the full command string and its description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMatch {
    pub command: String,
    pub description: String,
}

impl CommandMatch {
    fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

/// Returns the commands matching `partial`, ranked.
///
/// Empty input lists every top-level command in declaration order. Input
/// without a space prefix-matches top-level names case-insensitively.
/// Input with a space splits into `(main, sub_partial)` and, when `main`
/// has subcommands, yields `"main sub"` entries for prefix-matching
/// subcommand names. An exact-equal match sorts first; the rest sort
/// alphabetically by full command string.
pub fn command_matches(registry: &CommandRegistry, partial: &str) -> Vec<CommandMatch> {
    if partial.is_empty() {
        return registry
            .commands()
            .iter()
            .map(|command| CommandMatch::new(command.name.clone(), command.description.clone()))
            .collect();
    }

    let partial_lower = partial.to_lowercase();
    let mut matches = Vec::new();

    match partial_lower.split_once(' ') {
        None => {
            for command in registry.commands() {
                if command.name.to_lowercase().starts_with(&partial_lower) {
                    matches.push(CommandMatch::new(
                        command.name.clone(),
                        command.description.clone(),
                    ));
                }
            }
        }
        Some((main, sub_partial)) => {
            let sub_partial = sub_partial.trim_start();
            if let Some(command) = registry.find(main) {
                for (sub_name, description) in &command.subcommands {
                    if sub_name.to_lowercase().starts_with(sub_partial) {
                        matches.push(CommandMatch::new(
                            format!("{} {}", command.name, sub_name),
                            description.clone(),
                        ));
                    }
                }
            }
        }
    }

    matches.sort_by(|a, b| {
        let a_exact = a.command.to_lowercase() == partial_lower;
        let b_exact = b.command.to_lowercase() == partial_lower;
        b_exact.cmp(&a_exact).then_with(|| a.command.cmp(&b.command))
    });

    matches
}

/// Splits a match list into the visible slice and the overflow count for
/// the `+N more` indicator.
pub fn visible_matches(matches: &[CommandMatch]) -> (&[CommandMatch], usize) {
    if matches.len() <= MAX_VISIBLE_MATCHES {
        (matches, 0)
    } else {
        (
            &matches[..MAX_VISIBLE_MATCHES],
            matches.len() - MAX_VISIBLE_MATCHES,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{command_matches, visible_matches, MAX_VISIBLE_MATCHES};
    use crate::core::commands::{CommandRegistry, CommandSpec};

    fn registry() -> CommandRegistry {
        CommandRegistry::builtin()
    }

    #[test]
    fn empty_input_lists_every_command_in_declaration_order() {
        let registry = registry();
        let matches = command_matches(&registry, "");
        let names: Vec<&str> = matches.iter().map(|m| m.command.as_str()).collect();
        let declared: Vec<&str> = registry
            .commands()
            .iter()
            .map(|command| command.name.as_str())
            .collect();
        assert_eq!(names, declared);
    }

    #[test]
    fn prefix_matching_is_case_insensitive() {
        let matches = command_matches(&registry(), "MO");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].command, "model");
    }

    #[test]
    fn best_suggestion_for_mo_is_model() {
        let matches = command_matches(&registry(), "mo");
        assert_eq!(matches.first().map(|m| m.command.as_str()), Some("model"));
    }

    #[test]
    fn every_result_starts_with_the_partial() {
        let registry = registry();
        for partial in ["s", "ta", "w", "me", "task l"] {
            for m in command_matches(&registry, partial) {
                assert!(
                    m.command.to_lowercase().starts_with(&partial.to_lowercase()),
                    "{:?} does not extend {:?}",
                    m.command,
                    partial
                );
            }
        }
    }

    #[test]
    fn exact_match_sorts_first() {
        let registry = CommandRegistry::new(vec![
            CommandSpec::new("searchall", "wider"),
            CommandSpec::new("search", "exact"),
        ]);
        let matches = command_matches(&registry, "search");
        assert_eq!(matches[0].command, "search");
        assert_eq!(matches[1].command, "searchall");
    }

    #[test]
    fn subcommand_partial_narrows_to_one() {
        let matches = command_matches(&registry(), "task d");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].command, "task done");
    }

    #[test]
    fn subcommand_split_lists_all_when_sub_partial_is_empty() {
        let matches = command_matches(&registry(), "task ");
        let names: Vec<&str> = matches.iter().map(|m| m.command.as_str()).collect();
        assert_eq!(names, vec!["task add", "task clear", "task done", "task list"]);
    }

    #[test]
    fn unknown_main_command_with_space_matches_nothing() {
        assert!(command_matches(&registry(), "bogus d").is_empty());
    }

    #[test]
    fn visible_matches_caps_and_counts_overflow() {
        let specs: Vec<_> = (0..MAX_VISIBLE_MATCHES + 3)
            .map(|i| CommandSpec::new(format!("cmd{i:02}"), "desc"))
            .collect();
        let registry = CommandRegistry::new(specs);
        let matches = command_matches(&registry, "cmd");
        let (visible, extra) = visible_matches(&matches);
        assert_eq!(visible.len(), MAX_VISIBLE_MATCHES);
        assert_eq!(extra, 3);

        let few = command_matches(&registry, "cmd00");
        let (visible, extra) = visible_matches(&few);
        assert_eq!(visible.len(), 1);
        assert_eq!(extra, 0);
    }
}
