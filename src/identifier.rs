use crate::blob::BlobService;
use anyhow::{anyhow, Result};
use dialoguer::Select;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// A parsed blob address in the form `[account/]container[/blob/name]`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlobIdentifier {
    pub account: Option<String>,
    pub container: Option<String>,
    pub blob: Option<String>,
}

impl BlobIdentifier {
    /// Parse an address. The first segment is taken as an account only when it
    /// names one of `known_accounts`, since container names and account names
    /// share the same alphabet. Everything after the container is the blob
    /// name, slashes included.
    pub fn parse(input: &str, known_accounts: &[String]) -> Self {
        let mut identifier = BlobIdentifier::default();
        let trimmed = input.trim_matches('/');
        if trimmed.is_empty() {
            return identifier;
        }

        let mut rest = trimmed;
        if let Some((first, remainder)) = rest.split_once('/') {
            if known_accounts.iter().any(|a| a == first) {
                identifier.account = Some(first.to_string());
                rest = remainder;
            }
        } else if known_accounts.iter().any(|a| a == rest) {
            identifier.account = Some(rest.to_string());
            return identifier;
        }

        match rest.split_once('/') {
            Some((container, blob)) => {
                identifier.container = Some(container.to_string());
                if !blob.is_empty() {
                    identifier.blob = Some(blob.to_string());
                }
            }
            None => identifier.container = Some(rest.to_string()),
        }
        identifier
    }

    /// Ask the user to pick a container when none was given.
    pub async fn complete_container_interactive(&mut self, service: &BlobService) -> Result<()> {
        if self.container.is_some() {
            return Ok(());
        }
        let containers = service.list_containers(None, None, None).await?;
        if containers.is_empty() {
            return Err(anyhow!("the account has no containers"));
        }
        let names: Vec<String> = containers.into_iter().map(|c| c.name).collect();
        if names.len() == 1 {
            println!("Using container: {}", names[0]);
            self.container = Some(names[0].clone());
        } else {
            let selection = Select::new()
                .with_prompt("Select container")
                .items(&names)
                .default(0)
                .interact()?;
            self.container = Some(names[selection].clone());
        }
        Ok(())
    }

    pub fn require_container(&self) -> Result<&str> {
        self.container
            .as_deref()
            .ok_or_else(|| anyhow!("a container name is required"))
    }

    pub fn require_blob(&self) -> Result<&str> {
        self.blob
            .as_deref()
            .ok_or_else(|| anyhow!("a blob name is required (container/blob)"))
    }

    pub fn to_display_string(&self) -> String {
        [&self.account, &self.container, &self.blob]
            .iter()
            .filter_map(|p| p.as_deref())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Candidates that fuzzily match `input`, best first.
pub fn suggest<'a>(input: &str, candidates: &'a [String]) -> Vec<&'a str> {
    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &str)> = candidates
        .iter()
        .filter_map(|c| matcher.fuzzy_match(c, input).map(|s| (s, c.as_str())))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, c)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accounts() -> Vec<String> {
        vec!["prod".to_string(), "staging".to_string()]
    }

    #[test]
    fn test_parse_with_account() {
        let id = BlobIdentifier::parse("prod/logs/2020/01/app.log", &accounts());
        assert_eq!(id.account.as_deref(), Some("prod"));
        assert_eq!(id.container.as_deref(), Some("logs"));
        assert_eq!(id.blob.as_deref(), Some("2020/01/app.log"));
    }

    #[test]
    fn test_parse_without_account() {
        let id = BlobIdentifier::parse("logs/app.log", &accounts());
        assert_eq!(id.account, None);
        assert_eq!(id.container.as_deref(), Some("logs"));
        assert_eq!(id.blob.as_deref(), Some("app.log"));
    }

    #[test]
    fn test_parse_container_only() {
        let id = BlobIdentifier::parse("logs/", &accounts());
        assert_eq!(id.container.as_deref(), Some("logs"));
        assert_eq!(id.blob, None);
        assert!(id.require_blob().is_err());

        let id = BlobIdentifier::parse("staging", &accounts());
        assert_eq!(id.account.as_deref(), Some("staging"));
        assert_eq!(id.container, None);
    }

    #[test]
    fn test_display_string() {
        let id = BlobIdentifier::parse("prod/logs/a/b", &accounts());
        assert_eq!(id.to_display_string(), "prod/logs/a/b");
    }

    #[test]
    fn test_suggest_orders_by_score() {
        let names = vec!["production".to_string(), "staging".to_string()];
        let hits = suggest("prd", &names);
        assert_eq!(hits.first().copied(), Some("production"));
    }
}
