use std::fmt;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::debug;

use crate::api::DiscourseApi;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub parent_category_id: Option<u64>,
}

/// A top-level category followed by its direct subcategories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup {
    pub category: Category,
    pub subcategories: Vec<Category>,
}

impl CategoryGroup {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.subcategories.len() + 1);
        lines.push(format_category(&self.category, ""));
        for sub in &self.subcategories {
            lines.push(format_category(sub, "  - "));
        }
        lines
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Success,
    HttpStatus(u16),
    Unreachable(String),
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "Connection successful."),
            Self::HttpStatus(status) => write!(f, "Connection failed with status code {status}."),
            Self::Unreachable(message) => write!(f, "Connection failed: {message}"),
        }
    }
}

pub fn list_categories<A: DiscourseApi>(api: &mut A) -> Result<Vec<CategoryGroup>> {
    let response = api.get_site()?;
    if !response.is_ok() {
        bail!("Discourse site request failed with HTTP {}", response.status);
    }
    let site: SitePayload = response.json().context("failed to decode site categories")?;
    debug!(count = site.categories.len(), "fetched site categories");
    Ok(group_categories(&site.categories))
}

/// Pair each parentless category with the categories naming it as parent.
/// Subcategories whose parent is missing from the list are not shown.
pub fn group_categories(categories: &[Category]) -> Vec<CategoryGroup> {
    categories
        .iter()
        .filter(|category| category.parent_category_id.is_none())
        .map(|parent| CategoryGroup {
            category: parent.clone(),
            subcategories: categories
                .iter()
                .filter(|sub| sub.parent_category_id == Some(parent.id))
                .cloned()
                .collect(),
        })
        .collect()
}

pub fn test_connection<A: DiscourseApi>(api: &mut A) -> ConnectionStatus {
    match api.get_site() {
        Ok(response) if response.is_ok() => ConnectionStatus::Success,
        Ok(response) => ConnectionStatus::HttpStatus(response.status),
        Err(error) => ConnectionStatus::Unreachable(format!("{error:#}")),
    }
}

fn format_category(category: &Category, indent: &str) -> String {
    format!("{indent}{}: {}", category.id, category.name)
}

#[derive(Debug, Deserialize)]
struct SitePayload {
    #[serde(default)]
    categories: Vec<Category>,
}
