use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::api::{DiscourseApi, NewTopic};
use crate::markdown::{extract_topic, read_markdown};

pub const IMPORT_TAG: &str = "import";
pub const DUPLICATE_SUFFIX: &str = " - Duplicate";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ImportReport {
    pub path: PathBuf,
    pub title: String,
    pub duplicate: bool,
    pub tagged: bool,
    pub response: Value,
}

/// Return `title` with [`DUPLICATE_SUFFIX`] appended when a topic with the same
/// title already exists. Odd search responses count as "no duplicate".
pub fn check_duplicate_title<A: DiscourseApi>(
    api: &mut A,
    title: &str,
    category_id: u64,
) -> Result<String> {
    debug!(title, category_id, "checking for duplicate topic");
    let response = api.search_by_title(title)?;
    if !response.is_ok() {
        debug!(status = response.status, "duplicate search returned non-200 status");
        return Ok(title.to_string());
    }

    match response.json::<SearchPayload>() {
        Ok(payload) if !payload.topics.is_empty() => {
            info!(title, matches = payload.topics.len(), "topic with same title exists");
            Ok(format!("{title}{DUPLICATE_SUFFIX}"))
        }
        Ok(_) => Ok(title.to_string()),
        Err(error) => {
            debug!(error = %error, "duplicate search returned non-JSON response");
            Ok(title.to_string())
        }
    }
}

/// Look up a tag by exact name. `None` when the tag is absent or the tag list
/// could not be read.
pub fn resolve_tag<A: DiscourseApi>(api: &mut A, name: &str) -> Result<Option<Tag>> {
    let response = api.list_tags()?;
    if !response.is_ok() {
        debug!(status = response.status, "tag list returned non-200 status");
        return Ok(None);
    }
    let payload = match response.json::<TagsPayload>() {
        Ok(payload) => payload,
        Err(error) => {
            debug!(error = %error, "tag list returned non-JSON response");
            return Ok(None);
        }
    };

    for item in payload.tags {
        if item.name.as_deref() == Some(name) {
            let id = match item.id {
                Some(Value::String(id)) => id,
                Some(Value::Number(id)) => id.to_string(),
                _ => name.to_string(),
            };
            return Ok(Some(Tag {
                id,
                name: name.to_string(),
            }));
        }
    }
    Ok(None)
}

/// Create a topic, tagged with [`IMPORT_TAG`] when the forum knows that tag.
/// Returns the decoded response body, or `Value::Null` when it was not JSON.
pub fn publish_topic<A: DiscourseApi>(
    api: &mut A,
    title: &str,
    content: &str,
    category_id: u64,
) -> Result<(Value, bool)> {
    let tags = match resolve_tag(api, IMPORT_TAG)? {
        Some(tag) => {
            debug!(tag_id = tag.id.as_str(), "tag '{IMPORT_TAG}' found, adding to topic");
            vec![tag.name]
        }
        None => {
            debug!("tag '{IMPORT_TAG}' not found, continuing without tagging");
            Vec::new()
        }
    };
    let tagged = !tags.is_empty();

    let topic = NewTopic {
        title: title.to_string(),
        raw: content.to_string(),
        category: category_id,
        tags,
    };
    let response = api.create_post(&topic)?;
    if !response.is_ok() {
        warn!(status = response.status, title, "Discourse did not accept the topic");
    }
    let body = match response.json::<Value>() {
        Ok(body) => body,
        Err(error) => {
            debug!(error = %error, "post response was not JSON");
            Value::Null
        }
    };
    Ok((body, tagged))
}

/// Import one Markdown file. `on_title` sees the final (possibly duplicate-marked)
/// title before anything is posted.
pub fn import_file<A, F>(
    api: &mut A,
    path: &Path,
    category_id: u64,
    on_title: &mut F,
) -> Result<ImportReport>
where
    A: DiscourseApi,
    F: FnMut(&str),
{
    let markdown = read_markdown(path)?;
    let extracted = extract_topic(&markdown);
    if !extracted.has_title() {
        warn!(path = %path.display(), "no heading found, posting with placeholder title");
    }
    let title = check_duplicate_title(api, &extracted.title, category_id)?;
    let duplicate = title != extracted.title;
    on_title(&title);

    let (response, tagged) = publish_topic(api, &title, &extracted.content, category_id)
        .with_context(|| format!("failed to publish {}", path.display()))?;
    info!(path = %path.display(), title = title.as_str(), "imported topic");

    Ok(ImportReport {
        path: path.to_path_buf(),
        title,
        duplicate,
        tagged,
        response,
    })
}

/// Import every `*.md` file directly inside `directory`. Stops at the first error.
pub fn import_directory<A, F>(
    api: &mut A,
    directory: &Path,
    category_id: u64,
    on_title: &mut F,
) -> Result<Vec<ImportReport>>
where
    A: DiscourseApi,
    F: FnMut(&str),
{
    let files = markdown_files(directory)?;
    debug!(directory = %directory.display(), count = files.len(), "importing directory");
    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        reports.push(import_file(api, &path, category_id, on_title)?);
    }
    Ok(reports)
}

/// Regular files directly under `directory` whose name ends in `.md`, in the
/// order the directory listing yields them.
pub fn markdown_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = entry.with_context(|| format!("failed to list {}", directory.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_markdown = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(".md"));
        if is_markdown {
            out.push(entry.into_path());
        }
    }
    Ok(out)
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    topics: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TagsPayload {
    #[serde(default)]
    tags: Vec<TagItem>,
}

#[derive(Debug, Deserialize)]
struct TagItem {
    id: Option<Value>,
    name: Option<String>,
}
