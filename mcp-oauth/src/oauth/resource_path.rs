//! Project scope extraction for discovery requests
//!
//! A project can be selected with the `project_id` query parameter or with a
//! `mcp/{uuid}` suffix on the well-known path, e.g.
//! `/.well-known/oauth-authorization-server/mcp/6089f231-1ccb-4ab8-bba1-7e7a03893939`.
//!
//! A non-empty query value wins and the path suffix is then not inspected for
//! a project. The query value is echoed as supplied with one exception: `.`
//! and `..` are refused, since the value becomes a path segment of the
//! project scoped authorization server URL. Independently of the project, the
//! suffix is split into resource segments and empty or dot segments are
//! refused.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::error::ApiError;

/// Path prefix that carries a project identifier
pub const MCP_PATH_PREFIX: &str = "mcp";

static UUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    )
    .expect("UUID pattern is a valid regex")
});

/// Where a project identifier came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectScope {
    /// `project_id` query parameter, echoed as supplied
    Query(String),
    /// `mcp/{uuid}` path suffix, strictly validated
    Path(Uuid),
}

impl ProjectScope {
    pub fn is_path(&self) -> bool {
        matches!(self, ProjectScope::Path(_))
    }
}

impl fmt::Display for ProjectScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectScope::Query(raw) => f.write_str(raw),
            ProjectScope::Path(id) => write!(f, "{}", id.hyphenated()),
        }
    }
}

/// Parsed wildcard suffix of a well-known request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePath {
    /// Non-empty path segments after the well-known prefix
    pub segments: Vec<String>,
    pub project: Option<ProjectScope>,
}

impl ResourcePath {
    /// Parse the query parameter and wildcard suffix of a discovery request.
    ///
    /// Segment checks apply to the suffix even when the query parameter wins.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] for empty or dot segments inside
    /// the suffix, for a non-UUID remainder after `mcp/`, and for a query
    /// project id that cannot be a single path segment.
    pub fn parse(query_project_id: Option<&str>, wildcard_suffix: &str) -> Result<Self, ApiError> {
        let segments = split_suffix(wildcard_suffix)?;
        let project = extract_project_id(query_project_id, wildcard_suffix)?;
        Ok(Self { segments, project })
    }

    pub fn has_suffix(&self) -> bool {
        !self.segments.is_empty()
    }
}

/// Resolve the project identifier for a request.
///
/// A non-empty query parameter takes precedence and is used as supplied,
/// without looking at the suffix. Otherwise a `mcp/<rest>` suffix must carry
/// a UUID in `8-4-4-4-12` form.
///
/// # Errors
///
/// Returns [`ApiError::InvalidRequest`] for a query value of `.` or `..`, and
/// when no query value is given and the remainder after `mcp/` is non-empty
/// but not UUID shaped.
pub fn extract_project_id(
    query_param: Option<&str>,
    wildcard_suffix: &str,
) -> Result<Option<ProjectScope>, ApiError> {
    match query_param.filter(|value| !value.is_empty()) {
        Some("." | "..") => Err(ApiError::InvalidRequest("invalid project_id".to_string())),
        Some(raw) => Ok(Some(ProjectScope::Query(raw.to_string()))),
        None => Ok(project_from_suffix(wildcard_suffix)?.map(ProjectScope::Path)),
    }
}

fn project_from_suffix(wildcard_suffix: &str) -> Result<Option<Uuid>, ApiError> {
    let suffix = wildcard_suffix.trim_start_matches('/');
    let Some(rest) = suffix
        .strip_prefix(MCP_PATH_PREFIX)
        .and_then(|rest| rest.strip_prefix('/'))
    else {
        return Ok(None);
    };

    if rest.is_empty() {
        return Ok(None);
    }

    if !UUID_PATTERN.is_match(rest) {
        return Err(ApiError::InvalidRequest(
            "invalid project id in resource path".to_string(),
        ));
    }

    Uuid::parse_str(rest)
        .map(Some)
        .map_err(|_| ApiError::InvalidRequest("invalid project id in resource path".to_string()))
}

fn split_suffix(wildcard_suffix: &str) -> Result<Vec<String>, ApiError> {
    let trimmed = wildcard_suffix.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    trimmed
        .split('/')
        .map(|segment| match segment {
            "" | "." | ".." => Err(ApiError::InvalidRequest(
                "invalid resource path".to_string(),
            )),
            segment => Ok(segment.to_string()),
        })
        .collect()
}
