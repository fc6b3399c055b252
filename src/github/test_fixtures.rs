//! Builders for hosting payloads shared by unit tests.

use chrono::{DateTime, Utc};
use serde_json::json;

use super::error::GitHubError;
use super::locator::PullRequestNumber;
use super::models::{IssueComment, PullRequestSnapshot, Review, ReviewVerdict};

/// Minimal open pull request payload as returned by the REST API.
pub(crate) fn pull_request_json(number: u64) -> serde_json::Value {
    json!({
        "number": number,
        "title": format!("Change {number}"),
        "body": null,
        "state": "open",
        "draft": false,
        "user": { "login": "hubot" },
        "head": { "ref": "feature/x", "sha": format!("sha-{number}") },
        "base": { "ref": "develop", "sha": "base" },
        "requested_reviewers": [],
        "requested_teams": [],
        "assignees": [],
        "additions": 10,
        "deletions": 5,
        "changed_files": 2,
        "comments": 1,
        "commits": 3,
        "mergeable": true,
        "mergeable_state": "clean",
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-02T00:00:00Z"
    })
}

/// Decoded form of [`pull_request_json`].
pub(crate) fn snapshot(number: u64) -> PullRequestSnapshot {
    PullRequestSnapshot::from_raw(pull_request_json(number)).expect("fixture should decode")
}

/// Listing entries for `numbers`, as the gateway returns them.
pub(crate) fn listed(numbers: &[u64]) -> Vec<Result<PullRequestNumber, GitHubError>> {
    numbers
        .iter()
        .map(|&number| PullRequestNumber::new(number))
        .collect()
}

/// Parses an RFC 3339 timestamp.
pub(crate) fn at(timestamp: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(timestamp)
        .expect("timestamp should parse")
        .with_timezone(&Utc)
}

pub(crate) fn review(author: &str, verdict: ReviewVerdict, submitted_at: &str) -> Review {
    Review {
        author: Some(author.to_owned()),
        verdict,
        submitted_at: Some(at(submitted_at)),
    }
}

pub(crate) fn comment(author: &str, body: &str, created_at: &str) -> IssueComment {
    IssueComment {
        author: Some(author.to_owned()),
        body: Some(body.to_owned()),
        created_at: at(created_at),
    }
}
