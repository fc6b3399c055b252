//! Viewer activity signals: who acted last, and how often the viewer is
//! mentioned.

use chrono::{DateTime, Utc};

use super::review::latest_submitted_review;
use crate::github::models::{IssueComment, Review};

/// Reports whether the viewer was the last person to act on a pull request.
///
/// The latest submitted review is compared against the latest issue comment;
/// the strictly newer one names the last actor and ties go to the comment.
/// `comments` is `None` when the comments could not be fetched, which always
/// yields `false`.
#[must_use]
pub fn viewer_has_last_activity(
    reviews: &[Review],
    comments: Option<&[IssueComment]>,
    viewer: &str,
) -> bool {
    let Some(comments) = comments else {
        return false;
    };

    let latest_review: Option<(DateTime<Utc>, Option<&str>)> = latest_submitted_review(reviews)
        .and_then(|review| {
            review
                .submitted_at
                .map(|at| (at, review.author.as_deref()))
        });
    let latest_comment = comments
        .iter()
        .max_by_key(|comment| comment.created_at)
        .map(|comment| (comment.created_at, comment.author.as_deref()));

    let last_actor = match (latest_review, latest_comment) {
        (Some((review_at, review_author)), Some((comment_at, comment_author))) => {
            if review_at > comment_at {
                review_author
            } else {
                comment_author
            }
        }
        (Some((_, author)), None) | (None, Some((_, author))) => author,
        (None, None) => None,
    };

    last_actor.is_some_and(|login| login.eq_ignore_ascii_case(viewer))
}

/// Counts the texts that mention `@viewer`, case-insensitively.
///
/// The description and each comment count at most once.
#[must_use]
pub fn count_mentions(description: Option<&str>, comments: &[IssueComment], viewer: &str) -> u32 {
    let texts = description
        .into_iter()
        .chain(comments.iter().filter_map(|comment| comment.body.as_deref()));

    let mut count: u32 = 0;
    for text in texts {
        if mentions(text, viewer) {
            count = count.saturating_add(1);
        }
    }
    count
}

fn mentions(text: &str, viewer: &str) -> bool {
    if viewer.is_empty() {
        return false;
    }
    text.split(|character: char| !(is_login_char(character) || character == '@'))
        .filter_map(|token| token.strip_prefix('@'))
        .any(|login| login.eq_ignore_ascii_case(viewer))
}

const fn is_login_char(character: char) -> bool {
    character.is_ascii_alphanumeric() || character == '-'
}
