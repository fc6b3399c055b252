//! Unit tests for GitHub identifiers.

use rstest::rstest;

use super::{GitHubError, PersonalAccessToken, PullRequestNumber, RepositoryLocator};

#[rstest]
#[case("octo/widgets", "octo", "widgets")]
#[case("  octo/widgets/ ", "octo", "widgets")]
fn parses_owner_and_name(#[case] input: &str, #[case] owner: &str, #[case] name: &str) {
    let locator = RepositoryLocator::parse(input).expect("should parse repository");
    assert_eq!(locator.owner().as_str(), owner, "owner mismatch");
    assert_eq!(locator.name().as_str(), name, "name mismatch");
    assert_eq!(locator.full_name(), format!("{owner}/{name}"));
}

#[rstest]
#[case("octo")]
#[case("octo/")]
#[case("/widgets")]
#[case("octo/widgets/extra")]
fn rejects_malformed_repository_names(#[case] input: &str) {
    let result = RepositoryLocator::parse(input);
    assert!(
        matches!(result, Err(GitHubError::InvalidRepository { .. })),
        "expected InvalidRepository for `{input}`, got {result:?}"
    );
}

#[rstest]
fn derives_request_paths() {
    let locator = RepositoryLocator::parse("octo/widgets").expect("should parse repository");
    let number = PullRequestNumber::new(9).expect("number should be valid");

    assert_eq!(locator.pulls_path(), "/repos/octo/widgets/pulls");
    assert_eq!(locator.reviews_path(number), "/repos/octo/widgets/pulls/9/reviews");
    assert_eq!(
        locator.issue_comments_path(number),
        "/repos/octo/widgets/issues/9/comments"
    );
    assert_eq!(
        locator.check_runs_path("abc"),
        "/repos/octo/widgets/commits/abc/check-runs"
    );
}

#[rstest]
fn rejects_zero_pull_request_number() {
    assert_eq!(
        PullRequestNumber::new(0),
        Err(GitHubError::InvalidPullRequestNumber)
    );
}

#[rstest]
fn token_is_trimmed_and_hidden_from_debug_output() {
    let token = PersonalAccessToken::new("  ghp_secret \n").expect("token should be valid");
    assert_eq!(token.value(), "ghp_secret");
    assert!(!format!("{token:?}").contains("ghp_secret"));
    assert_eq!(
        PersonalAccessToken::new("   "),
        Err(GitHubError::MissingToken)
    );
}
