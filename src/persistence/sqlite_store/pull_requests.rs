//! Pull request and attention state rows.

use diesel::Connection;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Bool, Nullable, Text};
use diesel::sqlite::SqliteConnection;

use crate::attention::AttentionAssessment;
use crate::persistence::PersistenceError;
use crate::persistence::model::{AttentionEntry, PullRequestRecord};

use super::{map_query_error, map_write_error, to_i64, to_u64};

#[derive(Debug, QueryableByName)]
struct IdRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
}

#[derive(Debug, QueryableByName)]
struct AttentionRow {
    #[diesel(sql_type = Text)]
    full_name: String,
    #[diesel(sql_type = BigInt)]
    number: i64,
    #[diesel(sql_type = Text)]
    title: String,
    #[diesel(sql_type = Text)]
    ci_state: String,
    #[diesel(sql_type = Text)]
    review_state: String,
    #[diesel(sql_type = BigInt)]
    final_score: i64,
    #[diesel(sql_type = Nullable<Text>)]
    reason: Option<String>,
    #[diesel(sql_type = Bool)]
    needs_attention: bool,
}

pub(super) fn upsert_with_attention(
    connection: &mut SqliteConnection,
    record: &PullRequestRecord,
    attention: &AttentionAssessment,
) -> Result<(), PersistenceError> {
    let flow_violation = record
        .flow_violation
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|error| PersistenceError::WriteFailed {
            message: format!("flow violation serialisation failed: {error}"),
        })?;
    let raw_payload = record.raw_payload.to_string();

    let result = connection.transaction::<_, diesel::result::Error, _>(|transaction| {
        write_pull_request(transaction, record, flow_violation.as_deref(), &raw_payload)?;

        let pull_request: IdRow = sql_query(
            "SELECT id FROM pull_requests WHERE repository_id = ? AND number = ? LIMIT 1;",
        )
        .bind::<BigInt, _>(record.repository_id)
        .bind::<BigInt, _>(to_i64(record.number))
        .get_result(transaction)?;

        write_attention(transaction, pull_request.id, attention)
    });

    result.map_err(|error| map_write_error(connection, &error))
}

fn write_pull_request(
    connection: &mut SqliteConnection,
    record: &PullRequestRecord,
    flow_violation: Option<&str>,
    raw_payload: &str,
) -> Result<(), diesel::result::Error> {
    sql_query(
        "INSERT INTO pull_requests \
         (repository_id, number, title, description, lifecycle, draft, author, ci_state, \
          review_state, additions, deletions, changed_files, comment_count, commit_count, \
          created_at, remote_updated_at, last_activity_at, head_ref, base_ref, flow_phase, \
          flow_violation, raw_payload) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(repository_id, number) DO UPDATE SET \
           title = excluded.title, \
           description = excluded.description, \
           lifecycle = excluded.lifecycle, \
           draft = excluded.draft, \
           author = excluded.author, \
           ci_state = excluded.ci_state, \
           review_state = excluded.review_state, \
           additions = excluded.additions, \
           deletions = excluded.deletions, \
           changed_files = excluded.changed_files, \
           comment_count = excluded.comment_count, \
           commit_count = excluded.commit_count, \
           created_at = excluded.created_at, \
           remote_updated_at = excluded.remote_updated_at, \
           last_activity_at = excluded.last_activity_at, \
           head_ref = excluded.head_ref, \
           base_ref = excluded.base_ref, \
           flow_phase = excluded.flow_phase, \
           flow_violation = excluded.flow_violation, \
           raw_payload = excluded.raw_payload, \
           synced_at = CURRENT_TIMESTAMP;",
    )
    .bind::<BigInt, _>(record.repository_id)
    .bind::<BigInt, _>(to_i64(record.number))
    .bind::<Text, _>(&record.title)
    .bind::<Nullable<Text>, _>(record.description.as_deref())
    .bind::<Text, _>(record.lifecycle.as_str())
    .bind::<Bool, _>(record.draft)
    .bind::<Nullable<Text>, _>(record.author.as_deref())
    .bind::<Text, _>(record.ci_state.as_str())
    .bind::<Text, _>(record.review_state.as_str())
    .bind::<BigInt, _>(to_i64(record.additions))
    .bind::<BigInt, _>(to_i64(record.deletions))
    .bind::<BigInt, _>(to_i64(record.changed_files))
    .bind::<BigInt, _>(to_i64(record.comment_count))
    .bind::<BigInt, _>(to_i64(record.commit_count))
    .bind::<Text, _>(record.created_at.to_rfc3339())
    .bind::<Text, _>(record.remote_updated_at.to_rfc3339())
    .bind::<Text, _>(record.last_activity_at.to_rfc3339())
    .bind::<Text, _>(&record.head_ref)
    .bind::<Text, _>(&record.base_ref)
    .bind::<Nullable<Text>, _>(record.flow_phase.as_deref())
    .bind::<Nullable<Text>, _>(flow_violation)
    .bind::<Text, _>(raw_payload)
    .execute(connection)
    .map(drop)
}

fn write_attention(
    connection: &mut SqliteConnection,
    pull_request_id: i64,
    attention: &AttentionAssessment,
) -> Result<(), diesel::result::Error> {
    let breakdown = &attention.breakdown;
    sql_query(
        "INSERT INTO attention_states \
         (pull_request_id, review_request_boost, assignee_boost, ci_penalty, staleness_boost, \
          mention_boost, size_boost, activity_boost, commit_boost, draft_penalty, \
          my_last_activity_penalty, final_score, reason, needs_attention) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(pull_request_id) DO UPDATE SET \
           review_request_boost = excluded.review_request_boost, \
           assignee_boost = excluded.assignee_boost, \
           ci_penalty = excluded.ci_penalty, \
           staleness_boost = excluded.staleness_boost, \
           mention_boost = excluded.mention_boost, \
           size_boost = excluded.size_boost, \
           activity_boost = excluded.activity_boost, \
           commit_boost = excluded.commit_boost, \
           draft_penalty = excluded.draft_penalty, \
           my_last_activity_penalty = excluded.my_last_activity_penalty, \
           final_score = excluded.final_score, \
           reason = excluded.reason, \
           needs_attention = excluded.needs_attention, \
           computed_at = CURRENT_TIMESTAMP;",
    )
    .bind::<BigInt, _>(pull_request_id)
    .bind::<BigInt, _>(breakdown.review_request_boost)
    .bind::<BigInt, _>(breakdown.assignee_boost)
    .bind::<BigInt, _>(breakdown.ci_penalty)
    .bind::<BigInt, _>(breakdown.staleness_boost)
    .bind::<BigInt, _>(breakdown.mention_boost)
    .bind::<BigInt, _>(breakdown.size_boost)
    .bind::<BigInt, _>(breakdown.activity_boost)
    .bind::<BigInt, _>(breakdown.commit_boost)
    .bind::<BigInt, _>(breakdown.draft_penalty)
    .bind::<BigInt, _>(breakdown.my_last_activity_penalty)
    .bind::<BigInt, _>(attention.final_score)
    .bind::<Nullable<Text>, _>(attention.reason.map(|reason| reason.as_str()))
    .bind::<Bool, _>(attention.needs_attention)
    .execute(connection)
    .map(drop)
}

pub(super) fn attention_entries(
    connection: &mut SqliteConnection,
    viewer_login: &str,
) -> Result<Vec<AttentionEntry>, PersistenceError> {
    let rows: Vec<AttentionRow> = sql_query(
        "SELECT r.full_name, p.number, p.title, p.ci_state, p.review_state, \
                a.final_score, a.reason, a.needs_attention \
         FROM pull_requests p \
         JOIN tracked_repositories r ON r.id = p.repository_id \
         JOIN attention_states a ON a.pull_request_id = p.id \
         WHERE r.viewer_login = ? AND r.tracked = 1 AND p.lifecycle = 'OPEN' \
         ORDER BY a.final_score DESC, r.full_name, p.number;",
    )
    .bind::<Text, _>(viewer_login)
    .load(connection)
    .map_err(|error| map_query_error(connection, &error))?;

    Ok(rows
        .into_iter()
        .map(|row| AttentionEntry {
            repository: row.full_name,
            number: to_u64(row.number),
            title: row.title,
            ci_state: row.ci_state,
            review_state: row.review_state,
            final_score: row.final_score,
            reason: row.reason,
            needs_attention: row.needs_attention,
        })
        .collect())
}
