use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use half::f16;
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params, params_from_iter};
use tracing::{debug, info};

use super::{
    ApprovalState, CacheStatistics, CachedQuestion, CachedQuestionId, ChatType, CorrectionSource,
    Feedback, Interaction, InteractionId, Metadata, MonotonicClock, NewCachedQuestion,
    NewInteraction, QuestionStore, Resolution, StoreError, StoreResult, TopQuestion,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cached_questions (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    question_text     TEXT    NOT NULL,
    fingerprint       TEXT    NOT NULL,
    answer            TEXT    NOT NULL,
    embedding         BLOB,
    image_hash        TEXT,
    times_used        INTEGER NOT NULL DEFAULT 1,
    last_used         INTEGER NOT NULL,
    created_at        INTEGER NOT NULL,
    is_corrected      INTEGER NOT NULL DEFAULT 0,
    corrected_at      INTEGER,
    correction_source TEXT,
    metadata          TEXT    NOT NULL DEFAULT '{}'
);
CREATE INDEX IF NOT EXISTS idx_cached_questions_image_hash ON cached_questions(image_hash);
CREATE INDEX IF NOT EXISTS idx_cached_questions_fingerprint ON cached_questions(fingerprint);
CREATE INDEX IF NOT EXISTS idx_cached_questions_last_used ON cached_questions(last_used);

CREATE TABLE IF NOT EXISTS interactions (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id            INTEGER NOT NULL,
    created_at         INTEGER NOT NULL,
    user_input         TEXT    NOT NULL,
    bot_response       TEXT    NOT NULL,
    is_corrected       INTEGER NOT NULL DEFAULT 0,
    corrected_text     TEXT,
    user_feedback      INTEGER NOT NULL DEFAULT 0,
    chat_type          TEXT    NOT NULL,
    image_path         TEXT,
    cached_question_id INTEGER,
    cache_link_severed INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_interactions_cached_question ON interactions(cached_question_id);
"#;

const QUESTION_COLUMNS: &str = "id, question_text, fingerprint, answer, embedding, image_hash, \
     times_used, last_used, created_at, is_corrected, corrected_at, correction_source, metadata";

const INTERACTION_COLUMNS: &str = "id, user_id, created_at, user_input, bot_response, \
     is_corrected, corrected_text, user_feedback, chat_type, image_path, cached_question_id, \
     cache_link_severed";

/// Durable [`QuestionStore`] on a single SQLite connection.
///
/// Statements run on the blocking pool; the connection mutex serializes them,
/// so each trait call observes and produces a consistent snapshot.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    clock: Arc<MonotonicClock>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        let store = Self::init(conn, Some(path.to_path_buf()))?;
        info!(path = %path.display(), "Opened SQLite question store");
        Ok(store)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            clock: Arc::new(MonotonicClock::default()),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Rewrites an entry's `last_used`. Only for tests exercising stale purges.
    #[cfg(any(test, feature = "mock"))]
    pub fn set_last_used(&self, id: CachedQuestionId, last_used: DateTime<Utc>) -> StoreResult<()> {
        let changed = self.conn.lock().execute(
            "UPDATE cached_questions SET last_used = ?1 WHERE id = ?2",
            params![last_used.timestamp_micros(), id],
        )?;
        if changed == 0 {
            return Err(StoreError::cached_question(id));
        }
        Ok(())
    }

    async fn run<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, DateTime<Utc>) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let now = self.clock.now();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard, now)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 2);
    for &value in vector {
        bytes.extend_from_slice(&f16::from_f32(value).to_le_bytes());
    }
    bytes
}

fn decode_embedding(bytes: &[u8]) -> StoreResult<Vec<f32>> {
    if bytes.len() % 2 != 0 {
        return Err(StoreError::Corrupt {
            column: "embedding",
            reason: format!("odd byte length {}", bytes.len()),
        });
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| f16::from_le_bytes([pair[0], pair[1]]).to_f32())
        .collect())
}

fn timestamp(column: &'static str, micros: i64) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| StoreError::Corrupt {
        column,
        reason: format!("timestamp {micros} out of range"),
    })
}

/// Row image of `cached_questions` before decoding.
struct QuestionRow {
    id: i64,
    question_text: String,
    fingerprint: String,
    answer: String,
    embedding: Option<Vec<u8>>,
    image_hash: Option<String>,
    times_used: i64,
    last_used: i64,
    created_at: i64,
    is_corrected: bool,
    corrected_at: Option<i64>,
    correction_source: Option<String>,
    metadata: String,
}

impl QuestionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            question_text: row.get(1)?,
            fingerprint: row.get(2)?,
            answer: row.get(3)?,
            embedding: row.get(4)?,
            image_hash: row.get(5)?,
            times_used: row.get(6)?,
            last_used: row.get(7)?,
            created_at: row.get(8)?,
            is_corrected: row.get(9)?,
            corrected_at: row.get(10)?,
            correction_source: row.get(11)?,
            metadata: row.get(12)?,
        })
    }

    fn decode(self) -> StoreResult<CachedQuestion> {
        let approval = if self.is_corrected {
            let source = self
                .correction_source
                .as_deref()
                .unwrap_or_default()
                .parse::<CorrectionSource>()
                .map_err(|reason| StoreError::Corrupt {
                    column: "correction_source",
                    reason,
                })?;
            let corrected_at = match self.corrected_at {
                Some(micros) => timestamp("corrected_at", micros)?,
                None => timestamp("last_used", self.last_used)?,
            };
            ApprovalState::Approved {
                corrected_at,
                source,
            }
        } else {
            ApprovalState::Pending
        };

        let metadata: Metadata =
            serde_json::from_str(&self.metadata).map_err(|e| StoreError::Corrupt {
                column: "metadata",
                reason: e.to_string(),
            })?;

        Ok(CachedQuestion {
            id: self.id,
            question_text: self.question_text,
            fingerprint: self.fingerprint,
            answer: self.answer,
            embedding: self.embedding.as_deref().map(decode_embedding).transpose()?,
            image_hash: self.image_hash,
            times_used: self.times_used,
            last_used: timestamp("last_used", self.last_used)?,
            created_at: timestamp("created_at", self.created_at)?,
            approval,
            metadata,
        })
    }
}

struct InteractionRow {
    id: i64,
    user_id: i64,
    created_at: i64,
    user_input: String,
    bot_response: String,
    is_corrected: bool,
    corrected_text: Option<String>,
    user_feedback: i64,
    chat_type: String,
    image_path: Option<String>,
    cached_question_id: Option<i64>,
    cache_link_severed: bool,
}

impl InteractionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            created_at: row.get(2)?,
            user_input: row.get(3)?,
            bot_response: row.get(4)?,
            is_corrected: row.get(5)?,
            corrected_text: row.get(6)?,
            user_feedback: row.get(7)?,
            chat_type: row.get(8)?,
            image_path: row.get(9)?,
            cached_question_id: row.get(10)?,
            cache_link_severed: row.get(11)?,
        })
    }

    fn decode(self) -> StoreResult<Interaction> {
        let chat_type = self
            .chat_type
            .parse::<ChatType>()
            .map_err(|reason| StoreError::Corrupt {
                column: "chat_type",
                reason,
            })?;
        Ok(Interaction {
            id: self.id,
            user_id: self.user_id,
            created_at: timestamp("created_at", self.created_at)?,
            user_input: self.user_input,
            bot_response: self.bot_response,
            is_corrected: self.is_corrected,
            corrected_text: self.corrected_text,
            feedback: Feedback::from_i64(self.user_feedback),
            chat_type,
            image_path: self.image_path,
            cached_question_id: self.cached_question_id,
            cache_link_severed: self.cache_link_severed,
        })
    }
}

fn query_questions(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Vec<CachedQuestion>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, QuestionRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(QuestionRow::decode).collect()
}

fn query_interactions(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Vec<Interaction>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, InteractionRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(InteractionRow::decode).collect()
}

fn insert_question(
    conn: &Connection,
    entry: &NewCachedQuestion,
    now: DateTime<Utc>,
) -> StoreResult<CachedQuestionId> {
    let metadata = serde_json::to_string(&entry.metadata).map_err(|e| StoreError::Corrupt {
        column: "metadata",
        reason: e.to_string(),
    })?;
    let now_micros = now.timestamp_micros();
    conn.execute(
        "INSERT INTO cached_questions (question_text, fingerprint, answer, embedding, image_hash, \
         times_used, last_used, created_at, is_corrected, corrected_at, correction_source, metadata) \
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6, ?7, ?8, ?9, ?10)",
        params![
            entry.question_text,
            entry.fingerprint,
            entry.answer,
            entry.embedding.as_deref().map(encode_embedding),
            entry.image_hash,
            now_micros,
            entry.approval.is_approved(),
            entry.approval.corrected_at().map(|t| t.timestamp_micros()),
            entry.approval.source().map(|s| s.as_str()),
            metadata,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn approve(
    conn: &Connection,
    id: CachedQuestionId,
    answer: &str,
    source: CorrectionSource,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    let changed = conn.execute(
        "UPDATE cached_questions SET answer = ?1, is_corrected = 1, corrected_at = ?2, \
         correction_source = ?3 WHERE id = ?4",
        params![answer, now.timestamp_micros(), source.as_str(), id],
    )?;
    if changed == 0 {
        return Err(StoreError::cached_question(id));
    }
    Ok(())
}

/// Latest row matching `column = value`, bumped inside one transaction.
fn find_latest(
    conn: &Connection,
    column: &'static str,
    value: &str,
) -> StoreResult<Option<CachedQuestion>> {
    let sql = format!(
        "SELECT {QUESTION_COLUMNS} FROM cached_questions WHERE {column} = ?1 \
         ORDER BY last_used DESC, id DESC LIMIT 1"
    );
    conn.query_row(&sql, [value], QuestionRow::from_row)
        .optional()?
        .map(QuestionRow::decode)
        .transpose()
}

fn find_and_bump(
    conn: &mut Connection,
    column: &'static str,
    value: &str,
    now: DateTime<Utc>,
) -> StoreResult<Option<CachedQuestion>> {
    let tx = conn.transaction()?;
    let Some(mut entry) = find_latest(&tx, column, value)? else {
        return Ok(None);
    };
    tx.execute(
        "UPDATE cached_questions SET times_used = times_used + 1, last_used = ?1 WHERE id = ?2",
        params![now.timestamp_micros(), entry.id],
    )?;
    tx.commit()?;

    entry.times_used += 1;
    entry.last_used = now;
    Ok(Some(entry))
}

fn cascade_delete(tx: &Transaction<'_>, id: CachedQuestionId) -> StoreResult<Vec<InteractionId>> {
    let affected = {
        let mut stmt =
            tx.prepare("SELECT id FROM interactions WHERE cached_question_id = ?1 ORDER BY id")?;
        stmt.query_map([id], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
    };

    tx.execute(
        "UPDATE interactions SET cached_question_id = NULL, is_corrected = 0, \
         corrected_text = NULL, cache_link_severed = 1 WHERE cached_question_id = ?1",
        [id],
    )?;
    let deleted = tx.execute("DELETE FROM cached_questions WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(StoreError::cached_question(id));
    }
    Ok(affected)
}

impl QuestionStore for SqliteStore {
    async fn find_by_image_hash(&self, image_hash: &str) -> StoreResult<Option<CachedQuestion>> {
        let image_hash = image_hash.to_string();
        self.run(move |conn, now| find_and_bump(conn, "image_hash", &image_hash, now))
            .await
    }

    async fn find_by_fingerprint(&self, fingerprint: &str) -> StoreResult<Option<CachedQuestion>> {
        let fingerprint = fingerprint.to_string();
        self.run(move |conn, now| find_and_bump(conn, "fingerprint", &fingerprint, now))
            .await
    }

    async fn peek_by_image_hash(&self, image_hash: &str) -> StoreResult<Option<CachedQuestion>> {
        let image_hash = image_hash.to_string();
        self.run(move |conn, _| find_latest(conn, "image_hash", &image_hash))
            .await
    }

    async fn peek_by_fingerprint(&self, fingerprint: &str) -> StoreResult<Option<CachedQuestion>> {
        let fingerprint = fingerprint.to_string();
        self.run(move |conn, _| find_latest(conn, "fingerprint", &fingerprint))
            .await
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<CachedQuestion>> {
        self.list(limit, 0).await
    }

    async fn get(&self, id: CachedQuestionId) -> StoreResult<Option<CachedQuestion>> {
        self.run(move |conn, _| {
            let sql = format!("SELECT {QUESTION_COLUMNS} FROM cached_questions WHERE id = ?1");
            conn.query_row(&sql, [id], QuestionRow::from_row)
                .optional()?
                .map(QuestionRow::decode)
                .transpose()
        })
        .await
    }

    async fn list(&self, limit: usize, offset: usize) -> StoreResult<Vec<CachedQuestion>> {
        self.run(move |conn, _| {
            let sql = format!(
                "SELECT {QUESTION_COLUMNS} FROM cached_questions \
                 ORDER BY last_used DESC, id DESC LIMIT ?1 OFFSET ?2"
            );
            query_questions(conn, &sql, params![limit as i64, offset as i64])
        })
        .await
    }

    async fn insert(&self, entry: NewCachedQuestion) -> StoreResult<CachedQuestionId> {
        let id = self
            .run(move |conn, now| insert_question(conn, &entry, now))
            .await?;
        debug!(id, "Inserted cached question");
        Ok(id)
    }

    async fn record_hit(&self, id: CachedQuestionId) -> StoreResult<()> {
        self.run(move |conn, now| {
            let changed = conn.execute(
                "UPDATE cached_questions SET times_used = times_used + 1, last_used = ?1 \
                 WHERE id = ?2",
                params![now.timestamp_micros(), id],
            )?;
            if changed == 0 {
                return Err(StoreError::cached_question(id));
            }
            Ok(())
        })
        .await
    }

    async fn update_answer(
        &self,
        id: CachedQuestionId,
        answer: &str,
        source: CorrectionSource,
    ) -> StoreResult<()> {
        let answer = answer.to_string();
        self.run(move |conn, now| approve(conn, id, &answer, source, now))
            .await
    }

    async fn delete(&self, id: CachedQuestionId) -> StoreResult<Vec<InteractionId>> {
        self.run(move |conn, _| {
            let tx = conn.transaction()?;
            let affected = cascade_delete(&tx, id)?;
            tx.commit()?;
            Ok(affected)
        })
        .await
    }

    async fn purge_stale(
        &self,
        cutoff: DateTime<Utc>,
        min_usage: i64,
    ) -> StoreResult<Vec<CachedQuestionId>> {
        self.run(move |conn, _| {
            let tx = conn.transaction()?;
            let stale = {
                let mut stmt = tx.prepare(
                    "SELECT id FROM cached_questions WHERE last_used < ?1 AND times_used < ?2 \
                     ORDER BY id",
                )?;
                stmt.query_map(params![cutoff.timestamp_micros(), min_usage], |row| {
                    row.get::<_, i64>(0)
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?
            };
            for id in &stale {
                cascade_delete(&tx, *id)?;
            }
            tx.commit()?;
            Ok(stale)
        })
        .await
    }

    async fn statistics(&self, top_n: usize) -> StoreResult<CacheStatistics> {
        self.run(move |conn, _| {
            let (total_cached, total_hits, corrected_count) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(times_used), 0), COALESCE(SUM(is_corrected), 0) \
                 FROM cached_questions",
                [],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?)),
            )?;

            let mut stmt = conn.prepare(
                "SELECT question_text, times_used FROM cached_questions \
                 ORDER BY times_used DESC, id ASC LIMIT ?1",
            )?;
            let top_questions = stmt
                .query_map([top_n as i64], |row| {
                    Ok(TopQuestion {
                        question_text: row.get(0)?,
                        times_used: row.get(1)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(CacheStatistics::from_totals(
                total_cached,
                total_hits,
                corrected_count,
                top_questions,
            ))
        })
        .await
    }

    async fn insert_interaction(&self, interaction: NewInteraction) -> StoreResult<InteractionId> {
        self.run(move |conn, now| {
            let tx = conn.transaction()?;
            if let Some(cached_id) = interaction.cached_question_id {
                let exists = tx
                    .query_row(
                        "SELECT 1 FROM cached_questions WHERE id = ?1",
                        [cached_id],
                        |_| Ok(()),
                    )
                    .optional()?;
                if exists.is_none() {
                    return Err(StoreError::cached_question(cached_id));
                }
            }
            tx.execute(
                "INSERT INTO interactions (user_id, created_at, user_input, bot_response, \
                 chat_type, image_path, cached_question_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    interaction.user_id,
                    now.timestamp_micros(),
                    interaction.user_input,
                    interaction.bot_response,
                    interaction.chat_type.as_str(),
                    interaction.image_path,
                    interaction.cached_question_id,
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(id)
        })
        .await
    }

    async fn interaction(&self, id: InteractionId) -> StoreResult<Option<Interaction>> {
        self.run(move |conn, _| {
            let sql = format!("SELECT {INTERACTION_COLUMNS} FROM interactions WHERE id = ?1");
            conn.query_row(&sql, [id], InteractionRow::from_row)
                .optional()?
                .map(InteractionRow::decode)
                .transpose()
        })
        .await
    }

    async fn linked_interactions(&self, cached_id: CachedQuestionId) -> StoreResult<Vec<Interaction>> {
        self.run(move |conn, _| {
            let sql = format!(
                "SELECT {INTERACTION_COLUMNS} FROM interactions \
                 WHERE cached_question_id = ?1 ORDER BY id"
            );
            query_interactions(conn, &sql, [cached_id])
        })
        .await
    }

    async fn unapproved_interactions(&self, limit: usize) -> StoreResult<Vec<Interaction>> {
        self.run(move |conn, _| {
            let sql = format!(
                "SELECT {INTERACTION_COLUMNS} FROM interactions \
                 WHERE chat_type = ?1 AND is_corrected = 0 AND cached_question_id IS NULL \
                 ORDER BY created_at DESC, id DESC LIMIT ?2"
            );
            query_interactions(
                conn,
                &sql,
                params![ChatType::Scientific.as_str(), limit as i64],
            )
        })
        .await
    }

    async fn search_uncorrected(
        &self,
        terms: &[String],
        exclude: Option<InteractionId>,
        limit: usize,
    ) -> StoreResult<Vec<Interaction>> {
        let terms: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();
        self.run(move |conn, _| {
            let mut sql = format!(
                "SELECT {INTERACTION_COLUMNS} FROM interactions \
                 WHERE is_corrected = 0 AND user_feedback <= 0 AND id != ?1"
            );
            let mut values = vec![Value::Integer(exclude.unwrap_or(-1))];
            for term in terms {
                values.push(Value::Text(term));
                sql.push_str(&format!(" AND instr(lower(user_input), ?{}) > 0", values.len()));
            }
            values.push(Value::Integer(limit as i64));
            sql.push_str(&format!(
                " ORDER BY created_at DESC, id DESC LIMIT ?{}",
                values.len()
            ));
            query_interactions(conn, &sql, params_from_iter(values))
        })
        .await
    }

    async fn set_feedback(&self, id: InteractionId, feedback: Feedback) -> StoreResult<()> {
        self.run(move |conn, _| {
            let changed = conn.execute(
                "UPDATE interactions SET user_feedback = ?1 WHERE id = ?2",
                params![feedback.as_i64(), id],
            )?;
            if changed == 0 {
                return Err(StoreError::interaction(id));
            }
            Ok(())
        })
        .await
    }

    async fn resolve_interaction(
        &self,
        id: InteractionId,
        resolution: Resolution,
    ) -> StoreResult<CachedQuestionId> {
        self.run(move |conn, now| {
            let tx = conn.transaction()?;
            let link: Option<CachedQuestionId> = tx
                .query_row(
                    "SELECT cached_question_id FROM interactions WHERE id = ?1",
                    [id],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| StoreError::interaction(id))?;

            let cached_id = match link {
                Some(cached_id) => {
                    approve(&tx, cached_id, &resolution.answer, resolution.source, now)?;
                    cached_id
                }
                None => {
                    let entry = resolution.new_entry.as_ref().ok_or(StoreError::Unlinked { id })?;
                    insert_question(&tx, entry, now)?
                }
            };

            tx.execute(
                "UPDATE interactions SET is_corrected = 1, corrected_text = ?1, user_feedback = ?2, \
                 cached_question_id = ?3, cache_link_severed = 0 WHERE id = ?4",
                params![resolution.answer, resolution.feedback.as_i64(), cached_id, id],
            )?;
            tx.commit()?;
            Ok(cached_id)
        })
        .await
    }

    async fn delete_interaction(&self, id: InteractionId) -> StoreResult<()> {
        self.run(move |conn, _| {
            let deleted = conn.execute("DELETE FROM interactions WHERE id = ?1", [id])?;
            if deleted == 0 {
                return Err(StoreError::interaction(id));
            }
            Ok(())
        })
        .await
    }
}
