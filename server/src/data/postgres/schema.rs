//! Baseline schema for the report store
//!
//! Applied in one statement batch by the migration runner on a fresh
//! database.

/// Version the baseline installs
pub const SCHEMA_VERSION: i32 = 1;

/// Baseline DDL
pub const SCHEMA: &str = r#"
-- --- Schema version bookkeeping ---
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    checksum TEXT NOT NULL,
    execution_time_ms INTEGER,
    success BOOLEAN NOT NULL DEFAULT TRUE
);

-- --- Teams: created before sprints and issues for the FKs ---
CREATE TABLE IF NOT EXISTS teams (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE CHECK(length(name) >= 1 AND length(name) <= 100),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- --- Program increments ---
CREATE TABLE IF NOT EXISTS program_increments (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE CHECK(length(name) >= 1 AND length(name) <= 100),
    start_date DATE,
    end_date DATE,
    status TEXT NOT NULL DEFAULT 'planned' CHECK(status IN ('planned', 'active', 'closed'))
);

-- --- Sprints ---
CREATE TABLE IF NOT EXISTS sprints (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL CHECK(length(name) >= 1 AND length(name) <= 200),
    team_id BIGINT NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    pi_id BIGINT REFERENCES program_increments(id) ON DELETE SET NULL,
    start_date DATE,
    end_date DATE,
    state TEXT NOT NULL DEFAULT 'future' CHECK(state IN ('future', 'active', 'closed')),
    committed_points DOUBLE PRECISION,
    completed_points DOUBLE PRECISION,
    UNIQUE (team_id, name)
);

CREATE INDEX IF NOT EXISTS idx_sprints_team_state ON sprints(team_id, state);
CREATE INDEX IF NOT EXISTS idx_sprints_pi ON sprints(pi_id);

-- --- Issues ---
CREATE TABLE IF NOT EXISTS issues (
    id BIGSERIAL PRIMARY KEY,
    issue_key TEXT NOT NULL UNIQUE,
    summary TEXT,
    team_id BIGINT REFERENCES teams(id) ON DELETE CASCADE,
    sprint_id BIGINT REFERENCES sprints(id) ON DELETE SET NULL,
    pi_id BIGINT REFERENCES program_increments(id) ON DELETE SET NULL,
    issue_type TEXT NOT NULL DEFAULT 'story' CHECK(issue_type IN ('story', 'bug', 'task', 'epic')),
    status TEXT NOT NULL DEFAULT 'To Do',
    status_category TEXT NOT NULL DEFAULT 'todo' CHECK(status_category IN ('todo', 'in_progress', 'done')),
    story_points DOUBLE PRECISION,
    priority TEXT,
    blocked BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    resolved_at TIMESTAMPTZ,
    due_date DATE
);

CREATE INDEX IF NOT EXISTS idx_issues_team_category ON issues(team_id, status_category);
CREATE INDEX IF NOT EXISTS idx_issues_sprint ON issues(sprint_id);
CREATE INDEX IF NOT EXISTS idx_issues_resolved_at ON issues(resolved_at);
CREATE INDEX IF NOT EXISTS idx_issues_created_at ON issues(created_at);

-- --- Insights: analysis output, optionally scoped to a team ---
CREATE TABLE IF NOT EXISTS insights (
    id BIGSERIAL PRIMARY KEY,
    team_id BIGINT REFERENCES teams(id) ON DELETE CASCADE,
    category TEXT NOT NULL,
    severity TEXT NOT NULL DEFAULT 'info',
    title TEXT NOT NULL,
    body TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_insights_created_at ON insights(created_at);

-- --- Recommendations: follow-ups derived from insights ---
CREATE TABLE IF NOT EXISTS recommendations (
    id BIGSERIAL PRIMARY KEY,
    insight_id BIGINT REFERENCES insights(id) ON DELETE SET NULL,
    team_id BIGINT REFERENCES teams(id) ON DELETE CASCADE,
    status TEXT NOT NULL DEFAULT 'open' CHECK(status IN ('open', 'accepted', 'dismissed', 'done')),
    title TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_recommendations_status ON recommendations(status);

-- --- Transcripts: meeting records, volume metrics only ---
CREATE TABLE IF NOT EXISTS transcripts (
    id BIGSERIAL PRIMARY KEY,
    team_id BIGINT REFERENCES teams(id) ON DELETE CASCADE,
    meeting_type TEXT NOT NULL,
    occurred_at TIMESTAMPTZ NOT NULL,
    word_count INTEGER
);

CREATE INDEX IF NOT EXISTS idx_transcripts_occurred_at ON transcripts(occurred_at);

-- --- Report definitions: reconciled from the in-code catalog at startup ---
CREATE TABLE IF NOT EXISTS report_definitions (
    report_id TEXT PRIMARY KEY CHECK(length(report_id) >= 1 AND length(report_id) <= 100),
    report_name TEXT NOT NULL,
    chart_type TEXT NOT NULL,
    data_source TEXT NOT NULL,
    description TEXT,
    default_filters JSONB NOT NULL DEFAULT '{}',
    meta_schema JSONB NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::assertions_on_constants)]
    fn test_baseline_version_is_at_least_one() {
        assert!(SCHEMA_VERSION >= 1);
    }

    #[test]
    fn test_schema_creates_every_table() {
        let tables = [
            "schema_version",
            "schema_migrations",
            "teams",
            "program_increments",
            "sprints",
            "issues",
            "insights",
            "recommendations",
            "transcripts",
            "report_definitions",
        ];

        for table in tables {
            assert!(
                SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")),
                "table {table} missing from the baseline schema"
            );
        }
    }

    #[test]
    fn test_indexes_only_reference_schema_tables() {
        for line in SCHEMA.lines() {
            let Some(rest) = line.trim().strip_prefix("CREATE INDEX IF NOT EXISTS ") else {
                continue;
            };
            let Some((_, target)) = rest.split_once(" ON ") else {
                continue;
            };
            let table = target.split('(').next().unwrap_or_default().trim();
            assert!(
                SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")),
                "index on unknown table {table}"
            );
        }
    }
}
