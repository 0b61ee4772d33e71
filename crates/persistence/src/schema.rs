//! Table definitions
//!
//! Mirrors the relational layout: calls, call_events, call_leads,
//! routing_decisions, agent_assignments, agents, agent_specializations,
//! misheard_corrections, voice_greetings, voice_prompts.

use sqlx::PgPool;

use crate::error::PersistenceError;

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS calls (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        call_sid VARCHAR(64) UNIQUE NOT NULL,
        from_number VARCHAR(20),
        to_number VARCHAR(20),
        caller_country CHAR(2),
        caller_state VARCHAR(50),
        caller_city VARCHAR(50),
        call_start TIMESTAMPTZ NOT NULL DEFAULT now(),
        call_end TIMESTAMPTZ,
        final_handler VARCHAR(10) CHECK (final_handler IN ('AI', 'HUMAN')),
        call_status VARCHAR(20),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS call_events (
        id BIGSERIAL PRIMARY KEY,
        call_id UUID REFERENCES calls(id),
        event_type VARCHAR(50) NOT NULL,
        event_payload JSONB,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_events_call_id ON call_events(call_id)",
    r#"
    CREATE TABLE IF NOT EXISTS call_leads (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        call_id UUID REFERENCES calls(id),
        call_sid VARCHAR(64) UNIQUE NOT NULL,
        page_context VARCHAR(20) NOT NULL DEFAULT 'home',
        selected_category VARCHAR(50),
        currency VARCHAR(3),
        preferred_language VARCHAR(10),
        user_type VARCHAR(20),
        customer_id VARCHAR(100),
        product_id VARCHAR(100),
        intent VARCHAR(20),
        assist_type VARCHAR(10),
        caller_name VARCHAR(100),
        caller_description TEXT,
        extra_metadata JSONB,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_call_leads_call_sid ON call_leads(call_sid)",
    r#"
    CREATE TABLE IF NOT EXISTS routing_decisions (
        id BIGSERIAL PRIMARY KEY,
        call_id UUID REFERENCES calls(id),
        caller_country CHAR(2),
        routing_rule VARCHAR(50),
        routed_to VARCHAR(200),
        decided_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_routing_call_id ON routing_decisions(call_id)",
    r#"
    CREATE TABLE IF NOT EXISTS agent_assignments (
        id BIGSERIAL PRIMARY KEY,
        call_id UUID REFERENCES calls(id),
        agent_id VARCHAR(50),
        agent_region VARCHAR(10),
        agent_type VARCHAR(20),
        assigned_at TIMESTAMPTZ,
        disconnected_at TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_agent_call_id ON agent_assignments(call_id)",
    r#"
    CREATE TABLE IF NOT EXISTS agents (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        phone_number VARCHAR(20) NOT NULL,
        region VARCHAR(10) NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        is_default BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_agents_region ON agents(region)",
    "CREATE INDEX IF NOT EXISTS idx_agents_active ON agents(is_active)",
    r#"
    CREATE TABLE IF NOT EXISTS agent_specializations (
        id BIGSERIAL PRIMARY KEY,
        agent_id BIGINT NOT NULL REFERENCES agents(id),
        category VARCHAR(50) NOT NULL,
        proficiency_level BIGINT NOT NULL DEFAULT 1,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (agent_id, category)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_spec_category ON agent_specializations(category)",
    r#"
    CREATE TABLE IF NOT EXISTS misheard_corrections (
        id BIGSERIAL PRIMARY KEY,
        wrong_word VARCHAR(50) NOT NULL,
        correct_word VARCHAR(50) NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS voice_greetings (
        id BIGSERIAL PRIMARY KEY,
        language VARCHAR(10) UNIQUE NOT NULL,
        message TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS voice_prompts (
        id BIGSERIAL PRIMARY KEY,
        key VARCHAR(50) UNIQUE NOT NULL,
        message TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

/// Create all tables if they do not exist.
pub async fn create_tables(pool: &PgPool) -> Result<(), PersistenceError> {
    for statement in TABLES {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
