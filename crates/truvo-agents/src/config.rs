//! Configuration projection for the voice worker.

use crate::{get_agent, AgentError};
use rusqlite::Connection;
use truvo_types::{Agent, AgentConfig, AgentDefaults};

/// Returns the configuration the voice worker should run `agent_id` with.
///
/// Never fails. A missing agent or a datastore error yields the fallback
/// configuration from `defaults`, so the worker can always start a session.
pub fn resolve_config(conn: &Connection, agent_id: &str, defaults: &AgentDefaults) -> AgentConfig {
    config_from_lookup(get_agent(conn, agent_id), defaults)
}

pub(crate) fn config_from_lookup(
    lookup: Result<Agent, AgentError>,
    defaults: &AgentDefaults,
) -> AgentConfig {
    match lookup {
        Ok(agent) => AgentConfig {
            system_prompt: agent.system_prompt,
            greeting: agent.greeting,
            voice_id: agent.voice_id,
            tools_enabled: agent.tools.unwrap_or_else(|| defaults.tools.clone()),
        },
        Err(AgentError::NotFound(id)) => {
            tracing::info!(agent_id = %id, "no agent record, serving fallback config");
            defaults.fallback_config()
        }
        Err(e) => {
            tracing::warn!(error = %e, "agent lookup failed, serving fallback config");
            defaults.fallback_config()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{fields, setup_db};
    use crate::create_agent;
    use truvo_types::ToolId;

    #[test]
    fn known_agent_config() {
        let conn = setup_db();
        let agent = create_agent(&conn, &fields("Leasing")).unwrap();

        let config = resolve_config(&conn, &agent.id, &AgentDefaults::default());
        assert_eq!(config.system_prompt, agent.system_prompt);
        assert_eq!(config.greeting, "Hello!");
        assert_eq!(config.tools_enabled, vec![ToolId::CheckAvailability]);
    }

    #[test]
    fn unknown_agent_gets_fallback() {
        let conn = setup_db();
        let defaults = AgentDefaults::default();

        let config = resolve_config(&conn, "nope", &defaults);
        assert_eq!(config, defaults.fallback_config());
        assert_eq!(config.voice_id, "21m00Tcm4TlvDq8ikWAM");
        assert_eq!(
            config.tools_enabled,
            vec![ToolId::CheckAvailability, ToolId::BookTour]
        );
    }

    #[test]
    fn null_tools_default_to_catalog_pair() {
        let conn = setup_db();
        let agent = create_agent(&conn, &fields("Legacy")).unwrap();
        conn.execute("UPDATE agents SET tools_json = NULL WHERE id = ?1", [&agent.id])
            .unwrap();

        let config = resolve_config(&conn, &agent.id, &AgentDefaults::default());
        assert_eq!(config.system_prompt, agent.system_prompt);
        assert_eq!(config.tools_enabled, ToolId::ALL.to_vec());
    }

    #[test]
    fn datastore_error_gets_fallback() {
        let conn = Connection::open_in_memory().unwrap();
        let defaults = AgentDefaults::default();

        // No schema: the lookup fails with a database error.
        assert_eq!(resolve_config(&conn, "any", &defaults), defaults.fallback_config());
    }
}
