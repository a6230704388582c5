use truvo_db::{create_pool, init_schema, schema_version, DbRuntimeSettings, SCHEMA_VERSION};

#[test]
fn file_database_is_initialized_once_across_pools() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("truvo.db");
    let path = path.to_str().unwrap();

    {
        let pool = create_pool(path, DbRuntimeSettings::default()).unwrap();
        let conn = pool.get().unwrap();
        assert!(init_schema(&conn).unwrap());
        conn.execute(
            "INSERT INTO agents (id, name, system_prompt, voice_id, greeting, created_at, updated_at)
             VALUES ('a1', 'n', 'p', 'v', 'g', 't', 't')",
            [],
        )
        .unwrap();
    }

    // A restart reopens the same file and finds the schema in place.
    let pool = create_pool(path, DbRuntimeSettings::default()).unwrap();
    let conn = pool.get().unwrap();
    assert!(!init_schema(&conn).unwrap());
    assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);

    let name: String = conn
        .query_row("SELECT name FROM agents WHERE id = 'a1'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(name, "n");
}
