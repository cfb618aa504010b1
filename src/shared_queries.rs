pub const SELECT_ONE_PING_ID_QUERY: &str = "SELECT id FROM ping_history LIMIT 1";
pub const INSERT_INTO_PING_HISTORY_QUERY: &str = r#"INSERT INTO ping_history
                (id, site_id, site_name, site_url, response_time, status, created_at)
                VALUES
                ($1, $2, $3, $4, $5, $6, $7)"#;
pub const SELECT_PING_HISTORY_SINCE_QUERY: &str = r#"
                SELECT id, site_id, site_name, site_url, response_time, status, created_at
                FROM ping_history
                WHERE created_at >= $1
                ORDER BY created_at ASC
                "#;
pub const SELECT_PING_HISTORY_SINCE_BY_SITE_QUERY: &str = r#"
                SELECT id, site_id, site_name, site_url, response_time, status, created_at
                FROM ping_history
                WHERE created_at >= $1 AND site_id = $2
                ORDER BY created_at ASC
                "#;
