use std::env;

const DEFAULT_PG_DSN: &str = "postgres://postgres@localhost:5432/shared_canvas_notes";
const DEFAULT_DB_NAME: &str = "shared_canvas_notes";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:8080,http://127.0.0.1:8080";

#[derive(Debug, Clone)]
pub struct Config {
    pub pg_dsn: String,
    pub db_name: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let pg_dsn = env::var("PG_DSN").unwrap_or_else(|_| DEFAULT_PG_DSN.to_owned());
        let db_name = env::var("NOTES_DB_NAME").unwrap_or_else(|_| DEFAULT_DB_NAME.to_owned());

        let port = env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let allowed_origins = parse_origins(
            &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_owned()),
        );

        Self {
            pg_dsn,
            db_name,
            port,
            allowed_origins,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_owned)
        .collect()
}
