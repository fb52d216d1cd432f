//! Core application

use std::fs;
use std::io::Read;

use anyhow::{Context, Result};
use serde_json::{Value, json};

use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG, RESOLVER_COMPILE, RESOLVER_RELATIONS};
use crate::data::query::{EntityRef, SelectQuery, generate_query};
use crate::data::request::{QueryRequest, parse_request};
use crate::data::schema::{StaticCatalog, resolve_relations};
use crate::domain::metrics::{InMemoryMetrics, MetricsSink, ResolverKind, track};
use crate::utils::file::expand_path;
use crate::utils::string::to_snake_case;

pub struct CoreApp {
    pub config: AppConfig,
    pub catalog: StaticCatalog,
    pub metrics: Option<InMemoryMetrics>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config)?;
        let output = app.execute(&command)?;
        println!("{}", serde_json::to_string_pretty(&output)?);

        if let Some(metrics) = &app.metrics {
            eprint!("{}", metrics.render_text());
        }
        Ok(())
    }

    fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let schema_path = config.require_schema_path()?;
        let catalog = StaticCatalog::load(schema_path)
            .with_context(|| format!("Failed to load schema catalog: {}", schema_path.display()))?;
        Ok(Self::new(config, catalog))
    }

    pub fn new(config: AppConfig, catalog: StaticCatalog) -> Self {
        let metrics = config.metrics_enabled.then(InMemoryMetrics::new);
        Self {
            config,
            catalog,
            metrics,
        }
    }

    /// Run one command and return its JSON output
    pub fn execute(&self, command: &Commands) -> Result<Value> {
        match command {
            Commands::Compile {
                entity,
                alias,
                request,
                positional,
            } => track(self.sink(), RESOLVER_COMPILE, ResolverKind::Query, || {
                let request = read_request(request)?;
                self.compile(
                    entity,
                    alias.as_deref(),
                    &request,
                    *positional || self.config.positional,
                )
            }),
            Commands::Relations { entity } => {
                track(self.sink(), RESOLVER_RELATIONS, ResolverKind::Query, || {
                    self.relations(entity)
                })
            }
        }
    }

    /// Compile `request` against `entity` and render it
    ///
    /// The output carries named placeholders and a parameter map, or with
    /// `positional` the backend's placeholders and an ordered bind list.
    pub fn compile(
        &self,
        entity: &str,
        alias: Option<&str>,
        request: &QueryRequest,
        positional: bool,
    ) -> Result<Value> {
        self.warn_unknown_entity(entity);
        let alias = alias.map_or_else(|| default_alias(entity), str::to_string);

        let mut query = SelectQuery::new(&self.catalog, entity, &alias);
        generate_query(
            Some(&mut query),
            &alias,
            request,
            Some(EntityRef::new(&self.catalog, entity)),
        )?;

        let dialect = self.config.backend.dialect();
        let output = if positional {
            let rendered = query.to_positional(dialect)?;
            json!({ "sql": rendered.sql, "binds": rendered.binds })
        } else {
            let sql = query.to_sql(dialect)?;
            let (_, parameters) = query.predicate();
            json!({ "sql": sql, "parameters": parameters })
        };

        tracing::debug!(entity, alias = %alias, backend = %self.config.backend, "Query compiled");
        Ok(output)
    }

    /// Relation map of `entity` as JSON
    pub fn relations(&self, entity: &str) -> Result<Value> {
        self.warn_unknown_entity(entity);
        let relations = resolve_relations(&self.catalog, entity);
        Ok(serde_json::to_value(&relations)?)
    }

    fn sink(&self) -> Option<&dyn MetricsSink> {
        self.metrics.as_ref().map(|m| m as &dyn MetricsSink)
    }

    fn warn_unknown_entity(&self, entity: &str) {
        if !self.catalog.entities.contains_key(entity) {
            tracing::warn!(entity, "Entity not found in schema catalog, treating as plain table");
        }
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}

/// Root alias used when none is given
///
/// The trailing `_` keeps entity names such as `User` clear of reserved
/// words (`user` is one in Postgres).
fn default_alias(entity: &str) -> String {
    format!("{}_", to_snake_case(entity))
}

/// Read and parse a request from a file, or stdin for `-`
fn read_request(source: &str) -> Result<QueryRequest> {
    let content = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        let path = expand_path(source);
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read request file: {}", path.display()))?
    };

    let request = parse_request(&content)
        .map_err(|e| anyhow::anyhow!("{} [{}]", e, e.code()))?;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::data::sql::Backend;

    const SCHEMA: &str = r#"{
        "entities": {
            "User": {
                "table": "users",
                "relations": [{"property": "posts", "target": "Post", "kind": "one_to_many"}]
            },
            "Post": {
                "table": "posts",
                "relations": [{"property": "author", "target": "User"}]
            }
        }
    }"#;

    fn app(backend: Backend, metrics: bool) -> CoreApp {
        let config = AppConfig {
            schema_path: None,
            backend,
            positional: false,
            metrics_enabled: metrics,
        };
        CoreApp::new(config, StaticCatalog::from_json(SCHEMA).unwrap())
    }

    fn write_request(dir: &TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("request.json");
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_compile_named() {
        let app = app(Backend::Postgres, false);
        let request = parse_request(
            r#"{"where": {"posts": {"title": {"ilike": "%rust%"}}}, "pagination": {"page": 1, "count": 20}}"#,
        )
        .unwrap();

        let out = app.compile("User", None, &request, false).unwrap();
        assert_eq!(
            out["sql"],
            "SELECT user_.* FROM users user_ \
             INNER JOIN posts posts ON posts.user_id = user_.id \
             WHERE (posts.title ILIKE :param0) LIMIT 20 OFFSET 0"
        );
        assert_eq!(out["parameters"]["param0"], "%rust%");
    }

    #[test]
    fn test_compile_positional_sqlite() {
        let app = app(Backend::Sqlite, false);
        let request = parse_request(r#"{"where": {"id": [1, 2]}, "order": {"id": "DESC"}}"#).unwrap();

        let out = app.compile("Post", Some("p"), &request, true).unwrap();
        assert_eq!(
            out["sql"],
            "SELECT p.* FROM posts p WHERE p.id IN (?, ?) ORDER BY p.id DESC"
        );
        assert_eq!(out["binds"], json!([1, 2]));
    }

    #[test]
    fn test_relations_output() {
        let app = app(Backend::Postgres, false);
        let out = app.relations("User").unwrap();
        assert_eq!(out, json!({"posts": {"author": {}}}));
    }

    #[test]
    fn test_execute_compile_from_file_records_metrics() {
        let dir = TempDir::new().unwrap();
        let path = write_request(&dir, r#"{"where": {"name": "a"}}"#);
        let app = app(Backend::Postgres, true);

        let command = Commands::Compile {
            entity: "User".into(),
            alias: None,
            request: path.to_string_lossy().into_owned(),
            positional: false,
        };
        let out = app.execute(&command).unwrap();
        assert_eq!(out["sql"], "SELECT user_.* FROM users user_ WHERE user_.name = :param0");

        let metrics = app.metrics.as_ref().unwrap();
        assert_eq!(metrics.counts(RESOLVER_COMPILE, ResolverKind::Query).successes, 1);
    }

    #[test]
    fn test_execute_invalid_request_counts_error() {
        let dir = TempDir::new().unwrap();
        let path = write_request(&dir, r#"{"pagination": {"page": 0, "count": 1}}"#);
        let app = app(Backend::Postgres, true);

        let command = Commands::Compile {
            entity: "User".into(),
            alias: None,
            request: path.to_string_lossy().into_owned(),
            positional: false,
        };
        let err = app.execute(&command).unwrap_err();
        assert!(err.to_string().contains("INVALID_PAGINATION"));

        let metrics = app.metrics.as_ref().unwrap();
        assert_eq!(metrics.counts(RESOLVER_COMPILE, ResolverKind::Query).errors, 1);
    }

    #[test]
    fn test_default_alias_avoids_reserved_words() {
        assert_eq!(default_alias("User"), "user_");
        assert_eq!(default_alias("BlogPost"), "blog_post_");
    }

    #[test]
    fn test_missing_request_file() {
        let err = read_request("/nonexistent/request.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read request file"));
    }
}
