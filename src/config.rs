use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Context};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow!("unknown STORE_BACKEND '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
}

impl FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(anyhow!("unknown LLM_PROVIDER '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub run_migrations: bool,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: Option<String>,
    pub jwt_audience: String,

    pub audio_bucket: String,
    pub max_audio_bytes: usize,

    pub llm_provider: LlmProvider,
    pub openai_api_key: String,
    pub openai_model: String,
    pub anthropic_api_key: String,
    pub anthropic_model: String,
    pub reflection_max_tokens: u32,
    pub reflection_temperature: f32,
    pub reflection_timeout_secs: u64,

    /// Register/login attempts allowed per client IP and route per window.
    pub auth_max_attempts: u32,
    pub auth_window_secs: u64,

    pub cron_secret: Option<String>,
    pub reflection_worker_enabled: bool,
    pub reflection_sweep_hour_utc: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let store_backend: StoreBackend = or("STORE_BACKEND", "postgres").parse()?;
        let database_url = get("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set"));
        }

        let supabase_url = get("SUPABASE_URL")
            .ok_or_else(|| anyhow!("SUPABASE_URL must be set"))?
            .trim_end_matches('/')
            .to_string();
        let supabase_service_role_key = get("SUPABASE_SERVICE_ROLE_KEY")
            .ok_or_else(|| anyhow!("SUPABASE_SERVICE_ROLE_KEY must be set"))?;
        let supabase_anon_key =
            get("SUPABASE_ANON_KEY").unwrap_or_else(|| supabase_service_role_key.clone());

        let reflection_sweep_hour_utc: u32 =
            parse(&or("REFLECTION_SWEEP_HOUR_UTC", "5"), "REFLECTION_SWEEP_HOUR_UTC")?;
        if reflection_sweep_hour_utc > 23 {
            return Err(anyhow!("REFLECTION_SWEEP_HOUR_UTC must be between 0 and 23"));
        }

        let reflection_timeout_secs: u64 =
            parse(&or("REFLECTION_TIMEOUT_SECS", "30"), "REFLECTION_TIMEOUT_SECS")?;
        if reflection_timeout_secs == 0 {
            return Err(anyhow!("REFLECTION_TIMEOUT_SECS must be at least 1"));
        }

        let auth_max_attempts: u32 = parse(&or("AUTH_MAX_ATTEMPTS", "5"), "AUTH_MAX_ATTEMPTS")?;
        let auth_window_secs: u64 = parse(&or("AUTH_WINDOW_SECS", "60"), "AUTH_WINDOW_SECS")?;
        if auth_max_attempts == 0 || auth_window_secs == 0 {
            return Err(anyhow!("AUTH_MAX_ATTEMPTS and AUTH_WINDOW_SECS must be at least 1"));
        }

        Ok(Self {
            store_backend,
            database_url,
            run_migrations: parse(&or("RUN_MIGRATIONS", "true"), "RUN_MIGRATIONS")?,
            host: or("HOST", "0.0.0.0"),
            port: parse(&or("PORT", "8001"), "PORT")?,
            frontend_url: or("FRONTEND_URL", "http://localhost:3000"),
            cors_extra_origins: get("CORS_EXTRA_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            supabase_url,
            supabase_anon_key,
            supabase_service_role_key,
            supabase_jwt_secret: get("SUPABASE_JWT_SECRET"),
            jwt_audience: or("JWT_AUDIENCE", "authenticated"),

            audio_bucket: or("AUDIO_BUCKET", "audio-journal"),
            max_audio_bytes: parse(&or("MAX_AUDIO_BYTES", "10485760"), "MAX_AUDIO_BYTES")?,

            llm_provider: or("LLM_PROVIDER", "openai").parse()?,
            openai_api_key: or("OPENAI_API_KEY", ""),
            openai_model: or("OPENAI_MODEL", "gpt-4o-mini"),
            anthropic_api_key: or("ANTHROPIC_API_KEY", ""),
            anthropic_model: or("ANTHROPIC_MODEL", "claude-3-5-haiku-latest"),
            reflection_max_tokens: parse(
                &or("REFLECTION_MAX_TOKENS", "100"),
                "REFLECTION_MAX_TOKENS",
            )?,
            reflection_temperature: parse(
                &or("REFLECTION_TEMPERATURE", "0.7"),
                "REFLECTION_TEMPERATURE",
            )?,
            reflection_timeout_secs,

            auth_max_attempts,
            auth_window_secs,

            cron_secret: get("CRON_SECRET"),
            reflection_worker_enabled: parse(
                &or("REFLECTION_WORKER_ENABLED", "true"),
                "REFLECTION_WORKER_ENABLED",
            )?,
            reflection_sweep_hour_utc,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(raw: &str, key: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{} has an invalid value '{}'", key, raw))
}
