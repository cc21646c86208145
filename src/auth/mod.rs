pub mod cron;
pub mod jwt;
pub mod middleware;
pub mod rate_limit;
