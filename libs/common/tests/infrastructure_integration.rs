//! Integration tests for the infrastructure components
//!
//! These tests verify that the PostgreSQL database and Redis cache are
//! properly configured and accessible. They need live backing services,
//! so they are ignored by default; run with `cargo test -- --ignored`
//! against a local stack.

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool},
};
use sqlx::Row;

#[tokio::test]
#[ignore = "requires a running postgres"]
async fn test_database_connectivity() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;
    let result: i32 = row.get("result");
    assert_eq!(result, 1, "PostgreSQL simple query test failed");

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running redis"]
async fn test_cache_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config)?;

    assert!(
        redis_pool.health_check().await?,
        "Redis health check failed"
    );

    let test_key = "gatekeeper_integration_test_key";
    let test_value = "gatekeeper_integration_test_value";

    redis_pool.set(test_key, test_value, Some(10)).await?;

    let retrieved_value = redis_pool.get(test_key).await?;
    assert_eq!(retrieved_value, Some(test_value.to_string()));

    redis_pool.delete(test_key).await?;

    let retrieved_value = redis_pool.get(test_key).await?;
    assert_eq!(retrieved_value, None, "Redis delete operation failed");

    Ok(())
}
