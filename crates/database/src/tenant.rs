//! Tenant CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{NewTenant, Tenant};
use crate::validation::ValidationError;

/// Create a new tenant.
pub async fn create_tenant(pool: &SqlitePool, tenant: &NewTenant) -> Result<()> {
    if tenant.name.trim().is_empty() {
        return Err(ValidationError::Empty("tenant name").into());
    }
    if tenant.slug.trim().is_empty() {
        return Err(ValidationError::Empty("tenant slug").into());
    }

    sqlx::query(
        r#"
        INSERT INTO tenants (id, name, slug)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&tenant.id)
    .bind(&tenant.name)
    .bind(&tenant.slug)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::on_insert(e, "Tenant", &tenant.id))?;

    Ok(())
}

/// Get a tenant by ID.
pub async fn get_tenant(pool: &SqlitePool, id: &str) -> Result<Tenant> {
    sqlx::query_as::<_, Tenant>(
        r#"
        SELECT id, name, slug, plan, created_at, updated_at
        FROM tenants
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Tenant",
        id: id.to_string(),
    })
}

/// Get a tenant by its slug.
pub async fn get_tenant_by_slug(pool: &SqlitePool, slug: &str) -> Result<Tenant> {
    sqlx::query_as::<_, Tenant>(
        r#"
        SELECT id, name, slug, plan, created_at, updated_at
        FROM tenants
        WHERE slug = ?
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Tenant",
        id: slug.to_string(),
    })
}

/// Delete a tenant and, by cascade, its chatbots.
pub async fn delete_tenant(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM tenants WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Tenant",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Count all tenants.
pub async fn count_tenants(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
