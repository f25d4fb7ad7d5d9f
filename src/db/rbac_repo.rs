// src/db/rbac_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::rbac::{Permission, PermissionOverride, Role};

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Cargos
    // ---

    pub async fn create_role<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (tenant_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::UniqueConstraintViolation(
                        "Já existe um cargo com esse nome.".into(),
                    );
                }
            }
            e.into()
        })
    }

    pub async fn update_role<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        role_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles SET name = $3, description = $4, updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(role_id)
        .bind(name)
        .bind(description)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("cargo".into()))
    }

    pub async fn list_roles<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let roles =
            sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE tenant_id = $1 ORDER BY name")
                .bind(tenant_id)
                .fetch_all(executor)
                .await?;
        Ok(roles)
    }

    /// Quantos dos IDs recebidos são cargos DESTA loja. Usado para barrar
    /// vínculo de cargo de outra loja num funcionário.
    pub async fn count_tenant_roles<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE tenant_id = $1 AND id = ANY($2)")
                .bind(tenant_id)
                .bind(role_ids)
                .fetch_one(executor)
                .await?;
        Ok(count)
    }

    pub async fn delete_role<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        role_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM roles WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(role_id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("cargo".into()));
        }
        Ok(())
    }

    // ---
    // Catálogo de permissões
    // ---

    /// Buscar IDs das permissões baseado nos Slugs ("inventory:write" -> UUID)
    pub async fn find_permissions_by_slugs<'e, E>(
        &self,
        executor: E,
        slugs: &[String],
    ) -> Result<Vec<Permission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // O SQLx lida bem com arrays usando ANY
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, module, action, slug, description FROM permissions WHERE slug = ANY($1)",
        )
        .bind(slugs)
        .fetch_all(executor)
        .await?;
        Ok(permissions)
    }

    /// Listar todas as permissões disponíveis (para o Frontend montar a tela)
    pub async fn list_all_permissions(&self) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, module, action, slug, description FROM permissions ORDER BY module, slug",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    /// Vincular Cargo <-> Permissão (substitui o conjunto inteiro).
    /// Recebe a conexão da transação, pois são dois comandos que precisam
    /// ser atômicos.
    pub async fn set_role_permissions(
        &self,
        conn: &mut sqlx::PgConnection,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *conn)
            .await?;

        // Inserção em massa usando UNNEST para performance
        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission_ids)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn role_permission_slugs(&self, role_id: Uuid) -> Result<Vec<String>, AppError> {
        let slugs: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT p.slug FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = $1
            ORDER BY p.slug
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(slugs)
    }

    // ---
    // Usuário <-> Cargo
    // ---

    pub async fn set_user_roles(
        &self,
        conn: &mut sqlx::PgConnection,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_ids)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Slugs vindos de todos os cargos do usuário (sem exceções aplicadas)
    pub async fn role_slugs_for_user(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        let slugs: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT p.slug
            FROM user_roles ur
            JOIN role_permissions rp ON rp.role_id = ur.role_id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(slugs)
    }

    // ---
    // Exceções por usuário
    // ---

    pub async fn overrides_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PermissionOverride>, AppError> {
        let overrides = sqlx::query_as::<_, PermissionOverride>(
            r#"
            SELECT o.permission_id, p.slug, o.has_access
            FROM user_permission_overrides o
            JOIN permissions p ON p.id = o.permission_id
            WHERE o.user_id = $1
            ORDER BY p.slug
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(overrides)
    }

    pub async fn upsert_override<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        permission_id: Uuid,
        has_access: bool,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO user_permission_overrides (user_id, permission_id, has_access)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, permission_id) DO UPDATE SET has_access = $3
            "#,
        )
        .bind(user_id)
        .bind(permission_id)
        .bind(has_access)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// "Herdar do cargo": remove a exceção.
    pub async fn delete_override<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        permission_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "DELETE FROM user_permission_overrides WHERE user_id = $1 AND permission_id = $2",
        )
        .bind(user_id)
        .bind(permission_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Decisão de acesso no ponto de guarda: a exceção, se existir, SEMPRE
    /// vence; sem exceção, vale o que vier dos cargos.
    pub async fn user_has_permission(
        &self,
        user_id: Uuid,
        permission_slug: &str,
    ) -> Result<bool, AppError> {
        let override_access: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT o.has_access
            FROM user_permission_overrides o
            JOIN permissions p ON p.id = o.permission_id
            WHERE o.user_id = $1 AND p.slug = $2
            "#,
        )
        .bind(user_id)
        .bind(permission_slug)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(has_access) = override_access {
            return Ok(has_access);
        }

        let from_role: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM user_roles ur
                JOIN role_permissions rp ON rp.role_id = ur.role_id
                JOIN permissions p ON p.id = rp.permission_id
                WHERE ur.user_id = $1 AND p.slug = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(permission_slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(from_role.unwrap_or(false))
    }
}
