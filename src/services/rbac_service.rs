// src/services/rbac_service.rs

use std::collections::BTreeMap;

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RbacRepository,
    models::rbac::{
        CreateRolePayload, EffectivePermission, OverrideEntry, PermissionOverride,
        PermissionSource, RoleResponse,
    },
};

#[derive(Clone)]
pub struct RbacService {
    rbac_repo: RbacRepository,
}

/// Resolução pura da permissão efetiva: a união dos cargos dá a base, e a
/// exceção individual (quando existe) sempre vence.
/// Slugs só-de-exceção também aparecem na saída, inclusive os revogados,
/// para o painel mostrar a linha com a origem certa.
pub fn resolve_effective_permissions(
    role_slugs: &[String],
    overrides: &[PermissionOverride],
) -> Vec<EffectivePermission> {
    let mut resolved: BTreeMap<String, (bool, PermissionSource)> = BTreeMap::new();

    for slug in role_slugs {
        resolved.insert(slug.clone(), (true, PermissionSource::Role));
    }

    for o in overrides {
        let source = if o.has_access {
            PermissionSource::Granted
        } else {
            PermissionSource::Revoked
        };
        resolved.insert(o.slug.clone(), (o.has_access, source));
    }

    resolved
        .into_iter()
        .map(|(slug, (has_access, source))| EffectivePermission {
            slug,
            has_access,
            source,
        })
        .collect()
}

impl RbacService {
    pub fn new(rbac_repo: RbacRepository) -> Self {
        Self { rbac_repo }
    }

    pub async fn effective_permissions(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<EffectivePermission>, AppError> {
        let role_slugs = self.rbac_repo.role_slugs_for_user(user_id).await?;
        let overrides = self.rbac_repo.overrides_for_user(user_id).await?;
        Ok(resolve_effective_permissions(&role_slugs, &overrides))
    }

    /// Cria o cargo e liga as permissões na transação RLS de quem chama.
    pub async fn create_role(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        payload: &CreateRolePayload,
    ) -> Result<RoleResponse, AppError> {
        let permissions = self
            .rbac_repo
            .find_permissions_by_slugs(&mut *conn, &payload.permissions)
            .await?;

        if permissions.len() != payload.permissions.len() {
            return Err(AppError::BadRequest(
                "Um ou mais slugs de permissão são desconhecidos.".into(),
            ));
        }

        let role = self
            .rbac_repo
            .create_role(
                &mut *conn,
                tenant_id,
                &payload.name,
                payload.description.as_deref(),
            )
            .await?;

        let permission_ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();
        self.rbac_repo
            .set_role_permissions(&mut *conn, role.id, &permission_ids)
            .await?;

        Ok(RoleResponse {
            role,
            permissions: payload.permissions.clone(),
        })
    }

    pub async fn list_roles(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
    ) -> Result<Vec<RoleResponse>, AppError> {
        let roles = self.rbac_repo.list_roles(&mut *conn, tenant_id).await?;

        let mut responses = Vec::with_capacity(roles.len());
        for role in roles {
            let permissions = self.rbac_repo.role_permission_slugs(role.id).await?;
            responses.push(RoleResponse { role, permissions });
        }
        Ok(responses)
    }

    pub async fn update_role(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        role_id: Uuid,
        payload: &CreateRolePayload,
    ) -> Result<RoleResponse, AppError> {
        let permissions = self
            .rbac_repo
            .find_permissions_by_slugs(&mut *conn, &payload.permissions)
            .await?;

        if permissions.len() != payload.permissions.len() {
            return Err(AppError::BadRequest(
                "Um ou mais slugs de permissão são desconhecidos.".into(),
            ));
        }

        let role = self
            .rbac_repo
            .update_role(
                &mut *conn,
                tenant_id,
                role_id,
                &payload.name,
                payload.description.as_deref(),
            )
            .await?;

        let permission_ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();
        self.rbac_repo
            .set_role_permissions(&mut *conn, role.id, &permission_ids)
            .await?;

        Ok(RoleResponse {
            role,
            permissions: payload.permissions.clone(),
        })
    }

    pub async fn delete_role(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        role_id: Uuid,
    ) -> Result<(), AppError> {
        self.rbac_repo.delete_role(&mut *conn, tenant_id, role_id).await
    }

    /// Vincula cargos a um funcionário. Todos os IDs precisam ser cargos da
    /// loja do contexto; um ID de outra loja derruba o lote inteiro.
    pub async fn set_user_roles(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<(), AppError> {
        let known = self
            .rbac_repo
            .count_tenant_roles(&mut *conn, tenant_id, role_ids)
            .await?;
        if known != role_ids.len() as i64 {
            return Err(AppError::BadRequest(
                "Um ou mais cargos são desconhecidos.".into(),
            ));
        }

        self.rbac_repo
            .set_user_roles(&mut *conn, user_id, role_ids)
            .await?;
        Ok(())
    }

    /// Aplica o lote de exceções vindas do painel: hasAccess nulo remove a
    /// linha (volta a herdar do cargo).
    pub async fn set_overrides(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        entries: &[OverrideEntry],
    ) -> Result<(), AppError> {
        let slugs: Vec<String> = entries.iter().map(|e| e.permission.clone()).collect();
        let permissions = self
            .rbac_repo
            .find_permissions_by_slugs(&mut *conn, &slugs)
            .await?;

        if permissions.len() != entries.len() {
            return Err(AppError::BadRequest(
                "Um ou mais slugs de permissão são desconhecidos.".into(),
            ));
        }

        let by_slug: BTreeMap<&str, Uuid> = permissions
            .iter()
            .map(|p| (p.slug.as_str(), p.id))
            .collect();

        for entry in entries {
            // Checado acima que todos os slugs existem
            let Some(&permission_id) = by_slug.get(entry.permission.as_str()) else {
                continue;
            };
            match entry.has_access {
                Some(has_access) => {
                    self.rbac_repo
                        .upsert_override(&mut *conn, user_id, permission_id, has_access)
                        .await?;
                }
                None => {
                    self.rbac_repo
                        .delete_override(&mut *conn, user_id, permission_id)
                        .await?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn over(slug: &str, has_access: bool) -> PermissionOverride {
        PermissionOverride {
            permission_id: Uuid::new_v4(),
            slug: slug.into(),
            has_access,
        }
    }

    fn find<'a>(
        resolved: &'a [EffectivePermission],
        slug: &str,
    ) -> Option<&'a EffectivePermission> {
        resolved.iter().find(|p| p.slug == slug)
    }

    #[test]
    fn uniao_dos_cargos_vira_a_base() {
        let roles = vec!["inventory:read".to_string(), "sales:read".to_string()];
        let resolved = resolve_effective_permissions(&roles, &[]);

        assert_eq!(resolved.len(), 2);
        for p in &resolved {
            assert!(p.has_access);
            assert_eq!(p.source, PermissionSource::Role);
        }
    }

    #[test]
    fn excecao_revogando_vence_o_cargo() {
        let roles = vec!["payroll:read".to_string()];
        let overrides = vec![over("payroll:read", false)];
        let resolved = resolve_effective_permissions(&roles, &overrides);

        let p = find(&resolved, "payroll:read").unwrap();
        assert!(!p.has_access);
        assert_eq!(p.source, PermissionSource::Revoked);
    }

    #[test]
    fn excecao_concedendo_sem_cargo_nenhum() {
        let overrides = vec![over("reports:read", true)];
        let resolved = resolve_effective_permissions(&[], &overrides);

        let p = find(&resolved, "reports:read").unwrap();
        assert!(p.has_access);
        assert_eq!(p.source, PermissionSource::Granted);
    }

    #[test]
    fn revogacao_sem_cargo_aparece_na_saida() {
        // usuário sem cargo nenhum, só com a exceção negando: a linha aparece
        // para o painel mostrar a origem
        let overrides = vec![over("activity:read", false)];
        let resolved = resolve_effective_permissions(&[], &overrides);

        let p = find(&resolved, "activity:read").unwrap();
        assert!(!p.has_access);
        assert_eq!(p.source, PermissionSource::Revoked);
    }

    #[test]
    fn cargos_repetidos_nao_duplicam_slug() {
        let roles = vec![
            "inventory:read".to_string(),
            "inventory:read".to_string(),
        ];
        let resolved = resolve_effective_permissions(&roles, &[]);
        assert_eq!(resolved.len(), 1);
    }

    #[sqlx::test]
    async fn cargo_de_outra_loja_nao_vincula(pool: sqlx::PgPool) {
        let service = RbacService::new(RbacRepository::new(pool.clone()));

        let loja_a: Uuid = sqlx::query_scalar(
            "INSERT INTO tenants (name, subdomain) VALUES ('Loja A', 'loja-a') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        let loja_b: Uuid = sqlx::query_scalar(
            "INSERT INTO tenants (name, subdomain) VALUES ('Loja B', 'loja-b') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        let funcionaria: Uuid = sqlx::query_scalar(
            "INSERT INTO users (tenant_id, username, email, password_hash) \
             VALUES ($1, 'Ana', 'ana@loja-a.com', 'hash') RETURNING id",
        )
        .bind(loja_a)
        .fetch_one(&pool)
        .await
        .unwrap();

        let mut tx = pool.begin().await.unwrap();
        sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
            .bind(loja_b.to_string())
            .execute(&mut *tx)
            .await
            .unwrap();
        let cargo_da_b: Uuid = sqlx::query_scalar(
            "INSERT INTO roles (tenant_id, name) VALUES ($1, 'Gerente') RETURNING id",
        )
        .bind(loja_b)
        .fetch_one(&mut *tx)
        .await
        .unwrap();
        tx.commit().await.unwrap();

        // No contexto da loja A, o cargo da loja B tem que ser recusado
        let mut tx = pool.begin().await.unwrap();
        sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
            .bind(loja_a.to_string())
            .execute(&mut *tx)
            .await
            .unwrap();
        let result = service
            .set_user_roles(&mut tx, loja_a, funcionaria, &[cargo_da_b])
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let vinculos: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_roles WHERE user_id = $1")
                .bind(funcionaria)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(vinculos, 0);
    }
}
