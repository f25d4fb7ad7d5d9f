// src/services/tenancy_service.rs

use bcrypt::hash;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{RbacRepository, TenantRepository, UserRepository},
    models::auth::UserStatus,
    models::tenancy::{CreateTenantPayload, Tenant, TenantDetail, TenantStatus},
};

pub const ADMIN_ROLE_NAME: &str = "Administrador";

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    user_repo: UserRepository,
    rbac_repo: RbacRepository,
    pool: PgPool, // Usamos a pool para iniciar transações
}

impl TenantService {
    pub fn new(
        tenant_repo: TenantRepository,
        user_repo: UserRepository,
        rbac_repo: RbacRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            tenant_repo,
            user_repo,
            rbac_repo,
            pool,
        }
    }

    /// LÓGICA DE NEGÓCIO: Cria a loja e, atomicamente, o cargo
    /// "Administrador" com o catálogo inteiro de permissões e o primeiro
    /// usuário admin já Ativo com esse cargo.
    pub async fn create_tenant_with_admin(
        &self,
        payload: &CreateTenantPayload,
    ) -> Result<Tenant, AppError> {
        let password_clone = payload.admin_password.clone();
        let hashed_password =
            tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let all_permissions = self.rbac_repo.list_all_permissions().await?;
        let all_perm_ids: Vec<Uuid> = all_permissions.iter().map(|p| p.id).collect();

        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria a Loja (Tenant)
        let new_tenant = self
            .tenant_repo
            .create_tenant(&mut *tx, &payload.name, &payload.subdomain)
            .await?;

        // As tabelas com RLS (roles) exigem o app.tenant_id da loja nova
        // mesmo dentro da transação
        sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
            .bind(new_tenant.id.to_string())
            .execute(&mut *tx)
            .await?;

        // 3. Cargo "Administrador" com todas as permissões
        let admin_role = self
            .rbac_repo
            .create_role(
                &mut *tx,
                new_tenant.id,
                ADMIN_ROLE_NAME,
                Some("Acesso total administrativo (gerado automaticamente)"),
            )
            .await?;

        self.rbac_repo
            .set_role_permissions(&mut tx, admin_role.id, &all_perm_ids)
            .await?;

        // 4. Primeiro usuário, já Ativo e com e-mail confirmado
        let admin_user = self
            .user_repo
            .create_user(
                &mut *tx,
                Some(new_tenant.id),
                &payload.admin_username,
                &payload.admin_email,
                &hashed_password,
                UserStatus::Active,
                false,
                true,
            )
            .await?;

        self.rbac_repo
            .set_user_roles(&mut tx, admin_user.id, &[admin_role.id])
            .await?;

        // 5. Commit
        tx.commit().await?;

        Ok(new_tenant)
    }

    pub async fn list_tenants(
        &self,
        search: &str,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Tenant>, i64, i64), AppError> {
        self.tenant_repo.list(search, page, per_page).await
    }

    /// Detalhe da loja com os agregados do painel. Como as tabelas contadas
    /// têm RLS, a conexão recebe o app.tenant_id da loja alvo antes.
    pub async fn tenant_detail(&self, tenant_id: Uuid) -> Result<TenantDetail, AppError> {
        let tenant = self
            .tenant_repo
            .find_by_id(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("loja".into()))?;

        // Transação só pelo escopo do set_config: ao soltar a conexão de
        // volta pra pool ela não pode carregar o tenant de ninguém
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
            .bind(tenant.id.to_string())
            .execute(&mut *tx)
            .await?;

        let stats = self.tenant_repo.stats(&mut tx, tenant.id).await?;

        Ok(TenantDetail { tenant, stats })
    }

    pub async fn set_status(
        &self,
        tenant_id: Uuid,
        status: TenantStatus,
    ) -> Result<Tenant, AppError> {
        self.tenant_repo.set_status(tenant_id, status).await
    }
}
