use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::tenancy::TenantContext;

// ---
// Helper RLS: A "Chave" para o Banco de Dados
// ---
/// Abre uma transação e define as variáveis RLS (a "chave") com escopo
/// transacional. Toda query de escopo de loja roda dentro dela: as policies
/// do Postgres comparam tenant_id com app.tenant_id.
///
/// O escopo transacional (`set_config(..., true)`) garante que a conexão
/// volta limpa para a pool. Handlers que escrevem precisam chamar
/// `commit()` no final; leituras podem simplesmente soltar a transação.
pub(crate) async fn get_rls_connection(
    app_state: &AppState,
    tenant_ctx: &TenantContext,
    user: &AuthenticatedUser,
) -> Result<sqlx::Transaction<'static, sqlx::Postgres>, AppError> {
    // 1. Abre a transação
    // O operador '?' converte automaticamente sqlx::Error -> AppError::DatabaseError
    let mut tx = app_state.db_pool.begin().await?;

    // 2. Define Tenant ID
    sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
        .bind(tenant_ctx.tenant_id.to_string())
        .execute(&mut *tx)
        .await?;

    // 3. Define User ID (para o log de atividades)
    sqlx::query("SELECT set_config('app.user_id', $1, true)")
        .bind(user.0.id.to_string())
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}
