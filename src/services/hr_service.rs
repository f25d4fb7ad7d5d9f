// src/services/hr_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::Acquire;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{HrRepository, UserRepository},
    models::hr::{
        AttendanceCsvRecord, AttendanceRecord, AttendanceStatus, Department, DepartmentPayload,
        GeneratePayrollPayload, Payslip,
    },
};

#[derive(Clone)]
pub struct HrService {
    hr_repo: HrRepository,
    user_repo: UserRepository,
}

/// Valores do holerite. O valor do dia sai dos dias marcados no mês: sem
/// presença registrada nenhuma não há desconto a calcular.
/// net = basic − deductions + bonus, tudo arredondado em 2 casas.
pub fn payslip_amounts(
    basic_salary: Decimal,
    marked_days: i64,
    absent_days: i64,
    bonus: Decimal,
) -> (Decimal, Decimal) {
    let deductions = if marked_days > 0 {
        let daily_rate = basic_salary / Decimal::from(marked_days);
        (daily_rate * Decimal::from(absent_days)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    let net = (basic_salary - deductions + bonus).round_dp(2);
    (deductions, net)
}

/// Nome do arquivo de export: attendance_<YYYY-MM>.csv
pub fn attendance_filename(now: chrono::DateTime<chrono::Utc>) -> String {
    format!("attendance_{}.csv", now.format("%Y-%m"))
}

pub fn encode_attendance_csv(
    rows: &[(String, NaiveDate, AttendanceStatus)],
) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for (email, date, status) in rows {
        writer
            .serialize(AttendanceCsvRecord {
                email: email.clone(),
                date: *date,
                status: status.as_str().to_string(),
            })
            .map_err(|e| anyhow::anyhow!("Falha ao escrever CSV: {e}"))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Falha ao finalizar CSV: {e}").into())
}

pub fn decode_attendance_csv(bytes: &[u8]) -> Result<Vec<AttendanceCsvRecord>, AppError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut records = Vec::new();

    for (index, row) in reader.deserialize::<AttendanceCsvRecord>().enumerate() {
        let line = index + 2;
        let record = row.map_err(|e| AppError::CsvRow(line, e.to_string()))?;

        if AttendanceStatus::parse(&record.status).is_none() {
            return Err(AppError::CsvRow(
                line,
                format!("status desconhecido '{}'", record.status),
            ));
        }
        records.push(record);
    }

    Ok(records)
}

impl HrService {
    pub fn new(hr_repo: HrRepository, user_repo: UserRepository) -> Self {
        Self { hr_repo, user_repo }
    }

    // ---
    // Departamentos
    // ---

    pub async fn list_departments(
        &self,
        conn: &mut sqlx::PgConnection,
    ) -> Result<Vec<Department>, AppError> {
        self.hr_repo.list_departments(conn).await
    }

    pub async fn create_department(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        payload: &DepartmentPayload,
    ) -> Result<Department, AppError> {
        self.hr_repo.create_department(conn, tenant_id, payload).await
    }

    pub async fn update_department(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
        payload: &DepartmentPayload,
    ) -> Result<Department, AppError> {
        self.hr_repo.update_department(conn, id, payload).await
    }

    pub async fn delete_department(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
    ) -> Result<(), AppError> {
        self.hr_repo.delete_department(conn, id).await
    }

    // ---
    // Presença
    // ---

    /// O alvo precisa ser funcionário desta loja: a tabela users não tem
    /// RLS, então a checagem é feita aqui.
    async fn ensure_employee(&self, tenant_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .filter(|u| u.tenant_id == Some(tenant_id))
            .ok_or(AppError::UserNotFound)?;
        Ok(())
    }

    pub async fn mark_attendance(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        user_id: Uuid,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, AppError> {
        self.ensure_employee(tenant_id, user_id).await?;
        self.hr_repo
            .mark_attendance(conn, tenant_id, user_id, date, status)
            .await
    }

    pub async fn list_attendance(
        &self,
        conn: &mut sqlx::PgConnection,
        user_id: Option<Uuid>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<AttendanceRecord>, i64, i64), AppError> {
        self.hr_repo
            .list_attendance(conn, user_id, from, to, page, per_page)
            .await
    }

    pub async fn export_attendance_csv(
        &self,
        conn: &mut sqlx::PgConnection,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<u8>, AppError> {
        let rows = self.hr_repo.list_attendance_for_export(conn, from, to).await?;
        encode_attendance_csv(&rows)
    }

    /// Import de presença por e-mail: cada linha vira um upsert de
    /// usuário+data. E-mail fora da loja aborta com o número da linha.
    pub async fn import_attendance_csv(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        bytes: &[u8],
    ) -> Result<usize, AppError> {
        let records = decode_attendance_csv(bytes)?;

        let emails: Vec<String> = records.iter().map(|r| r.email.to_lowercase()).collect();
        let known = self.user_repo.find_ids_by_emails(tenant_id, &emails).await?;
        let by_email: std::collections::HashMap<String, Uuid> = known.into_iter().collect();

        for (index, record) in records.iter().enumerate() {
            if !by_email.contains_key(&record.email.to_lowercase()) {
                return Err(AppError::CsvRow(
                    index + 2,
                    format!("e-mail desconhecido '{}'", record.email),
                ));
            }
        }

        // Tudo-ou-nada: uma linha que falhe no meio não pode deixar as
        // anteriores gravadas
        let mut tx = conn.begin().await?;
        let mut imported = 0;
        for record in &records {
            let user_id = by_email[&record.email.to_lowercase()];
            // validado no decode
            let Some(status) = AttendanceStatus::parse(&record.status) else {
                continue;
            };
            self.hr_repo
                .mark_attendance(&mut tx, tenant_id, user_id, record.date, status)
                .await?;
            imported += 1;
        }
        tx.commit().await?;

        Ok(imported)
    }

    // ---
    // Folha de pagamento
    // ---

    /// Gera os holerites do mês para todos os funcionários ativos. Quem já
    /// tem holerite no período derruba a geração inteira (Conflict).
    pub async fn generate_payroll(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        payload: &GeneratePayrollPayload,
    ) -> Result<Vec<Payslip>, AppError> {
        let employees = self.user_repo.list_active_employees(tenant_id).await?;

        // Um conflito no meio da lista não pode deixar a folha pela metade
        let mut tx = conn.begin().await?;
        let mut payslips = Vec::with_capacity(employees.len());
        for employee in &employees {
            let marked = self
                .hr_repo
                .marked_days_in_month(&mut tx, employee.id, payload.month, payload.year)
                .await?;
            let absent = self
                .hr_repo
                .absent_days_in_month(&mut tx, employee.id, payload.month, payload.year)
                .await?;

            let (deductions, net) =
                payslip_amounts(employee.basic_salary, marked, absent, payload.bonus);

            let payslip = self
                .hr_repo
                .insert_payslip(
                    &mut tx,
                    tenant_id,
                    employee.id,
                    payload.month,
                    payload.year,
                    employee.basic_salary,
                    deductions,
                    payload.bonus,
                    net,
                )
                .await?;
            payslips.push(payslip);
        }
        tx.commit().await?;

        Ok(payslips)
    }

    pub async fn list_payslips(
        &self,
        conn: &mut sqlx::PgConnection,
        user_id: Option<Uuid>,
        month: Option<i32>,
        year: Option<i32>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Payslip>, i64, i64), AppError> {
        self.hr_repo
            .list_payslips(conn, user_id, month, year, page, per_page)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folha_desconta_faltas_pelo_valor_do_dia() {
        // 2200 em 22 dias marcados = 100/dia; 2 faltas descontam 200
        let (deductions, net) =
            payslip_amounts(Decimal::new(2200, 0), 22, 2, Decimal::ZERO);
        assert_eq!(deductions, Decimal::new(200, 0));
        assert_eq!(net, Decimal::new(2000, 0));
    }

    #[test]
    fn bonus_entra_depois_do_desconto() {
        let (deductions, net) =
            payslip_amounts(Decimal::new(3000, 0), 30, 3, Decimal::new(500, 0));
        assert_eq!(deductions, Decimal::new(300, 0));
        assert_eq!(net, Decimal::new(3200, 0));
    }

    #[test]
    fn mes_sem_presenca_marcada_nao_desconta() {
        let (deductions, net) =
            payslip_amounts(Decimal::new(2500, 0), 0, 0, Decimal::ZERO);
        assert_eq!(deductions, Decimal::ZERO);
        assert_eq!(net, Decimal::new(2500, 0));
    }

    #[test]
    fn desconto_arredonda_em_duas_casas() {
        // 1000 / 3 dias marcados = 333.333...; 1 falta = 333.33
        let (deductions, net) = payslip_amounts(Decimal::new(1000, 0), 3, 1, Decimal::ZERO);
        assert_eq!(deductions, Decimal::new(33333, 2));
        assert_eq!(net, Decimal::new(66667, 2));
    }

    #[test]
    fn csv_de_presenca_rejeita_status_desconhecido() {
        let bytes = b"email,date,status\nmaria@acme.com,2026-03-10,Ferias\n";
        assert!(matches!(
            decode_attendance_csv(bytes),
            Err(AppError::CsvRow(2, _))
        ));
    }

    #[test]
    fn csv_de_presenca_ida_e_volta() {
        let rows = vec![(
            "maria@acme.com".to_string(),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            AttendanceStatus::Present,
        )];
        let bytes = encode_attendance_csv(&rows).unwrap();
        let decoded = decode_attendance_csv(&bytes).unwrap();

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].email, "maria@acme.com");
        assert_eq!(decoded[0].status, "Present");
    }

    #[sqlx::test]
    async fn conflito_na_folha_nao_deixa_holerite_pela_metade(pool: sqlx::PgPool) {
        let service = HrService::new(HrRepository::new(), UserRepository::new(pool.clone()));

        let loja: Uuid = sqlx::query_scalar(
            "INSERT INTO tenants (name, subdomain) VALUES ('Acme', 'acme') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        // Duas funcionárias ativas; a segunda (por ordem de nome) já tem
        // holerite do período
        let _alice: Uuid = sqlx::query_scalar(
            "INSERT INTO users (tenant_id, username, email, password_hash, status, basic_salary) \
             VALUES ($1, 'Alice', 'alice@acme.com', 'hash', 'Active', 3000) RETURNING id",
        )
        .bind(loja)
        .fetch_one(&pool)
        .await
        .unwrap();
        let bruna: Uuid = sqlx::query_scalar(
            "INSERT INTO users (tenant_id, username, email, password_hash, status, basic_salary) \
             VALUES ($1, 'Bruna', 'bruna@acme.com', 'hash', 'Active', 3000) RETURNING id",
        )
        .bind(loja)
        .fetch_one(&pool)
        .await
        .unwrap();

        let mut tx = pool.begin().await.unwrap();
        sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
            .bind(loja.to_string())
            .execute(&mut *tx)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO payslips \
                 (tenant_id, user_id, month, year, basic_salary, total_deductions, bonus, net_salary) \
             VALUES ($1, $2, 3, 2026, 3000, 0, 0, 3000)",
        )
        .bind(loja)
        .bind(bruna)
        .execute(&mut *tx)
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let payload = GeneratePayrollPayload {
            month: 3,
            year: 2026,
            bonus: Decimal::ZERO,
        };

        let mut tx = pool.begin().await.unwrap();
        sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
            .bind(loja.to_string())
            .execute(&mut *tx)
            .await
            .unwrap();
        let result = service.generate_payroll(&mut tx, loja, &payload).await;
        assert!(matches!(result, Err(AppError::PayslipAlreadyExists)));

        // O holerite da Alice, gerado antes do conflito, foi desfeito junto
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payslips WHERE tenant_id = $1")
            .bind(loja)
            .fetch_one(&mut *tx)
            .await
            .unwrap();
        assert_eq!(total, 1);
    }
}
