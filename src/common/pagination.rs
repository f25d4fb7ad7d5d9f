// src/common/pagination.rs
//
// Contrato uniforme de listagem: page + perPage + search, resposta com total
// e totalPages. A página pedida é "clampada" para a última página não vazia
// (apagar o último item da página N não pode deixar o usuário numa tela vazia).

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PER_PAGE: i64 = 10;
pub const MAX_PER_PAGE: i64 = 100;

// Query string comum a todas as listagens (filtros extras ficam em cada handler)
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    /// Página (1-based)
    pub page: Option<i64>,
    /// Itens por página (máx. 100)
    pub per_page: Option<i64>,
    /// Busca livre (ILIKE)
    pub search: Option<String>,
}

impl PageParams {
    pub fn per_page(&self) -> i64 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Busca normalizada: None vira string vazia (as queries usam `$n = ''` como curto-circuito)
    pub fn search(&self) -> String {
        self.search.clone().unwrap_or_default().trim().to_string()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, per_page: i64) -> Self {
        Self {
            items,
            total,
            page,
            per_page,
            total_pages: total_pages(total, per_page),
        }
    }
}

pub fn total_pages(total: i64, per_page: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (total + per_page - 1) / per_page
    }
}

/// Garante que a página pedida exista: além da última, volta para a última.
/// Com zero itens, fica na página 1 (lista vazia, sem offset negativo).
pub fn clamp_page(requested: i64, total: i64, per_page: i64) -> i64 {
    let last = total_pages(total, per_page);
    if last == 0 {
        1
    } else {
        requested.clamp(1, last)
    }
}

pub fn offset(page: i64, per_page: i64) -> i64 {
    (page - 1) * per_page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_volta_para_ultima_pagina() {
        // 21 itens, 10 por página -> 3 páginas; pedir a 4ª cai na 3ª
        assert_eq!(clamp_page(4, 21, 10), 3);
        // apagar o último item da página 3 (total 20) manda o refetch pra página 2
        assert_eq!(clamp_page(3, 20, 10), 2);
    }

    #[test]
    fn clamp_com_lista_vazia() {
        assert_eq!(clamp_page(5, 0, 10), 1);
        assert_eq!(total_pages(0, 10), 0);
    }

    #[test]
    fn clamp_nao_mexe_em_pagina_valida() {
        assert_eq!(clamp_page(2, 25, 10), 2);
        assert_eq!(total_pages(25, 10), 3);
    }

    #[test]
    fn offset_e_1_based() {
        assert_eq!(offset(1, 10), 0);
        assert_eq!(offset(3, 10), 20);
    }
}
