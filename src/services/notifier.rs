// src/services/notifier.rs

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use crate::models::notification::RealtimeEvent;

const ROOM_CAPACITY: usize = 64;

/// Salas de notificação em tempo real: uma por loja mais a sala do painel
/// Super Admin. Cada sala é um canal broadcast; quem perder mensagens por
/// atraso (Lagged) simplesmente segue do ponto atual — o histórico fica na
/// tabela notifications.
#[derive(Clone)]
pub struct Notifier {
    rooms: Arc<RwLock<HashMap<Uuid, broadcast::Sender<RealtimeEvent>>>>,
    admin_room: broadcast::Sender<RealtimeEvent>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (admin_room, _) = broadcast::channel(ROOM_CAPACITY);
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            admin_room,
        }
    }

    pub async fn subscribe_tenant(&self, tenant_id: Uuid) -> broadcast::Receiver<RealtimeEvent> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(tenant_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    pub fn subscribe_admin(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.admin_room.subscribe()
    }

    /// Publica na sala da loja. Sem assinantes conectados o send falha de
    /// propósito e a gente ignora.
    pub async fn publish_tenant(&self, tenant_id: Uuid, event: RealtimeEvent) {
        let rooms = self.rooms.read().await;
        if let Some(sender) = rooms.get(&tenant_id) {
            let _ = sender.send(event);
        }
    }

    pub fn publish_admin(&self, event: RealtimeEvent) {
        let _ = self.admin_room.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(message: &str) -> RealtimeEvent {
        RealtimeEvent {
            event: "test".into(),
            message: message.into(),
            link: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn salas_de_lojas_diferentes_sao_isoladas() {
        let notifier = Notifier::new();
        let loja_a = Uuid::new_v4();
        let loja_b = Uuid::new_v4();

        let mut rx_a = notifier.subscribe_tenant(loja_a).await;
        let mut rx_b = notifier.subscribe_tenant(loja_b).await;

        notifier.publish_tenant(loja_a, event("só para a loja A")).await;

        let got = rx_a.recv().await.unwrap();
        assert_eq!(got.message, "só para a loja A");
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn sala_do_painel_nao_vaza_para_lojas() {
        let notifier = Notifier::new();
        let loja = Uuid::new_v4();

        let mut rx_loja = notifier.subscribe_tenant(loja).await;
        let mut rx_admin = notifier.subscribe_admin();

        notifier.publish_admin(event("novo cadastro aguardando"));

        let got = rx_admin.recv().await.unwrap();
        assert_eq!(got.event, "test");
        assert!(rx_loja.try_recv().is_err());
    }

    #[tokio::test]
    async fn publicar_sem_assinantes_nao_quebra() {
        let notifier = Notifier::new();
        notifier.publish_tenant(Uuid::new_v4(), event("ninguém ouvindo")).await;
        notifier.publish_admin(event("idem"));
    }
}
