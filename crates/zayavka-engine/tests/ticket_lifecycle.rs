// SPDX-FileCopyrightText: 2026 Zayavka Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end ticket lifecycle over a real SQLite store: registration,
//! intake with geolocation and a photo, load-balanced assignment with a
//! staff notification, resolution with chat + email fan-out, and the
//! double-reply guard.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use zayavka_core::{
    event::labels, ChatId, ChatTransport, Geocoder, InboundEvent, InboundPayload, Keyboard,
    Mailer, MediaKind, MessageBody, OperatingHours, OutboundMessage, ProfileDraft, ProfileStore,
    Role, TicketId, TicketStatus, TicketStore, ZayavkaError,
};
use zayavka_engine::{spawn_fanout, Engine, EngineDeps, MediaStaging};
use zayavka_storage::SqliteStore;

const USER: ChatId = ChatId(100);
const STAFF: ChatId = ChatId(200);

#[derive(Default)]
struct FakeTransport {
    sent: Mutex<Vec<OutboundMessage>>,
}

impl FakeTransport {
    async fn messages_for(&self, chat: ChatId) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.chat_id == chat)
            .cloned()
            .collect()
    }

    async fn last_text_for(&self, chat: ChatId) -> String {
        self.messages_for(chat)
            .await
            .last()
            .map(|m| match &m.body {
                MessageBody::Text(t) => t.clone(),
                MessageBody::Photo { caption, .. } | MessageBody::Video { caption, .. } => {
                    caption.clone()
                }
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn send(&self, msg: OutboundMessage) -> Result<(), ZayavkaError> {
        self.sent.lock().await.push(msg);
        Ok(())
    }

    async fn stage_file(
        &self,
        file_id: &str,
        staging_dir: &Path,
    ) -> Result<PathBuf, ZayavkaError> {
        let path = staging_dir.join(format!("{file_id}.jpg"));
        tokio::fs::write(&path, b"jpeg")
            .await
            .map_err(|e| ZayavkaError::Staging(e.to_string()))?;
        Ok(path)
    }
}

struct FakeGeocoder;

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn reverse(&self, _lat: f64, _lon: f64) -> Result<Option<String>, ZayavkaError> {
        Ok(Some("г. Тверь, ул. Советская, 10".to_string()))
    }
}

#[derive(Default)]
struct FakeMailer {
    sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        _attachment: Option<&Path>,
    ) -> Result<(), ZayavkaError> {
        self.sent
            .lock()
            .await
            .push((to.into(), subject.into(), body.into()));
        Ok(())
    }
}

struct Harness {
    engine: Engine,
    store: SqliteStore,
    transport: Arc<FakeTransport>,
    mailer: Arc<FakeMailer>,
    _dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("z.db").to_str().unwrap())
        .await
        .unwrap();
    let transport = Arc::new(FakeTransport::default());
    let mailer = Arc::new(FakeMailer::default());
    let (fanout, _worker) = spawn_fanout(transport.clone(), Some(mailer.clone()));

    let engine = Engine::new(EngineDeps {
        profiles: Arc::new(store.clone()),
        tickets: Arc::new(store.clone()),
        sessions: Arc::new(store.clone()),
        transport: transport.clone(),
        geocoder: Arc::new(FakeGeocoder),
        fanout,
        // Always-open window so the gate never depends on the wall clock.
        hours: OperatingHours {
            days: vec![0, 1, 2, 3, 4, 5, 6],
            open_hour: 0,
            close_hour: 24,
        },
        media: MediaStaging::new(
            dir.path().join("temp"),
            dir.path().join("media"),
            Duration::from_secs(24 * 3600),
        ),
    });

    Harness {
        engine,
        store,
        transport,
        mailer,
        _dir: dir,
    }
}

fn text(chat: ChatId, t: &str) -> InboundEvent {
    InboundEvent {
        chat_id: chat,
        username: None,
        payload: InboundPayload::Text(t.to_string()),
    }
}

async fn register_staff(store: &SqliteStore) {
    store
        .upsert(
            STAFF,
            Some("operator".into()),
            &ProfileDraft {
                full_name: Some("Петрова Анна".into()),
                phone: Some("+79001112233".into()),
                email: None,
                role: Some(Role::Staff),
            },
        )
        .await
        .unwrap();
}

/// Drive the user through registration with phone and email.
async fn register_user(h: &Harness) {
    for ev in [
        text(USER, "/start"),
        text(USER, labels::ACCEPT),
        text(USER, "Иванов Иван Иванович"),
        text(USER, "+79123456789"),
        text(USER, "ivan@example.com"),
    ] {
        h.engine.handle_event(ev).await.unwrap();
    }
    let profile = h.store.fetch(USER).await.unwrap().unwrap();
    assert_eq!(profile.role, Role::User);
    assert_eq!(profile.email.as_deref(), Some("ivan@example.com"));
}

/// Drive the full intake with a location address and a photo.
async fn create_ticket(h: &Harness) -> TicketId {
    let events = [
        text(USER, labels::CREATE_TICKET),
        text(USER, "Вывоз ТКО"),
        InboundEvent {
            chat_id: USER,
            username: None,
            payload: InboundPayload::Location {
                latitude: 56.85,
                longitude: 35.9,
            },
        },
        text(USER, labels::YES),
        InboundEvent {
            chat_id: USER,
            username: None,
            payload: InboundPayload::Media {
                kind: MediaKind::Photo,
                file_id: "file42".into(),
                caption: None,
            },
        },
        text(USER, "Контейнер не вывозили неделю"),
        text(USER, labels::YES),
    ];
    for ev in events {
        h.engine.handle_event(ev).await.unwrap();
    }
    TicketId(1)
}

/// Poll until the predicate holds or the deadline passes; fan-out runs on
/// a separate task.
async fn wait_for<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached within deadline");
}

#[tokio::test]
async fn full_lifecycle_from_intake_to_closure() {
    let h = harness().await;
    register_staff(&h.store).await;
    register_user(&h).await;

    let ticket_id = create_ticket(&h).await;

    // Persisted with the geocoded address, an attachment, and status open.
    let ticket = h.store.fetch_ticket(ticket_id).await.unwrap().unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.address, "г. Тверь, ул. Советская, 10");
    assert_eq!(ticket.attachments.len(), 1);
    assert!(ticket.attachments[0].locator.contains("tickets"));

    // The requester sees the confirmation with the ticket number.
    let confirmation = h.transport.last_text_for(USER).await;
    assert!(confirmation.contains("№1"), "got: {confirmation}");

    // The staff member receives the notification with the answer button.
    wait_for(|| async {
        h.transport
            .messages_for(STAFF)
            .await
            .iter()
            .any(|m| m.keyboard == Some(Keyboard::Answer(ticket_id)))
    })
    .await;
    let notice = h.transport.last_text_for(STAFF).await;
    assert!(notice.contains("Вывоз ТКО"));
    assert!(notice.contains("Иванов Иван Иванович"));

    // Staff answers through the inline button.
    h.engine
        .handle_event(InboundEvent {
            chat_id: STAFF,
            username: None,
            payload: InboundPayload::Callback {
                data: format!("answer:{ticket_id}"),
            },
        })
        .await
        .unwrap();
    h.engine
        .handle_event(text(STAFF, "Мусор вывезен, приносим извинения."))
        .await
        .unwrap();

    // Ticket is closed, the requester got the reply in chat.
    let ticket = h.store.fetch_ticket(ticket_id).await.unwrap().unwrap();
    assert_eq!(ticket.status, TicketStatus::Closed);
    let reply = h
        .transport
        .messages_for(USER)
        .await
        .iter()
        .filter_map(|m| match &m.body {
            MessageBody::Text(t) => Some(t.clone()),
            _ => None,
        })
        .find(|t| t.contains("Ответ по заявке №1"))
        .expect("requester reply delivered");
    assert!(reply.contains("Мусор вывезен"));

    // The email copy went through the fan-out to the stored address.
    wait_for(|| async { !h.mailer.sent.lock().await.is_empty() }).await;
    let emails = h.mailer.sent.lock().await;
    assert_eq!(emails[0].0, "ivan@example.com");
    assert!(emails[0].1.contains("№1"));
}

#[tokio::test]
async fn second_reply_to_a_closed_ticket_is_rejected() {
    let h = harness().await;
    register_staff(&h.store).await;
    register_user(&h).await;
    let ticket_id = create_ticket(&h).await;

    let answer = InboundEvent {
        chat_id: STAFF,
        username: None,
        payload: InboundPayload::Callback {
            data: format!("answer:{ticket_id}"),
        },
    };
    h.engine.handle_event(answer.clone()).await.unwrap();
    h.engine.handle_event(text(STAFF, "Готово")).await.unwrap();
    assert_eq!(
        h.store.fetch_ticket(ticket_id).await.unwrap().unwrap().status,
        TicketStatus::Closed
    );
    let replies_before = h.transport.messages_for(USER).await.len();

    // The guard rejects a second pass with zero deliveries to the user.
    h.engine.handle_event(answer).await.unwrap();
    let rejection = h.transport.last_text_for(STAFF).await;
    assert!(rejection.contains("уже закрыта"), "got: {rejection}");
    assert_eq!(h.transport.messages_for(USER).await.len(), replies_before);
}

#[tokio::test]
async fn tickets_route_to_the_least_loaded_staff_member() {
    let h = harness().await;
    register_staff(&h.store).await;
    // A second staff member who already carries one open ticket.
    let busy = h
        .store
        .upsert(
            ChatId(201),
            None,
            &ProfileDraft {
                full_name: Some("Сидоров Пётр".into()),
                phone: None,
                email: None,
                role: Some(Role::Staff),
            },
        )
        .await
        .unwrap();
    register_user(&h).await;
    let user = h.store.fetch(USER).await.unwrap().unwrap();
    h.store
        .save_ticket(
            user.id,
            &zayavka_core::TicketDraft {
                category: Some(zayavka_core::Category::Other),
                address: Some("а".into()),
                media: None,
                description: Some("б".into()),
            },
            busy.id,
        )
        .await
        .unwrap();

    create_ticket(&h).await;

    // The new ticket lands on the idle staff member, not the busy one.
    let counts = h.store.count_open_by_assignee().await.unwrap();
    let busy_count = counts.iter().find(|(id, _)| *id == busy.id).unwrap().1;
    assert_eq!(busy_count, 1);
    assert_eq!(counts.iter().map(|(_, c)| c).sum::<u64>(), 2);
    wait_for(|| async { !h.transport.messages_for(STAFF).await.is_empty() }).await;
}

#[tokio::test]
async fn intake_without_staff_creates_no_ticket() {
    let h = harness().await;
    register_user(&h).await;
    let ticket_id = {
        // Same flow, but nobody to assign to.
        let events = [
            text(USER, labels::CREATE_TICKET),
            text(USER, "Другое"),
            text(USER, "ул. Садовая, 5"),
            text(USER, labels::YES),
            text(USER, labels::SKIP),
            text(USER, "Вопрос по квитанции"),
            text(USER, labels::YES),
        ];
        for ev in events {
            h.engine.handle_event(ev).await.unwrap();
        }
        TicketId(1)
    };

    assert!(h.store.fetch_ticket(ticket_id).await.unwrap().is_none());
    let answer = h.transport.last_text_for(USER).await;
    assert!(answer.contains("Выберите действие"));
}

#[tokio::test]
async fn registration_with_a_taken_phone_returns_to_the_phone_step() {
    let h = harness().await;
    register_user(&h).await;

    // A second participant claims the first one's phone number.
    let other = ChatId(101);
    for ev in [
        text(other, "/start"),
        text(other, labels::ACCEPT),
        text(other, "Петров Пётр"),
        text(other, "+79123456789"),
        text(other, "petr@example.com"),
    ] {
        h.engine.handle_event(ev).await.unwrap();
    }

    // The upsert was rejected and the flow bounced back to the phone step.
    assert!(h.store.fetch(other).await.unwrap().is_none());
    let sent = h.transport.messages_for(other).await;
    assert!(sent.iter().any(|m| matches!(
        &m.body,
        MessageBody::Text(t) if t.contains("привязан к другому")
    )));
    assert!(h
        .transport
        .last_text_for(other)
        .await
        .contains("номер телефона"));

    // A fresh number completes the registration.
    h.engine
        .handle_event(text(other, "+79998887766"))
        .await
        .unwrap();
    h.engine
        .handle_event(text(other, "petr@example.com"))
        .await
        .unwrap();
    let profile = h.store.fetch(other).await.unwrap().unwrap();
    assert_eq!(profile.phone.as_deref(), Some("+79998887766"));

    // The original owner keeps the contested number.
    let first = h.store.fetch(USER).await.unwrap().unwrap();
    assert_eq!(first.phone.as_deref(), Some("+79123456789"));
}

#[tokio::test]
async fn declining_the_final_confirmation_discards_the_draft() {
    let h = harness().await;
    register_staff(&h.store).await;
    register_user(&h).await;

    let events = [
        text(USER, labels::CREATE_TICKET),
        text(USER, "Начисления"),
        text(USER, "ул. Мира, 3"),
        text(USER, labels::YES),
        text(USER, labels::SKIP),
        text(USER, "Неверная сумма"),
        text(USER, labels::NO),
    ];
    for ev in events {
        h.engine.handle_event(ev).await.unwrap();
    }

    assert!(h.store.fetch_ticket(TicketId(1)).await.unwrap().is_none());
    assert!(h
        .transport
        .last_text_for(USER)
        .await
        .contains("Заявка отменена"));
}
