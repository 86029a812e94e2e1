//! Shared in-memory fakes for the domain traits
#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use compliance_service::contract::*;
use compliance_service::domain::repository::{
    DocumentRepository, MatchRepository, OtpRepository, SnapshotRepository, UserRepository,
    WatchlistRepository,
};
use compliance_service::domain::{
    DocumentEvent, EmailSender, EventPublisher, ExternalParty, ExternalPartySource, FileStorage,
    Job, JobQueue, Matcher, OtpService, Repositories, Service, WatchlistWorkflow,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Two-row DTTOT export: one person, one organization
pub const DTTOT_CSV: &str = "\
No,Nama,Deskripsi,Terduga,Kode Densus,Tpt Lahir,Tgl Lahir,WN Asal,Alamat
1,\"ABU BAKAR alias ABU BAKAR BA'ASYIR\",\"NIK: 3201 0123 4567 8901; Paspor No. A 1234567. Pemimpin kelompok\",Orang,ID-001,Jombang,17 Agustus 1938,WNI,\"Jl. Merdeka 1, Solo, Jawa Tengah\"
2,JAMAAH ISLAMIYAH,Organisasi terlarang,Korporasi,,,,Indonesia,
";

pub const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

// ===== Repositories =====

/// All tables in one place so cascades behave like the database
#[derive(Default)]
pub struct MemoryStore {
    pub documents: RwLock<HashMap<Uuid, Document>>,
    pub reports: RwLock<HashMap<Uuid, WatchlistReport>>,
    pub entries: RwLock<HashMap<Uuid, WatchlistEntry>>,
    pub matches: RwLock<HashMap<Uuid, MatchRecord>>,
    pub snapshots: RwLock<Vec<PartySnapshot>>,
    pub users: RwLock<HashMap<Uuid, (User, UserProfile)>>,
    pub otps: RwLock<HashMap<Uuid, OtpCode>>,
    /// Make the next document insert fail
    pub fail_document_create: AtomicBool,
    /// Number of snapshot list queries served
    pub snapshot_lists: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn match_count(&self) -> usize {
        self.matches.read().len()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }

    pub fn seed_snapshot(&self, party_type: PartyType, external_party_id: &str, name: &str) {
        self.snapshots.write().push(PartySnapshot {
            id: Uuid::new_v4(),
            party_type,
            external_party_id: external_party_id.to_string(),
            name: name.to_string(),
            national_id: None,
            passport_number: None,
            birth_date: None,
            nationality: None,
            email: None,
            synced_at: Utc::now(),
        });
    }
}

#[async_trait]
impl DocumentRepository for MemoryStore {
    async fn create(&self, document: &Document) -> Result<Document> {
        if self.fail_document_create.swap(false, Ordering::SeqCst) {
            bail!("database unavailable");
        }
        self.documents.write().insert(document.id, document.clone());
        Ok(document.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>> {
        Ok(self.documents.read().get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Document>> {
        let mut all: Vec<Document> = self.documents.read().values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update(&self, document: &Document) -> Result<Document> {
        let mut documents = self.documents.write();
        let slot = documents
            .get_mut(&document.id)
            .ok_or_else(|| anyhow!("document {} missing", document.id))?;
        *slot = document.clone();
        Ok(document.clone())
    }

    async fn delete_cascade(&self, id: Uuid) -> Result<bool> {
        let report_ids: Vec<Uuid> = self
            .reports
            .read()
            .values()
            .filter(|r| r.document_id == id)
            .map(|r| r.id)
            .collect();
        self.matches
            .write()
            .retain(|_, m| !report_ids.contains(&m.report_id));
        self.reports.write().retain(|_, r| r.document_id != id);
        self.entries.write().retain(|_, e| e.document_id != id);
        Ok(self.documents.write().remove(&id).is_some())
    }
}

#[async_trait]
impl WatchlistRepository for MemoryStore {
    async fn create_report(&self, report: &WatchlistReport) -> Result<WatchlistReport> {
        let mut reports = self.reports.write();
        if reports.values().any(|r| r.document_id == report.document_id) {
            bail!("unique violation on watchlist_reports.document_id");
        }
        reports.insert(report.id, report.clone());
        Ok(report.clone())
    }

    async fn find_report(&self, id: Uuid) -> Result<Option<WatchlistReport>> {
        Ok(self.reports.read().get(&id).cloned())
    }

    async fn find_report_by_document(&self, document_id: Uuid) -> Result<Option<WatchlistReport>> {
        Ok(self
            .reports
            .read()
            .values()
            .find(|r| r.document_id == document_id)
            .cloned())
    }

    async fn list_reports(&self) -> Result<Vec<WatchlistReport>> {
        let mut all: Vec<WatchlistReport> = self.reports.read().values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update_report(&self, report: &WatchlistReport) -> Result<WatchlistReport> {
        let mut reports = self.reports.write();
        let slot = reports
            .get_mut(&report.id)
            .ok_or_else(|| anyhow!("report {} missing", report.id))?;
        *slot = report.clone();
        Ok(report.clone())
    }

    async fn delete_report(&self, id: Uuid) -> Result<()> {
        self.matches.write().retain(|_, m| m.report_id != id);
        self.reports.write().remove(&id);
        Ok(())
    }

    async fn store_entries(&self, report: &WatchlistReport, entries: &[WatchlistEntry]) -> Result<()> {
        {
            let mut stored = self.entries.write();
            let replaced: Vec<Uuid> = stored
                .values()
                .filter(|e| e.document_id == report.document_id)
                .map(|e| e.id)
                .collect();
            stored.retain(|_, e| e.document_id != report.document_id);
            for m in self.matches.write().values_mut() {
                if m.watchlist_entry_id.is_some_and(|id| replaced.contains(&id)) {
                    m.watchlist_entry_id = None;
                }
            }
            for entry in entries {
                stored.insert(entry.id, entry.clone());
            }
        }
        self.update_report(report).await?;
        Ok(())
    }

    async fn find_entry(&self, id: Uuid) -> Result<Option<WatchlistEntry>> {
        Ok(self.entries.read().get(&id).cloned())
    }

    async fn list_entries(&self, document_id: Uuid) -> Result<Vec<WatchlistEntry>> {
        let mut all: Vec<WatchlistEntry> = self
            .entries
            .read()
            .values()
            .filter(|e| e.document_id == document_id)
            .cloned()
            .collect();
        all.sort_by_key(|e| e.row_number);
        Ok(all)
    }
}

fn same_natural_key(a: &MatchRecord, b: &MatchRecord) -> bool {
    a.report_id == b.report_id
        && a.party_type == b.party_type
        && a.external_party_id == b.external_party_id
        && a.matched_code == b.matched_code
}

#[async_trait]
impl MatchRepository for MemoryStore {
    async fn upsert(&self, record: &MatchRecord) -> Result<MatchRecord> {
        let mut matches = self.matches.write();
        if let Some(existing) = matches.values_mut().find(|m| same_natural_key(m, record)) {
            existing.similarity_score = record.similarity_score;
            existing.watchlist_entry_id = record.watchlist_entry_id;
            existing.updated_at = record.updated_at;
            return Ok(existing.clone());
        }
        matches.insert(record.id, record.clone());
        Ok(record.clone())
    }

    async fn create(&self, record: &MatchRecord) -> Result<MatchRecord> {
        let mut matches = self.matches.write();
        if matches.values().any(|m| same_natural_key(m, record)) {
            bail!("unique violation on match_records natural key");
        }
        matches.insert(record.id, record.clone());
        Ok(record.clone())
    }

    async fn find_by_id(&self, party_type: PartyType, id: Uuid) -> Result<Option<MatchRecord>> {
        Ok(self
            .matches
            .read()
            .get(&id)
            .filter(|m| m.party_type == party_type)
            .cloned())
    }

    async fn list(&self, report_id: Uuid, party_type: PartyType) -> Result<Vec<MatchRecord>> {
        let mut all: Vec<MatchRecord> = self
            .matches
            .read()
            .values()
            .filter(|m| m.report_id == report_id && m.party_type == party_type)
            .cloned()
            .collect();
        all.sort_by(|a, b| {
            b.similarity_score
                .total_cmp(&a.similarity_score)
                .then_with(|| a.external_party_id.cmp(&b.external_party_id))
        });
        Ok(all)
    }

    async fn update(&self, record: &MatchRecord) -> Result<MatchRecord> {
        let mut matches = self.matches.write();
        let slot = matches
            .get_mut(&record.id)
            .ok_or_else(|| anyhow!("match {} missing", record.id))?;
        *slot = record.clone();
        Ok(record.clone())
    }

    async fn delete(&self, party_type: PartyType, id: Uuid) -> Result<bool> {
        let mut matches = self.matches.write();
        if matches.get(&id).is_some_and(|m| m.party_type == party_type) {
            matches.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}

#[async_trait]
impl SnapshotRepository for MemoryStore {
    async fn upsert_many(&self, snapshots: &[PartySnapshot]) -> Result<usize> {
        let mut stored = self.snapshots.write();
        for snapshot in snapshots {
            match stored.iter_mut().find(|s| {
                s.party_type == snapshot.party_type
                    && s.external_party_id == snapshot.external_party_id
            }) {
                Some(existing) => {
                    let id = existing.id;
                    *existing = PartySnapshot {
                        id,
                        ..snapshot.clone()
                    };
                }
                None => stored.push(snapshot.clone()),
            }
        }
        Ok(snapshots.len())
    }

    async fn list(&self, party_type: Option<PartyType>) -> Result<Vec<PartySnapshot>> {
        self.snapshot_lists.fetch_add(1, Ordering::SeqCst);
        let mut all: Vec<PartySnapshot> = self
            .snapshots
            .read()
            .iter()
            .filter(|s| party_type.is_none_or(|pt| s.party_type == pt))
            .cloned()
            .collect();
        all.sort_by(|a, b| {
            a.party_type
                .as_str()
                .cmp(b.party_type.as_str())
                .then_with(|| a.external_party_id.cmp(&b.external_party_id))
        });
        Ok(all)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_with_profile(&self, user: &User, profile: &UserProfile) -> Result<()> {
        self.users
            .write()
            .insert(user.id, (user.clone(), profile.clone()));
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<(User, UserProfile)>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn username_or_email_taken(&self, username: &str, email: &str) -> Result<bool> {
        Ok(self
            .users
            .read()
            .values()
            .any(|(u, _)| u.username == username || u.email == email))
    }

    async fn mark_email_verified(&self, user_id: Uuid) -> Result<()> {
        if let Some((_, profile)) = self.users.write().get_mut(&user_id) {
            profile.email_verified = true;
            profile.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl OtpRepository for MemoryStore {
    async fn create(&self, otp: &OtpCode) -> Result<()> {
        self.otps.write().insert(otp.id, otp.clone());
        Ok(())
    }

    async fn find_active(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Vec<OtpCode>> {
        let mut active: Vec<OtpCode> = self
            .otps
            .read()
            .values()
            .filter(|o| o.user_id == user_id && o.consumed_at.is_none() && o.expires_at > now)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(active)
    }

    async fn consume(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        if let Some(otp) = self.otps.write().get_mut(&id) {
            otp.consumed_at = Some(at);
        }
        Ok(())
    }
}

// ===== Side effects =====

#[derive(Default)]
pub struct MemoryFileStorage {
    pub files: RwLock<HashMap<String, Bytes>>,
}

#[async_trait]
impl FileStorage for MemoryFileStorage {
    async fn save(&self, key: &str, bytes: Bytes) -> Result<()> {
        self.files.write().insert(key.to_string(), bytes);
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Bytes> {
        self.files
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("no file under {}", key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.files.write().remove(key);
        Ok(())
    }
}

/// Queue that only records what was enqueued
#[derive(Default)]
pub struct RecordingQueue {
    jobs: Mutex<Vec<Job>>,
}

impl RecordingQueue {
    pub fn jobs(&self) -> Vec<Job> {
        self.jobs.lock().clone()
    }

    pub fn take(&self) -> Vec<Job> {
        std::mem::take(&mut *self.jobs.lock())
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, job: Job) -> Result<()> {
        self.jobs.lock().push(job);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<DocumentEvent>>,
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: DocumentEvent) -> Result<()> {
        self.events.lock().push(event);
        Ok(())
    }
}

/// Captures mail as `(to, subject, body)`
#[derive(Default)]
pub struct RecordingEmail {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingEmail {
    /// Digits of the code in the most recent mail
    pub fn last_code(&self) -> Option<String> {
        let sent = self.sent.lock();
        let (_, _, body) = sent.last()?;
        body.split_whitespace()
            .map(|token| token.trim_end_matches('.'))
            .find(|token| !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string)
    }
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.sent
            .lock()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

/// External source backed by fixed rows
#[derive(Default)]
pub struct StaticPartySource {
    pub parties: HashMap<PartyType, Vec<ExternalParty>>,
}

impl StaticPartySource {
    pub fn with(mut self, party_type: PartyType, id: &str, name: &str) -> Self {
        self.parties.entry(party_type).or_default().push(ExternalParty {
            external_party_id: id.to_string(),
            name: name.to_string(),
            national_id: None,
            passport_number: None,
            birth_date: None,
            nationality: None,
            email: None,
        });
        self
    }
}

#[async_trait]
impl ExternalPartySource for StaticPartySource {
    async fn fetch_all(&self, party_type: PartyType) -> Result<Vec<ExternalParty>> {
        Ok(self.parties.get(&party_type).cloned().unwrap_or_default())
    }

    async fn fetch_by_ids(&self, party_type: PartyType, ids: &[String]) -> Result<Vec<ExternalParty>> {
        Ok(self
            .parties
            .get(&party_type)
            .map(|all| {
                all.iter()
                    .filter(|p| ids.contains(&p.external_party_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

// ===== Wiring =====

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub files: Arc<MemoryFileStorage>,
    pub queue: Arc<RecordingQueue>,
    pub events: Arc<RecordingPublisher>,
    pub email: Arc<RecordingEmail>,
    pub service: Service,
}

impl Harness {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let files = Arc::new(MemoryFileStorage::default());
        let queue = Arc::new(RecordingQueue::default());
        let events = Arc::new(RecordingPublisher::default());
        let email = Arc::new(RecordingEmail::default());

        let repos = repositories(&store);
        let otp = OtpService::new(
            repos.otps.clone(),
            repos.users.clone(),
            email.clone(),
            Duration::from_secs(300),
            6,
        );
        let service = Service::new(
            repos,
            files.clone(),
            events.clone(),
            queue.clone(),
            otp,
            MAX_UPLOAD_BYTES,
        );

        Self {
            store,
            files,
            queue,
            events,
            email,
            service,
        }
    }

    pub fn workflow(&self, threshold: f64) -> WatchlistWorkflow {
        WatchlistWorkflow::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.files.clone(),
            self.queue.clone(),
            Matcher::with_threshold(threshold),
        )
    }
}

pub fn repositories(store: &Arc<MemoryStore>) -> Repositories {
    Repositories {
        documents: store.clone(),
        watchlist: store.clone(),
        matches: store.clone(),
        snapshots: store.clone(),
        users: store.clone(),
        otps: store.clone(),
    }
}

pub fn new_user(username: &str, email: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password: "s3cret-passw0rd".to_string(),
        full_name: "Siti Rahmawati".to_string(),
        phone: Some("+62 812 0000 1111".to_string()),
    }
}

// ===== Databases =====

/// File-backed SQLite database with migrations applied
pub async fn migrated_sqlite(dir: &tempfile::TempDir, name: &str) -> sea_orm::DatabaseConnection {
    let db = plain_sqlite(dir, name).await;
    compliance_service::ComplianceModule::migrate(&db)
        .await
        .unwrap();
    db
}

/// File-backed SQLite database without any schema
pub async fn plain_sqlite(dir: &tempfile::TempDir, name: &str) -> sea_orm::DatabaseConnection {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join(name).display());
    sea_orm::Database::connect(url).await.unwrap()
}

/// Minimal stand-in for the platform database read by the external source
pub async fn seed_external_db(db: &sea_orm::DatabaseConnection) {
    use sea_orm::ConnectionTrait;

    db.execute_unprepared(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            full_name TEXT NOT NULL,
            nik TEXT,
            passport_number TEXT,
            birth_date TEXT,
            nationality TEXT,
            email TEXT,
            is_active BOOLEAN NOT NULL
        );
        CREATE TABLE organizations (
            id INTEGER PRIMARY KEY,
            legal_name TEXT NOT NULL,
            registration_number TEXT,
            established_on TEXT,
            country TEXT,
            email TEXT,
            org_type TEXT NOT NULL
        );
        INSERT INTO users VALUES
            (1, 'Abu Bakar', '3201012345678901', NULL, '1938-08-17', 'Indonesia', 'abu@example.com', TRUE),
            (2, 'Siti Rahmawati', NULL, NULL, NULL, 'Indonesia', 'siti@example.com', TRUE),
            (3, 'Dormant Account', NULL, NULL, NULL, NULL, NULL, FALSE);
        INSERT INTO organizations VALUES
            (10, 'Jamaah Islamiyah', 'AHU-0001', '1993-01-01 00:00:00', 'Indonesia', NULL, 'corporate'),
            (11, 'PT Maju Jaya', 'AHU-0002', NULL, 'Indonesia', NULL, 'corporate'),
            (20, 'Penerbit Nusantara', 'AHU-0003', NULL, 'Indonesia', NULL, 'publisher');",
    )
    .await
    .unwrap();
}
