//! Guest session store backed by a single JSON record.
//!
//! One profile exists per data directory. `login` replaces the record
//! wholesale, `logout` deletes it, and a missing or unreadable record
//! reads as signed-out rather than as an error. Mutations without a
//! session degrade to no-ops; only real filesystem failures surface.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

pub const DEFAULT_EMAIL: &str = "guest@mmakwany.co.ke";
pub const DEFAULT_NAME: &str = "Guest User";
pub const DEFAULT_STARTING_POINTS: u32 = 2450;

/// The one persisted guest record.
///
/// Contact fields (`phone`, `avatar`) live on the same record as the
/// loyalty data; there is no second profile key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    pub loyalty_points: u32,
    pub member_since: DateTime<Utc>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub tickets: Vec<Ticket>,
}

impl UserProfile {
    /// First word of the display name, used by the header greeting.
    pub fn first_name(&self) -> &str {
        self.display_name
            .split_whitespace()
            .next()
            .unwrap_or(self.display_name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub kind: String,
    pub label: String,
    pub price: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
}

/// Booking fields supplied by the caller; `id`, `status`, and
/// `created_at` are synthesized at append time.
#[derive(Debug, Clone)]
pub struct BookingInput {
    pub kind: String,
    pub label: String,
    pub price: String,
}

/// An event pass or similar log entry. Beyond the generated `id`,
/// the fields are whatever the caller supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Partial profile update. Unset fields keep their current value.
/// `member_since` is deliberately not here; it is set once at login.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub loyalty_points: Option<u32>,
}

/// Outcome of a checked point redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redemption {
    Redeemed { remaining: u32 },
    InsufficientPoints { have: u32 },
    NoSession,
}

/// Identity and balance used when `login` omits fields.
#[derive(Debug, Clone)]
pub struct SessionDefaults {
    pub email: String,
    pub display_name: String,
    pub starting_points: u32,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            email: DEFAULT_EMAIL.to_string(),
            display_name: DEFAULT_NAME.to_string(),
            starting_points: DEFAULT_STARTING_POINTS,
        }
    }
}

/// Store contract for the guest session.
///
/// Consumers receive the store by reference so tests can substitute
/// their own implementation.
pub trait SessionStore {
    /// The persisted record, or `None` when signed out. Corrupt or
    /// foreign data under the session key also reads as `None`.
    fn current_user(&self) -> Option<UserProfile>;

    /// Build, persist, and return a fresh profile. Any prior session
    /// is fully overwritten, never merged.
    fn login(&self, email: Option<&str>, display_name: Option<&str>) -> Result<UserProfile>;

    /// Delete the persisted record. Deleting an absent record is fine.
    fn logout(&self) -> Result<()>;

    fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// Shallow-merge the set fields into the record. Returns `None`
    /// without touching storage when there is no session.
    fn update_user(&self, update: ProfileUpdate) -> Result<Option<UserProfile>>;

    /// Append a booking with a generated id and timestamp. No-op
    /// without a session.
    fn append_booking(&self, input: BookingInput) -> Result<()>;

    /// Append a ticket carrying the given fields. No-op without a
    /// session.
    fn append_ticket(&self, fields: serde_json::Map<String, serde_json::Value>) -> Result<()>;

    /// Deduct `cost` points if the balance covers it. The outcome is
    /// data, not an error; callers render their own feedback.
    fn redeem_points(&self, cost: u32) -> Result<Redemption>;
}

/// Production store: one pretty-printed JSON record per data directory.
pub struct JsonFileStore {
    path: PathBuf,
    defaults: SessionDefaults,
}

impl JsonFileStore {
    pub const FILE_NAME: &'static str = "session.json";

    pub fn new(data_dir: &Path, defaults: SessionDefaults) -> Self {
        Self {
            path: data_dir.join(Self::FILE_NAME),
            defaults,
        }
    }

    fn read(&self) -> Option<UserProfile> {
        let raw = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    fn write(&self, user: &UserProfile) -> Result<()> {
        let raw = serde_json::to_string_pretty(user)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl SessionStore for JsonFileStore {
    fn current_user(&self) -> Option<UserProfile> {
        self.read()
    }

    fn login(&self, email: Option<&str>, display_name: Option<&str>) -> Result<UserProfile> {
        let user = UserProfile {
            email: email.unwrap_or(&self.defaults.email).to_string(),
            display_name: display_name.unwrap_or(&self.defaults.display_name).to_string(),
            phone: None,
            avatar: None,
            loyalty_points: self.defaults.starting_points,
            member_since: Utc::now(),
            bookings: Vec::new(),
            tickets: Vec::new(),
        };
        self.write(&user)?;
        Ok(user)
    }

    fn logout(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn update_user(&self, update: ProfileUpdate) -> Result<Option<UserProfile>> {
        let Some(mut user) = self.read() else {
            return Ok(None);
        };
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(name) = update.display_name {
            user.display_name = name;
        }
        if let Some(phone) = update.phone {
            user.phone = Some(phone);
        }
        if let Some(avatar) = update.avatar {
            user.avatar = Some(avatar);
        }
        if let Some(points) = update.loyalty_points {
            user.loyalty_points = points;
        }
        self.write(&user)?;
        Ok(Some(user))
    }

    fn append_booking(&self, input: BookingInput) -> Result<()> {
        let Some(mut user) = self.read() else {
            return Ok(());
        };
        user.bookings.push(Booking {
            id: timestamp_id("BK"),
            kind: input.kind,
            label: input.label,
            price: input.price,
            status: BookingStatus::Confirmed,
            created_at: Utc::now(),
        });
        self.write(&user)
    }

    fn append_ticket(&self, fields: serde_json::Map<String, serde_json::Value>) -> Result<()> {
        let Some(mut user) = self.read() else {
            return Ok(());
        };
        user.tickets.push(Ticket {
            id: timestamp_id("TK"),
            fields,
        });
        self.write(&user)
    }

    fn redeem_points(&self, cost: u32) -> Result<Redemption> {
        let Some(mut user) = self.read() else {
            return Ok(Redemption::NoSession);
        };
        match user.loyalty_points.checked_sub(cost) {
            Some(remaining) => {
                user.loyalty_points = remaining;
                self.write(&user)?;
                Ok(Redemption::Redeemed { remaining })
            }
            None => Ok(Redemption::InsufficientPoints {
                have: user.loyalty_points,
            }),
        }
    }
}

static LAST_ID_MS: AtomicI64 = AtomicI64::new(0);

/// Millisecond-clock id like `BK-1754400000000`. When two appends land
/// in the same millisecond the counter is nudged forward, keeping ids
/// unique within the process lifetime.
fn timestamp_id(prefix: &str) -> String {
    let now = Utc::now().timestamp_millis();
    let mut claimed = now;
    let _ = LAST_ID_MS.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
        claimed = if now > last { now } else { last + 1 };
        Some(claimed)
    });
    format!("{}-{}", prefix, claimed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> JsonFileStore {
        JsonFileStore::new(dir, SessionDefaults::default())
    }

    #[test]
    fn test_absent_before_first_login() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.current_user().is_none());
        assert!(store.current_user().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_login_defaults() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let user = store.login(None, None).unwrap();
        assert_eq!(user.email, "guest@mmakwany.co.ke");
        assert_eq!(user.display_name, "Guest User");
        assert_eq!(user.loyalty_points, 2450);
        assert!(user.bookings.is_empty());
        assert!(user.tickets.is_empty());

        let reread = store.current_user().unwrap();
        assert_eq!(reread.email, user.email);
        assert_eq!(reread.loyalty_points, 2450);
    }

    #[test]
    fn test_login_replaces_existing_session() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.login(Some("a@x.com"), Some("A")).unwrap();
        store
            .append_booking(BookingInput {
                kind: "room".to_string(),
                label: "Deluxe Room".to_string(),
                price: "KES 15,000".to_string(),
            })
            .unwrap();

        store.login(Some("b@y.com"), Some("B")).unwrap();
        let user = store.current_user().unwrap();
        assert_eq!(user.email, "b@y.com");
        assert_eq!(user.display_name, "B");
        assert!(user.bookings.is_empty());
        assert!(user.tickets.is_empty());
    }

    #[test]
    fn test_logout_clears_session() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.login(None, None).unwrap();
        assert!(store.is_authenticated());

        store.logout().unwrap();
        assert!(!store.is_authenticated());
        assert!(store.current_user().is_none());

        // Logging out twice is fine.
        store.logout().unwrap();
    }

    #[test]
    fn test_append_booking_is_monotonic() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.login(None, None).unwrap();

        let input = BookingInput {
            kind: "room".to_string(),
            label: "Deluxe".to_string(),
            price: "KES 15,000".to_string(),
        };
        store.append_booking(input.clone()).unwrap();
        store.append_booking(input).unwrap();

        let user = store.current_user().unwrap();
        assert_eq!(user.bookings.len(), 2);
        assert_ne!(user.bookings[0].id, user.bookings[1].id);
        assert!(user.bookings[0].id.starts_with("BK-"));
        assert_eq!(user.bookings[0].label, "Deluxe");
        assert_eq!(user.bookings[1].label, "Deluxe");
        assert_eq!(user.bookings[0].status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_append_ticket_keeps_caller_fields() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.login(None, None).unwrap();

        let mut fields = serde_json::Map::new();
        fields.insert("event".to_string(), "Jazz Night".into());
        store.append_ticket(fields).unwrap();

        let user = store.current_user().unwrap();
        assert_eq!(user.tickets.len(), 1);
        assert!(user.tickets[0].id.starts_with("TK-"));
        assert_eq!(user.tickets[0].fields["event"], "Jazz Night");
    }

    #[test]
    fn test_update_is_partial_merge() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let before = store.login(None, None).unwrap();
        assert_eq!(before.loyalty_points, 2450);

        let after = store
            .update_user(ProfileUpdate {
                loyalty_points: Some(1950),
                ..Default::default()
            })
            .unwrap()
            .unwrap();
        assert_eq!(after.loyalty_points, 1950);
        assert_eq!(after.email, before.email);
        assert_eq!(after.display_name, before.display_name);
        assert_eq!(after.member_since, before.member_since);
        assert!(after.bookings.is_empty());
    }

    #[test]
    fn test_update_contact_fields() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.login(None, None).unwrap();

        store
            .update_user(ProfileUpdate {
                phone: Some("+254 700 000 000".to_string()),
                avatar: Some("avatars/guest.png".to_string()),
                ..Default::default()
            })
            .unwrap();

        let user = store.current_user().unwrap();
        assert_eq!(user.phone.as_deref(), Some("+254 700 000 000"));
        assert_eq!(user.avatar.as_deref(), Some("avatars/guest.png"));
        assert_eq!(user.loyalty_points, 2450);
    }

    #[test]
    fn test_mutations_without_session_are_noops() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        store
            .append_booking(BookingInput {
                kind: "room".to_string(),
                label: "Deluxe".to_string(),
                price: "KES 15,000".to_string(),
            })
            .unwrap();
        let mut fields = serde_json::Map::new();
        fields.insert("event".to_string(), "Gala".into());
        store.append_ticket(fields).unwrap();
        let updated = store
            .update_user(ProfileUpdate {
                email: Some("x@y.com".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert!(updated.is_none());
        assert!(store.current_user().is_none());
        assert!(!dir.path().join(JsonFileStore::FILE_NAME).exists());
    }

    #[test]
    fn test_redeem_points_checked() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        assert_eq!(store.redeem_points(500).unwrap(), Redemption::NoSession);

        store.login(None, None).unwrap();
        assert_eq!(
            store.redeem_points(500).unwrap(),
            Redemption::Redeemed { remaining: 1950 }
        );
        assert_eq!(store.current_user().unwrap().loyalty_points, 1950);

        assert_eq!(
            store.redeem_points(99_999).unwrap(),
            Redemption::InsufficientPoints { have: 1950 }
        );
        assert_eq!(store.current_user().unwrap().loyalty_points, 1950);
    }

    #[test]
    fn test_corrupt_record_reads_as_absent() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let path = dir.path().join(JsonFileStore::FILE_NAME);

        fs::write(&path, "not json at all").unwrap();
        assert!(store.current_user().is_none());
        assert!(!store.is_authenticated());

        // Valid JSON of the wrong shape is just as absent.
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(store.current_user().is_none());

        // And a fresh login recovers.
        store.login(None, None).unwrap();
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_first_name() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let user = store.login(None, Some("Amina W. Otieno")).unwrap();
        assert_eq!(user.first_name(), "Amina");
    }

    #[test]
    fn test_timestamp_ids_increase() {
        let a = timestamp_id("BK");
        let b = timestamp_id("BK");
        let a_ms: i64 = a.trim_start_matches("BK-").parse().unwrap();
        let b_ms: i64 = b.trim_start_matches("BK-").parse().unwrap();
        assert!(b_ms > a_ms);
    }
}
