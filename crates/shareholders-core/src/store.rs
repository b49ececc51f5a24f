//! Store traits and supporting query types.
//!
//! Traits are implemented by storage backends (e.g.
//! `shareholders-store-sqlite`). Higher layers depend on these abstractions,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  credentials::PasswordChange,
  news::{BusinessNews, NewBusinessNews},
  order::Order,
  shareholder::{NewShareholder, Shareholder},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`ShareholderStore::find_active`] and
/// [`ShareholderStore::find_including_inactive`]. Every set field narrows the
/// result.
#[derive(Debug, Clone, Default)]
pub struct ShareholderQuery {
  /// Exact match; lower-cased before comparison.
  pub email:              Option<String>,
  pub phone_number:       Option<String>,
  pub is_login_activated: Option<bool>,
  /// Case-insensitive substring match on `name`.
  pub name_contains:      Option<String>,
  pub limit:              Option<usize>,
  pub offset:             Option<usize>,
}

/// The password hash of an account, selected explicitly.
#[derive(Clone)]
pub struct StoredCredentials {
  pub shareholder_id: Uuid,
  pub password_hash:  String,
}

impl std::fmt::Debug for StoredCredentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StoredCredentials")
      .field("shareholder_id", &self.shareholder_id)
      .finish_non_exhaustive()
  }
}

// ─── Shareholders ────────────────────────────────────────────────────────────

/// Abstraction over a shareholder store backend.
///
/// Soft-deleted accounts (`active == false`) are invisible to every read
/// except [`ShareholderStore::find_including_inactive`].
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait ShareholderStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Validate, hash the password, and persist a new account.
  ///
  /// Fails with a uniqueness violation if the email or phone number is
  /// already taken, including by a deactivated account.
  fn register(
    &self,
    input: NewShareholder,
  ) -> impl Future<Output = Result<Shareholder, Self::Error>> + Send + '_;

  /// Revalidate and persist the mutable, non-credential fields of `record`
  /// (profile, shareholding, login activation). Credential and reset-token
  /// columns, `created_at`, `role` and `active` are left untouched.
  fn save<'a>(
    &'a self,
    record: &'a Shareholder,
  ) -> impl Future<Output = Result<Shareholder, Self::Error>> + Send + 'a;

  /// Persist the reset-token hash and expiry set on `record` by
  /// [`Shareholder::generate_password_reset_token`], replacing any
  /// outstanding token.
  fn store_reset_token<'a>(
    &'a self,
    record: &'a Shareholder,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Replace the password of an active account.
  fn change_password(
    &self,
    id: Uuid,
    change: PasswordChange,
  ) -> impl Future<Output = Result<Shareholder, Self::Error>> + Send + '_;

  /// Redeem a plaintext reset token: set the new password and clear the
  /// token so it cannot be used twice.
  fn reset_password(
    &self,
    token: String,
    change: PasswordChange,
  ) -> impl Future<Output = Result<Shareholder, Self::Error>> + Send + '_;

  /// Administrative soft delete (`false`) or restore (`true`). Addresses
  /// inactive accounts too.
  fn set_active(
    &self,
    id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve an active account by UUID.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Shareholder>, Self::Error>> + Send + '_;

  /// Retrieve an active account by email address.
  fn find_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Shareholder>, Self::Error>> + Send + 'a;

  /// The default listing: accounts matching `query`, soft-deleted excluded.
  fn find_active<'a>(
    &'a self,
    query: &'a ShareholderQuery,
  ) -> impl Future<Output = Result<Vec<Shareholder>, Self::Error>> + Send + 'a;

  /// Accounts matching `query`, soft-deleted included.
  fn find_including_inactive<'a>(
    &'a self,
    query: &'a ShareholderQuery,
  ) -> impl Future<Output = Result<Vec<Shareholder>, Self::Error>> + Send + 'a;

  /// Select the password hash of an active account.
  fn credentials(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<StoredCredentials>, Self::Error>>
  + Send
  + '_;

  /// Look up the active account holding an unexpired reset token.
  fn find_by_reset_token<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Option<Shareholder>, Self::Error>> + Send + 'a;
}

// ─── News ────────────────────────────────────────────────────────────────────

pub trait NewsStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn publish(
    &self,
    input: NewBusinessNews,
  ) -> impl Future<Output = Result<BusinessNews, Self::Error>> + Send + '_;

  fn get_news(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<BusinessNews>, Self::Error>>
  + Send
  + '_;

  /// All announcements, newest `date` first.
  fn list_news(
    &self,
  ) -> impl Future<Output = Result<Vec<BusinessNews>, Self::Error>> + Send + '_;

  /// Replace every field of an existing announcement.
  fn update_news(
    &self,
    id: Uuid,
    input: NewBusinessNews,
  ) -> impl Future<Output = Result<BusinessNews, Self::Error>> + Send + '_;

  fn delete_news(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Orders ──────────────────────────────────────────────────────────────────

/// Read access to the Orders collaborator.
pub trait OrderBook: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Orders placed by `shareholder_id`, oldest first.
  fn orders_for(
    &self,
    shareholder_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Order>, Self::Error>> + Send + '_;
}
