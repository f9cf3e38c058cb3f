//! Campus state — observable values shared between the client core and the UI.
//!
//! Rust owns the state; the UI layer only reads it and registers callbacks.
//!
//! # Primitives
//!
//! - [`StateCell`] — a single value with synchronous change notification.
//!   `get()` reads a clone, `set()`/`update()` write and notify every
//!   registered subscriber before returning.
//! - [`NotificationChannel`] — a transient `(title, description, variant)`
//!   slot for user-facing outcomes. Not queued: the last notification wins.
//!
//! # Example
//!
//! ```ignore
//! use campus_state::StateCell;
//!
//! let cell = StateCell::new(0u32);
//! let id = cell.subscribe(|v| println!("now {}", v));
//! cell.set(1);
//! cell.unsubscribe(id);
//! ```

pub mod cell;
pub mod notify;

pub use cell::{ChangeHandler, StateCell, Subscription, SubscriptionId};
pub use notify::{Notification, NotificationChannel, Notifier, Variant};
