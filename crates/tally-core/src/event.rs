//! Change notifications emitted by stores after a committed write.
//!
//! Consumers (the sync worker) treat events as "something in this area
//! changed"; they carry no payload and may be coalesced freely.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreEvent {
  Subjects,
  Timetable,
  OneOffs,
  History,
  Settings,
  Notes,
  /// The whole store was replaced (import or clear).
  Replaced,
}
