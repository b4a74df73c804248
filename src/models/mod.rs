// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod member;
pub mod message;
pub mod notification;
pub mod plan;

pub use member::{MemberProfile, Principal};
pub use message::ChatMessage;
pub use notification::{Notification, NotificationKind};
pub use plan::{Plan, PlanCategory, PlanDetails, PlanStatus};
