// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod chat;
pub mod fanout;
pub mod identity;
pub mod members;
pub mod payments;
pub mod plans;
pub mod push;

pub use chat::ChatService;
pub use identity::{IdentityProvider, TokenIdentityProvider};
pub use members::MemberService;
pub use plans::{NewPlan, PlanService};
pub use push::{LogPush, PushChannel};
