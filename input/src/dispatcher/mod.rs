// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Fan-out of decoded events to subscribers.
//!
//! ```text
//!                       ┌──────────────────────────── dispatcher thread ─┐
//! ControlMessage ──mpsc─┼─▶ apply ─▶ Poller::wait ─▶ Device::read ─▶ emit │
//!   (+ Waker::wake)     └──────────────────────────────────────────┬─────┘
//!                                                    Arc<InputEvent>│ push (never blocks)
//!                         ┌─────────────────────────┬──────────────┴──────────┐
//!                         ▼                         ▼                         ▼
//!                 SubscriptionQueue         SubscriptionQueue         SubscriptionQueue
//!                 recv().await              recv_blocking()           SinkWorker thread
//! ```
//!
//! Each subscription has its own bounded queue and [`OverflowPolicy`], so a slow
//! consumer only loses its own events. Events are immutable and shared through
//! [`Arc`](std::sync::Arc).

// Attach sources.
pub mod cancellation;
pub mod control;
pub mod dispatcher_impl;
pub mod dispatcher_thread;
pub mod event_sink;
pub mod subscription;
pub mod subscription_handle;
pub mod subscription_queue;
pub mod tick;

// Re-export.
pub use cancellation::*;
pub use control::*;
pub use dispatcher_impl::*;
pub use dispatcher_thread::*;
pub use event_sink::*;
pub use subscription::*;
pub use subscription_handle::*;
pub use subscription_queue::*;
pub use tick::*;
