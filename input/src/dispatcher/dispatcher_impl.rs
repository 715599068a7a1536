// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{CancellationToken, CloseReason, ControlMessage, ControlSender,
            DispatcherHandle, PushOutcome, SubscribeOptions, SubscriptionFilter,
            SubscriptionHandle, SubscriptionId, SubscriptionQueue, TickSchedule};
use crate::{Continuation, DEVICE_READ_BUFFER_SIZE, DetachReason, DeviceDescriptor,
            DeviceId, DeviceRef, InputCoreConfig, InputCoreError, InputEvent, InterestMask,
            LifecycleEvent, OpenAllReport, Poller, ReadOutcome, ReadinessMask, ReadySource,
            Registry};
use std::{os::fd::{OwnedFd, RawFd},
          sync::{Arc,
                 mpsc::{Receiver, TryRecvError, channel}},
          time::{Duration, Instant}};

/// Interest every device is attached with.
const DEVICE_INTEREST: InterestMask = InterestMask::READABLE.union(InterestMask::HANGUP);

#[derive(Debug)]
struct Subscription {
    queue: Arc<SubscriptionQueue>,
    filter: SubscriptionFilter,
    cancellation: Option<CancellationToken>,
}

impl Subscription {
    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatcherState {
    Running,
    ShutDown,
}

/// The input core's main worker. Owns the [`Registry`] (devices and their decoders),
/// the [`Poller`], and the subscription table. Every method runs on the thread that
/// owns it; other threads talk to it through a [`DispatcherHandle`].
///
/// One loop iteration ([`run_once()`]):
/// 1. Apply control messages (subscribe, unsubscribe, rescan, shutdown) and close
///    cancelled subscriptions.
/// 2. Wait on the poller, bounded by the next tick deadline.
/// 3. Drain every readable device into its decoder and fan the events out.
/// 4. Hangup or error: drain what is left, then queue the device for detach.
/// 5. Tick deadline passed with no device events: emit a `tick`.
/// 6. Detach queued devices: emit `detached`, remove from the poller, close.
///
/// [`run_once()`]: Self::run_once
#[allow(missing_debug_implementations)]
pub struct Dispatcher {
    config: InputCoreConfig,
    registry: Registry,
    poller: Poller,
    subscriptions: Vec<Subscription>,
    control_rx: Receiver<ControlMessage>,
    handle: DispatcherHandle,
    ticks: TickSchedule,
    detach_queue: Vec<(DeviceId, DetachReason)>,
    read_buffer: Vec<u8>,
    decoded_events: Vec<InputEvent>,
    run_token: Option<CancellationToken>,
    state: DispatcherState,
}

impl Dispatcher {
    /// # Errors
    ///
    /// [`InputCoreError::Io`] if the poller can't be created.
    pub fn new(config: InputCoreConfig) -> Result<Self, InputCoreError> {
        let poller = Poller::new(config.poller)?;
        let (tx, control_rx) = channel();
        let handle = DispatcherHandle::new(
            ControlSender::new(tx, poller.waker()),
            config.dispatcher,
        );
        Ok(Self {
            registry: Registry::new(config.registry.clone()),
            ticks: TickSchedule::new(config.dispatcher.tick_interval()),
            config,
            poller,
            subscriptions: vec![],
            control_rx,
            handle,
            detach_queue: vec![],
            read_buffer: vec![0; DEVICE_READ_BUFFER_SIZE],
            decoded_events: vec![],
            run_token: None,
            state: DispatcherState::Running,
        })
    }

    #[must_use]
    pub fn config(&self) -> &InputCoreConfig { &self.config }

    #[must_use]
    pub fn handle(&self) -> DispatcherHandle { self.handle.clone() }

    #[must_use]
    pub fn registry(&self) -> &Registry { &self.registry }

    pub(super) fn poller_waker(&self) -> Arc<mio::Waker> { self.poller.waker() }

    #[must_use]
    pub fn subscription_count(&self) -> usize { self.subscriptions.len() }

    #[must_use]
    pub fn is_shut_down(&self) -> bool { self.state == DispatcherState::ShutDown }

    /// Subscribe from the owning thread. Unlike [`DispatcherHandle::subscribe()`] the
    /// subscription is active as soon as this returns.
    #[must_use]
    pub fn subscribe(
        &mut self,
        filter: SubscriptionFilter,
        options: SubscribeOptions,
    ) -> SubscriptionHandle {
        let handle = self.handle.subscribe(filter, options);
        self.apply_control_messages();
        handle
    }

    /// Enumerate and open every device, emitting `attached` for each one opened and
    /// `error` for each failure. Unclassified devices are skipped quietly unless
    /// `open_unclassified` is set.
    pub fn open_all(&mut self) -> OpenAllReport {
        self.apply_control_messages();
        let mut report = OpenAllReport::default();
        match self.registry.enumerate() {
            Ok(descriptors) => {
                for descriptor in descriptors {
                    let id = descriptor.id.clone();
                    match self.attach_descriptor(descriptor) {
                        Ok(()) => report.opened.push(id),
                        Err(InputCoreError::Unsupported { .. }) => {}
                        Err(err) => report.failed.push(err),
                    }
                }
            }
            Err(err) => {
                tracing::info!(message = "dispatcher: no input devices", error = %err);
                self.emit_error(None, &err);
                report.failed.push(err);
            }
        }
        report
    }

    fn attach_descriptor(&mut self, descriptor: DeviceDescriptor) -> Result<(), InputCoreError> {
        let device_ref = descriptor.device_ref();
        let name = descriptor.name.clone();
        let opened = self.registry.open_descriptor(descriptor).map(|it| it.raw_fd());
        let result = match opened {
            Ok(fd) => self.attach_fd(&device_ref.id, fd),
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => {
                self.emit(LifecycleEvent::Attached { device: device_ref, name }.into());
                Ok(())
            }
            Err(err @ InputCoreError::Unsupported { .. }) => {
                tracing::debug!(
                    message = "dispatcher: skipping unclassified device",
                    device = %device_ref
                );
                Err(err)
            }
            Err(err) => {
                tracing::warn!(
                    message = "dispatcher: failed to open device",
                    device = %device_ref,
                    error = %err
                );
                self.emit_error(Some(device_ref), &err);
                Err(err)
            }
        }
    }

    /// Register with the poller; on failure the device is closed again.
    fn attach_fd(&mut self, id: &DeviceId, fd: RawFd) -> Result<(), InputCoreError> {
        if let Err(err) = self.poller.attach(fd, DEVICE_INTEREST) {
            self.registry.close(id);
            return Err(err);
        }
        Ok(())
    }

    /// Adopt an already open descriptor (replay file, pipe) as a device and start
    /// watching it.
    ///
    /// # Errors
    ///
    /// See [`Registry::adopt()`] and [`Poller::attach()`].
    pub fn adopt(
        &mut self,
        descriptor: DeviceDescriptor,
        fd: impl Into<OwnedFd>,
    ) -> Result<DeviceRef, InputCoreError> {
        let device_ref = descriptor.device_ref();
        let name = descriptor.name.clone();
        let fd = self.registry.adopt(descriptor, fd)?.raw_fd();
        self.attach_fd(&device_ref.id, fd)?;
        self.emit(
            LifecycleEvent::Attached {
                device: device_ref.clone(),
                name,
            }
            .into(),
        );
        Ok(device_ref)
    }

    /// Close one device, emitting `detached` with [`DetachReason::Closed`]. Unknown ids
    /// are ignored.
    pub fn close_device(&mut self, id: &DeviceId) {
        self.detach_device(id, DetachReason::Closed);
    }

    /// Re-enumerate: open new nodes (`attached`), close vanished ones (`detached`).
    pub fn rescan(&mut self) {
        let diff = match self.registry.rescan() {
            Ok(diff) => diff,
            Err(err) => {
                tracing::warn!(message = "dispatcher: rescan failed", error = %err);
                self.emit_error(None, &err);
                return;
            }
        };
        if !diff.is_empty() {
            tracing::info!(
                message = "dispatcher: rescan",
                appeared = diff.appeared.len(),
                vanished = diff.vanished.len()
            );
        }
        for id in diff.vanished {
            self.detach_device(&id, DetachReason::Vanished);
        }
        for descriptor in diff.appeared {
            // Failures were already reported as lifecycle errors.
            let _unused = self.attach_descriptor(descriptor);
        }
    }

    /// Run until `cancellation` fires, a shutdown is requested, or an internal error
    /// occurs. Always ends with [`shutdown()`](Self::shutdown).
    ///
    /// # Errors
    ///
    /// Only [`InputCoreError::Internal`] and [`InputCoreError::Io`] escape; every other
    /// error is recovered locally and reported as a lifecycle event.
    pub fn run(&mut self, cancellation: &CancellationToken) -> Result<(), InputCoreError> {
        cancellation.register_waker(self.poller.waker());
        self.run_token = Some(cancellation.clone());
        tracing::info!(
            message = "dispatcher: running",
            devices = self.registry.len(),
            subscriptions = self.subscriptions.len()
        );
        let result = loop {
            if cancellation.is_cancelled() {
                break Ok(());
            }
            match self.run_once(None) {
                Ok(Continuation::Continue) => {}
                Ok(Continuation::Stop) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        if let Err(err) = &result {
            tracing::error!(message = "dispatcher: stopping on error", error = %err);
        }
        self.shutdown();
        result
    }

    /// One iteration of the main loop. `timeout` bounds the wait further than the tick
    /// deadline does ([`None`]: no extra bound).
    ///
    /// # Errors
    ///
    /// [`InputCoreError::Internal`] or [`InputCoreError::Io`]. Per-device errors are
    /// recovered locally.
    pub fn run_once(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Continuation, InputCoreError> {
        if self.state == DispatcherState::ShutDown {
            return Ok(Continuation::Stop);
        }
        if self.apply_control_messages() == Continuation::Stop {
            self.shutdown();
            return Ok(Continuation::Stop);
        }
        self.sweep_cancelled();

        let wait_timeout = match (timeout, self.ticks.timeout(Instant::now())) {
            (Some(lhs), Some(rhs)) => Some(lhs.min(rhs)),
            (lhs, rhs) => lhs.or(rhs),
        };
        let ready = self.poller.wait(wait_timeout)?;

        let mut device_events = 0;
        for notification in ready {
            match notification.source {
                // Control messages are applied at the top of the next iteration.
                ReadySource::Waker => {}
                ReadySource::Descriptor(fd) => {
                    device_events += self.service_device(fd, notification.readiness)?;
                }
            }
        }

        let now = Instant::now();
        if self.ticks.is_due(now) {
            if let Some(tick) = self.ticks.advance(now, device_events == 0) {
                self.emit(tick.into());
            }
        }

        self.drain_detach_queue();
        Ok(Continuation::Continue)
    }

    /// Read everything available from the device behind `fd` and emit the decoded
    /// events. Returns how many were emitted.
    fn service_device(
        &mut self,
        fd: RawFd,
        readiness: ReadinessMask,
    ) -> Result<usize, InputCoreError> {
        let Some(id) = self.registry.id_for_fd(fd).cloned() else {
            return Ok(0);
        };
        if self.detach_queue.iter().any(|(queued, _)| *queued == id) {
            return Ok(0);
        }
        let Some(device) = self.registry.get_mut(&id) else {
            return Ok(0);
        };
        let device_ref = device.device_ref();
        let outcome = device.read_available(&mut self.read_buffer, &mut self.decoded_events);

        // Events decoded before a failure still go out.
        let events = std::mem::take(&mut self.decoded_events);
        let count = events.len();
        for event in events {
            self.emit(event);
        }

        match outcome {
            Ok(ReadOutcome::Drained) if readiness.is_terminal() => {
                self.detach_queue.push((id, DetachReason::Hangup));
            }
            Ok(ReadOutcome::Drained) => {}
            Ok(ReadOutcome::Hangup) => {
                tracing::info!(message = "dispatcher: device hung up", device = %device_ref);
                self.detach_queue.push((id, DetachReason::Hangup));
            }
            Err(err) if err.is_recoverable_locally() => {
                tracing::warn!(
                    message = "dispatcher: detaching device after error",
                    device = %device_ref,
                    error = %err
                );
                self.emit_error(Some(device_ref), &err);
                self.detach_queue.push((id, DetachReason::Error));
            }
            Err(err) => return Err(err),
        }
        Ok(count)
    }

    fn drain_detach_queue(&mut self) {
        for (id, reason) in std::mem::take(&mut self.detach_queue) {
            self.detach_device(&id, reason);
        }
    }

    /// Emit `detached`, then stop watching and close the descriptor.
    fn detach_device(&mut self, id: &DeviceId, reason: DetachReason) {
        let Some(device) = self.registry.get(id) else {
            return;
        };
        let device_ref = device.device_ref();
        let fd = device.raw_fd();
        self.emit(
            LifecycleEvent::Detached {
                device: device_ref,
                reason,
            }
            .into(),
        );
        if let Err(err) = self.poller.detach(fd, InterestMask::all()) {
            tracing::warn!(message = "dispatcher: poller detach failed", error = %err);
        }
        self.registry.close(id);
    }

    /// Close every device (`detached` with [`DetachReason::Shutdown`]), emit a final
    /// `shutdown`, close every subscription, and cancel the token passed to
    /// [`run()`](Self::run). Idempotent.
    pub fn shutdown(&mut self) {
        if self.state == DispatcherState::ShutDown {
            return;
        }
        // Subscriptions registered just before shutdown still see the final events.
        self.apply_control_messages();
        self.state = DispatcherState::ShutDown;
        if let Some(token) = &self.run_token {
            token.cancel();
        }

        for id in self.registry.ids() {
            self.detach_device(&id, DetachReason::Shutdown);
        }
        self.detach_queue.clear();
        self.emit(LifecycleEvent::Shutdown.into());

        for subscription in self.subscriptions.drain(..) {
            subscription.queue.close(CloseReason::Shutdown);
        }
        tracing::info!(message = "dispatcher: shut down");
    }

    /// Apply queued control messages. [`Continuation::Stop`] if one asked for shutdown.
    fn apply_control_messages(&mut self) -> Continuation {
        loop {
            match self.control_rx.try_recv() {
                Ok(ControlMessage::Subscribe {
                    queue,
                    filter,
                    cancellation,
                }) => {
                    if self.state == DispatcherState::ShutDown {
                        queue.close(CloseReason::Shutdown);
                        continue;
                    }
                    if let Some(token) = &cancellation {
                        token.register_waker(self.poller.waker());
                    }
                    tracing::debug!(
                        message = "dispatcher: subscribed",
                        subscription = %queue.id(),
                        classes = ?filter.classes,
                        kinds = ?filter.kinds
                    );
                    self.subscriptions.push(Subscription {
                        queue,
                        filter,
                        cancellation,
                    });
                }
                Ok(ControlMessage::Unsubscribe(id)) => self.remove_subscription(id),
                Ok(ControlMessage::Rescan) => {
                    if self.state == DispatcherState::Running {
                        self.rescan();
                    }
                }
                Ok(ControlMessage::Shutdown) => return Continuation::Stop,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => {
                    return Continuation::Continue;
                }
            }
        }
    }

    fn remove_subscription(&mut self, id: SubscriptionId) {
        self.subscriptions.retain(|subscription| {
            if subscription.queue.id() == id {
                subscription.queue.close(CloseReason::Unsubscribed);
                false
            } else {
                true
            }
        });
    }

    /// Close subscriptions whose token fired or whose consumer went away.
    fn sweep_cancelled(&mut self) {
        self.subscriptions.retain(|subscription| {
            if subscription.is_cancelled() {
                subscription.queue.close(CloseReason::Cancelled);
                return false;
            }
            subscription.queue.close_reason().is_none()
        });
    }

    fn emit_error(&mut self, device: Option<DeviceRef>, err: &InputCoreError) {
        self.emit(
            LifecycleEvent::Error {
                device,
                kind: err.kind(),
                message: error_chain_message(err),
            }
            .into(),
        );
    }

    /// Fan one event out to every matching subscription. Cancellation and overflow are
    /// observed here, on the delivery attempt.
    fn emit(&mut self, event: InputEvent) {
        let event = Arc::new(event);
        self.subscriptions.retain(|subscription| {
            if subscription.is_cancelled() {
                subscription.queue.close(CloseReason::Cancelled);
                return false;
            }
            if !subscription.filter.matches(&event) {
                return true;
            }
            match subscription.queue.push(Arc::clone(&event)) {
                PushOutcome::Queued
                | PushOutcome::DroppedOldest
                | PushOutcome::DroppedNewest => true,
                PushOutcome::Overflowed => {
                    let err = InputCoreError::Overflow {
                        subscription: subscription.queue.id(),
                        capacity: subscription.queue.capacity(),
                    };
                    tracing::warn!(message = "dispatcher: closing subscription", error = %err);
                    false
                }
                PushOutcome::Closed => false,
            }
        });
    }
}

/// `error: source: source ...`, for lifecycle messages.
fn error_chain_message(err: &dyn std::error::Error) -> String {
    let mut acc = err.to_string();
    let mut source = err.source();
    while let Some(it) = source {
        acc.push_str(": ");
        acc.push_str(&it.to_string());
        source = it.source();
    }
    acc
}
