//! Stage: owns a host and every mounted reveal/counter instance.
//!
//! Methods:
//! - new, mount_reveal, mount_counter, attach, retry_deferred
//! - on_intersection / on_frame (host callbacks, routed by token)
//! - unmount, teardown_all (also run on drop)
//!
//! Each dispatch clears and refills the stage [`Outputs`]. Tokens that no
//! longer map to a live instance are dropped: a callback that outlives its
//! instance can never mutate anything.

use std::mem;

use hashbrown::HashMap;
use log::{debug, trace};

use crate::config::{Config, CounterConfig, RevealConfig};
use crate::counter::{CounterAnimator, CounterPhase};
use crate::error::ConfigError;
use crate::host::Host;
use crate::ids::{FrameHandle, IdAllocator, InstId, SubscriptionId};
use crate::observer::{IntersectionSample, VisibilityObserver};
use crate::outputs::{Change, CoreEvent, Outputs};
use crate::reveal::RevealController;

#[derive(Debug)]
enum Instance {
    Reveal(RevealController),
    Counter(CounterAnimator),
}

impl Instance {
    fn observer(&self) -> &VisibilityObserver {
        match self {
            Instance::Reveal(r) => r.observer(),
            Instance::Counter(c) => c.observer(),
        }
    }

    fn subscription(&self) -> Option<SubscriptionId> {
        self.observer().subscription()
    }

    fn is_finished(&self) -> bool {
        match self {
            Instance::Reveal(r) => r.visible(),
            Instance::Counter(c) => c.phase() == CounterPhase::Done,
        }
    }

    fn change(&self, inst: InstId) -> Option<Change> {
        match self {
            Instance::Reveal(r) => r.target().map(|t| Change::Reveal {
                inst,
                target: t.to_string(),
                visible: r.visible(),
                class_list: r.class_list(),
                transition_delay_ms: r.transition_delay_ms(),
            }),
            Instance::Counter(c) => c.target_handle().map(|t| Change::Counter {
                inst,
                target: t.to_string(),
                value: c.value(),
                text: c.text(),
            }),
        }
    }
}

#[derive(Debug)]
pub struct Stage<H: Host> {
    cfg: Config,
    host: H,
    ids: IdAllocator,
    instances: HashMap<InstId, Instance>,

    // Routing tables for host callbacks.
    subscriptions: HashMap<SubscriptionId, InstId>,
    frames: HashMap<FrameHandle, InstId>,

    outputs: Outputs,
}

impl<H: Host> Stage<H> {
    pub fn new(cfg: Config, host: H) -> Self {
        Self {
            cfg,
            host,
            ids: IdAllocator::new(),
            instances: HashMap::new(),
            subscriptions: HashMap::new(),
            frames: HashMap::new(),
            outputs: Outputs::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Outputs of the most recent dispatch.
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    pub fn take_outputs(&mut self) -> Outputs {
        mem::take(&mut self.outputs)
    }

    pub fn live_instances(&self) -> usize {
        self.instances.len()
    }

    /// Mount a reveal wrapper. `target` may be absent until the element exists.
    pub fn mount_reveal(
        &mut self,
        target: Option<&str>,
        cfg: &RevealConfig,
    ) -> Result<InstId, ConfigError> {
        self.outputs.clear();
        let mut reveal = RevealController::new(cfg, &self.cfg.reveal)?;
        let inst = self.ids.alloc_inst();
        let sub = reveal.attach(target, &mut self.host);
        self.insert(inst, Instance::Reveal(reveal), sub);
        debug!("mounted reveal {inst:?} on {target:?}");
        Ok(inst)
    }

    /// Mount a counter. `target` may be absent until the element exists.
    pub fn mount_counter(
        &mut self,
        target: Option<&str>,
        cfg: &CounterConfig,
    ) -> Result<InstId, ConfigError> {
        self.outputs.clear();
        let mut counter = CounterAnimator::new(cfg, &self.cfg.counter)?;
        let inst = self.ids.alloc_inst();
        let sub = counter.attach(target, &mut self.host);
        self.insert(inst, Instance::Counter(counter), sub);
        debug!("mounted counter {inst:?} on {target:?}");
        Ok(inst)
    }

    fn insert(&mut self, inst: InstId, instance: Instance, sub: Option<SubscriptionId>) {
        match sub {
            Some(sub) => {
                self.subscriptions.insert(sub, inst);
            }
            None => self.outputs.push_event(CoreEvent::Deferred { inst }),
        }
        if let Some(change) = instance.change(inst) {
            self.outputs.push_change(change);
        }
        self.instances.insert(inst, instance);
    }

    /// Bind (or re-bind) an instance to its element once it is mounted.
    pub fn attach(&mut self, inst: InstId, target: &str) -> Result<&Outputs, ConfigError> {
        self.outputs.clear();
        let instance = self
            .instances
            .get_mut(&inst)
            .ok_or(ConfigError::UnknownInstance(inst))?;
        if let Some(old) = instance.subscription() {
            self.subscriptions.remove(&old);
        }
        let sub = match instance {
            Instance::Reveal(r) => r.attach(Some(target), &mut self.host),
            Instance::Counter(c) => c.attach(Some(target), &mut self.host),
        };
        match sub {
            Some(sub) => {
                self.subscriptions.insert(sub, inst);
            }
            // Only an observer that has not fired yet can be waiting on its element.
            None if !instance.observer().is_finished() => {
                self.outputs.push_event(CoreEvent::Deferred { inst })
            }
            None => {}
        }
        if let Some(change) = instance.change(inst) {
            self.outputs.push_change(change);
        }
        Ok(&self.outputs)
    }

    /// Retry every deferred observation, e.g. after the page inserted elements.
    pub fn retry_deferred(&mut self) -> &Outputs {
        self.outputs.clear();
        for (inst, instance) in self.instances.iter_mut() {
            if instance.subscription().is_some() {
                continue;
            }
            let sub = match instance {
                Instance::Reveal(r) => r.engage(&mut self.host),
                Instance::Counter(c) => c.engage(&mut self.host),
            };
            if let Some(sub) = sub {
                trace!("deferred observation for {inst:?} engaged");
                self.subscriptions.insert(sub, *inst);
            }
        }
        &self.outputs
    }

    /// Deliver one intersection record from the host.
    pub fn on_intersection(
        &mut self,
        subscription: SubscriptionId,
        sample: IntersectionSample,
    ) -> &Outputs {
        self.outputs.clear();
        let Some(&inst) = self.subscriptions.get(&subscription) else {
            trace!("dropping record for released subscription {subscription:?}");
            return &self.outputs;
        };
        let Some(instance) = self.instances.get_mut(&inst) else {
            self.subscriptions.remove(&subscription);
            return &self.outputs;
        };
        let fired = match instance {
            Instance::Reveal(r) => r.on_intersection(subscription, sample, &mut self.host),
            Instance::Counter(c) => c.on_intersection(subscription, sample, &mut self.host),
        };
        if fired {
            match instance {
                Instance::Reveal(_) => self.outputs.push_event(CoreEvent::Revealed { inst }),
                Instance::Counter(c) => {
                    if let Some(handle) = c.pending_frame() {
                        self.frames.insert(handle, inst);
                    }
                    self.outputs.push_event(CoreEvent::CounterStarted {
                        inst,
                        target: c.target(),
                    });
                }
            }
            if let Some(change) = instance.change(inst) {
                self.outputs.push_change(change);
            }
        }
        if instance.subscription() != Some(subscription) {
            self.subscriptions.remove(&subscription);
        }
        &self.outputs
    }

    /// Deliver one animation-frame tick (`timestamp_ms` as given by the host clock).
    pub fn on_frame(&mut self, handle: FrameHandle, timestamp_ms: f64) -> &Outputs {
        self.outputs.clear();
        let Some(inst) = self.frames.remove(&handle) else {
            trace!("dropping stale frame {handle:?}");
            return &self.outputs;
        };
        let Some(Instance::Counter(c)) = self.instances.get_mut(&inst) else {
            return &self.outputs;
        };
        if !c.on_frame(handle, timestamp_ms, &mut self.host) {
            return &self.outputs;
        }
        if let Some(next) = c.pending_frame() {
            self.frames.insert(next, inst);
        }
        if let Some(target) = c.target_handle() {
            self.outputs.push_change(Change::Counter {
                inst,
                target: target.to_string(),
                value: c.value(),
                text: c.text(),
            });
        }
        if c.phase() == CounterPhase::Done {
            self.outputs.push_event(CoreEvent::CounterFinished {
                inst,
                value: c.value(),
            });
        }
        &self.outputs
    }

    /// Tear down one instance, releasing its subscription and pending frame.
    /// Returns `false` if the instance was not mounted.
    pub fn unmount(&mut self, inst: InstId) -> bool {
        self.outputs.clear();
        self.release(inst)
    }

    fn release(&mut self, inst: InstId) -> bool {
        let Some(mut instance) = self.instances.remove(&inst) else {
            return false;
        };
        let unfinished = !instance.is_finished();
        match &mut instance {
            Instance::Reveal(r) => r.teardown(&mut self.host),
            Instance::Counter(c) => c.teardown(&mut self.host),
        }
        self.subscriptions.retain(|_, owner| *owner != inst);
        self.frames.retain(|_, owner| *owner != inst);
        if unfinished {
            self.outputs.push_event(CoreEvent::Cancelled { inst });
        }
        debug!("unmounted {inst:?}");
        true
    }

    /// Tear down every instance.
    pub fn teardown_all(&mut self) -> &Outputs {
        self.outputs.clear();
        let mut ids: Vec<InstId> = self.instances.keys().copied().collect();
        ids.sort();
        for inst in ids {
            self.release(inst);
        }
        &self.outputs
    }

    /// Element handle an instance is bound to, if any.
    pub fn target(&self, inst: InstId) -> Option<&str> {
        match self.instances.get(&inst)? {
            Instance::Reveal(r) => r.target(),
            Instance::Counter(c) => c.target_handle(),
        }
    }

    /// Element handles of every mounted instance that has one.
    pub fn targets(&self) -> impl Iterator<Item = &str> + '_ {
        self.instances.values().filter_map(|i| i.observer().target())
    }

    pub fn is_visible(&self, inst: InstId) -> Option<bool> {
        match self.instances.get(&inst)? {
            Instance::Reveal(r) => Some(r.visible()),
            Instance::Counter(c) => Some(c.observer().has_been_visible()),
        }
    }

    pub fn reveal(&self, inst: InstId) -> Option<&RevealController> {
        match self.instances.get(&inst)? {
            Instance::Reveal(r) => Some(r),
            Instance::Counter(_) => None,
        }
    }

    pub fn counter(&self, inst: InstId) -> Option<&CounterAnimator> {
        match self.instances.get(&inst)? {
            Instance::Counter(c) => Some(c),
            Instance::Reveal(_) => None,
        }
    }

    pub fn counter_value(&self, inst: InstId) -> Option<u64> {
        self.counter(inst).map(CounterAnimator::value)
    }

    pub fn counter_phase(&self, inst: InstId) -> Option<CounterPhase> {
        self.counter(inst).map(CounterAnimator::phase)
    }
}

impl<H: Host> Drop for Stage<H> {
    fn drop(&mut self) {
        self.teardown_all();
    }
}
