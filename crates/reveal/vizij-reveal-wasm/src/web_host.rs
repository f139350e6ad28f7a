//! Browser host: IntersectionObserver for visibility, requestAnimationFrame
//! for ticks.
//!
//! Callbacks only hold a `Weak` reference to the stage, so a callback that
//! outlives the `VizijReveal` object is a no-op.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use hashbrown::HashMap;
use js_sys::Array;
use log::{trace, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use vizij_reveal_core::{
    FrameHandle, FrameHost, IntersectionHost, IntersectionSample, ObserverOptions, Stage,
    SubscriptionId, TargetHandle,
};

use crate::render;

pub(crate) type SharedStage = Rc<RefCell<Stage<WebHost>>>;
type WeakStage = Weak<RefCell<Stage<WebHost>>>;

type ObserverCallback = Closure<dyn FnMut(Array, IntersectionObserver)>;
type FrameCallback = Closure<dyn FnMut(f64)>;

struct Observation {
    observer: IntersectionObserver,
    _callback: ObserverCallback,
}

struct FrameRequest {
    raf: i32,
    _callback: FrameCallback,
}

pub struct WebHost {
    stage: WeakStage,
    elements: HashMap<TargetHandle, Element>,
    observations: HashMap<SubscriptionId, Observation>,
    // Disconnected observers and delivered frames whose closure may still be
    // on the call stack.
    retired: Vec<Observation>,
    retired_frames: Vec<FrameRequest>,
    frames: HashMap<FrameHandle, FrameRequest>,
    next_element: u32,
    next_subscription: u32,
    next_frame: u32,
}

impl WebHost {
    pub(crate) fn new(stage: WeakStage) -> Self {
        Self {
            stage,
            elements: HashMap::new(),
            observations: HashMap::new(),
            retired: Vec::new(),
            retired_frames: Vec::new(),
            frames: HashMap::new(),
            next_element: 0,
            next_subscription: 0,
            next_frame: 0,
        }
    }

    /// Remember `element` and return the handle the stage will use for it.
    pub(crate) fn register(&mut self, element: Element) -> TargetHandle {
        let key = format!("el-{}", self.next_element);
        self.next_element = self.next_element.wrapping_add(1);
        self.elements.insert(key.clone(), element);
        key
    }

    pub(crate) fn forget(&mut self, key: &str) {
        self.elements.remove(key);
    }

    pub(crate) fn element(&self, key: &str) -> Option<&Element> {
        self.elements.get(key)
    }

    #[cfg(test)]
    pub(crate) fn element_count(&self) -> usize {
        self.elements.len()
    }

    #[cfg(test)]
    pub(crate) fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Drop closures of disconnected observers and delivered frames. Call
    /// only when none of them can be executing, i.e. at the top of a callback
    /// or a JS entry point.
    pub(crate) fn collect_retired(&mut self) {
        self.retired.clear();
        self.retired_frames.clear();
    }

    fn retire_frame(&mut self, handle: FrameHandle) {
        if let Some(request) = self.frames.remove(&handle) {
            self.retired_frames.push(request);
        }
    }
}

impl IntersectionHost for WebHost {
    fn observe(&mut self, target: &str, options: &ObserverOptions) -> Option<SubscriptionId> {
        let element = self.elements.get(target)?.clone();
        if !element.is_connected() {
            trace!("'{target}' is not in the document yet");
            return None;
        }

        let sub = SubscriptionId(self.next_subscription);
        self.next_subscription = self.next_subscription.wrapping_add(1);

        let stage = self.stage.clone();
        let callback = Closure::wrap(Box::new(move |entries: Array, _: IntersectionObserver| {
            deliver_records(&stage, sub, &entries);
        }) as Box<dyn FnMut(Array, IntersectionObserver)>);

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold()));
        if !options.root_margin().is_zero() {
            init.set_root_margin(&options.root_margin().to_string());
        }
        let observer =
            match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
                Ok(o) => o,
                Err(e) => {
                    warn!("IntersectionObserver unavailable: {e:?}");
                    return None;
                }
            };
        observer.observe(&element);
        self.observations.insert(
            sub,
            Observation {
                observer,
                _callback: callback,
            },
        );
        Some(sub)
    }

    fn unobserve(&mut self, subscription: SubscriptionId) {
        if let Some(obs) = self.observations.remove(&subscription) {
            obs.observer.disconnect();
            self.retired.push(obs);
        }
    }
}

impl FrameHost for WebHost {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        let window = web_sys::window()?;
        let handle = FrameHandle(self.next_frame);
        self.next_frame = self.next_frame.wrapping_add(1);

        let stage = self.stage.clone();
        let callback = Closure::wrap(Box::new(move |timestamp: f64| {
            deliver_frame(&stage, handle, timestamp);
        }) as Box<dyn FnMut(f64)>);
        match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
            Ok(raf) => {
                self.frames.insert(
                    handle,
                    FrameRequest {
                        raf,
                        _callback: callback,
                    },
                );
                Some(handle)
            }
            Err(e) => {
                warn!("requestAnimationFrame failed: {e:?}");
                None
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        // A cancelled request is never invoked, so its closure can go now.
        let Some(request) = self.frames.remove(&handle) else {
            return;
        };
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.cancel_animation_frame(request.raf) {
                warn!("cancelAnimationFrame failed: {e:?}");
            }
        }
    }
}

fn deliver_records(stage: &WeakStage, sub: SubscriptionId, entries: &Array) {
    let Some(stage) = stage.upgrade() else {
        return;
    };
    let Ok(mut st) = stage.try_borrow_mut() else {
        warn!("stage busy; dropping intersection records for {sub:?}");
        return;
    };
    st.host_mut().collect_retired();
    for entry in entries.iter() {
        let entry: IntersectionObserverEntry = entry.unchecked_into();
        let sample = IntersectionSample::new(entry.intersection_ratio(), entry.is_intersecting());
        st.on_intersection(sub, sample);
        let outputs = st.take_outputs();
        render::apply(st.host(), &outputs);
    }
}

fn deliver_frame(stage: &WeakStage, handle: FrameHandle, timestamp: f64) {
    let Some(stage) = stage.upgrade() else {
        return;
    };
    let Ok(mut st) = stage.try_borrow_mut() else {
        warn!("stage busy; dropping frame {handle:?}");
        return;
    };
    let host = st.host_mut();
    host.collect_retired();
    host.retire_frame(handle);
    st.on_frame(handle, timestamp);
    let outputs = st.take_outputs();
    render::apply(st.host(), &outputs);
}
