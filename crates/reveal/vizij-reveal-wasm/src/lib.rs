use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use web_sys::Element;

use vizij_reveal_core::{Config, ConfigError, CounterConfig, InstId, RevealConfig, Stage};

mod render;
mod web_host;

use web_host::{SharedStage, WebHost};

#[wasm_bindgen]
pub struct VizijReveal {
    stage: SharedStage,
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

impl VizijReveal {
    fn stage(&self) -> Result<RefMut<'_, Stage<WebHost>>, JsError> {
        let mut st = self
            .stage
            .try_borrow_mut()
            .map_err(|_| JsError::new("stage is busy"))?;
        st.host_mut().collect_retired();
        Ok(st)
    }

    fn mount<F>(&self, element: Element, mount: F) -> Result<u32, JsError>
    where
        F: FnOnce(&mut Stage<WebHost>, &str) -> Result<InstId, ConfigError>,
    {
        let mut st = self.stage()?;
        let key = st.host_mut().register(element);
        let inst = match mount(&mut *st, &key) {
            Ok(inst) => inst,
            Err(e) => {
                st.host_mut().forget(&key);
                return Err(JsError::new(&format!("mount error: {e}")));
            }
        };
        let outputs = st.take_outputs();
        render::apply(st.host(), &outputs);
        Ok(inst.0)
    }
}

#[wasm_bindgen]
impl VizijReveal {
    /// Create a stage. Pass a JSON config object or undefined/null for defaults.
    /// Example:
    ///   new VizijReveal({ counter: { duration_ms: 1500 } })
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<VizijReveal, JsError> {
        console_error_panic_hook::set_once();

        let cfg: Config = if jsvalue_is_undefined_or_null(&config) {
            Config::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };

        let stage =
            Rc::new_cyclic(|weak| RefCell::new(Stage::new(cfg, WebHost::new(weak.clone()))));
        Ok(VizijReveal { stage })
    }

    /// Reveal `element` once it scrolls into view. `cfg` is optional JSON
    /// matching RevealConfig (`delay_ms`, `class_name`, `threshold`, `root_margin`).
    /// Returns the instance id.
    #[wasm_bindgen]
    pub fn reveal(&self, element: Element, cfg: JsValue) -> Result<u32, JsError> {
        let cfg: RevealConfig = if jsvalue_is_undefined_or_null(&cfg) {
            RevealConfig::default()
        } else {
            swb::from_value(cfg).map_err(|e| JsError::new(&format!("reveal cfg error: {e}")))?
        };
        self.mount(element, |st, key| st.mount_reveal(Some(key), &cfg))
    }

    /// Count from 0 up to `target` inside `element` once it is half visible.
    /// `cfg` is JSON matching CounterConfig (`target`, `duration_ms`, `suffix`, ...).
    #[wasm_bindgen]
    pub fn counter(&self, element: Element, cfg: JsValue) -> Result<u32, JsError> {
        if jsvalue_is_undefined_or_null(&cfg) {
            return Err(JsError::new("counter: cfg with a target is required"));
        }
        let cfg: CounterConfig =
            swb::from_value(cfg).map_err(|e| JsError::new(&format!("counter cfg error: {e}")))?;
        self.mount(element, |st, key| st.mount_counter(Some(key), &cfg))
    }

    /// Tear down one instance. Returns false if it was not mounted.
    #[wasm_bindgen]
    pub fn unmount(&self, id: u32) -> Result<bool, JsError> {
        let mut st = self.stage()?;
        let inst = InstId(id);
        let key = st.target(inst).map(str::to_string);
        let removed = st.unmount(inst);
        if let Some(key) = key {
            st.host_mut().forget(&key);
        }
        Ok(removed)
    }

    /// Retry observations deferred because their element was not in the document yet.
    #[wasm_bindgen]
    pub fn retry(&self) -> Result<(), JsError> {
        let mut st = self.stage()?;
        st.retry_deferred();
        Ok(())
    }

    #[wasm_bindgen(js_name = isVisible)]
    pub fn is_visible(&self, id: u32) -> Option<bool> {
        self.stage.try_borrow().ok()?.is_visible(InstId(id))
    }

    #[wasm_bindgen(js_name = counterValue)]
    pub fn counter_value(&self, id: u32) -> Option<f64> {
        self.stage
            .try_borrow()
            .ok()?
            .counter_value(InstId(id))
            .map(|v| v as f64)
    }

    /// Number of mounted instances.
    #[wasm_bindgen]
    pub fn live(&self) -> u32 {
        self.stage
            .try_borrow()
            .map(|st| st.live_instances() as u32)
            .unwrap_or(0)
    }

    /// Tear down every instance; observers disconnect and pending frames are cancelled.
    #[wasm_bindgen]
    pub fn dispose(&self) -> Result<(), JsError> {
        let mut st = self.stage()?;
        let keys: Vec<String> = st.targets().map(str::to_string).collect();
        st.teardown_all();
        for key in keys {
            st.host_mut().forget(&key);
        }
        Ok(())
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
