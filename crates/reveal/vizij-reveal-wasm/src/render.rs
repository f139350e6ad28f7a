//! Apply stage outputs to the DOM. Only classes, styles and text change;
//! nodes are never inserted or removed.

use log::{trace, warn};
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

use vizij_reveal_core::{Change, Outputs};

use crate::web_host::WebHost;

pub(crate) fn apply(host: &WebHost, outputs: &Outputs) {
    for change in &outputs.changes {
        let Some(element) = host.element(change.target()) else {
            trace!("no element for '{}'", change.target());
            continue;
        };
        match change {
            Change::Reveal {
                class_list,
                transition_delay_ms,
                ..
            } => {
                element.set_class_name(class_list);
                if let Some(html) = element.dyn_ref::<HtmlElement>() {
                    let delay = format!("{transition_delay_ms}ms");
                    if let Err(e) = html.style().set_property("transition-delay", &delay) {
                        warn!("failed to set transition-delay: {e:?}");
                    }
                }
            }
            Change::Counter { text, .. } => element.set_text_content(Some(text)),
        }
    }
}
