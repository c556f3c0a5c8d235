use web_sys::Element;
use yew::prelude::*;

use crate::animation::scramble::{ScrambleHandle, ScrambleOptions, ScrambleTextEngine};
use crate::animation::viewport::use_enter_viewport;
use crate::config;

#[derive(Properties, PartialEq)]
pub struct ScrambleTitleProps {
    pub text: AttrValue,
    #[prop_or_default]
    pub class: Classes,
    #[prop_or(config::SCRAMBLE_DURATION_MS)]
    pub duration_ms: u32,
    /// Fires once the title has fully resolved.
    #[prop_or_default]
    pub on_complete: Callback<()>,
}

/// A section title that scrambles into place the first time it scrolls into
/// view. The engine owns the text node; yew only renders the empty shell.
#[function_component(ScrambleTitle)]
pub fn scramble_title(props: &ScrambleTitleProps) -> Html {
    let heading_ref = use_node_ref();
    let title_ref = use_node_ref();
    let engine = use_memo(|_| ScrambleTextEngine::new(), ());
    let running = use_mut_ref(|| None::<ScrambleHandle>);

    let on_enter = {
        let title_ref = title_ref.clone();
        let running = running.clone();
        let text = props.text.clone();
        let on_complete = props.on_complete.clone();
        let options = ScrambleOptions::default().with_duration(props.duration_ms);
        Callback::from(move |_| {
            let handle = engine.run(title_ref.cast::<Element>(), &text, &options);
            let on_complete = on_complete.clone();
            handle.on_complete(move || on_complete.emit(()));
            *running.borrow_mut() = Some(handle);
        })
    };
    use_enter_viewport(heading_ref.clone(), config::TITLE_ENTER_FRACTION, on_enter);

    use_effect_with_deps(
        move |_| {
            move || {
                if let Some(handle) = running.borrow_mut().take() {
                    handle.cancel();
                }
            }
        },
        (),
    );

    html! {
        <h2
            ref={heading_ref}
            class={classes!("scramble-title", props.class.clone())}
            style="min-height: 1.2em;"
            aria-label={props.text.clone()}
        >
            <span ref={title_ref} aria-hidden="true"></span>
        </h2>
    }
}
