use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{info, warn};
use web_sys::{Element, HtmlElement};
use yew::prelude::*;

use crate::animation::context::MotionContext;
use crate::animation::parallax::PointerParallax;
use crate::animation::phase::PhaseTimeline;
use crate::animation::progress::{Distance, ProgressConfig, ProgressDriver, ProgressSample};
use crate::animation::scramble::{ScrambleHandle, ScrambleOptions, ScrambleTextEngine};
use crate::animation::signals::Signal;
use crate::animation::viewport;
use crate::config;

const PHASES: [(&str, &str); config::HERO_PHASE_COUNT] = [
    ("Escuchamos", "Empezamos por entender qué necesita tu negocio, sin plantillas ni atajos."),
    ("Diseñamos", "Cada pantalla se piensa para que tus clientes lleguen antes a lo importante."),
    ("Construimos", "Código rápido y accesible, medido en dispositivos reales."),
    ("Acompañamos", "Seguimos contigo después del lanzamiento: datos, ajustes y nuevas ideas."),
];

/// Background layers and how strongly each follows the pointer.
const LAYER_DEPTHS: [f64; 3] = [0.2, 0.5, 1.0];

/// The pinned opening sequence. Scrolling through it walks the four phases;
/// reaching the end announces that the primary landmark has resolved.
#[function_component(Hero)]
pub fn hero() -> Html {
    let motion = use_context::<MotionContext>().unwrap_or_default();
    let pin_ref = motion.primary.clone();
    let phase_refs = use_memo(|_| (0..PHASES.len()).map(|_| NodeRef::default()).collect::<Vec<_>>(), ());
    let title_refs = use_memo(|_| (0..PHASES.len()).map(|_| NodeRef::default()).collect::<Vec<_>>(), ());
    let layer_refs = use_memo(|_| LAYER_DEPTHS.iter().map(|_| NodeRef::default()).collect::<Vec<_>>(), ());

    {
        let pin_ref = pin_ref.clone();
        let phase_refs = phase_refs.clone();
        let title_refs = title_refs.clone();
        let layer_refs = layer_refs.clone();
        let bus = motion.bus.clone();
        use_effect_with_deps(
            move |_| {
                let timeline = match PhaseTimeline::contiguous(
                    config::HERO_PHASES_START,
                    config::HERO_PHASES_END,
                    PHASES.len(),
                    config::HERO_TRANSITION_WIDTH,
                    config::HERO_SETTLE_DISTANCE_PX,
                ) {
                    Ok(timeline) => timeline,
                    Err(err) => {
                        warn!("hero sequence disabled: {}", err);
                        return Box::new(|| ()) as Box<dyn FnOnce()>;
                    }
                };

                let engines: Vec<ScrambleTextEngine> = PHASES.iter().map(|_| ScrambleTextEngine::new()).collect();
                let handles: Rc<RefCell<Vec<Option<ScrambleHandle>>>> =
                    Rc::new(RefCell::new(PHASES.iter().map(|_| None).collect()));
                let active = Rc::new(Cell::new(None::<usize>));
                let resolved = Rc::new(Cell::new(false));

                let on_progress = {
                    let handles = handles.clone();
                    Callback::from(move |sample: ProgressSample| {
                        for state in timeline.evaluate(sample.progress) {
                            if let Some(element) = phase_refs[state.phase_index].cast::<HtmlElement>() {
                                let style = element.style();
                                let _ = style.set_property("opacity", &format!("{:.4}", state.opacity));
                                let _ = style
                                    .set_property("transform", &format!("translate3d(0, {:.2}px, 0)", state.offset));
                            }
                        }

                        let now_active = timeline.active_phase(sample.progress);
                        if now_active != active.get() {
                            active.set(now_active);
                            if let Some(index) = now_active {
                                let options = ScrambleOptions::default().time_scaled(sample.time_scale);
                                let handle =
                                    engines[index].run(title_refs[index].cast::<Element>(), PHASES[index].0, &options);
                                handles.borrow_mut()[index] = Some(handle);
                            }
                        }

                        if sample.progress >= 1.0 && !resolved.get() {
                            resolved.set(true);
                            info!("hero sequence resolved");
                            bus.publish(Signal::PrimaryLandmarkResolved);
                        }
                    })
                };

                let driver = ProgressDriver::attach(
                    pin_ref,
                    ProgressConfig {
                        start_fraction: 0.0,
                        distance: Distance::ViewportHeights(config::HERO_PIN_VIEWPORTS),
                        pin: true,
                    },
                    on_progress,
                );
                let layers = layer_refs.iter().cloned().zip(LAYER_DEPTHS).collect();
                let parallax = PointerParallax::attach(layers);

                Box::new(move || {
                    driver.dispose();
                    handles
                        .borrow_mut()
                        .iter_mut()
                        .filter_map(Option::take)
                        .for_each(|handle| handle.cancel());
                    drop(parallax);
                }) as Box<dyn FnOnce()>
            },
            (),
        );
    }

    let scroll_down = Callback::from(|_: MouseEvent| viewport::scroll_down_by(config::SCROLL_DOWN_STEP_PX));

    html! {
        <header class="hero" ref={pin_ref}>
            <div class="hero-layers" aria-hidden="true">
                { for layer_refs.iter().enumerate().map(|(i, layer)| html! {
                    <div class={format!("hero-layer hero-layer-{}", i)} ref={layer.clone()}></div>
                }) }
            </div>
            <div class="hero-phases">
                { for PHASES.iter().enumerate().map(|(i, (title, body))| html! {
                    <article class="hero-phase" ref={phase_refs[i].clone()} style="opacity: 0;">
                        <h1 aria-label={*title}><span ref={title_refs[i].clone()} aria-hidden="true"></span></h1>
                        <p>{ *body }</p>
                    </article>
                }) }
            </div>
            <button class="scroll-down" onclick={scroll_down} aria-label="Seguir bajando">{"↓"}</button>
        </header>
    }
}
