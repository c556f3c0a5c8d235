use std::cell::RefCell;
use std::rc::Rc;

use log::warn;
use web_sys::Event;
use yew::prelude::*;
use yew_hooks::prelude::*;

use crate::animation::context::MotionContext;
use crate::animation::stack::{StackConfig, StackScrollController};
use crate::animation::viewport::{self, use_viewport_class};
use crate::components::scramble_title::ScrambleTitle;

struct Service {
    title: &'static str,
    body: &'static str,
    tag: &'static str,
}

const SERVICES: [Service; 4] = [
    Service {
        title: "Webs a medida",
        body: "Sitios rápidos, pensados para móvil y fáciles de mantener por tu equipo.",
        tag: "Diseño + desarrollo",
    },
    Service {
        title: "Tiendas online",
        body: "Catálogo, pagos y envíos conectados sin depender de mil plugins.",
        tag: "Comercio",
    },
    Service {
        title: "Reservas y citas",
        body: "Tu agenda abierta las 24 horas, con recordatorios automáticos.",
        tag: "Automatización",
    },
    Service {
        title: "Mantenimiento",
        body: "Copias, actualizaciones y mejoras mensuales para que nada se quede atrás.",
        tag: "Soporte",
    },
];

/// Services section: the title scrambles in, then the cards unfan as the
/// section scrolls through its pinned range.
#[function_component(CardStack)]
pub fn card_stack() -> Html {
    let motion = use_context::<MotionContext>().unwrap_or_default();
    let section_ref = motion.secondary.clone();
    let header_ref = use_node_ref();
    let card_refs = use_memo(|_| SERVICES.iter().map(|_| NodeRef::default()).collect::<Vec<_>>(), ());
    let class = use_viewport_class();

    // Survives controller rebuilds so a breakpoint change does not lock the
    // stack again after the title has already resolved.
    let unlocked = use_mut_ref(|| false);
    let controller: Rc<RefCell<Option<StackScrollController>>> = use_mut_ref(|| None);

    {
        let section_ref = section_ref.clone();
        let header_ref = header_ref.clone();
        let card_refs = card_refs.clone();
        let unlocked = unlocked.clone();
        let controller = controller.clone();
        let bus = motion.bus.clone();
        use_effect_with_deps(
            move |class| {
                let config = StackConfig::for_class(*class, viewport::viewport_size().1);
                match StackScrollController::build(section_ref, (*card_refs).clone(), Some(header_ref), config, bus) {
                    Ok(built) => {
                        if *unlocked.borrow() {
                            built.unlock();
                        }
                        *controller.borrow_mut() = Some(built);
                    }
                    Err(err) => warn!("card stack disabled: {}", err),
                }
                move || {
                    if let Some(controller) = controller.borrow_mut().take() {
                        controller.teardown();
                    }
                }
            },
            class,
        );
    }

    // Late fonts and images move the section; measure again once they are in.
    {
        let controller = controller.clone();
        use_event_with_window("load", move |_: Event| {
            if let Some(controller) = controller.borrow().as_ref() {
                controller.refresh();
            }
        });
    }

    let on_title_complete = {
        let unlocked = unlocked.clone();
        let controller = controller.clone();
        Callback::from(move |_| {
            *unlocked.borrow_mut() = true;
            if let Some(controller) = controller.borrow().as_ref() {
                controller.unlock();
            }
        })
    };

    html! {
        <section id="servicios" class="services" ref={section_ref}>
            <div class="services-header" ref={header_ref}>
                <ScrambleTitle text="Servicios" on_complete={on_title_complete} />
                <p class="services-lead">{"Lo que hacemos, de principio a fin."}</p>
            </div>
            <div class="card-stack">
                { for SERVICES.iter().zip(card_refs.iter()).enumerate().map(|(i, (service, card_ref))| html! {
                    <article class="service-card" ref={card_ref.clone()} data-order={i.to_string()}>
                        <span class="service-tag">{ service.tag }</span>
                        <h3>{ service.title }</h3>
                        <p>{ service.body }</p>
                    </article>
                }) }
            </div>
        </section>
    }
}
