use log::debug;
use yew::prelude::*;

use crate::animation::context::MotionContext;
use crate::animation::signals::Signal;
use crate::animation::viewport;
use crate::components::booking_form::BookingForm;
use crate::components::card_stack::CardStack;
use crate::components::hero::Hero;

#[function_component(Landing)]
pub fn landing() -> Html {
    let motion = use_context::<MotionContext>().unwrap_or_default();
    let hero_resolved = use_state_eq(|| false);

    // Geometry is measured from the top, so start there on every mount.
    use_effect_with_deps(
        move |_| {
            viewport::scroll_to_top();
            || ()
        },
        (),
    );

    {
        let hero_resolved = hero_resolved.clone();
        let bus = motion.bus.clone();
        use_effect_with_deps(
            move |_| {
                let subscription = bus.subscribe(Signal::PrimaryLandmarkResolved, move |_| {
                    debug!("landing: hero resolved");
                    hero_resolved.set(true);
                });
                move || drop(subscription)
            },
            (),
        );
    }

    html! {
        <div class={classes!("landing-page", (*hero_resolved).then_some("hero-resolved"))}>
            <Hero />
            <main>
                <CardStack />
                <BookingForm />
            </main>
            <footer class="landing-footer">
                <p>{"Estudio de producto digital · Hecho con cariño y mucho scroll"}</p>
            </footer>
            <style>
                {r#"
                .landing-page { overflow-x: hidden; }
                .hero { position: relative; height: 100vh; overflow: hidden; will-change: transform; }
                .hero-layers { position: absolute; inset: 0; pointer-events: none; }
                .hero-layer { position: absolute; inset: -5%; will-change: transform; }
                .hero-layer-0 { background: radial-gradient(circle at 30% 40%, rgba(30, 144, 255, 0.25), transparent 60%); }
                .hero-layer-1 { background: radial-gradient(circle at 70% 60%, rgba(126, 178, 255, 0.2), transparent 55%); }
                .hero-layer-2 { background: radial-gradient(circle at 50% 80%, rgba(255, 255, 255, 0.08), transparent 40%); }
                .hero-phases { position: relative; height: 100%; }
                .hero-phase { position: absolute; inset: 0; display: flex; flex-direction: column;
                              justify-content: center; align-items: center; text-align: center; padding: 0 1.5rem; }
                .scroll-down { position: absolute; bottom: 2rem; left: 50%; transform: translateX(-50%);
                               background: none; border: none; color: inherit; font-size: 1.5rem; cursor: pointer; }
                .hero-resolved .scroll-down { opacity: 0; pointer-events: none; }
                .services { position: relative; min-height: 100vh; padding: 6rem 1.5rem; }
                .card-stack { position: relative; height: 60vh; max-width: 640px; margin: 2rem auto 0; }
                .service-card { position: absolute; inset: 0; border-radius: 1.25rem; padding: 2rem;
                                background: #1a1a1a; border: 1px solid rgba(255, 255, 255, 0.08);
                                will-change: transform, opacity; }
                .booking { padding: 6rem 1.5rem; }
                .booking-panel { max-width: 560px; margin: 0 auto; }
                .booking-form label { display: block; margin-bottom: 1rem; }
                .booking-result.failed h2 { color: #ff6b6b; }
                .landing-footer { padding: 3rem 1.5rem; text-align: center; opacity: 0.6; }
                "#}
            </style>
        </div>
    }
}
