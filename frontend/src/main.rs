use yew::prelude::*;
use yew_router::prelude::*;
use log::{info, warn};
use web_sys::{HtmlElement, MouseEvent};

mod config;
mod animation {
    pub mod error;
    pub mod frame;
    pub mod viewport;
    pub mod tween;
    pub mod signals;
    pub mod context;
    pub mod scramble;
    pub mod progress;
    pub mod phase;
    pub mod stack;
    pub mod visibility;
    pub mod parallax;
    pub mod booking;
}
mod components {
    pub mod scramble_title;
    pub mod hero;
    pub mod card_stack;
    pub mod booking_form;
}
mod pages {
    pub mod landing;
}

use animation::context::MotionContext;
use animation::visibility::NavVisibilityController;
use pages::landing::Landing;

#[derive(Clone, Routable, PartialEq)]
pub enum Route {
    #[at("/")]
    Home,
    #[not_found]
    #[at("/404")]
    NotFound,
}

fn switch(routes: Route) -> Html {
    match routes {
        Route::Home => {
            info!("Rendering landing page");
            html! { <Landing /> }
        }
        Route::NotFound => {
            info!("Rendering not found page");
            html! {
                <div class="not-found">
                    <h1>{"404"}</h1>
                    <Link<Route> to={Route::Home}>{"Volver al inicio"}</Link<Route>>
                </div>
            }
        }
    }
}

/// Fixed navbar. It starts hidden and only shows itself once the page
/// announces that the hero has started revealing.
#[function_component(Nav)]
pub fn nav() -> Html {
    let motion = use_context::<MotionContext>().unwrap_or_default();
    let nav_ref = use_node_ref();
    let menu_open = use_state(|| false);

    {
        let nav_ref = nav_ref.clone();
        use_effect_with_deps(
            move |_| {
                let controller = match nav_ref.cast::<HtmlElement>() {
                    Some(nav) => Some(NavVisibilityController::attach(
                        nav,
                        motion.primary.clone(),
                        motion.secondary.clone(),
                        &motion.bus,
                    )),
                    None => {
                        warn!("nav element missing, visibility rules disabled");
                        None
                    }
                };
                move || {
                    if let Some(controller) = controller {
                        controller.dispose();
                    }
                }
            },
            (),
        );
    }

    let toggle_menu = {
        let menu_open = menu_open.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            menu_open.set(!*menu_open);
        })
    };

    let close_menu = {
        let menu_open = menu_open.clone();
        Callback::from(move |_: MouseEvent| menu_open.set(false))
    };

    let menu_class = if *menu_open {
        "nav-right mobile-menu-open"
    } else {
        "nav-right"
    };

    html! {
        <nav class="top-nav" ref={nav_ref}>
            <div class="nav-content">
                <Link<Route> to={Route::Home} classes="nav-logo">
                    {"estudio"}
                </Link<Route>>

                <button class="burger-menu" onclick={toggle_menu} aria-label="Menú">
                    <span></span>
                    <span></span>
                    <span></span>
                </button>
                <div class={menu_class}>
                    <a href="#servicios" class="nav-link" onclick={close_menu.clone()}>{"Servicios"}</a>
                    <a href="#reservar" class="nav-login-button" onclick={close_menu}>{"Reservar"}</a>
                </div>
            </div>
        </nav>
    }
}

#[function_component]
fn App() -> Html {
    // One bus per app session: the hero and the stack announce themselves once.
    let motion = use_memo(|_| MotionContext::default(), ());

    html! {
        <ContextProvider<MotionContext> context={(*motion).clone()}>
            <BrowserRouter>
                <Nav />
                <Switch<Route> render={switch} />
            </BrowserRouter>
        </ContextProvider<MotionContext>>
    }
}

fn main() {
    console_error_panic_hook::set_once();

    console_log::init_with_level(config::log_level()).expect("error initializing log");

    info!("Starting application");
    yew::Renderer::<App>::new().render();
}
